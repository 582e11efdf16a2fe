use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use log::trace;

use crate::entity::{Component, Device};
use crate::protocol::{Address, MessageNumber, RawValue};

/// Mistakes in how entities were wired together. These are caught while
/// setting up, never while running.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    /// Two entities would claim the same message on the same unit, and at
    /// least one of them is writable.
    AmbiguousRegistration { message: MessageNumber, device: Option<Device> },
    DuplicateActionCode(i32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::AmbiguousRegistration { message, device: Some(device) } => {
                write!(f, "{} is already registered for device {}", message, device)
            }
            ConfigError::AmbiguousRegistration { message, device: None } => {
                write!(f, "{} is already registered", message)
            }
            ConfigError::DuplicateActionCode(code) => {
                write!(f, "action code {} is mapped twice", code)
            }
        }
    }
}

/// Message number to the components following it.
#[derive(Default)]
pub struct Registry {
    components: BTreeMap<MessageNumber, Vec<Rc<dyn Component>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, component: Rc<dyn Component>) -> Result<(), ConfigError> {
        let entity = component.entity();
        let message = entity.message();
        let existing = self.components.entry(message).or_insert_with(Vec::new);

        // An entity without a device hears every device on its message.
        let conflict = existing.iter().any(|other| {
            let other = other.entity();
            let (a, b) = (other.device(), entity.device());
            let overlaps = a.is_none() || b.is_none() || a == b;
            overlaps && (other.mode().is_writable() || entity.mode().is_writable())
        });
        if conflict {
            let device = entity.device().copied();
            return Err(ConfigError::AmbiguousRegistration { message, device });
        }

        existing.push(component);
        Ok(())
    }

    pub fn contains(&self, message: MessageNumber, device: Option<&Device>) -> bool {
        self.components
            .get(&message)
            .map_or(false, |list| list.iter().any(|c| c.entity().device() == device))
    }

    pub fn len(&self) -> usize {
        self.components.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn messages(&self) -> impl Iterator<Item = MessageNumber> + '_ {
        self.components.keys().copied()
    }

    /// Hand `value` to every component following `message` on `subject` (or
    /// on any unit). Returns how many received it.
    pub fn dispatch(&self, subject: &Address, message: MessageNumber, value: RawValue) -> usize {
        let targets = match self.components.get(&message) {
            Some(targets) => targets,
            None => return 0,
        };

        let mut delivered = 0;
        for component in targets.iter().filter(|c| c.entity().matches(subject)) {
            let entity = component.entity();
            trace!("{} [{}] from {} = {}", message, entity.label(), subject, value);
            entity.record(value);
            component.on_receive(value);
            delivered += 1;
        }
        delivered
    }
}
