use alloc::boxed::Box;
use alloc::string::{String, ToString};

use super::State;
use crate::catalog;
use crate::entity::{Component, ControllerMode, Device, Entity};
use crate::protocol::{MessageNumber, RawValue};

/// Publishes a text rendering of the raw value. Codes missing from the lookup
/// come out as plain decimal.
pub struct TextSensor {
    entity: Entity,
    state: State<String>,
    lookup: Option<Box<dyn Fn(RawValue) -> Option<String>>>,
}

impl TextSensor {
    pub fn new<L: Into<String>>(
        label: L,
        message: MessageNumber,
        mode: ControllerMode,
        device: Option<Device>,
    ) -> Self {
        TextSensor {
            entity: Entity::new(label, message, mode, device),
            state: State::new(),
            lookup: None,
        }
    }

    /// A text sensor preset from the catalog, if `message` is listed there.
    pub fn from_catalog(message: MessageNumber, device: Option<Device>) -> Option<Self> {
        let def = catalog::text_sensor_def(message)?;
        Some(
            TextSensor::new(def.label, def.message, def.mode, device)
                .with_lookup(move |code| def.lookup(code).map(ToString::to_string)),
        )
    }

    pub fn with_lookup<F: Fn(RawValue) -> Option<String> + 'static>(mut self, lookup: F) -> Self {
        self.lookup = Some(Box::new(lookup));
        self
    }

    pub fn state(&self) -> Option<String> {
        self.state.get()
    }

    pub fn add_on_state_callback<F: Fn(&String) + 'static>(&self, callback: F) {
        self.state.add_on_state_callback(callback);
    }

    fn render(&self, value: RawValue) -> String {
        self.lookup.as_ref().and_then(|lookup| lookup(value)).unwrap_or_else(|| value.to_string())
    }
}

impl Component for TextSensor {
    fn entity(&self) -> &Entity {
        &self.entity
    }

    fn on_receive(&self, value: RawValue) {
        self.state.publish(self.render(value));
    }
}
