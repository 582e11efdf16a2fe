//! Batched reads and writes the host can trigger as one unit.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt::Debug;

use log::info;

use crate::components::Writable;
use crate::controller::ControllerHandle;
use crate::entity::{Component, WriteError};
use crate::protocol::MessageNumber;

/// A value fixed at setup, or computed from the context an action runs with.
pub enum TemplatableValue<T, C> {
    Static(T),
    Lambda(Box<dyn Fn(&C) -> T>),
}

impl<T: Clone, C> TemplatableValue<T, C> {
    pub fn lambda<F: Fn(&C) -> T + 'static>(f: F) -> Self {
        TemplatableValue::Lambda(Box::new(f))
    }

    pub fn value(&self, context: &C) -> T {
        match self {
            TemplatableValue::Static(value) => value.clone(),
            TemplatableValue::Lambda(f) => f(context),
        }
    }
}

impl<T, C> From<T> for TemplatableValue<T, C> {
    fn from(value: T) -> Self {
        TemplatableValue::Static(value)
    }
}

/// Read the messages of a fixed list of components in one go.
pub struct RequestReadAction {
    controller: ControllerHandle,
    components: Vec<Rc<dyn Component>>,
}

impl RequestReadAction {
    pub fn new(controller: ControllerHandle) -> Self {
        RequestReadAction { controller, components: Vec::new() }
    }

    pub fn request_read(&mut self, components: Vec<Rc<dyn Component>>) {
        self.components = components;
    }

    pub fn messages(&self) -> Vec<MessageNumber> {
        self.components.iter().map(|c| c.entity().message()).collect()
    }

    /// Queue the read. Returns false if the controller queue was full.
    pub fn play(&self) -> bool {
        if self.controller.debug_log_messages() {
            info!("Request Read Action for messages:");
            for component in self.components.iter() {
                let entity = component.entity();
                info!("  -> {} [{}]", entity.message(), entity.label());
            }
        }
        self.controller.read(&self.messages())
    }
}

type WriteStep<C> = Box<dyn Fn(&C) -> Result<(), WriteError>>;

/// An ordered list of writes. Each one is validated on its own, so a bad
/// value only drops that write.
pub struct RequestWriteAction<C> {
    controller: ControllerHandle,
    writes: Vec<WriteStep<C>>,
}

impl<C: 'static> RequestWriteAction<C> {
    pub fn new(controller: ControllerHandle) -> Self {
        RequestWriteAction { controller, writes: Vec::new() }
    }

    pub fn add_write<W, V>(&mut self, target: Rc<W>, value: V)
    where
        W: Writable + 'static,
        W::Value: Clone + Debug + 'static,
        V: Into<TemplatableValue<W::Value, C>>,
    {
        let value = value.into();
        let debug_log = self.controller.debug_log_messages();
        self.writes.push(Box::new(move |context: &C| {
            let value = value.value(context);
            if debug_log {
                let entity = target.entity();
                info!("  -> Write {} [{}] = {:?}", entity.message(), entity.label(), value);
            }
            target.write_value(value)
        }));
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Run every write in the order it was added and report each outcome.
    pub fn play(&self, context: &C) -> Vec<Result<(), WriteError>> {
        self.writes.iter().map(|write| write(context)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Number, Select, Switch};
    use crate::controller::testing::*;
    use crate::controller::{Controller, ControllerConfig};
    use crate::entity::ControllerMode;
    use crate::protocol::{DataType, MessageSet, RawValue};
    use alloc::string::{String, ToString};

    struct Trigger {
        target: f32,
    }

    fn target_temp() -> Rc<Number> {
        let number = Number::new(
            "VAR_IN_TEMP_TARGET_F",
            MessageNumber(0x4201),
            ControllerMode::ReadWrite,
            None,
            16.0,
            30.0,
        );
        Rc::new(number.with_lambdas(|raw| raw as f32 / 10.0, |v| {
            libm::roundf(v * 10.0) as RawValue
        }))
    }

    fn power() -> Rc<Switch> {
        let message = MessageNumber(0x4000);
        Rc::new(Switch::new("ENUM_IN_OPERATION_POWER", message, ControllerMode::ReadWrite, None))
    }

    fn sent_messages(controller: &mut Controller<MockSerial>) -> Vec<MessageSet> {
        sent_packets(controller).into_iter().flat_map(|p| p.messages).collect()
    }

    #[test]
    fn read_action_test() {
        let mut controller = controller();
        let number = target_temp();
        let power = power();
        controller.register(&number).unwrap();
        controller.register(&power).unwrap();

        let mut action = RequestReadAction::new(controller.handle());
        let components: Vec<Rc<dyn Component>> = vec![power.clone(), number.clone(), power.clone()];
        action.request_read(components);
        assert!(action.play());

        let packets = sent_packets(&mut controller);
        assert_eq!(1, packets.len());
        assert_eq!(DataType::Read, packets[0].command.data_type);
        assert_eq!(
            vec![
                MessageSet::placeholder(MessageNumber(0x4000)),
                MessageSet::placeholder(MessageNumber(0x4201)),
                MessageSet::placeholder(MessageNumber(0x4000)),
            ],
            packets[0].messages
        );
    }

    #[test]
    fn empty_read_action_test() {
        let mut controller = controller();
        let action = RequestReadAction::new(controller.handle());
        assert!(action.play());
        assert!(sent_packets(&mut controller).is_empty());
    }

    #[test]
    fn write_action_skips_invalid_entries_test() {
        let config = ControllerConfig { debug_log_messages: true, ..Default::default() };
        let mut controller = Controller::new(MockSerial::default(), config);
        let number = target_temp();
        let mode = Rc::new(Select::new(
            "ENUM_IN_OPERATION_MODE",
            MessageNumber(0x4001),
            ControllerMode::ReadWrite,
            None,
            vec![("Auto", 0), ("Cool", 1), ("Heat", 4)],
        ));
        let power = power();
        controller.register(&number).unwrap();
        controller.register(&mode).unwrap();
        controller.register(&power).unwrap();

        let mut action = RequestWriteAction::new(controller.handle());
        action.add_write(power.clone(), true);
        action.add_write(mode.clone(), "Boost".to_string());
        action.add_write(number.clone(), TemplatableValue::lambda(|t: &Trigger| t.target));
        action.add_write(mode.clone(), String::from("Heat"));
        assert_eq!(4, action.len());

        let results = action.play(&Trigger { target: 22.5 });
        assert_eq!(
            vec![
                Ok(()),
                Err(WriteError::InvalidOption {
                    message: MessageNumber(0x4001),
                    option: "Boost".to_string(),
                }),
                Ok(()),
                Ok(()),
            ],
            results
        );

        assert_eq!(
            vec![
                MessageSet::new(MessageNumber(0x4000), 1),
                MessageSet::new(MessageNumber(0x4201), 225),
                MessageSet::new(MessageNumber(0x4001), 4),
            ],
            sent_messages(&mut controller)
        );
    }

    #[test]
    fn lambda_sees_context_test() {
        let mut controller = controller();
        let number = target_temp();
        controller.register(&number).unwrap();

        let mut action = RequestWriteAction::new(controller.handle());
        action.add_write(number.clone(), TemplatableValue::lambda(|t: &Trigger| t.target));

        assert_eq!(vec![Ok(())], action.play(&Trigger { target: 18.0 }));
        assert_eq!(
            vec![Err(WriteError::OutOfRange {
                message: MessageNumber(0x4201),
                value: 31.0,
                min: 16.0,
                max: 30.0,
            })],
            action.play(&Trigger { target: 31.0 })
        );

        let messages = sent_messages(&mut controller);
        assert_eq!(vec![MessageSet::new(MessageNumber(0x4201), 180)], messages);
    }
}
