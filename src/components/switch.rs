use alloc::boxed::Box;
use alloc::string::String;

use log::{debug, error};

use super::{State, Writable};
use crate::entity::{Component, ControllerMode, Device, Entity, WriteError};
use crate::protocol::{MessageNumber, RawValue};

pub struct Switch {
    entity: Entity,
    state: State<bool>,
    from_raw: Box<dyn Fn(RawValue) -> bool>,
    to_raw: Box<dyn Fn(bool) -> RawValue>,
}

impl Switch {
    pub fn new<L: Into<String>>(
        label: L,
        message: MessageNumber,
        mode: ControllerMode,
        device: Option<Device>,
    ) -> Self {
        Switch {
            entity: Entity::new(label, message, mode, device),
            state: State::new(),
            from_raw: Box::new(|value: RawValue| value != 0),
            to_raw: Box::new(|on: bool| if on { 1 } else { 0 }),
        }
    }

    /// Replace the default nonzero-is-on mapping.
    pub fn with_lambdas<F, T>(mut self, from_raw: F, to_raw: T) -> Self
    where
        F: Fn(RawValue) -> bool + 'static,
        T: Fn(bool) -> RawValue + 'static,
    {
        self.from_raw = Box::new(from_raw);
        self.to_raw = Box::new(to_raw);
        self
    }

    pub fn state(&self) -> Option<bool> {
        self.state.get()
    }

    pub fn add_on_state_callback<F: Fn(&bool) + 'static>(&self, callback: F) {
        self.state.add_on_state_callback(callback);
    }

    pub fn turn_on(&self) -> Result<(), WriteError> {
        self.write_state(true)
    }

    pub fn turn_off(&self) -> Result<(), WriteError> {
        self.write_state(false)
    }

    pub fn write_state(&self, on: bool) -> Result<(), WriteError> {
        let raw = (self.to_raw)(on);
        let shown = if on { "ON" } else { "OFF" };
        debug!("Switch {} [{}] -> {}", self.entity.message(), self.entity.label(), shown);
        self.entity.write(raw).map_err(|e| {
            error!("Switch write failed: {}", e);
            e
        })
    }
}

impl Component for Switch {
    fn entity(&self) -> &Entity {
        &self.entity
    }

    fn on_receive(&self, value: RawValue) {
        self.state.publish((self.from_raw)(value));
    }
}

impl Writable for Switch {
    type Value = bool;

    fn write_value(&self, value: bool) -> Result<(), WriteError> {
        self.write_state(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::testing::*;
    use crate::protocol::{DataType, MessageSet};
    use alloc::rc::Rc;

    fn power() -> Rc<Switch> {
        let message = MessageNumber(0x4000);
        Rc::new(Switch::new("ENUM_IN_OPERATION_POWER", message, ControllerMode::ReadWrite, None))
    }

    #[test]
    fn on_receive_test() {
        let switch = power();
        switch.on_receive(2);
        assert_eq!(Some(true), switch.state());
        switch.on_receive(0);
        assert_eq!(Some(false), switch.state());
    }

    #[test]
    fn round_trip_test() {
        let mut controller = controller();
        let switch = power();
        controller.register(&switch).unwrap();

        switch.turn_on().unwrap();
        let packets = sent_packets(&mut controller);
        assert_eq!(DataType::Request, packets[0].command.data_type);
        assert_eq!(vec![MessageSet::new(MessageNumber(0x4000), 1)], packets[0].messages);
        assert_eq!(None, switch.state());

        controller.decode(&packets[0].to_bytes().unwrap());
        assert_eq!(Some(true), switch.state());
    }

    #[test]
    fn lambdas_test() {
        let mut controller = controller();
        let message = MessageNumber(0x4065);
        let switch = Rc::new(
            Switch::new("ENUM_IN_WATER_HEATER_POWER", message, ControllerMode::ReadWrite, None)
                .with_lambdas(|raw| raw == 2, |on| if on { 2 } else { 1 }),
        );
        controller.register(&switch).unwrap();

        switch.on_receive(1);
        assert_eq!(Some(false), switch.state());
        switch.turn_off().unwrap();
        let packets = sent_packets(&mut controller);
        assert_eq!(vec![MessageSet::new(MessageNumber(0x4065), 1)], packets[0].messages);
    }

    #[test]
    fn read_only_test() {
        let mut controller = controller();
        let mode = ControllerMode::ReadOnly;
        let thermo = Switch::new("ENUM_IN_STATE_THERMO", MessageNumber(0x4028), mode, None);
        let switch = Rc::new(thermo);
        controller.register(&switch).unwrap();

        assert_eq!(Err(WriteError::ReadOnly { message: MessageNumber(0x4028) }), switch.turn_on());
        assert!(sent_packets(&mut controller).is_empty());
    }
}
