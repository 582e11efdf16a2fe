use alloc::string::String;

use super::State;
use crate::entity::{Component, ControllerMode, Device, Entity};
use crate::protocol::{MessageNumber, RawValue};

/// On whenever the raw value is nonzero.
pub struct BinarySensor {
    entity: Entity,
    state: State<bool>,
}

impl BinarySensor {
    pub fn new<L: Into<String>>(label: L, message: MessageNumber, device: Option<Device>) -> Self {
        BinarySensor {
            entity: Entity::new(label, message, ControllerMode::ReadOnly, device),
            state: State::new(),
        }
    }

    pub fn state(&self) -> Option<bool> {
        self.state.get()
    }

    pub fn add_on_state_callback<F: Fn(&bool) + 'static>(&self, callback: F) {
        self.state.add_on_state_callback(callback);
    }
}

impl Component for BinarySensor {
    fn entity(&self) -> &Entity {
        &self.entity
    }

    fn on_receive(&self, value: RawValue) {
        self.state.publish(value != 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonzero_is_on_test() {
        let sensor = BinarySensor::new("ENUM_IN_STATE_DEFROST_MODE", MessageNumber(0x402e), None);
        assert_eq!(None, sensor.state());
        sensor.on_receive(0);
        assert_eq!(Some(false), sensor.state());
        sensor.on_receive(-1);
        assert_eq!(Some(true), sensor.state());
        assert!(!sensor.entity().mode().is_writable());
    }
}
