use alloc::boxed::Box;
use alloc::string::String;

use super::State;
use crate::entity::{Component, ControllerMode, Device, Entity};
use crate::protocol::{MessageNumber, RawValue};

/// A numeric reading. Sensors never write.
pub struct Sensor {
    entity: Entity,
    state: State<f32>,
    from_raw: Box<dyn Fn(RawValue) -> f32>,
}

impl Sensor {
    pub fn new<L: Into<String>>(label: L, message: MessageNumber, device: Option<Device>) -> Self {
        Sensor {
            entity: Entity::new(label, message, ControllerMode::ReadOnly, device),
            state: State::new(),
            from_raw: Box::new(|raw: RawValue| raw as f32),
        }
    }

    pub fn with_lambda<F: Fn(RawValue) -> f32 + 'static>(mut self, from_raw: F) -> Self {
        self.from_raw = Box::new(from_raw);
        self
    }

    pub fn state(&self) -> Option<f32> {
        self.state.get()
    }

    pub fn add_on_state_callback<F: Fn(&f32) + 'static>(&self, callback: F) {
        self.state.add_on_state_callback(callback);
    }
}

impl Component for Sensor {
    fn entity(&self) -> &Entity {
        &self.entity
    }

    fn on_receive(&self, value: RawValue) {
        self.state.publish((self.from_raw)(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::testing::*;
    use crate::protocol::DataType;
    use alloc::rc::Rc;

    #[test]
    fn outdoor_temperature_test() {
        let mut controller = controller();
        let outdoor = Some("10.00.00".parse().unwrap());
        let sensor = Rc::new(
            Sensor::new("VAR_OUT_SENSOR_AIROUT", MessageNumber(0x8204), outdoor)
                .with_lambda(|raw| raw as f32 / 10.0),
        );
        controller.register(&sensor).unwrap();

        controller.decode(&frame("10.00.00", "b0.ff.20", DataType::Notification, &[(0x8204, -55)]));
        assert_eq!(Some(-5.5), sensor.state());

        // same message from another unit
        controller.decode(&frame("10.00.01", "b0.ff.20", DataType::Notification, &[(0x8204, 120)]));
        assert_eq!(Some(-5.5), sensor.state());
    }

    #[test]
    fn publishes_repeated_values_test() {
        let sensor = Sensor::new("VAR_IN_TEMP_ROOM_F", MessageNumber(0x4203), None);
        let count = Rc::new(core::cell::Cell::new(0));
        let seen = count.clone();
        sensor.add_on_state_callback(move |_| seen.set(seen.get() + 1));

        sensor.on_receive(215);
        sensor.on_receive(215);
        assert_eq!(2, count.get());
        assert_eq!(Some(215.0), sensor.state());
    }
}
