use alloc::boxed::Box;
use alloc::string::String;

use log::{debug, error};

use super::{State, Writable};
use crate::entity::{Component, ControllerMode, Device, Entity, WriteError};
use crate::protocol::{MessageNumber, RawValue};

/// A settable value limited to `[min_value, max_value]`.
///
/// The lambdas convert between the raw bus value and the published one, e.g.
/// tenths of a degree to degrees.
pub struct Number {
    entity: Entity,
    state: State<f32>,
    min_value: f32,
    max_value: f32,
    step: f32,
    from_raw: Box<dyn Fn(RawValue) -> f32>,
    to_raw: Box<dyn Fn(f32) -> RawValue>,
}

impl Number {
    pub fn new<L: Into<String>>(
        label: L,
        message: MessageNumber,
        mode: ControllerMode,
        device: Option<Device>,
        min_value: f32,
        max_value: f32,
    ) -> Self {
        Number {
            entity: Entity::new(label, message, mode, device),
            state: State::new(),
            min_value,
            max_value,
            step: 1.0,
            from_raw: Box::new(|raw: RawValue| raw as f32),
            to_raw: Box::new(|value: f32| libm::roundf(value) as RawValue),
        }
    }

    pub fn with_step(mut self, step: f32) -> Self {
        self.step = step;
        self
    }

    pub fn with_lambdas<F, T>(mut self, from_raw: F, to_raw: T) -> Self
    where
        F: Fn(RawValue) -> f32 + 'static,
        T: Fn(f32) -> RawValue + 'static,
    {
        self.from_raw = Box::new(from_raw);
        self.to_raw = Box::new(to_raw);
        self
    }

    pub fn min_value(&self) -> f32 {
        self.min_value
    }

    pub fn max_value(&self) -> f32 {
        self.max_value
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn state(&self) -> Option<f32> {
        self.state.get()
    }

    pub fn add_on_state_callback<F: Fn(&f32) + 'static>(&self, callback: F) {
        self.state.add_on_state_callback(callback);
    }

    pub fn in_range(&self, value: f32) -> bool {
        self.min_value <= value && value <= self.max_value
    }

    /// Validate and write. Nothing is published here; the new value shows up
    /// once the unit reports it back.
    pub fn set_value(&self, value: f32) -> Result<(), WriteError> {
        let message = self.entity.message();
        if !self.in_range(value) {
            error!("Validation Error: {} out of range for {}", value, message);
            let (min, max) = (self.min_value, self.max_value);
            return Err(WriteError::OutOfRange { message, value, min, max });
        }

        debug!("Number {} [{}] -> {}", message, self.entity.label(), value);
        self.entity.write((self.to_raw)(value)).map_err(|e| {
            error!("Number write failed: {}", e);
            e
        })
    }
}

impl Component for Number {
    fn entity(&self) -> &Entity {
        &self.entity
    }

    fn on_receive(&self, value: RawValue) {
        self.state.publish((self.from_raw)(value));
    }
}

impl Writable for Number {
    type Value = f32;

    fn write_value(&self, value: f32) -> Result<(), WriteError> {
        self.set_value(value)
    }
}
