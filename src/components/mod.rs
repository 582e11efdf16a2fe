//! Typed adapters between raw message values and what the host shows.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::entity::{Component, WriteError};

mod binary_sensor;
mod climate;
mod number;
mod select;
mod sensor;
mod switch;
mod text_sensor;

pub use binary_sensor::BinarySensor;
pub use climate::{
    Climate, ClimateAction, ClimateActionMap, ClimateCall, ClimateMode, ClimateState, ClimateTraits,
    ControlError,
};
pub use number::Number;
pub use select::Select;
pub use sensor::Sensor;
pub use switch::Switch;
pub use text_sensor::TextSensor;

/// Last published value of an adapter and who to tell when it changes.
pub struct State<T> {
    value: RefCell<Option<T>>,
    callbacks: RefCell<Vec<Box<dyn Fn(&T)>>>,
}

impl<T: Clone> State<T> {
    pub fn new() -> Self {
        State { value: RefCell::new(None), callbacks: RefCell::new(Vec::new()) }
    }

    pub fn get(&self) -> Option<T> {
        self.value.borrow().clone()
    }

    pub fn publish(&self, value: T) {
        *self.value.borrow_mut() = Some(value.clone());
        for callback in self.callbacks.borrow().iter() {
            callback(&value);
        }
    }

    pub fn add_on_state_callback<F: Fn(&T) + 'static>(&self, callback: F) {
        self.callbacks.borrow_mut().push(Box::new(callback));
    }
}

impl<T: Clone> Default for State<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// An adapter that can be told to change its value on the bus.
pub trait Writable: Component {
    type Value;

    fn write_value(&self, value: Self::Value) -> Result<(), WriteError>;
}
