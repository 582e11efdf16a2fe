//! The pieces every entity shares: what message it follows, on which unit,
//! and whether the controller may write it.

use alloc::string::String;
use core::cell::{Cell, RefCell};
use core::fmt;
use core::str::FromStr;

use crate::controller::ControllerHandle;
use crate::protocol::{Address, AddressParseError, MessageNumber, RawValue};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ControllerMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl ControllerMode {
    pub fn is_readable(self) -> bool {
        self != ControllerMode::WriteOnly
    }

    pub fn is_writable(self) -> bool {
        self != ControllerMode::ReadOnly
    }
}

/// A physical unit on the bus an entity can be scoped to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Device {
    pub address: Address,
}

impl Device {
    pub const fn new(address: Address) -> Self {
        Device { address }
    }
}

impl FromStr for Device {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Device::new)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.address, f)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum WriteError {
    /// The entity only reports state.
    ReadOnly { message: MessageNumber },
    /// The entity was never registered with a controller.
    Detached { message: MessageNumber },
    OutOfRange { message: MessageNumber, value: f32, min: f32, max: f32 },
    InvalidOption { message: MessageNumber, option: String },
    QueueFull { message: MessageNumber },
    /// The raw value does not fit the message's width on the wire.
    Unencodable { message: MessageNumber, value: RawValue },
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteError::ReadOnly { message } => write!(f, "{} is read-only", message),
            WriteError::Detached { message } => {
                write!(f, "{} is not attached to a controller", message)
            }
            WriteError::OutOfRange { message, value, min, max } => {
                write!(f, "{} out of range [{}, {}] for {}", value, min, max, message)
            }
            WriteError::InvalidOption { message, option } => {
                write!(f, "'{}' invalid for {}", option, message)
            }
            WriteError::QueueFull { message } => {
                write!(f, "request queue full, dropped write to {}", message)
            }
            WriteError::Unencodable { message, value } => {
                write!(f, "{} does not fit {}", value, message)
            }
        }
    }
}

/// Identity and raw state of one entity.
///
/// The controller handle is attached when the owning component is registered
/// and is only ever used to issue requests.
pub struct Entity {
    label: String,
    message: MessageNumber,
    mode: ControllerMode,
    device: Option<Device>,
    last_value: Cell<Option<RawValue>>,
    parent: RefCell<Option<ControllerHandle>>,
}

impl Entity {
    pub fn new<L: Into<String>>(
        label: L,
        message: MessageNumber,
        mode: ControllerMode,
        device: Option<Device>,
    ) -> Self {
        Entity {
            label: label.into(),
            message,
            mode,
            device,
            last_value: Cell::new(None),
            parent: RefCell::new(None),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn message(&self) -> MessageNumber {
        self.message
    }

    pub fn mode(&self) -> ControllerMode {
        self.mode
    }

    pub fn device(&self) -> Option<&Device> {
        self.device.as_ref()
    }

    pub fn last_value(&self) -> Option<RawValue> {
        self.last_value.get()
    }

    /// Whether a value reported by (or sent to) `address` belongs to this
    /// entity. Unscoped entities accept any unit.
    pub fn matches(&self, address: &Address) -> bool {
        self.device.map_or(true, |device| device.address == *address)
    }

    pub(crate) fn record(&self, value: RawValue) {
        self.last_value.set(Some(value));
    }

    pub(crate) fn set_parent(&self, controller: ControllerHandle) {
        *self.parent.borrow_mut() = Some(controller);
    }

    pub fn is_attached(&self) -> bool {
        self.parent.borrow().is_some()
    }

    /// Queue a write of `value` to this entity's message. Range and option
    /// checks belong to the typed adapter calling this.
    pub fn write(&self, value: RawValue) -> Result<(), WriteError> {
        if !self.mode.is_writable() {
            return Err(WriteError::ReadOnly { message: self.message });
        }
        match self.parent.borrow().as_ref() {
            Some(controller) => controller.write(self.message, self.device.as_ref(), value),
            None => Err(WriteError::Detached { message: self.message }),
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("label", &self.label)
            .field("message", &self.message)
            .field("mode", &self.mode)
            .field("device", &self.device)
            .field("last_value", &self.last_value.get())
            .finish()
    }
}

/// Anything the controller can route decoded values to.
pub trait Component {
    fn entity(&self) -> &Entity;

    fn on_receive(&self, value: RawValue);
}
