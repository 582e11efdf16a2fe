#![cfg_attr(not(test), no_std)]

//! samsung_nasa
//!
//! Protocol implementation for the "NASA" bus spoken between Samsung heat
//! pump and air conditioner units, plus typed entities (switches, numbers,
//! selects, sensors and a climate) that follow individual bus messages.
//!
//! It is intended for use on embedded hardware, and as such is `no_std` with
//! `alloc`. The serial line runs at 9600 baud, 8 bits, even parity, 1 stop
//! bit (9600 8E1); configure your peripheral as such and hand it to a
//! [`Controller`](controller::Controller) through the `embedded-hal` serial
//! traits.
//!
//! ## General Usage
//!
//! Parse a packet off the wire:
//!
//! ```
//! use samsung_nasa::protocol::{Address, DataType, Frame, MessageNumber, Packet};
//!
//! let buf: &[u8] = &[0x00, 0x55, // junk before the frame
//!     0x32, 0x00, 0x15, 0x20, 0x00, 0x00, 0xb0, 0xff, 0x20, 0xc0, 0x14, 0x2a,
//!     0x02, 0x40, 0x00, 0x01, 0x42, 0x01, 0x00, 0xe1, 0x56, 0x72, 0x34];
//!
//! // Skip to the start of a frame
//! let (buf, skipped) = Frame::parse_until(buf);
//! assert_eq!(2, skipped.len());
//!
//! let (packet, _rest) = Packet::parse(buf).unwrap();
//! assert_eq!(Address::new(0x20, 0x00, 0x00), packet.source);
//! assert_eq!(DataType::Notification, packet.command.data_type);
//!
//! // Power on, target temperature 22.5
//! assert_eq!(MessageNumber(0x4000), packet.messages[0].number);
//! assert_eq!(Some(225), packet.messages[1].value.numeric());
//! ```
//!
//! Encode a packet for writing to the serial line:
//!
//! ```
//! use samsung_nasa::protocol::{
//!     Address, Command, DataType, Encodable, MessageNumber, MessageSet, Packet,
//! };
//!
//! let packet = Packet::new(
//!     Address::new(0x80, 0xff, 0x00),
//!     Address::new(0x20, 0x00, 0x00),
//!     Command::new(DataType::Request, 0),
//!     vec![MessageSet::new(MessageNumber(0x4000), 1)],
//! );
//!
//! let mut buf = [0u8; 32];
//! let encoded = packet.encode(&mut buf[..packet.encoded_len()]).unwrap();
//!
//! assert_eq!(
//!     //  ---- start  ---- size   ---- source        ---- destination
//!     &[0x32, 0x00, 0x11, 0x80, 0xff, 0x00, 0x20, 0x00, 0x00,
//!     //  ---- command           ---- capacity, message 0x4000 = 1
//!         0xc0, 0x13, 0x00, 0x01, 0x40, 0x00, 0x01,
//!     //  ---- CRC-16/XMODEM over the payload, end
//!         0x68, 0x16, 0x34][..],
//!     encoded
//! );
//! ```

extern crate alloc;

pub mod automation;
pub mod catalog;
pub mod components;
pub mod controller;
pub mod entity;
pub mod protocol;
pub mod registry;

#[doc(inline)]
pub use controller::{Controller, ControllerConfig, ControllerHandle};
#[doc(inline)]
pub use entity::{Component, ControllerMode, Device, Entity, WriteError};
#[doc(inline)]
pub use registry::{ConfigError, Registry};
