mod address;
mod command;
mod frame;
mod message;
mod packet;

pub mod encoding;

pub use address::{Address, AddressClass, AddressParseError};
pub use command::{Command, DataType, PacketType};
pub use encoding::{Encodable, EncodingError};
pub use frame::{Frame, FrameParsingError, FRAME_END, FRAME_START, MAX_FRAME_LEN, MIN_FRAME_LEN};
pub use message::{MessageKind, MessageNumber, MessageSet, MessageValue, RawValue};
pub use packet::{Packet, MAX_MESSAGES};
