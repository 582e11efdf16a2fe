use nom::number::complete::be_u8;
use nom::sequence::tuple;
use nom::IResult;
use num_enum::{FromPrimitive, IntoPrimitive};

use super::encoding::{check_len, Encodable, EncodingError};

#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, FromPrimitive, IntoPrimitive)]
pub enum PacketType {
    StandBy = 0,
    Normal = 1,
    Gathering = 2,
    Install = 3,
    Download = 4,
    #[num_enum(default)]
    Unknown = 0x0f,
}

#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, FromPrimitive, IntoPrimitive)]
pub enum DataType {
    #[num_enum(default)]
    Undefined = 0,
    Read = 1,
    Write = 2,
    Request = 3,
    Notification = 4,
    Response = 5,
    Ack = 6,
    Nack = 7,
}

impl DataType {
    /// Whether message values in a packet of this type describe state worth
    /// publishing. Read requests only carry placeholders.
    pub fn carries_state(self) -> bool {
        match self {
            DataType::Write
            | DataType::Request
            | DataType::Notification
            | DataType::Response => true,
            DataType::Undefined | DataType::Read | DataType::Ack | DataType::Nack => false,
        }
    }
}

// 3 bytes:
//
//  0                 1                 2
// |I VV RR xxx|     |TTTT DDDD|       |NN|
//
// I:  packet information flag
// VV: protocol version
// RR: retry count
// T:  packet type
// D:  data type
// N:  packet number
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Command {
    pub packet_information: bool,
    pub protocol_version: u8,
    pub retry_count: u8,
    pub packet_type: PacketType,
    pub data_type: DataType,
    pub packet_number: u8,
}

impl Command {
    pub const LEN: usize = 3;

    pub fn new(data_type: DataType, packet_number: u8) -> Self {
        Command {
            packet_information: true,
            protocol_version: 2,
            retry_count: 0,
            packet_type: PacketType::Normal,
            data_type,
            packet_number,
        }
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, (flags, types, packet_number)) = tuple((be_u8, be_u8, be_u8))(input)?;
        Ok((input, Command {
            packet_information: flags & 0b1000_0000 != 0,
            protocol_version: (flags & 0b0110_0000) >> 5,
            retry_count: (flags & 0b0001_1000) >> 3,
            packet_type: PacketType::from(types >> 4),
            data_type: DataType::from(types & 0x0f),
            packet_number,
        }))
    }
}

impl Encodable for Command {
    fn encoded_len(&self) -> usize {
        Self::LEN
    }

    fn encode<'a>(&self, into: &'a mut [u8]) -> Result<&'a [u8], EncodingError> {
        check_len(into, Self::LEN)?;
        into[0] = (if self.packet_information { 0b1000_0000 } else { 0 })
            | ((self.protocol_version & 0b11) << 5)
            | ((self.retry_count & 0b11) << 3);
        into[1] = (u8::from(self.packet_type) << 4) | (u8::from(self.data_type) & 0x0f);
        into[2] = self.packet_number;
        Ok(into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_test() {
        assert_eq!(
            Ok((&b""[..], Command {
                packet_information: true,
                protocol_version: 2,
                retry_count: 1,
                packet_type: PacketType::Normal,
                data_type: DataType::Notification,
                packet_number: 0x2a,
            })),
            Command::parse(&[0xc8, 0x14, 0x2a])
        );
    }

    #[test]
    fn unknown_types_test() {
        let (_, command) = Command::parse(&[0x40, 0x9e, 0x00]).unwrap();
        assert!(!command.packet_information);
        assert_eq!(PacketType::Unknown, command.packet_type);
        assert_eq!(DataType::Undefined, command.data_type);
    }

    #[test]
    fn encode_test() {
        let mut buf = [0u8; 3];
        let command = Command::new(DataType::Request, 7);
        assert_eq!(Ok(&[0xc0u8, 0x13, 0x07][..]), command.encode(&mut buf));
    }

    #[test]
    fn carries_state_test() {
        assert!(DataType::Notification.carries_state());
        assert!(DataType::Request.carries_state());
        assert!(!DataType::Read.carries_state());
        assert!(!DataType::Ack.carries_state());
    }
}
