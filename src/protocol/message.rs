use alloc::vec::Vec;
use core::fmt;

use nom::combinator::rest;
use nom::error::{Error, ErrorKind};
use nom::number::complete::{be_i16, be_i32, be_u16, be_u8};
use nom::IResult;

use super::encoding::{check_len, Encodable, EncodingError};

/// Numeric value of a message as it travels on the bus.
pub type RawValue = i32;

/// 16-bit identifier of one protocol variable.
///
/// Bits 9 and 10 of the number select the width of its value.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MessageNumber(pub u16);

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MessageKind {
    Enum,
    Variable,
    LongVariable,
    Structure,
}

impl MessageNumber {
    pub fn kind(self) -> MessageKind {
        match (self.0 & 0x0600) >> 9 {
            0 => MessageKind::Enum,
            1 => MessageKind::Variable,
            2 => MessageKind::LongVariable,
            _ => MessageKind::Structure,
        }
    }
}

impl From<u16> for MessageNumber {
    fn from(number: u16) -> Self {
        MessageNumber(number)
    }
}

impl fmt::Display for MessageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04x}", self.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MessageValue {
    Numeric(RawValue),
    Structure(Vec<u8>),
}

impl MessageValue {
    pub fn numeric(&self) -> Option<RawValue> {
        match self {
            MessageValue::Numeric(value) => Some(*value),
            MessageValue::Structure(_) => None,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MessageSet {
    pub number: MessageNumber,
    pub value: MessageValue,
}

impl MessageSet {
    pub fn new(number: MessageNumber, value: RawValue) -> Self {
        MessageSet { number, value: MessageValue::Numeric(value) }
    }

    /// The zero value of the right width, as sent in read requests.
    pub fn placeholder(number: MessageNumber) -> Self {
        match number.kind() {
            MessageKind::Structure => {
                MessageSet { number, value: MessageValue::Structure(Vec::new()) }
            }
            _ => MessageSet::new(number, 0),
        }
    }

    /// Parse one message set. A structure swallows the rest of the payload, so
    /// it is only accepted in a packet carrying a single message.
    pub fn parse(input: &[u8], capacity: u8) -> IResult<&[u8], Self> {
        let (input, number) = be_u16(input)?;
        let number = MessageNumber(number);
        let (input, value) = match number.kind() {
            MessageKind::Enum => {
                let (input, value) = be_u8(input)?;
                (input, MessageValue::Numeric(value as RawValue))
            }
            MessageKind::Variable => {
                let (input, value) = be_i16(input)?;
                (input, MessageValue::Numeric(value as RawValue))
            }
            MessageKind::LongVariable => {
                let (input, value) = be_i32(input)?;
                (input, MessageValue::Numeric(value))
            }
            MessageKind::Structure => {
                if capacity != 1 {
                    return Err(nom::Err::Failure(Error::new(input, ErrorKind::Verify)));
                }
                let (input, data) = rest(input)?;
                (input, MessageValue::Structure(data.to_vec()))
            }
        };
        Ok((input, MessageSet { number, value }))
    }

    /// Whether the value fits the width its message number calls for.
    /// Unsigned 16-bit values travel in the same two bytes as signed ones.
    pub fn check_value(&self) -> Result<(), EncodingError> {
        let value = match self.value {
            MessageValue::Numeric(value) => value,
            MessageValue::Structure(_) => return Ok(()),
        };
        let fits = match self.number.kind() {
            MessageKind::Enum => 0 <= value && value <= u8::MAX as RawValue,
            MessageKind::Variable => {
                (i16::MIN as RawValue) <= value && value <= u16::MAX as RawValue
            }
            MessageKind::LongVariable => true,
            MessageKind::Structure => false,
        };
        if fits {
            Ok(())
        } else {
            Err(EncodingError::ValueOutOfRange { message: self.number.0, value })
        }
    }
}

impl Encodable for MessageSet {
    fn encoded_len(&self) -> usize {
        2 + match (&self.value, self.number.kind()) {
            (MessageValue::Structure(data), _) => data.len(),
            (_, MessageKind::Enum) => 1,
            (_, MessageKind::Variable) => 2,
            (_, MessageKind::LongVariable) => 4,
            (_, MessageKind::Structure) => 0,
        }
    }

    fn encode<'a>(&self, into: &'a mut [u8]) -> Result<&'a [u8], EncodingError> {
        check_len(into, self.encoded_len())?;
        self.check_value()?;
        into[0..2].copy_from_slice(&self.number.0.to_be_bytes());
        match (&self.value, self.number.kind()) {
            (MessageValue::Structure(data), _) => into[2..].copy_from_slice(data),
            (MessageValue::Numeric(value), MessageKind::Enum) => into[2] = *value as u8,
            (MessageValue::Numeric(value), MessageKind::Variable) => {
                into[2..4].copy_from_slice(&(*value as u16).to_be_bytes());
            }
            (MessageValue::Numeric(value), MessageKind::LongVariable) => {
                into[2..6].copy_from_slice(&value.to_be_bytes());
            }
            (MessageValue::Numeric(_), MessageKind::Structure) => {}
        }
        Ok(into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_test() {
        assert_eq!(MessageKind::Enum, MessageNumber(0x4000).kind());
        assert_eq!(MessageKind::Variable, MessageNumber(0x4201).kind());
        assert_eq!(MessageKind::LongVariable, MessageNumber(0x8413).kind());
        assert_eq!(MessageKind::Structure, MessageNumber(0x0613).kind());
    }

    #[test]
    fn parse_test() {
        assert_eq!(
            Ok((&[0x42u8][..], MessageSet::new(MessageNumber(0x4000), 1))),
            MessageSet::parse(&[0x40, 0x00, 0x01, 0x42], 2)
        );
        assert_eq!(
            Ok((&b""[..], MessageSet::new(MessageNumber(0x8204), -55))),
            MessageSet::parse(&[0x82, 0x04, 0xff, 0xc9], 1)
        );
        assert_eq!(
            Ok((&b""[..], MessageSet::new(MessageNumber(0x8413), 0x1234))),
            MessageSet::parse(&[0x84, 0x13, 0x00, 0x00, 0x12, 0x34], 1)
        );
    }

    #[test]
    fn structure_test() {
        assert_eq!(
            Ok((&b""[..], MessageSet {
                number: MessageNumber(0x0613),
                value: MessageValue::Structure(vec![0x01, 0x02, 0x03]),
            })),
            MessageSet::parse(&[0x06, 0x13, 0x01, 0x02, 0x03], 1)
        );
        assert!(MessageSet::parse(&[0x06, 0x13, 0x01, 0x02, 0x03], 2).is_err());
    }

    #[test]
    fn truncated_test() {
        assert!(MessageSet::parse(&[0x42, 0x01, 0x00], 1).is_err());
    }

    #[test]
    fn encode_test() {
        let mut buf = [0u8; 4];
        assert_eq!(
            Ok(&[0x82u8, 0x04, 0xff, 0xc9][..]),
            MessageSet::new(MessageNumber(0x8204), -55).encode(&mut buf)
        );
        assert_eq!(
            Ok(&[0x42u8, 0x01, 0xff, 0xfe][..]),
            MessageSet::new(MessageNumber(0x4201), 0xfffe).encode(&mut buf)
        );
    }

    #[test]
    fn encode_out_of_range_test() {
        let mut buf = [0u8; 3];
        assert_eq!(
            Err(EncodingError::ValueOutOfRange { message: 0x4000, value: 256 }),
            MessageSet::new(MessageNumber(0x4000), 256).encode(&mut buf)
        );
        let mut buf = [0u8; 4];
        assert_eq!(
            Err(EncodingError::ValueOutOfRange { message: 0x4201, value: 70000 }),
            MessageSet::new(MessageNumber(0x4201), 70000).encode(&mut buf)
        );
        assert_eq!(Ok(()), MessageSet::new(MessageNumber(0x4201), -32768).check_value());
        assert!(MessageSet::new(MessageNumber(0x4011), 300).check_value().is_err());
        assert!(MessageSet::new(MessageNumber(0x0613), 0).check_value().is_err());
    }

    #[test]
    fn placeholder_test() {
        assert_eq!(4, MessageSet::placeholder(MessageNumber(0x4201)).encoded_len());
        assert_eq!(6, MessageSet::placeholder(MessageNumber(0x8413)).encoded_len());
        assert_eq!(2, MessageSet::placeholder(MessageNumber(0x0613)).encoded_len());
    }
}
