use core::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EncodingError {
    /// The output buffer is not exactly `encoded_len()` bytes long.
    BufferSize { expected: usize, actual: usize },
    /// A value does not fit the width its message number calls for.
    ValueOutOfRange { message: u16, value: i32 },
    /// More message sets than the capacity byte can count.
    TooManyMessages(usize),
    /// The frame would be longer than the bus allows.
    FrameTooLarge(usize),
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodingError::BufferSize { expected, actual } => {
                write!(f, "buffer is {} bytes, {} needed", actual, expected)
            }
            EncodingError::ValueOutOfRange { message, value } => {
                write!(f, "value {} does not fit message 0x{:04x}", value, message)
            }
            EncodingError::TooManyMessages(n) => write!(f, "{} messages exceed packet capacity", n),
            EncodingError::FrameTooLarge(len) => write!(f, "{} byte frame exceeds bus limit", len),
        }
    }
}

pub trait Encodable {
    fn encoded_len(&self) -> usize;

    fn encode<'a>(&self, into: &'a mut [u8]) -> Result<&'a [u8], EncodingError>;
}

pub(crate) fn check_len(into: &[u8], expected: usize) -> Result<(), EncodingError> {
    if into.len() != expected {
        Err(EncodingError::BufferSize { expected, actual: into.len() })
    } else {
        Ok(())
    }
}
