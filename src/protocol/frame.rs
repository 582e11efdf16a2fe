use core::fmt;

use nom::bytes::streaming::{tag, take};
use nom::number::streaming::{be_u16, be_u8};
use nom::sequence::tuple;
use nom::IResult;

pub const FRAME_START: u8 = 0x32;
pub const FRAME_END: u8 = 0x34;

/// Start byte, two size bytes, two checksum bytes and the end byte.
pub const FRAMING_LEN: usize = 6;
pub const MIN_FRAME_LEN: usize = 16;
pub const MAX_FRAME_LEN: usize = 1500;

/// One checksum-validated unit of bus transmission.
///
/// The payload is everything between the size field and the checksum, i.e.
/// the addresses, command and message sets of a `Packet`.
#[derive(Debug, Eq, PartialEq)]
pub struct Frame<'a> {
    pub payload: &'a [u8],
    checksum: u16,
}

#[derive(Debug, Eq, PartialEq)]
pub enum FrameParsingError {
    InvalidStartByte,
    InvalidEndByte,
    UnexpectedSize(usize),
    InvalidChecksum { received: u16, calculated: u16 },
    IncompleteData(Option<usize>),
    InvalidPayload,
}

impl fmt::Display for FrameParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameParsingError::InvalidStartByte => write!(f, "invalid start byte"),
            FrameParsingError::InvalidEndByte => write!(f, "invalid end byte"),
            FrameParsingError::UnexpectedSize(size) => write!(f, "unexpected frame size {}", size),
            FrameParsingError::InvalidChecksum { received, calculated } => write!(
                f,
                "checksum mismatch (received 0x{:04x}, calculated 0x{:04x})",
                received, calculated
            ),
            FrameParsingError::IncompleteData(Some(n)) => {
                write!(f, "incomplete frame, {} more bytes needed", n)
            }
            FrameParsingError::IncompleteData(None) => write!(f, "incomplete frame"),
            FrameParsingError::InvalidPayload => write!(f, "malformed packet payload"),
        }
    }
}

impl<'a> From<nom::Err<nom::error::Error<&'a [u8]>>> for FrameParsingError {
    fn from(err: nom::Err<nom::error::Error<&'a [u8]>>) -> Self {
        match err {
            nom::Err::Incomplete(nom::Needed::Size(size)) => {
                FrameParsingError::IncompleteData(Some(size.get()))
            }
            nom::Err::Incomplete(nom::Needed::Unknown) => FrameParsingError::IncompleteData(None),
            nom::Err::Error(_) | nom::Err::Failure(_) => FrameParsingError::InvalidStartByte,
        }
    }
}

fn header(input: &[u8]) -> IResult<&[u8], usize> {
    let (input, _) = tag(&[FRAME_START][..])(input)?;
    let (input, size) = be_u16(input)?;
    Ok((input, size as usize + 2))
}

fn body(input: &[u8], payload_len: usize) -> IResult<&[u8], (&[u8], u16, u8)> {
    tuple((take(payload_len), be_u16, be_u8))(input)
}

impl<'a> Frame<'a> {
    /// CRC-16/XMODEM, as used over the payload of every frame.
    pub fn checksum(payload: &[u8]) -> u16 {
        payload.iter().fold(0u16, |crc, byte| {
            (0..8).fold(crc ^ ((*byte as u16) << 8), |crc, _| {
                if crc & 0x8000 != 0 { (crc << 1) ^ 0x1021 } else { crc << 1 }
            })
        })
    }

    fn validate_checksum(&self) -> Result<(), FrameParsingError> {
        let calculated = Self::checksum(self.payload);
        if calculated == self.checksum {
            Ok(())
        } else {
            Err(FrameParsingError::InvalidChecksum { received: self.checksum, calculated })
        }
    }

    /// Split off any junk before the next start byte.
    ///
    /// Returns `(from_start_byte, skipped)`. If there is no start byte at all,
    /// the first half is empty.
    pub fn parse_until(data: &[u8]) -> (&[u8], &[u8]) {
        match data.iter().position(|b| *b == FRAME_START) {
            Some(pos) => (&data[pos..], &data[..pos]),
            None => (&data[data.len()..], data),
        }
    }

    /// Full frame length announced by the header at the start of `data`.
    pub fn expected_len(data: &[u8]) -> Option<usize> {
        header(data).ok().map(|(_, len)| len)
    }

    pub fn parse(data: &'a [u8]) -> Result<(Self, &'a [u8]), FrameParsingError> {
        let (rest, len) = header(data)?;
        if len < MIN_FRAME_LEN || len > MAX_FRAME_LEN {
            return Err(FrameParsingError::UnexpectedSize(len));
        }

        let (remaining_data, (payload, checksum, end)) = body(rest, len - FRAMING_LEN)?;
        if end != FRAME_END {
            return Err(FrameParsingError::InvalidEndByte);
        }

        let frame = Frame { payload, checksum };
        frame.validate_checksum()?;
        Ok((frame, remaining_data))
    }

    /// Fill in the framing around a payload already written at
    /// `into[3..into.len() - 3]`.
    pub(crate) fn seal(into: &mut [u8]) {
        let len = into.len();
        let size = (len - 2) as u16;
        into[0] = FRAME_START;
        into[1..3].copy_from_slice(&size.to_be_bytes());
        let checksum = Self::checksum(&into[3..len - 3]);
        into[len - 3..len - 1].copy_from_slice(&checksum.to_be_bytes());
        into[len - 1] = FRAME_END;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY: &[u8] = &[];

    const NOTIFICATION: &[u8] = &[
        0x32, 0x00, 0x15,
        0x20, 0x00, 0x00, 0xb0, 0xff, 0x20, 0xc0, 0x14, 0x2a, 0x02,
        0x40, 0x00, 0x01,
        0x42, 0x01, 0x00, 0xe1,
        0x56, 0x72,
        0x34,
    ];

    #[test]
    fn checksum_test() {
        assert_eq!(0x31c3, Frame::checksum(b"123456789"));
    }

    #[test]
    fn parse_test() {
        assert_eq!(
            Ok((Frame { payload: &NOTIFICATION[3..20], checksum: 0x5672 }, EMPTY)),
            Frame::parse(NOTIFICATION)
        );
    }

    #[test]
    fn parse_leaves_trailing_bytes() {
        let mut buf = NOTIFICATION.to_vec();
        buf.extend_from_slice(&[0x32, 0x00]);
        let (_, rest) = Frame::parse(&buf).unwrap();
        assert_eq!(&[0x32, 0x00], rest);
    }

    #[test]
    fn corrupted_checksum_test() {
        let mut buf = NOTIFICATION.to_vec();
        buf[20] = 0x00;
        assert_eq!(
            Err(FrameParsingError::InvalidChecksum { received: 0x0072, calculated: 0x5672 }),
            Frame::parse(&buf)
        );
    }

    #[test]
    fn corrupted_payload_test() {
        let mut buf = NOTIFICATION.to_vec();
        buf[15] = 0x02;
        assert!(matches!(Frame::parse(&buf), Err(FrameParsingError::InvalidChecksum { .. })));
    }

    #[test]
    fn truncated_test() {
        assert!(matches!(
            Frame::parse(&NOTIFICATION[..19]),
            Err(FrameParsingError::IncompleteData(_))
        ));
    }

    #[test]
    fn framing_errors_test() {
        assert_eq!(Err(FrameParsingError::InvalidStartByte), Frame::parse(&NOTIFICATION[1..]));

        let mut buf = NOTIFICATION.to_vec();
        buf[22] = 0x00;
        assert_eq!(Err(FrameParsingError::InvalidEndByte), Frame::parse(&buf));

        assert_eq!(
            Err(FrameParsingError::UnexpectedSize(7)),
            Frame::parse(&[0x32, 0x00, 0x05, 0x00, 0x00, 0x00, 0x34])
        );
    }

    #[test]
    fn parse_until_test() {
        let mut buf = vec![0x00, 0x34, 0x12];
        buf.extend_from_slice(NOTIFICATION);
        let (rest, junk) = Frame::parse_until(&buf);
        assert_eq!(&[0x00, 0x34, 0x12], junk);
        assert_eq!(NOTIFICATION, rest);

        assert_eq!((EMPTY, &[0x01u8, 0x02][..]), Frame::parse_until(&[0x01, 0x02]));
    }

    #[test]
    fn expected_len_test() {
        assert_eq!(Some(23), Frame::expected_len(NOTIFICATION));
        assert_eq!(None, Frame::expected_len(&NOTIFICATION[..2]));
        assert_eq!(None, Frame::expected_len(&NOTIFICATION[1..]));
    }

    #[test]
    fn seal_test() {
        let mut buf = [0u8; 23];
        buf[3..20].copy_from_slice(&NOTIFICATION[3..20]);
        Frame::seal(&mut buf);
        assert_eq!(NOTIFICATION, &buf[..]);
    }
}
