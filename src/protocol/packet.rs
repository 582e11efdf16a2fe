use alloc::vec::Vec;

use nom::number::complete::be_u8;
use nom::sequence::tuple;
use nom::IResult;

use super::address::Address;
use super::command::{Command, DataType};
use super::encoding::{check_len, Encodable, EncodingError};
use super::frame::{Frame, FrameParsingError, FRAMING_LEN, MAX_FRAME_LEN};
use super::message::MessageSet;

/// Most message sets a single packet can announce in its capacity byte.
pub const MAX_MESSAGES: usize = u8::MAX as usize;

// Payload layout, between the size field and the checksum:
//
//  0  1  2   3  4  5   6  7  8   9   10 ...
// SA SA SA  DA DA DA  C0 C1 C2  CAP  message sets
//
// SA:  source address
// DA:  destination address
// C*:  command
// CAP: number of message sets that follow
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Packet {
    pub source: Address,
    pub destination: Address,
    pub command: Command,
    pub messages: Vec<MessageSet>,
}

const HEADER_LEN: usize = Address::LEN * 2 + Command::LEN + 1;

impl Packet {
    /// Length of a framed packet carrying no message sets.
    pub const EMPTY_LEN: usize = FRAMING_LEN + HEADER_LEN;

    pub fn new(
        source: Address,
        destination: Address,
        command: Command,
        messages: Vec<MessageSet>,
    ) -> Self {
        Packet { source, destination, command, messages }
    }

    /// The unit a packet's values describe: whoever reports them, or whoever
    /// is being asked about or told to change them.
    pub fn subject(&self) -> Address {
        match self.command.data_type {
            DataType::Notification | DataType::Response | DataType::Ack | DataType::Nack => {
                self.source
            }
            _ => self.destination,
        }
    }

    pub fn parse_payload(input: &[u8]) -> IResult<&[u8], Self> {
        let (mut input, (source, destination, command, capacity)) =
            tuple((Address::parse, Address::parse, Command::parse, be_u8))(input)?;

        let mut messages = Vec::with_capacity(capacity as usize);
        for _ in 0..capacity {
            let (rest, set) = MessageSet::parse(input, capacity)?;
            messages.push(set);
            input = rest;
        }

        Ok((input, Packet { source, destination, command, messages }))
    }

    /// Parse one complete frame from the start of `data` and decode its
    /// payload. Returns the bytes following the frame.
    pub fn parse(data: &[u8]) -> Result<(Self, &[u8]), FrameParsingError> {
        let (frame, remaining_data) = Frame::parse(data)?;
        match Self::parse_payload(frame.payload) {
            Ok((_, packet)) => Ok((packet, remaining_data)),
            Err(_) => Err(FrameParsingError::InvalidPayload),
        }
    }

    /// Encode into a freshly allocated buffer of exactly the right size.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodingError> {
        let mut buf = alloc::vec![0u8; self.encoded_len()];
        self.encode(&mut buf)?;
        Ok(buf)
    }
}

impl Encodable for Packet {
    fn encoded_len(&self) -> usize {
        Self::EMPTY_LEN + self.messages.iter().map(Encodable::encoded_len).sum::<usize>()
    }

    fn encode<'a>(&self, into: &'a mut [u8]) -> Result<&'a [u8], EncodingError> {
        let len = self.encoded_len();
        if len > MAX_FRAME_LEN {
            return Err(EncodingError::FrameTooLarge(len));
        }
        check_len(into, len)?;
        if self.messages.len() > MAX_MESSAGES {
            return Err(EncodingError::TooManyMessages(self.messages.len()));
        }

        self.source.encode(&mut into[3..6])?;
        self.destination.encode(&mut into[6..9])?;
        self.command.encode(&mut into[9..12])?;
        into[12] = self.messages.len() as u8;

        let mut cursor = 3 + HEADER_LEN;
        for set in &self.messages {
            let len = set.encoded_len();
            set.encode(&mut into[cursor..cursor + len])?;
            cursor += len;
        }

        Frame::seal(into);
        Ok(into)
    }
}
