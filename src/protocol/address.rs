use core::fmt;
use core::str::FromStr;

use nom::number::complete::be_u8;
use nom::sequence::tuple;
use nom::IResult;
use num_enum::{FromPrimitive, IntoPrimitive};

use super::encoding::{check_len, Encodable, EncodingError};

#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, FromPrimitive, IntoPrimitive)]
pub enum AddressClass {
    Outdoor = 0x10,
    HTU = 0x11,
    Indoor = 0x20,
    ERV = 0x30,
    Diffuser = 0x35,
    MCU = 0x38,
    RMC = 0x40,
    WiredRemote = 0x50,
    PIM = 0x58,
    SIM = 0x59,
    Peak = 0x5a,
    PowerDivider = 0x5b,
    OnOffController = 0x60,
    WiFiKit = 0x62,
    CentralController = 0x65,
    DMS = 0x6a,
    JIGTester = 0x80,
    BroadcastSelfLayer = 0xb0,
    BroadcastControlLayer = 0xb1,
    BroadcastSetLayer = 0xb2,
    BroadcastModuleLayer = 0xb3,
    BroadcastCSRC = 0xc0,
    #[num_enum(default)]
    Undefined = 0xff,
}

/// A node on the bus: `class.channel.address`, written as hex like `20.00.00`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Address {
    pub class: u8,
    pub channel: u8,
    pub address: u8,
}

impl Address {
    pub const LEN: usize = 3;

    pub const fn new(class: u8, channel: u8, address: u8) -> Self {
        Address { class, channel, address }
    }

    pub fn class(&self) -> AddressClass {
        AddressClass::from(self.class)
    }

    pub fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, (class, channel, address)) = tuple((be_u8, be_u8, be_u8))(input)?;
        Ok((input, Address { class, channel, address }))
    }
}

impl Encodable for Address {
    fn encoded_len(&self) -> usize {
        Self::LEN
    }

    fn encode<'a>(&self, into: &'a mut [u8]) -> Result<&'a [u8], EncodingError> {
        check_len(into, Self::LEN)?;
        into[0] = self.class;
        into[1] = self.channel;
        into[2] = self.address;
        Ok(into)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}.{:02x}.{:02x}", self.class, self.channel, self.address)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AddressParseError;

impl fmt::Display for AddressParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected an address like 20.00.00")
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.').map(|part| u8::from_str_radix(part, 16));
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(Ok(class)), Some(Ok(channel)), Some(Ok(address)), None) => {
                Ok(Address { class, channel, address })
            }
            _ => Err(AddressParseError),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_test() {
        assert_eq!(Ok(Address::new(0x20, 0x00, 0x00)), "20.00.00".parse());
        assert_eq!(Ok(Address::new(0xb0, 0xff, 0x20)), "b0.FF.20".parse());
        assert_eq!(Err(AddressParseError), "20.00".parse::<Address>());
        assert_eq!(Err(AddressParseError), "20.00.00.00".parse::<Address>());
        assert_eq!(Err(AddressParseError), "20.zz.00".parse::<Address>());
    }

    #[test]
    fn display_test() {
        assert_eq!("80.ff.00", Address::new(0x80, 0xff, 0x00).to_string());
    }

    #[test]
    fn class_test() {
        assert_eq!(AddressClass::Indoor, Address::new(0x20, 0, 0).class());
        assert_eq!(AddressClass::Undefined, Address::new(0x21, 0, 0).class());
    }

    #[test]
    fn parse_encode_test() {
        let (rest, address) = Address::parse(&[0x10, 0x00, 0x01, 0xff]).unwrap();
        assert_eq!(Address::new(0x10, 0x00, 0x01), address);
        assert_eq!(&[0xff], rest);

        let mut buf = [0u8; 3];
        assert_eq!(Ok(&[0x10u8, 0x00, 0x01][..]), address.encode(&mut buf));
    }
}
