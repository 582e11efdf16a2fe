use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use embedded_hal::serial;
use heapless::Deque;
use log::{debug, error, trace, warn};

use crate::entity::{Component, Device, WriteError};
use crate::protocol::{
    Address, Command, DataType, Encodable, Frame, FrameParsingError, MessageKind, MessageNumber,
    MessageSet, Packet, RawValue, MAX_FRAME_LEN, MAX_MESSAGES, MIN_FRAME_LEN,
};
use crate::registry::{ConfigError, Registry};

/// Requests that may wait for the next `poll`. Anything beyond is dropped.
pub const MAX_PENDING_REQUESTS: usize = 16;

#[derive(Clone, Debug)]
pub struct ControllerConfig {
    /// Source address of every packet we send.
    pub address: Address,
    /// Where requests go when the entity has no device of its own.
    pub default_destination: Address,
    /// Trace read/write batches at info level.
    pub debug_log_messages: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            address: Address::new(0x80, 0xff, 0x00),
            default_destination: Address::new(0x20, 0x00, 0x00),
            debug_log_messages: false,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Request {
    Read { destination: Option<Address>, messages: Vec<MessageNumber> },
    Write { destination: Option<Address>, message: MessageNumber, value: RawValue },
}

/// One numeric value pulled out of a packet.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Decoded {
    pub message: MessageNumber,
    pub device: Address,
    pub value: RawValue,
}

struct Outbox {
    pending: Deque<Request, MAX_PENDING_REQUESTS>,
    debug_log_messages: bool,
}

/// Cheap, clonable way for entities and actions to ask the controller for
/// bus traffic. Requests are queued and go out on the next `poll`.
#[derive(Clone)]
pub struct ControllerHandle {
    outbox: Rc<RefCell<Outbox>>,
}

impl ControllerHandle {
    fn new(debug_log_messages: bool) -> Self {
        ControllerHandle {
            outbox: Rc::new(RefCell::new(Outbox { pending: Deque::new(), debug_log_messages })),
        }
    }

    fn enqueue(&self, request: Request) -> bool {
        match self.outbox.borrow_mut().pending.push_back(request) {
            Ok(()) => true,
            Err(request) => {
                error!("Request queue full, dropping {:?}", request);
                false
            }
        }
    }

    fn next_request(&self) -> Option<Request> {
        self.outbox.borrow_mut().pending.pop_front()
    }

    /// Ask for the current value of each message. An empty list is a no-op.
    pub fn read(&self, messages: &[MessageNumber]) -> bool {
        if messages.is_empty() {
            return true;
        }
        self.enqueue(Request::Read { destination: None, messages: messages.to_vec() })
    }

    /// Queue a write. Values that do not fit the message's width are
    /// refused here rather than dropped when the packet is built.
    pub fn write(
        &self,
        message: MessageNumber,
        device: Option<&Device>,
        value: RawValue,
    ) -> Result<(), WriteError> {
        if let Err(e) = MessageSet::new(message, value).check_value() {
            error!("Not writing {}: {}", message, e);
            return Err(WriteError::Unencodable { message, value });
        }
        if self.enqueue(Request::Write { destination: device.map(|d| d.address), message, value }) {
            Ok(())
        } else {
            Err(WriteError::QueueFull { message })
        }
    }

    pub fn pending(&self) -> usize {
        self.outbox.borrow().pending.len()
    }

    pub fn debug_log_messages(&self) -> bool {
        self.outbox.borrow().debug_log_messages
    }
}

/// Owns the bus: frames incoming bytes, routes decoded values to registered
/// components and sends queued requests.
pub struct Controller<S> where S: serial::Read<u8> + serial::Write<u8> {
    serial: S,
    config: ControllerConfig,
    registry: Registry,
    handle: ControllerHandle,
    rx_buffer: heapless::Vec<u8, MAX_FRAME_LEN>,
    packet_number: u8,
}

impl<S> Controller<S> where S: serial::Read<u8> + serial::Write<u8> {
    pub fn new(serial: S, config: ControllerConfig) -> Self {
        let handle = ControllerHandle::new(config.debug_log_messages);
        Controller {
            serial,
            config,
            registry: Registry::new(),
            handle,
            rx_buffer: heapless::Vec::new(),
            packet_number: 0,
        }
    }

    pub fn handle(&self) -> ControllerHandle {
        self.handle.clone()
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn serial_mut(&mut self) -> &mut S {
        &mut self.serial
    }

    /// Route values for the component's message to it from now on, and give
    /// it a handle for its own requests.
    pub fn register<C>(&mut self, component: &Rc<C>) -> Result<(), ConfigError>
    where
        C: Component + 'static,
    {
        let entity = component.entity();
        self.registry.insert(component.clone())?;
        entity.set_parent(self.handle());
        debug!("Registered {} [{}]", entity.message(), entity.label());
        Ok(())
    }

    pub fn read(&self, messages: &[MessageNumber]) -> bool {
        self.handle.read(messages)
    }

    pub fn write(
        &self,
        message: MessageNumber,
        device: Option<&Device>,
        value: RawValue,
    ) -> Result<(), WriteError> {
        self.handle.write(message, device, value)
    }

    /// Drain whatever the serial port has, decode complete frames, then send
    /// everything queued since the last poll.
    pub fn poll(&mut self) -> Vec<Decoded> {
        let mut decoded = Vec::new();
        loop {
            match self.serial.read() {
                Ok(byte) => decoded.extend(self.receive_byte(byte)),
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(_)) => {
                    warn!("Serial read error, dropping partial frame");
                    self.rx_buffer.clear();
                    break;
                }
            }
        }
        self.transmit();
        decoded
    }

    /// The receive half of `poll`, for bytes that arrive some other way.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Decoded> {
        let mut decoded = Vec::new();
        for byte in bytes {
            decoded.extend(self.receive_byte(*byte));
        }
        decoded
    }

    fn receive_byte(&mut self, byte: u8) -> Vec<Decoded> {
        if self.rx_buffer.push(byte).is_err() {
            warn!("Receive buffer overflow, discarding {} bytes", self.rx_buffer.len());
            self.rx_buffer.clear();
            return Vec::new();
        }
        self.process_buffer()
    }

    fn process_buffer(&mut self) -> Vec<Decoded> {
        let mut decoded = Vec::new();
        loop {
            let skipped = Frame::parse_until(&self.rx_buffer).1.len();
            if skipped > 0 {
                trace!("Skipping {} bytes before frame start", skipped);
                self.discard(skipped);
            }

            let len = match Frame::expected_len(&self.rx_buffer) {
                Some(len) => len,
                None => break,
            };
            if len < MIN_FRAME_LEN || len > MAX_FRAME_LEN {
                warn!("Implausible frame size {}, resynchronising", len);
                self.discard(1);
                continue;
            }
            if self.rx_buffer.len() < len {
                break;
            }

            let frame = self.rx_buffer[..len].to_vec();
            match self.decode_frame(&frame) {
                Ok(values) => {
                    decoded.extend(values);
                    self.discard(len);
                }
                Err(FrameParsingError::InvalidEndByte) => {
                    warn!("Dropping frame: {}", FrameParsingError::InvalidEndByte);
                    self.discard(1);
                }
                Err(e) => {
                    warn!("Dropping frame: {}", e);
                    self.discard(len);
                }
            }
        }
        decoded
    }

    fn discard(&mut self, n: usize) {
        let n = n.min(self.rx_buffer.len());
        let remaining = self.rx_buffer.len() - n;
        self.rx_buffer.copy_within(n.., 0);
        self.rx_buffer.truncate(remaining);
    }

    /// Decode one complete frame and dispatch its values. Malformed frames are
    /// logged and yield nothing.
    pub fn decode(&self, raw: &[u8]) -> Vec<Decoded> {
        match self.decode_frame(raw) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!("Dropping frame: {}", e);
                Vec::new()
            }
        }
    }

    fn decode_frame(&self, raw: &[u8]) -> Result<Vec<Decoded>, FrameParsingError> {
        let (packet, _) = Packet::parse(raw)?;
        debug!(
            "{} -> {} {:?} #{} ({} messages)",
            packet.source,
            packet.destination,
            packet.command.data_type,
            packet.command.packet_number,
            packet.messages.len()
        );

        let subject = packet.subject();
        let carries_state = packet.command.data_type.carries_state();
        let mut decoded = Vec::with_capacity(packet.messages.len());
        for set in &packet.messages {
            let value = match set.value.numeric() {
                Some(value) => value,
                None => {
                    trace!("Structure {} not dispatched", set.number);
                    continue;
                }
            };
            if carries_state {
                self.registry.dispatch(&subject, set.number, value);
            }
            decoded.push(Decoded { message: set.number, device: subject, value });
        }
        Ok(decoded)
    }

    fn next_command(&mut self, data_type: DataType) -> Command {
        let command = Command::new(data_type, self.packet_number);
        self.packet_number = self.packet_number.wrapping_add(1);
        command
    }

    /// Turn a queued request into packets, in order. Reads are split so no
    /// packet exceeds the message count or frame length limits, and each
    /// structure message is read on its own.
    pub fn build_packets(&mut self, request: Request) -> Vec<Packet> {
        match request {
            Request::Read { destination, messages } => {
                let destination = destination.unwrap_or(self.config.default_destination);
                let mut packets = Vec::new();
                let mut batch = Vec::new();
                let mut batch_len = Packet::EMPTY_LEN;

                for set in messages.into_iter().map(MessageSet::placeholder) {
                    let len = set.encoded_len();
                    let alone = set.number.kind() == MessageKind::Structure;
                    let full = batch.len() == MAX_MESSAGES || batch_len + len > MAX_FRAME_LEN;
                    if !batch.is_empty() && (alone || full) {
                        let sets = core::mem::take(&mut batch);
                        packets.push(self.packet(destination, DataType::Read, sets));
                        batch_len = Packet::EMPTY_LEN;
                    }
                    if alone {
                        packets.push(self.packet(destination, DataType::Read, alloc::vec![set]));
                    } else {
                        batch.push(set);
                        batch_len += len;
                    }
                }
                if !batch.is_empty() {
                    packets.push(self.packet(destination, DataType::Read, batch));
                }
                packets
            }
            Request::Write { destination, message, value } => {
                let destination = destination.unwrap_or(self.config.default_destination);
                let sets = alloc::vec![MessageSet::new(message, value)];
                alloc::vec![self.packet(destination, DataType::Request, sets)]
            }
        }
    }

    fn packet(
        &mut self,
        destination: Address,
        data_type: DataType,
        messages: Vec<MessageSet>,
    ) -> Packet {
        let command = self.next_command(data_type);
        Packet::new(self.config.address, destination, command, messages)
    }

    fn transmit(&mut self) {
        while let Some(request) = self.handle.next_request() {
            for packet in self.build_packets(request) {
                self.send(&packet);
            }
        }
    }

    fn send(&mut self, packet: &Packet) {
        let bytes = match packet.to_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Not sending packet to {}: {}", packet.destination, e);
                return;
            }
        };
        trace!("Sending {:02x?}", bytes);

        for byte in &bytes {
            if nb::block!(self.serial.write(*byte)).is_err() {
                error!("Serial write failed, {} byte packet dropped", bytes.len());
                return;
            }
        }
        if nb::block!(self.serial.flush()).is_err() {
            error!("Serial flush failed");
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Default)]
    pub struct MockSerial {
        pub rx: VecDeque<u8>,
        pub tx: Vec<u8>,
    }

    impl serial::Read<u8> for MockSerial {
        type Error = ();

        fn read(&mut self) -> nb::Result<u8, ()> {
            self.rx.pop_front().ok_or(nb::Error::WouldBlock)
        }
    }

    impl serial::Write<u8> for MockSerial {
        type Error = ();

        fn write(&mut self, byte: u8) -> nb::Result<(), ()> {
            self.tx.push(byte);
            Ok(())
        }

        fn flush(&mut self) -> nb::Result<(), ()> {
            Ok(())
        }
    }

    pub fn controller() -> Controller<MockSerial> {
        Controller::new(MockSerial::default(), ControllerConfig::default())
    }

    /// Send everything queued and split what went out into packets.
    pub fn sent_packets(controller: &mut Controller<MockSerial>) -> Vec<Packet> {
        controller.poll();
        let tx = core::mem::take(&mut controller.serial_mut().tx);
        let mut packets = Vec::new();
        let mut rest = &tx[..];
        while !rest.is_empty() {
            let (packet, remaining) = Packet::parse(rest).unwrap();
            packets.push(packet);
            rest = remaining;
        }
        packets
    }

    /// Frame a packet as if `source` had sent it.
    pub fn frame(
        source: &str,
        destination: &str,
        data_type: DataType,
        messages: &[(u16, RawValue)],
    ) -> Vec<u8> {
        Packet::new(
            source.parse().unwrap(),
            destination.parse().unwrap(),
            Command::new(data_type, 0),
            messages.iter().map(|(n, v)| MessageSet::new(MessageNumber(*n), *v)).collect(),
        )
        .to_bytes()
        .unwrap()
    }
}
