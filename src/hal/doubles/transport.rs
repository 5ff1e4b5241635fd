use crate::{
    hal::transport::{Transport, TransportKind},
    protocol::Message,
};
use std::collections::VecDeque;

/// Message level link double. Tests queue inbound traffic in
/// `incoming` and find everything the dispatcher sent in `written`.
#[derive(Debug)]
pub struct FakeTransport {
    pub kind: TransportKind,
    pub open: bool,
    pub incoming: VecDeque<Message>,
    pub written: Vec<Message>,
    pub flushes: usize,
    pub rx_window: usize,
    pub tx_window: usize,
}

impl FakeTransport {
    pub fn new(kind: TransportKind) -> Self {
        Self {
            kind,
            open: true,
            incoming: VecDeque::new(),
            written: Vec::new(),
            flushes: 0,
            rx_window: 64,
            tx_window: 64,
        }
    }

    pub fn with_incoming<I: IntoIterator<Item = Message>>(mut self, messages: I) -> Self {
        self.incoming.extend(messages);
        self
    }

    /// Queues a message that failed to decode.
    pub fn push_garbage(&mut self) { self.incoming.push_back(Message::failed()); }
}

impl Transport for FakeTransport {
    fn kind(&self) -> TransportKind { self.kind }
    fn is_open(&self) -> bool { self.open }
    fn close(&mut self) { self.open = false; }
    fn has_data(&self) -> bool { self.open && !self.incoming.is_empty() }
    fn read_window(&self) -> usize { self.rx_window }
    fn write_window(&self) -> usize { self.tx_window }
    fn flush(&mut self) { self.flushes += 1; }

    fn read(&mut self) -> Message {
        if !self.open {
            return Message::failed();
        }
        self.incoming.pop_front().unwrap_or_else(Message::failed)
    }

    fn write(&mut self, message: &Message) {
        if self.open {
            self.written.push(*message);
        }
    }
}
