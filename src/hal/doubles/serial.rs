use crate::hal::serial::{Event, Uart};
use std::collections::VecDeque;

/// UART double. Tests queue interrupt causes in `events` and inspect
/// what the driver placed in the data register through `sent`.
#[derive(Debug, Default)]
pub struct MockUart {
    pub events: VecDeque<Event>,
    pub sent: Vec<u8>,
    pub transmit_interrupt: bool,
    pub complete_interrupt: bool,
    pub receiving: bool,
    pub transmission_starts: usize,
}

impl MockUart {
    pub fn new() -> Self { Self { receiving: true, ..Default::default() } }
}

impl Uart for MockUart {
    fn pending_event(&mut self) -> Option<Event> { self.events.pop_front() }
    fn send(&mut self, byte: u8) { self.sent.push(byte); }

    fn start_transmission(&mut self) {
        self.transmit_interrupt = true;
        self.transmission_starts += 1;
    }

    fn finish_transmission(&mut self) {
        self.transmit_interrupt = false;
        self.complete_interrupt = true;
    }

    fn end_transmission(&mut self) {
        self.transmit_interrupt = false;
        self.complete_interrupt = false;
    }

    fn enable_reception(&mut self) { self.receiving = true; }
    fn disable_reception(&mut self) { self.receiving = false; }
}
