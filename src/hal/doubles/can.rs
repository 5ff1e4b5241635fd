use crate::hal::can::{Controller, Event, Frame};
use std::collections::VecDeque;

/// CAN controller double. Every frame handed to a mailbox is kept
/// in `transmitted`.
#[derive(Debug, Default)]
pub struct MockCan {
    pub events: VecDeque<Event>,
    pub transmitted: Vec<Frame>,
}

impl Controller for MockCan {
    fn pending_event(&mut self) -> Option<Event> { self.events.pop_front() }
    fn transmit(&mut self, frame: &Frame) { self.transmitted.push(*frame); }
}
