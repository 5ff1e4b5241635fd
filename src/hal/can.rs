//! CAN controller, as seen by the bus link driver.

/// A classic CAN frame.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub struct Frame {
    pub id: u32,
    pub extended: bool,
    pub remote: bool,
    /// Data length code.
    pub len: u8,
    pub data: [u8; 8],
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum Event {
    /// A frame was pulled out of the receive FIFO.
    Received(Frame),
    /// A transmit mailbox became free.
    MailboxEmpty,
}

pub trait Controller {
    fn pending_event(&mut self) -> Option<Event>;
    /// Loads a frame into a free transmit mailbox.
    fn transmit(&mut self, frame: &Frame);
}
