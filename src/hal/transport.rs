//! Uniform view of a physical link, whatever its framing.
use crate::protocol::Message;

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum TransportKind {
    Serial = 0,
    Bus = 1,
}

/// A link the dispatcher can poll, read from and write to.
///
/// `read`, `write` and `flush` busy-wait: there is no scheduler to yield
/// to, and the only other code that runs meanwhile is the link's own
/// interrupt handler. Callers check `has_data` before reading.
pub trait Transport {
    fn kind(&self) -> TransportKind;
    fn is_open(&self) -> bool;
    fn close(&mut self);
    /// True when a message is buffered or an error is pending.
    fn has_data(&self) -> bool;
    /// Free receive capacity, in the link's own units (bytes or frames).
    fn read_window(&self) -> usize;
    /// Free transmit capacity, in the link's own units (bytes or frames).
    fn write_window(&self) -> usize;
    /// Blocks until every queued outbound byte or frame has left.
    fn flush(&mut self);
    /// Never fails outright: closed links and framing errors yield a
    /// message flagged with a read error.
    fn read(&mut self) -> Message;
    /// Blocks while the transmit queue lacks room. Outbound traffic is
    /// never dropped on an open link.
    fn write(&mut self, message: &Message);
}
