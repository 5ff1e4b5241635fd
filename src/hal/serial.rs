//! Interrupt driven UART, as seen by the serial link driver.

/// Cause of a UART interrupt.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum Event {
    /// A byte arrived in the receive data register.
    Received(u8),
    /// Overrun, framing or noise error. Flags are already cleared.
    LineError,
    /// Transmit data register is empty.
    TransmitReady,
    /// Last byte has left the shift register.
    TransmissionComplete,
}

pub trait Uart {
    /// Next pending interrupt cause, if any.
    fn pending_event(&mut self) -> Option<Event>;
    /// Places a byte in the transmit data register.
    fn send(&mut self, byte: u8);
    /// Enables the transmit-register-empty interrupt.
    fn start_transmission(&mut self);
    /// Swaps the transmit-register-empty interrupt for transmission-complete.
    fn finish_transmission(&mut self);
    /// Disables both transmit interrupts.
    fn end_transmission(&mut self);
    fn enable_reception(&mut self);
    fn disable_reception(&mut self);
}
