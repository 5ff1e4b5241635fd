//! Interrupt driven serial link.
//!
//! [`SerialPort`] is the interrupt side: it owns the UART, fills the
//! receive queue and drains the transmit queue. [`SerialLink`] is the
//! dispatcher side: it frames messages onto the byte stream, checks
//! them on the way in and realigns to frame boundaries after errors.
//!
//! Synchronization works as follows. A link starts `Synced`, expecting
//! the next byte to be a header. Any framing error moves it to
//! `Resyncing`, where bytes are skipped until a Status/Ack header (0x02)
//! shows up. Frames are checked in place before being consumed, so a
//! frame that fails only gives up its first byte and the scan resumes
//! right behind it. A 0x02 that was really part of a payload or a
//! trailer therefore never swallows the beacon that follows. Hosts send
//! Status whenever a reply goes missing, so a beacon is never far
//! behind a garbled frame.
use super::shared::Shared;
use crate::{
    board,
    hal::{
        serial::{Event, Uart},
        time::{Milliseconds, Now},
        transport::{Transport, TransportKind},
    },
    log,
    protocol::{
        frame::{self, FrameError, CONTROL_HEADER, FRAME_SIZE},
        Message,
    },
    utilities::ring_buffer::RingBuffer,
};
use core::hint::spin_loop;

/// Receive and transmit queue size, in bytes.
pub const BUFFER_SIZE: usize = 8192;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum FrameSync {
    Synced,
    Resyncing,
}

pub struct SerialPort<U: Uart> {
    uart: U,
    rx: RingBuffer<u8, BUFFER_SIZE>,
    tx: RingBuffer<u8, BUFFER_SIZE>,
    transmitting: bool,
    /// Line error or receive overflow not yet reported to the reader.
    error: bool,
    sync: FrameSync,
    open: bool,
}

impl<U: Uart> SerialPort<U> {
    /// Wraps an already configured UART with reception enabled.
    pub fn new(uart: U) -> Self {
        Self {
            uart,
            rx: RingBuffer::new(),
            tx: RingBuffer::new(),
            transmitting: false,
            error: false,
            sync: FrameSync::Synced,
            open: true,
        }
    }

    pub fn uart(&self) -> &U { &self.uart }
    pub fn uart_mut(&mut self) -> &mut U { &mut self.uart }
    pub fn sync(&self) -> FrameSync { self.sync }

    /// Services every pending UART interrupt cause.
    pub fn on_interrupt(&mut self) {
        while let Some(event) = self.uart.pending_event() {
            match event {
                Event::Received(byte) => self.on_byte_received(byte),
                Event::LineError => self.discard_reception(),
                Event::TransmitReady => self.on_transmit_ready(),
                Event::TransmissionComplete => self.on_transmission_complete(),
            }
        }
    }

    fn on_byte_received(&mut self, byte: u8) {
        if !self.rx.push_back(byte) {
            self.discard_reception();
        }
    }

    /// The byte stream is broken: drop everything and stop listening
    /// until the reader acknowledges the error.
    fn discard_reception(&mut self) {
        self.error = true;
        self.rx.clear();
        self.uart.disable_reception();
    }

    fn on_transmit_ready(&mut self) {
        match self.tx.pop_front() {
            Some(byte) => self.uart.send(byte),
            None => self.uart.finish_transmission(),
        }
    }

    fn on_transmission_complete(&mut self) {
        self.uart.end_transmission();
        if self.tx.is_empty() {
            self.transmitting = false;
        } else {
            // Queued while the previous frame was shifting out
            self.uart.start_transmission();
        }
    }

    /// Reports a pending error once, and resumes reception.
    fn take_error(&mut self) -> bool {
        let error = self.error;
        if error {
            self.error = false;
            self.uart.enable_reception();
        }
        error
    }

    /// The oldest frame's worth of received bytes, left in the queue.
    fn peek_frame(&self) -> Option<[u8; FRAME_SIZE]> {
        let mut bytes = [0u8; FRAME_SIZE];
        for (offset, byte) in bytes.iter_mut().enumerate() {
            *byte = *self.rx.peek(offset)?;
        }
        Some(bytes)
    }

    fn skip(&mut self, count: usize) {
        for _ in 0..count {
            self.rx.pop_front();
        }
    }

    /// Drops bytes until a beacon header is at the front. False if the
    /// queue runs dry first.
    fn skip_to_beacon(&mut self) -> bool {
        loop {
            match self.rx.front() {
                Some(&CONTROL_HEADER) => return true,
                Some(_) => {
                    self.rx.pop_front();
                }
                None => return false,
            }
        }
    }

    /// Queues a whole frame, or nothing if it doesn't fit yet.
    fn queue(&mut self, bytes: &[u8]) -> bool {
        let fits = self.tx.free() >= bytes.len();
        if fits {
            bytes.iter().for_each(|byte| {
                self.tx.push_back(*byte);
            });
        }
        if !self.transmitting && !self.tx.is_empty() {
            self.transmitting = true;
            self.uart.start_transmission();
        }
        fits
    }
}

/// Dispatcher side of a serial port installed in a registry slot.
pub struct SerialLink<'a, U: Uart, C: Now> {
    port: &'a Shared<Option<SerialPort<U>>>,
    clock: C,
    stall_timeout: Milliseconds,
}

impl<'a, U: Uart, C: Now> SerialLink<'a, U, C> {
    pub fn new(port: &'a Shared<Option<SerialPort<U>>>, clock: C) -> Self {
        Self::with_stall_timeout(port, clock, Milliseconds(board::SERIAL_STALL_TIMEOUT_MS))
    }

    pub fn with_stall_timeout(
        port: &'a Shared<Option<SerialPort<U>>>,
        clock: C,
        stall_timeout: Milliseconds,
    ) -> Self {
        Self { port, clock, stall_timeout }
    }

    fn with_port<R>(&self, f: impl FnOnce(&mut SerialPort<U>) -> R) -> Option<R> {
        self.port.lock(|slot| slot.as_mut().filter(|port| port.open).map(f))
    }

    fn take_error(&self) -> Result<(), FrameError> {
        match self.with_port(SerialPort::take_error) {
            None => Err(FrameError::Closed),
            Some(true) => Err(FrameError::LineError),
            Some(false) => Ok(()),
        }
    }

    fn skip(&self, count: usize) { self.with_port(|port| port.skip(count)); }

    fn read_frame(&mut self) -> Result<Message, FrameError> {
        let header = self.wait_header()?;
        if !frame::is_header(header) {
            self.skip(1);
            return Err(FrameError::UnexpectedHeader(header));
        }
        self.read_candidate()
    }

    /// Hunts for a beacon without waiting for more bytes. A beacon that
    /// fails its checksum was part of something else, so the hunt goes
    /// on from the byte behind it.
    fn resync(&mut self) -> Result<Message, FrameError> {
        loop {
            self.take_error()?;
            if !self.with_port(SerialPort::skip_to_beacon).ok_or(FrameError::Closed)? {
                return Err(FrameError::NoBeacon);
            }
            match self.read_candidate() {
                Err(FrameError::Checksum { .. }) => log::debug!("Skipped a false beacon"),
                result => return result,
            }
        }
    }

    /// Decodes the frame at the front of the receive queue. A good frame
    /// is consumed whole; a bad one only loses its first byte.
    fn read_candidate(&mut self) -> Result<Message, FrameError> {
        let result = self.wait_frame().and_then(|bytes| frame::decode(&bytes));
        self.skip(if result.is_ok() { FRAME_SIZE } else { 1 });
        result
    }

    /// Waits for the first byte of a frame, for as long as it takes.
    fn wait_header(&mut self) -> Result<u8, FrameError> {
        loop {
            self.take_error()?;
            match self.with_port(|port| port.rx.front().copied()).ok_or(FrameError::Closed)? {
                Some(header) => return Ok(header),
                None => spin_loop(),
            }
        }
    }

    /// Waits until a whole frame is queued. The frame has started, so a
    /// gap between bytes longer than the stall timeout abandons it.
    fn wait_frame(&mut self) -> Result<[u8; FRAME_SIZE], FrameError> {
        let mut since = self.clock.now();
        let mut queued = 0;
        loop {
            self.take_error()?;
            let (bytes, size) = self
                .with_port(|port| (port.peek_frame(), port.rx.size()))
                .ok_or(FrameError::Closed)?;
            if let Some(bytes) = bytes {
                return Ok(bytes);
            }
            let now = self.clock.now();
            if size != queued {
                queued = size;
                since = now;
            } else if now - since >= self.stall_timeout {
                return Err(FrameError::Timeout);
            }
            spin_loop();
        }
    }
}

impl<'a, U: Uart, C: Now> Transport for SerialLink<'a, U, C> {
    fn kind(&self) -> TransportKind { TransportKind::Serial }

    fn is_open(&self) -> bool { self.with_port(|_| ()).is_some() }

    fn close(&mut self) {
        self.port.lock(|slot| {
            if let Some(port) = slot.as_mut() {
                port.open = false;
                port.uart.disable_reception();
            }
        });
    }

    fn has_data(&self) -> bool {
        self.with_port(|port| port.error || !port.rx.is_empty()).unwrap_or(false)
    }

    fn read_window(&self) -> usize { self.with_port(|port| port.rx.free()).unwrap_or(0) }

    fn write_window(&self) -> usize { self.with_port(|port| port.tx.free()).unwrap_or(0) }

    fn flush(&mut self) {
        while self.with_port(|port| port.transmitting).unwrap_or(false) {
            spin_loop();
        }
    }

    fn read(&mut self) -> Message {
        let sync = match self.with_port(|port| port.sync) {
            Some(sync) => sync,
            None => return Message::failed(),
        };

        let result = match sync {
            FrameSync::Synced => self.read_frame(),
            FrameSync::Resyncing => self.resync(),
        };

        match result {
            Ok(message) => {
                if sync == FrameSync::Resyncing {
                    log::info!("Serial link back in sync");
                    self.with_port(|port| port.sync = FrameSync::Synced);
                }
                message
            }
            Err(error) => {
                log::warn!("Dropped serial frame: {:?}", error);
                self.with_port(|port| port.sync = FrameSync::Resyncing);
                Message::failed()
            }
        }
    }

    fn write(&mut self, message: &Message) {
        let bytes = frame::encode(message);
        loop {
            match self.with_port(|port| port.queue(&bytes)) {
                Some(true) => return,
                Some(false) => spin_loop(),
                None => {
                    log::warn!("Write on a closed serial link");
                    return;
                }
            }
        }
    }
}
