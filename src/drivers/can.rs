//! Interrupt driven CAN bus link.
//!
//! Every frame carries exactly one packed message. The controller
//! delimits frames and checks their CRC, so there is no header,
//! checksum or resynchronization at this level.
use super::shared::Shared;
use crate::{
    hal::{
        can::{Controller, Event, Frame},
        transport::{Transport, TransportKind},
    },
    log,
    protocol::{message::MESSAGE_SIZE, Message},
    utilities::ring_buffer::RingBuffer,
};
use core::hint::spin_loop;

/// Receive and transmit queue size, in frames.
pub const BUFFER_SIZE: usize = 256;

/// Standard identifier shared by all bootloader traffic.
pub const BUS_FRAME_ID: u32 = 1;

pub fn encode(message: &Message) -> Frame {
    Frame {
        id: BUS_FRAME_ID,
        extended: false,
        remote: false,
        len: MESSAGE_SIZE as u8,
        data: message.pack(),
    }
}

/// Frames that can't hold a message.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum Rejection {
    Remote,
    Extended,
    ForeignIdentifier(u32),
    Length(u8),
}

pub fn decode(frame: &Frame) -> Result<Message, Rejection> {
    if frame.remote {
        Err(Rejection::Remote)
    } else if frame.extended {
        Err(Rejection::Extended)
    } else if frame.id != BUS_FRAME_ID {
        Err(Rejection::ForeignIdentifier(frame.id))
    } else if frame.len as usize != MESSAGE_SIZE {
        Err(Rejection::Length(frame.len))
    } else {
        Ok(Message::unpack(&frame.data))
    }
}

pub struct BusPort<K: Controller> {
    controller: K,
    rx: RingBuffer<Frame, BUFFER_SIZE>,
    tx: RingBuffer<Frame, BUFFER_SIZE>,
    transmitting: bool,
    open: bool,
    dropped: u32,
}

impl<K: Controller> BusPort<K> {
    pub fn new(controller: K) -> Self {
        Self {
            controller,
            rx: RingBuffer::new(),
            tx: RingBuffer::new(),
            transmitting: false,
            open: true,
            dropped: 0,
        }
    }

    pub fn controller(&self) -> &K { &self.controller }
    pub fn controller_mut(&mut self) -> &mut K { &mut self.controller }

    /// Received frames lost to a full queue.
    pub fn dropped(&self) -> u32 { self.dropped }

    pub fn on_interrupt(&mut self) {
        while let Some(event) = self.controller.pending_event() {
            match event {
                Event::Received(frame) => self.on_frame_received(frame),
                Event::MailboxEmpty => self.on_mailbox_empty(),
            }
        }
    }

    fn on_frame_received(&mut self, frame: Frame) {
        if !self.rx.push_back(frame) {
            self.dropped = self.dropped.wrapping_add(1);
            log::warn!("Bus receive queue full, frame dropped");
        }
    }

    fn on_mailbox_empty(&mut self) {
        match self.tx.pop_front() {
            Some(frame) => self.controller.transmit(&frame),
            None => self.transmitting = false,
        }
    }

    fn queue(&mut self, frame: Frame) -> bool {
        let queued = self.tx.push_back(frame);
        if !self.transmitting {
            if let Some(next) = self.tx.pop_front() {
                self.transmitting = true;
                self.controller.transmit(&next);
            }
        }
        queued
    }
}

/// Dispatcher side of a bus port installed in a registry slot.
pub struct BusLink<'a, K: Controller> {
    port: &'a Shared<Option<BusPort<K>>>,
}

impl<'a, K: Controller> BusLink<'a, K> {
    pub fn new(port: &'a Shared<Option<BusPort<K>>>) -> Self { Self { port } }

    fn with_port<R>(&self, f: impl FnOnce(&mut BusPort<K>) -> R) -> Option<R> {
        self.port.lock(|slot| slot.as_mut().filter(|port| port.open).map(f))
    }
}

impl<'a, K: Controller> Transport for BusLink<'a, K> {
    fn kind(&self) -> TransportKind { TransportKind::Bus }

    fn is_open(&self) -> bool { self.with_port(|_| ()).is_some() }

    fn close(&mut self) {
        self.port.lock(|slot| {
            if let Some(port) = slot.as_mut() {
                port.open = false;
            }
        });
    }

    fn has_data(&self) -> bool { self.with_port(|port| !port.rx.is_empty()).unwrap_or(false) }

    fn read_window(&self) -> usize { self.with_port(|port| port.rx.free()).unwrap_or(0) }

    fn write_window(&self) -> usize { self.with_port(|port| port.tx.free()).unwrap_or(0) }

    fn flush(&mut self) {
        while self.with_port(|port| port.transmitting).unwrap_or(false) {
            spin_loop();
        }
    }

    fn read(&mut self) -> Message {
        loop {
            match self.with_port(|port| port.rx.pop_front()) {
                None => return Message::failed(),
                Some(Some(frame)) => {
                    return decode(&frame).unwrap_or_else(|rejection| {
                        log::warn!("Dropped bus frame: {:?}", rejection);
                        Message::failed()
                    })
                }
                Some(None) => spin_loop(),
            }
        }
    }

    fn write(&mut self, message: &Message) {
        let frame = encode(message);
        loop {
            match self.with_port(|port| port.queue(frame)) {
                Some(true) => return,
                Some(false) => spin_loop(),
                None => {
                    log::warn!("Write on a closed bus link");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{hal::doubles::can::MockCan, protocol::Kind};

    type Port = Shared<Option<BusPort<MockCan>>>;

    fn port() -> Port { Shared::new(Some(BusPort::new(MockCan::default()))) }

    fn interrupt(port: &Port, events: &[Event]) {
        port.lock(|slot| {
            let port = slot.as_mut().unwrap();
            port.controller.events.extend(events.iter().copied());
            port.on_interrupt();
        });
    }

    fn transmitted(port: &Port) -> Vec<Frame> {
        port.lock(|slot| slot.as_ref().unwrap().controller.transmitted.clone())
    }

    #[test]
    fn outgoing_frames_use_the_shared_standard_identifier() {
        let frame = encode(&Message::new(5, Kind::Okay, 2).with_value(42));
        assert_eq!(frame.id, BUS_FRAME_ID);
        assert!(!frame.extended);
        assert!(!frame.remote);
        assert_eq!(frame.len, 8);
        assert_eq!(frame.data, [5, 3, 4, 2, 42, 0, 0, 0]);
    }

    #[test]
    fn first_write_goes_straight_to_a_mailbox_and_the_rest_wait() {
        // Given
        let port = port();
        let mut link = BusLink::new(&port);
        let (first, second) = (Message::new(1, Kind::Okay, 0), Message::new(1, Kind::Okay, 1));

        // When
        link.write(&first);
        link.write(&second);

        // Then
        assert_eq!(transmitted(&port), vec![encode(&first)]);
        assert_eq!(link.write_window(), BUFFER_SIZE - 1);

        // When the mailbox frees up twice
        interrupt(&port, &[Event::MailboxEmpty, Event::MailboxEmpty]);

        // Then
        assert_eq!(transmitted(&port), vec![encode(&first), encode(&second)]);
        link.flush();
        assert_eq!(link.write_window(), BUFFER_SIZE);
    }

    #[test]
    fn received_frames_decode_in_order() {
        let port = port();
        let mut link = BusLink::new(&port);
        let messages =
            [Message::new(1, Kind::Ping, 0), Message::new(2, Kind::Write, 9).with_value(3)];
        let events = [Event::Received(encode(&messages[0])), Event::Received(encode(&messages[1]))];
        interrupt(&port, &events);

        assert!(link.has_data());
        assert_eq!(link.read_window(), BUFFER_SIZE - 2);
        assert_eq!(link.read(), messages[0]);
        assert_eq!(link.read(), messages[1]);
        assert!(!link.has_data());
    }

    #[test]
    fn frames_that_cannot_carry_a_message_read_as_errors() {
        let port = port();
        let mut link = BusLink::new(&port);
        let valid = encode(&Message::new(1, Kind::Ping, 0));
        let remote = Frame { remote: true, ..valid };
        let short = Frame { len: 4, ..valid };
        let foreign = Frame { id: 0x7FF, ..valid };
        let events = [Event::Received(remote), Event::Received(short), Event::Received(foreign)];
        interrupt(&port, &events);

        assert_eq!(decode(&remote), Err(Rejection::Remote));
        assert_eq!(decode(&short), Err(Rejection::Length(4)));
        assert_eq!(decode(&foreign), Err(Rejection::ForeignIdentifier(0x7FF)));
        assert!((0..3).all(|_| link.read().has_read_error()));
        assert!(!link.has_data());
    }

    #[test]
    fn full_receive_queue_counts_dropped_frames() {
        let port = port();
        let frame = encode(&Message::new(1, Kind::Ping, 0));
        let events = vec![Event::Received(frame); BUFFER_SIZE + 3];
        interrupt(&port, &events);
        assert_eq!(port.lock(|slot| slot.as_ref().unwrap().dropped()), 3);
    }

    #[test]
    fn closed_link_reads_fail_without_blocking() {
        let port = port();
        let mut link = BusLink::new(&port);
        link.close();
        assert!(!link.is_open());
        assert!(link.read().has_read_error());
        link.write(&Message::new(1, Kind::Okay, 0));
        assert!(transmitted(&port).is_empty());
        assert_eq!(link.kind(), TransportKind::Bus);
    }
}
