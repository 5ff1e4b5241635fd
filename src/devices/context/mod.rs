//! Command dispatcher.
//!
//! A [`Context`] owns the protocol state of one board: the expected
//! sequence number, the flash write session and a short history of the
//! commands it executed. Every [`poll`](Context::poll) takes the first
//! link with pending traffic, relays whatever isn't exclusively ours to
//! the remaining links, and executes whatever is addressed to us.
use super::{boot_mode::BootModeStore, transport::Transport, Flash};
use crate::{
    board,
    error::Error,
    hal::flash::{self, Address},
    log,
    protocol::{Kind, Message},
    system,
    utilities::ring_buffer::RingBuffer,
};

mod commands;

/// Number of executed commands kept for diagnostics.
pub const HISTORY_SIZE: usize = 32;

/// Board identity and protocol switches, as configured at build time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub struct Settings {
    pub board_id: u8,
    pub app_start: Address,
    /// Whether `Ping` reboots the board after replying.
    pub ping_triggers_reset: bool,
}

impl Settings {
    pub fn from_board() -> Self {
        Self {
            board_id: board::BOARD_ID,
            app_start: Address(board::APPLICATION_START),
            ping_triggers_reset: board::PING_TRIGGERS_RESET,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum State {
    Running,
    /// Terminal. Links are flushed and the processor reset.
    ResetPending,
}

pub struct Context<'a, T: Transport, F: Flash, M: BootModeStore> {
    settings: Settings,
    transports: &'a mut [T],
    flash: F,
    boot_mode: M,
    sequence: u8,
    writing: bool,
    cursor: Address,
    history: RingBuffer<Message, HISTORY_SIZE>,
    state: State,
}

impl<'a, T: Transport, F: Flash, M: BootModeStore> Context<'a, T, F, M>
where
    Error: From<<F as flash::ReadWrite>::Error>,
{
    pub fn new(
        settings: Settings,
        transports: &'a mut [T],
        flash: F,
        boot_mode: M,
    ) -> Result<Self, Error> {
        if transports.is_empty() {
            return Err(Error::NoTransports);
        }
        log::info!("Listening on {} links as board {}", transports.len(), settings.board_id);
        Ok(Self {
            cursor: settings.app_start,
            settings,
            transports,
            flash,
            boot_mode,
            sequence: 0,
            writing: false,
            history: RingBuffer::new(),
            state: State::Running,
        })
    }

    /// Serves commands until a reset is requested, then resets.
    pub fn run(mut self) -> ! {
        self.serve();
        system::reset()
    }

    /// Serves commands until a reset is requested, and flushes every open
    /// link so the last replies make it out.
    pub fn serve(&mut self) {
        while self.state == State::Running {
            self.poll();
        }
        log::info!("Reset requested, flushing links");
        self.transports.iter_mut().filter(|t| t.is_open()).for_each(|t| t.flush());
    }

    /// One dispatcher iteration. Returns the index of the link the
    /// handled message came from, if there was one.
    pub fn poll(&mut self) -> Option<usize> {
        let source = self.transports.iter().position(|t| t.is_open() && t.has_data())?;
        let message = self.transports[source].read();
        if message.has_read_error() {
            return None;
        }

        let handle = message.board_id == self.settings.board_id || message.kind == Kind::Ping;
        let forward = !handle || message.kind == Kind::Ping;

        if forward {
            self.forward(source, &message);
        }
        if handle {
            self.execute(source, message);
        }
        Some(source)
    }

    fn forward(&mut self, source: usize, message: &Message) {
        for (index, transport) in self.transports.iter_mut().enumerate() {
            if index != source && transport.is_open() {
                log::trace!("Forwarding {:?} from link {} to link {}", message.kind, source, index);
                transport.write(message);
            }
        }
    }

    fn reply(&mut self, source: usize, message: Message) {
        self.transports[source].write(&message);
    }

    pub fn settings(&self) -> &Settings { &self.settings }
    pub fn state(&self) -> State { self.state }
    pub fn sequence(&self) -> u8 { self.sequence }
    pub fn is_writing(&self) -> bool { self.writing }
    pub fn cursor(&self) -> Address { self.cursor }
    pub fn flash(&self) -> &F { &self.flash }
    pub fn boot_mode(&self) -> &M { &self.boot_mode }
    pub fn transports(&self) -> &[T] { self.transports }

    /// Executed commands, newest first.
    pub fn history(&self) -> impl Iterator<Item = &Message> + '_ { self.history.iter() }
}


#[cfg(test)]
mod test {
    use super::{fixture::*, *};
    use crate::{
        devices::sectors::STM32F7_SINGLE_BANK,
        hal::{
            doubles::{boot_mode::FakeBootMode, flash::FakeFlash, transport::FakeTransport},
            transport::TransportKind,
        },
    };

    fn serial() -> FakeTransport { FakeTransport::new(TransportKind::Serial) }
    fn bus() -> FakeTransport { FakeTransport::new(TransportKind::Bus) }

    #[test]
    fn empty_transport_list_is_refused() {
        let mut none: [FakeTransport; 0] = [];
        let flash = FakeFlash::new(&STM32F7_SINGLE_BANK);
        let result = Context::new(settings(), &mut none, flash, FakeBootMode::default());
        assert_eq!(result.err(), Some(Error::NoTransports));
    }

    #[test]
    fn commands_for_this_board_are_executed_and_not_relayed() {
        // Given
        let mut links = [serial().with_incoming([command(Kind::Position, 0)]), bus()];

        // When
        let mut context = context(&mut links);
        let source = context.poll();

        // Then
        assert_eq!(source, Some(0));
        assert_eq!(context.sequence(), 1);
        drop(context);
        assert_eq!(links[0].written.len(), 1);
        assert_eq!(links[0].written[0].kind, Kind::Okay);
        assert!(links[1].written.is_empty());
    }

    #[test]
    fn commands_for_other_boards_are_relayed_to_every_other_open_link() {
        // Given
        let foreign = Message::new(BOARD + 1, Kind::Write, 0).with_value(0xAABB_CCDD);
        let mut closed = serial();
        closed.open = false;
        let mut links = [bus(), serial().with_incoming([foreign]), closed, bus()];

        // When
        let mut context = context(&mut links);
        assert_eq!(context.poll(), Some(1));

        // Then
        assert_eq!(context.sequence(), 0);
        assert_eq!(context.history().count(), 0);
        drop(context);
        assert_eq!(links[0].written, vec![foreign]);
        assert!(links[1].written.is_empty());
        assert!(links[2].written.is_empty());
        assert_eq!(links[3].written, vec![foreign]);
    }

    #[test]
    fn ping_from_any_sender_is_answered_and_relayed_verbatim() {
        // Given
        let ping = Message::new(0xEE, Kind::Ping, 0);
        let mut links = [serial().with_incoming([ping]), bus()];

        // When
        let mut context = context(&mut links);
        context.poll();

        // Then
        assert_eq!(context.state(), State::ResetPending);
        drop(context);
        assert_eq!(links[1].written, vec![ping]);
        let reply = links[0].written[0];
        assert_eq!(reply.kind, Kind::Okay);
        assert_eq!(reply.board_id, BOARD);
        assert_eq!(reply.payload[0], BOARD);
    }

    #[test]
    fn unreadable_messages_are_dropped_without_relay() {
        let mut garbled = serial();
        garbled.push_garbage();
        let mut links = [garbled, bus()];

        let mut context = context(&mut links);
        assert_eq!(context.poll(), None);
        assert_eq!(context.sequence(), 0);
        drop(context);
        assert!(links.iter().all(|link| link.written.is_empty()));
    }

    #[test]
    fn links_are_polled_in_fixed_order() {
        // Given
        let mut links = [
            bus(),
            serial().with_incoming([command(Kind::Position, 0)]),
            bus().with_incoming([command(Kind::Position, 1)]),
        ];

        // When
        let mut context = context(&mut links);
        let sources = [context.poll(), context.poll(), context.poll()];

        // Then
        assert_eq!(sources, [Some(1), Some(2), None]);
        assert_eq!(context.sequence(), 2);
    }

    #[test]
    fn serving_stops_on_reset_and_flushes_open_links() {
        // Given
        let mut closed = bus();
        closed.open = false;
        let mut links = [
            serial().with_incoming([
                command(Kind::UnlockFlash, 0),
                command(Kind::Reset, 1),
                command(Kind::Position, 2),
            ]),
            closed,
        ];

        // When
        let mut context = context(&mut links);
        context.serve();

        // Then
        assert_eq!(context.state(), State::ResetPending);
        assert_eq!(context.sequence(), 2);
        drop(context);
        assert_eq!(links[0].flushes, 1);
        assert_eq!(links[1].flushes, 0);
        // The command after the reset is never read
        assert_eq!(links[0].incoming.len(), 1);
    }

    #[test]
    fn history_keeps_the_newest_commands_first() {
        // Given
        let commands: Vec<_> =
            (0..40u8).map(|sequence| command(Kind::Position, sequence)).collect();
        let mut links = [serial().with_incoming(commands.iter().copied())];

        // When
        let mut context = context(&mut links);
        drain(&mut context);

        // Then
        let sequences: Vec<u8> = context.history().map(|m| m.sequence).collect();
        assert_eq!(sequences.len(), HISTORY_SIZE);
        assert_eq!(sequences[0], 39);
        assert_eq!(sequences[HISTORY_SIZE - 1], 8);
    }

    #[test]
    fn foreign_serial_traffic_is_relayed_onto_the_bus() {
        use crate::{
            board::{self, LinkKind},
            devices::transport::Link,
            drivers::{
                can::{self, BusLink, BusPort},
                registry::BoardRegistry,
                serial::{SerialLink, SerialPort},
            },
            hal::{
                doubles::{can::MockCan, serial::MockUart, time::MockClock},
                serial::Event as UartEvent,
            },
            protocol::frame,
        };

        // Given
        let serials = BoardRegistry::<SerialPort<MockUart>>::new();
        let buses = BoardRegistry::<BusPort<MockCan>>::new();
        let clock = MockClock::new(1);
        let serial_slot = board::peripherals(LinkKind::Serial).next().unwrap();
        let bus_slot = board::peripherals(LinkKind::Bus).next().unwrap();
        let uart = serials.install(serial_slot, SerialPort::new(MockUart::new())).unwrap();
        let controller = buses.install(bus_slot, BusPort::new(MockCan::default())).unwrap();
        let foreign = Message::new(BOARD + 2, Kind::Erase, 3).with_value(64);
        serials.on_interrupt(serial_slot, |port| {
            let bytes = frame::encode(&foreign);
            port.uart_mut().events.extend(bytes.iter().map(|b| UartEvent::Received(*b)));
            port.on_interrupt();
        });
        let mut links: [Link<MockUart, &MockClock, MockCan>; 2] =
            [SerialLink::new(uart, &clock).into(), BusLink::new(controller).into()];

        // When
        let flash = FakeFlash::new(&STM32F7_SINGLE_BANK);
        let mut context =
            Context::new(settings(), &mut links, flash, FakeBootMode::default()).unwrap();
        let source = context.poll();

        // Then
        assert_eq!(source, Some(0));
        assert_eq!(context.sequence(), 0);
        drop(context);
        let sent = controller.lock(|slot| slot.as_ref().unwrap().controller().transmitted.clone());
        assert_eq!(sent, vec![can::encode(&foreign)]);
    }
}
