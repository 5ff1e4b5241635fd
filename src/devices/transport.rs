//! Heterogeneous link list. The dispatcher iterates a slice of
//! [`Link`]s, so serial and bus links can sit side by side without
//! trait objects.
pub use crate::hal::transport::{Transport, TransportKind};
use crate::{
    drivers::{can::BusLink, serial::SerialLink},
    hal::{can::Controller, serial::Uart, time::Now},
    protocol::Message,
};

pub enum Link<'a, U: Uart, C: Now, K: Controller> {
    Serial(SerialLink<'a, U, C>),
    Bus(BusLink<'a, K>),
}

impl<'a, U: Uart, C: Now, K: Controller> From<SerialLink<'a, U, C>> for Link<'a, U, C, K> {
    fn from(link: SerialLink<'a, U, C>) -> Self { Link::Serial(link) }
}

impl<'a, U: Uart, C: Now, K: Controller> From<BusLink<'a, K>> for Link<'a, U, C, K> {
    fn from(link: BusLink<'a, K>) -> Self { Link::Bus(link) }
}

macro_rules! on_link {
    ($link:expr, $inner:ident => $body:expr) => {
        match $link {
            Link::Serial($inner) => $body,
            Link::Bus($inner) => $body,
        }
    };
}

impl<'a, U: Uart, C: Now, K: Controller> Transport for Link<'a, U, C, K> {
    fn kind(&self) -> TransportKind { on_link!(self, link => link.kind()) }
    fn is_open(&self) -> bool { on_link!(self, link => link.is_open()) }
    fn close(&mut self) { on_link!(self, link => link.close()) }
    fn has_data(&self) -> bool { on_link!(self, link => link.has_data()) }
    fn read_window(&self) -> usize { on_link!(self, link => link.read_window()) }
    fn write_window(&self) -> usize { on_link!(self, link => link.write_window()) }
    fn flush(&mut self) { on_link!(self, link => link.flush()) }
    fn read(&mut self) -> Message { on_link!(self, link => link.read()) }
    fn write(&mut self, message: &Message) { on_link!(self, link => link.write(message)) }
}
