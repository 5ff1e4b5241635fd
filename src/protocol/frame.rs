//! Serial framing: `[header][message: 8][fletcher16: 2, little endian]`.
use super::message::{Kind, Message, MESSAGE_SIZE};
use crate::utilities::checksum::fletcher16;
use static_assertions::const_assert_eq;

/// Header of Status/Ack frames. Doubles as the resynchronization beacon.
pub const CONTROL_HEADER: u8 = 0x02;
/// Header of every other frame.
pub const COMMAND_HEADER: u8 = 0x03;
pub const TRAILER_SIZE: usize = 2;
pub const FRAME_SIZE: usize = 1 + MESSAGE_SIZE + TRAILER_SIZE;

const_assert_eq!(FRAME_SIZE, 11);

/// Reasons a frame couldn't be read. These never leave the serial
/// driver; the dispatcher only sees a message flagged as failed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum FrameError {
    UnexpectedHeader(u8),
    Checksum { expected: u16, received: u16 },
    /// A started frame stalled for longer than the stall timeout.
    Timeout,
    /// Line error or receive overflow reported by the driver.
    LineError,
    /// Resync scan ran out of buffered bytes before finding a beacon.
    NoBeacon,
    Closed,
}

pub fn header_for(kind: Kind) -> u8 {
    if kind.is_retransmission_control() {
        CONTROL_HEADER
    } else {
        COMMAND_HEADER
    }
}

pub fn is_header(byte: u8) -> bool { byte == CONTROL_HEADER || byte == COMMAND_HEADER }

pub fn encode(message: &Message) -> [u8; FRAME_SIZE] {
    let body = message.pack();
    let [low, high] = fletcher16(&body).to_le_bytes();
    let mut frame = [0u8; FRAME_SIZE];
    frame[0] = header_for(message.kind);
    frame[1..=MESSAGE_SIZE].copy_from_slice(&body);
    frame[FRAME_SIZE - 2] = low;
    frame[FRAME_SIZE - 1] = high;
    frame
}

/// Checks the trailer against the body and decodes it.
pub fn verify(
    body: &[u8; MESSAGE_SIZE],
    trailer: [u8; TRAILER_SIZE],
) -> Result<Message, FrameError> {
    let expected = fletcher16(body);
    let received = u16::from_le_bytes(trailer);
    if expected == received {
        Ok(Message::unpack(body))
    } else {
        Err(FrameError::Checksum { expected, received })
    }
}

/// Decodes a complete frame.
pub fn decode(frame: &[u8; FRAME_SIZE]) -> Result<Message, FrameError> {
    if !is_header(frame[0]) {
        return Err(FrameError::UnexpectedHeader(frame[0]));
    }
    let mut body = [0u8; MESSAGE_SIZE];
    body.copy_from_slice(&frame[1..=MESSAGE_SIZE]);
    verify(&body, [frame[FRAME_SIZE - 2], frame[FRAME_SIZE - 1]])
}
