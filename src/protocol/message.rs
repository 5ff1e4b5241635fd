//! The 8-byte command/response record exchanged by every board.
use static_assertions::const_assert_eq;

/// Bytes of a packed message: `[board_id, kind, length, sequence, payload[0..4]]`.
pub const MESSAGE_SIZE: usize = 8;
pub const PAYLOAD_SIZE: usize = 4;
const HEADER_FIELDS: usize = 4;

const_assert_eq!(MESSAGE_SIZE, HEADER_FIELDS + PAYLOAD_SIZE);

#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum Kind {
    #[default]
    Invalid = 0,
    /// Asks for the receiver's expected sequence number.
    Status,
    /// Answer to `Status`, expected sequence in payload byte 3.
    Ack,
    Okay,
    Error,
    Ping,
    Reset,
    GetMode,
    SetMode,
    ConnStatusReq,
    ConnStatus,
    Erase,
    Checksum,
    UnlockFlash,
    LockFlash,
    Move,
    MoveStart,
    Position,
    Read,
    Write,
}

impl From<u8> for Kind {
    fn from(byte: u8) -> Self {
        match byte {
            1 => Kind::Status,
            2 => Kind::Ack,
            3 => Kind::Okay,
            4 => Kind::Error,
            5 => Kind::Ping,
            6 => Kind::Reset,
            7 => Kind::GetMode,
            8 => Kind::SetMode,
            9 => Kind::ConnStatusReq,
            10 => Kind::ConnStatus,
            11 => Kind::Erase,
            12 => Kind::Checksum,
            13 => Kind::UnlockFlash,
            14 => Kind::LockFlash,
            15 => Kind::Move,
            16 => Kind::MoveStart,
            17 => Kind::Position,
            18 => Kind::Read,
            19 => Kind::Write,
            _ => Kind::Invalid,
        }
    }
}

impl Kind {
    /// Status/Ack traffic is exempt from sequence checks.
    pub fn is_retransmission_control(self) -> bool { matches!(self, Kind::Status | Kind::Ack) }
}

/// Reason codes carried in payload byte 0 of `Error` replies.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum ErrorCode {
    WriteFailed = 1,
    /// Write outside of an unlocked session, or below the application.
    NoWriteSession = 2,
    OutOfBounds = 3,
    EraseFailed = 4,
    ReadFailed = 5,
    InvalidMode = 6,
}

#[derive(Copy, Clone, Debug, Default)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub struct Message {
    pub board_id: u8,
    pub kind: Kind,
    /// Meaningful payload bytes, at most `PAYLOAD_SIZE`.
    pub length: u8,
    pub sequence: u8,
    pub payload: [u8; PAYLOAD_SIZE],
    read_error: bool,
}

/// Wire fields only. The local read error flag doesn't take part.
impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool { self.pack() == other.pack() }
}

impl Eq for Message {}

impl Message {
    pub fn new(board_id: u8, kind: Kind, sequence: u8) -> Self {
        Self { board_id, kind, length: PAYLOAD_SIZE as u8, sequence, ..Default::default() }
    }

    /// A message standing in for a frame that couldn't be read.
    pub fn failed() -> Self { Self { read_error: true, ..Default::default() } }

    pub fn has_read_error(&self) -> bool { self.read_error }

    /// Payload as a little endian word.
    pub fn value(&self) -> u32 { u32::from_le_bytes(self.payload) }

    pub fn set_value(&mut self, value: u32) { self.payload = value.to_le_bytes(); }

    pub fn with_value(mut self, value: u32) -> Self {
        self.set_value(value);
        self
    }

    pub fn with_payload_byte(mut self, index: usize, byte: u8) -> Self {
        self.payload[index] = byte;
        self
    }

    pub fn pack(&self) -> [u8; MESSAGE_SIZE] {
        let [p0, p1, p2, p3] = self.payload;
        [self.board_id, self.kind as u8, self.length, self.sequence, p0, p1, p2, p3]
    }

    /// Total: unknown kinds decode as `Kind::Invalid`.
    pub fn unpack(bytes: &[u8; MESSAGE_SIZE]) -> Self {
        let [board_id, kind, length, sequence, p0, p1, p2, p3] = *bytes;
        Self {
            board_id,
            kind: Kind::from(kind),
            length,
            sequence,
            payload: [p0, p1, p2, p3],
            read_error: false,
        }
    }
}
