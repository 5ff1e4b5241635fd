//! Command execution.
use super::{Context, State};
use crate::{
    devices::{
        boot_mode::{BootMode, BootModeStore},
        transport::Transport,
        Flash,
    },
    error::Error,
    hal::flash::{self, Address},
    log,
    protocol::{ErrorCode, Kind, Message},
    utilities::checksum::Crc32,
};
use core::convert::TryFrom;

/// Flash is read and written a word at a time.
const WORD: usize = 4;
const CHECKSUM_CHUNK: usize = 256;

impl<'a, T: Transport, F: Flash, M: BootModeStore> Context<'a, T, F, M>
where
    Error: From<<F as flash::ReadWrite>::Error>,
{
    pub(super) fn execute(&mut self, source: usize, command: Message) {
        match command.kind {
            Kind::Status => {
                let ack = self.response(Kind::Ack, &command).with_payload_byte(3, self.sequence);
                self.reply(source, ack);
                return;
            }
            Kind::Ack => return,
            _ => {}
        }

        if command.sequence != self.sequence {
            log::debug!(
                "Dropped {:?} with sequence {}, expected {}",
                command.kind,
                command.sequence,
                self.sequence
            );
            return;
        }
        self.history.push_front_evict(command);

        let response = match command.kind {
            Kind::Ping => Some(self.ping(&command)),
            Kind::Reset => Some(self.reset(&command)),
            Kind::GetMode => Some(self.get_mode(&command)),
            Kind::SetMode => Some(self.set_mode(&command)),
            Kind::ConnStatusReq => {
                self.report_connections(source, &command);
                None
            }
            Kind::Erase => Some(self.erase(&command)),
            Kind::Checksum => Some(self.checksum(&command)),
            Kind::UnlockFlash => Some(self.unlock(&command)),
            Kind::LockFlash => Some(self.lock(&command)),
            Kind::Move => Some(self.move_cursor(&command, Address(command.value()))),
            Kind::MoveStart => Some(self.move_cursor(&command, self.settings.app_start)),
            Kind::Position => Some(self.position(&command)),
            Kind::Read => Some(self.read(&command)),
            Kind::Write => self.write(&command),
            _ => None,
        };

        if let Some(response) = response {
            self.reply(source, response);
        }
        self.sequence = self.sequence.wrapping_add(1);
    }

    fn response(&self, kind: Kind, command: &Message) -> Message {
        Message::new(self.settings.board_id, kind, command.sequence)
    }

    fn failure(&self, command: &Message, code: ErrorCode) -> Message {
        self.response(Kind::Error, command).with_payload_byte(0, code as u8)
    }

    fn ping(&mut self, command: &Message) -> Message {
        if self.settings.ping_triggers_reset {
            log::warn!("Ping received, resetting");
            self.state = State::ResetPending;
        }
        self.response(Kind::Okay, command).with_payload_byte(0, self.settings.board_id)
    }

    fn reset(&mut self, command: &Message) -> Message {
        log::info!("Reset command received");
        self.state = State::ResetPending;
        self.response(Kind::Okay, command)
    }

    fn get_mode(&self, command: &Message) -> Message {
        let mode = self.boot_mode.read_boot_mode();
        self.response(Kind::Okay, command).with_payload_byte(0, mode as u8)
    }

    /// Mode replies carry the stored mode in byte 0, so the reason code
    /// of a failure moves to byte 1.
    fn set_mode(&mut self, command: &Message) -> Message {
        let requested = match BootMode::try_from(command.payload[0]) {
            Ok(mode) => mode,
            Err(unknown) => {
                log::warn!("Refused unknown boot mode {}", unknown);
                let current = self.boot_mode.read_boot_mode();
                return self
                    .response(Kind::Error, command)
                    .with_payload_byte(0, current as u8)
                    .with_payload_byte(1, ErrorCode::InvalidMode as u8);
            }
        };
        self.boot_mode.write_boot_mode(requested);
        let stored = self.boot_mode.read_boot_mode();
        if stored == requested {
            log::info!("Boot mode set to {:?}", stored);
            self.response(Kind::Okay, command).with_payload_byte(0, stored as u8)
        } else {
            log::warn!("Boot mode {:?} didn't stick", requested);
            self.response(Kind::Error, command)
                .with_payload_byte(0, stored as u8)
                .with_payload_byte(1, ErrorCode::InvalidMode as u8)
        }
    }

    /// One `ConnStatus` reply per link, all of them sent back on `source`.
    fn report_connections(&mut self, source: usize, command: &Message) {
        for index in 0..self.transports.len() {
            let transport = &self.transports[index];
            let status = self
                .response(Kind::ConnStatus, command)
                .with_payload_byte(0, index as u8)
                .with_payload_byte(1, transport.kind() as u8)
                .with_payload_byte(2, saturate(transport.read_window()))
                .with_payload_byte(3, saturate(transport.write_window()));
            self.reply(source, status);
        }
    }

    fn erase(&mut self, command: &Message) -> Message {
        let length = command.value() as usize;
        match nb::block!(self.flash.erase(self.settings.app_start, length)) {
            Ok(()) => {
                log::info!("Erased {} bytes of application flash", length);
                self.response(Kind::Okay, command).with_value(command.value())
            }
            Err(e) => {
                log::warn!("Erase failed: {}", Error::from(e).describe());
                self.failure(command, ErrorCode::EraseFailed)
            }
        }
    }

    /// CRC32 of `value` bytes from the start of the application.
    fn checksum(&mut self, command: &Message) -> Message {
        let mut crc = Crc32::new();
        let mut chunk = [0u8; CHECKSUM_CHUNK];
        let mut address = self.settings.app_start;
        let mut remaining = command.value() as usize;
        while remaining > 0 {
            let bytes = &mut chunk[..remaining.min(CHECKSUM_CHUNK)];
            if let Err(e) = nb::block!(self.flash.read(address, bytes)) {
                log::warn!("Checksum read failed: {}", Error::from(e).describe());
                return self.failure(command, ErrorCode::ReadFailed);
            }
            crc.update(bytes);
            address = address + bytes.len();
            remaining -= bytes.len();
        }
        self.response(Kind::Checksum, command).with_value(crc.finish())
    }

    fn unlock(&mut self, command: &Message) -> Message {
        log::info!("Write session opened");
        self.writing = true;
        self.cursor = self.settings.app_start;
        self.flash.unlock();
        self.response(Kind::Okay, command).with_value(self.cursor.into())
    }

    fn lock(&mut self, command: &Message) -> Message {
        log::info!("Write session closed");
        self.end_session();
        self.response(Kind::Okay, command).with_value(self.cursor.into())
    }

    fn end_session(&mut self) {
        self.writing = false;
        self.cursor = self.settings.app_start;
        self.flash.lock();
    }

    fn move_cursor(&mut self, command: &Message, target: Address) -> Message {
        self.cursor = target;
        self.position(command)
    }

    fn position(&self, command: &Message) -> Message {
        self.response(Kind::Okay, command).with_value(self.cursor.into())
    }

    fn read(&mut self, command: &Message) -> Message {
        let mut word = [0u8; WORD];
        let response = match nb::block!(self.flash.read(self.cursor, &mut word)) {
            Ok(()) => {
                let mut response = self.response(Kind::Read, command);
                response.payload = word;
                response
            }
            Err(e) => {
                log::warn!("Read failed: {}", Error::from(e).describe());
                self.failure(command, ErrorCode::ReadFailed)
            }
        };
        self.cursor = self.cursor + WORD;
        response
    }

    /// Successful writes are silent. Any failure ends the write session.
    fn write(&mut self, command: &Message) -> Option<Message> {
        let (_, flash_end) = self.flash.range();
        let outcome = if !self.writing || self.cursor < self.settings.app_start {
            Err(ErrorCode::NoWriteSession)
        } else if u64::from(self.cursor.0) + WORD as u64 > u64::from(flash_end.0) {
            Err(ErrorCode::OutOfBounds)
        } else {
            nb::block!(self.flash.write(self.cursor, &command.payload)).map_err(|e| {
                log::warn!("Write failed: {}", Error::from(e).describe());
                ErrorCode::WriteFailed
            })
        };

        let response = outcome.err().map(|code| {
            log::warn!("Write session aborted: {:?}", code);
            self.end_session();
            self.failure(command, code)
        });
        self.cursor = self.cursor + WORD;
        response
    }
}

fn saturate(window: usize) -> u8 { u8::try_from(window).unwrap_or(u8::MAX) }
