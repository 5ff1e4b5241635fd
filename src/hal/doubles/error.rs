use crate::error::{Convertible, Error};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FakeError {
    Locked,
    OutOfBounds,
    /// Attempted to set bits that only an erase can set.
    NotErased,
    /// Failures injected by a test, one per operation.
    WriteFailed,
    EraseFailed,
    ReadFailed,
}

impl Convertible for FakeError {
    fn into(self) -> Error {
        match self {
            FakeError::Locked => Error::FlashLocked,
            FakeError::OutOfBounds => Error::FlashOutOfBounds,
            FakeError::NotErased => Error::FlashWriteFailed,
            FakeError::WriteFailed => Error::FlashWriteFailed,
            FakeError::EraseFailed => Error::FlashEraseFailed,
            FakeError::ReadFailed => Error::FlashReadFailed,
        }
    }
}
