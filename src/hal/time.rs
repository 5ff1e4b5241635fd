//! Millisecond tick abstractions.
use core::ops::{Add as Adds, Sub as Subtracts};

/// A reading of a free running millisecond tick. Two readings
/// subtract to the span between them, wrapping included.
pub trait Instant
where
    Self: Copy + Clone,
    Self: Subtracts<Output = Milliseconds>,
    Self: Adds<Milliseconds, Output = Self>,
{
}

/// Source of the current tick.
pub trait Now {
    type I: Instant;
    fn now(&self) -> Self::I;
}

#[derive(Clone, Copy, Debug, PartialOrd, PartialEq, Eq, Ord)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub struct Milliseconds(pub u32);
