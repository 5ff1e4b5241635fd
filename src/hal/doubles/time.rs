use crate::hal::time::{self, Milliseconds};
use std::cell::Cell;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MockInstant(pub u32);

impl time::Instant for MockInstant {}

impl core::ops::Sub for MockInstant {
    type Output = Milliseconds;
    fn sub(self, rhs: Self) -> Self::Output { Milliseconds(self.0.wrapping_sub(rhs.0)) }
}

impl core::ops::Add<Milliseconds> for MockInstant {
    type Output = Self;
    fn add(self, rhs: Milliseconds) -> Self { MockInstant(self.0.wrapping_add(rhs.0)) }
}

/// Tick source that moves forward by `step` every time it is read, so
/// spin loops waiting on it always make progress.
#[derive(Debug)]
pub struct MockClock {
    ticks: Cell<u32>,
    step: u32,
}

impl MockClock {
    pub fn new(step: u32) -> Self { Self { ticks: Cell::new(0), step } }
    pub fn ticks(&self) -> u32 { self.ticks.get() }
}

impl time::Now for MockClock {
    type I = MockInstant;
    fn now(&self) -> MockInstant {
        let now = self.ticks.get();
        self.ticks.set(now.wrapping_add(self.step));
        MockInstant(now)
    }
}

impl time::Now for &MockClock {
    type I = MockInstant;
    fn now(&self) -> MockInstant { (*self).now() }
}
