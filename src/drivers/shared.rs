//! State shared between interrupt handlers and the dispatcher loop.
//!
//! Every access is a short critical section. Spin loops that wait on
//! an interrupt take and release the cell on each iteration so the
//! handler gets to run in between.
#[cfg(target_arch = "arm")]
use core::cell::RefCell;
#[cfg(target_arch = "arm")]
use cortex_m::interrupt::{self, Mutex};

pub struct Shared<T> {
    #[cfg(target_arch = "arm")]
    inner: Mutex<RefCell<T>>,
    #[cfg(not(target_arch = "arm"))]
    inner: std::sync::Mutex<T>,
}

impl<T> Shared<T> {
    #[cfg(target_arch = "arm")]
    pub const fn new(value: T) -> Self { Self { inner: Mutex::new(RefCell::new(value)) } }

    #[cfg(not(target_arch = "arm"))]
    pub const fn new(value: T) -> Self { Self { inner: std::sync::Mutex::new(value) } }

    /// Runs `f` with exclusive access. Must not be nested on the same cell.
    #[cfg(target_arch = "arm")]
    pub fn lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        interrupt::free(|cs| f(&mut self.inner.borrow(cs).borrow_mut()))
    }

    /// Runs `f` with exclusive access. Must not be nested on the same cell.
    #[cfg(not(target_arch = "arm"))]
    pub fn lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }
}
