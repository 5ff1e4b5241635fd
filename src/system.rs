//! Processor level terminal actions.
//!
//! Both functions diverge. On the host, where there is no processor to
//! reset, they panic so tests can observe them.
use crate::log;

/// Hard resets the processor.
pub fn reset() -> ! {
    log::info!("Resetting processor");
    #[cfg(target_arch = "arm")]
    cortex_m::peripheral::SCB::sys_reset();
    #[cfg(not(target_arch = "arm"))]
    panic!("processor reset requested");
}

/// Unrecoverable firmware fault. Stops at a breakpoint and spins, as
/// carrying on risks corrupting flash.
pub fn halt(reason: &'static str) -> ! {
    log::error!("Halting: {}", reason);
    #[cfg(target_arch = "arm")]
    {
        cortex_m::asm::bkpt();
        loop {
            core::hint::spin_loop();
        }
    }
    #[cfg(not(target_arch = "arm"))]
    panic!("{}", reason);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    #[should_panic(expected = "processor reset requested")]
    fn reset_diverges() { reset(); }

    #[test]
    #[should_panic(expected = "[Configuration] No transports to listen on")]
    fn halting_reports_the_reason() { halt(crate::error::Error::NoTransports.describe()); }
}
