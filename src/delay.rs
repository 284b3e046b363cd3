use core::convert::Infallible;

use embedded_hal::delay::DelayNs;

/// Minimum time each clock phase is held (tCH / tCL, 1000 ns at 2 V).
pub const CLOCK_PULSE_WIDTH_US: u32 = 1;
/// CE high to the first clock edge (tCC, 4 us at 2 V).
pub const CE_SETUP_US: u32 = 4;
/// CE low time between two transactions (tCWH, 4 us at 2 V).
pub const CE_INACTIVE_US: u32 = 4;

/// For timing the driver uses [fugit](https://lib.rs/crates/fugit), which only provides `Duration` and `Instant` types.
/// It does not provide any clock or timer traits.
/// Therefore the driver has its own `Delay` trait that provides the timing it needs.
/// Implement it for a hardware timer, or wrap any [`DelayNs`] in [`HalDelay`].
pub trait Delay<const TIMER_HZ: u32> {
    /// An error that might happen during waiting
    type Error;

    /// Start countdown with a `duration`
    fn start(&mut self, duration: fugit::TimerDurationU32<TIMER_HZ>) -> Result<(), Self::Error>;

    /// Wait until countdown `duration` has expired.
    /// Must return `nb::Error::WouldBlock` if countdown `duration` is not yet over.
    /// Must return `OK(())` as soon as countdown `duration` has expired.
    fn wait(&mut self) -> nb::Result<(), Self::Error>;
}

/// Adapts a blocking [`DelayNs`] provider to [`Delay`] at microsecond resolution.
///
/// The countdown is spent in [`Delay::wait`], which therefore never returns
/// `WouldBlock`.
pub struct HalDelay<T> {
    delay: T,
    pending_us: u32,
}

impl<T: DelayNs> HalDelay<T> {
    pub fn new(delay: T) -> Self {
        Self {
            delay,
            pending_us: 0,
        }
    }

    pub fn release(self) -> T {
        self.delay
    }
}

impl<T: DelayNs> Delay<1_000_000> for HalDelay<T> {
    type Error = Infallible;

    fn start(&mut self, duration: fugit::MicrosDurationU32) -> Result<(), Self::Error> {
        self.pending_us = duration.ticks();
        Ok(())
    }

    fn wait(&mut self) -> nb::Result<(), Self::Error> {
        if self.pending_us > 0 {
            self.delay.delay_us(self.pending_us);
            self.pending_us = 0;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    extern crate std;

    use super::*;
    use fugit::ExtU32;
    use std::vec::Vec;

    /// Records every blocking delay it is asked for, in nanoseconds.
    #[derive(Default)]
    pub(crate) struct Recorder {
        pub(crate) waits_ns: Vec<u32>,
    }

    impl DelayNs for Recorder {
        fn delay_ns(&mut self, ns: u32) {
            self.waits_ns.push(ns);
        }
    }

    #[test]
    fn test_hal_delay_spends_countdown_on_wait() {
        let mut delay = HalDelay::new(Recorder::default());
        delay.start(CE_SETUP_US.micros()).unwrap();
        assert!(delay.delay.waits_ns.is_empty());
        nb::block!(delay.wait()).unwrap();
        // a second wait without a new start does nothing
        nb::block!(delay.wait()).unwrap();
        assert_eq!(delay.release().waits_ns, [4_000]);
    }

    #[test]
    fn test_hal_delay_zero_duration() {
        let mut delay = HalDelay::new(Recorder::default());
        delay.start(0.micros()).unwrap();
        nb::block!(delay.wait()).unwrap();
        assert!(delay.release().waits_ns.is_empty());
    }
}
