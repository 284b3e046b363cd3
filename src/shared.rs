//! Sharing one driver between execution contexts.
//!
//! A transaction must not be interleaved with another one: a second context
//! raising CE halfway through a burst leaves the chip addressing the wrong
//! register. [`SharedDs1302`] holds the driver behind a critical section for the
//! length of a whole operation.

use core::cell::RefCell;

use critical_section::Mutex;

/// A driver that can be placed in a `static` and used from interrupt handlers
/// and the main loop alike.
///
/// ```rust,ignore
/// static RTC: SharedDs1302<Rtc> = SharedDs1302::new(None);
///
/// let now = RTC.lock(|rtc| rtc.as_mut().map(|rtc| rtc.get_datetime()));
/// ```
pub struct SharedDs1302<T> {
    inner: Mutex<RefCell<T>>,
}

impl<T> SharedDs1302<T> {
    pub const fn new(rtc: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(rtc)),
        }
    }

    /// Run `f` with exclusive access to the driver, inside one critical section.
    pub fn lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    /// Swap the driver out, e.g. to install it after a `None` placeholder.
    pub fn replace(&self, rtc: T) -> T {
        critical_section::with(|cs| self.inner.replace(cs, rtc))
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner().into_inner()
    }
}
