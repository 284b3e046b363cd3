//! DS1302 real time clock-calendar platform agnostic driver, bit-banged over GPIO
//!
//! # About
//!
//!The DS1302 trickle-charge timekeeping chip contains a real-time clock/calendar and 31 bytes of static RAM. It
//!communicates with a microprocessor via a simple three-wire serial interface: CE (chip enable), SCLK (serial clock)
//!and a bidirectional I/O line. This driver runs that interface on three ordinary GPIO pins described by
//![`embedded-hal`] traits, so any platform with two output pins, one pin that can switch direction, and a delay
//!source can host it.
//!
//! [`embedded-hal`]: https://github.com/rust-embedded/embedded-hal
//!
//!Datasheet: [DS1302](https://datasheets.maximintegrated.com/en/ds/DS1302.pdf)
//!
//! ## Driver features:
//! - Reading/setting clock/calendar data in one burst transaction
//! - Halting and restarting the oscillator
//! - Write protection
//! - 31 x 8 Battery-Backed General-Purpose RAM operations, single byte and burst
//!
//! ## Limitations
//!
//! The serial protocol has no acknowledgment. A missing or miswired chip does not produce an error, only
//!implausible data (usually all ones or all zeros). Check decoded values before trusting them, for example with
//!the `chrono` feature's conversion into `NaiveDateTime`.
//!
//! The clock is treated as a 24-hour clock. The 12-hour mode bit is masked off when reading.
//!
//! ## Example
//!
//! ```rust,ignore
//! use ds1302_gpio::{DateTime, Ds1302, HalDelay};
//!
//! let mut rtc: Ds1302<_, _, _, _, 1_000_000> = Ds1302::new(ce, sclk, io, HalDelay::new(timer))?;
//! rtc.write_protect(false)?;
//! rtc.set_datetime(&DateTime { second: 0, minute: 30, hour: 13, day: 15, month: 6, day_of_week: 6, year: 24 })?;
//! let now = rtc.get_datetime()?;
//! ```

#![no_std]

#[cfg(all(feature = "rp2040", feature = "rp2350"))]
compile_error!("You must not enable both the `rp2040` and `rp2350` Cargo features.");

#[macro_use]
mod fmt;

pub mod bus;
pub mod datetime;
pub mod delay;
pub mod registers;
pub mod shared;

#[cfg(any(feature = "rp2040", feature = "rp2350"))]
pub mod platform;

#[cfg(feature = "rp2350")]
use rp235x_hal as hal;

#[cfg(feature = "rp2040")]
use rp2040_hal as hal;

use embedded_hal::digital::OutputPin;

pub use crate::bus::{Bus, DataLine, Direction};
pub use crate::datetime::{bcd_to_decimal, decimal_to_bcd, DateTime, DateTimeError, Weekday};
pub use crate::delay::{Delay, HalDelay};
pub use crate::registers::{Register, RAM_SIZE};
pub use crate::shared::SharedDs1302;

use crate::registers::{ram_addr, CLOCK_BURST_LEN, CLOCK_HALT, RAM_BURST, WRITE_PROTECT};

/// DS1302 error
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Ds1302Error {
    /// RAM index past the last byte (30)
    AddressOutOfRange(u8),
    /// More bytes than the RAM holds (31)
    LengthOutOfRange(usize),
    ChipSelectError,
    ClockError,
    ReadError,
    WriteError,
    DirectionError,
    /// The delay provider failed
    Delay,
}

///DS1302 RTC driver
pub struct Ds1302<CE, SCLK, IO, D, const TIMER_HZ: u32> {
    bus: Bus<CE, SCLK, IO, D, TIMER_HZ>,
}

impl<CE, SCLK, IO, D, const TIMER_HZ: u32> Ds1302<CE, SCLK, IO, D, TIMER_HZ>
where
    CE: OutputPin,
    SCLK: OutputPin,
    IO: DataLine,
    D: Delay<TIMER_HZ>,
{
    /// Take the three pins and the delay provider. CE and SCLK are driven low and
    /// I/O is left as an input. Nothing is sent to the chip.
    pub fn new(ce: CE, sclk: SCLK, io: IO, delay: D) -> Result<Self, Ds1302Error> {
        Ok(Ds1302 {
            bus: Bus::new(ce, sclk, io, delay)?,
        })
    }

    /// Give the pins and the delay provider back.
    pub fn release(self) -> (CE, SCLK, IO, D) {
        self.bus.release()
    }

    /// Read a single clock or control register.
    pub fn read_register(&mut self, reg: Register) -> Result<u8, Ds1302Error> {
        self.bus.read(reg.addr(), |bus| bus.read_byte())
    }

    /// Write a single clock or control register. Ignored by the chip while
    /// write protection is on, unless `reg` is [`Register::Control`].
    pub fn write_register(&mut self, reg: Register, value: u8) -> Result<(), Ds1302Error> {
        self.bus.write(reg.addr(), |bus| bus.write_byte(value))
    }

    /// Whether the oscillator is stopped.
    pub fn is_halted(&mut self) -> Result<bool, Ds1302Error> {
        let seconds = self.read_register(Register::Seconds)?;
        Ok(seconds & CLOCK_HALT != 0)
    }

    /// Stop the oscillator. The seconds count is reset to zero.
    ///
    /// Like any register write this has no effect while write protection is
    /// enabled, which is the state [`Ds1302::set_datetime`] leaves behind.
    pub fn halt(&mut self) -> Result<(), Ds1302Error> {
        debug!("ds1302: halt");
        self.write_register(Register::Seconds, CLOCK_HALT)
    }

    /// Start or stop the oscillator, keeping the current seconds value.
    pub fn set_running(&mut self, is_running: bool) -> Result<(), Ds1302Error> {
        let mut seconds = self.read_register(Register::Seconds)?;
        if is_running {
            seconds &= !CLOCK_HALT;
        } else {
            seconds |= CLOCK_HALT;
        }
        self.write_register(Register::Seconds, seconds)
    }

    /// write_protect(true) -> Enable Write_Protect
    /// write_protect(false) -> Disable Write_Protect
    ///
    /// While enabled the chip silently drops every write except to the control
    /// register itself. Its state after power-up is undefined, so set it once
    /// before relying on writes.
    pub fn write_protect(&mut self, enable: bool) -> Result<(), Ds1302Error> {
        debug!("ds1302: write protect {}", enable);
        let value = if enable { WRITE_PROTECT } else { 0 };
        self.write_register(Register::Control, value)
    }

    pub fn is_write_protected(&mut self) -> Result<bool, Ds1302Error> {
        let control = self.read_register(Register::Control)?;
        Ok(control & WRITE_PROTECT != 0)
    }

    ///Return current date and time, read in a single clock burst so that no
    ///field can roll over between the others.
    pub fn get_datetime(&mut self) -> Result<DateTime, Ds1302Error> {
        let mut raw = [0_u8; 7];
        self.bus.read(Register::ClockBurst.addr(), |bus| {
            for byte in raw.iter_mut() {
                *byte = bus.read_byte()?;
            }
            Ok(())
        })?;
        let dt = DateTime::from_registers(&raw);
        debug!("ds1302: read {:?}", dt);
        Ok(dt)
    }

    /// Set date and time and start the clock.
    ///
    /// Write protection is lifted first. The burst then writes the seven time
    /// registers (each field wrapped into its range, halt flag clear) followed by
    /// the control register, which turns write protection back on.
    pub fn set_datetime(&mut self, dt: &DateTime) -> Result<(), Ds1302Error> {
        debug!("ds1302: set {:?}", dt);
        self.write_protect(false)?;
        let mut burst = [WRITE_PROTECT; CLOCK_BURST_LEN];
        burst[..7].copy_from_slice(&dt.to_registers());
        self.bus.write(Register::ClockBurst.addr(), |bus| {
            for byte in burst {
                bus.write_byte(byte)?;
            }
            Ok(())
        })
    }

    /// Read DS1302 internal RAM. The static RAM is 31 x 8 bytes, index 0..=30.
    pub fn get_ram_byte(&mut self, index: u8) -> Result<u8, Ds1302Error> {
        let addr = ram_addr(index).ok_or(Ds1302Error::AddressOutOfRange(index))?;
        self.bus.read(addr, |bus| bus.read_byte())
    }

    /// Write DS1302 internal RAM. The static RAM is 31 x 8 bytes, index 0..=30.
    pub fn set_ram_byte(&mut self, index: u8, value: u8) -> Result<(), Ds1302Error> {
        let addr = ram_addr(index).ok_or(Ds1302Error::AddressOutOfRange(index))?;
        self.bus.write(addr, |bus| bus.write_byte(value))
    }

    /// Read DS1302 internal RAM burst mode. Start at 0 index.
    /// Fills at most 31 bytes of `buf` and returns how many were read; an empty
    /// `buf` does not touch the bus.
    pub fn read_ram_burst(&mut self, buf: &mut [u8]) -> Result<usize, Ds1302Error> {
        let len = clamp_to_ram(buf.len());
        if len == 0 {
            return Ok(0);
        }
        self.bus.read(RAM_BURST, |bus| {
            for byte in buf[..len].iter_mut() {
                *byte = bus.read_byte()?;
            }
            Ok(len)
        })
    }

    /// Write DS1302 internal RAM burst mode. Start at 0 index.
    /// Writes at most the first 31 bytes of `data` and returns how many were
    /// written; an empty `data` does not touch the bus.
    pub fn write_ram_burst(&mut self, data: &[u8]) -> Result<usize, Ds1302Error> {
        let len = clamp_to_ram(data.len());
        if len == 0 {
            return Ok(0);
        }
        self.bus.write(RAM_BURST, |bus| {
            for byte in &data[..len] {
                bus.write_byte(*byte)?;
            }
            Ok(len)
        })
    }

    /// Like [`Ds1302::read_ram_burst`], but a `buf` longer than the RAM is an error.
    pub fn read_ram_burst_exact(&mut self, buf: &mut [u8]) -> Result<(), Ds1302Error> {
        check_ram_len(buf.len())?;
        self.read_ram_burst(buf).map(|_| ())
    }

    /// Like [`Ds1302::write_ram_burst`], but `data` longer than the RAM is an error.
    pub fn write_ram_burst_exact(&mut self, data: &[u8]) -> Result<(), Ds1302Error> {
        check_ram_len(data.len())?;
        self.write_ram_burst(data).map(|_| ())
    }
}

fn clamp_to_ram(len: usize) -> usize {
    if len > RAM_SIZE {
        warn!("ds1302: burst of {} bytes truncated to {}", len, RAM_SIZE);
        RAM_SIZE
    } else {
        len
    }
}

fn check_ram_len(len: usize) -> Result<(), Ds1302Error> {
    if len > RAM_SIZE {
        Err(Ds1302Error::LengthOutOfRange(len))
    } else {
        Ok(())
    }
}
