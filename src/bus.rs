//! The three-wire serial bus: bit transport and transaction framing.
//!
//! Bits travel LSB first. The host drives a bit onto I/O and the chip latches
//! it on the rising SCLK edge. In a read, the chip presents bit 0 after the
//! falling edge of the last command clock and the following bits after each
//! subsequent falling edge, so the host samples I/O before every pulse.
//!
//! A transaction is CE high, one command byte, data bytes, CE low. There is no
//! acknowledgment: a missing chip reads back as whatever the idle line floats to.

use embedded_hal::digital::{InputPin, OutputPin, PinState};
use fugit::ExtU32;

use crate::delay::{Delay, CE_INACTIVE_US, CE_SETUP_US, CLOCK_PULSE_WIDTH_US};
use crate::registers::{read_command, write_command};
use crate::Ds1302Error;

/// Direction of the shared data line, seen from the host.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Input,
    Output,
}

/// The bidirectional I/O line.
///
/// embedded-hal has no pin that changes direction at runtime, so platforms
/// implement this on top of their own pin types.
pub trait DataLine: InputPin + OutputPin {
    /// Reconfigure the pin. Called only when the direction actually changes.
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error>;
}

/// Owns the CE, SCLK and I/O pins plus the delay provider, and caches the
/// current direction of I/O.
pub struct Bus<CE, SCLK, IO, D, const TIMER_HZ: u32> {
    ce: CE,
    sclk: SCLK,
    io: IO,
    delay: D,
    direction: Direction,
}

impl<CE, SCLK, IO, D, const TIMER_HZ: u32> Bus<CE, SCLK, IO, D, TIMER_HZ>
where
    CE: OutputPin,
    SCLK: OutputPin,
    IO: DataLine,
    D: Delay<TIMER_HZ>,
{
    /// Park the bus: CE low, SCLK low, I/O released as an input.
    pub fn new(ce: CE, sclk: SCLK, io: IO, delay: D) -> Result<Self, Ds1302Error> {
        let mut bus = Bus {
            ce,
            sclk,
            io,
            delay,
            direction: Direction::Input,
        };
        bus.ce.set_low().map_err(|_| Ds1302Error::ChipSelectError)?;
        bus.sclk.set_low().map_err(|_| Ds1302Error::ClockError)?;
        bus.io
            .set_direction(Direction::Input)
            .map_err(|_| Ds1302Error::DirectionError)?;
        Ok(bus)
    }

    pub fn release(self) -> (CE, SCLK, IO, D) {
        (self.ce, self.sclk, self.io, self.delay)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Switch I/O to `direction`. A no-op when it already points that way.
    pub fn set_direction(&mut self, direction: Direction) -> Result<(), Ds1302Error> {
        if self.direction != direction {
            self.io
                .set_direction(direction)
                .map_err(|_| Ds1302Error::DirectionError)?;
            self.direction = direction;
        }
        Ok(())
    }

    fn pause_us(&mut self, us: u32) -> Result<(), Ds1302Error> {
        self.delay.start(us.micros()).map_err(|_| Ds1302Error::Delay)?;
        nb::block!(self.delay.wait()).map_err(|_| Ds1302Error::Delay)
    }

    /// One full clock pulse: SCLK high, hold, SCLK low, hold.
    fn advance_clock(&mut self) -> Result<(), Ds1302Error> {
        self.sclk.set_high().map_err(|_| Ds1302Error::ClockError)?;
        self.pause_us(CLOCK_PULSE_WIDTH_US)?;
        self.sclk.set_low().map_err(|_| Ds1302Error::ClockError)?;
        self.pause_us(CLOCK_PULSE_WIDTH_US)
    }

    /// Shift in one byte, LSB first. I/O must already be an input.
    pub fn read_byte(&mut self) -> Result<u8, Ds1302Error> {
        let mut data = 0;
        for i in 0..8 {
            if self.io.is_high().map_err(|_| Ds1302Error::ReadError)? {
                data |= 1 << i;
            }
            self.advance_clock()?;
        }
        Ok(data)
    }

    /// Shift out one byte, LSB first. I/O must already be an output.
    pub fn write_byte(&mut self, byte: u8) -> Result<(), Ds1302Error> {
        for i in 0..8 {
            let level = PinState::from((byte >> i) & 1 == 1);
            self.io
                .set_state(level)
                .map_err(|_| Ds1302Error::WriteError)?;
            self.advance_clock()?;
        }
        Ok(())
    }

    fn select(&mut self) -> Result<(), Ds1302Error> {
        self.set_direction(Direction::Output)?;
        self.sclk.set_low().map_err(|_| Ds1302Error::ClockError)?;
        self.ce.set_high().map_err(|_| Ds1302Error::ChipSelectError)?;
        self.pause_us(CE_SETUP_US)
    }

    /// Assert CE and send the read command for `address`, then turn I/O around
    /// so the chip can drive it.
    pub fn begin_read(&mut self, address: u8) -> Result<(), Ds1302Error> {
        let command = read_command(address);
        trace!("ds1302: read command {:#x}", command);
        self.select()?;
        self.write_byte(command)?;
        self.set_direction(Direction::Input)
    }

    /// Assert CE and send the write command for `address`. I/O stays an output
    /// for the data bytes that follow.
    pub fn begin_write(&mut self, address: u8) -> Result<(), Ds1302Error> {
        let command = write_command(address);
        trace!("ds1302: write command {:#x}", command);
        self.select()?;
        self.write_byte(command)
    }

    /// Deassert CE, closing the transaction.
    pub fn end(&mut self) -> Result<(), Ds1302Error> {
        self.ce.set_low().map_err(|_| Ds1302Error::ChipSelectError)?;
        self.pause_us(CE_INACTIVE_US)
    }

    /// Run `body` inside a read transaction on `address`.
    ///
    /// CE is released exactly once whether or not `body` fails; the first
    /// error wins.
    pub fn read<R>(
        &mut self,
        address: u8,
        body: impl FnOnce(&mut Self) -> Result<R, Ds1302Error>,
    ) -> Result<R, Ds1302Error> {
        let result = self.begin_read(address).and_then(|()| body(self));
        self.finish(result)
    }

    /// Run `body` inside a write transaction on `address`. See [`Bus::read`].
    pub fn write<R>(
        &mut self,
        address: u8,
        body: impl FnOnce(&mut Self) -> Result<R, Ds1302Error>,
    ) -> Result<R, Ds1302Error> {
        let result = self.begin_write(address).and_then(|()| body(self));
        self.finish(result)
    }

    fn finish<R>(&mut self, result: Result<R, Ds1302Error>) -> Result<R, Ds1302Error> {
        let end = self.end();
        let value = result?;
        end?;
        Ok(value)
    }
}
