//! [`DataLine`] for RP2040 / RP2350 SIO pins.
//!
//! The data pin is handed over in push-pull output mode, the way CE and SCLK
//! are:
//!
//! ```rust,ignore
//! let io: Pin<_, FunctionSioOutput, PullUp> = pins.gpio16.reconfigure();
//! let sclk: Pin<_, FunctionSioOutput, PullDown> = pins.gpio17.reconfigure();
//! let ce: Pin<_, FunctionSioOutput, PullDown> = pins.gpio18.reconfigure();
//!
//! let rtc: Ds1302<_, _, _, _, 1_000_000> =
//!     Ds1302::new(ce, sclk, SioDataPin::new(io), HalDelay::new(timer))?;
//! ```

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin, StatefulOutputPin};

use crate::bus::{DataLine, Direction};
use crate::hal::gpio::{FunctionSioInput, FunctionSioOutput, Pin, PinId, PullType, ValidFunction};

enum Mode<I: PinId, P: PullType> {
    Output(Pin<I, FunctionSioOutput, P>),
    Input(Pin<I, FunctionSioInput, P>),
}

/// A SIO pin that is reconfigured between input and output on demand.
pub struct SioDataPin<I: PinId, P: PullType> {
    // only `None` while a reconfiguration is in flight
    pin: Option<Mode<I, P>>,
}

impl<I, P> SioDataPin<I, P>
where
    I: PinId + ValidFunction<FunctionSioInput> + ValidFunction<FunctionSioOutput>,
    P: PullType,
{
    pub fn new(pin: Pin<I, FunctionSioOutput, P>) -> Self {
        Self {
            pin: Some(Mode::Output(pin)),
        }
    }

    /// Return the pin, configured as an output.
    pub fn release(self) -> Option<Pin<I, FunctionSioOutput, P>> {
        match self.pin? {
            Mode::Output(pin) => Some(pin),
            Mode::Input(pin) => Some(pin.reconfigure()),
        }
    }
}

impl<I: PinId, P: PullType> ErrorType for SioDataPin<I, P> {
    type Error = Infallible;
}

impl<I, P> InputPin for SioDataPin<I, P>
where
    I: PinId + ValidFunction<FunctionSioInput> + ValidFunction<FunctionSioOutput>,
    P: PullType,
{
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        match self.pin.as_mut() {
            Some(Mode::Input(pin)) => pin.is_high(),
            Some(Mode::Output(pin)) => pin.is_set_high(),
            None => Ok(false),
        }
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

impl<I, P> OutputPin for SioDataPin<I, P>
where
    I: PinId + ValidFunction<FunctionSioInput> + ValidFunction<FunctionSioOutput>,
    P: PullType,
{
    fn set_low(&mut self) -> Result<(), Self::Error> {
        match self.pin.as_mut() {
            Some(Mode::Output(pin)) => pin.set_low(),
            _ => Ok(()),
        }
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        match self.pin.as_mut() {
            Some(Mode::Output(pin)) => pin.set_high(),
            _ => Ok(()),
        }
    }
}

impl<I, P> DataLine for SioDataPin<I, P>
where
    I: PinId + ValidFunction<FunctionSioInput> + ValidFunction<FunctionSioOutput>,
    P: PullType,
{
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error> {
        self.pin = match (self.pin.take(), direction) {
            (Some(Mode::Output(pin)), Direction::Input) => {
                let pin: Pin<I, FunctionSioInput, P> = pin.reconfigure();
                Some(Mode::Input(pin))
            }
            (Some(Mode::Input(pin)), Direction::Output) => {
                let pin: Pin<I, FunctionSioOutput, P> = pin.reconfigure();
                Some(Mode::Output(pin))
            }
            (unchanged, _) => unchanged,
        };
        Ok(())
    }
}
