//! A DS1302 model that follows the wire protocol edge by edge.
//!
//! The host side gets three pin handles sharing one `Rc<RefCell<Chip>>`. The
//! chip latches host bits on rising SCLK edges and presents read bits after
//! falling edges, decodes command bytes, and honours burst mode, the clock-halt
//! flag and write protection. It does not keep time.

#![allow(dead_code)]

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

use ds1302_gpio::{DataLine, Direction, Ds1302, HalDelay};
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use embedded_hal_mock::eh1::delay::NoopDelay;

const CONTROL: usize = 7;

#[derive(Debug)]
enum Phase {
    Idle,
    Command,
    Write { command: u8, index: usize },
    Read {
        command: u8,
        index: usize,
        byte: u8,
        bit: u8,
    },
}

#[derive(Debug)]
pub struct Chip {
    /// seconds, minutes, hours, date, month, day, year, control
    pub clock: [u8; 8],
    pub ram: [u8; 31],
    /// Command bytes in the order they were received.
    pub commands: Vec<u8>,
    /// Times the host switched I/O direction.
    pub direction_switches: usize,
    /// Times CE was raised.
    pub selects: usize,
    ce: bool,
    sclk: bool,
    host_output: bool,
    host_level: bool,
    chip_level: Option<bool>,
    phase: Phase,
    shift: u8,
    bits: u8,
}

impl Chip {
    /// Power-on state: oscillator halted, write protection on.
    pub fn new() -> Self {
        Chip {
            clock: [0x80, 0, 0, 0x01, 0x01, 0x01, 0, 0x80],
            ram: [0; 31],
            commands: Vec::new(),
            direction_switches: 0,
            selects: 0,
            ce: false,
            sclk: false,
            host_output: false,
            host_level: false,
            chip_level: None,
            phase: Phase::Idle,
            shift: 0,
            bits: 0,
        }
    }

    pub fn write_protected(&self) -> bool {
        self.clock[CONTROL] & 0x80 != 0
    }

    pub fn ce_high(&self) -> bool {
        self.ce
    }

    fn set_ce(&mut self, high: bool) {
        if high && !self.ce {
            self.selects += 1;
            self.phase = Phase::Command;
            self.shift = 0;
            self.bits = 0;
        }
        if !high {
            self.phase = Phase::Idle;
            self.chip_level = None;
        }
        self.ce = high;
    }

    fn set_sclk(&mut self, high: bool) {
        let rising = high && !self.sclk;
        let falling = !high && self.sclk;
        self.sclk = high;
        if !self.ce {
            return;
        }
        if rising {
            self.on_rising();
        }
        if falling {
            self.on_falling();
        }
    }

    fn line(&self) -> bool {
        if self.host_output {
            self.host_level
        } else {
            // pulled up when nobody drives it
            self.chip_level.unwrap_or(true)
        }
    }

    fn on_rising(&mut self) {
        if !matches!(self.phase, Phase::Command | Phase::Write { .. }) {
            return;
        }
        if self.line() {
            self.shift |= 1 << self.bits;
        }
        self.bits += 1;
        if self.bits < 8 {
            return;
        }
        let byte = self.shift;
        self.shift = 0;
        self.bits = 0;
        match self.phase {
            Phase::Command => {
                self.commands.push(byte);
                self.phase = if byte & 0x80 == 0 {
                    Phase::Idle
                } else if byte & 0x01 != 0 {
                    Phase::Read {
                        command: byte,
                        index: 0,
                        byte: self.fetch(byte, 0),
                        bit: 0,
                    }
                } else {
                    Phase::Write {
                        command: byte,
                        index: 0,
                    }
                };
            }
            Phase::Write { command, index } => {
                self.store(command, index, byte);
                self.phase = Phase::Write {
                    command,
                    index: index + 1,
                };
            }
            _ => {}
        }
    }

    fn on_falling(&mut self) {
        let Phase::Read {
            command,
            mut index,
            mut byte,
            mut bit,
        } = self.phase
        else {
            return;
        };
        if bit == 8 {
            // burst mode moves on to the next register
            index += 1;
            byte = self.fetch(command, index);
            bit = 0;
        }
        self.chip_level = Some((byte >> bit) & 1 == 1);
        self.phase = Phase::Read {
            command,
            index,
            byte,
            bit: bit + 1,
        };
    }

    fn fetch(&self, command: u8, index: usize) -> u8 {
        let ram = command & 0x40 != 0;
        let reg = usize::from((command >> 1) & 0x1F);
        match (ram, reg) {
            (false, 31) => self.clock.get(index).copied().unwrap_or(0xFF),
            (true, 31) => self.ram.get(index).copied().unwrap_or(0xFF),
            (false, reg) => self.clock.get(reg).copied().unwrap_or(0xFF),
            (true, reg) => self.ram.get(reg).copied().unwrap_or(0xFF),
        }
    }

    fn store(&mut self, command: u8, index: usize, value: u8) {
        let ram = command & 0x40 != 0;
        let reg = usize::from((command >> 1) & 0x1F);
        let target = match (ram, reg) {
            (false, 31) => (false, index),
            (true, 31) => (true, index),
            other => other,
        };
        let is_control = target == (false, CONTROL);
        if self.write_protected() && !is_control {
            return;
        }
        match target {
            (false, i) if i < self.clock.len() => self.clock[i] = value,
            (true, i) if i < self.ram.len() => self.ram[i] = value,
            _ => {}
        }
    }
}

pub type Wire = Rc<RefCell<Chip>>;

pub struct CePin(pub Wire);
pub struct ClockPin(pub Wire);
pub struct IoPin(pub Wire);

impl ErrorType for CePin {
    type Error = Infallible;
}

impl OutputPin for CePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().set_ce(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().set_ce(true);
        Ok(())
    }
}

impl ErrorType for ClockPin {
    type Error = Infallible;
}

impl OutputPin for ClockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().set_sclk(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().set_sclk(true);
        Ok(())
    }
}

impl ErrorType for IoPin {
    type Error = Infallible;
}

impl InputPin for IoPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.borrow().line())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

impl OutputPin for IoPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().host_level = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().host_level = true;
        Ok(())
    }
}

impl DataLine for IoPin {
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error> {
        let mut chip = self.0.borrow_mut();
        chip.direction_switches += 1;
        chip.host_output = direction == Direction::Output;
        Ok(())
    }
}

pub type SimRtc = Ds1302<CePin, ClockPin, IoPin, HalDelay<NoopDelay>, 1_000_000>;

/// A driver wired to a fresh simulated chip.
pub fn rtc() -> (SimRtc, Wire) {
    let wire = Rc::new(RefCell::new(Chip::new()));
    let rtc = Ds1302::new(
        CePin(wire.clone()),
        ClockPin(wire.clone()),
        IoPin(wire.clone()),
        HalDelay::new(NoopDelay::new()),
    )
    .expect("simulated pins never fail");
    (rtc, wire)
}
