//! Register map and command-byte framing of the DS1302.
//!
//! Every transaction starts with one command byte, shifted out LSB first:
//!
//! ```text
//!   bit  7     6       5..1       0
//!      | 1 | RAM/CK | A4..A0 | RD/W |
//! ```
//!
//! Bit 7 must be set or the chip ignores the transaction. Bit 6 selects the RAM
//! block over the clock/calendar block, and bit 0 selects a read. Address 31
//! (`A4..A0` all set) is the burst pseudo-register of either block.
//!
//! The constants below carry that layout with bit 7 set and bit 0 clear, so a
//! command byte is formed by OR-ing in [`READ_COMMAND`] or [`WRITE_COMMAND`].

/// Start bit plus RD/W set.
pub const READ_COMMAND: u8 = 0b1000_0001;
/// Start bit with RD/W clear.
pub const WRITE_COMMAND: u8 = 0b1000_0000;

/// Clock-halt flag, bit 7 of the seconds register.
pub const CLOCK_HALT: u8 = 0b1000_0000;
/// Write-protect flag, bit 7 of the control register.
pub const WRITE_PROTECT: u8 = 0b1000_0000;

/// Size of the battery-backed static RAM.
pub const RAM_SIZE: usize = 31;
/// Highest valid RAM byte index.
pub const RAM_LAST_INDEX: u8 = RAM_SIZE as u8 - 1;

/// Base address of RAM byte 0.
pub const RAM_BASE: u8 = 0xC0;
/// RAM burst pseudo-register.
pub const RAM_BURST: u8 = 0xFE;

/// Bytes moved by a clock burst: the seven time fields and the control register.
pub const CLOCK_BURST_LEN: usize = 8;

// Masks applied to the clock registers before BCD decoding.
pub(crate) const SECONDS_MASK: u8 = 0b0111_1111;
pub(crate) const MINUTES_MASK: u8 = 0b0111_1111;
pub(crate) const HOURS_MASK: u8 = 0b0011_1111;
pub(crate) const DATE_MASK: u8 = 0b0011_1111;
pub(crate) const MONTH_MASK: u8 = 0b0001_1111;
pub(crate) const DAY_MASK: u8 = 0b0000_0111;
pub(crate) const YEAR_MASK: u8 = 0b0111_1111;

/// Clock/calendar and control registers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    /// Seconds (00-59) and the clock-halt flag
    Seconds,
    /// Minutes (00-59)
    Minutes,
    /// Hours (00-23), 12/24 mode bit
    Hours,
    /// Day of month (01-31)
    Date,
    /// Month (01-12)
    Month,
    /// Day of week (1-7)
    Day,
    /// Year (00-99)
    Year,
    /// Control register holding the write-protect flag
    Control,
    /// Clock burst pseudo-register
    ClockBurst,
}

impl Register {
    /// Address byte of the register with bit 7 set and the RD/W bit clear.
    pub const fn addr(self) -> u8 {
        match self {
            Register::Seconds => 0x80,
            Register::Minutes => 0x82,
            Register::Hours => 0x84,
            Register::Date => 0x86,
            Register::Month => 0x88,
            Register::Day => 0x8A,
            Register::Year => 0x8C,
            Register::Control => 0x8E,
            Register::ClockBurst => 0xBE,
        }
    }
}

/// Command byte that reads from `address`.
pub const fn read_command(address: u8) -> u8 {
    READ_COMMAND | address
}

/// Command byte that writes to `address`.
pub const fn write_command(address: u8) -> u8 {
    WRITE_COMMAND | address
}

/// Address byte of RAM byte `index`, or `None` past the end of the RAM.
pub const fn ram_addr(index: u8) -> Option<u8> {
    if index > RAM_LAST_INDEX {
        None
    } else {
        Some(RAM_BASE + index * 2)
    }
}
