//! Calendar record and BCD conversion for the DS1302 clock registers.
//!
//! The chip keeps every field in packed BCD, with flag bits sharing the top of
//! some bytes. [`DateTime`] holds plain decimal values; the conversions here
//! mask the flags off on the way in and wrap out-of-range values on the way
//! out. Neither direction checks the calendar (February 31st passes through),
//! since the chip does not either.
//!
//! With the `chrono` feature a [`DateTime`] converts to and from
//! `chrono::NaiveDateTime`, which is where callers get a plausibility check.

use crate::registers::{
    DATE_MASK, DAY_MASK, HOURS_MASK, MINUTES_MASK, MONTH_MASK, SECONDS_MASK, YEAR_MASK,
};

/// Swap format from decimal to packed BCD. Inputs above 99 give meaningless bytes.
pub const fn decimal_to_bcd(decimal: u8) -> u8 {
    ((decimal / 10) << 4).wrapping_add(decimal % 10)
}

/// Swap format from packed BCD to decimal. Nibbles above 9 are not rejected.
pub const fn bcd_to_decimal(bcd: u8) -> u8 {
    (bcd >> 4) * 10 + (bcd & 0x0F)
}

/// A clock/calendar snapshot in decimal form. `year` counts from 2000.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    /// 0-59
    pub second: u8,
    /// 0-59
    pub minute: u8,
    /// 0-23
    pub hour: u8,
    /// Day of month, 1-31
    pub day: u8,
    /// 1-12
    pub month: u8,
    /// 1-7, see [`Weekday`]
    pub day_of_week: u8,
    /// 0-79. The register keeps only seven bits, so 80-99 (2080-2099) read
    /// back as 0-19.
    pub year: u8,
}

impl DateTime {
    /// Decode the seven clock registers in burst order (seconds, minutes,
    /// hours, date, month, day of week, year).
    pub(crate) fn from_registers(raw: &[u8; 7]) -> Self {
        DateTime {
            second: bcd_to_decimal(raw[0] & SECONDS_MASK),
            minute: bcd_to_decimal(raw[1] & MINUTES_MASK),
            hour: bcd_to_decimal(raw[2] & HOURS_MASK),
            day: bcd_to_decimal(raw[3] & DATE_MASK),
            month: bcd_to_decimal(raw[4] & MONTH_MASK),
            day_of_week: bcd_to_decimal(raw[5] & DAY_MASK),
            year: bcd_to_decimal(raw[6] & YEAR_MASK),
        }
    }

    /// Encode into the seven clock registers, each field reduced modulo its
    /// period first. The seconds byte always leaves the clock-halt flag clear.
    pub(crate) fn to_registers(&self) -> [u8; 7] {
        [
            decimal_to_bcd(self.second % 60),
            decimal_to_bcd(self.minute % 60),
            decimal_to_bcd(self.hour % 24),
            decimal_to_bcd(self.day % 32),
            decimal_to_bcd(self.month % 13),
            decimal_to_bcd(self.day_of_week % 8),
            decimal_to_bcd(self.year % 100),
        ]
    }

    /// The day of week field, if it holds 1-7.
    pub fn weekday(&self) -> Option<Weekday> {
        Weekday::try_from(self.day_of_week).ok()
    }
}

/// Day-of-week numbering used by this driver. The chip only counts 1-7 and
/// leaves the meaning to the software that set it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Weekday {
    Monday = 1,
    Tuesday = 2,
    Wednesday = 3,
    Thursday = 4,
    Friday = 5,
    Saturday = 6,
    Sunday = 7,
}

impl TryFrom<u8> for Weekday {
    type Error = u8;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Weekday::Monday),
            2 => Ok(Weekday::Tuesday),
            3 => Ok(Weekday::Wednesday),
            4 => Ok(Weekday::Thursday),
            5 => Ok(Weekday::Friday),
            6 => Ok(Weekday::Saturday),
            7 => Ok(Weekday::Sunday),
            other => Err(other),
        }
    }
}

impl From<Weekday> for u8 {
    fn from(v: Weekday) -> Self {
        v as u8
    }
}

/// Errors converting between [`DateTime`] and chrono types.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DateTimeError {
    /// The fields do not name a real date and time
    InvalidDateTime,
    /// The year is outside 2000-2079
    YearOutOfRange,
}

#[cfg(feature = "chrono")]
mod chrono_interop {
    use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

    use super::{DateTime, DateTimeError};

    impl TryFrom<DateTime> for NaiveDateTime {
        type Error = DateTimeError;

        fn try_from(dt: DateTime) -> Result<Self, Self::Error> {
            NaiveDate::from_ymd_opt(
                2000 + i32::from(dt.year),
                u32::from(dt.month),
                u32::from(dt.day),
            )
            .and_then(|d| {
                d.and_hms_opt(
                    u32::from(dt.hour),
                    u32::from(dt.minute),
                    u32::from(dt.second),
                )
            })
            .ok_or(DateTimeError::InvalidDateTime)
        }
    }

    impl TryFrom<&NaiveDateTime> for DateTime {
        type Error = DateTimeError;

        fn try_from(ndt: &NaiveDateTime) -> Result<Self, Self::Error> {
            let year = u8::try_from(ndt.year() - 2000)
                .ok()
                .filter(|y| *y < 80)
                .ok_or(DateTimeError::YearOutOfRange)?;
            let narrow = |v: u32| u8::try_from(v).map_err(|_| DateTimeError::InvalidDateTime);
            Ok(DateTime {
                second: narrow(ndt.second())?,
                minute: narrow(ndt.minute())?,
                hour: narrow(ndt.hour())?,
                day: narrow(ndt.day())?,
                month: narrow(ndt.month())?,
                day_of_week: narrow(ndt.weekday().number_from_monday())?,
                year,
            })
        }
    }
}
