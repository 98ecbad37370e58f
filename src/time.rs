//! Wall-clock timestamps and the console date format.
//!
//! A [`Timestamp`] counts seconds since 1970-01-01 00:00:00. There is no time
//! zone and no daylight saving: the clock shows whatever the operator set.
//! Calendar conversion uses the proleptic Gregorian calendar.

use core::fmt;
use core::ops::Add;

use crate::error::InputError;

const SECS_PER_DAY: i64 = 86_400;

/// Seconds since the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub const EPOCH: Timestamp = Timestamp(0);

    pub const fn as_secs(self) -> i64 {
        self.0
    }

    /// Splits the timestamp into calendar fields.
    pub fn to_datetime(self) -> DateTime {
        let days = self.0.div_euclid(SECS_PER_DAY);
        let secs_of_day = self.0.rem_euclid(SECS_PER_DAY);
        let (year, month, day) = civil_from_days(days);

        DateTime {
            year,
            month,
            day,
            hour: (secs_of_day / 3600) as u8,
            minute: (secs_of_day / 60 % 60) as u8,
            second: (secs_of_day % 60) as u8,
        }
    }
}

impl Add<u32> for Timestamp {
    type Output = Timestamp;

    fn add(self, secs: u32) -> Timestamp {
        Timestamp(self.0.saturating_add(i64::from(secs)))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_datetime().fmt(f)
    }
}

/// Calendar fields as typed by the operator.
///
/// `day` is only checked against `1..=31`; a day past the end of its month
/// rolls over into the next one when converted to a [`Timestamp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    pub year: i64,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DateTime {
    /// Parses `YYYY-MM-DD HH:MM:SS`.
    ///
    /// # Errors
    ///
    /// * [`InputError::Parse`] - the line does not have the six numeric fields
    /// * [`InputError::Range`] - a field is outside its calendar range
    ///   (year must be after 1900)
    pub fn parse(input: &str) -> Result<Self, InputError> {
        let (date, time) = input.trim().split_once(' ').ok_or(InputError::Parse)?;
        let [year, month, day] = split_fields(date, '-')?;
        let [hour, minute, second] = split_fields(time.trim_start(), ':')?;

        let valid = year > 1900
            && (1..=12).contains(&month)
            && (1..=31).contains(&day)
            && hour < 24
            && minute < 60
            && second < 60;
        if !valid {
            return Err(InputError::Range);
        }

        Ok(DateTime {
            year: i64::from(year),
            month: month as u8,
            day: day as u8,
            hour: hour as u8,
            minute: minute as u8,
            second: second as u8,
        })
    }

    pub fn to_timestamp(&self) -> Timestamp {
        let days = days_from_civil(self.year, u32::from(self.month), u32::from(self.day));
        let secs_of_day =
            i64::from(self.hour) * 3600 + i64::from(self.minute) * 60 + i64::from(self.second);

        Timestamp(days * SECS_PER_DAY + secs_of_day)
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

fn split_fields(input: &str, separator: char) -> Result<[u32; 3], InputError> {
    let mut parts = input.split(separator);
    let mut fields = [0; 3];

    for field in fields.iter_mut() {
        *field = parse_digits(parts.next().ok_or(InputError::Parse)?)?;
    }

    match parts.next() {
        Some(_) => Err(InputError::Parse),
        None => Ok(fields),
    }
}

fn parse_digits(field: &str) -> Result<u32, InputError> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InputError::Parse);
    }
    field.parse().map_err(|_| InputError::Parse)
}

// Howard Hinnant's civil calendar algorithms, eras of 400 years starting in March.
fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let year = if month <= 2 { year - 1 } else { year };
    let era = year.div_euclid(400);
    let yoe = year - era * 400;
    let mp = i64::from((month + 9) % 12);
    let doy = (153 * mp + 2) / 5 + i64::from(day) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;

    era * 146_097 + doe - 719_468
}

fn civil_from_days(days: i64) -> (i64, u8, u8) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u8;
    let year = yoe + era * 400 + i64::from(month <= 2);

    (year, month, day)
}
