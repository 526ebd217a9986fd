//! Entry timestamps
//!
//! A timestamp token such as `2026-01-05T18:00Z` is decomposed into its
//! date, time and timezone sub-parts. The timezone is a [`Parsed`] sub-field:
//! when it is missing the builder stores a `missing-timezone` error node in
//! its place and the rest of the timestamp stays usable.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::Parsed;
use crate::span::{Relocate, Shift, Span};

/// Calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Date {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl Date {
    /// Days since 1970-01-01 (proleptic Gregorian)
    pub fn days_from_epoch(&self) -> i64 {
        // Howard Hinnant's days_from_civil
        let y = i64::from(self.year) - i64::from(self.month <= 2);
        let era = (if y >= 0 { y } else { y - 399 }) / 400;
        let yoe = y - era * 400;
        let m = i64::from(self.month);
        let mp = if m > 2 { m - 3 } else { m + 9 };
        let doy = (153 * mp + 2) / 5 + i64::from(self.day) - 1;
        let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
        era * 146_097 + doe - 719_468
    }

    /// Check the month/day ranges
    pub fn is_valid(&self) -> bool {
        if !(1..=12).contains(&self.month) || self.day == 0 {
            return false;
        }
        let leap = (self.year % 4 == 0 && self.year % 100 != 0) || self.year % 400 == 0;
        let max_day = match self.month {
            2 if leap => 29,
            2 => 28,
            4 | 6 | 9 | 11 => 30,
            _ => 31,
        };
        self.day <= max_day
    }
}

impl std::fmt::Display for Date {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Time of day (minute precision)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Time {
    pub hour: u8,
    pub minute: u8,
}

impl std::fmt::Display for Time {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Timezone designator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timezone {
    /// `Z`
    Utc,
    /// `+HH:MM` / `-HH:MM`, in minutes east of UTC
    Offset(i16),
}

impl Timezone {
    /// Offset from UTC in minutes
    pub fn offset_minutes(&self) -> i64 {
        match self {
            Timezone::Utc => 0,
            Timezone::Offset(minutes) => i64::from(*minutes),
        }
    }
}

impl std::fmt::Display for Timezone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Timezone::Utc => f.write_str("Z"),
            Timezone::Offset(minutes) => {
                let sign = if *minutes < 0 { '-' } else { '+' };
                let abs = minutes.unsigned_abs();
                write!(f, "{}{:02}:{:02}", sign, abs / 60, abs % 60)
            }
        }
    }
}

/// A decomposed entry timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timestamp {
    pub date: Date,
    pub time: Time,
    pub timezone: Parsed<Timezone>,
    pub span: Span,
}

impl Timestamp {
    /// Minutes since the Unix epoch, in UTC
    ///
    /// A missing timezone is read as UTC.
    pub fn instant(&self) -> i64 {
        let offset = self
            .timezone
            .as_ref()
            .map(Timezone::offset_minutes)
            .unwrap_or(0);
        self.date.days_from_epoch() * 1440
            + i64::from(self.time.hour) * 60
            + i64::from(self.time.minute)
            - offset
    }

    /// The canonical text, used as the implicit link id
    pub fn canonical(&self) -> String {
        match &self.timezone {
            Ok(tz) => format!("{}T{}{}", self.date, self.time, tz),
            Err(_) => format!("{}T{}", self.date, self.time),
        }
    }

    /// Compare by UTC instant
    pub fn cmp_instant(&self, other: &Timestamp) -> Ordering {
        self.instant().cmp(&other.instant())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl Relocate for Timestamp {
    fn relocate(&mut self, shift: &Shift) {
        self.span.relocate(shift);
        if let Err(err) = &mut self.timezone {
            err.relocate(shift);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SyntaxError, SyntaxErrorCode};

    fn ts(date: (u16, u8, u8), time: (u8, u8), tz: Option<Timezone>) -> Timestamp {
        Timestamp {
            date: Date {
                year: date.0,
                month: date.1,
                day: date.2,
            },
            time: Time {
                hour: time.0,
                minute: time.1,
            },
            timezone: tz.ok_or_else(|| {
                SyntaxError::new(SyntaxErrorCode::MissingTimezone, "missing", Span::default())
            }),
            span: Span::default(),
        }
    }

    #[test]
    fn test_canonical_text() {
        let t = ts((2026, 1, 7), (10, 0), Some(Timezone::Utc));
        assert_eq!(t.canonical(), "2026-01-07T10:00Z");

        let t = ts((2026, 1, 7), (10, 0), Some(Timezone::Offset(-330)));
        assert_eq!(t.canonical(), "2026-01-07T10:00-05:30");

        let t = ts((2026, 1, 7), (10, 0), None);
        assert_eq!(t.canonical(), "2026-01-07T10:00");
    }

    #[test]
    fn test_instant_respects_offset() {
        let utc = ts((2026, 1, 7), (10, 0), Some(Timezone::Utc));
        let plus_two = ts((2026, 1, 7), (12, 0), Some(Timezone::Offset(120)));
        assert_eq!(utc.instant(), plus_two.instant());
        assert_eq!(utc.cmp_instant(&plus_two), Ordering::Equal);
    }

    #[test]
    fn test_epoch_days() {
        let epoch = Date {
            year: 1970,
            month: 1,
            day: 1,
        };
        assert_eq!(epoch.days_from_epoch(), 0);
        let next_year = Date {
            year: 1971,
            month: 1,
            day: 1,
        };
        assert_eq!(next_year.days_from_epoch(), 365);
    }

    #[test]
    fn test_date_validity() {
        assert!(Date { year: 2024, month: 2, day: 29 }.is_valid());
        assert!(!Date { year: 2025, month: 2, day: 29 }.is_valid());
        assert!(!Date { year: 2025, month: 13, day: 1 }.is_valid());
    }
}
