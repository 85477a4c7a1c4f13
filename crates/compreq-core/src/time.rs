//! Time helpers: the current instant and calendar-aware ages.

use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Months, Utc};
use std::fmt;

/// The current time in UTC.
#[must_use]
pub fn utc_now() -> DateTime<Utc> {
    Utc::now()
}

/// An age that can be subtracted from a point in time.
///
/// Years and months are calendar units; the remaining fields are fixed
/// durations. Subtraction applies the calendar part first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Age {
    /// Calendar years.
    pub years: u32,
    /// Calendar months.
    pub months: u32,
    /// Weeks.
    pub weeks: u32,
    /// Days.
    pub days: u32,
    /// Hours.
    pub hours: u32,
    /// Minutes.
    pub minutes: u32,
    /// Seconds.
    pub seconds: u32,
}

impl Age {
    /// An age of `n` calendar years.
    #[must_use]
    pub const fn years(n: u32) -> Self {
        Self { years: n, months: 0, weeks: 0, days: 0, hours: 0, minutes: 0, seconds: 0 }
    }

    /// An age of `n` calendar months.
    #[must_use]
    pub const fn months(n: u32) -> Self {
        Self { months: n, ..Self::years(0) }
    }

    /// An age of `n` weeks.
    #[must_use]
    pub const fn weeks(n: u32) -> Self {
        Self { weeks: n, ..Self::years(0) }
    }

    /// An age of `n` days.
    #[must_use]
    pub const fn days(n: u32) -> Self {
        Self { days: n, ..Self::years(0) }
    }

    /// An age of `n` hours.
    #[must_use]
    pub const fn hours(n: u32) -> Self {
        Self { hours: n, ..Self::years(0) }
    }

    /// The instant `self` before `now`.
    ///
    /// # Errors
    ///
    /// Fails if the result is out of the representable range.
    pub fn before(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let months = self.years.checked_mul(12).and_then(|m| m.checked_add(self.months));
        let shifted = months
            .and_then(|m| now.checked_sub_months(Months::new(m)))
            .ok_or_else(|| self.out_of_range(now))?;
        let fixed = Duration::weeks(i64::from(self.weeks))
            + Duration::days(i64::from(self.days))
            + Duration::hours(i64::from(self.hours))
            + Duration::minutes(i64::from(self.minutes))
            + Duration::seconds(i64::from(self.seconds));
        shifted
            .checked_sub_signed(fixed)
            .ok_or_else(|| self.out_of_range(now))
    }

    fn out_of_range(&self, now: DateTime<Utc>) -> Error {
        Error::Config(format!("age {self} before {now} is out of range"))
    }
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = [
            (self.years, "y"),
            (self.months, "mo"),
            (self.weeks, "w"),
            (self.days, "d"),
            (self.hours, "h"),
            (self.minutes, "m"),
            (self.seconds, "s"),
        ];
        let mut wrote = false;
        for (value, unit) in parts {
            if value > 0 {
                write!(f, "{value}{unit}")?;
                wrote = true;
            }
        }
        if !wrote {
            write!(f, "0s")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn calendar_years_respect_leap_days() {
        let now = Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap();
        let then = Age::years(1).before(now).unwrap();
        assert_eq!(then, Utc.with_ymd_and_hms(2023, 2, 28, 12, 0, 0).unwrap());
    }

    #[test]
    fn fixed_parts_are_subtracted_after_months() {
        let now = Utc.with_ymd_and_hms(2023, 3, 31, 0, 0, 0).unwrap();
        let age = Age { months: 1, days: 2, hours: 3, ..Age::default() };
        let then = age.before(now).unwrap();
        assert_eq!(then, Utc.with_ymd_and_hms(2023, 2, 25, 21, 0, 0).unwrap());
    }

    #[test]
    fn display_lists_non_zero_parts() {
        assert_eq!(Age::default().to_string(), "0s");
        assert_eq!(Age { years: 1, days: 3, ..Age::default() }.to_string(), "1y3d");
    }
}
