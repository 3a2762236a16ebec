//! Wall-clock source for the `inserted` / `modified` audit stamps.

use chrono::{Local, NaiveDateTime};

/// chrono pattern for audit stamps: `DD-MM-YYYY HH:MM:SS`, 24-hour, zero-padded.
pub const TIMESTAMP_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// Format a moment the way audit fields store it.
#[must_use]
pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current local time.
    fn now(&self) -> NaiveDateTime;

    /// Current time, formatted for an audit field.
    fn timestamp(&self) -> String {
        format_timestamp(self.now())
    }
}

/// The server's local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock stuck at one moment.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_format_zero_pads_every_component() {
        assert_eq!(format_timestamp(at(2024, 3, 5, 7, 8, 9)), "05-03-2024 07:08:09");
    }

    #[test]
    fn test_format_uses_24_hour_clock() {
        assert_eq!(format_timestamp(at(1999, 12, 31, 23, 59, 58)), "31-12-1999 23:59:58");
    }

    #[test]
    fn test_fixed_clock_timestamp() {
        let clock = FixedClock(at(2021, 1, 2, 0, 0, 0));
        assert_eq!(clock.timestamp(), "02-01-2021 00:00:00");
    }

    #[test]
    fn test_system_clock_shape() {
        let stamp = SystemClock.timestamp();
        assert_eq!(stamp.len(), 19);
        assert!(NaiveDateTime::parse_from_str(&stamp, TIMESTAMP_FORMAT).is_ok());
    }
}
