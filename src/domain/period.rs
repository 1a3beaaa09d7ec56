use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Storage format for timestamps. Zero-padded and most-significant-first, so
/// comparing two stored strings compares the instants they name.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a user- or database-supplied timestamp.
/// Accepts "YYYY-MM-DD HH:MM:SS", "YYYY-MM-DD HH:MM" and "YYYY-MM-DD" (midnight).
pub fn parse_timestamp(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    NaiveDateTime::parse_from_str(input, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

/// Current local wall-clock time truncated to whole seconds.
pub fn now_local() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// A calendar month. Only year and month are tracked, so navigation is plain
/// modular arithmetic over `year * 12 + (month - 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Returns `None` unless `month` is in `1..=12`.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn current() -> Self {
        Self::of(Local::now().date_naive())
    }

    /// Parse "YYYY-MM".
    pub fn parse(input: &str) -> Option<Self> {
        let (year, month) = input.trim().split_once('-')?;
        Self::new(year.parse().ok()?, month.parse().ok()?)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Move by `delta` months. December + 1 is January of the next year,
    /// January - 1 is December of the previous one.
    pub fn shift(&self, delta: i32) -> Self {
        let index = self.year as i64 * 12 + (self.month as i64 - 1) + delta as i64;
        Self {
            year: index.div_euclid(12) as i32,
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    pub fn next(&self) -> Self {
        self.shift(1)
    }

    pub fn prev(&self) -> Self {
        self.shift(-1)
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Half-open range `[first of this month, first of next month)`.
    pub fn bounds(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let start = self.first_day()?.and_time(NaiveTime::MIN);
        let end = self.next().first_day()?.and_time(NaiveTime::MIN);
        Some((start, end))
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    #[test]
    fn test_new_validates_month() {
        assert!(YearMonth::new(2024, 0).is_none());
        assert!(YearMonth::new(2024, 13).is_none());
        assert!(YearMonth::new(2024, 12).is_some());
    }

    #[test]
    fn test_december_rolls_forward() {
        assert_eq!(ym(2024, 12).next(), ym(2025, 1));
        assert_eq!(ym(2024, 11).next(), ym(2024, 12));
    }

    #[test]
    fn test_january_rolls_back() {
        assert_eq!(ym(2024, 1).prev(), ym(2023, 12));
        assert_eq!(ym(2024, 2).prev(), ym(2024, 1));
    }

    #[test]
    fn test_shift_by_many_months() {
        assert_eq!(ym(2024, 3).shift(12), ym(2025, 3));
        assert_eq!(ym(2024, 3).shift(-15), ym(2022, 12));
        assert_eq!(ym(2024, 3).shift(0), ym(2024, 3));
        assert_eq!(ym(0, 1).prev(), ym(-1, 12));
    }

    #[test]
    fn test_bounds_are_half_open() {
        let (start, end) = ym(2024, 12).bounds().unwrap();
        assert_eq!(format_timestamp(start), "2024-12-01 00:00:00");
        assert_eq!(format_timestamp(end), "2025-01-01 00:00:00");
    }

    #[test]
    fn test_parse_year_month() {
        assert_eq!(YearMonth::parse("2024-07"), Some(ym(2024, 7)));
        assert_eq!(YearMonth::parse("2024-7"), Some(ym(2024, 7)));
        assert_eq!(YearMonth::parse("2024-13"), None);
        assert_eq!(YearMonth::parse("July"), None);
        assert_eq!(ym(2024, 7).to_string(), "2024-07");
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(
            parse_timestamp("2024-02-29 08:15:30").map(format_timestamp),
            Some("2024-02-29 08:15:30".to_string())
        );
        assert_eq!(
            parse_timestamp("2024-02-29 08:15").map(format_timestamp),
            Some("2024-02-29 08:15:00".to_string())
        );
        assert_eq!(
            parse_timestamp("2024-02-29").map(format_timestamp),
            Some("2024-02-29 00:00:00".to_string())
        );
        assert_eq!(parse_timestamp("2023-02-29"), None);
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_storage_strings_sort_chronologically() {
        let earlier = format_timestamp(parse_timestamp("2024-09-30 23:59:59").unwrap());
        let later = format_timestamp(parse_timestamp("2024-10-01 00:00:00").unwrap());
        assert!(earlier < later);
    }
}
