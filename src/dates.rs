use chrono::{DateTime, Days, Local, Months, NaiveDate};

/// Calendar-day format used for due dates and recurrence rules.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Returns the current local calendar day.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parses a calendar-day string.
///
/// Accepts `YYYY-MM-DD`, or a full RFC 3339 timestamp whose calendar day is
/// taken as written. Returns `None` for anything else.
pub fn parse_day(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, DAY_FORMAT)
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

pub fn format_day(date: NaiveDate) -> String {
    date.format(DAY_FORMAT).to_string()
}

/// Formats a day for display, e.g. "Jan 5, 2024".
pub fn format_long(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Formats a day for compact display, e.g. "Jan 5".
pub fn format_short(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}

/// Returns `None` when the result would leave chrono's representable range.
pub fn add_days(date: NaiveDate, n: u32) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(u64::from(n)))
}

pub fn add_weeks(date: NaiveDate, n: u32) -> Option<NaiveDate> {
    add_days(date, n.checked_mul(7)?)
}

/// Adds calendar months. A day-of-month past the end of the target month is
/// clamped to its last day: Jan 31 + 1 month is Feb 29 in a leap year.
pub fn add_months(date: NaiveDate, n: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(n))
}

/// Where a due date falls relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateStatus {
    Overdue,
    Today,
    Upcoming,
    None,
}

impl DateStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Overdue => "overdue",
            Self::Today => "today",
            Self::Upcoming => "upcoming",
            Self::None => "none",
        }
    }
}

pub fn date_status(due: Option<NaiveDate>, today: NaiveDate) -> DateStatus {
    match due {
        None => DateStatus::None,
        Some(d) if d < today => DateStatus::Overdue,
        Some(d) if d == today => DateStatus::Today,
        Some(_) => DateStatus::Upcoming,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parse_accepts_day_and_timestamp() {
        assert_eq!(parse_day("2024-03-09"), Some(day(2024, 3, 9)));
        assert_eq!(parse_day(" 2024-03-09 "), Some(day(2024, 3, 9)));
        assert_eq!(parse_day("2024-03-09T23:30:00+02:00"), Some(day(2024, 3, 9)));
        assert_eq!(parse_day("2024-02-30"), None);
        assert_eq!(parse_day("tomorrow"), None);
        assert_eq!(parse_day(""), None);
    }

    #[test]
    fn day_and_week_steps() {
        assert_eq!(add_days(day(2024, 2, 28), 1), Some(day(2024, 2, 29)));
        assert_eq!(add_days(day(2024, 12, 31), 1), Some(day(2025, 1, 1)));
        assert_eq!(add_weeks(day(2024, 1, 1), 2), Some(day(2024, 1, 15)));
    }

    #[test]
    fn month_step_clamps_to_month_end() {
        assert_eq!(add_months(day(2024, 1, 15), 1), Some(day(2024, 2, 15)));
        assert_eq!(add_months(day(2024, 1, 31), 1), Some(day(2024, 2, 29)));
        assert_eq!(add_months(day(2023, 1, 31), 1), Some(day(2023, 2, 28)));
        assert_eq!(add_months(day(2024, 11, 30), 3), Some(day(2025, 2, 28)));
    }

    #[test]
    fn steps_do_not_mutate_input() {
        let start = day(2024, 1, 1);
        let _ = add_days(start, 10);
        assert_eq!(start, day(2024, 1, 1));
    }

    #[test]
    fn status_relative_to_today() {
        let today = day(2024, 5, 10);
        assert_eq!(date_status(Some(day(2024, 5, 9)), today), DateStatus::Overdue);
        assert_eq!(date_status(Some(today), today), DateStatus::Today);
        assert_eq!(date_status(Some(day(2024, 5, 11)), today), DateStatus::Upcoming);
        assert_eq!(date_status(None, today), DateStatus::None);
    }

    #[test]
    fn display_formats() {
        assert_eq!(format_day(day(2024, 1, 5)), "2024-01-05");
        assert_eq!(format_long(day(2024, 1, 5)), "Jan 5, 2024");
        assert_eq!(format_short(day(2024, 12, 25)), "Dec 25");
    }
}
