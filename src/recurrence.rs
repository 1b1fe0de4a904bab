use chrono::NaiveDate;
use log::debug;

use crate::dates::{add_days, add_months, add_weeks, format_day, format_long, parse_day};
use crate::models::{Interval, RecurrenceConfig};
use crate::validate::check_recurring_config;

/// Upper bound on dates produced from one rule: two years of daily cadence.
pub const MAX_OCCURRENCES: usize = 730;

/// A recurrence rule whose dates have been parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub interval: Interval,
    pub interval_count: u32,
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

impl RecurrenceRule {
    /// Expands the rule into ascending dates, starting at `start`.
    pub fn dates(&self) -> Vec<NaiveDate> {
        expand(self.start, self.end.map(Some), self.interval, self.interval_count)
    }
}

/// Advances `date` by `count` units of `interval`.
pub fn step(date: NaiveDate, interval: Interval, count: u32) -> Option<NaiveDate> {
    match interval {
        Interval::Daily => add_days(date, count),
        Interval::Weekly => add_weeks(date, count),
        Interval::Monthly => add_months(date, count),
    }
}

// `end` is `Some(None)` when an end date was given but could not be parsed:
// no date compares at or before it, so only the start is produced.
fn expand(start: NaiveDate, end: Option<Option<NaiveDate>>, interval: Interval, count: u32) -> Vec<NaiveDate> {
    let count = count.max(1);
    let mut dates = Vec::new();
    let mut cursor = start;
    loop {
        dates.push(cursor);
        if dates.len() >= MAX_OCCURRENCES {
            break;
        }
        let Some(next) = step(cursor, interval, count) else {
            break;
        };
        match end {
            Some(Some(end)) if next > end => break,
            Some(None) => break,
            _ => cursor = next,
        }
    }
    debug!(
        "expanded {} x{} from {} into {} dates",
        interval,
        count,
        start,
        dates.len()
    );
    dates
}

/// Expands a recurrence rule into calendar-day strings.
///
/// The first date is `start_date`; each following date is one step of
/// `interval` scaled by `interval_count` after the previous one, up to and
/// including `end_date`, and never more than [`MAX_OCCURRENCES`] in total.
/// Returns an empty list when `start_date` does not parse. An
/// `interval_count` of zero is treated as one.
pub fn generate_recurring_dates(
    start_date: &str,
    end_date: Option<&str>,
    interval: Interval,
    interval_count: u32,
) -> Vec<String> {
    let Some(start) = parse_day(start_date) else {
        return Vec::new();
    };
    let end = end_date.map(parse_day);
    expand(start, end, interval, interval_count)
        .into_iter()
        .map(format_day)
        .collect()
}

/// Human-readable cadence, e.g. "Every day" or "Every 2 weeks".
pub fn describe_pattern(config: &RecurrenceConfig) -> String {
    let (one, many) = config.interval.unit();
    match config.interval_count {
        0 | 1 => format!("Every {one}"),
        n => format!("Every {n} {many}"),
    }
}

/// One-line summary of what a rule would create, shown before committing it.
pub fn recurrence_preview(config: &RecurrenceConfig) -> String {
    let rule = match check_recurring_config(config) {
        Ok(rule) => rule,
        Err(errors) => return format!("Invalid recurrence: {errors}"),
    };
    let pattern = describe_pattern(config);
    let start = format_long(rule.start);
    match rule.end {
        Some(end) => {
            let n = rule.dates().len();
            let noun = if n == 1 { "task" } else { "tasks" };
            format!("{pattern} from {start} until {} ({n} {noun})", format_long(end))
        }
        None => format!("{pattern} from {start} with no end date (up to {MAX_OCCURRENCES} tasks)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn daily_until_end_inclusive() {
        let dates = generate_recurring_dates("2024-01-01", Some("2024-01-05"), Interval::Daily, 1);
        assert_eq!(
            dates,
            vec!["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04", "2024-01-05"]
        );
    }

    #[test]
    fn biweekly_stops_before_end() {
        let dates = generate_recurring_dates("2024-01-01", Some("2024-01-20"), Interval::Weekly, 2);
        assert_eq!(dates, vec!["2024-01-01", "2024-01-15"]);
    }

    #[test]
    fn monthly_cursor_carries_clamped_day() {
        let dates = generate_recurring_dates("2024-01-31", Some("2024-04-30"), Interval::Monthly, 1);
        assert_eq!(dates, vec!["2024-01-31", "2024-02-29", "2024-03-29", "2024-04-29"]);
    }

    #[test]
    fn unparseable_start_yields_nothing() {
        assert!(generate_recurring_dates("not-a-date", None, Interval::Daily, 1).is_empty());
    }

    #[test]
    fn unparseable_end_yields_only_start() {
        let dates = generate_recurring_dates("2024-01-01", Some("garbage"), Interval::Daily, 1);
        assert_eq!(dates, vec!["2024-01-01"]);
    }

    #[test]
    fn end_before_start_yields_only_start() {
        let dates = generate_recurring_dates("2024-01-10", Some("2024-01-01"), Interval::Daily, 1);
        assert_eq!(dates, vec!["2024-01-10"]);
    }

    #[test]
    fn zero_count_is_treated_as_one() {
        let dates = generate_recurring_dates("2024-01-01", Some("2024-01-03"), Interval::Daily, 0);
        assert_eq!(dates, vec!["2024-01-01", "2024-01-02", "2024-01-03"]);
    }

    #[test]
    fn pattern_descriptions() {
        assert_eq!(describe_pattern(&RecurrenceConfig::new(Interval::Daily, 1, "2024-01-01")), "Every day");
        assert_eq!(describe_pattern(&RecurrenceConfig::new(Interval::Weekly, 2, "2024-01-01")), "Every 2 weeks");
        assert_eq!(describe_pattern(&RecurrenceConfig::new(Interval::Monthly, 1, "2024-01-01")), "Every month");
    }

    #[test]
    fn preview_with_and_without_end() {
        let bounded = RecurrenceConfig::new(Interval::Weekly, 2, "2024-01-01").until("2024-01-20");
        assert_eq!(
            recurrence_preview(&bounded),
            "Every 2 weeks from Jan 1, 2024 until Jan 20, 2024 (2 tasks)"
        );
        let open = RecurrenceConfig::new(Interval::Daily, 1, "2024-01-01");
        assert_eq!(
            recurrence_preview(&open),
            "Every day from Jan 1, 2024 with no end date (up to 730 tasks)"
        );
    }

    #[test]
    fn preview_reports_invalid_rule() {
        let bad = RecurrenceConfig::new(Interval::Daily, 40, "2024-01-01");
        assert!(recurrence_preview(&bad).starts_with("Invalid recurrence: intervalCount"));
    }
}
