use taskflow::recurrence::{generate_recurring_dates, MAX_OCCURRENCES};
use taskflow::validate::validate_recurring_task_config;
use taskflow::{Interval, RecurrenceConfig};

#[test]
fn open_ended_rules_are_capped() {
    for interval in [Interval::Daily, Interval::Weekly, Interval::Monthly] {
        for count in [1, 2, 7, 30] {
            let dates = generate_recurring_dates("2024-01-01", None, interval, count);
            assert_eq!(dates.len(), MAX_OCCURRENCES, "{interval} x{count}");
            assert_eq!(dates[0], "2024-01-01");
            assert!(
                dates.windows(2).all(|w| w[0] < w[1]),
                "{interval} x{count} not strictly ascending"
            );
        }
    }
}

#[test]
fn daily_cap_spans_two_years() {
    let dates = generate_recurring_dates("2024-01-01", None, Interval::Daily, 1);
    assert_eq!(dates.last().map(String::as_str), Some("2025-12-30"));
}

#[test]
fn bounded_rules_stop_at_end_date() {
    assert_eq!(
        generate_recurring_dates("2024-01-01", Some("2024-01-05"), Interval::Daily, 1),
        vec!["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04", "2024-01-05"]
    );
    assert_eq!(
        generate_recurring_dates("2024-01-01", Some("2024-01-20"), Interval::Weekly, 2),
        vec!["2024-01-01", "2024-01-15"]
    );
}

#[test]
fn far_end_date_still_capped() {
    let dates = generate_recurring_dates("2024-01-01", Some("2099-12-31"), Interval::Daily, 1);
    assert_eq!(dates.len(), MAX_OCCURRENCES);
}

#[test]
fn repeat_count_above_thirty_is_invalid() {
    let v = validate_recurring_task_config(&RecurrenceConfig::new(Interval::Daily, 31, "2024-01-01"));
    assert!(!v.is_valid);
    assert!(v.errors.contains("intervalCount"));
}
