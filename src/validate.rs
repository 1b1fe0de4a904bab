use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;

use crate::dates::parse_day;
use crate::models::{
    NewCategory, NewSubtask, NewTask, Priority, RecurrenceConfig, DEFAULT_CATEGORY, DEFAULT_CATEGORY_COLOR,
};
use crate::recurrence::RecurrenceRule;

pub const MAX_TASK_TITLE: usize = 200;
pub const MAX_SUBTASK_TITLE: usize = 150;
pub const MAX_CATEGORY_NAME: usize = 50;
pub const MIN_INTERVAL_COUNT: u32 = 1;
pub const MAX_INTERVAL_COUNT: u32 = 30;

/// Field name to message, ordered by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message for `field`, replacing any earlier one.
    pub fn insert(&mut self, field: &str, message: impl Into<String>) {
        self.0.insert(field.to_string(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.0.extend(other.0);
    }

    fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Outcome of a validation pass. Validation never fails loudly; the caller
/// decides what to do with an invalid result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub is_valid: bool,
    pub errors: ValidationErrors,
}

impl<T> From<Result<T, ValidationErrors>> for Validation {
    fn from(result: Result<T, ValidationErrors>) -> Self {
        match result {
            Ok(_) => Validation {
                is_valid: true,
                errors: ValidationErrors::new(),
            },
            Err(errors) => Validation {
                is_valid: false,
                errors,
            },
        }
    }
}

/// Task fields after they passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TaskFields {
    pub title: String,
    pub priority: Priority,
    pub category: String,
    pub due_date: Option<NaiveDate>,
}

fn check_title(errors: &mut ValidationErrors, field: &str, title: &str, label: &str, max: usize) {
    if title.trim().is_empty() {
        errors.insert(field, format!("{label} is required"));
    } else if title.chars().count() > max {
        errors.insert(field, format!("{label} must be {max} characters or fewer"));
    }
}

pub(crate) fn check_task(input: &NewTask) -> Result<TaskFields, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_title(&mut errors, "title", &input.title, "Task title", MAX_TASK_TITLE);

    let due_date = match input.due_date.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => {
            let parsed = parse_day(raw);
            if parsed.is_none() {
                errors.insert("dueDate", "Invalid due date");
            }
            parsed
        }
    };

    let priority = match input.priority.as_deref() {
        None | Some("") => Priority::default(),
        Some(raw) => raw.parse::<Priority>().unwrap_or_else(|_| {
            errors.insert("priority", "Invalid priority level");
            Priority::default()
        }),
    };

    let category = match input.category.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_CATEGORY.to_string(),
        Some(name) => name.to_string(),
    };

    errors.into_result(TaskFields {
        title: input.title.trim().to_string(),
        priority,
        category,
        due_date,
    })
}

pub(crate) fn check_subtask(input: &NewSubtask) -> Result<String, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_title(&mut errors, "title", &input.title, "Subtask title", MAX_SUBTASK_TITLE);
    errors.into_result(input.title.trim().to_string())
}

pub(crate) fn check_category(input: &NewCategory) -> Result<(String, String), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    check_title(&mut errors, "name", &input.name, "Category name", MAX_CATEGORY_NAME);
    let color = match input.color.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_CATEGORY_COLOR.to_string(),
        Some(color) => color.to_string(),
    };
    errors.into_result((input.name.trim().to_string(), color))
}

pub(crate) fn check_recurring_config(config: &RecurrenceConfig) -> Result<RecurrenceRule, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if !(MIN_INTERVAL_COUNT..=MAX_INTERVAL_COUNT).contains(&config.interval_count) {
        errors.insert(
            "intervalCount",
            format!("Repeat count must be between {MIN_INTERVAL_COUNT} and {MAX_INTERVAL_COUNT}"),
        );
    }

    let start = if config.start_date.trim().is_empty() {
        errors.insert("startDate", "Start date is required");
        None
    } else {
        let parsed = parse_day(&config.start_date);
        if parsed.is_none() {
            errors.insert("startDate", "Invalid start date");
        }
        parsed
    };

    let end = match config.end_date.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match parse_day(raw) {
            None => {
                errors.insert("endDate", "Invalid end date");
                None
            }
            Some(end) => {
                if start.is_some_and(|s| end <= s) {
                    errors.insert("endDate", "End date must be after start date");
                }
                Some(end)
            }
        },
    };

    match start {
        Some(start) if errors.is_empty() => Ok(RecurrenceRule {
            interval: config.interval,
            interval_count: config.interval_count,
            start,
            end,
        }),
        _ => Err(errors),
    }
}

/// Checks a task's title, due date and priority.
pub fn validate_task(input: &NewTask) -> Validation {
    check_task(input).into()
}

/// Checks a subtask's title.
pub fn validate_subtask(input: &NewSubtask) -> Validation {
    check_subtask(input).into()
}

pub fn validate_category(input: &NewCategory) -> Validation {
    check_category(input).into()
}

/// Checks the repeat count range, that the start date parses, and that an
/// end date, when given, parses and falls strictly after the start.
pub fn validate_recurring_task_config(config: &RecurrenceConfig) -> Validation {
    check_recurring_config(config).into()
}
