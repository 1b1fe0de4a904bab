use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Category assigned to tasks created without one.
pub const DEFAULT_CATEGORY: &str = "general";
/// Color given to categories created without one.
pub const DEFAULT_CATEGORY_COLOR: &str = "#6B7280";

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

/// Task priority. Higher weight sorts first in the display order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn weight(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }
}

impl FromStr for Priority {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParseError::new("priority", s, "low, medium, high")),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Step unit of a recurrence rule.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Daily,
    Weekly,
    Monthly,
}

impl Interval {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    /// Singular and plural unit nouns, e.g. ("week", "weeks").
    pub fn unit(self) -> (&'static str, &'static str) {
        match self {
            Self::Daily => ("day", "days"),
            Self::Weekly => ("week", "weeks"),
            Self::Monthly => ("month", "months"),
        }
    }
}

impl FromStr for Interval {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            _ => Err(ParseError::new("interval", s, "daily, weekly, monthly")),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recurrence rule as submitted by the caller.
///
/// Dates stay in their calendar-day string form until validation parses them,
/// and a copy is attached to every task the rule generates.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceConfig {
    pub interval: Interval,
    pub interval_count: u32,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl RecurrenceConfig {
    pub fn new(interval: Interval, interval_count: u32, start_date: impl Into<String>) -> Self {
        Self {
            interval,
            interval_count,
            start_date: start_date.into(),
            end_date: None,
        }
    }

    pub fn until(mut self, end_date: impl Into<String>) -> Self {
        self.end_date = Some(end_date.into());
        self
    }
}

/// Completion summary over a task's subtasks.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubtaskProgress {
    pub completed: usize,
    pub total: usize,
    pub percentage: u8,
}

/// A checklist item inside a task.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    /// Unique within the parent task only.
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Subtask {
    /// Sets the completion flag, stamping or clearing `completed_at` on a transition.
    pub fn set_completed(&mut self, completed: bool, now: DateTime<Utc>) {
        if completed && !self.completed {
            self.completed_at = Some(now);
        } else if !completed {
            self.completed_at = None;
        }
        self.completed = completed;
    }
}

/// Represents a single task in the task manager.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Assigned by the store, never reused.
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    /// Free-form, matched case-insensitively against category names.
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<Subtask>,
    /// Derived from `subtasks`; absent when there are none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    /// Derived from `subtasks`; absent when there are none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtask_progress: Option<SubtaskProgress>,
    #[serde(default)]
    pub is_recurring: bool,
    /// The rule that generated this task, kept for provenance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_config: Option<RecurrenceConfig>,
    /// Highest subtask id ever issued for this task.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub subtask_seq: u64,
}

impl Task {
    /// Sets the completion flag, stamping or clearing `completed_at` on a transition.
    pub fn set_completed(&mut self, completed: bool, now: DateTime<Utc>) {
        if completed && !self.completed {
            self.completed_at = Some(now);
        } else if !completed {
            self.completed_at = None;
        }
        self.completed = completed;
    }

    pub fn subtask(&self, id: u64) -> Option<&Subtask> {
        self.subtasks.iter().find(|s| s.id == id)
    }

    /// Incomplete and due strictly before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.completed && self.due_date.is_some_and(|d| d < today)
    }

    pub fn is_due_on(&self, day: NaiveDate) -> bool {
        self.due_date == Some(day)
    }

    pub fn in_category(&self, name: &str) -> bool {
        self.category.to_lowercase() == name.to_lowercase()
    }
}

/// A named, colored task grouping.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: u64,
    pub name: String,
    pub color: String,
}

impl Category {
    pub fn new(id: u64, name: &str, color: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            color: color.to_string(),
        }
    }

    /// The categories a fresh store starts with.
    pub fn defaults() -> Vec<Category> {
        vec![
            Category::new(1, "Work", "#2563EB"),
            Category::new(2, "Personal", "#9333EA"),
            Category::new(3, "Shopping", "#DB2777"),
            Category::new(4, "Health", "#16A34A"),
            Category::new(5, "Finance", "#4F46E5"),
        ]
    }
}

/// A category as listed, with its live task count.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithCount {
    #[serde(flatten)]
    pub category: Category,
    pub task_count: usize,
}

/// Fields submitted to create a task. Enumerated fields arrive as text and
/// are checked by validation before the store parses them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub due_date: Option<String>,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn due(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }
}

/// Partial update of a task. `None` leaves a field untouched; the id is not patchable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    /// `Some(None)` clears the due date.
    pub due_date: Option<Option<String>>,
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewSubtask {
    pub title: String,
}

impl NewSubtask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtaskPatch {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub color: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_task() -> Task {
        Task {
            id: 1,
            title: "Write report".into(),
            completed: false,
            priority: Priority::High,
            category: "Work".into(),
            due_date: NaiveDate::from_ymd_opt(2024, 1, 10),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
            completed_at: None,
            subtasks: Vec::new(),
            progress: None,
            subtask_progress: None,
            is_recurring: false,
            recurring_config: None,
            subtask_seq: 0,
        }
    }

    #[test]
    fn priority_parse_and_weight() {
        assert_eq!("high".parse::<Priority>(), Ok(Priority::High));
        assert!("urgent".parse::<Priority>().is_err());
        assert!(Priority::High.weight() > Priority::Medium.weight());
        assert!(Priority::Medium.weight() > Priority::Low.weight());
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn interval_rejects_unknown_keyword() {
        let err = "yearly".parse::<Interval>().unwrap_err();
        assert_eq!(err.kind, "interval");
        assert_eq!(err.value, "yearly");
    }

    #[test]
    fn completion_timestamp_follows_flag() {
        let mut task = sample_task();
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap();
        task.set_completed(true, now);
        assert!(task.completed);
        assert_eq!(task.completed_at, Some(now));

        // Re-completing keeps the original stamp.
        let later = Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap();
        task.set_completed(true, later);
        assert_eq!(task.completed_at, Some(now));

        task.set_completed(false, later);
        assert!(!task.completed);
        assert_eq!(task.completed_at, None);
    }

    #[test]
    fn overdue_requires_incomplete_and_past_due() {
        let mut task = sample_task();
        let today = NaiveDate::from_ymd_opt(2024, 1, 11).unwrap();
        assert!(task.is_overdue(today));
        assert!(!task.is_overdue(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()));
        task.completed = true;
        assert!(!task.is_overdue(today));
    }

    #[test]
    fn task_json_uses_camel_case_and_omits_derived_fields() {
        let task = sample_task();
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["dueDate"], "2024-01-10");
        assert_eq!(json["priority"], "high");
        assert_eq!(json["isRecurring"], false);
        assert!(json.get("progress").is_none());
        assert!(json.get("subtaskProgress").is_none());
        assert!(json.get("subtaskSeq").is_none());
    }

    #[test]
    fn task_json_defaults_missing_fields() {
        let json = r#"{"id": 3, "title": "Buy milk", "createdAt": "2024-01-01T00:00:00Z"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.category, DEFAULT_CATEGORY);
        assert!(!task.completed);
        assert!(task.subtasks.is_empty());
    }

    #[test]
    fn category_count_is_flattened() {
        let listed = CategoryWithCount {
            category: Category::new(1, "Work", "#2563EB"),
            task_count: 4,
        };
        let json = serde_json::to_value(&listed).unwrap();
        assert_eq!(json["name"], "Work");
        assert_eq!(json["taskCount"], 4);
    }
}
