use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

use crate::dates::{date_status, DateStatus};
use crate::error::ParseError;
use crate::models::{Priority, Task};

/// Status filter for [`filter_and_sort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    /// Not completed.
    Active,
    Completed,
    /// Not completed, due before today.
    Overdue,
    /// Due today, completed or not.
    Today,
}

impl StatusFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Overdue => "overdue",
            Self::Today => "today",
        }
    }

    pub fn matches(self, task: &Task, today: NaiveDate) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.completed,
            Self::Completed => task.completed,
            Self::Overdue => task.is_overdue(today),
            Self::Today => task.is_due_on(today),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "overdue" => Ok(Self::Overdue),
            "today" => Ok(Self::Today),
            _ => Err(ParseError::new("status", s, "all, active, completed, overdue, today")),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filters applied to the task list. Empty sets and an empty search do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    pub status: StatusFilter,
    pub priorities: BTreeSet<Priority>,
    /// Category names; compared lower-cased.
    pub categories: BTreeSet<String>,
    pub search: String,
}

impl FilterSet {
    pub fn matches(&self, task: &Task, today: NaiveDate) -> bool {
        let query = self.search.to_lowercase();
        if !query.is_empty()
            && !task.title.to_lowercase().contains(&query)
            && !task.category.to_lowercase().contains(&query)
        {
            return false;
        }
        if !self.status.matches(task, today) {
            return false;
        }
        if !self.priorities.is_empty() && !self.priorities.contains(&task.priority) {
            return false;
        }
        if !self.categories.is_empty() {
            let category = task.category.to_lowercase();
            if !self.categories.iter().any(|c| c.to_lowercase() == category) {
                return false;
            }
        }
        true
    }
}

fn due_first(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn newest_first(a: &Task, b: &Task) -> Ordering {
    b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id))
}

/// The fixed display order: incomplete first, then higher priority, then
/// earlier due date (undated last), then newest.
pub fn display_order(a: &Task, b: &Task) -> Ordering {
    a.completed
        .cmp(&b.completed)
        .then_with(|| b.priority.weight().cmp(&a.priority.weight()))
        .then_with(|| due_first(a.due_date, b.due_date))
        .then_with(|| newest_first(a, b))
}

/// Applies `filters` and returns the visible tasks in display order.
pub fn filter_and_sort<'a>(tasks: &'a [Task], filters: &FilterSet, today: NaiveDate) -> Vec<&'a Task> {
    let mut visible: Vec<&Task> = tasks.iter().filter(|t| filters.matches(t, today)).collect();
    visible.sort_by(|a, b| display_order(a, b));
    visible
}

/// Task counts per status over the whole collection.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CountSummary {
    pub all: usize,
    pub active: usize,
    pub completed: usize,
    pub overdue: usize,
    pub today: usize,
}

pub fn compute_counts(tasks: &[Task], today: NaiveDate) -> CountSummary {
    let count = |status: StatusFilter| tasks.iter().filter(|t| status.matches(t, today)).count();
    CountSummary {
        all: tasks.len(),
        active: count(StatusFilter::Active),
        completed: count(StatusFilter::Completed),
        overdue: count(StatusFilter::Overdue),
        today: count(StatusFilter::Today),
    }
}

/// Alternative orderings offered by the list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    Priority,
    DueDate,
    Created,
    Alphabetical,
}

impl FromStr for SortBy {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "priority" => Ok(Self::Priority),
            "due" | "dueDate" => Ok(Self::DueDate),
            "created" => Ok(Self::Created),
            "alphabetical" | "title" => Ok(Self::Alphabetical),
            _ => Err(ParseError::new("sort key", s, "priority, due, created, alphabetical")),
        }
    }
}

/// Sorts incomplete tasks ahead of completed ones, then by `sort_by`,
/// falling back to newest first.
pub fn sort_tasks(tasks: &mut [&Task], sort_by: SortBy) {
    tasks.sort_by(|a, b| {
        let key = match sort_by {
            SortBy::Priority => b.priority.weight().cmp(&a.priority.weight()),
            SortBy::DueDate => due_first(a.due_date, b.due_date),
            SortBy::Created => Ordering::Equal,
            SortBy::Alphabetical => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        };
        a.completed
            .cmp(&b.completed)
            .then(key)
            .then_with(|| newest_first(a, b))
    });
}

/// Headline numbers for the whole collection.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub active: usize,
    pub overdue: usize,
    pub due_today: usize,
    /// Percentage of tasks completed, 0 when there are none.
    pub completion_rate: u8,
}

pub fn task_stats(tasks: &[Task], today: NaiveDate) -> TaskStats {
    let counts = compute_counts(tasks, today);
    let completion_rate = if counts.all == 0 {
        0
    } else {
        ((200 * counts.completed + counts.all) / (2 * counts.all)) as u8
    };
    TaskStats {
        total: counts.all,
        completed: counts.completed,
        active: counts.active,
        overdue: counts.overdue,
        due_today: counts.today,
        completion_rate,
    }
}

/// Tasks bucketed by where their due date falls relative to today.
#[derive(Debug, Default, PartialEq)]
pub struct DateGroups<'a> {
    pub overdue: Vec<&'a Task>,
    pub today: Vec<&'a Task>,
    pub upcoming: Vec<&'a Task>,
    pub no_date: Vec<&'a Task>,
}

/// Groups by due date alone; completion does not move a task between buckets.
pub fn group_by_date_status(tasks: &[Task], today: NaiveDate) -> DateGroups<'_> {
    let mut groups = DateGroups::default();
    for task in tasks {
        match date_status(task.due_date, today) {
            DateStatus::Overdue => groups.overdue.push(task),
            DateStatus::Today => groups.today.push(task),
            DateStatus::Upcoming => groups.upcoming.push(task),
            DateStatus::None => groups.no_date.push(task),
        }
    }
    groups
}
