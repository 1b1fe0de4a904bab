use std::fmt;

use thiserror::Error;

use crate::validate::ValidationErrors;

/// Identifies the entity a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Task(u64),
    Subtask { task: u64, subtask: u64 },
    Category(u64),
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::Task(id) => write!(f, "task {id}"),
            Missing::Subtask { task, subtask } => write!(f, "subtask {subtask} of task {task}"),
            Missing::Category(id) => write!(f, "category {id}"),
        }
    }
}

/// Errors surfaced by store operations. None of them leave the store modified.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("{0} not found")]
    NotFound(Missing),

    #[error("recurrence rule produced no dates")]
    RecurrenceExpansion,

    #[error("no task ids left to assign")]
    IdsExhausted,
}

impl From<ValidationErrors> for StoreError {
    fn from(errors: ValidationErrors) -> Self {
        StoreError::Validation(errors)
    }
}

/// Errors reading or writing the JSON collections.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// An unrecognized keyword for one of the enumerated fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind} '{value}': must be one of {expected}")]
pub struct ParseError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl ParseError {
    pub(crate) fn new(kind: &'static str, value: &str, expected: &'static str) -> Self {
        Self {
            kind,
            value: value.to_string(),
            expected,
        }
    }
}
