//! Task and recurrence engine behind the `taskflow` task manager.
//!
//! The [`store::TaskStore`] owns tasks and categories; [`service::TaskService`]
//! puts it behind an async boundary; [`recurrence`] expands repeat rules into
//! due dates; [`query`] filters, sorts and counts for display.

pub mod commands;
pub mod config;
pub mod dates;
pub mod error;
pub mod models;
pub mod progress;
pub mod query;
pub mod recurrence;
pub mod service;
pub mod storage;
pub mod store;
pub mod validate;

pub use error::{Missing, StorageError, StoreError};
pub use models::{Category, Interval, NewSubtask, NewTask, Priority, RecurrenceConfig, Subtask, Task, TaskPatch};
pub use service::TaskService;
pub use store::TaskStore;
