use crate::models::{Subtask, SubtaskProgress, Task};

impl SubtaskProgress {
    /// Summarizes a subtask list; `None` when it is empty.
    pub fn of(subtasks: &[Subtask]) -> Option<Self> {
        let total = subtasks.len();
        if total == 0 {
            return None;
        }
        let completed = subtasks.iter().filter(|s| s.completed).count();
        // round(100 * completed / total), half up
        let percentage = ((200 * completed + total) / (2 * total)) as u8;
        Some(Self {
            completed,
            total,
            percentage,
        })
    }
}

/// Brings `task.progress` and `task.subtask_progress` in line with its subtasks.
///
/// Both fields are cleared when the task has no subtasks.
pub fn refresh_progress(task: &mut Task) {
    let summary = SubtaskProgress::of(&task.subtasks);
    task.progress = summary.map(|s| s.percentage);
    task.subtask_progress = summary;
}

/// Owned form of [`refresh_progress`].
pub fn update_task_progress(mut task: Task) -> Task {
    refresh_progress(&mut task);
    task
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn task_with(flags: &[bool]) -> Task {
        Task {
            id: 7,
            title: "Plan trip".into(),
            completed: false,
            priority: Default::default(),
            category: "personal".into(),
            due_date: None,
            created_at: Utc::now(),
            completed_at: None,
            subtasks: flags
                .iter()
                .enumerate()
                .map(|(i, &completed)| Subtask {
                    id: i as u64 + 1,
                    title: format!("step {}", i + 1),
                    completed,
                    completed_at: None,
                })
                .collect(),
            progress: None,
            subtask_progress: None,
            is_recurring: false,
            recurring_config: None,
            subtask_seq: flags.len() as u64,
        }
    }

    #[test]
    fn two_of_three_rounds_to_67() {
        let task = update_task_progress(task_with(&[true, false, true]));
        assert_eq!(task.progress, Some(67));
        assert_eq!(
            task.subtask_progress,
            Some(SubtaskProgress {
                completed: 2,
                total: 3,
                percentage: 67
            })
        );
    }

    #[test]
    fn half_rounds_up() {
        let task = update_task_progress(task_with(&[true, false, false, false, false, false, false, false]));
        assert_eq!(task.progress, Some(13));
    }

    #[test]
    fn bounds() {
        assert_eq!(update_task_progress(task_with(&[false, false])).progress, Some(0));
        assert_eq!(update_task_progress(task_with(&[true, true])).progress, Some(100));
    }

    #[test]
    fn no_subtasks_leaves_fields_absent() {
        let task = update_task_progress(task_with(&[]));
        assert_eq!(task.progress, None);
        assert_eq!(task.subtask_progress, None);
    }

    #[test]
    fn stale_fields_cleared_once_subtasks_are_gone() {
        let mut task = update_task_progress(task_with(&[true]));
        task.subtasks.clear();
        let task = update_task_progress(task);
        assert_eq!(task.progress, None);
    }

    #[test]
    fn idempotent() {
        let once = update_task_progress(task_with(&[true, false, true]));
        let twice = update_task_progress(once.clone());
        assert_eq!(once, twice);
    }
}
