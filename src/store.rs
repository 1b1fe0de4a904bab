use chrono::Utc;
use log::{debug, info};

use crate::error::{Missing, StoreError};
use crate::models::{
    Category, CategoryPatch, CategoryWithCount, NewCategory, NewSubtask, NewTask, RecurrenceConfig, Subtask,
    SubtaskPatch, Task, TaskPatch,
};
use crate::progress::refresh_progress;
use crate::validate::{check_category, check_recurring_config, check_subtask, check_task, TaskFields, ValidationErrors};

/// Owns the task and category collections.
///
/// Tasks are kept most-recent-first. Every read hands out a copy, so the only
/// way to change a task is through the methods below.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskStore {
    tasks: Vec<Task>,
    categories: Vec<Category>,
    /// Highest task id ever issued by this store.
    last_task_id: u64,
}

impl TaskStore {
    /// An empty store with no tasks and no categories.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty task list with the default categories.
    pub fn with_default_categories() -> Self {
        Self::from_parts(Vec::new(), Category::defaults())
    }

    /// Rebuilds a store from loaded collections, recomputing derived fields
    /// and repairing subtask sequences that lag behind the ids in use.
    ///
    /// Completion timestamps are made to agree with the completion flags: a
    /// completed task missing one gets its creation time, a completed subtask
    /// gets the load time, and anything pending loses its stamp.
    pub fn from_parts(mut tasks: Vec<Task>, categories: Vec<Category>) -> Self {
        let now = Utc::now();
        for task in &mut tasks {
            let max_sub = task.subtasks.iter().map(|s| s.id).max().unwrap_or(0);
            task.subtask_seq = task.subtask_seq.max(max_sub);
            task.completed_at = match (task.completed, task.completed_at) {
                (true, None) => Some(task.created_at),
                (true, stamp) => stamp,
                (false, _) => None,
            };
            for subtask in &mut task.subtasks {
                subtask.completed_at = match (subtask.completed, subtask.completed_at) {
                    (true, None) => Some(now),
                    (true, stamp) => stamp,
                    (false, _) => None,
                };
            }
            refresh_progress(task);
        }
        let last_task_id = tasks.iter().map(|t| t.id).max().unwrap_or(0);
        Self {
            tasks,
            categories,
            last_task_id,
        }
    }

    /// Borrowed views of the collections, in storage order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// One past the highest id in use or ever issued, so deleting the newest
    /// task does not free its id.
    fn next_task_id(&self) -> Result<u64, StoreError> {
        let max = self.tasks.iter().map(|t| t.id).max().unwrap_or(0);
        self.last_task_id
            .max(max)
            .checked_add(1)
            .ok_or(StoreError::IdsExhausted)
    }

    fn position(&self, id: u64) -> Result<usize, StoreError> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(StoreError::NotFound(Missing::Task(id)))
    }

    fn task_mut(&mut self, id: u64) -> Result<&mut Task, StoreError> {
        let idx = self.position(id)?;
        Ok(&mut self.tasks[idx])
    }

    pub fn list_tasks(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    pub fn get_task(&self, id: u64) -> Result<Task, StoreError> {
        self.position(id).map(|idx| self.tasks[idx].clone())
    }

    fn build_task(id: u64, fields: TaskFields) -> Task {
        Task {
            id,
            title: fields.title,
            completed: false,
            priority: fields.priority,
            category: fields.category,
            due_date: fields.due_date,
            created_at: Utc::now(),
            completed_at: None,
            subtasks: Vec::new(),
            progress: None,
            subtask_progress: None,
            is_recurring: false,
            recurring_config: None,
            subtask_seq: 0,
        }
    }

    /// Validates `data`, assigns the next id and prepends the new task.
    pub fn create_task(&mut self, data: NewTask) -> Result<Task, StoreError> {
        let fields = check_task(&data)?;
        let task = Self::build_task(self.next_task_id()?, fields);
        info!("created task {} '{}'", task.id, task.title);
        self.last_task_id = task.id;
        self.tasks.insert(0, task.clone());
        Ok(task)
    }

    /// Merges `patch` onto the task with `id`. The merged task is validated
    /// as a whole before anything is written.
    pub fn update_task(&mut self, id: u64, patch: TaskPatch) -> Result<Task, StoreError> {
        let idx = self.position(id)?;
        let current = &self.tasks[idx];
        let draft = NewTask {
            title: patch.title.clone().unwrap_or_else(|| current.title.clone()),
            priority: patch.priority.clone(),
            category: patch.category.clone(),
            due_date: patch.due_date.clone().flatten(),
        };
        let fields = check_task(&draft)?;

        let task = &mut self.tasks[idx];
        task.title = fields.title;
        if patch.priority.is_some() {
            task.priority = fields.priority;
        }
        if patch.category.is_some() {
            task.category = fields.category;
        }
        if patch.due_date.is_some() {
            task.due_date = fields.due_date;
        }
        if let Some(completed) = patch.completed {
            task.set_completed(completed, Utc::now());
        }
        debug!("updated task {id}");
        Ok(task.clone())
    }

    /// Flips the completion flag of a task.
    pub fn toggle_task(&mut self, id: u64) -> Result<Task, StoreError> {
        let task = self.task_mut(id)?;
        let completed = !task.completed;
        task.set_completed(completed, Utc::now());
        debug!("task {id} completed = {completed}");
        Ok(task.clone())
    }

    pub fn delete_task(&mut self, id: u64) -> Result<(), StoreError> {
        let idx = self.position(id)?;
        let removed = self.tasks.remove(idx);
        info!("deleted task {} '{}'", removed.id, removed.title);
        Ok(())
    }

    /// Creates one task per date the rule expands to, with consecutive ids
    /// and the rule attached. Either the whole batch is stored or nothing is.
    ///
    /// The batch is returned, and placed at the front of the list, in
    /// generation order.
    pub fn create_recurring_tasks(&mut self, data: NewTask, config: RecurrenceConfig) -> Result<Vec<Task>, StoreError> {
        let task_fields = check_task(&data);
        let rule = check_recurring_config(&config);
        let (fields, rule) = match (task_fields, rule) {
            (Ok(fields), Ok(rule)) => (fields, rule),
            (fields, rule) => {
                let mut errors = ValidationErrors::new();
                if let Err(e) = fields {
                    errors.extend(e);
                }
                if let Err(e) = rule {
                    errors.extend(e);
                }
                return Err(StoreError::Validation(errors));
            }
        };

        let dates = rule.dates();
        if dates.is_empty() {
            return Err(StoreError::RecurrenceExpansion);
        }

        let base_id = self.next_task_id()?;
        let last_id = base_id
            .checked_add(dates.len() as u64 - 1)
            .ok_or(StoreError::IdsExhausted)?;
        let template = Self::build_task(0, fields);
        let batch: Vec<Task> = dates
            .into_iter()
            .enumerate()
            .map(|(i, date)| Task {
                id: base_id + i as u64,
                due_date: Some(date),
                is_recurring: true,
                recurring_config: Some(config.clone()),
                ..template.clone()
            })
            .collect();

        info!(
            "created {} recurring tasks '{}' (ids {}..={})",
            batch.len(),
            template.title,
            base_id,
            last_id
        );
        self.last_task_id = last_id;
        self.tasks.splice(0..0, batch.iter().cloned());
        Ok(batch)
    }

    fn subtask_index(task: &Task, subtask_id: u64) -> Result<usize, StoreError> {
        task.subtasks
            .iter()
            .position(|s| s.id == subtask_id)
            .ok_or(StoreError::NotFound(Missing::Subtask {
                task: task.id,
                subtask: subtask_id,
            }))
    }

    /// Appends a subtask. Its id is one past the highest ever issued for
    /// this task, so ids are not reused after a delete.
    pub fn add_subtask(&mut self, task_id: u64, data: NewSubtask) -> Result<Task, StoreError> {
        let title = check_subtask(&data)?;
        let task = self.task_mut(task_id)?;
        task.subtask_seq += 1;
        task.subtasks.push(Subtask {
            id: task.subtask_seq,
            title,
            completed: false,
            completed_at: None,
        });
        refresh_progress(task);
        debug!("added subtask {} to task {task_id}", task.subtask_seq);
        Ok(task.clone())
    }

    pub fn update_subtask(&mut self, task_id: u64, subtask_id: u64, patch: SubtaskPatch) -> Result<Task, StoreError> {
        let title = match &patch.title {
            Some(title) => Some(check_subtask(&NewSubtask::titled(title.as_str()))?),
            None => None,
        };
        let task = self.task_mut(task_id)?;
        let idx = Self::subtask_index(task, subtask_id)?;
        let subtask = &mut task.subtasks[idx];
        if let Some(title) = title {
            subtask.title = title;
        }
        if let Some(completed) = patch.completed {
            subtask.set_completed(completed, Utc::now());
        }
        refresh_progress(task);
        debug!("updated subtask {subtask_id} of task {task_id}");
        Ok(task.clone())
    }

    pub fn delete_subtask(&mut self, task_id: u64, subtask_id: u64) -> Result<Task, StoreError> {
        let task = self.task_mut(task_id)?;
        let idx = Self::subtask_index(task, subtask_id)?;
        task.subtasks.remove(idx);
        refresh_progress(task);
        debug!("deleted subtask {subtask_id} of task {task_id}");
        Ok(task.clone())
    }

    pub fn toggle_subtask(&mut self, task_id: u64, subtask_id: u64) -> Result<Task, StoreError> {
        let task = self.task_mut(task_id)?;
        let idx = Self::subtask_index(task, subtask_id)?;
        let subtask = &mut task.subtasks[idx];
        let completed = !subtask.completed;
        subtask.set_completed(completed, Utc::now());
        refresh_progress(task);
        debug!("subtask {subtask_id} of task {task_id} completed = {completed}");
        Ok(task.clone())
    }

    /// Number of tasks whose category matches `name`, ignoring case.
    pub fn task_count(&self, name: &str) -> usize {
        self.tasks.iter().filter(|t| t.in_category(name)).count()
    }

    fn with_count(&self, category: &Category) -> CategoryWithCount {
        CategoryWithCount {
            category: category.clone(),
            task_count: self.task_count(&category.name),
        }
    }

    fn category_position(&self, id: u64) -> Result<usize, StoreError> {
        self.categories
            .iter()
            .position(|c| c.id == id)
            .ok_or(StoreError::NotFound(Missing::Category(id)))
    }

    /// Lists categories with task counts computed from the current tasks.
    pub fn list_categories(&self) -> Vec<CategoryWithCount> {
        self.categories.iter().map(|c| self.with_count(c)).collect()
    }

    pub fn get_category(&self, id: u64) -> Result<CategoryWithCount, StoreError> {
        let idx = self.category_position(id)?;
        Ok(self.with_count(&self.categories[idx]))
    }

    pub fn create_category(&mut self, data: NewCategory) -> Result<CategoryWithCount, StoreError> {
        let (name, color) = check_category(&data)?;
        let id = self.categories.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        let category = Category { id, name, color };
        info!("created category {} '{}'", id, category.name);
        self.categories.push(category.clone());
        Ok(self.with_count(&category))
    }

    pub fn update_category(&mut self, id: u64, patch: CategoryPatch) -> Result<CategoryWithCount, StoreError> {
        let idx = self.category_position(id)?;
        let current = &self.categories[idx];
        let draft = NewCategory {
            name: patch.name.unwrap_or_else(|| current.name.clone()),
            color: patch.color.or_else(|| Some(current.color.clone())),
        };
        let (name, color) = check_category(&draft)?;
        let category = &mut self.categories[idx];
        category.name = name;
        category.color = color;
        let category = category.clone();
        debug!("updated category {id}");
        Ok(self.with_count(&category))
    }

    /// Removes a category. Tasks filed under it keep their category text.
    pub fn delete_category(&mut self, id: u64) -> Result<(), StoreError> {
        let idx = self.category_position(id)?;
        let removed = self.categories.remove(idx);
        info!("deleted category {} '{}'", removed.id, removed.name);
        Ok(())
    }
}
