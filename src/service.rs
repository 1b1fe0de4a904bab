use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::models::{
    CategoryPatch, CategoryWithCount, NewCategory, NewSubtask, NewTask, RecurrenceConfig, SubtaskPatch, Task,
    TaskPatch,
};
use crate::query::{compute_counts, filter_and_sort, CountSummary, FilterSet};
use crate::store::TaskStore;

/// Asynchronous handle to a shared [`TaskStore`].
///
/// Each call waits out the configured latency, then locks the store and runs
/// the operation to completion. Waiting happens only before the lock is
/// taken, so mutations never interleave.
#[derive(Debug, Clone)]
pub struct TaskService {
    store: Arc<Mutex<TaskStore>>,
    latency: Duration,
}

impl TaskService {
    pub fn new(store: TaskStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            latency: Duration::ZERO,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    /// A copy of the store as it is now.
    pub async fn snapshot(&self) -> TaskStore {
        self.store.lock().await.clone()
    }

    pub async fn list_tasks(&self) -> Vec<Task> {
        self.delay().await;
        self.store.lock().await.list_tasks()
    }

    pub async fn get_task(&self, id: u64) -> Result<Task, StoreError> {
        self.delay().await;
        self.store.lock().await.get_task(id)
    }

    pub async fn create_task(&self, data: NewTask) -> Result<Task, StoreError> {
        self.delay().await;
        self.store.lock().await.create_task(data)
    }

    pub async fn update_task(&self, id: u64, patch: TaskPatch) -> Result<Task, StoreError> {
        self.delay().await;
        self.store.lock().await.update_task(id, patch)
    }

    pub async fn toggle_task(&self, id: u64) -> Result<Task, StoreError> {
        self.delay().await;
        self.store.lock().await.toggle_task(id)
    }

    pub async fn delete_task(&self, id: u64) -> Result<(), StoreError> {
        self.delay().await;
        self.store.lock().await.delete_task(id)
    }

    pub async fn create_recurring_tasks(
        &self,
        data: NewTask,
        config: RecurrenceConfig,
    ) -> Result<Vec<Task>, StoreError> {
        self.delay().await;
        self.store.lock().await.create_recurring_tasks(data, config)
    }

    pub async fn add_subtask(&self, task_id: u64, data: NewSubtask) -> Result<Task, StoreError> {
        self.delay().await;
        self.store.lock().await.add_subtask(task_id, data)
    }

    pub async fn update_subtask(&self, task_id: u64, subtask_id: u64, patch: SubtaskPatch) -> Result<Task, StoreError> {
        self.delay().await;
        self.store.lock().await.update_subtask(task_id, subtask_id, patch)
    }

    pub async fn delete_subtask(&self, task_id: u64, subtask_id: u64) -> Result<Task, StoreError> {
        self.delay().await;
        self.store.lock().await.delete_subtask(task_id, subtask_id)
    }

    pub async fn toggle_subtask(&self, task_id: u64, subtask_id: u64) -> Result<Task, StoreError> {
        self.delay().await;
        self.store.lock().await.toggle_subtask(task_id, subtask_id)
    }

    pub async fn list_categories(&self) -> Vec<CategoryWithCount> {
        self.delay().await;
        self.store.lock().await.list_categories()
    }

    pub async fn get_category(&self, id: u64) -> Result<CategoryWithCount, StoreError> {
        self.delay().await;
        self.store.lock().await.get_category(id)
    }

    pub async fn create_category(&self, data: NewCategory) -> Result<CategoryWithCount, StoreError> {
        self.delay().await;
        self.store.lock().await.create_category(data)
    }

    pub async fn update_category(&self, id: u64, patch: CategoryPatch) -> Result<CategoryWithCount, StoreError> {
        self.delay().await;
        self.store.lock().await.update_category(id, patch)
    }

    pub async fn delete_category(&self, id: u64) -> Result<(), StoreError> {
        self.delay().await;
        self.store.lock().await.delete_category(id)
    }

    /// Visible tasks for `filters`, in display order.
    pub async fn filter_and_sort(&self, filters: &FilterSet, today: NaiveDate) -> Vec<Task> {
        let store = self.store.lock().await;
        filter_and_sort(store.tasks(), filters, today)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn counts(&self, today: NaiveDate) -> CountSummary {
        compute_counts(self.store.lock().await.tasks(), today)
    }
}
