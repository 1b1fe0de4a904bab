use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::config::Config;
use crate::error::StorageError;
use crate::models::{Category, Task};
use crate::store::TaskStore;

const TASKS_FILE: &str = "tasks.json";
const CATEGORIES_FILE: &str = "categories.json";

/// JSON files holding the task and category collections.
///
/// Both live in one data directory:
/// - `tasks.json` — array of task records.
/// - `categories.json` — array of categories, without their derived counts.
#[derive(Debug, Clone)]
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.data_dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn tasks_path(&self) -> PathBuf {
        self.dir.join(TASKS_FILE)
    }

    pub fn categories_path(&self) -> PathBuf {
        self.dir.join(CATEGORIES_FILE)
    }

    /// Loads both collections.
    ///
    /// A missing tasks file means no tasks; a missing categories file means
    /// the default categories. Unreadable or malformed files are errors.
    pub fn load(&self) -> Result<TaskStore, StorageError> {
        let tasks: Vec<Task> = read_json(&self.tasks_path())?.unwrap_or_default();
        let categories: Vec<Category> = read_json(&self.categories_path())?.unwrap_or_else(Category::defaults);
        info!(
            "loaded {} tasks and {} categories from {}",
            tasks.len(),
            categories.len(),
            self.dir.display()
        );
        Ok(TaskStore::from_parts(tasks, categories))
    }

    /// Replaces both files with the store's current contents.
    ///
    /// Both collections are written to temporary files in the data directory
    /// before either is renamed over its target. If writing fails, neither
    /// file changes. Each file is replaced by a rename, so it is never left
    /// half-written.
    pub fn save(&self, store: &TaskStore) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|source| io_error(&self.dir, source))?;
        let tasks = self.stage(&self.tasks_path(), store.tasks())?;
        let categories = self.stage(&self.categories_path(), store.categories())?;
        persist(tasks, &self.tasks_path())?;
        persist(categories, &self.categories_path())?;
        info!("saved {} tasks to {}", store.tasks().len(), self.dir.display());
        Ok(())
    }

    fn stage<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<NamedTempFile, StorageError> {
        let s = serde_json::to_string_pretty(value).map_err(|source| StorageError::Json {
            path: path.display().to_string(),
            source,
        })?;
        let mut f = NamedTempFile::new_in(&self.dir).map_err(|source| io_error(&self.dir, source))?;
        f.write_all(s.as_bytes()).map_err(|source| io_error(f.path(), source))?;
        f.as_file().sync_all().map_err(|source| io_error(f.path(), source))?;
        Ok(f)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    let s = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("{} does not exist yet", path.display());
            return Ok(None);
        }
        Err(e) => return Err(io_error(path, e)),
    };
    serde_json::from_str(&s).map(Some).map_err(|source| StorageError::Json {
        path: path.display().to_string(),
        source,
    })
}

fn persist(staged: NamedTempFile, path: &Path) -> Result<(), StorageError> {
    staged.persist(path).map_err(|e| io_error(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewSubtask, NewTask};

    #[test]
    fn missing_files_load_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = Storage::new(dir.path()).load().unwrap();
        assert!(store.tasks().is_empty());
        assert_eq!(store.categories(), Category::defaults().as_slice());
    }

    #[test]
    fn save_then_load_preserves_collections() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().join("nested"));
        let mut store = TaskStore::with_default_categories();
        let task = store.create_task(NewTask::titled("water plants").due("2024-04-01")).unwrap();
        store.add_subtask(task.id, NewSubtask::titled("ferns")).unwrap();

        storage.save(&store).unwrap();
        let loaded = storage.load().unwrap();
        assert_eq!(loaded, store);
    }

    #[test]
    fn category_counts_are_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path());
        storage.save(&TaskStore::with_default_categories()).unwrap();
        let raw = fs::read_to_string(storage.categories_path()).unwrap();
        assert!(!raw.contains("taskCount"));
    }

    #[test]
    fn save_replaces_files_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path());
        let mut store = TaskStore::with_default_categories();
        for title in ["one", "two", "three"] {
            store.create_task(NewTask::titled(title)).unwrap();
        }
        storage.save(&store).unwrap();

        let mut smaller = TaskStore::with_default_categories();
        smaller.create_task(NewTask::titled("only")).unwrap();
        storage.save(&smaller).unwrap();

        assert_eq!(storage.load().unwrap(), smaller);
        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["categories.json", "tasks.json"]);
    }

    #[test]
    fn failed_save_keeps_previous_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path());
        let mut store = TaskStore::with_default_categories();
        store.create_task(NewTask::titled("kept")).unwrap();
        storage.save(&store).unwrap();
        let before = fs::read_to_string(storage.tasks_path()).unwrap();

        let blocked = Storage::new(storage.tasks_path().join("nested"));
        assert!(matches!(blocked.save(&TaskStore::new()), Err(StorageError::Io { .. })));

        assert_eq!(fs::read_to_string(storage.tasks_path()).unwrap(), before);
        assert_eq!(storage.load().unwrap(), store);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path());
        fs::write(storage.tasks_path(), "{ not json").unwrap();
        assert!(matches!(storage.load(), Err(StorageError::Json { .. })));
    }
}
