//! Task persistence.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::{Mutex, RwLock};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::SchedulerError;
use crate::task::Task;

/// File name of the task map inside the scheduler directory.
pub const TASKS_FILE: &str = "tasks.json";

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn save(&self, task: &Task) -> Result<(), SchedulerError>;

    async fn load(&self, task_id: &str) -> Result<Option<Task>, SchedulerError>;

    async fn load_all(&self) -> Result<Vec<Task>, SchedulerError>;

    async fn delete(&self, task_id: &str) -> Result<(), SchedulerError>;

    /// Save many tasks. Stores that can batch should override this.
    async fn save_all(&self, tasks: &[Task]) -> Result<(), SchedulerError> {
        for task in tasks {
            self.save(task).await?;
        }
        Ok(())
    }
}

/// In-memory task store for testing.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<HashMap<String, Task>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn save(&self, task: &Task) -> Result<(), SchedulerError> {
        self.tasks
            .write()
            .await
            .insert(task.task_id.clone(), task.clone());
        Ok(())
    }

    async fn load(&self, task_id: &str) -> Result<Option<Task>, SchedulerError> {
        Ok(self.tasks.read().await.get(task_id).cloned())
    }

    async fn load_all(&self) -> Result<Vec<Task>, SchedulerError> {
        Ok(self.tasks.read().await.values().cloned().collect())
    }

    async fn delete(&self, task_id: &str) -> Result<(), SchedulerError> {
        self.tasks.write().await.remove(task_id);
        Ok(())
    }
}

/// All tasks in one `tasks.json` object keyed by task id.
#[derive(Debug)]
pub struct FileTaskStore {
    path: PathBuf,
    // Serializes read-modify-write cycles on the file.
    lock: Mutex<()>,
}

impl FileTaskStore {
    /// Store at `<dir>/tasks.json`, creating `dir` if needed.
    pub async fn new(dir: impl AsRef<Path>) -> Result<Self, SchedulerError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).await.map_err(|e| {
            SchedulerError::Store(format!(
                "Failed to create scheduler directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        debug!("FileTaskStore initialized at {}", dir.display());
        Ok(Self {
            path: dir.join(TASKS_FILE),
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where an unreadable task file is set aside.
    pub fn corrupt_path(&self) -> PathBuf {
        self.path.with_extension("json.corrupt")
    }

    /// The stored tasks. An unparsable file is moved to
    /// [`corrupt_path`](Self::corrupt_path) and reads as empty; entries that
    /// are not valid tasks are skipped after copying the file there.
    async fn read_map(&self) -> Result<BTreeMap<String, Task>, SchedulerError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        let raw: BTreeMap<String, Value> = match serde_json::from_str(&content) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Unreadable task file {}: {}", self.path.display(), e);
                fs::rename(&self.path, self.corrupt_path()).await?;
                return Ok(BTreeMap::new());
            }
        };

        let mut map = BTreeMap::new();
        let mut skipped = 0;
        for (id, value) in raw {
            match serde_json::from_value::<Task>(value) {
                Ok(task) => {
                    map.insert(id, task);
                }
                Err(e) => {
                    warn!("Skipping invalid task {}: {}", id, e);
                    skipped += 1;
                }
            }
        }
        if skipped > 0 {
            fs::copy(&self.path, self.corrupt_path()).await?;
        }
        Ok(map)
    }

    async fn write_map(&self, map: &BTreeMap<String, Task>) -> Result<(), SchedulerError> {
        fs::write(&self.path, serde_json::to_string_pretty(map)?).await?;
        debug!("Saved {} task(s) to {}", map.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl TaskStore for FileTaskStore {
    async fn save(&self, task: &Task) -> Result<(), SchedulerError> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_map().await?;
        map.insert(task.task_id.clone(), task.clone());
        self.write_map(&map).await
    }

    async fn load(&self, task_id: &str) -> Result<Option<Task>, SchedulerError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_map().await?.remove(task_id))
    }

    async fn load_all(&self) -> Result<Vec<Task>, SchedulerError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_map().await?.into_values().collect())
    }

    async fn delete(&self, task_id: &str) -> Result<(), SchedulerError> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_map().await?;
        if map.remove(task_id).is_some() {
            self.write_map(&map).await?;
        }
        Ok(())
    }

    async fn save_all(&self, tasks: &[Task]) -> Result<(), SchedulerError> {
        let _guard = self.lock.lock().await;
        let mut map = self.read_map().await?;
        for task in tasks {
            map.insert(task.task_id.clone(), task.clone());
        }
        self.write_map(&map).await
    }
}
