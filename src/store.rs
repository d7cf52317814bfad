//! Where the flat task list lives between sessions.

use crate::error::Result;
use crate::task::Task;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

pub trait TaskStore {
    fn load(&self) -> Result<Vec<Task>>;
    fn save(&mut self, tasks: &[Task]) -> Result<()>;
}

/// Pretty-printed JSON array on disk. A missing file reads as an empty board.
#[derive(Debug, Clone)]
pub struct JsonTaskStore {
    path: PathBuf,
}

impl JsonTaskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TaskStore for JsonTaskStore {
    fn load(&self) -> Result<Vec<Task>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no task file yet");
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&self.path)?;
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        let tasks: Vec<Task> = serde_json::from_str(&data)?;
        debug!(path = %self.path.display(), count = tasks.len(), "loaded tasks");
        Ok(tasks)
    }

    fn save(&mut self, tasks: &[Task]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        // Write beside the target and rename so a crash never leaves half a file.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(tasks)?)?;
        fs::rename(&tmp, &self.path)?;
        info!(path = %self.path.display(), count = tasks.len(), "saved tasks");
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryTaskStore {
    pub tasks: Vec<Task>,
    pub saves: usize,
}

impl MemoryTaskStore {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks, saves: 0 }
    }
}

impl TaskStore for MemoryTaskStore {
    fn load(&self) -> Result<Vec<Task>> {
        Ok(self.tasks.clone())
    }

    fn save(&mut self, tasks: &[Task]) -> Result<()> {
        self.tasks = tasks.to_vec();
        self.saves += 1;
        Ok(())
    }
}
