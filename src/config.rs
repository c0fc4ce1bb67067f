//! Where the backing stores live.

use crate::persistence::{PersistenceError, PersistenceResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DATA_DIR_VAR: &str = "TASKSET_TOOL_DATA_DIR";
pub const CONFIG_VAR: &str = "TASKSET_TOOL_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding every store file.
    pub data_dir: PathBuf,
    /// File name of the persisted task set collection.
    pub task_sets_file: String,
    pub visualization_file: String,
    /// Log filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            task_sets_file: "root.tasksets".to_string(),
            visualization_file: "visualization.json".to_string(),
            log_filter: "warn".to_string(),
        }
    }
}

impl StoreConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> PersistenceResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content).map_err(|err| {
            PersistenceError::InvalidData(format!("config {}: {err}", path.display()))
        })?;
        debug!(path = %path.display(), "loaded store config");
        Ok(config)
    }

    /// Defaults, overlaid with the file named by `TASKSET_TOOL_CONFIG` and then with
    /// `TASKSET_TOOL_DATA_DIR`.
    pub fn from_env() -> PersistenceResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> PersistenceResult<Self> {
        let mut config = match lookup(CONFIG_VAR) {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        if let Some(dir) = lookup(DATA_DIR_VAR) {
            config.data_dir = PathBuf::from(dir);
        }
        Ok(config)
    }

    pub fn task_sets_path(&self) -> PathBuf {
        self.data_dir.join(&self.task_sets_file)
    }

    pub fn visualization_path(&self) -> PathBuf {
        self.data_dir.join(&self.visualization_file)
    }
}
