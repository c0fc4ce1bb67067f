use super::{PersistenceError, PersistenceResult, TextStore};
use crate::codec::{CodecError, ThresholdEncoding, task_set_from_json, task_set_to_json};
use crate::task::{Color, NO_THRESHOLD, Task};
use crate::task_set::TaskSet;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// A document stored in one file on disk.
///
/// Writes truncate and rewrite the file in place. A crash mid-write can leave it corrupt.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TextStore for FileStore {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn is_readable(&self) -> bool {
        self.path.is_file()
    }

    fn is_writable(&self) -> bool {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.is_dir(),
            _ => true,
        }
    }

    /// Bytes that are not UTF-8 are reported as undecodable contents, not as an I/O failure.
    fn read_text(&self) -> PersistenceResult<String> {
        let bytes = fs::read(&self.path)?;
        String::from_utf8(bytes).map_err(|err| {
            PersistenceError::Codec(CodecError::invalid("text", format!("not UTF-8: {err}")))
        })
    }

    fn write_text(&self, text: &str) -> PersistenceResult<()> {
        fs::write(&self.path, text)?;
        Ok(())
    }
}

pub fn save_task_set_to_json<P: AsRef<Path>>(task_set: &TaskSet, path: P) -> PersistenceResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &task_set_to_json(task_set, ThresholdEncoding::Flagged))?;
    Ok(())
}

pub fn load_task_set_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<TaskSet> {
    let file = File::open(path)?;
    let value: serde_json::Value = serde_json::from_reader(file)?;
    Ok(task_set_from_json(&value)?)
}

#[derive(Serialize, Deserialize)]
struct TaskCsvRecord {
    name: String,
    color: String,
    offset: i32,
    period: i32,
    deadline: i32,
    computation: i32,
    priority: i32,
    threshold: String,
}

impl From<&Task> for TaskCsvRecord {
    fn from(task: &Task) -> Self {
        Self {
            name: task.name().to_string(),
            color: task.color().to_hex(),
            offset: task.offset(),
            period: task.period(),
            deadline: task.deadline(),
            computation: task.computation(),
            priority: task.priority(),
            threshold: task
                .threshold()
                .map(|t| t.to_string())
                .unwrap_or_default(),
        }
    }
}

impl TaskCsvRecord {
    fn into_task(self) -> PersistenceResult<Task> {
        let color = self
            .color
            .parse::<Color>()
            .map_err(|err| PersistenceError::InvalidData(err.to_string()))?;
        let threshold = parse_threshold(&self.threshold)?;
        Ok(Task::new(
            self.name,
            color.argb(),
            self.offset,
            self.period,
            self.deadline,
            self.computation,
            self.priority,
            threshold,
        )?)
    }
}

/// Writes one row per task in insertion order. The set name is not stored.
pub fn save_task_set_to_csv<P: AsRef<Path>>(task_set: &TaskSet, path: P) -> PersistenceResult<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for task in task_set.tasks() {
        writer.serialize(TaskCsvRecord::from(&task))?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads tasks written by [`save_task_set_to_csv`] into a new set called `name`.
pub fn load_task_set_from_csv<P: AsRef<Path>>(
    path: P,
    name: impl Into<String>,
) -> PersistenceResult<TaskSet> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut tasks = Vec::new();
    for record in reader.deserialize::<TaskCsvRecord>() {
        tasks.push(record?.into_task()?);
    }
    Ok(TaskSet::from_tasks(name, tasks))
}

fn parse_threshold(input: &str) -> PersistenceResult<i32> {
    if input.trim().is_empty() {
        return Ok(NO_THRESHOLD);
    }
    input
        .trim()
        .parse::<i32>()
        .map_err(|e| PersistenceError::InvalidData(format!("invalid threshold '{input}': {e}")))
}
