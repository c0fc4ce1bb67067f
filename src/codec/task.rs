use super::{CodecError, ThresholdEncoding, as_object};
use crate::task::{Color, NO_THRESHOLD, Task};
use serde::Deserialize;
use serde_json::{Value, json};

pub(crate) const NAME: &str = "Name";
const PRIORITY: &str = "Priority";
const THRESHOLD: &str = "Threshold";
const COMPUTATION: &str = "Computation";
const PERIOD: &str = "Period";
const DEADLINE: &str = "Deadline";
const OFFSET: &str = "Offset";
const COLOR: &str = "Color";

/// A task as it travels. Every key is optional so a missing one can be reported by name; null
/// counts as missing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TaskRecord {
    name: Option<String>,
    priority: Option<i32>,
    threshold: Option<i32>,
    computation: Option<i32>,
    period: Option<i32>,
    deadline: Option<i32>,
    offset: Option<i32>,
    color: Option<String>,
}

impl TaskRecord {
    fn into_task(self) -> Result<Task, CodecError> {
        let name = self.name.ok_or(CodecError::MissingField(NAME))?;
        let period = self.period.ok_or(CodecError::MissingField(PERIOD))?;
        let deadline = self.deadline.ok_or(CodecError::MissingField(DEADLINE))?;
        let computation = self.computation.ok_or(CodecError::MissingField(COMPUTATION))?;
        let priority = self.priority.ok_or(CodecError::MissingField(PRIORITY))?;
        let color = self
            .color
            .ok_or(CodecError::MissingField(COLOR))?
            .parse::<Color>()
            .map_err(|err| CodecError::invalid(COLOR, err.to_string()))?;

        Ok(Task::new(
            name,
            color.argb(),
            self.offset.unwrap_or(0),
            period,
            deadline,
            computation,
            priority,
            self.threshold.unwrap_or(NO_THRESHOLD),
        )?)
    }
}

/// Encodes a task as a keyed record carrying all eight attributes.
pub fn task_to_json(task: &Task, thresholds: ThresholdEncoding) -> Value {
    let threshold = match thresholds {
        ThresholdEncoding::Flagged => task.raw_threshold(),
        ThresholdEncoding::Absolute => task.minimal_preemption_priority(),
    };
    json!({
        NAME: task.name(),
        PRIORITY: task.priority(),
        THRESHOLD: threshold,
        COMPUTATION: task.computation(),
        PERIOD: task.period(),
        DEADLINE: task.deadline(),
        OFFSET: task.offset(),
        COLOR: task.color().to_hex(),
    })
}

/// Decodes a task record.
///
/// `Name`, `Period`, `Deadline`, `Computation`, `Priority` and `Color` are required. `Offset`
/// defaults to 0 and `Threshold` defaults to no threshold. Values of the wrong type, including
/// integers outside `i32`, fail as [`CodecError::Json`].
pub fn task_from_json(value: &Value) -> Result<Task, CodecError> {
    as_object(value, "object for a task")?;
    TaskRecord::deserialize(value)?.into_task()
}

pub fn task_to_string(task: &Task) -> String {
    task_to_json(task, ThresholdEncoding::Flagged).to_string()
}

pub fn task_from_str(text: &str) -> Result<Task, CodecError> {
    let value: Value = serde_json::from_str(text)?;
    task_from_json(&value)
}
