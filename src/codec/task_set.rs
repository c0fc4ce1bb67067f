use super::task::{NAME, task_from_json, task_to_json};
use super::{CodecError, Marshaller, ThresholdEncoding, as_object, required_array, required_str};
use crate::task_set::TaskSet;
use serde_json::{Value, json};

const TASKS: &str = "Tasks";

/// Encodes a task set as its name plus its tasks in insertion order.
pub fn task_set_to_json(task_set: &TaskSet, thresholds: ThresholdEncoding) -> Value {
    let tasks: Vec<Value> = task_set
        .tasks()
        .iter()
        .map(|task| task_to_json(task, thresholds))
        .collect();
    json!({
        NAME: task_set.name(),
        TASKS: tasks,
    })
}

pub fn task_set_from_json(value: &Value) -> Result<TaskSet, CodecError> {
    let object = as_object(value, "object for a task set")?;
    let name = required_str(object, NAME)?;
    task_set_from_json_named(name, value)
}

/// Decodes the `Tasks` of an encoded task set but names the result `name`, ignoring any
/// encoded name.
pub fn task_set_from_json_named(
    name: impl Into<String>,
    value: &Value,
) -> Result<TaskSet, CodecError> {
    let object = as_object(value, "object for a task set")?;
    let tasks = required_array(object, TASKS)?
        .iter()
        .map(task_from_json)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TaskSet::from_tasks(name, tasks))
}

pub fn task_set_to_string(task_set: &TaskSet) -> String {
    task_set_to_json(task_set, ThresholdEncoding::Flagged).to_string()
}

pub fn task_set_from_str(text: &str) -> Result<TaskSet, CodecError> {
    let value: Value = serde_json::from_str(text)?;
    task_set_from_json(&value)
}

/// Persists a single [`TaskSet`] through a [`Manager`](crate::Manager).
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskSetCodec {
    pub thresholds: ThresholdEncoding,
}

impl Marshaller<TaskSet> for TaskSetCodec {
    fn marshal(&self, value: &TaskSet) -> Result<String, CodecError> {
        Ok(serde_json::to_string_pretty(&task_set_to_json(
            value,
            self.thresholds,
        ))?)
    }

    fn unmarshal(&self, text: &str) -> Result<TaskSet, CodecError> {
        task_set_from_str(text)
    }
}
