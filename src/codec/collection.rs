use super::task_set::{task_set_from_json, task_set_to_json};
use super::{CodecError, Marshaller, ThresholdEncoding};
use crate::registry::TaskSetCollection;
use serde_json::Value;

/// Persists a [`TaskSetCollection`] as a JSON array of task set encodings, in insertion order.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskSetCollectionCodec {
    pub thresholds: ThresholdEncoding,
}

impl Marshaller<TaskSetCollection> for TaskSetCollectionCodec {
    fn marshal(&self, value: &TaskSetCollection) -> Result<String, CodecError> {
        let sets: Vec<Value> = value
            .iter()
            .map(|set| task_set_to_json(set, self.thresholds))
            .collect();
        Ok(serde_json::to_string_pretty(&sets)?)
    }

    fn unmarshal(&self, text: &str) -> Result<TaskSetCollection, CodecError> {
        let value: Value = serde_json::from_str(text)?;
        let sets = value
            .as_array()
            .ok_or(CodecError::UnexpectedShape("array of task sets"))?;
        sets.iter()
            .map(task_set_from_json)
            .collect::<Result<TaskSetCollection, _>>()
    }
}
