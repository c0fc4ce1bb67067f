//! Textual encodings of the domain types.
//!
//! Every encoding is a JSON keyed record. Decoders accept records with keys in any order and
//! report the first missing key by name.

use crate::task_validation::TaskValidationError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub mod collection;
pub mod task;
pub mod task_set;
pub mod visualization;

pub use collection::TaskSetCollectionCodec;
pub use task::{task_from_json, task_from_str, task_to_json, task_to_string};
pub use task_set::{
    TaskSetCodec, task_set_from_json, task_set_from_json_named, task_set_from_str,
    task_set_to_json, task_set_to_string,
};
pub use visualization::{VisualizationCodec, visualization_from_json, visualization_to_json};

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("no value for {0}")]
    MissingField(&'static str),
    #[error("invalid value for {field}: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
    #[error("expected a JSON {0}")]
    UnexpectedShape(&'static str),
    #[error(transparent)]
    Validation(#[from] TaskValidationError),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl CodecError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            message: message.into(),
        }
    }

    /// The key whose absence caused this error, if that is what happened.
    pub fn missing_field(&self) -> Option<&'static str> {
        match self {
            CodecError::MissingField(field) => Some(*field),
            _ => None,
        }
    }
}

/// How a task without a preemption threshold writes its `Threshold` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdEncoding {
    /// Write the `-1` sentinel. Decodes back to the same task.
    #[default]
    Flagged,
    /// Write the effective threshold, `priority + 1`. Consumers that do not understand the
    /// sentinel need this, but the task decodes with an explicit threshold.
    Absolute,
}

/// The marshal/unmarshal pair a [`Manager`](crate::Manager) uses to persist its value.
///
/// Implementations must satisfy `unmarshal(marshal(v)) == v` for every valid `v`.
pub trait Marshaller<T>: Send + Sync {
    fn marshal(&self, value: &T) -> Result<String, CodecError>;
    fn unmarshal(&self, text: &str) -> Result<T, CodecError>;
}

/// A [`Marshaller`] assembled from two functions.
pub struct FnMarshaller<M, U> {
    marshal: M,
    unmarshal: U,
}

impl<M, U> FnMarshaller<M, U> {
    pub fn new(marshal: M, unmarshal: U) -> Self {
        Self { marshal, unmarshal }
    }
}

impl<T, M, U> Marshaller<T> for FnMarshaller<M, U>
where
    M: Fn(&T) -> Result<String, CodecError> + Send + Sync,
    U: Fn(&str) -> Result<T, CodecError> + Send + Sync,
{
    fn marshal(&self, value: &T) -> Result<String, CodecError> {
        (self.marshal)(value)
    }

    fn unmarshal(&self, text: &str) -> Result<T, CodecError> {
        (self.unmarshal)(text)
    }
}

pub(crate) fn as_object<'a>(
    value: &'a Value,
    expected: &'static str,
) -> Result<&'a Map<String, Value>, CodecError> {
    value
        .as_object()
        .ok_or(CodecError::UnexpectedShape(expected))
}

/// Null counts as absent, matching how optional keys are treated.
fn lookup<'a>(object: &'a Map<String, Value>, key: &'static str) -> Option<&'a Value> {
    object.get(key).filter(|value| !value.is_null())
}

pub(crate) fn required<'a>(
    object: &'a Map<String, Value>,
    key: &'static str,
) -> Result<&'a Value, CodecError> {
    lookup(object, key).ok_or(CodecError::MissingField(key))
}

pub(crate) fn required_str<'a>(
    object: &'a Map<String, Value>,
    key: &'static str,
) -> Result<&'a str, CodecError> {
    required(object, key)?
        .as_str()
        .ok_or_else(|| CodecError::invalid(key, "expected a string"))
}

pub(crate) fn required_i64(object: &Map<String, Value>, key: &'static str) -> Result<i64, CodecError> {
    required(object, key)?
        .as_i64()
        .ok_or_else(|| CodecError::invalid(key, "expected an integer"))
}

pub(crate) fn required_array<'a>(
    object: &'a Map<String, Value>,
    key: &'static str,
) -> Result<&'a Vec<Value>, CodecError> {
    required(object, key)?
        .as_array()
        .ok_or_else(|| CodecError::invalid(key, "expected an array"))
}
