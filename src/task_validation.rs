use std::fmt;
use thiserror::Error;

/// The attributes of a [`Task`](crate::Task) that carry an invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskField {
    Name,
    Offset,
    Period,
    Deadline,
    Computation,
    Priority,
    Threshold,
}

impl TaskField {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskField::Name => "Name",
            TaskField::Offset => "Offset",
            TaskField::Period => "Period",
            TaskField::Deadline => "Relative deadline",
            TaskField::Computation => "Computation time",
            TaskField::Priority => "Priority",
            TaskField::Threshold => "Preemption threshold",
        }
    }
}

impl fmt::Display for TaskField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// `value >= 0`
    NonNegative,
    /// `value > 0`
    Positive,
    /// `0 <= value < i32::MAX`, leaving room for `value + 1`
    BelowMaximum,
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::NonNegative => f.write_str("must be at least 0"),
            Requirement::Positive => f.write_str("must be strictly greater than 0"),
            Requirement::BelowMaximum => {
                write!(f, "must be at least 0 and less than {}", i32::MAX)
            }
        }
    }
}

/// A [`Task`](crate::Task) constructor or setter was handed a value outside its range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskValidationError {
    #[error("{field} {requirement} (got {value})")]
    OutOfRange {
        field: TaskField,
        requirement: Requirement,
        value: i64,
    },
    #[error("Name must not be empty")]
    EmptyName,
}

impl TaskValidationError {
    pub fn out_of_range(field: TaskField, requirement: Requirement, value: i64) -> Self {
        Self::OutOfRange {
            field,
            requirement,
            value,
        }
    }

    /// The field whose invariant was violated.
    pub fn field(&self) -> TaskField {
        match self {
            TaskValidationError::OutOfRange { field, .. } => *field,
            TaskValidationError::EmptyName => TaskField::Name,
        }
    }
}

pub(crate) fn ensure_name(name: &str) -> Result<(), TaskValidationError> {
    if name.is_empty() {
        return Err(TaskValidationError::EmptyName);
    }
    Ok(())
}

pub(crate) fn ensure_non_negative(field: TaskField, value: i32) -> Result<i32, TaskValidationError> {
    if value < 0 {
        return Err(TaskValidationError::out_of_range(
            field,
            Requirement::NonNegative,
            value.into(),
        ));
    }
    Ok(value)
}

/// A priority must leave room for the derived `priority + 1`.
pub(crate) fn ensure_priority(field: TaskField, value: i32) -> Result<i32, TaskValidationError> {
    if value < 0 || value == i32::MAX {
        return Err(TaskValidationError::out_of_range(
            field,
            Requirement::BelowMaximum,
            value.into(),
        ));
    }
    Ok(value)
}

pub(crate) fn ensure_positive(field: TaskField, value: i32) -> Result<i32, TaskValidationError> {
    if value <= 0 {
        return Err(TaskValidationError::out_of_range(
            field,
            Requirement::Positive,
            value.into(),
        ));
    }
    Ok(value)
}
