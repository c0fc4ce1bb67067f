use crate::task_validation::{
    TaskField, TaskValidationError, ensure_name, ensure_non_negative, ensure_positive,
    ensure_priority,
};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Threshold value meaning "no preemption threshold". A task without a threshold can be
/// preempted by any task of strictly higher priority.
pub const NO_THRESHOLD: i32 = -1;

const OPAQUE: u32 = 0xFF00_0000;
const RGB_MASK: u32 = 0x00FF_FFFF;

/// Display colour of a task. Only the red, green and blue channels are kept; the alpha channel
/// is always fully opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(u32);

impl Color {
    /// Builds a colour from a packed `0xAARRGGBB` value, discarding the alpha channel.
    pub fn from_argb(argb: u32) -> Self {
        Self(OPAQUE | (argb & RGB_MASK))
    }

    pub fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self::from_argb(u32::from(red) << 16 | u32::from(green) << 8 | u32::from(blue))
    }

    pub fn argb(&self) -> u32 {
        self.0
    }

    pub fn rgb(&self) -> u32 {
        self.0 & RGB_MASK
    }

    /// `#RRGGBB`, upper case.
    pub fn to_hex(&self) -> String {
        format!("#{:06X}", self.rgb())
    }
}

impl Default for Color {
    fn default() -> Self {
        Self(OPAQUE)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid color '{0}' (expected #RRGGBB)")]
pub struct ColorParseError(pub String);

impl FromStr for Color {
    type Err = ColorParseError;

    /// Accepts `#RRGGBB` and `#AARRGGBB`; any alpha digits are dropped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError(s.to_string()))?;
        if !matches!(digits.len(), 6 | 8) || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorParseError(s.to_string()));
        }
        u32::from_str_radix(digits, 16)
            .map(Color::from_argb)
            .map_err(|_| ColorParseError(s.to_string()))
    }
}

/// One periodic real-time task.
///
/// Every setter validates its argument and leaves the task untouched on failure. The name is
/// fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Task {
    name: String,
    color: Color,
    offset: i32,
    period: i32,
    deadline: i32,
    computation: i32,
    priority: i32,
    threshold: Option<i32>,
}

impl Task {
    /// Creates a task from all of its parameters.
    ///
    /// `threshold` may be [`NO_THRESHOLD`]. `color` is a packed `0xAARRGGBB` value whose alpha
    /// channel is ignored.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        color: u32,
        offset: i32,
        period: i32,
        deadline: i32,
        computation: i32,
        priority: i32,
        threshold: i32,
    ) -> Result<Self, TaskValidationError> {
        let name = name.into();
        ensure_name(&name)?;
        let mut task = Self {
            name,
            color: Color::default(),
            offset: 0,
            period: 1,
            deadline: 1,
            computation: 1,
            priority: 0,
            threshold: None,
        };
        task.set_color(color);
        task.set_offset(offset)?;
        task.set_period(period)?;
        task.set_deadline(deadline)?;
        task.set_computation(computation)?;
        task.set_priority(priority)?;
        task.set_threshold(threshold)?;
        Ok(task)
    }

    /// A task whose first job is released at time 0.
    pub fn immediate(
        name: impl Into<String>,
        color: u32,
        period: i32,
        deadline: i32,
        computation: i32,
        priority: i32,
        threshold: i32,
    ) -> Result<Self, TaskValidationError> {
        Self::new(name, color, 0, period, deadline, computation, priority, threshold)
    }

    /// A task released at time 0 that has no preemption threshold.
    pub fn immediate_without_threshold(
        name: impl Into<String>,
        color: u32,
        period: i32,
        deadline: i32,
        computation: i32,
        priority: i32,
    ) -> Result<Self, TaskValidationError> {
        Self::new(
            name,
            color,
            0,
            period,
            deadline,
            computation,
            priority,
            NO_THRESHOLD,
        )
    }

    /// A task with an explicit offset and no preemption threshold.
    pub fn without_threshold(
        name: impl Into<String>,
        color: u32,
        period: i32,
        deadline: i32,
        computation: i32,
        priority: i32,
        offset: i32,
    ) -> Result<Self, TaskValidationError> {
        Self::new(
            name,
            color,
            offset,
            period,
            deadline,
            computation,
            priority,
            NO_THRESHOLD,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn offset(&self) -> i32 {
        self.offset
    }

    pub fn period(&self) -> i32 {
        self.period
    }

    pub fn deadline(&self) -> i32 {
        self.deadline
    }

    pub fn computation(&self) -> i32 {
        self.computation
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// The explicit preemption threshold, if one is set.
    pub fn threshold(&self) -> Option<i32> {
        self.threshold
    }

    /// The threshold as stored on the wire: the threshold itself or [`NO_THRESHOLD`].
    pub fn raw_threshold(&self) -> i32 {
        self.threshold.unwrap_or(NO_THRESHOLD)
    }

    pub fn has_preemption_threshold(&self) -> bool {
        self.threshold.is_some()
    }

    /// The lowest priority a job of another task needs to preempt a running job of this task.
    pub fn minimal_preemption_priority(&self) -> i32 {
        self.threshold.unwrap_or(self.priority + 1)
    }

    pub fn set_color(&mut self, argb: u32) {
        self.color = Color::from_argb(argb);
    }

    pub fn set_rgb(&mut self, red: u8, green: u8, blue: u8) {
        self.color = Color::from_rgb(red, green, blue);
    }

    pub fn set_offset(&mut self, offset: i32) -> Result<(), TaskValidationError> {
        self.offset = ensure_non_negative(TaskField::Offset, offset)?;
        Ok(())
    }

    pub fn set_period(&mut self, period: i32) -> Result<(), TaskValidationError> {
        self.period = ensure_positive(TaskField::Period, period)?;
        Ok(())
    }

    pub fn set_deadline(&mut self, deadline: i32) -> Result<(), TaskValidationError> {
        self.deadline = ensure_positive(TaskField::Deadline, deadline)?;
        Ok(())
    }

    pub fn set_computation(&mut self, computation: i32) -> Result<(), TaskValidationError> {
        self.computation = ensure_positive(TaskField::Computation, computation)?;
        Ok(())
    }

    pub fn set_priority(&mut self, priority: i32) -> Result<(), TaskValidationError> {
        self.priority = ensure_priority(TaskField::Priority, priority)?;
        Ok(())
    }

    /// Sets the preemption threshold; [`NO_THRESHOLD`] clears it.
    pub fn set_threshold(&mut self, threshold: i32) -> Result<(), TaskValidationError> {
        self.threshold = if threshold == NO_THRESHOLD {
            None
        } else {
            Some(ensure_non_negative(TaskField::Threshold, threshold)?)
        };
        Ok(())
    }
}
