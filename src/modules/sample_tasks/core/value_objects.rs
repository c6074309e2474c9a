use crate::shared::core::errors::{AppError, ErrorDetail};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

pub const NAME_MIN_LENGTH: usize = 3;
pub const NAME_MAX_LENGTH: usize = 100;
pub const TIMER_MIN_ENABLED_MS: i64 = 500;
pub const TIMER_MAX_MS: i64 = 86_400_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Id must be greater than zero")]
    InvalidId,

    #[error("Name is required")]
    NameRequired,

    #[error("Name must be at least {} characters", NAME_MIN_LENGTH)]
    NameTooShort,

    #[error("Name must not exceed {} characters", NAME_MAX_LENGTH)]
    NameTooLong,

    #[error("Timer must not be negative")]
    TimerNegative,

    #[error("Timer must not exceed 24 hours ({} ms)", TIMER_MAX_MS)]
    TimerTooLong,

    #[error("Timer must be at least {} ms for an enabled task", TIMER_MIN_ENABLED_MS)]
    TimerBelowEnabledMinimum,
}

impl DomainError {
    pub fn property(&self) -> &'static str {
        match self {
            DomainError::InvalidId => "id",
            DomainError::NameRequired | DomainError::NameTooShort | DomainError::NameTooLong => {
                "name"
            }
            DomainError::TimerNegative
            | DomainError::TimerTooLong
            | DomainError::TimerBelowEnabledMinimum => "timerInMilliseconds",
        }
    }
}

/// A rule broken while applying a change to an existing task is a business error.
impl From<DomainError> for AppError {
    fn from(error: DomainError) -> Self {
        AppError::Business(error.to_string())
    }
}

impl From<DomainError> for ErrorDetail {
    fn from(error: DomainError) -> Self {
        ErrorDetail::for_property(error.property(), error.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SampleTaskId(i64);

impl SampleTaskId {
    pub fn new(value: i64) -> Result<Self, DomainError> {
        if value > 0 {
            Ok(Self(value))
        } else {
            Err(DomainError::InvalidId)
        }
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for SampleTaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TaskName(String);

impl TaskName {
    pub fn new(value: &str) -> Result<Self, DomainError> {
        let trimmed = value.trim();
        let length = trimmed.chars().count();
        if length == 0 {
            Err(DomainError::NameRequired)
        } else if length < NAME_MIN_LENGTH {
            Err(DomainError::NameTooShort)
        } else if length > NAME_MAX_LENGTH {
            Err(DomainError::NameTooLong)
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Timer length in milliseconds, at most 24 hours. The enabled-task minimum is enforced by
/// `SampleTask`, since a disabled task may carry a shorter timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TimerInMilliseconds(i64);

impl TimerInMilliseconds {
    pub fn new(value: i64) -> Result<Self, DomainError> {
        if value < 0 {
            Err(DomainError::TimerNegative)
        } else if value > TIMER_MAX_MS {
            Err(DomainError::TimerTooLong)
        } else {
            Ok(Self(value))
        }
    }

    pub fn value(self) -> i64 {
        self.0
    }

    pub fn meets_enabled_minimum(self) -> bool {
        self.0 >= TIMER_MIN_ENABLED_MS
    }
}
