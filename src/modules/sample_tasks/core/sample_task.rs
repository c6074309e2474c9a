use crate::modules::sample_tasks::core::value_objects::{
    DomainError, SampleTaskId, TaskName, TimerInMilliseconds,
};
use chrono::Utc;

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn ensure_enabled_minimum(enabled: bool, timer: TimerInMilliseconds) -> Result<(), DomainError> {
    if enabled && !timer.meets_enabled_minimum() {
        Err(DomainError::TimerBelowEnabledMinimum)
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSampleTask {
    name: TaskName,
    timer: TimerInMilliseconds,
    enabled: bool,
    created_at: i64,
}

impl NewSampleTask {
    pub fn create(name: TaskName, timer: TimerInMilliseconds) -> Result<Self, DomainError> {
        ensure_enabled_minimum(true, timer)?;
        Ok(Self {
            name,
            timer,
            enabled: true,
            created_at: now_millis(),
        })
    }

    pub fn name(&self) -> &TaskName {
        &self.name
    }

    pub fn timer(&self) -> TimerInMilliseconds {
        self.timer
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn into_persisted(self, id: SampleTaskId) -> SampleTask {
        SampleTask {
            id,
            name: self.name,
            timer: self.timer,
            enabled: self.enabled,
            created_at: self.created_at,
            updated_at: None,
        }
    }
}

/// Immutable sample task. Every change returns a new value with `updated_at` stamped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleTask {
    id: SampleTaskId,
    name: TaskName,
    timer: TimerInMilliseconds,
    enabled: bool,
    created_at: i64,
    updated_at: Option<i64>,
}

impl SampleTask {
    pub fn reconstruct(
        id: SampleTaskId,
        name: TaskName,
        timer: TimerInMilliseconds,
        enabled: bool,
        created_at: i64,
        updated_at: Option<i64>,
    ) -> Result<Self, DomainError> {
        ensure_enabled_minimum(enabled, timer)?;
        Ok(Self {
            id,
            name,
            timer,
            enabled,
            created_at,
            updated_at,
        })
    }

    pub fn id(&self) -> SampleTaskId {
        self.id
    }

    pub fn name(&self) -> &TaskName {
        &self.name
    }

    pub fn timer(&self) -> TimerInMilliseconds {
        self.timer
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<i64> {
        self.updated_at
    }

    pub fn is_active(&self) -> bool {
        self.enabled && self.timer.value() > 0
    }

    pub fn rename(&self, name: TaskName) -> Self {
        Self {
            name,
            updated_at: Some(now_millis()),
            ..self.clone()
        }
    }

    pub fn with_timer(&self, timer: TimerInMilliseconds) -> Result<Self, DomainError> {
        ensure_enabled_minimum(self.enabled, timer)?;
        Ok(Self {
            timer,
            updated_at: Some(now_millis()),
            ..self.clone()
        })
    }

    pub fn enable(&self) -> Result<Self, DomainError> {
        ensure_enabled_minimum(true, self.timer)?;
        Ok(Self {
            enabled: true,
            updated_at: Some(now_millis()),
            ..self.clone()
        })
    }

    pub fn disable(&self) -> Self {
        Self {
            enabled: false,
            updated_at: Some(now_millis()),
            ..self.clone()
        }
    }
}
