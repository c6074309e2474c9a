use crate::modules::sample_tasks::core::sample_task::{NewSampleTask, SampleTask};
use crate::modules::sample_tasks::core::value_objects::{
    SampleTaskId, TaskName, TimerInMilliseconds,
};

pub fn timer(value: i64) -> TimerInMilliseconds {
    TimerInMilliseconds::new(value).unwrap()
}

pub fn new_sample_task(name: &str, timer_ms: i64) -> NewSampleTask {
    NewSampleTask::create(TaskName::new(name).unwrap(), timer(timer_ms)).unwrap()
}

pub struct SampleTaskBuilder {
    id: i64,
    name: String,
    timer: i64,
    enabled: bool,
    created_at: i64,
    updated_at: Option<i64>,
}

impl Default for SampleTaskBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl SampleTaskBuilder {
    pub fn new() -> Self {
        Self {
            id: 1,
            name: "demo-task".to_string(),
            timer: 1000,
            enabled: true,
            created_at: 1_700_000_000_000,
            updated_at: None,
        }
    }

    pub fn id(mut self, v: i64) -> Self {
        self.id = v;
        self
    }

    pub fn name(mut self, v: impl Into<String>) -> Self {
        self.name = v.into();
        self
    }

    pub fn timer(mut self, v: i64) -> Self {
        self.timer = v;
        self
    }

    pub fn enabled(mut self, v: bool) -> Self {
        self.enabled = v;
        self
    }

    pub fn created_at(mut self, v: i64) -> Self {
        self.created_at = v;
        self
    }

    pub fn updated_at(mut self, v: i64) -> Self {
        self.updated_at = Some(v);
        self
    }

    pub fn build(self) -> SampleTask {
        SampleTask::reconstruct(
            SampleTaskId::new(self.id).unwrap(),
            TaskName::new(&self.name).unwrap(),
            timer(self.timer),
            self.enabled,
            self.created_at,
            self.updated_at,
        )
        .unwrap()
    }
}

#[cfg(test)]
mod sample_task_builder_tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn default_builds_an_enabled_demo_task() {
        let task = SampleTaskBuilder::default().build();
        assert_eq!(task.id().value(), 1);
        assert_eq!(task.name().as_str(), "demo-task");
        assert_eq!(task.timer().value(), 1000);
        assert!(task.is_enabled());
        assert_eq!(task.created_at(), 1_700_000_000_000);
        assert_eq!(task.updated_at(), None);
    }

    #[rstest]
    fn setters_override_all_fields() {
        let task = SampleTaskBuilder::new()
            .id(42)
            .name("custom")
            .timer(250)
            .enabled(false)
            .created_at(10)
            .updated_at(20)
            .build();
        assert_eq!(task.id().value(), 42);
        assert_eq!(task.name().as_str(), "custom");
        assert_eq!(task.timer().value(), 250);
        assert!(!task.is_enabled());
        assert_eq!(task.created_at(), 10);
        assert_eq!(task.updated_at(), Some(20));
    }
}
