use crate::modules::sample_tasks::core::value_objects::{
    DomainError, TaskName, TimerInMilliseconds,
};
use crate::modules::sample_tasks::use_cases::add_sample_task::transaction::AddSampleTask;
use crate::shared::application::validation::{ValidationErrors, Validator};
use crate::shared::core::errors::ErrorDetail;

/// New tasks start enabled, so the timer has to meet the enabled minimum.
pub struct AddSampleTaskValidator;

impl Validator<AddSampleTask> for AddSampleTaskValidator {
    fn validate(&self, transaction: &AddSampleTask) -> Vec<ErrorDetail> {
        let mut errors = ValidationErrors::new();
        errors.collect("name", TaskName::new(&transaction.name));
        let timer = errors.collect(
            "timerInMilliseconds",
            TimerInMilliseconds::new(transaction.timer_in_milliseconds),
        );
        if timer.is_some_and(|timer| !timer.meets_enabled_minimum()) {
            errors.add(
                "timerInMilliseconds",
                DomainError::TimerBelowEnabledMinimum.to_string(),
            );
        }
        errors.into_details()
    }
}

#[cfg(test)]
mod add_sample_task_validator_tests {
    use super::*;
    use crate::shared::core::correlation_id::CorrelationId;
    use rstest::rstest;

    fn transaction(name: &str, timer: i64) -> AddSampleTask {
        AddSampleTask {
            correlation_id: CorrelationId::generate(),
            name: name.to_string(),
            timer_in_milliseconds: timer,
        }
    }

    #[test]
    fn it_should_accept_a_valid_task() {
        assert!(AddSampleTaskValidator.validate(&transaction("demo-task", 1000)).is_empty());
    }

    #[rstest]
    #[case("", 1000, "name", "Name is required")]
    #[case("ab", 1000, "name", "Name must be at least 3 characters")]
    #[case(
        "demo-task",
        499,
        "timerInMilliseconds",
        "Timer must be at least 500 ms for an enabled task"
    )]
    #[case("demo-task", -5, "timerInMilliseconds", "Timer must not be negative")]
    #[case(
        "demo-task",
        86_400_001,
        "timerInMilliseconds",
        "Timer must not exceed 24 hours (86400000 ms)"
    )]
    fn it_should_reject_invalid_input(
        #[case] name: &str,
        #[case] timer: i64,
        #[case] property: &str,
        #[case] message: &str,
    ) {
        let details = AddSampleTaskValidator.validate(&transaction(name, timer));
        assert_eq!(details, vec![ErrorDetail::for_property(property, message)]);
    }

    #[test]
    fn it_should_report_name_and_timer_together() {
        let details = AddSampleTaskValidator.validate(&transaction(" ", 10));
        assert_eq!(details.len(), 2);
    }
}
