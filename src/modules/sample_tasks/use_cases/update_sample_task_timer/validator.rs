use crate::modules::sample_tasks::core::value_objects::{SampleTaskId, TimerInMilliseconds};
use crate::modules::sample_tasks::use_cases::update_sample_task_timer::{
    transaction::UpdateSampleTaskTimer,
};
use crate::shared::application::validation::{ValidationErrors, Validator};
use crate::shared::core::errors::ErrorDetail;

/// Only checks the shape of the input. Whether the timer meets the enabled minimum depends on
/// the stored task and is decided by the entity.
pub struct UpdateSampleTaskTimerValidator;

impl Validator<UpdateSampleTaskTimer> for UpdateSampleTaskTimerValidator {
    fn validate(&self, transaction: &UpdateSampleTaskTimer) -> Vec<ErrorDetail> {
        let mut errors = ValidationErrors::new();
        errors.collect("id", SampleTaskId::new(transaction.id));
        errors.collect(
            "timerInMilliseconds",
            TimerInMilliseconds::new(transaction.timer_in_milliseconds),
        );
        errors.into_details()
    }
}
