use crate::shared::core::errors::{AppError, ErrorDetail};

/// Rules for one transaction type. Every failing rule is reported, not only the first.
pub trait Validator<T>: Send + Sync {
    fn validate(&self, value: &T) -> Vec<ErrorDetail>;

    fn check(&self, value: &T) -> Result<(), AppError> {
        let details = self.validate(value);
        if details.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(details))
        }
    }
}

#[derive(Debug, Default)]
pub struct ValidationErrors {
    details: Vec<ErrorDetail>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, property: &str, message: impl Into<String>) {
        self.details.push(ErrorDetail::for_property(property, message));
    }

    pub fn collect<T, E: std::fmt::Display>(
        &mut self,
        property: &str,
        result: Result<T, E>,
    ) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.add(property, error.to_string());
                None
            }
        }
    }

    pub fn into_details(self) -> Vec<ErrorDetail> {
        self.details
    }
}

#[cfg(test)]
mod validation_tests {
    use super::*;

    struct PositiveNumber;

    impl Validator<i64> for PositiveNumber {
        fn validate(&self, value: &i64) -> Vec<ErrorDetail> {
            let mut errors = ValidationErrors::new();
            if *value <= 0 {
                errors.add("value", "must be positive");
            }
            if *value % 2 != 0 {
                errors.add("value", "must be even");
            }
            errors.into_details()
        }
    }

    #[test]
    fn it_should_pass_valid_values() {
        assert_eq!(PositiveNumber.check(&4), Ok(()));
    }

    #[test]
    fn it_should_report_every_failing_rule() {
        let Err(AppError::Validation { details, message }) = PositiveNumber.check(&-3) else {
            panic!("expected a validation error");
        };
        assert_eq!(details.len(), 2);
        assert_eq!(message, "One or more validation errors occurred");
    }

    #[test]
    fn it_should_keep_successful_values_while_collecting() {
        let mut errors = ValidationErrors::new();
        let ok: Option<i32> = errors.collect("a", Ok::<_, String>(1));
        let failed: Option<i32> = errors.collect("b", Err::<i32, _>("bad"));
        assert_eq!(ok, Some(1));
        assert_eq!(failed, None);
        let details = errors.into_details();
        assert_eq!(details, vec![ErrorDetail::for_property("b", "bad")]);
    }
}
