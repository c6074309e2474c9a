use crate::shared::core::correlation_id::CorrelationId;
use crate::shared::core::errors::{AppError, ErrorDetail, ErrorType};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub const DEFAULT_SUCCESS_MESSAGE: &str = "Operation completed successfully";

/// A successful envelope always carries data and no error; a failed one carries an error type
/// and never data. Both constructors and deserialization keep that invariant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseReturn<T> {
    success: bool,
    message: String,
    error_code: i32,
    data: Option<T>,
    correlation_id: CorrelationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_type: Option<ErrorType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_details: Option<Vec<ErrorDetail>>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("successful envelope must carry data of the payload type and no error")]
    InconsistentSuccess,

    #[error("failed envelope must carry an error type and no data")]
    InconsistentFailure,
}

impl<T> BaseReturn<T> {
    pub fn success(data: T, correlation_id: &CorrelationId) -> Self {
        Self::success_with_message(data, DEFAULT_SUCCESS_MESSAGE, correlation_id)
    }

    pub fn success_with_message(
        data: T,
        message: impl Into<String>,
        correlation_id: &CorrelationId,
    ) -> Self {
        Self {
            success: true,
            message: message.into(),
            error_code: 0,
            data: Some(data),
            correlation_id: correlation_id.clone(),
            error_type: None,
            error_details: None,
        }
    }

    pub fn failure(error: &AppError, correlation_id: &CorrelationId) -> Self {
        let error_type = error.error_type();
        let details = error.details();
        Self {
            success: false,
            message: error.to_string(),
            error_code: error_type.error_code(),
            data: None,
            correlation_id: correlation_id.clone(),
            error_type: Some(error_type),
            error_details: (!details.is_empty()).then_some(details),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn error_code(&self) -> i32 {
        self.error_code
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    pub fn error_type(&self) -> Option<ErrorType> {
        self.error_type
    }

    pub fn error_details(&self) -> &[ErrorDetail] {
        self.error_details.as_deref().unwrap_or_default()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> BaseReturn<U> {
        BaseReturn {
            success: self.success,
            message: self.message,
            error_code: self.error_code,
            data: self.data.map(f),
            correlation_id: self.correlation_id,
            error_type: self.error_type,
            error_details: self.error_details,
        }
    }

    pub fn into_result(self) -> Result<T, AppError> {
        if let Some(data) = self.data {
            return Ok(data);
        }
        let details = self.error_details.unwrap_or_default();
        Err(match self.error_type.unwrap_or(ErrorType::Internal) {
            ErrorType::Validation => AppError::Validation {
                message: self.message,
                details,
            },
            ErrorType::Business => AppError::Business(self.message),
            ErrorType::NotFound => AppError::NotFound(self.message),
            ErrorType::Internal => AppError::Internal {
                message: self.message,
                cause: details.into_iter().next().map(|detail| detail.message),
            },
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBaseReturn {
    success: bool,
    message: String,
    error_code: i32,
    #[serde(default)]
    data: serde_json::Value,
    correlation_id: CorrelationId,
    #[serde(default)]
    error_type: Option<ErrorType>,
    #[serde(default)]
    error_details: Option<Vec<ErrorDetail>>,
}

impl RawBaseReturn {
    /// A success reads `data` as a required `T`, so `null` is accepted exactly when `T` is `()`.
    fn checked<T: DeserializeOwned>(self) -> Result<BaseReturn<T>, EnvelopeError> {
        let data = if self.success {
            if self.error_type.is_some() {
                return Err(EnvelopeError::InconsistentSuccess);
            }
            let data = T::deserialize(self.data)
                .map_err(|_| EnvelopeError::InconsistentSuccess)?;
            Some(data)
        } else {
            if !self.data.is_null() || self.error_type.is_none() {
                return Err(EnvelopeError::InconsistentFailure);
            }
            None
        };
        Ok(BaseReturn {
            success: self.success,
            message: self.message,
            error_code: self.error_code,
            data,
            correlation_id: self.correlation_id,
            error_type: self.error_type,
            error_details: self.error_details,
        })
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for BaseReturn<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawBaseReturn::deserialize(deserializer)?
            .checked()
            .map_err(serde::de::Error::custom)
    }
}
