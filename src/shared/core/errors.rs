use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorType {
    Validation,
    Business,
    NotFound,
    Internal,
}

impl ErrorType {
    pub fn code(self) -> &'static str {
        match self {
            ErrorType::Validation => "VALIDATION_ERROR",
            ErrorType::Business => "BUSINESS_ERROR",
            ErrorType::NotFound => "NOT_FOUND",
            ErrorType::Internal => "INTERNAL_ERROR",
        }
    }

    pub fn error_code(self) -> i32 {
        match self {
            ErrorType::Validation | ErrorType::Business => 400,
            ErrorType::NotFound => 404,
            ErrorType::Internal => 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_name: Option<String>,
    pub message: String,
}

impl ErrorDetail {
    pub fn for_property(property_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            property_name: Some(property_name.into()),
            message: message.into(),
        }
    }

    pub fn general(message: impl Into<String>) -> Self {
        Self {
            property_name: None,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        message: String,
        details: Vec<ErrorDetail>,
    },

    #[error("{0}")]
    Business(String),

    #[error("{0}")]
    NotFound(String),

    /// `cause` is diagnostic only and never shown to clients in production.
    #[error("{message}")]
    Internal {
        message: String,
        cause: Option<String>,
    },
}

impl AppError {
    pub fn validation(details: Vec<ErrorDetail>) -> Self {
        let message = match details.as_slice() {
            [single] => single.message.clone(),
            _ => "One or more validation errors occurred".to_string(),
        };
        AppError::Validation { message, details }
    }

    pub fn internal(cause: impl ToString) -> Self {
        AppError::Internal {
            message: "An internal error occurred while processing the request".to_string(),
            cause: Some(cause.to_string()),
        }
    }

    pub fn error_type(&self) -> ErrorType {
        match self {
            AppError::Validation { .. } => ErrorType::Validation,
            AppError::Business(_) => ErrorType::Business,
            AppError::NotFound(_) => ErrorType::NotFound,
            AppError::Internal { .. } => ErrorType::Internal,
        }
    }

    pub fn details(&self) -> Vec<ErrorDetail> {
        match self {
            AppError::Validation { details, .. } => details.clone(),
            AppError::Internal {
                cause: Some(cause), ..
            } => vec![ErrorDetail::general(cause.clone())],
            _ => Vec::new(),
        }
    }
}
