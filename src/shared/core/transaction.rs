use crate::shared::core::correlation_id::CorrelationId;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u16)]
pub enum TransactionCode {
    AddSampleTask = 1,
    GetSampleTask = 2,
    ListSampleTasks = 3,
    UpdateSampleTaskTimer = 4,
}

impl TransactionCode {
    pub fn value(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for TransactionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// An application-level request. Each transaction type has exactly one response type,
/// which is what the mediator dispatches on.
pub trait Transaction: Send + Sync + 'static {
    type Response: Send + 'static;

    const CODE: TransactionCode;

    fn correlation_id(&self) -> &CorrelationId;

    fn code(&self) -> TransactionCode {
        Self::CODE
    }
}
