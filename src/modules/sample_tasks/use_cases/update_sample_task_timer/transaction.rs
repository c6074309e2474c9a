use crate::shared::core::correlation_id::CorrelationId;
use crate::shared::core::envelope::BaseReturn;
use crate::shared::core::transaction::{Transaction, TransactionCode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSampleTaskTimer {
    pub correlation_id: CorrelationId,
    pub id: i64,
    pub timer_in_milliseconds: i64,
}

impl Transaction for UpdateSampleTaskTimer {
    type Response = BaseReturn<bool>;
    const CODE: TransactionCode = TransactionCode::UpdateSampleTaskTimer;

    fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }
}
