use crate::modules::sample_tasks::core::views::SampleTaskView;
use crate::shared::core::correlation_id::CorrelationId;
use crate::shared::core::envelope::BaseReturn;
use crate::shared::core::transaction::{Transaction, TransactionCode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetSampleTask {
    pub correlation_id: CorrelationId,
    pub id: i64,
}

impl Transaction for GetSampleTask {
    type Response = BaseReturn<SampleTaskView>;
    const CODE: TransactionCode = TransactionCode::GetSampleTask;

    fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }
}
