use crate::modules::sample_tasks::core::views::SampleTaskView;
use crate::shared::core::correlation_id::CorrelationId;
use crate::shared::core::envelope::BaseReturn;
use crate::shared::core::transaction::{Transaction, TransactionCode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddSampleTask {
    pub correlation_id: CorrelationId,
    pub name: String,
    pub timer_in_milliseconds: i64,
}

impl Transaction for AddSampleTask {
    type Response = BaseReturn<SampleTaskView>;
    const CODE: TransactionCode = TransactionCode::AddSampleTask;

    fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }
}
