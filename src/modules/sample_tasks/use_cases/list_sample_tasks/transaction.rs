use crate::modules::sample_tasks::core::views::SampleTaskListView;
use crate::shared::core::correlation_id::CorrelationId;
use crate::shared::core::envelope::BaseReturn;
use crate::shared::core::transaction::{Transaction, TransactionCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleTaskFilter {
    #[default]
    All,
    ActiveOnly,
    TimerRange { min: i64, max: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSampleTasks {
    pub correlation_id: CorrelationId,
    pub filter: SampleTaskFilter,
}

impl Transaction for ListSampleTasks {
    type Response = BaseReturn<SampleTaskListView>;
    const CODE: TransactionCode = TransactionCode::ListSampleTasks;

    fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }
}
