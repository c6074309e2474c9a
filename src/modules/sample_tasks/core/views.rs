use crate::modules::sample_tasks::core::sample_task::SampleTask;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleTaskView {
    pub id: i64,
    pub name: String,
    pub is_enabled: bool,
    pub timer_on_miliseconds: i64,
    pub created_at: i64,
    pub updated_at: Option<i64>,
}

impl From<&SampleTask> for SampleTaskView {
    fn from(task: &SampleTask) -> Self {
        Self {
            id: task.id().value(),
            name: task.name().as_str().to_string(),
            is_enabled: task.is_enabled(),
            timer_on_miliseconds: task.timer().value(),
            created_at: task.created_at(),
            updated_at: task.updated_at(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleTaskListView {
    pub tasks: Vec<SampleTaskView>,
}

#[cfg(test)]
mod sample_task_view_tests {
    use super::*;
    use crate::tests::fixtures::sample_task::SampleTaskBuilder;
    use serde_json::json;

    #[test]
    fn it_should_serialize_with_the_public_field_names() {
        let task = SampleTaskBuilder::new().id(3).timer(1500).build();
        let value = serde_json::to_value(SampleTaskView::from(&task)).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 3,
                "name": "demo-task",
                "isEnabled": true,
                "timerOnMiliseconds": 1500,
                "createdAt": 1_700_000_000_000i64,
                "updatedAt": null
            })
        );
    }
}
