use crate::modules::sample_tasks::core::repository::{
    RepositoryError, SampleTaskRepository, ensure_range,
};
use crate::modules::sample_tasks::core::sample_task::{NewSampleTask, SampleTask};
use crate::modules::sample_tasks::core::value_objects::{
    DomainError, SampleTaskId, TaskName, TimerInMilliseconds,
};
use crate::shared::infrastructure::database::document::adapter::DocumentBackend;
use crate::shared::infrastructure::database::document::{
    Document, DocumentStoreError, Filter, ID_FIELD, Sort,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

const COLLECTION: &str = "sample_tasks";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SampleTaskDocument {
    #[serde(rename = "_id")]
    id: i64,
    name: String,
    timer_in_milliseconds: i64,
    is_enabled: bool,
    created_at: i64,
    updated_at: Option<i64>,
}

impl SampleTaskDocument {
    fn draft(task: &NewSampleTask) -> Self {
        Self {
            id: 0,
            name: task.name().as_str().to_string(),
            timer_in_milliseconds: task.timer().value(),
            is_enabled: task.is_enabled(),
            created_at: task.created_at(),
            updated_at: None,
        }
    }

    fn into_document(self) -> Result<Document, DocumentStoreError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(document)) => Ok(document),
            Ok(_) => Err(DocumentStoreError::InvalidDocument(
                "sample task did not serialize to an object".to_string(),
            )),
            Err(error) => Err(DocumentStoreError::InvalidDocument(error.to_string())),
        }
    }

    fn from_document(document: Document) -> Result<Self, RepositoryError> {
        serde_json::from_value(Value::Object(document))
            .map_err(|error| RepositoryError::Mapping(format!("{COLLECTION} document: {error}")))
    }
}

impl From<&SampleTask> for SampleTaskDocument {
    fn from(task: &SampleTask) -> Self {
        Self {
            id: task.id().value(),
            name: task.name().as_str().to_string(),
            timer_in_milliseconds: task.timer().value(),
            is_enabled: task.is_enabled(),
            created_at: task.created_at(),
            updated_at: task.updated_at(),
        }
    }
}

impl TryFrom<SampleTaskDocument> for SampleTask {
    type Error = RepositoryError;

    fn try_from(document: SampleTaskDocument) -> Result<Self, Self::Error> {
        let id = document.id;
        let corrupt = |error: DomainError| {
            RepositoryError::Mapping(format!("{COLLECTION} document {id}: {error}"))
        };
        SampleTask::reconstruct(
            SampleTaskId::new(document.id).map_err(corrupt)?,
            TaskName::new(&document.name).map_err(corrupt)?,
            TimerInMilliseconds::new(document.timer_in_milliseconds).map_err(corrupt)?,
            document.is_enabled,
            document.created_at,
            document.updated_at,
        )
        .map_err(corrupt)
    }
}

fn decode(document: Document) -> Result<SampleTask, RepositoryError> {
    SampleTaskDocument::from_document(document)?.try_into()
}

#[derive(Clone)]
pub struct DocumentSampleTaskRepository {
    backend: DocumentBackend,
}

impl DocumentSampleTaskRepository {
    pub fn new(backend: DocumentBackend) -> Self {
        Self { backend }
    }

    async fn find_many(
        &self,
        filter: Filter,
        sort: Sort,
        cancel: &CancellationToken,
    ) -> Result<Vec<SampleTask>, RepositoryError> {
        let documents = self
            .backend
            .adapter(cancel)
            .execute_with_retry(|session| {
                let filter = filter.clone();
                let sort = sort.clone();
                Box::pin(async move { session.find(COLLECTION, &filter, Some(&sort)).await })
            })
            .await?;
        documents.into_iter().map(decode).collect()
    }
}

#[async_trait]
impl SampleTaskRepository for DocumentSampleTaskRepository {
    async fn get_by_id(
        &self,
        id: SampleTaskId,
        cancel: &CancellationToken,
    ) -> Result<SampleTask, RepositoryError> {
        let document = self
            .backend
            .adapter(cancel)
            .execute_with_retry(|session| {
                Box::pin(async move {
                    session
                        .find_one(COLLECTION, &Filter::by_id(id.value()))
                        .await
                })
            })
            .await?;
        decode(document.ok_or(RepositoryError::NotFound { id })?)
    }

    async fn get_all(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<SampleTask>, RepositoryError> {
        self.find_many(
            Filter::All,
            Sort::descending("createdAt").then_descending(ID_FIELD),
            cancel,
        )
        .await
    }

    async fn get_active(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<SampleTask>, RepositoryError> {
        let filter = Filter::And(vec![
            Filter::eq("isEnabled", true),
            Filter::Range {
                field: "timerInMilliseconds".to_string(),
                min: 1,
                max: i64::MAX,
            },
        ]);
        self.find_many(
            filter,
            Sort::descending("createdAt").then_descending(ID_FIELD),
            cancel,
        )
        .await
    }

    async fn get_by_timer_range(
        &self,
        min: TimerInMilliseconds,
        max: TimerInMilliseconds,
        cancel: &CancellationToken,
    ) -> Result<Vec<SampleTask>, RepositoryError> {
        ensure_range(min, max)?;
        let filter = Filter::Range {
            field: "timerInMilliseconds".to_string(),
            min: min.value(),
            max: max.value(),
        };
        self.find_many(
            filter,
            Sort::ascending("timerInMilliseconds").then_ascending(ID_FIELD),
            cancel,
        )
        .await
    }

    async fn add(
        &self,
        task: NewSampleTask,
        cancel: &CancellationToken,
    ) -> Result<SampleTask, RepositoryError> {
        let draft = SampleTaskDocument::draft(&task);
        let id = self
            .backend
            .adapter(cancel)
            .execute_async(
                |session| {
                    let mut document = draft.clone();
                    Box::pin(async move {
                        document.id = session.next_sequence(COLLECTION).await?;
                        let id = document.id;
                        session
                            .insert_one(COLLECTION, document.into_document()?)
                            .await?;
                        Ok(id)
                    })
                },
                true,
            )
            .await?;

        let id = SampleTaskId::new(id)
            .map_err(|error| RepositoryError::Mapping(format!("generated id {id}: {error}")))?;
        tracing::debug!(%id, "sample task document inserted");
        Ok(task.into_persisted(id))
    }

    async fn update(
        &self,
        task: &SampleTask,
        cancel: &CancellationToken,
    ) -> Result<(), RepositoryError> {
        let id = task.id();
        let replacement = SampleTaskDocument::from(task);
        let matched = self
            .backend
            .adapter(cancel)
            .execute_async(
                |session| {
                    let replacement = replacement.clone();
                    Box::pin(async move {
                        session
                            .replace_one(
                                COLLECTION,
                                &Filter::by_id(id.value()),
                                replacement.into_document()?,
                            )
                            .await
                    })
                },
                true,
            )
            .await?;

        if matched == 0 {
            return Err(RepositoryError::NotFound { id });
        }
        Ok(())
    }

    async fn delete(
        &self,
        id: SampleTaskId,
        cancel: &CancellationToken,
    ) -> Result<(), RepositoryError> {
        let deleted = self
            .backend
            .adapter(cancel)
            .execute_async(
                |session| {
                    Box::pin(async move {
                        session
                            .delete_one(COLLECTION, &Filter::by_id(id.value()))
                            .await
                    })
                },
                true,
            )
            .await?;

        if deleted == 0 {
            return Err(RepositoryError::NotFound { id });
        }
        Ok(())
    }

    async fn exists(
        &self,
        id: SampleTaskId,
        cancel: &CancellationToken,
    ) -> Result<bool, RepositoryError> {
        let count = self
            .backend
            .adapter(cancel)
            .execute_with_retry(|session| {
                Box::pin(async move { session.count(COLLECTION, &Filter::by_id(id.value())).await })
            })
            .await?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod document_sample_task_repository_tests {
    use super::*;
    use crate::shared::infrastructure::database::DatabaseError;
    use crate::shared::infrastructure::database::document::in_memory::InMemoryDocumentClient;
    use crate::shared::infrastructure::resilience::resilience_test_support::fast_config;
    use crate::tests::fixtures::sample_task::{new_sample_task, timer};
    use rstest::{fixture, rstest};
    use std::sync::Arc;

    type BeforeEachReturn = (InMemoryDocumentClient, DocumentSampleTaskRepository);

    #[fixture]
    fn before_each() -> BeforeEachReturn {
        let client = InMemoryDocumentClient::new();
        let backend = DocumentBackend::new(Arc::new(client.clone()), "tests", &fast_config());
        (client, DocumentSampleTaskRepository::new(backend))
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_add_and_fetch_a_task(before_each: BeforeEachReturn) {
        let (_, repository) = before_each;
        let cancel = CancellationToken::new();

        let added = repository
            .add(new_sample_task("demo-task", 1000), &cancel)
            .await
            .unwrap();
        let fetched = repository.get_by_id(added.id(), &cancel).await.unwrap();

        assert_eq!(added.id().value(), 1);
        assert_eq!(fetched, added);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_report_a_missing_task_as_not_found(before_each: BeforeEachReturn) {
        let (_, repository) = before_each;
        let id = SampleTaskId::new(3).unwrap();
        assert_eq!(
            repository.get_by_id(id, &CancellationToken::new()).await,
            Err(RepositoryError::NotFound { id })
        );
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_list_newest_first(before_each: BeforeEachReturn) {
        let (_, repository) = before_each;
        let cancel = CancellationToken::new();
        let first = repository.add(new_sample_task("first", 1000), &cancel).await.unwrap();
        let second = repository.add(new_sample_task("second", 1000), &cancel).await.unwrap();

        let ids: Vec<_> = repository
            .get_all(&cancel)
            .await
            .unwrap()
            .iter()
            .map(SampleTask::id)
            .collect();
        assert_eq!(ids, vec![second.id(), first.id()]);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_only_list_active_tasks(before_each: BeforeEachReturn) {
        let (_, repository) = before_each;
        let cancel = CancellationToken::new();
        let active = repository.add(new_sample_task("active", 1000), &cancel).await.unwrap();
        let inactive = repository.add(new_sample_task("inactive", 1000), &cancel).await.unwrap();
        repository.update(&inactive.disable(), &cancel).await.unwrap();

        let tasks = repository.get_active(&cancel).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id(), active.id());
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_filter_by_an_inclusive_timer_range(before_each: BeforeEachReturn) {
        let (_, repository) = before_each;
        let cancel = CancellationToken::new();
        for (name, ms) in [("slow", 3000), ("fast", 500), ("medium", 1500), ("huge", 9000)] {
            repository.add(new_sample_task(name, ms), &cancel).await.unwrap();
        }

        let timers: Vec<_> = repository
            .get_by_timer_range(timer(500), timer(3000), &cancel)
            .await
            .unwrap()
            .iter()
            .map(|task| task.timer().value())
            .collect();
        assert_eq!(timers, vec![500, 1500, 3000]);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_update_the_timer(before_each: BeforeEachReturn) {
        let (_, repository) = before_each;
        let cancel = CancellationToken::new();
        let task = repository.add(new_sample_task("demo-task", 1000), &cancel).await.unwrap();

        repository
            .update_timer(task.id(), timer(2000), &cancel)
            .await
            .unwrap();

        let fetched = repository.get_by_id(task.id(), &cancel).await.unwrap();
        assert_eq!(fetched.timer().value(), 2000);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_delete_a_task(before_each: BeforeEachReturn) {
        let (_, repository) = before_each;
        let cancel = CancellationToken::new();
        let task = repository.add(new_sample_task("demo-task", 1000), &cancel).await.unwrap();

        repository.delete(task.id(), &cancel).await.unwrap();

        assert!(!repository.exists(task.id(), &cancel).await.unwrap());
        assert_eq!(
            repository.delete(task.id(), &cancel).await,
            Err(RepositoryError::NotFound { id: task.id() })
        );
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_ride_out_transient_store_failures(before_each: BeforeEachReturn) {
        let (client, repository) = before_each;
        let cancel = CancellationToken::new();
        client.fail_next(2);

        let added = repository
            .add(new_sample_task("demo-task", 1000), &cancel)
            .await
            .unwrap();

        assert!(repository.exists(added.id(), &cancel).await.unwrap());
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_give_up_while_the_store_is_offline(before_each: BeforeEachReturn) {
        let (client, repository) = before_each;
        client.toggle_offline();

        let result = repository
            .add(new_sample_task("demo-task", 1000), &CancellationToken::new())
            .await;

        assert!(matches!(
            result,
            Err(RepositoryError::Database(DatabaseError::RetriesExhausted {
                attempts: 3,
                ..
            }))
        ));
        client.toggle_offline();
        assert!(
            repository
                .get_all(&CancellationToken::new())
                .await
                .unwrap()
                .is_empty()
        );
    }
}
