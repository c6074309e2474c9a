use crate::modules::sample_tasks::core::repository::{
    RepositoryError, SampleTaskRepository, ensure_range,
};
use crate::modules::sample_tasks::core::sample_task::{NewSampleTask, SampleTask};
use crate::modules::sample_tasks::core::value_objects::{
    DomainError, SampleTaskId, TaskName, TimerInMilliseconds,
};
use crate::shared::infrastructure::database::sql::SqlBackend;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS sample_tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    timer_in_milliseconds INTEGER NOT NULL,
    is_enabled BOOLEAN NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NULL
)";

const SELECT_COLUMNS: &str =
    "SELECT id, name, timer_in_milliseconds, is_enabled, created_at, updated_at FROM sample_tasks";

const SELECT_BY_ID: &str = "SELECT id, name, timer_in_milliseconds, is_enabled, created_at, \
                            updated_at FROM sample_tasks WHERE id = ?";

#[derive(Debug, sqlx::FromRow)]
struct SampleTaskRow {
    id: i64,
    name: String,
    timer_in_milliseconds: i64,
    is_enabled: bool,
    created_at: i64,
    updated_at: Option<i64>,
}

impl TryFrom<SampleTaskRow> for SampleTask {
    type Error = RepositoryError;

    fn try_from(row: SampleTaskRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |error: DomainError| {
            RepositoryError::Mapping(format!("sample_tasks row {id}: {error}"))
        };
        SampleTask::reconstruct(
            SampleTaskId::new(row.id).map_err(corrupt)?,
            TaskName::new(&row.name).map_err(corrupt)?,
            TimerInMilliseconds::new(row.timer_in_milliseconds).map_err(corrupt)?,
            row.is_enabled,
            row.created_at,
            row.updated_at,
        )
        .map_err(corrupt)
    }
}

fn into_tasks(rows: Vec<SampleTaskRow>) -> Result<Vec<SampleTask>, RepositoryError> {
    rows.into_iter().map(SampleTask::try_from).collect()
}

#[derive(Clone)]
pub struct SqlSampleTaskRepository {
    backend: SqlBackend,
}

impl SqlSampleTaskRepository {
    pub fn new(backend: SqlBackend) -> Self {
        Self { backend }
    }

    pub async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        self.backend
            .adapter(&CancellationToken::new())
            .execute_with_retry(|connection| {
                Box::pin(async move {
                    sqlx::query(CREATE_TABLE)
                        .execute(connection)
                        .await
                        .map(|_| ())
                })
            })
            .await?;
        tracing::info!("sample_tasks schema ready");
        Ok(())
    }

    async fn fetch_many(
        &self,
        sql: String,
        binds: Vec<i64>,
        cancel: &CancellationToken,
    ) -> Result<Vec<SampleTask>, RepositoryError> {
        let rows = self
            .backend
            .adapter(cancel)
            .execute_with_retry(|connection| {
                let sql = sql.clone();
                let binds = binds.clone();
                Box::pin(async move {
                    let mut query = sqlx::query_as::<_, SampleTaskRow>(&sql);
                    for value in binds {
                        query = query.bind(value);
                    }
                    query.fetch_all(connection).await
                })
            })
            .await?;
        into_tasks(rows)
    }
}

#[async_trait]
impl SampleTaskRepository for SqlSampleTaskRepository {
    async fn get_by_id(
        &self,
        id: SampleTaskId,
        cancel: &CancellationToken,
    ) -> Result<SampleTask, RepositoryError> {
        let row = self
            .backend
            .adapter(cancel)
            .execute_with_retry(|connection| {
                Box::pin(async move {
                    sqlx::query_as::<_, SampleTaskRow>(SELECT_BY_ID)
                        .bind(id.value())
                        .fetch_optional(connection)
                        .await
                })
            })
            .await?;
        row.ok_or(RepositoryError::NotFound { id })?.try_into()
    }

    async fn get_all(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<SampleTask>, RepositoryError> {
        self.fetch_many(
            format!("{SELECT_COLUMNS} ORDER BY created_at DESC, id DESC"),
            Vec::new(),
            cancel,
        )
        .await
    }

    async fn get_active(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<SampleTask>, RepositoryError> {
        self.fetch_many(
            format!(
                "{SELECT_COLUMNS} WHERE is_enabled = 1 AND timer_in_milliseconds > 0 \
                 ORDER BY created_at DESC, id DESC"
            ),
            Vec::new(),
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
        self.fetch_many(
            format!(
                "{SELECT_COLUMNS} WHERE timer_in_milliseconds BETWEEN ? AND ? \
                 ORDER BY timer_in_milliseconds ASC, id ASC"
            ),
            vec![min.value(), max.value()],
            cancel,
        )
        .await
    }

    async fn add(
        &self,
        task: NewSampleTask,
        cancel: &CancellationToken,
    ) -> Result<SampleTask, RepositoryError> {
        let id = self
            .backend
            .adapter(cancel)
            .execute_async(
                |connection| {
                    let name = task.name().as_str().to_string();
                    let timer = task.timer().value();
                    let enabled = task.is_enabled();
                    let created_at = task.created_at();
                    Box::pin(async move {
                        sqlx::query_scalar::<_, i64>(
                            "INSERT INTO sample_tasks \
                             (name, timer_in_milliseconds, is_enabled, created_at, updated_at) \
                             VALUES (?, ?, ?, ?, NULL) RETURNING id",
                        )
                        .bind(name)
                        .bind(timer)
                        .bind(enabled)
                        .bind(created_at)
                        .fetch_one(connection)
                        .await
                    })
                },
                true,
            )
            .await?;

        let id = SampleTaskId::new(id)
            .map_err(|error| RepositoryError::Mapping(format!("generated id {id}: {error}")))?;
        tracing::debug!(%id, "sample task inserted");
        Ok(task.into_persisted(id))
    }

    async fn update(
        &self,
        task: &SampleTask,
        cancel: &CancellationToken,
    ) -> Result<(), RepositoryError> {
        let id = task.id();
        let affected = self
            .backend
            .adapter(cancel)
            .execute_async(
                |connection| {
                    let name = task.name().as_str().to_string();
                    let timer = task.timer().value();
                    let enabled = task.is_enabled();
                    let updated_at = task.updated_at();
                    Box::pin(async move {
                        sqlx::query(
                            "UPDATE sample_tasks SET name = ?, timer_in_milliseconds = ?, \
                             is_enabled = ?, updated_at = ? WHERE id = ?",
                        )
                        .bind(name)
                        .bind(timer)
                        .bind(enabled)
                        .bind(updated_at)
                        .bind(id.value())
                        .execute(connection)
                        .await
                        .map(|result| result.rows_affected())
                    })
                },
                true,
            )
            .await?;

        if affected == 0 {
            return Err(RepositoryError::NotFound { id });
        }
        Ok(())
    }

    async fn delete(
        &self,
        id: SampleTaskId,
        cancel: &CancellationToken,
    ) -> Result<(), RepositoryError> {
        let affected = self
            .backend
            .adapter(cancel)
            .execute_async(
                |connection| {
                    Box::pin(async move {
                        sqlx::query("DELETE FROM sample_tasks WHERE id = ?")
                            .bind(id.value())
                            .execute(connection)
                            .await
                            .map(|result| result.rows_affected())
                    })
                },
                true,
            )
            .await?;

        if affected == 0 {
            return Err(RepositoryError::NotFound { id });
        }
        Ok(())
    }

    async fn exists(
        &self,
        id: SampleTaskId,
        cancel: &CancellationToken,
    ) -> Result<bool, RepositoryError> {
        let found = self
            .backend
            .adapter(cancel)
            .execute_with_retry(|connection| {
                Box::pin(async move {
                    sqlx::query_scalar::<_, i64>(
                        "SELECT EXISTS(SELECT 1 FROM sample_tasks WHERE id = ?)",
                    )
                    .bind(id.value())
                    .fetch_one(connection)
                    .await
                })
            })
            .await?;
        Ok(found != 0)
    }
}
