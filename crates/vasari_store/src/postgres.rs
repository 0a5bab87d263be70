//! PostgreSQL implementation of the workflow store.

use crate::models::{
    ApprovalRow, PublicationRow, ResearchSessionRow, ScriptRow, VideoTaskRow, WorkflowRow,
};
use crate::{StageTransition, WorkflowStore, schema};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use uuid::Uuid;
use vasari_core::{
    ApprovalStatus, Engagement, PublicationRecord, ResearchSession, ScriptGeneration,
    VideoGenerationTask, WorkflowApproval, WorkflowExecution, WorkflowFilter, WorkflowStatus,
};
use vasari_error::{
    StaleStateError, StaleStateErrorKind, StoreError, StoreErrorKind, ValidationError,
    VasariResult,
};

/// Migrations embedded at compile time, applied with
/// [`PostgresWorkflowStore::run_migrations`].
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Build an r2d2 connection pool for the given database URL.
///
/// # Errors
///
/// Returns an error if the pool cannot establish its initial connection.
pub fn establish_pool(database_url: &str) -> VasariResult<Pool<ConnectionManager<PgConnection>>> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder()
        .build(manager)
        .map_err(|e| StoreError::new(StoreErrorKind::Connection(e.to_string())).into())
}

/// Diesel-backed [`WorkflowStore`] over a PostgreSQL connection pool.
///
/// Stage transitions are single status-guarded `UPDATE` statements; the
/// one-outstanding-video-task invariant is checked inside a transaction;
/// deleting a workflow relies on `ON DELETE CASCADE` from the aggregate
/// root.
pub struct PostgresWorkflowStore {
    pool: Pool<ConnectionManager<PgConnection>>,
}

impl PostgresWorkflowStore {
    /// Create a store over an existing pool.
    pub fn new(pool: Pool<ConnectionManager<PgConnection>>) -> Self {
        Self { pool }
    }

    /// Create a store from the `DATABASE_URL` environment variable.
    pub fn from_env() -> VasariResult<Self> {
        let database_url = std::env::var("DATABASE_URL").map_err(|_| {
            StoreError::new(StoreErrorKind::Connection(
                "DATABASE_URL environment variable not set".to_string(),
            ))
        })?;
        Ok(Self::new(establish_pool(&database_url)?))
    }

    /// Apply pending embedded migrations.
    pub fn run_migrations(&self) -> VasariResult<()> {
        let mut conn = self.conn()?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|e| StoreError::new(StoreErrorKind::Query(e.to_string())))?;
        Ok(())
    }

    fn conn(&self) -> VasariResult<PooledConnection<ConnectionManager<PgConnection>>> {
        self.pool
            .get()
            .map_err(|e| StoreError::new(StoreErrorKind::Connection(e.to_string())).into())
    }
}

#[async_trait]
impl WorkflowStore for PostgresWorkflowStore {
    async fn create_workflow(&self, workflow: &WorkflowExecution) -> VasariResult<()> {
        use schema::workflow_executions::dsl;
        let row = WorkflowRow::try_from(workflow)?;
        let mut conn = self.conn()?;
        diesel::insert_into(dsl::workflow_executions)
            .values(&row)
            .execute(&mut conn)
            .map_err(StoreError::from)?;
        Ok(())
    }

    async fn get_workflow(&self, id: Uuid) -> VasariResult<WorkflowExecution> {
        use schema::workflow_executions::dsl;
        let mut conn = self.conn()?;
        let row: Option<WorkflowRow> = dsl::workflow_executions
            .find(id)
            .first(&mut conn)
            .optional()
            .map_err(StoreError::from)?;
        row.ok_or_else(|| StoreError::not_found(format!("workflow {id}")).into())
            .and_then(WorkflowExecution::try_from)
    }

    async fn list_workflows(
        &self,
        filter: &WorkflowFilter,
    ) -> VasariResult<Vec<WorkflowExecution>> {
        use schema::workflow_executions::dsl;
        let mut conn = self.conn()?;

        let mut query = dsl::workflow_executions
            .order(dsl::started_at.desc())
            .into_boxed();
        if let Some(status) = filter.status {
            query = query.filter(dsl::status.eq(status.to_string()));
        }
        if let Some(owner) = &filter.owner {
            query = query.filter(dsl::owner.eq(owner.clone()));
        }
        if filter.limit > 0 {
            query = query.limit(filter.limit);
        }

        let rows: Vec<WorkflowRow> = query.load(&mut conn).map_err(StoreError::from)?;
        rows.into_iter().map(WorkflowExecution::try_from).collect()
    }

    async fn delete_workflow(&self, id: Uuid) -> VasariResult<()> {
        use schema::workflow_executions::dsl;
        let mut conn = self.conn()?;
        // Child rows go with the root via ON DELETE CASCADE.
        let deleted = diesel::delete(dsl::workflow_executions.find(id))
            .execute(&mut conn)
            .map_err(StoreError::from)?;
        if deleted == 0 {
            return Err(StoreError::not_found(format!("workflow {id}")).into());
        }
        Ok(())
    }

    async fn transition(
        &self,
        id: Uuid,
        from: WorkflowStatus,
        change: StageTransition,
    ) -> VasariResult<WorkflowExecution> {
        use schema::workflow_executions::dsl;

        if !from.can_transition_to(change.to) {
            return Err(ValidationError::new(format!(
                "no edge {from} -> {} in the workflow state graph",
                change.to
            ))
            .into());
        }

        let results_json = change.results.as_ref().map(crate::models::to_json).transpose()?;
        let completed_at = change.to.is_terminal().then(Utc::now);

        let mut conn = self.conn()?;
        let updated: Option<WorkflowRow> = diesel::update(
            dsl::workflow_executions
                .filter(dsl::id.eq(id))
                .filter(dsl::status.eq(from.to_string())),
        )
        .set((
            dsl::status.eq(change.to.to_string()),
            dsl::version.eq(dsl::version + 1),
            dsl::error_message.eq(change.error_message.clone()),
            dsl::results.eq(results_json),
            dsl::completed_at.eq(completed_at),
        ))
        .get_result(&mut conn)
        .optional()
        .map_err(StoreError::from)?;

        match updated {
            Some(row) => {
                tracing::debug!(
                    workflow_id = %id,
                    from = %from,
                    to = %change.to,
                    "Workflow transition"
                );
                WorkflowExecution::try_from(row)
            }
            None => {
                // Guard miss: report what the row actually holds.
                let found: Option<String> = dsl::workflow_executions
                    .find(id)
                    .select(dsl::status)
                    .first(&mut conn)
                    .optional()
                    .map_err(StoreError::from)?;
                match found {
                    Some(found) => Err(StaleStateError::new(
                        StaleStateErrorKind::TransitionConflict {
                            workflow_id: id.to_string(),
                            expected: from.to_string(),
                            found,
                        },
                    )
                    .into()),
                    None => Err(StoreError::not_found(format!("workflow {id}")).into()),
                }
            }
        }
    }

    async fn insert_research_session(&self, session: &ResearchSession) -> VasariResult<()> {
        use schema::research_sessions::dsl;
        let row = ResearchSessionRow::try_from(session)?;
        let mut conn = self.conn()?;
        diesel::insert_into(dsl::research_sessions)
            .values(&row)
            .execute(&mut conn)
            .map_err(StoreError::from)?;
        Ok(())
    }

    async fn update_research_session(&self, session: &ResearchSession) -> VasariResult<()> {
        use schema::research_sessions::dsl;
        let row = ResearchSessionRow::try_from(session)?;
        let mut conn = self.conn()?;
        let updated = diesel::update(dsl::research_sessions.find(session.id))
            .set(&row)
            .execute(&mut conn)
            .map_err(StoreError::from)?;
        if updated == 0 {
            return Err(StoreError::not_found(format!("research session {}", session.id)).into());
        }
        Ok(())
    }

    async fn research_session(&self, workflow_id: Uuid) -> VasariResult<Option<ResearchSession>> {
        use schema::research_sessions::dsl;
        let mut conn = self.conn()?;
        let row: Option<ResearchSessionRow> = dsl::research_sessions
            .filter(dsl::workflow_id.eq(workflow_id))
            .order(dsl::created_at.desc())
            .first(&mut conn)
            .optional()
            .map_err(StoreError::from)?;
        row.map(ResearchSession::try_from).transpose()
    }

    async fn insert_script(&self, script: &ScriptGeneration) -> VasariResult<()> {
        use schema::script_generations::dsl;
        let row = ScriptRow::from(script);
        let mut conn = self.conn()?;
        diesel::insert_into(dsl::script_generations)
            .values(&row)
            .execute(&mut conn)
            .map_err(StoreError::from)?;
        Ok(())
    }

    async fn latest_script(&self, workflow_id: Uuid) -> VasariResult<Option<ScriptGeneration>> {
        use schema::script_generations::dsl;
        let mut conn = self.conn()?;
        let row: Option<ScriptRow> = dsl::script_generations
            .filter(dsl::workflow_id.eq(workflow_id))
            .order(dsl::created_at.desc())
            .first(&mut conn)
            .optional()
            .map_err(StoreError::from)?;
        row.map(ScriptGeneration::try_from).transpose()
    }

    async fn insert_video_task(&self, task: &VideoGenerationTask) -> VasariResult<()> {
        use schema::video_generation_tasks::dsl;
        let row = VideoTaskRow::from(task);
        let mut conn = self.conn()?;

        conn.transaction::<_, vasari_error::VasariError, _>(|conn| {
            let outstanding: i64 = dsl::video_generation_tasks
                .filter(dsl::workflow_id.eq(task.workflow_id))
                .filter(dsl::status.ne_all(vec![
                    vasari_core::VideoTaskStatus::Completed.to_string(),
                    vasari_core::VideoTaskStatus::Failed.to_string(),
                ]))
                .count()
                .get_result(conn)?;
            if outstanding > 0 {
                return Err(StaleStateError::new(
                    StaleStateErrorKind::OutstandingVideoTask(task.workflow_id.to_string()),
                )
                .into());
            }
            diesel::insert_into(dsl::video_generation_tasks)
                .values(&row)
                .execute(conn)?;
            Ok(())
        })
    }

    async fn update_video_task(&self, task: &VideoGenerationTask) -> VasariResult<()> {
        use schema::video_generation_tasks::dsl;
        let row = VideoTaskRow::from(task);
        let mut conn = self.conn()?;
        let updated = diesel::update(dsl::video_generation_tasks.find(task.id))
            .set(&row)
            .execute(&mut conn)
            .map_err(StoreError::from)?;
        if updated == 0 {
            return Err(StoreError::not_found(format!("video task {}", task.id)).into());
        }
        Ok(())
    }

    async fn active_video_task(
        &self,
        workflow_id: Uuid,
    ) -> VasariResult<Option<VideoGenerationTask>> {
        use schema::video_generation_tasks::dsl;
        let mut conn = self.conn()?;
        let row: Option<VideoTaskRow> = dsl::video_generation_tasks
            .filter(dsl::workflow_id.eq(workflow_id))
            .filter(dsl::status.ne_all(vec![
                vasari_core::VideoTaskStatus::Completed.to_string(),
                vasari_core::VideoTaskStatus::Failed.to_string(),
            ]))
            .first(&mut conn)
            .optional()
            .map_err(StoreError::from)?;
        row.map(VideoGenerationTask::try_from).transpose()
    }

    async fn latest_video_task(
        &self,
        workflow_id: Uuid,
    ) -> VasariResult<Option<VideoGenerationTask>> {
        use schema::video_generation_tasks::dsl;
        let mut conn = self.conn()?;
        let row: Option<VideoTaskRow> = dsl::video_generation_tasks
            .filter(dsl::workflow_id.eq(workflow_id))
            .order(dsl::submitted_at.desc())
            .first(&mut conn)
            .optional()
            .map_err(StoreError::from)?;
        row.map(VideoGenerationTask::try_from).transpose()
    }

    async fn insert_approval(&self, approval: &WorkflowApproval) -> VasariResult<()> {
        use schema::workflow_approvals::dsl;
        let row = ApprovalRow::from(approval);
        let mut conn = self.conn()?;
        diesel::insert_into(dsl::workflow_approvals)
            .values(&row)
            .execute(&mut conn)
            .map_err(StoreError::from)?;
        Ok(())
    }

    async fn get_approval(&self, id: Uuid) -> VasariResult<WorkflowApproval> {
        use schema::workflow_approvals::dsl;
        let mut conn = self.conn()?;
        let row: Option<ApprovalRow> = dsl::workflow_approvals
            .find(id)
            .first(&mut conn)
            .optional()
            .map_err(StoreError::from)?;
        row.ok_or_else(|| StoreError::not_found(format!("approval {id}")).into())
            .and_then(WorkflowApproval::try_from)
    }

    async fn pending_approval(&self, workflow_id: Uuid) -> VasariResult<Option<WorkflowApproval>> {
        use schema::workflow_approvals::dsl;
        let mut conn = self.conn()?;
        let row: Option<ApprovalRow> = dsl::workflow_approvals
            .filter(dsl::workflow_id.eq(workflow_id))
            .filter(dsl::status.eq(ApprovalStatus::Pending.to_string()))
            .first(&mut conn)
            .optional()
            .map_err(StoreError::from)?;
        row.map(WorkflowApproval::try_from).transpose()
    }

    async fn resolve_approval(
        &self,
        id: Uuid,
        resolution: ApprovalStatus,
        approver: Option<String>,
        feedback: Option<String>,
        resolved_at: DateTime<Utc>,
    ) -> VasariResult<WorkflowApproval> {
        use schema::workflow_approvals::dsl;
        let mut conn = self.conn()?;

        let updated: Option<ApprovalRow> = diesel::update(
            dsl::workflow_approvals
                .filter(dsl::id.eq(id))
                .filter(dsl::status.eq(ApprovalStatus::Pending.to_string())),
        )
        .set((
            dsl::status.eq(resolution.to_string()),
            dsl::approver.eq(approver),
            dsl::feedback.eq(feedback),
            dsl::resolved_at.eq(Some(resolved_at)),
        ))
        .get_result(&mut conn)
        .optional()
        .map_err(StoreError::from)?;

        match updated {
            Some(row) => WorkflowApproval::try_from(row),
            None => {
                let found: Option<String> = dsl::workflow_approvals
                    .find(id)
                    .select(dsl::status)
                    .first(&mut conn)
                    .optional()
                    .map_err(StoreError::from)?;
                match found {
                    Some(resolution) => Err(StaleStateError::new(
                        StaleStateErrorKind::AlreadyResolved {
                            approval_id: id.to_string(),
                            resolution,
                        },
                    )
                    .into()),
                    None => Err(StoreError::not_found(format!("approval {id}")).into()),
                }
            }
        }
    }

    async fn insert_publication(&self, record: &PublicationRecord) -> VasariResult<()> {
        use schema::publication_records::dsl;
        let row = PublicationRow::from(record);
        let mut conn = self.conn()?;
        diesel::insert_into(dsl::publication_records)
            .values(&row)
            .execute(&mut conn)
            .map_err(StoreError::from)?;
        Ok(())
    }

    async fn publications(&self, workflow_id: Uuid) -> VasariResult<Vec<PublicationRecord>> {
        use schema::publication_records::dsl;
        let mut conn = self.conn()?;
        let rows: Vec<PublicationRow> = dsl::publication_records
            .filter(dsl::workflow_id.eq(workflow_id))
            .load(&mut conn)
            .map_err(StoreError::from)?;
        rows.into_iter().map(PublicationRecord::try_from).collect()
    }

    async fn update_engagement(&self, id: Uuid, engagement: Engagement) -> VasariResult<()> {
        use schema::publication_records::dsl;
        let mut conn = self.conn()?;
        let updated = diesel::update(dsl::publication_records.find(id))
            .set((
                dsl::views.eq(engagement.views),
                dsl::likes.eq(engagement.likes),
                dsl::shares.eq(engagement.shares),
                dsl::comments.eq(engagement.comments),
            ))
            .execute(&mut conn)
            .map_err(StoreError::from)?;
        if updated == 0 {
            return Err(StoreError::not_found(format!("publication {id}")).into());
        }
        Ok(())
    }
}
