use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::CoreError;
use crate::models::{
    Assignment, Event, Filter, NewAssignment, NewEvent, NewTodo, OccurrenceException, Template,
    TemplateChanges, TemplateKind, Todo,
};
use crate::mutation::StorageWrite;

pub mod exceptions;
pub mod templates;

/// Template CRUD, one storage call per user action.
#[async_trait]
pub trait TemplateRepository {
    async fn add_event(&self, data: NewEvent) -> Result<Event, CoreError>;
    async fn add_todo(&self, data: NewTodo) -> Result<Todo, CoreError>;
    async fn add_assignment(&self, data: NewAssignment) -> Result<Assignment, CoreError>;
    async fn find_template(
        &self,
        kind: TemplateKind,
        id: Uuid,
    ) -> Result<Option<Template>, CoreError>;
    async fn list_templates(&self, filters: &[Filter]) -> Result<Vec<Template>, CoreError>;
    async fn update_template(
        &self,
        kind: TemplateKind,
        id: Uuid,
        changes: TemplateChanges,
    ) -> Result<Template, CoreError>;
    /// Removes the template row and every exception referencing it, in one
    /// transaction.
    async fn delete_template(&self, kind: TemplateKind, id: Uuid) -> Result<(), CoreError>;
}

/// Exception storage keyed by `(parent_kind, parent_id, date)`.
#[async_trait]
pub trait ExceptionRepository {
    /// Last write wins on key collision; never duplicates.
    async fn upsert_exception(
        &self,
        exception: OccurrenceException,
    ) -> Result<OccurrenceException, CoreError>;
    async fn find_exceptions_for(
        &self,
        kind: TemplateKind,
        id: Uuid,
    ) -> Result<Vec<OccurrenceException>, CoreError>;
    async fn find_all_exceptions(&self) -> Result<Vec<OccurrenceException>, CoreError>;
    async fn delete_exception(
        &self,
        kind: TemplateKind,
        id: Uuid,
        date: NaiveDate,
    ) -> Result<(), CoreError>;
    async fn delete_exceptions_for(&self, kind: TemplateKind, id: Uuid)
        -> Result<u64, CoreError>;
}

/// Composed storage surface consumed by callers; also executes routed
/// write plans.
#[async_trait]
pub trait Repository: TemplateRepository + ExceptionRepository {
    async fn apply_writes(&self, writes: Vec<StorageWrite>) -> Result<(), CoreError> {
        for write in writes {
            match write {
                StorageWrite::UpdateTemplate { kind, id, changes } => {
                    self.update_template(kind, id, changes).await?;
                }
                StorageWrite::DeleteTemplate { kind, id } => {
                    self.delete_template(kind, id).await?;
                }
                StorageWrite::UpsertException(exception) => {
                    self.upsert_exception(exception).await?;
                }
                StorageWrite::DeleteException { kind, id, date } => {
                    self.delete_exception(kind, id, date).await?;
                }
            }
        }
        Ok(())
    }
}

/// SQLite implementation over an sqlx pool.
pub struct SqliteRepository {
    pool: DbPool,
}

impl SqliteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl Repository for SqliteRepository {}
