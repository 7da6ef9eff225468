use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{ExceptionKind, OccurrenceException, TemplateKind};
use crate::repository::{SqliteRepository, TemplateRepository};

/// Raw row shape; `overrides` travels as a JSON text column.
#[derive(Debug, FromRow)]
struct ExceptionRow {
    parent_kind: TemplateKind,
    parent_id: Uuid,
    exception_date: NaiveDate,
    exception_kind: ExceptionKind,
    overrides: Option<String>,
    created_at: DateTime<Utc>,
}

impl ExceptionRow {
    fn into_exception(self) -> Result<OccurrenceException, CoreError> {
        let overrides = match self.overrides {
            Some(json) => Some(serde_json::from_str(&json)?),
            None => None,
        };
        Ok(OccurrenceException {
            parent_kind: self.parent_kind,
            parent_id: self.parent_id,
            date: self.exception_date,
            kind: self.exception_kind,
            overrides,
            created_at: self.created_at,
        })
    }
}

#[async_trait]
impl super::ExceptionRepository for SqliteRepository {
    async fn upsert_exception(
        &self,
        exception: OccurrenceException,
    ) -> Result<OccurrenceException, CoreError> {
        let template = self
            .find_template(exception.parent_kind, exception.parent_id)
            .await?
            .ok_or_else(|| {
                CoreError::NotFound(format!(
                    "{} {}",
                    exception.parent_kind, exception.parent_id
                ))
            })?;
        // Exceptions are meaningless without a series.
        if !template.is_recurring() {
            return Err(CoreError::InvalidInput(
                "exceptions can only be recorded against a recurring template".to_string(),
            ));
        }

        match exception.kind {
            ExceptionKind::Modified => {
                if exception.overrides.as_ref().map_or(true, |o| o.is_empty()) {
                    return Err(CoreError::InvalidInput(
                        "a modified exception requires field overrides".to_string(),
                    ));
                }
            }
            ExceptionKind::Skipped | ExceptionKind::Completed => {
                if exception.overrides.is_some() {
                    return Err(CoreError::InvalidInput(format!(
                        "a {} exception cannot carry overrides",
                        exception.kind
                    )));
                }
            }
        }

        let overrides_json = exception
            .overrides
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            r#"INSERT INTO occurrence_exceptions (parent_kind, parent_id, exception_date, exception_kind, overrides, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (parent_kind, parent_id, exception_date) DO UPDATE SET
                exception_kind = excluded.exception_kind,
                overrides = excluded.overrides,
                created_at = excluded.created_at"#,
        )
        .bind(exception.parent_kind)
        .bind(exception.parent_id)
        .bind(exception.date)
        .bind(exception.kind)
        .bind(overrides_json)
        .bind(exception.created_at)
        .execute(self.pool())
        .await?;

        Ok(exception)
    }

    async fn find_exceptions_for(
        &self,
        kind: TemplateKind,
        id: Uuid,
    ) -> Result<Vec<OccurrenceException>, CoreError> {
        let rows: Vec<ExceptionRow> = sqlx::query_as(
            r#"SELECT * FROM occurrence_exceptions
            WHERE parent_kind = $1 AND parent_id = $2
            ORDER BY exception_date"#,
        )
        .bind(kind)
        .bind(id)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(ExceptionRow::into_exception).collect()
    }

    async fn find_all_exceptions(&self) -> Result<Vec<OccurrenceException>, CoreError> {
        let rows: Vec<ExceptionRow> = sqlx::query_as(
            "SELECT * FROM occurrence_exceptions ORDER BY parent_kind, parent_id, exception_date",
        )
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(ExceptionRow::into_exception).collect()
    }

    async fn delete_exception(
        &self,
        kind: TemplateKind,
        id: Uuid,
        date: NaiveDate,
    ) -> Result<(), CoreError> {
        let result = sqlx::query(
            r#"DELETE FROM occurrence_exceptions
            WHERE parent_kind = $1 AND parent_id = $2 AND exception_date = $3"#,
        )
        .bind(kind)
        .bind(id)
        .bind(date)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!(
                "no exception for {} {} on {}",
                kind, id, date
            )));
        }
        Ok(())
    }

    async fn delete_exceptions_for(
        &self,
        kind: TemplateKind,
        id: Uuid,
    ) -> Result<u64, CoreError> {
        let result = sqlx::query(
            "DELETE FROM occurrence_exceptions WHERE parent_kind = $1 AND parent_id = $2",
        )
        .bind(kind)
        .bind(id)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected())
    }
}
