use agenda_core::expand::{expand, ExceptionIndex};
use agenda_core::models::{EditScope, Occurrence, Template, TemplateKind};
use agenda_core::recurrence::DateWindow;
use agenda_core::repository::{ExceptionRepository, SqliteRepository, TemplateRepository};
use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use dialoguer::Select;
use uuid::Uuid;

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| anyhow!("Invalid date '{}'. Expected YYYY-MM-DD.", raw))
}

/// Accepts RFC 3339 ("2026-02-02T09:00:00Z") or a local-naive
/// "YYYY-MM-DD HH:MM" treated as UTC.
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M")
        .map(|naive| naive.and_utc())
        .map_err(|_| {
            anyhow!(
                "Invalid instant '{}'. Expected RFC 3339 or 'YYYY-MM-DD HH:MM'.",
                raw
            )
        })
}

pub fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| anyhow!("'{}' is not a valid id.", raw))
}

/// Loads a template or fails with a user-facing message.
pub async fn require_template(
    repo: &SqliteRepository,
    kind: TemplateKind,
    id: Uuid,
) -> Result<Template> {
    repo.find_template(kind, id)
        .await?
        .ok_or_else(|| anyhow!("No {} with id '{}'.", kind, id))
}

/// Resolves the edit/delete scope: non-recurring templates are always
/// whole-template, recurring ones use `--scope` or fall back to an
/// interactive prompt.
pub fn resolve_scope(template: &Template, raw: Option<&str>) -> Result<EditScope> {
    if !template.is_recurring() {
        return Ok(EditScope::AllOccurrences);
    }
    match raw {
        Some(value) => Ok(value.parse()?),
        None => {
            let choice = Select::new()
                .with_prompt(format!("'{}' repeats. Apply to", template.title()))
                .items(&["This occurrence only", "All occurrences"])
                .default(0)
                .interact()?;
            Ok(match choice {
                0 => EditScope::ThisOccurrence,
                _ => EditScope::AllOccurrences,
            })
        }
    }
}

/// Expands a single template over a one-day window and returns the
/// occurrence keyed by `date`. Fails if the date is not part of the
/// series, or if it has been skipped.
pub async fn resolve_occurrence(
    repo: &SqliteRepository,
    template: &Template,
    date: NaiveDate,
) -> Result<Occurrence> {
    let end = date
        .succ_opt()
        .ok_or_else(|| anyhow!("Date '{}' is out of range.", date))?;
    let exceptions = ExceptionIndex::from_rows(
        repo.find_exceptions_for(template.kind(), template.id()).await?,
    );
    expand(
        std::slice::from_ref(template),
        &exceptions,
        DateWindow::new(date, end),
    )
    .into_iter()
    .find(|occurrence| occurrence.date == date)
    .ok_or_else(|| anyhow!("'{}' has no occurrence on {}.", template.title(), date))
}
