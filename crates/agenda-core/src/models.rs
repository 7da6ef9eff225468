use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::error::CoreError;

/// How a template repeats. `None` means the record is a single instance.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekly,
    Biweekly,
    Monthly,
}

impl Recurrence {
    pub fn is_recurring(&self) -> bool {
        !matches!(self, Recurrence::None)
    }
}

impl std::fmt::Display for Recurrence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Recurrence::None => write!(f, "none"),
            Recurrence::Daily => write!(f, "daily"),
            Recurrence::Weekly => write!(f, "weekly"),
            Recurrence::Biweekly => write!(f, "biweekly"),
            Recurrence::Monthly => write!(f, "monthly"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid recurrence rule: {0}")]
pub struct ParseRecurrenceError(String);

impl FromStr for Recurrence {
    type Err = ParseRecurrenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Recurrence::None),
            "daily" => Ok(Recurrence::Daily),
            "weekly" => Ok(Recurrence::Weekly),
            "biweekly" => Ok(Recurrence::Biweekly),
            "monthly" => Ok(Recurrence::Monthly),
            _ => Err(ParseRecurrenceError(s.to_string())),
        }
    }
}

/// Tag identifying which template table a record (or exception) belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    Event,
    Todo,
    Assignment,
}

impl std::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateKind::Event => write!(f, "event"),
            TemplateKind::Todo => write!(f, "todo"),
            TemplateKind::Assignment => write!(f, "assignment"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid template kind: {0}")]
pub struct ParseTemplateKindError(String);

impl FromStr for TemplateKind {
    type Err = ParseTemplateKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "event" => Ok(TemplateKind::Event),
            "todo" => Ok(TemplateKind::Todo),
            "assignment" => Ok(TemplateKind::Assignment),
            _ => Err(ParseTemplateKindError(s.to_string())),
        }
    }
}

/// A calendar event. The anchor is the calendar date of `starts_at`;
/// events carry no completion state.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub calendar_id: Option<Uuid>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub recurrence: Recurrence,
    pub recurrence_until: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A to-do item. The due date is optional; an undated todo never appears
/// in calendar expansion.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Todo {
    pub id: Uuid,
    pub title: String,
    pub notes: Option<String>,
    pub course: Option<String>,
    pub due_on: Option<NaiveDate>,
    pub completed: bool,
    pub recurrence: Recurrence,
    pub recurrence_until: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A course assignment. Always dated.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Assignment {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub course: Option<String>,
    pub due_on: NaiveDate,
    pub completed: bool,
    pub recurrence: Recurrence,
    pub recurrence_until: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Tagged union over the three template kinds. The accessors below expose
/// the handful of fields the recurrence engine needs, so one expansion
/// algorithm serves all three shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Template {
    Event(Event),
    Todo(Todo),
    Assignment(Assignment),
}

impl Template {
    pub fn id(&self) -> Uuid {
        match self {
            Template::Event(e) => e.id,
            Template::Todo(t) => t.id,
            Template::Assignment(a) => a.id,
        }
    }

    pub fn kind(&self) -> TemplateKind {
        match self {
            Template::Event(_) => TemplateKind::Event,
            Template::Todo(_) => TemplateKind::Todo,
            Template::Assignment(_) => TemplateKind::Assignment,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Template::Event(e) => &e.title,
            Template::Todo(t) => &t.title,
            Template::Assignment(a) => &a.title,
        }
    }

    /// Calendar date the record was originally scheduled for. For events
    /// this is the UTC calendar date of the start instant; comparisons in
    /// the engine are day-granular throughout.
    pub fn anchor_date(&self) -> Option<NaiveDate> {
        match self {
            Template::Event(e) => Some(e.starts_at.date_naive()),
            Template::Todo(t) => t.due_on,
            Template::Assignment(a) => Some(a.due_on),
        }
    }

    pub fn recurrence(&self) -> Recurrence {
        match self {
            Template::Event(e) => e.recurrence,
            Template::Todo(t) => t.recurrence,
            Template::Assignment(a) => a.recurrence,
        }
    }

    pub fn recurrence_until(&self) -> Option<NaiveDate> {
        match self {
            Template::Event(e) => e.recurrence_until,
            Template::Todo(t) => t.recurrence_until,
            Template::Assignment(a) => a.recurrence_until,
        }
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence().is_recurring()
    }

    /// The template's own completion flag. Only meaningful for
    /// non-recurring todos and assignments; events are never "completed".
    pub fn completed(&self) -> bool {
        match self {
            Template::Event(_) => false,
            Template::Todo(t) => t.completed,
            Template::Assignment(a) => a.completed,
        }
    }

    /// Merges a per-date override set into this template. Fields that do
    /// not exist on the kind are ignored; the recurrence pattern cannot be
    /// touched here (`FieldOverrides` has no recurrence fields).
    pub fn apply_overrides(&mut self, overrides: &FieldOverrides) {
        match self {
            Template::Event(e) => {
                if let Some(title) = &overrides.title {
                    e.title = title.clone();
                }
                if let Some(description) = &overrides.description {
                    e.description = Some(description.clone());
                }
                if let Some(calendar_id) = overrides.calendar_id {
                    e.calendar_id = Some(calendar_id);
                }
                if let Some(starts_at) = overrides.starts_at {
                    e.starts_at = starts_at;
                }
                if let Some(ends_at) = overrides.ends_at {
                    e.ends_at = ends_at;
                }
            }
            Template::Todo(t) => {
                if let Some(title) = &overrides.title {
                    t.title = title.clone();
                }
                if let Some(description) = &overrides.description {
                    t.notes = Some(description.clone());
                }
                if let Some(course) = &overrides.course {
                    t.course = Some(course.clone());
                }
                if let Some(due_on) = overrides.due_on {
                    t.due_on = Some(due_on);
                }
            }
            Template::Assignment(a) => {
                if let Some(title) = &overrides.title {
                    a.title = title.clone();
                }
                if let Some(description) = &overrides.description {
                    a.description = Some(description.clone());
                }
                if let Some(course) = &overrides.course {
                    a.course = Some(course.clone());
                }
                if let Some(due_on) = overrides.due_on {
                    a.due_on = due_on;
                }
            }
        }
    }

    /// Applies a whole-series edit, including recurrence changes. Used by
    /// the "all occurrences" path; per-occurrence edits go through
    /// `apply_overrides` instead.
    pub fn apply_changes(&mut self, changes: &TemplateChanges) {
        self.apply_overrides(&changes.clone().into_overrides());
        match self {
            Template::Event(e) => {
                if let Some(recurrence) = changes.recurrence {
                    e.recurrence = recurrence;
                }
                if let Some(until) = changes.recurrence_until {
                    e.recurrence_until = until;
                }
                if !e.recurrence.is_recurring() {
                    e.recurrence_until = None;
                }
                e.updated_at = Utc::now();
            }
            Template::Todo(t) => {
                if let Some(completed) = changes.completed {
                    t.completed = completed;
                }
                if let Some(recurrence) = changes.recurrence {
                    t.recurrence = recurrence;
                }
                if let Some(until) = changes.recurrence_until {
                    t.recurrence_until = until;
                }
                if !t.recurrence.is_recurring() {
                    t.recurrence_until = None;
                }
                t.updated_at = Utc::now();
            }
            Template::Assignment(a) => {
                if let Some(completed) = changes.completed {
                    a.completed = completed;
                }
                if let Some(recurrence) = changes.recurrence {
                    a.recurrence = recurrence;
                }
                if let Some(until) = changes.recurrence_until {
                    a.recurrence_until = until;
                }
                if !a.recurrence.is_recurring() {
                    a.recurrence_until = None;
                }
                a.updated_at = Utc::now();
            }
        }
    }

    /// Checks the recurrence configuration invariant: a rule other than
    /// `none` requires both an until date and an anchor date. Enforced at
    /// the storage boundary, never re-checked inside the evaluator.
    pub fn validate_recurrence(&self) -> Result<(), CoreError> {
        validate_recurrence_config(self.recurrence(), self.recurrence_until(), self.anchor_date())
    }
}

pub fn validate_recurrence_config(
    recurrence: Recurrence,
    until: Option<NaiveDate>,
    anchor: Option<NaiveDate>,
) -> Result<(), CoreError> {
    if !recurrence.is_recurring() {
        return Ok(());
    }
    let anchor = anchor.ok_or_else(|| {
        CoreError::InvalidRecurrence("a recurring item needs a date to repeat from".to_string())
    })?;
    let until = until.ok_or_else(|| {
        CoreError::InvalidRecurrence(format!("a {} rule requires an end date", recurrence))
    })?;
    if until < anchor {
        return Err(CoreError::InvalidRecurrence(format!(
            "end date {} is before the first occurrence {}",
            until, anchor
        )));
    }
    Ok(())
}

/// Kinds of per-date deviation from a recurring template's pattern.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ExceptionKind {
    /// Hide this occurrence entirely.
    Skipped,
    /// Replace some of the template's fields for this date only.
    Modified,
    /// Mark this occurrence done without touching the template.
    Completed,
}

impl std::fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExceptionKind::Skipped => write!(f, "skipped"),
            ExceptionKind::Modified => write!(f, "modified"),
            ExceptionKind::Completed => write!(f, "completed"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid exception kind: {0}")]
pub struct ParseExceptionKindError(String);

impl FromStr for ExceptionKind {
    type Err = ParseExceptionKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "skipped" => Ok(ExceptionKind::Skipped),
            "modified" => Ok(ExceptionKind::Modified),
            "completed" => Ok(ExceptionKind::Completed),
            _ => Err(ParseExceptionKindError(s.to_string())),
        }
    }
}

/// Partial field set carried by a `modified` exception. Structurally
/// cannot change `recurrence`/`recurrence_until`: exceptions never alter
/// the series pattern. Persisted as a JSON column.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FieldOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_on: Option<NaiveDate>,
}

impl FieldOverrides {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.course.is_none()
            && self.calendar_id.is_none()
            && self.starts_at.is_none()
            && self.ends_at.is_none()
            && self.due_on.is_none()
    }

    /// The date this override moves the occurrence to, if it touches the
    /// kind's date-bearing field. This only changes where the occurrence
    /// is displayed; the exception stays keyed to the series date.
    pub fn effective_date(&self, kind: TemplateKind) -> Option<NaiveDate> {
        match kind {
            TemplateKind::Event => self.starts_at.map(|dt| dt.date_naive()),
            TemplateKind::Todo | TemplateKind::Assignment => self.due_on,
        }
    }
}

/// Composite natural key for exceptions: at most one exception exists per
/// template per occurrence date.
pub type ExceptionKey = (TemplateKind, Uuid, NaiveDate);

/// A persisted, date-scoped deviation from a recurring template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OccurrenceException {
    pub parent_kind: TemplateKind,
    pub parent_id: Uuid,
    /// The series date this exception is keyed to.
    pub date: NaiveDate,
    pub kind: ExceptionKind,
    /// Present only for `Modified` exceptions.
    pub overrides: Option<FieldOverrides>,
    pub created_at: DateTime<Utc>,
}

impl OccurrenceException {
    pub fn skipped(parent_kind: TemplateKind, parent_id: Uuid, date: NaiveDate) -> Self {
        Self {
            parent_kind,
            parent_id,
            date,
            kind: ExceptionKind::Skipped,
            overrides: None,
            created_at: Utc::now(),
        }
    }

    pub fn completed(parent_kind: TemplateKind, parent_id: Uuid, date: NaiveDate) -> Self {
        Self {
            parent_kind,
            parent_id,
            date,
            kind: ExceptionKind::Completed,
            overrides: None,
            created_at: Utc::now(),
        }
    }

    pub fn modified(
        parent_kind: TemplateKind,
        parent_id: Uuid,
        date: NaiveDate,
        overrides: FieldOverrides,
    ) -> Self {
        Self {
            parent_kind,
            parent_id,
            date,
            kind: ExceptionKind::Modified,
            overrides: Some(overrides),
            created_at: Utc::now(),
        }
    }

    pub fn key(&self) -> ExceptionKey {
        (self.parent_kind, self.parent_id, self.date)
    }
}

/// One concrete date-bound instance implied by a template, with any
/// `modified` overrides already merged in. Derived during expansion,
/// never persisted.
#[derive(Debug, Clone)]
pub struct Occurrence {
    /// The owning template, with overrides applied for this date.
    pub template: Template,
    /// The series key date: identity for exception lookups and routing.
    pub date: NaiveDate,
    /// Where the occurrence is displayed. Differs from `date` only when a
    /// `modified` exception overrides the date-bearing field.
    pub display_date: NaiveDate,
    /// True when this is a generated repeat rather than the literal
    /// stored row.
    pub is_virtual: bool,
    pub exception: Option<OccurrenceException>,
}

impl Occurrence {
    /// Completion state per the resolver contract: non-recurring items
    /// read the template; recurring occurrences are complete exactly when
    /// a `completed` exception exists on their date, except that the
    /// literal anchor occurrence with no exception still reads the
    /// template's own flag.
    pub fn is_completed(&self) -> bool {
        if !self.template.is_recurring() {
            return self.template.completed();
        }
        match &self.exception {
            Some(exception) => exception.kind == ExceptionKind::Completed,
            None if !self.is_virtual => self.template.completed(),
            None => false,
        }
    }
}

/// Scope of an edit or delete on one occurrence of a recurring template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditScope {
    /// Record a per-date exception; the template is untouched.
    ThisOccurrence,
    /// Mutate or remove the template, affecting every date.
    AllOccurrences,
}

impl std::fmt::Display for EditScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditScope::ThisOccurrence => write!(f, "this"),
            EditScope::AllOccurrences => write!(f, "all"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid edit scope: {0}")]
pub struct ParseEditScopeError(String);

impl FromStr for EditScope {
    type Err = ParseEditScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "this" | "occurrence" => Ok(EditScope::ThisOccurrence),
            "all" | "series" => Ok(EditScope::AllOccurrences),
            _ => Err(ParseEditScopeError(s.to_string())),
        }
    }
}

// ============================================================================
// Data transfer objects
// ============================================================================

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub calendar_id: Option<Uuid>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub recurrence: Recurrence,
    pub recurrence_until: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct NewTodo {
    pub title: String,
    pub notes: Option<String>,
    pub course: Option<String>,
    pub due_on: Option<NaiveDate>,
    pub recurrence: Recurrence,
    pub recurrence_until: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub title: String,
    pub description: Option<String>,
    pub course: Option<String>,
    pub due_on: NaiveDate,
    pub recurrence: Recurrence,
    pub recurrence_until: Option<NaiveDate>,
}

/// An edit as submitted by the caller. The mutation router decides whether
/// this becomes a template update or a per-date exception; fields that do
/// not exist on the target kind are ignored.
#[derive(Debug, Clone, Default)]
pub struct TemplateChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub course: Option<String>,
    pub calendar_id: Option<Uuid>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub due_on: Option<NaiveDate>,
    pub completed: Option<bool>,
    pub recurrence: Option<Recurrence>,
    pub recurrence_until: Option<Option<NaiveDate>>,
}

impl TemplateChanges {
    /// Reduces an edit to the per-date override set: the series pattern
    /// and the completion flag never travel through a `modified`
    /// exception.
    pub fn into_overrides(self) -> FieldOverrides {
        FieldOverrides {
            title: self.title,
            description: self.description,
            course: self.course,
            calendar_id: self.calendar_id,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            due_on: self.due_on,
        }
    }

    pub fn touches_pattern(&self) -> bool {
        self.recurrence.is_some() || self.recurrence_until.is_some()
    }
}

/// Filters for listing templates.
#[derive(Debug, Clone)]
pub enum Filter {
    Kind(TemplateKind),
    Course(String),
    Completed(bool),
}
