//! # Agenda Core
//!
//! Library for a personal planner (calendar events, to-dos, course
//! assignments) built around a template/instance data model: a handful of
//! stored template records, each optionally carrying a recurrence rule,
//! are expanded on demand into the concrete occurrences visible in a date
//! window, with a side table of per-date exceptions reconciled in.
//!
//! ## Core Modules
//!
//! - [`models`]: template kinds, exceptions, occurrences, and DTOs
//! - [`recurrence`]: rule evaluation (daily/weekly/biweekly/monthly)
//! - [`expand`]: window expansion and exception resolution
//! - [`mutation`]: routing edits/deletes/completions to template or
//!   exception writes
//! - [`repository`]: SQLite storage with the Repository pattern
//! - [`prefs`]: key-value preference store (option lists, color maps)
//! - [`db`]: connection and schema management
//! - [`error`]: error types
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use agenda_core::{
//!     db,
//!     expand::{expand, ExceptionIndex},
//!     models::{NewTodo, Recurrence, Template},
//!     recurrence::DateWindow,
//!     repository::{ExceptionRepository, SqliteRepository, TemplateRepository},
//! };
//! use chrono::NaiveDate;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = db::establish_connection("agenda.db").await?;
//!     let repo = SqliteRepository::new(pool);
//!
//!     let todo = repo
//!         .add_todo(NewTodo {
//!             title: "Weekly reading".to_string(),
//!             due_on: NaiveDate::from_ymd_opt(2026, 2, 2),
//!             recurrence: Recurrence::Weekly,
//!             recurrence_until: NaiveDate::from_ymd_opt(2026, 5, 4),
//!             ..Default::default()
//!         })
//!         .await?;
//!
//!     let templates = vec![Template::Todo(todo)];
//!     let exceptions = ExceptionIndex::from_rows(repo.find_all_exceptions().await?);
//!     let window = DateWindow::new(
//!         NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
//!         NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
//!     );
//!     for occurrence in expand(&templates, &exceptions, window) {
//!         println!("{} {}", occurrence.display_date, occurrence.template.title());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod error;
pub mod expand;
pub mod models;
pub mod mutation;
pub mod prefs;
pub mod recurrence;
pub mod repository;
