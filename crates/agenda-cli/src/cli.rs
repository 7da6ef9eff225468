use clap::{Parser, Subcommand};

/// A small planner: calendar events, to-dos, and assignments with
/// recurring series and per-occurrence exceptions.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Add an event, todo, or assignment
    Add(AddCommand),
    /// Show every occurrence in a date window
    Agenda(AgendaCommand),
    /// Toggle completion for one occurrence
    Done(DoneCommand),
    /// Edit a template, or a single occurrence of a series
    Edit(EditCommand),
    /// Delete a template, or skip a single occurrence of a series
    Delete(DeleteCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    /// What to create (event|todo|assignment)
    pub kind: String,
    /// Title of the new item
    pub title: String,
    #[clap(short, long)]
    pub description: Option<String>,
    /// Course label (todos/assignments)
    #[clap(short, long)]
    pub course: Option<String>,
    /// Due date for todos/assignments (YYYY-MM-DD)
    #[clap(long)]
    pub due: Option<String>,
    /// Start instant for events (RFC 3339, e.g. 2026-02-02T09:00:00Z)
    #[clap(long)]
    pub starts: Option<String>,
    /// End instant for events (RFC 3339)
    #[clap(long)]
    pub ends: Option<String>,
    /// Recurrence rule (daily|weekly|biweekly|monthly)
    #[clap(long)]
    pub every: Option<String>,
    /// Inclusive last date of the series (required with --every)
    #[clap(long)]
    pub until: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct AgendaCommand {
    /// Window start (YYYY-MM-DD); defaults to today
    #[clap(long)]
    pub from: Option<String>,
    /// Window end, exclusive (YYYY-MM-DD); defaults to the configured lookahead
    #[clap(long)]
    pub to: Option<String>,
    /// Only show items for this course
    #[clap(long)]
    pub course: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct DoneCommand {
    /// Kind of the template (event|todo|assignment)
    pub kind: String,
    /// Template id
    pub id: String,
    /// Occurrence date (YYYY-MM-DD); defaults to the template's own date
    #[clap(long)]
    pub date: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct EditCommand {
    /// Kind of the template (event|todo|assignment)
    pub kind: String,
    /// Template id
    pub id: String,
    /// Occurrence date the edit applies to (YYYY-MM-DD)
    #[clap(long)]
    pub date: Option<String>,
    /// For a recurring item: this|all
    #[clap(long)]
    pub scope: Option<String>,

    #[clap(long)]
    pub title: Option<String>,
    #[clap(long)]
    pub description: Option<String>,
    #[clap(long)]
    pub course: Option<String>,
    #[clap(long)]
    pub due: Option<String>,
    #[clap(long)]
    pub starts: Option<String>,
    #[clap(long)]
    pub ends: Option<String>,
    /// Change the recurrence rule (all-occurrences edits only)
    #[clap(long)]
    pub every: Option<String>,
    /// Change the series end date (all-occurrences edits only)
    #[clap(long)]
    pub until: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteCommand {
    /// Kind of the template (event|todo|assignment)
    pub kind: String,
    /// Template id
    pub id: String,
    /// Occurrence date (YYYY-MM-DD), for single-occurrence deletes
    #[clap(long)]
    pub date: Option<String>,
    /// For a recurring item: this|all
    #[clap(long)]
    pub scope: Option<String>,
    /// Skip the confirmation prompt
    #[clap(short, long)]
    pub force: bool,
}
