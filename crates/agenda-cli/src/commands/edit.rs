use agenda_core::models::{EditScope, Recurrence, TemplateChanges};
use agenda_core::mutation::route_edit;
use agenda_core::repository::{Repository, SqliteRepository};
use anyhow::{anyhow, Result};
use chrono::Utc;
use owo_colors::{OwoColorize, Style};

use crate::cli::EditCommand;
use crate::util::{
    parse_date, parse_id, parse_instant, require_template, resolve_occurrence, resolve_scope,
};

pub async fn edit_item(repo: &SqliteRepository, command: EditCommand) -> Result<()> {
    let kind = command.kind.parse()?;
    let id = parse_id(&command.id)?;
    let template = require_template(repo, kind, id).await?;

    let recurrence = command
        .every
        .as_deref()
        .map(str::parse::<Recurrence>)
        .transpose()?;
    // "--until none" clears the bound together with "--every none".
    let recurrence_until = match command.until.as_deref() {
        None => None,
        Some("none") => Some(None),
        Some(raw) => Some(Some(parse_date(raw)?)),
    };
    let changes = TemplateChanges {
        title: command.title,
        description: command.description,
        course: command.course,
        calendar_id: None,
        starts_at: command.starts.as_deref().map(parse_instant).transpose()?,
        ends_at: command.ends.as_deref().map(parse_instant).transpose()?,
        due_on: command.due.as_deref().map(parse_date).transpose()?,
        completed: None,
        recurrence,
        recurrence_until,
    };

    let scope = resolve_scope(&template, command.scope.as_deref())?;
    let date = match (scope, command.date.as_deref()) {
        (EditScope::ThisOccurrence, Some(raw)) => {
            let date = parse_date(raw)?;
            // Fails early when the date is not part of the series.
            resolve_occurrence(repo, &template, date).await?;
            date
        }
        (EditScope::ThisOccurrence, None) => {
            return Err(anyhow!("--date is required when editing a single occurrence."));
        }
        (EditScope::AllOccurrences, _) => template
            .anchor_date()
            .unwrap_or_else(|| Utc::now().date_naive()),
    };

    let writes = route_edit(&template, date, scope, changes)?;
    repo.apply_writes(writes).await?;

    let success_style = Style::new().green().bold();
    match scope {
        EditScope::ThisOccurrence => println!(
            "{} Updated '{}' on {} only.",
            "✓".style(success_style),
            template.title().bright_white().bold(),
            date
        ),
        EditScope::AllOccurrences => println!(
            "{} Updated '{}'.",
            "✓".style(success_style),
            template.title().bright_white().bold()
        ),
    }
    Ok(())
}
