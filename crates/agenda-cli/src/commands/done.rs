use agenda_core::mutation::route_toggle_complete;
use agenda_core::repository::{Repository, SqliteRepository};
use anyhow::{anyhow, Result};
use owo_colors::{OwoColorize, Style};

use crate::cli::DoneCommand;
use crate::util::{parse_date, parse_id, require_template, resolve_occurrence};

pub async fn toggle_done(repo: &SqliteRepository, command: DoneCommand) -> Result<()> {
    let kind = command.kind.parse()?;
    let id = parse_id(&command.id)?;
    let template = require_template(repo, kind, id).await?;

    let date = match command.date.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => template
            .anchor_date()
            .ok_or_else(|| anyhow!("'{}' has no date; pass --date.", template.title()))?,
    };

    let occurrence = resolve_occurrence(repo, &template, date).await?;
    let was_done = occurrence.is_completed();
    repo.apply_writes(route_toggle_complete(&template, &occurrence))
        .await?;

    let success_style = Style::new().green().bold();
    if was_done {
        println!(
            "{} Reopened '{}' on {}.",
            "✓".style(success_style),
            template.title().bright_white().bold(),
            date
        );
    } else {
        println!(
            "{} Completed '{}' on {}.",
            "✓".style(success_style),
            template.title().bright_white().bold(),
            date
        );
    }
    Ok(())
}
