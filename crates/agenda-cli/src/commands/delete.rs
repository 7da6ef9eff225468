use agenda_core::models::EditScope;
use agenda_core::mutation::route_delete;
use agenda_core::repository::{Repository, SqliteRepository};
use anyhow::{anyhow, Result};
use chrono::Utc;
use dialoguer::Confirm;
use owo_colors::{OwoColorize, Style};

use crate::cli::DeleteCommand;
use crate::util::{parse_date, parse_id, require_template, resolve_scope};

pub async fn delete_item(repo: &SqliteRepository, command: DeleteCommand) -> Result<()> {
    let kind = command.kind.parse()?;
    let id = parse_id(&command.id)?;
    let template = require_template(repo, kind, id).await?;
    let scope = resolve_scope(&template, command.scope.as_deref())?;

    let date = match (scope, command.date.as_deref()) {
        (EditScope::ThisOccurrence, Some(raw)) => parse_date(raw)?,
        (EditScope::ThisOccurrence, None) => {
            return Err(anyhow!("--date is required when deleting a single occurrence."));
        }
        (EditScope::AllOccurrences, _) => template
            .anchor_date()
            .unwrap_or_else(|| Utc::now().date_naive()),
    };

    if scope == EditScope::AllOccurrences && !command.force {
        let prompt = if template.is_recurring() {
            format!(
                "Delete '{}' and all of its occurrences?",
                template.title()
            )
        } else {
            format!("Delete '{}'?", template.title())
        };
        let confirmed = Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .unwrap_or(false);
        if !confirmed {
            println!("Deletion cancelled.");
            return Ok(());
        }
    }

    repo.apply_writes(route_delete(&template, date, scope)).await?;

    let success_style = Style::new().green().bold();
    match scope {
        EditScope::ThisOccurrence => println!(
            "{} Removed the {} occurrence of '{}'.",
            "✓".style(success_style),
            date,
            template.title().bright_white().bold()
        ),
        EditScope::AllOccurrences => println!(
            "{} Deleted '{}'.",
            "✓".style(success_style),
            template.title().bright_white().bold()
        ),
    }
    Ok(())
}
