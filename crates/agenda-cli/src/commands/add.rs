use agenda_core::models::{NewAssignment, NewEvent, NewTodo, Recurrence, TemplateKind};
use agenda_core::prefs::keys;
use agenda_core::repository::{SqliteRepository, TemplateRepository};
use anyhow::{anyhow, Result};
use chrono::Duration;
use owo_colors::{OwoColorize, Style};
use uuid::Uuid;

use crate::cli::AddCommand;
use crate::util::{parse_date, parse_instant};

pub async fn add_item(repo: &SqliteRepository, command: AddCommand) -> Result<()> {
    let kind: TemplateKind = command.kind.parse()?;
    let recurrence = command
        .every
        .as_deref()
        .map(str::parse::<Recurrence>)
        .transpose()?
        .unwrap_or(Recurrence::None);
    let recurrence_until = command.until.as_deref().map(parse_date).transpose()?;
    let due_on = command.due.as_deref().map(parse_date).transpose()?;

    let (id, title) = match kind {
        TemplateKind::Event => {
            let starts_at = command
                .starts
                .as_deref()
                .map(parse_instant)
                .transpose()?
                .ok_or_else(|| anyhow!("--starts is required for events"))?;
            let ends_at = match command.ends.as_deref() {
                Some(raw) => parse_instant(raw)?,
                None => starts_at + Duration::hours(1),
            };
            let event = repo
                .add_event(NewEvent {
                    title: command.title,
                    description: command.description,
                    calendar_id: None,
                    starts_at,
                    ends_at,
                    recurrence,
                    recurrence_until,
                })
                .await?;
            (event.id, event.title)
        }
        TemplateKind::Todo => {
            let todo = repo
                .add_todo(NewTodo {
                    title: command.title,
                    notes: command.description,
                    course: command.course.clone(),
                    due_on,
                    recurrence,
                    recurrence_until,
                })
                .await?;
            (todo.id, todo.title)
        }
        TemplateKind::Assignment => {
            let assignment = repo
                .add_assignment(NewAssignment {
                    title: command.title,
                    description: command.description,
                    course: command.course.clone(),
                    due_on: due_on
                        .ok_or_else(|| anyhow!("--due is required for assignments"))?,
                    recurrence,
                    recurrence_until,
                })
                .await?;
            (assignment.id, assignment.title)
        }
    };

    // Newly seen courses feed the dropdown option list.
    if let Some(course) = command.course.as_deref() {
        repo.remember_option(keys::COURSE_OPTIONS, course).await?;
    }

    print_created(kind, id, &title, recurrence);
    Ok(())
}

fn print_created(kind: TemplateKind, id: Uuid, title: &str, recurrence: Recurrence) {
    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();

    if recurrence.is_recurring() {
        println!(
            "{} Created {} {} ({})",
            "✓".style(success_style),
            recurrence,
            kind,
            title.bright_white().bold()
        );
    } else {
        println!(
            "{} Created {} ({})",
            "✓".style(success_style),
            kind,
            title.bright_white().bold()
        );
    }
    println!("  {} id: {}", "→".style(info_style), id.to_string().yellow());
}
