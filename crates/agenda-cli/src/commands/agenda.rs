use agenda_core::expand::{expand, ExceptionIndex};
use agenda_core::models::Filter;
use agenda_core::recurrence::DateWindow;
use agenda_core::repository::{ExceptionRepository, SqliteRepository, TemplateRepository};
use anyhow::{anyhow, Result};
use chrono::{Days, Utc};

use crate::cli::AgendaCommand;
use crate::config::Config;
use crate::util::parse_date;
use crate::views;

pub async fn show_agenda(
    repo: &SqliteRepository,
    command: AgendaCommand,
    config: &Config,
) -> Result<()> {
    let start = match command.from.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => Utc::now().date_naive(),
    };
    let end = match command.to.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => start
            .checked_add_days(Days::new(u64::from(config.lookahead_days)))
            .ok_or_else(|| anyhow!("Lookahead window is out of range."))?,
    };
    if end <= start {
        return Err(anyhow!("The window end must be after its start."));
    }

    let filters = match command.course {
        Some(course) => vec![Filter::Course(course)],
        None => Vec::new(),
    };
    let templates = repo.list_templates(&filters).await?;
    let exceptions = ExceptionIndex::from_rows(repo.find_all_exceptions().await?);

    let mut occurrences = expand(&templates, &exceptions, DateWindow::new(start, end));
    occurrences.sort_by(|a, b| {
        a.display_date
            .cmp(&b.display_date)
            .then_with(|| a.template.title().cmp(b.template.title()))
    });

    views::display_occurrences(&occurrences);
    Ok(())
}
