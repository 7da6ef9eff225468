use agenda_core::models::{Occurrence, Template, TemplateKind};
use chrono_humanize::HumanTime;
use comfy_table::{Cell, Color, Row, Table};

/// Renders a window of occurrences as a table, one row per occurrence,
/// sorted by the caller.
pub fn display_occurrences(occurrences: &[Occurrence]) {
    if occurrences.is_empty() {
        println!("Nothing scheduled.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Date", "Kind", "Title", "Course", "When", "Done", "ID"]);

    for occurrence in occurrences {
        let mut row = Row::new();
        row.add_cell(Cell::new(
            occurrence.display_date.format("%a %Y-%m-%d").to_string(),
        ));
        row.add_cell(kind_cell(occurrence.template.kind()));

        let mut title = String::new();
        if occurrence.template.is_recurring() {
            title.push_str("↻ ");
        }
        title.push_str(occurrence.template.title());
        if occurrence.exception.is_some() {
            title.push_str(" *");
        }
        row.add_cell(Cell::new(title));

        row.add_cell(Cell::new(course_of(&occurrence.template).unwrap_or_default()));
        row.add_cell(Cell::new(when_hint(occurrence)));
        row.add_cell(Cell::new(done_mark(occurrence)));
        row.add_cell(Cell::new(&occurrence.template.id().to_string()[..8]));

        table.add_row(row);
    }

    println!("{table}");
}

fn kind_cell(kind: TemplateKind) -> Cell {
    match kind {
        TemplateKind::Event => Cell::new("event").fg(Color::Blue),
        TemplateKind::Todo => Cell::new("todo").fg(Color::Yellow),
        TemplateKind::Assignment => Cell::new("assignment").fg(Color::Magenta),
    }
}

fn course_of(template: &Template) -> Option<String> {
    match template {
        Template::Event(_) => None,
        Template::Todo(todo) => todo.course.clone(),
        Template::Assignment(assignment) => assignment.course.clone(),
    }
}

/// Events show their start time plus a relative hint; dated items just
/// rely on the date column.
fn when_hint(occurrence: &Occurrence) -> String {
    match &occurrence.template {
        Template::Event(event) => format!(
            "{} ({})",
            event.starts_at.format("%H:%M"),
            HumanTime::from(event.starts_at)
        ),
        _ => String::new(),
    }
}

fn done_mark(occurrence: &Occurrence) -> &'static str {
    match occurrence.template.kind() {
        TemplateKind::Event => "",
        _ if occurrence.is_completed() => "✓",
        _ => "·",
    }
}
