use std::collections::HashMap;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{
    ExceptionKey, ExceptionKind, Occurrence, OccurrenceException, Template, TemplateKind,
};
use crate::recurrence::{occurrence_dates, DateWindow};

/// Exceptions indexed by their composite natural key for O(1) lookup
/// during expansion. Inserting a second exception for the same key
/// replaces the first.
#[derive(Debug, Clone, Default)]
pub struct ExceptionIndex {
    by_key: HashMap<ExceptionKey, OccurrenceException>,
}

impl ExceptionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the index from storage rows. Later rows win on key
    /// collision, matching the store's upsert semantics.
    pub fn from_rows(rows: Vec<OccurrenceException>) -> Self {
        let mut index = Self::new();
        for row in rows {
            index.upsert(row);
        }
        index
    }

    pub fn upsert(&mut self, exception: OccurrenceException) -> Option<OccurrenceException> {
        self.by_key.insert(exception.key(), exception)
    }

    pub fn remove(
        &mut self,
        kind: TemplateKind,
        id: Uuid,
        date: NaiveDate,
    ) -> Option<OccurrenceException> {
        self.by_key.remove(&(kind, id, date))
    }

    pub fn get(&self, kind: TemplateKind, id: Uuid, date: NaiveDate) -> Option<&OccurrenceException> {
        self.by_key.get(&(kind, id, date))
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// Expands templates into the concrete occurrences visible in a window,
/// with exceptions reconciled.
///
/// Expansion is a pure function of its inputs. Per-template output is
/// ascending by series date; order across templates is not significant.
/// Exceptions are only ever looked up per template, so rows referencing a
/// deleted template are simply never consulted.
pub fn expand(
    templates: &[Template],
    exceptions: &ExceptionIndex,
    window: DateWindow,
) -> Vec<Occurrence> {
    let mut occurrences = Vec::new();
    for template in templates {
        expand_template(template, exceptions, window, &mut occurrences);
    }
    occurrences
}

fn expand_template(
    template: &Template,
    exceptions: &ExceptionIndex,
    window: DateWindow,
    out: &mut Vec<Occurrence>,
) {
    // Undated todos have nothing to place on a calendar.
    let Some(anchor) = template.anchor_date() else {
        return;
    };

    if !template.is_recurring() {
        // The single instance is matched against its own stored date, not
        // regenerated. Exceptions are meaningless without a series.
        if window.contains(anchor) {
            out.push(Occurrence {
                template: template.clone(),
                date: anchor,
                display_date: anchor,
                is_virtual: false,
                exception: None,
            });
        }
        return;
    }

    let candidates = occurrence_dates(
        anchor,
        template.recurrence(),
        template.recurrence_until(),
        window,
    );

    for date in candidates {
        match exceptions.get(template.kind(), template.id(), date) {
            // Skip wins outright: the occurrence is suppressed entirely.
            Some(exception) if exception.kind == ExceptionKind::Skipped => continue,
            Some(exception) => {
                let mut effective = template.clone();
                let mut display_date = date;
                if exception.kind == ExceptionKind::Modified {
                    if let Some(overrides) = &exception.overrides {
                        effective.apply_overrides(overrides);
                        // A date override moves where the occurrence is
                        // shown; `date` stays the series key so edits to a
                        // moved occurrence still round-trip.
                        if let Some(moved) = overrides.effective_date(template.kind()) {
                            display_date = moved;
                        }
                    }
                }
                out.push(Occurrence {
                    template: effective,
                    date,
                    display_date,
                    is_virtual: date != anchor,
                    exception: Some(exception.clone()),
                });
            }
            None => out.push(Occurrence {
                template: template.clone(),
                date,
                display_date: date,
                is_virtual: date != anchor,
                exception: None,
            }),
        }
    }
}
