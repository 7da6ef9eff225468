use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{
    EditScope, ExceptionKind, Occurrence, OccurrenceException, Template, TemplateChanges,
    TemplateKind,
};

/// A storage call the router has decided to issue. Executing it is the
/// storage collaborator's job; the router only determines which call with
/// what payload.
#[derive(Debug, Clone)]
pub enum StorageWrite {
    UpdateTemplate {
        kind: TemplateKind,
        id: Uuid,
        changes: TemplateChanges,
    },
    /// The executor must also delete every exception referencing the
    /// template; orphaned exceptions are a consistency bug.
    DeleteTemplate { kind: TemplateKind, id: Uuid },
    UpsertException(OccurrenceException),
    DeleteException {
        kind: TemplateKind,
        id: Uuid,
        date: NaiveDate,
    },
}

/// Routes an edit on one occurrence. Non-recurring templates are always
/// edited directly; for a recurring template the caller has already
/// resolved the this-vs-all ambiguity into a scope.
///
/// The this-occurrence path strips the recurrence fields from the edit:
/// the series pattern cannot be changed per-occurrence.
pub fn route_edit(
    template: &Template,
    occurrence_date: NaiveDate,
    scope: EditScope,
    changes: TemplateChanges,
) -> Result<Vec<StorageWrite>, CoreError> {
    if !template.is_recurring() || scope == EditScope::AllOccurrences {
        return Ok(vec![StorageWrite::UpdateTemplate {
            kind: template.kind(),
            id: template.id(),
            changes,
        }]);
    }

    if changes.touches_pattern() {
        return Err(CoreError::InvalidInput(
            "the recurrence pattern can only be changed for all occurrences".to_string(),
        ));
    }
    let overrides = changes.into_overrides();
    if overrides.is_empty() {
        return Err(CoreError::InvalidInput(
            "nothing to change for this occurrence".to_string(),
        ));
    }
    Ok(vec![StorageWrite::UpsertException(
        OccurrenceException::modified(template.kind(), template.id(), occurrence_date, overrides),
    )])
}

/// Routes a delete on one occurrence: a per-date skip, or removal of the
/// whole template (the executor clears its exceptions with it).
pub fn route_delete(
    template: &Template,
    occurrence_date: NaiveDate,
    scope: EditScope,
) -> Vec<StorageWrite> {
    if !template.is_recurring() || scope == EditScope::AllOccurrences {
        return vec![StorageWrite::DeleteTemplate {
            kind: template.kind(),
            id: template.id(),
        }];
    }
    vec![StorageWrite::UpsertException(OccurrenceException::skipped(
        template.kind(),
        template.id(),
        occurrence_date,
    ))]
}

/// Routes a completion toggle. Always occurrence-scoped for recurring
/// templates: present `completed` exception means done, absence means not
/// done, and toggling off deletes the exception rather than writing a
/// "not completed" one. The template's own flag is only ever touched for
/// non-recurring items.
pub fn route_toggle_complete(template: &Template, occurrence: &Occurrence) -> Vec<StorageWrite> {
    if !template.is_recurring() {
        return vec![StorageWrite::UpdateTemplate {
            kind: template.kind(),
            id: template.id(),
            changes: TemplateChanges {
                completed: Some(!template.completed()),
                ..Default::default()
            },
        }];
    }

    match &occurrence.exception {
        Some(exception) if exception.kind == ExceptionKind::Completed => {
            vec![StorageWrite::DeleteException {
                kind: template.kind(),
                id: template.id(),
                date: occurrence.date,
            }]
        }
        _ => vec![StorageWrite::UpsertException(
            OccurrenceException::completed(template.kind(), template.id(), occurrence.date),
        )],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Assignment, Recurrence};
    use chrono::Utc;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn weekly_assignment() -> Template {
        Template::Assignment(Assignment {
            id: Uuid::now_v7(),
            title: "Problem set".to_string(),
            description: None,
            course: Some("MATH 220".to_string()),
            due_on: d(2026, 2, 2),
            completed: false,
            recurrence: Recurrence::Weekly,
            recurrence_until: Some(d(2026, 2, 23)),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    fn single_assignment() -> Template {
        Template::Assignment(Assignment {
            id: Uuid::now_v7(),
            title: "Essay".to_string(),
            description: None,
            course: None,
            due_on: d(2026, 2, 16),
            completed: false,
            recurrence: Recurrence::None,
            recurrence_until: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    fn occurrence_of(template: &Template, date: NaiveDate) -> Occurrence {
        Occurrence {
            template: template.clone(),
            date,
            display_date: date,
            is_virtual: Some(date) != template.anchor_date(),
            exception: None,
        }
    }

    #[test]
    fn delete_this_occurrence_writes_a_skip() {
        let template = weekly_assignment();
        let writes = route_delete(&template, d(2026, 2, 16), EditScope::ThisOccurrence);
        assert_eq!(writes.len(), 1);
        match &writes[0] {
            StorageWrite::UpsertException(exception) => {
                assert_eq!(exception.kind, ExceptionKind::Skipped);
                assert_eq!(exception.date, d(2026, 2, 16));
                assert_eq!(exception.parent_id, template.id());
            }
            other => panic!("expected a skip exception, got {:?}", other),
        }
    }

    #[test]
    fn delete_all_occurrences_removes_the_template() {
        let template = weekly_assignment();
        let writes = route_delete(&template, d(2026, 2, 16), EditScope::AllOccurrences);
        assert!(matches!(
            writes.as_slice(),
            [StorageWrite::DeleteTemplate { id, .. }] if *id == template.id()
        ));
    }

    #[test]
    fn delete_on_non_recurring_ignores_scope() {
        let template = single_assignment();
        let writes = route_delete(&template, d(2026, 2, 16), EditScope::ThisOccurrence);
        assert!(matches!(
            writes.as_slice(),
            [StorageWrite::DeleteTemplate { .. }]
        ));
    }

    #[test]
    fn edit_this_occurrence_writes_a_modified_exception() {
        let template = weekly_assignment();
        let changes = TemplateChanges {
            title: Some("Problem set (revised)".to_string()),
            ..Default::default()
        };
        let writes =
            route_edit(&template, d(2026, 2, 9), EditScope::ThisOccurrence, changes).unwrap();
        match &writes[0] {
            StorageWrite::UpsertException(exception) => {
                assert_eq!(exception.kind, ExceptionKind::Modified);
                let overrides = exception.overrides.as_ref().unwrap();
                assert_eq!(overrides.title.as_deref(), Some("Problem set (revised)"));
            }
            other => panic!("expected a modified exception, got {:?}", other),
        }
    }

    #[test]
    fn edit_this_occurrence_rejects_pattern_changes() {
        let template = weekly_assignment();
        let changes = TemplateChanges {
            recurrence: Some(Recurrence::Daily),
            ..Default::default()
        };
        let result = route_edit(&template, d(2026, 2, 9), EditScope::ThisOccurrence, changes);
        assert!(matches!(result, Err(CoreError::InvalidInput(_))));
    }

    #[test]
    fn edit_all_occurrences_updates_the_template_with_rule_changes() {
        let template = weekly_assignment();
        let changes = TemplateChanges {
            recurrence: Some(Recurrence::Biweekly),
            recurrence_until: Some(Some(d(2026, 3, 23))),
            ..Default::default()
        };
        let writes =
            route_edit(&template, d(2026, 2, 9), EditScope::AllOccurrences, changes).unwrap();
        assert!(matches!(
            writes.as_slice(),
            [StorageWrite::UpdateTemplate { id, .. }] if *id == template.id()
        ));
    }

    #[test]
    fn toggle_complete_on_recurring_upserts_then_deletes() {
        let template = weekly_assignment();
        let occurrence = occurrence_of(&template, d(2026, 2, 9));

        let on = route_toggle_complete(&template, &occurrence);
        let exception = match &on[0] {
            StorageWrite::UpsertException(exception) => {
                assert_eq!(exception.kind, ExceptionKind::Completed);
                exception.clone()
            }
            other => panic!("expected a completed exception, got {:?}", other),
        };

        // Second toggle sees the exception on the occurrence and removes it.
        let mut marked = occurrence.clone();
        marked.exception = Some(exception);
        let off = route_toggle_complete(&template, &marked);
        assert!(matches!(
            off.as_slice(),
            [StorageWrite::DeleteException { date, .. }] if *date == d(2026, 2, 9)
        ));
    }

    #[test]
    fn toggle_complete_on_non_recurring_flips_the_template() {
        let template = single_assignment();
        let occurrence = occurrence_of(&template, d(2026, 2, 16));
        let writes = route_toggle_complete(&template, &occurrence);
        match &writes[0] {
            StorageWrite::UpdateTemplate { changes, .. } => {
                assert_eq!(changes.completed, Some(true));
            }
            other => panic!("expected a template update, got {:?}", other),
        }
    }
}
