use agenda_core::db::establish_connection;
use agenda_core::error::CoreError;
use agenda_core::expand::{expand, ExceptionIndex};
use agenda_core::models::*;
use agenda_core::mutation::{route_delete, route_edit, route_toggle_complete};
use agenda_core::prefs::{keys, PreferenceStore};
use agenda_core::recurrence::DateWindow;
use agenda_core::repository::{
    ExceptionRepository, Repository, SqliteRepository, TemplateRepository,
};
use chrono::NaiveDate;
use tempfile::TempDir;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn february() -> DateWindow {
    DateWindow::new(d(2026, 2, 1), d(2026, 3, 1))
}

async fn setup_test_db() -> (SqliteRepository, TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");

    let pool = establish_connection(&db_path.to_string_lossy())
        .await
        .expect("Failed to establish test database connection");

    (SqliteRepository::new(pool), temp_dir)
}

async fn create_weekly_assignment(repo: &SqliteRepository) -> Assignment {
    repo.add_assignment(NewAssignment {
        title: "Problem set".to_string(),
        description: None,
        course: Some("MATH 220".to_string()),
        due_on: d(2026, 2, 2),
        recurrence: Recurrence::Weekly,
        recurrence_until: Some(d(2026, 2, 23)),
    })
    .await
    .expect("Failed to create test assignment")
}

async fn expand_window(repo: &SqliteRepository, window: DateWindow) -> Vec<Occurrence> {
    let templates = repo.list_templates(&[]).await.expect("list failed");
    let exceptions = ExceptionIndex::from_rows(
        repo.find_all_exceptions().await.expect("exceptions failed"),
    );
    expand(&templates, &exceptions, window)
}

#[tokio::test]
async fn test_exception_upsert_is_idempotent_per_key() {
    let (repo, _temp_dir) = setup_test_db().await;
    let assignment = create_weekly_assignment(&repo).await;

    let first = OccurrenceException::modified(
        TemplateKind::Assignment,
        assignment.id,
        d(2026, 2, 9),
        FieldOverrides {
            title: Some("First title".to_string()),
            ..Default::default()
        },
    );
    let second = OccurrenceException::modified(
        TemplateKind::Assignment,
        assignment.id,
        d(2026, 2, 9),
        FieldOverrides {
            title: Some("Second title".to_string()),
            ..Default::default()
        },
    );

    repo.upsert_exception(first).await.unwrap();
    repo.upsert_exception(second).await.unwrap();

    let stored = repo
        .find_exceptions_for(TemplateKind::Assignment, assignment.id)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(
        stored[0].overrides.as_ref().unwrap().title.as_deref(),
        Some("Second title")
    );
}

#[tokio::test]
async fn test_completion_toggle_round_trips_through_storage() {
    let (repo, _temp_dir) = setup_test_db().await;
    let todo = repo
        .add_todo(NewTodo {
            title: "Weekly reading".to_string(),
            due_on: Some(d(2026, 2, 2)),
            recurrence: Recurrence::Weekly,
            recurrence_until: Some(d(2026, 2, 16)),
            ..Default::default()
        })
        .await
        .unwrap();
    let template = Template::Todo(todo.clone());

    // Toggle on: the router writes a completed exception for 02-09.
    let occurrences = expand_window(&repo, february()).await;
    let target = occurrences.iter().find(|o| o.date == d(2026, 2, 9)).unwrap();
    assert!(!target.is_completed());
    repo.apply_writes(route_toggle_complete(&template, target))
        .await
        .unwrap();

    let occurrences = expand_window(&repo, february()).await;
    let states: Vec<(NaiveDate, bool)> = occurrences
        .iter()
        .map(|o| (o.date, o.is_completed()))
        .collect();
    assert_eq!(
        states,
        vec![
            (d(2026, 2, 2), false),
            (d(2026, 2, 9), true),
            (d(2026, 2, 16), false),
        ]
    );

    // The template's own flag was never touched.
    let stored = repo
        .find_template(TemplateKind::Todo, todo.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.completed());

    // Toggle off: the exception is deleted, not replaced by a negative.
    let target = occurrences.iter().find(|o| o.date == d(2026, 2, 9)).unwrap();
    repo.apply_writes(route_toggle_complete(&template, target))
        .await
        .unwrap();

    let remaining = repo
        .find_exceptions_for(TemplateKind::Todo, todo.id)
        .await
        .unwrap();
    assert!(remaining.is_empty());
    let occurrences = expand_window(&repo, february()).await;
    assert!(occurrences.iter().all(|o| !o.is_completed()));
}

#[tokio::test]
async fn test_delete_this_occurrence_skips_one_date() {
    let (repo, _temp_dir) = setup_test_db().await;
    let assignment = create_weekly_assignment(&repo).await;
    let template = Template::Assignment(assignment);

    repo.apply_writes(route_delete(
        &template,
        d(2026, 2, 16),
        EditScope::ThisOccurrence,
    ))
    .await
    .unwrap();

    let dates: Vec<NaiveDate> = expand_window(&repo, february())
        .await
        .iter()
        .map(|o| o.date)
        .collect();
    assert_eq!(dates, vec![d(2026, 2, 2), d(2026, 2, 9), d(2026, 2, 23)]);
}

#[tokio::test]
async fn test_delete_all_occurrences_leaves_no_orphaned_exceptions() {
    let (repo, _temp_dir) = setup_test_db().await;
    let assignment = create_weekly_assignment(&repo).await;
    let template = Template::Assignment(assignment.clone());

    repo.upsert_exception(OccurrenceException::skipped(
        TemplateKind::Assignment,
        assignment.id,
        d(2026, 2, 9),
    ))
    .await
    .unwrap();
    repo.upsert_exception(OccurrenceException::completed(
        TemplateKind::Assignment,
        assignment.id,
        d(2026, 2, 16),
    ))
    .await
    .unwrap();

    repo.apply_writes(route_delete(
        &template,
        d(2026, 2, 16),
        EditScope::AllOccurrences,
    ))
    .await
    .unwrap();

    assert!(repo
        .find_template(TemplateKind::Assignment, assignment.id)
        .await
        .unwrap()
        .is_none());
    assert!(repo
        .find_exceptions_for(TemplateKind::Assignment, assignment.id)
        .await
        .unwrap()
        .is_empty());
    assert!(expand_window(&repo, february()).await.is_empty());
}

#[tokio::test]
async fn test_edit_all_rewrites_the_rule_but_keeps_unrelated_exceptions() {
    let (repo, _temp_dir) = setup_test_db().await;
    let assignment = create_weekly_assignment(&repo).await;
    let template = Template::Assignment(assignment.clone());

    repo.upsert_exception(OccurrenceException::skipped(
        TemplateKind::Assignment,
        assignment.id,
        d(2026, 2, 9),
    ))
    .await
    .unwrap();

    // Weekly -> biweekly: 02-09 is no longer generated, so its skip
    // becomes inert but is deliberately not pruned.
    let writes = route_edit(
        &template,
        d(2026, 2, 2),
        EditScope::AllOccurrences,
        TemplateChanges {
            recurrence: Some(Recurrence::Biweekly),
            ..Default::default()
        },
    )
    .unwrap();
    repo.apply_writes(writes).await.unwrap();

    let dates: Vec<NaiveDate> = expand_window(&repo, february())
        .await
        .iter()
        .map(|o| o.date)
        .collect();
    assert_eq!(dates, vec![d(2026, 2, 2), d(2026, 2, 16)]);

    let stored = repo
        .find_exceptions_for(TemplateKind::Assignment, assignment.id)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].date, d(2026, 2, 9));
}

#[tokio::test]
async fn test_edit_this_occurrence_round_trips_overrides() {
    let (repo, _temp_dir) = setup_test_db().await;
    let assignment = create_weekly_assignment(&repo).await;
    let template = Template::Assignment(assignment);

    let writes = route_edit(
        &template,
        d(2026, 2, 16),
        EditScope::ThisOccurrence,
        TemplateChanges {
            title: Some("Rescheduled".to_string()),
            ..Default::default()
        },
    )
    .unwrap();
    repo.apply_writes(writes).await.unwrap();

    let occurrences = expand_window(&repo, february()).await;
    for occurrence in &occurrences {
        if occurrence.date == d(2026, 2, 16) {
            assert_eq!(occurrence.template.title(), "Rescheduled");
            assert!(occurrence.exception.is_some());
        } else {
            assert_eq!(occurrence.template.title(), "Problem set");
        }
    }
}

#[tokio::test]
async fn test_recurrence_without_until_is_rejected_at_the_boundary() {
    let (repo, _temp_dir) = setup_test_db().await;
    let result = repo
        .add_todo(NewTodo {
            title: "Unbounded".to_string(),
            due_on: Some(d(2026, 2, 2)),
            recurrence: Recurrence::Weekly,
            recurrence_until: None,
            ..Default::default()
        })
        .await;
    assert!(matches!(result, Err(CoreError::InvalidRecurrence(_))));
}

#[tokio::test]
async fn test_exception_against_non_recurring_template_is_rejected() {
    let (repo, _temp_dir) = setup_test_db().await;
    let assignment = repo
        .add_assignment(NewAssignment {
            title: "Essay".to_string(),
            description: None,
            course: None,
            due_on: d(2026, 2, 16),
            recurrence: Recurrence::None,
            recurrence_until: None,
        })
        .await
        .unwrap();

    let result = repo
        .upsert_exception(OccurrenceException::skipped(
            TemplateKind::Assignment,
            assignment.id,
            d(2026, 2, 16),
        ))
        .await;
    assert!(matches!(result, Err(CoreError::InvalidInput(_))));
}

#[tokio::test]
async fn test_list_templates_filters_by_course_and_kind() {
    let (repo, _temp_dir) = setup_test_db().await;
    create_weekly_assignment(&repo).await;
    repo.add_todo(NewTodo {
        title: "Lab prep".to_string(),
        course: Some("CHEM 101".to_string()),
        due_on: Some(d(2026, 2, 5)),
        ..Default::default()
    })
    .await
    .unwrap();

    let math = repo
        .list_templates(&[Filter::Course("MATH 220".to_string())])
        .await
        .unwrap();
    assert_eq!(math.len(), 1);
    assert_eq!(math[0].title(), "Problem set");

    let todos = repo
        .list_templates(&[Filter::Kind(TemplateKind::Todo)])
        .await
        .unwrap();
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].title(), "Lab prep");
}

#[tokio::test]
async fn test_preference_store_round_trips_option_lists() {
    let (repo, _temp_dir) = setup_test_db().await;

    assert!(repo.option_list(keys::COURSE_OPTIONS).await.unwrap().is_empty());

    repo.remember_option(keys::COURSE_OPTIONS, "MATH 220").await.unwrap();
    repo.remember_option(keys::COURSE_OPTIONS, "CHEM 101").await.unwrap();
    repo.remember_option(keys::COURSE_OPTIONS, "MATH 220").await.unwrap();

    let options = repo.option_list(keys::COURSE_OPTIONS).await.unwrap();
    assert_eq!(options, vec!["MATH 220".to_string(), "CHEM 101".to_string()]);

    let color_map = serde_json::json!({ "MATH 220": "#7c3aed" });
    PreferenceStore::set(&repo, keys::COLOR_MAP, &color_map).await.unwrap();
    assert_eq!(
        PreferenceStore::get(&repo, keys::COLOR_MAP).await.unwrap(),
        Some(color_map)
    );
}
