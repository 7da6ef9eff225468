use async_trait::async_trait;
use chrono::Utc;
use sqlx::QueryBuilder;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{
    validate_recurrence_config, Assignment, Event, Filter, NewAssignment, NewEvent, NewTodo,
    Template, TemplateChanges, TemplateKind, Todo,
};
use crate::repository::SqliteRepository;

fn table_name(kind: TemplateKind) -> &'static str {
    match kind {
        TemplateKind::Event => "events",
        TemplateKind::Todo => "todos",
        TemplateKind::Assignment => "assignments",
    }
}

#[async_trait]
impl super::TemplateRepository for SqliteRepository {
    async fn add_event(&self, data: NewEvent) -> Result<Event, CoreError> {
        let recurrence_until = data.recurrence.is_recurring().then_some(data.recurrence_until).flatten();
        validate_recurrence_config(
            data.recurrence,
            recurrence_until,
            Some(data.starts_at.date_naive()),
        )?;
        if data.ends_at < data.starts_at {
            return Err(CoreError::InvalidInput(
                "an event cannot end before it starts".to_string(),
            ));
        }

        let now = Utc::now();
        let event = Event {
            id: Uuid::now_v7(),
            title: data.title,
            description: data.description,
            calendar_id: data.calendar_id,
            starts_at: data.starts_at,
            ends_at: data.ends_at,
            recurrence: data.recurrence,
            recurrence_until,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"INSERT INTO events (id, title, description, calendar_id, starts_at, ends_at, recurrence, recurrence_until, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"#,
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.calendar_id)
        .bind(event.starts_at)
        .bind(event.ends_at)
        .bind(event.recurrence)
        .bind(event.recurrence_until)
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(self.pool())
        .await?;

        Ok(event)
    }

    async fn add_todo(&self, data: NewTodo) -> Result<Todo, CoreError> {
        let recurrence_until = data.recurrence.is_recurring().then_some(data.recurrence_until).flatten();
        validate_recurrence_config(data.recurrence, recurrence_until, data.due_on)?;

        let now = Utc::now();
        let todo = Todo {
            id: Uuid::now_v7(),
            title: data.title,
            notes: data.notes,
            course: data.course,
            due_on: data.due_on,
            completed: false,
            recurrence: data.recurrence,
            recurrence_until,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"INSERT INTO todos (id, title, notes, course, due_on, completed, recurrence, recurrence_until, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"#,
        )
        .bind(todo.id)
        .bind(&todo.title)
        .bind(&todo.notes)
        .bind(&todo.course)
        .bind(todo.due_on)
        .bind(todo.completed)
        .bind(todo.recurrence)
        .bind(todo.recurrence_until)
        .bind(todo.created_at)
        .bind(todo.updated_at)
        .execute(self.pool())
        .await?;

        Ok(todo)
    }

    async fn add_assignment(&self, data: NewAssignment) -> Result<Assignment, CoreError> {
        let recurrence_until = data.recurrence.is_recurring().then_some(data.recurrence_until).flatten();
        validate_recurrence_config(data.recurrence, recurrence_until, Some(data.due_on))?;

        let now = Utc::now();
        let assignment = Assignment {
            id: Uuid::now_v7(),
            title: data.title,
            description: data.description,
            course: data.course,
            due_on: data.due_on,
            completed: false,
            recurrence: data.recurrence,
            recurrence_until,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"INSERT INTO assignments (id, title, description, course, due_on, completed, recurrence, recurrence_until, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"#,
        )
        .bind(assignment.id)
        .bind(&assignment.title)
        .bind(&assignment.description)
        .bind(&assignment.course)
        .bind(assignment.due_on)
        .bind(assignment.completed)
        .bind(assignment.recurrence)
        .bind(assignment.recurrence_until)
        .bind(assignment.created_at)
        .bind(assignment.updated_at)
        .execute(self.pool())
        .await?;

        Ok(assignment)
    }

    async fn find_template(
        &self,
        kind: TemplateKind,
        id: Uuid,
    ) -> Result<Option<Template>, CoreError> {
        let template = match kind {
            TemplateKind::Event => {
                sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
                    .bind(id)
                    .fetch_optional(self.pool())
                    .await?
                    .map(Template::Event)
            }
            TemplateKind::Todo => sqlx::query_as::<_, Todo>("SELECT * FROM todos WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool())
                .await?
                .map(Template::Todo),
            TemplateKind::Assignment => {
                sqlx::query_as::<_, Assignment>("SELECT * FROM assignments WHERE id = $1")
                    .bind(id)
                    .fetch_optional(self.pool())
                    .await?
                    .map(Template::Assignment)
            }
        };
        Ok(template)
    }

    async fn list_templates(&self, filters: &[Filter]) -> Result<Vec<Template>, CoreError> {
        let kinds: Vec<TemplateKind> = filters
            .iter()
            .filter_map(|f| match f {
                Filter::Kind(kind) => Some(*kind),
                _ => None,
            })
            .collect();
        let wants = |kind: TemplateKind| kinds.is_empty() || kinds.contains(&kind);
        let course = filters.iter().find_map(|f| match f {
            Filter::Course(course) => Some(course.clone()),
            _ => None,
        });
        let completed = filters.iter().find_map(|f| match f {
            Filter::Completed(completed) => Some(*completed),
            _ => None,
        });

        let mut templates = Vec::new();

        // Events have neither a course nor a completion flag, so either
        // filter excludes them.
        if wants(TemplateKind::Event) && course.is_none() && completed.is_none() {
            let events = sqlx::query_as::<_, Event>("SELECT * FROM events ORDER BY starts_at")
                .fetch_all(self.pool())
                .await?;
            templates.extend(events.into_iter().map(Template::Event));
        }

        if wants(TemplateKind::Todo) {
            let mut qb: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("SELECT * FROM todos");
            push_task_filters(&mut qb, &course, completed);
            qb.push(" ORDER BY due_on");
            let todos: Vec<Todo> = qb.build_query_as().fetch_all(self.pool()).await?;
            templates.extend(todos.into_iter().map(Template::Todo));
        }

        if wants(TemplateKind::Assignment) {
            let mut qb: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("SELECT * FROM assignments");
            push_task_filters(&mut qb, &course, completed);
            qb.push(" ORDER BY due_on");
            let assignments: Vec<Assignment> = qb.build_query_as().fetch_all(self.pool()).await?;
            templates.extend(assignments.into_iter().map(Template::Assignment));
        }

        Ok(templates)
    }

    async fn update_template(
        &self,
        kind: TemplateKind,
        id: Uuid,
        changes: TemplateChanges,
    ) -> Result<Template, CoreError> {
        let mut template = self
            .find_template(kind, id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("{} {}", kind, id)))?;

        template.apply_changes(&changes);
        template.validate_recurrence()?;

        match &template {
            Template::Event(e) => {
                sqlx::query(
                    r#"UPDATE events
                    SET title = $1, description = $2, calendar_id = $3, starts_at = $4, ends_at = $5,
                        recurrence = $6, recurrence_until = $7, updated_at = $8
                    WHERE id = $9"#,
                )
                .bind(&e.title)
                .bind(&e.description)
                .bind(e.calendar_id)
                .bind(e.starts_at)
                .bind(e.ends_at)
                .bind(e.recurrence)
                .bind(e.recurrence_until)
                .bind(e.updated_at)
                .bind(e.id)
                .execute(self.pool())
                .await?;
            }
            Template::Todo(t) => {
                sqlx::query(
                    r#"UPDATE todos
                    SET title = $1, notes = $2, course = $3, due_on = $4, completed = $5,
                        recurrence = $6, recurrence_until = $7, updated_at = $8
                    WHERE id = $9"#,
                )
                .bind(&t.title)
                .bind(&t.notes)
                .bind(&t.course)
                .bind(t.due_on)
                .bind(t.completed)
                .bind(t.recurrence)
                .bind(t.recurrence_until)
                .bind(t.updated_at)
                .bind(t.id)
                .execute(self.pool())
                .await?;
            }
            Template::Assignment(a) => {
                sqlx::query(
                    r#"UPDATE assignments
                    SET title = $1, description = $2, course = $3, due_on = $4, completed = $5,
                        recurrence = $6, recurrence_until = $7, updated_at = $8
                    WHERE id = $9"#,
                )
                .bind(&a.title)
                .bind(&a.description)
                .bind(&a.course)
                .bind(a.due_on)
                .bind(a.completed)
                .bind(a.recurrence)
                .bind(a.recurrence_until)
                .bind(a.updated_at)
                .bind(a.id)
                .execute(self.pool())
                .await?;
            }
        }

        Ok(template)
    }

    async fn delete_template(&self, kind: TemplateKind, id: Uuid) -> Result<(), CoreError> {
        let mut tx = self.pool().begin().await?;

        // Exceptions go with the template; leaving them orphaned is a
        // consistency bug. One transaction keeps the pair atomic.
        sqlx::query("DELETE FROM occurrence_exceptions WHERE parent_kind = $1 AND parent_id = $2")
            .bind(kind)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let statement = format!("DELETE FROM {} WHERE id = $1", table_name(kind));
        let result = sqlx::query(&statement).bind(id).execute(&mut *tx).await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("{} {}", kind, id)));
        }

        tx.commit().await?;
        Ok(())
    }
}

fn push_task_filters(
    qb: &mut QueryBuilder<'_, sqlx::Sqlite>,
    course: &Option<String>,
    completed: Option<bool>,
) {
    let mut first = true;
    if let Some(course) = course {
        qb.push(" WHERE course = ");
        qb.push_bind(course.clone());
        first = false;
    }
    if let Some(completed) = completed {
        qb.push(if first { " WHERE " } else { " AND " });
        qb.push("completed = ");
        qb.push_bind(completed);
    }
}
