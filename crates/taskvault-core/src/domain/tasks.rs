use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::domain::project_exists;
use crate::error::{Result, VaultError};
use crate::storage::types::{sanitize_tags, Dataset, NewTask, Priority, Task, TaskPatch, INBOX_ID};

fn normalized_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(VaultError::Validation(
            "Task title cannot be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

fn resolve_project(active: &Dataset, archive: &Dataset, id: &str) -> Result<String> {
    if !project_exists(active, archive, id) {
        return Err(VaultError::NotFound(format!("project {}", id)));
    }
    Ok(id.to_string())
}

/// Create a task in Active.
///
/// The project defaults to the inbox and must exist in either dataset.
/// Priority is clamped into range and tags are sanitized.
pub fn add_task(active: &mut Dataset, archive: &mut Dataset, new_task: NewTask) -> Result<Task> {
    let title = normalized_title(&new_task.title)?;
    let project_id = resolve_project(
        active,
        archive,
        new_task.project_id.as_deref().unwrap_or(INBOX_ID),
    )?;

    let now = Utc::now();
    let task = Task {
        id: Uuid::new_v4().to_string(),
        title,
        description: new_task.description.unwrap_or_default(),
        project_id,
        due_date: new_task.due_date,
        priority: new_task.priority.map(Priority::clamped).unwrap_or_default(),
        tags: sanitize_tags(&new_task.tags),
        completed: new_task.completed,
        date_completed: new_task.completed.then_some(now),
        created_at: now,
        updated_at: now,
    };
    active.tasks.push(task.clone());
    debug!(task = %task.id, "added task");
    Ok(task)
}

/// Apply a partial update to a task in whichever dataset holds it.
///
/// Completing sets `dateCompleted`, un-completing clears it. `updatedAt` is
/// always refreshed. Archived tasks stay archived.
pub fn update_task(
    active: &mut Dataset,
    archive: &mut Dataset,
    id: &str,
    patch: TaskPatch,
) -> Result<Task> {
    let title = patch.title.as_deref().map(normalized_title).transpose()?;
    let project_id = patch
        .project_id
        .as_deref()
        .map(|project| resolve_project(active, archive, project))
        .transpose()?;

    let task = active
        .tasks
        .iter_mut()
        .chain(archive.tasks.iter_mut())
        .find(|task| task.id == id)
        .ok_or_else(|| VaultError::NotFound(format!("task {}", id)))?;

    let now = Utc::now();
    if let Some(title) = title {
        task.title = title;
    }
    if let Some(description) = patch.description {
        task.description = description;
    }
    if let Some(project_id) = project_id {
        task.project_id = project_id;
    }
    if let Some(due_date) = patch.due_date {
        task.due_date = due_date;
    }
    if let Some(priority) = patch.priority {
        task.priority = Priority::clamped(priority);
    }
    if let Some(tags) = patch.tags {
        task.tags = sanitize_tags(&tags);
    }
    if let Some(completed) = patch.completed {
        if completed && !task.completed {
            task.date_completed = Some(now);
        } else if !completed {
            task.date_completed = None;
        }
        task.completed = completed;
    }
    task.updated_at = now;

    Ok(task.clone())
}

/// Remove a task from whichever dataset holds it.
pub fn delete_task(active: &mut Dataset, archive: &mut Dataset, id: &str) -> Result<Task> {
    for dataset in [active, archive] {
        if let Some(index) = dataset.tasks.iter().position(|task| task.id == id) {
            let task = dataset.tasks.remove(index);
            debug!(task = %task.id, "deleted task");
            return Ok(task);
        }
    }
    Err(VaultError::NotFound(format!("task {}", id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::types::{IsoDate, Project};

    fn datasets() -> (Dataset, Dataset) {
        let now = Utc::now();
        (Dataset::new_active(now), Dataset::empty_archive(now))
    }

    #[test]
    fn test_add_task_defaults() {
        let (mut active, mut archive) = datasets();
        let task = add_task(&mut active, &mut archive, NewTask::new(" buy milk ")).unwrap();

        assert_eq!(task.title, "buy milk");
        assert_eq!(task.project_id, INBOX_ID);
        assert_eq!(task.priority.value(), 0);
        assert!(!task.completed);
        assert!(task.date_completed.is_none());
        assert_eq!(active.tasks.len(), 1);
    }

    #[test]
    fn test_add_task_clamps_priority_and_sanitizes_tags() {
        let (mut active, mut archive) = datasets();
        let new_task = NewTask {
            priority: Some(10),
            tags: vec![" home ".to_string(), "".to_string(), "home".to_string()],
            ..NewTask::new("x")
        };

        let task = add_task(&mut active, &mut archive, new_task).unwrap();
        assert_eq!(task.priority.value(), 3);
        assert_eq!(task.tags, vec!["home".to_string()]);
    }

    #[test]
    fn test_add_completed_task_stamps_completion() {
        let (mut active, mut archive) = datasets();
        let new_task = NewTask {
            completed: true,
            ..NewTask::new("done already")
        };
        let task = add_task(&mut active, &mut archive, new_task).unwrap();
        assert!(task.date_completed.is_some());
    }

    #[test]
    fn test_add_task_rejects_blank_title_and_unknown_project() {
        let (mut active, mut archive) = datasets();
        assert!(matches!(
            add_task(&mut active, &mut archive, NewTask::new("  ")),
            Err(VaultError::Validation(_))
        ));

        let new_task = NewTask {
            project_id: Some("ghost".to_string()),
            ..NewTask::new("x")
        };
        assert!(matches!(
            add_task(&mut active, &mut archive, new_task),
            Err(VaultError::NotFound(_))
        ));
    }

    #[test]
    fn test_add_task_to_archived_project() {
        let (mut active, mut archive) = datasets();
        archive.projects.push(Project {
            id: "old".to_string(),
            name: "Old".to_string(),
            created_at: Utc::now(),
        });
        let new_task = NewTask {
            project_id: Some("old".to_string()),
            ..NewTask::new("x")
        };
        assert!(add_task(&mut active, &mut archive, new_task).is_ok());
    }

    #[test]
    fn test_completion_round_trip() {
        let (mut active, mut archive) = datasets();
        let task = add_task(&mut active, &mut archive, NewTask::new("x")).unwrap();

        let done = TaskPatch {
            completed: Some(true),
            ..TaskPatch::default()
        };
        let updated = update_task(&mut active, &mut archive, &task.id, done).unwrap();
        assert!(updated.completed);
        assert!(updated.date_completed.is_some());
        assert!(updated.updated_at >= task.updated_at);

        let undone = TaskPatch {
            completed: Some(false),
            ..TaskPatch::default()
        };
        let updated = update_task(&mut active, &mut archive, &task.id, undone).unwrap();
        assert!(!updated.completed);
        assert!(updated.date_completed.is_none());
    }

    #[test]
    fn test_recompleting_keeps_original_stamp() {
        let (mut active, mut archive) = datasets();
        let new_task = NewTask {
            completed: true,
            ..NewTask::new("x")
        };
        let task = add_task(&mut active, &mut archive, new_task).unwrap();

        let again = TaskPatch {
            completed: Some(true),
            ..TaskPatch::default()
        };
        let updated = update_task(&mut active, &mut archive, &task.id, again).unwrap();
        assert_eq!(updated.date_completed, task.date_completed);
    }

    #[test]
    fn test_partial_update_leaves_other_fields() {
        let (mut active, mut archive) = datasets();
        let new_task = NewTask {
            description: Some("two litres".to_string()),
            due_date: Some("2030-01-01".parse::<IsoDate>().unwrap()),
            ..NewTask::new("buy milk")
        };
        let task = add_task(&mut active, &mut archive, new_task).unwrap();

        let patch = TaskPatch {
            title: Some("buy oat milk".to_string()),
            ..TaskPatch::default()
        };
        let updated = update_task(&mut active, &mut archive, &task.id, patch).unwrap();
        assert_eq!(updated.title, "buy oat milk");
        assert_eq!(updated.description, "two litres");
        assert_eq!(updated.due_date, task.due_date);

        let clear = TaskPatch {
            due_date: Some(None),
            ..TaskPatch::default()
        };
        let updated = update_task(&mut active, &mut archive, &task.id, clear).unwrap();
        assert!(updated.due_date.is_none());
    }

    #[test]
    fn test_archived_task_updates_in_place() {
        let (mut active, mut archive) = datasets();
        let task = add_task(&mut active, &mut archive, NewTask::new("x")).unwrap();
        archive.tasks.push(active.tasks.remove(0));

        let patch = TaskPatch {
            title: Some("y".to_string()),
            ..TaskPatch::default()
        };
        update_task(&mut active, &mut archive, &task.id, patch).unwrap();

        assert!(active.tasks.is_empty());
        assert_eq!(archive.tasks[0].title, "y");
    }

    #[test]
    fn test_invalid_update_changes_nothing() {
        let (mut active, mut archive) = datasets();
        let task = add_task(&mut active, &mut archive, NewTask::new("x")).unwrap();

        let patch = TaskPatch {
            title: Some("renamed".to_string()),
            project_id: Some("ghost".to_string()),
            ..TaskPatch::default()
        };
        assert!(update_task(&mut active, &mut archive, &task.id, patch).is_err());
        assert_eq!(active.tasks[0], task);
    }

    #[test]
    fn test_delete_task_from_either_dataset() {
        let (mut active, mut archive) = datasets();
        let first = add_task(&mut active, &mut archive, NewTask::new("a")).unwrap();
        let second = add_task(&mut active, &mut archive, NewTask::new("b")).unwrap();
        archive.tasks.push(active.tasks.remove(1));

        delete_task(&mut active, &mut archive, &first.id).unwrap();
        delete_task(&mut active, &mut archive, &second.id).unwrap();
        assert!(active.tasks.is_empty() && archive.tasks.is_empty());

        assert!(matches!(
            delete_task(&mut active, &mut archive, &first.id),
            Err(VaultError::NotFound(_))
        ));
    }
}
