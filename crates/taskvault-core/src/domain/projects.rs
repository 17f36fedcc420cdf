use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, VaultError};
use crate::storage::types::{Dataset, Project, INBOX_ID};

fn normalized_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(VaultError::Validation(
            "Project name cannot be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

fn ensure_unique(active: &Dataset, archive: &Dataset, name: &str, skip_id: Option<&str>) -> Result<()> {
    let lowered = name.to_lowercase();
    let clash = active
        .projects
        .iter()
        .chain(archive.projects.iter())
        .filter(|project| Some(project.id.as_str()) != skip_id)
        .any(|project| project.name.to_lowercase() == lowered);
    if clash {
        return Err(VaultError::DuplicateName(name.to_string()));
    }
    Ok(())
}

/// Create a project in Active. Names are unique case-insensitively across both datasets.
pub fn add_project(active: &mut Dataset, archive: &mut Dataset, name: &str) -> Result<Project> {
    let name = normalized_name(name)?;
    ensure_unique(active, archive, &name, None)?;

    let project = Project {
        id: Uuid::new_v4().to_string(),
        name,
        created_at: Utc::now(),
    };
    active.projects.push(project.clone());
    debug!(project = %project.id, "added project");
    Ok(project)
}

/// Rename a project wherever it lives.
pub fn rename_project(
    active: &mut Dataset,
    archive: &mut Dataset,
    id: &str,
    name: &str,
) -> Result<Project> {
    let name = normalized_name(name)?;
    ensure_unique(active, archive, &name, Some(id))?;

    let project = active
        .projects
        .iter_mut()
        .chain(archive.projects.iter_mut())
        .find(|project| project.id == id)
        .ok_or_else(|| VaultError::NotFound(format!("project {}", id)))?;
    project.name = name;
    Ok(project.clone())
}

/// Delete a project, moving its tasks in both datasets to the inbox.
///
/// Returns the number of reassigned tasks.
pub fn delete_project(active: &mut Dataset, archive: &mut Dataset, id: &str) -> Result<usize> {
    if id == INBOX_ID {
        return Err(VaultError::InvalidInput(
            "The inbox project cannot be deleted".to_string(),
        ));
    }

    let before = active.projects.len() + archive.projects.len();
    active.projects.retain(|project| project.id != id);
    archive.projects.retain(|project| project.id != id);
    if active.projects.len() + archive.projects.len() == before {
        return Err(VaultError::NotFound(format!("project {}", id)));
    }

    let now = Utc::now();
    let mut reassigned = 0;
    for task in active.tasks.iter_mut().chain(archive.tasks.iter_mut()) {
        if task.project_id == id {
            task.project_id = INBOX_ID.to_string();
            task.updated_at = now;
            reassigned += 1;
        }
    }
    debug!(project = %id, reassigned, "deleted project");
    Ok(reassigned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tasks::add_task;
    use crate::storage::types::NewTask;

    fn datasets() -> (Dataset, Dataset) {
        let now = Utc::now();
        (Dataset::new_active(now), Dataset::empty_archive(now))
    }

    #[test]
    fn test_add_project_trims_name() {
        let (mut active, mut archive) = datasets();
        let project = add_project(&mut active, &mut archive, "  Work  ").unwrap();
        assert_eq!(project.name, "Work");
        assert_eq!(active.projects.len(), 2);
    }

    #[test]
    fn test_blank_name_rejected() {
        let (mut active, mut archive) = datasets();
        assert!(matches!(
            add_project(&mut active, &mut archive, "   "),
            Err(VaultError::Validation(_))
        ));
    }

    #[test]
    fn test_duplicate_is_case_insensitive_across_datasets() {
        let (mut active, mut archive) = datasets();
        archive.projects.push(Project {
            id: "old".to_string(),
            name: "Garden".to_string(),
            created_at: Utc::now(),
        });

        assert!(matches!(
            add_project(&mut active, &mut archive, "garden"),
            Err(VaultError::DuplicateName(_))
        ));
        assert!(matches!(
            add_project(&mut active, &mut archive, "INBOX"),
            Err(VaultError::DuplicateName(_))
        ));
    }

    #[test]
    fn test_rename_allows_case_change_of_self() {
        let (mut active, mut archive) = datasets();
        let project = add_project(&mut active, &mut archive, "work").unwrap();

        let renamed = rename_project(&mut active, &mut archive, &project.id, "Work").unwrap();
        assert_eq!(renamed.name, "Work");
    }

    #[test]
    fn test_rename_archived_project() {
        let (mut active, mut archive) = datasets();
        archive.projects.push(Project {
            id: "old".to_string(),
            name: "Old".to_string(),
            created_at: Utc::now(),
        });

        rename_project(&mut active, &mut archive, "old", "Older").unwrap();
        assert_eq!(archive.projects[0].name, "Older");
    }

    #[test]
    fn test_rename_missing_project() {
        let (mut active, mut archive) = datasets();
        assert!(matches!(
            rename_project(&mut active, &mut archive, "nope", "x"),
            Err(VaultError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_reassigns_tasks_in_both_datasets() {
        let (mut active, mut archive) = datasets();
        let work = add_project(&mut active, &mut archive, "Work").unwrap();
        let mut new_task = NewTask::new("write report");
        new_task.project_id = Some(work.id.clone());
        add_task(&mut active, &mut archive, new_task.clone()).unwrap();
        let archived = add_task(&mut active, &mut archive, new_task).unwrap();
        let index = active.tasks.iter().position(|t| t.id == archived.id).unwrap();
        archive.tasks.push(active.tasks.remove(index));

        let reassigned = delete_project(&mut active, &mut archive, &work.id).unwrap();

        assert_eq!(reassigned, 2);
        assert!(active
            .tasks
            .iter()
            .chain(archive.tasks.iter())
            .all(|t| t.project_id == INBOX_ID));
        assert!(!active.projects.iter().any(|p| p.id == work.id));
    }

    #[test]
    fn test_inbox_cannot_be_deleted() {
        let (mut active, mut archive) = datasets();
        assert!(matches!(
            delete_project(&mut active, &mut archive, INBOX_ID),
            Err(VaultError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_delete_missing_project() {
        let (mut active, mut archive) = datasets();
        assert!(matches!(
            delete_project(&mut active, &mut archive, "nope"),
            Err(VaultError::NotFound(_))
        ));
    }
}
