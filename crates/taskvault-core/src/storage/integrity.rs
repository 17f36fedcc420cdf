//! Consistency checks over the loaded datasets.

use std::collections::HashSet;

use serde::Serialize;

use crate::storage::merge::merge;
use crate::storage::types::{Dataset, INBOX_ID};

/// Problems found by [`check_integrity`]. Empty means healthy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    pub active_tasks: usize,
    pub archived_tasks: usize,
    /// Archived tasks reopened in place; informational only
    pub reopened_archived_tasks: usize,
    pub problems: Vec<String>,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Check the cross-dataset invariants.
///
/// - the inbox exists
/// - project ids are unique within each dataset; a project in both is
///   resolved the way the merged view resolves it (Active wins)
/// - task ids are unique across both datasets
/// - project names are unique case-insensitively among the merged projects
/// - every task's project resolves
/// - completed tasks carry a completion date
pub fn check_integrity(active: &Dataset, archive: &Dataset) -> IntegrityReport {
    let mut problems = Vec::new();

    for (label, dataset) in [("active", active), ("archive", archive)] {
        let mut ids = HashSet::new();
        for project in &dataset.projects {
            if !ids.insert(project.id.as_str()) {
                problems.push(format!("duplicate project id {} in {}", project.id, label));
            }
        }
    }

    let view = merge(active, archive);
    let mut names = HashSet::new();
    for project in &view.projects {
        if !names.insert(project.name.to_lowercase()) {
            problems.push(format!("duplicate project name \"{}\"", project.name));
        }
    }
    let project_ids: HashSet<&str> = view.projects.iter().map(|p| p.id.as_str()).collect();
    if !project_ids.contains(INBOX_ID) {
        problems.push("inbox project is missing".to_string());
    }

    let mut task_ids = HashSet::new();
    for task in &view.tasks {
        if !task_ids.insert(task.id.as_str()) {
            problems.push(format!("duplicate task id {}", task.id));
        }
        if !project_ids.contains(task.project_id.as_str()) {
            problems.push(format!(
                "task {} references missing project {}",
                task.id, task.project_id
            ));
        }
        if task.completed && task.date_completed.is_none() {
            problems.push(format!("completed task {} has no completion date", task.id));
        }
    }

    IntegrityReport {
        active_tasks: active.tasks.len(),
        archived_tasks: archive.tasks.len(),
        reopened_archived_tasks: archive.tasks.iter().filter(|task| !task.completed).count(),
        problems,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{add_project, add_task};
    use crate::storage::types::{NewTask, Project};
    use chrono::Utc;

    #[test]
    fn test_healthy_datasets() {
        let now = Utc::now();
        let mut active = Dataset::new_active(now);
        let mut archive = Dataset::empty_archive(now);
        add_project(&mut active, &mut archive, "Work").unwrap();
        add_task(&mut active, &mut archive, NewTask::new("x")).unwrap();

        let report = check_integrity(&active, &archive);
        assert!(report.is_healthy(), "{:?}", report.problems);
        assert_eq!(report.active_tasks, 1);
    }

    #[test]
    fn test_reopened_archived_task_is_not_a_problem() {
        let now = Utc::now();
        let mut active = Dataset::new_active(now);
        let mut archive = Dataset::empty_archive(now);
        add_task(&mut active, &mut archive, NewTask::new("x")).unwrap();
        archive.tasks.push(active.tasks.remove(0));

        let report = check_integrity(&active, &archive);
        assert!(report.is_healthy(), "{:?}", report.problems);
        assert_eq!(report.reopened_archived_tasks, 1);
    }

    #[test]
    fn test_project_in_both_datasets_is_healthy() {
        let now = Utc::now();
        let mut active = Dataset::new_active(now);
        let mut archive = Dataset::empty_archive(now);
        let work = add_project(&mut active, &mut archive, "Work").unwrap();
        archive.projects.push(Project {
            name: "Work (old)".to_string(),
            ..work
        });

        let report = check_integrity(&active, &archive);
        assert!(report.is_healthy(), "{:?}", report.problems);
    }

    #[test]
    fn test_duplicate_project_id_within_dataset() {
        let now = Utc::now();
        let mut active = Dataset::new_active(now);
        let archive = Dataset::empty_archive(now);
        active.projects.push(Project::inbox(now));

        let report = check_integrity(&active, &archive);
        assert_eq!(report.problems.len(), 1);
        assert!(report.problems[0].contains("duplicate project id inbox in active"));
    }

    #[test]
    fn test_dangling_project_and_duplicate_name() {
        let now = Utc::now();
        let mut active = Dataset::new_active(now);
        let mut archive = Dataset::empty_archive(now);
        add_task(&mut active, &mut archive, NewTask::new("x")).unwrap();
        active.tasks[0].project_id = "ghost".to_string();
        archive.projects.push(Project {
            id: "other".to_string(),
            name: "inbox".to_string(),
            created_at: now,
        });

        let report = check_integrity(&active, &archive);
        assert_eq!(report.problems.len(), 2);
    }
}
