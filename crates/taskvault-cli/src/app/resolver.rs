//! Resolving user-supplied project and task references.

use taskvault_core::{MergedView, Project, Task};

use crate::errors::CliError;

/// Find a project by exact id, else by case-insensitive name.
pub fn resolve_project<'a>(view: &'a MergedView, reference: &str) -> Result<&'a Project, CliError> {
    if let Some(project) = view.project(reference) {
        return Ok(project);
    }
    let lowered = reference.trim().to_lowercase();
    view.projects
        .iter()
        .find(|project| project.name.to_lowercase() == lowered)
        .ok_or_else(|| {
            CliError::not_found(format!("Project not found: {}", reference))
                .with_hint("Run `taskvault projects list` to see projects.")
        })
}

/// Find a task by exact id, else by unique id prefix.
pub fn resolve_task<'a>(view: &'a MergedView, reference: &str) -> Result<&'a Task, CliError> {
    if let Some(task) = view.task(reference) {
        return Ok(task);
    }
    let matches: Vec<&Task> = view
        .tasks
        .iter()
        .filter(|task| task.id.starts_with(reference))
        .collect();
    match matches.as_slice() {
        [task] => Ok(task),
        [] => Err(CliError::not_found(format!("Task not found: {}", reference))
            .with_hint("Run `taskvault tasks list --all` to find task ids.")),
        _ => Err(CliError::invalid_input(format!(
            "Task id prefix {} is ambiguous ({} matches)",
            reference,
            matches.len()
        ))),
    }
}
