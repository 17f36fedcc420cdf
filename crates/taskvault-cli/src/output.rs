//! Row and JSON builders shared by the list commands.

use serde::Serialize;

use taskvault_core::{MergedView, Project, Task};

use crate::ui::{format_datetime, short_id, truncate, Column};

pub const TASK_COLUMNS: [Column; 7] = [
    Column::new("ID"),
    Column::new("Title"),
    Column::new("Project"),
    Column::new("Due"),
    Column::new("Pri"),
    Column::new("Tags"),
    Column::new("Status"),
];

pub const PROJECT_COLUMNS: [Column; 4] = [
    Column::new("ID"),
    Column::new("Name"),
    Column::new("Open"),
    Column::new("Created"),
];

pub fn project_name<'a>(view: &'a MergedView, project_id: &'a str) -> &'a str {
    view.project(project_id)
        .map(|project| project.name.as_str())
        .unwrap_or(project_id)
}

pub fn task_row(view: &MergedView, task: &Task) -> Vec<String> {
    vec![
        short_id(&task.id),
        truncate(&task.title, 48),
        project_name(view, &task.project_id).to_string(),
        task.due_date.map(|d| d.to_string()).unwrap_or_default(),
        task.priority.value().to_string(),
        task.tags.join(","),
        if task.completed { "done" } else { "open" }.to_string(),
    ]
}

pub fn project_row(view: &MergedView, project: &Project) -> Vec<String> {
    let open = view
        .tasks
        .iter()
        .filter(|task| task.project_id == project.id && !task.completed)
        .count();
    vec![
        short_id(&project.id),
        project.name.clone(),
        open.to_string(),
        format_datetime(&project.created_at),
    ]
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use taskvault_core::{Priority, Project};

    #[test]
    fn test_task_row_uses_project_name() {
        let now = Utc::now();
        let view = MergedView {
            projects: vec![Project::inbox(now)],
            tasks: Vec::new(),
        };
        let task = Task {
            id: "0123456789".to_string(),
            title: "buy milk".to_string(),
            description: String::new(),
            project_id: "inbox".to_string(),
            due_date: Some("2030-01-01".parse().unwrap()),
            priority: Priority::clamped(2),
            tags: vec!["home".to_string(), "errand".to_string()],
            completed: false,
            date_completed: None,
            created_at: now,
            updated_at: now,
        };

        let row = task_row(&view, &task);
        assert_eq!(row[0], "01234567");
        assert_eq!(row[2], "Inbox");
        assert_eq!(row[3], "2030-01-01");
        assert_eq!(row[5], "home,errand");
        assert_eq!(row[6], "open");
    }
}
