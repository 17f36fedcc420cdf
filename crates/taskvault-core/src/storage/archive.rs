//! Active → Archive overflow migration.
//!
//! When the Active dataset grows past the threshold, the oldest completed
//! tasks move to the Archive until Active is back at the threshold (or no
//! completed tasks remain). Tasks never move back.

use std::collections::HashSet;

use crate::storage::types::{Dataset, SCHEMA_VERSION};

/// Move overflow tasks from `active` to `archive`. Returns how many moved.
///
/// Oldest is by `dateCompleted`, falling back to `createdAt`; ties keep
/// their Active order. Moved tasks are appended to the Archive in their
/// Active order. A dataset at or under the threshold is left untouched.
pub fn migrate_overflow(active: &mut Dataset, archive: &mut Dataset, threshold: usize) -> usize {
    if active.tasks.len() <= threshold {
        return 0;
    }
    let overflow = active.tasks.len() - threshold;

    let mut candidates: Vec<(usize, chrono::DateTime<chrono::Utc>)> = active
        .tasks
        .iter()
        .enumerate()
        .filter(|(_, task)| task.completed)
        .map(|(index, task)| (index, task.archive_key()))
        .collect();
    candidates.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));

    let move_set: HashSet<usize> = candidates
        .into_iter()
        .take(overflow)
        .map(|(index, _)| index)
        .collect();
    if move_set.is_empty() {
        return 0;
    }

    if archive.tasks.is_empty() && archive.projects.is_empty() {
        archive.schema_version = SCHEMA_VERSION;
        archive.created_at = active.created_at;
    }

    let mut kept = Vec::with_capacity(active.tasks.len() - move_set.len());
    for (index, task) in active.tasks.drain(..).enumerate() {
        if move_set.contains(&index) {
            archive.tasks.push(task);
        } else {
            kept.push(task);
        }
    }
    active.tasks = kept;

    move_set.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::types::{Priority, Task, INBOX_ID};
    use chrono::{Duration, TimeZone, Utc};

    fn task(id: usize, completed_offset: Option<i64>) -> Task {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Task {
            id: format!("t{}", id),
            title: format!("task {}", id),
            description: String::new(),
            project_id: INBOX_ID.to_string(),
            due_date: None,
            priority: Priority::default(),
            tags: Vec::new(),
            completed: completed_offset.is_some(),
            date_completed: completed_offset.map(|minutes| base + Duration::minutes(minutes)),
            created_at: base,
            updated_at: base,
        }
    }

    fn datasets(tasks: Vec<Task>) -> (Dataset, Dataset) {
        let created = Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap();
        let mut active = Dataset::new_active(created);
        active.tasks = tasks;
        (active, Dataset::empty_archive(created))
    }

    #[test]
    fn test_under_threshold_is_noop() {
        let (mut active, mut archive) = datasets((0..5).map(|i| task(i, Some(1))).collect());
        assert_eq!(migrate_overflow(&mut active, &mut archive, 5), 0);
        assert_eq!(active.tasks.len(), 5);
        assert!(archive.tasks.is_empty());
    }

    #[test]
    fn test_oldest_completed_moves_first() {
        // Task 3 finished earliest.
        let tasks = vec![
            task(0, Some(50)),
            task(1, Some(40)),
            task(2, None),
            task(3, Some(10)),
            task(4, Some(30)),
        ];
        let (mut active, mut archive) = datasets(tasks);

        assert_eq!(migrate_overflow(&mut active, &mut archive, 3), 2);
        let archived: Vec<&str> = archive.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(archived, vec!["t3", "t4"]);
        let remaining: Vec<&str> = active.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(remaining, vec!["t0", "t1", "t2"]);
    }

    #[test]
    fn test_incomplete_tasks_never_move() {
        let mut tasks: Vec<Task> = (0..4).map(|i| task(i, None)).collect();
        tasks.push(task(4, Some(5)));
        let (mut active, mut archive) = datasets(tasks);

        // Overflow is 3 but only one task is completed.
        assert_eq!(migrate_overflow(&mut active, &mut archive, 2), 1);
        assert_eq!(active.tasks.len(), 4);
        assert!(active.tasks.iter().all(|t| !t.completed));
    }

    #[test]
    fn test_missing_completion_time_falls_back_to_creation() {
        let mut early = task(0, Some(0));
        early.date_completed = None;
        early.created_at = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let (mut active, mut archive) = datasets(vec![task(1, Some(1)), early]);

        assert_eq!(migrate_overflow(&mut active, &mut archive, 1), 1);
        assert_eq!(archive.tasks[0].id, "t0");
    }

    #[test]
    fn test_repeat_migration_is_stable() {
        let (mut active, mut archive) =
            datasets((0..2001).map(|i| task(i, Some(i as i64))).collect());

        assert_eq!(migrate_overflow(&mut active, &mut archive, 2000), 1);
        assert_eq!(archive.tasks[0].id, "t0");
        assert_eq!(migrate_overflow(&mut active, &mut archive, 2000), 0);
        assert_eq!(active.tasks.len(), 2000);
        assert_eq!(archive.tasks.len(), 1);
    }
}
