//! Building the read-only [`MergedView`] from Active and Archive.

use std::collections::HashMap;

use crate::storage::types::{Dataset, MergedView, Project};

/// Merge both datasets.
///
/// Projects are keyed by id: Archive entries are placed first, then Active
/// entries overwrite same-id entries in place or append. Tasks are Active
/// followed by Archive.
pub fn merge(active: &Dataset, archive: &Dataset) -> MergedView {
    let mut projects: Vec<Project> = Vec::with_capacity(active.projects.len() + archive.projects.len());
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for project in archive.projects.iter().chain(active.projects.iter()) {
        match positions.get(project.id.as_str()) {
            Some(&index) => projects[index] = project.clone(),
            None => {
                positions.insert(project.id.as_str(), projects.len());
                projects.push(project.clone());
            }
        }
    }

    let tasks = active
        .tasks
        .iter()
        .chain(archive.tasks.iter())
        .cloned()
        .collect();

    MergedView { projects, tasks }
}
