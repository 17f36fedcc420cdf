//! Project and task mutations.
//!
//! Every function here is pure over the two in-memory datasets: it validates,
//! mutates, and returns the affected record. Loading and saving around them
//! is [`DataStore`](crate::storage::DataStore)'s job.

pub mod projects;
pub mod tasks;

pub use projects::{add_project, delete_project, rename_project};
pub use tasks::{add_task, delete_task, update_task};

use crate::storage::types::Dataset;

pub(crate) fn project_exists(active: &Dataset, archive: &Dataset, id: &str) -> bool {
    active
        .projects
        .iter()
        .chain(archive.projects.iter())
        .any(|project| project.id == id)
}
