//! Persistence: the Active and Archive datasets and how they reach disk.

pub mod archive;
pub mod integrity;
pub mod merge;
mod ops;
pub mod store;
pub mod types;

pub use integrity::{check_integrity, IntegrityReport};
pub use store::{DataStore, DatasetKind, LoadedData};
pub use types::{Dataset, IsoDate, MergedView, NewTask, Priority, Project, Task, TaskPatch};
