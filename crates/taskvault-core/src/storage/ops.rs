//! Load → mutate → save wrappers around the domain mutators.

use crate::domain;
use crate::error::Result;
use crate::session::SessionLock;
use crate::storage::integrity::{check_integrity, IntegrityReport};
use crate::storage::store::DataStore;
use crate::storage::types::{Dataset, NewTask, Project, Task, TaskPatch};

impl DataStore {
    fn mutate<T>(
        &self,
        session: &SessionLock,
        f: impl FnOnce(&mut Dataset, &mut Dataset) -> Result<T>,
    ) -> Result<T> {
        let mut data = self.load(session)?;
        let value = f(&mut data.active, &mut data.archive)?;
        self.save(session, &mut data.active, &mut data.archive)?;
        Ok(value)
    }

    pub fn add_project(&self, session: &SessionLock, name: &str) -> Result<Project> {
        self.mutate(session, |active, archive| {
            domain::add_project(active, archive, name)
        })
    }

    pub fn rename_project(&self, session: &SessionLock, id: &str, name: &str) -> Result<Project> {
        self.mutate(session, |active, archive| {
            domain::rename_project(active, archive, id, name)
        })
    }

    /// Returns how many tasks moved to the inbox.
    pub fn delete_project(&self, session: &SessionLock, id: &str) -> Result<usize> {
        self.mutate(session, |active, archive| {
            domain::delete_project(active, archive, id)
        })
    }

    pub fn add_task(&self, session: &SessionLock, new_task: NewTask) -> Result<Task> {
        self.mutate(session, |active, archive| {
            domain::add_task(active, archive, new_task)
        })
    }

    pub fn update_task(&self, session: &SessionLock, id: &str, patch: TaskPatch) -> Result<Task> {
        self.mutate(session, |active, archive| {
            domain::update_task(active, archive, id, patch)
        })
    }

    pub fn delete_task(&self, session: &SessionLock, id: &str) -> Result<Task> {
        self.mutate(session, |active, archive| {
            domain::delete_task(active, archive, id)
        })
    }

    pub fn check_integrity(&self, session: &SessionLock) -> Result<IntegrityReport> {
        let data = self.load(session)?;
        Ok(check_integrity(&data.active, &data.archive))
    }
}
