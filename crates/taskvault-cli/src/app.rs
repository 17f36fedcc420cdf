//! Application wiring for the TaskVault CLI.
//!
//! - [`AppContext`] bundles CLI flags with the lazily resolved config and store
//! - [`ConsoleGate`] stands in for a biometric sensor on a terminal
//! - resolvers map user-facing references to projects and tasks

mod context;
mod gate;
mod resolver;
mod unlock;

pub use context::AppContext;
pub use resolver::{resolve_project, resolve_task};
pub use unlock::unlock_session;
