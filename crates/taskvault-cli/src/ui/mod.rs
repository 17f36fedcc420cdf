//! Terminal output for the TaskVault CLI.
//!
//! Commands build a [`UiContext`] once, then render through the helpers in
//! [`render`]. JSON mode bypasses rendering entirely.

mod context;
pub mod format;
mod mode;
pub mod render;
pub mod theme;

pub use context::UiContext;
pub use theme::Badge;

pub use render::{badge, blank_line, header, hint, kv, print, table, Column};

pub use format::{format_datetime, short_id, truncate};
