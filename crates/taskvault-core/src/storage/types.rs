//! Core data types for the storage layer.
//!
//! These are the on-disk schema types. Optional or missing fields are
//! defaulted at the load boundary (serde defaults plus [`Dataset::normalize`]),
//! so mutators downstream can rely on the invariants without re-checking.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VaultError};

/// Current dataset schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Id of the project that always exists and cannot be removed.
pub const INBOX_ID: &str = "inbox";

/// Display name of the inbox project.
pub const INBOX_NAME: &str = "Inbox";

/// Maximum number of tags per task.
pub const MAX_TAGS: usize = 20;

/// Task priority in `0..=3`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "u8")]
pub struct Priority(u8);

impl Priority {
    pub const MAX: u8 = 3;

    /// Strict constructor: values outside `0..=3` are rejected.
    pub fn new(value: i64) -> Result<Self> {
        if (0..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(VaultError::Validation(format!(
                "Priority must be between 0 and {} (got {})",
                Self::MAX,
                value
            )))
        }
    }

    /// Lenient constructor used for user input: clamps into range.
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(0, i64::from(Self::MAX)) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Priority {
    type Error = VaultError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.0
    }
}

/// Calendar date serialized as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IsoDate(NaiveDate);

impl IsoDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }
}

impl FromStr for IsoDate {
    type Err = VaultError;

    fn from_str(value: &str) -> Result<Self> {
        NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
            .map(IsoDate)
            .map_err(|_| VaultError::Validation(format!("Date must be YYYY-MM-DD (got {})", value)))
    }
}

impl TryFrom<String> for IsoDate {
    type Error = VaultError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<IsoDate> for String {
    fn from(date: IsoDate) -> Self {
        date.to_string()
    }
}

impl fmt::Display for IsoDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// A project grouping tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique identifier (`inbox` for the built-in project, otherwise a UUID)
    pub id: String,

    /// Display name, unique case-insensitively across both datasets
    pub name: String,

    /// When this project was created
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn inbox(created_at: DateTime<Utc>) -> Self {
        Self {
            id: INBOX_ID.to_string(),
            name: INBOX_NAME.to_string(),
            created_at,
        }
    }
}

/// A task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier (UUID)
    pub id: String,

    /// Title, non-empty after trimming
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Owning project; must resolve in Active or Archive
    #[serde(default = "default_project_id")]
    pub project_id: String,

    #[serde(default)]
    pub due_date: Option<IsoDate>,

    #[serde(default)]
    pub priority: Priority,

    /// Trimmed, non-empty, at most [`MAX_TAGS`]
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub completed: bool,

    /// Set exactly when `completed` flips to true, cleared when it flips back
    #[serde(default)]
    pub date_completed: Option<DateTime<Utc>>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Timestamp used to order completed tasks for archiving.
    pub fn archive_key(&self) -> DateTime<Utc> {
        self.date_completed.unwrap_or(self.created_at)
    }
}

fn default_project_id() -> String {
    INBOX_ID.to_string()
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// One persisted dataset: Active (`db.json`) or Archive (`archive.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub projects: Vec<Project>,

    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Dataset {
    /// Fresh Active dataset holding only the inbox project.
    pub fn new_active(created_at: DateTime<Utc>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            created_at,
            projects: vec![Project::inbox(created_at)],
            tasks: Vec::new(),
        }
    }

    /// Empty Archive sharing the Active dataset's creation timestamp.
    pub fn empty_archive(created_at: DateTime<Utc>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            created_at,
            projects: Vec::new(),
            tasks: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty() && self.tasks.is_empty()
    }

    /// Apply defaulting rules to a freshly loaded document.
    ///
    /// - `completed == false` clears any stray `dateCompleted`
    /// - tags are re-sanitized
    pub fn normalize(&mut self) {
        for task in &mut self.tasks {
            if !task.completed {
                task.date_completed = None;
            }
            task.tags = sanitize_tags(&task.tags);
        }
    }
}

/// Trim tags, drop empties and duplicates, keep at most [`MAX_TAGS`].
pub fn sanitize_tags(tags: &[String]) -> Vec<String> {
    let mut sanitized: Vec<String> = Vec::new();
    for tag in tags {
        let trimmed = tag.trim();
        if trimmed.is_empty() || sanitized.iter().any(|existing| existing == trimmed) {
            continue;
        }
        sanitized.push(trimmed.to_string());
        if sanitized.len() == MAX_TAGS {
            break;
        }
    }
    sanitized
}

/// Read-only union of Active and Archive. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedView {
    pub projects: Vec<Project>,
    pub tasks: Vec<Task>,
}

impl MergedView {
    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|project| project.id == id)
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }
}

/// Fields for a new task. Absent fields take their defaults.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub project_id: Option<String>,
    pub due_date: Option<IsoDate>,
    pub priority: Option<i64>,
    pub tags: Vec<String>,
    pub completed: bool,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Partial update. Only `Some` fields are applied.
///
/// `due_date: Some(None)` clears the due date.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub project_id: Option<String>,
    pub due_date: Option<Option<IsoDate>>,
    pub priority: Option<i64>,
    pub tags: Option<Vec<String>>,
    pub completed: Option<bool>,
}
