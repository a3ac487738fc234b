// Error taxonomy for TaskStore operations

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by [`crate::TaskStore`].
///
/// None of these are fatal. Validation errors leave the collection untouched;
/// file errors leave it in a usable state (possibly empty after a bad load).
#[derive(Debug, Error)]
pub enum TaskError {
    /// Task text was missing or blank
    #[error("task description cannot be empty")]
    EmptyDescription,

    /// Deadline did not parse as DD-MM-YYYY
    #[error("invalid deadline '{0}' (expected DD-MM-YYYY)")]
    InvalidDate(String),

    /// No task with this id
    #[error("task not found: {0}")]
    NotFound(String),

    /// Backing file exists but is not a JSON array
    #[error("task file {path:?} is corrupted, starting fresh")]
    CorruptFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Backing file exists but could not be read
    #[error("failed to read task file {path:?}")]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Backing file could not be written; in-memory state is still current
    #[error("failed to save tasks to {path:?}")]
    PersistFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TaskError {
    /// True for the errors that reject an operation before anything changes.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TaskError::EmptyDescription | TaskError::InvalidDate(_) | TaskError::NotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, TaskError>;

/// Outcome of a mutation that has been applied in memory.
///
/// The mutation always stands. `persist_error` is set when writing the
/// backing file failed afterwards, so the caller can tell the user the change
/// only lives in memory.
#[derive(Debug)]
#[must_use = "a persist failure is reported through this value"]
pub struct Applied<T> {
    pub value: T,
    pub persist_error: Option<TaskError>,
}

impl<T> Applied<T> {
    pub(crate) fn new(value: T, persisted: Result<()>) -> Self {
        Self {
            value,
            persist_error: persisted.err(),
        }
    }

    pub fn persisted(&self) -> bool {
        self.persist_error.is_none()
    }

    /// Treat a persist failure as an error, discarding the value.
    pub fn into_result(self) -> Result<T> {
        match self.persist_error {
            Some(e) => Err(e),
            None => Ok(self.value),
        }
    }
}
