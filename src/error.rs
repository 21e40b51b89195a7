//! Error types for map extraction, project storage and task editing.
//!
//! "No text found" and "no matches" are not errors; they are reported through
//! [`crate::mapping::ImportOutcome`].

/// Failure to turn uploaded bytes into raw text.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The bytes are not a well-formed PDF document.
    #[error("could not parse document: {0}")]
    DocumentParse(String),

    /// The document opened but a page's text layer could not be decoded.
    #[error("could not read text on page {page}: {reason}")]
    PageText {
        /// 1-based page number
        page: u32,
        /// Underlying parser message
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<lopdf::Error> for ExtractError {
    fn from(e: lopdf::Error) -> Self {
        ExtractError::DocumentParse(e.to_string())
    }
}

/// Failures of the on-disk project store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed project file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("project name cannot be empty")]
    EmptyName,

    #[error("project '{0}' already exists")]
    ProjectExists(String),

    #[error("project '{0}' not found")]
    ProjectNotFound(String),

    /// Another import for the same project holds the lock.
    #[error("an import is already running for project '{project}' (remove {lock} if it is stale)")]
    ImportInProgress { project: String, lock: String },
}

/// Failures when editing tasks or templates inside a project.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EditError {
    #[error("no task found for '{0}'")]
    TaskNotFound(String),

    #[error("'{label}' names several task groups ({}); use the id instead", .ids.join(", "))]
    AmbiguousTask { label: String, ids: Vec<String> },

    #[error("no step '{0}' in this task")]
    SubTaskNotFound(String),

    #[error("no category named '{0}'")]
    UnknownCategory(String),

    #[error("{operation} discards data and must be confirmed")]
    ConfirmationRequired { operation: &'static str },

    #[error("positions start at 1")]
    ZeroPosition,

    #[error("photo index {0} out of range")]
    PhotoNotFound(usize),

    #[error("invalid template: {0}")]
    InvalidTemplate(String),
}
