//! Error types for the helper.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the helper.
#[derive(Error, Debug)]
pub enum Error {
    // Identity parsing errors (per-file: skip the file, keep the folder)
    #[error("Cannot parse identity from: {0}")]
    UnparsableIdentity(String),

    // Catalog matching errors (per-folder: skip this run, retry next run)
    #[error("No catalog match for: {0}")]
    NotFound(String),

    #[error("Ambiguous catalog match for: {0}")]
    AmbiguousMatch(String),

    // Collaborator errors (network/timeout - per-folder skip)
    #[error("{service} unavailable: {reason}")]
    CollaboratorUnavailable {
        service: &'static str,
        reason: String,
    },

    // State store errors (fatal for the run)
    #[error("State store failure: {0}")]
    PersistenceFailure(String),

    // Configuration errors
    #[error("TMDB API key not configured. Set TMDB_API_KEY environment variable")]
    TmdbApiKeyMissing,

    // File system errors
    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Target already exists: {0}")]
    TargetExists(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from a string.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Wrap a collaborator transport failure.
    pub fn unavailable<E: std::fmt::Display>(service: &'static str, err: E) -> Self {
        Error::CollaboratorUnavailable {
            service,
            reason: err.to_string(),
        }
    }

    /// True when the whole run must abort (idempotency cannot be upheld).
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::PersistenceFailure(_))
    }
}
