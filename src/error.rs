//! Error types for devinfra

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by devinfra operations
#[derive(Debug, Error)]
pub enum Error {
    /// GitHub rejected the credentials (HTTP 401)
    ///
    /// This is never folded into a merge result: the whole session's token is
    /// unusable and the caller must stop.
    #[error("GitHub API request failed: {0}")]
    Unauthorized(String),

    /// GitHub API request failed with a known status code
    #[error("GitHub API error ({status}): {message}")]
    GitHubStatus {
        /// HTTP status code returned by GitHub
        status: u16,
        /// Message reported by GitHub
        message: String,
    },

    /// GitHub API error without a usable status code
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// Network call exceeded its time budget
    #[error("request timed out after {0}s: {1}")]
    Timeout(u64, String),

    /// Generic platform error (used by non-GitHub transports and test doubles)
    #[error("platform error: {0}")]
    Platform(String),

    /// A `git` invocation failed
    #[error("git command failed: git {args}: {stderr}")]
    Git {
        /// Arguments passed to git (credentials redacted)
        args: String,
        /// Captured stderr
        stderr: String,
    },

    /// Configuration could not be read or parsed
    #[error("config error: {0}")]
    Config(String),

    /// Configuration was parsed but failed validation
    #[error("invalid configuration:\n  - {}", .0.join("\n  - "))]
    InvalidConfig(Vec<String>),

    /// No GitHub token could be found
    #[error("authentication error: {0}")]
    Auth(String),

    /// npm registry lookup failed
    #[error("npm registry error: {0}")]
    Registry(String),

    /// Internal error (prompt failures and similar)
    #[error("internal error: {0}")]
    Internal(String),

    /// IO error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// HTTP client error
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Whether this error means the GitHub credentials are invalid
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// HTTP status code carried by the error, if any
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized(_) => Some(401),
            Self::GitHubStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Build an error from an HTTP status and message, routing 401 to `Unauthorized`
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status == 401 {
            Self::Unauthorized(message)
        } else {
            Self::GitHubStatus { status, message }
        }
    }
}

impl From<octocrab::Error> for Error {
    fn from(err: octocrab::Error) -> Self {
        match err {
            octocrab::Error::GitHub { source, .. } => {
                Self::from_status(source.status_code.as_u16(), source.message.clone())
            }
            other => Self::GitHubApi(other.to_string()),
        }
    }
}
