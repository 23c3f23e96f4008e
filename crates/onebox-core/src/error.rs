//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing required identifier.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Collaborator is not configured or cannot be reached.
    #[error("{0} is unavailable")]
    Unavailable(String),

    /// Collaborator answered with a non-success status.
    #[error("{service} returned HTTP {status}: {body}")]
    UpstreamStatus {
        /// Collaborator name (e.g. `elasticsearch`).
        service: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Whether this error came from an external collaborator.
    ///
    /// Such failures are degraded to a fallback and never reach the
    /// caller of the pipeline.
    #[must_use]
    pub const fn is_collaborator_failure(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_) | Self::UpstreamStatus { .. } | Self::Http(_) | Self::Json(_)
        )
    }

    /// Builds an [`Error::UpstreamStatus`] from a failed response.
    pub(crate) async fn from_response(service: &'static str, response: reqwest::Response) -> Self {
        const MAX_BODY: usize = 512;

        let status = response.status().as_u16();
        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_BODY {
            let mut end = MAX_BODY;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            body.truncate(end);
        }
        Self::UpstreamStatus {
            service,
            status,
            body,
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
