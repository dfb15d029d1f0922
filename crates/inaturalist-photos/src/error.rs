//! Error types for the iNaturalist photo source

use std::fmt;
use std::sync::Arc;

/// Errors that can occur when talking to the iNaturalist API
#[derive(Debug)]
pub enum InatError {
    /// HTTP request failed before a response was received
    Http(Box<reqwest::Error>),
    /// Upstream answered with a non-success status
    Status { status: u16, url: String },
    /// Failed to parse JSON response
    Json(serde_json::Error),
    /// Failure of a lookup shared by several concurrent callers
    Shared(Arc<InatError>),
}

impl fmt::Display for InatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "iNaturalist HTTP error: {}", e),
            Self::Status { status, url } => {
                write!(f, "iNaturalist returned status {} for {}", status, url)
            }
            Self::Json(e) => write!(f, "iNaturalist JSON parse error: {}", e),
            Self::Shared(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for InatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e.as_ref()),
            Self::Json(e) => Some(e),
            Self::Shared(e) => Some(e.as_ref()),
            Self::Status { .. } => None,
        }
    }
}

impl From<reqwest::Error> for InatError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(Box::new(e))
    }
}

impl From<serde_json::Error> for InatError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Result type for iNaturalist operations
pub type Result<T> = std::result::Result<T, InatError>;
