//! Error types for the Artdatabanken API clients

use std::fmt;

/// Errors that can occur when talking to the Artdatabanken APIs
#[derive(Debug)]
pub enum ApiError {
    /// Missing or unusable credentials, raised before any request is sent
    Config(String),
    /// Search filter or paging parameters rejected locally
    InvalidFilter(String),
    /// The service answered with a non-success status
    Remote { status: u16, body: String },
    /// No response: connection, TLS or timeout failure
    Http(reqwest::Error),
    /// The service answered with a body that could not be decoded
    Json(serde_json::Error),
}

impl ApiError {
    /// HTTP status of a remote error response, if this is one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::InvalidFilter(msg) => write!(f, "Invalid search filter: {}", msg),
            Self::Remote { status, body } if body.is_empty() => {
                write!(f, "Remote error: HTTP {}", status)
            }
            Self::Remote { status, body } => write!(f, "Remote error: HTTP {}: {}", status, body),
            Self::Http(e) => write!(f, "Transport error: {}", e),
            Self::Json(e) => write!(f, "JSON parse error: {}", e),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Result type for Artdatabanken API operations
pub type Result<T> = std::result::Result<T, ApiError>;
