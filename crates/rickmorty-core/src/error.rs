//! Error types for the Rick and Morty loader
//!
//! This module defines all error types used throughout the library.
//! ApiError implements Serialize so it can travel inside JSON events.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Maximum number of body characters kept in a status error
const BODY_EXCERPT_LEN: usize = 200;

/// Error type for loader operations
#[derive(Error, Debug)]
pub enum ApiError {
    /// Blank or malformed resource reference (never retried)
    #[error("Invalid resource reference: {0}")]
    InvalidReference(String),

    /// Transport-level failure: connect error, timeout, broken body
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered with a non-success status code
    #[error("HTTP {status} for {url}: {body}")]
    Status {
        /// Status code returned by the server
        status: u16,
        /// Requested URL
        url: String,
        /// Excerpt of the response body
        body: String,
    },

    /// Successful response whose body could not be decoded
    #[error("Failed to decode {context}: {source}")]
    Decode {
        /// What was being decoded
        context: String,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// Cancellation was observed while waiting
    #[error("Operation interrupted")]
    Interrupted,

    /// A unit of work panicked or was aborted
    #[error("Task failed: {0}")]
    TaskFailed(String),
}

impl ApiError {
    /// Build a status error, truncating the body to a short excerpt.
    pub fn status(status: u16, url: impl Into<String>, body: &str) -> Self {
        Self::Status {
            status,
            url: url.into(),
            body: body.chars().take(BODY_EXCERPT_LEN).collect(),
        }
    }

    /// Whether this is an HTTP 429 response.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Status { status: 429, .. })
    }

    /// Status code carried by the error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Serialize ApiError as its display string
impl Serialize for ApiError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias for loader operations
pub type Result<T> = std::result::Result<T, ApiError>;
