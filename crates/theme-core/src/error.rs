//! Error taxonomy for theme components.
//!
//! Components never let these escape to the page. Each controller maps them
//! to an outcome: cancellations are dropped silently, fetch failures are
//! logged as warnings, missing sections are interpreted per component and
//! validation failures block the triggering action.

use theme_dom::DomError;
use thiserror::Error;

/// Error type for fetch operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("HTTP error: {status} for {url}")]
    Http { status: u16, url: String },

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Body read error: {0}")]
    Body(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// HTTP status code, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors surfaced by theme components.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ThemeError {
    /// The operation was superseded or aborted. Never user-visible.
    #[error("Operation cancelled")]
    Cancelled,

    /// Network or HTTP failure.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// An expected section was absent from a response.
    #[error("Section '{0}' missing from response")]
    MissingSection(String),

    /// User input blocked the default action.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Response body could not be interpreted.
    #[error("Malformed payload: {0}")]
    Payload(String),

    /// Document contract violation.
    #[error(transparent)]
    Dom(#[from] DomError),

    /// Invalid settings.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ThemeError {
    /// Whether this is the silent cancellation outcome.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<serde_json::Error> for ThemeError {
    fn from(e: serde_json::Error) -> Self {
        ThemeError::Payload(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_conversion() {
        let err: ThemeError = FetchError::Http {
            status: 503,
            url: "/collections/all".to_string(),
        }
        .into();
        assert!(!err.is_cancellation());
        assert_eq!(err.to_string(), "HTTP error: 503 for /collections/all");
        assert!(ThemeError::Cancelled.is_cancellation());
    }
}
