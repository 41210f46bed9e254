//! Document error types.

use thiserror::Error;

/// Errors raised by document operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomError {
    /// Selector text could not be parsed.
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// An element required by the markup contract is missing.
    #[error("Element not found: {0}")]
    NotFound(String),

    /// The node is not an element.
    #[error("Node {0} is not an element")]
    NotAnElement(usize),
}
