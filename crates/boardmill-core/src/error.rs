//! Error types for the core crate.

use thiserror::Error;

/// Errors raised while building core values.
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    /// A length string could not be parsed.
    #[error("Invalid length: {0}")]
    InvalidLength(String),
}
