//! Common result and error types for the Stave engine.

/// The standard result type for fallible internal operations.
///
/// `Err` indicates a broken internal invariant (a bug in Stave or a timing
/// graph that violates its own structure), not a user-facing finding. Findings
/// such as timing violations are reported through a diagnostic sink and the
/// operation still returns `Ok`.
pub type StaveResult<T> = Result<T, InternalError>;

/// An internal error indicating a bug or corrupted graph, not a design problem.
#[derive(Debug, thiserror::Error)]
#[error("internal error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
