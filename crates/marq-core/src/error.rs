//! Error taxonomy for bookmark operations
//!
//! Three failure classes cross the library boundary: rejected user
//! input, a missing or expired session, and remote store failures.
//! None of them is fatal to a session.

use thiserror::Error;

/// Errors produced by the submission, deletion, and store flows
#[derive(Error, Debug)]
pub enum Error {
    /// User input rejected before any request was made
    #[error("invalid input: {0}")]
    Validation(String),

    /// No authenticated session at the time of the call
    #[error("not signed in: {0}")]
    Auth(String),

    /// The remote store rejected the request or the transport failed
    #[error("store request failed: {0}")]
    Store(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        Error::Auth(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Error::Store(msg.into())
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Error::Validation(_) => "Fix the input and resubmit.",
            Error::Auth(_) => "Sign in again, then retry.",
            Error::Store(_) => "The remote store refused the request. Retry the same action.",
        }
    }
}

/// Result type for bookmark operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::validation("url is empty");
        assert_eq!(err.to_string(), "invalid input: url is empty");

        let err = Error::auth("session expired");
        assert!(err.to_string().contains("not signed in"));

        let err = Error::store("row level security violation");
        assert!(err.to_string().contains("store request failed"));
    }

    #[test]
    fn test_recovery_suggestions() {
        assert!(Error::validation("x").recovery_suggestion().contains("resubmit"));
        assert!(Error::auth("x").recovery_suggestion().contains("Sign in"));
        assert!(Error::store("x").recovery_suggestion().contains("Retry"));
    }
}
