//! Error types for generative fill operations

use thiserror::Error;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    /// An editor option carried a value the operation cannot use.
    #[error("Invalid option: {0}")]
    UserInput(String),

    #[error("No selection made")]
    EmptySelection,

    /// Connection failure, non-200 response or malformed stream line.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown block: {0}")]
    UnknownBlock(String),

    #[error("Unknown block id: {0}")]
    UnknownBlockId(i64),

    /// A decode assumption was violated; indicates a bug or a protocol mismatch.
    #[error("Internal invariant violated: {0}")]
    Invariant(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Errors caused by what the user asked for rather than by the operation itself.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Error::UserInput(_) | Error::EmptySelection)
    }

    /// Errors raised while talking to the inference service.
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(Error::UserInput("strength".into()).is_user_error());
        assert!(Error::EmptySelection.is_user_error());
        assert!(!Error::Transport("refused".into()).is_user_error());
        assert!(Error::Transport("refused".into()).is_transport_error());
        assert!(!Error::Invariant("x".into()).is_transport_error());
    }

    #[test]
    fn test_display() {
        let err = Error::UserInput("Inpaint Strength must be a float between 0 and 1".into());
        assert_eq!(
            err.to_string(),
            "Invalid option: Inpaint Strength must be a float between 0 and 1"
        );
    }
}
