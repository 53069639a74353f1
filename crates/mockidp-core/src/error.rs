use thiserror::Error;

/// Core error type for mock identity-provider operations.
#[derive(Error, Debug)]
pub enum MockError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Tape error: {0}")]
    Tape(String),

    #[error("Request body error: {0}")]
    Body(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for MockError {
    fn from(e: serde_json::Error) -> Self {
        MockError::Serialization(e.to_string())
    }
}

/// Result type alias using MockError.
pub type Result<T> = std::result::Result<T, MockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_error_conversion() {
        let err: MockError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, MockError::Serialization(_)));
        assert!(err.to_string().starts_with("Serialization error"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = MockError::from(io);
        assert_eq!(err.to_string(), "IO error: gone");
    }
}
