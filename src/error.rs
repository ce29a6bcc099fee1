//! Crate-level error types

/// Result alias used across the relay
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level relay error
#[derive(Debug)]
pub enum Error {
    /// Socket bind/accept or other I/O failure
    Io(std::io::Error),
    /// Payload was not valid JSON, or not the expected shape
    Decode(serde_json::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Decode(e) => write!(f, "Decode error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Decode(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Decode(e)
    }
}
