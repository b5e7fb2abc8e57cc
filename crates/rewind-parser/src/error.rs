use std::fmt;

/// Result type for rewind-parser operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the parser layer.
///
/// Whole-session parsing never fails — malformed lines are skipped — so
/// these only surface from the single-record decoding entry point.
#[derive(Debug)]
pub enum Error {
    /// JSON decoding failed
    Json(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Json(err) => write!(f, "JSON error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Json(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}
