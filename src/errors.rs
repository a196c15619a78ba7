use std::fmt;

/// Application-specific error types.
///
/// These cover failures outside the per-row lookup path: unreadable input,
/// malformed CSV, or an HTTP client that cannot be constructed. Per-row
/// lookup failures are a separate, non-fatal concern; see [`LookupFailure`].
#[derive(Debug)]
pub enum AppError {
    /// Filesystem read or write failure.
    Io(std::io::Error),
    /// CSV parse or write failure.
    Csv(csv::Error),
    /// YAML parse failure.
    Yaml(serde_yaml::Error),
    /// JSON parse or serialization failure.
    Json(serde_json::Error),
    /// The HTTP client could not be constructed.
    HttpClient(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Io(e) => write!(f, "I/O error: {}", e),
            AppError::Csv(e) => write!(f, "CSV error: {}", e),
            AppError::Yaml(e) => write!(f, "YAML error: {}", e),
            AppError::Json(e) => write!(f, "JSON error: {}", e),
            AppError::HttpClient(msg) => write!(f, "HTTP client error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Io(e) => Some(e),
            AppError::Csv(e) => Some(e),
            AppError::Yaml(e) => Some(e),
            AppError::Json(e) => Some(e),
            AppError::HttpClient(_) => None,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err)
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Csv(err)
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Yaml(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Json(err)
    }
}

/// Why a single vendor lookup produced no record.
///
/// Every variant renders to the reason string surfaced in the row's
/// `<prefix>_error` column. Lookup failures never abort a run; they are
/// ordinary row data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupFailure {
    /// The lookup key was blank, so no request was made.
    MissingField(&'static str),
    /// The vendor confirmed there is no matching company.
    NotFound,
    /// A non-retryable HTTP status, with a snippet of the response body.
    Http { status: u16, body: String },
    /// Transient failures persisted through every allowed attempt.
    Exhausted,
}

impl fmt::Display for LookupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupFailure::MissingField(field) => write!(f, "missing {}", field),
            LookupFailure::NotFound => write!(f, "not found"),
            LookupFailure::Http { status, body } => write!(f, "HTTP {}: {}", status, body),
            LookupFailure::Exhausted => write!(f, "max attempts reached"),
        }
    }
}
