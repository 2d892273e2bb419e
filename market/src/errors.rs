use thiserror::Error;

/// Failure of an upstream market-data call.
///
/// The refresh worker treats both variants the same way; the split exists
/// for logs and for callers that want to stop asking about unknown symbols.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("transient fetch failure: {0}")]
    Transient(String),

    #[error("asset not found upstream: {0}")]
    NotFound(String),
}

impl FetchError {
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transient(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.status() == Some(reqwest::StatusCode::NOT_FOUND) {
            FetchError::NotFound(e.to_string())
        } else {
            FetchError::Transient(e.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Transient(format!("malformed response: {e}"))
    }
}
