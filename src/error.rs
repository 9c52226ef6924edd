use std::path::PathBuf;

use thiserror::Error;

use crate::models::activity::ActivityRecord;

pub type Result<T> = std::result::Result<T, WrappedError>;

#[derive(Error, Debug)]
pub enum WrappedError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("GitHub rate limit exceeded after {attempts} attempt(s)")]
    RateLimitExceeded { attempts: u32 },
    #[error("Network error after {attempts} attempt(s): {message}")]
    Network { attempts: u32, message: String },
    #[error("GitHub API request failed with status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Unexpected GitHub response: {0}")]
    Decode(String),
    #[error("Could not write {}: {source}", path.display())]
    RenderIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to render image: {0}")]
    Render(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl WrappedError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, WrappedError::Api { status: 404, .. })
    }
}

/// Failure while paging through activity; keeps whatever was fetched before
/// the failing page.
#[derive(Error, Debug)]
#[error("{source} ({} record(s) fetched before the failure)", records.len())]
pub struct FetchError {
    pub records: Vec<ActivityRecord>,
    #[source]
    pub source: WrappedError,
}

impl FetchError {
    pub fn new(records: Vec<ActivityRecord>, source: WrappedError) -> Self {
        Self { records, source }
    }
}

impl From<WrappedError> for FetchError {
    fn from(source: WrappedError) -> Self {
        Self::new(Vec::new(), source)
    }
}
