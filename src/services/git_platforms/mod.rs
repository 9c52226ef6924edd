pub mod github;
pub mod rate_limit;

pub use github::GitHubClient;
pub use rate_limit::RetryPolicy;

use async_trait::async_trait;

use crate::error::{FetchError, Result, WrappedError};
use crate::models::activity::ActivityBatch;
use crate::models::profile::{RepositoryInfo, UserProfile};

/// Where to reach the API and how hard to retry
#[derive(Clone, Debug)]
pub struct PlatformConfig {
    pub api_base_url: String,
    pub retry: RetryPolicy,
}

impl PlatformConfig {
    /// GitHub.com or a GitHub-compatible API at a custom base URL
    pub fn github_custom(api_base_url: &str, retry: RetryPolicy) -> Self {
        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            retry,
        }
    }
}

/// Absolute URL of the next page to fetch. A listing ends when a page
/// hands back no cursor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageCursor(String);

impl PageCursor {
    /// Cursor for the first page of `endpoint` with the given query parameters
    pub fn first(config: &PlatformConfig, endpoint: &str, params: &[(&str, &str)]) -> Result<Self> {
        let base = format!("{}{}", config.api_base_url, endpoint);
        let url = url::Url::parse_with_params(&base, params)
            .map_err(|e| WrappedError::InvalidInput(format!("Invalid API URL {}: {}", base, e)))?;
        Ok(Self(url.to_string()))
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One page of a paginated listing
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<PageCursor>,
    /// Size of the whole result set when the listing reports one
    pub total_count: Option<u32>,
}

/// Operations the wrapped pipeline needs from a git platform
#[async_trait]
pub trait GitPlatform: Send + Sync {
    /// Fetch the public profile; also serves as the credential check
    async fn fetch_user(
        &self,
        config: &PlatformConfig,
        username: &str,
        token: &str,
    ) -> Result<UserProfile>;

    /// Fetch commits, pull requests and issues authored in `year`, along with
    /// the totals the platform reports for each kind
    async fn fetch_activity(
        &self,
        config: &PlatformConfig,
        username: &str,
        token: &str,
        year: i32,
    ) -> std::result::Result<ActivityBatch, FetchError>;

    /// Fetch repositories owned by the user
    async fn fetch_repositories(
        &self,
        config: &PlatformConfig,
        username: &str,
        token: &str,
    ) -> Result<Vec<RepositoryInfo>>;
}
