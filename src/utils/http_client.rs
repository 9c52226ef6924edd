use reqwest::{Client, ClientBuilder};
use std::time::Duration;

pub const USER_AGENT: &str = concat!("github-wrapped/", env!("CARGO_PKG_VERSION"));

/// Create a configured HTTP client for making requests to the GitHub API
pub fn create_http_client() -> reqwest::Result<Client> {
    ClientBuilder::new()
        .timeout(Duration::from_secs(30))
        .user_agent(USER_AGENT)
        .build()
}
