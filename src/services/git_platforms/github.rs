use super::rate_limit::{classify, mentions_rate_limit, rate_limit_wait, ResponseClass, RetryPolicy};
use super::{GitPlatform, Page, PageCursor, PlatformConfig};
use crate::error::{FetchError, Result, WrappedError};
use crate::models::activity::{year_window, ActivityBatch, ActivityRecord, ActivityType, ReportedTotals};
use crate::models::profile::{RepositoryInfo, UserProfile};
use crate::utils::http_client::create_http_client;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, ACCEPT, LINK};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";
const PER_PAGE: &str = "100";

pub struct GitHubClient {
    http: Client,
}

impl GitHubClient {
    pub fn new() -> Result<Self> {
        let http = create_http_client().map_err(|e| WrappedError::Network {
            attempts: 0,
            message: format!("Failed to create HTTP client: {}", e),
        })?;
        Ok(Self { http })
    }

    /// GET with bearer auth, retrying rate limits and transient failures per `config.retry`
    async fn send_get(&self, config: &PlatformConfig, token: &str, url: &str) -> Result<Response> {
        let policy = &config.retry;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            log::debug!("GET {} (attempt {})", url, attempt);

            let result = self
                .http
                .get(url)
                .bearer_auth(token)
                .header(ACCEPT, GITHUB_ACCEPT)
                .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
                .send()
                .await;

            let response = match result {
                Ok(response) => response,
                Err(e) => {
                    if attempt > policy.max_retries {
                        return Err(WrappedError::Network {
                            attempts: attempt,
                            message: e.to_string(),
                        });
                    }
                    let wait = policy.backoff(attempt);
                    log::warn!("⚠️  Request to {} failed ({}), retrying in {:?}", url, e, wait);
                    tokio::time::sleep(wait).await;
                    continue;
                }
            };

            let status = response.status();
            match classify(status, response.headers()) {
                ResponseClass::Success => return Ok(response),
                ResponseClass::Unauthorized => {
                    let headers = response.headers().clone();
                    let body = response.text().await.unwrap_or_default();
                    // Secondary rate limits can arrive as a bare 403
                    if status != StatusCode::FORBIDDEN || !mentions_rate_limit(&body) {
                        return Err(WrappedError::AuthenticationFailed(format!(
                            "GitHub rejected the token with status {}: {}",
                            status,
                            error_message(&body)
                        )));
                    }
                    wait_for_rate_limit(&headers, attempt, policy).await?;
                }
                ResponseClass::RateLimited => {
                    wait_for_rate_limit(response.headers(), attempt, policy).await?;
                }
                ResponseClass::Transient => {
                    if attempt > policy.max_retries {
                        return Err(WrappedError::Network {
                            attempts: attempt,
                            message: format!("GitHub returned {}", status),
                        });
                    }
                    let wait = policy.backoff(attempt);
                    log::warn!("⚠️  GitHub returned {} for {}, retrying in {:?}", status, url, wait);
                    tokio::time::sleep(wait).await;
                }
                ResponseClass::Failed => {
                    let body = response.text().await.unwrap_or_default();
                    return Err(WrappedError::Api {
                        status: status.as_u16(),
                        message: error_message(&body),
                    });
                }
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        config: &PlatformConfig,
        token: &str,
        url: &str,
    ) -> Result<T> {
        let response = self.send_get(config, token, url).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| WrappedError::Decode(format!("{}: {}", url, e)))
    }

    /// Fetch one page and the cursor for the page after it
    async fn fetch_page<B: DeserializeOwned>(
        &self,
        config: &PlatformConfig,
        token: &str,
        cursor: &PageCursor,
    ) -> Result<(B, Option<PageCursor>)> {
        let response = self.send_get(config, token, cursor.as_str()).await?;

        let next = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_next_link)
            .map(PageCursor::from_url);

        let body = response
            .json::<B>()
            .await
            .map_err(|e| WrappedError::Decode(format!("{}: {}", cursor.as_str(), e)))?;

        Ok((body, next))
    }

    async fn fetch_search_page<T: DeserializeOwned>(
        &self,
        config: &PlatformConfig,
        token: &str,
        cursor: &PageCursor,
    ) -> Result<Page<T>> {
        let (body, next) = self
            .fetch_page::<GitHubSearchResponse<T>>(config, token, cursor)
            .await?;

        if body.incomplete_results {
            log::warn!("GitHub reported incomplete search results for {}", cursor.as_str());
        }

        Ok(Page {
            items: body.items,
            next,
            total_count: Some(body.total_count),
        })
    }

    /// Page through one search and append every in-year hit to `records`.
    /// Returns the total GitHub reports for the query.
    async fn collect_search<T: SearchItem + DeserializeOwned>(
        &self,
        config: &PlatformConfig,
        token: &str,
        activity_type: ActivityType,
        first: PageCursor,
        window: (DateTime<Utc>, DateTime<Utc>),
        languages: &mut HashMap<String, Option<String>>,
        records: &mut Vec<ActivityRecord>,
    ) -> Result<u32> {
        let (from, to) = window;
        let mut cursor = Some(first);
        let mut page_number = 0;
        let mut served: u32 = 0;
        let mut reported: u32 = 0;

        while let Some(current) = cursor {
            page_number += 1;
            let page: Page<T> = self.fetch_search_page(config, token, &current).await?;
            let fetched = page.items.len();
            served = served.saturating_add(fetched as u32);
            reported = reported.max(page.total_count.unwrap_or(0));
            let mut kept = 0;

            for item in page.items {
                let (repository_name, occurred_at) = item.locate()?;
                if occurred_at < from || occurred_at >= to {
                    continue;
                }

                let language = self
                    .repository_language(config, token, &repository_name, languages)
                    .await?;

                records.push(ActivityRecord {
                    activity_type,
                    repository_name,
                    occurred_at,
                    language,
                });
                kept += 1;
            }

            log::debug!(
                "📥 Fetched {} {} from GitHub (page {}, {} in range)",
                fetched,
                activity_type.search_label(),
                page_number,
                kept
            );

            cursor = page.next;
        }

        if reported > served {
            log::warn!(
                "GitHub reports {} {} but search only served {}; the headline uses the reported total, the breakdowns cover the served ones",
                reported,
                activity_type.search_label(),
                served
            );
        }

        Ok(reported)
    }

    /// Primary language of a repository, looked up once per run
    async fn repository_language(
        &self,
        config: &PlatformConfig,
        token: &str,
        full_name: &str,
        cache: &mut HashMap<String, Option<String>>,
    ) -> Result<Option<String>> {
        if let Some(language) = cache.get(full_name) {
            return Ok(language.clone());
        }

        let url = format!("{}/repos/{}", config.api_base_url, full_name);
        let language = match self.get_json::<GitHubRepoDetails>(config, token, &url).await {
            Ok(details) => details.language,
            Err(e) if e.is_not_found() => {
                log::warn!("Repository {} is not accessible, its language is unknown", full_name);
                None
            }
            Err(e) => return Err(e),
        };

        cache.insert(full_name.to_string(), language.clone());
        Ok(language)
    }
}

#[async_trait]
impl GitPlatform for GitHubClient {
    async fn fetch_user(
        &self,
        config: &PlatformConfig,
        username: &str,
        token: &str,
    ) -> Result<UserProfile> {
        let url = format!("{}/users/{}", config.api_base_url, username);
        let user: GitHubUser = self.get_json(config, token, &url).await.map_err(|e| {
            if e.is_not_found() {
                WrappedError::InvalidInput(format!("GitHub user '{}' does not exist", username))
            } else {
                e
            }
        })?;

        Ok(UserProfile {
            login: user.login,
            name: user.name,
            public_repos: user.public_repos,
            ..Default::default()
        })
    }

    async fn fetch_activity(
        &self,
        config: &PlatformConfig,
        username: &str,
        token: &str,
        year: i32,
    ) -> std::result::Result<ActivityBatch, FetchError> {
        let window = year_window(year)
            .ok_or_else(|| WrappedError::InvalidInput(format!("Year {} is out of range", year)))?;

        let mut records = Vec::new();
        let mut reported = ReportedTotals::default();
        let mut languages = HashMap::new();

        for activity_type in [ActivityType::Commit, ActivityType::PullRequest, ActivityType::Issue] {
            let query = search_query(activity_type, username, year);
            log::debug!("🔍 Searching {} with query: {}", activity_type.search_label(), query);

            let endpoint = match activity_type {
                ActivityType::Commit => "/search/commits",
                ActivityType::PullRequest | ActivityType::Issue => "/search/issues",
            };
            let first = match PageCursor::first(config, endpoint, &[("q", query.as_str()), ("per_page", PER_PAGE)]) {
                Ok(cursor) => cursor,
                Err(e) => return Err(FetchError::new(records, e)),
            };

            let result = match activity_type {
                ActivityType::Commit => {
                    self.collect_search::<GitHubCommitItem>(
                        config,
                        token,
                        activity_type,
                        first,
                        window,
                        &mut languages,
                        &mut records,
                    )
                    .await
                }
                ActivityType::PullRequest | ActivityType::Issue => {
                    self.collect_search::<GitHubIssueItem>(
                        config,
                        token,
                        activity_type,
                        first,
                        window,
                        &mut languages,
                        &mut records,
                    )
                    .await
                }
            };

            match result {
                Ok(total) => reported.set(activity_type, total),
                Err(e) => {
                    log::error!(
                        "Fetching {} failed after {} records: {}",
                        activity_type.search_label(),
                        records.len(),
                        e
                    );
                    return Err(FetchError::new(records, e));
                }
            }
        }

        log::debug!("📊 Total activity records fetched for {}: {}", year, records.len());

        Ok(ActivityBatch { records, reported })
    }

    async fn fetch_repositories(
        &self,
        config: &PlatformConfig,
        username: &str,
        token: &str,
    ) -> Result<Vec<RepositoryInfo>> {
        let endpoint = format!("/users/{}/repos", username);
        let mut cursor = Some(PageCursor::first(
            config,
            &endpoint,
            &[("type", "owner"), ("per_page", PER_PAGE)],
        )?);
        let mut repositories = Vec::new();

        while let Some(current) = cursor {
            let (repos, next): (Vec<GitHubRepo>, _) = self.fetch_page(config, token, &current).await?;
            log::debug!("📦 Fetched {} repositories", repos.len());

            repositories.extend(repos.into_iter().map(|repo| RepositoryInfo {
                name: repo.name,
                full_name: repo.full_name,
                description: repo.description,
                language: repo.language,
                stargazers_count: repo.stargazers_count,
                fork: repo.fork,
            }));
            cursor = next;
        }

        Ok(repositories)
    }
}

/// Sleep out a rate limit, or fail when retries are spent or the wait is too long
async fn wait_for_rate_limit(headers: &HeaderMap, attempt: u32, policy: &RetryPolicy) -> Result<()> {
    if attempt > policy.max_retries {
        return Err(WrappedError::RateLimitExceeded { attempts: attempt });
    }

    let wait = rate_limit_wait(headers, Utc::now(), attempt, policy);
    if wait > policy.max_wait {
        log::warn!(
            "Rate limit resets in {:?}, longer than the configured maximum wait of {:?}",
            wait,
            policy.max_wait
        );
        return Err(WrappedError::RateLimitExceeded { attempts: attempt });
    }

    log::warn!(
        "⏳ Rate limited by GitHub (attempt {}/{}), waiting {:?}",
        attempt,
        policy.max_retries + 1,
        wait
    );
    tokio::time::sleep(wait).await;
    Ok(())
}

fn search_query(activity_type: ActivityType, username: &str, year: i32) -> String {
    let range = format!("{year}-01-01..{year}-12-31");
    match activity_type {
        ActivityType::Commit => format!("author:{} committer-date:{}", username, range),
        ActivityType::PullRequest => format!("author:{} type:pr created:{}", username, range),
        ActivityType::Issue => format!("author:{} type:issue created:{}", username, range),
    }
}

/// Extract the `rel="next"` target from a `Link` header
pub fn parse_next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let mut segments = part.split(';');
        let target = segments
            .next()?
            .trim()
            .strip_prefix('<')?
            .strip_suffix('>')?;
        segments
            .any(|param| param.trim() == r#"rel="next""#)
            .then(|| target.to_string())
    })
}

/// `owner/name` from an API URL such as `https://api.github.com/repos/owner/name`
fn repository_from_url(url: &str) -> Option<String> {
    let (_, tail) = url.split_once("/repos/")?;
    let mut parts = tail.trim_end_matches('/').split('/');
    let owner = parts.next().filter(|s| !s.is_empty())?;
    let name = parts.next().filter(|s| !s.is_empty())?;
    if parts.next().is_some() {
        return None;
    }
    Some(format!("{}/{}", owner, name))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| WrappedError::Decode(format!("Failed to parse date '{}': {}", value, e)))
}

/// Pull the `message` field out of a GitHub error body, falling back to the raw text
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

/// A search hit that can be attributed to a repository and a point in time
trait SearchItem {
    fn locate(&self) -> Result<(String, DateTime<Utc>)>;
}

impl SearchItem for GitHubCommitItem {
    fn locate(&self) -> Result<(String, DateTime<Utc>)> {
        let date = self
            .commit
            .committer
            .as_ref()
            .or(self.commit.author.as_ref())
            .map(|signature| signature.date.as_str())
            .ok_or_else(|| {
                WrappedError::Decode(format!(
                    "Commit in {} has no author or committer date",
                    self.repository.full_name
                ))
            })?;
        Ok((self.repository.full_name.clone(), parse_timestamp(date)?))
    }
}

impl SearchItem for GitHubIssueItem {
    fn locate(&self) -> Result<(String, DateTime<Utc>)> {
        let repository = repository_from_url(&self.repository_url).ok_or_else(|| {
            WrappedError::Decode(format!("Unrecognized repository URL '{}'", self.repository_url))
        })?;
        Ok((repository, parse_timestamp(&self.created_at)?))
    }
}

// GitHub API response types
#[derive(Debug, Deserialize)]
struct GitHubSearchResponse<T> {
    #[serde(default)]
    total_count: u32,
    #[serde(default)]
    incomplete_results: bool,
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct GitHubCommitItem {
    commit: GitHubCommitDetail,
    repository: GitHubRepoRef,
}

#[derive(Debug, Deserialize)]
struct GitHubCommitDetail {
    author: Option<GitHubSignature>,
    committer: Option<GitHubSignature>,
}

#[derive(Debug, Deserialize)]
struct GitHubSignature {
    date: String,
}

#[derive(Debug, Deserialize)]
struct GitHubRepoRef {
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct GitHubIssueItem {
    created_at: String,
    repository_url: String,
}

#[derive(Debug, Deserialize)]
struct GitHubRepoDetails {
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: String,
    name: Option<String>,
    #[serde(default)]
    public_repos: u32,
}

#[derive(Debug, Deserialize)]
struct GitHubRepo {
    name: String,
    full_name: String,
    description: Option<String>,
    language: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    fork: bool,
}
