use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::time::Duration;

pub const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
pub const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";
pub const RETRY_AFTER: &str = "retry-after";

/// Bounded retry behavior for rate-limited and transient failures
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; the request is sent at most `max_retries + 1` times
    pub max_retries: u32,
    pub base_backoff: Duration,
    /// Longest single wait; a reset further away than this fails immediately
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff: Duration::from_millis(1000),
            max_wait: Duration::from_secs(120),
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff for the given 1-based attempt, capped at `max_wait`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_backoff
            .saturating_mul(1u32 << exponent)
            .min(self.max_wait)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseClass {
    Success,
    /// Bad or expired credentials, never retried
    Unauthorized,
    RateLimited,
    /// 5xx, worth another try
    Transient,
    Failed,
}

pub fn classify(status: StatusCode, headers: &HeaderMap) -> ResponseClass {
    if status.is_success() {
        return ResponseClass::Success;
    }

    match status {
        StatusCode::TOO_MANY_REQUESTS => ResponseClass::RateLimited,
        StatusCode::FORBIDDEN if is_rate_limit_forbidden(headers) => ResponseClass::RateLimited,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ResponseClass::Unauthorized,
        s if s.is_server_error() => ResponseClass::Transient,
        _ => ResponseClass::Failed,
    }
}

fn is_rate_limit_forbidden(headers: &HeaderMap) -> bool {
    header_str(headers, RATE_LIMIT_REMAINING).map(str::trim) == Some("0")
        || headers.contains_key(RETRY_AFTER)
}

/// How long to pause before retrying a rate-limited request.
///
/// `Retry-After` wins, then `X-RateLimit-Reset`, then exponential backoff.
pub fn rate_limit_wait(
    headers: &HeaderMap,
    now: DateTime<Utc>,
    attempt: u32,
    policy: &RetryPolicy,
) -> Duration {
    if let Some(seconds) = header_str(headers, RETRY_AFTER).and_then(|v| v.trim().parse::<u64>().ok()) {
        return Duration::from_secs(seconds);
    }

    if let Some(reset) = header_str(headers, RATE_LIMIT_RESET).and_then(|v| v.trim().parse::<i64>().ok()) {
        let millis = reset.saturating_mul(1000).saturating_sub(now.timestamp_millis());
        return Duration::from_millis(millis.max(0) as u64);
    }

    policy.backoff(attempt)
}

/// Whether an error body describes a rate limit. GitHub's secondary limits
/// can come back as a plain 403 with none of the rate-limit headers.
pub fn mentions_rate_limit(body: &str) -> bool {
    let body = body.to_ascii_lowercase();
    body.contains("rate limit") || body.contains("abuse detection")
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
