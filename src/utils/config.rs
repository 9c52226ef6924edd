use crate::services::activity_aggregation::DEFAULT_TOP_N;
use crate::services::git_platforms::{PlatformConfig, RetryPolicy};
use crate::services::wrapped_renderer::{ColorScheme, RenderTheme};
use crate::utils::validators::validate_url;
use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub token: Option<String>,
    pub output_path: Option<PathBuf>,
    pub top_n: usize,
    pub retry: RetryPolicy,
    pub color_scheme: ColorScheme,
    pub font_family: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = RetryPolicy::default();

        let api_base_url = get("GITHUB_API_URL").unwrap_or_else(|| "https://api.github.com".to_string());
        validate_url(&api_base_url).context("GITHUB_API_URL must be a valid http(s) URL")?;

        let top_n: usize = parse_or(get("WRAPPED_TOP_N"), "WRAPPED_TOP_N", DEFAULT_TOP_N)?;
        if top_n == 0 {
            return Err(anyhow!("WRAPPED_TOP_N must be at least 1"));
        }

        let retry = RetryPolicy {
            max_retries: parse_or(get("WRAPPED_MAX_RETRIES"), "WRAPPED_MAX_RETRIES", defaults.max_retries)?,
            base_backoff: Duration::from_millis(parse_or(
                get("WRAPPED_BACKOFF_MS"),
                "WRAPPED_BACKOFF_MS",
                defaults.base_backoff.as_millis() as u64,
            )?),
            max_wait: Duration::from_secs(parse_or(
                get("WRAPPED_MAX_WAIT_SECS"),
                "WRAPPED_MAX_WAIT_SECS",
                defaults.max_wait.as_secs(),
            )?),
        };

        let color_scheme = match get("WRAPPED_THEME") {
            Some(value) => ColorScheme::from_str(&value).map_err(|e| anyhow!("WRAPPED_THEME: {}", e))?,
            None => ColorScheme::GitHubGreen,
        };

        Ok(Config {
            api_base_url,
            token: get("GITHUB_TOKEN"),
            output_path: get("WRAPPED_OUTPUT").map(PathBuf::from),
            top_n,
            retry,
            color_scheme,
            font_family: get("WRAPPED_FONT").unwrap_or_else(|| RenderTheme::default().font_family),
        })
    }

    pub fn platform_config(&self) -> PlatformConfig {
        PlatformConfig::github_custom(&self.api_base_url, self.retry.clone())
    }

    pub fn render_theme(&self) -> RenderTheme {
        RenderTheme::default()
            .with_scheme(self.color_scheme)
            .with_font_family(self.font_family.clone())
    }

    /// Configured output path, or `github-wrapped-{username}-{year}.png` in the working directory
    pub fn output_path_for(&self, username: &str, year: i32) -> PathBuf {
        self.output_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("github-wrapped-{}-{}.png", username, year)))
    }
}

fn parse_or<T: FromStr>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow!("{} must be a number, got '{}': {}", key, raw, e)),
        None => Ok(default),
    }
}
