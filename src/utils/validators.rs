use anyhow::{anyhow, Result};
use chrono::{Datelike, Utc};
use url::Url;

/// First year GitHub accepted activity
pub const GITHUB_FOUNDING_YEAR: i32 = 2008;

/// Validate that a string is a valid URL with http or https scheme
pub fn validate_url(url_str: &str) -> Result<Url> {
    let url = Url::parse(url_str)
        .map_err(|e| anyhow!("Invalid URL format: {}", e))?;

    // Only allow http and https schemes
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(anyhow!(
            "URL must use http or https scheme, got: {}",
            url.scheme()
        ));
    }

    // Must have a host
    if url.host_str().is_none() {
        return Err(anyhow!("URL must have a host"));
    }

    Ok(url)
}

/// Validate username (alphanumeric, hyphens, underscores, 1-39 chars for GitHub compatibility)
pub fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() || username.len() > 39 {
        return Err(anyhow!(
            "Username must be between 1 and 39 characters"
        ));
    }

    // Allow alphanumeric, hyphens, and underscores
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(anyhow!(
            "Username can only contain alphanumeric characters, hyphens, and underscores"
        ));
    }

    Ok(())
}

pub fn validate_token(token: &str) -> Result<()> {
    if token.trim().is_empty() {
        return Err(anyhow!("Access token must not be empty"));
    }
    Ok(())
}

/// Parse a year entered at the prompt. Empty input means the current year.
pub fn parse_year(input: &str, current_year: i32) -> Result<i32> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(current_year);
    }

    if input.len() != 4 || !input.chars().all(|c| c.is_ascii_digit()) {
        return Err(anyhow!(
            "Invalid year '{}'. Please enter a 4-digit year like {}",
            input,
            current_year
        ));
    }

    let year: i32 = input.parse()?;
    validate_year(year, current_year)?;
    Ok(year)
}

pub fn validate_year(year: i32, current_year: i32) -> Result<()> {
    if !(GITHUB_FOUNDING_YEAR..=current_year).contains(&year) {
        return Err(anyhow!(
            "Year must be between {} and {}, got {}",
            GITHUB_FOUNDING_YEAR,
            current_year,
            year
        ));
    }
    Ok(())
}

pub fn current_year() -> i32 {
    Utc::now().year()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://api.github.com").is_ok());
        assert!(validate_url("http://localhost:3000").is_ok());
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_url("not-a-url").is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("octocat").is_ok());
        assert!(validate_username("my-user_123").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username(&"a".repeat(40)).is_err());
        assert!(validate_username("user@example").is_err());
    }

    #[test]
    fn test_validate_token() {
        assert!(validate_token("ghp_abc").is_ok());
        assert!(validate_token("   ").is_err());
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("", 2026).unwrap(), 2026);
        assert_eq!(parse_year(" 2024 ", 2026).unwrap(), 2024);
        assert_eq!(parse_year("2008", 2026).unwrap(), 2008);
        assert!(parse_year("2007", 2026).is_err());
        assert!(parse_year("2027", 2026).is_err());
        assert!(parse_year("24", 2026).is_err());
        assert!(parse_year("20x4", 2026).is_err());
    }
}
