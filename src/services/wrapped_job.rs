use crate::error::{Result, WrappedError};
use crate::models::profile::{top_starred, total_stars};
use crate::models::summary::Summary;
use crate::services::activity_aggregation::aggregate;
use crate::services::git_platforms::GitPlatform;
use crate::services::summary_builder::build_summary;
use crate::services::wrapped_renderer::render;
use crate::utils::config::Config;
use crate::utils::validators::{current_year, validate_token, validate_username, validate_year};
use std::path::PathBuf;

/// Everything one run needs from the user
#[derive(Clone, Debug)]
pub struct WrappedRequest {
    pub username: String,
    pub token: String,
    pub year: i32,
}

#[derive(Debug)]
pub struct WrappedOutcome {
    pub output_path: PathBuf,
    pub summary: Summary,
}

/// Runs fetch, aggregate, build and render in order; the first failure stops the run
pub struct WrappedJob<'a> {
    platform: &'a dyn GitPlatform,
    config: &'a Config,
}

impl<'a> WrappedJob<'a> {
    pub fn new(platform: &'a dyn GitPlatform, config: &'a Config) -> Self {
        Self { platform, config }
    }

    pub async fn run<F>(&self, request: &WrappedRequest, progress: F) -> Result<WrappedOutcome>
    where
        F: Fn(&str),
    {
        validate_username(&request.username).map_err(|e| WrappedError::InvalidInput(e.to_string()))?;
        validate_token(&request.token).map_err(|e| WrappedError::InvalidInput(e.to_string()))?;
        validate_year(request.year, current_year()).map_err(|e| WrappedError::InvalidInput(e.to_string()))?;

        let start_time = std::time::Instant::now();
        let platform_config = self.config.platform_config();

        progress("Connecting to GitHub...");
        let mut profile = self
            .platform
            .fetch_user(&platform_config, &request.username, &request.token)
            .await?;
        log::debug!("Authenticated, building wrapped card for {}", profile.login);

        progress("Counting stars across your repositories...");
        let repositories = self
            .platform
            .fetch_repositories(&platform_config, &request.username, &request.token)
            .await?;
        profile.total_stars = total_stars(&repositories);
        profile.top_starred = top_starred(&repositories, self.config.top_n);

        progress(&format!(
            "Fetching commits, pull requests & issues for {}...",
            request.year
        ));
        let batch = match self
            .platform
            .fetch_activity(&platform_config, &request.username, &request.token, request.year)
            .await
        {
            Ok(batch) => batch,
            Err(e) => {
                log::warn!(
                    "Stopping: {} activity records were fetched before the failure",
                    e.records.len()
                );
                return Err(e.source);
            }
        };

        if batch.records.is_empty() {
            log::debug!("No activity found for {} in {}", request.username, request.year);
        }

        progress("Crunching the numbers...");
        let mut summary = aggregate(&batch.records, request.year, self.config.top_n);
        summary.apply_reported_totals(&batch.reported);
        let display = build_summary(&summary, &profile);

        progress("Rendering your card...");
        let output_path = self.config.output_path_for(&request.username, request.year);
        render(&display, &output_path, &self.config.render_theme())?;

        log::debug!(
            "Wrapped {} for {} finished in {:?}",
            request.year,
            request.username,
            start_time.elapsed()
        );

        Ok(WrappedOutcome {
            output_path,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::models::activity::{ActivityBatch, ActivityRecord, ActivityType, ReportedTotals};
    use crate::models::profile::{RepositoryInfo, UserProfile};
    use crate::services::git_platforms::PlatformConfig;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behavior {
        Succeed,
        CappedSearch,
        RejectToken,
        FailMidway,
    }

    struct FakePlatform {
        behavior: Behavior,
        activity_calls: AtomicUsize,
    }

    impl FakePlatform {
        fn new(behavior: Behavior) -> Self {
            Self {
                behavior,
                activity_calls: AtomicUsize::new(0),
            }
        }

        fn records() -> Vec<ActivityRecord> {
            let at = |month, day| Utc.with_ymd_and_hms(2024, month, day, 9, 0, 0).unwrap();
            vec![
                ActivityRecord {
                    activity_type: ActivityType::Commit,
                    repository_name: "octocat/alpha".to_string(),
                    occurred_at: at(2, 1),
                    language: Some("Rust".to_string()),
                },
                ActivityRecord {
                    activity_type: ActivityType::PullRequest,
                    repository_name: "octocat/beta".to_string(),
                    occurred_at: at(9, 15),
                    language: None,
                },
            ]
        }
    }

    #[async_trait]
    impl GitPlatform for FakePlatform {
        async fn fetch_user(&self, _: &PlatformConfig, username: &str, _: &str) -> Result<UserProfile> {
            match self.behavior {
                Behavior::RejectToken => Err(WrappedError::AuthenticationFailed("Bad credentials".to_string())),
                _ => Ok(UserProfile {
                    login: username.to_string(),
                    public_repos: 2,
                    ..Default::default()
                }),
            }
        }

        async fn fetch_activity(
            &self,
            _: &PlatformConfig,
            _: &str,
            _: &str,
            _: i32,
        ) -> std::result::Result<ActivityBatch, FetchError> {
            self.activity_calls.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                Behavior::FailMidway => Err(FetchError::new(
                    Self::records(),
                    WrappedError::RateLimitExceeded { attempts: 4 },
                )),
                Behavior::CappedSearch => Ok(ActivityBatch {
                    records: Self::records(),
                    reported: ReportedTotals {
                        commits: 1500,
                        pull_requests: 1,
                        issues: 0,
                    },
                }),
                _ => Ok(ActivityBatch {
                    records: Self::records(),
                    reported: ReportedTotals::default(),
                }),
            }
        }

        async fn fetch_repositories(&self, _: &PlatformConfig, _: &str, _: &str) -> Result<Vec<RepositoryInfo>> {
            Ok(vec![RepositoryInfo {
                name: "alpha".to_string(),
                full_name: "octocat/alpha".to_string(),
                description: None,
                language: Some("Rust".to_string()),
                stargazers_count: 9,
                fork: false,
            }])
        }
    }

    fn config_with_output(path: PathBuf) -> Config {
        let mut config = Config::from_lookup(|_| None).unwrap();
        config.output_path = Some(path);
        config
    }

    fn request() -> WrappedRequest {
        WrappedRequest {
            username: "octocat".to_string(),
            token: "test-token".to_string(),
            year: 2024,
        }
    }

    #[tokio::test]
    async fn test_run_writes_card() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_output(dir.path().join("wrapped.png"));
        let platform = FakePlatform::new(Behavior::Succeed);
        let stages = std::cell::RefCell::new(Vec::new());

        let outcome = WrappedJob::new(&platform, &config)
            .run(&request(), |stage| stages.borrow_mut().push(stage.to_string()))
            .await
            .unwrap();

        assert!(outcome.output_path.exists());
        assert_eq!(outcome.summary.total_commits, 1);
        assert_eq!(outcome.summary.total_pull_requests, 1);
        assert_eq!(outcome.summary.timeline.iter().sum::<u32>(), 2);
        assert_eq!(stages.borrow().len(), 5);
    }

    #[tokio::test]
    async fn test_headline_totals_use_reported_counts() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_output(dir.path().join("wrapped.png"));
        let platform = FakePlatform::new(Behavior::CappedSearch);

        let outcome = WrappedJob::new(&platform, &config)
            .run(&request(), |_| {})
            .await
            .unwrap();

        assert_eq!(outcome.summary.total_commits, 1500);
        assert_eq!(outcome.summary.total_pull_requests, 1);
        // Breakdowns still come from the records that were served
        assert_eq!(outcome.summary.timeline.iter().sum::<u32>(), 2);
        assert_eq!(outcome.summary.top_repositories[0].commits, 1);
    }

    #[tokio::test]
    async fn test_rejected_token_stops_before_fetching_activity() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("wrapped.png");
        let config = config_with_output(output.clone());
        let platform = FakePlatform::new(Behavior::RejectToken);

        let err = WrappedJob::new(&platform, &config)
            .run(&request(), |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, WrappedError::AuthenticationFailed(_)));
        assert_eq!(platform.activity_calls.load(Ordering::SeqCst), 0);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_fetch_failure_surfaces_cause_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("wrapped.png");
        let config = config_with_output(output.clone());
        let platform = FakePlatform::new(Behavior::FailMidway);

        let err = WrappedJob::new(&platform, &config)
            .run(&request(), |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, WrappedError::RateLimitExceeded { attempts: 4 }));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_invalid_request_is_rejected_up_front() {
        let config = Config::from_lookup(|_| None).unwrap();
        let platform = FakePlatform::new(Behavior::Succeed);
        let mut bad = request();
        bad.year = 2001;

        let err = WrappedJob::new(&platform, &config)
            .run(&bad, |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, WrappedError::InvalidInput(_)));
        assert_eq!(platform.activity_calls.load(Ordering::SeqCst), 0);
    }
}
