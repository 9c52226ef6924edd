use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Commit,
    PullRequest,
    Issue,
}

impl ActivityType {
    pub fn search_label(&self) -> &'static str {
        match self {
            ActivityType::Commit => "commits",
            ActivityType::PullRequest => "pull requests",
            ActivityType::Issue => "issues",
        }
    }
}

/// One commit, pull request or issue attributed to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub activity_type: ActivityType,
    pub repository_name: String,
    pub occurred_at: DateTime<Utc>,
    pub language: Option<String>,
}

impl ActivityRecord {
    pub fn is_in_year(&self, year: i32) -> bool {
        self.occurred_at.year() == year
    }
}

/// Totals GitHub reports for each search, which can exceed the hits it serves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedTotals {
    pub commits: u32,
    pub pull_requests: u32,
    pub issues: u32,
}

impl ReportedTotals {
    pub fn get(&self, activity_type: ActivityType) -> u32 {
        match activity_type {
            ActivityType::Commit => self.commits,
            ActivityType::PullRequest => self.pull_requests,
            ActivityType::Issue => self.issues,
        }
    }

    pub fn set(&mut self, activity_type: ActivityType, total: u32) {
        match activity_type {
            ActivityType::Commit => self.commits = total,
            ActivityType::PullRequest => self.pull_requests = total,
            ActivityType::Issue => self.issues = total,
        }
    }
}

/// Everything one `fetch_activity` run returns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityBatch {
    pub records: Vec<ActivityRecord>,
    pub reported: ReportedTotals,
}

/// Half-open UTC window `[year-01-01, (year+1)-01-01)`
pub fn year_window(year: i32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single()?;
    let end = Utc.with_ymd_and_hms(year + 1, 1, 1, 0, 0, 0).single()?;
    Some((start, end))
}
