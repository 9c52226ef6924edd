use crate::models::activity::ReportedTotals;
use serde::{Deserialize, Serialize};

pub const MONTHS_PER_YEAR: usize = 12;

/// Per-repository activity counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoStat {
    pub name: String,
    pub commits: u32,
    pub pull_requests: u32,
    pub issues: u32,
}

impl RepoStat {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn total(&self) -> u32 {
        self.commits + self.pull_requests + self.issues
    }
}

/// Number of activity events attributed to one language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageStat {
    pub name: String,
    pub count: u32,
}

/// Aggregated activity for one year
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub year: i32,
    pub total_commits: u32,
    pub total_pull_requests: u32,
    pub total_issues: u32,
    pub top_repositories: Vec<RepoStat>,
    pub top_languages: Vec<LanguageStat>,
    /// Language events across all languages, including those cut from `top_languages`
    pub language_events: u32,
    /// Index 0 is January
    pub timeline: [u32; MONTHS_PER_YEAR],
}

impl Summary {
    pub fn empty(year: i32) -> Self {
        Self {
            year,
            total_commits: 0,
            total_pull_requests: 0,
            total_issues: 0,
            top_repositories: Vec::new(),
            top_languages: Vec::new(),
            language_events: 0,
            timeline: [0; MONTHS_PER_YEAR],
        }
    }

    /// Raise the headline totals to what GitHub reported; search serves at
    /// most 1,000 hits per query so the folded counts can fall short
    pub fn apply_reported_totals(&mut self, reported: &ReportedTotals) {
        self.total_commits = self.total_commits.max(reported.commits);
        self.total_pull_requests = self.total_pull_requests.max(reported.pull_requests);
        self.total_issues = self.total_issues.max(reported.issues);
    }

    pub fn total_activity(&self) -> u32 {
        self.total_commits + self.total_pull_requests + self.total_issues
    }

    /// Zero-based month with the most activity; earliest month wins ties
    pub fn busiest_month(&self) -> Option<(usize, u32)> {
        self.timeline
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, count)| *count > 0)
            .fold(None, |best, (month, count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((month, count)),
            })
    }
}
