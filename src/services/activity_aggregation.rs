use crate::models::activity::{ActivityRecord, ActivityType};
use crate::models::summary::{LanguageStat, RepoStat, Summary};
use chrono::Datelike;
use std::collections::HashMap;

pub const DEFAULT_TOP_N: usize = 5;

/// Fold a record set into the yearly summary.
///
/// Records outside `year` are skipped, records without a language are left
/// out of the language tally. Ranked lists are ordered by count descending,
/// then by name, and cut to `top_n`.
pub fn aggregate(records: &[ActivityRecord], year: i32, top_n: usize) -> Summary {
    let mut summary = Summary::empty(year);
    let mut repositories: HashMap<&str, RepoStat> = HashMap::new();
    let mut languages: HashMap<&str, u32> = HashMap::new();
    let mut skipped = 0;

    for record in records {
        if !record.is_in_year(year) {
            skipped += 1;
            continue;
        }

        let repo = repositories
            .entry(record.repository_name.as_str())
            .or_insert_with(|| RepoStat::new(record.repository_name.as_str()));

        match record.activity_type {
            ActivityType::Commit => {
                summary.total_commits += 1;
                repo.commits += 1;
            }
            ActivityType::PullRequest => {
                summary.total_pull_requests += 1;
                repo.pull_requests += 1;
            }
            ActivityType::Issue => {
                summary.total_issues += 1;
                repo.issues += 1;
            }
        }

        if let Some(language) = record.language.as_deref() {
            *languages.entry(language).or_insert(0) += 1;
            summary.language_events += 1;
        }

        summary.timeline[record.occurred_at.month0() as usize] += 1;
    }

    if skipped > 0 {
        log::debug!("Skipped {} records outside {}", skipped, year);
    }

    summary.top_repositories = rank_repositories(repositories.into_values().collect(), top_n);
    summary.top_languages = rank_languages(
        languages
            .into_iter()
            .map(|(name, count)| LanguageStat {
                name: name.to_string(),
                count,
            })
            .collect(),
        top_n,
    );

    log::debug!(
        "Aggregated {} commits, {} pull requests, {} issues across {} months with activity",
        summary.total_commits,
        summary.total_pull_requests,
        summary.total_issues,
        summary.timeline.iter().filter(|c| **c > 0).count()
    );

    summary
}

fn rank_repositories(mut repos: Vec<RepoStat>, top_n: usize) -> Vec<RepoStat> {
    repos.sort_by(|a, b| b.total().cmp(&a.total()).then_with(|| a.name.cmp(&b.name)));
    repos.truncate(top_n);
    repos
}

fn rank_languages(mut languages: Vec<LanguageStat>, top_n: usize) -> Vec<LanguageStat> {
    languages.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    languages.truncate(top_n);
    languages
}
