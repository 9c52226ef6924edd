use crate::models::display::{DisplayModel, Headline, LanguageRow, RepositoryRow, StarredRow, TimelineBar};
use crate::models::profile::{RepositoryInfo, UserProfile};
use crate::models::summary::{RepoStat, Summary};

pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const DESCRIPTION_LIMIT: usize = 55;

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

/// Turn aggregated counters into display-ready text
pub fn build_summary(summary: &Summary, profile: &UserProfile) -> DisplayModel {
    let headlines = vec![
        Headline {
            value: format_count(summary.total_commits as u64),
            label: plural(summary.total_commits as u64, "commit", "commits").to_string(),
            flavor: commit_flavor(summary.total_commits).to_string(),
        },
        Headline {
            value: format_count(summary.total_pull_requests as u64),
            label: plural(summary.total_pull_requests as u64, "pull request", "pull requests").to_string(),
            flavor: pull_request_flavor(summary.total_pull_requests).to_string(),
        },
        Headline {
            value: format_count(summary.total_issues as u64),
            label: plural(summary.total_issues as u64, "issue", "issues").to_string(),
            flavor: issue_flavor(summary.total_issues).to_string(),
        },
    ];

    let languages = summary
        .top_languages
        .iter()
        .map(|language| {
            let share = if summary.language_events == 0 {
                0.0
            } else {
                language.count as f64 / summary.language_events as f64
            };
            LanguageRow {
                name: language.name.clone(),
                share,
                percent_label: format!("{:.1}%", share * 100.0),
            }
        })
        .collect();

    let repositories = summary
        .top_repositories
        .iter()
        .map(|repo| RepositoryRow {
            name: repo.name.clone(),
            detail: repository_detail(repo),
        })
        .collect();

    let starred = profile
        .top_starred
        .iter()
        .map(|repo| StarredRow {
            name: repo.name.clone(),
            stars_label: format!("★ {}", format_count(repo.stargazers_count)),
            detail: starred_detail(repo),
        })
        .collect();

    let busiest = summary.timeline.iter().copied().max().unwrap_or(0);
    let timeline = summary
        .timeline
        .iter()
        .zip(MONTH_LABELS)
        .map(|(count, label)| TimelineBar {
            label: label.to_string(),
            count: *count,
            ratio: if busiest == 0 {
                0.0
            } else {
                *count as f64 / busiest as f64
            },
        })
        .collect();

    let busiest_month = summary.busiest_month().map(|(month, count)| {
        format!(
            "Busiest month: {} with {} {}",
            MONTH_NAMES[month],
            format_count(count as u64),
            plural(count as u64, "contribution", "contributions")
        )
    });

    let greeting = if summary.total_activity() == 0 {
        format!(
            "Hey {}, no public activity turned up for {}.",
            profile.display_name(),
            summary.year
        )
    } else {
        format!("Hey {}, here's your year in code.", profile.display_name())
    };

    let stars_line = (profile.total_stars > 0).then(|| {
        format!(
            "{} lifetime {} across {} public {}",
            format_count(profile.total_stars),
            plural(profile.total_stars, "star", "stars"),
            format_count(profile.public_repos as u64),
            plural(profile.public_repos as u64, "repository", "repositories")
        )
    });

    let top_language = summary
        .top_languages
        .first()
        .map(|l| l.name.as_str())
        .unwrap_or("code");

    DisplayModel {
        username: profile.login.clone(),
        title: format!("GitHub Wrapped {}", summary.year),
        greeting,
        headlines,
        stars_line,
        languages,
        repositories,
        starred,
        timeline,
        busiest_month,
        footer: format!(
            "Your go-to language was {}. Keep shipping in {}!",
            top_language,
            summary.year + 1
        ),
    }
}

fn repository_detail(repo: &RepoStat) -> String {
    let parts: Vec<String> = [
        (repo.commits, "commit", "commits"),
        (repo.pull_requests, "PR", "PRs"),
        (repo.issues, "issue", "issues"),
    ]
    .into_iter()
    .filter(|(count, _, _)| *count > 0)
    .map(|(count, one, many)| format!("{} {}", format_count(count as u64), plural(count as u64, one, many)))
    .collect();

    parts.join(" · ")
}

fn starred_detail(repo: &RepositoryInfo) -> String {
    let description = repo
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| truncate(d, DESCRIPTION_LIMIT));

    repo.language
        .clone()
        .into_iter()
        .chain(description)
        .collect::<Vec<_>>()
        .join(" · ")
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(limit - 1).collect();
    cut.push('…');
    cut
}

fn commit_flavor(commits: u32) -> &'static str {
    match commits {
        c if c > 1000 => "You basically lived in the terminal.",
        c if c > 300 => "Solid year of shipping.",
        _ => "Quality over quantity.",
    }
}

fn pull_request_flavor(pull_requests: u32) -> &'static str {
    match pull_requests {
        p if p > 200 => "Reviewing machine.",
        p if p > 50 => "Great collaborator.",
        _ => "Thoughtful contributor.",
    }
}

fn issue_flavor(issues: u32) -> &'static str {
    match issues {
        i if i > 100 => "Bug hunter extraordinaire.",
        i if i > 20 => "Keeping projects honest.",
        _ => "Every report counts.",
    }
}

pub fn plural<'a>(count: u64, singular: &'a str, plural: &'a str) -> &'a str {
    if count == 1 {
        singular
    } else {
        plural
    }
}

/// `1234567` -> `"1,234,567"`
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
