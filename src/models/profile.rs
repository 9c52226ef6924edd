use serde::{Deserialize, Serialize};

/// Public profile details shown in the card header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub login: String,
    pub name: Option<String>,
    pub public_repos: u32,
    /// Lifetime stars across owned, non-fork repositories
    pub total_stars: u64,
    /// Most-starred owned repositories, strongest first
    pub top_starred: Vec<RepositoryInfo>,
}

impl UserProfile {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.login)
    }
}

/// Repository owned by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stargazers_count: u64,
    pub fork: bool,
}

/// Stars summed over repositories that are not forks
pub fn total_stars(repositories: &[RepositoryInfo]) -> u64 {
    repositories
        .iter()
        .filter(|repo| !repo.fork)
        .map(|repo| repo.stargazers_count)
        .sum()
}

/// Owned, non-fork repositories with at least one star, ranked by stars with
/// the full name breaking ties, cut to `limit`
pub fn top_starred(repositories: &[RepositoryInfo], limit: usize) -> Vec<RepositoryInfo> {
    let mut starred: Vec<RepositoryInfo> = repositories
        .iter()
        .filter(|repo| !repo.fork && repo.stargazers_count > 0)
        .cloned()
        .collect();
    starred.sort_by(|a, b| {
        b.stargazers_count
            .cmp(&a.stargazers_count)
            .then_with(|| a.full_name.cmp(&b.full_name))
    });
    starred.truncate(limit);
    starred
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(full_name: &str, stars: u64, fork: bool) -> RepositoryInfo {
        RepositoryInfo {
            name: full_name.rsplit('/').next().unwrap_or(full_name).to_string(),
            full_name: full_name.to_string(),
            description: None,
            language: None,
            stargazers_count: stars,
            fork,
        }
    }

    #[test]
    fn test_total_stars_skips_forks() {
        let repos = vec![repo("me/a", 7, false), repo("me/b", 3, false), repo("me/fork", 100, true)];
        assert_eq!(total_stars(&repos), 10);
    }

    #[test]
    fn test_top_starred_ranks_and_truncates() {
        let repos = vec![
            repo("me/quiet", 0, false),
            repo("me/b", 3, false),
            repo("me/fork", 100, true),
            repo("me/a", 3, false),
            repo("me/big", 40, false),
        ];

        let names: Vec<_> = top_starred(&repos, 2).into_iter().map(|r| r.full_name).collect();
        assert_eq!(names, vec!["me/big", "me/a"]);
        assert_eq!(top_starred(&repos, 10).len(), 3);
    }

    #[test]
    fn test_display_name_falls_back_to_login() {
        let mut profile = UserProfile {
            login: "octocat".to_string(),
            name: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(profile.display_name(), "octocat");
        profile.name = Some("The Octocat".to_string());
        assert_eq!(profile.display_name(), "The Octocat");
    }
}
