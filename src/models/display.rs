use serde::Serialize;

/// Display-ready card content; every field is already formatted text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayModel {
    pub username: String,
    pub title: String,
    pub greeting: String,
    pub headlines: Vec<Headline>,
    pub stars_line: Option<String>,
    pub languages: Vec<LanguageRow>,
    pub repositories: Vec<RepositoryRow>,
    pub starred: Vec<StarredRow>,
    pub timeline: Vec<TimelineBar>,
    pub busiest_month: Option<String>,
    pub footer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Headline {
    pub value: String,
    pub label: String,
    pub flavor: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageRow {
    pub name: String,
    /// Fraction of all language events, 0.0..=1.0
    pub share: f64,
    pub percent_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryRow {
    pub name: String,
    pub detail: String,
}

/// One line of the most-starred panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StarredRow {
    pub name: String,
    pub stars_label: String,
    /// Language and description, either may be missing
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineBar {
    pub label: String,
    pub count: u32,
    /// Height relative to the busiest month, 0.0..=1.0
    pub ratio: f64,
}
