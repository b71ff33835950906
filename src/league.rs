use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde::Serialize;
use tracing::{info, warn};

use crate::tables::{cell_text, css};

pub const SITE_ROOT: &str = "https://fbref.com";

static STANDINGS_ROWS: Lazy<Selector> = Lazy::new(|| css("tbody > tr"));
static STANDINGS_TABLE: Lazy<Selector> = Lazy::new(|| css("table.stats_table"));
static LINK: Lazy<Selector> = Lazy::new(|| css("a[href]"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeagueSource {
    pub name: String,
    pub url: String,
}

impl LeagueSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

pub fn default_leagues() -> Vec<LeagueSource> {
    vec![
        LeagueSource::new(
            "Premier League",
            "https://fbref.com/en/comps/9/2024-2025/2024-2025-Premier-League-Stats",
        ),
        LeagueSource::new(
            "La Liga",
            "https://fbref.com/en/comps/12/2024-2025/2024-2025-La-Liga-Stats",
        ),
        LeagueSource::new(
            "Serie A",
            "https://fbref.com/en/comps/11/2024-2025/2024-2025-Serie-A-Stats",
        ),
        LeagueSource::new(
            "Bundesliga",
            "https://fbref.com/en/comps/20/2024-2025/2024-2025-Bundesliga-Stats",
        ),
        LeagueSource::new(
            "Ligue 1",
            "https://fbref.com/en/comps/13/2024-2025/2024-2025-Ligue-1-Stats",
        ),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamLink {
    pub name: String,
    pub url: String,
}

/// Teams listed in the first statistic table of a league overview page, one
/// per row, in table order.
pub fn parse_team_links(html: &str) -> Vec<TeamLink> {
    let doc = Html::parse_document(html);
    let Some(table) = doc.select(&STANDINGS_TABLE).next() else {
        warn!("league page has no statistic table");
        return Vec::new();
    };

    let mut teams: Vec<TeamLink> = Vec::new();
    for row in table.select(&STANDINGS_ROWS) {
        let Some(link) = row.select(&LINK).next() else {
            continue;
        };
        let name = cell_text(link);
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if name.is_empty() || teams.iter().any(|t| t.name == name) {
            continue;
        }
        teams.push(TeamLink {
            name,
            url: absolute_url(href),
        });
    }
    info!(teams = teams.len(), "found teams in league");
    teams
}

pub fn absolute_url(href: &str) -> String {
    let href = href.trim();
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{SITE_ROOT}{href}")
    } else {
        format!("{SITE_ROOT}/{href}")
    }
}

/// File-system friendly slug of a team URL, used to name debug captures.
pub fn url_slug(url: &str) -> String {
    let segment = url
        .trim_end_matches('/')
        .rsplit('/')
        .find(|part| !part.is_empty())
        .unwrap_or("page");
    segment
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_urls() {
        assert_eq!(
            absolute_url("/en/squads/18bb7c10/Arsenal-Stats"),
            "https://fbref.com/en/squads/18bb7c10/Arsenal-Stats"
        );
        assert_eq!(absolute_url("https://example.org/x"), "https://example.org/x");
    }

    #[test]
    fn slug_from_last_segment() {
        assert_eq!(
            url_slug("https://fbref.com/en/squads/18bb7c10/Arsenal-Stats"),
            "Arsenal_Stats"
        );
        assert_eq!(url_slug(""), "page");
    }
}
