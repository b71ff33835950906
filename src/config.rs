use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::fetch::{Jitter, RetryPolicy};
use crate::league::{LeagueSource, absolute_url, default_leagues};

pub const DEFAULT_LEVEL: &str = "Professional";

#[derive(Debug, Clone, PartialEq)]
pub struct IngestConfig {
    pub db_path: Option<PathBuf>,
    pub leagues: Vec<LeagueSource>,
    pub level: String,
    pub retry: RetryPolicy,
    pub team_pause: Jitter,
    pub league_pause: Jitter,
    pub workers: usize,
    pub request_timeout: Duration,
    pub debug_dir: Option<PathBuf>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            leagues: default_leagues(),
            level: DEFAULT_LEVEL.to_string(),
            retry: RetryPolicy::default(),
            team_pause: Jitter::secs(5, 10),
            league_pause: Jitter::secs(10, 20),
            workers: 1,
            request_timeout: Duration::from_secs(30),
            debug_dir: None,
        }
    }
}

impl IngestConfig {
    /// Reads the process environment. Call `dotenvy::dotenv()` first so a
    /// local `.env` is honoured.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let text = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let number = |key: &str, default: u64, lo: u64, hi: u64| {
            text(key)
                .and_then(|raw| raw.parse::<u64>().ok())
                .unwrap_or(default)
                .clamp(lo, hi)
        };
        let pause = |prefix: &str, default: Jitter| {
            let min = number(
                &format!("{prefix}_MIN_SECS"),
                default.min.as_secs(),
                0,
                600,
            );
            let max = number(
                &format!("{prefix}_MAX_SECS"),
                default.max.as_secs(),
                0,
                600,
            );
            Jitter::secs(min, max)
        };

        let leagues = match text("INGEST_LEAGUES") {
            Some(raw) => {
                let picked = select_leagues(&raw);
                if picked.is_empty() {
                    warn!(%raw, "INGEST_LEAGUES matched nothing, using default leagues");
                    defaults.leagues
                } else {
                    picked
                }
            }
            None => defaults.leagues,
        };

        Self {
            db_path: text("INGEST_DB_PATH").map(PathBuf::from),
            leagues,
            level: text("INGEST_LEVEL").unwrap_or(defaults.level),
            retry: RetryPolicy {
                max_attempts: number("FETCH_MAX_ATTEMPTS", 3, 1, 10) as u32,
                backoff: pause("FETCH_BACKOFF", defaults.retry.backoff),
            },
            team_pause: pause("TEAM_PAUSE", defaults.team_pause),
            league_pause: pause("LEAGUE_PAUSE", defaults.league_pause),
            workers: number("INGEST_WORKERS", 1, 1, 8) as usize,
            request_timeout: Duration::from_secs(number("REQUEST_TIMEOUT_SECS", 30, 1, 300)),
            debug_dir: text("DEBUG_HTML_DIR").map(PathBuf::from),
        }
    }
}

/// Comma or semicolon separated list. An entry is either the name of a built-in
/// league (case-insensitive) or `Name=URL` for any other competition page.
pub fn select_leagues(raw: &str) -> Vec<LeagueSource> {
    let known = default_leagues();
    let mut out: Vec<LeagueSource> = Vec::new();
    for entry in raw.split([',', ';']) {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let picked = match entry.split_once('=') {
            Some((name, url)) if !name.trim().is_empty() && !url.trim().is_empty() => {
                Some(LeagueSource::new(name.trim(), absolute_url(url)))
            }
            _ => known
                .iter()
                .find(|league| league.name.eq_ignore_ascii_case(entry))
                .cloned(),
        };
        match picked {
            Some(league) if !out.iter().any(|l| l.name == league.name) => out.push(league),
            Some(_) => {}
            None => warn!(league = entry, "unknown league skipped"),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> IngestConfig {
        let vars = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        IngestConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(config(&[]), IngestConfig::default());
    }

    #[test]
    fn numbers_are_clamped() {
        let cfg = config(&[
            ("INGEST_WORKERS", "64"),
            ("FETCH_MAX_ATTEMPTS", "0"),
            ("TEAM_PAUSE_MIN_SECS", "2"),
            ("TEAM_PAUSE_MAX_SECS", "1"),
            ("REQUEST_TIMEOUT_SECS", "nope"),
        ]);
        assert_eq!(cfg.workers, 8);
        assert_eq!(cfg.retry.max_attempts, 1);
        assert_eq!(cfg.team_pause, Jitter::secs(2, 2));
        assert_eq!(cfg.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn league_selection_by_name_and_url() {
        let leagues = select_leagues("serie a; Eredivisie=/en/comps/23/Eredivisie-Stats, Nope");
        assert_eq!(leagues.len(), 2);
        assert_eq!(leagues[0].name, "Serie A");
        assert_eq!(
            leagues[1].url,
            "https://fbref.com/en/comps/23/Eredivisie-Stats"
        );
    }

    #[test]
    fn unmatched_league_filter_falls_back() {
        let cfg = config(&[("INGEST_LEAGUES", "Nowhere League")]);
        assert_eq!(cfg.leagues, default_leagues());
    }
}
