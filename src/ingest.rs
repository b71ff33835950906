use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::{DEFAULT_LEVEL, IngestConfig};
use crate::error::ScrapeError;
use crate::fetch::{Jitter, PageFetcher, RetryPolicy, fetch_with_retry};
use crate::league::{LeagueSource, TeamLink, parse_team_links, url_slug};
use crate::merge::merge_page;
use crate::store::{BatchSummary, Store};

/// Everything a run needs, passed explicitly instead of living in globals.
pub struct IngestContext {
    pub fetcher: Box<dyn PageFetcher>,
    pub store: Store,
    pub retry: RetryPolicy,
    pub team_pause: Jitter,
    pub league_pause: Jitter,
    pub workers: usize,
    pub debug_dir: Option<PathBuf>,
    pub level: String,
}

impl IngestContext {
    pub fn new(fetcher: Box<dyn PageFetcher>, store: Store) -> Self {
        Self {
            fetcher,
            store,
            retry: RetryPolicy::default(),
            team_pause: Jitter::secs(5, 10),
            league_pause: Jitter::secs(10, 20),
            workers: 1,
            debug_dir: None,
            level: DEFAULT_LEVEL.to_string(),
        }
    }

    pub fn from_config(config: &IngestConfig, fetcher: Box<dyn PageFetcher>, store: Store) -> Self {
        Self {
            fetcher,
            store,
            retry: config.retry,
            team_pause: config.team_pause,
            league_pause: config.league_pause,
            workers: config.workers.max(1),
            debug_dir: config.debug_dir.clone(),
            level: config.level.clone(),
        }
    }

    /// No pauses and a single attempt per page.
    pub fn without_delays(mut self) -> Self {
        self.retry = RetryPolicy {
            max_attempts: 1,
            backoff: Jitter::none(),
        };
        self.team_pause = Jitter::none();
        self.league_pause = Jitter::none();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamSummary {
    pub team: String,
    pub url: String,
    pub club_id: Option<i64>,
    pub players_found: usize,
    pub batch: Option<BatchSummary>,
    pub error: Option<String>,
}

impl TeamSummary {
    fn new(team: &TeamLink) -> Self {
        Self {
            team: team.name.clone(),
            url: team.url.clone(),
            club_id: None,
            players_found: 0,
            batch: None,
            error: None,
        }
    }

    fn failed(mut self, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        warn!(team = %self.team, "{reason}");
        self.error = Some(reason);
        self
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeagueSummary {
    pub league: String,
    pub url: String,
    pub run_id: Option<i64>,
    pub teams_total: usize,
    pub teams_succeeded: usize,
    pub players_written: usize,
    pub teams: Vec<TeamSummary>,
    pub errors: Vec<String>,
}

impl LeagueSummary {
    fn new(league: &LeagueSource) -> Self {
        Self {
            league: league.name.clone(),
            url: league.url.clone(),
            run_id: None,
            teams_total: 0,
            teams_succeeded: 0,
            players_written: 0,
            teams: Vec::new(),
            errors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestSummary {
    pub db_path: PathBuf,
    pub leagues: Vec<LeagueSummary>,
}

impl IngestSummary {
    pub fn teams_total(&self) -> usize {
        self.leagues.iter().map(|l| l.teams_total).sum()
    }

    pub fn teams_succeeded(&self) -> usize {
        self.leagues.iter().map(|l| l.teams_succeeded).sum()
    }

    pub fn players_written(&self) -> usize {
        self.leagues.iter().map(|l| l.players_written).sum()
    }
}

/// Club upsert, page fetch, merge and player batch for one team. Failures are
/// recorded on the summary and never propagate.
pub fn ingest_team(ctx: &IngestContext, league: &str, team: &TeamLink) -> TeamSummary {
    let mut summary = TeamSummary::new(team);
    info!(team = %team.name, url = %team.url, "processing team");

    let Some(club_id) = ctx.store.upsert_club(&team.name, league, &ctx.level) else {
        return summary.failed("club upsert failed");
    };
    summary.club_id = Some(club_id);

    let Some(html) = fetch_with_retry(ctx.fetcher.as_ref(), &team.url, &ctx.retry) else {
        return summary.failed(format!("could not fetch {}", team.url));
    };

    let records = merge_page(&html);
    if records.is_empty() {
        if let Some(dir) = ctx.debug_dir.as_deref() {
            write_debug_capture(dir, &team.url, &html);
        }
        let err = ScrapeError::ParseEmpty {
            url: team.url.clone(),
        };
        return summary.failed(err.to_string());
    }
    summary.players_found = records.len();

    match ctx.store.upsert_players_batch(&records, club_id) {
        Some(batch) => {
            info!(team = %team.name, players = records.len(), "team stored");
            summary.batch = Some(batch);
            summary
        }
        None => summary.failed("player batch was rolled back"),
    }
}

pub fn ingest_league(ctx: &IngestContext, league: &LeagueSource) -> LeagueSummary {
    let mut summary = LeagueSummary::new(league);
    info!(league = %league.name, "scraping league");

    let Some(html) = fetch_with_retry(ctx.fetcher.as_ref(), &league.url, &ctx.retry) else {
        error!(league = %league.name, "league page unavailable");
        summary
            .errors
            .push(format!("could not fetch league page {}", league.url));
        return summary;
    };
    let teams = parse_team_links(&html);
    summary.teams_total = teams.len();
    if teams.is_empty() {
        summary.errors.push("no teams found on league page".to_string());
    }
    summary.run_id = ctx.store.start_run(&league.name, teams.len());

    summary.teams = if ctx.workers > 1 && teams.len() > 1 {
        let pool = build_worker_pool(ctx.workers);
        with_worker_pool(&pool, || {
            teams
                .par_iter()
                .map(|team| {
                    let outcome = ingest_team(ctx, &league.name, team);
                    ctx.team_pause.pause();
                    outcome
                })
                .collect()
        })
    } else {
        let mut out = Vec::with_capacity(teams.len());
        for (idx, team) in teams.iter().enumerate() {
            if idx > 0 {
                ctx.team_pause.pause();
            }
            out.push(ingest_team(ctx, &league.name, team));
        }
        out
    };

    for team in &summary.teams {
        match &team.error {
            None => {
                summary.teams_succeeded += 1;
                summary.players_written += team.players_found;
            }
            Some(err) => summary.errors.push(format!("{}: {err}", team.team)),
        }
    }

    if let Some(run_id) = summary.run_id {
        ctx.store.finish_run(
            run_id,
            summary.teams_succeeded,
            summary.players_written,
            &summary.errors,
        );
    }
    info!(
        league = %league.name,
        teams = summary.teams_succeeded,
        total = summary.teams_total,
        players = summary.players_written,
        "league finished"
    );
    summary
}

pub fn ingest_all(ctx: &IngestContext, leagues: &[LeagueSource]) -> IngestSummary {
    let mut out = Vec::with_capacity(leagues.len());
    for (idx, league) in leagues.iter().enumerate() {
        if idx > 0 {
            ctx.league_pause.pause();
        }
        out.push(ingest_league(ctx, league));
    }
    IngestSummary {
        db_path: ctx.store.path().to_path_buf(),
        leagues: out,
    }
}

fn build_worker_pool(workers: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|idx| format!("ingest-{idx}"))
        .build()
        .ok()
}

fn with_worker_pool<T>(pool: &Option<rayon::ThreadPool>, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    if let Some(pool) = pool.as_ref() {
        pool.install(action)
    } else {
        action()
    }
}

/// Keeps the raw document of a page that produced no players.
pub fn write_debug_capture(dir: &Path, url: &str, html: &str) -> Option<PathBuf> {
    let path = dir.join(format!("debug_{}.html", url_slug(url)));
    if let Err(err) = fs::create_dir_all(dir).and_then(|_| fs::write(&path, html)) {
        warn!(path = %path.display(), "could not write debug capture: {err}");
        return None;
    }
    info!(path = %path.display(), "saved page for inspection");
    Some(path)
}
