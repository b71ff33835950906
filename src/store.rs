use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use rusqlite::{
    Connection, OptionalExtension, ToSql, Transaction, TransactionBehavior, params,
};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::player::PlayerRecord;
use crate::position::{PositionCategory, classify_position};

const DATA_DIR: &str = "squad_ingest";
const DB_FILE: &str = "squads.sqlite";
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_IDLE_CONNECTIONS: usize = 4;
/// Keeps `IN (...)` lists well under SQLite's bound-parameter limit.
const LOOKUP_CHUNK: usize = 400;

pub fn default_db_path() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_DATA_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(DATA_DIR).join(DB_FILE));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(DATA_DIR)
            .join(DB_FILE),
    )
}

/// Connections are checked out for one logical operation and handed back
/// afterwards; nothing holds one across a network fetch.
struct ConnectionPool {
    path: PathBuf,
    idle: Mutex<Vec<Connection>>,
}

impl ConnectionPool {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            idle: Mutex::new(Vec::new()),
        }
    }

    fn with_conn<T>(&self, action: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let pooled = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        let mut conn = match pooled {
            Some(conn) => conn,
            None => open_connection(&self.path)?,
        };
        let result = action(&mut conn);
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < MAX_IDLE_CONNECTIONS {
            idle.push(conn);
        }
        result
    }
}

fn open_connection(path: &Path) -> Result<Connection> {
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    conn.busy_timeout(BUSY_TIMEOUT)
        .context("set sqlite busy timeout")?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .context("enable foreign keys")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS clubs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            league TEXT NULL,
            level TEXT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS players (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            age INTEGER NULL CHECK (age >= 0),
            position TEXT NULL,
            nationality TEXT NULL,
            club_id INTEGER NOT NULL REFERENCES clubs(id) ON DELETE CASCADE,
            image TEXT NULL,
            category TEXT NULL,
            created_at TEXT NOT NULL,
            UNIQUE (name, club_id)
        );
        CREATE INDEX IF NOT EXISTS idx_players_club_id ON players(club_id);
        CREATE INDEX IF NOT EXISTS idx_players_name ON players(name);

        CREATE TABLE IF NOT EXISTS goalkeeper_stats (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            player_id INTEGER NOT NULL UNIQUE REFERENCES players(id) ON DELETE CASCADE,
            save_pct REAL NOT NULL CHECK (save_pct BETWEEN 0 AND 100),
            clean_sheets INTEGER NOT NULL CHECK (clean_sheets >= 0),
            def_actions_outside_pen_area INTEGER NOT NULL CHECK (def_actions_outside_pen_area >= 0),
            pens_saved INTEGER NOT NULL CHECK (pens_saved >= 0),
            matches_played INTEGER NOT NULL CHECK (matches_played >= 0),
            saves INTEGER NOT NULL CHECK (saves >= 0),
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS defender_stats (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            player_id INTEGER NOT NULL UNIQUE REFERENCES players(id) ON DELETE CASCADE,
            tackles_won INTEGER NOT NULL CHECK (tackles_won >= 0),
            interceptions INTEGER NOT NULL CHECK (interceptions >= 0),
            aerials_won_pct REAL NULL,
            cards_yellow INTEGER NOT NULL CHECK (cards_yellow >= 0),
            cards_red INTEGER NOT NULL CHECK (cards_red >= 0),
            minutes INTEGER NOT NULL CHECK (minutes >= 0),
            tackles INTEGER NOT NULL CHECK (tackles >= 0),
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS midfielder_stats (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            player_id INTEGER NOT NULL UNIQUE REFERENCES players(id) ON DELETE CASCADE,
            passes_completed INTEGER NOT NULL CHECK (passes_completed >= 0),
            recoveries INTEGER NOT NULL CHECK (recoveries >= 0),
            carries_distance INTEGER NOT NULL CHECK (carries_distance >= 0),
            through_balls INTEGER NOT NULL CHECK (through_balls >= 0),
            assists INTEGER NOT NULL CHECK (assists >= 0),
            goals INTEGER NOT NULL CHECK (goals >= 0),
            minutes INTEGER NOT NULL CHECK (minutes >= 0),
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS forward_stats (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            player_id INTEGER NOT NULL UNIQUE REFERENCES players(id) ON DELETE CASCADE,
            goals INTEGER NOT NULL CHECK (goals >= 0),
            goals_per_shot REAL NULL CHECK (goals_per_shot >= 0),
            assists INTEGER NOT NULL CHECK (assists >= 0),
            minutes INTEGER NOT NULL CHECK (minutes >= 0),
            shots INTEGER NOT NULL CHECK (shots >= 0),
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS ingest_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT NULL,
            league TEXT NOT NULL,
            teams_total INTEGER NOT NULL,
            teams_succeeded INTEGER NOT NULL,
            players_written INTEGER NOT NULL,
            errors_json TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

fn stats_table(category: PositionCategory) -> Option<&'static str> {
    match category {
        PositionCategory::Goalkeeper => Some("goalkeeper_stats"),
        PositionCategory::Defender => Some("defender_stats"),
        PositionCategory::Midfielder => Some("midfielder_stats"),
        PositionCategory::Forward => Some("forward_stats"),
        PositionCategory::Unknown => None,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub existing: usize,
    pub inserted: usize,
    pub stat_rows: usize,
    pub unrouted: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderRow {
    pub name: String,
    pub age: Option<u32>,
    pub nationality: Option<String>,
    pub club: String,
    pub league: Option<String>,
    pub metrics: Vec<(String, Option<f64>)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClubSummary {
    pub name: String,
    pub league: Option<String>,
    pub level: Option<String>,
    pub players: usize,
    pub average_age: Option<f64>,
    pub by_category: Vec<(String, usize)>,
    pub top_scorers: Vec<TopScorer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopScorer {
    pub name: String,
    pub goals: u32,
    pub assists: u32,
}

/// Persistence gateway. Every write runs in its own transaction; a failing
/// write is rolled back and logged and the caller only sees `None`.
pub struct Store {
    path: PathBuf,
    pool: ConnectionPool,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create db dir {}", parent.display()))?;
        }
        let store = Self {
            path: path.to_path_buf(),
            pool: ConnectionPool::new(path.to_path_buf()),
        };
        store.pool.with_conn(|conn| init_schema(conn))?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write<T>(
        &self,
        what: &str,
        action: impl FnOnce(&Transaction<'_>) -> Result<T>,
    ) -> Option<T> {
        let result = self.pool.with_conn(|conn| {
            // Write lock at BEGIN; busy_timeout then queues concurrent writers.
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .with_context(|| format!("begin {what}"))?;
            let value = action(&tx)?;
            tx.commit().with_context(|| format!("commit {what}"))?;
            Ok(value)
        });
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                error!("{what} rolled back: {err:#}");
                None
            }
        }
    }

    /// Inserts the club or refreshes its league and level; the id is stable
    /// across calls.
    pub fn upsert_club(&self, name: &str, league: &str, level: &str) -> Option<i64> {
        self.write("club upsert", |tx| {
            let now = Utc::now().to_rfc3339();
            tx.query_row(
                r#"
                INSERT INTO clubs (name, league, level, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?4)
                ON CONFLICT(name) DO UPDATE SET
                    league = excluded.league,
                    level = excluded.level,
                    updated_at = excluded.updated_at
                RETURNING id
                "#,
                params![name.trim(), league, level, now],
                |row| row.get::<_, i64>(0),
            )
            .with_context(|| format!("upsert club {name}"))
        })
    }

    pub fn upsert_players_batch(
        &self,
        records: &[PlayerRecord],
        club_id: i64,
    ) -> Option<BatchSummary> {
        if records.is_empty() {
            return Some(BatchSummary::default());
        }
        let summary = self.write("player batch upsert", |tx| {
            upsert_players_tx(tx, records, club_id)
        })?;
        info!(
            club_id,
            inserted = summary.inserted,
            existing = summary.existing,
            stat_rows = summary.stat_rows,
            "player batch written"
        );
        Some(summary)
    }

    /// Writes (or replaces) the single stat row of `player_id` in the table of
    /// `category`. Unknown has no table and is a no-op.
    pub fn upsert_position_stats(
        &self,
        player_id: i64,
        record: &PlayerRecord,
        category: PositionCategory,
    ) -> Option<bool> {
        self.write("position stats upsert", |tx| {
            write_position_stats(tx, player_id, record, category)
        })
    }

    pub fn start_run(&self, league: &str, teams_total: usize) -> Option<i64> {
        self.write("ingest run start", |tx| {
            tx.execute(
                "INSERT INTO ingest_runs(started_at, finished_at, league, teams_total, teams_succeeded, players_written, errors_json)
                 VALUES (?1, NULL, ?2, ?3, 0, 0, '[]')",
                params![Utc::now().to_rfc3339(), league, teams_total as i64],
            )
            .context("insert ingest run")?;
            Ok(tx.last_insert_rowid())
        })
    }

    pub fn finish_run(
        &self,
        run_id: i64,
        teams_succeeded: usize,
        players_written: usize,
        errors: &[String],
    ) -> Option<()> {
        let errors_json = serde_json::to_string(errors).unwrap_or_else(|_| "[]".to_string());
        self.write("ingest run finish", |tx| {
            tx.execute(
                "UPDATE ingest_runs
                 SET finished_at = ?1, teams_succeeded = ?2, players_written = ?3, errors_json = ?4
                 WHERE run_id = ?5",
                params![
                    Utc::now().to_rfc3339(),
                    teams_succeeded as i64,
                    players_written as i64,
                    errors_json,
                    run_id
                ],
            )
            .context("update ingest run")?;
            Ok(())
        })
    }

    pub fn player_count(&self, club_id: i64) -> Result<usize> {
        self.pool.with_conn(|conn| {
            let count = conn
                .query_row(
                    "SELECT COUNT(*) FROM players WHERE club_id = ?1",
                    params![club_id],
                    |row| row.get::<_, i64>(0),
                )
                .context("count players")?;
            Ok(count as usize)
        })
    }

    pub fn player_id(&self, club_id: i64, name: &str) -> Result<Option<i64>> {
        self.pool.with_conn(|conn| {
            conn.query_row(
                "SELECT id FROM players WHERE club_id = ?1 AND name = ?2",
                params![club_id, name],
                |row| row.get::<_, i64>(0),
            )
            .optional()
            .context("look up player id")
        })
    }

    /// Categories whose stat table currently holds a row for `player_id`.
    pub fn stat_row_categories(&self, player_id: i64) -> Result<Vec<PositionCategory>> {
        self.pool.with_conn(|conn| {
            let mut out = Vec::new();
            for category in PositionCategory::ROUTED {
                let Some(table) = stats_table(category) else {
                    continue;
                };
                let present = conn
                    .query_row(
                        &format!("SELECT 1 FROM {table} WHERE player_id = ?1"),
                        params![player_id],
                        |_| Ok(()),
                    )
                    .optional()
                    .with_context(|| format!("probe {table}"))?
                    .is_some();
                if present {
                    out.push(category);
                }
            }
            Ok(out)
        })
    }

    pub fn position_leaders(
        &self,
        category: PositionCategory,
        limit: usize,
    ) -> Result<Vec<LeaderRow>> {
        let Some(table) = stats_table(category) else {
            return Ok(Vec::new());
        };
        let (metrics, order_by) = leader_columns(category);
        let select = metrics
            .iter()
            .map(|col| format!("s.{col}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT p.name, p.age, p.nationality, c.name, c.league, {select}
             FROM players p
             JOIN clubs c ON p.club_id = c.id
             JOIN {table} s ON s.player_id = p.id
             ORDER BY {order_by}
             LIMIT ?1"
        );

        self.pool.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql).context("prepare leaders query")?;
            let rows = stmt
                .query_map(params![limit as i64], |row| {
                    let mut values = Vec::with_capacity(metrics.len());
                    for (idx, col) in metrics.iter().enumerate() {
                        values.push((col.to_string(), row.get::<_, Option<f64>>(5 + idx)?));
                    }
                    Ok(LeaderRow {
                        name: row.get(0)?,
                        age: row.get(1)?,
                        nationality: row.get(2)?,
                        club: row.get(3)?,
                        league: row.get(4)?,
                        metrics: values,
                    })
                })
                .context("query leaders")?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row.context("decode leader row")?);
            }
            Ok(out)
        })
    }

    pub fn club_summary(&self, name: &str) -> Result<Option<ClubSummary>> {
        self.pool.with_conn(|conn| {
            let head = conn
                .query_row(
                    "SELECT c.id, c.name, c.league, c.level, COUNT(p.id), AVG(p.age)
                     FROM clubs c
                     LEFT JOIN players p ON p.club_id = c.id
                     WHERE c.name = ?1
                     GROUP BY c.id",
                    params![name.trim()],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, Option<String>>(2)?,
                            row.get::<_, Option<String>>(3)?,
                            row.get::<_, i64>(4)?,
                            row.get::<_, Option<f64>>(5)?,
                        ))
                    },
                )
                .optional()
                .context("query club summary")?;
            let Some((club_id, club_name, league, level, players, average_age)) = head else {
                return Ok(None);
            };

            let mut stmt = conn
                .prepare(
                    "SELECT COALESCE(category, 'unknown'), COUNT(*)
                     FROM players WHERE club_id = ?1
                     GROUP BY 1 ORDER BY 1",
                )
                .context("prepare category counts")?;
            let by_category = stmt
                .query_map(params![club_id], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
                })
                .context("query category counts")?
                .collect::<rusqlite::Result<Vec<_>>>()
                .context("decode category counts")?;

            let mut stmt = conn
                .prepare(
                    "SELECT p.name, f.goals, f.assists
                     FROM players p
                     JOIN forward_stats f ON f.player_id = p.id
                     WHERE p.club_id = ?1 AND f.goals > 0
                     ORDER BY f.goals DESC, f.assists DESC
                     LIMIT 5",
                )
                .context("prepare top scorers")?;
            let top_scorers = stmt
                .query_map(params![club_id], |row| {
                    Ok(TopScorer {
                        name: row.get(0)?,
                        goals: row.get(1)?,
                        assists: row.get(2)?,
                    })
                })
                .context("query top scorers")?
                .collect::<rusqlite::Result<Vec<_>>>()
                .context("decode top scorers")?;

            Ok(Some(ClubSummary {
                name: club_name,
                league,
                level,
                players: players as usize,
                average_age,
                by_category,
                top_scorers,
            }))
        })
    }
}

fn leader_columns(category: PositionCategory) -> (&'static [&'static str], &'static str) {
    match category {
        PositionCategory::Goalkeeper => (
            &[
                "save_pct",
                "clean_sheets",
                "def_actions_outside_pen_area",
                "pens_saved",
                "matches_played",
                "saves",
            ],
            "s.clean_sheets DESC, s.save_pct DESC",
        ),
        PositionCategory::Defender => (
            &[
                "tackles_won",
                "interceptions",
                "aerials_won_pct",
                "cards_yellow",
                "cards_red",
                "minutes",
                "tackles",
            ],
            "s.tackles_won DESC, s.interceptions DESC",
        ),
        PositionCategory::Midfielder => (
            &[
                "passes_completed",
                "recoveries",
                "carries_distance",
                "through_balls",
                "assists",
                "goals",
                "minutes",
            ],
            "s.passes_completed DESC, s.assists DESC",
        ),
        PositionCategory::Forward | PositionCategory::Unknown => (
            &["goals", "goals_per_shot", "assists", "minutes", "shots"],
            "s.goals DESC, s.assists DESC",
        ),
    }
}

fn upsert_players_tx(
    tx: &Transaction<'_>,
    records: &[PlayerRecord],
    club_id: i64,
) -> Result<BatchSummary> {
    let names = records.iter().map(|r| r.name.as_str()).collect::<Vec<_>>();
    let existing = lookup_player_ids(tx, club_id, &names)?;

    let fresh = records
        .iter()
        .filter(|r| !existing.contains_key(&r.name))
        .collect::<Vec<_>>();

    let mut inserted = 0usize;
    {
        let mut stmt = tx
            .prepare_cached(
                r#"
                INSERT INTO players (name, age, position, nationality, club_id, image, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(name, club_id) DO NOTHING
                "#,
            )
            .context("prepare player insert")?;
        let now = Utc::now().to_rfc3339();
        for record in &fresh {
            inserted += stmt
                .execute(params![
                    record.name,
                    record.age,
                    record.position,
                    record.nationality,
                    club_id,
                    record.image,
                    now,
                ])
                .with_context(|| format!("insert player {}", record.name))?;
        }
    }

    let fresh_names = fresh.iter().map(|r| r.name.as_str()).collect::<Vec<_>>();
    let fresh_ids = lookup_player_ids(tx, club_id, &fresh_names)?;

    let mut summary = BatchSummary {
        existing: existing.len(),
        inserted,
        ..BatchSummary::default()
    };
    for record in records {
        let Some(player_id) = existing
            .get(&record.name)
            .or_else(|| fresh_ids.get(&record.name))
            .copied()
        else {
            return Err(anyhow!("no player id for {} after insert", record.name));
        };
        let category = classify_position(&record.position);
        if write_position_stats(tx, player_id, record, category)? {
            summary.stat_rows += 1;
        } else {
            summary.unrouted += 1;
        }
    }
    Ok(summary)
}

fn lookup_player_ids(
    tx: &Transaction<'_>,
    club_id: i64,
    names: &[&str],
) -> Result<HashMap<String, i64>> {
    let mut out = HashMap::new();
    for chunk in names.chunks(LOOKUP_CHUNK) {
        let placeholders = vec!["?"; chunk.len()].join(", ");
        let sql =
            format!("SELECT name, id FROM players WHERE club_id = ? AND name IN ({placeholders})");
        let mut args: Vec<&dyn ToSql> = Vec::with_capacity(chunk.len() + 1);
        args.push(&club_id);
        for name in chunk {
            args.push(name);
        }
        let mut stmt = tx.prepare(&sql).context("prepare player id lookup")?;
        let rows = stmt
            .query_map(args.as_slice(), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })
            .context("query player ids")?;
        for row in rows {
            let (name, id) = row.context("decode player id")?;
            out.insert(name, id);
        }
    }
    Ok(out)
}

fn count(value: Option<u32>) -> i64 {
    value.map(i64::from).unwrap_or(0)
}

/// Ratios are never negative; a negative cell is treated as unset.
fn ratio(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v >= 0.0)
}

/// Returns `false` when the category has no stat table. A player routed to a
/// different category than last time loses the old row first.
fn write_position_stats(
    tx: &Transaction<'_>,
    player_id: i64,
    record: &PlayerRecord,
    category: PositionCategory,
) -> Result<bool> {
    let Some(table) = stats_table(category) else {
        return Ok(false);
    };

    let previous = tx
        .query_row(
            "SELECT category FROM players WHERE id = ?1",
            params![player_id],
            |row| row.get::<_, Option<String>>(0),
        )
        .optional()
        .context("read stored category")?
        .flatten()
        .and_then(|key| PositionCategory::from_key(&key));
    if let Some(previous) = previous
        && previous != category
        && let Some(stale) = stats_table(previous)
    {
        let removed = tx
            .execute(
                &format!("DELETE FROM {stale} WHERE player_id = ?1"),
                params![player_id],
            )
            .with_context(|| format!("drop stale {stale} row"))?;
        debug!(player_id, from = %previous, to = %category, removed, "player reclassified");
    }

    let s = &record.stats;
    let now = Utc::now().to_rfc3339();
    match category {
        PositionCategory::Goalkeeper => tx.execute(
            r#"
            INSERT INTO goalkeeper_stats (player_id, save_pct, clean_sheets, def_actions_outside_pen_area, pens_saved, matches_played, saves, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(player_id) DO UPDATE SET
                save_pct = excluded.save_pct,
                clean_sheets = excluded.clean_sheets,
                def_actions_outside_pen_area = excluded.def_actions_outside_pen_area,
                pens_saved = excluded.pens_saved,
                matches_played = excluded.matches_played,
                saves = excluded.saves,
                updated_at = excluded.updated_at
            "#,
            params![
                player_id,
                s.gk_save_pct.unwrap_or(0.0).clamp(0.0, 100.0),
                count(s.gk_clean_sheets),
                count(s.gk_def_actions_outside_pen_area),
                count(s.gk_pens_saved),
                count(s.minutes.map(|m| m / 90)),
                count(s.gk_saves),
                now,
            ],
        ),
        PositionCategory::Defender => tx.execute(
            r#"
            INSERT INTO defender_stats (player_id, tackles_won, interceptions, aerials_won_pct, cards_yellow, cards_red, minutes, tackles, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(player_id) DO UPDATE SET
                tackles_won = excluded.tackles_won,
                interceptions = excluded.interceptions,
                aerials_won_pct = excluded.aerials_won_pct,
                cards_yellow = excluded.cards_yellow,
                cards_red = excluded.cards_red,
                minutes = excluded.minutes,
                tackles = excluded.tackles,
                updated_at = excluded.updated_at
            "#,
            params![
                player_id,
                count(s.tackles_won),
                count(s.interceptions),
                ratio(s.aerials_won_pct),
                count(s.cards_yellow),
                count(s.cards_red),
                count(s.minutes),
                count(s.tackles),
                now,
            ],
        ),
        PositionCategory::Midfielder => tx.execute(
            r#"
            INSERT INTO midfielder_stats (player_id, passes_completed, recoveries, carries_distance, through_balls, assists, goals, minutes, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(player_id) DO UPDATE SET
                passes_completed = excluded.passes_completed,
                recoveries = excluded.recoveries,
                carries_distance = excluded.carries_distance,
                through_balls = excluded.through_balls,
                assists = excluded.assists,
                goals = excluded.goals,
                minutes = excluded.minutes,
                updated_at = excluded.updated_at
            "#,
            params![
                player_id,
                count(s.passes_completed),
                count(s.interceptions),
                count(s.carries_distance),
                count(s.through_balls),
                count(s.assists),
                count(s.goals),
                count(s.minutes),
                now,
            ],
        ),
        PositionCategory::Forward => tx.execute(
            r#"
            INSERT INTO forward_stats (player_id, goals, goals_per_shot, assists, minutes, shots, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(player_id) DO UPDATE SET
                goals = excluded.goals,
                goals_per_shot = excluded.goals_per_shot,
                assists = excluded.assists,
                minutes = excluded.minutes,
                shots = excluded.shots,
                updated_at = excluded.updated_at
            "#,
            params![
                player_id,
                count(s.goals),
                ratio(s.goals_per_shot),
                count(s.assists),
                count(s.minutes),
                count(s.shots),
                now,
            ],
        ),
        PositionCategory::Unknown => return Ok(false),
    }
    .with_context(|| format!("upsert {table} row for player {player_id}"))?;

    tx.execute(
        "UPDATE players SET category = ?1 WHERE id = ?2",
        params![category.key(), player_id],
    )
    .context("store player category")?;
    Ok(true)
}
