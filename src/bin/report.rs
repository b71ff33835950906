use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use squad_ingest::position::PositionCategory;
use squad_ingest::store::{self, Store};

const DEFAULT_LIMIT: usize = 10;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "squad_ingest=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db_path = parse_arg_value("--db")
        .map(PathBuf::from)
        .or_else(|| std::env::var("INGEST_DB_PATH").ok().map(PathBuf::from))
        .or_else(store::default_db_path)
        .context("unable to resolve sqlite path")?;
    if !db_path.exists() {
        return Err(anyhow!("no database at {}", db_path.display()));
    }
    let store = Store::open(&db_path)?;
    let json = std::env::args().skip(1).any(|arg| arg == "--json");

    if let Some(club) = parse_arg_value("--club") {
        let summary = store
            .club_summary(&club)?
            .with_context(|| format!("club {club:?} not found"))?;
        if json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            return Ok(());
        }
        println!("{} ({})", summary.name, summary.league.as_deref().unwrap_or("-"));
        println!("Level: {}", summary.level.as_deref().unwrap_or("-"));
        println!("Players: {}", summary.players);
        match summary.average_age {
            Some(age) => println!("Average age: {age:.1}"),
            None => println!("Average age: n/a"),
        }
        for (category, count) in &summary.by_category {
            println!("  {category}: {count}");
        }
        if !summary.top_scorers.is_empty() {
            println!("Top scorers:");
            for scorer in &summary.top_scorers {
                println!("  {} {}g {}a", scorer.name, scorer.goals, scorer.assists);
            }
        }
        return Ok(());
    }

    let category = match parse_arg_value("--position") {
        Some(raw) => PositionCategory::from_key(&raw)
            .filter(|c| *c != PositionCategory::Unknown)
            .with_context(|| format!("unknown position {raw:?}"))?,
        None => PositionCategory::Forward,
    };
    let limit = parse_arg_value("--limit")
        .and_then(|raw| raw.parse::<usize>().ok())
        .unwrap_or(DEFAULT_LIMIT)
        .clamp(1, 500);

    let leaders = store.position_leaders(category, limit)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&leaders)?);
        return Ok(());
    }
    println!("Top {} {}s", leaders.len(), category);
    for (rank, row) in leaders.iter().enumerate() {
        let metrics = row
            .metrics
            .iter()
            .map(|(name, value)| match value {
                Some(v) if v.fract() == 0.0 => format!("{name}={v:.0}"),
                Some(v) => format!("{name}={v:.2}"),
                None => format!("{name}=-"),
            })
            .collect::<Vec<_>>()
            .join(" ");
        println!(
            "{:>3}. {} ({}, {}) {}",
            rank + 1,
            row.name,
            row.club,
            row.nationality.as_deref().unwrap_or("-"),
            metrics
        );
    }
    Ok(())
}

fn parse_arg_value(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}
