use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use squad_ingest::config::{IngestConfig, select_leagues};
use squad_ingest::fetch::HttpFetcher;
use squad_ingest::http_client::http_client;
use squad_ingest::ingest::{IngestContext, ingest_all};
use squad_ingest::store::{self, Store};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "squad_ingest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = IngestConfig::from_env();
    if let Some(raw) = parse_arg_value("--league") {
        let leagues = select_leagues(&raw);
        if leagues.is_empty() {
            return Err(anyhow!("no league matched {raw:?}"));
        }
        config.leagues = leagues;
    }

    let db_path = parse_arg_value("--db")
        .map(PathBuf::from)
        .or_else(|| config.db_path.clone())
        .or_else(store::default_db_path)
        .context("unable to resolve sqlite path")?;

    let store = Store::open(&db_path)?;
    let client = http_client(config.request_timeout).context("build http client")?;
    let ctx = IngestContext::from_config(&config, Box::new(HttpFetcher::new(client)), store);
    let summary = ingest_all(&ctx, &config.leagues);

    if has_flag("--json") {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Squad ingest complete");
    println!("DB: {}", summary.db_path.display());
    println!(
        "Teams: {}/{}",
        summary.teams_succeeded(),
        summary.teams_total()
    );
    println!("Players written: {}", summary.players_written());
    for league in &summary.leagues {
        println!(
            "{}: teams {}/{} players={} run={}",
            league.league,
            league.teams_succeeded,
            league.teams_total,
            league.players_written,
            league
                .run_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "n/a".to_string())
        );
        if !league.errors.is_empty() {
            println!("  errors: {}", league.errors.len());
            for err in league.errors.iter().take(6) {
                println!("   - {err}");
            }
        }
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

fn has_flag(name: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == name)
}
