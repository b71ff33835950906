use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use squad_ingest::merge::merge_page;
use squad_ingest::player::PlayerRecord;
use squad_ingest::position::PositionCategory;
use squad_ingest::store::{BatchSummary, Store};

static COUNTER: AtomicUsize = AtomicUsize::new(0);

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn temp_store(tag: &str) -> Store {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let seq = COUNTER.fetch_add(1, Ordering::SeqCst);
    let path = std::env::temp_dir()
        .join(format!("squad_ingest_{tag}_{}_{nanos}_{seq}", std::process::id()))
        .join("squads.sqlite");
    Store::open(&path).expect("temp store should open")
}

fn player(name: &str, position: &str) -> PlayerRecord {
    let mut record = PlayerRecord::named(name);
    record.position = position.to_string();
    record
}

#[test]
fn club_upsert_keeps_id_and_refreshes_league() {
    let store = temp_store("club");
    let first = store
        .upsert_club("Arsenal", "Premier League", "Professional")
        .expect("club insert");
    let second = store
        .upsert_club("Arsenal", "Women's Super League", "Semi-Pro")
        .expect("club update");
    assert_eq!(first, second);

    let summary = store
        .club_summary("Arsenal")
        .expect("summary query")
        .expect("club exists");
    assert_eq!(summary.league.as_deref(), Some("Women's Super League"));
    assert_eq!(summary.level.as_deref(), Some("Semi-Pro"));
    assert_eq!(summary.players, 0);
}

#[test]
fn repeating_a_batch_adds_no_players() {
    let store = temp_store("idempotent");
    let club_id = store
        .upsert_club("Arsenal", "Premier League", "Professional")
        .expect("club");
    let records = merge_page(&read_fixture("team_page.html"));

    let first = store
        .upsert_players_batch(&records, club_id)
        .expect("first batch");
    assert_eq!(
        first,
        BatchSummary {
            existing: 0,
            inserted: 5,
            stat_rows: 5,
            unrouted: 0,
        }
    );
    assert_eq!(store.player_count(club_id).expect("count"), 5);

    let second = store
        .upsert_players_batch(&records, club_id)
        .expect("second batch");
    assert_eq!(second.existing, 5);
    assert_eq!(second.inserted, 0);
    assert_eq!(store.player_count(club_id).expect("count"), 5);
}

#[test]
fn unknown_position_gets_no_stat_row() {
    let store = temp_store("unknown");
    let club_id = store.upsert_club("Brentford", "Premier League", "Professional").expect("club");
    let summary = store
        .upsert_players_batch(&[player("Trialist", "Unknown")], club_id)
        .expect("batch");
    assert_eq!(summary.unrouted, 1);
    assert_eq!(summary.stat_rows, 0);

    let id = store
        .player_id(club_id, "Trialist")
        .expect("lookup")
        .expect("player stored");
    assert!(store.stat_row_categories(id).expect("probe").is_empty());
}

#[test]
fn reclassified_player_keeps_one_stat_row() {
    let store = temp_store("reclassify");
    let club_id = store.upsert_club("Arsenal", "Premier League", "Professional").expect("club");

    store
        .upsert_players_batch(&[player("Ben White", "DF")], club_id)
        .expect("first batch");
    let id = store
        .player_id(club_id, "Ben White")
        .expect("lookup")
        .expect("player stored");
    assert_eq!(
        store.stat_row_categories(id).expect("probe"),
        vec![PositionCategory::Defender]
    );

    store
        .upsert_players_batch(&[player("Ben White", "MF")], club_id)
        .expect("second batch");
    assert_eq!(
        store.stat_row_categories(id).expect("probe"),
        vec![PositionCategory::Midfielder]
    );
}

#[test]
fn same_name_at_two_clubs_is_two_players() {
    let store = temp_store("two_clubs");
    let arsenal = store.upsert_club("Arsenal", "Premier League", "Professional").expect("club");
    let brighton = store.upsert_club("Brighton", "Premier League", "Professional").expect("club");
    let records = [player("Danny Welbeck", "FW")];
    store.upsert_players_batch(&records, arsenal).expect("batch");
    store.upsert_players_batch(&records, brighton).expect("batch");
    assert_eq!(store.player_count(arsenal).expect("count"), 1);
    assert_eq!(store.player_count(brighton).expect("count"), 1);
}

#[test]
fn missing_club_rolls_back_the_batch() {
    let store = temp_store("rollback");
    assert!(
        store
            .upsert_players_batch(&[player("Nobody", "FW")], 9_999)
            .is_none()
    );
    assert_eq!(store.player_count(9_999).expect("count"), 0);
}

#[test]
fn stats_land_in_their_position_tables() {
    let store = temp_store("routing");
    let club_id = store.upsert_club("Arsenal", "Premier League", "Professional").expect("club");
    let records = merge_page(&read_fixture("team_page.html"));
    store.upsert_players_batch(&records, club_id).expect("batch");

    let keepers = store
        .position_leaders(PositionCategory::Goalkeeper, 5)
        .expect("keepers");
    assert_eq!(keepers.len(), 1);
    let raya = &keepers[0];
    assert_eq!(raya.name, "David Raya");
    assert_eq!(raya.club, "Arsenal");
    let metric = |name: &str| {
        raya.metrics
            .iter()
            .find(|(metric, _)| metric == name)
            .and_then(|(_, value)| *value)
    };
    assert_eq!(metric("save_pct"), Some(71.4));
    assert_eq!(metric("matches_played"), Some(38.0));
    assert_eq!(metric("clean_sheets"), Some(13.0));

    let defenders = store
        .position_leaders(PositionCategory::Defender, 5)
        .expect("defenders");
    let names = defenders.iter().map(|d| d.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["William Saliba", "Jakub Kiwior"]);
    let kiwior_aerials = defenders[1]
        .metrics
        .iter()
        .find(|(metric, _)| metric == "aerials_won_pct")
        .map(|(_, value)| *value);
    assert_eq!(kiwior_aerials, Some(None));

    let mids = store
        .position_leaders(PositionCategory::Midfielder, 5)
        .expect("midfielders");
    let recoveries = mids[0]
        .metrics
        .iter()
        .find(|(metric, _)| metric == "recoveries")
        .and_then(|(_, value)| *value);
    assert_eq!(recoveries, Some(27.0));
}

#[test]
fn club_summary_counts_by_category() {
    let store = temp_store("summary");
    let club_id = store.upsert_club("Arsenal", "Premier League", "Professional").expect("club");
    let records = merge_page(&read_fixture("team_page.html"));
    store.upsert_players_batch(&records, club_id).expect("batch");

    let summary = store
        .club_summary("Arsenal")
        .expect("summary query")
        .expect("club exists");
    assert_eq!(summary.players, 5);
    assert_eq!(
        summary.by_category,
        vec![
            ("defender".to_string(), 2),
            ("forward".to_string(), 1),
            ("goalkeeper".to_string(), 1),
            ("midfielder".to_string(), 1),
        ]
    );
    let average = summary.average_age.expect("ages present");
    assert!((average - 25.4).abs() < 1e-9);
    assert_eq!(summary.top_scorers.len(), 1);
    assert_eq!(summary.top_scorers[0].name, "Bukayo Saka");
    assert_eq!(summary.top_scorers[0].goals, 6);

    assert!(store.club_summary("Tottenham").expect("query").is_none());
}

#[test]
fn standalone_stat_upsert_replaces_the_row() {
    let store = temp_store("standalone");
    let club_id = store.upsert_club("Chelsea", "Premier League", "Professional").expect("club");
    store
        .upsert_players_batch(&[player("Cole Palmer", "FW")], club_id)
        .expect("batch");
    let id = store
        .player_id(club_id, "Cole Palmer")
        .expect("lookup")
        .expect("player stored");

    let mut record = player("Cole Palmer", "AM");
    record.stats.passes_completed = Some(1_020);
    assert_eq!(
        store.upsert_position_stats(id, &record, PositionCategory::Midfielder),
        Some(true)
    );
    assert_eq!(
        store.stat_row_categories(id).expect("probe"),
        vec![PositionCategory::Midfielder]
    );
    assert_eq!(
        store.upsert_position_stats(id, &record, PositionCategory::Unknown),
        Some(false)
    );
}

#[test]
fn concurrent_team_batches_all_commit() {
    let store = temp_store("concurrent");
    let failures = AtomicUsize::new(0);

    std::thread::scope(|scope| {
        for worker in 0..6 {
            let store = &store;
            let failures = &failures;
            scope.spawn(move || {
                for round in 0..5 {
                    let club = format!("Club {worker}-{round}");
                    let Some(club_id) = store.upsert_club(&club, "Test League", "Professional")
                    else {
                        failures.fetch_add(1, Ordering::SeqCst);
                        continue;
                    };
                    let squad = (0..30)
                        .map(|n| player(&format!("P{n}"), ["GK", "DF", "MF", "FW"][n % 4]))
                        .collect::<Vec<_>>();
                    if store.upsert_players_batch(&squad, club_id).is_none() {
                        failures.fetch_add(1, Ordering::SeqCst);
                    }
                }
            });
        }
    });

    assert_eq!(failures.load(Ordering::SeqCst), 0);
    let sample = store
        .club_summary("Club 5-4")
        .expect("summary")
        .expect("club stored");
    assert_eq!(sample.players, 30);
}

#[test]
fn negative_ratio_does_not_sink_the_batch() {
    let store = temp_store("negative_ratio");
    let club_id = store.upsert_club("Fulham", "Premier League", "Professional").expect("club");
    let mut striker = player("Raul Jimenez", "FW");
    striker.stats.goals = Some(12);
    striker.stats.goals_per_shot = Some(-0.5);
    let mut centre_back = player("Calvin Bassey", "DF");
    centre_back.stats.aerials_won_pct = Some(-3.0);

    let summary = store
        .upsert_players_batch(&[striker, centre_back], club_id)
        .expect("batch should commit");
    assert_eq!(summary.stat_rows, 2);

    let forwards = store
        .position_leaders(PositionCategory::Forward, 1)
        .expect("forwards");
    let ratio = forwards[0]
        .metrics
        .iter()
        .find(|(metric, _)| metric == "goals_per_shot")
        .map(|(_, value)| *value);
    assert_eq!(ratio, Some(None));
}
