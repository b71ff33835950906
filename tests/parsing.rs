use std::fs;
use std::path::PathBuf;

use squad_ingest::league::parse_team_links;
use squad_ingest::merge::merge_page;
use squad_ingest::player::{PlayerRecord, StatField, StatValue};
use squad_ingest::position::{PositionCategory, classify_position};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn find<'a>(records: &'a [PlayerRecord], name: &str) -> &'a PlayerRecord {
    records
        .iter()
        .find(|r| r.name == name)
        .unwrap_or_else(|| panic!("{name} missing from merged page"))
}

#[test]
fn merges_every_table_of_a_team_page() {
    let records = merge_page(&read_fixture("team_page.html"));
    let names = records.iter().map(|r| r.name.as_str()).collect::<Vec<_>>();
    assert_eq!(
        names,
        vec![
            "Bukayo Saka",
            "William Saliba",
            "Declan Rice",
            "David Raya",
            "Jakub Kiwior"
        ]
    );
}

#[test]
fn first_table_wins_for_overlapping_stats() {
    let records = merge_page(&read_fixture("team_page.html"));

    let saka = find(&records, "Bukayo Saka");
    assert_eq!(saka.stats.goals, Some(6));
    assert_eq!(saka.stats.shots, Some(52));
    assert_eq!(saka.stats.goals_per_shot, Some(0.12));
    assert_eq!(saka.stats.minutes, Some(1744));

    let raya = find(&records, "David Raya");
    assert_eq!(raya.stats.minutes, Some(3420));
    assert_eq!(raya.stats.gk_saves, Some(85));
    assert_eq!(raya.stats.gk_save_pct, Some(71.4));
    assert_eq!(raya.stats.gk_def_actions_outside_pen_area, Some(20));

    let rice = find(&records, "Declan Rice");
    assert_eq!(rice.position, "MF");
    assert_eq!(rice.age, Some(26));
    assert_eq!(rice.stats.passes_completed, Some(1850));
    assert_eq!(rice.stats.carries_distance, Some(4321));
    assert_eq!(rice.stats.pass_completion, Some(88.1));
    assert_eq!(rice.stats.tackles, Some(58));
    assert_eq!(rice.stats.aerials_won_pct, None);
}

#[test]
fn identity_fields_from_flags_and_links() {
    let records = merge_page(&read_fixture("team_page.html"));

    let saka = find(&records, "Bukayo Saka");
    assert_eq!(saka.nationality, "ENG");
    assert_eq!(saka.age, Some(23));
    assert_eq!(
        saka.image.as_deref(),
        Some("https://fbref.com/req/202302030/images/headshots/bc7dc64d_2022.jpg")
    );

    assert_eq!(find(&records, "William Saliba").nationality, "FR");
    assert_eq!(find(&records, "Jakub Kiwior").nationality, "POL");
}

#[test]
fn merged_page_classifies_by_priority() {
    let records = merge_page(&read_fixture("team_page.html"));
    let categories = records
        .iter()
        .map(|r| (r.name.as_str(), classify_position(&r.position)))
        .collect::<Vec<_>>();
    assert_eq!(
        categories,
        vec![
            ("Bukayo Saka", PositionCategory::Forward),
            ("William Saliba", PositionCategory::Defender),
            ("Declan Rice", PositionCategory::Midfielder),
            ("David Raya", PositionCategory::Goalkeeper),
            ("Jakub Kiwior", PositionCategory::Defender),
        ]
    );
}

#[test]
fn plain_headers_merge_by_name() {
    let html = r#"
        <table class="stats_table" id="a">
          <thead><tr><th>Name</th><th>Age</th><th>Goals</th></tr></thead>
          <tbody><tr><td>John Doe</td><td>23-100</td><td>5</td></tr></tbody>
        </table>
        <table class="stats_table" id="b">
          <thead><tr><th>Name</th><th>Tackles</th></tr></thead>
          <tbody><tr><td>John Doe</td><td>10</td></tr></tbody>
        </table>"#;
    let records = merge_page(html);
    assert_eq!(records.len(), 1);
    let john = &records[0];
    assert_eq!(john.name, "John Doe");
    assert_eq!(john.age, Some(23));
    assert_eq!(john.stats.get(StatField::Goals), Some(StatValue::Int(5)));
    assert_eq!(john.stats.get(StatField::Tackles), Some(StatValue::Int(10)));
    assert_eq!(john.nationality, "Unknown");
    assert_eq!(john.position, "Unknown");
}

#[test]
fn placeholder_rows_are_dropped() {
    let html = r#"
        <table class="stats_table">
          <thead><tr><th>Player</th><th>Gls</th></tr></thead>
          <tbody>
            <tr><td>Player</td><td>1</td></tr>
            <tr><td>TOTAL</td><td>30</td></tr>
            <tr><td>bench</td><td>0</td></tr>
            <tr><td>12</td><td>0</td></tr>
            <tr><td>Gabriel Jesus</td><td>3</td></tr>
          </tbody>
        </table>"#;
    let records = merge_page(html);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Gabriel Jesus");
}

#[test]
fn remerging_a_table_changes_nothing() {
    let a = r#"<table class="stats_table"><thead><tr><th>Player</th><th>Gls</th></tr></thead>
        <tbody><tr><td>Kai Havertz</td><td>9</td></tr></tbody></table>"#;
    let b = r#"<table class="stats_table"><thead><tr><th>Player</th><th>Gls</th><th>Ast</th></tr></thead>
        <tbody><tr><td>Kai Havertz</td><td>1</td><td>4</td></tr></tbody></table>"#;

    let once = merge_page(&format!("{a}{b}"));
    let twice = merge_page(&format!("{a}{b}{b}"));
    assert_eq!(once, twice);
    assert_eq!(once[0].stats.goals, Some(9));
    assert_eq!(once[0].stats.assists, Some(4));
}

#[test]
fn documents_without_tables_yield_nothing() {
    assert!(merge_page("").is_empty());
    assert!(merge_page("<html><body><p>Too many requests</p></body></html>").is_empty());
}

#[test]
fn league_page_lists_each_team_once() {
    let teams = parse_team_links(&read_fixture("league_page.html"));
    let names = teams.iter().map(|t| t.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["Liverpool", "Arsenal", "Manchester City"]);
    assert_eq!(
        teams[1].url,
        "https://fbref.com/en/squads/18bb7c10/Arsenal-Stats"
    );
    assert_eq!(
        teams[2].url,
        "https://fbref.com/en/squads/b8fd03ef/Manchester-City-Stats"
    );
}
