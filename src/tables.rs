use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::player::StatField;

static STATS_TABLE: Lazy<Selector> = Lazy::new(|| css("table.stats_table"));
static HEADER_ROWS: Lazy<Selector> = Lazy::new(|| css("thead > tr"));
static BODY: Lazy<Selector> = Lazy::new(|| css("tbody"));
static BODY_ROWS: Lazy<Selector> = Lazy::new(|| css("tbody > tr"));
static ROW: Lazy<Selector> = Lazy::new(|| css("tr"));

pub(crate) fn css(raw: &str) -> Selector {
    Selector::parse(raw).expect("static css selector must parse")
}

/// A statistic table that has at least one body row.
#[derive(Debug, Clone, Copy)]
pub struct StatTable<'a> {
    pub element: ElementRef<'a>,
}

impl<'a> StatTable<'a> {
    pub fn id(&self) -> &'a str {
        self.element.value().attr("id").unwrap_or("unknown_table")
    }

    /// Tokens of the last header row: the `data-stat` attribute when the cell
    /// carries one, else its lower-cased text. Grouping over-header rows sit
    /// above the last row and are ignored.
    pub fn header_tokens(&self) -> Vec<String> {
        let Some(row) = self.element.select(&HEADER_ROWS).last() else {
            return Vec::new();
        };
        cells(row)
            .into_iter()
            .map(|cell| {
                cell.value()
                    .attr("data-stat")
                    .map(str::trim)
                    .filter(|stat| !stat.is_empty())
                    .map(normalize_header)
                    .unwrap_or_else(|| normalize_header(&cell_text(cell)))
            })
            .collect()
    }

    /// Body rows minus the header rows repeated inside long tables.
    pub fn data_rows(&self) -> Vec<ElementRef<'a>> {
        self.element
            .select(&BODY_ROWS)
            .filter(|row| !row.value().classes().any(|class| class == "thead"))
            .collect()
    }
}

pub fn locate_stat_tables(doc: &Html) -> Vec<StatTable<'_>> {
    doc.select(&STATS_TABLE)
        .filter(|table| {
            table
                .select(&BODY)
                .next()
                .is_some_and(|body| body.select(&ROW).next().is_some())
        })
        .map(|element| StatTable { element })
        .collect()
}

/// Direct `th`/`td` children of a row, in column order.
pub fn cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| matches!(el.value().name(), "th" | "td"))
        .collect()
}

pub fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Name,
    Nationality,
    Position,
    Age,
    Stat(StatField),
}

impl Field {
    pub fn marker(self) -> &'static str {
        match self {
            Field::Name => "player",
            Field::Nationality => "nationality",
            Field::Position => "position",
            Field::Age => "age",
            Field::Stat(stat) => stat.marker(),
        }
    }
}

const ALIASES: &[(Field, &[&str])] = &[
    (Field::Name, &["player"]),
    (Field::Nationality, &["nation", "nationality"]),
    (Field::Position, &["pos", "position"]),
    (Field::Age, &["age"]),
    (Field::Stat(StatField::Minutes), &["min", "minutes"]),
    (Field::Stat(StatField::Goals), &["gls", "goals"]),
    (Field::Stat(StatField::Assists), &["ast", "assists"]),
    (
        Field::Stat(StatField::GkCleanSheets),
        &["cs", "clean_sheets", "gk_clean_sheets"],
    ),
    (Field::Stat(StatField::GkSaves), &["saves", "sv", "gk_saves"]),
    (Field::Stat(StatField::Tackles), &["tkl", "tackles"]),
    (Field::Stat(StatField::Interceptions), &["int", "interceptions"]),
    (Field::Stat(StatField::Passes), &["att", "passes"]),
    (
        Field::Stat(StatField::PassesCompleted),
        &["cmp", "passes_completed", "pass_completed"],
    ),
    (
        Field::Stat(StatField::PassCompletion),
        &["pct", "pass_pct", "pass_completion"],
    ),
    (
        Field::Stat(StatField::CardsYellow),
        &["crdy", "yellow_cards", "cards_yellow"],
    ),
    (
        Field::Stat(StatField::CardsRed),
        &["crdr", "red_cards", "cards_red"],
    ),
    (Field::Stat(StatField::Shots), &["sh", "shots"]),
];

/// Canonical field -> column position for one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    columns: BTreeMap<Field, usize>,
}

impl ColumnMap {
    pub fn get(&self, field: Field) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

pub fn map_columns<S: AsRef<str>>(headers: &[S]) -> ColumnMap {
    let headers = headers
        .iter()
        .map(|h| normalize_header(h.as_ref()))
        .collect::<Vec<_>>();
    let mut columns = BTreeMap::new();

    for (field, aliases) in ALIASES {
        if let Some(idx) = headers.iter().position(|h| aliases.contains(&h.as_str())) {
            columns.insert(*field, idx);
        }
    }

    if !columns.contains_key(&Field::Name) {
        let idx = headers
            .iter()
            .position(|h| h.contains("player") || h == "name")
            .unwrap_or(0);
        columns.insert(Field::Name, idx);
    }

    ColumnMap { columns }
}
