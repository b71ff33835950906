use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};
use tracing::{debug, warn};

use crate::player::{PlayerRecord, StatField, StatValue, UNKNOWN};
use crate::tables::{ColumnMap, Field, cell_text, cells, css};

static LINK: Lazy<Selector> = Lazy::new(|| css("a"));
static FLAG: Lazy<Selector> = Lazy::new(|| css("img"));

const PLAYER_PATH_MARKER: &str = "/players/";
const HEADSHOT_SNAPSHOT: &str = "202302030";
const HEADSHOT_SEASON: &str = "2022";
const PLACEHOLDER_NAMES: &[&str] = &["player", "name", "squad total", "total", "bench"];

/// Extracts one player from a data row. With `existing` the row's values are
/// folded into a copy of that record, which keeps everything it already has.
/// Returns `None` when the row does not name a real player.
pub fn extract_row(
    row: ElementRef<'_>,
    columns: &ColumnMap,
    existing: Option<&PlayerRecord>,
) -> Option<PlayerRecord> {
    let cells = cells(row);
    if cells.is_empty() {
        warn!("row without cells skipped");
        return None;
    }

    let row = RowCells { cells, columns };
    let identity = row.identity();
    if !is_valid_name(&identity.name) {
        debug!(name = %identity.name, "skipping non-player row");
        return None;
    }

    let mut record = PlayerRecord::named(identity.name);
    record.image = identity.player_id.as_deref().map(headshot_url);

    if let Some(cell) = row.cell(Field::Nationality) {
        record.nationality = nationality_from_cell(cell);
    }

    if let Some(cell) = row.cell(Field::Position) {
        let text = cell_text(cell);
        if !text.is_empty() {
            record.position = text;
        }
    }

    if let Some(cell) = row.cell(Field::Age) {
        record.age = parse_age(&cell_text(cell));
    }

    for field in StatField::ALL {
        let Some(cell) = row.cell(Field::Stat(field)) else {
            continue;
        };
        let text = cell_text(cell);
        let value = if field.is_float() {
            parse_float_stat(&text).map(StatValue::Float)
        } else {
            parse_int_stat(&text).map(StatValue::Int)
        };
        if let Some(value) = value {
            record.stats.set_if_absent(field, value);
        }
    }

    Some(match existing {
        Some(existing) => existing.clone().merged(&record),
        None => record,
    })
}

/// The merge key a row would produce, without extracting anything else.
pub fn row_name(row: ElementRef<'_>, columns: &ColumnMap) -> Option<String> {
    let cells = cells(row);
    if cells.is_empty() {
        return None;
    }
    let name = RowCells { cells, columns }.identity().name;
    is_valid_name(&name).then_some(name)
}

struct RowCells<'a, 'm> {
    cells: Vec<ElementRef<'a>>,
    columns: &'m ColumnMap,
}

struct Identity {
    name: String,
    player_id: Option<String>,
}

impl<'a> RowCells<'a, '_> {
    fn marked(&self, marker: &str) -> Option<ElementRef<'a>> {
        self.cells
            .iter()
            .copied()
            .find(|cell| cell.value().attr("data-stat") == Some(marker))
    }

    /// Marker first, then the header-derived column position.
    fn cell(&self, field: Field) -> Option<ElementRef<'a>> {
        self.marked(field.marker()).or_else(|| {
            self.columns
                .get(field)
                .and_then(|idx| self.cells.get(idx).copied())
        })
    }

    fn identity(&self) -> Identity {
        let cell = self.marked(Field::Name.marker()).or_else(|| {
            let idx = self.columns.get(Field::Name).unwrap_or(0);
            self.cells.get(idx).or_else(|| self.cells.first()).copied()
        });
        let Some(cell) = cell else {
            return Identity {
                name: String::new(),
                player_id: None,
            };
        };

        match cell.select(&LINK).next() {
            Some(link) => Identity {
                name: cell_text(link),
                player_id: link.value().attr("href").and_then(player_id_from_href),
            },
            None => Identity {
                name: cell_text(cell),
                player_id: None,
            },
        }
    }
}

fn nationality_from_cell(cell: ElementRef<'_>) -> String {
    let flag_label = cell.select(&FLAG).next().and_then(|img| {
        let value = img.value();
        value
            .attr("alt")
            .filter(|alt| !alt.trim().is_empty())
            .or_else(|| value.attr("title").filter(|title| !title.trim().is_empty()))
    });
    match flag_label {
        Some(label) => normalize_nationality(label),
        None => normalize_nationality(&cell_text(cell)),
    }
}

fn player_id_from_href(href: &str) -> Option<String> {
    let (_, rest) = href.split_once(PLAYER_PATH_MARKER)?;
    let id = rest.split('/').next()?.trim();
    (!id.is_empty()).then(|| id.to_string())
}

pub fn headshot_url(player_id: &str) -> String {
    format!(
        "https://fbref.com/req/{HEADSHOT_SNAPSHOT}/images/headshots/{player_id}_{HEADSHOT_SEASON}.jpg"
    )
}

/// `"eng ENG"` -> `"ENG"`, `"fr"` -> `"FR"`, anything unusable -> `"Unknown"`.
pub fn normalize_nationality(raw: &str) -> String {
    let trimmed = raw.trim();
    let upper: String = trimmed.chars().filter(|c| c.is_uppercase()).collect();
    if upper.chars().count() >= 2 {
        return upper;
    }
    if trimmed.chars().count() >= 2 && trimmed.chars().all(char::is_alphabetic) {
        return trimmed.to_uppercase();
    }
    UNKNOWN.to_string()
}

/// Ages are rendered as `years-days`; only the years survive.
pub fn parse_age(raw: &str) -> Option<u32> {
    let years = raw.trim().split('-').next()?;
    if years.is_empty() || !years.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    years.parse::<u32>().ok()
}

fn clean_number(raw: &str) -> Option<String> {
    let cleaned = raw.replace(',', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }
    Some(cleaned.to_string())
}

pub fn parse_int_stat(raw: &str) -> Option<u32> {
    let cleaned = clean_number(raw)?;
    if let Ok(n) = cleaned.parse::<u32>() {
        return Some(n);
    }
    let value = cleaned.parse::<f64>().ok()?;
    if value.is_finite() && value >= 0.0 && value <= f64::from(u32::MAX) {
        Some(value.trunc() as u32)
    } else {
        None
    }
}

pub fn parse_float_stat(raw: &str) -> Option<f64> {
    let cleaned = clean_number(raw)?;
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn is_valid_name(name: &str) -> bool {
    let name = name.trim();
    if name.is_empty() {
        return false;
    }
    if name.chars().all(|c| c.is_ascii_digit() || c == '-') {
        return false;
    }
    let lowered = name.to_lowercase();
    !PLACEHOLDER_NAMES.contains(&lowered.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_coercion() {
        assert_eq!(parse_int_stat("1,234"), Some(1234));
        assert_eq!(parse_int_stat("-"), None);
        assert_eq!(parse_int_stat(""), None);
        assert_eq!(parse_int_stat("abc"), None);
        assert_eq!(parse_int_stat("7.0"), Some(7));
        assert_eq!(parse_float_stat("12.5"), Some(12.5));
        assert_eq!(parse_float_stat(" 1,012.5 "), Some(1012.5));
        assert_eq!(parse_float_stat("n/a"), None);
    }

    #[test]
    fn nationality_normalization() {
        assert_eq!(normalize_nationality("Germany"), "GERMANY");
        assert_eq!(normalize_nationality("fr"), "FR");
        assert_eq!(normalize_nationality(""), "Unknown");
        assert_eq!(normalize_nationality("eng ENG"), "ENG");
        assert_eq!(normalize_nationality("x"), "Unknown");
        assert_eq!(normalize_nationality("c1"), "Unknown");
    }

    #[test]
    fn flag_title_used_when_alt_is_blank() {
        let doc = scraper::Html::parse_fragment(
            r#"<table><tr>
                 <td id="blank"><img alt=" " title="br BRA" /></td>
                 <td id="missing"><img title="pt" /></td>
                 <td id="both"><img alt="fr" title="de GER" /></td>
               </tr></table>"#,
        );
        let cell = |id: &str| {
            doc.select(&css(&format!("td#{id}")))
                .next()
                .expect("cell present")
        };
        assert_eq!(nationality_from_cell(cell("blank")), "BRA");
        assert_eq!(nationality_from_cell(cell("missing")), "PT");
        assert_eq!(nationality_from_cell(cell("both")), "FR");
    }

    #[test]
    fn age_prefix_only() {
        assert_eq!(parse_age("23-100"), Some(23));
        assert_eq!(parse_age("31"), Some(31));
        assert_eq!(parse_age("-"), None);
        assert_eq!(parse_age("2x-10"), None);
        assert_eq!(parse_age(""), None);
    }

    #[test]
    fn placeholder_names_rejected() {
        for name in ["Total", "BENCH", "player", "Squad Total", "12", "3-4", "  "] {
            assert!(!is_valid_name(name), "{name} should be rejected");
        }
        assert!(is_valid_name("Bukayo Saka"));
        assert!(is_valid_name("Jean-Philippe Mateta"));
    }

    #[test]
    fn player_id_from_link() {
        assert_eq!(
            player_id_from_href("/en/players/bc7dc64d/Bukayo-Saka").as_deref(),
            Some("bc7dc64d")
        );
        assert_eq!(player_id_from_href("/en/squads/18bb7c10/Arsenal"), None);
        assert_eq!(
            headshot_url("bc7dc64d"),
            "https://fbref.com/req/202302030/images/headshots/bc7dc64d_2022.jpg"
        );
    }
}
