use std::collections::HashMap;

use scraper::Html;
use tracing::{debug, info};

use crate::extract::{extract_row, row_name};
use crate::player::PlayerRecord;
use crate::tables::{locate_stat_tables, map_columns};

pub fn merge_page(html: &str) -> Vec<PlayerRecord> {
    if html.trim().is_empty() {
        return Vec::new();
    }
    merge_document(&Html::parse_document(html))
}

/// Folds every statistic table of a page into one record per player name.
/// Records come back in first-sighting order.
pub fn merge_document(doc: &Html) -> Vec<PlayerRecord> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut records: Vec<PlayerRecord> = Vec::new();

    for table in locate_stat_tables(doc) {
        let columns = map_columns(&table.header_tokens());
        let rows = table.data_rows();
        debug!(table = table.id(), rows = rows.len(), "merging table");

        for row in rows {
            let Some(name) = row_name(row, &columns) else {
                continue;
            };
            match index.get(&name) {
                Some(&slot) => {
                    if let Some(merged) = extract_row(row, &columns, Some(&records[slot])) {
                        records[slot] = merged;
                    }
                }
                None => {
                    if let Some(record) = extract_row(row, &columns, None) {
                        index.insert(record.name.clone(), records.len());
                        records.push(record);
                    }
                }
            }
        }
    }

    info!(players = records.len(), "merged statistic tables");
    records
}
