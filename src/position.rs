use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PositionCategory {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
    Unknown,
}

const GOALKEEPER_CODES: &[&str] = &["GK"];
const DEFENDER_CODES: &[&str] = &["CB", "RB", "LB", "DF", "WB"];
const MIDFIELDER_CODES: &[&str] = &["CM", "CDM", "CAM", "RM", "LM", "MF", "DM", "AM"];
const FORWARD_CODES: &[&str] = &["ST", "CF", "LW", "RW", "FW"];

/// Tie-break order when a position string hits several families.
const PRIORITY: [PositionCategory; 4] = [
    PositionCategory::Goalkeeper,
    PositionCategory::Forward,
    PositionCategory::Midfielder,
    PositionCategory::Defender,
];

impl PositionCategory {
    pub const ROUTED: [PositionCategory; 4] = [
        PositionCategory::Goalkeeper,
        PositionCategory::Defender,
        PositionCategory::Midfielder,
        PositionCategory::Forward,
    ];

    fn codes(self) -> &'static [&'static str] {
        match self {
            PositionCategory::Goalkeeper => GOALKEEPER_CODES,
            PositionCategory::Defender => DEFENDER_CODES,
            PositionCategory::Midfielder => MIDFIELDER_CODES,
            PositionCategory::Forward => FORWARD_CODES,
            PositionCategory::Unknown => &[],
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            PositionCategory::Goalkeeper => "goalkeeper",
            PositionCategory::Defender => "defender",
            PositionCategory::Midfielder => "midfielder",
            PositionCategory::Forward => "forward",
            PositionCategory::Unknown => "unknown",
        }
    }

    pub fn from_key(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "goalkeeper" | "gk" => Some(PositionCategory::Goalkeeper),
            "defender" | "df" => Some(PositionCategory::Defender),
            "midfielder" | "mf" => Some(PositionCategory::Midfielder),
            "forward" | "fw" => Some(PositionCategory::Forward),
            "unknown" => Some(PositionCategory::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for PositionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Maps a free-text position such as `"DF,MF"` or `"LW/ST"` to a single
/// category. Tokens match by substring, so `"LWB"` hits both forwards (`LW`)
/// and defenders (`WB`) and resolves to forward.
pub fn classify_position(raw: &str) -> PositionCategory {
    let mut found: Vec<PositionCategory> = Vec::new();
    for token in raw.split([',', '/', '-']) {
        let token = token.trim().to_ascii_uppercase();
        if token.is_empty() {
            continue;
        }
        for category in PositionCategory::ROUTED {
            if found.contains(&category) {
                continue;
            }
            if category.codes().iter().any(|code| token.contains(code)) {
                found.push(category);
            }
        }
    }

    match found.as_slice() {
        [] => PositionCategory::Unknown,
        [only] => *only,
        _ => PRIORITY
            .into_iter()
            .find(|category| found.contains(category))
            .unwrap_or(PositionCategory::Unknown),
    }
}
