use serde::Serialize;

pub const UNKNOWN: &str = "Unknown";

/// Numeric statistics a roster row can carry. The marker is the `data-stat`
/// attribute the statistic cells are tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatField {
    Minutes,
    Goals,
    Assists,
    GkCleanSheets,
    GkSaves,
    GkSavePct,
    GkPensSaved,
    GkDefActionsOutsidePenArea,
    Tackles,
    TacklesWon,
    Interceptions,
    Passes,
    PassesCompleted,
    PassCompletion,
    ThroughBalls,
    CarriesDistance,
    Shots,
    GoalsPerShot,
    AerialsWonPct,
    CardsYellow,
    CardsRed,
}

impl StatField {
    pub const ALL: [StatField; 21] = [
        StatField::Minutes,
        StatField::Goals,
        StatField::Assists,
        StatField::GkCleanSheets,
        StatField::GkSaves,
        StatField::GkSavePct,
        StatField::GkPensSaved,
        StatField::GkDefActionsOutsidePenArea,
        StatField::Tackles,
        StatField::TacklesWon,
        StatField::Interceptions,
        StatField::Passes,
        StatField::PassesCompleted,
        StatField::PassCompletion,
        StatField::ThroughBalls,
        StatField::CarriesDistance,
        StatField::Shots,
        StatField::GoalsPerShot,
        StatField::AerialsWonPct,
        StatField::CardsYellow,
        StatField::CardsRed,
    ];

    pub fn marker(self) -> &'static str {
        match self {
            StatField::Minutes => "minutes",
            StatField::Goals => "goals",
            StatField::Assists => "assists",
            StatField::GkCleanSheets => "gk_clean_sheets",
            StatField::GkSaves => "gk_saves",
            StatField::GkSavePct => "gk_save_pct",
            StatField::GkPensSaved => "gk_pens_saved",
            StatField::GkDefActionsOutsidePenArea => "gk_def_actions_outside_pen_area",
            StatField::Tackles => "tackles",
            StatField::TacklesWon => "tackles_won",
            StatField::Interceptions => "interceptions",
            StatField::Passes => "passes",
            StatField::PassesCompleted => "passes_completed",
            StatField::PassCompletion => "pass_completion",
            StatField::ThroughBalls => "through_balls",
            StatField::CarriesDistance => "carries_distance",
            StatField::Shots => "shots",
            StatField::GoalsPerShot => "goals_per_shot",
            StatField::AerialsWonPct => "aerials_won_pct",
            StatField::CardsYellow => "cards_yellow",
            StatField::CardsRed => "cards_red",
        }
    }

    /// Percentages and ratios; everything else is a count.
    pub fn is_float(self) -> bool {
        matches!(
            self,
            StatField::GkSavePct
                | StatField::PassCompletion
                | StatField::GoalsPerShot
                | StatField::AerialsWonPct
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatValue {
    Int(u32),
    Float(f64),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatLine {
    pub minutes: Option<u32>,
    pub goals: Option<u32>,
    pub assists: Option<u32>,
    pub gk_clean_sheets: Option<u32>,
    pub gk_saves: Option<u32>,
    pub gk_save_pct: Option<f64>,
    pub gk_pens_saved: Option<u32>,
    pub gk_def_actions_outside_pen_area: Option<u32>,
    pub tackles: Option<u32>,
    pub tackles_won: Option<u32>,
    pub interceptions: Option<u32>,
    pub passes: Option<u32>,
    pub passes_completed: Option<u32>,
    pub pass_completion: Option<f64>,
    pub through_balls: Option<u32>,
    pub carries_distance: Option<u32>,
    pub shots: Option<u32>,
    pub goals_per_shot: Option<f64>,
    pub aerials_won_pct: Option<f64>,
    pub cards_yellow: Option<u32>,
    pub cards_red: Option<u32>,
}

impl StatLine {
    pub fn get(&self, field: StatField) -> Option<StatValue> {
        if field.is_float() {
            let slot = match field {
                StatField::GkSavePct => self.gk_save_pct,
                StatField::PassCompletion => self.pass_completion,
                StatField::GoalsPerShot => self.goals_per_shot,
                StatField::AerialsWonPct => self.aerials_won_pct,
                _ => None,
            };
            return slot.map(StatValue::Float);
        }
        let slot = match field {
            StatField::Minutes => self.minutes,
            StatField::Goals => self.goals,
            StatField::Assists => self.assists,
            StatField::GkCleanSheets => self.gk_clean_sheets,
            StatField::GkSaves => self.gk_saves,
            StatField::GkPensSaved => self.gk_pens_saved,
            StatField::GkDefActionsOutsidePenArea => self.gk_def_actions_outside_pen_area,
            StatField::Tackles => self.tackles,
            StatField::TacklesWon => self.tackles_won,
            StatField::Interceptions => self.interceptions,
            StatField::Passes => self.passes,
            StatField::PassesCompleted => self.passes_completed,
            StatField::ThroughBalls => self.through_balls,
            StatField::CarriesDistance => self.carries_distance,
            StatField::Shots => self.shots,
            StatField::CardsYellow => self.cards_yellow,
            StatField::CardsRed => self.cards_red,
            _ => None,
        };
        slot.map(StatValue::Int)
    }

    /// First-writer-wins: returns `false` and leaves the line untouched when
    /// the field already holds a value or the value kind does not fit it.
    pub fn set_if_absent(&mut self, field: StatField, value: StatValue) -> bool {
        match value {
            StatValue::Int(v) => match self.int_slot(field) {
                Some(slot) if slot.is_none() => {
                    *slot = Some(v);
                    true
                }
                _ => false,
            },
            StatValue::Float(v) => match self.float_slot(field) {
                Some(slot) if slot.is_none() => {
                    *slot = Some(v);
                    true
                }
                _ => false,
            },
        }
    }

    pub fn fill_from(&mut self, other: &StatLine) {
        for field in StatField::ALL {
            if let Some(value) = other.get(field) {
                self.set_if_absent(field, value);
            }
        }
    }

    #[cfg(test)]
    pub fn populated(&self) -> usize {
        StatField::ALL
            .iter()
            .filter(|field| self.get(**field).is_some())
            .count()
    }

    fn int_slot(&mut self, field: StatField) -> Option<&mut Option<u32>> {
        let slot = match field {
            StatField::Minutes => &mut self.minutes,
            StatField::Goals => &mut self.goals,
            StatField::Assists => &mut self.assists,
            StatField::GkCleanSheets => &mut self.gk_clean_sheets,
            StatField::GkSaves => &mut self.gk_saves,
            StatField::GkPensSaved => &mut self.gk_pens_saved,
            StatField::GkDefActionsOutsidePenArea => &mut self.gk_def_actions_outside_pen_area,
            StatField::Tackles => &mut self.tackles,
            StatField::TacklesWon => &mut self.tackles_won,
            StatField::Interceptions => &mut self.interceptions,
            StatField::Passes => &mut self.passes,
            StatField::PassesCompleted => &mut self.passes_completed,
            StatField::ThroughBalls => &mut self.through_balls,
            StatField::CarriesDistance => &mut self.carries_distance,
            StatField::Shots => &mut self.shots,
            StatField::CardsYellow => &mut self.cards_yellow,
            StatField::CardsRed => &mut self.cards_red,
            _ => return None,
        };
        Some(slot)
    }

    fn float_slot(&mut self, field: StatField) -> Option<&mut Option<f64>> {
        let slot = match field {
            StatField::GkSavePct => &mut self.gk_save_pct,
            StatField::PassCompletion => &mut self.pass_completion,
            StatField::GoalsPerShot => &mut self.goals_per_shot,
            StatField::AerialsWonPct => &mut self.aerials_won_pct,
            _ => return None,
        };
        Some(slot)
    }
}

/// One player as seen on a single team page, folded across every statistic
/// table of that page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerRecord {
    pub name: String,
    pub nationality: String,
    pub position: String,
    pub age: Option<u32>,
    pub stats: StatLine,
    /// Synthesized headshot URL. Best-effort: built from a fixed snapshot
    /// template and often stale for seasons other than the one it encodes.
    pub image: Option<String>,
}

impl Default for PlayerRecord {
    fn default() -> Self {
        Self {
            name: String::new(),
            nationality: UNKNOWN.to_string(),
            position: UNKNOWN.to_string(),
            age: None,
            stats: StatLine::default(),
            image: None,
        }
    }
}

impl PlayerRecord {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn has_nationality(&self) -> bool {
        !self.nationality.is_empty() && self.nationality != UNKNOWN
    }

    pub fn has_position(&self) -> bool {
        !self.position.trim().is_empty() && self.position != UNKNOWN
    }

    /// Fills every field still unset on `self` from `other`. Values already
    /// present on `self` always win.
    pub fn merge_from(&mut self, other: &PlayerRecord) {
        if self.name.is_empty() {
            self.name = other.name.clone();
        }
        if !self.has_nationality() && other.has_nationality() {
            self.nationality = other.nationality.clone();
        }
        if !self.has_position() && other.has_position() {
            self.position = other.position.clone();
        }
        if self.age.is_none() {
            self.age = other.age;
        }
        if self.image.is_none() {
            self.image = other.image.clone();
        }
        self.stats.fill_from(&other.stats);
    }

    pub fn merged(mut self, other: &PlayerRecord) -> Self {
        self.merge_from(other);
        self
    }
}
