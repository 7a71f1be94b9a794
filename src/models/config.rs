//! Structure and tiebreaker configuration.
//!
//! Every field has a serde default so a partial JSON document (or `{}`) is a
//! valid configuration.

use crate::models::error::TournamentError;
use serde::{Deserialize, Serialize};

/// Rule for the double-elimination grand final.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrandFinalsModifier {
    /// One decisive match.
    #[default]
    None,
    /// The winners-bracket champion starts one game up.
    Advantage,
    /// A second grand final is played if the losers-bracket finalist wins the first.
    Reset,
}

/// Options that shape pairing, results and bracket layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructureConfig {
    #[serde(default = "default_true")]
    pub allow_intentional_draws: bool,
    /// Hand the bye to the weakest seed rather than the lowest-ranked player.
    #[serde(default)]
    pub use_seeds_for_byes: bool,
    /// Standard seed placement (1 vs N, ...) instead of the given order.
    #[serde(default = "default_true")]
    pub seeded_bracket: bool,
    #[serde(default)]
    pub third_place_match: bool,
    #[serde(default)]
    pub grand_finals_modifier: GrandFinalsModifier,
    /// Best-of-N games per match.
    #[serde(default = "default_games_per_match")]
    pub games_per_match: u32,
}

fn default_true() -> bool {
    true
}

fn default_games_per_match() -> u32 {
    3
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            allow_intentional_draws: true,
            use_seeds_for_byes: false,
            seeded_bracket: true,
            third_place_match: false,
            grand_finals_modifier: GrandFinalsModifier::None,
            games_per_match: default_games_per_match(),
        }
    }
}

impl StructureConfig {
    /// Game wins that clinch a match.
    pub fn wins_to_clinch(&self) -> u32 {
        self.games_per_match / 2 + 1
    }
}

/// A single tiebreaker, applied in descending order.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tiebreaker {
    MatchPoints,
    OpponentsMatchWinPercentage,
    GameWinPercentage,
    OpponentsGameWinPercentage,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TiebreakerConfig {
    #[serde(default = "default_order")]
    pub order: Vec<Tiebreaker>,
    /// Minimum percentage used when averaging an opponent's win rate.
    #[serde(default = "default_percentage_floor")]
    pub percentage_floor: f64,
}

fn default_order() -> Vec<Tiebreaker> {
    vec![
        Tiebreaker::MatchPoints,
        Tiebreaker::OpponentsMatchWinPercentage,
        Tiebreaker::GameWinPercentage,
        Tiebreaker::OpponentsGameWinPercentage,
    ]
}

fn default_percentage_floor() -> f64 {
    1.0 / 3.0
}

impl Default for TiebreakerConfig {
    fn default() -> Self {
        Self {
            order: default_order(),
            percentage_floor: default_percentage_floor(),
        }
    }
}

/// Full per-tournament configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TournamentConfig {
    #[serde(default)]
    pub structure: StructureConfig,
    #[serde(default)]
    pub tiebreakers: TiebreakerConfig,
}

impl TournamentConfig {
    pub fn from_json(json: &str) -> Result<Self, TournamentError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| TournamentError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TournamentError> {
        if self.structure.games_per_match == 0 {
            return Err(TournamentError::InvalidConfig(
                "games_per_match must be at least 1".into(),
            ));
        }
        let floor = self.tiebreakers.percentage_floor;
        if !(0.0..=1.0).contains(&floor) {
            return Err(TournamentError::InvalidConfig(format!(
                "percentage_floor {floor} is outside 0..=1"
            )));
        }
        let order = &self.tiebreakers.order;
        for (i, t) in order.iter().enumerate() {
            if order[..i].contains(t) {
                return Err(TournamentError::InvalidConfig(format!(
                    "tiebreaker {t:?} listed twice"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        let config = TournamentConfig::from_json("{}").unwrap();
        assert_eq!(config, TournamentConfig::default());
        assert!(config.structure.allow_intentional_draws);
        assert_eq!(config.structure.wins_to_clinch(), 2);
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config = TournamentConfig::from_json(
            r#"{"structure": {"grand_finals_modifier": "reset", "third_place_match": true}}"#,
        )
        .unwrap();
        assert_eq!(
            config.structure.grand_finals_modifier,
            GrandFinalsModifier::Reset
        );
        assert!(config.structure.third_place_match);
        assert!(config.structure.seeded_bracket);
        assert_eq!(config.tiebreakers.order.len(), 4);
    }

    #[test]
    fn rejects_duplicate_tiebreakers() {
        let err = TournamentConfig::from_json(
            r#"{"tiebreakers": {"order": ["match_points", "match_points"]}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, TournamentError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_floor_out_of_range() {
        let err =
            TournamentConfig::from_json(r#"{"tiebreakers": {"percentage_floor": 1.5}}"#).unwrap_err();
        assert!(matches!(err, TournamentError::InvalidConfig(_)));
    }
}
