//! Standing: derived per-player statistics.

use crate::models::config::Tiebreaker;
use crate::models::player::PlayerId;
use serde::{Deserialize, Serialize};

/// Resolution percentages are compared at, so equal rates compare equal.
const PERCENTAGE_SCALE: f64 = 1e9;

/// One row of the standings table. Always recomputed from match history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub player_id: PlayerId,
    pub rank: u32,
    pub matches_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub byes: u32,
    pub match_points: u32,
    pub game_points: u32,
    pub games_played: u32,
    pub match_win_percentage: f64,
    pub game_win_percentage: f64,
    pub opponents_match_win_percentage: f64,
    pub opponents_game_win_percentage: f64,
    pub active: bool,
}

impl Standing {
    pub fn new(player_id: PlayerId, active: bool) -> Self {
        Self {
            player_id,
            rank: 0,
            matches_played: 0,
            wins: 0,
            losses: 0,
            draws: 0,
            byes: 0,
            match_points: 0,
            game_points: 0,
            games_played: 0,
            match_win_percentage: 0.0,
            game_win_percentage: 0.0,
            opponents_match_win_percentage: 0.0,
            opponents_game_win_percentage: 0.0,
            active,
        }
    }

    /// Comparable value of one tiebreaker; larger ranks higher.
    pub fn tiebreak_value(&self, tiebreaker: Tiebreaker) -> i64 {
        match tiebreaker {
            Tiebreaker::MatchPoints => i64::from(self.match_points),
            Tiebreaker::OpponentsMatchWinPercentage => {
                quantize(self.opponents_match_win_percentage)
            }
            Tiebreaker::GameWinPercentage => quantize(self.game_win_percentage),
            Tiebreaker::OpponentsGameWinPercentage => quantize(self.opponents_game_win_percentage),
        }
    }

    /// Lexicographic key for the given tiebreak order.
    pub fn tiebreak_key(&self, order: &[Tiebreaker]) -> Vec<i64> {
        order.iter().map(|t| self.tiebreak_value(*t)).collect()
    }
}

fn quantize(percentage: f64) -> i64 {
    (percentage * PERCENTAGE_SCALE).round() as i64
}
