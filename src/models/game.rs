//! Match records, seats and bracket links.

use crate::models::player::PlayerId;
use crate::models::tournament::TournamentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// One of the two seats of a match.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seat {
    #[default]
    One,
    Two,
}

impl Seat {
    pub fn other(self) -> Self {
        match self {
            Seat::One => Seat::Two,
            Seat::Two => Seat::One,
        }
    }
}

/// Lifecycle of a single match.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// At least one seat is still waiting on an earlier bracket match.
    Awaiting,
    /// Both seats known, no result yet.
    #[default]
    Pending,
    Completed,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchResult {
    Win1,
    Win2,
    Draw,
}

impl MatchResult {
    /// Decide a match from its game score.
    pub fn from_games(wins_1: u32, wins_2: u32) -> Self {
        match wins_1.cmp(&wins_2) {
            std::cmp::Ordering::Greater => MatchResult::Win1,
            std::cmp::Ordering::Less => MatchResult::Win2,
            std::cmp::Ordering::Equal => MatchResult::Draw,
        }
    }

    pub fn winning_seat(self) -> Option<Seat> {
        match self {
            MatchResult::Win1 => Some(Seat::One),
            MatchResult::Win2 => Some(Seat::Two),
            MatchResult::Draw => None,
        }
    }

    pub fn for_winner(seat: Seat) -> Self {
        match seat {
            Seat::One => MatchResult::Win1,
            Seat::Two => MatchResult::Win2,
        }
    }
}

/// Which half of an elimination structure a match belongs to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketSide {
    Winners,
    Losers,
    Single,
}

/// Matches that sit outside the regular bracket tree.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialSlot {
    ThirdPlace,
    GrandFinal,
    GrandFinalReset,
}

/// Points at one seat of a later bracket match.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BracketLink {
    pub match_id: MatchId,
    pub seat: Seat,
}

impl BracketLink {
    pub fn new(match_id: MatchId, seat: Seat) -> Self {
        Self { match_id, seat }
    }
}

/// Bracket placement of an elimination match.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BracketInfo {
    pub side: BracketSide,
    /// Round counted within its own side (winners round 1, losers round 1, ...).
    pub side_round: u32,
    /// Index within the side round, top of the bracket first.
    pub position: u32,
    #[serde(default)]
    pub special: Option<SpecialSlot>,
    /// Where the winner goes.
    #[serde(default)]
    pub next_match: Option<BracketLink>,
    /// Where the loser goes (double elimination drop-in, or the third-place match).
    #[serde(default)]
    pub losers_next_match: Option<BracketLink>,
    /// Seats that will never receive a player.
    #[serde(default)]
    pub vacant_1: bool,
    #[serde(default)]
    pub vacant_2: bool,
    /// Seat that starts the grand final one game up.
    #[serde(default)]
    pub advantage: Option<Seat>,
    /// Grand final that is replayed when the losers-bracket finalist wins it.
    #[serde(default)]
    pub resettable: bool,
}

impl BracketInfo {
    pub fn new(side: BracketSide, side_round: u32, position: u32) -> Self {
        Self {
            side,
            side_round,
            position,
            special: None,
            next_match: None,
            losers_next_match: None,
            vacant_1: false,
            vacant_2: false,
            advantage: None,
            resettable: false,
        }
    }

    pub fn is_vacant(&self, seat: Seat) -> bool {
        match seat {
            Seat::One => self.vacant_1,
            Seat::Two => self.vacant_2,
        }
    }

    pub fn set_vacant(&mut self, seat: Seat) {
        match seat {
            Seat::One => self.vacant_1 = true,
            Seat::Two => self.vacant_2 = true,
        }
    }
}

/// A single match. Swiss matches carry no bracket info; a Swiss match with no
/// second player is a bye.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GameMatch {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub round: u32,
    pub table: u32,
    pub player_1: Option<PlayerId>,
    pub player_2: Option<PlayerId>,
    pub wins_1: u32,
    pub wins_2: u32,
    pub draws: u32,
    pub status: MatchStatus,
    /// None until completed, and for bracket matches that resolved with nobody in them.
    pub result: Option<MatchResult>,
    #[serde(default)]
    pub bye: bool,
    #[serde(default)]
    pub bracket: Option<BracketInfo>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl GameMatch {
    fn blank(tournament_id: TournamentId, round: u32, table: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            round,
            table,
            player_1: None,
            player_2: None,
            wins_1: 0,
            wins_2: 0,
            draws: 0,
            status: MatchStatus::Pending,
            result: None,
            bye: false,
            bracket: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// A pending match between two players.
    pub fn pairing(
        tournament_id: TournamentId,
        round: u32,
        table: u32,
        player_1: PlayerId,
        player_2: PlayerId,
    ) -> Self {
        Self {
            player_1: Some(player_1),
            player_2: Some(player_2),
            ..Self::blank(tournament_id, round, table)
        }
    }

    /// A bye: an immediate win for `player` with zero games played.
    pub fn bye(tournament_id: TournamentId, round: u32, table: u32, player: PlayerId) -> Self {
        let mut m = Self::blank(tournament_id, round, table);
        m.player_1 = Some(player);
        m.bye = true;
        m.complete(0, 0, 0, MatchResult::Win1);
        m
    }

    /// An empty bracket slot waiting for both of its players.
    pub fn bracket_slot(
        tournament_id: TournamentId,
        round: u32,
        table: u32,
        info: BracketInfo,
    ) -> Self {
        Self {
            status: MatchStatus::Awaiting,
            bracket: Some(info),
            ..Self::blank(tournament_id, round, table)
        }
    }

    pub fn player(&self, seat: Seat) -> Option<PlayerId> {
        match seat {
            Seat::One => self.player_1,
            Seat::Two => self.player_2,
        }
    }

    pub fn set_player(&mut self, seat: Seat, player: PlayerId) {
        match seat {
            Seat::One => self.player_1 = Some(player),
            Seat::Two => self.player_2 = Some(player),
        }
    }

    pub fn clear_player(&mut self, seat: Seat) {
        match seat {
            Seat::One => self.player_1 = None,
            Seat::Two => self.player_2 = None,
        }
    }

    pub fn seat_of(&self, player: PlayerId) -> Option<Seat> {
        if self.player_1 == Some(player) {
            Some(Seat::One)
        } else if self.player_2 == Some(player) {
            Some(Seat::Two)
        } else {
            None
        }
    }

    pub fn has_player(&self, player: PlayerId) -> bool {
        self.seat_of(player).is_some()
    }

    /// Both players, when both seats are filled.
    pub fn players(&self) -> Option<(PlayerId, PlayerId)> {
        Some((self.player_1?, self.player_2?))
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    pub fn is_bracket(&self) -> bool {
        self.bracket.is_some()
    }

    pub fn special(&self) -> Option<SpecialSlot> {
        self.bracket.as_ref().and_then(|b| b.special)
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.player(self.result?.winning_seat()?)
    }

    pub fn loser(&self) -> Option<PlayerId> {
        self.player(self.result?.winning_seat()?.other())
    }

    /// Whether a submission reports exactly the recorded games.
    pub fn has_score(&self, wins_1: u32, wins_2: u32, draws: u32) -> bool {
        self.wins_1 == wins_1 && self.wins_2 == wins_2 && self.draws == draws
    }

    /// Record the final score and mark the match completed.
    pub fn complete(&mut self, wins_1: u32, wins_2: u32, draws: u32, result: MatchResult) {
        self.wins_1 = wins_1;
        self.wins_2 = wins_2;
        self.draws = draws;
        self.result = Some(result);
        self.status = MatchStatus::Completed;
        self.completed_at = Some(Utc::now());
    }
}
