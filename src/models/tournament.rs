//! Tournament, its structure and phase.

use crate::models::config::TournamentConfig;
use crate::models::error::{TournamentError, TournamentResult};
use crate::models::game::{GameMatch, MatchId, MatchStatus};
use crate::models::player::{Player, PlayerId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStructure {
    #[default]
    Swiss,
    SingleElimination,
    DoubleElimination,
}

impl TournamentStructure {
    pub fn is_elimination(self) -> bool {
        !matches!(self, TournamentStructure::Swiss)
    }
}

/// Current phase of the tournament.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentPhase {
    /// Registering players and configuring; nothing paired yet.
    #[default]
    Planned,
    Active,
    /// Terminal. Results are frozen.
    Completed,
}

/// Full tournament state: roster, match arena and phase.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub structure: TournamentStructure,
    #[serde(default)]
    pub config: TournamentConfig,
    /// Swiss round count; fixed when the tournament starts if not set before.
    #[serde(default)]
    pub rounds: Option<u32>,
    #[serde(default)]
    pub current_round: u32,
    #[serde(default)]
    pub phase: TournamentPhase,
    pub players: Vec<Player>,
    /// Every match ever created, Swiss rounds and bracket slots alike.
    #[serde(default)]
    pub matches: Vec<GameMatch>,
}

impl Tournament {
    /// Create a new tournament in Planned phase with no players.
    pub fn new(name: impl Into<String>, structure: TournamentStructure) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            structure,
            config: TournamentConfig::default(),
            rounds: None,
            current_round: 0,
            phase: TournamentPhase::Planned,
            players: Vec::new(),
            matches: Vec::new(),
        }
    }

    /// Create a tournament with initial players. Still Planned until started.
    pub fn with_players(
        name: impl Into<String>,
        structure: TournamentStructure,
        players: Vec<Player>,
    ) -> Self {
        Self {
            players,
            ..Self::new(name, structure)
        }
    }

    pub fn get_player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn get_player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn get_match(&self, id: MatchId) -> Option<&GameMatch> {
        self.matches.iter().find(|m| m.id == id)
    }

    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.active)
    }

    pub fn dropped_players(&self) -> HashSet<PlayerId> {
        self.players
            .iter()
            .filter(|p| !p.active)
            .map(|p| p.id)
            .collect()
    }

    /// Matches of one round.
    pub fn round_matches(&self, round: u32) -> impl Iterator<Item = &GameMatch> {
        self.matches.iter().filter(move |m| m.round == round)
    }

    /// Ids of current-round matches that still wait on a result.
    pub fn unfinished_in_current_round(&self) -> Vec<MatchId> {
        self.round_matches(self.current_round)
            .filter(|m| m.status != MatchStatus::Completed)
            .map(|m| m.id)
            .collect()
    }

    pub fn require_phase(&self, expected: TournamentPhase) -> TournamentResult<()> {
        if self.phase != expected {
            return Err(TournamentError::InvalidPhase {
                expected,
                actual: self.phase,
            });
        }
        Ok(())
    }

    /// Register a player (Planned only). Names must be unique, case-insensitive.
    pub fn add_player(&mut self, name: impl Into<String>, seed: u32) -> TournamentResult<PlayerId> {
        self.require_phase(TournamentPhase::Planned)?;
        let name = name.into();
        let name_trimmed = name.trim();
        if name_trimmed.is_empty() {
            return Err(TournamentError::validation("player name is empty"));
        }
        let is_duplicate = self
            .players
            .iter()
            .any(|p| p.name.eq_ignore_ascii_case(name_trimmed));
        if is_duplicate {
            return Err(TournamentError::DuplicatePlayerName);
        }
        let player = Player::with_seed(name_trimmed, seed);
        let id = player.id;
        self.players.push(player);
        Ok(id)
    }

    /// Remove a registration entirely (Planned only; use drop_player once active).
    pub fn remove_player(&mut self, player_id: PlayerId) -> TournamentResult<()> {
        self.require_phase(TournamentPhase::Planned)?;
        let idx = self
            .players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or(TournamentError::unknown_player(player_id))?;
        self.players.remove(idx);
        Ok(())
    }

    /// Set the Swiss round count (Planned only).
    pub fn set_rounds(&mut self, rounds: u32) -> TournamentResult<()> {
        self.require_phase(TournamentPhase::Planned)?;
        if self.structure.is_elimination() {
            return Err(TournamentError::UnsupportedStructure {
                operation: "set_rounds",
                structure: self.structure,
            });
        }
        if rounds == 0 {
            return Err(TournamentError::validation("round count must be at least 1"));
        }
        self.rounds = Some(rounds);
        Ok(())
    }

    /// Replace the configuration (Planned only).
    pub fn set_config(&mut self, config: TournamentConfig) -> TournamentResult<()> {
        self.require_phase(TournamentPhase::Planned)?;
        config.validate()?;
        self.config = config;
        Ok(())
    }
}
