//! Error type shared by every tournament operation.

use crate::models::game::{MatchId, Seat};
use crate::models::player::PlayerId;
use crate::models::tournament::{TournamentId, TournamentPhase, TournamentStructure};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A reference the engine could not resolve.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityIssue {
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),
    #[error("unknown match {0}")]
    UnknownMatch(MatchId),
    #[error("unknown tournament {0}")]
    UnknownTournament(TournamentId),
    #[error("match {from} links to missing match {to}")]
    DanglingLink { from: MatchId, to: MatchId },
    #[error("match {from} links to match {to} in the same or an earlier round")]
    BackwardLink { from: MatchId, to: MatchId },
}

/// Why a Swiss round could not be paired.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingConflict {
    /// This player has already met every other player left in the pool.
    Exhausted {
        player: PlayerId,
        already_played: Vec<PlayerId>,
    },
    /// Every pairing of the pool repeats at least one earlier match.
    NoRematchFreePairing { pool: Vec<PlayerId> },
    /// The bounded search gave up before finding a pairing.
    SearchLimit { steps: usize },
}

impl fmt::Display for PairingConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairingConflict::Exhausted {
                player,
                already_played,
            } => write!(
                f,
                "player {player} has already played all {} remaining opponents",
                already_played.len()
            ),
            PairingConflict::NoRematchFreePairing { pool } => {
                write!(f, "no rematch-free pairing exists for {} players", pool.len())
            }
            PairingConflict::SearchLimit { steps } => {
                write!(f, "pairing search stopped after {steps} steps")
            }
        }
    }
}

/// Errors that can occur during tournament operations.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum TournamentError {
    /// Malformed result submission or request.
    #[error("validation failed: {reason}")]
    Validation { reason: String },

    #[error("round {round} cannot be paired: {conflict}")]
    PairingImpossible {
        round: u32,
        conflict: PairingConflict,
    },

    #[error("bracket slot {seat:?} of match {match_id} is already resolved ({occupant:?})")]
    BracketCorruption {
        match_id: MatchId,
        seat: Seat,
        /// None when the slot was already marked vacant.
        occupant: Option<PlayerId>,
    },

    #[error("not ready: {reason} ({} blocking matches)", blocking.len())]
    NotReady {
        reason: String,
        blocking: Vec<MatchId>,
    },

    #[error("data integrity: {0}")]
    DataIntegrity(IntegrityIssue),

    #[error("tournament is {actual:?}, expected {expected:?}")]
    InvalidPhase {
        expected: TournamentPhase,
        actual: TournamentPhase,
    },

    #[error("{operation} is not available for {structure:?} tournaments")]
    UnsupportedStructure {
        operation: &'static str,
        structure: TournamentStructure,
    },

    #[error("need at least {required} active players, have {actual}")]
    NotEnoughPlayers { required: usize, actual: usize },

    #[error("a player with this name already exists")]
    DuplicatePlayerName,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl TournamentError {
    pub fn validation(reason: impl Into<String>) -> Self {
        TournamentError::Validation {
            reason: reason.into(),
        }
    }

    pub fn unknown_player(id: PlayerId) -> Self {
        TournamentError::DataIntegrity(IntegrityIssue::UnknownPlayer(id))
    }

    pub fn unknown_match(id: MatchId) -> Self {
        TournamentError::DataIntegrity(IntegrityIssue::UnknownMatch(id))
    }

    /// Stable name of the error kind, for the calling layer.
    pub fn kind(&self) -> &'static str {
        match self {
            TournamentError::Validation { .. } => "validation_error",
            TournamentError::PairingImpossible { .. } => "pairing_impossible",
            TournamentError::BracketCorruption { .. } => "bracket_corruption",
            TournamentError::NotReady { .. } => "not_ready",
            TournamentError::DataIntegrity(_) => "data_integrity_error",
            TournamentError::InvalidPhase { .. } => "invalid_phase",
            TournamentError::UnsupportedStructure { .. } => "unsupported_structure",
            TournamentError::NotEnoughPlayers { .. } => "not_enough_players",
            TournamentError::DuplicatePlayerName => "duplicate_player_name",
            TournamentError::InvalidConfig(_) => "invalid_config",
        }
    }

    /// Whether an organizer can fix the cause and retry.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            TournamentError::BracketCorruption { .. } | TournamentError::DataIntegrity(_)
        )
    }
}

/// Result type for tournament operations.
pub type TournamentResult<T> = Result<T, TournamentError>;
