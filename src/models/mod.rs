//! Data structures for the tournament engine: players, matches, standings, tournament state.

mod config;
mod error;
mod game;
mod player;
mod standing;
mod tournament;

pub use config::{
    GrandFinalsModifier, StructureConfig, Tiebreaker, TiebreakerConfig, TournamentConfig,
};
pub use error::{IntegrityIssue, PairingConflict, TournamentError, TournamentResult};
pub use game::{
    BracketInfo, BracketLink, BracketSide, GameMatch, MatchId, MatchResult, MatchStatus, Seat,
    SpecialSlot,
};
pub use player::{Player, PlayerId};
pub use standing::Standing;
pub use tournament::{Tournament, TournamentId, TournamentPhase, TournamentStructure};
