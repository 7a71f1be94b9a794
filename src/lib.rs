//! Tournament structure engine: Swiss pairings, elimination brackets and standings.

pub mod logic;
pub mod models;
pub mod registry;

pub use logic::{
    build_bracket, compute_standings, correct_match_result, drop_player, end_tournament,
    generate_round, get_standings, reinstate_player, start_tournament, submit_intentional_draw,
    submit_match_result, BracketGraph, GeneratedRound, RematchPolicy,
};
pub use models::{
    BracketSide, GameMatch, GrandFinalsModifier, MatchId, MatchResult, MatchStatus, Player,
    PlayerId, SpecialSlot, Standing, Tournament, TournamentConfig, TournamentError,
    TournamentId, TournamentPhase, TournamentResult, TournamentStructure,
};
pub use registry::TournamentRegistry;
