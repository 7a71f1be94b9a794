//! Tournament business logic: standings, pairings, brackets and the lifecycle around them.

pub mod bracket;
mod results;
mod roster;
mod setup;
pub mod standings;
pub mod swiss;

pub use bracket::{seed_order, BracketFormat, BracketGraph, BracketOptions};
pub use results::{correct_match_result, submit_intentional_draw, submit_match_result};
pub use roster::{drop_player, reinstate_player};
pub use setup::{
    build_bracket, default_rounds, end_tournament, generate_round, get_standings,
    start_tournament, GeneratedRound,
};
pub use standings::compute_standings;
pub use swiss::{
    pair_round, PairingHistory, PairingOptions, RematchPolicy, RoundPairing, MAX_SEARCH_STEPS,
};
