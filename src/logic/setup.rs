//! Tournament lifecycle: start, Swiss rounds, bracket construction, end.

use crate::logic::bracket::{BracketGraph, BracketOptions};
use crate::logic::results::refresh_progress;
use crate::logic::standings::compute_standings;
use crate::logic::swiss::{pair_round, PairingHistory, PairingOptions, RematchPolicy};
use crate::models::{
    GameMatch, Player, PlayerId, Standing, Tournament, TournamentError, TournamentPhase,
    TournamentResult, TournamentStructure,
};
use log::{info, warn};
use serde::Serialize;
use std::collections::HashSet;

/// Matches created for one Swiss round, with any fallback the pairing needed.
#[derive(Clone, Debug, Serialize)]
pub struct GeneratedRound {
    pub round: u32,
    /// Table order; the bye, if any, is last.
    pub matches: Vec<GameMatch>,
    pub floated: Vec<PlayerId>,
    pub forced_rematches: Vec<(PlayerId, PlayerId)>,
}

/// Default Swiss length: enough rounds to separate a single undefeated player,
/// and never fewer than three.
pub fn default_rounds(players: usize) -> u32 {
    let needed = match players {
        0 | 1 => 0,
        n => usize::BITS - (n - 1).leading_zeros(),
    };
    needed.max(3)
}

/// Start the tournament.
///
/// Swiss fixes the round count (default from `default_rounds`) and pairs round 1.
/// Elimination builds the bracket from the active players in seed order.
/// Nothing changes when either step fails.
pub fn start_tournament(tournament: &mut Tournament) -> TournamentResult<Vec<GameMatch>> {
    tournament.require_phase(TournamentPhase::Planned)?;
    tournament.config.validate()?;
    let mut active: Vec<&Player> = tournament.active_players().collect();
    if active.len() < 2 {
        return Err(TournamentError::NotEnoughPlayers {
            required: 2,
            actual: active.len(),
        });
    }
    active.sort_by_key(|p| p.seed_key());

    match tournament.structure {
        TournamentStructure::Swiss => {
            let mut staged = tournament.clone();
            staged.rounds = Some(staged.rounds.unwrap_or(default_rounds(active.len())));
            staged.phase = TournamentPhase::Active;
            let first = generate_round(&mut staged, RematchPolicy::Forbid)?;
            *tournament = staged;
            info!(
                "started Swiss tournament {} with {} players over {:?} rounds",
                tournament.name,
                tournament.players.len(),
                tournament.rounds
            );
            Ok(first.matches)
        }
        TournamentStructure::SingleElimination | TournamentStructure::DoubleElimination => {
            let seeds: Vec<PlayerId> = active.iter().map(|p| p.id).collect();
            build_bracket(tournament, &seeds).map(|graph| graph.matches)
        }
    }
}

/// Build the elimination bracket from an explicit seed list (index 0 is the top
/// seed) and activate the tournament. Every active player must appear once.
pub fn build_bracket(
    tournament: &mut Tournament,
    seeds: &[PlayerId],
) -> TournamentResult<BracketGraph> {
    tournament.require_phase(TournamentPhase::Planned)?;
    let options = BracketOptions::for_structure(tournament.structure, &tournament.config.structure)
        .ok_or(TournamentError::UnsupportedStructure {
            operation: "build_bracket",
            structure: tournament.structure,
        })?;
    for &id in seeds {
        let player = tournament
            .get_player(id)
            .ok_or(TournamentError::unknown_player(id))?;
        if !player.active {
            return Err(TournamentError::validation(format!(
                "{} has dropped and cannot be seeded",
                player.name
            )));
        }
    }
    let seeded: HashSet<PlayerId> = seeds.iter().copied().collect();
    if let Some(missing) = tournament.active_players().find(|p| !seeded.contains(&p.id)) {
        return Err(TournamentError::validation(format!(
            "{} is missing from the seed list",
            missing.name
        )));
    }

    let graph = BracketGraph::build(tournament.id, seeds, options)?;
    tournament.matches.extend(graph.matches.iter().cloned());
    tournament.current_round = 1;
    tournament.phase = TournamentPhase::Active;
    refresh_progress(tournament);
    Ok(graph)
}

/// Pair the next Swiss round.
///
/// 1. The current round must be fully reported (`NotReady` lists what is open).
/// 2. Standings are recomputed and fed to the pairing engine with the full
///    match history; dropped players are left out.
/// 3. Matches get tables in pairing order, the bye last.
pub fn generate_round(
    tournament: &mut Tournament,
    rematch_policy: RematchPolicy,
) -> TournamentResult<GeneratedRound> {
    tournament.require_phase(TournamentPhase::Active)?;
    if tournament.structure != TournamentStructure::Swiss {
        return Err(TournamentError::UnsupportedStructure {
            operation: "generate_round",
            structure: tournament.structure,
        });
    }
    let blocking = tournament.unfinished_in_current_round();
    if !blocking.is_empty() {
        return Err(TournamentError::NotReady {
            reason: format!("round {} is not finished", tournament.current_round),
            blocking,
        });
    }
    if let Some(rounds) = tournament.rounds {
        if tournament.current_round >= rounds {
            return Err(TournamentError::NotReady {
                reason: format!("all {rounds} rounds have been paired"),
                blocking: Vec::new(),
            });
        }
    }

    let standings = compute_standings(
        &tournament.players,
        &tournament.matches,
        &tournament.config.tiebreakers,
    )?;
    let history = PairingHistory::from_matches(&tournament.matches);
    let round = tournament.current_round + 1;
    let options = PairingOptions {
        use_seeds_for_byes: tournament.config.structure.use_seeds_for_byes,
        rematch_policy,
    };
    let pairing = pair_round(round, &standings, &tournament.players, &history, options)?;

    let mut matches: Vec<GameMatch> = pairing
        .pairs
        .iter()
        .zip(1..)
        .map(|(&(one, two), table)| GameMatch::pairing(tournament.id, round, table, one, two))
        .collect();
    if let Some(player) = pairing.bye {
        let table = matches.len() as u32 + 1;
        matches.push(GameMatch::bye(tournament.id, round, table, player));
    }
    if pairing.used_fallback() {
        warn!(
            "round {round} needed {} rematches",
            pairing.forced_rematches.len()
        );
    }

    tournament.matches.extend(matches.iter().cloned());
    tournament.current_round = round;
    info!(
        "paired round {round}: {} matches{}",
        pairing.pairs.len(),
        if pairing.bye.is_some() { " and a bye" } else { "" }
    );
    Ok(GeneratedRound {
        round,
        matches,
        floated: pairing.floated,
        forced_rematches: pairing.forced_rematches,
    })
}

/// Close an active tournament early. Open matches stay unreported.
pub fn end_tournament(tournament: &mut Tournament) -> TournamentResult<()> {
    tournament.require_phase(TournamentPhase::Active)?;
    tournament.phase = TournamentPhase::Completed;
    info!("tournament {} ended by organizer", tournament.name);
    Ok(())
}

/// Current standings, dropped players included.
pub fn get_standings(tournament: &Tournament) -> TournamentResult<Vec<Standing>> {
    compute_standings(
        &tournament.players,
        &tournament.matches,
        &tournament.config.tiebreakers,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rounds_has_a_floor_of_three() {
        assert_eq!(default_rounds(2), 3);
        assert_eq!(default_rounds(8), 3);
        assert_eq!(default_rounds(9), 4);
        assert_eq!(default_rounds(32), 5);
        assert_eq!(default_rounds(33), 6);
    }
}
