//! Dropping and reinstating players once a tournament is under way.

use crate::logic::bracket;
use crate::logic::results::refresh_progress;
use crate::models::{PlayerId, Tournament, TournamentError, TournamentPhase, TournamentResult};
use log::info;

fn require_open(tournament: &Tournament) -> TournamentResult<()> {
    if tournament.phase == TournamentPhase::Completed {
        return Err(TournamentError::InvalidPhase {
            expected: TournamentPhase::Active,
            actual: tournament.phase,
        });
    }
    Ok(())
}

/// Drop a player. They are no longer paired, but their finished matches keep
/// counting for everyone. In a running bracket their open match is forfeited
/// and any seat still waiting for them is left vacant.
pub fn drop_player(tournament: &mut Tournament, player_id: PlayerId) -> TournamentResult<()> {
    require_open(tournament)?;
    let player = tournament
        .get_player(player_id)
        .ok_or(TournamentError::unknown_player(player_id))?;
    if !player.active {
        return Ok(());
    }

    if tournament.phase == TournamentPhase::Active && tournament.structure.is_elimination() {
        let mut dropped = tournament.dropped_players();
        dropped.insert(player_id);
        let mut staged = tournament.matches.clone();
        bracket::withdraw(&mut staged, player_id, &dropped)?;
        tournament.matches = staged;
    }
    if let Some(player) = tournament.get_player_mut(player_id) {
        player.drop_out();
        info!("{} dropped", player.name);
    }
    refresh_progress(tournament);
    Ok(())
}

/// Undo a drop. The player is paired again from the next Swiss round; a bracket
/// seat they already forfeited stays forfeited.
pub fn reinstate_player(tournament: &mut Tournament, player_id: PlayerId) -> TournamentResult<()> {
    require_open(tournament)?;
    let player = tournament
        .get_player_mut(player_id)
        .ok_or(TournamentError::unknown_player(player_id))?;
    if !player.active {
        player.reinstate();
        info!("{} reinstated", player.name);
    }
    Ok(())
}
