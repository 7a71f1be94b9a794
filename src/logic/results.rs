//! Match results: submission, intentional draws and corrections.

use crate::logic::bracket;
use crate::models::{
    GameMatch, MatchId, MatchResult, MatchStatus, Seat, StructureConfig, Tournament,
    TournamentError, TournamentPhase, TournamentResult, TournamentStructure,
};
use log::info;

/// Record the game score of a match and advance the bracket when it is one.
///
/// 1. Resubmitting the recorded score is a no-op, even once the tournament
///    has completed.
/// 2. Otherwise the tournament must be Active and the match must exist.
/// 3. Byes and awaiting bracket matches take no result; a different score on
///    a completed match is rejected (see `correct_match_result`).
/// 4. Scores must fit the best-of-N format; elimination matches need a winner
///    once the grand-final advantage is counted.
/// 5. The result and everything it advances are committed together.
pub fn submit_match_result(
    tournament: &mut Tournament,
    match_id: MatchId,
    wins_1: u32,
    wins_2: u32,
    draws: u32,
) -> TournamentResult<GameMatch> {
    if let Some(m) = replayed(tournament, match_id, |m| {
        m.result.is_some() && m.has_score(wins_1, wins_2, draws)
    }) {
        return Ok(m);
    }
    tournament.require_phase(TournamentPhase::Active)?;
    let m = tournament
        .get_match(match_id)
        .ok_or(TournamentError::unknown_match(match_id))?;
    if m.bye {
        return Err(TournamentError::validation("a bye takes no result"));
    }
    if m.is_completed() {
        return Err(TournamentError::validation(format!(
            "match {match_id} already has a different result"
        )));
    }
    ensure_ready(tournament, m)?;
    check_games(&tournament.config.structure, wins_1, wins_2, draws)?;
    let result = decide(m, wins_1, wins_2)?;
    commit(tournament, match_id, wins_1, wins_2, draws, result)
}

/// The completed, non-bye match when `same` says it already holds this report.
fn replayed(
    tournament: &Tournament,
    match_id: MatchId,
    same: impl Fn(&GameMatch) -> bool,
) -> Option<GameMatch> {
    tournament
        .get_match(match_id)
        .filter(|m| m.is_completed() && !m.bye && same(m))
        .cloned()
}

/// Record an agreed draw with no games played. Swiss only, and only when the
/// structure allows it.
pub fn submit_intentional_draw(
    tournament: &mut Tournament,
    match_id: MatchId,
) -> TournamentResult<GameMatch> {
    if let Some(m) = replayed(tournament, match_id, |m| {
        m.result == Some(MatchResult::Draw) && m.has_score(0, 0, 0)
    }) {
        return Ok(m);
    }
    tournament.require_phase(TournamentPhase::Active)?;
    if !tournament.config.structure.allow_intentional_draws {
        return Err(TournamentError::validation(
            "intentional draws are disabled for this tournament",
        ));
    }
    let m = tournament
        .get_match(match_id)
        .ok_or(TournamentError::unknown_match(match_id))?;
    if m.bye {
        return Err(TournamentError::validation("a bye takes no result"));
    }
    if m.is_bracket() {
        return Err(TournamentError::validation(
            "elimination matches cannot end in a draw",
        ));
    }
    if m.is_completed() {
        return Err(TournamentError::validation(format!(
            "match {match_id} already has a different result"
        )));
    }
    commit(tournament, match_id, 0, 0, 0, MatchResult::Draw)
}

/// Overwrite the result of a completed Swiss match in the current round.
/// Earlier rounds are frozen because later pairings were built on them.
pub fn correct_match_result(
    tournament: &mut Tournament,
    match_id: MatchId,
    wins_1: u32,
    wins_2: u32,
    draws: u32,
) -> TournamentResult<GameMatch> {
    tournament.require_phase(TournamentPhase::Active)?;
    if tournament.structure != TournamentStructure::Swiss {
        return Err(TournamentError::UnsupportedStructure {
            operation: "correct_match_result",
            structure: tournament.structure,
        });
    }
    let m = tournament
        .get_match(match_id)
        .ok_or(TournamentError::unknown_match(match_id))?;
    if m.bye {
        return Err(TournamentError::validation("a bye takes no result"));
    }
    if m.round != tournament.current_round {
        return Err(TournamentError::validation(format!(
            "match {match_id} is from round {}, only round {} can be corrected",
            m.round, tournament.current_round
        )));
    }
    check_games(&tournament.config.structure, wins_1, wins_2, draws)?;
    let result = decide(m, wins_1, wins_2)?;
    info!("correcting match {match_id} to {wins_1}-{wins_2}-{draws}");
    commit(tournament, match_id, wins_1, wins_2, draws, result)
}

fn ensure_ready(tournament: &Tournament, m: &GameMatch) -> TournamentResult<()> {
    if m.status != MatchStatus::Awaiting {
        return Ok(());
    }
    let blocking = tournament
        .matches
        .iter()
        .filter(|f| !f.is_completed())
        .filter(|f| {
            f.bracket.as_ref().is_some_and(|b| {
                [b.next_match, b.losers_next_match]
                    .into_iter()
                    .flatten()
                    .any(|link| link.match_id == m.id)
            })
        })
        .map(|f| f.id)
        .collect();
    Err(TournamentError::NotReady {
        reason: format!("match {} is still waiting for its players", m.id),
        blocking,
    })
}

/// Best-of-N limits: at least one game, at most N in total, and nobody wins
/// more games than it takes to clinch.
fn check_games(
    config: &StructureConfig,
    wins_1: u32,
    wins_2: u32,
    draws: u32,
) -> TournamentResult<()> {
    let total = wins_1.saturating_add(wins_2).saturating_add(draws);
    if total == 0 {
        return Err(TournamentError::validation("no games reported"));
    }
    if total > config.games_per_match {
        return Err(TournamentError::validation(format!(
            "{total} games reported for a best-of-{} match",
            config.games_per_match
        )));
    }
    let clinch = config.wins_to_clinch();
    if wins_1 > clinch || wins_2 > clinch {
        return Err(TournamentError::validation(format!(
            "no player can win more than {clinch} games"
        )));
    }
    Ok(())
}

fn decide(m: &GameMatch, wins_1: u32, wins_2: u32) -> TournamentResult<MatchResult> {
    let advantage = m.bracket.as_ref().and_then(|b| b.advantage);
    let (score_1, score_2) = match advantage {
        Some(Seat::One) => (wins_1 + 1, wins_2),
        Some(Seat::Two) => (wins_1, wins_2 + 1),
        None => (wins_1, wins_2),
    };
    let result = MatchResult::from_games(score_1, score_2);
    if m.is_bracket() && result == MatchResult::Draw {
        return Err(TournamentError::validation(
            "elimination matches need a winner",
        ));
    }
    Ok(result)
}

/// Apply a result on a copy of the match arena and swap it in only when the
/// whole bracket advance succeeded.
fn commit(
    tournament: &mut Tournament,
    match_id: MatchId,
    wins_1: u32,
    wins_2: u32,
    draws: u32,
    result: MatchResult,
) -> TournamentResult<GameMatch> {
    let mut staged = tournament.matches.clone();
    let idx = staged
        .iter()
        .position(|m| m.id == match_id)
        .ok_or(TournamentError::unknown_match(match_id))?;
    staged[idx].complete(wins_1, wins_2, draws, result);
    let recorded = staged[idx].clone();
    if recorded.is_bracket() {
        let dropped = tournament.dropped_players();
        bracket::advance(&mut staged, match_id, &dropped)?;
    }
    tournament.matches = staged;
    info!(
        "round {} table {}: {wins_1}-{wins_2}-{draws} ({result:?})",
        recorded.round, recorded.table
    );
    refresh_progress(tournament);
    Ok(recorded)
}

/// Move the current round forward for brackets and complete the tournament
/// once nothing is left to play.
pub(crate) fn refresh_progress(tournament: &mut Tournament) {
    if tournament.phase != TournamentPhase::Active {
        return;
    }
    let finished = if tournament.structure.is_elimination() {
        let open_round = tournament
            .matches
            .iter()
            .filter(|m| m.is_bracket() && !m.is_completed())
            .map(|m| m.round)
            .min();
        match open_round {
            Some(round) => {
                tournament.current_round = tournament.current_round.max(round);
                false
            }
            None => tournament.matches.iter().any(|m| m.is_bracket()),
        }
    } else {
        tournament.rounds == Some(tournament.current_round)
            && tournament.unfinished_in_current_round().is_empty()
    };
    if finished {
        tournament.phase = TournamentPhase::Completed;
        info!("tournament {} completed", tournament.name);
    }
}
