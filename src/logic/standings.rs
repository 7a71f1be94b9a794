//! Standings calculator: match history -> ranked per-player statistics.
//!
//! Pure and read-only. Dropped players are ranked alongside everyone else and
//! their matches keep counting towards their opponents' tiebreakers.

use crate::models::{
    GameMatch, MatchResult, Player, PlayerId, Seat, Standing, TiebreakerConfig, TournamentError,
    TournamentResult,
};
use std::collections::HashMap;

const POINTS_FOR_WIN: u32 = 3;
const POINTS_FOR_DRAW: u32 = 1;

/// Compute the full, totally ordered standings table.
///
/// Only completed matches count. A match with a single player is a bye: a win
/// with zero games, and no opponent for either percentage. Residual ties after
/// the configured tiebreakers fall back to seed, then player id.
pub fn compute_standings(
    players: &[Player],
    matches: &[GameMatch],
    config: &TiebreakerConfig,
) -> TournamentResult<Vec<Standing>> {
    let index: HashMap<PlayerId, usize> =
        players.iter().enumerate().map(|(i, p)| (p.id, i)).collect();
    let lookup = |id: PlayerId| {
        index
            .get(&id)
            .copied()
            .ok_or(TournamentError::unknown_player(id))
    };

    let mut rows: Vec<Standing> = players
        .iter()
        .map(|p| Standing::new(p.id, p.active))
        .collect();
    let mut opponents: Vec<Vec<usize>> = vec![Vec::new(); players.len()];

    for m in matches.iter().filter(|m| m.is_completed()) {
        // Bracket matches vacated on both seats resolve without a result.
        let Some(result) = m.result else { continue };
        match (m.player_1, m.player_2) {
            (Some(p1), Some(p2)) => {
                let (i1, i2) = (lookup(p1)?, lookup(p2)?);
                let games = m.wins_1 + m.wins_2 + m.draws;
                record_match(&mut rows[i1], result, Seat::One, m.wins_1, games);
                record_match(&mut rows[i2], result, Seat::Two, m.wins_2, games);
                opponents[i1].push(i2);
                opponents[i2].push(i1);
            }
            (Some(p), None) | (None, Some(p)) => {
                let row = &mut rows[lookup(p)?];
                row.matches_played += 1;
                row.wins += 1;
                row.byes += 1;
                row.match_points += POINTS_FOR_WIN;
            }
            (None, None) => {}
        }
    }

    for row in &mut rows {
        if row.matches_played > 0 {
            row.match_win_percentage =
                f64::from(row.match_points) / f64::from(POINTS_FOR_WIN * row.matches_played);
        }
        if row.games_played > 0 {
            row.game_win_percentage = f64::from(row.game_points) / f64::from(row.games_played);
        }
    }

    let floor = config.percentage_floor;
    let floored: Vec<(f64, f64)> = rows
        .iter()
        .map(|r| {
            (
                r.match_win_percentage.max(floor),
                r.game_win_percentage.max(floor),
            )
        })
        .collect();
    for (row, opps) in rows.iter_mut().zip(&opponents) {
        if opps.is_empty() {
            continue;
        }
        let n = opps.len() as f64;
        row.opponents_match_win_percentage = opps.iter().map(|&o| floored[o].0).sum::<f64>() / n;
        row.opponents_game_win_percentage = opps.iter().map(|&o| floored[o].1).sum::<f64>() / n;
    }

    let mut ranked: Vec<(Vec<i64>, (u32, PlayerId), Standing)> = rows
        .into_iter()
        .zip(players)
        .map(|(row, p)| (row.tiebreak_key(&config.order), p.seed_key(), row))
        .collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

    Ok(ranked
        .into_iter()
        .enumerate()
        .map(|(i, (_, _, mut row))| {
            row.rank = i as u32 + 1;
            row
        })
        .collect())
}

fn record_match(row: &mut Standing, result: MatchResult, seat: Seat, games_won: u32, games: u32) {
    row.matches_played += 1;
    row.game_points += games_won;
    row.games_played += games;
    match result.winning_seat() {
        Some(winner) if winner == seat => {
            row.wins += 1;
            row.match_points += POINTS_FOR_WIN;
        }
        Some(_) => row.losses += 1,
        None => {
            row.draws += 1;
            row.match_points += POINTS_FOR_DRAW;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn played(t: Uuid, a: PlayerId, b: PlayerId, w1: u32, w2: u32, d: u32) -> GameMatch {
        let mut m = GameMatch::pairing(t, 1, 1, a, b);
        m.complete(w1, w2, d, MatchResult::from_games(w1, w2));
        m
    }

    #[test]
    fn game_points_count_games_won() {
        let players = vec![Player::with_seed("A", 1), Player::with_seed("B", 2)];
        let t = Uuid::new_v4();
        let matches = vec![played(t, players[0].id, players[1].id, 2, 1, 0)];
        let rows = compute_standings(&players, &matches, &TiebreakerConfig::default()).unwrap();
        assert_eq!(rows[0].player_id, players[0].id);
        assert_eq!(rows[0].game_points, 2);
        assert_eq!(rows[0].games_played, 3);
        assert!((rows[0].game_win_percentage - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(rows[1].game_points, 1);
    }

    #[test]
    fn pending_matches_are_ignored() {
        let players = vec![Player::with_seed("A", 1), Player::with_seed("B", 2)];
        let matches = vec![GameMatch::pairing(
            Uuid::new_v4(),
            1,
            1,
            players[0].id,
            players[1].id,
        )];
        let rows = compute_standings(&players, &matches, &TiebreakerConfig::default()).unwrap();
        assert!(rows.iter().all(|r| r.matches_played == 0));
    }

    #[test]
    fn empty_bracket_match_is_skipped() {
        let players = vec![Player::with_seed("A", 1)];
        let mut m = GameMatch::pairing(Uuid::new_v4(), 1, 1, players[0].id, players[0].id);
        m.player_1 = None;
        m.player_2 = None;
        m.status = crate::models::MatchStatus::Completed;
        let rows = compute_standings(&players, &[m], &TiebreakerConfig::default()).unwrap();
        assert_eq!(rows[0].matches_played, 0);
    }
}
