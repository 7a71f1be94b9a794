//! Integration tests for the standings calculator.

use tournament_engine::models::{
    GameMatch, IntegrityIssue, MatchResult, Player, PlayerId, Tiebreaker, TiebreakerConfig,
    TournamentError,
};
use tournament_engine::{compute_standings, Standing};
use uuid::Uuid;

fn roster(n: usize) -> Vec<Player> {
    (0..n)
        .map(|i| Player::with_seed(format!("P{}", i + 1), i as u32 + 1))
        .collect()
}

fn played(a: PlayerId, b: PlayerId, wins_1: u32, wins_2: u32, draws: u32) -> GameMatch {
    let mut m = GameMatch::pairing(Uuid::new_v4(), 1, 1, a, b);
    m.complete(wins_1, wins_2, draws, MatchResult::from_games(wins_1, wins_2));
    m
}

fn row(standings: &[Standing], id: PlayerId) -> &Standing {
    standings.iter().find(|s| s.player_id == id).unwrap()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn three_player_event_is_ranked_by_points_then_tiebreakers() {
    let players = roster(3);
    let (a, b, c) = (players[0].id, players[1].id, players[2].id);
    let matches = vec![
        played(a, b, 2, 1, 0),
        played(a, c, 2, 0, 0),
        played(b, c, 1, 1, 1),
    ];
    let standings = compute_standings(&players, &matches, &TiebreakerConfig::default()).unwrap();

    let order: Vec<PlayerId> = standings.iter().map(|s| s.player_id).collect();
    // B and C tie on points and OMW; B has the better game win rate.
    assert_eq!(order, vec![a, b, c]);
    assert_eq!(
        standings.iter().map(|s| s.rank).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );

    let sa = row(&standings, a);
    assert_eq!(sa.match_points, 6);
    assert_eq!(sa.game_points, 4);
    assert_eq!(sa.games_played, 5);
    assert!(close(sa.match_win_percentage, 1.0));
    assert!(close(sa.game_win_percentage, 0.8));
    // Both opponents sit at 1/6 match wins, floored to 1/3.
    assert!(close(sa.opponents_match_win_percentage, 1.0 / 3.0));

    let sb = row(&standings, b);
    let sc = row(&standings, c);
    assert_eq!((sb.wins, sb.losses, sb.draws), (0, 1, 1));
    assert_eq!(sb.match_points, 1);
    assert_eq!(sc.match_points, 1);
    assert!(close(sb.opponents_match_win_percentage, sc.opponents_match_win_percentage));
    assert!(close(sb.game_win_percentage, 2.0 / 6.0));
    assert!(close(sc.game_win_percentage, 1.0 / 5.0));

    let total: u32 = standings.iter().map(|s| s.match_points).sum();
    assert_eq!(total, 3 * 2 + 2);
}

#[test]
fn bye_is_a_win_without_games_or_opponent() {
    let players = roster(3);
    let (a, b, c) = (players[0].id, players[1].id, players[2].id);
    let t = Uuid::new_v4();
    let matches = vec![played(a, b, 2, 0, 0), GameMatch::bye(t, 1, 2, c)];
    let standings = compute_standings(&players, &matches, &TiebreakerConfig::default()).unwrap();

    let sc = row(&standings, c);
    assert_eq!(sc.match_points, 3);
    assert_eq!(sc.byes, 1);
    assert_eq!(sc.wins, 1);
    assert_eq!(sc.matches_played, 1);
    assert_eq!(sc.games_played, 0);
    assert!(close(sc.game_win_percentage, 0.0));
    assert!(close(sc.opponents_match_win_percentage, 0.0));

    // A's only opponent is B, so the bye does not enter A's OMW.
    let sa = row(&standings, a);
    assert!(close(sa.opponents_match_win_percentage, 1.0 / 3.0));
}

#[test]
fn unfinished_matches_do_not_count() {
    let players = roster(2);
    let matches = vec![GameMatch::pairing(
        Uuid::new_v4(),
        1,
        1,
        players[0].id,
        players[1].id,
    )];
    let standings = compute_standings(&players, &matches, &TiebreakerConfig::default()).unwrap();
    assert!(standings.iter().all(|s| s.matches_played == 0));
}

#[test]
fn dropped_players_stay_ranked_and_count_for_opponents() {
    let mut players = roster(3);
    let (a, b, c) = (players[0].id, players[1].id, players[2].id);
    let matches = vec![played(b, a, 2, 0, 0), played(c, a, 2, 1, 0)];
    players[0].drop_out();

    let standings = compute_standings(&players, &matches, &TiebreakerConfig::default()).unwrap();
    assert_eq!(standings.len(), 3);
    let sa = row(&standings, a);
    assert!(!sa.active);
    assert_eq!(sa.losses, 2);
    assert_eq!(row(&standings, b).wins, 1);
    assert_eq!(row(&standings, c).wins, 1);
}

#[test]
fn residual_ties_fall_back_to_seed() {
    let mut players = roster(3);
    players[0].seed = 0;
    let standings = compute_standings(&players, &[], &TiebreakerConfig::default()).unwrap();
    let order: Vec<PlayerId> = standings.iter().map(|s| s.player_id).collect();
    // Unseeded players sort after every seeded one.
    assert_eq!(order, vec![players[1].id, players[2].id, players[0].id]);
}

#[test]
fn custom_tiebreak_order_is_respected() {
    let players = roster(4);
    let (a, b, c, d) = (players[0].id, players[1].id, players[2].id, players[3].id);
    let matches = vec![
        played(a, d, 2, 0, 0),
        played(b, c, 2, 1, 0),
        played(c, d, 2, 0, 0),
    ];

    // A, B and C all have 3 points; C faced the strongest opponents.
    let by_default = compute_standings(&players, &matches, &TiebreakerConfig::default()).unwrap();
    let order: Vec<PlayerId> = by_default.iter().map(|s| s.player_id).collect();
    assert_eq!(order, vec![c, b, a, d]);

    let config = TiebreakerConfig {
        order: vec![Tiebreaker::GameWinPercentage],
        ..TiebreakerConfig::default()
    };
    let by_games = compute_standings(&players, &matches, &config).unwrap();
    let order: Vec<PlayerId> = by_games.iter().map(|s| s.player_id).collect();
    // A 2/2, B 2/3, C 3/5, D 0/4.
    assert_eq!(order, vec![a, b, c, d]);
}

#[test]
fn match_with_unknown_player_is_an_integrity_error() {
    let players = roster(1);
    let stranger = Uuid::new_v4();
    let matches = vec![played(players[0].id, stranger, 2, 0, 0)];
    assert!(matches!(
        compute_standings(&players, &matches, &TiebreakerConfig::default()),
        Err(TournamentError::DataIntegrity(IntegrityIssue::UnknownPlayer(id))) if id == stranger
    ));
}
