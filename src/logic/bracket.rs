//! Bracket engine: single and double elimination as an arena of linked matches.
//!
//! Matches never hold references to each other. Every forward link is a
//! `BracketLink` (match id + seat) into the same `Vec<GameMatch>`, and links
//! always point into a strictly later round.
//!
//! Round numbers are global play order so the links stay forward-only in
//! double elimination:
//!
//! - winners round r plays in round 1 (r = 1) or 2r - 2,
//! - losers round l plays in round l + 1,
//! - the grand final plays in round 2k (k winners rounds), the reset in 2k + 1.

use crate::models::{
    BracketInfo, BracketLink, BracketSide, GameMatch, GrandFinalsModifier, IntegrityIssue,
    MatchId, MatchResult, MatchStatus, PlayerId, Seat, SpecialSlot, StructureConfig,
    TournamentError, TournamentId, TournamentResult, TournamentStructure,
};
use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketFormat {
    Single,
    Double,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BracketOptions {
    pub format: BracketFormat,
    pub seeded: bool,
    pub third_place_match: bool,
    pub grand_finals: GrandFinalsModifier,
}

impl BracketOptions {
    /// Options for an elimination structure; None for Swiss.
    pub fn for_structure(structure: TournamentStructure, config: &StructureConfig) -> Option<Self> {
        let format = match structure {
            TournamentStructure::Swiss => return None,
            TournamentStructure::SingleElimination => BracketFormat::Single,
            TournamentStructure::DoubleElimination => BracketFormat::Double,
        };
        Some(Self {
            format,
            seeded: config.seeded_bracket,
            third_place_match: config.third_place_match,
            grand_finals: config.grand_finals_modifier,
        })
    }
}

/// Slot order of standard seeding for a bracket of `size` (a power of two).
/// Consecutive entries meet in round 1: 8 gives 1,8,4,5,2,7,3,6.
pub fn seed_order(size: usize) -> Vec<usize> {
    let mut order = vec![1];
    while order.len() < size {
        let n = order.len() * 2;
        order = order.iter().flat_map(|&s| [s, n + 1 - s]).collect();
    }
    order
}

/// The matches of one elimination structure.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BracketGraph {
    pub matches: Vec<GameMatch>,
}

impl BracketGraph {
    /// Lay out a whole bracket for `entrants` (index 0 is the top seed) and
    /// resolve round-1 byes.
    pub fn build(
        tournament_id: TournamentId,
        entrants: &[PlayerId],
        options: BracketOptions,
    ) -> TournamentResult<Self> {
        if entrants.len() < 2 {
            return Err(TournamentError::NotEnoughPlayers {
                required: 2,
                actual: entrants.len(),
            });
        }
        let mut seen = HashSet::new();
        if let Some(dup) = entrants.iter().find(|p| !seen.insert(**p)) {
            return Err(TournamentError::validation(format!(
                "player {dup} is seeded twice"
            )));
        }

        let size = entrants.len().next_power_of_two();
        let mut layout = Layout::new(tournament_id);
        let first_round = match options.format {
            BracketFormat::Single => layout.single(size, options.third_place_match),
            BracketFormat::Double => layout.double(size, options.grand_finals),
        };

        let order = seed_order(size);
        for (position, &idx) in first_round.iter().enumerate() {
            let (one, two) = if options.seeded {
                (order[2 * position] - 1, order[2 * position + 1] - 1)
            } else {
                (position, position + size / 2)
            };
            for (seat, slot) in [(Seat::One, one), (Seat::Two, two)] {
                let m = &mut layout.matches[idx];
                match entrants.get(slot) {
                    Some(&p) => m.set_player(seat, p),
                    None => {
                        if let Some(info) = m.bracket.as_mut() {
                            info.set_vacant(seat);
                        }
                    }
                }
            }
        }

        let mut matches = layout.matches;
        let no_drops = HashSet::new();
        for idx in first_round {
            resolve(&mut matches, idx, &no_drops)?;
        }
        check_links(&matches)?;
        info!(
            "built {:?} bracket: {} entrants, {} matches",
            options.format,
            entrants.len(),
            matches.len()
        );
        Ok(Self { matches })
    }

    /// Bracket matches of an existing match arena.
    pub fn view(matches: &[GameMatch]) -> Self {
        Self {
            matches: matches.iter().filter(|m| m.is_bracket()).cloned().collect(),
        }
    }

    pub fn get(&self, id: MatchId) -> Option<&GameMatch> {
        self.matches.iter().find(|m| m.id == id)
    }

    /// Matches of one side round, top of the bracket first. Special slots excluded.
    pub fn side_round(&self, side: BracketSide, round: u32) -> Vec<&GameMatch> {
        let mut found: Vec<&GameMatch> = self
            .matches
            .iter()
            .filter(|m| {
                m.bracket.as_ref().is_some_and(|b| {
                    b.side == side && b.side_round == round && b.special.is_none()
                })
            })
            .collect();
        found.sort_by_key(|m| m.bracket.as_ref().map(|b| b.position));
        found
    }

    pub fn special(&self, slot: SpecialSlot) -> Option<&GameMatch> {
        self.matches.iter().find(|m| m.special() == Some(slot))
    }

    /// Number of regular rounds on one side.
    pub fn side_rounds(&self, side: BracketSide) -> u32 {
        self.matches
            .iter()
            .filter_map(|m| m.bracket.as_ref())
            .filter(|b| b.side == side && b.special.is_none())
            .map(|b| b.side_round)
            .max()
            .unwrap_or(0)
    }

    /// Every bracket match, including a reset grand final, has resolved.
    pub fn is_finished(&self) -> bool {
        !self.matches.is_empty() && self.matches.iter().all(|m| m.is_completed())
    }

    pub fn champion(&self) -> Option<PlayerId> {
        if !self.is_finished() {
            return None;
        }
        if let Some(m) = self
            .special(SpecialSlot::GrandFinalReset)
            .or_else(|| self.special(SpecialSlot::GrandFinal))
        {
            return m.winner();
        }
        let last = self.side_rounds(BracketSide::Single);
        self.side_round(BracketSide::Single, last)
            .first()
            .and_then(|m| m.winner())
    }
}

/// Builds the empty match skeleton; works on indices into `matches`.
struct Layout {
    tournament_id: TournamentId,
    matches: Vec<GameMatch>,
    tables: HashMap<u32, u32>,
}

impl Layout {
    fn new(tournament_id: TournamentId) -> Self {
        Self {
            tournament_id,
            matches: Vec::new(),
            tables: HashMap::new(),
        }
    }

    fn add(&mut self, round: u32, info: BracketInfo) -> usize {
        let table = self.tables.entry(round).or_insert(0);
        *table += 1;
        self.matches
            .push(GameMatch::bracket_slot(self.tournament_id, round, *table, info));
        self.matches.len() - 1
    }

    fn add_round(&mut self, round: u32, side: BracketSide, side_round: u32, count: usize) -> Vec<usize> {
        (0..count)
            .map(|p| self.add(round, BracketInfo::new(side, side_round, p as u32)))
            .collect()
    }

    fn link(&mut self, from: usize, to: usize, seat: Seat, loser: bool) {
        let target = BracketLink::new(self.matches[to].id, seat);
        if let Some(info) = self.matches[from].bracket.as_mut() {
            if loser {
                info.losers_next_match = Some(target);
            } else {
                info.next_match = Some(target);
            }
        }
    }

    /// Winners of `from[p]` meet pairwise in `to[p / 2]`.
    fn feed_pairwise(&mut self, from: &[usize], to: &[usize], loser: bool) {
        for (p, &idx) in from.iter().enumerate() {
            let seat = if p % 2 == 0 { Seat::One } else { Seat::Two };
            self.link(idx, to[p / 2], seat, loser);
        }
    }

    /// Returns the round-1 match indices.
    fn single(&mut self, size: usize, third_place: bool) -> Vec<usize> {
        let k = size.trailing_zeros();
        let rounds: Vec<Vec<usize>> = (1..=k)
            .map(|r| self.add_round(r, BracketSide::Single, r, size >> r))
            .collect();
        for pair in rounds.windows(2) {
            self.feed_pairwise(&pair[0], &pair[1], false);
        }
        if third_place && k >= 2 {
            let mut info = BracketInfo::new(BracketSide::Single, k, 1);
            info.special = Some(SpecialSlot::ThirdPlace);
            let bronze = self.add(k, info);
            self.feed_pairwise(&rounds[k as usize - 2], &[bronze], true);
        }
        rounds[0].clone()
    }

    fn double(&mut self, size: usize, grand_finals: GrandFinalsModifier) -> Vec<usize> {
        let k = size.trailing_zeros();
        let winners: Vec<Vec<usize>> = (1..=k)
            .map(|r| {
                let round = if r == 1 { 1 } else { 2 * r - 2 };
                self.add_round(round, BracketSide::Winners, r, size >> r)
            })
            .collect();
        let losers: Vec<Vec<usize>> = (1..=2 * (k - 1))
            .map(|l| self.add_round(l + 1, BracketSide::Losers, l, size >> ((l + 1) / 2 + 1)))
            .collect();

        let mut info = BracketInfo::new(BracketSide::Winners, k + 1, 0);
        info.special = Some(SpecialSlot::GrandFinal);
        match grand_finals {
            GrandFinalsModifier::None => {}
            GrandFinalsModifier::Advantage => info.advantage = Some(Seat::One),
            GrandFinalsModifier::Reset => info.resettable = true,
        }
        let grand_final = self.add(2 * k, info);

        for pair in winners.windows(2) {
            self.feed_pairwise(&pair[0], &pair[1], false);
        }
        let wb_final = winners[k as usize - 1][0];
        self.link(wb_final, grand_final, Seat::One, false);

        for (r, round) in winners.iter().enumerate() {
            let r = r + 1;
            if r == 1 {
                match losers.first() {
                    Some(lb1) => self.feed_pairwise(round, lb1, true),
                    None => self.link(round[0], grand_final, Seat::Two, true),
                }
                continue;
            }
            // Alternate the drop order so losers land away from their last opponents.
            let target = &losers[2 * (r - 2) + 1];
            let count = round.len();
            for (p, &idx) in round.iter().enumerate() {
                let q = if r % 2 == 0 { count - 1 - p } else { p };
                self.link(idx, target[q], Seat::Two, true);
            }
        }

        for (l, round) in losers.iter().enumerate() {
            let l = l + 1;
            match losers.get(l) {
                Some(next) if l % 2 == 1 => {
                    for (p, &idx) in round.iter().enumerate() {
                        self.link(idx, next[p], Seat::One, false);
                    }
                }
                Some(next) => self.feed_pairwise(round, next, false),
                None => self.link(round[0], grand_final, Seat::Two, false),
            }
        }
        winners[0].clone()
    }
}

fn index_of(arena: &[GameMatch], id: MatchId) -> TournamentResult<usize> {
    arena
        .iter()
        .position(|m| m.id == id)
        .ok_or(TournamentError::unknown_match(id))
}

/// Verify every link exists and points into a later round.
pub fn check_links(arena: &[GameMatch]) -> TournamentResult<()> {
    for m in arena {
        let Some(info) = &m.bracket else { continue };
        for link in [info.next_match, info.losers_next_match].into_iter().flatten() {
            let target = arena
                .iter()
                .find(|t| t.id == link.match_id)
                .ok_or(TournamentError::DataIntegrity(IntegrityIssue::DanglingLink {
                    from: m.id,
                    to: link.match_id,
                }))?;
            if target.round <= m.round {
                return Err(TournamentError::DataIntegrity(IntegrityIssue::BackwardLink {
                    from: m.id,
                    to: link.match_id,
                }));
            }
        }
    }
    Ok(())
}

/// Propagate a completed match: winner along `next_match`, loser along
/// `losers_next_match`, and open a reset grand final when it is due.
pub(crate) fn advance(
    arena: &mut Vec<GameMatch>,
    match_id: MatchId,
    dropped: &HashSet<PlayerId>,
) -> TournamentResult<()> {
    let idx = index_of(arena, match_id)?;
    let m = arena[idx].clone();
    let Some(info) = m.bracket.as_ref() else {
        return Ok(());
    };
    if !m.is_completed() {
        return Err(TournamentError::NotReady {
            reason: "match has no result to advance".into(),
            blocking: vec![m.id],
        });
    }

    if info.special == Some(SpecialSlot::GrandFinal)
        && info.resettable
        && !m.bye
        && m.result == Some(MatchResult::Win2)
    {
        if let Some((one, two)) = m.players() {
            if !dropped.contains(&one) && !dropped.contains(&two) {
                let mut reset_info = BracketInfo::new(info.side, info.side_round + 1, 0);
                reset_info.special = Some(SpecialSlot::GrandFinalReset);
                let mut reset = GameMatch::bracket_slot(m.tournament_id, m.round + 1, 1, reset_info);
                reset.set_player(Seat::One, one);
                reset.set_player(Seat::Two, two);
                reset.status = MatchStatus::Pending;
                info!("grand final won from the losers bracket, reset match {}", reset.id);
                arena.push(reset);
            }
        }
    }

    if let Some(link) = info.next_match {
        deliver(arena, m.id, link, m.winner(), dropped)?;
    }
    if let Some(link) = info.losers_next_match {
        deliver(arena, m.id, link, m.loser(), dropped)?;
    }
    Ok(())
}

/// Write a player (or a vacancy) into a downstream seat.
fn deliver(
    arena: &mut Vec<GameMatch>,
    from: MatchId,
    link: BracketLink,
    player: Option<PlayerId>,
    dropped: &HashSet<PlayerId>,
) -> TournamentResult<()> {
    let idx = arena.iter().position(|m| m.id == link.match_id).ok_or(
        TournamentError::DataIntegrity(IntegrityIssue::DanglingLink {
            from,
            to: link.match_id,
        }),
    )?;
    let target = &mut arena[idx];
    let occupant = target.player(link.seat);
    let vacant = target
        .bracket
        .as_ref()
        .is_some_and(|b| b.is_vacant(link.seat));
    if target.is_completed() || occupant.is_some() || vacant {
        return Err(TournamentError::BracketCorruption {
            match_id: target.id,
            seat: link.seat,
            occupant,
        });
    }
    match player.filter(|p| !dropped.contains(p)) {
        Some(p) => {
            debug!("match {from}: {p} moves to {} {:?}", link.match_id, link.seat);
            target.set_player(link.seat, p);
        }
        None => {
            if let Some(info) = target.bracket.as_mut() {
                info.set_vacant(link.seat);
            }
        }
    }
    resolve(arena, idx, dropped)
}

#[derive(Clone, Copy, PartialEq)]
enum Fill {
    Player,
    Vacant,
    Open,
}

/// Move a match out of Awaiting once both seats are decided. One vacant seat
/// makes it a bye; two make it an empty match that vacates its own links.
pub(crate) fn resolve(
    arena: &mut Vec<GameMatch>,
    idx: usize,
    dropped: &HashSet<PlayerId>,
) -> TournamentResult<()> {
    let m = &mut arena[idx];
    if m.is_completed() {
        return Ok(());
    }
    let Some(info) = m.bracket.as_ref() else {
        return Ok(());
    };
    let fill = |seat: Seat| {
        if m.player(seat).is_some() {
            Fill::Player
        } else if info.is_vacant(seat) {
            Fill::Vacant
        } else {
            Fill::Open
        }
    };
    let id = m.id;
    match (fill(Seat::One), fill(Seat::Two)) {
        (Fill::Player, Fill::Player) => {
            m.status = MatchStatus::Pending;
            Ok(())
        }
        (Fill::Player, Fill::Vacant) | (Fill::Vacant, Fill::Player) => {
            // A bye always lists its player in seat one.
            if m.player_1.is_none() {
                m.player_1 = m.player_2.take();
            }
            m.bye = true;
            m.complete(0, 0, 0, MatchResult::Win1);
            advance(arena, id, dropped)
        }
        (Fill::Vacant, Fill::Vacant) => {
            m.status = MatchStatus::Completed;
            m.completed_at = Some(Utc::now());
            advance(arena, id, dropped)
        }
        _ => Ok(()),
    }
}

/// Take a dropped player out of every unfinished bracket match: a pending
/// match becomes a walkover for the opponent, an awaiting seat becomes vacant.
pub(crate) fn withdraw(
    arena: &mut Vec<GameMatch>,
    player: PlayerId,
    dropped: &HashSet<PlayerId>,
) -> TournamentResult<()> {
    let open: Vec<MatchId> = arena
        .iter()
        .filter(|m| m.is_bracket() && !m.is_completed() && m.has_player(player))
        .map(|m| m.id)
        .collect();
    for id in open {
        let idx = index_of(arena, id)?;
        let m = &mut arena[idx];
        let Some(seat) = m.seat_of(player) else { continue };
        match m.status {
            MatchStatus::Pending => {
                info!("walkover in match {id}: {player} dropped");
                m.complete(0, 0, 0, MatchResult::for_winner(seat.other()));
                advance(arena, id, dropped)?;
            }
            MatchStatus::Awaiting => {
                m.clear_player(seat);
                if let Some(info) = m.bracket.as_mut() {
                    info.set_vacant(seat);
                }
                resolve(arena, idx, dropped)?;
            }
            MatchStatus::Completed => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn seed_order_pairs_strongest_with_weakest() {
        assert_eq!(seed_order(2), vec![1, 2]);
        assert_eq!(seed_order(4), vec![1, 4, 2, 3]);
        assert_eq!(seed_order(8), vec![1, 8, 4, 5, 2, 7, 3, 6]);
    }

    #[test]
    fn double_elimination_links_point_forward() {
        let entrants: Vec<PlayerId> = (0..16).map(|_| Uuid::new_v4()).collect();
        let options = BracketOptions {
            format: BracketFormat::Double,
            seeded: true,
            third_place_match: false,
            grand_finals: GrandFinalsModifier::Reset,
        };
        let graph = BracketGraph::build(Uuid::new_v4(), &entrants, options).unwrap();
        // 15 winners matches, 14 losers matches, 1 grand final.
        assert_eq!(graph.matches.len(), 30);
        assert_eq!(graph.side_rounds(BracketSide::Losers), 6);
        check_links(&graph.matches).unwrap();
    }

    #[test]
    fn duplicate_entrant_is_rejected() {
        let p = Uuid::new_v4();
        let options = BracketOptions {
            format: BracketFormat::Single,
            seeded: true,
            third_place_match: false,
            grand_finals: GrandFinalsModifier::None,
        };
        assert!(matches!(
            BracketGraph::build(Uuid::new_v4(), &[p, p], options),
            Err(TournamentError::Validation { .. })
        ));
    }
}
