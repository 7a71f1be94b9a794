//! Swiss pairing engine: one round of pairings from standings and history.
//!
//! Players are grouped by match points, highest first; the standings order
//! only ranks players within a group. The highest unpaired player is matched
//! with the next highest player they have not met; when their group has
//! nobody left, the search moves on into the next lower group (a float) and
//! backtracks on dead ends.

use crate::models::{
    GameMatch, PairingConflict, Player, PlayerId, Standing, TournamentError, TournamentResult,
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Upper bound on search nodes visited for one round, shared by every bye
/// candidate. A pool in which nearly everyone has met can otherwise make
/// backtracking exponential; past this bound the round is reported as
/// `PairingConflict::SearchLimit`. Each node also runs an O(n^2) dead-end
/// check, so a round costs at most `MAX_SEARCH_STEPS * n^2` comparisons.
pub const MAX_SEARCH_STEPS: usize = 250_000;

/// Whether the engine may fall back to a rematch when no clean pairing exists.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RematchPolicy {
    #[default]
    Forbid,
    /// Explicit organizer authorization: pair the least recent rematch instead of failing.
    AllowLeastRecent,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PairingOptions {
    pub use_seeds_for_byes: bool,
    pub rematch_policy: RematchPolicy,
}

/// Output of the engine for one round (players only, no results).
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RoundPairing {
    pub round: u32,
    /// Table order: highest-ranked pairing first.
    pub pairs: Vec<(PlayerId, PlayerId)>,
    pub bye: Option<PlayerId>,
    /// Players paired below their own score group.
    pub floated: Vec<PlayerId>,
    /// Rematches accepted under `RematchPolicy::AllowLeastRecent`.
    pub forced_rematches: Vec<(PlayerId, PlayerId)>,
}

impl RoundPairing {
    pub fn used_fallback(&self) -> bool {
        !self.forced_rematches.is_empty()
    }
}

/// Who has met whom (and when), and who has had byes.
#[derive(Clone, Debug, Default)]
pub struct PairingHistory {
    last_met: HashMap<(PlayerId, PlayerId), u32>,
    byes: HashMap<PlayerId, u32>,
}

fn ordered(a: PlayerId, b: PlayerId) -> (PlayerId, PlayerId) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

impl PairingHistory {
    /// Build from every match created so far, played or not.
    pub fn from_matches(matches: &[GameMatch]) -> Self {
        let mut history = Self::default();
        for m in matches {
            match (m.player_1, m.player_2) {
                (Some(a), Some(b)) => {
                    let round = history.last_met.entry(ordered(a, b)).or_insert(m.round);
                    *round = (*round).max(m.round);
                }
                (Some(p), None) | (None, Some(p)) if m.bye => {
                    *history.byes.entry(p).or_insert(0) += 1;
                }
                _ => {}
            }
        }
        history
    }

    pub fn have_met(&self, a: PlayerId, b: PlayerId) -> bool {
        self.last_met.contains_key(&ordered(a, b))
    }

    /// Round of the most recent meeting.
    pub fn last_met(&self, a: PlayerId, b: PlayerId) -> Option<u32> {
        self.last_met.get(&ordered(a, b)).copied()
    }

    pub fn byes(&self, player: PlayerId) -> u32 {
        self.byes.get(&player).copied().unwrap_or(0)
    }
}

struct Entry {
    id: PlayerId,
    points: u32,
    seed_key: (u32, PlayerId),
}

/// Pair one Swiss round.
///
/// `standings` must be in rank order; dropped players are skipped here. The
/// result is fully deterministic for a given input.
pub fn pair_round(
    round: u32,
    standings: &[Standing],
    players: &[Player],
    history: &PairingHistory,
    options: PairingOptions,
) -> TournamentResult<RoundPairing> {
    let seeds: HashMap<PlayerId, (u32, PlayerId)> =
        players.iter().map(|p| (p.id, p.seed_key())).collect();
    let mut pool: Vec<Entry> = standings
        .iter()
        .filter(|s| s.active)
        .map(|s| -> TournamentResult<Entry> {
            let seed_key = seeds
                .get(&s.player_id)
                .copied()
                .ok_or(TournamentError::unknown_player(s.player_id))?;
            Ok(Entry {
                id: s.player_id,
                points: s.match_points,
                seed_key,
            })
        })
        .collect::<TournamentResult<Vec<_>>>()?;
    // Stable: the tiebreak order survives inside each score group.
    pool.sort_by(|a, b| b.points.cmp(&a.points));

    if pool.len() < 2 {
        return Err(TournamentError::NotEnoughPlayers {
            required: 2,
            actual: pool.len(),
        });
    }

    let candidates: Vec<Option<usize>> = if pool.len() % 2 == 1 {
        bye_candidates(&pool, history, options.use_seeds_for_byes)
            .into_iter()
            .map(Some)
            .collect()
    } else {
        vec![None]
    };

    let mut steps = 0;
    let mut first_failure = None;
    for &bye in &candidates {
        let remaining = without(&pool, bye);
        match search(&remaining, history, false, &mut steps) {
            Ok(pairs) => {
                return Ok(finish(round, &remaining, pairs, bye.map(|b| pool[b].id), history));
            }
            Err(conflict) => {
                debug!("round {round}: no clean pairing with bye {:?}", bye.map(|b| pool[b].id));
                first_failure.get_or_insert(conflict);
            }
        }
    }

    let conflict = first_failure.unwrap_or(PairingConflict::NoRematchFreePairing { pool: Vec::new() });
    if options.rematch_policy == RematchPolicy::AllowLeastRecent {
        // With rematches allowed every partner is legal, so each candidate
        // pairs on the first descent; keep the one with the fewest rematches.
        let mut best: Option<RoundPairing> = None;
        for &bye in &candidates {
            let remaining = without(&pool, bye);
            let mut fallback_steps = 0;
            if let Ok(pairs) = search(&remaining, history, true, &mut fallback_steps) {
                let pairing = finish(round, &remaining, pairs, bye.map(|b| pool[b].id), history);
                if best
                    .as_ref()
                    .map_or(true, |b| pairing.forced_rematches.len() < b.forced_rematches.len())
                {
                    best = Some(pairing);
                }
            }
        }
        if let Some(pairing) = best {
            warn!(
                "round {round}: paired with {} forced rematch(es) ({conflict})",
                pairing.forced_rematches.len()
            );
            return Ok(pairing);
        }
    }
    Err(TournamentError::PairingImpossible { round, conflict })
}

fn without(pool: &[Entry], bye: Option<usize>) -> Vec<&Entry> {
    pool.iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != bye)
        .map(|(_, e)| e)
        .collect()
}

/// Bye candidates in preference order. Only players with the fewest byes so
/// far are eligible, so nobody gets a second bye while a zero-bye player
/// remains.
fn bye_candidates(pool: &[Entry], history: &PairingHistory, use_seeds: bool) -> Vec<usize> {
    let fewest = pool.iter().map(|e| history.byes(e.id)).min().unwrap_or(0);
    // Reverse rank order: the lowest-ranked player comes first.
    let mut tier: Vec<usize> = (0..pool.len())
        .rev()
        .filter(|&i| history.byes(pool[i].id) == fewest)
        .collect();
    if use_seeds {
        // Weakest seed first; stable, so rank still breaks equal seeds.
        tier.sort_by(|&a, &b| pool[b].seed_key.0.cmp(&pool[a].seed_key.0));
    }
    tier
}

struct Search<'a> {
    pool: &'a [&'a Entry],
    history: &'a PairingHistory,
    allow_rematch: bool,
    steps: usize,
}

/// Depth-first pairing of the whole pool; returns index pairs into `pool`.
///
/// The first complete pairing wins. Unplayed partners are tried before
/// rematches at every step, which keeps rematches late in the table but does
/// not guarantee the fewest of them within one bye candidate. `steps` carries
/// the node count across calls.
fn search(
    pool: &[&Entry],
    history: &PairingHistory,
    allow_rematch: bool,
    steps: &mut usize,
) -> Result<Vec<(usize, usize)>, PairingConflict> {
    if !allow_rematch {
        if let Some(conflict) = exhausted_player(pool, history) {
            return Err(conflict);
        }
    }
    let mut s = Search {
        pool,
        history,
        allow_rematch,
        steps: *steps,
    };
    let mut paired = vec![false; pool.len()];
    let mut out = Vec::with_capacity(pool.len() / 2);
    let outcome = s.pair_from(&mut paired, &mut out);
    *steps = s.steps;
    match outcome {
        Ok(true) => Ok(out),
        Ok(false) => Err(PairingConflict::NoRematchFreePairing {
            pool: pool.iter().map(|e| e.id).collect(),
        }),
        Err(steps) => Err(PairingConflict::SearchLimit { steps }),
    }
}

/// A player who has already met everyone else in the pool.
fn exhausted_player(pool: &[&Entry], history: &PairingHistory) -> Option<PairingConflict> {
    pool.iter().find_map(|e| {
        let others: Vec<PlayerId> = pool.iter().filter(|o| o.id != e.id).map(|o| o.id).collect();
        let stuck = others.iter().all(|&o| history.have_met(e.id, o));
        stuck.then(|| PairingConflict::Exhausted {
            player: e.id,
            already_played: others,
        })
    })
}

impl Search<'_> {
    fn pair_from(
        &mut self,
        paired: &mut [bool],
        out: &mut Vec<(usize, usize)>,
    ) -> Result<bool, usize> {
        let Some(first) = paired.iter().position(|p| !p) else {
            return Ok(true);
        };
        if !self.allow_rematch && self.has_dead_end(paired) {
            return Ok(false);
        }
        paired[first] = true;
        for partner in self.partners(paired, first) {
            self.steps += 1;
            if self.steps > MAX_SEARCH_STEPS {
                return Err(self.steps);
            }
            paired[partner] = true;
            out.push((first, partner));
            if self.pair_from(paired, out)? {
                return Ok(true);
            }
            out.pop();
            paired[partner] = false;
        }
        paired[first] = false;
        Ok(false)
    }

    /// Candidates for `first`, best first: unplayed opponents in rank order,
    /// then (only when allowed) rematches, least recent first.
    fn partners(&self, paired: &[bool], first: usize) -> Vec<usize> {
        let me = self.pool[first].id;
        let (mut fresh, mut repeat): (Vec<usize>, Vec<usize>) = (first + 1..self.pool.len())
            .filter(|&j| !paired[j])
            .partition(|&j| !self.history.have_met(me, self.pool[j].id));
        if self.allow_rematch {
            repeat.sort_by_key(|&j| self.history.last_met(me, self.pool[j].id));
            fresh.append(&mut repeat);
        }
        fresh
    }

    /// Some unpaired player has no legal partner left.
    fn has_dead_end(&self, paired: &[bool]) -> bool {
        let open: Vec<usize> = (0..self.pool.len()).filter(|&i| !paired[i]).collect();
        open.iter().any(|&i| {
            !open
                .iter()
                .any(|&j| j != i && !self.history.have_met(self.pool[i].id, self.pool[j].id))
        })
    }
}

fn finish(
    round: u32,
    pool: &[&Entry],
    pairs: Vec<(usize, usize)>,
    bye: Option<PlayerId>,
    history: &PairingHistory,
) -> RoundPairing {
    let mut pairing = RoundPairing {
        round,
        bye,
        ..RoundPairing::default()
    };
    for (a, b) in pairs {
        let (hi, lo) = (pool[a], pool[b]);
        if hi.points != lo.points {
            pairing.floated.push(hi.id);
        }
        if history.have_met(hi.id, lo.id) {
            pairing.forced_rematches.push((hi.id, lo.id));
        }
        pairing.pairs.push((hi.id, lo.id));
    }
    pairing
}
