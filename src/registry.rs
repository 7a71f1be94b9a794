//! In-memory store of many tournaments, one lock per tournament.

use crate::logic::get_standings;
use crate::models::{
    IntegrityIssue, Standing, Tournament, TournamentError, TournamentId, TournamentResult,
};
use log::info;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::{Duration, Instant};

/// Per-tournament entry: tournament data + last activity time (for cleanup).
struct TournamentEntry {
    tournament: Tournament,
    last_activity: Instant,
}

/// Tournaments by id. Operations on one tournament run one at a time; the map
/// lock is only held long enough to find the entry.
#[derive(Default)]
pub struct TournamentRegistry {
    entries: RwLock<HashMap<TournamentId, Arc<Mutex<TournamentEntry>>>>,
}

fn lock(entry: &Mutex<TournamentEntry>) -> MutexGuard<'_, TournamentEntry> {
    // Operations commit only on success, so a panicked holder left no partial state.
    entry.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TournamentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a tournament and return its id.
    pub fn insert(&self, tournament: Tournament) -> TournamentId {
        let id = tournament.id;
        let entry = TournamentEntry {
            tournament,
            last_activity: Instant::now(),
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(Mutex::new(entry)));
        id
    }

    pub fn remove(&self, id: TournamentId) -> Option<Tournament> {
        let entry = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)?;
        let tournament = lock(&entry).tournament.clone();
        Some(tournament)
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry(&self, id: TournamentId) -> TournamentResult<Arc<Mutex<TournamentEntry>>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or(TournamentError::DataIntegrity(
                IntegrityIssue::UnknownTournament(id),
            ))
    }

    /// Run `op` with exclusive access to one tournament. Touching it refreshes
    /// its last activity.
    pub fn with_tournament<T>(
        &self,
        id: TournamentId,
        op: impl FnOnce(&mut Tournament) -> TournamentResult<T>,
    ) -> TournamentResult<T> {
        let entry = self.entry(id)?;
        let mut guard = lock(&entry);
        guard.last_activity = Instant::now();
        op(&mut guard.tournament)
    }

    /// Copy of the tournament as it is now.
    pub fn snapshot(&self, id: TournamentId) -> TournamentResult<Tournament> {
        let entry = self.entry(id)?;
        let tournament = lock(&entry).tournament.clone();
        Ok(tournament)
    }

    /// Standings computed from a snapshot, outside the tournament lock.
    pub fn standings(&self, id: TournamentId) -> TournamentResult<Vec<Standing>> {
        get_standings(&self.snapshot(id)?)
    }

    /// Remove tournaments not touched for `max_idle`; returns how many went.
    pub fn purge_inactive(&self, max_idle: Duration) -> usize {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| lock(entry).last_activity.elapsed() < max_idle);
        let removed = before - entries.len();
        if removed > 0 {
            info!("Cleaned up {removed} inactive tournament(s)");
        }
        removed
    }
}
