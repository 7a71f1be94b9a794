//! Player data structure.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a player (used in matches and lookups).
pub type PlayerId = Uuid;

/// A registered player.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Seeding used for byes and bracket placement. Lower is stronger; 0 means unseeded.
    #[serde(default)]
    pub seed: u32,
    /// False once the player has dropped. Their matches stay in the history.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Player {
    /// Create a new active, unseeded player with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            seed: 0,
            active: true,
        }
    }

    pub fn with_seed(name: impl Into<String>, seed: u32) -> Self {
        Self {
            seed,
            ..Self::new(name)
        }
    }

    /// Mark the player as dropped.
    pub fn drop_out(&mut self) {
        self.active = false;
    }

    pub fn reinstate(&mut self) {
        self.active = true;
    }

    /// Ordering key for residual ties: seeded players first by seed, then unseeded, then id.
    pub fn seed_key(&self) -> (u32, PlayerId) {
        let seed = if self.seed == 0 { u32::MAX } else { self.seed };
        (seed, self.id)
    }
}
