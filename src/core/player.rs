//! Players and per-player storage.
//!
//! ## PlayerId
//!
//! L5R is a two-player game, so every player has exactly one opponent.
//!
//! ## PlayerMap
//!
//! `Vec`-backed per-player storage indexed by `PlayerId`.
//!
//! ## PlayerState
//!
//! Honor, fate, conflict opportunities and player-level modifiers.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::ops::{Index, IndexMut};

use crate::effects::{EffectId, StaticModifier};
use crate::rings::ConflictType;

/// Player identifier. The first player is `PlayerId(0)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The other player in a two-player game.
    ///
    /// ```
    /// use l5r_engine::core::PlayerId;
    ///
    /// assert_eq!(PlayerId::new(0).opponent(), PlayerId::new(1));
    /// assert_eq!(PlayerId::new(1).opponent(), PlayerId::new(0));
    /// ```
    #[must_use]
    pub const fn opponent(self) -> Self {
        Self(self.0 ^ 1)
    }

    /// Iterate over all player IDs.
    pub fn all(player_count: usize) -> impl Iterator<Item = PlayerId> {
        (0..player_count as u8).map(PlayerId)
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Player {}", self.0)
    }
}

/// Per-player data with O(1) access.
///
/// ```
/// use l5r_engine::core::{PlayerId, PlayerMap};
///
/// let mut honor: PlayerMap<i32> = PlayerMap::new(2, |_| 10);
/// honor[PlayerId::new(1)] -= 1;
/// assert_eq!(honor[PlayerId::new(1)], 9);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerMap<T> {
    data: Vec<T>,
}

impl<T> PlayerMap<T> {
    /// Create a map with values from a factory.
    pub fn new(player_count: usize, factory: impl Fn(PlayerId) -> T) -> Self {
        assert!(player_count > 0, "Must have at least 1 player");
        assert!(player_count <= 255, "At most 255 players supported");

        Self {
            data: (0..player_count as u8).map(|i| factory(PlayerId(i))).collect(),
        }
    }

    pub fn with_default(player_count: usize) -> Self
    where
        T: Default,
    {
        Self::new(player_count, |_| T::default())
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn get(&self, player: PlayerId) -> &T {
        &self.data[player.index()]
    }

    pub fn get_mut(&mut self, player: PlayerId) -> &mut T {
        &mut self.data[player.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &T)> {
        self.data
            .iter()
            .enumerate()
            .map(|(i, v)| (PlayerId(i as u8), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (PlayerId, &mut T)> {
        self.data
            .iter_mut()
            .enumerate()
            .map(|(i, v)| (PlayerId(i as u8), v))
    }

    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> {
        (0..self.data.len() as u8).map(PlayerId)
    }
}

impl<T> Index<PlayerId> for PlayerMap<T> {
    type Output = T;

    fn index(&self, player: PlayerId) -> &Self::Output {
        self.get(player)
    }
}

impl<T> IndexMut<PlayerId> for PlayerMap<T> {
    fn index_mut(&mut self, player: PlayerId) -> &mut Self::Output {
        self.get_mut(player)
    }
}

/// Mutable per-player game state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub name: String,
    pub honor: i32,
    pub fate: i32,

    /// Disconnected players auto-pass triggered ability windows.
    pub disconnected: bool,

    /// Remaining declarations per conflict type this round.
    pub military_opportunities: u8,
    pub political_opportunities: u8,

    /// Forfeits every remaining conflict opportunity this round.
    pub passed_conflict: bool,

    /// Modifiers applied to this player by active effects.
    pub modifiers: SmallVec<[(EffectId, StaticModifier); 2]>,
}

impl PlayerState {
    #[must_use]
    pub fn new(name: impl Into<String>, honor: i32, fate: i32) -> Self {
        Self {
            name: name.into(),
            honor,
            fate,
            disconnected: false,
            military_opportunities: 1,
            political_opportunities: 1,
            passed_conflict: false,
            modifiers: SmallVec::new(),
        }
    }

    /// Can this player still declare a conflict of the given type?
    #[must_use]
    pub fn has_opportunity(&self, conflict_type: ConflictType) -> bool {
        match conflict_type {
            ConflictType::Military => self.military_opportunities > 0,
            ConflictType::Political => self.political_opportunities > 0,
        }
    }

    /// Consume a declaration of the given type.
    pub fn use_opportunity(&mut self, conflict_type: ConflictType) {
        match conflict_type {
            ConflictType::Military => {
                self.military_opportunities = self.military_opportunities.saturating_sub(1)
            }
            ConflictType::Political => {
                self.political_opportunities = self.political_opportunities.saturating_sub(1)
            }
        }
    }

    #[must_use]
    pub fn has_any_opportunity(&self) -> bool {
        !self.passed_conflict
            && (self.military_opportunities > 0 || self.political_opportunities > 0)
    }

    /// Reset conflict bookkeeping at the start of a round.
    pub fn reset_opportunities(&mut self) {
        self.military_opportunities = 1;
        self.political_opportunities = 1;
        self.passed_conflict = false;
    }

    pub fn has_modifier(&self, check: impl Fn(&StaticModifier) -> bool) -> bool {
        self.modifiers.iter().any(|(_, m)| check(m))
    }
}
