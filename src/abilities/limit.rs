//! Usage limits.
//!
//! "Limit once per round", "max 1 per conflict" and cost reducer limits
//! are all counters in a `LimitTracker`, keyed by what is being limited and
//! reset when their scope ends. Reducers that share a limit share a key.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cards::CardId;
use crate::core::{EntityId, PlayerId};

use super::ability::AbilityId;

/// When a limit's counter resets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LimitScope {
    Conflict,
    Phase,
    Round,
    /// Never resets.
    Game,
}

impl LimitScope {
    /// Whether the counter resets at some boundary.
    #[must_use]
    pub const fn is_repeatable(self) -> bool {
        !matches!(self, Self::Game)
    }
}

/// A usage cap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityLimit {
    pub max: u32,
    pub scope: LimitScope,
}

impl AbilityLimit {
    #[must_use]
    pub const fn new(max: u32, scope: LimitScope) -> Self {
        Self { max, scope }
    }

    #[must_use]
    pub const fn per_conflict(max: u32) -> Self {
        Self::new(max, LimitScope::Conflict)
    }

    #[must_use]
    pub const fn per_phase(max: u32) -> Self {
        Self::new(max, LimitScope::Phase)
    }

    #[must_use]
    pub const fn per_round(max: u32) -> Self {
        Self::new(max, LimitScope::Round)
    }

    #[must_use]
    pub const fn per_game(max: u32) -> Self {
        Self::new(max, LimitScope::Game)
    }
}

/// What a counter belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LimitKey {
    /// One card's copy of an ability.
    Ability(EntityId, AbilityId),
    /// An ability across every copy of a card a player uses.
    Max(PlayerId, CardId, AbilityId),
    /// A cost reducer limit, possibly shared between reducers.
    Reducer(u32),
}

#[derive(Clone, Copy, Debug)]
struct Counter {
    used: u32,
    scope: LimitScope,
}

/// Usage counters.
#[derive(Clone, Debug, Default)]
pub struct LimitTracker {
    counters: FxHashMap<LimitKey, Counter>,
}

impl LimitTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn uses(&self, key: LimitKey) -> u32 {
        self.counters.get(&key).map_or(0, |c| c.used)
    }

    #[must_use]
    pub fn is_at_max(&self, key: LimitKey, limit: AbilityLimit) -> bool {
        self.uses(key) >= limit.max
    }

    pub fn increment(&mut self, key: LimitKey, scope: LimitScope) {
        let counter = self.counters.entry(key).or_insert(Counter { used: 0, scope });
        counter.used += 1;
    }

    /// Reset every counter of a scope.
    pub fn reset_scope(&mut self, scope: LimitScope) {
        self.counters.retain(|_, counter| counter.scope != scope);
    }

    /// Forget the counters of a card (it left play and is a new object).
    pub fn clear_card(&mut self, card: EntityId) {
        self.counters
            .retain(|key, _| !matches!(key, LimitKey::Ability(owner, _) if *owner == card));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_up_to_max() {
        let mut limits = LimitTracker::new();
        let key = LimitKey::Ability(EntityId(5), AbilityId::new(0));
        let limit = AbilityLimit::per_round(2);

        assert!(!limits.is_at_max(key, limit));
        limits.increment(key, limit.scope);
        assert!(!limits.is_at_max(key, limit));
        limits.increment(key, limit.scope);
        assert!(limits.is_at_max(key, limit));
        assert_eq!(limits.uses(key), 2);
    }

    #[test]
    fn test_reset_only_matching_scope() {
        let mut limits = LimitTracker::new();
        let round = LimitKey::Reducer(1);
        let conflict = LimitKey::Reducer(2);
        limits.increment(round, LimitScope::Round);
        limits.increment(conflict, LimitScope::Conflict);

        limits.reset_scope(LimitScope::Conflict);

        assert_eq!(limits.uses(round), 1);
        assert_eq!(limits.uses(conflict), 0);
    }

    #[test]
    fn test_game_scope_never_repeats() {
        assert!(!LimitScope::Game.is_repeatable());
        assert!(LimitScope::Phase.is_repeatable());
    }

    #[test]
    fn test_clear_card() {
        let mut limits = LimitTracker::new();
        let mine = LimitKey::Ability(EntityId(5), AbilityId::new(0));
        let other = LimitKey::Ability(EntityId(6), AbilityId::new(0));
        let max = LimitKey::Max(PlayerId::new(0), CardId::new(9), AbilityId::new(0));
        limits.increment(mine, LimitScope::Round);
        limits.increment(other, LimitScope::Round);
        limits.increment(max, LimitScope::Round);

        limits.clear_card(EntityId(5));

        assert_eq!(limits.uses(mine), 0);
        assert_eq!(limits.uses(other), 1);
        assert_eq!(limits.uses(max), 1);
    }
}
