//! Cost reducers.
//!
//! A `CostReducer` lowers the fate cost of playing matching cards. Its
//! gates are checked in a fixed order: limit, card type, playing type,
//! match predicate, target condition. The first gate that fails stops the
//! check.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::rc::Rc;
use tracing::debug;

use crate::abilities::{AbilityLimit, LimitKey, LimitTracker};
use crate::cards::CardType;
use crate::core::{EntityId, GameState, PlayerId};

use super::cost::PlayType;

/// Identifier of a reducer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReducerId(pub u32);

impl ReducerId {
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ReducerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Reducer({})", self.0)
    }
}

type ReducerMatch = Rc<dyn Fn(&GameState, EntityId, EntityId) -> bool>;
type TargetCondition = Rc<dyn Fn(&GameState, EntityId) -> bool>;
type AmountFn = Rc<dyn Fn(&GameState, EntityId, PlayerId) -> i32>;

/// How much a reducer takes off.
#[derive(Clone)]
pub enum ReducerAmount {
    Fixed(i32),
    /// Computed from the card being played and the player playing it.
    Computed(AmountFn),
}

impl ReducerAmount {
    fn value(&self, state: &GameState, card: EntityId, player: PlayerId) -> i32 {
        match self {
            Self::Fixed(n) => *n,
            Self::Computed(f) => f(state, card, player),
        }
    }
}

impl std::fmt::Debug for ReducerAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(n) => f.debug_tuple("Fixed").field(n).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// A conditional, possibly limited, fate cost reduction.
#[derive(Clone)]
pub struct CostReducer {
    /// Assigned by `CostReducerManager::add`.
    pub id: ReducerId,
    pub source: EntityId,
    pub card_type: Option<CardType>,
    /// Empty means any.
    pub playing_types: SmallVec<[PlayType; 2]>,
    matcher: Option<ReducerMatch>,
    target_condition: Option<TargetCondition>,
    pub amount: ReducerAmount,
    pub limit: Option<AbilityLimit>,
    shared_key: Option<u32>,
    uses: u32,
}

impl std::fmt::Debug for CostReducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CostReducer")
            .field("id", &self.id)
            .field("source", &self.source)
            .field("card_type", &self.card_type)
            .field("playing_types", &self.playing_types)
            .field("amount", &self.amount)
            .field("limit", &self.limit)
            .field("uses", &self.uses)
            .finish_non_exhaustive()
    }
}

impl CostReducer {
    pub fn new(source: EntityId, amount: ReducerAmount) -> Self {
        Self {
            id: ReducerId::default(),
            source,
            card_type: None,
            playing_types: SmallVec::new(),
            matcher: None,
            target_condition: None,
            amount,
            limit: None,
            shared_key: None,
            uses: 0,
        }
    }

    /// Reduce by a fixed amount.
    pub fn fixed(source: EntityId, amount: i32) -> Self {
        Self::new(source, ReducerAmount::Fixed(amount))
    }

    #[must_use]
    pub fn for_card_type(mut self, card_type: CardType) -> Self {
        self.card_type = Some(card_type);
        self
    }

    #[must_use]
    pub fn for_playing_type(mut self, play_type: PlayType) -> Self {
        self.playing_types.push(play_type);
        self
    }

    /// Only reduce cards for which `matcher(state, card, source)` holds.
    #[must_use]
    pub fn matching(mut self, matcher: impl Fn(&GameState, EntityId, EntityId) -> bool + 'static) -> Self {
        self.matcher = Some(Rc::new(matcher));
        self
    }

    /// Only reduce when the card is played targeting a card that
    /// satisfies `condition`.
    #[must_use]
    pub fn with_target_condition(mut self, condition: impl Fn(&GameState, EntityId) -> bool + 'static) -> Self {
        self.target_condition = Some(Rc::new(condition));
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: AbilityLimit) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Share a limit counter with every reducer using the same key.
    #[must_use]
    pub fn with_shared_limit(mut self, limit: AbilityLimit, key: u32) -> Self {
        self.limit = Some(limit);
        self.shared_key = Some(key);
        self
    }

    #[must_use]
    pub fn limit_key(&self) -> LimitKey {
        LimitKey::Reducer(self.shared_key.unwrap_or(self.id.raw()))
    }

    #[must_use]
    pub fn uses(&self) -> u32 {
        self.uses
    }

    fn limit_exhausted(&self, limits: &LimitTracker) -> bool {
        self.limit.is_some_and(|limit| limits.is_at_max(self.limit_key(), limit))
    }

    /// Whether this reducer applies to playing `card`.
    #[must_use]
    pub fn can_reduce(
        &self,
        state: &GameState,
        limits: &LimitTracker,
        play_type: PlayType,
        card: EntityId,
        target: Option<EntityId>,
    ) -> bool {
        if self.limit_exhausted(limits) {
            return false;
        }
        if let Some(card_type) = self.card_type {
            if state.card(card).map_or(true, |c| c.card_type != card_type) {
                return false;
            }
        }
        if !self.playing_types.is_empty() && !self.playing_types.contains(&play_type) {
            return false;
        }
        if let Some(matcher) = &self.matcher {
            if !matcher(state, card, self.source) {
                return false;
            }
        }
        if let Some(condition) = &self.target_condition {
            return target.is_some_and(|t| condition(state, t));
        }
        true
    }

    #[must_use]
    pub fn amount_for(&self, state: &GameState, card: EntityId, player: PlayerId) -> i32 {
        self.amount.value(state, card, player)
    }

    pub fn mark_used(&mut self, limits: &mut LimitTracker) {
        self.uses += 1;
        if let Some(limit) = self.limit {
            limits.increment(self.limit_key(), limit.scope);
        }
    }

    /// The limit is used up for good, or the source left the table.
    #[must_use]
    pub fn is_expired(&self, state: &GameState, limits: &LimitTracker) -> bool {
        let spent = self
            .limit
            .is_some_and(|limit| !limit.scope.is_repeatable() && limits.is_at_max(self.limit_key(), limit));
        let source_gone = state
            .card(self.source)
            .map_or(true, |c| !c.location.is_in_play() && !c.location.is_province());
        spent || source_gone
    }
}

/// Every player's cost reducers.
#[derive(Debug, Default)]
pub struct CostReducerManager {
    reducers: Vec<(PlayerId, CostReducer)>,
    next_id: u32,
}

impl CostReducerManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, player: PlayerId, mut reducer: CostReducer) -> ReducerId {
        let id = ReducerId(self.next_id);
        self.next_id += 1;
        reducer.id = id;
        debug!(reducer = %id, %player, source = %reducer.source, "add cost reducer");
        self.reducers.push((player, reducer));
        id
    }

    pub fn remove(&mut self, id: ReducerId) -> bool {
        let before = self.reducers.len();
        self.reducers.retain(|(_, r)| r.id != id);
        self.reducers.len() != before
    }

    pub fn remove_by_source(&mut self, source: EntityId) -> usize {
        let before = self.reducers.len();
        self.reducers.retain(|(_, r)| r.source != source);
        before - self.reducers.len()
    }

    #[must_use]
    pub fn get(&self, id: ReducerId) -> Option<&CostReducer> {
        self.reducers.iter().find(|(_, r)| r.id == id).map(|(_, r)| r)
    }

    pub fn reducers_for(&self, player: PlayerId) -> impl Iterator<Item = &CostReducer> {
        self.reducers.iter().filter(move |(p, _)| *p == player).map(|(_, r)| r)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.reducers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reducers.is_empty()
    }

    /// Total reduction for playing `card`, and the reducers that apply.
    #[must_use]
    pub fn reduction(
        &self,
        state: &GameState,
        limits: &LimitTracker,
        player: PlayerId,
        card: EntityId,
        play_type: PlayType,
        target: Option<EntityId>,
    ) -> (i32, Vec<ReducerId>) {
        let mut total = 0;
        let mut used = Vec::new();
        for reducer in self.reducers_for(player) {
            if reducer.can_reduce(state, limits, play_type, card, target) {
                total += reducer.amount_for(state, card, player);
                used.push(reducer.id);
            }
        }
        (total, used)
    }

    pub fn mark_used(&mut self, ids: &[ReducerId], limits: &mut LimitTracker) {
        for (_, reducer) in &mut self.reducers {
            if ids.contains(&reducer.id) {
                reducer.mark_used(limits);
            }
        }
    }

    /// Drop expired reducers. Returns how many were removed.
    pub fn cleanup_expired_reducers(&mut self, state: &GameState, limits: &LimitTracker) -> usize {
        let before = self.reducers.len();
        self.reducers.retain(|(_, r)| {
            let expired = r.is_expired(state, limits);
            if expired {
                debug!(reducer = %r.id, "cost reducer expired");
            }
            !expired
        });
        before - self.reducers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardDefinition, CardId};
    use crate::core::GameConfig;
    use crate::zones::Location;

    fn setup() -> (GameState, EntityId, EntityId) {
        let mut state = GameState::new(&GameConfig::default());
        let source = state.create_card(
            &CardDefinition::character(CardId::new(1), "Kakita Yoshi", 3, 2, 3),
            PlayerId::new(0),
            Location::PlayArea,
        );
        let event = state.create_card(
            &CardDefinition::event(CardId::new(2), "Way of the Crane", 1),
            PlayerId::new(0),
            Location::Hand,
        );
        (state, source, event)
    }

    #[test]
    fn test_reduction_sums_matching_reducers() {
        let (state, source, event) = setup();
        let limits = LimitTracker::new();
        let mut manager = CostReducerManager::new();
        let a = manager.add(PlayerId::new(0), CostReducer::fixed(source, 1));
        let b = manager.add(PlayerId::new(0), CostReducer::fixed(source, 2).for_card_type(CardType::Event));
        manager.add(PlayerId::new(0), CostReducer::fixed(source, 5).for_card_type(CardType::Character));
        manager.add(PlayerId::new(1), CostReducer::fixed(source, 9));

        let (total, used) = manager.reduction(&state, &limits, PlayerId::new(0), event, PlayType::PlayFromHand, None);
        assert_eq!(total, 3);
        assert_eq!(used, vec![a, b]);
    }

    #[test]
    fn test_limit_is_shared() {
        let (state, source, event) = setup();
        let mut limits = LimitTracker::new();
        let mut manager = CostReducerManager::new();
        let first = manager.add(
            PlayerId::new(0),
            CostReducer::fixed(source, 1).with_shared_limit(AbilityLimit::per_round(1), 77),
        );
        manager.add(
            PlayerId::new(0),
            CostReducer::fixed(source, 1).with_shared_limit(AbilityLimit::per_round(1), 77),
        );

        manager.mark_used(&[first], &mut limits);

        let (total, used) = manager.reduction(&state, &limits, PlayerId::new(0), event, PlayType::PlayFromHand, None);
        assert_eq!(total, 0);
        assert!(used.is_empty());
        assert_eq!(manager.get(first).unwrap().uses(), 1);
    }

    #[test]
    fn test_target_condition_requires_target() {
        let (state, source, event) = setup();
        let limits = LimitTracker::new();
        let reducer = CostReducer::fixed(source, 1).with_target_condition(move |_, t| t == source);

        assert!(!reducer.can_reduce(&state, &limits, PlayType::PlayFromHand, event, None));
        assert!(reducer.can_reduce(&state, &limits, PlayType::PlayFromHand, event, Some(source)));
    }

    #[test]
    fn test_expiry() {
        let (mut state, source, _) = setup();
        let mut limits = LimitTracker::new();
        let mut manager = CostReducerManager::new();
        let once = manager.add(
            PlayerId::new(0),
            CostReducer::fixed(source, 1).with_limit(AbilityLimit::per_game(1)),
        );
        let per_round = manager.add(
            PlayerId::new(0),
            CostReducer::fixed(source, 1).with_limit(AbilityLimit::per_round(1)),
        );
        manager.mark_used(&[once, per_round], &mut limits);

        assert_eq!(manager.cleanup_expired_reducers(&state, &limits), 1);
        assert!(manager.get(per_round).is_some());

        state.card_mut(source).unwrap().location = Location::DynastyDiscard;
        assert_eq!(manager.cleanup_expired_reducers(&state, &limits), 1);
        assert!(manager.is_empty());
    }
}
