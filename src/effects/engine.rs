//! The effect engine.
//!
//! Owns every live `GameEffect` and keeps their application consistent
//! with the game state. `check_effects` runs passes until no effect's
//! condition or target list changes; a pass that changes something can
//! enable or disable other effects, so the engine loops, up to a fixed
//! cap.
//!
//! Durations end through the boundary handlers (`on_phase_ended`,
//! `on_round_ended`, ...) which the game calls as the matching events
//! resolve. Custom durations end through event bus subscriptions.

use tracing::{debug, error};

use crate::core::{EntityId, GameState};
use crate::events::{EventBus, GameEvent, Listener};

use super::effect::{DelayedFiring, Duration, EffectId, GameEffect};

/// Every live effect, in creation order.
#[derive(Debug)]
pub struct EffectEngine {
    effects: Vec<GameEffect>,
    next_id: u32,
    next_timestamp: u64,
    max_loops: u32,
    /// Something changed since the last settled check.
    dirty: bool,
    last_pass_count: u32,
}

impl Default for EffectEngine {
    fn default() -> Self {
        Self::new(10)
    }
}

impl EffectEngine {
    #[must_use]
    pub fn new(max_loops: u32) -> Self {
        Self {
            effects: Vec::new(),
            next_id: 1,
            next_timestamp: 0,
            max_loops: max_loops.max(1),
            dirty: false,
            last_pass_count: 0,
        }
    }

    // === Registry ===

    /// Register an effect. It applies on the next `check_effects`.
    pub fn add(&mut self, mut effect: GameEffect, bus: &mut EventBus) -> EffectId {
        let id = EffectId::new(self.next_id);
        self.next_id += 1;
        effect.id = id;
        effect.timestamp = self.next_timestamp;
        self.next_timestamp += 1;

        if effect.duration == Duration::Custom {
            effect.subscribe(bus, |predicate| Listener::ExpireEffect { effect: id, predicate });
        }

        debug!(effect = %id, source = %effect.source(), duration = ?effect.duration, "add effect");
        self.effects.push(effect);
        self.dirty = true;
        id
    }

    #[must_use]
    pub fn effects(&self) -> &[GameEffect] {
        &self.effects
    }

    #[must_use]
    pub fn get(&self, id: EffectId) -> Option<&GameEffect> {
        self.effects.iter().find(|e| e.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Force the next `check_effects` to run a pass.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Passes run by the last `check_effects`.
    #[must_use]
    pub fn last_pass_count(&self) -> u32 {
        self.last_pass_count
    }

    // === Fixed point ===

    /// Re-evaluate every effect until nothing changes. Returns whether any
    /// pass changed something.
    ///
    /// Does nothing unless the state changed or an effect was added or
    /// removed since the last check.
    pub fn check_effects(&mut self, state: &mut GameState, state_changed: bool) -> bool {
        if !state_changed && !self.dirty {
            self.last_pass_count = 0;
            return false;
        }
        let mut changed_any = false;
        let mut passes = 0;

        loop {
            if passes >= self.max_loops {
                error!(passes, effects = self.effects.len(), "effect engine did not settle");
                break;
            }
            passes += 1;

            let mut changed = false;
            for effect in &mut self.effects {
                match effect.check_condition(state) {
                    Ok(c) => changed |= c,
                    Err(err) => error!(effect = %effect.id, %err, "effect condition failed"),
                }
            }
            changed_any |= changed;
            if !changed {
                break;
            }
        }

        self.last_pass_count = passes;
        self.dirty = false;
        changed_any
    }

    // === Removal ===

    /// Cancel and remove every effect matching `pred`. Returns whether any
    /// was removed.
    pub fn unapply_and_remove(
        &mut self,
        state: &mut GameState,
        bus: &mut EventBus,
        mut pred: impl FnMut(&GameEffect) -> bool,
    ) -> bool {
        let mut removed = false;
        let mut kept = Vec::with_capacity(self.effects.len());
        for mut effect in std::mem::take(&mut self.effects) {
            if pred(&effect) {
                debug!(effect = %effect.id, duration = ?effect.duration, "remove effect");
                effect.cancel(state, bus);
                removed = true;
            } else {
                kept.push(effect);
            }
        }
        self.effects = kept;
        self.dirty |= removed;
        removed
    }

    pub fn remove(&mut self, id: EffectId, state: &mut GameState, bus: &mut EventBus) -> bool {
        self.unapply_and_remove(state, bus, |e| e.id == id)
    }

    /// Persistent effects end when their source leaves play.
    pub fn remove_persistent_from_source(&mut self, source: EntityId, state: &mut GameState, bus: &mut EventBus) -> bool {
        self.unapply_and_remove(state, bus, |e| e.duration == Duration::Persistent && e.source() == source)
    }

    // === Duration boundaries ===

    pub fn on_phase_ended(&mut self, state: &mut GameState, bus: &mut EventBus) -> bool {
        self.unapply_and_remove(state, bus, |e| e.duration == Duration::UntilEndOfPhase)
    }

    pub fn on_round_ended(&mut self, state: &mut GameState, bus: &mut EventBus) -> bool {
        self.unapply_and_remove(state, bus, |e| e.duration == Duration::UntilEndOfRound)
    }

    pub fn on_conflict_finished(&mut self, state: &mut GameState, bus: &mut EventBus) -> bool {
        self.unapply_and_remove(state, bus, |e| e.duration == Duration::UntilEndOfConflict)
    }

    pub fn on_duel_finished(&mut self, state: &mut GameState, bus: &mut EventBus) -> bool {
        self.unapply_and_remove(state, bus, |e| e.duration == Duration::UntilEndOfDuel)
    }

    /// A player passed priority: "until pass" effects end, the others move
    /// one step closer to ending.
    pub fn on_pass_priority(&mut self, state: &mut GameState, bus: &mut EventBus) -> bool {
        let removed = self.unapply_and_remove(state, bus, |e| e.duration == Duration::UntilPassPriority);
        for effect in &mut self.effects {
            effect.duration = effect.duration.escalate();
        }
        removed
    }

    // === Delayed effects ===

    /// Delayed effects that fire for this batch of events. Single-shot
    /// effects are removed before they fire.
    pub fn check_delayed_effects(
        &mut self,
        state: &mut GameState,
        bus: &mut EventBus,
        events: &[GameEvent],
    ) -> Vec<DelayedFiring> {
        let firings: Vec<DelayedFiring> = self
            .effects
            .iter()
            .filter(|e| e.is_active())
            .filter_map(|e| e.delayed_firing(state, events))
            .collect();
        if firings.is_empty() {
            return firings;
        }

        let single_shot: Vec<EffectId> = firings
            .iter()
            .map(|f| f.effect)
            .filter(|id| self.get(*id).is_some_and(GameEffect::is_single_shot))
            .collect();
        if !single_shot.is_empty() {
            debug!(count = single_shot.len(), "remove fired delayed effects");
            self.unapply_and_remove(state, bus, |e| single_shot.contains(&e.id));
        }
        firings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardDefinition, CardId};
    use crate::core::{ConditionError, GameConfig, PlayerId};
    use crate::effects::StaticModifier;
    use crate::events::EventName;
    use crate::zones::Location;

    fn setup() -> (GameState, EventBus, EntityId) {
        let mut state = GameState::new(&GameConfig::default());
        let def = CardDefinition::character(CardId::new(1), "Doji Whisperer", 3, 0, 3);
        let id = state.create_card(&def, PlayerId::new(0), Location::PlayArea);
        (state, EventBus::new(), id)
    }

    fn plus_one(card: EntityId) -> GameEffect {
        GameEffect::modifier(card, PlayerId::new(0), StaticModifier::ModifyPolitical(1)).on_card(card)
    }

    #[test]
    fn test_add_assigns_ids_and_marks_dirty() {
        let (_, mut bus, card) = setup();
        let mut engine = EffectEngine::new(10);

        let first = engine.add(plus_one(card), &mut bus);
        let second = engine.add(plus_one(card), &mut bus);

        assert_ne!(first, second);
        assert!(engine.is_dirty());
        assert!(engine.get(first).unwrap().timestamp < engine.get(second).unwrap().timestamp);
    }

    #[test]
    fn test_check_effects_settles() {
        let (mut state, mut bus, card) = setup();
        let mut engine = EffectEngine::new(10);
        engine.add(plus_one(card), &mut bus);

        assert!(engine.check_effects(&mut state, true));
        assert_eq!(state.card(card).unwrap().political_skill(), Some(4));
        assert_eq!(engine.last_pass_count(), 2);
        assert!(!engine.is_dirty());

        assert!(!engine.check_effects(&mut state, true));
        assert_eq!(engine.last_pass_count(), 1);

        // Clean and nothing changed: no pass at all.
        assert!(!engine.check_effects(&mut state, false));
        assert_eq!(engine.last_pass_count(), 0);
    }

    #[test]
    fn test_phase_end_removes_only_phase_effects() {
        let (mut state, mut bus, card) = setup();
        let mut engine = EffectEngine::new(10);
        engine.add(plus_one(card).with_duration(Duration::UntilEndOfPhase), &mut bus);
        engine.add(plus_one(card).with_duration(Duration::UntilEndOfRound), &mut bus);
        engine.check_effects(&mut state, true);
        assert_eq!(state.card(card).unwrap().political_skill(), Some(5));

        assert!(engine.on_phase_ended(&mut state, &mut bus));
        assert_eq!(engine.len(), 1);
        assert_eq!(state.card(card).unwrap().political_skill(), Some(4));
        assert!(engine.is_dirty());

        assert!(!engine.on_phase_ended(&mut state, &mut bus));
    }

    #[test]
    fn test_pass_priority_escalates() {
        let (mut state, mut bus, card) = setup();
        let mut engine = EffectEngine::new(10);
        let id = engine.add(plus_one(card).with_duration(Duration::UntilNextPassPriority), &mut bus);

        assert!(!engine.on_pass_priority(&mut state, &mut bus));
        assert_eq!(engine.get(id).unwrap().duration, Duration::UntilOpponentPassPriority);
        assert!(!engine.on_pass_priority(&mut state, &mut bus));
        assert_eq!(engine.get(id).unwrap().duration, Duration::UntilPassPriority);
        assert!(engine.on_pass_priority(&mut state, &mut bus));
        assert!(engine.get(id).is_none());
    }

    #[test]
    fn test_custom_duration_subscribes() {
        let (mut state, mut bus, card) = setup();
        let mut engine = EffectEngine::new(10);
        let id = engine.add(plus_one(card).until(EventName::CARD_BOWED, |_, _| true), &mut bus);
        assert_eq!(bus.listener_count(&EventName::CARD_BOWED), 1);

        engine.remove(id, &mut state, &mut bus);
        assert!(bus.is_empty());
    }

    #[test]
    fn test_loop_cap_is_respected() {
        let (mut state, mut bus, card) = setup();
        let mut engine = EffectEngine::new(3);
        // Two effects that switch each other on and off never settle.
        engine.add(
            GameEffect::modifier(card, PlayerId::new(0), StaticModifier::DoesNotBow)
                .on_card(card)
                .with_condition(|state, ctx| {
                    let card = state.card(ctx.source).ok_or(ConditionError::MissingCard(ctx.source))?;
                    Ok(!card.has_modifier(|m| *m == StaticModifier::ModifyGlory(1)))
                }),
            &mut bus,
        );
        engine.add(
            GameEffect::modifier(card, PlayerId::new(0), StaticModifier::ModifyGlory(1))
                .on_card(card)
                .with_condition(|state, ctx| {
                    let card = state.card(ctx.source).ok_or(ConditionError::MissingCard(ctx.source))?;
                    Ok(card.has_modifier(|m| *m == StaticModifier::DoesNotBow))
                }),
            &mut bus,
        );

        engine.check_effects(&mut state, true);
        assert_eq!(engine.last_pass_count(), 3);
    }

    #[test]
    fn test_persistent_removed_with_source() {
        let (mut state, mut bus, card) = setup();
        let mut engine = EffectEngine::new(10);
        engine.add(plus_one(card), &mut bus);
        engine.add(plus_one(card).with_duration(Duration::UntilEndOfRound), &mut bus);
        engine.check_effects(&mut state, true);

        assert!(engine.remove_persistent_from_source(card, &mut state, &mut bus));
        assert_eq!(engine.len(), 1);
    }
}
