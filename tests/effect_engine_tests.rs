//! Effect engine integration tests.
//!
//! These tests drive the `EffectEngine` directly against a `GameState` and
//! check that it settles, ends effects at the right boundaries, and fires
//! delayed effects the right number of times.

use std::rc::Rc;

use l5r_engine::actions::PlayerAction;
use l5r_engine::cards::{CardDefinition, CardId};
use l5r_engine::core::{EntityId, GameConfig, GameState, PlayerId};
use l5r_engine::effects::{DelayedEffect, Duration, EffectEngine, GameEffect, StaticModifier};
use l5r_engine::events::{EventBus, EventName, GameEvent};
use l5r_engine::zones::Location;
use proptest::prelude::*;

fn table() -> (GameState, EventBus, EntityId) {
    let mut state = GameState::new(&GameConfig::default());
    let samurai = CardDefinition::character(CardId::new(1), "Akodo Toturi", 7, 3, 5);
    let card = state.create_card(&samurai, PlayerId::new(0), Location::PlayArea);
    (state, EventBus::new(), card)
}

fn gain_honor_later(source: EntityId, duration: Duration, multiple: bool) -> GameEffect {
    let mut delayed = DelayedEffect::new("Gain 1 honor", Rc::new(PlayerAction::gain_honor(PlayerId::new(0), 1)))
        .on(EventName::CARD_BOWED, |_, _| true);
    if multiple {
        delayed = delayed.multiple_trigger();
    }
    GameEffect::delayed(source, PlayerId::new(0), delayed).with_duration(duration)
}

/// Test that an effect enabled by another effect's change is picked up in
/// the same check, and that the check stops once nothing changes.
#[test]
fn test_chained_effects_reach_fixed_point() {
    let (mut state, mut bus, card) = table();
    let mut engine = EffectEngine::new(10);

    // Depends on the bonus below, and is added first so the first pass
    // sees it switched off.
    let keeps_standing = GameEffect::modifier(card, PlayerId::new(0), StaticModifier::DoesNotBow)
        .on_card(card)
        .with_condition(|state, ctx| Ok(state.card(ctx.source).and_then(|c| c.military_skill()) >= Some(5)));
    let bonus = GameEffect::modifier(card, PlayerId::new(0), StaticModifier::ModifyMilitary(2)).on_card(card);
    let dependent = engine.add(keeps_standing, &mut bus);
    engine.add(bonus, &mut bus);

    assert!(engine.check_effects(&mut state, true), "Effects should have changed the state");
    assert_eq!(engine.last_pass_count(), 3, "Two changing passes and one settled pass");
    assert!(engine.get(dependent).unwrap().is_active());
    let instance = state.card(card).unwrap();
    assert_eq!(instance.military_skill(), Some(5));
    assert!(instance.has_modifier(|m| *m == StaticModifier::DoesNotBow));

    // Nothing changed since: no pass runs.
    assert!(!engine.check_effects(&mut state, false));
    assert_eq!(engine.last_pass_count(), 0);

    // A settled state re-checked on request changes nothing.
    assert!(!engine.check_effects(&mut state, true));
    assert_eq!(engine.last_pass_count(), 1);
}

/// Test that effects which keep toggling each other stop at the loop cap.
#[test]
fn test_oscillating_effects_stop_at_cap() {
    let (mut state, mut bus, card) = table();
    let mut engine = EffectEngine::new(4);

    // Active only while the card has no modifiers, so applying it turns it
    // off again on the next pass.
    let flicker = GameEffect::modifier(card, PlayerId::new(0), StaticModifier::ModifyPolitical(1))
        .on_card(card)
        .with_condition(|state, ctx| Ok(state.card(ctx.source).is_some_and(|c| c.modifiers.is_empty())));
    engine.add(flicker, &mut bus);

    engine.check_effects(&mut state, true);
    assert_eq!(engine.last_pass_count(), 4, "Engine should give up at the configured cap");
}

/// Test that a persistent effect survives phase and round boundaries and
/// only ends when its source leaves play.
#[test]
fn test_persistent_effect_survives_phase_end() {
    let (mut state, mut bus, card) = table();
    let mut engine = EffectEngine::default();

    let persistent = engine.add(
        GameEffect::modifier(card, PlayerId::new(0), StaticModifier::ModifyMilitary(1)).on_card(card),
        &mut bus,
    );
    let phase = engine.add(
        GameEffect::modifier(card, PlayerId::new(0), StaticModifier::ModifyMilitary(2))
            .on_card(card)
            .with_duration(Duration::UntilEndOfPhase),
        &mut bus,
    );
    engine.check_effects(&mut state, true);
    assert_eq!(state.card(card).unwrap().military_skill(), Some(6));

    assert!(engine.on_phase_ended(&mut state, &mut bus));
    assert!(engine.get(phase).is_none());
    assert!(engine.get(persistent).is_some());
    assert_eq!(state.card(card).unwrap().military_skill(), Some(4));

    assert!(!engine.on_round_ended(&mut state, &mut bus));
    assert!(!engine.on_conflict_finished(&mut state, &mut bus));
    assert!(engine.get(persistent).is_some());

    assert!(engine.remove_persistent_from_source(card, &mut state, &mut bus));
    assert!(engine.is_empty());
    assert_eq!(state.card(card).unwrap().military_skill(), Some(3));
}

/// Test that removing an effect marks the engine dirty so the next check
/// runs a pass.
#[test]
fn test_removal_marks_dirty() {
    let (mut state, mut bus, card) = table();
    let mut engine = EffectEngine::default();
    let id = engine.add(
        GameEffect::modifier(card, PlayerId::new(0), StaticModifier::ModifyGlory(1)).on_card(card),
        &mut bus,
    );
    engine.check_effects(&mut state, true);
    assert!(!engine.is_dirty());

    assert!(engine.remove(id, &mut state, &mut bus));
    assert!(engine.is_dirty());
    assert!(!engine.remove(id, &mut state, &mut bus), "Second removal finds nothing");
}

/// Test that a single-shot delayed effect fires once and is removed before
/// it fires.
#[test]
fn test_delayed_effect_fires_once() {
    let (mut state, mut bus, card) = table();
    let mut engine = EffectEngine::default();
    let id = engine.add(gain_honor_later(card, Duration::UntilEndOfRound, false), &mut bus);
    engine.check_effects(&mut state, true);

    // Two matching events in the same batch.
    let bowed = [
        GameEvent::new(EventName::CARD_BOWED).with_card(card),
        GameEvent::new(EventName::CARD_BOWED).with_card(card),
    ];
    let first = engine.check_delayed_effects(&mut state, &mut bus, &bowed);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].effect, id);
    assert!(engine.get(id).is_none(), "Single-shot effect should be gone once it fires");

    let second = engine.check_delayed_effects(&mut state, &mut bus, &bowed);
    assert!(second.is_empty());
}

/// Test that delayed effects ignore other events, and that multiple-trigger
/// and persistent delayed effects stay after firing.
#[test]
fn test_repeating_delayed_effects_stay() {
    let (mut state, mut bus, card) = table();
    let mut engine = EffectEngine::default();
    let repeating = engine.add(gain_honor_later(card, Duration::UntilEndOfRound, true), &mut bus);
    let persistent = engine.add(gain_honor_later(card, Duration::Persistent, false), &mut bus);
    engine.check_effects(&mut state, true);

    let readied = [GameEvent::new(EventName::CARD_READIED).with_card(card)];
    assert!(engine.check_delayed_effects(&mut state, &mut bus, &readied).is_empty());

    let bowed = [GameEvent::new(EventName::CARD_BOWED).with_card(card)];
    for _ in 0..3 {
        assert_eq!(engine.check_delayed_effects(&mut state, &mut bus, &bowed).len(), 2);
    }
    assert!(engine.get(repeating).is_some());
    assert!(engine.get(persistent).is_some());
}

fn pass_priority_duration() -> impl Strategy<Value = Duration> {
    prop_oneof![
        Just(Duration::UntilPassPriority),
        Just(Duration::UntilOpponentPassPriority),
        Just(Duration::UntilNextPassPriority),
    ]
}

fn other_duration() -> impl Strategy<Value = Duration> {
    prop_oneof![
        Just(Duration::Persistent),
        Just(Duration::UntilEndOfPhase),
        Just(Duration::UntilEndOfRound),
        Just(Duration::UntilEndOfConflict),
        Just(Duration::UntilEndOfDuel),
    ]
}

/// Passes of priority needed to end a pass-priority duration.
fn passes_to_end(duration: Duration) -> usize {
    match duration {
        Duration::UntilPassPriority => 1,
        Duration::UntilOpponentPassPriority => 2,
        Duration::UntilNextPassPriority => 3,
        _ => usize::MAX,
    }
}

proptest! {
    /// Test that a pass-priority effect ends after exactly as many passes
    /// as its escalation chain is long.
    #[test]
    fn test_pass_priority_escalation(duration in pass_priority_duration(), passes in 0usize..6) {
        let (mut state, mut bus, card) = table();
        let mut engine = EffectEngine::default();
        let id = engine.add(
            GameEffect::modifier(card, PlayerId::new(0), StaticModifier::ModifyMilitary(1))
                .on_card(card)
                .with_duration(duration),
            &mut bus,
        );
        engine.check_effects(&mut state, true);

        for _ in 0..passes {
            engine.on_pass_priority(&mut state, &mut bus);
        }

        let alive = passes < passes_to_end(duration);
        prop_assert_eq!(engine.get(id).is_some(), alive);
        let expected = if alive { 4 } else { 3 };
        prop_assert_eq!(state.card(card).unwrap().military_skill(), Some(expected));
    }

    /// Test that passing priority never ends or changes other durations.
    #[test]
    fn test_pass_priority_leaves_other_durations(duration in other_duration(), passes in 1usize..6) {
        let (mut state, mut bus, card) = table();
        let mut engine = EffectEngine::default();
        let id = engine.add(
            GameEffect::modifier(card, PlayerId::new(0), StaticModifier::ModifyMilitary(1))
                .on_card(card)
                .with_duration(duration),
            &mut bus,
        );
        for _ in 0..passes {
            prop_assert!(!engine.on_pass_priority(&mut state, &mut bus));
        }
        prop_assert_eq!(engine.get(id).map(|e| e.duration), Some(duration));
    }
}
