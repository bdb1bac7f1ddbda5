//! Ability window integration tests.
//!
//! These tests register triggered abilities on cards, raise events through
//! a `Game`, and check the order abilities resolve in and the prompts the
//! players see along the way.

use std::cell::RefCell;
use std::rc::Rc;

use l5r_engine::abilities::{AbilityType, CardAbility};
use l5r_engine::cards::{CardDefinition, CardId, CardRegistry};
use l5r_engine::core::{EntityId, GameConfig, PlayerId};
use l5r_engine::events::{EventName, GameEvent};
use l5r_engine::game::Game;
use l5r_engine::prompts::MenuArg;
use l5r_engine::zones::Location;

const INVESTIGATOR: CardId = CardId::new(1);

type Log = Rc<RefCell<Vec<&'static str>>>;

fn logging(log: &Log, title: &'static str, ability_type: AbilityType, entry: &'static str) -> CardAbility {
    let log = Rc::clone(log);
    CardAbility::triggered(title, ability_type, EventName::CARD_BOWED)
        .with_handler(move |_, _| log.borrow_mut().push(entry))
}

/// A game with one character that has an interrupt and a reaction to
/// cards bowing.
fn game_with(interrupt: AbilityType, reaction: AbilityType) -> (Game, EntityId, Log) {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let mut registry = CardRegistry::new();
    registry.register(CardDefinition::character(INVESTIGATOR, "Kitsuki Investigator", 2, 1, 2));
    registry.register_ability(INVESTIGATOR, logging(&log, "Before bowing", interrupt, "interrupt"));
    registry.register_ability(INVESTIGATOR, logging(&log, "After bowing", reaction, "reaction"));

    let mut game = Game::initialize(GameConfig::default(), Rc::new(registry));
    let card = game
        .create_card(INVESTIGATOR, PlayerId::new(0), Location::PlayArea)
        .expect("card should be created");
    (game, card, log)
}

fn bow(game: &mut Game, card: EntityId, log: &Log) {
    let log = Rc::clone(log);
    game.raise_event(GameEvent::new(EventName::CARD_BOWED).with_card(card), move |game, _| {
        if let Some(instance) = game.state.card_mut(card) {
            instance.bowed = true;
        }
        log.borrow_mut().push("handler");
    });
}

/// Test that forced interrupts resolve before the event and forced
/// reactions after it, without prompting anyone.
#[test]
fn test_forced_interrupt_before_forced_reaction() {
    let (mut game, card, log) = game_with(AbilityType::ForcedInterrupt, AbilityType::ForcedReaction);

    bow(&mut game, card, &log);
    assert!(game.update(), "Forced windows should not wait on a player");

    assert_eq!(*log.borrow(), vec!["interrupt", "handler", "reaction"]);
    assert!(game.state.card(card).unwrap().bowed);
    assert!(!game.abilities.is_window_open());
}

/// Test that non-forced windows ask the controller, interrupts first.
#[test]
fn test_interrupt_prompt_comes_before_reaction_prompt() {
    let (mut game, card, log) = game_with(AbilityType::Interrupt, AbilityType::Reaction);
    let controller = PlayerId::new(0);

    bow(&mut game, card, &log);
    assert!(!game.update());

    let prompt = game.active_prompt(controller).expect("controller should be asked");
    assert_eq!(prompt.title, "Any Interrupt abilities?");
    assert_eq!(prompt.buttons, vec!["Before bowing".to_string(), "Pass".to_string()]);
    assert!(game.active_prompt(PlayerId::new(1)).is_none(), "Opponent has nothing to use");

    game.menu_command(controller, MenuArg::Choice(0)).unwrap();
    assert_eq!(*log.borrow(), vec!["interrupt", "handler"]);

    let prompt = game.active_prompt(controller).expect("reaction window should be open");
    assert_eq!(prompt.title, "Any Reaction abilities?");

    game.menu_command(controller, MenuArg::Choice(0)).unwrap();
    assert_eq!(*log.borrow(), vec!["interrupt", "handler", "reaction"]);
    assert!(game.is_idle());
}

/// Test that passing a window skips the ability but still resolves the
/// event.
#[test]
fn test_passing_skips_ability() {
    let (mut game, card, log) = game_with(AbilityType::Interrupt, AbilityType::Reaction);
    let controller = PlayerId::new(0);

    bow(&mut game, card, &log);
    game.update();
    game.menu_command(controller, MenuArg::Pass).unwrap();
    assert_eq!(*log.borrow(), vec!["handler"]);

    game.menu_command(controller, MenuArg::Pass).unwrap();
    assert_eq!(*log.borrow(), vec!["handler"]);
    assert!(game.is_idle());
}

/// Test that a player cannot answer a window they are not choosing in.
#[test]
fn test_wrong_player_is_rejected() {
    let (mut game, card, log) = game_with(AbilityType::Interrupt, AbilityType::Reaction);

    bow(&mut game, card, &log);
    game.update();

    assert!(game.menu_command(PlayerId::new(1), MenuArg::Choice(0)).is_err());
    assert!(log.borrow().is_empty());
}

/// Test that a card leaving play takes its registrations with it, and that
/// unregistering again is a no-op.
#[test]
fn test_unregistration_is_idempotent() {
    let (mut game, card, log) = game_with(AbilityType::ForcedInterrupt, AbilityType::ForcedReaction);
    assert_eq!(game.abilities.registrations_of(card), 2);

    game.move_card(card, Location::DynastyDiscard);
    assert_eq!(game.abilities.registrations_of(card), 0);
    assert_eq!(game.abilities.unregister_all_abilities(card), 0);
    assert_eq!(game.abilities.unregister_all_abilities(card), 0);
    assert!(game.abilities.is_empty());

    // Nothing responds any more.
    bow(&mut game, card, &log);
    assert!(game.update());
    assert_eq!(*log.borrow(), vec!["handler"]);
}

/// Test that a card re-entering play registers its abilities once more.
#[test]
fn test_reentering_play_registers_again() {
    let (mut game, card, log) = game_with(AbilityType::ForcedInterrupt, AbilityType::ForcedReaction);

    game.move_card(card, Location::Hand);
    game.move_card(card, Location::PlayArea);
    assert_eq!(game.abilities.registrations_of(card), 2);

    bow(&mut game, card, &log);
    assert!(game.update());
    assert_eq!(*log.borrow(), vec!["interrupt", "handler", "reaction"]);
}

const WATCHER: CardId = CardId::new(2);
const SENTRY: CardId = CardId::new(3);

/// A game where the watcher bows something in response to a ring being
/// claimed, and the sentry has an interrupt to cards bowing.
fn nested_game(interrupt: AbilityType) -> (Game, Log) {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let mut registry = CardRegistry::new();
    registry.register(CardDefinition::character(WATCHER, "Isawa Kaede", 2, 3, 3));
    registry.register(CardDefinition::character(SENTRY, "Hida Kisada", 5, 4, 2));

    let bow_log = Rc::clone(&log);
    registry.register_ability(
        WATCHER,
        CardAbility::triggered("Bow in answer", AbilityType::ForcedReaction, EventName::CLAIM_RING).with_handler(
            move |game, ctx| {
                let log = Rc::clone(&bow_log);
                game.raise_event(GameEvent::new(EventName::CARD_BOWED).with_card(ctx.source), move |_, _| {
                    log.borrow_mut().push("bow handler");
                });
            },
        ),
    );
    registry.register_ability(SENTRY, logging(&log, "Stand guard", interrupt, "interrupt"));

    let mut game = Game::initialize(GameConfig::default(), Rc::new(registry));
    game.create_card(WATCHER, PlayerId::new(0), Location::PlayArea).unwrap();
    game.create_card(SENTRY, PlayerId::new(0), Location::PlayArea).unwrap();
    (game, log)
}

/// Test that an event raised while a triggered ability resolves is
/// interrupted before it resolves, not after.
#[test]
fn test_nested_event_is_interrupted_first() {
    let (mut game, log) = nested_game(AbilityType::ForcedInterrupt);

    game.raise_event(GameEvent::new(EventName::CLAIM_RING), |_, _| {});
    assert!(game.update());

    assert_eq!(*log.borrow(), vec!["interrupt", "bow handler"]);
    assert!(!game.abilities.is_window_open());
    assert_eq!(game.abilities.pending_windows(), 0);
    assert_eq!(game.event_count(), 0, "Settled events are dropped once every window closes");
}

/// Test that a nested interrupt window waits for its player before the
/// nested event resolves.
#[test]
fn test_nested_interrupt_prompts_before_resolving() {
    let (mut game, log) = nested_game(AbilityType::Interrupt);
    let controller = PlayerId::new(0);

    game.raise_event(GameEvent::new(EventName::CLAIM_RING), |_, _| {});
    assert!(!game.update());

    let prompt = game.active_prompt(controller).expect("nested interrupt window should be open");
    assert_eq!(prompt.title, "Any Interrupt abilities?");
    assert!(log.borrow().is_empty(), "Bow must wait for the interrupt window");
    assert_eq!(game.abilities.open_depth(), 2);

    game.menu_command(controller, MenuArg::Choice(0)).unwrap();
    assert_eq!(*log.borrow(), vec!["interrupt", "bow handler"]);
    assert!(game.is_idle());
}
