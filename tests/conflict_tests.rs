//! Conflict integration tests.
//!
//! These tests play conflicts through `ConflictFlow`, answering prompts
//! the way a client would, and check covert assignment, the unopposed
//! penalty, ring effects and province breaking.

use std::rc::Rc;

use l5r_engine::abilities::{AbilityType, CardAbility};
use l5r_engine::cards::{CardDefinition, CardId, CardRegistry, Keyword};
use l5r_engine::conflict::ConflictFlow;
use l5r_engine::core::{EntityId, GameConfig, PlayerId};
use l5r_engine::effects::{GameEffect, StaticModifier};
use l5r_engine::events::EventName;
use l5r_engine::game::Game;
use l5r_engine::prompts::MenuArg;
use l5r_engine::rings::{ConflictType, Element};
use l5r_engine::zones::Location;

const CHALLENGER: CardId = CardId::new(1);
const SHINOBI: CardId = CardId::new(2);
const PROVINCE: CardId = CardId::new(3);
const SENTINEL: CardId = CardId::new(4);

const ATTACKER: PlayerId = PlayerId::new(0);
const DEFENDER: PlayerId = PlayerId::new(1);

struct Table {
    game: Game,
    provinces: Vec<EntityId>,
}

/// Logs engine tracing output when `RUST_LOG` is set.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn table(config: GameConfig) -> Table {
    init_tracing();
    let mut registry = CardRegistry::new();
    registry.register(CardDefinition::character(CHALLENGER, "Doji Challenger", 3, 3, 3));
    registry.register(CardDefinition::character(SHINOBI, "Shosuro Sadako", 2, 1, 2).with_keyword(Keyword::Covert));
    registry.register(CardDefinition::province(PROVINCE, "Shameful Display", 3));
    registry.register(CardDefinition::character(SENTINEL, "Hida Guardian", 2, 2, 2));
    registry.register_ability(
        SENTINEL,
        CardAbility::triggered("Crush the charge", AbilityType::ForcedInterrupt, EventName::AFTER_CONFLICT).with_handler(
            |game, _| {
                let attackers = game
                    .state
                    .current_conflict
                    .as_ref()
                    .map(|c| c.attackers.clone())
                    .unwrap_or_default();
                for card in attackers {
                    if let Some(instance) = game.state.card_mut(card) {
                        instance.bowed = true;
                    }
                }
            },
        ),
    );
    let mut game = Game::initialize(config.with_player_names("Bayushi", "Doji"), Rc::new(registry));
    let provinces = (0..=4)
        .map(|slot| game.create_card(PROVINCE, DEFENDER, Location::Province(slot)).unwrap())
        .collect();
    Table { game, provinces }
}

fn character(game: &mut Game, card: CardId, player: PlayerId) -> EntityId {
    game.create_card(card, player, Location::PlayArea).unwrap()
}

fn start_conflict(game: &mut Game) {
    game.queue_step(Box::new(ConflictFlow::new(ATTACKER)));
    assert!(!game.update(), "Attacker should be asked to declare");
}

fn declare(game: &mut Game, ring: Element, conflict_type: ConflictType, province: u8, attackers: Vec<EntityId>) {
    game.menu_command(
        ATTACKER,
        MenuArg::DeclareConflict {
            ring,
            conflict_type,
            province,
            attackers,
        },
    )
    .expect("declaration should be accepted");
}

/// Both players pass the conflict action window, defender first.
fn pass_action_window(game: &mut Game) {
    game.menu_command(DEFENDER, MenuArg::Pass).unwrap();
    game.menu_command(ATTACKER, MenuArg::Pass).unwrap();
}

fn shield_from_covert(game: &mut Game, card: EntityId) {
    game.add_effect(
        GameEffect::modifier(card, DEFENDER, StaticModifier::CannotBeBypassedByCovert).on_card(card),
    );
}

/// Test that an unopposed loss costs the defender honor, with a message.
#[test]
fn test_unopposed_honor_loss() {
    let mut t = table(GameConfig::default());
    let samurai = character(&mut t.game, CHALLENGER, ATTACKER);

    start_conflict(&mut t.game);
    declare(&mut t.game, Element::Air, ConflictType::Military, 1, vec![samurai]);
    pass_action_window(&mut t.game);
    t.game.menu_command(ATTACKER, MenuArg::Choice(1)).unwrap();

    assert!(t.game.is_idle());
    assert_eq!(t.game.state.player(DEFENDER).honor, 9);
    assert!(t
        .game
        .messages()
        .iter()
        .any(|m| m.text == "Doji loses 1 honor for not defending the conflict."));
    assert!(t
        .game
        .messages()
        .iter()
        .any(|m| m.text == "Bayushi won a military conflict 3 vs 0"));
}

/// Test that the configured penalty is used.
#[test]
fn test_unopposed_penalty_is_configurable() {
    let config = GameConfig {
        unopposed_honor_loss: 2,
        ..GameConfig::default()
    };
    let mut t = table(config);
    let samurai = character(&mut t.game, CHALLENGER, ATTACKER);

    start_conflict(&mut t.game);
    declare(&mut t.game, Element::Air, ConflictType::Military, 1, vec![samurai]);
    pass_action_window(&mut t.game);
    t.game.menu_command(ATTACKER, MenuArg::Choice(1)).unwrap();

    assert_eq!(t.game.state.player(DEFENDER).honor, 8);
    assert!(t
        .game
        .messages()
        .iter()
        .any(|m| m.text == "Doji loses 2 honor for not defending the conflict."));
}

/// Test that a player with the exemption loses no honor for an unopposed
/// conflict.
#[test]
fn test_unopposed_penalty_can_be_prevented() {
    let mut t = table(GameConfig::default());
    let samurai = character(&mut t.game, CHALLENGER, ATTACKER);
    let stronghold = t.provinces[0];
    t.game.add_effect(
        GameEffect::modifier(stronghold, DEFENDER, StaticModifier::NoUnopposedPenalty).on_player(DEFENDER),
    );

    start_conflict(&mut t.game);
    declare(&mut t.game, Element::Air, ConflictType::Military, 1, vec![samurai]);
    pass_action_window(&mut t.game);
    t.game.menu_command(ATTACKER, MenuArg::Choice(1)).unwrap();

    assert_eq!(t.game.state.player(DEFENDER).honor, 10);
    assert!(!t
        .game
        .messages()
        .iter()
        .any(|m| m.text.ends_with("for not defending the conflict.")));
}

/// Test that a defended conflict has no unopposed penalty, even when the
/// attacker wins.
#[test]
fn test_defended_loss_is_not_unopposed() {
    let mut t = table(GameConfig::default());
    let first = character(&mut t.game, CHALLENGER, ATTACKER);
    let second = character(&mut t.game, CHALLENGER, ATTACKER);
    let guard = character(&mut t.game, SHINOBI, DEFENDER);

    start_conflict(&mut t.game);
    declare(&mut t.game, Element::Earth, ConflictType::Military, 2, vec![first, second]);
    t.game.menu_command(DEFENDER, MenuArg::SelectCards(vec![guard])).unwrap();
    pass_action_window(&mut t.game);
    t.game.menu_command(ATTACKER, MenuArg::Choice(1)).unwrap();

    assert!(t.game.is_idle());
    assert_eq!(t.game.state.player(DEFENDER).honor, 10);
    assert_eq!(t.game.state.ring(Element::Earth).claimed_by, Some(ATTACKER));
    // 6 vs 1 beats strength 3
    assert!(t.game.state.card(t.provinces[2]).unwrap().broken);
    assert!(t.game.state.card(guard).unwrap().bowed);
}

/// Test that bowing the attackers while the conflict ends hands the win
/// to the defender, who claims the ring with no ring effect on offer.
#[test]
fn test_winner_changes_after_conflict() {
    let mut t = table(GameConfig::default());
    let samurai = character(&mut t.game, CHALLENGER, ATTACKER);
    let guard = character(&mut t.game, SENTINEL, DEFENDER);

    start_conflict(&mut t.game);
    declare(&mut t.game, Element::Fire, ConflictType::Military, 1, vec![samurai]);
    t.game.menu_command(DEFENDER, MenuArg::SelectCards(vec![guard])).unwrap();
    pass_action_window(&mut t.game);

    assert!(t.game.is_idle(), "No ring effect prompt for the attacker");
    assert!(t.game.active_prompt(ATTACKER).is_none());
    assert_eq!(t.game.state.ring(Element::Fire).claimed_by, Some(DEFENDER));
    assert!(!t.game.state.card(t.provinces[1]).unwrap().broken);
    assert_eq!(t.game.state.player(DEFENDER).honor, 10);

    let texts: Vec<&str> = t.game.messages().iter().map(|m| m.text.as_str()).collect();
    assert!(texts.contains(&"Bayushi won a military conflict 3 vs 2"));
    assert!(texts.contains(&"Doji won a military conflict 0 vs 2"));
}

/// Test that the attacker may resolve the ring effect of a won conflict.
#[test]
fn test_air_ring_effect() {
    let mut t = table(GameConfig::default());
    let samurai = character(&mut t.game, CHALLENGER, ATTACKER);

    start_conflict(&mut t.game);
    declare(&mut t.game, Element::Air, ConflictType::Political, 3, vec![samurai]);
    pass_action_window(&mut t.game);
    t.game.menu_command(ATTACKER, MenuArg::Choice(0)).unwrap();

    assert!(t.game.is_idle());
    assert_eq!(t.game.state.player(ATTACKER).honor, 12);
    assert_eq!(t.game.state.ring(Element::Air).claimed_by, Some(ATTACKER));
    assert!(!t.game.state.ring(Element::Air).contested);
}

/// Test that a legal one-to-one covert pairing is made without asking.
#[test]
fn test_covert_pairs_automatically() {
    let mut t = table(GameConfig::default());
    let shinobi = character(&mut t.game, SHINOBI, ATTACKER);
    let guard = character(&mut t.game, CHALLENGER, DEFENDER);

    start_conflict(&mut t.game);
    declare(&mut t.game, Element::Fire, ConflictType::Political, 1, vec![shinobi]);

    let conflict = t.game.state.current_conflict.as_ref().expect("conflict in progress");
    assert_eq!(conflict.covert_targets, vec![(shinobi, guard)]);
    assert!(t.game.state.card(guard).unwrap().covert_bypassed);
    // The only possible defender was bypassed: straight to the action window.
    assert!(t.game.active_prompt(DEFENDER).is_some_and(|p| p.selectable_cards.is_empty()));
}

/// Test that an illegal automatic pairing falls back to choosing by hand.
#[test]
fn test_covert_falls_back_to_manual_choice() {
    let mut t = table(GameConfig::default());
    let first = character(&mut t.game, SHINOBI, ATTACKER);
    let second = character(&mut t.game, SHINOBI, ATTACKER);
    let shielded = character(&mut t.game, CHALLENGER, DEFENDER);
    let exposed = character(&mut t.game, CHALLENGER, DEFENDER);
    shield_from_covert(&mut t.game, shielded);

    start_conflict(&mut t.game);
    declare(&mut t.game, Element::Fire, ConflictType::Political, 1, vec![first, second]);

    // Two attackers and two defenders, but one pair would be illegal.
    let prompt = t.game.active_prompt(ATTACKER).expect("attacker should choose covert targets");
    assert_eq!(prompt.selectable_cards, vec![exposed]);
    t.game.menu_command(ATTACKER, MenuArg::SelectCards(vec![exposed])).unwrap();

    // The second attacker has nobody left to bypass.
    assert!(t.game.state.card(exposed).unwrap().covert_bypassed);
    assert!(!t.game.state.card(shielded).unwrap().covert_bypassed);

    let prompt = t.game.active_prompt(DEFENDER).expect("defender should choose defenders");
    assert_eq!(prompt.selectable_cards, vec![shielded]);
}

/// Test that covert assignment can be declined.
#[test]
fn test_covert_can_be_declined() {
    let mut t = table(GameConfig::default());
    let shinobi = character(&mut t.game, SHINOBI, ATTACKER);
    let first = character(&mut t.game, CHALLENGER, DEFENDER);
    let second = character(&mut t.game, CHALLENGER, DEFENDER);

    start_conflict(&mut t.game);
    declare(&mut t.game, Element::Water, ConflictType::Political, 1, vec![shinobi]);
    t.game.menu_command(ATTACKER, MenuArg::Done).unwrap();

    assert!(!t.game.state.card(first).unwrap().covert_bypassed);
    assert!(!t.game.state.card(second).unwrap().covert_bypassed);
    let prompt = t.game.active_prompt(DEFENDER).expect("defender should choose defenders");
    assert_eq!(prompt.selectable_cards, vec![first, second]);
}

/// Test that a rejected declaration leaves the prompt open.
#[test]
fn test_illegal_declaration_is_rejected() {
    let mut t = table(GameConfig::default());
    let samurai = character(&mut t.game, CHALLENGER, ATTACKER);

    start_conflict(&mut t.game);
    let stronghold = MenuArg::DeclareConflict {
        ring: Element::Void,
        conflict_type: ConflictType::Military,
        province: 0,
        attackers: vec![samurai],
    };
    assert!(t.game.menu_command(ATTACKER, stronghold).is_err());
    assert!(t.game.state.current_conflict.as_ref().is_some_and(|c| !c.declared));
    assert!(t.game.active_prompt(ATTACKER).is_some());
}

/// Test that passing spends the military opportunity first.
#[test]
fn test_passing_spends_an_opportunity() {
    let mut t = table(GameConfig::default());
    character(&mut t.game, CHALLENGER, ATTACKER);

    start_conflict(&mut t.game);
    t.game.menu_command(ATTACKER, MenuArg::Pass).unwrap();

    assert!(t.game.is_idle());
    let attacker = t.game.state.player(ATTACKER);
    assert!(!attacker.has_opportunity(ConflictType::Military));
    assert!(attacker.has_opportunity(ConflictType::Political));
    assert!(t.game.state.current_conflict.is_none());
    assert_eq!(
        t.game.messages().back().map(|m| m.text.as_str()),
        Some("Bayushi passes their conflict opportunity")
    );
}
