//! Ring effects.
//!
//! The attacking player who wins a conflict may resolve the contested
//! ring's effect:
//!
//! - Air: gain 2 honor
//! - Earth: draw a card and the opponent discards one at random
//! - Fire: honor or dishonor a character
//! - Water: ready a bowed character, or bow a ready one
//! - Void: remove a fate from a character

use std::rc::Rc;
use tracing::debug;

use crate::actions::{ActionContext, CardAction, GameAction, Multiple, PlayerAction};
use crate::core::{EntityId, PlayerId};
use crate::game::{Game, MessageArg};
use crate::prompts::{ChoicePrompt, PromptStep, SelectCardPrompt};
use crate::rings::Element;

const AIR_HONOR: i32 = 2;

fn characters_in_play(game: &Game) -> Vec<EntityId> {
    game.find_any_cards_in_play(|c| c.is_character())
}

/// Let `player` pick a character from `candidates`, then run `then` on it.
fn choose_character(
    game: &mut Game,
    player: PlayerId,
    title: &str,
    candidates: Vec<EntityId>,
    then: impl FnOnce(&mut Game, EntityId) + 'static,
) {
    if candidates.is_empty() {
        debug!(%player, title, "no legal character for ring effect");
        return;
    }
    let prompt = SelectCardPrompt::new(player, title, candidates, move |game, selected| {
        if let Some(card) = selected.first().copied() {
            then(game, card);
        }
    });
    game.queue_step(Box::new(PromptStep::new(prompt)));
}

/// Resolve the effect of `element` for `player`.
pub fn resolve_ring_effect(game: &mut Game, player: PlayerId, element: Element) {
    let context = ActionContext::new(player);
    game.add_message(
        "{0} resolves the {1} ring",
        &[MessageArg::Player(player), MessageArg::Ring(element)],
    );
    match element {
        Element::Air => PlayerAction::gain_honor(player, AIR_HONOR).resolve(game, &context),
        Element::Earth => {
            let actions: Vec<Rc<dyn GameAction>> = vec![
                Rc::new(PlayerAction::draw(player, 1)),
                Rc::new(PlayerAction::discard_at_random(player.opponent(), 1)),
            ];
            Multiple::new(actions).resolve(game, &context);
        }
        Element::Fire => {
            let candidates = characters_in_play(game);
            choose_character(game, player, "Choose a character to honor or dishonor", candidates, move |game, card| {
                let honor = CardAction::honor([card]);
                let dishonor = CardAction::dishonor([card]);
                match (honor.has_legal_target(game, &context), dishonor.has_legal_target(game, &context)) {
                    (true, true) => {
                        let prompt = ChoicePrompt::new(
                            player,
                            "Honor or dishonor this character?",
                            vec!["Honor".into(), "Dishonor".into()],
                            move |game, index| {
                                let action = if index == 0 { honor } else { dishonor };
                                action.resolve(game, &context);
                            },
                        );
                        game.queue_step(Box::new(PromptStep::new(prompt)));
                    }
                    (true, false) => honor.resolve(game, &context),
                    (false, true) => dishonor.resolve(game, &context),
                    (false, false) => {}
                }
            });
        }
        Element::Water => {
            let candidates = characters_in_play(game);
            choose_character(game, player, "Choose a character to bow or ready", candidates, move |game, card| {
                let bowed = game.state.card(card).is_some_and(|c| c.bowed);
                if bowed {
                    CardAction::ready([card]).resolve(game, &context);
                } else {
                    CardAction::bow([card]).resolve(game, &context);
                }
            });
        }
        Element::Void => {
            let candidates = game.find_any_cards_in_play(|c| c.is_character() && c.fate > 0);
            choose_character(game, player, "Choose a character to remove a fate from", candidates, move |game, card| {
                CardAction::remove_fate([card], 1).resolve(game, &context);
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardDefinition, CardId, CardRegistry, HonorStatus};
    use crate::core::GameConfig;
    use crate::prompts::MenuArg;
    use crate::zones::Location;

    fn game() -> (Game, EntityId) {
        let mut registry = CardRegistry::new();
        registry.register(CardDefinition::character(CardId::new(1), "Isawa Kaede", 4, 1, 4));
        let mut game = Game::new(GameConfig::default(), Rc::new(registry));
        let card = game.create_card(CardId::new(1), PlayerId::new(1), Location::PlayArea).unwrap();
        (game, card)
    }

    #[test]
    fn test_air_gains_honor() {
        let (mut game, _) = game();
        resolve_ring_effect(&mut game, PlayerId::new(0), Element::Air);
        game.update();
        assert_eq!(game.state.player(PlayerId::new(0)).honor, 12);
    }

    #[test]
    fn test_fire_single_option_applies_directly() {
        let (mut game, card) = game();
        game.state.card_mut(card).unwrap().honor_status = HonorStatus::Honored;
        resolve_ring_effect(&mut game, PlayerId::new(0), Element::Fire);
        game.update();

        // one candidate, so the selection resolves itself
        assert_eq!(game.state.card(card).unwrap().honor_status, HonorStatus::Ordinary);
    }

    #[test]
    fn test_water_toggles_bow() {
        let (mut game, card) = game();
        resolve_ring_effect(&mut game, PlayerId::new(0), Element::Water);
        game.update();
        assert!(game.state.card(card).unwrap().bowed);
    }

    #[test]
    fn test_void_needs_fate() {
        let (mut game, card) = game();
        resolve_ring_effect(&mut game, PlayerId::new(0), Element::Void);
        assert!(game.update());

        game.state.card_mut(card).unwrap().fate = 2;
        resolve_ring_effect(&mut game, PlayerId::new(0), Element::Void);
        game.update();
        assert_eq!(game.state.card(card).unwrap().fate, 1);
    }

    #[test]
    fn test_fire_prompts_when_both_apply() {
        let (mut game, card) = game();
        resolve_ring_effect(&mut game, PlayerId::new(0), Element::Fire);
        assert!(!game.update());
        game.menu_command(PlayerId::new(0), MenuArg::Choice(1)).unwrap();
        assert_eq!(game.state.card(card).unwrap().honor_status, HonorStatus::Dishonored);
    }
}
