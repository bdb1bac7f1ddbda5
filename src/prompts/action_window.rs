//! Action windows.
//!
//! Players alternate taking actions, starting with the defending player
//! when a conflict is in progress and with the first player otherwise.
//! Every pass raises `onPassActionPhasePriority` (which drives the
//! pass-priority effect durations). The window closes once every player
//! has passed in a row.

use tracing::{debug, warn};

use crate::abilities::{AbilityContext, AbilityResolver, AbilityType};
use crate::core::{EntityId, PlayerId};
use crate::events::{EventName, GameEvent};
use crate::game::Game;
use crate::pipeline::GameStep;

use super::{MenuArg, Prompt, PromptView};

/// Alternating action window.
pub struct ActionWindow {
    title: String,
    current: Option<PlayerId>,
    consecutive_passes: usize,
    complete: bool,
}

impl ActionWindow {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            current: None,
            consecutive_passes: 0,
            complete: false,
        }
    }

    /// The player who currently holds priority.
    #[must_use]
    pub fn current_player(&self) -> Option<PlayerId> {
        self.current
    }

    fn starting_player(game: &Game) -> PlayerId {
        game.state
            .current_conflict
            .as_ref()
            .map_or(game.state.first_player, |c| c.defending_player)
    }

    fn pass(&mut self, game: &mut Game, player: PlayerId) {
        debug!(%player, "pass action priority");
        game.raise_event(GameEvent::new(EventName::PASS_ACTION_PHASE_PRIORITY).with_player(player), |_, _| {});
        self.consecutive_passes += 1;
        self.current = Some(player.opponent());
    }

    /// Action abilities `player` may initiate from `card` right now.
    fn usable_actions(game: &Game, player: PlayerId, card: EntityId) -> Vec<usize> {
        let Some(instance) = game.state.card(card) else {
            return Vec::new();
        };
        if instance.controller != player {
            return Vec::new();
        }
        game.abilities_of(card)
            .iter()
            .enumerate()
            .filter(|(_, ability)| ability.ability_type == AbilityType::Action)
            .filter(|(_, ability)| {
                let context = AbilityContext::new(card, player, std::rc::Rc::clone(ability));
                ability.meets_requirements(game, &context)
            })
            .map(|(index, _)| index)
            .collect()
    }

    fn use_ability(&mut self, game: &mut Game, player: PlayerId, card: EntityId, index: usize) -> bool {
        if !Self::usable_actions(game, player, card).contains(&index) {
            warn!(%player, %card, index, "action not usable");
            return false;
        }
        let Some(ability) = game.abilities_of(card).get(index).cloned() else {
            return false;
        };
        let context = AbilityContext::new(card, player, ability);
        game.queue_step(Box::new(AbilityResolver::new(context)));
        self.consecutive_passes = 0;
        self.current = Some(player.opponent());
        true
    }
}

impl GameStep for ActionWindow {
    fn continue_step(&mut self, game: &mut Game) -> bool {
        if self.complete {
            return true;
        }
        let current = *self.current.get_or_insert_with(|| Self::starting_player(game));
        if self.consecutive_passes >= game.state.player_count() {
            debug!(window = %self.title, "action window closed");
            self.complete = true;
            return true;
        }
        if game.state.player(current).disconnected {
            self.pass(game, current);
        }
        false
    }

    fn handle_menu_command(&mut self, game: &mut Game, player: PlayerId, arg: &MenuArg) -> bool {
        if !self.active_condition(game, player) {
            return false;
        }
        self.menu_command(game, player, arg)
    }

    fn current_prompt(&self) -> Option<&dyn Prompt> {
        if self.complete {
            None
        } else {
            Some(self)
        }
    }

    fn name(&self) -> &'static str {
        "ActionWindow"
    }
}

impl Prompt for ActionWindow {
    fn active_condition(&self, _game: &Game, player: PlayerId) -> bool {
        self.current == Some(player)
    }

    fn is_complete(&self) -> bool {
        self.complete
    }

    fn active_prompt(&self, game: &Game, player: PlayerId) -> PromptView {
        let usable = game
            .state
            .cards_in_play()
            .into_iter()
            .filter(|card| !Self::usable_actions(game, player, *card).is_empty());
        PromptView::new(self.title.clone()).with_cards(usable).with_button("Pass")
    }

    fn waiting_prompt(&self) -> PromptView {
        PromptView::waiting("opponent to take an action or pass")
    }

    fn menu_command(&mut self, game: &mut Game, player: PlayerId, arg: &MenuArg) -> bool {
        match arg {
            MenuArg::Pass | MenuArg::Done => {
                self.pass(game, player);
                true
            }
            MenuArg::UseAbility { card, index } => self.use_ability(game, player, *card, *index),
            _ => false,
        }
    }

    fn name(&self) -> &'static str {
        "ActionWindow"
    }
}
