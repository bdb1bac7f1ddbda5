//! Triggered ability windows.
//!
//! A `TriggeredAbilityWindow` offers one ability type's responses to a
//! batch of events. Eligible choices are recomputed every time the window
//! resumes, so a response that changes the game (or uses up a limit) is
//! reflected in what is offered next. Each registration responds to each
//! event at most once per window.
//!
//! Non-forced windows go around the table starting with the first player:
//! a player picks a response or passes, and the window closes once every
//! player has passed in a row. A player with nothing to use, or who is
//! disconnected, passes automatically.
//!
//! Events raised while a chosen ability resolves get their own windows,
//! nested inside this one.
//!
//! Forced windows cannot be passed. A single remaining response resolves
//! without asking; with several, the first player chooses the order.

use tracing::{debug, warn};

use crate::core::PlayerId;
use crate::events::EventId;
use crate::game::Game;
use crate::pipeline::{GamePipeline, GameStep};
use crate::prompts::{MenuArg, Prompt, PromptView};

use super::ability::AbilityType;
use super::resolver::AbilityResolver;
use super::window::{AbilityWindow, RegistrationId, TriggerChoice, WindowId};

/// Offers responses of one ability type.
pub struct TriggeredAbilityWindow {
    id: WindowId,
    ability_type: AbilityType,
    events: Vec<EventId>,
    resolved: Vec<(RegistrationId, EventId)>,
    current_player: Option<PlayerId>,
    consecutive_passes: usize,
    pipeline: GamePipeline,
    closed: bool,
}

impl TriggeredAbilityWindow {
    #[must_use]
    pub fn new(id: WindowId, ability_type: AbilityType, events: Vec<EventId>) -> Self {
        Self {
            id,
            ability_type,
            events,
            resolved: Vec::new(),
            current_player: None,
            consecutive_passes: 0,
            pipeline: GamePipeline::new(),
            closed: false,
        }
    }

    #[must_use]
    pub fn ability_type(&self) -> AbilityType {
        self.ability_type
    }

    /// Choices the given player may pick from now.
    fn choices_for(&self, game: &Game, player: PlayerId) -> Vec<TriggerChoice> {
        let all = AbilityWindow::eligible_choices(game, self.ability_type, &self.events, &self.resolved);
        if self.ability_type.is_forced() {
            all
        } else {
            all.into_iter().filter(|c| c.player == player).collect()
        }
    }

    fn chooser(&self, game: &Game) -> PlayerId {
        self.current_player.unwrap_or(game.state.first_player)
    }

    fn close(&mut self, game: &mut Game) {
        if !self.closed {
            self.closed = true;
            AbilityWindow::close_window(game, self.id);
        }
    }

    fn resolve_choice(&mut self, choice: TriggerChoice) {
        debug!(
            registration = %choice.registration,
            event = %choice.event,
            title = %choice.context.ability.title,
            "resolve triggered ability"
        );
        self.resolved.push((choice.registration, choice.event));
        self.pipeline.push(Box::new(AbilityResolver::new(choice.context)));
    }

    /// Run queued resolutions. Windows they open nest inside this one.
    fn run_resolutions(&mut self, game: &mut Game) -> bool {
        game.abilities.begin_resolving(self.id);
        let done = self.pipeline.run(game);
        game.abilities.end_resolving(self.id);
        done
    }

    fn pass(&mut self, game: &Game, player: PlayerId) {
        self.consecutive_passes += 1;
        self.current_player = Some(player.opponent());
        debug!(%player, passes = self.consecutive_passes, players = game.state.player_count(), "pass triggered window");
    }
}

impl GameStep for TriggeredAbilityWindow {
    fn continue_step(&mut self, game: &mut Game) -> bool {
        loop {
            if !self.run_resolutions(game) {
                return false;
            }
            if self.closed {
                return true;
            }
            if game.abilities.is_force_closed(self.id) {
                self.close(game);
                return true;
            }

            let player = self.chooser(game);
            let choices = self.choices_for(game, player);

            if self.ability_type.is_forced() {
                match choices.len() {
                    0 => {
                        self.close(game);
                        return true;
                    }
                    1 => {
                        if let Some(choice) = choices.into_iter().next() {
                            self.resolve_choice(choice);
                        }
                        continue;
                    }
                    _ => {
                        if game.state.player(player).disconnected {
                            if let Some(choice) = choices.into_iter().next() {
                                self.resolve_choice(choice);
                            }
                            continue;
                        }
                        return false;
                    }
                }
            }

            if self.consecutive_passes >= game.state.player_count() {
                self.close(game);
                return true;
            }
            if choices.is_empty() || game.state.player(player).disconnected {
                self.pass(game, player);
                continue;
            }
            return false;
        }
    }

    fn handle_menu_command(&mut self, game: &mut Game, player: PlayerId, arg: &MenuArg) -> bool {
        if !self.pipeline.is_empty() {
            game.abilities.begin_resolving(self.id);
            let handled = self.pipeline.handle_menu_command(game, player, arg);
            game.abilities.end_resolving(self.id);
            return handled;
        }
        if !self.active_condition(game, player) {
            warn!(%player, "command for a window this player is not choosing in");
            return false;
        }
        self.menu_command(game, player, arg)
    }

    fn current_prompt(&self) -> Option<&dyn Prompt> {
        if !self.pipeline.is_empty() {
            return self.pipeline.current_prompt();
        }
        if self.closed {
            None
        } else {
            Some(self)
        }
    }

    fn name(&self) -> &'static str {
        if self.ability_type.is_forced() {
            "ForcedTriggeredAbilityWindow"
        } else {
            "TriggeredAbilityWindow"
        }
    }
}

impl Prompt for TriggeredAbilityWindow {
    fn active_condition(&self, game: &Game, player: PlayerId) -> bool {
        !self.closed && self.chooser(game) == player
    }

    fn is_complete(&self) -> bool {
        self.closed
    }

    fn active_prompt(&self, game: &Game, player: PlayerId) -> PromptView {
        let choices = self.choices_for(game, player);
        let title = if self.ability_type.is_forced() {
            "Choose the order of forced abilities".to_string()
        } else {
            format!("Any {:?} abilities?", self.ability_type)
        };
        let view = choices
            .iter()
            .fold(PromptView::new(title), |view, c| view.with_button(c.context.ability.title.clone()))
            .with_cards(choices.iter().map(|c| c.context.source));
        if self.ability_type.is_forced() {
            view
        } else {
            view.with_button("Pass")
        }
    }

    fn waiting_prompt(&self) -> PromptView {
        PromptView::waiting("opponent to use abilities")
    }

    fn menu_command(&mut self, game: &mut Game, player: PlayerId, arg: &MenuArg) -> bool {
        match arg {
            MenuArg::Choice(index) => {
                let Some(choice) = self.choices_for(game, player).into_iter().nth(*index) else {
                    return false;
                };
                self.resolve_choice(choice);
                if !self.ability_type.is_forced() {
                    self.consecutive_passes = 0;
                    self.current_player = Some(player.opponent());
                }
                true
            }
            MenuArg::Pass | MenuArg::Done if !self.ability_type.is_forced() => {
                self.pass(game, player);
                true
            }
            _ => false,
        }
    }

    fn name(&self) -> &'static str {
        "TriggeredAbilityWindow"
    }
}
