//! Simultaneous delayed effects.
//!
//! Delayed effects triggered by the same batch of events fire together.
//! They are offered as one choice set: the first player picks the order,
//! and a single remaining effect fires without asking.

use tracing::debug;

use crate::core::PlayerId;
use crate::effects::DelayedFiring;
use crate::game::Game;
use crate::pipeline::{GamePipeline, GameStep};
use crate::prompts::{MenuArg, Prompt, PromptView};

/// Fires a set of delayed effects in a chosen order.
pub struct SimultaneousEffectWindow {
    remaining: Vec<DelayedFiring>,
    pipeline: GamePipeline,
}

impl SimultaneousEffectWindow {
    #[must_use]
    pub fn new(firings: Vec<DelayedFiring>) -> Self {
        Self {
            remaining: firings,
            pipeline: GamePipeline::new(),
        }
    }

    fn fire(&mut self, game: &mut Game, index: usize) {
        if index >= self.remaining.len() {
            return;
        }
        let firing = self.remaining.remove(index);
        debug!(effect = %firing.effect, title = %firing.title, "fire delayed effect");
        if !firing.action.has_legal_target(game, &firing.context) {
            return;
        }
        let ((), queued) = game.capture_steps(|g| firing.action.resolve(g, &firing.context));
        self.pipeline.extend(queued);
    }
}

impl GameStep for SimultaneousEffectWindow {
    fn continue_step(&mut self, game: &mut Game) -> bool {
        loop {
            if !self.pipeline.run(game) {
                return false;
            }
            match self.remaining.len() {
                0 => return true,
                1 => self.fire(game, 0),
                _ if game.state.player(game.state.first_player).disconnected => self.fire(game, 0),
                _ => return false,
            }
        }
    }

    fn handle_menu_command(&mut self, game: &mut Game, player: PlayerId, arg: &MenuArg) -> bool {
        if !self.pipeline.is_empty() {
            return self.pipeline.handle_menu_command(game, player, arg);
        }
        if !self.active_condition(game, player) {
            return false;
        }
        self.menu_command(game, player, arg)
    }

    fn current_prompt(&self) -> Option<&dyn Prompt> {
        if !self.pipeline.is_empty() {
            self.pipeline.current_prompt()
        } else if self.remaining.len() > 1 {
            Some(self)
        } else {
            None
        }
    }

    fn name(&self) -> &'static str {
        "SimultaneousEffectWindow"
    }
}

impl Prompt for SimultaneousEffectWindow {
    fn active_condition(&self, game: &Game, player: PlayerId) -> bool {
        player == game.state.first_player
    }

    fn is_complete(&self) -> bool {
        self.remaining.is_empty()
    }

    fn active_prompt(&self, _game: &Game, _player: PlayerId) -> PromptView {
        self.remaining
            .iter()
            .fold(PromptView::new("Choose the next effect to resolve"), |view, f| {
                view.with_button(f.title.clone())
            })
    }

    fn waiting_prompt(&self) -> PromptView {
        PromptView::waiting("first player to order simultaneous effects")
    }

    fn menu_command(&mut self, game: &mut Game, _player: PlayerId, arg: &MenuArg) -> bool {
        match arg {
            MenuArg::Choice(index) if *index < self.remaining.len() => {
                self.fire(game, *index);
                true
            }
            _ => false,
        }
    }

    fn name(&self) -> &'static str {
        "SimultaneousEffectWindow"
    }
}
