//! Button choice prompt.

use crate::core::PlayerId;
use crate::game::Game;

use super::{MenuArg, Prompt, PromptView};

type ChoiceHandler = Box<dyn FnOnce(&mut Game, usize)>;

/// Ask one player to pick one of several buttons.
pub struct ChoicePrompt {
    player: PlayerId,
    title: String,
    choices: Vec<String>,
    handler: Option<ChoiceHandler>,
    complete: bool,
}

impl ChoicePrompt {
    pub fn new(
        player: PlayerId,
        title: impl Into<String>,
        choices: Vec<String>,
        handler: impl FnOnce(&mut Game, usize) + 'static,
    ) -> Self {
        Self {
            player,
            title: title.into(),
            choices,
            handler: Some(Box::new(handler)),
            complete: false,
        }
    }

    /// A yes/no question. The handler receives `true` for "Yes".
    pub fn yes_no(player: PlayerId, title: impl Into<String>, handler: impl FnOnce(&mut Game, bool) + 'static) -> Self {
        Self::new(player, title, vec!["Yes".to_string(), "No".to_string()], move |game, index| {
            handler(game, index == 0)
        })
    }
}

impl Prompt for ChoicePrompt {
    fn activate(&mut self, game: &mut Game) {
        if self.choices.is_empty() {
            self.complete = true;
            self.handler = None;
            return;
        }
        if game.state.player(self.player).disconnected {
            self.complete = true;
            if let Some(handler) = self.handler.take() {
                handler(game, self.choices.len() - 1);
            }
        }
    }

    fn active_condition(&self, _game: &Game, player: PlayerId) -> bool {
        player == self.player
    }

    fn is_complete(&self) -> bool {
        self.complete
    }

    fn active_prompt(&self, _game: &Game, _player: PlayerId) -> PromptView {
        self.choices
            .iter()
            .fold(PromptView::new(self.title.clone()), |view, choice| view.with_button(choice.clone()))
    }

    fn waiting_prompt(&self) -> PromptView {
        PromptView::waiting("opponent to choose")
    }

    fn menu_command(&mut self, game: &mut Game, _player: PlayerId, arg: &MenuArg) -> bool {
        let MenuArg::Choice(index) = arg else {
            return false;
        };
        if *index >= self.choices.len() || self.complete {
            return false;
        }
        self.complete = true;
        if let Some(handler) = self.handler.take() {
            handler(game, *index);
        }
        true
    }

    fn name(&self) -> &'static str {
        "ChoicePrompt"
    }
}
