//! Card selection prompt.

use tracing::debug;

use crate::core::{EntityId, PlayerId};
use crate::game::Game;

use super::{MenuArg, Prompt, PromptView};

type SelectHandler = Box<dyn FnOnce(&mut Game, Vec<EntityId>)>;
type CancelHandler = Box<dyn FnOnce(&mut Game)>;

/// Ask one player to select between `min` and `max` cards from a
/// candidate list.
///
/// With `auto_single_target` enabled in the game config, a mandatory
/// single-card selection with exactly one candidate resolves itself on
/// activation.
pub struct SelectCardPrompt {
    player: PlayerId,
    title: String,
    candidates: Vec<EntityId>,
    min: usize,
    max: usize,
    optional: bool,
    handler: Option<SelectHandler>,
    on_cancel: Option<CancelHandler>,
    complete: bool,
}

impl SelectCardPrompt {
    pub fn new(
        player: PlayerId,
        title: impl Into<String>,
        candidates: Vec<EntityId>,
        handler: impl FnOnce(&mut Game, Vec<EntityId>) + 'static,
    ) -> Self {
        Self {
            player,
            title: title.into(),
            candidates,
            min: 1,
            max: 1,
            optional: false,
            handler: Some(Box::new(handler)),
            on_cancel: None,
            complete: false,
        }
    }

    #[must_use]
    pub fn with_range(mut self, min: usize, max: usize) -> Self {
        self.min = min;
        self.max = max.max(min);
        self
    }

    /// Allow the player to decline with `Done`.
    #[must_use]
    pub fn optional(mut self, on_cancel: impl FnOnce(&mut Game) + 'static) -> Self {
        self.optional = true;
        self.on_cancel = Some(Box::new(on_cancel));
        self
    }

    #[must_use]
    pub fn candidates(&self) -> &[EntityId] {
        &self.candidates
    }

    fn finish(&mut self, game: &mut Game, selected: Vec<EntityId>) {
        self.complete = true;
        self.on_cancel = None;
        if let Some(handler) = self.handler.take() {
            handler(game, selected);
        }
    }

    fn cancel(&mut self, game: &mut Game) {
        self.complete = true;
        self.handler = None;
        if let Some(on_cancel) = self.on_cancel.take() {
            on_cancel(game);
        }
    }

    fn is_valid_selection(&self, selected: &[EntityId]) -> bool {
        if selected.len() < self.min || selected.len() > self.max {
            return false;
        }
        let mut seen = Vec::with_capacity(selected.len());
        for id in selected {
            if !self.candidates.contains(id) || seen.contains(id) {
                return false;
            }
            seen.push(*id);
        }
        true
    }
}

impl Prompt for SelectCardPrompt {
    fn activate(&mut self, game: &mut Game) {
        if self.candidates.len() < self.min {
            debug!(prompt = %self.title, "not enough candidates");
            self.cancel(game);
            return;
        }
        if game.state.player(self.player).disconnected {
            if self.optional {
                self.cancel(game);
            } else {
                let selected = self.candidates[..self.min].to_vec();
                self.finish(game, selected);
            }
            return;
        }
        if game.config.auto_single_target && !self.optional && self.min == 1 && self.candidates.len() == 1 {
            let selected = self.candidates.clone();
            self.finish(game, selected);
        }
    }

    fn active_condition(&self, _game: &Game, player: PlayerId) -> bool {
        player == self.player
    }

    fn is_complete(&self) -> bool {
        self.complete
    }

    fn active_prompt(&self, _game: &Game, _player: PlayerId) -> PromptView {
        let view = PromptView::new(self.title.clone())
            .with_cards(self.candidates.iter().copied())
            .with_button("Done");
        if self.optional {
            view.with_button("Cancel")
        } else {
            view
        }
    }

    fn waiting_prompt(&self) -> PromptView {
        PromptView::waiting("opponent to select cards")
    }

    fn menu_command(&mut self, game: &mut Game, _player: PlayerId, arg: &MenuArg) -> bool {
        if self.complete {
            return false;
        }
        match arg {
            MenuArg::SelectCards(selected) if self.is_valid_selection(selected) => {
                self.finish(game, selected.clone());
                true
            }
            MenuArg::Done | MenuArg::Pass if self.optional => {
                self.cancel(game);
                true
            }
            _ => false,
        }
    }

    fn name(&self) -> &'static str {
        "SelectCardPrompt"
    }
}
