//! Ring selection prompt.

use crate::core::PlayerId;
use crate::game::Game;
use crate::rings::Element;

use super::{MenuArg, Prompt, PromptView};

type RingHandler = Box<dyn FnOnce(&mut Game, Element)>;

/// Ask one player to select a ring.
pub struct SelectRingPrompt {
    player: PlayerId,
    title: String,
    rings: Vec<Element>,
    optional: bool,
    handler: Option<RingHandler>,
    complete: bool,
}

impl SelectRingPrompt {
    pub fn new(
        player: PlayerId,
        title: impl Into<String>,
        rings: Vec<Element>,
        handler: impl FnOnce(&mut Game, Element) + 'static,
    ) -> Self {
        Self {
            player,
            title: title.into(),
            rings,
            optional: false,
            handler: Some(Box::new(handler)),
            complete: false,
        }
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

impl Prompt for SelectRingPrompt {
    fn activate(&mut self, game: &mut Game) {
        if self.rings.is_empty() || (self.optional && game.state.player(self.player).disconnected) {
            self.complete = true;
            self.handler = None;
        }
    }

    fn active_condition(&self, _game: &Game, player: PlayerId) -> bool {
        player == self.player
    }

    fn is_complete(&self) -> bool {
        self.complete
    }

    fn active_prompt(&self, _game: &Game, _player: PlayerId) -> PromptView {
        let view = PromptView::new(self.title.clone()).with_rings(self.rings.iter().copied());
        if self.optional {
            view.with_button("Done")
        } else {
            view
        }
    }

    fn waiting_prompt(&self) -> PromptView {
        PromptView::waiting("opponent to select a ring")
    }

    fn menu_command(&mut self, game: &mut Game, _player: PlayerId, arg: &MenuArg) -> bool {
        if self.complete {
            return false;
        }
        match arg {
            MenuArg::SelectRing(element) if self.rings.contains(element) => {
                self.complete = true;
                if let Some(handler) = self.handler.take() {
                    handler(game, *element);
                }
                true
            }
            MenuArg::Done | MenuArg::Pass if self.optional => {
                self.complete = true;
                self.handler = None;
                true
            }
            _ => false,
        }
    }

    fn name(&self) -> &'static str {
        "SelectRingPrompt"
    }
}
