//! Player prompts.
//!
//! A prompt is the only way the engine waits on a player. Every prompt
//! answers the same questions: is this player the one being asked
//! (`active_condition`), is it done (`is_complete`), what should the asked
//! player and everyone else see (`active_prompt` / `waiting_prompt`), and
//! does a given menu command answer it (`menu_command`).
//!
//! The engine never renders prompts. `PromptView` is the render payload a
//! client turns into buttons and highlights.
//!
//! ## Key Types
//!
//! - `Prompt`: the contract
//! - `PromptStep`: runs a prompt as a pipeline step
//! - `MenuArg`: player input
//! - `ChoicePrompt`, `SelectCardPrompt`, `SelectRingPrompt`, `ActionWindow`

pub mod action_window;
pub mod choice;
pub mod select_card;
pub mod select_ring;

pub use action_window::ActionWindow;
pub use choice::ChoicePrompt;
pub use select_card::SelectCardPrompt;
pub use select_ring::SelectRingPrompt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::{EntityId, PlayerId};
use crate::game::Game;
use crate::pipeline::GameStep;
use crate::rings::{ConflictType, Element};

/// Input from a player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MenuArg {
    /// Press the button at this index.
    Choice(usize),
    SelectCards(Vec<EntityId>),
    SelectRing(Element),
    DeclareConflict {
        ring: Element,
        conflict_type: ConflictType,
        province: u8,
        attackers: Vec<EntityId>,
    },
    /// Use the card's ability at this index in `Game::abilities_of`.
    UseAbility { card: EntityId, index: usize },
    Pass,
    Done,
}

/// What a client shows for a prompt.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptView {
    pub title: String,
    pub buttons: Vec<String>,
    pub selectable_cards: Vec<EntityId>,
    pub selectable_rings: Vec<Element>,
}

impl PromptView {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// The payload shown to players who are not being asked.
    #[must_use]
    pub fn waiting(for_what: impl std::fmt::Display) -> Self {
        Self::new(format!("Waiting for {for_what}"))
    }

    #[must_use]
    pub fn with_button(mut self, text: impl Into<String>) -> Self {
        self.buttons.push(text.into());
        self
    }

    #[must_use]
    pub fn with_cards(mut self, cards: impl IntoIterator<Item = EntityId>) -> Self {
        self.selectable_cards.extend(cards);
        self
    }

    #[must_use]
    pub fn with_rings(mut self, rings: impl IntoIterator<Item = Element>) -> Self {
        self.selectable_rings.extend(rings);
        self
    }
}

/// The prompt contract.
pub trait Prompt {
    /// Called once when the prompt reaches the front of the pipeline.
    fn activate(&mut self, _game: &mut Game) {}

    /// Whether `player` is the one being asked.
    fn active_condition(&self, game: &Game, player: PlayerId) -> bool;

    fn is_complete(&self) -> bool;

    fn active_prompt(&self, game: &Game, player: PlayerId) -> PromptView;

    fn waiting_prompt(&self) -> PromptView;

    /// Handle input from an active player. Returns whether it was accepted.
    fn menu_command(&mut self, game: &mut Game, player: PlayerId, arg: &MenuArg) -> bool;

    fn name(&self) -> &'static str {
        "Prompt"
    }
}

/// Runs a `Prompt` as a pipeline step.
pub struct PromptStep<P: Prompt> {
    prompt: P,
    activated: bool,
}

impl<P: Prompt> PromptStep<P> {
    pub fn new(prompt: P) -> Self {
        Self {
            prompt,
            activated: false,
        }
    }
}

impl<P: Prompt + 'static> GameStep for PromptStep<P> {
    fn continue_step(&mut self, game: &mut Game) -> bool {
        if !self.activated {
            self.activated = true;
            self.prompt.activate(game);
        }
        self.prompt.is_complete()
    }

    fn handle_menu_command(&mut self, game: &mut Game, player: PlayerId, arg: &MenuArg) -> bool {
        if !self.prompt.active_condition(game, player) {
            warn!(%player, prompt = self.prompt.name(), "command from inactive player");
            return false;
        }
        self.prompt.menu_command(game, player, arg)
    }

    fn current_prompt(&self) -> Option<&dyn Prompt> {
        if self.prompt.is_complete() {
            None
        } else {
            Some(&self.prompt)
        }
    }

    fn name(&self) -> &'static str {
        self.prompt.name()
    }
}
