//! Game actions.
//!
//! Every change an ability makes goes through a `GameAction`: the action
//! says whether it can affect its targets, and turns each legal target into
//! an event. The events then resolve in an event window, so interrupts and
//! reactions see them.
//!
//! ## Key Types
//!
//! - `GameAction`: the action contract
//! - `CardAction`, `PlayerAction`, `RingAction`: the core actions
//! - `Sequential`, `Multiple`, `Joint`: combinators

pub mod card;
pub mod combinators;
pub mod player;
pub mod ring;

pub use card::{CardAction, CardActionKind};
pub use combinators::{Joint, Multiple, Sequential};
pub use player::{PlayerAction, PlayerActionKind};
pub use ring::{RingAction, RingActionKind};

use serde::{Deserialize, Serialize};

use crate::core::{EntityId, PlayerId};
use crate::events::EventId;
use crate::game::Game;
use crate::rings::Element;

/// Who is performing an action, and with what.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionContext {
    pub player: PlayerId,
    pub source: Option<EntityId>,
}

impl ActionContext {
    #[must_use]
    pub const fn new(player: PlayerId) -> Self {
        Self { player, source: None }
    }

    #[must_use]
    pub const fn with_source(mut self, source: EntityId) -> Self {
        self.source = Some(source);
        self
    }
}

/// Something an action can affect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionTarget {
    Card(EntityId),
    Player(PlayerId),
    Ring(Element),
}

/// A unit of game mutation.
pub trait GameAction: std::fmt::Debug {
    fn name(&self) -> &'static str;

    fn targets(&self) -> &[ActionTarget];

    /// Whether the action can affect this target right now.
    fn can_affect(&self, game: &Game, target: ActionTarget, context: &ActionContext) -> bool;

    fn has_legal_target(&self, game: &Game, context: &ActionContext) -> bool {
        self.targets().iter().any(|t| self.can_affect(game, *t, context))
    }

    /// Create the event that applies the action to one target.
    fn get_event(&self, game: &mut Game, target: ActionTarget, context: &ActionContext) -> EventId;

    /// Append one event per legal target.
    fn add_events_to_array(&self, game: &mut Game, context: &ActionContext, events: &mut Vec<EventId>) {
        for target in self.targets().to_vec() {
            if self.can_affect(game, target, context) {
                events.push(self.get_event(game, target, context));
            }
        }
    }

    /// Resolve the action on its own in a new event window.
    fn resolve(&self, game: &mut Game, context: &ActionContext) {
        let mut events = Vec::new();
        self.add_events_to_array(game, context, &mut events);
        if !events.is_empty() {
            game.open_event_window(events);
        }
    }
}
