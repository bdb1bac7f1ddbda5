//! Action combinators.
//!
//! Each combinator checks every sub-action's own legality before adding
//! its events.

use std::rc::Rc;

use crate::events::{EventId, EventName, GameEvent};
use crate::game::Game;

use super::{ActionContext, ActionTarget, GameAction};

/// Sub-actions resolved one after another, each in its own then window,
/// so later actions see the results of earlier ones.
#[derive(Clone, Debug)]
pub struct Sequential {
    actions: Vec<Rc<dyn GameAction>>,
}

impl Sequential {
    pub fn new(actions: Vec<Rc<dyn GameAction>>) -> Self {
        Self { actions }
    }
}

impl GameAction for Sequential {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn targets(&self) -> &[ActionTarget] {
        &[]
    }

    fn can_affect(&self, game: &Game, target: ActionTarget, context: &ActionContext) -> bool {
        self.actions.iter().any(|a| a.can_affect(game, target, context))
    }

    fn has_legal_target(&self, game: &Game, context: &ActionContext) -> bool {
        self.actions.iter().any(|a| a.has_legal_target(game, context))
    }

    fn get_event(&self, game: &mut Game, _target: ActionTarget, context: &ActionContext) -> EventId {
        let actions = self.actions.clone();
        let context = *context;
        game.get_event(GameEvent::new(EventName::SEQUENTIAL_ACTIONS).with_player(context.player), move |game, _| {
            for action in actions {
                game.queue_simple_step("sequential action", move |game| {
                    let mut events = Vec::new();
                    if action.has_legal_target(game, &context) {
                        action.add_events_to_array(game, &context, &mut events);
                    }
                    if !events.is_empty() {
                        game.open_then_event_window(events);
                    }
                });
            }
        })
    }

    fn add_events_to_array(&self, game: &mut Game, context: &ActionContext, events: &mut Vec<EventId>) {
        if self.has_legal_target(game, context) {
            events.push(self.get_event(game, ActionTarget::Player(context.player), context));
        }
    }
}

/// Every sub-action that has a legal target, resolved together.
#[derive(Clone, Debug)]
pub struct Multiple {
    actions: Vec<Rc<dyn GameAction>>,
}

impl Multiple {
    pub fn new(actions: Vec<Rc<dyn GameAction>>) -> Self {
        Self { actions }
    }
}

impl GameAction for Multiple {
    fn name(&self) -> &'static str {
        "multiple"
    }

    fn targets(&self) -> &[ActionTarget] {
        &[]
    }

    fn can_affect(&self, game: &Game, target: ActionTarget, context: &ActionContext) -> bool {
        self.actions.iter().any(|a| a.can_affect(game, target, context))
    }

    fn has_legal_target(&self, game: &Game, context: &ActionContext) -> bool {
        self.actions.iter().any(|a| a.has_legal_target(game, context))
    }

    fn get_event(&self, game: &mut Game, target: ActionTarget, context: &ActionContext) -> EventId {
        let mut events = Vec::new();
        for action in &self.actions {
            if action.can_affect(game, target, context) {
                events.push(action.get_event(game, target, context));
            }
        }
        events
            .first()
            .copied()
            .unwrap_or_else(|| game.get_event(GameEvent::new(EventName::SEQUENTIAL_ACTIONS), |_, _| {}))
    }

    fn add_events_to_array(&self, game: &mut Game, context: &ActionContext, events: &mut Vec<EventId>) {
        for action in &self.actions {
            if action.has_legal_target(game, context) {
                action.add_events_to_array(game, context, events);
            }
        }
    }
}

/// All-or-nothing: events are added only if every sub-action has a legal
/// target, and if any of them is cancelled the others fail too.
#[derive(Clone, Debug)]
pub struct Joint {
    actions: Vec<Rc<dyn GameAction>>,
}

impl Joint {
    pub fn new(actions: Vec<Rc<dyn GameAction>>) -> Self {
        Self { actions }
    }
}

impl GameAction for Joint {
    fn name(&self) -> &'static str {
        "joint"
    }

    fn targets(&self) -> &[ActionTarget] {
        &[]
    }

    fn can_affect(&self, game: &Game, target: ActionTarget, context: &ActionContext) -> bool {
        self.actions.iter().all(|a| a.can_affect(game, target, context))
    }

    fn has_legal_target(&self, game: &Game, context: &ActionContext) -> bool {
        !self.actions.is_empty() && self.actions.iter().all(|a| a.has_legal_target(game, context))
    }

    fn get_event(&self, game: &mut Game, target: ActionTarget, context: &ActionContext) -> EventId {
        let mut events = Vec::new();
        for action in &self.actions {
            events.push(action.get_event(game, target, context));
        }
        Self::link(game, &events);
        events
            .first()
            .copied()
            .unwrap_or_else(|| game.get_event(GameEvent::new(EventName::SEQUENTIAL_ACTIONS), |_, _| {}))
    }

    fn add_events_to_array(&self, game: &mut Game, context: &ActionContext, events: &mut Vec<EventId>) {
        if !self.has_legal_target(game, context) {
            return;
        }
        let mut joint = Vec::new();
        for action in &self.actions {
            action.add_events_to_array(game, context, &mut joint);
        }
        Self::link(game, &joint);
        events.extend(joint);
    }
}

impl Joint {
    /// Each event only resolves while none of its siblings is cancelled.
    fn link(game: &mut Game, events: &[EventId]) {
        for id in events {
            let siblings: Vec<EventId> = events.iter().copied().filter(|s| s != id).collect();
            game.set_event_condition(*id, move |game, _| {
                siblings.iter().all(|s| game.event(*s).is_some_and(|e| !e.cancelled))
            });
        }
    }
}
