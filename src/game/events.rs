//! The event arena and window frames.
//!
//! Events live in an arena keyed by `EventId` so windows, resolvers and
//! combinators can refer to them after creation and see whether they were
//! cancelled or resolved. Every open `EventWindow` pushes a frame; events
//! added mid-window join the innermost frame, and then windows hand their
//! reaction events to the frame below.
//!
//! Settled events (resolved or cancelled) are dropped from the arena once
//! nothing can refer to them any more: no window frame is open, no ability
//! window is open or queued, and no ability resolution holds events.

use tracing::debug;

use crate::abilities::LimitScope;
use crate::events::{EventId, EventName, EventWindow, GameEvent, Listener};

use super::Game;

type EventHandler = Box<dyn FnOnce(&mut Game, EventId)>;
type EventCondition = std::rc::Rc<dyn Fn(&mut Game, EventId) -> bool>;

pub(super) struct EventRecord {
    pub(super) event: GameEvent,
    handler: Option<EventHandler>,
    condition: Option<EventCondition>,
}

#[derive(Debug, Default)]
pub(super) struct WindowFrame {
    additions: Vec<EventId>,
    then_events: Vec<EventId>,
    reactions_open: bool,
}

impl Game {
    // === Event arena ===

    /// Create an event. `handler` runs when it resolves.
    pub fn get_event(&mut self, mut event: GameEvent, handler: impl FnOnce(&mut Game, EventId) + 'static) -> EventId {
        let id = EventId::new(self.next_event);
        self.next_event += 1;
        event.id = id;
        self.events.insert(
            id,
            EventRecord {
                event,
                handler: Some(Box::new(handler)),
                condition: None,
            },
        );
        id
    }

    #[must_use]
    pub fn event(&self, id: EventId) -> Option<&GameEvent> {
        self.events.get(&id).map(|r| &r.event)
    }

    pub fn event_mut(&mut self, id: EventId) -> Option<&mut GameEvent> {
        self.events.get_mut(&id).map(|r| &mut r.event)
    }

    /// The event only resolves while `condition` holds. Checked when its
    /// window opens and again right before it resolves.
    pub fn set_event_condition(&mut self, id: EventId, condition: impl Fn(&mut Game, EventId) -> bool + 'static) {
        if let Some(record) = self.events.get_mut(&id) {
            record.condition = Some(std::rc::Rc::new(condition));
        }
    }

    pub fn check_event_condition(&mut self, id: EventId) -> bool {
        let condition = match self.events.get(&id) {
            Some(record) => record.condition.clone(),
            None => return false,
        };
        condition.map_or(true, |c| c(self, id))
    }

    pub fn cancel_event(&mut self, id: EventId) {
        if let Some(record) = self.events.get_mut(&id) {
            if !record.event.cancelled {
                debug!(event = %id, name = %record.event.name, "cancel event");
            }
            record.event.cancelled = true;
            record.handler = None;
        }
    }

    /// Run an event's handler, then its duration boundaries and bus
    /// listeners.
    pub fn resolve_event(&mut self, id: EventId) {
        let handler = match self.events.get_mut(&id) {
            Some(record) if !record.event.resolved && !record.event.cancelled => {
                record.event.resolved = true;
                record.handler.take()
            }
            _ => return,
        };
        if let Some(handler) = handler {
            handler(self, id);
        }
        let Some(event) = self.event(id).cloned() else {
            return;
        };
        debug!(event = %id, name = %event.name, "event resolved");
        self.on_event_resolved(&event);
    }

    fn on_event_resolved(&mut self, event: &GameEvent) {
        let name = &event.name;
        if *name == EventName::PHASE_ENDED {
            self.effects.on_phase_ended(&mut self.state, &mut self.bus);
            self.limits.reset_scope(LimitScope::Phase);
        } else if *name == EventName::ROUND_ENDED {
            self.effects.on_round_ended(&mut self.state, &mut self.bus);
            self.limits.reset_scope(LimitScope::Round);
        } else if *name == EventName::CONFLICT_FINISHED {
            self.effects.on_conflict_finished(&mut self.state, &mut self.bus);
            self.limits.reset_scope(LimitScope::Conflict);
        } else if *name == EventName::DUEL_FINISHED {
            self.effects.on_duel_finished(&mut self.state, &mut self.bus);
        } else if *name == EventName::PASS_ACTION_PHASE_PRIORITY {
            self.effects.on_pass_priority(&mut self.state, &mut self.bus);
        }

        for listener in self.bus.listeners_for(name) {
            match listener {
                Listener::ExpireEffect { effect, predicate } => {
                    if predicate(&self.state, event) {
                        self.effects.remove(effect, &mut self.state, &mut self.bus);
                    }
                }
                Listener::Callback(callback) => callback(self, event),
            }
        }
    }

    // === Windows ===

    /// Resolve events together in a new window.
    pub fn open_event_window(&mut self, events: Vec<EventId>) {
        self.queue_step(Box::new(EventWindow::new(events)));
    }

    /// Resolve events caused by an ability's effect. Their reactions join
    /// the enclosing window.
    pub fn open_then_event_window(&mut self, events: Vec<EventId>) {
        self.queue_step(Box::new(EventWindow::then(events)));
    }

    /// Create an event and open a window for it.
    pub fn raise_event(&mut self, event: GameEvent, handler: impl FnOnce(&mut Game, EventId) + 'static) -> EventId {
        let id = self.get_event(event, handler);
        self.open_event_window(vec![id]);
        id
    }

    /// Add an event to the innermost open window, or open one for it.
    pub fn add_event_to_window(&mut self, id: EventId) {
        match self.frames.last_mut() {
            Some(frame) => frame.additions.push(id),
            None => self.open_event_window(vec![id]),
        }
    }

    pub(crate) fn push_window_frame(&mut self) {
        self.frames.push(WindowFrame::default());
    }

    pub(crate) fn pop_window_frame(&mut self) {
        if let Some(frame) = self.frames.pop() {
            if !frame.additions.is_empty() || !frame.then_events.is_empty() {
                debug!(
                    additions = frame.additions.len(),
                    then_events = frame.then_events.len(),
                    "window closed with unprocessed events"
                );
            }
        }
        self.prune_events();
    }

    /// Keep settled events until `release_events`.
    pub(crate) fn hold_events(&mut self) {
        self.event_holds += 1;
    }

    pub(crate) fn release_events(&mut self) {
        self.event_holds = self.event_holds.saturating_sub(1);
        self.prune_events();
    }

    /// Events in the arena, settled or not.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    fn prune_events(&mut self) {
        if !self.frames.is_empty()
            || self.event_holds > 0
            || self.abilities.is_window_open()
            || self.abilities.pending_windows() > 0
        {
            return;
        }
        let before = self.events.len();
        self.events.retain(|_, r| !r.event.resolved && !r.event.cancelled);
        let pruned = before - self.events.len();
        if pruned > 0 {
            debug!(pruned, live = self.events.len(), "pruned settled events");
        }
    }

    pub(crate) fn take_frame_additions(&mut self) -> Vec<EventId> {
        self.frames
            .last_mut()
            .map(|f| std::mem::take(&mut f.additions))
            .unwrap_or_default()
    }

    pub(crate) fn take_then_events(&mut self) -> Vec<EventId> {
        self.frames
            .last_mut()
            .map(|f| std::mem::take(&mut f.then_events))
            .unwrap_or_default()
    }

    pub(crate) fn mark_reactions_open(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            frame.reactions_open = true;
        }
    }

    /// Hand reaction events to the enclosing window. Returns `false` when
    /// there is no enclosing window or its reactions are already being
    /// offered.
    pub(crate) fn defer_to_parent_frame(&mut self, events: Vec<EventId>) -> bool {
        let depth = self.frames.len();
        if depth < 2 {
            return false;
        }
        let parent = &mut self.frames[depth - 2];
        if parent.reactions_open {
            return false;
        }
        for id in events {
            if !parent.then_events.contains(&id) {
                parent.then_events.push(id);
            }
        }
        true
    }
}
