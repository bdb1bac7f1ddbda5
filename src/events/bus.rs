//! Event subscriptions.
//!
//! Effects with "until" durations subscribe to the events that end them;
//! infrastructure code can subscribe callbacks. Every subscription returns
//! a `Subscription` handle, and disposing the handle is the only way to
//! unsubscribe. Disposal is idempotent.

use rustc_hash::FxHashMap;
use std::rc::Rc;

use crate::effects::EffectId;
use crate::game::Game;

use super::event::{EventName, EventPredicate, GameEvent};

/// Identifier of a single subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

/// What happens when a subscribed event resolves.
#[derive(Clone)]
pub enum Listener {
    /// Remove an effect once the predicate accepts the event.
    ExpireEffect { effect: EffectId, predicate: EventPredicate },

    Callback(Rc<dyn Fn(&mut Game, &GameEvent)>),
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExpireEffect { effect, .. } => f.debug_struct("ExpireEffect").field("effect", effect).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// Handle to a live subscription.
#[derive(Debug)]
pub struct Subscription {
    id: ListenerId,
    event: EventName,
    disposed: bool,
}

impl Subscription {
    #[must_use]
    pub fn event(&self) -> &EventName {
        &self.event
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Remove the listener. Returns `false` if already disposed.
    pub fn dispose(&mut self, bus: &mut EventBus) -> bool {
        if self.disposed {
            return false;
        }
        self.disposed = true;
        bus.remove(&self.event, self.id);
        true
    }
}

/// Listeners keyed by event name.
#[derive(Debug, Default)]
pub struct EventBus {
    listeners: FxHashMap<EventName, Vec<(ListenerId, Listener)>>,
    next_id: u32,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, event: EventName, listener: Listener) -> Subscription {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.entry(event.clone()).or_default().push((id, listener));
        Subscription {
            id,
            event,
            disposed: false,
        }
    }

    fn remove(&mut self, event: &EventName, id: ListenerId) {
        if let Some(list) = self.listeners.get_mut(event) {
            list.retain(|(lid, _)| *lid != id);
            if list.is_empty() {
                self.listeners.remove(event);
            }
        }
    }

    /// Snapshot of the listeners for an event, in subscription order.
    #[must_use]
    pub fn listeners_for(&self, event: &EventName) -> Vec<Listener> {
        self.listeners
            .get(event)
            .map(|list| list.iter().map(|(_, l)| l.clone()).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn listener_count(&self, event: &EventName) -> usize {
        self.listeners.get(event).map_or(0, Vec::len)
    }

    /// Total live subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
