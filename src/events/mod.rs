//! Events: what happened, who may respond, and how it resolves.
//!
//! ## Key Types
//!
//! - `GameEvent`: event data (card, player, ring, amount, tags)
//! - `EventName`: the event kind abilities and durations key on
//! - `TriggerCondition`: declarative filter for triggered abilities
//! - `EventBus`: name-keyed listeners with disposable subscriptions
//! - `EventWindow`: the pipeline step that resolves a batch of events

pub mod bus;
pub mod condition;
pub mod event;
pub mod window;

pub use bus::{EventBus, Listener, ListenerId, Subscription};
pub use condition::{ConditionContext, ConditionEvaluator, EventFilter, TriggerCondition};
pub use event::{EventId, EventName, EventPredicate, GameEvent};
pub use window::EventWindow;
