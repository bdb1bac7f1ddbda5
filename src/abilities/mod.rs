//! Abilities: what cards can do, when, and how a use of one resolves.
//!
//! ## Key Types
//!
//! - `CardAbility`: an ability's timing, costs, targets and effect
//! - `AbilityContext`: one use of an ability
//! - `AbilityWindow`: triggered ability registrations and window queue
//! - `TriggeredAbilityWindow`: offers one ability type's responses
//! - `AbilityResolver`: drives a use of an ability through its stages
//! - `LimitTracker`: per-round / per-conflict usage counters

pub mod ability;
pub mod context;
pub mod limit;
pub mod resolver;
pub mod simultaneous;
pub mod targets;
pub mod triggered;
pub mod window;

pub use ability::{AbilityEffect, AbilityId, AbilityType, CardAbility};
pub use context::AbilityContext;
pub use limit::{AbilityLimit, LimitKey, LimitScope, LimitTracker};
pub use resolver::AbilityResolver;
pub use simultaneous::SimultaneousEffectWindow;
pub use targets::{TargetChooser, TargetSpec};
pub use triggered::TriggeredAbilityWindow;
pub use window::{AbilityRegistration, AbilityWindow, RegistrationId, TriggerChoice, WindowId};
