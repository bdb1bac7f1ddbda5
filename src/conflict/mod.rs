//! Conflicts.
//!
//! ## Key Types
//!
//! - `Conflict`: who attacks what, with whom, and who won
//! - `ConflictFlow`: one conflict opportunity, declaration to completion
//! - `ConflictPhase`: alternates conflict opportunities between players
//! - `DeclareConflictPrompt`: the attacker's declaration (or pass)
//!
//! Covert assignment and ring effects live in their own modules.

pub mod covert;
pub mod declare;
pub mod flow;
pub mod phase;
pub mod ring_effects;
pub mod state;

pub use declare::{DeclarationError, Declaration, DeclareConflictPrompt};
pub use flow::ConflictFlow;
pub use phase::ConflictPhase;
pub use ring_effects::resolve_ring_effect;
pub use state::{can_attack, can_defend, Conflict};
