//! Card system: definitions, instances, and registry.
//!
//! ## Key Types
//!
//! - `CardId`: identifier of a printed card
//! - `CardDefinition`: printed data (type, cost, skills, keywords)
//! - `CardInstance`: runtime state (bowed, fate, honor status, modifiers)
//! - `CardRegistry`: definitions plus the native ability catalog

pub mod definition;
pub mod instance;
pub mod registry;

pub use definition::{CardDefinition, CardId, CardType, DeckSide, Keyword};
pub use instance::{CardInstance, HonorStatus};
pub use registry::CardRegistry;
