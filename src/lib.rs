//! # l5r-engine
//!
//! A rules engine for the Legend of the Five Rings living card game.
//!
//! The engine owns the parts of the game every card depends on: lasting
//! effects and their durations, triggered ability windows, the staged
//! resolution of a single ability use, and the structure of a conflict.
//! Individual cards plug in through the `CardRegistry` (native abilities)
//! or a `ScriptHost` (scripted ones).
//!
//! ## Design Principles
//!
//! 1. **Nothing blocks**: every wait on a player is a prompt at the front
//!    of the step pipeline. `Game::update` runs until the pipeline drains
//!    or a prompt needs an answer; `Game::menu_command` answers it.
//!
//! 2. **Explicit world**: components receive the `Game` they work on as an
//!    argument. There are no globals.
//!
//! 3. **One way to move a card**: `Game::move_card` handles entering and
//!    leaving play, so registrations and effects never outlive their card.
//!
//! ## Modules
//!
//! - `core`: entity and player IDs, configuration, state, RNG, errors
//! - `cards`, `zones`, `rings`: the table
//! - `events`: events, trigger conditions, the event bus and event windows
//! - `pipeline`: cooperative step scheduling
//! - `prompts`: the prompt contract and the stock prompts
//! - `actions`: game actions and their combinators
//! - `effects`: lasting effects and the effect engine
//! - `costs`: ability costs and cost reducers
//! - `abilities`: card abilities, ability windows, the ability resolver
//! - `conflict`: the conflict flow
//! - `game`: the `Game` world
//! - `scripting`: the scripting bridge

pub mod core;
pub mod cards;
pub mod zones;
pub mod rings;
pub mod events;
pub mod pipeline;
pub mod prompts;
pub mod actions;
pub mod effects;
pub mod costs;
pub mod abilities;
pub mod conflict;
pub mod game;
pub mod scripting;

// Re-export commonly used types
pub use crate::core::{EngineError, EntityId, GameConfig, GameState, Phase, PlayerId, Result};

pub use crate::cards::{CardDefinition, CardId, CardInstance, CardRegistry, CardType, Keyword};

pub use crate::zones::{Location, ZoneId};

pub use crate::rings::{ConflictType, Element};

pub use crate::events::{EventId, EventName, GameEvent, TriggerCondition};

pub use crate::effects::{Duration, EffectEngine, GameEffect, StaticModifier};

pub use crate::abilities::{AbilityResolver, AbilityType, AbilityWindow, CardAbility};

pub use crate::costs::{CostReducer, CostSpec};

pub use crate::conflict::{Conflict, ConflictFlow, ConflictPhase};

pub use crate::game::{Game, MessageArg};

pub use crate::prompts::MenuArg;

pub use crate::scripting::{ScriptHost, ScriptValue};
