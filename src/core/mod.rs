//! Core engine types: entities, players, state, RNG, configuration, errors.

pub mod config;
pub mod entity;
pub mod error;
pub mod player;
pub mod rng;
pub mod state;

pub use config::{GameConfig, Phase};
pub use entity::EntityId;
pub use error::{ConditionError, EngineError, Result, ScriptError};
pub use player::{PlayerId, PlayerMap, PlayerState};
pub use rng::GameRng;
pub use state::GameState;
