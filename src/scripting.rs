//! The scripting bridge.
//!
//! Cards whose behavior is not written in Rust get it from a `ScriptHost`.
//! The host supplies abilities for a card, which are registered exactly
//! like native ones, and runs named functions on request. The engine never
//! looks inside the host.

use serde::{Deserialize, Serialize};

use crate::abilities::CardAbility;
use crate::cards::CardDefinition;
use crate::core::{EntityId, GameState, PlayerId, ScriptError};
use crate::events::GameEvent;
use crate::game::Game;

/// A value passed to or returned from a script.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    Card(EntityId),
    Player(PlayerId),
    List(Vec<ScriptValue>),
}

impl ScriptValue {
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_card(&self) -> Option<EntityId> {
        match self {
            Self::Card(id) => Some(*id),
            _ => None,
        }
    }
}

/// External provider of card behavior.
pub trait ScriptHost {
    /// Abilities the script defines for a card. Called once per card
    /// definition.
    fn abilities_for(&self, card: EntityId, definition: &CardDefinition) -> Vec<CardAbility>;

    /// Run a named function of a card's script.
    fn invoke(
        &self,
        game: &mut Game,
        card: EntityId,
        function: &str,
        args: &[ScriptValue],
    ) -> Result<ScriptValue, ScriptError>;

    /// Evaluate a custom trigger condition.
    fn evaluate_condition(&self, _state: &GameState, _card: EntityId, _key: &str, _event: &GameEvent) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        assert_eq!(ScriptValue::Bool(true).as_bool(), Some(true));
        assert_eq!(ScriptValue::Int(3).as_int(), Some(3));
        assert_eq!(ScriptValue::Card(EntityId(9)).as_card(), Some(EntityId(9)));
        assert_eq!(ScriptValue::Null.as_int(), None);
    }

    #[test]
    fn test_round_trip() {
        let value = ScriptValue::List(vec![ScriptValue::Player(PlayerId::new(1)), ScriptValue::Text("x".into())]);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(serde_json::from_str::<ScriptValue>(&json).unwrap(), value);
    }
}
