//! Engine error types.
//!
//! Expected game outcomes (a cost that was not paid, too few legal targets,
//! a conflict nobody wins) are not errors: they are reported with game
//! messages. These types cover misuse of the engine API and failures in
//! pluggable code (effect conditions, the scripting host).

use crate::cards::CardId;
use crate::core::{EntityId, PlayerId};

/// Errors returned by `Game` operations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("unknown card {0}")]
    UnknownCard(EntityId),

    #[error("no definition registered for card {0}")]
    UnknownDefinition(CardId),

    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("card {0} is not in play")]
    NotInPlay(EntityId),

    #[error("no prompt is waiting for input")]
    NoActivePrompt,

    #[error("{player} sent a command the current prompt rejected")]
    CommandRejected { player: PlayerId },

    #[error("script host failed: {0}")]
    Script(#[from] ScriptError),
}

/// Error raised while evaluating an effect condition.
///
/// The effect engine logs these and treats the effect as unchanged for
/// the current pass.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConditionError {
    #[error("condition refers to missing card {0}")]
    MissingCard(EntityId),

    #[error("condition requires an active conflict")]
    NoConflict,

    #[error("{0}")]
    Other(String),
}

/// Error raised by a scripting host.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    #[error("script function `{0}` not found")]
    UnknownFunction(String),

    #[error("bad arguments to `{function}`: {reason}")]
    BadArguments { function: String, reason: String },

    #[error("script failed: {0}")]
    Failed(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            EngineError::NotInPlay(EntityId(12)).to_string(),
            "card Entity(12) is not in play"
        );
        assert_eq!(
            EngineError::CommandRejected { player: PlayerId::new(1) }.to_string(),
            "Player 1 sent a command the current prompt rejected"
        );
    }

    #[test]
    fn test_script_error_converts() {
        let err: EngineError = ScriptError::UnknownFunction("onReveal".into()).into();
        assert_eq!(err.to_string(), "script host failed: script function `onReveal` not found");
    }
}
