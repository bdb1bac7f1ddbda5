//! Game configuration.
//!
//! `GameConfig` carries the tunable numbers of a game: starting resources,
//! honor thresholds, the fixed-point loop cap of the effect engine and
//! prompt behavior. It is serde-friendly so tournament settings can be
//! loaded from JSON.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The phases of an L5R round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Setup,
    Dynasty,
    Draw,
    Conflict,
    Fate,
    Regroup,
}

impl Phase {
    /// The phase that follows this one. `Regroup` wraps to `Dynasty`.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Phase::Setup => Phase::Dynasty,
            Phase::Dynasty => Phase::Draw,
            Phase::Draw => Phase::Conflict,
            Phase::Conflict => Phase::Fate,
            Phase::Fate => Phase::Regroup,
            Phase::Regroup => Phase::Dynasty,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Phase::Setup => "setup",
            Phase::Dynasty => "dynasty",
            Phase::Draw => "draw",
            Phase::Conflict => "conflict",
            Phase::Fate => "fate",
            Phase::Regroup => "regroup",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Complete game configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Always 2 for L5R; kept explicit so `PlayerMap`s are sized from config.
    pub player_count: usize,

    pub player_names: Vec<String>,

    pub starting_honor: i32,
    pub starting_fate: i32,

    /// Honor at or above which a player wins.
    pub honor_victory: i32,

    /// Maximum passes of the effect engine's fixed-point loop.
    pub max_effect_loops: u32,

    /// Honor lost by a player who does not defend a conflict they lose.
    pub unopposed_honor_loss: i32,

    /// Pick a target automatically when exactly one legal choice exists.
    pub auto_single_target: bool,

    /// Abandoned-prompt timeout. Recorded for front ends, not enforced.
    pub window_timeout: Option<Duration>,

    /// Seed for deck shuffles and random discards.
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_count: 2,
            player_names: vec!["Player 1".to_string(), "Player 2".to_string()],
            starting_honor: 10,
            starting_fate: 7,
            honor_victory: 25,
            max_effect_loops: 10,
            unopposed_honor_loss: 1,
            auto_single_target: true,
            window_timeout: None,
            seed: 0,
        }
    }
}

impl GameConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_player_names(mut self, first: impl Into<String>, second: impl Into<String>) -> Self {
        self.player_names = vec![first.into(), second.into()];
        self
    }

    #[must_use]
    pub fn with_starting_honor(mut self, honor: i32) -> Self {
        self.starting_honor = honor;
        self
    }

    #[must_use]
    pub fn with_starting_fate(mut self, fate: i32) -> Self {
        self.starting_fate = fate;
        self
    }

    #[must_use]
    pub fn with_max_effect_loops(mut self, loops: u32) -> Self {
        self.max_effect_loops = loops;
        self
    }

    #[must_use]
    pub fn with_auto_single_target(mut self, auto: bool) -> Self {
        self.auto_single_target = auto;
        self
    }

    #[must_use]
    pub fn with_window_timeout(mut self, timeout: Duration) -> Self {
        self.window_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Display name for a player index, falling back to "Player N".
    #[must_use]
    pub fn player_name(&self, index: usize) -> String {
        self.player_names
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("Player {}", index + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.player_count, 2);
        assert_eq!(config.max_effect_loops, 10);
        assert_eq!(config.unopposed_honor_loss, 1);
        assert!(config.window_timeout.is_none());
    }

    #[test]
    fn test_builder() {
        let config = GameConfig::new()
            .with_player_names("Crab", "Crane")
            .with_starting_honor(12)
            .with_seed(99)
            .with_window_timeout(Duration::from_secs(30));

        assert_eq!(config.player_name(0), "Crab");
        assert_eq!(config.player_name(1), "Crane");
        assert_eq!(config.player_name(5), "Player 6");
        assert_eq!(config.starting_honor, 12);
        assert_eq!(config.seed, 99);
        assert_eq!(config.window_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_partial_json() {
        let config: GameConfig = serde_json::from_str(r#"{ "starting_fate": 9 }"#).unwrap();
        assert_eq!(config.starting_fate, 9);
        assert_eq!(config.starting_honor, 10);
    }

    #[test]
    fn test_phase_order() {
        assert_eq!(Phase::Dynasty.next(), Phase::Draw);
        assert_eq!(Phase::Regroup.next(), Phase::Dynasty);
        assert_eq!(format!("{}", Phase::Conflict), "conflict");
    }
}
