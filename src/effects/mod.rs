//! Continuous and delayed effects.
//!
//! ## Key Types
//!
//! - `GameEffect`: a modifier or delayed action with a duration
//! - `Duration`: when an effect ends, including pass-priority escalation
//! - `StaticModifier`: what a static effect does to its targets
//! - `EffectEngine`: the live effect set and its fixed-point check

mod effect;
mod engine;

pub use effect::{
    DelayedEffect, DelayedFiring, Duration, EffectContext, EffectId, EffectPayload, EffectTarget, GameEffect,
    StaticModifier, TargetKind,
};
pub use engine::EffectEngine;
