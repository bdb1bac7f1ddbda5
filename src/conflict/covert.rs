//! Covert assignment.
//!
//! Each attacker with Covert may choose one character that could defend;
//! that character cannot be declared as a defender in this conflict.
//!
//! When the number of covert attackers equals the number of characters
//! that could defend, they are paired up 1:1 automatically. If any pair
//! is illegal (the defender cannot be bypassed), the automatic pairing is
//! thrown away and the attacking player assigns each covert attacker by
//! hand instead.

use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

use crate::cards::Keyword;
use crate::core::{EntityId, GameState};
use crate::effects::StaticModifier;
use crate::events::{EventName, GameEvent};
use crate::game::Game;
use crate::prompts::{PromptStep, SelectCardPrompt};

use super::state::{can_defend, Conflict};

/// Attackers with Covert.
#[must_use]
pub fn covert_attackers(state: &GameState, conflict: &Conflict) -> Vec<EntityId> {
    conflict
        .attackers
        .iter()
        .copied()
        .filter(|id| state.card(*id).is_some_and(|c| c.has_keyword(Keyword::Covert)))
        .collect()
}

/// Characters that could be declared as defenders.
#[must_use]
pub fn covert_eligible_defenders(state: &GameState, conflict: &Conflict) -> Vec<EntityId> {
    let defender = conflict.defending_player;
    state
        .characters_in_play(defender)
        .into_iter()
        .filter(|id| can_defend(state, *id, defender, conflict.conflict_type))
        .collect()
}

/// Whether `defender` may be the target of a covert attacker.
#[must_use]
pub fn can_be_bypassed(state: &GameState, defender: EntityId) -> bool {
    state
        .card(defender)
        .is_some_and(|c| !c.has_modifier(|m| matches!(m, StaticModifier::CannotBeBypassedByCovert)))
}

/// Pair attackers with defenders in order. `None` unless the counts match
/// and every pair is legal.
#[must_use]
pub fn auto_pair(state: &GameState, attackers: &[EntityId], defenders: &[EntityId]) -> Option<Vec<(EntityId, EntityId)>> {
    if attackers.is_empty() || attackers.len() != defenders.len() {
        return None;
    }
    let pairs: Vec<_> = attackers.iter().copied().zip(defenders.iter().copied()).collect();
    pairs.iter().all(|(_, d)| can_be_bypassed(state, *d)).then_some(pairs)
}

/// Queue covert assignment for the current conflict.
pub(crate) fn prompt_for_covert(game: &mut Game) {
    let Some(conflict) = game.state.current_conflict.as_ref() else {
        return;
    };
    let attackers = covert_attackers(&game.state, conflict);
    if attackers.is_empty() {
        return;
    }
    let defenders = covert_eligible_defenders(&game.state, conflict);
    let player = conflict.attacking_player;

    if let Some(pairs) = auto_pair(&game.state, &attackers, &defenders) {
        debug!(count = pairs.len(), "covert paired automatically");
        if let Some(conflict) = game.state.current_conflict.as_mut() {
            conflict.covert_targets = pairs;
        }
        return;
    }

    let chosen = Rc::new(RefCell::new(Vec::<EntityId>::new()));
    for attacker in attackers {
        let chosen = Rc::clone(&chosen);
        let defenders = defenders.clone();
        game.queue_simple_step("covert", move |game| {
            let candidates: Vec<EntityId> = defenders
                .iter()
                .copied()
                .filter(|d| can_be_bypassed(&game.state, *d) && !chosen.borrow().contains(d))
                .collect();
            if candidates.is_empty() {
                return;
            }
            let prompt = SelectCardPrompt::new(player, "Choose a character to bypass with Covert", candidates, {
                let chosen = Rc::clone(&chosen);
                move |game, selected| {
                    let Some(target) = selected.first().copied() else {
                        return;
                    };
                    chosen.borrow_mut().push(target);
                    if let Some(conflict) = game.state.current_conflict.as_mut() {
                        conflict.covert_targets.push((attacker, target));
                    }
                }
            })
            .optional(|_| {});
            game.queue_step(Box::new(PromptStep::new(prompt)));
        });
    }
}

/// Apply covert assignments: each chosen defender is bypassed.
pub(crate) fn resolve_covert(game: &mut Game) {
    let Some(pairs) = game.state.current_conflict.as_ref().map(|c| c.covert_targets.clone()) else {
        return;
    };
    for (attacker, defender) in pairs {
        if let Some(card) = game.state.card_mut(defender) {
            card.covert_bypassed = true;
        }
        debug!(%attacker, %defender, "covert resolved");
        game.raise_event(
            GameEvent::new(EventName::COVERT_RESOLVED).with_card(defender).with_source(attacker),
            |_, _| {},
        );
    }
}
