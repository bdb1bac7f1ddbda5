//! Ability costs.
//!
//! Each cost is paid through an event, so interrupts can respond to (and
//! cancel) the payment. The resolver treats a cost as paid only once its
//! event resolved uncancelled.

use serde::{Deserialize, Serialize};

use crate::abilities::AbilityContext;
use crate::actions::{ActionTarget, CardAction, GameAction, PlayerAction};
use crate::core::{EntityId, PlayerId};
use crate::events::{EventId, EventName, GameEvent};
use crate::game::Game;

use super::reducer::ReducerId;

/// Where a card is played from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayType {
    PlayFromHand,
    PlayFromProvince,
    /// Not a card play: an ability of a card already on the table.
    Ability,
}

/// A cost an ability must pay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CostSpec {
    PayFate(i32),
    /// The card's printed cost after reductions.
    PayPrintedCost(PlayType),
    BowSelf,
    LoseHonor(i32),
    RemoveFateFromSelf(i32),
    SacrificeSelf,
}

impl CostSpec {
    #[must_use]
    pub fn can_pay(&self, game: &Game, context: &AbilityContext) -> bool {
        let player = game.state.player(context.player);
        let source = game.state.card(context.source);
        match *self {
            Self::PayFate(amount) => player.fate >= amount,
            Self::PayPrintedCost(play_type) => {
                let (cost, _) = reduced_cost(game, context.source, context.player, play_type, context.first_target());
                player.fate >= cost
            }
            Self::BowSelf => source.is_some_and(|c| c.is_in_play() && !c.bowed),
            Self::LoseHonor(amount) => player.honor >= amount,
            Self::RemoveFateFromSelf(amount) => source.is_some_and(|c| c.fate >= amount),
            Self::SacrificeSelf => source.is_some_and(|c| c.is_in_play()),
        }
    }

    /// Create the event that pays this cost.
    pub fn pay_event(&self, game: &mut Game, context: &AbilityContext) -> EventId {
        let action_ctx = context.action_context();
        let source = context.source;
        let player = context.player;
        match *self {
            Self::PayFate(amount) => spend_fate(game, player, source, amount, Vec::new()),
            Self::PayPrintedCost(play_type) => {
                let (amount, reducers) = reduced_cost(game, source, player, play_type, context.first_target());
                spend_fate(game, player, source, amount, reducers)
            }
            Self::BowSelf => CardAction::bow([source]).get_event(game, ActionTarget::Card(source), &action_ctx),
            Self::LoseHonor(amount) => {
                PlayerAction::lose_honor(player, amount).get_event(game, ActionTarget::Player(player), &action_ctx)
            }
            Self::RemoveFateFromSelf(amount) => {
                CardAction::remove_fate([source], amount).get_event(game, ActionTarget::Card(source), &action_ctx)
            }
            Self::SacrificeSelf => {
                CardAction::discard([source]).get_event(game, ActionTarget::Card(source), &action_ctx)
            }
        }
    }
}

/// Printed cost minus applicable reductions, never below zero, and the
/// reducers that would be used.
pub(crate) fn reduced_cost(
    game: &Game,
    card: EntityId,
    player: PlayerId,
    play_type: PlayType,
    target: Option<EntityId>,
) -> (i32, Vec<ReducerId>) {
    let printed = game.state.card(card).and_then(|c| c.printed_cost).unwrap_or(0);
    let (reduction, used) = game
        .reducers
        .reduction(&game.state, &game.limits, player, card, play_type, target);
    ((printed - reduction).max(0), used)
}

fn spend_fate(game: &mut Game, player: PlayerId, source: EntityId, amount: i32, reducers: Vec<ReducerId>) -> EventId {
    let event = GameEvent::new(EventName::SPEND_FATE)
        .with_player(player)
        .with_card(source)
        .with_amount(amount);
    game.get_event(event, move |game, _| {
        let state = game.state.player_mut(player);
        state.fate = (state.fate - amount).max(0);
        if !reducers.is_empty() {
            game.reducers.mark_used(&reducers, &mut game.limits);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_spec_serializes() {
        let json = serde_json::to_string(&CostSpec::PayPrintedCost(PlayType::PlayFromProvince)).unwrap();
        let back: CostSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, CostSpec::PayPrintedCost(PlayType::PlayFromProvince));
    }
}
