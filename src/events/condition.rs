//! Trigger conditions.
//!
//! A triggered ability names the event it responds to; its condition
//! narrows that down using the event data and the game state. Common
//! conditions are data; anything else is either a `Predicate` closure
//! (native cards) or a `Custom` key answered by the script host.

use serde::{Deserialize, Serialize};
use std::rc::Rc;

use crate::cards::CardType;
use crate::core::{EntityId, GameState, PlayerId};
use crate::rings::Element;
use crate::zones::Location;

use super::event::{EventPredicate, GameEvent};

/// Closure condition. Compared by identity.
#[derive(Clone)]
pub struct EventFilter(pub EventPredicate);

impl EventFilter {
    pub fn new(f: impl Fn(&GameState, &GameEvent) -> bool + 'static) -> Self {
        Self(Rc::new(f))
    }
}

impl PartialEq for EventFilter {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for EventFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EventFilter(..)")
    }
}

/// A condition that must hold for a triggered ability to be eligible.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TriggerCondition {
    // === Entity Filters ===

    /// The event's card is this card.
    CardIs(EntityId),

    /// The event's card is the ability's own card.
    CardIsSource,

    /// The event's player is this player.
    PlayerIs(PlayerId),

    /// The event's player controls the ability's card.
    PlayerIsController,

    /// The event's player is the opponent of the ability's controller.
    PlayerIsOpponent,

    /// The event's card is controlled by the ability's controller.
    CardControlledByController,

    /// The event's card is controlled by an opponent.
    CardControlledByOpponent,

    /// The event's card is in this location.
    CardInLocation(Location),

    /// The event's card has this type.
    CardType(CardType),

    /// The ability's card is participating in the current conflict.
    SourceParticipating,

    RingIs(Element),

    // === Value Filters ===

    AmountAtLeast(i32),

    HasTag(String),

    // === Combinators ===

    All(Vec<TriggerCondition>),
    Any(Vec<TriggerCondition>),
    Not(Box<TriggerCondition>),

    // === Special ===

    Always,
    Never,

    /// Evaluated by the script host.
    Custom(String),

    /// Native closure.
    #[serde(skip)]
    Predicate(EventFilter),
}

impl TriggerCondition {
    pub fn predicate(f: impl Fn(&GameState, &GameEvent) -> bool + 'static) -> Self {
        Self::Predicate(EventFilter::new(f))
    }

    pub fn all(conditions: impl IntoIterator<Item = TriggerCondition>) -> Self {
        Self::All(conditions.into_iter().collect())
    }

    pub fn any(conditions: impl IntoIterator<Item = TriggerCondition>) -> Self {
        Self::Any(conditions.into_iter().collect())
    }

    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Add another condition with AND.
    pub fn and(self, other: TriggerCondition) -> Self {
        match self {
            Self::All(mut conditions) => {
                conditions.push(other);
                Self::All(conditions)
            }
            Self::Always => other,
            _ => Self::All(vec![self, other]),
        }
    }
}

impl Default for TriggerCondition {
    fn default() -> Self {
        Self::Always
    }
}

/// Context for evaluating trigger conditions.
pub struct ConditionContext<'a> {
    pub event: &'a GameEvent,
    pub state: &'a GameState,
    /// The card owning the ability.
    pub source: EntityId,
    /// The player who would trigger the ability.
    pub controller: PlayerId,
    /// Evaluator for `Custom` conditions.
    pub eval_custom: Option<&'a dyn Fn(&str, &GameEvent, &GameState) -> bool>,
}

impl<'a> ConditionContext<'a> {
    pub fn new(event: &'a GameEvent, state: &'a GameState, source: EntityId, controller: PlayerId) -> Self {
        Self {
            event,
            state,
            source,
            controller,
            eval_custom: None,
        }
    }

    pub fn with_custom_eval(mut self, eval: &'a dyn Fn(&str, &GameEvent, &GameState) -> bool) -> Self {
        self.eval_custom = Some(eval);
        self
    }

    fn event_card_controller(&self) -> Option<PlayerId> {
        self.event.card.and_then(|c| self.state.controller(c))
    }
}

/// Evaluator for trigger conditions.
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// Check if a condition is satisfied.
    pub fn evaluate(condition: &TriggerCondition, ctx: &ConditionContext) -> bool {
        match condition {
            TriggerCondition::CardIs(card) => ctx.event.card == Some(*card),

            TriggerCondition::CardIsSource => ctx.event.card == Some(ctx.source),

            TriggerCondition::PlayerIs(player) => ctx.event.player == Some(*player),

            TriggerCondition::PlayerIsController => ctx.event.player == Some(ctx.controller),

            TriggerCondition::PlayerIsOpponent => ctx.event.player == Some(ctx.controller.opponent()),

            TriggerCondition::CardControlledByController => ctx.event_card_controller() == Some(ctx.controller),

            TriggerCondition::CardControlledByOpponent => {
                ctx.event_card_controller() == Some(ctx.controller.opponent())
            }

            TriggerCondition::CardInLocation(location) => ctx
                .event
                .card
                .and_then(|c| ctx.state.card(c))
                .is_some_and(|c| c.location == *location),

            TriggerCondition::CardType(card_type) => ctx
                .event
                .card
                .and_then(|c| ctx.state.card(c))
                .is_some_and(|c| c.card_type == *card_type),

            TriggerCondition::SourceParticipating => ctx
                .state
                .current_conflict
                .as_ref()
                .is_some_and(|conflict| conflict.is_participating(ctx.source)),

            TriggerCondition::RingIs(element) => ctx.event.ring == Some(*element),

            TriggerCondition::AmountAtLeast(min) => ctx.event.amount >= *min,

            TriggerCondition::HasTag(tag) => ctx.event.has_tag(tag),

            TriggerCondition::All(conditions) => conditions.iter().all(|c| Self::evaluate(c, ctx)),

            TriggerCondition::Any(conditions) => conditions.iter().any(|c| Self::evaluate(c, ctx)),

            TriggerCondition::Not(inner) => !Self::evaluate(inner, ctx),

            TriggerCondition::Always => true,

            TriggerCondition::Never => false,

            TriggerCondition::Custom(key) => match ctx.eval_custom {
                Some(eval) => eval(key, ctx.event, ctx.state),
                None => false,
            },

            TriggerCondition::Predicate(filter) => (filter.0)(ctx.state, ctx.event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardDefinition, CardId};
    use crate::core::GameConfig;
    use crate::events::EventName;

    fn test_state() -> GameState {
        GameState::new(&GameConfig::default())
    }

    fn eval(condition: &TriggerCondition, event: &GameEvent, state: &GameState) -> bool {
        let ctx = ConditionContext::new(event, state, EntityId(2), PlayerId::new(0));
        ConditionEvaluator::evaluate(condition, &ctx)
    }

    #[test]
    fn test_card_conditions() {
        let state = test_state();
        let event = GameEvent::new(EventName::CARD_BOWED).with_card(EntityId(2));

        assert!(eval(&TriggerCondition::CardIs(EntityId(2)), &event, &state));
        assert!(!eval(&TriggerCondition::CardIs(EntityId(3)), &event, &state));
        assert!(eval(&TriggerCondition::CardIsSource, &event, &state));
    }

    #[test]
    fn test_player_conditions() {
        let state = test_state();
        let event = GameEvent::new(EventName::MODIFY_HONOR).with_player(PlayerId::new(1));

        assert!(eval(&TriggerCondition::PlayerIs(PlayerId::new(1)), &event, &state));
        assert!(eval(&TriggerCondition::PlayerIsOpponent, &event, &state));
        assert!(!eval(&TriggerCondition::PlayerIsController, &event, &state));
    }

    #[test]
    fn test_controlled_by_conditions() {
        let mut state = test_state();
        let def = CardDefinition::character(CardId::new(1), "Doji Whisperer", 3, 0, 3);
        let theirs = state.create_card(&def, PlayerId::new(1), Location::PlayArea);

        let event = GameEvent::new(EventName::CARD_HONORED).with_card(theirs);

        assert!(eval(&TriggerCondition::CardControlledByOpponent, &event, &state));
        assert!(!eval(&TriggerCondition::CardControlledByController, &event, &state));
        assert!(eval(&TriggerCondition::CardInLocation(Location::PlayArea), &event, &state));
        assert!(eval(&TriggerCondition::CardType(CardType::Character), &event, &state));
    }

    #[test]
    fn test_value_and_tag_conditions() {
        let state = test_state();
        let event = GameEvent::new(EventName::MOVE_FATE).with_amount(2).with_tag("ring");

        assert!(eval(&TriggerCondition::AmountAtLeast(2), &event, &state));
        assert!(!eval(&TriggerCondition::AmountAtLeast(3), &event, &state));
        assert!(eval(&TriggerCondition::HasTag("ring".to_string()), &event, &state));
    }

    #[test]
    fn test_combinators() {
        let state = test_state();
        let event = GameEvent::new(EventName::CLAIM_RING).with_ring(Element::Air);

        let both = TriggerCondition::all([TriggerCondition::RingIs(Element::Air), TriggerCondition::Always]);
        assert!(eval(&both, &event, &state));

        let either = TriggerCondition::any([TriggerCondition::Never, TriggerCondition::RingIs(Element::Void)]);
        assert!(!eval(&either, &event, &state));

        assert!(eval(&TriggerCondition::RingIs(Element::Fire).negate(), &event, &state));
    }

    #[test]
    fn test_and_collapses_always() {
        let condition = TriggerCondition::Always.and(TriggerCondition::CardIsSource);
        assert_eq!(condition, TriggerCondition::CardIsSource);

        let chained = TriggerCondition::CardIsSource
            .and(TriggerCondition::PlayerIsController)
            .and(TriggerCondition::AmountAtLeast(1));
        if let TriggerCondition::All(conditions) = chained {
            assert_eq!(conditions.len(), 3);
        } else {
            panic!("Expected All condition");
        }
    }

    #[test]
    fn test_custom_and_predicate() {
        let state = test_state();
        let event = GameEvent::new(EventName::CARDS_DRAWN).with_amount(3);

        assert!(!eval(&TriggerCondition::Custom("many".to_string()), &event, &state));

        let custom = |key: &str, event: &GameEvent, _: &GameState| key == "many" && event.amount >= 3;
        let ctx = ConditionContext::new(&event, &state, EntityId(2), PlayerId::new(0)).with_custom_eval(&custom);
        assert!(ConditionEvaluator::evaluate(&TriggerCondition::Custom("many".to_string()), &ctx));

        let predicate = TriggerCondition::predicate(|_, e| e.amount == 3);
        assert!(eval(&predicate, &event, &state));
    }

    #[test]
    fn test_condition_serialization() {
        let condition = TriggerCondition::all([
            TriggerCondition::CardIsSource,
            TriggerCondition::HasTag("duel".to_string()),
        ]);

        let json = serde_json::to_string(&condition).unwrap();
        let back: TriggerCondition = serde_json::from_str(&json).unwrap();
        assert_eq!(condition, back);
    }
}
