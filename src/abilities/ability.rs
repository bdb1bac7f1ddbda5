//! Card abilities.
//!
//! A `CardAbility` describes one ability printed on a card: when it may be
//! used (its `AbilityType` and, for triggered abilities, the event it
//! responds to), what it costs, what it targets, and what it does. Native
//! abilities live in the `CardRegistry`; scripted ones come from the
//! `ScriptHost`. Both are resolved by the same `AbilityResolver`.

use serde::{Deserialize, Serialize};
use std::rc::Rc;

use crate::actions::GameAction;
use crate::costs::{CostSpec, PlayType};
use crate::events::{EventName, TriggerCondition};
use crate::game::Game;

use super::context::AbilityContext;
use super::limit::{AbilityLimit, LimitKey};
use super::targets::TargetSpec;

/// Index of an ability within its card's ability list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AbilityId(pub u16);

impl AbilityId {
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

/// When an ability may be used.
///
/// Triggered types are listed in window priority order: for one batch of
/// events, every cancel interrupt window closes before any "would"
/// interrupt window opens, and so on down to reactions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbilityType {
    /// Used from an action window. Not triggered.
    Action,
    CancelInterrupt,
    WouldInterrupt,
    ForcedInterrupt,
    Interrupt,
    ForcedReaction,
    Reaction,
}

impl AbilityType {
    /// Triggered types in priority order.
    pub const TRIGGERED: [AbilityType; 6] = [
        AbilityType::CancelInterrupt,
        AbilityType::WouldInterrupt,
        AbilityType::ForcedInterrupt,
        AbilityType::Interrupt,
        AbilityType::ForcedReaction,
        AbilityType::Reaction,
    ];

    #[must_use]
    pub const fn is_triggered(self) -> bool {
        !matches!(self, Self::Action)
    }

    /// Forced windows cannot be passed.
    #[must_use]
    pub const fn is_forced(self) -> bool {
        matches!(self, Self::ForcedInterrupt | Self::ForcedReaction)
    }

    #[must_use]
    pub const fn is_interrupt(self) -> bool {
        matches!(
            self,
            Self::CancelInterrupt | Self::WouldInterrupt | Self::ForcedInterrupt | Self::Interrupt
        )
    }

    /// Position in window order. `Action` has none.
    #[must_use]
    pub fn priority(self) -> Option<usize> {
        Self::TRIGGERED.iter().position(|t| *t == self)
    }
}

type ActionBuilder = Rc<dyn Fn(&Game, &AbilityContext) -> Vec<Rc<dyn GameAction>>>;
type EffectHandler = Rc<dyn Fn(&mut Game, &AbilityContext)>;
type AbilityCondition = Rc<dyn Fn(&Game, &AbilityContext) -> bool>;

/// What an ability does once its costs are paid and targets chosen.
#[derive(Clone, Default)]
pub enum AbilityEffect {
    #[default]
    None,

    /// Game actions built from the context. Their events resolve in a
    /// then window.
    Actions(ActionBuilder),

    /// Arbitrary rules code.
    Handler(EffectHandler),

    /// A function of the card's script.
    Script(String),
}

impl std::fmt::Debug for AbilityEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Actions(_) => f.write_str("Actions(..)"),
            Self::Handler(_) => f.write_str("Handler(..)"),
            Self::Script(name) => f.debug_tuple("Script").field(name).finish(),
        }
    }
}

/// An ability printed on a card.
#[derive(Clone)]
pub struct CardAbility {
    /// Assigned on registration.
    pub id: AbilityId,
    pub title: String,
    pub ability_type: AbilityType,

    /// Event a triggered ability responds to.
    pub when: Option<EventName>,
    pub trigger: TriggerCondition,

    pub costs: Vec<CostSpec>,
    pub targets: Vec<TargetSpec>,
    pub effect: AbilityEffect,

    /// Per copy of the card.
    pub limit: Option<AbilityLimit>,
    /// Per player, across every copy of the card.
    pub max: Option<AbilityLimit>,

    /// Pay costs before choosing targets.
    pub cannot_target_first: bool,

    /// Playing the card itself (events), and from where.
    pub card_play: Option<PlayType>,

    pub condition: Option<AbilityCondition>,

    /// Posted when the effect resolves. `{0}` is the player, `{1}` the
    /// card, `{2}` the first target.
    pub message: Option<String>,
}

impl std::fmt::Debug for CardAbility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardAbility")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("ability_type", &self.ability_type)
            .field("when", &self.when)
            .field("costs", &self.costs)
            .field("effect", &self.effect)
            .finish_non_exhaustive()
    }
}

impl CardAbility {
    pub fn new(title: impl Into<String>, ability_type: AbilityType) -> Self {
        Self {
            id: AbilityId::default(),
            title: title.into(),
            ability_type,
            when: None,
            trigger: TriggerCondition::Always,
            costs: Vec::new(),
            targets: Vec::new(),
            effect: AbilityEffect::None,
            limit: None,
            max: None,
            cannot_target_first: false,
            card_play: None,
            condition: None,
            message: None,
        }
    }

    /// An action ability.
    pub fn action(title: impl Into<String>) -> Self {
        Self::new(title, AbilityType::Action)
    }

    /// Playing an event card from hand.
    pub fn play_event(title: impl Into<String>) -> Self {
        let mut ability = Self::new(title, AbilityType::Action);
        ability.card_play = Some(PlayType::PlayFromHand);
        ability.costs.push(CostSpec::PayPrintedCost(PlayType::PlayFromHand));
        ability
    }

    /// A triggered ability responding to `event`.
    pub fn triggered(title: impl Into<String>, ability_type: AbilityType, event: EventName) -> Self {
        let mut ability = Self::new(title, ability_type);
        ability.when = Some(event);
        ability
    }

    #[must_use]
    pub fn with_trigger(mut self, condition: TriggerCondition) -> Self {
        self.trigger = condition;
        self
    }

    #[must_use]
    pub fn with_cost(mut self, cost: CostSpec) -> Self {
        self.costs.push(cost);
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: TargetSpec) -> Self {
        self.targets.push(target);
        self
    }

    #[must_use]
    pub fn with_actions(
        mut self,
        builder: impl Fn(&Game, &AbilityContext) -> Vec<Rc<dyn GameAction>> + 'static,
    ) -> Self {
        self.effect = AbilityEffect::Actions(Rc::new(builder));
        self
    }

    #[must_use]
    pub fn with_handler(mut self, handler: impl Fn(&mut Game, &AbilityContext) + 'static) -> Self {
        self.effect = AbilityEffect::Handler(Rc::new(handler));
        self
    }

    #[must_use]
    pub fn with_script(mut self, function: impl Into<String>) -> Self {
        self.effect = AbilityEffect::Script(function.into());
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: AbilityLimit) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_max(mut self, max: AbilityLimit) -> Self {
        self.max = Some(max);
        self
    }

    #[must_use]
    pub fn cannot_target_first(mut self) -> Self {
        self.cannot_target_first = true;
        self
    }

    #[must_use]
    pub fn with_condition(mut self, condition: impl Fn(&Game, &AbilityContext) -> bool + 'static) -> Self {
        self.condition = Some(Rc::new(condition));
        self
    }

    #[must_use]
    pub fn with_message(mut self, template: impl Into<String>) -> Self {
        self.message = Some(template.into());
        self
    }

    #[must_use]
    pub fn is_card_play(&self) -> bool {
        self.card_play.is_some()
    }

    /// Whether the ability could be initiated right now: source location,
    /// limits, condition, costs, and mandatory targets.
    #[must_use]
    pub fn meets_requirements(&self, game: &Game, context: &AbilityContext) -> bool {
        let Some(card) = game.state.card(context.source) else {
            return false;
        };
        let location_ok = match self.card_play {
            Some(PlayType::PlayFromHand) => card.location == crate::zones::Location::Hand,
            Some(PlayType::PlayFromProvince) => card.location.is_province(),
            Some(PlayType::Ability) | None => card.location.is_in_play() || card.location.is_province(),
        };
        if !location_ok {
            return false;
        }

        if let Some(limit) = self.limit {
            if game.limits.is_at_max(LimitKey::Ability(context.source, self.id), limit) {
                return false;
            }
        }
        if let Some(max) = self.max {
            if game.limits.is_at_max(LimitKey::Max(context.player, card.card_id, self.id), max) {
                return false;
            }
        }

        if let Some(condition) = &self.condition {
            if !condition(game, context) {
                return false;
            }
        }

        if !self.costs.iter().all(|cost| cost.can_pay(game, context)) {
            return false;
        }

        self.targets
            .iter()
            .all(|target| target.optional || target.has_enough_targets(game, context))
    }
}
