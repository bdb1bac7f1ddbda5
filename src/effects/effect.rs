//! Game effects.
//!
//! A `GameEffect` binds a source card, a duration, a target matcher and a
//! payload. Its condition and targets are re-evaluated on every engine
//! pass: an inactive effect stays registered but applies nothing, and
//! targets that stop matching lose the effect's modifier.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::rc::Rc;

use crate::actions::{ActionContext, GameAction};
use crate::cards::Keyword;
use crate::core::{ConditionError, EntityId, GameState, PlayerId};
use crate::events::{EventBus, EventName, EventPredicate, GameEvent, Subscription};

/// Identifier of an effect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EffectId(pub u32);

impl EffectId {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for EffectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Effect({})", self.0)
    }
}

/// How long an effect lasts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Duration {
    /// Lasts while its source is in play.
    #[default]
    Persistent,
    UntilEndOfPhase,
    UntilEndOfRound,
    UntilEndOfConflict,
    UntilEndOfDuel,
    UntilPassPriority,
    UntilOpponentPassPriority,
    UntilNextPassPriority,
    /// Ends on the effect's `until` events.
    Custom,
}

impl Duration {
    /// The duration after one more pass of priority.
    ///
    /// ```
    /// use l5r_engine::effects::Duration;
    ///
    /// let d = Duration::UntilNextPassPriority.escalate();
    /// assert_eq!(d, Duration::UntilOpponentPassPriority);
    /// assert_eq!(d.escalate(), Duration::UntilPassPriority);
    /// assert_eq!(Duration::UntilEndOfPhase.escalate(), Duration::UntilEndOfPhase);
    /// ```
    #[must_use]
    pub const fn escalate(self) -> Self {
        match self {
            Self::UntilNextPassPriority => Self::UntilOpponentPassPriority,
            Self::UntilOpponentPassPriority => Self::UntilPassPriority,
            other => other,
        }
    }

    #[must_use]
    pub const fn is_pass_priority(self) -> bool {
        matches!(
            self,
            Self::UntilPassPriority | Self::UntilOpponentPassPriority | Self::UntilNextPassPriority
        )
    }
}

/// Continuous modifiers applied to cards and players.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StaticModifier {
    // === Cards ===
    ModifyMilitary(i32),
    ModifyPolitical(i32),
    ModifyBothSkills(i32),
    ModifyGlory(i32),
    ModifyProvinceStrength(i32),
    AddKeyword(Keyword),
    /// Extra fate to declare the character as an attacker.
    FateCostToAttack(i32),
    /// Does not bow when returning home from a conflict.
    DoesNotBow,
    CannotBeBypassedByCovert,
    CannotParticipateAsAttacker,
    CannotParticipateAsDefender,

    // === Players ===
    CannotDeclareConflicts,
    /// Does not lose honor for failing to defend.
    NoUnopposedPenalty,
}

/// What an effect affects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectTarget {
    Card(EntityId),
    Player(PlayerId),
}

/// Which objects an effect's matcher is offered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetKind {
    /// Cards in play and in provinces.
    #[default]
    Cards,
    Players,
    /// Nothing: delayed effects.
    Game,
}

/// Who created an effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EffectContext {
    pub source: EntityId,
    pub player: PlayerId,
}

impl EffectContext {
    #[must_use]
    pub const fn new(source: EntityId, player: PlayerId) -> Self {
        Self { source, player }
    }

    #[must_use]
    pub fn action_context(&self) -> ActionContext {
        ActionContext::new(self.player).with_source(self.source)
    }
}

pub type TargetMatch = Rc<dyn Fn(&GameState, EffectTarget, &EffectContext) -> bool>;
pub type EffectCondition = Rc<dyn Fn(&GameState, &EffectContext) -> Result<bool, ConditionError>>;
pub type DelayedCondition = Rc<dyn Fn(&GameState, &EffectContext) -> bool>;

/// An action that fires later, on a standing condition or on matching
/// events.
#[derive(Clone)]
pub struct DelayedEffect {
    pub title: String,
    pub condition: Option<DelayedCondition>,
    pub when: Vec<(EventName, EventPredicate)>,
    pub action: Rc<dyn GameAction>,
    /// Fire on every match instead of once.
    pub multiple_trigger: bool,
}

impl std::fmt::Debug for DelayedEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelayedEffect")
            .field("title", &self.title)
            .field("when", &self.when.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("action", &self.action)
            .field("multiple_trigger", &self.multiple_trigger)
            .finish_non_exhaustive()
    }
}

impl DelayedEffect {
    pub fn new(title: impl Into<String>, action: Rc<dyn GameAction>) -> Self {
        Self {
            title: title.into(),
            condition: None,
            when: Vec::new(),
            action,
            multiple_trigger: false,
        }
    }

    /// Fire when `event` resolves and `predicate` accepts it.
    #[must_use]
    pub fn on(mut self, event: EventName, predicate: impl Fn(&GameState, &GameEvent) -> bool + 'static) -> Self {
        self.when.push((event, Rc::new(predicate)));
        self
    }

    /// Fire whenever the condition holds at a check.
    #[must_use]
    pub fn when_condition(mut self, condition: impl Fn(&GameState, &EffectContext) -> bool + 'static) -> Self {
        self.condition = Some(Rc::new(condition));
        self
    }

    #[must_use]
    pub fn multiple_trigger(mut self) -> Self {
        self.multiple_trigger = true;
        self
    }

    fn matches(&self, state: &GameState, context: &EffectContext, events: &[GameEvent]) -> bool {
        if let Some(condition) = &self.condition {
            return condition(state, context);
        }
        events.iter().any(|event| {
            self.when
                .iter()
                .any(|(name, predicate)| *name == event.name && predicate(state, event))
        })
    }
}

/// What an effect does.
#[derive(Clone, Debug)]
pub enum EffectPayload {
    Static(StaticModifier),
    Delayed(DelayedEffect),
}

/// A delayed effect due to fire.
#[derive(Clone, Debug)]
pub struct DelayedFiring {
    pub effect: EffectId,
    pub source: EntityId,
    pub player: PlayerId,
    pub title: String,
    pub action: Rc<dyn GameAction>,
    pub context: ActionContext,
}

/// A time-scoped effect.
///
/// ```
/// use l5r_engine::core::{EntityId, PlayerId};
/// use l5r_engine::effects::{Duration, GameEffect, StaticModifier};
///
/// let effect = GameEffect::modifier(EntityId(4), PlayerId::new(0), StaticModifier::ModifyMilitary(2))
///     .with_duration(Duration::UntilEndOfConflict);
///
/// assert_eq!(effect.duration, Duration::UntilEndOfConflict);
/// assert!(!effect.is_active());
/// ```
pub struct GameEffect {
    /// Assigned by `EffectEngine::add`.
    pub id: EffectId,
    /// Order of creation.
    pub timestamp: u64,
    pub context: EffectContext,
    pub duration: Duration,
    pub target_kind: TargetKind,
    matcher: TargetMatch,
    condition: Option<EffectCondition>,
    /// Custom duration ends: one subscription per entry.
    pub until: Vec<(EventName, EventPredicate)>,
    pub payload: EffectPayload,

    active: bool,
    targets: SmallVec<[EffectTarget; 4]>,
    subscriptions: Vec<Subscription>,
}

/// A clone shares the applied targets but owns no subscriptions: only the
/// effect registered with the engine may dispose them.
impl Clone for GameEffect {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            timestamp: self.timestamp,
            context: self.context,
            duration: self.duration,
            target_kind: self.target_kind,
            matcher: Rc::clone(&self.matcher),
            condition: self.condition.clone(),
            until: self.until.clone(),
            payload: self.payload.clone(),
            active: self.active,
            targets: self.targets.clone(),
            subscriptions: Vec::new(),
        }
    }
}

impl std::fmt::Debug for GameEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameEffect")
            .field("id", &self.id)
            .field("source", &self.context.source)
            .field("duration", &self.duration)
            .field("payload", &self.payload)
            .field("active", &self.active)
            .field("targets", &self.targets)
            .finish_non_exhaustive()
    }
}

impl GameEffect {
    pub fn new(source: EntityId, player: PlayerId, payload: EffectPayload) -> Self {
        let target_kind = match payload {
            EffectPayload::Static(_) => TargetKind::Cards,
            EffectPayload::Delayed(_) => TargetKind::Game,
        };
        Self {
            id: EffectId::default(),
            timestamp: 0,
            context: EffectContext::new(source, player),
            duration: Duration::Persistent,
            target_kind,
            matcher: Rc::new(|_, _, _| false),
            condition: None,
            until: Vec::new(),
            payload,
            active: false,
            targets: SmallVec::new(),
            subscriptions: Vec::new(),
        }
    }

    /// A static modifier. Matches nothing until a matcher is set.
    pub fn modifier(source: EntityId, player: PlayerId, modifier: StaticModifier) -> Self {
        Self::new(source, player, EffectPayload::Static(modifier))
    }

    pub fn delayed(source: EntityId, player: PlayerId, delayed: DelayedEffect) -> Self {
        Self::new(source, player, EffectPayload::Delayed(delayed))
    }

    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Apply to the cards matching `matcher`.
    #[must_use]
    pub fn matching_cards(mut self, matcher: impl Fn(&GameState, EntityId, &EffectContext) -> bool + 'static) -> Self {
        self.target_kind = TargetKind::Cards;
        self.matcher = Rc::new(move |state, target, ctx| match target {
            EffectTarget::Card(id) => matcher(state, id, ctx),
            EffectTarget::Player(_) => false,
        });
        self
    }

    /// Apply to one card.
    #[must_use]
    pub fn on_card(self, card: EntityId) -> Self {
        self.matching_cards(move |_, id, _| id == card)
    }

    /// Apply to the players matching `matcher`.
    #[must_use]
    pub fn matching_players(
        mut self,
        matcher: impl Fn(&GameState, PlayerId, &EffectContext) -> bool + 'static,
    ) -> Self {
        self.target_kind = TargetKind::Players;
        self.matcher = Rc::new(move |state, target, ctx| match target {
            EffectTarget::Player(p) => matcher(state, p, ctx),
            EffectTarget::Card(_) => false,
        });
        self
    }

    #[must_use]
    pub fn on_player(self, player: PlayerId) -> Self {
        self.matching_players(move |_, p, _| p == player)
    }

    #[must_use]
    pub fn with_condition(
        mut self,
        condition: impl Fn(&GameState, &EffectContext) -> Result<bool, ConditionError> + 'static,
    ) -> Self {
        self.condition = Some(Rc::new(condition));
        self
    }

    /// End the effect when `event` resolves and `predicate` accepts it.
    /// Switches the duration to `Custom`.
    #[must_use]
    pub fn until(mut self, event: EventName, predicate: impl Fn(&GameState, &GameEvent) -> bool + 'static) -> Self {
        self.duration = Duration::Custom;
        self.until.push((event, Rc::new(predicate)));
        self
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn targets(&self) -> &[EffectTarget] {
        &self.targets
    }

    #[must_use]
    pub fn source(&self) -> EntityId {
        self.context.source
    }

    #[must_use]
    pub fn is_delayed(&self) -> bool {
        matches!(self.payload, EffectPayload::Delayed(_))
    }

    pub(crate) fn subscribe(&mut self, bus: &mut EventBus, listener: impl Fn(EventPredicate) -> crate::events::Listener) {
        for (event, predicate) in &self.until {
            let subscription = bus.subscribe(event.clone(), listener(Rc::clone(predicate)));
            self.subscriptions.push(subscription);
        }
    }

    fn candidates(&self, state: &GameState) -> Vec<EffectTarget> {
        match self.target_kind {
            TargetKind::Cards => state.cards_on_table().into_iter().map(EffectTarget::Card).collect(),
            TargetKind::Players => state.player_ids().map(EffectTarget::Player).collect(),
            TargetKind::Game => Vec::new(),
        }
    }

    /// Re-evaluate the condition and the target list. Returns whether
    /// anything changed.
    pub fn check_condition(&mut self, state: &mut GameState) -> Result<bool, ConditionError> {
        let active = match &self.condition {
            Some(condition) => condition(state, &self.context)?,
            None => true,
        };

        let wanted: SmallVec<[EffectTarget; 4]> = if active {
            self.candidates(state)
                .into_iter()
                .filter(|t| (self.matcher)(state, *t, &self.context))
                .collect()
        } else {
            SmallVec::new()
        };

        let mut changed = active != self.active;
        self.active = active;

        let stale: Vec<EffectTarget> = self.targets.iter().copied().filter(|t| !wanted.contains(t)).collect();
        for target in stale {
            self.unapply(state, target);
            changed = true;
        }
        for target in wanted {
            if !self.targets.contains(&target) {
                self.apply(state, target);
                changed = true;
            }
        }
        Ok(changed)
    }

    fn apply(&mut self, state: &mut GameState, target: EffectTarget) {
        if let EffectPayload::Static(modifier) = &self.payload {
            match target {
                EffectTarget::Card(id) => {
                    if let Some(card) = state.card_mut(id) {
                        card.add_modifier(self.id, modifier.clone());
                    }
                }
                EffectTarget::Player(p) => state.player_mut(p).modifiers.push((self.id, modifier.clone())),
            }
        }
        self.targets.push(target);
    }

    fn unapply(&mut self, state: &mut GameState, target: EffectTarget) {
        match target {
            EffectTarget::Card(id) => {
                if let Some(card) = state.card_mut(id) {
                    card.remove_modifiers(self.id);
                }
            }
            EffectTarget::Player(p) => {
                let id = self.id;
                state.player_mut(p).modifiers.retain(|(effect, _)| *effect != id);
            }
        }
        self.targets.retain(|t| *t != target);
    }

    /// Remove the effect from its targets and drop its subscriptions.
    pub fn cancel(&mut self, state: &mut GameState, bus: &mut EventBus) {
        for target in self.targets.clone() {
            self.unapply(state, target);
        }
        for subscription in &mut self.subscriptions {
            subscription.dispose(bus);
        }
        self.active = false;
    }

    /// The firing this delayed effect produces for `events`, if any.
    pub(crate) fn delayed_firing(&self, state: &GameState, events: &[GameEvent]) -> Option<DelayedFiring> {
        let EffectPayload::Delayed(delayed) = &self.payload else {
            return None;
        };
        if !delayed.matches(state, &self.context, events) {
            return None;
        }
        Some(DelayedFiring {
            effect: self.id,
            source: self.context.source,
            player: self.context.player,
            title: delayed.title.clone(),
            action: Rc::clone(&delayed.action),
            context: self.context.action_context(),
        })
    }

    pub(crate) fn is_single_shot(&self) -> bool {
        match &self.payload {
            EffectPayload::Delayed(delayed) => !delayed.multiple_trigger && self.duration != Duration::Persistent,
            EffectPayload::Static(_) => false,
        }
    }
}
