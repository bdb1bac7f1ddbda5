//! Game events.
//!
//! Every rules mutation happens inside an event: bowing a character,
//! paying fate, breaking a province, finishing a conflict. Events are
//! created by `Game::get_event`, carry the data abilities inspect, and are
//! resolved by an `EventWindow` which gives interrupts and reactions their
//! chance to respond.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::rc::Rc;

use crate::core::{EntityId, GameState, PlayerId};
use crate::rings::Element;

/// Identifier of an event within a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u32);

impl EventId {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event({})", self.0)
    }
}

/// Name of an event kind. Abilities and effect durations key on these.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventName(Cow<'static, str>);

impl EventName {
    // === Ability resolution ===
    pub const CARD_PLAYED: EventName = EventName::new("onCardPlayed");
    pub const CARD_ABILITY_INITIATED: EventName = EventName::new("onCardAbilityInitiated");
    pub const INITIATE_ABILITY_EFFECTS: EventName = EventName::new("onInitiateAbilityEffects");

    // === Timing boundaries ===
    pub const PHASE_STARTED: EventName = EventName::new("onPhaseStarted");
    pub const PHASE_ENDED: EventName = EventName::new("onPhaseEnded");
    pub const ROUND_ENDED: EventName = EventName::new("onRoundEnded");
    pub const PASS_ACTION_PHASE_PRIORITY: EventName = EventName::new("onPassActionPhasePriority");
    pub const DUEL_FINISHED: EventName = EventName::new("onDuelFinished");

    // === Conflict ===
    pub const CONFLICT_DECLARED: EventName = EventName::new("onConflictDeclared");
    pub const COVERT_RESOLVED: EventName = EventName::new("onCovertResolved");
    pub const PROVINCE_REVEALED: EventName = EventName::new("onProvinceRevealed");
    pub const DEFENDERS_DECLARED: EventName = EventName::new("onDefendersDeclared");
    pub const AFTER_CONFLICT: EventName = EventName::new("afterConflict");
    pub const BREAK_PROVINCE: EventName = EventName::new("onBreakProvince");
    pub const RESOLVE_RING_ELEMENT: EventName = EventName::new("onResolveRingElement");
    pub const CLAIM_RING: EventName = EventName::new("onClaimRing");
    pub const RETURN_HOME: EventName = EventName::new("onReturnHome");
    pub const CONFLICT_FINISHED: EventName = EventName::new("onConflictFinished");

    // === Card and player mutations ===
    pub const CARD_BOWED: EventName = EventName::new("onCardBowed");
    pub const CARD_READIED: EventName = EventName::new("onCardReadied");
    pub const CARD_HONORED: EventName = EventName::new("onCardHonored");
    pub const CARD_DISHONORED: EventName = EventName::new("onCardDishonored");
    pub const CARD_LEAVES_PLAY: EventName = EventName::new("onCardLeavesPlay");
    pub const MOVE_CARD: EventName = EventName::new("onMoveCard");
    pub const CARDS_DRAWN: EventName = EventName::new("onCardsDrawn");
    pub const CARDS_DISCARDED_FROM_HAND: EventName = EventName::new("onCardsDiscardedFromHand");
    pub const MOVE_FATE: EventName = EventName::new("onMoveFate");
    pub const MODIFY_FATE: EventName = EventName::new("onModifyFate");
    pub const SPEND_FATE: EventName = EventName::new("onSpendFate");
    pub const MODIFY_HONOR: EventName = EventName::new("onModifyHonor");
    pub const TRANSFER_HONOR: EventName = EventName::new("onTransferHonor");
    pub const SEQUENTIAL_ACTIONS: EventName = EventName::new("onSequentialActions");

    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// An event name only known at runtime (scripted cards).
    #[must_use]
    pub fn custom(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Predicate over an event, evaluated against the current state.
pub type EventPredicate = Rc<dyn Fn(&GameState, &GameEvent) -> bool>;

/// A game event and its data.
///
/// ```
/// use l5r_engine::core::{EntityId, PlayerId};
/// use l5r_engine::events::{EventName, GameEvent};
///
/// let event = GameEvent::new(EventName::CARD_BOWED)
///     .with_card(EntityId(12))
///     .with_player(PlayerId::new(1));
///
/// assert_eq!(event.card, Some(EntityId(12)));
/// assert!(!event.cancelled);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Assigned by `Game::get_event`.
    pub id: EventId,
    pub name: EventName,

    /// The card the event happens to.
    pub card: Option<EntityId>,

    /// The card whose ability caused the event.
    pub source: Option<EntityId>,

    /// The player the event happens to, or who caused it.
    pub player: Option<PlayerId>,

    pub ring: Option<Element>,

    /// Fate, honor or card count moved by the event.
    pub amount: i32,

    pub tags: Vec<String>,

    pub cancelled: bool,
    pub resolved: bool,
}

impl GameEvent {
    #[must_use]
    pub fn new(name: EventName) -> Self {
        Self {
            id: EventId::new(0),
            name,
            card: None,
            source: None,
            player: None,
            ring: None,
            amount: 0,
            tags: Vec::new(),
            cancelled: false,
            resolved: false,
        }
    }

    #[must_use]
    pub fn with_card(mut self, card: EntityId) -> Self {
        self.card = Some(card);
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: EntityId) -> Self {
        self.source = Some(source);
        self
    }

    #[must_use]
    pub fn with_player(mut self, player: PlayerId) -> Self {
        self.player = Some(player);
        self
    }

    #[must_use]
    pub fn with_ring(mut self, ring: Element) -> Self {
        self.ring = Some(ring);
        self
    }

    #[must_use]
    pub fn with_amount(mut self, amount: i32) -> Self {
        self.amount = amount;
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Still eligible to resolve or be responded to.
    #[must_use]
    pub fn is_live(&self) -> bool {
        !self.cancelled
    }
}
