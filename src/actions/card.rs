//! Actions on cards.

use smallvec::SmallVec;

use crate::cards::{CardType, HonorStatus};
use crate::core::EntityId;
use crate::events::{EventId, EventName, GameEvent};
use crate::game::Game;
use crate::zones::Location;

use super::{ActionContext, ActionTarget, GameAction};

/// What a `CardAction` does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardActionKind {
    Bow,
    Ready,
    Honor,
    Dishonor,
    PlaceFate(i32),
    RemoveFate(i32),
    /// To the owner's matching discard pile.
    Discard,
    MoveTo(Location),
    BreakProvince,
}

impl CardActionKind {
    fn event_name(self) -> EventName {
        match self {
            Self::Bow => EventName::CARD_BOWED,
            Self::Ready => EventName::CARD_READIED,
            Self::Honor => EventName::CARD_HONORED,
            Self::Dishonor => EventName::CARD_DISHONORED,
            Self::PlaceFate(_) | Self::RemoveFate(_) => EventName::MOVE_FATE,
            Self::Discard => EventName::CARD_LEAVES_PLAY,
            Self::MoveTo(_) => EventName::MOVE_CARD,
            Self::BreakProvince => EventName::BREAK_PROVINCE,
        }
    }
}

/// An action applied to one or more cards.
///
/// ```
/// use l5r_engine::actions::{ActionTarget, CardAction, GameAction};
/// use l5r_engine::core::EntityId;
///
/// let bow = CardAction::bow([EntityId(7), EntityId(8)]);
/// assert_eq!(bow.name(), "bow");
/// assert_eq!(bow.targets(), &[ActionTarget::Card(EntityId(7)), ActionTarget::Card(EntityId(8))]);
/// ```
#[derive(Clone, Debug)]
pub struct CardAction {
    kind: CardActionKind,
    targets: SmallVec<[ActionTarget; 2]>,
}

impl CardAction {
    pub fn new(kind: CardActionKind, cards: impl IntoIterator<Item = EntityId>) -> Self {
        Self {
            kind,
            targets: cards.into_iter().map(ActionTarget::Card).collect(),
        }
    }

    pub fn bow(cards: impl IntoIterator<Item = EntityId>) -> Self {
        Self::new(CardActionKind::Bow, cards)
    }

    pub fn ready(cards: impl IntoIterator<Item = EntityId>) -> Self {
        Self::new(CardActionKind::Ready, cards)
    }

    pub fn honor(cards: impl IntoIterator<Item = EntityId>) -> Self {
        Self::new(CardActionKind::Honor, cards)
    }

    pub fn dishonor(cards: impl IntoIterator<Item = EntityId>) -> Self {
        Self::new(CardActionKind::Dishonor, cards)
    }

    pub fn place_fate(cards: impl IntoIterator<Item = EntityId>, amount: i32) -> Self {
        Self::new(CardActionKind::PlaceFate(amount), cards)
    }

    pub fn remove_fate(cards: impl IntoIterator<Item = EntityId>, amount: i32) -> Self {
        Self::new(CardActionKind::RemoveFate(amount), cards)
    }

    pub fn discard(cards: impl IntoIterator<Item = EntityId>) -> Self {
        Self::new(CardActionKind::Discard, cards)
    }

    pub fn move_to(cards: impl IntoIterator<Item = EntityId>, location: Location) -> Self {
        Self::new(CardActionKind::MoveTo(location), cards)
    }

    pub fn break_province(province: EntityId) -> Self {
        Self::new(CardActionKind::BreakProvince, [province])
    }

    #[must_use]
    pub fn kind(&self) -> CardActionKind {
        self.kind
    }

    fn apply(game: &mut Game, kind: CardActionKind, card: EntityId) {
        match kind {
            CardActionKind::Bow => {
                if let Some(c) = game.state.card_mut(card) {
                    c.bowed = true;
                }
            }
            CardActionKind::Ready => {
                if let Some(c) = game.state.card_mut(card) {
                    c.bowed = false;
                }
            }
            CardActionKind::Honor => {
                if let Some(c) = game.state.card_mut(card) {
                    c.honor_status = match c.honor_status {
                        HonorStatus::Dishonored => HonorStatus::Ordinary,
                        _ => HonorStatus::Honored,
                    };
                }
            }
            CardActionKind::Dishonor => {
                if let Some(c) = game.state.card_mut(card) {
                    c.honor_status = match c.honor_status {
                        HonorStatus::Honored => HonorStatus::Ordinary,
                        _ => HonorStatus::Dishonored,
                    };
                }
            }
            CardActionKind::PlaceFate(amount) => {
                if let Some(c) = game.state.card_mut(card) {
                    c.fate += amount;
                }
            }
            CardActionKind::RemoveFate(amount) => {
                if let Some(c) = game.state.card_mut(card) {
                    c.fate = (c.fate - amount).max(0);
                }
            }
            CardActionKind::Discard => {
                if let Some(pile) = game.discard_pile_for(card) {
                    game.move_card(card, pile);
                }
            }
            CardActionKind::MoveTo(location) => {
                game.move_card(card, location);
            }
            CardActionKind::BreakProvince => {
                if let Some(c) = game.state.card_mut(card) {
                    c.broken = true;
                }
            }
        }
    }
}

impl GameAction for CardAction {
    fn name(&self) -> &'static str {
        match self.kind {
            CardActionKind::Bow => "bow",
            CardActionKind::Ready => "ready",
            CardActionKind::Honor => "honor",
            CardActionKind::Dishonor => "dishonor",
            CardActionKind::PlaceFate(_) => "placeFate",
            CardActionKind::RemoveFate(_) => "removeFate",
            CardActionKind::Discard => "discardCard",
            CardActionKind::MoveTo(_) => "moveCard",
            CardActionKind::BreakProvince => "breakProvince",
        }
    }

    fn targets(&self) -> &[ActionTarget] {
        &self.targets
    }

    fn can_affect(&self, game: &Game, target: ActionTarget, _context: &ActionContext) -> bool {
        let ActionTarget::Card(id) = target else {
            return false;
        };
        let Some(card) = game.state.card(id) else {
            return false;
        };
        let in_play = card.is_in_play();
        match self.kind {
            CardActionKind::Bow => in_play && !card.bowed,
            CardActionKind::Ready => in_play && card.bowed,
            CardActionKind::Honor => in_play && card.is_character() && card.honor_status != HonorStatus::Honored,
            CardActionKind::Dishonor => {
                in_play && card.is_character() && card.honor_status != HonorStatus::Dishonored
            }
            CardActionKind::PlaceFate(amount) => in_play && card.is_character() && amount > 0,
            CardActionKind::RemoveFate(amount) => in_play && card.fate > 0 && amount > 0,
            CardActionKind::Discard => {
                !matches!(card.location, Location::ConflictDiscard | Location::DynastyDiscard)
            }
            CardActionKind::MoveTo(location) => card.location != location,
            CardActionKind::BreakProvince => card.card_type == CardType::Province && !card.broken,
        }
    }

    fn get_event(&self, game: &mut Game, target: ActionTarget, context: &ActionContext) -> EventId {
        let ActionTarget::Card(card) = target else {
            return game.get_event(GameEvent::new(self.kind.event_name()).with_player(context.player), |_, _| {});
        };
        let mut event = GameEvent::new(self.kind.event_name())
            .with_card(card)
            .with_player(context.player);
        if let Some(source) = context.source {
            event = event.with_source(source);
        }
        match self.kind {
            CardActionKind::PlaceFate(amount) => event = event.with_amount(amount),
            CardActionKind::RemoveFate(amount) => event = event.with_amount(-amount),
            _ => {}
        }
        let kind = self.kind;
        game.get_event(event, move |game, _| Self::apply(game, kind, card))
    }
}
