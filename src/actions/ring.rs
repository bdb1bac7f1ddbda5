//! Actions on rings.

use crate::core::PlayerId;
use crate::events::{EventId, EventName, GameEvent};
use crate::game::Game;
use crate::rings::Element;

use super::{ActionContext, ActionTarget, GameAction};

/// What a `RingAction` does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RingActionKind {
    /// The acting player claims the ring.
    Claim,
    /// The acting player takes all fate on the ring.
    TakeFate,
}

/// An action applied to a ring.
#[derive(Clone, Debug)]
pub struct RingAction {
    kind: RingActionKind,
    targets: [ActionTarget; 1],
}

impl RingAction {
    #[must_use]
    pub fn claim(ring: Element) -> Self {
        Self {
            kind: RingActionKind::Claim,
            targets: [ActionTarget::Ring(ring)],
        }
    }

    #[must_use]
    pub fn take_fate(ring: Element) -> Self {
        Self {
            kind: RingActionKind::TakeFate,
            targets: [ActionTarget::Ring(ring)],
        }
    }

    fn apply(game: &mut Game, kind: RingActionKind, element: Element, player: PlayerId) {
        match kind {
            RingActionKind::Claim => {
                let ring = game.state.ring_mut(element);
                ring.claimed_by = Some(player);
                ring.contested = false;
            }
            RingActionKind::TakeFate => {
                let ring = game.state.ring_mut(element);
                let fate = ring.fate;
                ring.fate = 0;
                game.state.player_mut(player).fate += fate;
            }
        }
    }
}

impl GameAction for RingAction {
    fn name(&self) -> &'static str {
        match self.kind {
            RingActionKind::Claim => "claimRing",
            RingActionKind::TakeFate => "takeFateFromRing",
        }
    }

    fn targets(&self) -> &[ActionTarget] {
        &self.targets
    }

    fn can_affect(&self, game: &Game, target: ActionTarget, context: &ActionContext) -> bool {
        let ActionTarget::Ring(element) = target else {
            return false;
        };
        let ring = game.state.ring(element);
        match self.kind {
            RingActionKind::Claim => ring.claimed_by != Some(context.player),
            RingActionKind::TakeFate => ring.fate > 0,
        }
    }

    fn get_event(&self, game: &mut Game, target: ActionTarget, context: &ActionContext) -> EventId {
        let element = match target {
            ActionTarget::Ring(element) => element,
            _ => Element::Void,
        };
        let player = context.player;
        let (name, amount) = match self.kind {
            RingActionKind::Claim => (EventName::CLAIM_RING, 0),
            RingActionKind::TakeFate => (EventName::MOVE_FATE, game.state.ring(element).fate),
        };
        let event = GameEvent::new(name).with_ring(element).with_player(player).with_amount(amount);
        let kind = self.kind;
        game.get_event(event, move |game, _| Self::apply(game, kind, element, player))
    }
}
