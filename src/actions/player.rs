//! Actions on players.

use smallvec::SmallVec;

use crate::core::PlayerId;
use crate::events::{EventId, EventName, GameEvent};
use crate::game::Game;
use crate::zones::Location;

use super::{ActionContext, ActionTarget, GameAction};

/// What a `PlayerAction` does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerActionKind {
    GainHonor(i32),
    LoseHonor(i32),
    /// Honor moves from the target to their opponent.
    TransferHonor(i32),
    GainFate(i32),
    LoseFate(i32),
    Draw(u32),
    DiscardAtRandom(u32),
}

/// An action applied to one or more players.
#[derive(Clone, Debug)]
pub struct PlayerAction {
    kind: PlayerActionKind,
    targets: SmallVec<[ActionTarget; 2]>,
}

impl PlayerAction {
    pub fn new(kind: PlayerActionKind, players: impl IntoIterator<Item = PlayerId>) -> Self {
        Self {
            kind,
            targets: players.into_iter().map(ActionTarget::Player).collect(),
        }
    }

    pub fn gain_honor(player: PlayerId, amount: i32) -> Self {
        Self::new(PlayerActionKind::GainHonor(amount), [player])
    }

    pub fn lose_honor(player: PlayerId, amount: i32) -> Self {
        Self::new(PlayerActionKind::LoseHonor(amount), [player])
    }

    pub fn transfer_honor(from: PlayerId, amount: i32) -> Self {
        Self::new(PlayerActionKind::TransferHonor(amount), [from])
    }

    pub fn gain_fate(player: PlayerId, amount: i32) -> Self {
        Self::new(PlayerActionKind::GainFate(amount), [player])
    }

    pub fn lose_fate(player: PlayerId, amount: i32) -> Self {
        Self::new(PlayerActionKind::LoseFate(amount), [player])
    }

    pub fn draw(player: PlayerId, amount: u32) -> Self {
        Self::new(PlayerActionKind::Draw(amount), [player])
    }

    pub fn discard_at_random(player: PlayerId, amount: u32) -> Self {
        Self::new(PlayerActionKind::DiscardAtRandom(amount), [player])
    }

    #[must_use]
    pub fn kind(&self) -> PlayerActionKind {
        self.kind
    }

    fn event(&self, player: PlayerId) -> GameEvent {
        let (name, amount) = match self.kind {
            PlayerActionKind::GainHonor(n) => (EventName::MODIFY_HONOR, n),
            PlayerActionKind::LoseHonor(n) => (EventName::MODIFY_HONOR, -n),
            PlayerActionKind::TransferHonor(n) => (EventName::TRANSFER_HONOR, n),
            PlayerActionKind::GainFate(n) => (EventName::MODIFY_FATE, n),
            PlayerActionKind::LoseFate(n) => (EventName::MODIFY_FATE, -n),
            PlayerActionKind::Draw(n) => (EventName::CARDS_DRAWN, n as i32),
            PlayerActionKind::DiscardAtRandom(n) => (EventName::CARDS_DISCARDED_FROM_HAND, n as i32),
        };
        GameEvent::new(name).with_player(player).with_amount(amount)
    }

    fn apply(game: &mut Game, kind: PlayerActionKind, player: PlayerId) {
        match kind {
            PlayerActionKind::GainHonor(n) => game.state.player_mut(player).honor += n,
            PlayerActionKind::LoseHonor(n) => {
                let state = game.state.player_mut(player);
                state.honor = (state.honor - n).max(0);
            }
            PlayerActionKind::TransferHonor(n) => {
                let from = game.state.player_mut(player);
                let moved = n.min(from.honor);
                from.honor -= moved;
                game.state.player_mut(player.opponent()).honor += moved;
            }
            PlayerActionKind::GainFate(n) => game.state.player_mut(player).fate += n,
            PlayerActionKind::LoseFate(n) => {
                let state = game.state.player_mut(player);
                state.fate = (state.fate - n).max(0);
            }
            PlayerActionKind::Draw(n) => {
                game.draw_cards(player, n);
            }
            PlayerActionKind::DiscardAtRandom(n) => {
                for _ in 0..n {
                    let hand = game.state.cards_in(player, Location::Hand).to_vec();
                    let Some(index) = game.state.random_index(hand.len()) else {
                        break;
                    };
                    game.move_card(hand[index], Location::ConflictDiscard);
                }
            }
        }
    }
}

impl GameAction for PlayerAction {
    fn name(&self) -> &'static str {
        match self.kind {
            PlayerActionKind::GainHonor(_) => "gainHonor",
            PlayerActionKind::LoseHonor(_) => "loseHonor",
            PlayerActionKind::TransferHonor(_) => "takeHonor",
            PlayerActionKind::GainFate(_) => "gainFate",
            PlayerActionKind::LoseFate(_) => "loseFate",
            PlayerActionKind::Draw(_) => "draw",
            PlayerActionKind::DiscardAtRandom(_) => "discardAtRandom",
        }
    }

    fn targets(&self) -> &[ActionTarget] {
        &self.targets
    }

    fn can_affect(&self, game: &Game, target: ActionTarget, _context: &ActionContext) -> bool {
        let ActionTarget::Player(player) = target else {
            return false;
        };
        if player.index() >= game.state.player_count() {
            return false;
        }
        let state = game.state.player(player);
        match self.kind {
            PlayerActionKind::GainHonor(n) | PlayerActionKind::GainFate(n) => n > 0,
            PlayerActionKind::LoseHonor(n) | PlayerActionKind::TransferHonor(n) => n > 0 && state.honor > 0,
            PlayerActionKind::LoseFate(n) => n > 0 && state.fate > 0,
            PlayerActionKind::Draw(n) => n > 0,
            PlayerActionKind::DiscardAtRandom(n) => {
                n > 0 && !game.state.cards_in(player, Location::Hand).is_empty()
            }
        }
    }

    fn get_event(&self, game: &mut Game, target: ActionTarget, context: &ActionContext) -> EventId {
        let player = match target {
            ActionTarget::Player(p) => p,
            _ => context.player,
        };
        let mut event = self.event(player);
        if let Some(source) = context.source {
            event = event.with_source(source);
        }
        let kind = self.kind;
        game.get_event(event, move |game, _| Self::apply(game, kind, player))
    }
}
