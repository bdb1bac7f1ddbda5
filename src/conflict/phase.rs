//! The conflict phase.

use tracing::info;

use crate::core::{Phase, PlayerId};
use crate::events::{EventName, GameEvent};
use crate::game::Game;
use crate::pipeline::GameStep;

use super::flow::ConflictFlow;

/// Players alternate conflict opportunities, starting with the first
/// player, until neither has one left. Then the phase ends.
#[derive(Debug, Default)]
pub struct ConflictPhase {
    next_attacker: Option<PlayerId>,
    started: bool,
    ended: bool,
}

impl ConflictPhase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn start(&mut self, game: &mut Game) {
        self.started = true;
        game.state.phase = Phase::Conflict;
        for player in game.state.player_ids().collect::<Vec<_>>() {
            game.state.player_mut(player).reset_opportunities();
        }
        info!(round = game.state.round, "conflict phase started");
        game.raise_event(GameEvent::new(EventName::PHASE_STARTED), |_, _| {});
    }

    fn end(&mut self, game: &mut Game) {
        self.ended = true;
        info!(round = game.state.round, "conflict phase ended");
        game.raise_event(GameEvent::new(EventName::PHASE_ENDED), |_, _| {});
    }
}

impl GameStep for ConflictPhase {
    fn continue_step(&mut self, game: &mut Game) -> bool {
        if self.ended {
            return true;
        }
        if !self.started {
            self.start(game);
            return false;
        }
        if game.state.winner.is_some() {
            self.end(game);
            return false;
        }

        let first = *self.next_attacker.get_or_insert(game.state.first_player);
        let attacker = [first, first.opponent()]
            .into_iter()
            .find(|p| game.state.player(*p).has_any_opportunity());
        match attacker {
            Some(attacker) => {
                self.next_attacker = Some(attacker.opponent());
                game.queue_step(Box::new(ConflictFlow::new(attacker)));
            }
            None => self.end(game),
        }
        false
    }

    fn name(&self) -> &'static str {
        "ConflictPhase"
    }
}
