//! Event windows.
//!
//! An `EventWindow` resolves a batch of events simultaneously and gives
//! every ability timing its chance to respond, in rules order:
//!
//! 1. conditions are checked; an event whose condition fails is cancelled
//! 2. cancel interrupts, "would" interrupts, forced interrupts, interrupts
//! 3. handlers of the surviving events
//! 4. a game state check
//! 5. delayed effects triggered by the batch
//! 6. forced reactions, then reactions
//!
//! Each window pushes a frame on the game's window stack. Events added with
//! `Game::add_event_to_window` join the innermost open window.
//!
//! ## Then windows
//!
//! Events caused by resolving an ability's effect ("then" events) are
//! resolved in a then window: interrupts and handlers run immediately, but
//! reactions are deferred to the enclosing window so they are offered in
//! the same reaction window as the events that caused them.

use tracing::{debug, warn};

use crate::abilities::{AbilityType, AbilityWindow};
use crate::game::Game;
use crate::pipeline::{run_staged, GamePipeline, GameStep, Staged};

use super::event::EventId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WindowStage {
    OpenFrame,
    CheckConditions,
    CancelInterrupt,
    WouldInterrupt,
    ForcedInterrupt,
    Interrupt,
    ExecuteHandlers,
    CheckGameState,
    CheckDelayedEffects,
    ForcedReaction,
    Reaction,
    CloseFrame,
    Done,
}

impl WindowStage {
    fn next(self) -> Self {
        match self {
            Self::OpenFrame => Self::CheckConditions,
            Self::CheckConditions => Self::CancelInterrupt,
            Self::CancelInterrupt => Self::WouldInterrupt,
            Self::WouldInterrupt => Self::ForcedInterrupt,
            Self::ForcedInterrupt => Self::Interrupt,
            Self::Interrupt => Self::ExecuteHandlers,
            Self::ExecuteHandlers => Self::CheckGameState,
            Self::CheckGameState => Self::CheckDelayedEffects,
            Self::CheckDelayedEffects => Self::ForcedReaction,
            Self::ForcedReaction => Self::Reaction,
            Self::Reaction => Self::CloseFrame,
            Self::CloseFrame | Self::Done => Self::Done,
        }
    }
}

/// Resolves a batch of events. See the module docs.
pub struct EventWindow {
    events: Vec<EventId>,
    stage: WindowStage,
    then_window: bool,
    /// Reactions were handed to the enclosing window.
    deferred: bool,
    /// Events offered to forced reactions and reactions.
    reaction_batch: Vec<EventId>,
    pipeline: GamePipeline,
}

impl EventWindow {
    #[must_use]
    pub fn new(events: Vec<EventId>) -> Self {
        Self {
            events,
            stage: WindowStage::OpenFrame,
            then_window: false,
            deferred: false,
            reaction_batch: Vec::new(),
            pipeline: GamePipeline::new(),
        }
    }

    /// A window whose reactions join the enclosing window.
    #[must_use]
    pub fn then(events: Vec<EventId>) -> Self {
        Self {
            then_window: true,
            ..Self::new(events)
        }
    }

    #[must_use]
    pub fn events(&self) -> &[EventId] {
        &self.events
    }

    /// Pull in events added to this window since the last stage.
    fn absorb_additions(&mut self, game: &mut Game, check_conditions: bool) -> bool {
        let added = game.take_frame_additions();
        if added.is_empty() {
            return false;
        }
        for id in added {
            if self.events.contains(&id) {
                continue;
            }
            if check_conditions && !game.check_event_condition(id) {
                game.cancel_event(id);
            }
            self.events.push(id);
        }
        true
    }

    fn live_events(&self, game: &Game) -> Vec<EventId> {
        self.events
            .iter()
            .copied()
            .filter(|id| game.event(*id).is_some_and(|e| !e.cancelled))
            .collect()
    }

    fn open_ability_window(&mut self, game: &mut Game, ability_type: AbilityType) {
        self.absorb_additions(game, true);
        let events = self.live_events(game);
        if !events.is_empty() && !AbilityWindow::open_window(game, ability_type, events) {
            warn!(?ability_type, "ability window queued behind an open window");
        }
    }

    fn execute_handlers(&mut self, game: &mut Game) {
        self.absorb_additions(game, false);
        let mut index = 0;
        loop {
            while index < self.events.len() {
                let id = self.events[index];
                index += 1;
                let Some(event) = game.event(id) else {
                    continue;
                };
                if event.cancelled || event.resolved {
                    continue;
                }
                if game.check_event_condition(id) {
                    game.resolve_event(id);
                } else {
                    debug!(event = %id, "event condition failed at execution");
                    game.cancel_event(id);
                }
            }
            if !self.absorb_additions(game, false) {
                break;
            }
        }
    }

    fn reaction_events(&self, game: &mut Game) -> Vec<EventId> {
        let mut events = self.live_events(game);
        for id in game.take_then_events() {
            if !events.contains(&id) && game.event(id).is_some_and(|e| !e.cancelled) {
                events.push(id);
            }
        }
        events
    }
}

impl Staged for EventWindow {
    fn pipeline(&mut self) -> &mut GamePipeline {
        &mut self.pipeline
    }

    fn run_next_stage(&mut self, game: &mut Game) -> bool {
        let stage = self.stage;
        if stage == WindowStage::Done {
            return false;
        }
        self.stage = stage.next();

        match stage {
            WindowStage::OpenFrame => {
                game.push_window_frame();
            }
            WindowStage::CheckConditions => {
                self.absorb_additions(game, false);
                for id in self.events.clone() {
                    if game.event(id).is_some_and(|e| !e.cancelled) && !game.check_event_condition(id) {
                        game.cancel_event(id);
                    }
                }
            }
            WindowStage::CancelInterrupt => self.open_ability_window(game, AbilityType::CancelInterrupt),
            WindowStage::WouldInterrupt => self.open_ability_window(game, AbilityType::WouldInterrupt),
            WindowStage::ForcedInterrupt => self.open_ability_window(game, AbilityType::ForcedInterrupt),
            WindowStage::Interrupt => self.open_ability_window(game, AbilityType::Interrupt),
            WindowStage::ExecuteHandlers => self.execute_handlers(game),
            WindowStage::CheckGameState => {
                let any_live = !self.live_events(game).is_empty();
                game.check_game_state(any_live);
            }
            WindowStage::CheckDelayedEffects => {
                let events = self.live_events(game);
                game.check_delayed_effects(&events);
            }
            WindowStage::ForcedReaction => {
                self.absorb_additions(game, false);
                let events = self.reaction_events(game);
                if self.then_window {
                    self.deferred = game.defer_to_parent_frame(events.clone());
                }
                if !self.deferred {
                    game.mark_reactions_open();
                    self.reaction_batch = events;
                    if !self.reaction_batch.is_empty() {
                        let batch = self.reaction_batch.clone();
                        AbilityWindow::open_window(game, AbilityType::ForcedReaction, batch);
                    }
                }
            }
            WindowStage::Reaction => {
                if !self.deferred {
                    let mut events = std::mem::take(&mut self.reaction_batch);
                    for id in game.take_then_events() {
                        if !events.contains(&id) {
                            events.push(id);
                        }
                    }
                    events.retain(|id| game.event(*id).is_some_and(|e| !e.cancelled));
                    if !events.is_empty() {
                        AbilityWindow::open_window(game, AbilityType::Reaction, events);
                    }
                }
            }
            WindowStage::CloseFrame => {
                game.pop_window_frame();
            }
            WindowStage::Done => {}
        }
        self.stage != WindowStage::Done
    }
}

impl GameStep for EventWindow {
    fn continue_step(&mut self, game: &mut Game) -> bool {
        run_staged(self, game)
    }

    fn handle_menu_command(
        &mut self,
        game: &mut Game,
        player: crate::core::PlayerId,
        arg: &crate::prompts::MenuArg,
    ) -> bool {
        self.pipeline.handle_menu_command(game, player, arg)
    }

    fn current_prompt(&self) -> Option<&dyn crate::prompts::Prompt> {
        self.pipeline.current_prompt()
    }

    fn name(&self) -> &'static str {
        if self.then_window {
            "ThenEventWindow"
        } else {
            "EventWindow"
        }
    }
}
