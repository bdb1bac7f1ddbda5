//! Cooperative step scheduling.
//!
//! Game logic never blocks. Everything that can wait on a player (an
//! event window, an ability resolution, a conflict) is a `GameStep` in a
//! `GamePipeline`. A step returns `false` from `continue_step` when it is
//! waiting for input; the pipeline stops there and resumes on the next
//! menu command.
//!
//! ## Queued steps
//!
//! Steps queued with `Game::queue_step` while a step runs are captured and
//! placed directly after the running step, or before it when the running
//! step is not finished yet. This gives "do this next" semantics for
//! nested work without recursion.
//!
//! ## Staged steps
//!
//! Multi-stage steps (event windows, the ability resolver, the conflict
//! flow) own an inner pipeline. Each stage runs, its queued steps are
//! drained through the inner pipeline, then the next stage runs. See
//! `run_staged`.

use std::collections::VecDeque;

use crate::core::PlayerId;
use crate::game::Game;
use crate::prompts::{MenuArg, Prompt};

/// A unit of work in the game pipeline.
pub trait GameStep {
    /// Advance the step. Returns `true` once it is complete.
    fn continue_step(&mut self, game: &mut Game) -> bool;

    /// Route a player's menu command. Returns whether it was accepted.
    fn handle_menu_command(&mut self, _game: &mut Game, _player: PlayerId, _arg: &MenuArg) -> bool {
        false
    }

    /// The prompt this step is currently waiting on, if any.
    fn current_prompt(&self) -> Option<&dyn Prompt> {
        None
    }

    fn name(&self) -> &'static str;
}

/// A queue of steps.
#[derive(Default)]
pub struct GamePipeline {
    queue: VecDeque<Box<dyn GameStep>>,
}

impl std::fmt::Debug for GamePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.queue.iter().map(|s| s.name())).finish()
    }
}

impl GamePipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn push(&mut self, step: Box<dyn GameStep>) {
        self.queue.push_back(step);
    }

    pub fn extend(&mut self, steps: Vec<Box<dyn GameStep>>) {
        self.queue.extend(steps);
    }

    /// Move every step of `other` to the back of this queue.
    pub fn append(&mut self, mut other: GamePipeline) {
        self.queue.append(&mut other.queue);
    }

    /// Insert steps at the front, keeping their order.
    pub fn prepend(&mut self, steps: Vec<Box<dyn GameStep>>) {
        for step in steps.into_iter().rev() {
            self.queue.push_front(step);
        }
    }

    /// Run steps until the queue drains (`true`) or a step waits for
    /// input (`false`).
    pub fn run(&mut self, game: &mut Game) -> bool {
        while let Some(mut step) = self.queue.pop_front() {
            let (complete, queued) = game.capture_steps(|g| step.continue_step(g));
            if complete {
                self.prepend(queued);
                continue;
            }

            self.queue.push_front(step);
            if queued.is_empty() {
                return false;
            }
            self.prepend(queued);
        }
        true
    }

    /// Offer a menu command to the front step.
    ///
    /// Steps queued while handling it run before the front step resumes.
    pub fn handle_menu_command(&mut self, game: &mut Game, player: PlayerId, arg: &MenuArg) -> bool {
        let Some(step) = self.queue.front_mut() else {
            return false;
        };
        let (handled, queued) = game.capture_steps(|g| step.handle_menu_command(g, player, arg));
        self.prepend(queued);
        handled
    }

    /// The prompt of the front step.
    #[must_use]
    pub fn current_prompt(&self) -> Option<&dyn Prompt> {
        self.queue.front().and_then(|s| s.current_prompt())
    }

    /// Name of the front step, for diagnostics.
    #[must_use]
    pub fn current_step_name(&self) -> Option<&'static str> {
        self.queue.front().map(|s| s.name())
    }
}

/// A step made of ordered stages sharing an inner pipeline.
pub trait Staged {
    fn pipeline(&mut self) -> &mut GamePipeline;

    /// Run the next stage. Returns `false` once no stages remain.
    fn run_next_stage(&mut self, game: &mut Game) -> bool;
}

/// Drive a staged step: drain the inner pipeline, run the next stage,
/// repeat until both are exhausted.
pub fn run_staged<S: Staged>(step: &mut S, game: &mut Game) -> bool {
    loop {
        if !step.pipeline().run(game) {
            return false;
        }
        let (more, queued) = game.capture_steps(|g| step.run_next_stage(g));
        let pipeline = step.pipeline();
        pipeline.extend(queued);
        if !more && pipeline.is_empty() {
            return true;
        }
    }
}

/// A closure run once as a pipeline step.
pub struct SimpleStep {
    name: &'static str,
    handler: Option<Box<dyn FnOnce(&mut Game)>>,
}

impl SimpleStep {
    pub fn new(name: &'static str, handler: impl FnOnce(&mut Game) + 'static) -> Self {
        Self {
            name,
            handler: Some(Box::new(handler)),
        }
    }
}

impl GameStep for SimpleStep {
    fn continue_step(&mut self, game: &mut Game) -> bool {
        if let Some(handler) = self.handler.take() {
            handler(game);
        }
        true
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
