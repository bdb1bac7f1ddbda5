//! The game world.
//!
//! `Game` ties the engine together: card state, the effect engine, the
//! ability window, limits, cost reducers, the event bus, the step
//! pipeline and the message log. Every component receives the `Game` it
//! works on as an argument; nothing looks it up ambiently.
//!
//! ## Driving a game
//!
//! Steps are queued with `queue_step` and run by `update`, which returns
//! once the pipeline drains or blocks on a prompt. Player input goes
//! through `menu_command`, which resumes the pipeline.
//!
//! ```
//! use std::rc::Rc;
//! use l5r_engine::cards::CardRegistry;
//! use l5r_engine::core::GameConfig;
//! use l5r_engine::game::Game;
//!
//! let mut game = Game::initialize(GameConfig::default(), Rc::new(CardRegistry::new()));
//! game.queue_simple_step("setup", |g| g.state.round = 1);
//! assert!(game.update());
//! assert_eq!(game.state.round, 1);
//! ```

mod cards;
mod events;
mod messages;

pub use messages::{GameMessage, MessageArg};

use rustc_hash::FxHashMap;
use std::rc::Rc;
use tracing::{debug, info, warn};

use crate::abilities::{AbilityWindow, CardAbility, LimitTracker, SimultaneousEffectWindow};
use crate::actions::ActionContext;
use crate::cards::{CardId, CardInstance, CardRegistry};
use crate::core::{EngineError, EntityId, GameConfig, GameState, PlayerId, PlayerState, Result};
use crate::costs::CostReducerManager;
use crate::effects::{EffectEngine, EffectId, GameEffect};
use crate::events::{EventBus, EventId, GameEvent};
use crate::pipeline::{GamePipeline, GameStep, SimpleStep};
use crate::prompts::{MenuArg, PromptView};
use crate::scripting::{ScriptHost, ScriptValue};

use events::{EventRecord, WindowFrame};

/// One game in progress.
pub struct Game {
    pub config: GameConfig,
    pub registry: Rc<CardRegistry>,
    pub state: GameState,
    pub effects: EffectEngine,
    pub abilities: AbilityWindow,
    pub limits: LimitTracker,
    pub reducers: CostReducerManager,
    pub bus: EventBus,

    events: FxHashMap<EventId, EventRecord>,
    next_event: u32,
    frames: Vec<WindowFrame>,
    /// Steps still reading settled events (ability resolutions).
    event_holds: usize,

    pipeline: GamePipeline,
    /// Steps queued while a step runs, innermost capture last.
    captures: Vec<Vec<Box<dyn GameStep>>>,

    messages: im::Vector<GameMessage>,

    script_host: Option<Rc<dyn ScriptHost>>,
    scripted_abilities: FxHashMap<CardId, Vec<Rc<CardAbility>>>,
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("phase", &self.state.phase)
            .field("round", &self.state.round)
            .field("effects", &self.effects.len())
            .field("registrations", &self.abilities.len())
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

impl Game {
    pub fn new(config: GameConfig, registry: Rc<CardRegistry>) -> Self {
        let state = GameState::new(&config);
        let effects = EffectEngine::new(config.max_effect_loops);
        Self {
            config,
            registry,
            state,
            effects,
            abilities: AbilityWindow::new(),
            limits: LimitTracker::new(),
            reducers: CostReducerManager::new(),
            bus: EventBus::new(),
            events: FxHashMap::default(),
            next_event: 0,
            frames: Vec::new(),
            event_holds: 0,
            pipeline: GamePipeline::new(),
            captures: Vec::new(),
            messages: im::Vector::new(),
            script_host: None,
            scripted_abilities: FxHashMap::default(),
        }
    }

    // === Lifecycle ===

    /// Create a game ready to receive cards and steps.
    pub fn initialize(config: GameConfig, registry: Rc<CardRegistry>) -> Self {
        let mut game = Self::new(config, registry);
        info!(players = game.state.player_count(), seed = game.config.seed, "game initialized");
        game.check_game_state(true);
        game
    }

    /// Tear down: drop pending steps and windows, remove every effect and
    /// registration.
    pub fn shutdown(&mut self) {
        AbilityWindow::force_close_window(self);
        self.pipeline = GamePipeline::new();
        self.captures.clear();
        self.frames.clear();
        self.event_holds = 0;
        self.events.clear();
        self.effects.unapply_and_remove(&mut self.state, &mut self.bus, |_| true);
        for card in self.state.cards_on_table() {
            self.abilities.unregister_all_abilities(card);
        }
        info!(round = self.state.round, "game shut down");
    }

    pub fn set_script_host(&mut self, host: Rc<dyn ScriptHost>) {
        self.script_host = Some(host);
        self.scripted_abilities.clear();
    }

    // === Pipeline ===

    /// Queue a step. Inside a running step, the new step runs right after
    /// it.
    pub fn queue_step(&mut self, step: Box<dyn GameStep>) {
        match self.captures.last_mut() {
            Some(captured) => captured.push(step),
            None => self.pipeline.push(step),
        }
    }

    pub fn queue_simple_step(&mut self, name: &'static str, handler: impl FnOnce(&mut Game) + 'static) {
        self.queue_step(Box::new(SimpleStep::new(name, handler)));
    }

    /// Run `f`, returning the steps it queued instead of queueing them.
    pub fn capture_steps<R>(&mut self, f: impl FnOnce(&mut Game) -> R) -> (R, Vec<Box<dyn GameStep>>) {
        self.captures.push(Vec::new());
        let result = f(self);
        let queued = self.captures.pop().unwrap_or_default();
        (result, queued)
    }

    /// Run the pipeline until it drains (`true`) or waits on a prompt.
    pub fn update(&mut self) -> bool {
        let mut pipeline = std::mem::take(&mut self.pipeline);
        let done = pipeline.run(self);
        let queued = std::mem::replace(&mut self.pipeline, pipeline);
        self.pipeline.append(queued);
        if done && !self.pipeline.is_empty() {
            return self.update();
        }
        done
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pipeline.is_empty()
    }

    // === Player input ===

    /// Answer the current prompt.
    pub fn menu_command(&mut self, player: PlayerId, arg: MenuArg) -> Result<()> {
        if player.index() >= self.state.player_count() {
            return Err(EngineError::UnknownPlayer(player));
        }
        if self.pipeline.current_prompt().is_none() {
            return Err(EngineError::NoActivePrompt);
        }

        let mut pipeline = std::mem::take(&mut self.pipeline);
        let handled = pipeline.handle_menu_command(self, player, &arg);
        let queued = std::mem::replace(&mut self.pipeline, pipeline);
        self.pipeline.append(queued);

        if !handled {
            warn!(%player, ?arg, "menu command rejected");
            return Err(EngineError::CommandRejected { player });
        }
        self.update();
        Ok(())
    }

    /// What `player` sees if they are being asked something.
    #[must_use]
    pub fn active_prompt(&self, player: PlayerId) -> Option<PromptView> {
        let prompt = self.pipeline.current_prompt()?;
        prompt
            .active_condition(self, player)
            .then(|| prompt.active_prompt(self, player))
    }

    /// What players who are not being asked see.
    #[must_use]
    pub fn waiting_prompt(&self) -> Option<PromptView> {
        self.pipeline.current_prompt().map(|p| p.waiting_prompt())
    }

    /// Name of the step at the front of the pipeline.
    #[must_use]
    pub fn current_step_name(&self) -> Option<&'static str> {
        self.pipeline.current_step_name()
    }

    /// Mark a player disconnected. Windows waiting on them pass for them.
    pub fn disconnect(&mut self, player: PlayerId) {
        warn!(%player, "player disconnected");
        self.state.player_mut(player).disconnected = true;
        self.update();
    }

    // === Queries ===

    /// Default action context for engine-initiated actions.
    #[must_use]
    pub fn framework_context(&self, player: Option<PlayerId>) -> ActionContext {
        ActionContext::new(player.unwrap_or(self.state.first_player))
    }

    pub fn players(&self) -> impl Iterator<Item = (PlayerId, &PlayerState)> {
        self.state.players.iter()
    }

    pub fn all_cards(&self) -> impl Iterator<Item = &CardInstance> {
        self.state.all_cards()
    }

    #[must_use]
    pub fn find_any_cards_in_play(&self, predicate: impl Fn(&CardInstance) -> bool) -> Vec<EntityId> {
        self.state
            .cards_in_play()
            .into_iter()
            .filter(|id| self.state.card(*id).is_some_and(&predicate))
            .collect()
    }

    /// Native abilities of a card followed by its scripted ones.
    #[must_use]
    pub fn abilities_of(&self, card: EntityId) -> Vec<Rc<CardAbility>> {
        let Some(instance) = self.state.card(card) else {
            return Vec::new();
        };
        let mut abilities = self.registry.abilities(instance.card_id).to_vec();
        if let Some(scripted) = self.scripted_abilities.get(&instance.card_id) {
            abilities.extend(scripted.iter().cloned());
        }
        abilities
    }

    // === Effects ===

    /// Register an effect and apply it immediately.
    pub fn add_effect(&mut self, effect: GameEffect) -> EffectId {
        let id = self.effects.add(effect, &mut self.bus);
        self.effects.check_effects(&mut self.state, true);
        id
    }

    /// Settle effects, drop expired cost reducers, and check for a winner.
    pub fn check_game_state(&mut self, state_changed: bool) {
        self.effects.check_effects(&mut self.state, state_changed);
        self.reducers.cleanup_expired_reducers(&self.state, &self.limits);
        self.check_winner();
    }

    fn check_winner(&mut self) {
        if self.state.winner.is_some() {
            return;
        }
        let victory = self.config.honor_victory;
        let winner = self.state.player_ids().find_map(|p| {
            let honor = self.state.player(p).honor;
            if honor >= victory {
                Some(p)
            } else if honor <= 0 {
                Some(p.opponent())
            } else {
                None
            }
        });
        if let Some(winner) = winner {
            self.record_winner(winner, "honor");
        }
    }

    pub(crate) fn record_winner(&mut self, winner: PlayerId, reason: &str) {
        if self.state.winner.is_some() {
            return;
        }
        info!(%winner, reason, "game won");
        self.state.winner = Some(winner);
        self.add_message(
            "{0} has won the game by {1}",
            &[MessageArg::Player(winner), MessageArg::Text(reason.to_string())],
        );
    }

    /// Fire delayed effects triggered by a batch of events, all in one
    /// simultaneous window.
    pub fn check_delayed_effects(&mut self, events: &[EventId]) {
        let batch: Vec<GameEvent> = events.iter().filter_map(|id| self.event(*id).cloned()).collect();
        let firings = self.effects.check_delayed_effects(&mut self.state, &mut self.bus, &batch);
        if !firings.is_empty() {
            debug!(count = firings.len(), "delayed effects triggered");
            self.queue_step(Box::new(SimultaneousEffectWindow::new(firings)));
        }
    }

    // === Scripting ===

    /// Run a function of a card's script.
    pub fn invoke_script(&mut self, card: EntityId, function: &str, args: &[ScriptValue]) -> Result<ScriptValue> {
        let Some(host) = self.script_host.clone() else {
            return Err(crate::core::ScriptError::UnknownFunction(function.to_string()).into());
        };
        Ok(host.invoke(self, card, function, args)?)
    }

    #[must_use]
    pub fn evaluate_script_condition(&self, card: EntityId, key: &str, event: &GameEvent) -> bool {
        self.script_host
            .as_ref()
            .is_some_and(|host| host.evaluate_condition(&self.state, card, key, event))
    }
}
