//! Ability resolution.
//!
//! `AbilityResolver` drives one use of an ability through its stages:
//!
//! | stage                    | runs when            |
//! |--------------------------|----------------------|
//! | snapshot                 | always               |
//! | early targets            | unless cancelled     |
//! | initiate (card played)   | unless cancelled     |
//! | resolve costs            | unless cancelled     |
//! | pay costs                | unless cancelled     |
//! | check costs were paid    | unless cancelled     |
//! | resolve targets          | unless cancelled     |
//! | initiate effects         | unless cancelled     |
//! | execute handler          | not cancelled, initiated |
//! | move event card to discard | always             |
//! | refill provinces         | always               |
//!
//! Cancellation is sticky. A cost whose event ends up cancelled fails the
//! ability; costs that were already paid stay paid.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, error};

use crate::cards::CardType;
use crate::core::{EntityId, PlayerId};
use crate::events::{EventId, EventName, GameEvent};
use crate::game::{Game, MessageArg};
use crate::pipeline::{run_staged, GamePipeline, GameStep, Staged};
use crate::prompts::{MenuArg, Prompt, PromptStep, SelectCardPrompt};
use crate::scripting::ScriptValue;
use crate::zones::Location;

use super::ability::AbilityEffect;
use super::context::AbilityContext;
use super::limit::LimitKey;
use super::targets::TargetChooser;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ResolverStage {
    Snapshot,
    EarlyTargets,
    CancelCheck,
    InitiateWindow,
    ResolveCosts,
    PayCosts,
    CheckCostsWerePaid,
    ResolveTargets,
    InitiateEffects,
    ExecuteHandler,
    MoveEventCardToDiscard,
    RefillProvinces,
    Done,
}

impl ResolverStage {
    fn next(self) -> Self {
        match self {
            Self::Snapshot => Self::EarlyTargets,
            Self::EarlyTargets => Self::CancelCheck,
            Self::CancelCheck => Self::InitiateWindow,
            Self::InitiateWindow => Self::ResolveCosts,
            Self::ResolveCosts => Self::PayCosts,
            Self::PayCosts => Self::CheckCostsWerePaid,
            Self::CheckCostsWerePaid => Self::ResolveTargets,
            Self::ResolveTargets => Self::InitiateEffects,
            Self::InitiateEffects => Self::ExecuteHandler,
            Self::ExecuteHandler => Self::MoveEventCardToDiscard,
            Self::MoveEventCardToDiscard => Self::RefillProvinces,
            Self::RefillProvinces | Self::Done => Self::Done,
        }
    }
}

/// Resolves one use of an ability.
pub struct AbilityResolver {
    context: Rc<RefCell<AbilityContext>>,
    cancelled: Rc<Cell<bool>>,
    initiated: Rc<Cell<bool>>,
    /// Target specs whose choice waits until after costs.
    delayed_targets: Vec<usize>,
    initiate_event: Option<EventId>,
    stage: ResolverStage,
    pipeline: GamePipeline,
}

impl AbilityResolver {
    #[must_use]
    pub fn new(context: AbilityContext) -> Self {
        Self {
            context: Rc::new(RefCell::new(context)),
            cancelled: Rc::new(Cell::new(false)),
            initiated: Rc::new(Cell::new(false)),
            delayed_targets: Vec::new(),
            initiate_event: None,
            stage: ResolverStage::Snapshot,
            pipeline: GamePipeline::new(),
        }
    }

    /// Shared cancellation flag.
    #[must_use]
    pub fn cancelled(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.cancelled)
    }

    #[must_use]
    pub fn context(&self) -> Rc<RefCell<AbilityContext>> {
        Rc::clone(&self.context)
    }

    fn snapshot_context(&self) -> AbilityContext {
        self.context.borrow().clone()
    }

    fn cancel(&self, reason: &str) {
        let ctx = self.snapshot_context();
        debug!(source = %ctx.source, title = %ctx.ability.title, reason, "ability cancelled");
        self.cancelled.set(true);
    }

    fn message_args(ctx: &AbilityContext) -> [MessageArg; 2] {
        [MessageArg::Player(ctx.player), MessageArg::Card(ctx.source)]
    }

    /// Queue a prompt choosing targets for one spec.
    fn prompt_for_target(&self, game: &mut Game, index: usize) {
        let ctx = self.snapshot_context();
        let Some(spec) = ctx.ability.targets.get(index).cloned() else {
            return;
        };
        let legal = spec.legal_targets(game, &ctx);
        let chooser = match spec.chooser {
            TargetChooser::Controller => ctx.player,
            TargetChooser::Opponent => ctx.player.opponent(),
        };

        let context = Rc::clone(&self.context);
        let name = spec.name.clone();
        let prompt = SelectCardPrompt::new(chooser, format!("Choose {}", spec.name), legal, move |_, selected| {
            context.borrow_mut().set_targets(&name, selected);
        })
        .with_range(spec.min, spec.max);

        let prompt = if spec.optional {
            prompt.optional(|_| {})
        } else {
            let cancelled = Rc::clone(&self.cancelled);
            prompt.optional(move |_| cancelled.set(true))
        };
        game.queue_step(Box::new(PromptStep::new(prompt)));
    }

    fn early_targets(&mut self, game: &mut Game) {
        let ctx = self.snapshot_context();
        if ctx.ability.cannot_target_first {
            self.delayed_targets = (0..ctx.ability.targets.len()).collect();
            return;
        }
        for (index, spec) in ctx.ability.targets.iter().enumerate() {
            if spec.chooser == TargetChooser::Opponent || !spec.has_enough_targets(game, &ctx) {
                self.delayed_targets.push(index);
            } else {
                self.prompt_for_target(game, index);
            }
        }
    }

    fn initiate_window(&mut self, game: &mut Game) {
        let ctx = self.snapshot_context();
        let event = if ctx.ability.is_card_play() {
            let source = ctx.source;
            let is_event_card = game.state.card(source).is_some_and(|c| c.card_type == CardType::Event);
            game.get_event(
                GameEvent::new(EventName::CARD_PLAYED).with_card(source).with_player(ctx.player),
                move |game, _| {
                    if is_event_card {
                        game.move_card(source, Location::BeingPlayed);
                    }
                },
            )
        } else {
            game.get_event(
                GameEvent::new(EventName::CARD_ABILITY_INITIATED)
                    .with_card(ctx.source)
                    .with_player(ctx.player),
                |_, _| {},
            )
        };
        self.initiate_event = Some(event);
        game.open_event_window(vec![event]);
    }

    fn resolve_costs(&mut self, game: &mut Game) {
        if let Some(event) = self.initiate_event {
            if game.event(event).map_or(true, |e| e.cancelled) {
                self.cancel("initiation cancelled");
                return;
            }
        }
        let ctx = self.snapshot_context();
        if !ctx.ability.costs.iter().all(|cost| cost.can_pay(game, &ctx)) {
            game.add_message("{0} cannot pay the costs of {1}", &Self::message_args(&ctx));
            self.cancel("costs cannot be paid");
        }
    }

    fn pay_costs(&mut self, game: &mut Game) {
        let ctx = self.snapshot_context();
        let events: Vec<EventId> = ctx.ability.costs.iter().map(|cost| cost.pay_event(game, &ctx)).collect();
        if events.is_empty() {
            return;
        }
        self.context.borrow_mut().cost_events = events.clone();
        game.open_event_window(events);
    }

    fn check_costs_were_paid(&mut self, game: &mut Game) {
        let ctx = self.snapshot_context();
        let failed = ctx
            .cost_events
            .iter()
            .any(|id| game.event(*id).map_or(true, |e| e.cancelled));
        if failed {
            game.add_message(
                "{0} attempted to use {1}, but did not successfully pay the required costs",
                &Self::message_args(&ctx),
            );
            self.cancel("cost event cancelled");
        }
    }

    fn resolve_targets(&mut self, game: &mut Game) {
        let ctx = self.snapshot_context();
        for (index, spec) in ctx.ability.targets.iter().enumerate() {
            let chosen = ctx.targets_for(&spec.name);
            let still_legal = !chosen.is_empty() && chosen.iter().all(|id| spec.is_legal(game, &ctx, *id));
            if still_legal {
                continue;
            }
            if !spec.has_enough_targets(game, &ctx) {
                if spec.optional {
                    self.context.borrow_mut().clear_targets(&spec.name);
                    continue;
                }
                game.add_message(
                    "{0} attempted to use {1}, but there are insufficient legal targets",
                    &Self::message_args(&ctx),
                );
                self.cancel("insufficient legal targets");
                return;
            }
            let delayed = self.delayed_targets.contains(&index);
            if delayed || !chosen.is_empty() || !spec.optional {
                self.context.borrow_mut().clear_targets(&spec.name);
                self.prompt_for_target(game, index);
            }
        }
        self.delayed_targets.clear();
    }

    fn check_targets_chosen(&self) -> bool {
        let ctx = self.snapshot_context();
        let missing = ctx
            .ability
            .targets
            .iter()
            .any(|spec| !spec.optional && ctx.targets_for(&spec.name).len() < spec.min);
        if missing {
            self.cancel("targets not chosen");
        }
        !missing
    }

    fn initiate_effects(&mut self, game: &mut Game) {
        if !self.check_targets_chosen() {
            return;
        }
        let ctx = self.snapshot_context();
        let ability = &ctx.ability;

        if let Some(limit) = ability.limit {
            game.limits.increment(LimitKey::Ability(ctx.source, ability.id), limit.scope);
        }
        if let Some(max) = ability.max {
            if let Some(card) = game.state.card(ctx.source) {
                let key = LimitKey::Max(ctx.player, card.card_id, ability.id);
                game.limits.increment(key, max.scope);
            }
        }

        if ability.is_card_play() {
            if let Some(conflict) = game.state.current_conflict.as_mut() {
                conflict.cards_played.push(ctx.source);
            }
            self.initiated.set(true);
            return;
        }

        let initiated = Rc::clone(&self.initiated);
        let mut event = GameEvent::new(EventName::INITIATE_ABILITY_EFFECTS)
            .with_card(ctx.source)
            .with_source(ctx.source)
            .with_player(ctx.player);
        if let Some(target) = ctx.first_target() {
            event = event.with_tag(format!("target:{}", target.raw()));
        }
        let id = game.get_event(event, move |_, _| initiated.set(true));
        game.open_event_window(vec![id]);
    }

    fn execute_handler(&mut self, game: &mut Game) {
        if self.cancelled.get() || !self.initiated.get() {
            return;
        }
        let ctx = self.snapshot_context();
        debug!(source = %ctx.source, title = %ctx.ability.title, "execute ability handler");

        if let Some(template) = &ctx.ability.message {
            let mut args = vec![MessageArg::Player(ctx.player), MessageArg::Card(ctx.source)];
            if let Some(target) = ctx.first_target() {
                args.push(MessageArg::Card(target));
            }
            game.add_message(template, &args);
        }

        match &ctx.ability.effect {
            AbilityEffect::None => {}
            AbilityEffect::Handler(handler) => handler(game, &ctx),
            AbilityEffect::Actions(builder) => {
                let actions = builder(game, &ctx);
                let action_ctx = ctx.action_context();
                let mut events = Vec::new();
                for action in actions {
                    action.add_events_to_array(game, &action_ctx, &mut events);
                }
                if !events.is_empty() {
                    game.open_then_event_window(events);
                }
            }
            AbilityEffect::Script(function) => {
                let mut args = vec![ScriptValue::Card(ctx.source), ScriptValue::Player(ctx.player)];
                args.extend(ctx.targets.iter().map(|(_, ids)| {
                    ScriptValue::List(ids.iter().map(|id| ScriptValue::Card(*id)).collect())
                }));
                if let Err(err) = game.invoke_script(ctx.source, function, &args) {
                    error!(source = %ctx.source, %function, %err, "script ability failed");
                }
            }
        }
    }

    fn move_event_card_to_discard(&self, game: &mut Game) {
        let source = self.context.borrow().source;
        if game.state.card(source).is_some_and(|c| c.location == Location::BeingPlayed) {
            game.move_card(source, Location::ConflictDiscard);
        }
    }

    #[must_use]
    pub fn source(&self) -> EntityId {
        self.context.borrow().source
    }

    #[must_use]
    pub fn player(&self) -> PlayerId {
        self.context.borrow().player
    }
}

impl Staged for AbilityResolver {
    fn pipeline(&mut self) -> &mut GamePipeline {
        &mut self.pipeline
    }

    fn run_next_stage(&mut self, game: &mut Game) -> bool {
        let stage = self.stage;
        if stage == ResolverStage::Done {
            return false;
        }
        self.stage = stage.next();
        let cancelled = self.cancelled.get();

        match stage {
            ResolverStage::Snapshot => {
                game.hold_events();
                let snapshot = game.state.snapshot_cards();
                self.context.borrow_mut().snapshot = Some(snapshot);
            }
            ResolverStage::EarlyTargets if !cancelled => self.early_targets(game),
            ResolverStage::CancelCheck => {}
            ResolverStage::InitiateWindow if !cancelled => self.initiate_window(game),
            ResolverStage::ResolveCosts if !cancelled => self.resolve_costs(game),
            ResolverStage::PayCosts if !cancelled => self.pay_costs(game),
            ResolverStage::CheckCostsWerePaid if !cancelled => self.check_costs_were_paid(game),
            ResolverStage::ResolveTargets if !cancelled => self.resolve_targets(game),
            ResolverStage::InitiateEffects if !cancelled => self.initiate_effects(game),
            ResolverStage::ExecuteHandler => self.execute_handler(game),
            ResolverStage::MoveEventCardToDiscard => self.move_event_card_to_discard(game),
            ResolverStage::RefillProvinces => {
                game.refill_provinces();
                game.release_events();
            }
            _ => {}
        }
        self.stage != ResolverStage::Done
    }
}

impl GameStep for AbilityResolver {
    fn continue_step(&mut self, game: &mut Game) -> bool {
        run_staged(self, game)
    }

    fn handle_menu_command(&mut self, game: &mut Game, player: PlayerId, arg: &MenuArg) -> bool {
        self.pipeline.handle_menu_command(game, player, arg)
    }

    fn current_prompt(&self) -> Option<&dyn Prompt> {
        self.pipeline.current_prompt()
    }

    fn name(&self) -> &'static str {
        "AbilityResolver"
    }
}
