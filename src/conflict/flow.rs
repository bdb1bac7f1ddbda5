//! Conflict resolution.
//!
//! `ConflictFlow` runs one conflict opportunity for the attacking player
//! through a fixed sequence of stages:
//!
//! | stage                    | runs when           |
//! |--------------------------|---------------------|
//! | reset cards              | always              |
//! | prompt for new conflict  | always              |
//! | initiate conflict        | unless passed       |
//! | pay attacker fate costs  | unless passed       |
//! | prompt for covert        | unless passed       |
//! | resolve covert           | unless passed       |
//! | declaration events       | unless passed       |
//! | announce attacker skill  | unless passed       |
//! | prompt for defenders     | unless passed       |
//! | announce defender skill  | unless passed       |
//! | conflict action window   | unless passed       |
//! | determine winner         | unless passed       |
//! | after conflict           | unless passed       |
//! | unopposed penalty        | unless passed       |
//! | break province           | unless passed       |
//! | ring effects             | unless passed       |
//! | claim ring               | unless passed       |
//! | return home              | unless passed       |
//! | complete conflict        | always              |
//!
//! The conflict itself lives in `GameState::current_conflict` so that
//! effects and abilities can inspect it while it runs.
//!
//! ## Winner changes
//!
//! Abilities used in the action window may change skill after the winner
//! was determined. The after-conflict event recomputes the winner in its
//! condition; if the winner changed, the new result is announced and the
//! event is replaced by a fresh one in the same window, which checks again.

use tracing::{debug, info};

use crate::actions::{ActionContext, CardAction, GameAction, PlayerAction, RingAction};
use crate::core::{EntityId, PlayerId};
use crate::effects::StaticModifier;
use crate::events::{EventId, EventName, GameEvent};
use crate::game::{Game, MessageArg};
use crate::pipeline::{run_staged, GamePipeline, GameStep, Staged};
use crate::prompts::{ActionWindow, ChoicePrompt, MenuArg, Prompt, PromptStep, SelectCardPrompt};

use super::covert;
use super::declare::{attack_fate_cost, DeclareConflictPrompt};
use super::ring_effects::resolve_ring_effect;
use super::state::{can_defend, Conflict};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ConflictStage {
    ResetCards,
    PromptForNewConflict,
    InitiateConflict,
    PayAttackerCosts,
    PromptForCovert,
    ResolveCovert,
    RaiseDeclarationEvents,
    AnnounceAttackerSkill,
    PromptForDefenders,
    AnnounceDefenderSkill,
    OpenActionWindow,
    DetermineWinner,
    AfterConflict,
    ApplyUnopposed,
    CheckBreakProvince,
    ResolveRingEffects,
    ClaimRing,
    ReturnHome,
    CompleteConflict,
    Done,
}

impl ConflictStage {
    fn next(self) -> Self {
        match self {
            Self::ResetCards => Self::PromptForNewConflict,
            Self::PromptForNewConflict => Self::InitiateConflict,
            Self::InitiateConflict => Self::PayAttackerCosts,
            Self::PayAttackerCosts => Self::PromptForCovert,
            Self::PromptForCovert => Self::ResolveCovert,
            Self::ResolveCovert => Self::RaiseDeclarationEvents,
            Self::RaiseDeclarationEvents => Self::AnnounceAttackerSkill,
            Self::AnnounceAttackerSkill => Self::PromptForDefenders,
            Self::PromptForDefenders => Self::AnnounceDefenderSkill,
            Self::AnnounceDefenderSkill => Self::OpenActionWindow,
            Self::OpenActionWindow => Self::DetermineWinner,
            Self::DetermineWinner => Self::AfterConflict,
            Self::AfterConflict => Self::ApplyUnopposed,
            Self::ApplyUnopposed => Self::CheckBreakProvince,
            Self::CheckBreakProvince => Self::ResolveRingEffects,
            Self::ResolveRingEffects => Self::ClaimRing,
            Self::ClaimRing => Self::ReturnHome,
            Self::ReturnHome => Self::CompleteConflict,
            Self::CompleteConflict | Self::Done => Self::Done,
        }
    }

    /// Stages that run even when the attacker passed.
    fn runs_when_passed(self) -> bool {
        matches!(self, Self::ResetCards | Self::PromptForNewConflict | Self::CompleteConflict)
    }
}

/// One conflict opportunity. See the module docs.
pub struct ConflictFlow {
    attacking_player: PlayerId,
    stage: ConflictStage,
    pipeline: GamePipeline,
}

impl ConflictFlow {
    #[must_use]
    pub fn new(attacking_player: PlayerId) -> Self {
        Self {
            attacking_player,
            stage: ConflictStage::ResetCards,
            pipeline: GamePipeline::new(),
        }
    }

    #[must_use]
    pub fn attacking_player(&self) -> PlayerId {
        self.attacking_player
    }

    fn conflict(game: &Game) -> Option<&Conflict> {
        game.state.current_conflict.as_ref()
    }

    fn is_passed(game: &Game) -> bool {
        Self::conflict(game).map_or(true, |c| c.conflict_passed)
    }

    // === Declaration ===

    fn reset_cards(&self, game: &mut Game) {
        for card in game.state.cards_in_play() {
            if let Some(instance) = game.state.card_mut(card) {
                instance.covert_bypassed = false;
            }
        }
        game.state.current_conflict = Some(Conflict::new(self.attacking_player));
    }

    fn prompt_for_new_conflict(&self, game: &mut Game) {
        game.queue_step(Box::new(PromptStep::new(DeclareConflictPrompt::new(self.attacking_player))));
    }

    fn initiate_conflict(&self, game: &mut Game) {
        let Some(conflict) = Self::conflict(game).cloned() else {
            return;
        };
        let Some(element) = conflict.ring else {
            return;
        };
        game.state
            .player_mut(conflict.attacking_player)
            .use_opportunity(conflict.conflict_type);
        let ring = game.state.ring_mut(element);
        ring.contested = true;
        ring.conflict_type = conflict.conflict_type;

        info!(
            attacker = %conflict.attacking_player,
            ring = %element,
            conflict_type = %conflict.conflict_type,
            attackers = conflict.attackers.len(),
            "conflict declared"
        );
        let province = conflict.province.map_or(MessageArg::Text("a province".into()), MessageArg::Card);
        game.add_message(
            "{0} is initiating a {1} conflict at {2}, contesting the {3} ring",
            &[
                MessageArg::Player(conflict.attacking_player),
                MessageArg::Text(conflict.conflict_type.to_string()),
                province,
                MessageArg::Ring(element),
            ],
        );
    }

    fn pay_attacker_costs(&self, game: &mut Game) {
        let Some(conflict) = Self::conflict(game) else {
            return;
        };
        let player = conflict.attacking_player;
        let cost = attack_fate_cost(&game.state, &conflict.attackers);
        if cost > 0 {
            debug!(%player, cost, "paying fate to attack");
            PlayerAction::lose_fate(player, cost).resolve(game, &ActionContext::new(player));
        }
    }

    fn raise_declaration_events(&self, game: &mut Game) {
        let Some(conflict) = Self::conflict(game).cloned() else {
            return;
        };
        let player = conflict.attacking_player;
        let context = ActionContext::new(player);
        let mut events = Vec::new();

        let mut declared = GameEvent::new(EventName::CONFLICT_DECLARED).with_player(player);
        if let Some(ring) = conflict.ring {
            declared = declared.with_ring(ring);
        }
        events.push(game.get_event(declared, |_, _| {}));

        if let Some(ring) = conflict.ring {
            RingAction::take_fate(ring).add_events_to_array(game, &context, &mut events);
        }

        if let Some(province) = conflict.province {
            let revealed = GameEvent::new(EventName::PROVINCE_REVEALED)
                .with_card(province)
                .with_player(conflict.defending_player);
            events.push(game.get_event(revealed, move |game, _| {
                if let Some(card) = game.state.card_mut(province) {
                    card.face_down = false;
                }
            }));
        }
        game.open_event_window(events);
    }

    // === Skill ===

    fn announce_skill(game: &mut Game, attacking_side: bool) {
        Conflict::refresh(&mut game.state);
        let Some(conflict) = Self::conflict(game) else {
            return;
        };
        let (player, skill) = if attacking_side {
            (conflict.attacking_player, conflict.attacker_skill)
        } else {
            (conflict.defending_player, conflict.defender_skill)
        };
        let side = if attacking_side { "attacking" } else { "defending" };
        let conflict_type = conflict.conflict_type.to_string();
        game.add_message(
            "{0} is {1} with skill {2} {3}",
            &[
                MessageArg::Player(player),
                MessageArg::Text(side.into()),
                MessageArg::Number(skill),
                MessageArg::Text(conflict_type),
            ],
        );
    }

    fn prompt_for_defenders(&self, game: &mut Game) {
        let Some(conflict) = Self::conflict(game) else {
            return;
        };
        let defender = conflict.defending_player;
        let conflict_type = conflict.conflict_type;
        let candidates: Vec<EntityId> = game
            .state
            .characters_in_play(defender)
            .into_iter()
            .filter(|c| can_defend(&game.state, *c, defender, conflict_type))
            .collect();
        if candidates.is_empty() {
            debug!(%defender, "no characters can defend");
            return;
        }
        let max = candidates.len();
        let prompt = SelectCardPrompt::new(defender, "Choose defenders", candidates, move |game, selected| {
            if let Some(conflict) = game.state.current_conflict.as_mut() {
                conflict.defenders = selected;
            }
            game.raise_event(GameEvent::new(EventName::DEFENDERS_DECLARED).with_player(defender), |_, _| {});
        })
        .with_range(0, max);
        game.queue_step(Box::new(PromptStep::new(prompt)));
    }

    // === Resolution ===

    fn determine_winner(&self, game: &mut Game) {
        Conflict::refresh(&mut game.state);
        Self::announce_winner(game);
    }

    fn announce_winner(game: &mut Game) {
        let Some(conflict) = Self::conflict(game).cloned() else {
            return;
        };
        match conflict.winner {
            None => game.add_message("There is no winner or loser for this conflict because both players have 0 skill", &[]),
            Some(winner) => {
                info!(%winner, attacker = conflict.attacker_skill, defender = conflict.defender_skill, "conflict won");
                game.add_message(
                    "{0} won a {1} conflict {2} vs {3}",
                    &[
                        MessageArg::Player(winner),
                        MessageArg::Text(conflict.conflict_type.to_string()),
                        MessageArg::Number(conflict.attacker_skill),
                        MessageArg::Number(conflict.defender_skill),
                    ],
                );
            }
        }
    }

    /// Create an after-conflict event for the current winner. Its
    /// condition replaces it when the winner has changed since.
    fn after_conflict_event(game: &mut Game) -> EventId {
        let winner = Self::conflict(game).and_then(|c| c.winner);
        let mut event = GameEvent::new(EventName::AFTER_CONFLICT);
        if let Some(winner) = winner {
            event = event.with_player(winner);
        }
        let id = game.get_event(event, |game, _| {
            if let Some(conflict) = game.state.current_conflict.as_mut() {
                conflict.conflict_unopposed = conflict.attacker_won() && conflict.defenders.is_empty();
            }
        });
        game.set_event_condition(id, move |game, _| {
            let current = Conflict::refresh(&mut game.state);
            if current == winner {
                return true;
            }
            debug!(?winner, ?current, "conflict winner changed");
            Self::announce_winner(game);
            let replacement = Self::after_conflict_event(game);
            game.add_event_to_window(replacement);
            false
        });
        id
    }

    fn apply_unopposed(&self, game: &mut Game) {
        let Some(conflict) = Self::conflict(game) else {
            return;
        };
        if !conflict.conflict_unopposed {
            return;
        }
        let Some(loser) = conflict.loser else {
            return;
        };
        let exempt = game
            .state
            .player(loser)
            .has_modifier(|m| matches!(m, StaticModifier::NoUnopposedPenalty));
        if exempt {
            debug!(%loser, "unopposed penalty prevented");
            return;
        }
        let amount = game.config.unopposed_honor_loss;
        PlayerAction::lose_honor(loser, amount).resolve(game, &ActionContext::new(loser));
        game.add_message(
            "{0} loses {1} honor for not defending the conflict.",
            &[MessageArg::Player(loser), MessageArg::Number(amount)],
        );
    }

    fn check_break_province(&self, game: &mut Game) {
        let Some(conflict) = Self::conflict(game).cloned() else {
            return;
        };
        if !conflict.attacker_won() {
            return;
        }
        let Some(province) = conflict.province else {
            return;
        };
        let Some(card) = game.state.card(province) else {
            return;
        };
        if card.broken || conflict.attacker_skill < conflict.defender_skill + card.strength() {
            return;
        }
        let attacker = conflict.attacking_player;
        CardAction::break_province(province).resolve(game, &ActionContext::new(attacker));
        let stronghold = conflict.province_slot == Some(0);
        game.queue_simple_step("province broken", move |game| {
            if !game.state.card(province).is_some_and(|c| c.broken) {
                return;
            }
            game.add_message(
                "{0} has broken {1}!",
                &[MessageArg::Player(attacker), MessageArg::Card(province)],
            );
            if stronghold {
                game.record_winner(attacker, "breaking their opponent's stronghold");
            }
        });
    }

    fn resolve_ring_effects(&self, game: &mut Game) {
        let Some(conflict) = Self::conflict(game) else {
            return;
        };
        if !conflict.attacker_won() {
            return;
        }
        let Some(element) = conflict.ring else {
            return;
        };
        let player = conflict.attacking_player;
        let prompt = ChoicePrompt::yes_no(player, format!("Resolve the {element} ring effect?"), move |game, yes| {
            if !yes {
                return;
            }
            let event = GameEvent::new(EventName::RESOLVE_RING_ELEMENT)
                .with_ring(element)
                .with_player(player);
            game.raise_event(event, move |game, _| resolve_ring_effect(game, player, element));
        });
        game.queue_step(Box::new(PromptStep::new(prompt)));
    }

    fn claim_ring(&self, game: &mut Game) {
        let Some(conflict) = Self::conflict(game) else {
            return;
        };
        let Some(element) = conflict.ring else {
            return;
        };
        let winner = conflict.winner;
        match winner {
            Some(winner) => RingAction::claim(element).resolve(game, &ActionContext::new(winner)),
            None => game.state.ring_mut(element).contested = false,
        }
    }

    fn return_home(&self, game: &mut Game) {
        let Some(conflict) = Self::conflict(game) else {
            return;
        };
        let player = conflict.attacking_player;
        let bowing: Vec<EntityId> = conflict
            .participants()
            .into_iter()
            .filter(|id| {
                game.state
                    .card(*id)
                    .is_some_and(|c| !c.has_modifier(|m| matches!(m, StaticModifier::DoesNotBow)))
            })
            .collect();
        if bowing.is_empty() {
            return;
        }
        game.raise_event(GameEvent::new(EventName::RETURN_HOME).with_player(player), move |game, _| {
            CardAction::bow(bowing).resolve(game, &ActionContext::new(player));
        });
    }

    fn complete_conflict(&self, game: &mut Game) {
        if Self::is_passed(game) {
            game.add_message("{0} passes their conflict opportunity", &[MessageArg::Player(self.attacking_player)]);
            game.state.current_conflict = None;
            return;
        }
        let player = self.attacking_player;
        game.raise_event(GameEvent::new(EventName::CONFLICT_FINISHED).with_player(player), |game, _| {
            if let Some(element) = game.state.current_conflict.as_ref().and_then(|c| c.ring) {
                game.state.ring_mut(element).contested = false;
            }
            for card in game.state.cards_in_play() {
                if let Some(instance) = game.state.card_mut(card) {
                    instance.covert_bypassed = false;
                }
            }
            game.state.current_conflict = None;
            debug!("conflict finished");
        });
    }
}

impl Staged for ConflictFlow {
    fn pipeline(&mut self) -> &mut GamePipeline {
        &mut self.pipeline
    }

    fn run_next_stage(&mut self, game: &mut Game) -> bool {
        let stage = self.stage;
        if stage == ConflictStage::Done {
            return false;
        }
        self.stage = stage.next();
        if !stage.runs_when_passed() && Self::is_passed(game) {
            return true;
        }
        if game.state.winner.is_some() && stage != ConflictStage::CompleteConflict {
            return true;
        }

        match stage {
            ConflictStage::ResetCards => self.reset_cards(game),
            ConflictStage::PromptForNewConflict => self.prompt_for_new_conflict(game),
            ConflictStage::InitiateConflict => self.initiate_conflict(game),
            ConflictStage::PayAttackerCosts => self.pay_attacker_costs(game),
            ConflictStage::PromptForCovert => covert::prompt_for_covert(game),
            ConflictStage::ResolveCovert => covert::resolve_covert(game),
            ConflictStage::RaiseDeclarationEvents => self.raise_declaration_events(game),
            ConflictStage::AnnounceAttackerSkill => Self::announce_skill(game, true),
            ConflictStage::PromptForDefenders => self.prompt_for_defenders(game),
            ConflictStage::AnnounceDefenderSkill => Self::announce_skill(game, false),
            ConflictStage::OpenActionWindow => game.queue_step(Box::new(ActionWindow::new("Conflict Action Window"))),
            ConflictStage::DetermineWinner => self.determine_winner(game),
            ConflictStage::AfterConflict => {
                let id = Self::after_conflict_event(game);
                game.open_event_window(vec![id]);
            }
            ConflictStage::ApplyUnopposed => self.apply_unopposed(game),
            ConflictStage::CheckBreakProvince => self.check_break_province(game),
            ConflictStage::ResolveRingEffects => self.resolve_ring_effects(game),
            ConflictStage::ClaimRing => self.claim_ring(game),
            ConflictStage::ReturnHome => self.return_home(game),
            ConflictStage::CompleteConflict => self.complete_conflict(game),
            ConflictStage::Done => {}
        }
        self.stage != ConflictStage::Done
    }
}

impl GameStep for ConflictFlow {
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
        "ConflictFlow"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardDefinition, CardId, CardRegistry};
    use crate::core::GameConfig;
    use crate::rings::{ConflictType, Element};
    use crate::zones::Location;
    use std::rc::Rc;

    fn game() -> Game {
        let mut registry = CardRegistry::new();
        registry.register(CardDefinition::character(CardId::new(1), "Doji Challenger", 3, 3, 3));
        registry.register(CardDefinition::province(CardId::new(2), "Shameful Display", 3));
        let mut game = Game::new(GameConfig::default(), Rc::new(registry));
        for slot in 0..=4 {
            game.create_card(CardId::new(2), PlayerId::new(1), Location::Province(slot)).unwrap();
        }
        game
    }

    #[test]
    fn test_stage_order_ends_with_completion() {
        let mut stage = ConflictStage::ResetCards;
        let mut count = 0;
        while stage != ConflictStage::Done {
            stage = stage.next();
            count += 1;
        }
        assert_eq!(count, 19);
        assert!(ConflictStage::CompleteConflict.runs_when_passed());
        assert!(!ConflictStage::ClaimRing.runs_when_passed());
    }

    #[test]
    fn test_pass_skips_to_completion() {
        let mut game = game();
        game.queue_step(Box::new(ConflictFlow::new(PlayerId::new(0))));

        // no characters, so the declaration passes itself
        assert!(game.update());
        assert!(game.state.current_conflict.is_none());
        assert!(!game.state.player(PlayerId::new(0)).has_opportunity(ConflictType::Military));
        assert!(game.state.player(PlayerId::new(0)).has_opportunity(ConflictType::Political));
        assert!(game.state.rings().all(|r| r.claimed_by.is_none()));
    }

    #[test]
    fn test_declared_conflict_claims_ring() {
        let mut game = game();
        let attacker = game.create_card(CardId::new(1), PlayerId::new(0), Location::PlayArea).unwrap();
        game.queue_step(Box::new(ConflictFlow::new(PlayerId::new(0))));
        assert!(!game.update());

        game.menu_command(
            PlayerId::new(0),
            MenuArg::DeclareConflict {
                ring: Element::Earth,
                conflict_type: ConflictType::Political,
                province: 2,
                attackers: vec![attacker],
            },
        )
        .unwrap();
        // action window: both players pass
        game.menu_command(PlayerId::new(1), MenuArg::Pass).unwrap();
        game.menu_command(PlayerId::new(0), MenuArg::Pass).unwrap();
        // decline the ring effect
        game.menu_command(PlayerId::new(0), MenuArg::Choice(1)).unwrap();

        assert!(game.is_idle());
        assert_eq!(game.state.ring(Element::Earth).claimed_by, Some(PlayerId::new(0)));
        assert!(game.state.card(attacker).unwrap().bowed);
        assert!(game.state.current_conflict.is_none());
        assert_eq!(game.state.player(PlayerId::new(1)).honor, 9);
    }
}
