//! Conflict and defender declaration.

use thiserror::Error;
use tracing::{debug, warn};

use crate::cards::CardInstance;
use crate::core::{EntityId, GameState, PlayerId};
use crate::effects::StaticModifier;
use crate::game::Game;
use crate::prompts::{MenuArg, Prompt, PromptView};
use crate::rings::{ConflictType, Element};

use super::state::can_attack;

/// Broken provinces needed before the stronghold can be attacked.
const STRONGHOLD_BREAK_REQUIREMENT: usize = 3;

/// Why a declaration was refused.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DeclarationError {
    #[error("player cannot declare conflicts")]
    CannotDeclare,
    #[error("no {0} conflict opportunity remains")]
    NoOpportunity(ConflictType),
    #[error("the {0} ring is not available")]
    RingUnavailable(Element),
    #[error("province {0} cannot be attacked")]
    InvalidProvince(u8),
    #[error("no attackers declared")]
    NoAttackers,
    #[error("{0} cannot attack")]
    IllegalAttacker(EntityId),
    #[error("attacking costs {required} fate, only {available} available")]
    NotEnoughFate { required: i32, available: i32 },
}

/// A proposed conflict.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    pub ring: Element,
    pub conflict_type: ConflictType,
    pub province: u8,
    pub attackers: Vec<EntityId>,
}

fn broken_provinces(state: &GameState, player: PlayerId) -> usize {
    (1..=4)
        .filter_map(|slot| state.province_card(player, slot))
        .filter(|id| state.card(*id).is_some_and(|c| c.broken))
        .count()
}

/// Province slots the defender can be attacked at.
#[must_use]
pub fn attackable_provinces(state: &GameState, defender: PlayerId) -> Vec<u8> {
    let stronghold_open = broken_provinces(state, defender) >= STRONGHOLD_BREAK_REQUIREMENT;
    (0..=4)
        .filter(|slot| *slot != 0 || stronghold_open)
        .filter(|slot| {
            state
                .province_card(defender, *slot)
                .and_then(|id| state.card(id))
                .is_some_and(|c| !c.broken)
        })
        .collect()
}

/// Fate the attacker must pay to attack with `attackers`.
#[must_use]
pub fn attack_fate_cost(state: &GameState, attackers: &[EntityId]) -> i32 {
    attackers
        .iter()
        .filter_map(|id| state.card(*id))
        .map(CardInstance::fate_cost_to_attack)
        .sum()
}

/// Check a declaration against the rules.
pub fn validate_declaration(
    state: &GameState,
    player: PlayerId,
    declaration: &Declaration,
) -> Result<(), DeclarationError> {
    let attacker = state.player(player);
    if attacker.has_modifier(|m| matches!(m, StaticModifier::CannotDeclareConflicts)) {
        return Err(DeclarationError::CannotDeclare);
    }
    if attacker.passed_conflict || !attacker.has_opportunity(declaration.conflict_type) {
        return Err(DeclarationError::NoOpportunity(declaration.conflict_type));
    }
    if !state.ring(declaration.ring).is_unclaimed() {
        return Err(DeclarationError::RingUnavailable(declaration.ring));
    }
    if !attackable_provinces(state, player.opponent()).contains(&declaration.province) {
        return Err(DeclarationError::InvalidProvince(declaration.province));
    }
    if declaration.attackers.is_empty() {
        return Err(DeclarationError::NoAttackers);
    }
    for (index, card) in declaration.attackers.iter().enumerate() {
        let duplicate = declaration.attackers[..index].contains(card);
        if duplicate || !can_attack(state, *card, player, declaration.conflict_type) {
            return Err(DeclarationError::IllegalAttacker(*card));
        }
    }
    let required = attack_fate_cost(state, &declaration.attackers);
    if required > attacker.fate {
        return Err(DeclarationError::NotEnoughFate {
            required,
            available: attacker.fate,
        });
    }
    Ok(())
}

/// Asks the attacking player to declare a conflict or pass.
///
/// A declaration is written into the current conflict. Passing marks the
/// conflict passed and spends one opportunity.
pub struct DeclareConflictPrompt {
    player: PlayerId,
    complete: bool,
}

impl DeclareConflictPrompt {
    #[must_use]
    pub fn new(player: PlayerId) -> Self {
        Self { player, complete: false }
    }

    fn can_declare_any(game: &Game, player: PlayerId) -> bool {
        let state = &game.state;
        let attacker = state.player(player);
        !attacker.has_modifier(|m| matches!(m, StaticModifier::CannotDeclareConflicts))
            && attacker.has_any_opportunity()
            && state.rings().any(|r| r.is_unclaimed())
            && !attackable_provinces(state, player.opponent()).is_empty()
            && [ConflictType::Military, ConflictType::Political].into_iter().any(|t| {
                attacker.has_opportunity(t)
                    && state.characters_in_play(player).into_iter().any(|c| can_attack(state, c, player, t))
            })
    }

    fn pass(&mut self, game: &mut Game) {
        debug!(player = %self.player, "conflict passed");
        let player = game.state.player_mut(self.player);
        if player.has_opportunity(ConflictType::Military) {
            player.use_opportunity(ConflictType::Military);
        } else {
            player.use_opportunity(ConflictType::Political);
        }
        if let Some(conflict) = game.state.current_conflict.as_mut() {
            conflict.conflict_passed = true;
        }
        self.complete = true;
    }

    fn declare(&mut self, game: &mut Game, declaration: Declaration) -> bool {
        if let Err(reason) = validate_declaration(&game.state, self.player, &declaration) {
            warn!(player = %self.player, %reason, "declaration rejected");
            return false;
        }
        let defender = self.player.opponent();
        let province = game.state.province_card(defender, declaration.province);
        let Some(conflict) = game.state.current_conflict.as_mut() else {
            return false;
        };
        conflict.conflict_type = declaration.conflict_type;
        conflict.ring = Some(declaration.ring);
        conflict.province = province;
        conflict.province_slot = Some(declaration.province);
        conflict.attackers = declaration.attackers;
        conflict.declared = true;
        self.complete = true;
        true
    }
}

impl Prompt for DeclareConflictPrompt {
    fn activate(&mut self, game: &mut Game) {
        if game.state.player(self.player).disconnected || !Self::can_declare_any(game, self.player) {
            self.pass(game);
        }
    }

    fn active_condition(&self, _game: &Game, player: PlayerId) -> bool {
        player == self.player
    }

    fn is_complete(&self) -> bool {
        self.complete
    }

    fn active_prompt(&self, game: &Game, player: PlayerId) -> PromptView {
        let state = &game.state;
        let rings = state.rings().filter(|r| r.is_unclaimed()).map(|r| r.element);
        let attackers = state.characters_in_play(player).into_iter().filter(|c| {
            [ConflictType::Military, ConflictType::Political]
                .into_iter()
                .any(|t| can_attack(state, *c, player, t))
        });
        PromptView::new("Choose an elemental ring, a province and attackers")
            .with_rings(rings)
            .with_cards(attackers)
            .with_button("Pass Conflict")
    }

    fn waiting_prompt(&self) -> PromptView {
        PromptView::waiting("opponent to declare a conflict")
    }

    fn menu_command(&mut self, game: &mut Game, _player: PlayerId, arg: &MenuArg) -> bool {
        if self.complete {
            return false;
        }
        match arg {
            MenuArg::Pass => {
                self.pass(game);
                true
            }
            MenuArg::DeclareConflict {
                ring,
                conflict_type,
                province,
                attackers,
            } => self.declare(
                game,
                Declaration {
                    ring: *ring,
                    conflict_type: *conflict_type,
                    province: *province,
                    attackers: attackers.clone(),
                },
            ),
            _ => false,
        }
    }

    fn name(&self) -> &'static str {
        "DeclareConflictPrompt"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardDefinition, CardId};
    use crate::core::GameConfig;
    use crate::effects::EffectId;
    use crate::zones::Location;

    struct Table {
        state: GameState,
        attacker: EntityId,
        provinces: Vec<EntityId>,
    }

    fn table() -> Table {
        let mut state = GameState::new(&GameConfig::default());
        let samurai = CardDefinition::character(CardId::new(1), "Hida Kisada", 6, 6, 3);
        let province = CardDefinition::province(CardId::new(2), "Manicured Garden", 4);
        let attacker = state.create_card(&samurai, PlayerId::new(0), Location::PlayArea);
        let provinces = (0..=4)
            .map(|slot| state.create_card(&province, PlayerId::new(1), Location::Province(slot)))
            .collect();
        Table {
            state,
            attacker,
            provinces,
        }
    }

    fn declaration(attacker: EntityId, province: u8) -> Declaration {
        Declaration {
            ring: Element::Air,
            conflict_type: ConflictType::Military,
            province,
            attackers: vec![attacker],
        }
    }

    #[test]
    fn test_valid_declaration() {
        let t = table();
        assert_eq!(validate_declaration(&t.state, PlayerId::new(0), &declaration(t.attacker, 2)), Ok(()));
    }

    #[test]
    fn test_stronghold_needs_three_broken_provinces() {
        let mut t = table();
        assert_eq!(
            validate_declaration(&t.state, PlayerId::new(0), &declaration(t.attacker, 0)),
            Err(DeclarationError::InvalidProvince(0))
        );
        for id in &t.provinces[1..4] {
            t.state.card_mut(*id).unwrap().broken = true;
        }
        assert_eq!(attackable_provinces(&t.state, PlayerId::new(1)), vec![0, 4]);
        assert_eq!(validate_declaration(&t.state, PlayerId::new(0), &declaration(t.attacker, 0)), Ok(()));
    }

    #[test]
    fn test_rejections() {
        let mut t = table();
        let player = PlayerId::new(0);

        let mut twice = declaration(t.attacker, 1);
        twice.attackers.push(t.attacker);
        assert_eq!(
            validate_declaration(&t.state, player, &twice),
            Err(DeclarationError::IllegalAttacker(t.attacker))
        );

        t.state.ring_mut(Element::Air).claimed_by = Some(PlayerId::new(1));
        assert_eq!(
            validate_declaration(&t.state, player, &declaration(t.attacker, 1)),
            Err(DeclarationError::RingUnavailable(Element::Air))
        );
        t.state.ring_mut(Element::Air).claimed_by = None;

        t.state
            .card_mut(t.attacker)
            .unwrap()
            .add_modifier(EffectId::new(1), StaticModifier::FateCostToAttack(9));
        assert_eq!(
            validate_declaration(&t.state, player, &declaration(t.attacker, 1)),
            Err(DeclarationError::NotEnoughFate {
                required: 9,
                available: 7
            })
        );

        t.state.player_mut(player).military_opportunities = 0;
        assert_eq!(
            validate_declaration(&t.state, player, &declaration(t.attacker, 1)),
            Err(DeclarationError::NoOpportunity(ConflictType::Military))
        );
    }

    #[test]
    fn test_cannot_declare_conflicts() {
        let mut t = table();
        let player = PlayerId::new(0);
        t.state
            .player_mut(player)
            .modifiers
            .push((EffectId::new(4), StaticModifier::CannotDeclareConflicts));
        assert_eq!(
            validate_declaration(&t.state, player, &declaration(t.attacker, 1)),
            Err(DeclarationError::CannotDeclare)
        );
    }
}
