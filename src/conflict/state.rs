//! The conflict record.

use serde::{Deserialize, Serialize};

use crate::core::{EntityId, GameState, PlayerId};
use crate::effects::StaticModifier;
use crate::rings::{ConflictType, Element};

/// One conflict, from declaration to completion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub attacking_player: PlayerId,
    pub defending_player: PlayerId,
    pub conflict_type: ConflictType,
    pub ring: Option<Element>,

    /// The attacked province card and its slot.
    pub province: Option<EntityId>,
    pub province_slot: Option<u8>,

    pub attackers: Vec<EntityId>,
    pub defenders: Vec<EntityId>,
    pub attacker_skill: i32,
    pub defender_skill: i32,

    pub winner: Option<PlayerId>,
    pub loser: Option<PlayerId>,
    pub conflict_unopposed: bool,

    /// The attacker declined to declare.
    pub conflict_passed: bool,
    pub declared: bool,

    /// Cards played while this conflict was in progress.
    pub cards_played: Vec<EntityId>,

    /// Covert assignments: (attacker, bypassed defender).
    pub covert_targets: Vec<(EntityId, EntityId)>,
}

impl Conflict {
    #[must_use]
    pub fn new(attacking_player: PlayerId) -> Self {
        Self {
            attacking_player,
            defending_player: attacking_player.opponent(),
            conflict_type: ConflictType::Military,
            ring: None,
            province: None,
            province_slot: None,
            attackers: Vec::new(),
            defenders: Vec::new(),
            attacker_skill: 0,
            defender_skill: 0,
            winner: None,
            loser: None,
            conflict_unopposed: false,
            conflict_passed: false,
            declared: false,
            cards_played: Vec::new(),
            covert_targets: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_attacking(&self, card: EntityId) -> bool {
        self.attackers.contains(&card)
    }

    #[must_use]
    pub fn is_defending(&self, card: EntityId) -> bool {
        self.defenders.contains(&card)
    }

    #[must_use]
    pub fn is_participating(&self, card: EntityId) -> bool {
        self.is_attacking(card) || self.is_defending(card)
    }

    /// Every participant, attackers first.
    #[must_use]
    pub fn participants(&self) -> Vec<EntityId> {
        self.attackers.iter().chain(&self.defenders).copied().collect()
    }

    pub fn remove_participant(&mut self, card: EntityId) {
        self.attackers.retain(|c| *c != card);
        self.defenders.retain(|c| *c != card);
        self.covert_targets.retain(|(a, d)| *a != card && *d != card);
    }

    /// Total skill of each side, counting ready participants only.
    #[must_use]
    pub fn calculate_skill(&self, state: &GameState) -> (i32, i32) {
        let side = |cards: &[EntityId]| -> i32 {
            cards
                .iter()
                .filter_map(|id| state.card(*id))
                .filter(|c| !c.bowed)
                .filter_map(|c| c.skill(self.conflict_type))
                .sum()
        };
        (side(&self.attackers), side(&self.defenders))
    }

    /// Compare skills. No one wins a conflict at 0 to 0; otherwise the
    /// attacker wins ties.
    pub fn determine_winner(&mut self) {
        let (winner, loser) = if self.attacker_skill == 0 && self.defender_skill == 0 {
            (None, None)
        } else if self.attacker_skill >= self.defender_skill {
            (Some(self.attacking_player), Some(self.defending_player))
        } else {
            (Some(self.defending_player), Some(self.attacking_player))
        };
        self.winner = winner;
        self.loser = loser;
    }

    /// Recompute both skills and the winner from the current state.
    pub(crate) fn refresh(state: &mut GameState) -> Option<PlayerId> {
        let (attacker, defender) = state.current_conflict.as_ref()?.calculate_skill(state);
        let conflict = state.current_conflict.as_mut()?;
        conflict.attacker_skill = attacker;
        conflict.defender_skill = defender;
        conflict.determine_winner();
        conflict.winner
    }

    #[must_use]
    pub fn attacker_won(&self) -> bool {
        self.winner.is_some() && self.winner == Some(self.attacking_player)
    }
}

/// Can `card` be declared as an attacker by `player` in a conflict of this type?
#[must_use]
pub fn can_attack(state: &GameState, card: EntityId, player: PlayerId, conflict_type: ConflictType) -> bool {
    state.card(card).is_some_and(|c| {
        c.is_in_play()
            && c.is_character()
            && c.controller == player
            && !c.bowed
            && c.skill(conflict_type).is_some()
            && !c.has_modifier(|m| matches!(m, StaticModifier::CannotParticipateAsAttacker))
    })
}

/// Can `card` be declared as a defender by `player`?
#[must_use]
pub fn can_defend(state: &GameState, card: EntityId, player: PlayerId, conflict_type: ConflictType) -> bool {
    state.card(card).is_some_and(|c| {
        c.is_in_play()
            && c.is_character()
            && c.controller == player
            && !c.bowed
            && !c.covert_bypassed
            && c.skill(conflict_type).is_some()
            && !c.has_modifier(|m| matches!(m, StaticModifier::CannotParticipateAsDefender))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardDefinition, CardId};
    use crate::core::GameConfig;
    use crate::zones::Location;

    fn setup() -> (GameState, Vec<EntityId>) {
        let mut state = GameState::new(&GameConfig::default());
        let attacker = CardDefinition::character(CardId::new(1), "Akodo Toturi", 5, 4, 2);
        let defender = CardDefinition::character(CardId::new(2), "Doji Whisperer", 3, 0, 3).with_military_dash();
        let ids = vec![
            state.create_card(&attacker, PlayerId::new(0), Location::PlayArea),
            state.create_card(&defender, PlayerId::new(1), Location::PlayArea),
        ];
        (state, ids)
    }

    #[test]
    fn test_skill_counts_ready_participants() {
        let (mut state, ids) = setup();
        let mut conflict = Conflict::new(PlayerId::new(0));
        conflict.attackers.push(ids[0]);
        conflict.defenders.push(ids[1]);
        assert_eq!(conflict.calculate_skill(&state), (4, 0));

        conflict.conflict_type = ConflictType::Political;
        assert_eq!(conflict.calculate_skill(&state), (2, 3));

        state.card_mut(ids[1]).unwrap().bowed = true;
        assert_eq!(conflict.calculate_skill(&state), (2, 0));
    }

    #[test]
    fn test_winner_rules() {
        let mut conflict = Conflict::new(PlayerId::new(1));
        conflict.determine_winner();
        assert_eq!(conflict.winner, None);
        assert_eq!(conflict.loser, None);

        conflict.attacker_skill = 2;
        conflict.defender_skill = 2;
        conflict.determine_winner();
        assert_eq!(conflict.winner, Some(PlayerId::new(1)));
        assert!(conflict.attacker_won());

        conflict.defender_skill = 3;
        conflict.determine_winner();
        assert_eq!(conflict.winner, Some(PlayerId::new(0)));
        assert_eq!(conflict.loser, Some(PlayerId::new(1)));
    }

    #[test]
    fn test_remove_participant() {
        let mut conflict = Conflict::new(PlayerId::new(0));
        conflict.attackers = vec![EntityId(5), EntityId(6)];
        conflict.defenders = vec![EntityId(7)];
        conflict.covert_targets = vec![(EntityId(6), EntityId(7))];

        conflict.remove_participant(EntityId(6));

        assert_eq!(conflict.attackers, vec![EntityId(5)]);
        assert!(conflict.covert_targets.is_empty());
        assert!(!conflict.is_participating(EntityId(6)));
        assert!(conflict.is_defending(EntityId(7)));
    }

    #[test]
    fn test_participation_checks() {
        let (mut state, ids) = setup();
        assert!(can_attack(&state, ids[0], PlayerId::new(0), ConflictType::Military));
        assert!(!can_attack(&state, ids[0], PlayerId::new(1), ConflictType::Military));
        assert!(!can_defend(&state, ids[1], PlayerId::new(1), ConflictType::Military));
        assert!(can_defend(&state, ids[1], PlayerId::new(1), ConflictType::Political));

        state.card_mut(ids[1]).unwrap().covert_bypassed = true;
        assert!(!can_defend(&state, ids[1], PlayerId::new(1), ConflictType::Political));
    }
}
