//! Card instances - runtime card state.
//!
//! A `CardInstance` is one physical card in a game. It copies the printed
//! numbers it needs from its definition and tracks the state the rules
//! mutate: bowed/ready, fate placed on it, honor status, whether a
//! province is broken or face down, and the modifiers that active effects
//! currently apply to it.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::definition::{CardDefinition, CardId, CardType, Keyword};
use crate::core::{EntityId, PlayerId};
use crate::effects::{EffectId, StaticModifier};
use crate::rings::ConflictType;
use crate::zones::Location;

/// Personal honor of a character.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HonorStatus {
    #[default]
    Ordinary,
    Honored,
    Dishonored,
}

/// A card in a game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardInstance {
    pub entity_id: EntityId,
    pub card_id: CardId,
    pub card_type: CardType,

    pub owner: PlayerId,
    pub controller: PlayerId,
    pub location: Location,

    // === Printed values ===
    pub printed_cost: Option<i32>,
    pub printed_military: Option<i32>,
    pub printed_political: Option<i32>,
    pub printed_glory: i32,
    pub printed_strength: i32,
    pub printed_keywords: SmallVec<[Keyword; 2]>,

    // === Mutable state ===
    pub bowed: bool,
    pub fate: i32,
    pub honor_status: HonorStatus,
    pub face_down: bool,
    pub broken: bool,

    /// Set when a covert attacker bypasses this character for the current
    /// conflict.
    pub covert_bypassed: bool,

    /// Modifiers applied by active effects, tagged with the effect that
    /// applied them.
    #[serde(default)]
    pub modifiers: SmallVec<[(EffectId, StaticModifier); 4]>,
}

impl CardInstance {
    #[must_use]
    pub fn new(entity_id: EntityId, definition: &CardDefinition, owner: PlayerId, location: Location) -> Self {
        Self {
            entity_id,
            card_id: definition.id,
            card_type: definition.card_type,
            owner,
            controller: owner,
            location,
            printed_cost: definition.cost,
            printed_military: definition.military,
            printed_political: definition.political,
            printed_glory: definition.glory,
            printed_strength: definition.strength,
            printed_keywords: definition.keywords.clone(),
            bowed: false,
            fate: 0,
            honor_status: HonorStatus::Ordinary,
            face_down: false,
            broken: false,
            covert_bypassed: false,
            modifiers: SmallVec::new(),
        }
    }

    #[must_use]
    pub fn is_character(&self) -> bool {
        self.card_type == CardType::Character
    }

    #[must_use]
    pub fn is_in_play(&self) -> bool {
        self.location.is_in_play()
    }

    // === Modifiers ===

    pub fn add_modifier(&mut self, effect: EffectId, modifier: StaticModifier) {
        self.modifiers.push((effect, modifier));
    }

    /// Remove every modifier applied by `effect`. Returns how many were removed.
    pub fn remove_modifiers(&mut self, effect: EffectId) -> usize {
        let before = self.modifiers.len();
        self.modifiers.retain(|(id, _)| *id != effect);
        before - self.modifiers.len()
    }

    pub fn has_modifier(&self, check: impl Fn(&StaticModifier) -> bool) -> bool {
        self.modifiers.iter().any(|(_, m)| check(m))
    }

    fn modifier_sum(&self, value: impl Fn(&StaticModifier) -> i32) -> i32 {
        self.modifiers.iter().map(|(_, m)| value(m)).sum()
    }

    // === Derived values ===

    #[must_use]
    pub fn glory(&self) -> i32 {
        let bonus = self.modifier_sum(|m| match m {
            StaticModifier::ModifyGlory(n) => *n,
            _ => 0,
        });
        (self.printed_glory + bonus).max(0)
    }

    /// Current skill for a conflict type. `None` when the printed skill is a dash.
    #[must_use]
    pub fn skill(&self, conflict_type: ConflictType) -> Option<i32> {
        let printed = match conflict_type {
            ConflictType::Military => self.printed_military?,
            ConflictType::Political => self.printed_political?,
        };
        let modifiers = self.modifier_sum(|m| match (m, conflict_type) {
            (StaticModifier::ModifyMilitary(n), ConflictType::Military) => *n,
            (StaticModifier::ModifyPolitical(n), ConflictType::Political) => *n,
            (StaticModifier::ModifyBothSkills(n), _) => *n,
            _ => 0,
        });
        let status = match self.honor_status {
            HonorStatus::Ordinary => 0,
            HonorStatus::Honored => self.glory(),
            HonorStatus::Dishonored => -self.glory(),
        };
        Some((printed + modifiers + status).max(0))
    }

    #[must_use]
    pub fn military_skill(&self) -> Option<i32> {
        self.skill(ConflictType::Military)
    }

    #[must_use]
    pub fn political_skill(&self) -> Option<i32> {
        self.skill(ConflictType::Political)
    }

    /// Province strength including modifiers.
    #[must_use]
    pub fn strength(&self) -> i32 {
        let bonus = self.modifier_sum(|m| match m {
            StaticModifier::ModifyProvinceStrength(n) => *n,
            _ => 0,
        });
        (self.printed_strength + bonus).max(0)
    }

    /// Printed keywords plus keywords granted by effects.
    #[must_use]
    pub fn has_keyword(&self, keyword: Keyword) -> bool {
        self.printed_keywords.contains(&keyword)
            || self.has_modifier(|m| *m == StaticModifier::AddKeyword(keyword))
    }

    /// Extra fate the controller must pay to declare this character as an attacker.
    #[must_use]
    pub fn fate_cost_to_attack(&self) -> i32 {
        self.modifier_sum(|m| match m {
            StaticModifier::FateCostToAttack(n) => *n,
            _ => 0,
        })
    }

    /// Clear in-play state when the card leaves play.
    pub fn reset_play_state(&mut self) {
        self.bowed = false;
        self.fate = 0;
        self.honor_status = HonorStatus::Ordinary;
        self.covert_bypassed = false;
        self.modifiers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samurai() -> CardInstance {
        let def = CardDefinition::character(CardId::new(1), "Akodo Toturi", 5, 4, 3).with_glory(2);
        CardInstance::new(EntityId(10), &def, PlayerId::new(0), Location::PlayArea)
    }

    #[test]
    fn test_new_copies_printed_values() {
        let card = samurai();
        assert_eq!(card.printed_cost, Some(5));
        assert_eq!(card.military_skill(), Some(4));
        assert_eq!(card.political_skill(), Some(3));
        assert_eq!(card.controller, PlayerId::new(0));
        assert!(card.is_in_play());
    }

    #[test]
    fn test_honor_status_adds_glory() {
        let mut card = samurai();
        card.honor_status = HonorStatus::Honored;
        assert_eq!(card.military_skill(), Some(6));

        card.honor_status = HonorStatus::Dishonored;
        assert_eq!(card.military_skill(), Some(2));
    }

    #[test]
    fn test_modifiers() {
        let mut card = samurai();
        card.add_modifier(EffectId::new(1), StaticModifier::ModifyMilitary(2));
        card.add_modifier(EffectId::new(2), StaticModifier::ModifyBothSkills(-1));
        assert_eq!(card.military_skill(), Some(5));
        assert_eq!(card.political_skill(), Some(2));

        assert_eq!(card.remove_modifiers(EffectId::new(1)), 1);
        assert_eq!(card.military_skill(), Some(3));
        assert_eq!(card.remove_modifiers(EffectId::new(1)), 0);
    }

    #[test]
    fn test_skill_floor_and_dash() {
        let def = CardDefinition::character(CardId::new(2), "Courtier", 1, 0, 2).with_military_dash();
        let mut card = CardInstance::new(EntityId(11), &def, PlayerId::new(1), Location::PlayArea);
        assert_eq!(card.military_skill(), None);

        card.add_modifier(EffectId::new(3), StaticModifier::ModifyPolitical(-5));
        assert_eq!(card.political_skill(), Some(0));
    }

    #[test]
    fn test_granted_keyword() {
        let mut card = samurai();
        assert!(!card.has_keyword(Keyword::Covert));
        card.add_modifier(EffectId::new(4), StaticModifier::AddKeyword(Keyword::Covert));
        assert!(card.has_keyword(Keyword::Covert));
    }

    #[test]
    fn test_reset_play_state() {
        let mut card = samurai();
        card.bowed = true;
        card.fate = 2;
        card.honor_status = HonorStatus::Honored;
        card.add_modifier(EffectId::new(1), StaticModifier::DoesNotBow);

        card.reset_play_state();

        assert!(!card.bowed);
        assert_eq!(card.fate, 0);
        assert_eq!(card.honor_status, HonorStatus::Ordinary);
        assert!(card.modifiers.is_empty());
    }
}
