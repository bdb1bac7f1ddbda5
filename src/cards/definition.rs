//! Card definitions - printed card data.
//!
//! `CardDefinition` holds what is printed on a card: type, cost, skills,
//! glory, province strength, keywords and traits. Runtime state (bowed,
//! fate, honor status, modifiers) lives in `CardInstance`.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Identifier of a printed card (shared by every copy in every deck).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardId(pub u32);

impl CardId {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Card({})", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardType {
    Character,
    Attachment,
    Event,
    Holding,
    Province,
    Stronghold,
}

/// Which deck a card belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeckSide {
    Dynasty,
    Conflict,
    /// Provinces and strongholds start on the table.
    Table,
}

/// Printed keywords the engine understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Keyword {
    /// Bypasses one defending character when declared as an attacker.
    Covert,
    /// Controller gains 1 fate when this character leaves play.
    Courtesy,
    /// Controller draws 1 card when this character leaves play.
    Sincerity,
}

/// Static card definition.
///
/// ```
/// use l5r_engine::cards::{CardDefinition, CardId, CardType, Keyword};
///
/// let shinobi = CardDefinition::character(CardId::new(3), "Shinobi Scout", 2, 1, 1)
///     .with_glory(1)
///     .with_keyword(Keyword::Covert);
///
/// assert_eq!(shinobi.card_type, CardType::Character);
/// assert!(shinobi.has_keyword(Keyword::Covert));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardDefinition {
    pub id: CardId,
    pub name: String,
    pub card_type: CardType,
    pub side: DeckSide,

    /// Fate cost. `None` for provinces and strongholds.
    pub cost: Option<i32>,

    /// `None` is a printed dash: the character cannot take part in that
    /// conflict type.
    pub military: Option<i32>,
    pub political: Option<i32>,

    pub glory: i32,

    /// Province strength (provinces) or strength bonus (strongholds).
    pub strength: i32,

    pub keywords: SmallVec<[Keyword; 2]>,
    pub traits: Vec<String>,
}

impl CardDefinition {
    #[must_use]
    pub fn new(id: CardId, name: impl Into<String>, card_type: CardType, side: DeckSide) -> Self {
        Self {
            id,
            name: name.into(),
            card_type,
            side,
            cost: None,
            military: None,
            political: None,
            glory: 0,
            strength: 0,
            keywords: SmallVec::new(),
            traits: Vec::new(),
        }
    }

    /// A dynasty character with the given cost and skills.
    #[must_use]
    pub fn character(id: CardId, name: impl Into<String>, cost: i32, military: i32, political: i32) -> Self {
        let mut def = Self::new(id, name, CardType::Character, DeckSide::Dynasty);
        def.cost = Some(cost);
        def.military = Some(military);
        def.political = Some(political);
        def
    }

    /// A conflict-deck event card.
    #[must_use]
    pub fn event(id: CardId, name: impl Into<String>, cost: i32) -> Self {
        let mut def = Self::new(id, name, CardType::Event, DeckSide::Conflict);
        def.cost = Some(cost);
        def
    }

    #[must_use]
    pub fn province(id: CardId, name: impl Into<String>, strength: i32) -> Self {
        let mut def = Self::new(id, name, CardType::Province, DeckSide::Table);
        def.strength = strength;
        def
    }

    #[must_use]
    pub fn with_side(mut self, side: DeckSide) -> Self {
        self.side = side;
        self
    }

    #[must_use]
    pub fn with_cost(mut self, cost: i32) -> Self {
        self.cost = Some(cost);
        self
    }

    /// Printed dash in military skill.
    #[must_use]
    pub fn with_military_dash(mut self) -> Self {
        self.military = None;
        self
    }

    /// Printed dash in political skill.
    #[must_use]
    pub fn with_political_dash(mut self) -> Self {
        self.political = None;
        self
    }

    #[must_use]
    pub fn with_glory(mut self, glory: i32) -> Self {
        self.glory = glory;
        self
    }

    #[must_use]
    pub fn with_strength(mut self, strength: i32) -> Self {
        self.strength = strength;
        self
    }

    #[must_use]
    pub fn with_keyword(mut self, keyword: Keyword) -> Self {
        if !self.keywords.contains(&keyword) {
            self.keywords.push(keyword);
        }
        self
    }

    #[must_use]
    pub fn with_trait(mut self, name: impl Into<String>) -> Self {
        self.traits.push(name.into());
        self
    }

    #[must_use]
    pub fn has_keyword(&self, keyword: Keyword) -> bool {
        self.keywords.contains(&keyword)
    }

    #[must_use]
    pub fn has_trait(&self, name: &str) -> bool {
        self.traits.iter().any(|t| t.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_id() {
        let id = CardId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(format!("{}", id), "Card(42)");
    }

    #[test]
    fn test_character_builder() {
        let card = CardDefinition::character(CardId::new(1), "Doji Whisperer", 3, 0, 3)
            .with_military_dash()
            .with_glory(2)
            .with_keyword(Keyword::Courtesy)
            .with_keyword(Keyword::Courtesy)
            .with_trait("Courtier");

        assert_eq!(card.military, None);
        assert_eq!(card.political, Some(3));
        assert_eq!(card.keywords.len(), 1);
        assert!(card.has_trait("courtier"));
        assert!(!card.has_trait("Bushi"));
    }

    #[test]
    fn test_province() {
        let card = CardDefinition::province(CardId::new(9), "Shameful Display", 3);
        assert_eq!(card.card_type, CardType::Province);
        assert_eq!(card.side, DeckSide::Table);
        assert_eq!(card.strength, 3);
        assert_eq!(card.cost, None);
    }

    #[test]
    fn test_serialization() {
        let card = CardDefinition::event(CardId::new(4), "Banzai!", 0);
        let json = serde_json::to_string(&card).unwrap();
        let back: CardDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(card, back);
    }
}
