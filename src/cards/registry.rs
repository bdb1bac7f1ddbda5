//! Card registry: definitions and their native abilities.
//!
//! The registry is shared by every game created from it. Besides the
//! printed definitions it holds the catalog of abilities implemented in
//! Rust; abilities supplied by a scripting host are merged in by the game
//! when a card is first looked at.

use rustc_hash::FxHashMap;
use std::rc::Rc;

use super::definition::{CardDefinition, CardId, CardType};
use crate::abilities::{AbilityId, CardAbility};

/// Registry of card definitions and native abilities.
///
/// ```
/// use l5r_engine::cards::{CardDefinition, CardId, CardRegistry};
///
/// let mut registry = CardRegistry::new();
/// registry.register(CardDefinition::character(CardId::new(1), "Hida Guardian", 2, 3, 1));
///
/// assert_eq!(registry.get(CardId::new(1)).unwrap().name, "Hida Guardian");
/// assert!(registry.abilities(CardId::new(1)).is_empty());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CardRegistry {
    cards: FxHashMap<CardId, CardDefinition>,
    abilities: FxHashMap<CardId, Vec<Rc<CardAbility>>>,
}

impl CardRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a card definition.
    ///
    /// Panics if a card with the same ID already exists.
    pub fn register(&mut self, card: CardDefinition) {
        if self.cards.contains_key(&card.id) {
            panic!("Card with ID {:?} already registered", card.id);
        }
        self.cards.insert(card.id, card);
    }

    /// Attach a native ability to a card. Returns the ability's ID.
    pub fn register_ability(&mut self, card: CardId, mut ability: CardAbility) -> AbilityId {
        let list = self.abilities.entry(card).or_default();
        let id = AbilityId::new(list.len() as u16);
        ability.id = id;
        list.push(Rc::new(ability));
        id
    }

    #[must_use]
    pub fn get(&self, id: CardId) -> Option<&CardDefinition> {
        self.cards.get(&id)
    }

    /// Native abilities of a card, in registration order.
    #[must_use]
    pub fn abilities(&self, id: CardId) -> &[Rc<CardAbility>] {
        self.abilities.get(&id).map_or(&[], |v| v.as_slice())
    }

    #[must_use]
    pub fn contains(&self, id: CardId) -> bool {
        self.cards.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn find_by_type(&self, card_type: CardType) -> impl Iterator<Item = &CardDefinition> {
        self.cards.values().filter(move |c| c.card_type == card_type)
    }
}
