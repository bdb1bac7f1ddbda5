//! Zone manager for card locations and movement.
//!
//! The `ZoneManager` records which zone every card is in and keeps each
//! zone's cards in order: decks are drawn from the top (the end of the
//! list), and the play area keeps cards in the order they entered play so
//! iteration is deterministic.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::location::ZoneId;
use crate::core::{EntityId, GameRng};

/// Position for inserting a card into a zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZonePosition {
    /// Top of the zone (drawn first).
    Top,
    Bottom,
}

/// Tracks card locations.
///
/// ```
/// use l5r_engine::core::{EntityId, PlayerId};
/// use l5r_engine::zones::{Location, ZoneId, ZoneManager, ZonePosition};
///
/// let mut zones = ZoneManager::new();
/// let deck = ZoneId::new(PlayerId::new(0), Location::ConflictDeck);
///
/// zones.add_to_zone(EntityId(10), deck, ZonePosition::Top);
/// zones.add_to_zone(EntityId(11), deck, ZonePosition::Top);
///
/// assert_eq!(zones.top_card(deck), Some(EntityId(11)));
/// ```
#[derive(Clone, Debug, Default)]
pub struct ZoneManager {
    locations: FxHashMap<EntityId, ZoneId>,
    /// Cards per zone, bottom first.
    zone_order: FxHashMap<ZoneId, Vec<EntityId>>,
}

impl ZoneManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a card that is not tracked yet.
    ///
    /// Panics if the card is already in a zone.
    pub fn add_to_zone(&mut self, card: EntityId, zone: ZoneId, position: ZonePosition) {
        if self.locations.contains_key(&card) {
            panic!("Entity {:?} already exists in zone manager", card);
        }
        self.locations.insert(card, zone);
        Self::insert(self.zone_order.entry(zone).or_default(), card, position);
    }

    /// Move a card between zones. Returns the zone it left.
    pub fn move_to_zone(&mut self, card: EntityId, to: ZoneId, position: ZonePosition) -> Option<ZoneId> {
        let from = self.locations.get(&card).copied()?;
        if from == to {
            return Some(from);
        }

        if let Some(order) = self.zone_order.get_mut(&from) {
            order.retain(|&c| c != card);
        }
        self.locations.insert(card, to);
        Self::insert(self.zone_order.entry(to).or_default(), card, position);

        Some(from)
    }

    fn insert(order: &mut Vec<EntityId>, card: EntityId, position: ZonePosition) {
        match position {
            ZonePosition::Top => order.push(card),
            ZonePosition::Bottom => order.insert(0, card),
        }
    }

    #[must_use]
    pub fn get_zone(&self, card: EntityId) -> Option<ZoneId> {
        self.locations.get(&card).copied()
    }

    /// Cards in a zone, bottom first.
    #[must_use]
    pub fn cards_in_zone(&self, zone: ZoneId) -> &[EntityId] {
        self.zone_order.get(&zone).map_or(&[], |v| v.as_slice())
    }

    #[must_use]
    pub fn zone_size(&self, zone: ZoneId) -> usize {
        self.cards_in_zone(zone).len()
    }

    #[must_use]
    pub fn top_card(&self, zone: ZoneId) -> Option<EntityId> {
        self.zone_order.get(&zone)?.last().copied()
    }

    /// Shuffle a zone in place.
    pub fn shuffle_zone(&mut self, zone: ZoneId, rng: &mut GameRng) {
        if let Some(order) = self.zone_order.get_mut(&zone) {
            rng.shuffle(order);
        }
    }

    #[must_use]
    pub fn contains(&self, card: EntityId) -> bool {
        self.locations.contains_key(&card)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PlayerId;
    use crate::zones::Location;

    fn zone(location: Location) -> ZoneId {
        ZoneId::new(PlayerId::new(0), location)
    }

    #[test]
    fn test_add_and_get() {
        let mut zones = ZoneManager::new();
        zones.add_to_zone(EntityId(10), zone(Location::Hand), ZonePosition::Top);

        assert_eq!(zones.get_zone(EntityId(10)), Some(zone(Location::Hand)));
        assert_eq!(zones.get_zone(EntityId(99)), None);
        assert!(zones.contains(EntityId(10)));
    }

    #[test]
    fn test_ordering() {
        let mut zones = ZoneManager::new();
        let deck = zone(Location::DynastyDeck);

        zones.add_to_zone(EntityId(10), deck, ZonePosition::Top);
        zones.add_to_zone(EntityId(11), deck, ZonePosition::Bottom);
        zones.add_to_zone(EntityId(12), deck, ZonePosition::Top);

        assert_eq!(zones.cards_in_zone(deck), &[EntityId(11), EntityId(10), EntityId(12)]);
        assert_eq!(zones.top_card(deck), Some(EntityId(12)));
    }

    #[test]
    fn test_move_between_zones() {
        let mut zones = ZoneManager::new();
        zones.add_to_zone(EntityId(10), zone(Location::Hand), ZonePosition::Top);

        let from = zones.move_to_zone(EntityId(10), zone(Location::PlayArea), ZonePosition::Top);

        assert_eq!(from, Some(zone(Location::Hand)));
        assert_eq!(zones.zone_size(zone(Location::Hand)), 0);
        assert_eq!(zones.cards_in_zone(zone(Location::PlayArea)), &[EntityId(10)]);
        assert_eq!(zones.move_to_zone(EntityId(99), zone(Location::Hand), ZonePosition::Top), None);
    }

    #[test]
    fn test_shuffle() {
        let mut zones = ZoneManager::new();
        let deck = zone(Location::ConflictDeck);
        for i in 0..20 {
            zones.add_to_zone(EntityId(i), deck, ZonePosition::Top);
        }
        let before = zones.cards_in_zone(deck).to_vec();

        zones.shuffle_zone(deck, &mut GameRng::new(42));

        assert_eq!(zones.zone_size(deck), 20);
        assert_ne!(zones.cards_in_zone(deck), before.as_slice());
    }

    #[test]
    #[should_panic(expected = "Entity")]
    fn test_duplicate_entity_panics() {
        let mut zones = ZoneManager::new();
        zones.add_to_zone(EntityId(10), zone(Location::Hand), ZonePosition::Top);
        zones.add_to_zone(EntityId(10), zone(Location::Hand), ZonePosition::Top);
    }
}
