//! Card locations.
//!
//! L5R has a fixed set of zones per player. A `ZoneId` pairs the owning
//! player with a `Location`; every card in the game is in exactly one zone.

use serde::{Deserialize, Serialize};

use crate::core::PlayerId;

/// Where a card is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    Hand,
    ConflictDeck,
    DynastyDeck,
    ConflictDiscard,
    DynastyDiscard,
    /// Province slot. Slot 0 is the stronghold province.
    Province(u8),
    PlayArea,
    /// Event cards sit here while their ability resolves.
    BeingPlayed,
    RemovedFromGame,
}

impl Location {
    pub const STRONGHOLD_PROVINCE: Location = Location::Province(0);

    /// Cards here are "in play": their abilities are registered and they
    /// can be targeted by ongoing effects.
    #[must_use]
    pub const fn is_in_play(self) -> bool {
        matches!(self, Location::PlayArea)
    }

    #[must_use]
    pub const fn is_province(self) -> bool {
        matches!(self, Location::Province(_))
    }

    /// Decks keep their order; everything else is a set.
    #[must_use]
    pub const fn is_ordered(self) -> bool {
        matches!(
            self,
            Location::ConflictDeck | Location::DynastyDeck | Location::ConflictDiscard | Location::DynastyDiscard
        )
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Hand => f.write_str("hand"),
            Location::ConflictDeck => f.write_str("conflict deck"),
            Location::DynastyDeck => f.write_str("dynasty deck"),
            Location::ConflictDiscard => f.write_str("conflict discard pile"),
            Location::DynastyDiscard => f.write_str("dynasty discard pile"),
            Location::Province(0) => f.write_str("stronghold province"),
            Location::Province(n) => write!(f, "province {n}"),
            Location::PlayArea => f.write_str("play area"),
            Location::BeingPlayed => f.write_str("being played"),
            Location::RemovedFromGame => f.write_str("removed from game"),
        }
    }
}

/// A player's zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneId {
    pub player: PlayerId,
    pub location: Location,
}

impl ZoneId {
    #[must_use]
    pub const fn new(player: PlayerId, location: Location) -> Self {
        Self { player, location }
    }
}

impl std::fmt::Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}'s {}", self.player, self.location)
    }
}
