//! Zones: where cards are.
//!
//! Each player owns a hand, two decks, two discard piles, five province
//! slots and a play area. `ZoneManager` tracks card positions; the
//! canonical way to move a card during a game is `Game::move_card`, which
//! also handles entering and leaving play.

pub mod location;
pub mod manager;

pub use location::{Location, ZoneId};
pub use manager::{ZoneManager, ZonePosition};
