//! Game state.
//!
//! `GameState` is the plain data half of a game: players, cards, zones,
//! rings and the current conflict. It has no behavior beyond bookkeeping;
//! the rules live in `Game` and the pipeline steps that mutate it.
//!
//! Card instances are kept in an `im::HashMap`, so `snapshot_cards` is
//! O(1). Ability resolution captures a snapshot when it starts so effects
//! can compare "as initiated" values with current ones.

use im::HashMap as ImHashMap;

use super::config::{GameConfig, Phase};
use super::entity::EntityId;
use super::player::{PlayerId, PlayerMap, PlayerState};
use super::rng::GameRng;
use crate::cards::{CardDefinition, CardInstance};
use crate::conflict::Conflict;
use crate::rings::{Element, Ring};
use crate::zones::{Location, ZoneId, ZoneManager, ZonePosition};

/// Complete rules state of one game.
#[derive(Clone, Debug)]
pub struct GameState {
    player_count: usize,

    // === Progression ===
    pub phase: Phase,
    pub round: u32,
    pub first_player: PlayerId,
    pub winner: Option<PlayerId>,

    // === Players and cards ===
    pub players: PlayerMap<PlayerState>,
    cards: ImHashMap<EntityId, CardInstance>,
    pub zones: ZoneManager,

    // === Table ===
    rings: Vec<Ring>,

    /// The conflict being resolved. At most one exists at a time.
    pub current_conflict: Option<Conflict>,

    /// Province slots emptied during the current ability.
    pub provinces_to_refill: Vec<(PlayerId, u8)>,

    shuffle_rng: GameRng,
    discard_rng: GameRng,

    next_entity_id: u32,
}

impl GameState {
    #[must_use]
    pub fn new(config: &GameConfig) -> Self {
        let rng = GameRng::new(config.seed);
        Self {
            player_count: config.player_count,
            phase: Phase::Setup,
            round: 1,
            first_player: PlayerId::new(0),
            winner: None,
            players: PlayerMap::new(config.player_count, |p| {
                PlayerState::new(config.player_name(p.index()), config.starting_honor, config.starting_fate)
            }),
            cards: ImHashMap::new(),
            zones: ZoneManager::new(),
            rings: Element::ALL.iter().map(|e| Ring::new(*e)).collect(),
            current_conflict: None,
            provinces_to_refill: Vec::new(),
            shuffle_rng: rng.for_context("shuffle"),
            discard_rng: rng.for_context("discard"),
            next_entity_id: EntityId::first_non_player(config.player_count),
        }
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.player_count
    }

    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> {
        PlayerId::all(self.player_count)
    }

    #[must_use]
    pub fn player(&self, player: PlayerId) -> &PlayerState {
        &self.players[player]
    }

    pub fn player_mut(&mut self, player: PlayerId) -> &mut PlayerState {
        &mut self.players[player]
    }

    // === Cards ===

    /// Create a card instance in a zone. Returns its entity ID.
    pub fn create_card(&mut self, definition: &CardDefinition, owner: PlayerId, location: Location) -> EntityId {
        let id = EntityId(self.next_entity_id);
        self.next_entity_id += 1;

        let mut instance = CardInstance::new(id, definition, owner, location);
        instance.face_down = location.is_province()
            || matches!(location, Location::ConflictDeck | Location::DynastyDeck);
        self.cards.insert(id, instance);
        self.zones.add_to_zone(id, ZoneId::new(owner, location), ZonePosition::Top);
        id
    }

    #[must_use]
    pub fn card(&self, id: EntityId) -> Option<&CardInstance> {
        self.cards.get(&id)
    }

    pub fn card_mut(&mut self, id: EntityId) -> Option<&mut CardInstance> {
        self.cards.get_mut(&id)
    }

    /// O(1) copy of the card table.
    #[must_use]
    pub fn snapshot_cards(&self) -> ImHashMap<EntityId, CardInstance> {
        self.cards.clone()
    }

    pub fn all_cards(&self) -> impl Iterator<Item = &CardInstance> {
        self.cards.values()
    }

    #[must_use]
    pub fn is_in_play(&self, id: EntityId) -> bool {
        self.card(id).is_some_and(CardInstance::is_in_play)
    }

    #[must_use]
    pub fn controller(&self, id: EntityId) -> Option<PlayerId> {
        self.card(id).map(|c| c.controller)
    }

    /// Cards in a player's zone, bottom first.
    #[must_use]
    pub fn cards_in(&self, player: PlayerId, location: Location) -> &[EntityId] {
        self.zones.cards_in_zone(ZoneId::new(player, location))
    }

    /// Every card in play, first player's cards first, each in play order.
    #[must_use]
    pub fn cards_in_play(&self) -> Vec<EntityId> {
        self.player_ids()
            .flat_map(|p| self.cards_in(p, Location::PlayArea).iter().copied())
            .collect()
    }

    /// Cards in play plus cards in provinces: everything a static effect
    /// can reach.
    #[must_use]
    pub fn cards_on_table(&self) -> Vec<EntityId> {
        let mut cards = self.cards_in_play();
        for player in self.player_ids() {
            for slot in 0..=4 {
                cards.extend_from_slice(self.cards_in(player, Location::Province(slot)));
            }
        }
        cards
    }

    /// Characters a player controls in play.
    #[must_use]
    pub fn characters_in_play(&self, player: PlayerId) -> Vec<EntityId> {
        self.cards_in(player, Location::PlayArea)
            .iter()
            .copied()
            .filter(|id| self.card(*id).is_some_and(|c| c.is_character() && c.controller == player))
            .collect()
    }

    /// The province card in a province slot (as opposed to the dynasty
    /// card placed on it).
    #[must_use]
    pub fn province_card(&self, player: PlayerId, slot: u8) -> Option<EntityId> {
        self.cards_in(player, Location::Province(slot))
            .iter()
            .copied()
            .find(|id| self.card(*id).is_some_and(|c| c.card_type == crate::cards::CardType::Province))
    }

    /// Low-level zone change. Rules code goes through `Game::move_card`.
    pub(crate) fn relocate(&mut self, id: EntityId, location: Location, position: ZonePosition) -> Option<Location> {
        let card = self.cards.get_mut(&id)?;
        let from = card.location;
        card.location = location;
        let owner = card.owner;
        self.zones.move_to_zone(id, ZoneId::new(owner, location), position);
        Some(from)
    }

    // === Rings ===

    #[must_use]
    pub fn ring(&self, element: Element) -> &Ring {
        &self.rings[element as usize]
    }

    pub fn ring_mut(&mut self, element: Element) -> &mut Ring {
        &mut self.rings[element as usize]
    }

    pub fn rings(&self) -> impl Iterator<Item = &Ring> {
        self.rings.iter()
    }

    // === Randomness ===

    pub fn shuffle_deck(&mut self, player: PlayerId, location: Location) {
        self.zones.shuffle_zone(ZoneId::new(player, location), &mut self.shuffle_rng);
    }

    /// Random index for a random discard.
    pub fn random_index(&mut self, len: usize) -> Option<usize> {
        self.discard_rng.index(len)
    }
}
