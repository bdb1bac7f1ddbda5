//! Card creation and movement.
//!
//! `move_card` is the only way rules code changes a card's zone. Leaving
//! play unregisters the card's triggered abilities, ends its persistent
//! effects, drops its cost reducers and limit counters, and removes it
//! from the conflict. Entering play registers its triggered abilities.

use std::rc::Rc;
use tracing::{debug, warn};

use crate::actions::{GameAction, PlayerAction};
use crate::cards::{CardId, CardType, DeckSide, HonorStatus, Keyword};
use crate::core::{EngineError, EntityId, PlayerId, Result};
use crate::costs::{reduced_cost, PlayType};
use crate::zones::{Location, ZoneId, ZonePosition};

use super::{Game, MessageArg};

/// Honor lost when a conflict deck runs out.
const DECK_EMPTY_HONOR_LOSS: i32 = 5;

impl Game {
    /// Create a card from a registered definition.
    pub fn create_card(&mut self, card_id: CardId, owner: PlayerId, location: Location) -> Result<EntityId> {
        if owner.index() >= self.state.player_count() {
            return Err(EngineError::UnknownPlayer(owner));
        }
        let registry = Rc::clone(&self.registry);
        let definition = registry.get(card_id).ok_or(EngineError::UnknownDefinition(card_id))?;
        let id = self.state.create_card(definition, owner, location);

        if let Some(host) = self.script_host.clone() {
            if !self.scripted_abilities.contains_key(&card_id) {
                let native = registry.abilities(card_id).len();
                let scripted = host
                    .abilities_for(id, definition)
                    .into_iter()
                    .enumerate()
                    .map(|(i, mut ability)| {
                        ability.id = crate::abilities::AbilityId::new((native + i) as u16);
                        Rc::new(ability)
                    })
                    .collect();
                self.scripted_abilities.insert(card_id, scripted);
            }
        }

        let on_table = location.is_in_play()
            || (location.is_province() && matches!(definition.card_type, CardType::Province | CardType::Stronghold));
        if on_table {
            self.register_triggered_abilities(id);
            self.effects.mark_dirty();
        }
        Ok(id)
    }

    fn register_triggered_abilities(&mut self, card: EntityId) {
        for ability in self.abilities_of(card) {
            let Some(event) = ability.when.clone() else {
                continue;
            };
            if !ability.ability_type.is_triggered() {
                continue;
            }
            let ability_type = ability.ability_type;
            let condition = ability.trigger.clone();
            self.abilities.register_ability(event, ability_type, card, ability, condition);
        }
    }

    /// Move a card to another zone. Returns where it came from.
    pub fn move_card(&mut self, card: EntityId, to: Location) -> Option<Location> {
        let (owner, card_type, honor_status, courtesy, sincerity) = {
            let instance = self.state.card(card)?;
            (
                instance.owner,
                instance.card_type,
                instance.honor_status,
                instance.has_keyword(Keyword::Courtesy),
                instance.has_keyword(Keyword::Sincerity),
            )
        };
        let from = self.state.relocate(card, to, ZonePosition::Top)?;
        debug!(%card, %from, %to, "move card");

        if let Some(instance) = self.state.card_mut(card) {
            instance.face_down = matches!(to, Location::ConflictDeck | Location::DynastyDeck);
        }

        if let Location::Province(slot) = from {
            if card_type != CardType::Province && !self.state.provinces_to_refill.contains(&(owner, slot)) {
                self.state.provinces_to_refill.push((owner, slot));
            }
        }

        let was_in_play = from.is_in_play();
        let now_in_play = to.is_in_play();
        if was_in_play && !now_in_play {
            self.card_left_play(card, owner, honor_status, courtesy, sincerity);
        } else if !was_in_play && now_in_play {
            self.register_triggered_abilities(card);
            self.effects.mark_dirty();
        }
        Some(from)
    }

    fn card_left_play(
        &mut self,
        card: EntityId,
        owner: PlayerId,
        honor_status: HonorStatus,
        courtesy: bool,
        sincerity: bool,
    ) {
        self.abilities.unregister_all_abilities(card);
        self.effects.remove_persistent_from_source(card, &mut self.state, &mut self.bus);
        self.reducers.remove_by_source(card);
        self.limits.clear_card(card);
        if let Some(conflict) = self.state.current_conflict.as_mut() {
            conflict.remove_participant(card);
        }
        let controller = self.state.controller(card).unwrap_or(owner);
        if let Some(instance) = self.state.card_mut(card) {
            instance.reset_play_state();
            instance.controller = instance.owner;
        }
        self.effects.mark_dirty();

        let context = self.framework_context(Some(controller)).with_source(card);
        match honor_status {
            HonorStatus::Honored => PlayerAction::gain_honor(controller, 1).resolve(self, &context),
            HonorStatus::Dishonored => PlayerAction::lose_honor(controller, 1).resolve(self, &context),
            HonorStatus::Ordinary => {}
        }
        if courtesy {
            PlayerAction::gain_fate(controller, 1).resolve(self, &context);
        }
        if sincerity {
            PlayerAction::draw(controller, 1).resolve(self, &context);
        }
    }

    /// The discard pile a card goes to. Table cards have none.
    #[must_use]
    pub fn discard_pile_for(&self, card: EntityId) -> Option<Location> {
        let instance = self.state.card(card)?;
        match self.registry.get(instance.card_id)?.side {
            DeckSide::Dynasty => Some(Location::DynastyDiscard),
            DeckSide::Conflict => Some(Location::ConflictDiscard),
            DeckSide::Table => None,
        }
    }

    /// Draw cards from the conflict deck. An empty deck is reshuffled from
    /// the discard pile at a cost of honor. Returns how many were drawn.
    pub fn draw_cards(&mut self, player: PlayerId, count: u32) -> u32 {
        let deck = ZoneId::new(player, Location::ConflictDeck);
        let mut drawn = 0;
        for _ in 0..count {
            if self.state.zones.zone_size(deck) == 0 && !self.reshuffle_conflict_deck(player) {
                warn!(%player, "conflict deck and discard are empty");
                break;
            }
            let Some(top) = self.state.zones.top_card(deck) else {
                break;
            };
            self.move_card(top, Location::Hand);
            drawn += 1;
        }
        drawn
    }

    fn reshuffle_conflict_deck(&mut self, player: PlayerId) -> bool {
        let discard = self.state.cards_in(player, Location::ConflictDiscard).to_vec();
        if discard.is_empty() {
            return false;
        }
        for card in discard {
            self.move_card(card, Location::ConflictDeck);
        }
        self.state.shuffle_deck(player, Location::ConflictDeck);
        let honor = &mut self.state.player_mut(player).honor;
        *honor = (*honor - DECK_EMPTY_HONOR_LOSS).max(0);
        self.add_message(
            "{0} loses {1} honor as their conflict deck is reshuffled",
            &[MessageArg::Player(player), MessageArg::Number(DECK_EMPTY_HONOR_LOSS)],
        );
        true
    }

    /// Refill every province emptied since the last refill from the top
    /// of its owner's dynasty deck, face down.
    pub fn refill_provinces(&mut self) {
        for (player, slot) in std::mem::take(&mut self.state.provinces_to_refill) {
            let location = Location::Province(slot);
            let occupied = self
                .state
                .cards_in(player, location)
                .iter()
                .any(|id| self.state.card(*id).is_some_and(|c| c.card_type != CardType::Province));
            if occupied {
                continue;
            }
            let Some(top) = self.state.zones.top_card(ZoneId::new(player, Location::DynastyDeck)) else {
                continue;
            };
            self.move_card(top, location);
            if let Some(instance) = self.state.card_mut(top) {
                instance.face_down = true;
            }
            debug!(%player, slot, card = %top, "refill province");
        }
    }

    /// Fate `player` pays to play `card`: printed cost less reductions,
    /// never below zero.
    #[must_use]
    pub fn fate_cost(&self, card: EntityId, player: PlayerId, play_type: PlayType) -> i32 {
        reduced_cost(self, card, player, play_type, None).0
    }
}
