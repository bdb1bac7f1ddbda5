//! Ability targets.

use std::rc::Rc;

use crate::core::EntityId;
use crate::game::Game;
use crate::zones::Location;

use super::context::AbilityContext;

/// Who picks a target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TargetChooser {
    #[default]
    Controller,
    /// The opponent of the player using the ability. Such targets are
    /// chosen after costs are paid.
    Opponent,
}

type TargetCondition = Rc<dyn Fn(&Game, &AbilityContext, EntityId) -> bool>;

/// One named target of an ability.
#[derive(Clone)]
pub struct TargetSpec {
    pub name: String,
    pub chooser: TargetChooser,
    /// Where candidates are looked for.
    pub location: Location,
    pub condition: TargetCondition,
    pub min: usize,
    pub max: usize,
    pub optional: bool,
}

impl std::fmt::Debug for TargetSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetSpec")
            .field("name", &self.name)
            .field("chooser", &self.chooser)
            .field("location", &self.location)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("optional", &self.optional)
            .finish_non_exhaustive()
    }
}

impl TargetSpec {
    /// A single card in play matching `condition`.
    pub fn card(name: impl Into<String>, condition: impl Fn(&Game, &AbilityContext, EntityId) -> bool + 'static) -> Self {
        Self {
            name: name.into(),
            chooser: TargetChooser::Controller,
            location: Location::PlayArea,
            condition: Rc::new(condition),
            min: 1,
            max: 1,
            optional: false,
        }
    }

    /// A character in play.
    pub fn character(name: impl Into<String>) -> Self {
        Self::card(name, |game, _, id| game.state.card(id).is_some_and(|c| c.is_character()))
    }

    #[must_use]
    pub fn chosen_by(mut self, chooser: TargetChooser) -> Self {
        self.chooser = chooser;
        self
    }

    #[must_use]
    pub fn in_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    #[must_use]
    pub fn with_range(mut self, min: usize, max: usize) -> Self {
        self.min = min;
        self.max = max.max(min);
        self
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Cards currently legal for this target.
    #[must_use]
    pub fn legal_targets(&self, game: &Game, context: &AbilityContext) -> Vec<EntityId> {
        game.state
            .player_ids()
            .flat_map(|p| game.state.cards_in(p, self.location).iter().copied())
            .filter(|id| (self.condition)(game, context, *id))
            .collect()
    }

    #[must_use]
    pub fn is_legal(&self, game: &Game, context: &AbilityContext, card: EntityId) -> bool {
        game.state.card(card).is_some_and(|c| c.location == self.location) && (self.condition)(game, context, card)
    }

    #[must_use]
    pub fn has_enough_targets(&self, game: &Game, context: &AbilityContext) -> bool {
        self.legal_targets(game, context).len() >= self.min
    }
}
