//! Ability context.

use im::HashMap as ImHashMap;
use smallvec::SmallVec;
use std::rc::Rc;

use crate::actions::ActionContext;
use crate::cards::CardInstance;
use crate::core::{EntityId, PlayerId};
use crate::events::EventId;

use super::ability::CardAbility;

/// Everything known about one use of an ability.
#[derive(Clone, Debug)]
pub struct AbilityContext {
    /// The card the ability belongs to.
    pub source: EntityId,
    /// The player using it.
    pub player: PlayerId,
    pub ability: Rc<CardAbility>,

    /// The event a triggered ability responds to.
    pub event: Option<EventId>,

    /// Chosen targets by target name.
    pub targets: Vec<(String, SmallVec<[EntityId; 2]>)>,

    /// Card state when the ability was initiated.
    pub snapshot: Option<ImHashMap<EntityId, CardInstance>>,

    /// Events created to pay costs.
    pub cost_events: Vec<EventId>,
}

impl AbilityContext {
    pub fn new(source: EntityId, player: PlayerId, ability: Rc<CardAbility>) -> Self {
        Self {
            source,
            player,
            ability,
            event: None,
            targets: Vec::new(),
            snapshot: None,
            cost_events: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_event(mut self, event: EventId) -> Self {
        self.event = Some(event);
        self
    }

    /// The first target chosen for `name`.
    #[must_use]
    pub fn target(&self, name: &str) -> Option<EntityId> {
        self.targets_for(name).first().copied()
    }

    #[must_use]
    pub fn targets_for(&self, name: &str) -> &[EntityId] {
        self.targets
            .iter()
            .find(|(n, _)| n == name)
            .map_or(&[], |(_, ids)| ids.as_slice())
    }

    /// First target of the first target spec, for messages.
    #[must_use]
    pub fn first_target(&self) -> Option<EntityId> {
        self.targets.first().and_then(|(_, ids)| ids.first().copied())
    }

    pub fn set_targets(&mut self, name: &str, ids: impl IntoIterator<Item = EntityId>) {
        let ids: SmallVec<[EntityId; 2]> = ids.into_iter().collect();
        match self.targets.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = ids,
            None => self.targets.push((name.to_string(), ids)),
        }
    }

    pub fn clear_targets(&mut self, name: &str) {
        self.targets.retain(|(n, _)| n != name);
    }

    #[must_use]
    pub fn has_targets(&self, name: &str) -> bool {
        !self.targets_for(name).is_empty()
    }

    /// The card as it was when the ability was initiated.
    #[must_use]
    pub fn snapshot_of(&self, card: EntityId) -> Option<&CardInstance> {
        self.snapshot.as_ref().and_then(|s| s.get(&card))
    }

    /// Context handed to game actions.
    #[must_use]
    pub fn action_context(&self) -> ActionContext {
        ActionContext::new(self.player).with_source(self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::AbilityType;

    fn context() -> AbilityContext {
        let ability = Rc::new(CardAbility::new("Test", AbilityType::Action));
        AbilityContext::new(EntityId(4), PlayerId::new(0), ability)
    }

    #[test]
    fn test_targets() {
        let mut ctx = context();
        assert_eq!(ctx.target("character"), None);

        ctx.set_targets("character", [EntityId(7)]);
        ctx.set_targets("other", [EntityId(8), EntityId(9)]);

        assert_eq!(ctx.target("character"), Some(EntityId(7)));
        assert_eq!(ctx.targets_for("other"), &[EntityId(8), EntityId(9)]);
        assert_eq!(ctx.first_target(), Some(EntityId(7)));

        ctx.set_targets("character", [EntityId(10)]);
        assert_eq!(ctx.target("character"), Some(EntityId(10)));

        ctx.clear_targets("character");
        assert!(!ctx.has_targets("character"));
    }

    #[test]
    fn test_action_context() {
        let ctx = context();
        let action = ctx.action_context();
        assert_eq!(action.player, PlayerId::new(0));
        assert_eq!(action.source, Some(EntityId(4)));
    }
}
