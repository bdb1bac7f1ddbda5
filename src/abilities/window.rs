//! Ability window scheduling.
//!
//! The `AbilityWindow` owns every triggered ability registration and the
//! queue of windows waiting to open. Registrations are indexed by event
//! name so an event batch only looks at abilities that respond to it.
//!
//! Only one triggered ability window offers choices at a time.
//! `open_window` never opens anything directly: it queues a pending window
//! and calls `process_next_window`, which opens the next pending window
//! only if none is open. Closing a window processes the queue again.
//!
//! ## Nested windows
//!
//! While an open window resolves one of its abilities, that resolution may
//! raise events of its own. Their windows open on top of the resolving
//! window and close before it resumes, so an interrupt still comes before
//! the event it interrupts. Windows requested while the top window is not
//! resolving wait in the queue until it closes. A queued interrupt window
//! drops events that resolved in the meantime.

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::{debug, error};

use crate::core::{EntityId, PlayerId};
use crate::events::{ConditionContext, ConditionEvaluator, EventId, EventName, GameEvent, TriggerCondition};
use crate::game::Game;

use super::ability::{AbilityType, CardAbility};
use super::context::AbilityContext;
use super::triggered::TriggeredAbilityWindow;

/// Identifier of a registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistrationId(pub u32);

impl std::fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Registration({})", self.0)
    }
}

/// Identifier of an opened window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WindowId(pub u32);

/// A triggered ability listening for an event.
#[derive(Clone, Debug)]
pub struct AbilityRegistration {
    pub id: RegistrationId,
    pub event: EventName,
    pub ability_type: AbilityType,
    pub source: EntityId,
    pub ability: Rc<CardAbility>,
    pub condition: TriggerCondition,
}

/// One eligible response in an open window.
#[derive(Clone, Debug)]
pub struct TriggerChoice {
    pub registration: RegistrationId,
    pub event: EventId,
    pub player: PlayerId,
    pub context: AbilityContext,
}

#[derive(Clone, Debug)]
struct PendingWindow {
    ability_type: AbilityType,
    events: Vec<EventId>,
    /// Open windows it must wait under.
    depth: usize,
    ticket: u32,
}

/// Triggered ability registrations and window scheduling.
#[derive(Debug, Default)]
pub struct AbilityWindow {
    registrations: FxHashMap<RegistrationId, AbilityRegistration>,
    by_event: FxHashMap<EventName, Vec<RegistrationId>>,
    pending: VecDeque<PendingWindow>,
    /// Open windows, innermost last.
    open: Vec<WindowId>,
    /// Open windows currently running an ability resolution.
    resolving: Vec<WindowId>,
    force_closed: FxHashSet<WindowId>,
    next_registration: u32,
    next_window: u32,
    next_ticket: u32,
}

impl AbilityWindow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // === Registration ===

    pub fn register_ability(
        &mut self,
        event: EventName,
        ability_type: AbilityType,
        source: EntityId,
        ability: Rc<CardAbility>,
        condition: TriggerCondition,
    ) -> RegistrationId {
        let id = RegistrationId(self.next_registration);
        self.next_registration += 1;
        debug!(%id, %event, ?ability_type, %source, title = %ability.title, "register ability");

        self.by_event.entry(event.clone()).or_default().push(id);
        self.registrations.insert(
            id,
            AbilityRegistration {
                id,
                event,
                ability_type,
                source,
                ability,
                condition,
            },
        );
        id
    }

    pub fn unregister_ability(&mut self, id: RegistrationId) -> Option<AbilityRegistration> {
        let registration = self.registrations.remove(&id)?;
        if let Some(list) = self.by_event.get_mut(&registration.event) {
            list.retain(|rid| *rid != id);
            if list.is_empty() {
                self.by_event.remove(&registration.event);
            }
        }
        Some(registration)
    }

    /// Remove every registration of a card. Returns how many were removed;
    /// a second call for the same card removes nothing.
    pub fn unregister_all_abilities(&mut self, source: EntityId) -> usize {
        let mut ids: Vec<RegistrationId> = self
            .registrations
            .values()
            .filter(|r| r.source == source)
            .map(|r| r.id)
            .collect();
        ids.sort();
        for id in &ids {
            self.unregister_ability(*id);
        }
        if !ids.is_empty() {
            debug!(%source, count = ids.len(), "unregistered abilities");
        }
        ids.len()
    }

    #[must_use]
    pub fn registration(&self, id: RegistrationId) -> Option<&AbilityRegistration> {
        self.registrations.get(&id)
    }

    /// Registrations listening for an event, in registration order.
    #[must_use]
    pub fn registrations_for(&self, event: &EventName) -> Vec<&AbilityRegistration> {
        self.by_event
            .get(event)
            .map(|ids| ids.iter().filter_map(|id| self.registrations.get(id)).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn registrations_of(&self, source: EntityId) -> usize {
        self.registrations.values().filter(|r| r.source == source).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    // === Window state ===

    #[must_use]
    pub fn is_window_open(&self) -> bool {
        !self.open.is_empty()
    }

    /// The innermost open window.
    #[must_use]
    pub fn open_window_id(&self) -> Option<WindowId> {
        self.open.last().copied()
    }

    /// How many windows are open, counting suspended outer windows.
    #[must_use]
    pub fn open_depth(&self) -> usize {
        self.open.len()
    }

    #[must_use]
    pub fn pending_windows(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_force_closed(&self, id: WindowId) -> bool {
        self.force_closed.contains(&id)
    }

    /// The innermost open window is resolving an ability, so a new window
    /// may open on top of it.
    fn top_is_resolving(&self) -> bool {
        self.open.last().is_some_and(|top| self.resolving.last() == Some(top))
    }

    /// Depth a window requested now opens at.
    fn request_depth(&self) -> usize {
        if self.top_is_resolving() {
            self.open.len()
        } else {
            self.open.len().saturating_sub(1)
        }
    }

    pub(crate) fn begin_resolving(&mut self, id: WindowId) {
        self.resolving.push(id);
    }

    pub(crate) fn end_resolving(&mut self, id: WindowId) {
        if let Some(pos) = self.resolving.iter().rposition(|w| *w == id) {
            self.resolving.remove(pos);
        }
    }

    // === Orchestration ===

    /// Queue a window for a batch of events and open it when possible.
    /// Returns `false` if it is still waiting in the queue.
    pub fn open_window(game: &mut Game, ability_type: AbilityType, events: Vec<EventId>) -> bool {
        let depth = game.abilities.request_depth();
        let ticket = game.abilities.next_ticket;
        game.abilities.next_ticket += 1;
        debug!(?ability_type, events = events.len(), depth, "queue ability window");
        game.abilities.pending.push_back(PendingWindow {
            ability_type,
            events,
            depth,
            ticket,
        });
        Self::process_next_window(game);
        !game.abilities.pending.iter().any(|p| p.ticket == ticket)
    }

    /// Open the next pending window unless one is already open at its
    /// depth.
    pub fn process_next_window(game: &mut Game) {
        loop {
            let depth = game.abilities.open.len();
            if depth > 0 && !game.abilities.top_is_resolving() {
                return;
            }
            let Some(index) = game.abilities.pending.iter().position(|p| p.depth >= depth) else {
                return;
            };
            let Some(pending) = game.abilities.pending.remove(index) else {
                return;
            };
            let ability_type = pending.ability_type;
            let events: Vec<EventId> = pending
                .events
                .into_iter()
                .filter(|id| Self::is_event_still_valid(game, *id, ability_type))
                .collect();
            if events.is_empty() {
                debug!(?ability_type, "skip window with no live events");
                continue;
            }
            if !ability_type.is_triggered() {
                error!(?ability_type, "cannot open a triggered window for this ability type");
                continue;
            }

            let id = WindowId(game.abilities.next_window);
            game.abilities.next_window += 1;
            game.abilities.open.push(id);
            debug!(window = id.0, ?ability_type, depth, "open ability window");
            game.queue_step(Box::new(TriggeredAbilityWindow::new(id, ability_type, events)));
            return;
        }
    }

    /// Close a window and open the next one.
    pub fn close_window(game: &mut Game, id: WindowId) {
        if let Some(pos) = game.abilities.open.iter().position(|w| *w == id) {
            debug!(window = id.0, "close ability window");
            game.abilities.open.remove(pos);
        }
        game.abilities.end_resolving(id);
        game.abilities.force_closed.remove(&id);
        Self::process_next_window(game);
    }

    /// Close every open window without waiting for its players, and drop
    /// every pending window.
    pub fn force_close_window(game: &mut Game) {
        for id in &game.abilities.open {
            debug!(window = id.0, "force close ability window");
            game.abilities.force_closed.insert(*id);
        }
        game.abilities.pending.clear();
    }

    /// Cancelled events get no window. Interrupts also skip events that
    /// already resolved while their window waited.
    fn is_event_still_valid(game: &Game, id: EventId, ability_type: AbilityType) -> bool {
        game.event(id)
            .is_some_and(|e| !e.cancelled && !(ability_type.is_interrupt() && e.resolved))
    }

    // === Eligibility ===

    /// Every response to `events` of `ability_type` that could be used
    /// right now, skipping `exclude`.
    #[must_use]
    pub fn eligible_choices(
        game: &Game,
        ability_type: AbilityType,
        events: &[EventId],
        exclude: &[(RegistrationId, EventId)],
    ) -> Vec<TriggerChoice> {
        let mut choices = Vec::new();
        for event_id in events {
            let Some(event) = game.event(*event_id) else {
                continue;
            };
            if event.cancelled {
                continue;
            }
            for registration in game.abilities.registrations_for(&event.name) {
                if registration.ability_type != ability_type || exclude.contains(&(registration.id, *event_id)) {
                    continue;
                }
                let Some(player) = game.state.controller(registration.source) else {
                    continue;
                };
                if !Self::trigger_holds(game, registration, event, player) {
                    continue;
                }
                let context = AbilityContext::new(registration.source, player, Rc::clone(&registration.ability))
                    .with_event(*event_id);
                if !registration.ability.meets_requirements(game, &context) {
                    continue;
                }
                choices.push(TriggerChoice {
                    registration: registration.id,
                    event: *event_id,
                    player,
                    context,
                });
            }
        }
        choices
    }

    fn trigger_holds(game: &Game, registration: &AbilityRegistration, event: &GameEvent, player: PlayerId) -> bool {
        let eval = |key: &str, event: &GameEvent, _: &crate::core::GameState| {
            game.evaluate_script_condition(registration.source, key, event)
        };
        let ctx = ConditionContext::new(event, &game.state, registration.source, player).with_custom_eval(&eval);
        ConditionEvaluator::evaluate(&registration.condition, &ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reaction() -> Rc<CardAbility> {
        Rc::new(CardAbility::triggered("Respond", AbilityType::Reaction, EventName::CARD_BOWED))
    }

    #[test]
    fn test_register_indexes_by_event() {
        let mut window = AbilityWindow::new();
        window.register_ability(
            EventName::CARD_BOWED,
            AbilityType::Reaction,
            EntityId(4),
            reaction(),
            TriggerCondition::Always,
        );
        window.register_ability(
            EventName::CARD_BOWED,
            AbilityType::Interrupt,
            EntityId(5),
            reaction(),
            TriggerCondition::Always,
        );
        window.register_ability(
            EventName::CLAIM_RING,
            AbilityType::Reaction,
            EntityId(4),
            reaction(),
            TriggerCondition::Always,
        );

        assert_eq!(window.registrations_for(&EventName::CARD_BOWED).len(), 2);
        assert_eq!(window.registrations_for(&EventName::CLAIM_RING).len(), 1);
        assert!(window.registrations_for(&EventName::ROUND_ENDED).is_empty());
        assert_eq!(window.registrations_of(EntityId(4)), 2);
    }

    #[test]
    fn test_unregister_all_is_idempotent() {
        let mut window = AbilityWindow::new();
        for _ in 0..3 {
            window.register_ability(
                EventName::CARD_BOWED,
                AbilityType::Reaction,
                EntityId(9),
                reaction(),
                TriggerCondition::Always,
            );
        }

        assert_eq!(window.unregister_all_abilities(EntityId(9)), 3);
        assert_eq!(window.unregister_all_abilities(EntityId(9)), 0);
        assert!(window.is_empty());
        assert!(window.registrations_for(&EventName::CARD_BOWED).is_empty());
    }

    #[test]
    fn test_unregister_single() {
        let mut window = AbilityWindow::new();
        let id = window.register_ability(
            EventName::CARD_BOWED,
            AbilityType::Reaction,
            EntityId(9),
            reaction(),
            TriggerCondition::Always,
        );

        assert!(window.unregister_ability(id).is_some());
        assert!(window.unregister_ability(id).is_none());
    }
}
