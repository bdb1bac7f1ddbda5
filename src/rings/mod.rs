//! The five elemental rings.
//!
//! Every conflict is declared on an unclaimed ring. The ring's conflict
//! type flips to the declared type, fate that accumulated on it goes to
//! the attacker, and if the attacker wins they may resolve its effect and
//! claim it.

use serde::{Deserialize, Serialize};

use crate::core::PlayerId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Element {
    Air,
    Earth,
    Fire,
    Water,
    Void,
}

impl Element {
    pub const ALL: [Element; 5] = [
        Element::Air,
        Element::Earth,
        Element::Fire,
        Element::Water,
        Element::Void,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Element::Air => "Air",
            Element::Earth => "Earth",
            Element::Fire => "Fire",
            Element::Water => "Water",
            Element::Void => "Void",
        }
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConflictType {
    #[default]
    Military,
    Political,
}

impl std::fmt::Display for ConflictType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictType::Military => f.write_str("military"),
            ConflictType::Political => f.write_str("political"),
        }
    }
}

/// A ring on the table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ring {
    pub element: Element,
    pub conflict_type: ConflictType,
    /// Fate placed on the ring while it is unclaimed.
    pub fate: i32,
    pub claimed_by: Option<PlayerId>,
    /// True while a conflict is being fought over this ring.
    pub contested: bool,
}

impl Ring {
    #[must_use]
    pub fn new(element: Element) -> Self {
        Self {
            element,
            conflict_type: ConflictType::Military,
            fate: 0,
            claimed_by: None,
            contested: false,
        }
    }

    /// Can a conflict be declared on this ring?
    #[must_use]
    pub fn is_unclaimed(&self) -> bool {
        self.claimed_by.is_none() && !self.contested
    }

    /// Return the ring to the unclaimed pool for a new round.
    pub fn reset(&mut self) {
        self.claimed_by = None;
        self.contested = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ring_is_unclaimed() {
        let ring = Ring::new(Element::Void);
        assert!(ring.is_unclaimed());
        assert_eq!(ring.fate, 0);
        assert_eq!(format!("{}", ring.element), "Void");
    }

    #[test]
    fn test_claim_and_reset() {
        let mut ring = Ring::new(Element::Fire);
        ring.claimed_by = Some(PlayerId::new(1));
        assert!(!ring.is_unclaimed());

        ring.reset();
        assert!(ring.is_unclaimed());
    }
}
