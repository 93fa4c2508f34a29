//! Small shared value types used across the entity model.

use crate::attributes::{PrimaryAttributes, ResourceCaps, SecondaryAttributes};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A `{verb, damageType}` pair describing how a weapon hits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitType {
    pub verb: String,
    pub damage_type: DamageType,
}

/// An open string-like tag rather than a closed enum: damage types are
/// content, not simulation rules, so new ones don't require a crate change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DamageType(pub String);

impl DamageType {
    pub fn new(s: impl Into<String>) -> Self {
        DamageType(s.into())
    }
}

impl fmt::Display for DamageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lookup table of "common" hit types a weapon can reference by verb, e.g.
/// `"slash"` -> `{verb: "slash", damageType: Physical}`. §7: referencing an
/// unknown common hit type during construction is a `HitTypeNotFound`
/// (fatal, caller bug).
#[derive(Debug, Default, Clone)]
pub struct HitTypeTable {
    entries: std::collections::HashMap<String, HitType>,
}

impl HitTypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, hit_type: HitType) {
        self.entries.insert(name.into(), hit_type);
    }

    pub fn resolve(&self, name: &str) -> Option<&HitType> {
        self.entries.get(name)
    }
}

/// Equipment slots. Kept as an open string newtype (rather than a closed
/// enum) so content can define slots (`"mainHand"`, `"offHand"`, `"head"`,
/// ...) without a crate change — mirrors `DamageType` above.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct EquipSlot(pub String);

impl EquipSlot {
    pub fn new(s: impl Into<String>) -> Self {
        EquipSlot(s.into())
    }
}

impl fmt::Display for EquipSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bonuses a piece of equipment or a passive effect contributes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeBonuses {
    pub primary: PrimaryAttributes,
    pub secondary: SecondaryAttributes,
    pub resources: ResourceCaps,
}

impl AttributeBonuses {
    pub fn sum<'a>(items: impl IntoIterator<Item = &'a AttributeBonuses>) -> AttributeBonuses {
        let mut total = AttributeBonuses::default();
        for b in items {
            total.primary = total.primary + b.primary;
            total.secondary = total.secondary + b.secondary;
            total.resources = total.resources + b.resources;
        }
        total
    }
}
