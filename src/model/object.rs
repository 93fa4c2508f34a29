//! The containment graph's base entity (C3) and the tagged-sum discriminator
//! that replaces the source's `Object | Room | Movable | Item | Equipment |
//! Armor | Weapon | Mob | Prop` class hierarchy (see `spec.md` §9).

use super::mob::MobData;
use super::types::{EquipSlot, HitType};
use crate::attributes::{PrimaryAttributes, ResourceCaps, SecondaryAttributes};
use crate::direction::CARDINALS_AND_DIAGONALS_MASK;
use crate::ids::{Coordinate, Oid};
use serde::{Deserialize, Serialize};

/// Identifies the reset that spawned an object, for invariant 5
/// (reset tracking) — a reset's `spawned` list and an object's
/// `spawned_by_reset` back-pointer are kept in sync by `crate::resets`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResetRef {
    pub dungeon_id: String,
    pub reset_index: usize,
}

/// Fields shared by every object in the containment graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectBase {
    pub oid: Oid,
    pub keywords: String,
    pub display: String,
    pub description: Option<String>,
    pub room_description: Option<String>,
    pub map_text: Option<String>,
    pub map_color: Option<String>,
    pub base_weight: f64,
    pub current_weight: f64,
    pub value: f64,
    pub template_id: Option<String>,
    pub location: Option<Oid>,
    pub contents: Vec<Oid>,
    pub dungeon: Option<String>,
    pub spawned_by_reset: Option<ResetRef>,
    pub destroyed: bool,
}

impl ObjectBase {
    pub fn new(oid: Oid, keywords: impl Into<String>, display: impl Into<String>) -> Self {
        ObjectBase {
            oid,
            keywords: keywords.into(),
            display: display.into(),
            description: None,
            room_description: None,
            map_text: None,
            map_color: None,
            base_weight: 0.0,
            current_weight: 0.0,
            value: 0.0,
            template_id: None,
            location: None,
            contents: Vec::new(),
            dungeon: None,
            spawned_by_reset: None,
            destroyed: false,
        }
    }

    /// Whitespace-tokenized subword matching: every query token must be a
    /// prefix of some keyword token on the object.
    pub fn matches(&self, query: &str) -> bool {
        let keyword_tokens: Vec<&str> = self.keywords.split_whitespace().collect();
        query.split_whitespace().all(|q_tok| {
            keyword_tokens
                .iter()
                .any(|k_tok| k_tok.to_ascii_lowercase().starts_with(&q_tok.to_ascii_lowercase()))
        })
    }

    /// §3: unset `roomDescription` falls through to `display` (design note:
    /// resolves the spec's flagged inconsistency in favor of this rule).
    pub fn effective_room_description(&self) -> &str {
        self.room_description.as_deref().unwrap_or(&self.display)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomData {
    pub coordinates: Coordinate,
    pub allowed_exits: u32,
    pub dense: bool,
    pub links: Vec<usize>,
}

impl Default for RoomData {
    fn default() -> Self {
        RoomData {
            coordinates: Coordinate::new(0, 0, 0),
            allowed_exits: CARDINALS_AND_DIAGONALS_MASK,
            dense: false,
            links: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MovableCache {
    pub room_coordinates: Option<Coordinate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemData {
    pub is_container: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EquipmentKind {
    Generic,
    Armor { defense: f64 },
    Weapon {
        attack_power: f64,
        hit_type: HitType,
        weapon_type: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentData {
    pub slot: EquipSlot,
    pub kind: EquipmentKind,
    pub attribute_bonuses: PrimaryAttributes,
    pub secondary_bonuses: SecondaryAttributes,
    pub resource_bonuses: ResourceCaps,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MovableKind {
    Item(ItemData),
    Currency,
    Equipment(EquipmentData),
    Mob(Box<MobData>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ObjectKind {
    Room(RoomData),
    Prop,
    Movable {
        cache: MovableCache,
        kind: MovableKind,
    },
}

impl ObjectKind {
    pub fn type_tag(&self) -> &'static str {
        match self {
            ObjectKind::Room(_) => "Room",
            ObjectKind::Prop => "Prop",
            ObjectKind::Movable { kind, .. } => match kind {
                MovableKind::Item(_) => "Item",
                MovableKind::Currency => "Currency",
                MovableKind::Equipment(e) => match e.kind {
                    EquipmentKind::Armor { .. } => "Armor",
                    EquipmentKind::Weapon { .. } => "Weapon",
                    EquipmentKind::Generic => "Equipment",
                },
                MovableKind::Mob(_) => "Mob",
            },
        }
    }

    pub fn is_movable(&self) -> bool {
        matches!(self, ObjectKind::Movable { .. })
    }

    pub fn as_mob(&self) -> Option<&MobData> {
        match self {
            ObjectKind::Movable {
                kind: MovableKind::Mob(m),
                ..
            } => Some(m),
            _ => None,
        }
    }

    pub fn as_mob_mut(&mut self) -> Option<&mut MobData> {
        match self {
            ObjectKind::Movable {
                kind: MovableKind::Mob(m),
                ..
            } => Some(m),
            _ => None,
        }
    }

    pub fn as_room(&self) -> Option<&RoomData> {
        match self {
            ObjectKind::Room(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_room_mut(&mut self) -> Option<&mut RoomData> {
        match self {
            ObjectKind::Room(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_equipment(&self) -> Option<&EquipmentData> {
        match self {
            ObjectKind::Movable {
                kind: MovableKind::Equipment(e),
                ..
            } => Some(e),
            _ => None,
        }
    }

    pub fn is_container(&self) -> bool {
        match self {
            ObjectKind::Movable {
                kind: MovableKind::Item(i),
                ..
            } => i.is_container,
            ObjectKind::Movable {
                kind: MovableKind::Mob(_),
                ..
            } => true, // mobs hold inventory/equipment
            _ => false,
        }
    }

    pub fn is_shopkeeper(&self) -> bool {
        self.as_mob().is_some_and(|m| m.behaviors.shopkeeper)
    }
}

/// One node in the containment graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub base: ObjectBase,
    pub kind: ObjectKind,
}

impl Entity {
    pub fn new_room(oid: Oid, coordinates: Coordinate) -> Self {
        Entity {
            base: ObjectBase::new(oid, "room", "a room"),
            kind: ObjectKind::Room(RoomData {
                coordinates,
                ..Default::default()
            }),
        }
    }

    pub fn new_prop(oid: Oid, keywords: impl Into<String>, display: impl Into<String>) -> Self {
        Entity {
            base: ObjectBase::new(oid, keywords, display),
            kind: ObjectKind::Prop,
        }
    }

    pub fn new_item(
        oid: Oid,
        keywords: impl Into<String>,
        display: impl Into<String>,
        is_container: bool,
    ) -> Self {
        Entity {
            base: ObjectBase::new(oid, keywords, display),
            kind: ObjectKind::Movable {
                cache: MovableCache::default(),
                kind: MovableKind::Item(ItemData { is_container }),
            },
        }
    }

    pub fn new_currency(oid: Oid, keywords: impl Into<String>, display: impl Into<String>, value: f64) -> Self {
        let mut base = ObjectBase::new(oid, keywords, display);
        base.value = value;
        Entity {
            base,
            kind: ObjectKind::Movable {
                cache: MovableCache::default(),
                kind: MovableKind::Currency,
            },
        }
    }

    pub fn new_equipment(
        oid: Oid,
        keywords: impl Into<String>,
        display: impl Into<String>,
        equipment: EquipmentData,
    ) -> Self {
        Entity {
            base: ObjectBase::new(oid, keywords, display),
            kind: ObjectKind::Movable {
                cache: MovableCache::default(),
                kind: MovableKind::Equipment(equipment),
            },
        }
    }

    pub fn new_mob(
        oid: Oid,
        keywords: impl Into<String>,
        display: impl Into<String>,
        mob: MobData,
    ) -> Self {
        Entity {
            base: ObjectBase::new(oid, keywords, display),
            kind: ObjectKind::Movable {
                cache: MovableCache::default(),
                kind: MovableKind::Mob(Box::new(mob)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_matching_is_prefix_based_tokenwise() {
        let e = Entity::new_item(1, "long sword steel", "a long steel sword", false);
        assert!(e.base.matches("long"));
        assert!(e.base.matches("lo st"));
        assert!(e.base.matches("sw"));
        assert!(!e.base.matches("wooden"));
        assert!(!e.base.matches("long wooden"));
    }

    #[test]
    fn room_description_falls_through_to_display() {
        let e = Entity::new_prop(1, "statue", "a stone statue");
        assert_eq!(e.base.effective_room_description(), "a stone statue");
    }
}
