//! Object serialization, compression, and templates (C3's serialization
//! subsystem). Builds the self-describing JSON schema from §6 by hand
//! rather than deriving it from the internal snake_case structs — the wire
//! format is camelCase and keyed by type tag, which doesn't match any
//! single Rust struct's shape once Room/Mob/Equipment fields are unioned.

use crate::error::{WorldError, WorldResult};
use crate::ids::{Oid, RoomRef};
use crate::model::object::{Entity, EquipmentKind, MovableKind, ObjectKind};
use crate::registry::World;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Fields preserved across compression regardless of baseline equality
/// (§4.1: "Always preserves `type`, `oid`, `templateId`, `version`").
const PROTECTED_FIELDS: [&str; 4] = ["type", "oid", "templateId", "version"];

/// A dungeon-scoped template record: the diff fields a reset/spawn applies
/// on top of the type default, plus a cached full serialization used as the
/// compression baseline for instances built from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateRecord {
    pub id: String,
    pub type_tag: String,
    pub fields: Value,
    pub base_serialized: Option<Value>,
}

impl TemplateRecord {
    pub fn new(id: impl Into<String>, type_tag: impl Into<String>) -> Self {
        TemplateRecord {
            id: id.into(),
            type_tag: type_tag.into(),
            fields: Value::Object(Map::new()),
            base_serialized: None,
        }
    }
}

/// Resolves a dungeon-local template id to the collaborator-facing
/// `ports::Template` a `ObjectFactory` consumes. Crosses into another
/// dungeon's table for a globalized reference (the caller has already
/// split `@dungeon:id` via `TemplateRef::parse`).
pub fn lookup_template(world: &World, dungeon_id: &str, template_id: &str) -> Option<crate::ports::Template> {
    let record = world.dungeon(dungeon_id)?.templates.get(template_id)?;
    Some(crate::ports::Template {
        template_id: record.id.clone(),
        type_tag: record.type_tag.clone(),
        payload: record.fields.clone(),
    })
}

/// The compile-time default field set for a type tag — the baseline used
/// when no template-specific `base_serialized` applies. Mirrors the struct
/// defaults in `crate::model::object`/`crate::model::mob`.
pub fn type_default(type_tag: &str) -> Map<String, Value> {
    let mut m = Map::new();
    m.insert("keywords".into(), json!(""));
    m.insert("display".into(), json!(""));
    m.insert("baseWeight".into(), json!(0.0));
    m.insert("value".into(), json!(0.0));

    match type_tag {
        "Room" => {
            m.insert("allowedExits".into(), json!(crate::direction::CARDINALS_AND_DIAGONALS_MASK));
            m.insert("dense".into(), json!(false));
        }
        "Item" => {
            m.insert("isContainer".into(), json!(false));
        }
        "Equipment" | "Armor" | "Weapon" => {
            m.insert("slot".into(), json!(""));
            if type_tag == "Armor" {
                m.insert("defense".into(), json!(0.0));
            }
            if type_tag == "Weapon" {
                m.insert("attackPower".into(), json!(0.0));
            }
        }
        "Mob" => {
            m.insert("race".into(), json!(""));
            m.insert("job".into(), json!(""));
            m.insert("level".into(), json!(1));
            m.insert("experience".into(), json!(0));
            m.insert("health".into(), json!(0));
            m.insert("mana".into(), json!(0));
            m.insert("exhaustion".into(), json!(0));
        }
        _ => {}
    }
    m
}

/// `Serialize(compress?, version?)`. Errors on Currency (§7:
/// `SerializeCurrency`) — currency is runtime-only and is never meant to
/// reach this entry point directly; callers serializing a container's
/// contents skip currency children instead of recursing into them.
pub fn serialize_object(world: &World, oid: Oid, compress: bool) -> WorldResult<Value> {
    let entity = world
        .entity(oid)
        .ok_or_else(|| WorldError::UnknownRoom(format!("no such object {oid}")))?;
    if matches!(
        &entity.kind,
        ObjectKind::Movable {
            kind: MovableKind::Currency,
            ..
        }
    ) {
        return Err(WorldError::SerializeCurrency(format!("oid {oid}")));
    }
    Ok(Value::Object(serialize_entity(world, entity, compress)))
}

fn serialize_entity(world: &World, entity: &Entity, compress: bool) -> Map<String, Value> {
    let type_tag = entity.kind.type_tag();
    let mut m = Map::new();
    m.insert("type".into(), json!(type_tag));

    let is_room = matches!(entity.kind, ObjectKind::Room(_));
    if !is_room {
        // Rooms are identified by coordinates alone and never carry an oid
        // on the wire (invariant 6).
        m.insert("oid".into(), json!(entity.base.oid));
    }
    m.insert("keywords".into(), json!(entity.base.keywords));
    m.insert("display".into(), json!(entity.base.display));
    if let Some(t) = &entity.base.template_id {
        m.insert("templateId".into(), json!(t));
    }
    if let Some(d) = &entity.base.description {
        m.insert("description".into(), json!(d));
    }
    if let Some(rd) = &entity.base.room_description {
        m.insert("roomDescription".into(), json!(rd));
    }
    if let Some(mt) = &entity.base.map_text {
        m.insert("mapText".into(), json!(mt));
    }
    if let Some(mc) = &entity.base.map_color {
        m.insert("mapColor".into(), json!(mc));
    }
    m.insert("baseWeight".into(), json!(entity.base.base_weight));
    m.insert("value".into(), json!(entity.base.value));

    if let Some(loc) = entity.base.location {
        if let Some(room_ref) = room_ref_of(world, loc) {
            m.insert("location".into(), json!(room_ref.to_string()));
        }
    }

    let children: Vec<Value> = entity
        .base
        .contents
        .iter()
        .filter_map(|&child_oid| world.entity(child_oid))
        .filter(|child| !matches!(&child.kind, ObjectKind::Movable { kind: MovableKind::Currency, .. }))
        .map(|child| Value::Object(serialize_entity(world, child, compress)))
        .collect();
    if !children.is_empty() || matches!(entity.kind, ObjectKind::Movable { .. } | ObjectKind::Room(_)) {
        m.insert("contents".into(), Value::Array(children));
    }

    match &entity.kind {
        ObjectKind::Room(room) => {
            m.insert(
                "coordinates".into(),
                json!({"x": room.coordinates.x, "y": room.coordinates.y, "z": room.coordinates.z}),
            );
            m.insert("allowedExits".into(), json!(room.allowed_exits));
            m.insert("dense".into(), json!(room.dense));
        }
        ObjectKind::Prop => {}
        ObjectKind::Movable { kind, .. } => serialize_movable_kind(&mut m, kind),
    }

    if compress {
        let baseline = resolve_baseline(world, entity);
        m = compress_value(&m, &baseline);
    }

    m
}

fn serialize_movable_kind(m: &mut Map<String, Value>, kind: &MovableKind) {
    match kind {
        MovableKind::Item(item) => {
            m.insert("isContainer".into(), json!(item.is_container));
        }
        MovableKind::Currency => unreachable!("currency children are filtered before recursion"),
        MovableKind::Equipment(eq) => {
            m.insert("slot".into(), json!(eq.slot.0));
            m.insert("attributeBonuses".into(), attribute_bonuses_json(eq.attribute_bonuses));
            m.insert("secondaryAttributeBonuses".into(), secondary_bonuses_json(eq.secondary_bonuses));
            m.insert("resourceBonuses".into(), resource_bonuses_json(eq.resource_bonuses));
            match &eq.kind {
                EquipmentKind::Generic => {}
                EquipmentKind::Armor { defense } => {
                    m.insert("defense".into(), json!(defense));
                }
                EquipmentKind::Weapon {
                    attack_power,
                    hit_type,
                    weapon_type,
                } => {
                    m.insert("attackPower".into(), json!(attack_power));
                    m.insert(
                        "hitType".into(),
                        json!({"verb": hit_type.verb, "damageType": hit_type.damage_type.0}),
                    );
                    m.insert("weaponType".into(), json!(weapon_type));
                }
            }
        }
        MovableKind::Mob(mob) => {
            m.insert("race".into(), json!(mob.race));
            m.insert("job".into(), json!(mob.job));
            m.insert("level".into(), json!(mob.level));
            m.insert("experience".into(), json!(mob.experience));
            m.insert("attributeBonuses".into(), attribute_bonuses_json(mob.attribute_bonuses));
            m.insert("resourceBonuses".into(), resource_bonuses_json(mob.resource_bonuses));
            m.insert("health".into(), json!(mob.health));
            m.insert("mana".into(), json!(mob.mana));
            m.insert("exhaustion".into(), json!(mob.exhaustion));
            m.insert(
                "equipped".into(),
                Value::Object(
                    mob.equipped
                        .iter()
                        .map(|(slot, oid)| (slot.0.clone(), json!(oid)))
                        .collect(),
                ),
            );
            m.insert(
                "behaviors".into(),
                json!({
                    "aggressive": mob.behaviors.aggressive,
                    "wimpy": mob.behaviors.wimpy,
                    "wander": mob.behaviors.wander,
                    "shopkeeper": mob.behaviors.shopkeeper,
                }),
            );
            m.insert(
                "learnedAbilities".into(),
                Value::Object(
                    mob.learned_abilities
                        .iter()
                        .map(|(id, uses)| (id.clone(), json!(uses)))
                        .collect(),
                ),
            );
            let now_ms = 0; // expiry pruning happens before serialization via `service_timers`
            let effects: Vec<Value> = mob
                .active_effects
                .iter()
                .filter(|e| !e.is_archetype)
                .filter_map(|e| crate::effects::serialize_effect(e, now_ms))
                .map(|s| json!(s))
                .collect();
            m.insert("effects".into(), Value::Array(effects));
        }
    }
}

fn attribute_bonuses_json(p: crate::attributes::PrimaryAttributes) -> Value {
    json!({"strength": p.strength, "agility": p.agility, "intelligence": p.intelligence})
}

fn secondary_bonuses_json(s: crate::attributes::SecondaryAttributes) -> Value {
    json!({
        "attackPower": s.attack_power, "defense": s.defense, "critRate": s.crit_rate,
        "avoidance": s.avoidance, "accuracy": s.accuracy, "spellPower": s.spell_power,
        "resilience": s.resilience, "vitality": s.vitality, "wisdom": s.wisdom,
        "endurance": s.endurance, "spirit": s.spirit,
    })
}

fn resource_bonuses_json(r: crate::attributes::ResourceCaps) -> Value {
    json!({"maxHealth": r.max_health, "maxMana": r.max_mana})
}

fn room_ref_of(world: &World, oid: Oid) -> Option<RoomRef> {
    let entity = world.entity(oid)?;
    let room = entity.kind.as_room()?;
    let dungeon_id = entity.base.dungeon.clone()?;
    Some(RoomRef::new(dungeon_id, room.coordinates))
}

/// The baseline to diff/overlay against for `entity`: its template's cached
/// `base_serialized` if one applies, otherwise the type default.
fn resolve_baseline(world: &World, entity: &Entity) -> Map<String, Value> {
    let type_tag = entity.kind.type_tag();
    if let (Some(dungeon_id), Some(template_id)) = (&entity.base.dungeon, &entity.base.template_id) {
        if let Some(record) = world.dungeon(dungeon_id).and_then(|d| d.templates.get(template_id)) {
            if let Some(Value::Object(base)) = &record.base_serialized {
                return base.clone();
            }
        }
    }
    type_default(type_tag)
}

/// `Compress(uncompressed, templateId?)`: drops every field equal to the
/// baseline's, except the protected set. Operates on one object's own
/// scalar fields — nested `contents` entries arrive already compressed
/// against their own baselines by `serialize_entity`'s recursion.
pub fn compress_value(full: &Map<String, Value>, baseline: &Map<String, Value>) -> Map<String, Value> {
    full.iter()
        .filter(|(k, v)| PROTECTED_FIELDS.contains(&k.as_str()) || baseline.get(*k) != Some(*v))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// `Normalize(serialized)`: the inverse of `compress_value` — overlays the
/// compressed fields on top of the baseline so every field is populated.
/// Recurses into `contents`, resolving each child's own baseline by its
/// `type`/`templateId` pair via `resolve_baseline_for`.
pub fn normalize_value(world: &World, dungeon_id: &str, compressed: &Value) -> Value {
    let Value::Object(compressed_map) = compressed else {
        return compressed.clone();
    };
    let type_tag = compressed_map.get("type").and_then(|v| v.as_str()).unwrap_or("");
    let template_id = compressed_map.get("templateId").and_then(|v| v.as_str());
    let baseline = resolve_baseline_for(world, dungeon_id, type_tag, template_id);

    let mut merged = baseline;
    for (k, v) in compressed_map {
        merged.insert(k.clone(), v.clone());
    }

    if let Some(Value::Array(children)) = merged.get("contents").cloned() {
        let normalized_children: Vec<Value> = children
            .iter()
            .map(|c| normalize_value(world, dungeon_id, c))
            .collect();
        merged.insert("contents".into(), Value::Array(normalized_children));
    }

    Value::Object(merged)
}

fn resolve_baseline_for(world: &World, dungeon_id: &str, type_tag: &str, template_id: Option<&str>) -> Map<String, Value> {
    if let Some(template_id) = template_id {
        if let Some(record) = world.dungeon(dungeon_id).and_then(|d| d.templates.get(template_id)) {
            if let Some(Value::Object(base)) = &record.base_serialized {
                return base.clone();
            }
        }
    }
    type_default(type_tag)
}

/// `CreateTemplate(obj)`: serializes `oid` fully, strips the fields a
/// template never carries (`contents`, `location`, `oid`), and diffs the
/// remainder against the type default — the override set a reset/spawn
/// applies on top of a fresh instance. The full (undiffed) serialization is
/// cached as `base_serialized`, the compression baseline for instances
/// sharing this template.
pub fn create_template(world: &World, oid: Oid, template_id: impl Into<String>) -> WorldResult<TemplateRecord> {
    let full = serialize_object(world, oid, false)?;
    let Value::Object(mut full_map) = full else {
        unreachable!("serialize_object always returns an object");
    };
    let type_tag = full_map.get("type").and_then(|v| v.as_str()).unwrap_or("").to_string();

    let base_serialized = Value::Object(full_map.clone());

    for field in ["contents", "location", "oid"] {
        full_map.remove(field);
    }
    let baseline = type_default(&type_tag);
    let diffed = compress_value(&full_map, &baseline);

    Ok(TemplateRecord {
        id: template_id.into(),
        type_tag,
        fields: Value::Object(diffed),
        base_serialized: Some(base_serialized),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::object::Entity;
    use crate::testkit;

    #[test]
    fn serializing_currency_directly_is_an_error() {
        let mut world = testkit::fresh_world();
        let coin_oid = world.mint_oid();
        world.insert(Entity::new_currency(coin_oid, "coin", "a coin", 1.0));
        assert_eq!(
            serialize_object(&world, coin_oid, false),
            Err(WorldError::SerializeCurrency(format!("oid {coin_oid}")))
        );
    }

    #[test]
    fn currency_in_contents_is_silently_omitted() {
        let mut world = testkit::fresh_world();
        let bag_oid = world.mint_oid();
        world.insert(Entity::new_item(bag_oid, "bag", "a bag", true));
        let coin_oid = world.mint_oid();
        world.insert(Entity::new_currency(coin_oid, "coin", "a coin", 1.0));
        crate::containment::move_object(&mut world, coin_oid, Some(bag_oid));

        let serialized = serialize_object(&world, bag_oid, false).unwrap();
        assert_eq!(serialized["contents"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn compress_then_normalize_round_trips_against_type_default() {
        let mut world = testkit::fresh_world();
        let room_oid = world.mint_oid();
        world.insert(Entity::new_room(room_oid, crate::ids::Coordinate::new(1, 2, 0)));
        world.entity_mut(room_oid).unwrap().base.dungeon = Some("d".to_string());
        world.ensure_dungeon("d");

        let full = serialize_object(&world, room_oid, false).unwrap();
        let compressed = serialize_object(&world, room_oid, true).unwrap();
        let normalized = normalize_value(&world, "d", &compressed);
        assert_eq!(normalized["allowedExits"], full["allowedExits"]);
        assert_eq!(normalized["dense"], full["dense"]);
        assert_eq!(normalized["type"], full["type"]);
    }

    #[test]
    fn create_template_diffs_out_type_defaults() {
        let mut world = testkit::fresh_world();
        let sword_oid = world.mint_oid();
        let equipment = crate::model::object::EquipmentData {
            slot: crate::model::types::EquipSlot::new("mainHand"),
            kind: EquipmentKind::Weapon {
                attack_power: 5.0,
                hit_type: crate::model::types::HitType {
                    verb: "slash".into(),
                    damage_type: crate::model::types::DamageType::new("physical"),
                },
                weapon_type: "sword".into(),
            },
            attribute_bonuses: Default::default(),
            secondary_bonuses: Default::default(),
            resource_bonuses: Default::default(),
        };
        world.insert(Entity::new_equipment(sword_oid, "sword", "a sword", equipment));

        let record = create_template(&world, sword_oid, "sword-basic").unwrap();
        assert_eq!(record.id, "sword-basic");
        assert_eq!(record.type_tag, "Weapon");
        assert!(record.fields.get("contents").is_none());
        assert!(record.fields.get("oid").is_none());
        assert_eq!(record.fields["attackPower"], json!(5.0));
    }
}
