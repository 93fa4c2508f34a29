//! Resets (C9): the template-driven respawn rules that keep a dungeon
//! populated, plus `Dungeon::execute_resets`, which walks every rule and
//! broadcasts the dungeon's reset message.

use crate::ids::{Coordinate, Oid};
use crate::model::object::ResetRef;
use crate::ports::ObjectFactory;
use crate::registry::World;
use serde::{Deserialize, Serialize};

/// One respawn rule: maintain `min_count..=max_count` live instances of
/// `template_id` at `room_coordinates`, with optional starting equipment and
/// inventory. `spawned` is runtime-only — it's rebuilt by re-executing the
/// reset, never serialized as part of content data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reset {
    pub template_id: String,
    pub room_coordinates: Coordinate,
    pub min_count: usize,
    pub max_count: usize,
    pub equipped: Vec<String>,
    pub inventory: Vec<String>,
    #[serde(skip)]
    pub spawned: Vec<Oid>,
}

impl Reset {
    pub fn new(
        template_id: impl Into<String>,
        room_coordinates: Coordinate,
        min_count: usize,
        max_count: usize,
    ) -> Self {
        Reset {
            template_id: template_id.into(),
            room_coordinates,
            min_count,
            max_count,
            equipped: Vec::new(),
            inventory: Vec::new(),
            spawned: Vec::new(),
        }
    }
}

/// Resolves `template_id` against the dungeon's local templates first, then
/// falls back to the template's own dungeon for a globalized id
/// (`@dungeon:templateId`). Returns `None` (caller logs `UnknownTemplate`)
/// when neither resolves.
fn resolve_template(world: &World, dungeon_id: &str, template_id: &str) -> Option<crate::ports::Template> {
    match crate::ids::TemplateRef::parse(template_id) {
        crate::ids::TemplateRef::Local(id) => crate::serialize::lookup_template(world, dungeon_id, &id),
        crate::ids::TemplateRef::Global {
            dungeon_id: other_dungeon,
            template_id: id,
        } => crate::serialize::lookup_template(world, &other_dungeon, &id),
    }
}

/// `Reset.Execute(templateRegistry, createFn)`: tops off the live count at
/// `room_coordinates` up to `min_count` (never exceeding `max_count`),
/// wiring `spawned_by_reset` on each new object and, for mobs, spawning and
/// attaching `equipped[]`/`inventory[]` templates. Returns the number of
/// top-level objects spawned (not counting equipment/inventory).
pub fn execute(
    world: &mut World,
    dungeon_id: &str,
    reset_index: usize,
    factory: &mut dyn ObjectFactory,
) -> usize {
    let Some((template_id, coords, min_count, max_count, equipped, inventory, live_count)) = ({
        let dungeon = world.dungeon(dungeon_id);
        dungeon.and_then(|d| d.reset_schedule.get(reset_index)).map(|r| {
            // `destroy` prunes a killed spawn from this list via
            // `clear_reset_tracking`, so its length is always the live
            // count — no need to re-check existence here.
            (
                r.template_id.clone(),
                r.room_coordinates,
                r.min_count,
                r.max_count,
                r.equipped.clone(),
                r.inventory.clone(),
                r.spawned.len(),
            )
        })
    }) else {
        world
            .logger
            .warn(&format!("resets: no such reset {dungeon_id}[{reset_index}]"));
        return 0;
    };

    let Some(room_oid) = world.dungeon(dungeon_id).and_then(|d| d.room_at(coords)) else {
        world
            .logger
            .warn(&format!("resets: unknown room {dungeon_id}@{coords}"));
        return 0;
    };

    if live_count >= max_count {
        return 0;
    }
    let to_spawn = min_count.saturating_sub(live_count).min(max_count - live_count);
    if to_spawn == 0 {
        return 0;
    }

    let Some(template) = resolve_template(world, dungeon_id, &template_id) else {
        world
            .logger
            .warn(&format!("resets: unknown template {template_id:?}"));
        return 0;
    };

    let mut spawned_count = 0;
    for _ in 0..to_spawn {
        let oid = world.mint_oid();
        let entity = factory.create_from_template(&template, Some(oid));
        let is_mob = entity.kind.as_mob().is_some();
        world.insert(entity);

        // Place the object before wiring its reset back-pointer: `attach`
        // clears `spawned_by_reset` on a non-mob's first move (§4.1(d)), so
        // setting the pointer beforehand would have it wiped by this very
        // placement. Setting it only after the move leaves initial
        // placement untouched and tracking intact.
        crate::containment::move_object(world, oid, Some(room_oid));
        let reset_ref = ResetRef {
            dungeon_id: dungeon_id.to_string(),
            reset_index,
        };
        if let Some(e) = world.entity_mut(oid) {
            e.base.spawned_by_reset = Some(reset_ref);
        }
        if let Some(dungeon) = world.dungeon_mut(dungeon_id) {
            if let Some(reset) = dungeon.reset_schedule.get_mut(reset_index) {
                reset.spawned.push(oid);
            }
        }
        spawned_count += 1;

        if is_mob {
            spawn_equipment_and_inventory(world, dungeon_id, oid, &equipped, &inventory, factory);
        }
    }

    spawned_count
}

/// For a freshly-spawned mob: spawns each `equipped[]` template and equips
/// it (validating it's actually an equipment template — §7's
/// `InvalidTemplateTypeForSlot` skips and warns rather than failing the
/// whole reset), then spawns each `inventory[]` template directly into the
/// mob's contents.
fn spawn_equipment_and_inventory(
    world: &mut World,
    dungeon_id: &str,
    mob_oid: Oid,
    equipped: &[String],
    inventory: &[String],
    factory: &mut dyn ObjectFactory,
) {
    for template_id in equipped {
        let Some(template) = resolve_template(world, dungeon_id, template_id) else {
            world
                .logger
                .warn(&format!("resets: unknown equipped template {template_id:?}"));
            continue;
        };
        let oid = world.mint_oid();
        let entity = factory.create_from_template(&template, Some(oid));
        let is_equipment = matches!(
            &entity.kind,
            crate::model::object::ObjectKind::Movable {
                kind: crate::model::object::MovableKind::Equipment(_),
                ..
            }
        );
        if !is_equipment {
            world.logger.warn(&format!(
                "resets: template {template_id:?} is not equipment, skipping equipped entry"
            ));
            continue;
        }
        world.insert(entity);
        crate::containment::move_object(world, oid, Some(mob_oid));
        crate::mob::equip(world, mob_oid, oid);
    }

    for template_id in inventory {
        let Some(template) = resolve_template(world, dungeon_id, template_id) else {
            world
                .logger
                .warn(&format!("resets: unknown inventory template {template_id:?}"));
            continue;
        };
        let oid = world.mint_oid();
        let entity = factory.create_from_template(&template, Some(oid));
        world.insert(entity);
        crate::containment::move_object(world, oid, Some(mob_oid));
    }
}

/// `Dungeon.ExecuteResets`: runs every rule in the dungeon's schedule in
/// order, summing spawn counts, and returns the total. Broadcasting
/// `reset_message` is the caller's responsibility (it needs a `Sink` and the
/// list of present player-controlled mobs, neither of which this crate
/// owns) — callers check `dungeon.reset_message` themselves after a nonzero
/// total.
pub fn execute_all(world: &mut World, dungeon_id: &str, factory: &mut dyn ObjectFactory) -> usize {
    let count = world.dungeon(dungeon_id).map(|d| d.reset_schedule.len()).unwrap_or(0);
    let mut total = 0;
    for index in 0..count {
        total += execute(world, dungeon_id, index, factory);
    }
    total
}
