//! Containment graph operations (C3): attach/detach with weight and dungeon
//! propagation, move, destroy, and reset-tracking cleanup.
//!
//! The data the graph is built from (`ObjectBase::location`/`contents`,
//! `dungeon`, `spawned_by_reset`) lives in `crate::model::object`; this
//! module is the only place that mutates those fields together, so the
//! invariants in `spec.md` §3 stay in lockstep.

use crate::ids::Oid;
use crate::model::object::ResetRef;
use crate::registry::World;

/// `Contains(child)`: direct membership only.
pub fn contains(world: &World, parent_oid: Oid, child_oid: Oid) -> bool {
    world
        .entity(parent_oid)
        .map(|e| e.base.contents.contains(&child_oid))
        .unwrap_or(false)
}

/// Adds `child_oid` to `parent_oid`'s contents: idempotent on duplicates,
/// maintains the `location` back-pointer, propagates weight and dungeon,
/// and clears reset-tracking per §4.1(d)/invariant 5: Items lose the
/// back-pointer the first time they change hands at all, but a Mob keeps it
/// across ordinary room-to-room moves and only loses it when it actually
/// crosses into a different dungeon (a wandering reset mob must stay
/// tracked within its own dungeon).
///
/// Does not detach `child_oid` from any prior parent — callers that are
/// reparenting use `move_object`, which sequences detach before attach.
fn attach(world: &mut World, parent_oid: Oid, child_oid: Oid) {
    let already_contained = contains(world, parent_oid, child_oid);
    if already_contained {
        return;
    }

    if let Some(parent) = world.entity_mut(parent_oid) {
        parent.base.contents.push(child_oid);
    } else {
        return;
    }
    if let Some(child) = world.entity_mut(child_oid) {
        child.base.location = Some(parent_oid);
    }

    let delta = world.entity(child_oid).map(|e| e.base.current_weight).unwrap_or(0.0);
    propagate_weight_delta(world, parent_oid, delta);

    let old_dungeon = world.entity(child_oid).and_then(|e| e.base.dungeon.clone());
    let parent_dungeon = world.entity(parent_oid).and_then(|e| e.base.dungeon.clone());
    set_dungeon_recursive(world, child_oid, parent_dungeon.clone());

    let is_mob = world
        .entity(child_oid)
        .map(|e| e.kind.as_mob().is_some())
        .unwrap_or(false);
    if is_mob {
        let crossed_dungeons = old_dungeon.is_some() && old_dungeon != parent_dungeon;
        if crossed_dungeons {
            clear_reset_tracking(world, child_oid);
        }
    } else {
        clear_reset_tracking(world, child_oid);
    }
    sync_movable_room_cache(world, child_oid);
}

/// Removes `child_oid` from `parent_oid`'s contents, if present; clears the
/// `location` back-pointer and propagates the weight delta upward. Does not
/// touch the child's dungeon (callers re-home it via `attach` or
/// `set_dungeon_recursive` as appropriate).
fn detach(world: &mut World, parent_oid: Oid, child_oid: Oid) {
    let was_contained = contains(world, parent_oid, child_oid);
    if !was_contained {
        return;
    }

    if let Some(parent) = world.entity_mut(parent_oid) {
        parent.base.contents.retain(|&o| o != child_oid);
    }
    if let Some(child) = world.entity_mut(child_oid) {
        child.base.location = None;
    }

    let delta = world.entity(child_oid).map(|e| e.base.current_weight).unwrap_or(0.0);
    propagate_weight_delta(world, parent_oid, -delta);
    sync_movable_room_cache(world, child_oid);
}

/// Movable's cached room coordinates (§3: "caches its room's coordinates
/// when nested in a Room"), kept in lockstep with `ObjectBase::location` by
/// `attach`/`detach` rather than trusted to callers. `None` whenever the
/// object isn't directly inside a Room (nested in a container, or
/// parentless).
fn sync_movable_room_cache(world: &mut World, oid: Oid) {
    let coords = world
        .entity(oid)
        .and_then(|e| e.base.location)
        .and_then(|loc| world.entity(loc))
        .and_then(|e| e.kind.as_room())
        .map(|r| r.coordinates);
    if let Some(entity) = world.entity_mut(oid) {
        if let crate::model::object::ObjectKind::Movable { cache, .. } = &mut entity.kind {
            cache.room_coordinates = coords;
        }
    }
}

/// Adds `delta` to `oid`'s `current_weight` and every ancestor's, stopping at
/// a detached (parentless) root. Tolerates a detached root by simply doing
/// nothing past it.
fn propagate_weight_delta(world: &mut World, oid: Oid, delta: f64) {
    if delta == 0.0 {
        return;
    }
    let mut current = Some(oid);
    while let Some(cur) = current {
        let Some(entity) = world.entity_mut(cur) else { break };
        entity.base.current_weight += delta;
        current = entity.base.location;
    }
}

/// Sets `oid`'s dungeon and recurses into every transitive child, matching
/// invariant 2. Passing `None` unassigns recursively (dungeon destruction,
/// or detaching a subtree to nowhere).
pub fn set_dungeon_recursive(world: &mut World, oid: Oid, dungeon_id: Option<String>) {
    let Some(entity) = world.entity_mut(oid) else { return };
    entity.base.dungeon = dungeon_id.clone();
    let children = entity.base.contents.clone();
    for child in children {
        set_dungeon_recursive(world, child, dungeon_id.clone());
    }
}

/// Clears `spawned_by_reset` on `oid`, and removes `oid` from the owning
/// reset's `spawned` list, the first time its location changes (invariant
/// 5). A no-op if the object was never reset-tracked.
fn clear_reset_tracking(world: &mut World, oid: Oid) {
    let Some(reset_ref) = world.entity(oid).and_then(|e| e.base.spawned_by_reset.clone()) else {
        return;
    };
    if let Some(entity) = world.entity_mut(oid) {
        entity.base.spawned_by_reset = None;
    }
    untrack_reset_spawn(world, &reset_ref, oid);
}

fn untrack_reset_spawn(world: &mut World, reset_ref: &ResetRef, oid: Oid) {
    if let Some(dungeon) = world.dungeon_mut(&reset_ref.dungeon_id) {
        if let Some(reset) = dungeon.reset_schedule.get_mut(reset_ref.reset_index) {
            reset.spawned.retain(|&o| o != oid);
        }
    }
}

/// `Move(newParent|none)`: detaches from the current parent (if any) and
/// attaches to `new_parent`, or leaves the object parentless when `None`.
/// Reset-tracking clears on the first move regardless of destination.
pub fn move_object(world: &mut World, oid: Oid, new_parent: Option<Oid>) {
    let old_parent = world.entity(oid).and_then(|e| e.base.location);
    if old_parent == new_parent {
        return;
    }

    if let Some(parent) = old_parent {
        detach(world, parent, oid);
    }

    match new_parent {
        Some(parent) => attach(world, parent, oid),
        None => {
            set_dungeon_recursive(world, oid, None);
            clear_reset_tracking(world, oid);
        }
    }
}

/// Recursively destroys `oid`: detaches from its parent and dungeon, clears
/// its reset back-reference, destroys every child, releases any equipment
/// slot referencing it, clears its character back-reference, stops its
/// threat timer by dropping it from every registry, and blanks `display` to
/// a sentinel. Idempotent — destroying an already-destroyed object is a
/// no-op.
pub fn destroy(world: &mut World, oid: Oid) {
    let already_destroyed = world.entity(oid).map(|e| e.base.destroyed).unwrap_or(true);
    if already_destroyed {
        return;
    }

    let children = world.entity(oid).map(|e| e.base.contents.clone()).unwrap_or_default();
    for child in children {
        destroy(world, child);
    }

    let parent = world.entity(oid).and_then(|e| e.base.location);
    if let Some(parent) = parent {
        detach(world, parent, oid);
    }
    unequip_everywhere(world, oid);
    clear_reset_tracking(world, oid);
    world.remove_from_membership_sets(oid);

    if let Some(entity) = world.entity_mut(oid) {
        entity.base.location = None;
        entity.base.dungeon = None;
        entity.base.destroyed = true;
        entity.base.display = "[destroyed]".to_string();
        if let Some(mob) = entity.kind.as_mob_mut() {
            mob.character_ref = None;
            mob.combat_target = None;
            mob.threat_table = None;
        }
    }
}

/// Drops `item_oid` from every mob's equipment slot map that references it.
/// Destruction never leaves a dangling equipped-slot entry pointing at a
/// destroyed item.
fn unequip_everywhere(world: &mut World, item_oid: Oid) {
    let mob_oids: Vec<Oid> = world.all_oids();
    for mob_oid in mob_oids {
        if let Some(mob) = world.entity_mut(mob_oid).and_then(|e| e.kind.as_mob_mut()) {
            mob.equipped.retain(|_, &mut oid| oid != item_oid);
        }
    }
}

/// Dungeon destruction (§3 Lifecycle): removes every room link touching one
/// of the dungeon's rooms, unassigns the dungeon field on every object that
/// pointed at it (rooms included, without destroying them), and empties the
/// grid. Leaves the `Dungeon` entry itself in the registry at zero rooms —
/// callers that want the id fully forgotten remove it from `world.dungeons`
/// separately.
pub fn destroy_dungeon(world: &mut World, dungeon_id: &str) {
    let room_oids: Vec<Oid> = world
        .dungeon(dungeon_id)
        .map(|d| d.rooms.values().copied().collect())
        .unwrap_or_default();

    let link_indices: Vec<usize> = world
        .room_links
        .iter()
        .enumerate()
        .filter(|(_, l)| room_oids.contains(&l.from_room) || room_oids.contains(&l.to_room))
        .map(|(i, _)| i)
        .collect();
    for index in link_indices.into_iter().rev() {
        crate::grid::remove_link(world, index);
    }

    for oid in world.dungeon_contents(dungeon_id) {
        if let Some(entity) = world.entity_mut(oid) {
            entity.base.dungeon = None;
        }
    }

    if let Some(dungeon) = world.dungeon_mut(dungeon_id) {
        dungeon.rooms.clear();
    }
}

/// Sets `base_weight` and repropagates the resulting `current_weight` delta
/// upward. A setup/test helper — gameplay code constructs objects with
/// `base_weight` already in place.
pub fn set_base_weight(world: &mut World, oid: Oid, new_base_weight: f64) {
    let Some(entity) = world.entity_mut(oid) else { return };
    let delta = new_base_weight - entity.base.base_weight;
    entity.base.base_weight = new_base_weight;
    entity.base.current_weight += delta;
    let parent = entity.base.location;
    if let Some(parent) = parent {
        propagate_weight_delta(world, parent, delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::object::Entity;
    use crate::testkit;

    fn epsilon_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn weight_propagates_through_nested_containers() {
        let mut world = testkit::fresh_world();
        let chest_oid = world.mint_oid();
        let mut chest = Entity::new_item(chest_oid, "chest", "a chest", true);
        chest.base.base_weight = 5.0;
        chest.base.current_weight = 5.0;
        world.insert(chest);

        let pouch_oid = world.mint_oid();
        let mut pouch = Entity::new_item(pouch_oid, "pouch", "a pouch", true);
        pouch.base.base_weight = 1.0;
        pouch.base.current_weight = 1.0;
        world.insert(pouch);
        move_object(&mut world, pouch_oid, Some(chest_oid));

        let coin_oid = world.mint_oid();
        let mut coin = Entity::new_currency(coin_oid, "coin", "a coin", 1.0);
        coin.base.base_weight = 0.1;
        coin.base.current_weight = 0.1;
        world.insert(coin);
        move_object(&mut world, coin_oid, Some(pouch_oid));

        assert!(epsilon_eq(world.entity(chest_oid).unwrap().base.current_weight, 6.1));

        let room_oid = world.mint_oid();
        world.insert(Entity::new_room(room_oid, crate::ids::Coordinate::new(0, 0, 0)));
        move_object(&mut world, coin_oid, Some(room_oid));

        assert!(epsilon_eq(world.entity(chest_oid).unwrap().base.current_weight, 6.0));
        assert!(epsilon_eq(world.entity(pouch_oid).unwrap().base.current_weight, 1.0));
    }

    #[test]
    fn move_sets_location_and_membership_together() {
        let mut world = testkit::fresh_world();
        let room_oid = world.mint_oid();
        world.insert(Entity::new_room(room_oid, crate::ids::Coordinate::new(0, 0, 0)));
        let rock_oid = world.mint_oid();
        world.insert(Entity::new_prop(rock_oid, "rock", "a rock"));

        move_object(&mut world, rock_oid, Some(room_oid));
        assert_eq!(world.entity(rock_oid).unwrap().base.location, Some(room_oid));
        assert!(contains(&world, room_oid, rock_oid));

        move_object(&mut world, rock_oid, None);
        assert_eq!(world.entity(rock_oid).unwrap().base.location, None);
        assert!(!contains(&world, room_oid, rock_oid));
    }

    #[test]
    fn moving_clears_reset_tracking() {
        let mut world = testkit::fresh_world();
        let room_oid = world.mint_oid();
        world.insert(Entity::new_room(room_oid, crate::ids::Coordinate::new(0, 0, 0)));
        let item_oid = world.mint_oid();
        let mut item = Entity::new_item(item_oid, "sword", "a sword", false);
        item.base.spawned_by_reset = Some(ResetRef {
            dungeon_id: "d".into(),
            reset_index: 0,
        });
        world.insert(item);

        move_object(&mut world, item_oid, Some(room_oid));
        assert!(world.entity(item_oid).unwrap().base.spawned_by_reset.is_none());
    }

    #[test]
    fn mob_reset_tracking_survives_room_moves_but_not_dungeon_changes() {
        let mut world = testkit::fresh_world();
        let room_a = world.mint_oid();
        let mut a = Entity::new_room(room_a, crate::ids::Coordinate::new(0, 0, 0));
        a.base.dungeon = Some("midgar".into());
        world.insert(a);
        let room_b = world.mint_oid();
        let mut b = Entity::new_room(room_b, crate::ids::Coordinate::new(1, 0, 0));
        b.base.dungeon = Some("midgar".into());
        world.insert(b);
        let room_other_dungeon = world.mint_oid();
        let mut c = Entity::new_room(room_other_dungeon, crate::ids::Coordinate::new(0, 0, 0));
        c.base.dungeon = Some("other".into());
        world.insert(c);

        let mob_oid = world.mint_oid();
        let mut mob = Entity::new_mob(mob_oid, "goblin", "a goblin", crate::model::mob::MobData::new("default", "default", 1));
        mob.base.dungeon = Some("midgar".into());
        mob.base.spawned_by_reset = Some(ResetRef {
            dungeon_id: "midgar".into(),
            reset_index: 0,
        });
        world.insert(mob);

        // Wandering between two rooms in its own dungeon keeps the tracking.
        move_object(&mut world, mob_oid, Some(room_a));
        assert!(world.entity(mob_oid).unwrap().base.spawned_by_reset.is_some());
        move_object(&mut world, mob_oid, Some(room_b));
        assert!(world.entity(mob_oid).unwrap().base.spawned_by_reset.is_some());

        // Crossing into a different dungeon clears it (invariant 5).
        move_object(&mut world, mob_oid, Some(room_other_dungeon));
        assert!(world.entity(mob_oid).unwrap().base.spawned_by_reset.is_none());
    }

    #[test]
    fn destroy_is_idempotent_and_recursive() {
        let mut world = testkit::fresh_world();
        let bag_oid = world.mint_oid();
        world.insert(Entity::new_item(bag_oid, "bag", "a bag", true));
        let coin_oid = world.mint_oid();
        world.insert(Entity::new_currency(coin_oid, "coin", "a coin", 1.0));
        move_object(&mut world, coin_oid, Some(bag_oid));

        destroy(&mut world, bag_oid);
        assert!(world.entity(bag_oid).unwrap().base.destroyed);
        assert!(world.entity(coin_oid).unwrap().base.destroyed);

        destroy(&mut world, bag_oid);
        assert!(world.entity(bag_oid).unwrap().base.destroyed);
    }

    #[test]
    fn movable_cache_tracks_room_coordinates_only_when_directly_nested() {
        let mut world = testkit::fresh_world();
        let coord = crate::ids::Coordinate::new(2, 3, 0);
        let room_oid = world.mint_oid();
        world.insert(Entity::new_room(room_oid, coord));
        let bag_oid = world.mint_oid();
        world.insert(Entity::new_item(bag_oid, "bag", "a bag", true));
        let coin_oid = world.mint_oid();
        world.insert(Entity::new_currency(coin_oid, "coin", "a coin", 1.0));

        move_object(&mut world, bag_oid, Some(room_oid));
        let cache = |w: &World, oid: Oid| match &w.entity(oid).unwrap().kind {
            crate::model::object::ObjectKind::Movable { cache, .. } => cache.room_coordinates,
            _ => None,
        };
        assert_eq!(cache(&world, bag_oid), Some(coord));

        move_object(&mut world, coin_oid, Some(bag_oid));
        assert_eq!(cache(&world, coin_oid), None);

        move_object(&mut world, bag_oid, None);
        assert_eq!(cache(&world, bag_oid), None);
    }

    #[test]
    fn dungeon_propagates_into_new_parent() {
        let mut world = testkit::fresh_world();
        let room_oid = world.mint_oid();
        let mut room = Entity::new_room(room_oid, crate::ids::Coordinate::new(0, 0, 0));
        room.base.dungeon = Some("midgar".to_string());
        world.insert(room);

        let bag_oid = world.mint_oid();
        world.insert(Entity::new_item(bag_oid, "bag", "a bag", true));
        let coin_oid = world.mint_oid();
        world.insert(Entity::new_currency(coin_oid, "coin", "a coin", 1.0));
        move_object(&mut world, coin_oid, Some(bag_oid));
        move_object(&mut world, bag_oid, Some(room_oid));

        assert_eq!(world.entity(bag_oid).unwrap().base.dungeon.as_deref(), Some("midgar"));
        assert_eq!(world.entity(coin_oid).unwrap().base.dungeon.as_deref(), Some("midgar"));
    }
}
