//! Spatial grid and room links (C4): 3D room allocation within a dungeon,
//! cardinal/diagonal stepping, and the link records that override the
//! default grid adjacency.

use crate::direction::Direction;
use crate::ids::{Coordinate, Oid};
use crate::registry::{RoomLink, World};

/// Instantiates every cell of a dungeon's grid as an empty room. Any
/// previously-allocated rooms in the range are left untouched (idempotent
/// on an already-generated dungeon).
pub fn generate_rooms(world: &mut World, dungeon_id: &str, mint_room: impl Fn(&mut World, Coordinate) -> Oid) {
    let Some(dungeon) = world.dungeon(dungeon_id) else {
        return;
    };
    let (width, height, layers) = (dungeon.width, dungeon.height, dungeon.layers);

    for z in 0..layers {
        for y in 0..height {
            for x in 0..width {
                let coord = Coordinate::new(x, y, z);
                let exists = world.dungeon(dungeon_id).map(|d| d.rooms.contains_key(&coord)).unwrap_or(false);
                if exists {
                    continue;
                }
                let oid = mint_room(world, coord);
                if let Some(dungeon) = world.dungeon_mut(dungeon_id) {
                    dungeon.rooms.insert(coord, oid);
                }
            }
        }
    }
}

/// `CreateRoom`/`AddRoom`: bounds-checks before assignment. Out-of-range
/// coordinates return `None` without mutating anything.
pub fn add_room(world: &mut World, dungeon_id: &str, coord: Coordinate, room_oid: Oid) -> Option<()> {
    let dungeon = world.dungeon(dungeon_id)?;
    if !dungeon.in_bounds(coord) {
        return None;
    }
    world.dungeon_mut(dungeon_id)?.rooms.insert(coord, room_oid);
    Some(())
}

/// `GetStep(coord, dir)`: applies the direction's cardinal-component delta,
/// looks up the target room, and returns `None` if it's `dense` or doesn't
/// exist.
pub fn get_step(world: &World, dungeon_id: &str, coord: Coordinate, dir: Direction) -> Option<Oid> {
    let dungeon = world.dungeon(dungeon_id)?;
    let (dx, dy, dz) = dir.delta();
    let target = Coordinate::new(coord.x + dx, coord.y + dy, coord.z + dz);
    let target_oid = dungeon.room_at(target)?;
    let target_entity = world.entity(target_oid)?;
    let target_room = target_entity.kind.as_room()?;
    if target_room.dense {
        return None;
    }
    Some(target_oid)
}

/// `Room.GetStep(dir)`: links take priority over the grid, then the
/// `allowedExits` mask, then the dungeon's default grid adjacency.
pub fn room_get_step(world: &World, room_oid: Oid, dir: Direction) -> Option<Oid> {
    if let Some(dest) = link_destination_from(world, room_oid, dir) {
        let dest_is_dense = world
            .entity(dest)
            .and_then(|e| e.kind.as_room())
            .map(|r| r.dense)
            .unwrap_or(false);
        if !dest_is_dense {
            return Some(dest);
        }
        return None;
    }

    let entity = world.entity(room_oid)?;
    let room = entity.kind.as_room()?;
    if room.allowed_exits & dir.bit() == 0 {
        return None;
    }
    let dungeon_id = entity.base.dungeon.as_ref()?;
    get_step(world, dungeon_id, room.coordinates, dir)
}

/// `Room.CanExit(mover, dir)`. The `mover` parameter is accepted for parity
/// with the source's signature (subtypes may veto by mover identity) but
/// the base rule ignores it.
pub fn room_can_exit(world: &World, room_oid: Oid, _mover: Oid, dir: Direction) -> bool {
    if let Some(link) = find_outgoing_link(world, room_oid, dir) {
        let dest_is_dense = world
            .entity(link.to_room)
            .and_then(|e| e.kind.as_room())
            .map(|r| r.dense)
            .unwrap_or(false);
        return !dest_is_dense;
    }
    world
        .entity(room_oid)
        .and_then(|e| e.kind.as_room())
        .map(|r| r.allowed_exits & dir.bit() != 0)
        .unwrap_or(false)
}

/// `Room.CanEnter(mover, dir)`: false for dense rooms, true otherwise. Links
/// override entry the same way they override exit.
pub fn room_can_enter(world: &World, room_oid: Oid, _mover: Oid, _from_dir: Direction) -> bool {
    !world
        .entity(room_oid)
        .and_then(|e| e.kind.as_room())
        .map(|r| r.dense)
        .unwrap_or(true)
}

fn find_outgoing_link<'a>(world: &'a World, room_oid: Oid, dir: Direction) -> Option<&'a RoomLink> {
    world
        .room_links
        .iter()
        .find(|l| l.from_room == room_oid && l.direction == dir)
        .or_else(|| {
            world
                .room_links
                .iter()
                .find(|l| l.bidirectional && l.to_room == room_oid && l.direction.reverse() == dir)
        })
}

fn link_destination_from(world: &World, room_oid: Oid, dir: Direction) -> Option<Oid> {
    find_outgoing_link(world, room_oid, dir).map(|l| if l.from_room == room_oid { l.to_room } else { l.from_room })
}

/// Creates a `RoomLink`, registering it with the `from` room and, when
/// two-way, the `to` room as well, plus the global link registry. The
/// reverse direction is inferred from `dir`.
pub fn create_link(world: &mut World, from_room: Oid, to_room: Oid, dir: Direction, bidirectional: bool) -> usize {
    let link = RoomLink {
        from_room,
        to_room,
        direction: dir,
        bidirectional,
    };
    world.room_links.push(link);
    let index = world.room_links.len() - 1;

    if let Some(room) = world.entity_mut(from_room).and_then(|e| e.kind.as_room_mut()) {
        room.links.push(index);
    }
    if bidirectional {
        if let Some(room) = world.entity_mut(to_room).and_then(|e| e.kind.as_room_mut()) {
            room.links.push(index);
        }
    }
    index
}

/// Removes a link by index; idempotent if already removed. Un-registers
/// from both endpoints before dropping it from the global table.
pub fn remove_link(world: &mut World, index: usize) {
    if index >= world.room_links.len() {
        return;
    }
    let link = world.room_links[index].clone();
    if let Some(room) = world.entity_mut(link.from_room).and_then(|e| e.kind.as_room_mut()) {
        room.links.retain(|&i| i != index);
    }
    if let Some(room) = world.entity_mut(link.to_room).and_then(|e| e.kind.as_room_mut()) {
        room.links.retain(|&i| i != index);
    }
    world.room_links.remove(index);
    // Removing by swap would corrupt every stored index; a plain remove
    // keeps all other indices stable (linear but simple and correct).
    reindex_links_after_removal(world, index);
}

fn reindex_links_after_removal(world: &mut World, removed_index: usize) {
    // All link indices greater than `removed_index` shifted down by one in
    // `world.room_links`; update every room's stored indices to match.
    let rooms_with_links: Vec<Oid> = world
        .room_links
        .iter()
        .flat_map(|l| [l.from_room, l.to_room])
        .collect();
    for oid in rooms_with_links {
        if let Some(room) = world.entity_mut(oid).and_then(|e| e.kind.as_room_mut()) {
            for idx in room.links.iter_mut() {
                if *idx > removed_index {
                    *idx -= 1;
                }
            }
        }
    }
}

/// `GetRoomLinkDestination(link, fromRoom, dir)`: resolves the forward
/// edge, and for two-way links also the reverse edge; otherwise `None`.
pub fn link_destination(link: &RoomLink, from_room: Oid, dir: Direction) -> Option<Oid> {
    if link.from_room == from_room && link.direction == dir {
        return Some(link.to_room);
    }
    if link.bidirectional && link.to_room == from_room && link.direction.reverse() == dir {
        return Some(link.from_room);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::object::Entity;

    fn make_room(world: &mut World, dungeon_id: &str, coord: Coordinate) -> Oid {
        let oid = world.mint_oid();
        let mut room = Entity::new_room(oid, coord);
        room.base.dungeon = Some(dungeon_id.to_string());
        world.insert(room);
        add_room(world, dungeon_id, coord, oid);
        oid
    }

    #[test]
    fn get_step_follows_grid_adjacency() {
        let mut world = testkit_world();
        world.dungeons.insert("d".into(), crate::registry::Dungeon::with_bounds("d", 3, 3, 1));
        let a = make_room(&mut world, "d", Coordinate::new(1, 1, 0));
        let b = make_room(&mut world, "d", Coordinate::new(2, 1, 0));
        assert_eq!(get_step(&world, "d", Coordinate::new(1, 1, 0), Direction::East), Some(b));
        let _ = a;
    }

    #[test]
    fn links_override_grid_and_are_bidirectional() {
        let mut world = testkit_world();
        world.dungeons.insert("d".into(), crate::registry::Dungeon::with_bounds("d", 5, 5, 1));
        let a = make_room(&mut world, "d", Coordinate::new(0, 0, 0));
        let b = make_room(&mut world, "d", Coordinate::new(4, 4, 0));
        create_link(&mut world, a, b, Direction::North, true);
        assert_eq!(room_get_step(&world, a, Direction::North), Some(b));
        assert_eq!(room_get_step(&world, b, Direction::South), Some(a));
    }

    #[test]
    fn dense_room_blocks_entry() {
        let mut world = testkit_world();
        world.dungeons.insert("d".into(), crate::registry::Dungeon::with_bounds("d", 3, 3, 1));
        let a = make_room(&mut world, "d", Coordinate::new(1, 1, 0));
        let b = make_room(&mut world, "d", Coordinate::new(2, 1, 0));
        if let Some(room) = world.entity_mut(b).and_then(|e| e.kind.as_room_mut()) {
            room.dense = true;
        }
        assert_eq!(get_step(&world, "d", Coordinate::new(1, 1, 0), Direction::East), None);
        assert!(!room_can_enter(&world, b, a, Direction::East));
    }

    fn testkit_world() -> World {
        crate::testkit::fresh_world()
    }
}
