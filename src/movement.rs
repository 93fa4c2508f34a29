//! Movement (C5): `Movable.Step`, the validated single-step transition
//! between rooms, plus the `wander` behavior that drives it from a timer
//! instead of a command.
//!
//! `step` sequences exactly as `spec.md` §4.3 describes: shopkeeper veto,
//! `CanStep`, exit hooks, reparent, enter hooks. Aggression-on-entry and
//! threat-switching-on-entry are explicitly *not* wired into `step` itself —
//! §4.3 calls those out as firing "from the command/room-event layer" — so
//! they're exposed here as standalone functions a driver calls after a
//! successful step.

use crate::direction::{Direction, ALL_DIRECTIONS};
use crate::grid;
use crate::ids::Oid;
use crate::ports::{AiEventSink, MessageGroup, RoomEvent, Sink};
use crate::registry::World;

/// Optional hook callbacks threaded through one `step` call. Collapses the
/// source's method-overload zoo (§9 design note) into a single options form:
/// an options struct with zero or more script callbacks, rather than four
/// separate `step`/`step_with_before_exit`/... entry points.
#[derive(Default)]
pub struct StepScripts<'a> {
    pub before_on_exit: Option<&'a mut dyn FnMut(&mut World, Oid, Direction)>,
    pub after_on_exit: Option<&'a mut dyn FnMut(&mut World, Oid, Direction)>,
    pub before_on_enter: Option<&'a mut dyn FnMut(&mut World, Oid, Direction)>,
    pub after_on_enter: Option<&'a mut dyn FnMut(&mut World, Oid, Direction)>,
}

/// `CanStep`: mover is in a room, a neighbor exists via `GetStep`, the
/// current room allows exit in `dir`, and the neighbor allows entry from
/// `reverse(dir)`.
pub fn can_step(world: &World, mover_oid: Oid, dir: Direction) -> bool {
    let Some(room_oid) = world.entity(mover_oid).and_then(|e| e.base.location) else {
        return false;
    };
    if world.entity(room_oid).and_then(|e| e.kind.as_room()).is_none() {
        return false;
    }
    if !grid::room_can_exit(world, room_oid, mover_oid, dir) {
        return false;
    }
    let Some(dest_oid) = grid::room_get_step(world, room_oid, dir) else {
        return false;
    };
    grid::room_can_enter(world, dest_oid, mover_oid, dir.reverse())
}

/// `Movable.Step(direction, scripts?)` (§4.3). Returns `false` with no side
/// effect for a shopkeeper mover or a failed `CanStep` check; otherwise
/// performs the full exit/reparent/enter sequence and returns `true`.
pub fn step(
    world: &mut World,
    mover_oid: Oid,
    dir: Direction,
    sink: &mut dyn Sink,
    ai: &mut dyn AiEventSink,
    mut scripts: StepScripts,
) -> bool {
    let is_shopkeeper = world
        .entity(mover_oid)
        .map(|e| e.kind.is_shopkeeper())
        .unwrap_or(false);
    if is_shopkeeper {
        return false;
    }
    if !can_step(world, mover_oid, dir) {
        return false;
    }

    let source_room = world.entity(mover_oid).and_then(|e| e.base.location).expect("can_step verified a room");
    let dest_room = grid::room_get_step(world, source_room, dir).expect("can_step verified a destination");
    let mover_display = world.entity(mover_oid).map(|e| e.base.display.clone()).unwrap_or_default();

    if let Some(cb) = scripts.before_on_exit.as_mut() {
        cb(world, mover_oid, dir);
    }
    broadcast_to_room_except(
        world,
        sink,
        source_room,
        mover_oid,
        &format!("{mover_display} leaves to the {dir}."),
    );
    room_on_exit(world, ai, source_room, mover_oid, dir);
    if let Some(cb) = scripts.after_on_exit.as_mut() {
        cb(world, mover_oid, dir);
    }

    // Reparenting via `containment::move_object` has no exit/enter hooks of
    // its own to suppress — the generic `Move` operation never fires them.
    crate::containment::move_object(world, mover_oid, Some(dest_room));

    let reverse_dir = dir.reverse();
    if let Some(cb) = scripts.before_on_enter.as_mut() {
        cb(world, mover_oid, dir);
    }
    broadcast_to_room_except(
        world,
        sink,
        dest_room,
        mover_oid,
        &format!("{mover_display} arrives from the {reverse_dir}."),
    );
    room_on_enter(world, ai, dest_room, mover_oid, reverse_dir);
    if let Some(cb) = scripts.after_on_enter.as_mut() {
        cb(world, mover_oid, dir);
    }

    true
}

fn mob_oids_in_room(world: &World, room_oid: Oid, exclude: Oid) -> Vec<Oid> {
    world
        .entity(room_oid)
        .map(|e| {
            e.base
                .contents
                .iter()
                .copied()
                .filter(|&oid| oid != exclude)
                .filter(|&oid| world.entity(oid).map(|e| e.kind.as_mob().is_some()).unwrap_or(false))
                .collect()
        })
        .unwrap_or_default()
}

fn broadcast_to_room_except(world: &World, sink: &mut dyn Sink, room_oid: Oid, exclude: Oid, text: &str) {
    for mob_oid in mob_oids_in_room(world, room_oid, exclude) {
        sink.send(mob_oid, text, MessageGroup::Info);
    }
}

/// `Room.OnExit(mover, dir)`: every other resident mob's AI observes the
/// departure.
fn room_on_exit(world: &World, ai: &mut dyn AiEventSink, room_oid: Oid, mover_oid: Oid, dir: Direction) {
    for other in mob_oids_in_room(world, room_oid, mover_oid) {
        ai.publish(other, mover_oid, RoomEvent::Exit, Some(dir));
    }
}

/// `Room.OnEnter(mover, fromDir)`: every other resident mob's AI observes
/// the arrival, and the mover itself gets the reciprocal `Sight` event
/// (§4.3: "the reciprocal to the entering... mob").
fn room_on_enter(world: &World, ai: &mut dyn AiEventSink, room_oid: Oid, mover_oid: Oid, from_dir: Direction) {
    for other in mob_oids_in_room(world, room_oid, mover_oid) {
        ai.publish(other, mover_oid, RoomEvent::Entrance, Some(from_dir));
    }
    ai.publish(mover_oid, mover_oid, RoomEvent::Sight, None);
}

/// Checks every aggressive, out-of-combat NPC resident in `room_oid` against
/// a freshly-entered player-controlled mob and initiates combat for each
/// (§4.3/§4.5: "Aggressive: on player entry, attack"). Driven by the
/// external command/room-event layer after a successful `step`, never
/// automatically from `step` itself.
pub fn trigger_aggression_on_entry(world: &mut World, room_oid: Oid, entrant_oid: Oid) {
    let is_player = world
        .entity(entrant_oid)
        .and_then(|e| e.kind.as_mob())
        .map(|m| m.is_player_controlled())
        .unwrap_or(false);
    if !is_player {
        return;
    }
    for resident in mob_oids_in_room(world, room_oid, entrant_oid) {
        let should_attack = world
            .entity(resident)
            .and_then(|e| e.kind.as_mob())
            .map(|m| m.behaviors.aggressive && !m.in_combat())
            .unwrap_or(false);
        if should_attack {
            crate::combat::initiate_combat(world, resident, entrant_oid);
        }
    }
}

/// Recomputes threat-table target-switching for every resident NPC that
/// already has `entrant_oid` in its threat table (§4.3: "when a mob enters a
/// room and is present in some resident mob's threat table, target-switching
/// is recomputed").
pub fn trigger_threat_switch_on_entry(world: &mut World, room_oid: Oid, entrant_oid: Oid) {
    for resident in mob_oids_in_room(world, room_oid, entrant_oid) {
        let tracks_entrant = world
            .entity(resident)
            .and_then(|e| e.kind.as_mob())
            .and_then(|m| m.threat_table.as_ref())
            .map(|t| t.entries.contains_key(&entrant_oid))
            .unwrap_or(false);
        if tracks_entrant {
            crate::combat::process_threat_switching(world, resident);
        }
    }
}

/// Adds or removes `mob_oid` from `wandering_mobs` depending on its current
/// `wander` behavior flag and NPC status. `MobBehaviors` is a plain data
/// struct (no setter indirection, per §9's tagged-sum design), so a driver
/// toggling `behaviors.wander` directly is expected to call this afterward
/// to keep the registry in sync — the same way `bootstrap` calls it once at
/// creation time.
pub fn sync_wandering_membership(world: &mut World, mob_oid: Oid) {
    let should_wander = world
        .entity(mob_oid)
        .and_then(|e| e.kind.as_mob())
        .map(|m| m.behaviors.wander && m.is_npc())
        .unwrap_or(false);
    if should_wander {
        world.wandering_mobs.add(mob_oid);
    } else {
        world.wandering_mobs.remove(mob_oid);
    }
}

/// One wander tick for a single member of `wandering_mobs` (§4.5: "Wander:
/// idle random movement in the host dungeon"). Picks uniformly among the
/// directions `can_step` currently allows, using caller-injected randomness
/// (§5: RNG is always injected, never drawn from global state) — `roll01`
/// is a draw in `[0, 1)`. A no-op (returns `false`) for a mob that's in
/// combat, not a wanderer, or has nowhere to go.
pub fn wander_tick(
    world: &mut World,
    mob_oid: Oid,
    sink: &mut dyn Sink,
    ai: &mut dyn AiEventSink,
    roll01: f64,
) -> bool {
    let eligible = world
        .entity(mob_oid)
        .and_then(|e| e.kind.as_mob())
        .map(|m| m.behaviors.wander && m.is_npc() && !m.in_combat())
        .unwrap_or(false);
    if !eligible {
        return false;
    }

    let viable: Vec<Direction> = ALL_DIRECTIONS
        .into_iter()
        .filter(|&dir| can_step(world, mob_oid, dir))
        .collect();
    if viable.is_empty() {
        return false;
    }
    let index = ((roll01.clamp(0.0, 0.9999_9999) * viable.len() as f64) as usize).min(viable.len() - 1);
    step(world, mob_oid, viable[index], sink, ai, StepScripts::default())
}
