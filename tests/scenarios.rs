//! End-to-end scenarios driving `mudcore`'s public API the way an embedder
//! would, one per illustrative walkthrough: a room-to-room step with
//! witnesses in both rooms, a link overriding grid adjacency, weight
//! propagating through nested containers, threat decaying off a table over
//! several cycles, a shield absorbing part of a hit, and a reset topping
//! off and then respawning a killed spawn.

use mudcore::combat::{self, ThreatEntry, ThreatTable};
use mudcore::config::WorldConfig;
use mudcore::containment;
use mudcore::direction::Direction;
use mudcore::effects::{self, EffectTemplate, EffectTemplateVariant};
use mudcore::grid;
use mudcore::ids::Coordinate;
use mudcore::mob;
use mudcore::model::mob::MobData;
use mudcore::model::object::Entity;
use mudcore::model::types::DamageType;
use mudcore::movement::{self, StepScripts};
use mudcore::ports::{AiEventSink, ObjectFactory, RoomEvent, Template};
use mudcore::registry::{Dungeon, World};
use mudcore::resets::Reset;
use mudcore::serialize::TemplateRecord;
use mudcore::testkit::{self, RecordingSink};
use mudcore::Oid;

struct NoopAi;
impl AiEventSink for NoopAi {
    fn publish(&mut self, _observer: Oid, _subject: Oid, _event: RoomEvent, _dir: Option<Direction>) {}
}

fn place_room(world: &mut World, dungeon_id: &str, coord: Coordinate) -> Oid {
    let oid = world.mint_oid();
    let mut room = Entity::new_room(oid, coord);
    room.base.dungeon = Some(dungeon_id.to_string());
    world.insert(room);
    grid::add_room(world, dungeon_id, coord, oid);
    oid
}

fn place_mob(world: &mut World, dungeon_id: &str, room_oid: Oid, named: &str) -> Oid {
    let oid = world.mint_oid();
    let mut mob = Entity::new_mob(oid, named, format!("a {named}"), MobData::new("default", "default", 1));
    mob.base.location = Some(room_oid);
    mob.base.dungeon = Some(dungeon_id.to_string());
    world.insert(mob);
    world.entity_mut(room_oid).unwrap().base.contents.push(oid);
    oid
}

/// A mover steps from room A to room B; residents of both rooms see a
/// message, and the mover ends up located in B.
#[test]
fn basic_move_broadcasts_to_both_rooms() {
    let mut world = testkit::fresh_world();
    let dungeon_id = "start".to_string();
    world.dungeons.insert(dungeon_id.clone(), Dungeon::with_bounds(&dungeon_id, 3, 3, 1));
    let room_a = place_room(&mut world, &dungeon_id, Coordinate::new(1, 1, 0));
    let room_b = place_room(&mut world, &dungeon_id, Coordinate::new(1, 0, 0));

    let mover = place_mob(&mut world, &dungeon_id, room_a, "traveler");
    let witness_a = place_mob(&mut world, &dungeon_id, room_a, "onlooker");
    let witness_b = place_mob(&mut world, &dungeon_id, room_b, "sentry");

    let mut sink = RecordingSink::default();
    let mut ai = NoopAi;
    let moved = movement::step(&mut world, mover, Direction::North, &mut sink, &mut ai, StepScripts::default());

    assert!(moved);
    assert_eq!(world.entity(mover).unwrap().base.location, Some(room_b));
    assert!(sink
        .sent
        .iter()
        .any(|(target, text, _)| *target == witness_a && text.contains("leaves to the north")));
    assert!(sink
        .sent
        .iter()
        .any(|(target, text, _)| *target == witness_b && text.contains("arrives from the south")));
}

/// A room link overrides both the `allowedExits` mask and the default grid
/// adjacency, in both directions.
#[test]
fn room_link_overrides_allowed_exits_and_grid_adjacency() {
    let mut world = testkit::fresh_world();
    let dungeon_id = "vault".to_string();
    world.dungeons.insert(dungeon_id.clone(), Dungeon::with_bounds(&dungeon_id, 5, 5, 1));
    let room_a = place_room(&mut world, &dungeon_id, Coordinate::new(0, 0, 0));
    let room_b = place_room(&mut world, &dungeon_id, Coordinate::new(4, 4, 0));

    // Room A's grid neighbor to the north is out of bounds, and its default
    // mask still includes north — a link still wins over a plain grid miss.
    grid::create_link(&mut world, room_a, room_b, Direction::North, true);

    assert_eq!(grid::room_get_step(&world, room_a, Direction::North), Some(room_b));
    assert_eq!(grid::room_get_step(&world, room_b, Direction::South), Some(room_a));
    assert!(grid::room_can_exit(&world, room_a, room_a, Direction::North));
    assert!(grid::room_can_exit(&world, room_b, room_b, Direction::South));

    // Seal off every mask bit on A; the link still resolves because links
    // are checked first.
    world.entity_mut(room_a).unwrap().kind.as_room_mut().unwrap().allowed_exits = 0;
    assert_eq!(grid::room_get_step(&world, room_a, Direction::North), Some(room_b));
}

/// Weight propagates up through every ancestor as items are nested and
/// un-nested, and stops propagating past whichever container stays put.
#[test]
fn weight_propagates_through_chest_pouch_coin_nesting() {
    let mut world = testkit::fresh_world();
    let chest = world.mint_oid();
    let mut chest_entity = Entity::new_item(chest, "chest", "a chest", true);
    chest_entity.base.base_weight = 5.0;
    chest_entity.base.current_weight = 5.0;
    world.insert(chest_entity);

    let pouch = world.mint_oid();
    let mut pouch_entity = Entity::new_item(pouch, "pouch", "a pouch", true);
    pouch_entity.base.base_weight = 1.0;
    pouch_entity.base.current_weight = 1.0;
    world.insert(pouch_entity);
    containment::move_object(&mut world, pouch, Some(chest));

    let coin = world.mint_oid();
    let mut coin_entity = Entity::new_currency(coin, "coin", "a coin", 1.0);
    coin_entity.base.base_weight = 0.1;
    coin_entity.base.current_weight = 0.1;
    world.insert(coin_entity);
    containment::move_object(&mut world, coin, Some(pouch));

    assert_eq!(world.entity(chest).unwrap().base.current_weight, 6.1);

    let room = world.mint_oid();
    world.insert(Entity::new_room(room, Coordinate::new(0, 0, 0)));
    containment::move_object(&mut world, coin, Some(room));

    assert_eq!(world.entity(chest).unwrap().base.current_weight, 6.0);
    assert_eq!(world.entity(pouch).unwrap().base.current_weight, 1.0);
}

/// Threat decays on a fixed cycle: the current target is never touched, a
/// co-located attacker is skipped, a displaced attacker gets one grace cycle
/// before its amount starts scaling down, and it's dropped once it crosses
/// the floor.
#[test]
fn threat_table_decays_non_current_entries_over_several_cycles() {
    let mut world = testkit::fresh_world();
    let dungeon_id = "keep".to_string();
    world.dungeons.insert(dungeon_id.clone(), Dungeon::with_bounds(&dungeon_id, 3, 1, 1));
    let room_guard = place_room(&mut world, &dungeon_id, Coordinate::new(0, 0, 0));
    let room_alice = place_room(&mut world, &dungeon_id, Coordinate::new(1, 0, 0));
    let room_bob = place_room(&mut world, &dungeon_id, Coordinate::new(2, 0, 0));

    let npc = place_mob(&mut world, &dungeon_id, room_guard, "guard");
    let attacker_a = place_mob(&mut world, &dungeon_id, room_alice, "alice");
    let attacker_b = place_mob(&mut world, &dungeon_id, room_bob, "bob");

    {
        let mob = world.entity_mut(npc).unwrap().kind.as_mob_mut().unwrap();
        mob.combat_target = Some(attacker_a);
        let mut table = ThreatTable::default();
        table.decay_timer_running = true;
        table.entries.insert(attacker_a, ThreatEntry { amount: 1000.0, should_expire: false });
        table.entries.insert(attacker_b, ThreatEntry { amount: 300.0, should_expire: false });
        mob.threat_table = Some(table);
    }

    let cfg = WorldConfig::default();

    // t=10s: B gets its first grace cycle, A (current target) is untouched.
    combat::process_threat_expiration(&mut world, npc, &cfg);
    let table = world.entity(npc).unwrap().kind.as_mob().unwrap().threat_table.as_ref().unwrap();
    assert_eq!(table.entries.get(&attacker_a).unwrap().amount, 1000.0);
    assert!(table.entries.get(&attacker_b).unwrap().should_expire);
    assert_eq!(table.entries.get(&attacker_b).unwrap().amount, 300.0);

    // t=20s: B decays 300 * 0.67 = 201.
    combat::process_threat_expiration(&mut world, npc, &cfg);
    let table = world.entity(npc).unwrap().kind.as_mob().unwrap().threat_table.as_ref().unwrap();
    assert_eq!(table.entries.get(&attacker_b).unwrap().amount, 201.0);

    // t=30s: B decays 201 * 0.67 = 134 (floored).
    combat::process_threat_expiration(&mut world, npc, &cfg);
    let table = world.entity(npc).unwrap().kind.as_mob().unwrap().threat_table.as_ref().unwrap();
    assert_eq!(table.entries.get(&attacker_b).unwrap().amount, 134.0);

    // t=40s: B decays below the floor (100) and drops; A, as the current
    // target, was never a decay candidate and remains in the table.
    combat::process_threat_expiration(&mut world, npc, &cfg);
    let table = world.entity(npc).unwrap().kind.as_mob().unwrap().threat_table.as_ref().unwrap();
    assert!(table.entries.get(&attacker_b).is_none());
    assert_eq!(table.entries.get(&attacker_a).unwrap().amount, 1000.0);
}

/// A shield absorbs part of a hit up to its per-hit cap, and the rest comes
/// out of health; once its capacity is exhausted it's removed.
#[test]
fn shield_absorbs_part_of_a_hit_then_depletes() {
    let mut world = testkit::fresh_world();
    let (_d, _r, attacker) = testkit::mob_in_new_room(&mut world, "attacker", true);
    let (_d2, _r2, target) = testkit::mob_in_new_room(&mut world, "defender", true);
    mob::bootstrap(&mut world, target);
    let starting_health = world.entity(target).unwrap().kind.as_mob().unwrap().health;
    assert_eq!(starting_health, 80);

    let shield = EffectTemplate {
        id: "wardshield".into(),
        stackable: false,
        on_apply_message: None,
        on_expire_message: None,
        is_offensive: false,
        variant: EffectTemplateVariant::Shield {
            absorption: 50.0,
            absorption_rate: 0.5,
            max_absorption_per_hit: Some(20.0),
            damage_type: Some(DamageType::new("Physical")),
        },
    };
    effects::add_effect(&mut world, target, &shield, None, None, 0);

    let physical = DamageType::new("Physical");
    let outcome = combat::apply_damage(&mut world, attacker, target, 80.0, Some(&physical));

    // 80 incoming * 0.5 = 40, capped at max_absorption_per_hit = 20.
    assert_eq!(outcome.absorbed, 20.0);
    assert_eq!(outcome.health_lost, 60);
    assert_eq!(world.entity(target).unwrap().kind.as_mob().unwrap().health, starting_health - 60);

    let remaining = world.entity(target).unwrap().kind.as_mob().unwrap().active_effects[0].remaining_absorption;
    assert_eq!(remaining, Some(30.0));

    // A second, smaller hit: 10 incoming * 0.5 = 5, well under the per-hit
    // cap and the shield's remaining capacity, so only half of it is
    // absorbed and the rest comes out of health.
    let second = combat::apply_damage(&mut world, attacker, target, 10.0, Some(&physical));
    assert_eq!(second.absorbed, 5.0);
    assert_eq!(second.health_lost, 5);
    let remaining_after_second =
        world.entity(target).unwrap().kind.as_mob().unwrap().active_effects[0].remaining_absorption;
    assert_eq!(remaining_after_second, Some(25.0));
}

struct GoblinFactory;
impl ObjectFactory for GoblinFactory {
    fn create_from_template(&mut self, template: &Template, oid: Option<Oid>) -> Entity {
        let oid = oid.unwrap_or(-1);
        let mut e = Entity::new_mob(oid, "goblin", "a goblin", MobData::new("default", "default", 1));
        e.base.template_id = Some(template.template_id.clone());
        e
    }
}

/// A reset tops off to its minimum and refuses to exceed its maximum; killing
/// a spawn frees a slot that the next execution refills.
#[test]
fn reset_tops_off_then_respawns_a_killed_spawn() {
    let mut world = testkit::fresh_world();
    let dungeon_id = "camp".to_string();
    world.ensure_dungeon(&dungeon_id);
    let coord = Coordinate::new(0, 0, 0);
    let room = place_room(&mut world, &dungeon_id, coord);
    world
        .dungeon_mut(&dungeon_id)
        .unwrap()
        .templates
        .insert("goblin".to_string(), TemplateRecord::new("goblin", "Mob"));
    world
        .dungeon_mut(&dungeon_id)
        .unwrap()
        .reset_schedule
        .push(Reset::new("goblin", coord, 1, 2));

    let mut factory = GoblinFactory;

    let spawned = mudcore::resets::execute(&mut world, &dungeon_id, 0, &mut factory);
    assert_eq!(spawned, 1);
    assert_eq!(world.entity(room).unwrap().base.contents.len(), 1);

    let again = mudcore::resets::execute(&mut world, &dungeon_id, 0, &mut factory);
    assert_eq!(again, 0, "already at min_count, nothing new to spawn");

    let goblin = world.dungeon(&dungeon_id).unwrap().reset_schedule[0].spawned[0];
    containment::destroy(&mut world, goblin);

    let respawned = mudcore::resets::execute(&mut world, &dungeon_id, 0, &mut factory);
    assert_eq!(respawned, 1, "killing the only spawn frees a slot back down to min_count");
    assert_eq!(world.dungeon(&dungeon_id).unwrap().reset_schedule[0].spawned.len(), 1);
}
