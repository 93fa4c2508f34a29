//! Deterministic test fixtures (C14): fake `Clock`/`Scheduler`/`Sink`/RNG and
//! world/dungeon/mob builders, so unit and integration tests never depend on
//! wall-clock time or real randomness.

use crate::attributes::{PrimaryAttributes, ResourceCaps};
use crate::effects::EffectTemplate;
use crate::ids::{Coordinate, Oid};
use crate::model::archetype::{Ability, ArchetypeAbilityGrant, GrowthCurve, Job, ProficiencyCurve, Race};
use crate::model::mob::MobData;
use crate::model::object::Entity;
use crate::ports::{ArchetypeResolver, Clock, MessageGroup, Scheduler, Sink, TimerHandle};
use crate::registry::World;
use rand::rngs::mock::StepRng as RandStepRng;
use rand::RngCore;
use std::cell::Cell;
use std::collections::HashMap;

/// A `Clock` a test advances by hand instead of reading real time.
#[derive(Debug, Default)]
pub struct FakeClock {
    now_ms: Cell<i64>,
}

impl FakeClock {
    pub fn new(start_ms: i64) -> Self {
        FakeClock {
            now_ms: Cell::new(start_ms),
        }
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now_ms.set(self.now_ms.get() + delta_ms);
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.get()
    }
}

/// A `Scheduler` that records registrations instead of truly scheduling;
/// tests fire intervals manually by driving the owning loop.
#[derive(Debug, Default)]
pub struct FakeScheduler {
    next_handle: u64,
    pub registered: Vec<(TimerHandle, u64)>,
    pub cleared: Vec<TimerHandle>,
}

impl Scheduler for FakeScheduler {
    fn set_interval(&mut self, period_ms: u64) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.registered.push((handle, period_ms));
        handle
    }

    fn clear_interval(&mut self, handle: TimerHandle) {
        self.cleared.push(handle);
    }
}

/// Records every `Sink::send` call for assertion instead of delivering text
/// anywhere.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub sent: Vec<(Oid, String, MessageGroup)>,
}

impl Sink for RecordingSink {
    fn send(&mut self, target: Oid, text: &str, group: MessageGroup) {
        self.sent.push((target, text.to_string(), group));
    }
}

/// A deterministic RNG yielding a fixed, caller-chosen sequence (wraps
/// `rand`'s mock `StepRng`), for wimpy-flee/wander/crit-roll assertions.
pub struct StepRng(RandStepRng);

impl StepRng {
    pub fn new(initial: u64, increment: u64) -> Self {
        StepRng(RandStepRng::new(initial, increment))
    }

    /// A roll in `[0, 1)`, matching the signature combat/behavior helpers
    /// expect for injected randomness.
    pub fn roll01(&mut self) -> f64 {
        (self.0.next_u64() as f64) / (u64::MAX as f64)
    }
}

/// An in-memory race/job/ability/effect catalogue for tests — never loaded
/// from disk, just enough content to exercise the derivation pipeline.
pub struct FixtureResolver {
    races: HashMap<String, Race>,
    jobs: HashMap<String, Job>,
    abilities: HashMap<String, Ability>,
    effects: HashMap<String, EffectTemplate>,
}

impl ArchetypeResolver for FixtureResolver {
    fn resolve_race(&self, id: &str) -> Option<&Race> {
        self.races.get(id)
    }
    fn resolve_job(&self, id: &str) -> Option<&Job> {
        self.jobs.get(id)
    }
    fn resolve_ability(&self, id: &str) -> Option<&Ability> {
        self.abilities.get(id)
    }
    fn resolve_effect(&self, id: &str) -> Option<&EffectTemplate> {
        self.effects.get(id)
    }
}

fn fixture_resolver() -> FixtureResolver {
    let mut races = HashMap::new();
    races.insert(
        "default".to_string(),
        Race {
            id: "default".to_string(),
            start_primary: PrimaryAttributes {
                strength: 10.0,
                agility: 10.0,
                intelligence: 10.0,
            },
            growth_primary: PrimaryAttributes {
                strength: 1.0,
                agility: 1.0,
                intelligence: 1.0,
            },
            start_resources: ResourceCaps::default(),
            growth_resources: ResourceCaps::default(),
            archetype_abilities: vec![ArchetypeAbilityGrant {
                ability_id: "second-wind".to_string(),
                level: 2,
            }],
            level_modifier: GrowthCurve::Flat(1.0),
        },
    );

    let mut jobs = HashMap::new();
    jobs.insert(
        "default".to_string(),
        Job {
            id: "default".to_string(),
            start_primary: PrimaryAttributes::default(),
            growth_primary: PrimaryAttributes::default(),
            start_resources: ResourceCaps {
                max_health: 10.0,
                max_mana: 10.0,
            },
            growth_resources: ResourceCaps::default(),
            archetype_abilities: Vec::new(),
            level_modifier: GrowthCurve::Flat(1.0),
        },
    );

    let mut abilities = HashMap::new();
    abilities.insert(
        "second-wind".to_string(),
        Ability {
            id: "second-wind".to_string(),
            display_name: "Second Wind".to_string(),
            proficiency_curve: ProficiencyCurve::Linear { uses_to_cap: 10 },
        },
    );

    FixtureResolver {
        races,
        jobs,
        abilities,
        effects: HashMap::new(),
    }
}

/// A `World` wired with the fixture catalogue above and default config/
/// logging, ready for unit tests to populate.
pub fn fresh_world() -> World {
    World::new(Box::new(fixture_resolver()))
}

/// Creates a single-room dungeon plus one mob standing in it. `named` is
/// used as both keywords and a distinguishing part of the display string;
/// `is_player_controlled` sets a non-empty `character_ref` when true.
pub fn mob_in_new_room(world: &mut World, named: &str, is_player_controlled: bool) -> (String, Coordinate, Oid) {
    let dungeon_id = format!("{named}-dungeon");
    world.ensure_dungeon(&dungeon_id);

    let room_oid = world.mint_oid();
    let coord = Coordinate::new(0, 0, 0);
    let mut room = Entity::new_room(room_oid, coord);
    room.base.dungeon = Some(dungeon_id.clone());
    world.insert(room);
    world.dungeon_mut(&dungeon_id).unwrap().rooms.insert(coord, room_oid);

    let mut mob_data = MobData::new("default", "default", 1);
    if is_player_controlled {
        mob_data.character_ref = Some(format!("character:{named}"));
    }
    let mob_oid = world.mint_oid();
    let mut mob_entity = Entity::new_mob(mob_oid, named, format!("a {named}"), mob_data);
    mob_entity.base.location = Some(room_oid);
    mob_entity.base.dungeon = Some(dungeon_id.clone());
    world.insert(mob_entity);
    if let Some(room) = world.entity_mut(room_oid) {
        room.base.contents.push(mob_oid);
    }

    (dungeon_id, coord, mob_oid)
}

/// An empty dungeon with no rooms allocated yet, for grid/link tests.
pub fn empty_dungeon(world: &mut World, id: &str) -> String {
    world.ensure_dungeon(id);
    id.to_string()
}

/// A chain of nested item containers: `root -> child[0] -> child[1] -> ...`,
/// returning every oid from outermost to innermost.
pub fn item_chain(world: &mut World, depth: usize) -> Vec<Oid> {
    let mut oids = Vec::with_capacity(depth);
    let mut parent: Option<Oid> = None;
    for i in 0..depth {
        let oid = world.mint_oid();
        let mut entity = Entity::new_item(oid, format!("box{i}"), format!("box {i}"), true);
        entity.base.location = parent;
        world.insert(entity);
        if let Some(p) = parent {
            if let Some(parent_entity) = world.entity_mut(p) {
                parent_entity.base.contents.push(oid);
            }
        }
        oids.push(oid);
        parent = Some(oid);
    }
    oids
}
