//! Process-wide registries (C10): the object arena, the dungeon index, the
//! global room-link table, and the combat/regeneration/effects/wandering
//! membership sets.
//!
//! These sets are all "membership, not ownership" — an oid can live in zero
//! or more of them simultaneously, and removal never destroys the
//! underlying entity. Service loops iterate a snapshot of a set's members
//! rather than the live set, so a callback that mutates membership mid-pass
//! (e.g. a mob dying and leaving combat) never invalidates the iteration.

use crate::config::WorldConfig;
use crate::ids::{Coordinate, Oid};
use crate::logging::{LogCrateLogger, Logger};
use crate::model::object::Entity;
use crate::ports::ArchetypeResolver;
use std::collections::{HashMap, HashSet};

/// A simple ordered-insertion membership set with snapshot iteration.
#[derive(Debug, Clone, Default)]
pub struct MemberSet {
    members: HashSet<Oid>,
}

impl MemberSet {
    pub fn add(&mut self, oid: Oid) {
        self.members.insert(oid);
    }

    pub fn remove(&mut self, oid: Oid) {
        self.members.remove(&oid);
    }

    pub fn contains(&self, oid: Oid) -> bool {
        self.members.contains(&oid)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// A stable snapshot for iteration; callers may freely mutate the set
    /// while walking this.
    pub fn snapshot(&self) -> Vec<Oid> {
        let mut v: Vec<Oid> = self.members.iter().copied().collect();
        v.sort_unstable();
        v
    }
}

/// One 3D grid allocation plus the room links registered within it (C4).
#[derive(Debug, Clone, Default)]
pub struct Dungeon {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Broadcast to every player-controlled mob present when
    /// `crate::resets::execute_all` spawns at least one object.
    pub reset_message: Option<String>,
    pub rooms: HashMap<Coordinate, Oid>,
    pub reset_schedule: Vec<crate::resets::Reset>,
    pub templates: HashMap<String, crate::serialize::TemplateRecord>,
    /// The allocated grid extent (`width × height × layers`), set once at
    /// construction. `CreateRoom`/`AddRoom` bounds-check coordinates against
    /// this before touching `rooms` (C4).
    pub width: i32,
    pub height: i32,
    pub layers: i32,
}

impl Dungeon {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Dungeon {
            name: id.clone(),
            id,
            description: None,
            reset_message: None,
            rooms: HashMap::new(),
            reset_schedule: Vec::new(),
            templates: HashMap::new(),
            width: 0,
            height: 0,
            layers: 0,
        }
    }

    pub fn with_bounds(id: impl Into<String>, width: i32, height: i32, layers: i32) -> Self {
        Dungeon {
            width,
            height,
            layers,
            ..Dungeon::new(id)
        }
    }

    pub fn room_at(&self, coord: Coordinate) -> Option<Oid> {
        self.rooms.get(&coord).copied()
    }

    pub fn in_bounds(&self, coord: Coordinate) -> bool {
        coord.x >= 0
            && coord.x < self.width
            && coord.y >= 0
            && coord.y < self.height
            && coord.z >= 0
            && coord.z < self.layers
    }
}

/// A registered link between two rooms, keyed by index within
/// `RoomData::links` / the global link table (C4).
#[derive(Debug, Clone)]
pub struct RoomLink {
    pub from_room: Oid,
    pub to_room: Oid,
    pub direction: crate::direction::Direction,
    pub bidirectional: bool,
}

/// The world: every object in the containment graph plus the process-wide
/// registries that index it. Replaces the source's scattered static maps
/// with one arena struct an embedder owns and threads through every call
/// (see `spec.md`'s design note on cyclic ownership).
pub struct World {
    objects: HashMap<Oid, Entity>,
    pub dungeons: HashMap<String, Dungeon>,
    pub room_links: Vec<RoomLink>,

    pub combat_queue: MemberSet,
    pub regeneration_set: MemberSet,
    pub effects_set: MemberSet,
    pub wandering_mobs: MemberSet,

    next_oid: Oid,

    pub config: WorldConfig,
    pub logger: Box<dyn Logger>,
    pub resolver: Box<dyn ArchetypeResolver>,
}

impl World {
    /// Content resolution (race/job/ability/effect catalogues) has no
    /// sensible default, so a resolver is mandatory; logging and tuning
    /// fall back to `LogCrateLogger`/`WorldConfig::default`.
    pub fn new(resolver: Box<dyn ArchetypeResolver>) -> Self {
        World {
            objects: HashMap::new(),
            dungeons: HashMap::new(),
            room_links: Vec::new(),
            combat_queue: MemberSet::default(),
            regeneration_set: MemberSet::default(),
            effects_set: MemberSet::default(),
            wandering_mobs: MemberSet::default(),
            next_oid: 1,
            config: WorldConfig::default(),
            logger: Box::new(LogCrateLogger),
            resolver,
        }
    }

    pub fn with_config(mut self, config: WorldConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_logger(mut self, logger: Box<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Mints the next process-unique oid. The core never reuses an oid
    /// after an entity is destroyed (invariant: oid stability).
    pub fn mint_oid(&mut self) -> Oid {
        let oid = self.next_oid;
        self.next_oid += 1;
        oid
    }

    pub fn insert(&mut self, entity: Entity) -> Oid {
        let oid = entity.base.oid;
        self.objects.insert(oid, entity);
        oid
    }

    pub fn entity(&self, oid: Oid) -> Option<&Entity> {
        self.objects.get(&oid)
    }

    pub fn entity_mut(&mut self, oid: Oid) -> Option<&mut Entity> {
        self.objects.get_mut(&oid)
    }

    pub fn contains(&self, oid: Oid) -> bool {
        self.objects.contains_key(&oid)
    }

    /// A snapshot of every live oid in the arena, destroyed or not. Used by
    /// sweeps that must visit every mob (e.g. dropping dangling equipped-slot
    /// references on destruction) without a secondary index.
    pub fn all_oids(&self) -> Vec<Oid> {
        self.objects.keys().copied().collect()
    }

    /// Drops `oid` from every membership set without removing it from the
    /// arena — used by `crate::containment::destroy`, which blanks the
    /// entity in place rather than freeing its oid (oid stability, §3).
    pub fn remove_from_membership_sets(&mut self, oid: Oid) {
        self.combat_queue.remove(oid);
        self.regeneration_set.remove(oid);
        self.effects_set.remove(oid);
        self.wandering_mobs.remove(oid);
    }

    /// Removes an entity from the arena and every registry. Does not
    /// recursively destroy contents or unlink the parent — callers use
    /// `crate::movement`/`crate::resets` for the full teardown sequence.
    pub fn remove(&mut self, oid: Oid) -> Option<Entity> {
        self.remove_from_membership_sets(oid);
        self.objects.remove(&oid)
    }

    /// The coordinates of the room containing `oid`, if it (or its
    /// ancestor chain) resolves to one. Used by combat/threat co-location
    /// checks (§4.3's "same room" rule).
    pub fn room_of(&self, oid: Oid) -> Option<Coordinate> {
        let mut current = self.entity(oid)?.base.location;
        while let Some(loc) = current {
            let entity = self.entity(loc)?;
            if let Some(room) = entity.kind.as_room() {
                return Some(room.coordinates);
            }
            current = entity.base.location;
        }
        None
    }

    pub fn dungeon(&self, id: &str) -> Option<&Dungeon> {
        self.dungeons.get(id)
    }

    pub fn dungeon_mut(&mut self, id: &str) -> Option<&mut Dungeon> {
        self.dungeons.get_mut(id)
    }

    pub fn ensure_dungeon(&mut self, id: &str) -> &mut Dungeon {
        self.dungeons
            .entry(id.to_string())
            .or_insert_with(|| Dungeon::new(id))
    }

    /// The "flat contents registry" §3 promises every dungeon maintains:
    /// every object whose `dungeon` field points at `dungeon_id`, derived
    /// on demand from the arena rather than kept as a second index that
    /// could drift out of sync with `ObjectBase::dungeon`.
    pub fn dungeon_contents(&self, dungeon_id: &str) -> Vec<Oid> {
        self.objects
            .values()
            .filter(|e| e.base.dungeon.as_deref() == Some(dungeon_id))
            .map(|e| e.base.oid)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::object::Entity;

    struct EmptyResolver;
    impl ArchetypeResolver for EmptyResolver {
        fn resolve_race(&self, _id: &str) -> Option<&crate::model::archetype::Race> {
            None
        }
        fn resolve_job(&self, _id: &str) -> Option<&crate::model::archetype::Job> {
            None
        }
        fn resolve_ability(&self, _id: &str) -> Option<&crate::model::archetype::Ability> {
            None
        }
        fn resolve_effect(&self, _id: &str) -> Option<&crate::effects::EffectTemplate> {
            None
        }
    }

    #[test]
    fn room_of_walks_the_containment_chain() {
        let mut world = World::new(Box::new(EmptyResolver));
        let room_oid = world.mint_oid();
        world.insert(Entity::new_room(room_oid, Coordinate::new(0, 0, 0)));

        let bag_oid = world.mint_oid();
        let mut bag = Entity::new_item(bag_oid, "bag", "a bag", true);
        bag.base.location = Some(room_oid);
        world.insert(bag);

        let coin_oid = world.mint_oid();
        let mut coin = Entity::new_currency(coin_oid, "coin", "a coin", 1.0);
        coin.base.location = Some(bag_oid);
        world.insert(coin);

        assert_eq!(world.room_of(coin_oid), Some(Coordinate::new(0, 0, 0)));
    }

    #[test]
    fn remove_clears_every_membership_set() {
        let mut world = World::new(Box::new(EmptyResolver));
        let oid = world.mint_oid();
        world.insert(Entity::new_prop(oid, "rock", "a rock"));
        world.combat_queue.add(oid);
        world.effects_set.add(oid);
        world.remove(oid);
        assert!(!world.combat_queue.contains(oid));
        assert!(!world.effects_set.contains(oid));
        assert!(world.entity(oid).is_none());
    }
}
