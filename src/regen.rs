//! Resource regeneration: the third tick-driven subsystem named alongside
//! threat decay and effect ticks (`spec.md` §5), and the only consumer of
//! `World::regeneration_set` (C10).
//!
//! The registry is "membership, not a scheduler" exactly like
//! `combat_queue`/`effects_set`: a mob sits in it while any resource is below
//! cap, and the external scheduler polls the set on its own interval and
//! calls `regen_tick` for each member. `spec.md` names the registry and its
//! membership rule but leaves the per-tick rate to balance data, so the rate
//! lives in `WorldConfig` alongside every other tunable (§4.11).

use crate::ids::Oid;
use crate::registry::World;

/// One regen tick for a single mob: restores a config-driven fraction of
/// max health/mana (never above cap) and recovers flat exhaustion, then
/// refreshes `regeneration_set` membership.
pub fn regen_tick(world: &mut World, mob_oid: Oid) {
    let health_pct = world.config.health_regen_pct_per_tick;
    let mana_pct = world.config.mana_regen_pct_per_tick;
    let exhaustion_recovery = world.config.exhaustion_recovery_per_tick;

    let Some(mob) = world.entity(mob_oid).and_then(|e| e.kind.as_mob()) else {
        world.regeneration_set.remove(mob_oid);
        return;
    };
    let max_health = mob.derived.caps.max_health.round().max(0.0) as u32;
    let max_mana = mob.derived.caps.max_mana.round().max(0.0) as u32;
    let health_gain = ((mob.derived.caps.max_health * health_pct).ceil().max(1.0) as u32).min(max_health);
    let mana_gain = ((mob.derived.caps.max_mana * mana_pct).ceil().max(1.0) as u32).min(max_mana);

    if let Some(mob) = world.entity_mut(mob_oid).and_then(|e| e.kind.as_mob_mut()) {
        mob.health = (mob.health + health_gain).min(max_health);
        mob.mana = (mob.mana + mana_gain).min(max_mana);
        mob.exhaustion = mob.exhaustion.saturating_sub(exhaustion_recovery);
    }

    update_regeneration_membership(world, mob_oid);
}

/// Adds or removes `mob_oid` from `regeneration_set` depending on whether
/// any resource is currently below its cap. Called after anything that can
/// change health/mana/exhaustion (damage, regen itself, leveling), not just
/// from `regen_tick`, so the registry never drifts stale.
pub fn update_regeneration_membership(world: &mut World, mob_oid: Oid) {
    let Some(mob) = world.entity(mob_oid).and_then(|e| e.kind.as_mob()) else {
        world.regeneration_set.remove(mob_oid);
        return;
    };
    let max_health = mob.derived.caps.max_health.round().max(0.0) as u32;
    let max_mana = mob.derived.caps.max_mana.round().max(0.0) as u32;
    let needs_regen = mob.health < max_health || mob.mana < max_mana || mob.exhaustion > 0;
    if needs_regen {
        world.regeneration_set.add(mob_oid);
    } else {
        world.regeneration_set.remove(mob_oid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit;

    #[test]
    fn regen_tick_tops_off_without_overshooting_cap() {
        let mut world = testkit::fresh_world();
        let (_d, _r, mob_oid) = testkit::mob_in_new_room(&mut world, "npc", false);
        crate::mob::bootstrap(&mut world, mob_oid);

        if let Some(mob) = world.entity_mut(mob_oid).and_then(|e| e.kind.as_mob_mut()) {
            mob.health = mob.health.saturating_sub(1);
        }
        update_regeneration_membership(&mut world, mob_oid);
        assert!(world.regeneration_set.contains(mob_oid));

        for _ in 0..50 {
            regen_tick(&mut world, mob_oid);
        }
        let mob = world.entity(mob_oid).unwrap().kind.as_mob().unwrap();
        assert_eq!(mob.health, mob.derived.caps.max_health.round() as u32);
        assert!(!world.regeneration_set.contains(mob_oid));
    }

    #[test]
    fn full_health_mob_is_not_a_regen_member() {
        let mut world = testkit::fresh_world();
        let (_d, _r, mob_oid) = testkit::mob_in_new_room(&mut world, "npc", false);
        crate::mob::bootstrap(&mut world, mob_oid);
        update_regeneration_membership(&mut world, mob_oid);
        assert!(!world.regeneration_set.contains(mob_oid));
    }
}
