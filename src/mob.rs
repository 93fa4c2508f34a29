//! Mob attribute recomputation, leveling, abilities, and equipment (C6).

use crate::attributes::{derive_secondary, PrimaryAttributes, ResourceCaps};
use crate::effects::EffectKind;
use crate::ids::Oid;
use crate::model::mob::DerivedAttributes;
use crate::model::object::EquipmentKind;
use crate::model::types::{AttributeBonuses, EquipSlot};
use crate::registry::World;

/// Recomputes `race + job + level growth + runtime bonuses + equipment +
/// passive effects` into the mob's cached `DerivedAttributes` (§4.4's
/// derivation pipeline, steps 1-5). Step 6 (health/mana reconciliation) is
/// governed by `preserve_ratio`: `true` re-applies the mob's current
/// health/mana ratio against the new caps; `false` just re-clamps the
/// current value. Fresh mobs should go through `bootstrap` instead, which
/// fills both resources to the new max.
pub fn recompute_attributes(world: &mut World, oid: Oid, preserve_ratio: bool) {
    let Some(mob) = world.entity(oid).and_then(|e| e.kind.as_mob()) else {
        return;
    };

    let race_id = mob.race.clone();
    let job_id = mob.job.clone();
    let level = mob.level;
    let runtime_primary = mob.attribute_bonuses;
    let runtime_resources = mob.resource_bonuses;
    let equipped: Vec<Oid> = mob.equipped.values().copied().collect();
    let passive_bonuses: Vec<AttributeBonuses> = mob
        .active_effects
        .iter()
        .filter(|e| e.kind == EffectKind::Passive)
        .filter_map(|e| e.bonuses)
        .collect();
    let prior_health = mob.health;
    let prior_mana = mob.mana;
    let prior_caps = mob.derived.caps;

    let Some(race) = world.resolver.resolve_race(&race_id) else {
        world
            .logger
            .warn(&format!("recompute_attributes: unknown race {race_id:?}"));
        return;
    };
    let race = race.clone();
    let Some(job) = world.resolver.resolve_job(&job_id) else {
        world
            .logger
            .warn(&format!("recompute_attributes: unknown job {job_id:?}"));
        return;
    };
    let job = job.clone();

    let levels_above_one = level.saturating_sub(1) as f64;

    let mut equipment_primary = PrimaryAttributes::default();
    let mut equipment_bonuses = AttributeBonuses::default();
    let mut armor_defense_total = 0.0;
    for eq_oid in &equipped {
        if let Some(eq) = world.entity(*eq_oid).and_then(|e| e.kind.as_equipment()) {
            equipment_primary = equipment_primary + eq.attribute_bonuses;
            equipment_bonuses.secondary = equipment_bonuses.secondary + eq.secondary_bonuses;
            equipment_bonuses.resources = equipment_bonuses.resources + eq.resource_bonuses;
            // Weapons never contribute attack power to base stats (§4.4):
            // they only matter when actually swung.
            if let EquipmentKind::Armor { defense } = eq.kind {
                armor_defense_total += defense;
            }
        }
    }

    let passive_total = AttributeBonuses::sum(&passive_bonuses);

    let mut primary = race.start_primary
        + job.start_primary
        + race.growth_primary * levels_above_one
        + job.growth_primary * levels_above_one
        + runtime_primary
        + equipment_primary
        + passive_total.primary;
    primary = primary.rounded(&world.config);

    let mut secondary =
        derive_secondary(&primary) + equipment_bonuses.secondary + passive_total.secondary;
    secondary.defense += armor_defense_total;
    secondary = secondary.rounded(&world.config);

    let caps_base = race.start_resources
        + job.start_resources
        + race.growth_resources * levels_above_one
        + job.growth_resources * levels_above_one
        + runtime_resources
        + equipment_bonuses.resources
        + passive_total.resources;
    let caps = caps_base.with_vitality_wisdom(&secondary, &world.config);

    let new_health = if preserve_ratio && prior_caps.max_health > 0.0 {
        let ratio = prior_health as f64 / prior_caps.max_health;
        (ratio * caps.max_health).round().max(0.0) as u32
    } else {
        (prior_health as f64).min(caps.max_health).round() as u32
    };
    let new_mana = if preserve_ratio && prior_caps.max_mana > 0.0 {
        let ratio = prior_mana as f64 / prior_caps.max_mana;
        (ratio * caps.max_mana).round().max(0.0) as u32
    } else {
        (prior_mana as f64).min(caps.max_mana).round() as u32
    };

    if let Some(mob) = world.entity_mut(oid).and_then(|e| e.kind.as_mob_mut()) {
        mob.derived = DerivedAttributes {
            primary,
            secondary,
            caps,
        };
        mob.health = new_health;
        mob.mana = new_mana;
    }
    crate::regen::update_regeneration_membership(world, oid);
}

/// Fills health/mana to max and zeroes exhaustion — used once, at mob
/// creation, instead of `recompute_attributes`'s ratio-preserving path.
pub fn bootstrap(world: &mut World, oid: Oid) {
    recompute_attributes(world, oid, false);
    if let Some(mob) = world.entity_mut(oid).and_then(|e| e.kind.as_mob_mut()) {
        mob.health = mob.derived.caps.max_health.round().max(0.0) as u32;
        mob.mana = mob.derived.caps.max_mana.round().max(0.0) as u32;
        mob.exhaustion = 0;
    }
    crate::regen::update_regeneration_membership(world, oid);
    crate::movement::sync_wandering_membership(world, oid);
}

#[derive(Debug, Clone, Copy)]
pub struct ProficiencyGain {
    pub old_pct: u8,
    pub new_pct: u8,
}

/// Increments an ability's use count and refreshes its cached proficiency
/// percentage. Returns `Some` only when the integer percentage actually
/// increased, matching §4.4's "send a proficiency increased message" rule.
pub fn use_ability(world: &mut World, mob_oid: Oid, ability_id: &str) -> Option<ProficiencyGain> {
    let curve = world.resolver.resolve_ability(ability_id)?.proficiency_curve.clone();

    let mob = world.entity_mut(mob_oid)?.kind.as_mob_mut()?;
    let count = {
        let entry = mob.learned_abilities.entry(ability_id.to_string()).or_insert(0);
        *entry += 1;
        *entry
    };
    let old_pct = mob.proficiency_snapshot.get(ability_id).copied().unwrap_or(0);
    let new_pct = curve.evaluate(count);
    mob.proficiency_snapshot.insert(ability_id.to_string(), new_pct);

    if new_pct > old_pct {
        Some(ProficiencyGain { old_pct, new_pct })
    } else {
        None
    }
}

/// `GetUnlearnedArchetypeAbilities`: race/job grants at or below the mob's
/// current level that aren't in `learnedAbilities` yet.
pub fn unlearned_archetype_abilities(world: &World, mob_oid: Oid) -> Vec<String> {
    let Some(mob) = world.entity(mob_oid).and_then(|e| e.kind.as_mob()) else {
        return Vec::new();
    };
    let Some(race) = world.resolver.resolve_race(&mob.race) else {
        return Vec::new();
    };
    let Some(job) = world.resolver.resolve_job(&mob.job) else {
        return Vec::new();
    };
    race.archetype_abilities
        .iter()
        .chain(job.archetype_abilities.iter())
        .filter(|grant| grant.level <= mob.level && !mob.learned_abilities.contains_key(&grant.ability_id))
        .map(|grant| grant.ability_id.clone())
        .collect()
}

/// `LearnArchetypeAbility`: registers a race/job-granted ability with a
/// fresh use count, as opposed to `use_ability`'s increment-in-place.
pub fn learn_archetype_ability(world: &mut World, mob_oid: Oid, ability_id: &str) {
    if let Some(mob) = world.entity_mut(mob_oid).and_then(|e| e.kind.as_mob_mut()) {
        mob.learned_abilities.entry(ability_id.to_string()).or_insert(0);
        mob.proficiency_snapshot.entry(ability_id.to_string()).or_insert(0);
    }
}

#[derive(Debug, Clone)]
pub struct LevelUpSummary {
    pub levels_gained: u32,
    pub before: DerivedAttributes,
    pub after: DerivedAttributes,
    pub newly_eligible_abilities: Vec<String>,
}

/// `GainExperience(raw)`. Returns `None` if no level threshold was crossed.
pub fn gain_experience(world: &mut World, mob_oid: Oid, raw: f64) -> Option<LevelUpSummary> {
    let mob = world.entity(mob_oid)?.kind.as_mob()?;
    let race_id = mob.race.clone();
    let job_id = mob.job.clone();
    let level = mob.level;
    let before = mob.derived;

    let race_mod = world.resolver.resolve_race(&race_id)?.level_modifier.evaluate(level);
    let job_mod = world.resolver.resolve_job(&job_id)?.level_modifier.evaluate(level);
    let growth_modifier = (race_mod * job_mod).max(0.0001);
    let adjusted = (raw / growth_modifier).floor().max(0.0) as u32;

    let threshold = world.config.experience_threshold;
    let mob = world.entity_mut(mob_oid)?.kind.as_mob_mut()?;
    mob.experience += adjusted;
    let mut levels_gained = 0u32;
    while mob.experience >= threshold {
        mob.experience -= threshold;
        mob.level += 1;
        levels_gained += 1;
    }
    if levels_gained == 0 {
        return None;
    }

    recompute_attributes(world, mob_oid, true);
    let after = world.entity(mob_oid)?.kind.as_mob()?.derived;
    let newly_eligible_abilities = unlearned_archetype_abilities(world, mob_oid);

    Some(LevelUpSummary {
        levels_gained,
        before,
        after,
        newly_eligible_abilities,
    })
}

/// `AwardKillExperience(targetLevel)`: base 10 XP, +2 per level the target
/// exceeds the mob, or `10 + diff` (floored at 1) per level below.
pub fn award_kill_experience(world: &mut World, mob_oid: Oid, target_level: u32) -> Option<LevelUpSummary> {
    let level = world.entity(mob_oid)?.kind.as_mob()?.level;
    let diff = target_level as i64 - level as i64;
    let amount = if diff > 0 { 10 + 2 * diff } else { (10 + diff).max(1) };
    gain_experience(world, mob_oid, amount as f64)
}

/// Equips an item already sitting in the mob's inventory into its
/// equipment slot, then recomputes attributes preserving resource ratios.
pub fn equip(world: &mut World, mob_oid: Oid, item_oid: Oid) -> bool {
    let Some((slot, held)) = world.entity(item_oid).map(|e| {
        (
            e.kind.as_equipment().map(|eq| eq.slot.clone()),
            e.base.location == Some(mob_oid),
        )
    }) else {
        return false;
    };
    let Some(slot) = slot else { return false };
    if !held {
        return false;
    }

    let Some(mob) = world.entity_mut(mob_oid).and_then(|e| e.kind.as_mob_mut()) else {
        return false;
    };
    mob.equipped.insert(slot, item_oid);
    recompute_attributes(world, mob_oid, true);
    true
}

/// Unequips whatever occupies `slot`; the item stays in the mob's
/// inventory (§4.4: "item stays in inventory").
pub fn unequip(world: &mut World, mob_oid: Oid, slot: &EquipSlot) -> bool {
    let removed = world
        .entity_mut(mob_oid)
        .and_then(|e| e.kind.as_mob_mut())
        .map(|mob| mob.equipped.remove(slot).is_some())
        .unwrap_or(false);
    if removed {
        recompute_attributes(world, mob_oid, true);
    }
    removed
}

/// Binds a mob to its controlling player character, maintaining invariant 4
/// (bidirectional character<->mob). The character side of the relationship
/// lives outside this crate; callers are expected to set the reciprocal
/// pointer themselves.
pub fn set_character(world: &mut World, mob_oid: Oid, character_ref: Option<String>) {
    if let Some(mob) = world.entity_mut(mob_oid).and_then(|e| e.kind.as_mob_mut()) {
        mob.character_ref = character_ref;
    }
}
