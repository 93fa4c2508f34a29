//! Combat & threat (C7): per-NPC threat tables, the damage pipeline with
//! shield absorption, the combat-target setter, and behavior hooks
//! (aggressive, wimpy, wander, shopkeeper).

use crate::config::WorldConfig;
use crate::effects::EffectKind;
use crate::ids::Oid;
use crate::model::types::DamageType;
use crate::registry::World;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThreatEntry {
    pub amount: f64,
    pub should_expire: bool,
}

/// Per-NPC threat table (invariant 10: only non-player-controlled mobs have
/// one).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreatTable {
    pub entries: HashMap<Oid, ThreatEntry>,
    pub decay_timer_running: bool,
}

impl ThreatTable {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `GetHighestThreatTarget()`: linear scan for the largest amount.
    pub fn highest_threat_target(&self) -> Option<Oid> {
        self.entries
            .iter()
            .max_by(|a, b| a.1.amount.partial_cmp(&b.1.amount).unwrap())
            .map(|(oid, _)| *oid)
    }
}

/// `AddThreat(attacker, amount)`. Initializes the table lazily, resets the
/// grace flag on the attacker's entry, starts the decay cycle if it isn't
/// already running, and runs target-switching.
pub fn add_threat(world: &mut World, npc_oid: Oid, attacker_oid: Oid, amount: f64) {
    let Some(mob) = world.entity_mut(npc_oid).and_then(|e| e.kind.as_mob_mut()) else {
        return;
    };
    if mob.is_player_controlled() {
        return;
    }
    let table = mob.threat_table.get_or_insert_with(ThreatTable::default);
    let entry = table.entries.entry(attacker_oid).or_insert(ThreatEntry {
        amount: 0.0,
        should_expire: false,
    });
    entry.amount += amount;
    entry.should_expire = false;
    let needs_timer_start = !table.decay_timer_running;
    if needs_timer_start {
        table.decay_timer_running = true;
    }

    process_threat_switching(world, npc_oid);
}

/// `ProcessThreatExpiration`, fired on the fixed decay interval
/// (`WorldConfig::threat_decay_interval_ms`, spec: 10s).
///
/// Per entry: drop mobs with no dungeon (destroyed); skip the current
/// target; skip mobs co-located with the NPC; give one "grace" cycle before
/// decaying; then scale by `threat_decay_factor`, flooring at
/// `threat_floor`. Stops the timer once the table empties.
pub fn process_threat_expiration(world: &mut World, npc_oid: Oid, cfg: &WorldConfig) {
    let current_target = world
        .entity(npc_oid)
        .and_then(|e| e.kind.as_mob())
        .and_then(|m| m.combat_target);
    let npc_dungeon = world.entity(npc_oid).and_then(|e| e.base.dungeon.clone());
    let npc_room = world.room_of(npc_oid);

    let Some(mob) = world.entity_mut(npc_oid).and_then(|e| e.kind.as_mob_mut()) else {
        return;
    };
    let Some(table) = mob.threat_table.as_mut() else {
        return;
    };

    let candidate_ids: Vec<Oid> = table.entries.keys().copied().collect();
    let mut to_drop = Vec::new();

    for attacker_oid in candidate_ids {
        if Some(attacker_oid) == current_target {
            continue;
        }
        let attacker_dungeon = world.entity(attacker_oid).and_then(|e| e.base.dungeon.clone());
        if attacker_dungeon.is_none() || attacker_dungeon != npc_dungeon {
            to_drop.push(attacker_oid);
            continue;
        }
        let attacker_room = world.room_of(attacker_oid);
        if attacker_room.is_some() && attacker_room == npc_room {
            continue;
        }

        let mob = world.entity_mut(npc_oid).and_then(|e| e.kind.as_mob_mut()).unwrap();
        let table = mob.threat_table.as_mut().unwrap();
        let entry = table.entries.get_mut(&attacker_oid).unwrap();
        if !entry.should_expire {
            entry.should_expire = true;
        } else {
            entry.amount = (entry.amount * cfg.threat_decay_factor).floor();
            if entry.amount < cfg.threat_floor {
                to_drop.push(attacker_oid);
            }
        }
    }

    let mob = world.entity_mut(npc_oid).and_then(|e| e.kind.as_mob_mut()).unwrap();
    let table = mob.threat_table.as_mut().unwrap();
    for oid in to_drop {
        table.entries.remove(&oid);
    }
    if table.is_empty() {
        table.decay_timer_running = false;
    }
}

/// Recomputes target-switching for an NPC based on the current threat
/// table; fired from `add_threat` and from room-entry events (§4.3).
pub fn process_threat_switching(world: &mut World, npc_oid: Oid) {
    let Some(mob) = world.entity(npc_oid).and_then(|e| e.kind.as_mob()) else {
        return;
    };
    if !mob.is_npc() {
        return;
    }
    let Some(table) = &mob.threat_table else { return };
    if table.is_empty() {
        return;
    }
    let highest = table.highest_threat_target();
    if highest.is_some() && highest != mob.combat_target {
        if let Some(target) = highest {
            set_combat_target(world, npc_oid, Some(target));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetCombatTargetError {
    SelfTargeting,
}

/// The combat-target setter. All combat-queue/threat bookkeeping derives
/// from here — nothing else adds or removes a mob from the combat queue.
pub fn set_combat_target(
    world: &mut World,
    mob_oid: Oid,
    target_oid: Option<Oid>,
) -> Result<(), SetCombatTargetError> {
    if target_oid == Some(mob_oid) {
        return Err(SetCombatTargetError::SelfTargeting);
    }

    let was_in_combat = world
        .entity(mob_oid)
        .and_then(|e| e.kind.as_mob())
        .map(|m| m.in_combat())
        .unwrap_or(false);
    let entering_combat = target_oid.is_some();

    if let Some(mob) = world.entity_mut(mob_oid).and_then(|e| e.kind.as_mob_mut()) {
        mob.combat_target = target_oid;
    }

    if entering_combat && !was_in_combat {
        world.combat_queue.add(mob_oid);
        let is_npc = world
            .entity(mob_oid)
            .and_then(|e| e.kind.as_mob())
            .map(|m| m.is_npc())
            .unwrap_or(false);
        if is_npc {
            if let Some(target) = target_oid {
                add_threat(world, mob_oid, target, 1.0);
            }
        }
    } else if !entering_combat && was_in_combat {
        world.combat_queue.remove(mob_oid);
        let is_npc = world
            .entity(mob_oid)
            .and_then(|e| e.kind.as_mob())
            .map(|m| m.is_npc())
            .unwrap_or(false);
        if is_npc {
            handle_leave_combat(world, mob_oid);
        }
    }

    Ok(())
}

fn handle_leave_combat(world: &mut World, npc_oid: Oid) {
    let next_target = world
        .entity(npc_oid)
        .and_then(|e| e.kind.as_mob())
        .and_then(|m| m.threat_table.as_ref())
        .and_then(|t| t.highest_threat_target())
        .filter(|&t| world.room_of(t).is_some() && world.room_of(t) == world.room_of(npc_oid));
    if let Some(target) = next_target {
        let _ = set_combat_target(world, npc_oid, Some(target));
    }
}

/// Initiates combat between two mobs in the same room, forbidding
/// self-targeting (invariant 9).
pub fn initiate_combat(world: &mut World, attacker_oid: Oid, target_oid: Oid) {
    if attacker_oid == target_oid {
        return;
    }
    let attacker_in_combat = world
        .entity(attacker_oid)
        .and_then(|e| e.kind.as_mob())
        .map(|m| m.in_combat())
        .unwrap_or(false);
    if !attacker_in_combat {
        let _ = set_combat_target(world, attacker_oid, Some(target_oid));
    }
}

#[derive(Debug, Clone, Default)]
pub struct DamageOutcome {
    pub absorbed: f64,
    pub health_lost: u32,
    pub died: bool,
    pub shield_messages: Vec<(String, f64)>,
}

/// `Damage(attacker, amount, damageType?)`. Shield absorption precedes
/// health subtraction precedes threat accrual precedes death handling
/// (§5's ordering guarantee).
pub fn apply_damage(
    world: &mut World,
    attacker_oid: Oid,
    target_oid: Oid,
    amount: f64,
    damage_type: Option<&DamageType>,
) -> DamageOutcome {
    let mut outcome = DamageOutcome::default();

    let is_shopkeeper = world
        .entity(target_oid)
        .map(|e| e.kind.is_shopkeeper())
        .unwrap_or(false);
    if is_shopkeeper {
        return outcome;
    }

    let mut remaining = amount;

    if let Some(mob) = world.entity_mut(target_oid).and_then(|e| e.kind.as_mob_mut()) {
        let mut depleted = Vec::new();
        for (idx, inst) in mob.active_effects.iter_mut().enumerate() {
            if remaining <= 0.0 {
                break;
            }
            if inst.kind != EffectKind::Shield {
                continue;
            }
            if let (Some(filter), Some(dt)) = (&inst.damage_type_filter, damage_type) {
                if filter != dt {
                    continue;
                }
            }
            let remaining_capacity = inst.remaining_absorption.unwrap_or(0.0);
            if remaining_capacity <= 0.0 {
                continue;
            }
            let mut try_absorb = remaining * inst.absorption_rate;
            if let Some(cap) = inst.max_absorption_per_hit {
                try_absorb = try_absorb.min(cap);
            }
            try_absorb = try_absorb.min(remaining_capacity).min(remaining);

            remaining -= try_absorb;
            outcome.absorbed += try_absorb;
            inst.remaining_absorption = Some(remaining_capacity - try_absorb);
            outcome
                .shield_messages
                .push((inst.effect_id.clone(), try_absorb));

            if inst.remaining_absorption.unwrap_or(0.0) <= 0.0 {
                depleted.push(idx);
            }
        }
        for idx in depleted.into_iter().rev() {
            mob.active_effects.remove(idx);
        }
        if mob.active_effects.is_empty() {
            // handled below via world.effects_set once mob borrow ends
        }
    }

    if world
        .entity(target_oid)
        .and_then(|e| e.kind.as_mob())
        .map(|m| m.active_effects.is_empty())
        .unwrap_or(true)
    {
        world.effects_set.remove(target_oid);
    }

    let health_lost = remaining.max(0.0).round() as u32;
    if let Some(mob) = world.entity_mut(target_oid).and_then(|e| e.kind.as_mob_mut()) {
        mob.health = mob.health.saturating_sub(health_lost);
        outcome.health_lost = health_lost;
    }
    crate::regen::update_regeneration_membership(world, target_oid);

    let target_is_npc = world
        .entity(target_oid)
        .and_then(|e| e.kind.as_mob())
        .map(|m| m.is_npc())
        .unwrap_or(false);
    if target_is_npc {
        add_threat(world, target_oid, attacker_oid, amount.max(1.0));
    } else {
        let target_in_combat = world
            .entity(target_oid)
            .and_then(|e| e.kind.as_mob())
            .map(|m| m.in_combat())
            .unwrap_or(false);
        let co_located = world.room_of(target_oid).is_some() && world.room_of(target_oid) == world.room_of(attacker_oid);
        if !target_in_combat && co_located {
            initiate_combat(world, target_oid, attacker_oid);
        }
    }

    let health_now = world
        .entity(target_oid)
        .and_then(|e| e.kind.as_mob())
        .map(|m| m.health)
        .unwrap_or(1);
    if health_now == 0 {
        outcome.died = true;
    }

    outcome
}

/// Wimpy behavior: at or below the wimpy HP threshold, roll a chance to
/// flee combat. `roll01` is caller-injected randomness in `[0,1)` (§5:
/// RNG is always injected, never drawn from global state).
pub fn should_wimpy_flee(world: &World, mob_oid: Oid, cfg: &WorldConfig, roll01: f64, flee_chance: f64) -> bool {
    let Some(mob) = world.entity(mob_oid).and_then(|e| e.kind.as_mob()) else {
        return false;
    };
    if !mob.behaviors.wimpy || !mob.in_combat() {
        return false;
    }
    let max_hp = mob.derived.caps.max_health.max(1.0);
    let pct = mob.health as f64 / max_hp;
    pct <= cfg.wimpy_threshold_pct && roll01 < flee_chance
}
