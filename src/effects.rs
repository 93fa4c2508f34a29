//! Effects engine (C8): passive, DoT, HoT, and shield effects; stack policy;
//! timer scheduling; and serialization of live timers for crash recovery.

use crate::model::types::AttributeBonuses;
use crate::model::types::DamageType;
use crate::registry::World;
use crate::ids::Oid;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    Passive,
    Dot,
    Hot,
    Shield,
}

/// Content definition for an effect, resolved by id via
/// `crate::ports::ArchetypeResolver::resolve_effect`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectTemplate {
    pub id: String,
    pub stackable: bool,
    pub on_apply_message: Option<String>,
    pub on_expire_message: Option<String>,
    pub is_offensive: bool,
    pub variant: EffectTemplateVariant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EffectTemplateVariant {
    Passive {
        bonuses: AttributeBonuses,
        duration_secs: Option<f64>,
    },
    Dot {
        damage: f64,
        interval_secs: f64,
        duration_secs: f64,
    },
    Hot {
        heal: f64,
        interval_secs: f64,
        duration_secs: f64,
    },
    Shield {
        absorption: f64,
        absorption_rate: f64,
        max_absorption_per_hit: Option<f64>,
        damage_type: Option<DamageType>,
    },
}

/// A live instance of an effect on a mob. Carries enough state to be
/// serialized and restored without the template (the template is only
/// needed at apply-time for defaults and at expire-time for messaging).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectInstance {
    pub effect_id: String,
    pub caster_oid: Option<Oid>,
    pub kind: EffectKind,
    pub stackable: bool,
    pub is_offensive: bool,

    pub applied_at_ms: i64,
    /// `None` means permanent (passive, or a shield — shields never expire
    /// by duration, only by depletion).
    pub expires_at_ms: Option<i64>,

    pub interval_ms: Option<u64>,
    pub next_tick_at_ms: Option<i64>,
    pub ticks_remaining: Option<u32>,
    pub tick_amount: Option<f64>,

    pub remaining_absorption: Option<f64>,
    pub absorption_rate: f64,
    pub max_absorption_per_hit: Option<f64>,
    pub damage_type_filter: Option<DamageType>,

    pub bonuses: Option<AttributeBonuses>,

    /// Race/job passive grants are applied through the same `add_effect`
    /// path but are never serialized — they're re-applied on load (§4.6).
    /// Set via `mark_as_archetype` after the instance is inserted.
    #[serde(default)]
    pub is_archetype: bool,
}

impl EffectInstance {
    pub fn is_expired(&self, now_ms: i64) -> bool {
        matches!(self.expires_at_ms, Some(t) if now_ms >= t)
    }

    pub fn is_depleted_shield(&self) -> bool {
        self.kind == EffectKind::Shield && self.remaining_absorption.unwrap_or(0.0) <= 0.0
    }
}

/// Caller-supplied restoration values, used when reloading a save so timers
/// resume from where they were instead of resetting.
#[derive(Debug, Clone, Default)]
pub struct RestoreState {
    pub applied_at_ms: Option<i64>,
    pub expires_at_ms: Option<i64>,
    pub next_tick_at_ms: Option<i64>,
    pub ticks_remaining: Option<u32>,
    pub tick_amount: Option<f64>,
    pub remaining_absorption: Option<f64>,
}

/// `AddEffect(template, caster, overrides?)`.
///
/// Returns `None` if the target mob doesn't exist. On success returns the
/// effect id that was applied and whether combat should be (re)triggered as
/// a result (offensive effect, not already in combat, caster != target).
pub fn add_effect(
    world: &mut World,
    target_oid: Oid,
    template: &EffectTemplate,
    caster_oid: Option<Oid>,
    restore: Option<RestoreState>,
    now_ms: i64,
) -> Option<EffectApplyResult> {
    let restoring = restore.is_some();
    let restore = restore.unwrap_or_default();

    let stackable = template_is_stackable(template);
    if !stackable {
        remove_effects_by_id(world, target_oid, &template.id, false, now_ms);
    }

    let applied_at_ms = restore.applied_at_ms.unwrap_or(now_ms);

    let (instance, passive_bonuses) = match &template.variant {
        EffectTemplateVariant::Passive { bonuses, duration_secs } => {
            let expires_at_ms = restore.expires_at_ms.or_else(|| {
                duration_secs.map(|d| applied_at_ms + (d * 1000.0) as i64)
            });
            (
                EffectInstance {
                    effect_id: template.id.clone(),
                    caster_oid,
                    kind: EffectKind::Passive,
                    stackable,
                    is_offensive: template.is_offensive,
                    applied_at_ms,
                    expires_at_ms,
                    interval_ms: None,
                    next_tick_at_ms: None,
                    ticks_remaining: None,
                    tick_amount: None,
                    remaining_absorption: None,
                    absorption_rate: 1.0,
                    max_absorption_per_hit: None,
                    damage_type_filter: None,
                    bonuses: Some(*bonuses),
                    is_archetype: false,
                },
                Some(*bonuses),
            )
        }
        EffectTemplateVariant::Dot {
            damage,
            interval_secs,
            duration_secs,
        } => {
            let (expires_at_ms, next_tick_at_ms, ticks_remaining, tick_amount) = if restoring {
                (
                    restore.expires_at_ms,
                    restore.next_tick_at_ms,
                    restore.ticks_remaining,
                    restore.tick_amount,
                )
            } else {
                (
                    Some(applied_at_ms + (duration_secs * 1000.0) as i64),
                    Some(applied_at_ms + (interval_secs * 1000.0) as i64),
                    Some((duration_secs / interval_secs).floor() as u32),
                    Some(*damage),
                )
            };
            (
                EffectInstance {
                    effect_id: template.id.clone(),
                    caster_oid,
                    kind: EffectKind::Dot,
                    stackable,
                    is_offensive: true,
                    applied_at_ms,
                    expires_at_ms,
                    interval_ms: Some((*interval_secs * 1000.0) as u64),
                    next_tick_at_ms,
                    ticks_remaining,
                    tick_amount,
                    remaining_absorption: None,
                    absorption_rate: 1.0,
                    max_absorption_per_hit: None,
                    damage_type_filter: None,
                    bonuses: None,
                    is_archetype: false,
                },
                None,
            )
        }
        EffectTemplateVariant::Hot {
            heal,
            interval_secs,
            duration_secs,
        } => {
            let (expires_at_ms, next_tick_at_ms, ticks_remaining, tick_amount) = if restoring {
                (
                    restore.expires_at_ms,
                    restore.next_tick_at_ms,
                    restore.ticks_remaining,
                    restore.tick_amount,
                )
            } else {
                (
                    Some(applied_at_ms + (duration_secs * 1000.0) as i64),
                    Some(applied_at_ms + (interval_secs * 1000.0) as i64),
                    Some((duration_secs / interval_secs).floor() as u32),
                    Some(*heal),
                )
            };
            (
                EffectInstance {
                    effect_id: template.id.clone(),
                    caster_oid,
                    kind: EffectKind::Hot,
                    stackable,
                    is_offensive: false,
                    applied_at_ms,
                    expires_at_ms,
                    interval_ms: Some((*interval_secs * 1000.0) as u64),
                    next_tick_at_ms,
                    ticks_remaining,
                    tick_amount,
                    remaining_absorption: None,
                    absorption_rate: 1.0,
                    max_absorption_per_hit: None,
                    damage_type_filter: None,
                    bonuses: None,
                    is_archetype: false,
                },
                None,
            )
        }
        EffectTemplateVariant::Shield {
            absorption,
            absorption_rate,
            max_absorption_per_hit,
            damage_type,
        } => {
            let remaining_absorption = restore.remaining_absorption.unwrap_or(*absorption);
            (
                EffectInstance {
                    effect_id: template.id.clone(),
                    caster_oid,
                    kind: EffectKind::Shield,
                    stackable,
                    is_offensive: false,
                    applied_at_ms,
                    expires_at_ms: None,
                    interval_ms: None,
                    next_tick_at_ms: None,
                    ticks_remaining: None,
                    tick_amount: None,
                    remaining_absorption: Some(remaining_absorption),
                    absorption_rate: *absorption_rate,
                    max_absorption_per_hit: *max_absorption_per_hit,
                    damage_type_filter: damage_type.clone(),
                    bonuses: None,
                    is_archetype: false,
                },
                None,
            )
        }
    };

    let mob = world.entity_mut(target_oid)?.kind.as_mob_mut()?;
    mob.active_effects.push(instance);
    world.effects_set.add(target_oid);

    let mut should_recompute = false;
    if passive_bonuses.is_some() {
        should_recompute = true;
    }
    if should_recompute {
        crate::mob::recompute_attributes(world, target_oid, true);
    }

    let should_initiate_combat = template.is_offensive
        && caster_oid.map(|c| c != target_oid).unwrap_or(false)
        && world
            .entity(target_oid)
            .and_then(|e| e.kind.as_mob())
            .map(|m| !m.in_combat())
            .unwrap_or(false);

    let emit_apply_message = !restoring;

    Some(EffectApplyResult {
        effect_id: template.id.clone(),
        should_initiate_combat,
        emit_apply_message,
        apply_message: template.on_apply_message.clone(),
    })
}

pub struct EffectApplyResult {
    pub effect_id: String,
    pub should_initiate_combat: bool,
    pub emit_apply_message: bool,
    pub apply_message: Option<String>,
}

/// Flags the most-recently-applied instance of `effect_id` on `mob_oid` as
/// archetype-origin (a race/job passive grant), so `serialize_object` skips
/// it and load-time re-grants it instead of restoring it from the wire (§4.6).
pub fn mark_as_archetype(world: &mut World, mob_oid: Oid, effect_id: &str) {
    let Some(mob) = world.entity_mut(mob_oid).and_then(|e| e.kind.as_mob_mut()) else {
        return;
    };
    if let Some(inst) = mob
        .active_effects
        .iter_mut()
        .rev()
        .find(|i| i.effect_id == effect_id)
    {
        inst.is_archetype = true;
    }
}

fn template_is_stackable(template: &EffectTemplate) -> bool {
    template.stackable
}

/// `RemoveEffect(inst, showExpireMessage?)`: emits `onExpire` only when the
/// caller asks or the effect is actually past its expiry.
pub fn remove_effect(
    world: &mut World,
    mob_oid: Oid,
    effect_id: &str,
    show_expire_message: bool,
    now_ms: i64,
) -> bool {
    let Some(mob) = world.entity_mut(mob_oid).and_then(|e| e.kind.as_mob_mut()) else {
        return false;
    };
    let Some(pos) = mob.active_effects.iter().position(|e| e.effect_id == effect_id) else {
        return false;
    };
    let instance = mob.active_effects.remove(pos);
    let was_passive = instance.kind == EffectKind::Passive && instance.bonuses.is_some();
    let _emit = show_expire_message || instance.is_expired(now_ms);

    if mob.active_effects.is_empty() {
        world.effects_set.remove(mob_oid);
    }

    if was_passive {
        crate::mob::recompute_attributes(world, mob_oid, true);
    }
    true
}

/// `RemoveEffectsById(id)`: bulk removal without expiration messaging.
pub fn remove_effects_by_id(
    world: &mut World,
    mob_oid: Oid,
    effect_id: &str,
    show_expire_message: bool,
    now_ms: i64,
) {
    loop {
        let has_more = world
            .entity(mob_oid)
            .and_then(|e| e.kind.as_mob())
            .map(|m| m.active_effects.iter().any(|e| e.effect_id == effect_id))
            .unwrap_or(false);
        if !has_more {
            break;
        }
        remove_effect(world, mob_oid, effect_id, show_expire_message, now_ms);
    }
}

/// Services DoT/HoT ticks and expirations for one mob at time `now_ms`.
/// Returns the list of (effect_id, is_damage, amount) ticks that fired, for
/// the caller to translate into health changes and `act` messages.
pub fn service_timers(world: &mut World, mob_oid: Oid, now_ms: i64) -> Vec<TimerTick> {
    let mut fired = Vec::new();
    let mut expired_ids = Vec::new();

    if let Some(mob) = world.entity_mut(mob_oid).and_then(|e| e.kind.as_mob_mut()) {
        for inst in mob.active_effects.iter_mut() {
            match inst.kind {
                EffectKind::Dot | EffectKind::Hot => {
                    while inst.next_tick_at_ms.map(|t| now_ms >= t).unwrap_or(false) {
                        if inst.ticks_remaining.unwrap_or(0) == 0 {
                            break;
                        }
                        fired.push(TimerTick {
                            effect_id: inst.effect_id.clone(),
                            is_damage: inst.kind == EffectKind::Dot,
                            amount: inst.tick_amount.unwrap_or(0.0),
                        });
                        inst.ticks_remaining = inst.ticks_remaining.map(|t| t - 1);
                        if let (Some(next), Some(interval)) =
                            (inst.next_tick_at_ms, inst.interval_ms)
                        {
                            inst.next_tick_at_ms = Some(next + interval as i64);
                        }
                    }
                }
                _ => {}
            }
        }
        for inst in &mob.active_effects {
            if inst.is_expired(now_ms) || inst.is_depleted_shield() {
                expired_ids.push(inst.effect_id.clone());
            }
        }
    }

    for id in expired_ids {
        remove_effect(world, mob_oid, &id, true, now_ms);
    }

    fired
}

pub struct TimerTick {
    pub effect_id: String,
    pub is_damage: bool,
    pub amount: f64,
}

/// Serialized form of one effect (§4.6's "Serialization"). Passive
/// archetype (race/job) effects are excluded by the caller before this is
/// invoked — they're re-applied on load instead of persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedEffect {
    pub effect_id: String,
    pub caster_oid: Option<Oid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_tick_in: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticks_remaining: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_absorption: Option<f64>,
}

pub fn serialize_effect(inst: &EffectInstance, now_ms: i64) -> Option<SerializedEffect> {
    if inst.is_expired(now_ms) {
        return None;
    }
    Some(SerializedEffect {
        effect_id: inst.effect_id.clone(),
        caster_oid: inst.caster_oid,
        remaining_duration: inst.expires_at_ms.map(|t| ((t - now_ms).max(0)) as f64 / 1000.0),
        next_tick_in: inst
            .next_tick_at_ms
            .map(|t| ((t - now_ms).max(0)) as f64 / 1000.0),
        ticks_remaining: inst.ticks_remaining,
        tick_amount: inst.tick_amount,
        remaining_absorption: inst.remaining_absorption,
    })
}

pub fn restore_state_from_serialized(s: &SerializedEffect, now_ms: i64) -> RestoreState {
    RestoreState {
        applied_at_ms: Some(now_ms),
        expires_at_ms: s.remaining_duration.map(|secs| now_ms + (secs * 1000.0) as i64),
        next_tick_at_ms: s.next_tick_in.map(|secs| now_ms + (secs * 1000.0) as i64),
        ticks_remaining: s.ticks_remaining,
        tick_amount: s.tick_amount,
        remaining_absorption: s.remaining_absorption,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit;

    #[test]
    fn non_stackable_effect_replaces_previous_instance() {
        let mut world = testkit::fresh_world();
        let (_d, _r, mob) = testkit::mob_in_new_room(&mut world, "npc", false);
        let template = EffectTemplate {
            id: "burning".into(),
            stackable: false,
            on_apply_message: None,
            on_expire_message: None,
            is_offensive: true,
            variant: EffectTemplateVariant::Dot {
                damage: 5.0,
                interval_secs: 2.0,
                duration_secs: 10.0,
            },
        };
        add_effect(&mut world, mob, &template, None, None, 0);
        add_effect(&mut world, mob, &template, None, None, 0);
        let count = world
            .entity(mob)
            .unwrap()
            .kind
            .as_mob()
            .unwrap()
            .active_effects
            .iter()
            .filter(|e| e.effect_id == "burning")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn shield_absorbs_until_depleted() {
        let mut world = testkit::fresh_world();
        let (_d, _r, mob) = testkit::mob_in_new_room(&mut world, "npc", false);
        let template = EffectTemplate {
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
        add_effect(&mut world, mob, &template, None, None, 0);
        let effect = &world.entity(mob).unwrap().kind.as_mob().unwrap().active_effects[0];
        assert_eq!(effect.remaining_absorption, Some(50.0));
        assert!(effect.expires_at_ms.is_none());
    }
}
