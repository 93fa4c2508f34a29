//! Mob state (C6): equipment, resources, experience/leveling, abilities,
//! and the behavior flags that drive combat (C7).

use super::types::EquipSlot;
use crate::attributes::{PrimaryAttributes, ResourceCaps, SecondaryAttributes};
use crate::combat::ThreatTable;
use crate::effects::EffectInstance;
use crate::ids::Oid;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MobBehaviors {
    pub aggressive: bool,
    pub wimpy: bool,
    pub wander: bool,
    pub shopkeeper: bool,
}

/// Derived, cached attribute snapshot recomputed by
/// `crate::mob::recompute_attributes`. Not an independent source of truth —
/// always a pure function of race/job/level/bonuses/equipment/effects.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DerivedAttributes {
    pub primary: PrimaryAttributes,
    pub secondary: SecondaryAttributes,
    pub caps: ResourceCaps,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MobData {
    pub race: String,
    pub job: String,
    pub level: u32,
    pub experience: u32,

    pub attribute_bonuses: PrimaryAttributes,
    pub resource_bonuses: ResourceCaps,

    pub health: u32,
    pub mana: u32,
    pub exhaustion: u32,

    pub derived: DerivedAttributes,

    pub equipped: HashMap<EquipSlot, Oid>,
    pub learned_abilities: HashMap<String, u32>,
    pub proficiency_snapshot: HashMap<String, u8>,

    pub active_effects: Vec<EffectInstance>,

    /// Opaque back-reference to the controlling player character, if any.
    /// Invariant 4 (bidirectional character<->mob) is maintained by
    /// `crate::mob::set_character`/`clear_character`, never by direct field
    /// assignment.
    pub character_ref: Option<String>,

    pub combat_target: Option<Oid>,
    pub threat_table: Option<ThreatTable>,

    pub behaviors: MobBehaviors,
    pub shopkeeper_inventory: Option<Oid>,

    /// An AI script string, stored verbatim and handed to an external
    /// evaluator (§1 non-goals: no scripting-language embedding here).
    pub ai_script: Option<String>,
    pub has_ai_sink: bool,
}

impl MobData {
    pub fn new(race: impl Into<String>, job: impl Into<String>, level: u32) -> Self {
        MobData {
            race: race.into(),
            job: job.into(),
            level,
            experience: 0,
            attribute_bonuses: PrimaryAttributes::default(),
            resource_bonuses: ResourceCaps::default(),
            health: 0,
            mana: 0,
            exhaustion: 0,
            derived: DerivedAttributes::default(),
            equipped: HashMap::new(),
            learned_abilities: HashMap::new(),
            proficiency_snapshot: HashMap::new(),
            active_effects: Vec::new(),
            character_ref: None,
            combat_target: None,
            threat_table: None,
            behaviors: MobBehaviors::default(),
            shopkeeper_inventory: None,
            ai_script: None,
            has_ai_sink: false,
        }
    }

    pub fn is_player_controlled(&self) -> bool {
        self.character_ref.is_some()
    }

    pub fn is_npc(&self) -> bool {
        !self.is_player_controlled()
    }

    pub fn in_combat(&self) -> bool {
        self.combat_target.is_some()
    }

    /// §9 design note: fixes the source's `knowsAbility` bug (it compared an
    /// argument to itself). This compares a candidate ability id against the
    /// learned-abilities table by identity of id.
    pub fn knows_ability(&self, ability_id: &str) -> bool {
        self.learned_abilities.contains_key(ability_id)
    }
}
