//! Attribute math (C1): pure functions over primary/secondary attribute sets
//! and resource caps. No mutable state lives here — mobs hold these as plain
//! values and recompute them via `crate::mob::recompute_attributes`.

use crate::config::WorldConfig;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PrimaryAttributes {
    pub strength: f64,
    pub agility: f64,
    pub intelligence: f64,
}

impl Add for PrimaryAttributes {
    type Output = PrimaryAttributes;
    fn add(self, rhs: PrimaryAttributes) -> PrimaryAttributes {
        PrimaryAttributes {
            strength: self.strength + rhs.strength,
            agility: self.agility + rhs.agility,
            intelligence: self.intelligence + rhs.intelligence,
        }
    }
}

impl Mul<f64> for PrimaryAttributes {
    type Output = PrimaryAttributes;
    fn mul(self, rhs: f64) -> PrimaryAttributes {
        PrimaryAttributes {
            strength: self.strength * rhs,
            agility: self.agility * rhs,
            intelligence: self.intelligence * rhs,
        }
    }
}

impl PrimaryAttributes {
    pub fn sum<'a>(items: impl IntoIterator<Item = &'a PrimaryAttributes>) -> PrimaryAttributes {
        items
            .into_iter()
            .fold(PrimaryAttributes::default(), |acc, v| acc + *v)
    }

    pub fn rounded(self, cfg: &WorldConfig) -> PrimaryAttributes {
        PrimaryAttributes {
            strength: cfg.round_attr(self.strength),
            agility: cfg.round_attr(self.agility),
            intelligence: cfg.round_attr(self.intelligence),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SecondaryAttributes {
    pub attack_power: f64,
    pub defense: f64,
    pub crit_rate: f64,
    pub avoidance: f64,
    pub accuracy: f64,
    pub spell_power: f64,
    pub resilience: f64,
    pub vitality: f64,
    pub wisdom: f64,
    pub endurance: f64,
    pub spirit: f64,
}

impl Add for SecondaryAttributes {
    type Output = SecondaryAttributes;
    fn add(self, rhs: SecondaryAttributes) -> SecondaryAttributes {
        SecondaryAttributes {
            attack_power: self.attack_power + rhs.attack_power,
            defense: self.defense + rhs.defense,
            crit_rate: self.crit_rate + rhs.crit_rate,
            avoidance: self.avoidance + rhs.avoidance,
            accuracy: self.accuracy + rhs.accuracy,
            spell_power: self.spell_power + rhs.spell_power,
            resilience: self.resilience + rhs.resilience,
            vitality: self.vitality + rhs.vitality,
            wisdom: self.wisdom + rhs.wisdom,
            endurance: self.endurance + rhs.endurance,
            spirit: self.spirit + rhs.spirit,
        }
    }
}

impl SecondaryAttributes {
    pub fn sum<'a>(
        items: impl IntoIterator<Item = &'a SecondaryAttributes>,
    ) -> SecondaryAttributes {
        items
            .into_iter()
            .fold(SecondaryAttributes::default(), |acc, v| acc + *v)
    }

    pub fn rounded(self, cfg: &WorldConfig) -> SecondaryAttributes {
        SecondaryAttributes {
            attack_power: cfg.round_attr(self.attack_power),
            defense: cfg.round_attr(self.defense),
            crit_rate: cfg.round_attr(self.crit_rate),
            avoidance: cfg.round_attr(self.avoidance),
            accuracy: cfg.round_attr(self.accuracy),
            spell_power: cfg.round_attr(self.spell_power),
            resilience: cfg.round_attr(self.resilience),
            vitality: cfg.round_attr(self.vitality),
            wisdom: cfg.round_attr(self.wisdom),
            endurance: cfg.round_attr(self.endurance),
            spirit: cfg.round_attr(self.spirit),
        }
    }
}

/// Derives secondary attributes from a primary set. The mapping is a simple
/// linear scaling; callers add equipment/effect secondary bonuses on top
/// (see `crate::mob::recompute_attributes`).
pub fn derive_secondary(primary: &PrimaryAttributes) -> SecondaryAttributes {
    SecondaryAttributes {
        attack_power: primary.strength * 1.0,
        defense: primary.agility * 0.25,
        crit_rate: primary.agility * 0.1,
        avoidance: primary.agility * 0.2,
        accuracy: primary.agility * 0.3 + primary.intelligence * 0.1,
        spell_power: primary.intelligence * 1.0,
        resilience: primary.intelligence * 0.2,
        vitality: primary.strength * 0.5 + primary.agility * 0.2,
        wisdom: primary.intelligence * 0.5,
        endurance: primary.strength * 0.3,
        spirit: primary.intelligence * 0.3,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceCaps {
    pub max_health: f64,
    pub max_mana: f64,
}

impl Add for ResourceCaps {
    type Output = ResourceCaps;
    fn add(self, rhs: ResourceCaps) -> ResourceCaps {
        ResourceCaps {
            max_health: self.max_health + rhs.max_health,
            max_mana: self.max_mana + rhs.max_mana,
        }
    }
}

impl Mul<f64> for ResourceCaps {
    type Output = ResourceCaps;
    fn mul(self, rhs: f64) -> ResourceCaps {
        ResourceCaps {
            max_health: self.max_health * rhs,
            max_mana: self.max_mana * rhs,
        }
    }
}

impl ResourceCaps {
    pub fn sum<'a>(items: impl IntoIterator<Item = &'a ResourceCaps>) -> ResourceCaps {
        items
            .into_iter()
            .fold(ResourceCaps::default(), |acc, v| acc + *v)
    }

    /// Applies the vitality/wisdom derivation rule on top of an
    /// already-summed base: `maxHealth += vitality * health_per_vitality`.
    pub fn with_vitality_wisdom(
        mut self,
        secondary: &SecondaryAttributes,
        cfg: &WorldConfig,
    ) -> ResourceCaps {
        self.max_health += secondary.vitality * cfg.health_per_vitality;
        self.max_mana += secondary.wisdom * cfg.mana_per_wisdom;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secondary_sum_is_componentwise() {
        let a = SecondaryAttributes {
            attack_power: 1.0,
            ..Default::default()
        };
        let b = SecondaryAttributes {
            attack_power: 2.0,
            defense: 3.0,
            ..Default::default()
        };
        let sum = SecondaryAttributes::sum([&a, &b]);
        assert_eq!(sum.attack_power, 3.0);
        assert_eq!(sum.defense, 3.0);
    }

    #[test]
    fn resource_caps_apply_vitality_wisdom() {
        let cfg = WorldConfig::default();
        let caps = ResourceCaps::default();
        let secondary = SecondaryAttributes {
            vitality: 10.0,
            wisdom: 5.0,
            ..Default::default()
        };
        let result = caps.with_vitality_wisdom(&secondary, &cfg);
        assert_eq!(result.max_health, 10.0 * cfg.health_per_vitality);
        assert_eq!(result.max_mana, 5.0 * cfg.mana_per_wisdom);
    }
}
