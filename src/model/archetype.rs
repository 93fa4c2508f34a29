//! Race/job archetypes and abilities (§3 GLOSSARY: "Archetype"). These are
//! content, resolved by id through `crate::ports::ArchetypeResolver` — the
//! core never hardcodes a race or job list.

use crate::attributes::{PrimaryAttributes, ResourceCaps};
use serde::{Deserialize, Serialize};

/// The growth-modifier polynomial referenced by §4.4's `GainExperience`.
/// Kept as a small closed set of common shapes plus an escape hatch, rather
/// than a raw function pointer, so it can be serialized as part of content
/// data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GrowthCurve {
    /// Constant modifier regardless of level.
    Flat(f64),
    /// `base + slope * (level - 1)`.
    Linear { base: f64, slope: f64 },
    /// `base * level.powf(exponent)`.
    Power { base: f64, exponent: f64 },
}

impl GrowthCurve {
    pub fn evaluate(&self, level: u32) -> f64 {
        let level = level as f64;
        let raw = match self {
            GrowthCurve::Flat(v) => *v,
            GrowthCurve::Linear { base, slope } => base + slope * (level - 1.0),
            GrowthCurve::Power { base, exponent } => base * level.powf(*exponent),
        };
        raw.max(0.0001)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchetypeAbilityGrant {
    pub ability_id: String,
    pub level: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Race {
    pub id: String,
    pub start_primary: PrimaryAttributes,
    pub growth_primary: PrimaryAttributes,
    pub start_resources: ResourceCaps,
    pub growth_resources: ResourceCaps,
    pub archetype_abilities: Vec<ArchetypeAbilityGrant>,
    pub level_modifier: GrowthCurve,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub start_primary: PrimaryAttributes,
    pub growth_primary: PrimaryAttributes,
    pub start_resources: ResourceCaps,
    pub growth_resources: ResourceCaps,
    pub archetype_abilities: Vec<ArchetypeAbilityGrant>,
    pub level_modifier: GrowthCurve,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ability {
    pub id: String,
    pub display_name: String,
    /// Maps use-count to a proficiency percentage in `0..=100`.
    pub proficiency_curve: ProficiencyCurve,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProficiencyCurve {
    /// Reaches 100% after `uses_to_cap` uses, linearly.
    Linear { uses_to_cap: u32 },
}

impl ProficiencyCurve {
    pub fn evaluate(&self, use_count: u32) -> u8 {
        match self {
            ProficiencyCurve::Linear { uses_to_cap } => {
                if *uses_to_cap == 0 {
                    100
                } else {
                    let pct = (use_count as f64 / *uses_to_cap as f64 * 100.0).min(100.0);
                    pct.floor() as u8
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_curve_linear() {
        let g = GrowthCurve::Linear { base: 1.0, slope: 0.1 };
        assert_eq!(g.evaluate(1), 1.0);
        assert!((g.evaluate(11) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn proficiency_caps_at_100() {
        let c = ProficiencyCurve::Linear { uses_to_cap: 10 };
        assert_eq!(c.evaluate(0), 0);
        assert_eq!(c.evaluate(5), 50);
        assert_eq!(c.evaluate(20), 100);
    }
}
