//! Tuning configuration (C13): every numeric constant the spec names, in one
//! place instead of scattered through the resolvers.

#[derive(Debug, Clone, PartialEq)]
pub struct WorldConfig {
    /// `maxHealth += vitality * health_per_vitality`
    pub health_per_vitality: f64,
    /// `maxMana += wisdom * mana_per_wisdom`
    pub mana_per_wisdom: f64,
    /// XP required per level (spec: 100).
    pub experience_threshold: u32,
    /// Threat-decay cycle period, in milliseconds (spec: 10s).
    pub threat_decay_interval_ms: u64,
    /// Multiplicative threat decay applied to non-grace entries (spec: 0.67).
    pub threat_decay_factor: f64,
    /// Threat entries decaying below this value are dropped (spec: 100).
    pub threat_floor: f64,
    /// Wimpy mobs consider fleeing at or below this HP fraction (spec: 0.25).
    pub wimpy_threshold_pct: f64,
    /// Decimal places primary/secondary attribute math rounds to.
    pub attribute_round_decimals: u32,
    /// Fraction of max health restored per regen tick (spec §4.8 names the
    /// registry but leaves the rate to the embedder's balance data; this is
    /// `mudcore`'s default, overridable like every other tunable here).
    pub health_regen_pct_per_tick: f64,
    /// Fraction of max mana restored per regen tick.
    pub mana_regen_pct_per_tick: f64,
    /// Flat exhaustion recovered per regen tick.
    pub exhaustion_recovery_per_tick: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            health_per_vitality: 10.0,
            mana_per_wisdom: 10.0,
            experience_threshold: 100,
            threat_decay_interval_ms: 10_000,
            threat_decay_factor: 0.67,
            threat_floor: 100.0,
            wimpy_threshold_pct: 0.25,
            attribute_round_decimals: 2,
            health_regen_pct_per_tick: 0.02,
            mana_regen_pct_per_tick: 0.02,
            exhaustion_recovery_per_tick: 1,
        }
    }
}

impl WorldConfig {
    pub fn round_attr(&self, value: f64) -> f64 {
        let factor = 10f64.powi(self.attribute_round_decimals as i32);
        (value * factor).round() / factor
    }
}
