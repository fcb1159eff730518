//! Damage calculation pipeline
//!
//! Flat stat modifiers carried by items, and the attack damage roll.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Lower bound of the random damage variance
pub const DAMAGE_VARIANCE_MIN: f64 = 0.8;
/// Upper bound (exclusive) of the random damage variance
pub const DAMAGE_VARIANCE_MAX: f64 = 1.2;
/// Damage never drops below this, whatever the target's defense
pub const MIN_DAMAGE: i32 = 1;

/// Flat stat deltas from equipment. Any field may be negative (cursed or
/// tradeoff gear) and missing fields deserialize as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatModifiers {
    pub max_hp: i32,
    pub ap: i32,
    pub def: i32,
    pub spd: i32,
}

impl StatModifiers {
    /// Add another set of modifiers onto this one
    pub fn add(&mut self, other: &StatModifiers) {
        self.max_hp = self.max_hp.saturating_add(other.max_hp);
        self.ap = self.ap.saturating_add(other.ap);
        self.def = self.def.saturating_add(other.def);
        self.spd = self.spd.saturating_add(other.spd);
    }
}

/// Result of a damage roll
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageRoll {
    /// Variance factor drawn from `[0.8, 1.2)`
    pub variance: f64,
    /// Damage before the floor was applied (may be negative)
    pub raw: f64,
    /// Damage actually dealt, at least `MIN_DAMAGE`
    pub amount: i32,
}

/// Damage formula with an explicit variance factor.
///
/// `raw = ap * modifier * variance - def`, `amount = max(1, floor(raw))`
pub fn damage_with_variance(attack: i32, modifier: f64, variance: f64, target_defense: i32) -> DamageRoll {
    let raw = attack as f64 * modifier * variance - target_defense as f64;
    let amount = (raw.floor() as i32).max(MIN_DAMAGE);
    DamageRoll {
        variance,
        raw,
        amount,
    }
}

/// Roll attack damage against a target
pub fn roll_damage<R: Rng + ?Sized>(
    rng: &mut R,
    attack: i32,
    modifier: f64,
    target_defense: i32,
) -> DamageRoll {
    let variance = rng.gen_range(DAMAGE_VARIANCE_MIN..DAMAGE_VARIANCE_MAX);
    damage_with_variance(attack, modifier, variance, target_defense)
}
