//! Stat model and progression
//!
//! Derives effective combat stats from base stats, level and equipment, and
//! tracks XP and level-ups.

use serde::{Deserialize, Serialize};

use crate::combat::equipment::EquipmentSet;

/// Highest level a troop can reach
pub const MAX_LEVEL: u32 = 10;

/// Cumulative XP needed to advance from level `i + 1` to level `i + 2`
pub const XP_THRESHOLDS: [u64; (MAX_LEVEL - 1) as usize] =
    [100, 250, 450, 700, 1000, 1400, 1900, 2500, 3200];

/// Stored base stats of a troop. Missing fields read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseStats {
    pub hp: f64,
    pub ap: f64,
    pub def: f64,
    pub spd: f64,
}

impl BaseStats {
    pub fn new(hp: f64, ap: f64, def: f64, spd: f64) -> Self {
        Self { hp, ap, def, spd }
    }
}

/// Effective combat stats after level scaling and equipment.
/// `max_hp` and `ap` are always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveStats {
    pub max_hp: i32,
    pub ap: i32,
    pub def: i32,
    pub spd: i32,
}

impl EffectiveStats {
    /// Clamp the stats that must stay positive
    pub fn clamped(self) -> Self {
        Self {
            max_hp: self.max_hp.max(1),
            ap: self.ap.max(1),
            ..self
        }
    }

    /// `current_hp` as a fraction of max HP
    pub fn hp_fraction(&self, current_hp: i32) -> f64 {
        if self.max_hp <= 0 {
            return 0.0;
        }
        current_hp as f64 / self.max_hp as f64
    }
}

/// Per-level stat growth rates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatGrowth {
    pub hp_per_level: f64,
    pub ap_per_level: f64,
    pub def_per_level: f64,
    pub spd_per_level: f64,
}

impl Default for StatGrowth {
    fn default() -> Self {
        Self {
            hp_per_level: 10.0,
            ap_per_level: 2.0,
            def_per_level: 1.0,
            spd_per_level: 1.0,
        }
    }
}

impl StatGrowth {
    /// Level-scaled stats before equipment: `floor(base + (level - 1) * growth)`
    pub fn scale(&self, base: &BaseStats, level: u32) -> EffectiveStats {
        let levels = level.max(1).saturating_sub(1) as f64;
        EffectiveStats {
            max_hp: (base.hp + levels * self.hp_per_level).floor() as i32,
            ap: (base.ap + levels * self.ap_per_level).floor() as i32,
            def: (base.def + levels * self.def_per_level).floor() as i32,
            spd: (base.spd + levels * self.spd_per_level).floor() as i32,
        }
    }
}

/// Effective stats of a troop with the default growth curve
pub fn effective_stats(base: &BaseStats, level: u32, equipment: &EquipmentSet) -> EffectiveStats {
    let scaled = StatGrowth::default().scale(base, level);
    let mods = equipment.total_modifiers();
    EffectiveStats {
        max_hp: scaled.max_hp + mods.max_hp,
        ap: scaled.ap + mods.ap,
        def: scaled.def + mods.def,
        spd: scaled.spd + mods.spd,
    }
    .clamped()
}

/// Cumulative XP required to leave `level`, or `None` at the cap
pub fn xp_for_next_level(level: u32) -> Option<u64> {
    if level >= MAX_LEVEL {
        return None;
    }
    XP_THRESHOLDS.get(level.max(1) as usize - 1).copied()
}

/// Level and XP of a troop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    pub level: u32,
    /// Total XP earned
    pub xp: u64,
}

impl Default for Progression {
    fn default() -> Self {
        Self { level: 1, xp: 0 }
    }
}

impl Progression {
    pub fn new(level: u32, xp: u64) -> Self {
        Self {
            level: level.clamp(1, MAX_LEVEL),
            xp,
        }
    }

    /// Add XP. Gains at most one level per call, even if the XP would cover
    /// several thresholds. Returns the new level if one was gained.
    pub fn add_xp(&mut self, amount: u64) -> Option<u32> {
        self.xp = self.xp.saturating_add(amount);
        let needed = xp_for_next_level(self.level)?;
        if self.xp >= needed {
            self.level += 1;
            Some(self.level)
        } else {
            None
        }
    }
}
