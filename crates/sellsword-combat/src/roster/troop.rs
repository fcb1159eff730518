//! Durable troop records
//!
//! The document shape shared with the rest of the application. Combat only
//! reads base stats, level and equipment and writes back the per-combat
//! fields; crafting skills are carried through untouched.

use serde::{Deserialize, Serialize};

use sellsword_core::TroopId;

use super::stats::{effective_stats, BaseStats, EffectiveStats, Progression};
use crate::combat::equipment::EquipmentSet;
use crate::combat::skill::SkillSet;

fn default_level() -> u32 {
    1
}

/// Battle history of a troop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Lore {
    pub missions_won: u32,
    pub kills: u32,
    pub close_calls: u32,
}

/// A recruited troop as stored in the document store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Troop {
    pub id: TroopId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub base_stats: BaseStats,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub xp: u64,
    #[serde(default)]
    pub lore: Lore,
    #[serde(default)]
    pub cooking: u32,
    #[serde(default)]
    pub smithing: u32,
    #[serde(default)]
    pub equipment: EquipmentSet,
    #[serde(default)]
    pub skills: SkillSet,
    /// `None` means full health
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_hp: Option<i32>,
    #[serde(default)]
    pub action_gauge: f64,
    #[serde(default)]
    pub in_combat: bool,
    #[serde(default)]
    pub battle_kills: u32,
    #[serde(default)]
    pub combat_hit_count: u32,
    #[serde(default)]
    pub combat_attack_count: u32,
}

impl Troop {
    /// Create a fresh level-1 troop at full health
    pub fn new(id: TroopId, name: impl Into<String>, base_stats: BaseStats) -> Self {
        Self {
            id,
            name: name.into(),
            base_stats,
            level: 1,
            xp: 0,
            lore: Lore::default(),
            cooking: 0,
            smithing: 0,
            equipment: EquipmentSet::new(),
            skills: SkillSet::default(),
            current_hp: None,
            action_gauge: 0.0,
            in_combat: false,
            battle_kills: 0,
            combat_hit_count: 0,
            combat_attack_count: 0,
        }
    }

    /// Effective combat stats from base stats, level and equipment
    pub fn effective_stats(&self) -> EffectiveStats {
        effective_stats(&self.base_stats, self.level, &self.equipment)
    }

    /// Current HP, clamped to `[0, max_hp]`
    pub fn hp(&self) -> i32 {
        let max_hp = self.effective_stats().max_hp;
        self.current_hp.unwrap_or(max_hp).clamp(0, max_hp)
    }

    pub fn is_alive(&self) -> bool {
        self.hp() > 0
    }

    /// Alive and not already engaged in another battle
    pub fn is_available(&self) -> bool {
        self.is_alive() && !self.in_combat
    }

    pub fn progression(&self) -> Progression {
        Progression::new(self.level, self.xp)
    }

    /// Display name, falling back to the id for unnamed records
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.id.as_str()
        } else {
            &self.name
        }
    }
}
