//! Enemy snapshots
//!
//! Enemies carry already-effective stats and live only as long as the
//! session that spawned them.

use serde::{Deserialize, Serialize};

use sellsword_core::EnemyId;

use crate::combat::skill::SkillSet;
use crate::roster::stats::EffectiveStats;

/// An enemy as stored in the session's `enemies` snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enemy {
    #[serde(default)]
    pub id: EnemyId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub max_hp: i32,
    #[serde(default)]
    pub current_hp: i32,
    #[serde(default)]
    pub ap: i32,
    #[serde(default)]
    pub def: i32,
    #[serde(default)]
    pub spd: i32,
    #[serde(default)]
    pub action_gauge: f64,
    #[serde(default)]
    pub skills: SkillSet,
}

impl Enemy {
    /// A fresh enemy at full health with an empty gauge
    pub fn new(name: impl Into<String>, max_hp: i32, ap: i32, def: i32, spd: i32) -> Self {
        Self {
            id: EnemyId::generate(),
            name: name.into(),
            max_hp,
            current_hp: max_hp,
            ap,
            def,
            spd,
            action_gauge: 0.0,
            skills: SkillSet::default(),
        }
    }

    /// Stats as the engine sees them (max HP and AP at least 1)
    pub fn stats(&self) -> EffectiveStats {
        EffectiveStats {
            max_hp: self.max_hp,
            ap: self.ap,
            def: self.def,
            spd: self.spd,
        }
        .clamped()
    }

    pub fn is_alive(&self) -> bool {
        self.current_hp > 0
    }
}
