//! Per-session combat context
//!
//! An arena of fighters indexed by position. Troops come first in roster
//! order, then enemies in spawn order; the arena order doubles as the final
//! tie-break for actor selection. Counters and skill charges live here; the
//! session record carries a copy of them so a resumed battle keeps spent
//! charges spent.

use serde::{Deserialize, Serialize};
use tracing::debug;

use sellsword_core::{EnemyId, TroopId};

use super::enemy::Enemy;
use crate::combat::skill::{SkillId, SkillSet, FLICKER_CHARGES, FLICKER_SPEED_MULTIPLIER};
use crate::roster::stats::EffectiveStats;
use crate::roster::troop::Troop;

/// Which side of the battlefield a fighter is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Troops,
    Enemies,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Troops => Side::Enemies,
            Side::Enemies => Side::Troops,
        }
    }
}

/// Identity of a fighter, pointing back at its source record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "side", content = "id", rename_all = "snake_case")]
pub enum FighterKey {
    Troop(TroopId),
    Enemy(EnemyId),
}

impl FighterKey {
    pub fn side(&self) -> Side {
        match self {
            FighterKey::Troop(_) => Side::Troops,
            FighterKey::Enemy(_) => Side::Enemies,
        }
    }
}

/// Session-only counters. Skill charges stay `None` until first relevant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CombatCounters {
    pub attacks: u32,
    pub hits: u32,
    pub kills: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flicker_charges: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mindset_charges: Option<u8>,
}

/// Counters of one fighter as stored on the session record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FighterCounters {
    pub fighter: FighterKey,
    #[serde(default)]
    pub counters: CombatCounters,
}

/// A combatant inside the arena
#[derive(Debug, Clone, PartialEq)]
pub struct Fighter {
    pub key: FighterKey,
    pub name: String,
    pub stats: EffectiveStats,
    pub current_hp: i32,
    pub gauge: f64,
    pub skill: Option<SkillId>,
    pub counters: CombatCounters,
}

impl Fighter {
    /// Build a fighter from a troop record, picking up its persisted counters
    pub fn from_troop(troop: &Troop) -> Self {
        Self {
            key: FighterKey::Troop(troop.id.clone()),
            name: troop.display_name().to_string(),
            stats: troop.effective_stats(),
            current_hp: troop.hp(),
            gauge: sanitize_gauge(troop.action_gauge),
            skill: troop.skills.row1,
            counters: CombatCounters {
                attacks: troop.combat_attack_count,
                hits: troop.combat_hit_count,
                kills: troop.battle_kills,
                ..Default::default()
            },
        }
    }

    pub fn from_enemy(enemy: &Enemy) -> Self {
        let stats = enemy.stats();
        Self {
            key: FighterKey::Enemy(enemy.id.clone()),
            name: if enemy.name.is_empty() {
                enemy.id.to_string()
            } else {
                enemy.name.clone()
            },
            stats,
            current_hp: enemy.current_hp.clamp(0, stats.max_hp),
            gauge: sanitize_gauge(enemy.action_gauge),
            skill: enemy.skills.row1,
            counters: CombatCounters::default(),
        }
    }

    pub fn side(&self) -> Side {
        self.key.side()
    }

    pub fn is_alive(&self) -> bool {
        self.current_hp > 0
    }

    pub fn troop_id(&self) -> Option<&TroopId> {
        match &self.key {
            FighterKey::Troop(id) => Some(id),
            FighterKey::Enemy(_) => None,
        }
    }

    /// Gauge gain for this tick. Grants flicker charges on first use.
    pub fn gauge_gain(&mut self) -> f64 {
        let spd = self.stats.spd as f64;
        if self.skill != Some(SkillId::ElvishFlicker) {
            return spd;
        }
        let name = &self.name;
        let charges = *self.counters.flicker_charges.get_or_insert_with(|| {
            debug!("{} gains {} flicker charges", name, FLICKER_CHARGES);
            FLICKER_CHARGES
        });
        if charges > 0 {
            spd * FLICKER_SPEED_MULTIPLIER
        } else {
            spd
        }
    }

    /// Spend one flicker charge after a completed action
    pub fn consume_flicker(&mut self) {
        if let Some(charges) = self.counters.flicker_charges.as_mut() {
            *charges = charges.saturating_sub(1);
        }
    }

    /// Current state as an enemy snapshot, or `None` for troops
    pub fn to_enemy(&self) -> Option<Enemy> {
        let FighterKey::Enemy(id) = &self.key else {
            return None;
        };
        Some(Enemy {
            id: id.clone(),
            name: self.name.clone(),
            max_hp: self.stats.max_hp,
            current_hp: self.current_hp,
            ap: self.stats.ap,
            def: self.stats.def,
            spd: self.stats.spd,
            action_gauge: self.gauge,
            skills: SkillSet { row1: self.skill },
        })
    }
}

/// Persisted gauges start each combat in `[0, 100)`; anything else is reset
fn sanitize_gauge(gauge: f64) -> f64 {
    if gauge.is_finite() && gauge >= 0.0 {
        gauge
    } else {
        0.0
    }
}

/// The arena of one battle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombatContext {
    fighters: Vec<Fighter>,
}

impl CombatContext {
    /// Troops in roster order, then enemies in spawn order
    pub fn new(troops: &[Troop], enemies: &[Enemy]) -> Self {
        let fighters = troops
            .iter()
            .map(Fighter::from_troop)
            .chain(enemies.iter().map(Fighter::from_enemy))
            .collect();
        Self { fighters }
    }

    pub fn fighters(&self) -> &[Fighter] {
        &self.fighters
    }

    pub fn fighters_mut(&mut self) -> &mut [Fighter] {
        &mut self.fighters
    }

    pub fn get(&self, index: usize) -> Option<&Fighter> {
        self.fighters.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Fighter> {
        self.fighters.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.fighters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fighters.is_empty()
    }

    /// Arena index of the fighter with `key`
    pub fn position(&self, key: &FighterKey) -> Option<usize> {
        self.fighters.iter().position(|f| &f.key == key)
    }

    /// Counters of every fighter in arena order
    pub fn counters(&self) -> Vec<FighterCounters> {
        self.fighters
            .iter()
            .map(|f| FighterCounters {
                fighter: f.key.clone(),
                counters: f.counters,
            })
            .collect()
    }

    /// Put stored counters back on the matching fighters. Entries for
    /// fighters that are no longer in the arena are skipped. Returns how
    /// many were restored.
    pub fn restore_counters(&mut self, stored: &[FighterCounters]) -> usize {
        let mut restored = 0;
        for entry in stored {
            match self.position(&entry.fighter) {
                Some(index) => {
                    self.fighters[index].counters = entry.counters;
                    restored += 1;
                }
                None => debug!("No fighter for stored counters {:?}", entry.fighter),
            }
        }
        restored
    }

    /// Indices of living fighters on `side`
    pub fn living(&self, side: Side) -> Vec<usize> {
        self.fighters
            .iter()
            .enumerate()
            .filter(|(_, f)| f.side() == side && f.is_alive())
            .map(|(i, _)| i)
            .collect()
    }

    /// No fighter on `side` is alive (an empty side counts as wiped)
    pub fn side_wiped(&self, side: Side) -> bool {
        !self
            .fighters
            .iter()
            .any(|f| f.side() == side && f.is_alive())
    }

    pub fn troop_indices(&self) -> Vec<usize> {
        self.fighters
            .iter()
            .enumerate()
            .filter(|(_, f)| f.side() == Side::Troops)
            .map(|(i, _)| i)
            .collect()
    }
}
