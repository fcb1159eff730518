//! Combat sessions and mission launch
//!
//! [`CombatSession`] is the persisted, authoritative snapshot of a battle.
//! Setting `active` to false is the only termination signal other clients
//! observe.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use sellsword_core::{SessionId, TroopId};

use super::context::{CombatContext, Fighter, FighterCounters};
use super::engine::TurnEngine;
use super::enemy::Enemy;
use super::error::CombatError;
use super::log::BattleLog;
use super::resolution::ResolutionPlan;
use crate::roster::troop::Troop;

/// Resolution stored on the session before any reward is written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionRecord {
    pub plan: ResolutionPlan,
    #[serde(default)]
    pub committed: bool,
}

/// Persisted battle snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatSession {
    #[serde(default)]
    pub id: SessionId,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub enemies: Vec<Enemy>,
    #[serde(default)]
    pub troop_ids: Vec<TroopId>,
    #[serde(default)]
    pub log: Vec<String>,
    #[serde(default)]
    pub tick: u64,
    /// Attack counters and skill charges of every fighter as of `tick`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub counters: Vec<FighterCounters>,
    /// Mission the enemies were spawned from, used to find the loot table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mission_id: Option<String>,
    #[serde(default = "Utc::now")]
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<ResolutionRecord>,
}

impl CombatSession {
    /// A fresh, active session
    pub fn new(troop_ids: Vec<TroopId>, enemies: Vec<Enemy>) -> Self {
        Self {
            id: SessionId::generate(),
            active: true,
            enemies,
            troop_ids,
            log: Vec::new(),
            tick: 0,
            counters: Vec::new(),
            mission_id: None,
            started_at: Utc::now(),
            resolution: None,
        }
    }

    /// Copy the engine's enemy snapshot, counters, log and tick into the
    /// record. `active` is left alone; only resolution closes a session.
    pub fn record_tick(&mut self, engine: &TurnEngine) {
        self.enemies = engine.enemy_snapshot();
        self.counters = engine.context().counters();
        self.log = engine.log().to_vec();
        self.tick = engine.tick_count();
    }

    /// Per-tick patch for the stored record
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            session_id: self.id.clone(),
            enemies: self.enemies.clone(),
            counters: self.counters.clone(),
            log: self.log.clone(),
            tick: self.tick,
        }
    }

    /// Apply a per-tick patch if it belongs to this session
    pub fn apply_progress(&mut self, progress: &SessionProgress) -> bool {
        if progress.session_id != self.id {
            return false;
        }
        self.enemies = progress.enemies.clone();
        self.counters = progress.counters.clone();
        self.log = progress.log.clone();
        self.tick = progress.tick;
        true
    }

    /// Closed with a resolution that never finished committing
    pub fn needs_recovery(&self) -> bool {
        !self.active && self.resolution.as_ref().is_some_and(|r| !r.committed)
    }

    pub fn pending_plan(&self) -> Option<&ResolutionPlan> {
        self.resolution
            .as_ref()
            .filter(|r| !r.committed)
            .map(|r| &r.plan)
    }
}

/// The fields a tick changes on the session record. Leaves `active` and
/// `resolution` alone so a close made elsewhere is never overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProgress {
    pub session_id: SessionId,
    pub enemies: Vec<Enemy>,
    #[serde(default)]
    pub counters: Vec<FighterCounters>,
    pub log: Vec<String>,
    pub tick: u64,
}

/// Combat fields written back to a troop record after a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TroopCombatDelta {
    pub troop_id: TroopId,
    pub current_hp: i32,
    pub action_gauge: f64,
    pub battle_kills: u32,
    pub combat_hit_count: u32,
    pub combat_attack_count: u32,
    pub in_combat: bool,
}

impl TroopCombatDelta {
    /// Delta for a troop fighter; `None` for enemies
    pub fn from_fighter(fighter: &Fighter) -> Option<Self> {
        Some(Self {
            troop_id: fighter.troop_id()?.clone(),
            current_hp: fighter.current_hp,
            action_gauge: fighter.gauge,
            battle_kills: fighter.counters.kills,
            combat_hit_count: fighter.counters.hits,
            combat_attack_count: fighter.counters.attacks,
            in_combat: true,
        })
    }

    pub fn apply_to(&self, troop: &mut Troop) {
        troop.current_hp = Some(self.current_hp);
        troop.action_gauge = self.action_gauge;
        troop.battle_kills = self.battle_kills;
        troop.combat_hit_count = self.combat_hit_count;
        troop.combat_attack_count = self.combat_attack_count;
        troop.in_combat = self.in_combat;
    }
}

/// A freshly launched battle
#[derive(Debug, Clone)]
pub struct Launch {
    /// Already fighting
    pub engine: TurnEngine,
    pub session: CombatSession,
    /// Participating troop records, reset for combat
    pub troops: Vec<Troop>,
}

/// Start a battle with the selected troops.
///
/// Unknown, dead, already engaged and duplicate selections are dropped
/// silently. Selected troops enter combat with an empty gauge and zeroed
/// counters.
pub fn launch(
    roster: &[Troop],
    selection: &[TroopId],
    enemies: Vec<Enemy>,
    log_capacity: usize,
) -> Result<Launch, CombatError> {
    let mut troops: Vec<Troop> = Vec::new();
    for id in selection {
        if troops.iter().any(|t| &t.id == id) {
            continue;
        }
        match roster.iter().find(|t| &t.id == id) {
            Some(troop) if troop.is_available() => troops.push(troop.clone()),
            Some(_) => debug!("Skipping unavailable troop {}", id),
            None => debug!("Skipping unknown troop {}", id),
        }
    }
    if troops.is_empty() {
        return Err(CombatError::EmptyRoster);
    }
    if !enemies.iter().any(Enemy::is_alive) {
        return Err(CombatError::NoEnemies);
    }

    for troop in &mut troops {
        troop.action_gauge = 0.0;
        troop.in_combat = true;
        troop.battle_kills = 0;
        troop.combat_hit_count = 0;
        troop.combat_attack_count = 0;
    }

    let context = CombatContext::new(&troops, &enemies);
    let mut engine = TurnEngine::new(context, BattleLog::new(log_capacity), 0);
    engine.start()?;

    let session = CombatSession::new(troops.iter().map(|t| t.id.clone()).collect(), enemies);
    Ok(Launch {
        engine,
        session,
        troops,
    })
}
