//! Victory and defeat post-processing
//!
//! Builds a [`ResolutionPlan`]: the absolute post-battle value of every
//! write the battle causes. The plan is computed once, stored, and may be
//! replayed any number of times without re-rolling XP or loot.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sellsword_core::{ItemId, SessionId, TroopId};

use super::engine::TurnEngine;
use super::error::CombatError;
use super::log::BattleOutcome;
use super::loot::{LootTable, GATHERER_ITEM_ID};
use crate::combat::item::Item;
use crate::roster::troop::{Lore, Troop};

/// Reward tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardRules {
    pub xp_per_victory: u64,
    pub gold_per_victory: u64,
    /// Survivors ending at or below this HP fraction earn a close call
    pub close_call_fraction: f64,
}

impl Default for RewardRules {
    fn default() -> Self {
        Self {
            xp_per_victory: 20,
            gold_per_victory: 15,
            close_call_fraction: 0.05,
        }
    }
}

/// Post-battle state of one survivor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TroopUpdate {
    pub troop_id: TroopId,
    pub current_hp: i32,
    pub level: u32,
    pub xp: u64,
    pub lore: Lore,
    #[serde(default)]
    pub leveled_up: bool,
}

impl TroopUpdate {
    /// Write the update and clear every per-combat field
    pub fn apply_to(&self, troop: &mut Troop) {
        troop.current_hp = Some(self.current_hp);
        troop.level = self.level;
        troop.xp = self.xp;
        troop.lore = self.lore;
        troop.in_combat = false;
        troop.action_gauge = 0.0;
        troop.battle_kills = 0;
        troop.combat_hit_count = 0;
        troop.combat_attack_count = 0;
    }
}

/// Everything a finished battle writes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionPlan {
    pub session_id: SessionId,
    pub outcome: BattleOutcome,
    #[serde(default)]
    pub updates: Vec<TroopUpdate>,
    /// Troops to delete
    #[serde(default)]
    pub fallen: Vec<TroopId>,
    #[serde(default)]
    pub loot: Vec<Item>,
    #[serde(default)]
    pub gold: u64,
}

/// Plan the resolution of a finished battle.
///
/// `troops` are the participants' records as they were at launch or resume.
/// Final HP and kills come from the engine.
pub fn plan_resolution<R: Rng + ?Sized>(
    engine: &TurnEngine,
    session_id: SessionId,
    troops: &[Troop],
    loot_table: &LootTable,
    rules: &RewardRules,
    rng: &mut R,
) -> Result<ResolutionPlan, CombatError> {
    let outcome = engine.outcome().ok_or(CombatError::BattleNotOver)?;
    let mut plan = ResolutionPlan {
        session_id,
        outcome,
        updates: Vec::new(),
        fallen: Vec::new(),
        loot: Vec::new(),
        gold: 0,
    };

    let fighters = engine.context().fighters();
    for troop in troops {
        let fighter = fighters
            .iter()
            .find(|f| f.troop_id() == Some(&troop.id));
        let final_hp = fighter.map_or_else(|| troop.hp(), |f| f.current_hp);

        if outcome == BattleOutcome::Defeat || final_hp <= 0 {
            plan.fallen.push(troop.id.clone());
            continue;
        }

        let mut progression = troop.progression();
        let leveled_up = progression.add_xp(rules.xp_per_victory).is_some();
        if leveled_up {
            debug!("{} reached level {}", troop.display_name(), progression.level);
        }

        let kills = fighter.map_or(0, |f| f.counters.kills);
        let close_call =
            troop.effective_stats().hp_fraction(final_hp) <= rules.close_call_fraction;
        let lore = Lore {
            missions_won: troop.lore.missions_won.saturating_add(1),
            kills: troop.lore.kills.saturating_add(kills),
            close_calls: troop.lore.close_calls.saturating_add(u32::from(close_call)),
        };

        plan.updates.push(TroopUpdate {
            troop_id: troop.id.clone(),
            current_hp: final_hp,
            level: progression.level,
            xp: progression.xp,
            lore,
            leveled_up,
        });
    }

    if outcome == BattleOutcome::Victory {
        let gatherer_id = ItemId::new(GATHERER_ITEM_ID);
        let gatherer = troops
            .iter()
            .filter(|t| plan.updates.iter().any(|u| u.troop_id == t.id))
            .any(|t| t.equipment.has_item(&gatherer_id));
        plan.loot = loot_table.roll(rng, gatherer);
        plan.gold = rules.gold_per_victory;
    }

    debug!(
        "Planned {:?}: {} survivors, {} fallen, {} drops",
        outcome,
        plan.updates.len(),
        plan.fallen.len(),
        plan.loot.len()
    );
    Ok(plan)
}
