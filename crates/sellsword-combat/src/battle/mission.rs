//! Missions and enemy spawning
//!
//! A mission names an enemy template, a spawn count range and a loot table.
//! Spawned enemies get a random starting gauge so simultaneous spawns do not
//! act in lockstep.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::enemy::Enemy;
use super::loot::{DropTier, LootEntry, LootTable, GATHERER_ITEM_ID};
use crate::combat::damage::StatModifiers;
use crate::combat::item::{Item, ItemCategory, ItemRarity};
use crate::combat::skill::{SkillId, SkillSet};

/// Upper bound (exclusive) of the initial enemy gauge jitter
pub const GAUGE_JITTER_MAX: f64 = 50.0;

/// Stat block used to spawn enemies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyTemplate {
    pub name: String,
    pub max_hp: i32,
    pub ap: i32,
    pub def: i32,
    pub spd: i32,
    #[serde(default)]
    pub skill: Option<SkillId>,
}

impl EnemyTemplate {
    pub fn new(name: &str, max_hp: i32, ap: i32, def: i32, spd: i32) -> Self {
        Self {
            name: name.to_string(),
            max_hp,
            ap,
            def,
            spd,
            skill: None,
        }
    }

    pub fn with_skill(mut self, skill: SkillId) -> Self {
        self.skill = Some(skill);
        self
    }

    /// Spawn one enemy from this template
    pub fn spawn<R: Rng + ?Sized>(&self, name: String, rng: &mut R) -> Enemy {
        let mut enemy = Enemy::new(name, self.max_hp, self.ap, self.def, self.spd);
        enemy.action_gauge = rng.gen_range(0.0..GAUGE_JITTER_MAX);
        enemy.skills = SkillSet { row1: self.skill };
        enemy
    }
}

/// Everything needed to launch an encounter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionParams {
    pub id: String,
    pub name: String,
    pub enemy: EnemyTemplate,
    pub spawn_min: u32,
    pub spawn_max: u32,
    #[serde(default)]
    pub loot: LootTable,
}

impl MissionParams {
    /// Inclusive spawn range, with at least one enemy
    pub fn spawn_range(&self) -> (u32, u32) {
        let min = self.spawn_min.max(1);
        (min, self.spawn_max.max(min))
    }
}

/// Spawn the enemies for a mission
pub fn generate_enemies<R: Rng + ?Sized>(params: &MissionParams, rng: &mut R) -> Vec<Enemy> {
    let (min, max) = params.spawn_range();
    let count = rng.gen_range(min..=max);
    (1..=count)
        .map(|n| {
            let name = if count == 1 {
                params.enemy.name.clone()
            } else {
                format!("{} {}", params.enemy.name, n)
            };
            params.enemy.spawn(name, rng)
        })
        .collect()
}

/// Built-in missions
pub fn mission_catalog() -> Vec<MissionParams> {
    let gatherers_gloves = Item {
        rarity: ItemRarity::Rare,
        ..Item::gear(
            GATHERER_ITEM_ID,
            "Gatherer's Gloves",
            ItemCategory::Accessory,
            StatModifiers::default(),
        )
    };

    vec![
        MissionParams {
            id: "wolf_den".into(),
            name: "Wolf Den".into(),
            enemy: EnemyTemplate::new("Wolf", 40, 8, 0, 8),
            spawn_min: 1,
            spawn_max: 3,
            loot: LootTable::new(vec![
                LootEntry::new(
                    Item::material("wolf_pelt", "Wolf Pelt", ItemRarity::Common),
                    0.5,
                    DropTier::Base,
                ),
                LootEntry::new(
                    Item::material("alpha_fang", "Alpha Fang", ItemRarity::Rare),
                    0.05,
                    DropTier::Rare,
                ),
            ]),
        },
        MissionParams {
            id: "bandit_camp".into(),
            name: "Bandit Camp".into(),
            enemy: EnemyTemplate::new("Bandit", 60, 11, 2, 9).with_skill(SkillId::OilConcentrated),
            spawn_min: 2,
            spawn_max: 3,
            loot: LootTable::new(vec![
                LootEntry::new(
                    Item::material("iron_scrap", "Iron Scrap", ItemRarity::Common),
                    0.4,
                    DropTier::Base,
                ),
                LootEntry::new(
                    Item::gear(
                        "bandit_blade",
                        "Bandit Blade",
                        ItemCategory::Weapon,
                        StatModifiers {
                            ap: 4,
                            ..Default::default()
                        },
                    ),
                    0.08,
                    DropTier::Rare,
                ),
                LootEntry::new(gatherers_gloves, 0.02, DropTier::Rare),
            ]),
        },
        MissionParams {
            id: "goblin_warren".into(),
            name: "Goblin Warren".into(),
            enemy: EnemyTemplate::new("Goblin", 30, 7, 1, 13).with_skill(SkillId::ElvishFlicker),
            spawn_min: 3,
            spawn_max: 5,
            loot: LootTable::new(vec![
                LootEntry::new(
                    Item::material("goblin_ear", "Goblin Ear", ItemRarity::Common),
                    0.6,
                    DropTier::Base,
                ),
                LootEntry::new(
                    Item::material("shiny_trinket", "Shiny Trinket", ItemRarity::Uncommon),
                    0.1,
                    DropTier::Rare,
                ),
            ]),
        },
    ]
}

/// Look up a built-in mission by id
pub fn find_mission(id: &str) -> Option<MissionParams> {
    mission_catalog().into_iter().find(|m| m.id == id)
}
