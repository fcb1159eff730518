//! Loot tables
//!
//! Each entry is an independent Bernoulli trial. A gatherer item worn by a
//! surviving participant doubles the chance of base-tier drops only.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::combat::item::Item;

/// Catalog id of the accessory that boosts base-tier drops
pub const GATHERER_ITEM_ID: &str = "gatherers_gloves";

/// Multiplier applied to base-tier chances by the gatherer item
pub const GATHERER_MULTIPLIER: f64 = 2.0;

/// Drop tier of a loot entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropTier {
    /// Common drops, affected by the gatherer bonus
    Base,
    /// Rarer drops, never boosted
    Rare,
}

/// One possible drop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootEntry {
    pub item: Item,
    /// Probability in `[0, 1]`
    pub chance: f64,
    pub tier: DropTier,
}

impl LootEntry {
    pub fn new(item: Item, chance: f64, tier: DropTier) -> Self {
        Self { item, chance, tier }
    }

    /// Chance after the gatherer bonus, capped at 1
    pub fn effective_chance(&self, gatherer: bool) -> f64 {
        let chance = match (self.tier, gatherer) {
            (DropTier::Base, true) => self.chance * GATHERER_MULTIPLIER,
            _ => self.chance,
        };
        if chance.is_nan() {
            return 0.0;
        }
        chance.clamp(0.0, 1.0)
    }
}

/// All possible drops of a mission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LootTable {
    #[serde(default)]
    pub entries: Vec<LootEntry>,
}

impl LootTable {
    pub fn new(entries: Vec<LootEntry>) -> Self {
        Self { entries }
    }

    /// Roll every entry once and return the drops
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R, gatherer: bool) -> Vec<Item> {
        self.entries
            .iter()
            .filter(|entry| rng.gen_bool(entry.effective_chance(gatherer)))
            .map(|entry| entry.item.clone())
            .collect()
    }
}
