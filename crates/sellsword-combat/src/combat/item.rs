//! Item data model
//!
//! Items with rarity, category and flat stat modifiers.

use serde::{Deserialize, Serialize};

use sellsword_core::ItemId;

use super::damage::StatModifiers;

/// Item rarity tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemRarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

/// Item category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    Weapon,
    Armor,
    Accessory,
    Consumable,
    #[default]
    Material,
}

/// A game item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: ItemCategory,
    #[serde(default)]
    pub rarity: ItemRarity,
    /// Flat stat deltas applied while equipped
    #[serde(default, rename = "stats")]
    pub stat_modifiers: StatModifiers,
}

impl Item {
    /// A plain crafting material with no stats
    pub fn material(id: &str, name: &str, rarity: ItemRarity) -> Self {
        Self {
            id: ItemId::new(id),
            name: name.to_string(),
            category: ItemCategory::Material,
            rarity,
            stat_modifiers: StatModifiers::default(),
        }
    }

    /// A piece of gear in the given category
    pub fn gear(id: &str, name: &str, category: ItemCategory, stat_modifiers: StatModifiers) -> Self {
        Self {
            id: ItemId::new(id),
            name: name.to_string(),
            category,
            rarity: ItemRarity::Common,
            stat_modifiers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_minimal_json() {
        let item: Item = serde_json::from_str(r#"{"id": "rusty_sword"}"#).unwrap();
        assert_eq!(item.id, ItemId::new("rusty_sword"));
        assert_eq!(item.category, ItemCategory::Material);
        assert_eq!(item.stat_modifiers, StatModifiers::default());
    }

    #[test]
    fn test_item_partial_stats() {
        let json = r#"{"id": "cursed_helm", "category": "armor", "stats": {"def": 4, "spd": -2}}"#;
        let item: Item = serde_json::from_str(json).unwrap();
        assert_eq!(item.stat_modifiers.def, 4);
        assert_eq!(item.stat_modifiers.spd, -2);
        assert_eq!(item.stat_modifiers.ap, 0);
    }

    #[test]
    fn test_rarity_order() {
        assert!(ItemRarity::Common < ItemRarity::Rare);
        assert!(ItemRarity::Legendary > ItemRarity::Epic);
        assert_eq!(serde_json::to_string(&ItemRarity::Uncommon).unwrap(), "\"uncommon\"");
    }
}
