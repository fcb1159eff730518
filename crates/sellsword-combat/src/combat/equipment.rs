//! Equipment system with 7 slots
//!
//! Reads what a combatant wears and totals the stat modifiers of every
//! equipped item.

use serde::{Deserialize, Serialize};

use sellsword_core::ItemId;

use super::damage::StatModifiers;
use super::item::Item;

/// The 7 equipment slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EquipmentSlot {
    MainHand,
    Helm,
    Body,
    Legs,
    Gloves,
    Boots,
    Cape,
}

impl EquipmentSlot {
    /// All equipment slot variants
    pub fn all() -> &'static [EquipmentSlot] {
        &[
            Self::MainHand,
            Self::Helm,
            Self::Body,
            Self::Legs,
            Self::Gloves,
            Self::Boots,
            Self::Cape,
        ]
    }
}

/// A combatant's equipped items. Empty slots are `None`; a missing
/// `equipment` document deserializes as all-empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EquipmentSet {
    pub main_hand: Option<Item>,
    pub helm: Option<Item>,
    pub body: Option<Item>,
    pub legs: Option<Item>,
    pub gloves: Option<Item>,
    pub boots: Option<Item>,
    pub cape: Option<Item>,
}

impl EquipmentSet {
    /// Create an empty equipment set
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a reference to the item in a slot
    pub fn get(&self, slot: EquipmentSlot) -> Option<&Item> {
        match slot {
            EquipmentSlot::MainHand => self.main_hand.as_ref(),
            EquipmentSlot::Helm => self.helm.as_ref(),
            EquipmentSlot::Body => self.body.as_ref(),
            EquipmentSlot::Legs => self.legs.as_ref(),
            EquipmentSlot::Gloves => self.gloves.as_ref(),
            EquipmentSlot::Boots => self.boots.as_ref(),
            EquipmentSlot::Cape => self.cape.as_ref(),
        }
    }

    /// Iterate over all equipped items
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        EquipmentSlot::all().iter().filter_map(|&slot| self.get(slot))
    }

    /// Total stat modifiers from all equipped items
    pub fn total_modifiers(&self) -> StatModifiers {
        let mut total = StatModifiers::default();
        for item in self.items() {
            total.add(&item.stat_modifiers);
        }
        total
    }

    /// Whether an item with this catalog id is equipped in any slot
    pub fn has_item(&self, id: &ItemId) -> bool {
        self.items().any(|item| &item.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::item::ItemCategory;

    fn make_weapon(ap: i32) -> Item {
        Item::gear(
            "test_sword",
            "Test Sword",
            ItemCategory::Weapon,
            StatModifiers {
                ap,
                ..Default::default()
            },
        )
    }

    fn make_helm() -> Item {
        Item::gear(
            "test_helm",
            "Test Helm",
            ItemCategory::Armor,
            StatModifiers {
                def: 5,
                max_hp: 20,
                spd: -1,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_equip_slot_count() {
        assert_eq!(EquipmentSlot::all().len(), 7);
    }

    #[test]
    fn test_items_follow_slot_order() {
        let set = EquipmentSet {
            main_hand: Some(make_weapon(3)),
            helm: Some(make_helm()),
            ..Default::default()
        };
        let ids: Vec<_> = set.items().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["test_sword", "test_helm"]);
        assert_eq!(set.get(EquipmentSlot::Helm).map(|i| i.stat_modifiers.def), Some(5));
        assert!(set.get(EquipmentSlot::Cape).is_none());
    }

    #[test]
    fn test_has_item() {
        let charm = Item::gear("charm", "Charm", ItemCategory::Accessory, StatModifiers::default());
        let set = EquipmentSet {
            gloves: Some(charm),
            ..Default::default()
        };
        assert!(set.has_item(&ItemId::new("charm")));
        assert!(!set.has_item(&ItemId::new("test_helm")));
        assert!(!EquipmentSet::new().has_item(&ItemId::new("charm")));
    }

    #[test]
    fn test_total_modifiers_include_negatives() {
        let set = EquipmentSet {
            helm: Some(make_helm()),
            main_hand: Some(make_weapon(4)),
            ..Default::default()
        };
        let mods = set.total_modifiers();
        assert_eq!(mods.def, 5);
        assert_eq!(mods.max_hp, 20);
        assert_eq!(mods.spd, -1);
        assert_eq!(mods.ap, 4);
        assert_eq!(EquipmentSet::new().total_modifiers(), StatModifiers::default());
    }

    #[test]
    fn test_equipment_json_uses_slot_names() {
        let json = r#"{"mainHand": {"id": "axe", "category": "weapon", "stats": {"ap": 6}}, "cape": null}"#;
        let set: EquipmentSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.total_modifiers().ap, 6);
        assert!(set.cape.is_none());
    }
}
