//! Shared company inventory
//!
//! Loot from won battles is merged here. Identical items stack by id.

use serde::{Deserialize, Serialize};

use sellsword_core::ItemId;

use super::item::Item;

/// One inventory slot: an item and how many of it are held
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryStack {
    pub item: Item,
    pub count: u32,
}

/// Company inventory container
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub stacks: Vec<InventoryStack>,
}

impl Inventory {
    /// Create a new empty inventory
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one item, stacking onto an existing stack with the same id
    pub fn add_item(&mut self, item: Item) {
        match self.stacks.iter_mut().find(|s| s.item.id == item.id) {
            Some(stack) => stack.count = stack.count.saturating_add(1),
            None => self.stacks.push(InventoryStack { item, count: 1 }),
        }
    }

    /// Merge a batch of items (e.g. a battle's loot)
    pub fn merge<I: IntoIterator<Item = Item>>(&mut self, items: I) {
        for item in items {
            self.add_item(item);
        }
    }

    /// How many of an item are held
    pub fn count(&self, id: &ItemId) -> u32 {
        self.stacks
            .iter()
            .find(|s| &s.item.id == id)
            .map(|s| s.count)
            .unwrap_or(0)
    }

    /// Number of distinct stacks
    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }
}
