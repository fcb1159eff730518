//! Combat building blocks
//!
//! Items, equipment, the company inventory, the skill catalog and the damage
//! formula.

pub mod damage;
pub mod equipment;
pub mod inventory;
pub mod item;
pub mod skill;

pub use damage::{damage_with_variance, roll_damage, DamageRoll, StatModifiers};
pub use equipment::{EquipmentSet, EquipmentSlot};
pub use inventory::{Inventory, InventoryStack};
pub use item::{Item, ItemCategory, ItemRarity};
pub use skill::{SkillId, SkillSet};
