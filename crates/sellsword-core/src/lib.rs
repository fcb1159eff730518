//! Sellsword Core - Shared types for the Sellsword combat engine
//!
//! This crate provides the foundational types used by every other crate:
//! - Identifier newtypes for troops, enemies, sessions and items
//! - Tick cadence configuration for the battle loop

pub mod time;
pub mod types;

pub use time::{CadenceError, TickCadence};
pub use types::{EnemyId, ItemId, SessionId, TroopId};
