//! Troop records, the stat model and recruitment

pub mod recruit;
pub mod stats;
pub mod troop;

pub use recruit::generate_recruit;
pub use stats::{
    effective_stats, xp_for_next_level, BaseStats, EffectiveStats, Progression, StatGrowth,
    MAX_LEVEL,
};
pub use troop::{Lore, Troop};
