//! Battles: missions, the turn engine, sessions, resolution and resume

pub mod context;
pub mod enemy;
pub mod engine;
pub mod error;
pub mod log;
pub mod loot;
pub mod mission;
pub mod resolution;
pub mod resume;
pub mod session;

pub use context::{CombatContext, CombatCounters, Fighter, FighterCounters, FighterKey, Side};
pub use enemy::Enemy;
pub use engine::{BattleState, TickReport, TurnEngine, ACTION_COST};
pub use error::CombatError;
pub use log::{BattleEvent, BattleLog, BattleOutcome, DEFAULT_LOG_CAPACITY};
pub use loot::{DropTier, LootEntry, LootTable, GATHERER_ITEM_ID};
pub use mission::{find_mission, generate_enemies, mission_catalog, EnemyTemplate, MissionParams};
pub use resolution::{plan_resolution, ResolutionPlan, RewardRules, TroopUpdate};
pub use resume::{resume, ResumeOutcome};
pub use session::{
    launch, CombatSession, Launch, ResolutionRecord, SessionProgress, TroopCombatDelta,
};
