//! Sellsword Combat - Combat resolution engine
//!
//! Provides the stat model, items and skills, troop records, and the
//! tick-based battle engine with its session, resolution and resume paths.
//! Everything here is synchronous and free of I/O; persistence lives in
//! `sellsword-integration`.

pub mod battle;
pub mod combat;
pub mod roster;

pub use battle::{
    find_mission, generate_enemies, launch, plan_resolution, resume, BattleEvent, BattleLog,
    BattleOutcome, BattleState, CombatContext, CombatError, CombatSession, Enemy, EnemyTemplate,
    FighterCounters, Launch, LootTable, MissionParams, ResolutionPlan, ResolutionRecord,
    ResumeOutcome, RewardRules, SessionProgress, TickReport, TroopCombatDelta, TroopUpdate,
    TurnEngine, DEFAULT_LOG_CAPACITY,
};
pub use combat::{
    EquipmentSet, EquipmentSlot, Inventory, Item, ItemCategory, ItemRarity, SkillId, SkillSet,
    StatModifiers,
};
pub use roster::{effective_stats, generate_recruit, BaseStats, EffectiveStats, Lore, Troop};
