//! Sellsword Integration - persistence and the async battle loop
//!
//! Defines the [`BattleStore`] port with in-memory and document-server
//! adapters, the crash-safe resolution commit, and the tokio runner that
//! drives a battle at a fixed cadence.

pub mod commit;
pub mod document;
pub mod error;
pub mod memory;
pub mod retry;
pub mod runner;
pub mod store;
pub mod types;

pub use commit::{commit_resolution, recover_pending_resolution};
pub use document::{DocumentStore, DocumentStoreConfig};
pub use error::{BattleError, StoreError};
pub use memory::{InMemoryStore, StoreOp};
pub use retry::RetryPolicy;
pub use runner::{
    select_party, ActiveBattle, BattleControl, BattleEnd, BattleRunner, BattleSnapshot,
    BattleSummary, FighterSnapshot, ResolutionLock, RunnerConfig,
};
pub use store::BattleStore;
pub use types::{Profile, TroopPatch};
