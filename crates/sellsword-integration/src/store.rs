//! The persistence port
//!
//! Everything the battle runner reads or writes goes through [`BattleStore`].
//! Implementations must make `delete_troop` and `credit_rewards` safe to call
//! again with the same arguments; the reward commit relies on it.

use async_trait::async_trait;

use sellsword_combat::{
    CombatSession, Inventory, Item, SessionProgress, Troop, TroopCombatDelta, TroopUpdate,
};
use sellsword_core::{SessionId, TroopId};

use crate::error::StoreError;

#[async_trait]
pub trait BattleStore: Send + Sync {
    /// Every troop record of the player
    async fn load_troops(&self) -> Result<Vec<Troop>, StoreError>;

    /// Create or replace a troop record
    async fn save_troop(&self, troop: &Troop) -> Result<(), StoreError>;

    /// The player's current combat session, if any
    async fn load_session(&self) -> Result<Option<CombatSession>, StoreError>;

    /// Create or replace the current combat session
    async fn save_session(&self, session: &CombatSession) -> Result<(), StoreError>;

    /// Write a tick's enemy snapshot, log and counter. Ignored when the
    /// stored session is a different one.
    async fn save_progress(&self, progress: &SessionProgress) -> Result<(), StoreError>;

    /// Write the per-combat fields of one troop
    async fn apply_troop_delta(&self, delta: &TroopCombatDelta) -> Result<(), StoreError>;

    /// Write a survivor's post-battle state
    async fn apply_troop_update(&self, update: &TroopUpdate) -> Result<(), StoreError>;

    /// Delete a troop. A troop that is already gone is not an error.
    async fn delete_troop(&self, id: &TroopId) -> Result<(), StoreError>;

    /// Add a battle's gold and loot to the profile, at most once per
    /// session. Returns false if the session was already credited.
    async fn credit_rewards(
        &self,
        session_id: &SessionId,
        gold: u64,
        items: &[Item],
    ) -> Result<bool, StoreError>;

    async fn load_gold(&self) -> Result<u64, StoreError>;

    async fn load_inventory(&self) -> Result<Inventory, StoreError>;
}
