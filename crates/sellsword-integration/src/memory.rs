//! In-process store
//!
//! Keeps every record behind `parking_lot` locks. Failures can be injected
//! per operation, which makes it the test double for the runner and the
//! reward commit.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use sellsword_combat::{
    CombatSession, Inventory, Item, SessionProgress, Troop, TroopCombatDelta, TroopUpdate,
};
use sellsword_core::{SessionId, TroopId};

use crate::error::StoreError;
use crate::store::BattleStore;
use crate::types::Profile;

/// Store operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    LoadTroops,
    SaveTroop,
    LoadSession,
    SaveSession,
    SaveProgress,
    ApplyDelta,
    ApplyUpdate,
    DeleteTroop,
    CreditRewards,
    LoadProfile,
}

#[derive(Debug, Clone, Copy)]
enum Failure {
    Times(u32),
    Always,
}

#[derive(Debug, Default)]
struct Records {
    troops: Vec<Troop>,
    session: Option<CombatSession>,
    profile: Profile,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<Records>,
    failures: Mutex<HashMap<StoreOp, Failure>>,
    calls: Mutex<HashMap<StoreOp, u32>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_troops(troops: Vec<Troop>) -> Self {
        let store = Self::new();
        store.records.write().troops = troops;
        store
    }

    /// Fail the next `times` calls of `op`
    pub fn fail_times(&self, op: StoreOp, times: u32) {
        if times > 0 {
            self.failures.lock().insert(op, Failure::Times(times));
        }
    }

    /// Fail every call of `op` until cleared
    pub fn fail_always(&self, op: StoreOp) {
        self.failures.lock().insert(op, Failure::Always);
    }

    pub fn clear_failures(&self) {
        self.failures.lock().clear();
    }

    /// Number of calls made to `op`, failed ones included
    pub fn calls(&self, op: StoreOp) -> u32 {
        self.calls.lock().get(&op).copied().unwrap_or(0)
    }

    pub fn troops(&self) -> Vec<Troop> {
        self.records.read().troops.clone()
    }

    pub fn troop(&self, id: &TroopId) -> Option<Troop> {
        self.records.read().troops.iter().find(|t| &t.id == id).cloned()
    }

    pub fn session(&self) -> Option<CombatSession> {
        self.records.read().session.clone()
    }

    pub fn profile(&self) -> Profile {
        self.records.read().profile.clone()
    }

    /// Mark the stored session inactive, as another client finishing the
    /// battle would
    pub fn close_session(&self) {
        if let Some(session) = self.records.write().session.as_mut() {
            session.active = false;
        }
    }

    fn check(&self, op: StoreOp) -> Result<(), StoreError> {
        *self.calls.lock().entry(op).or_insert(0) += 1;

        let mut failures = self.failures.lock();
        match failures.get_mut(&op) {
            Some(Failure::Always) => Err(StoreError::Injected(format!("{:?}", op))),
            Some(Failure::Times(remaining)) => {
                if *remaining <= 1 {
                    failures.remove(&op);
                } else {
                    *remaining -= 1;
                }
                Err(StoreError::Injected(format!("{:?}", op)))
            }
            None => Ok(()),
        }
    }

    fn with_troop<F>(&self, id: &TroopId, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Troop),
    {
        let mut records = self.records.write();
        let troop = records
            .troops
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("troop {}", id)))?;
        f(troop);
        Ok(())
    }
}

#[async_trait]
impl BattleStore for InMemoryStore {
    async fn load_troops(&self) -> Result<Vec<Troop>, StoreError> {
        self.check(StoreOp::LoadTroops)?;
        Ok(self.troops())
    }

    async fn save_troop(&self, troop: &Troop) -> Result<(), StoreError> {
        self.check(StoreOp::SaveTroop)?;
        let mut records = self.records.write();
        match records.troops.iter_mut().find(|t| t.id == troop.id) {
            Some(existing) => *existing = troop.clone(),
            None => records.troops.push(troop.clone()),
        }
        Ok(())
    }

    async fn load_session(&self) -> Result<Option<CombatSession>, StoreError> {
        self.check(StoreOp::LoadSession)?;
        Ok(self.session())
    }

    async fn save_session(&self, session: &CombatSession) -> Result<(), StoreError> {
        self.check(StoreOp::SaveSession)?;
        self.records.write().session = Some(session.clone());
        Ok(())
    }

    async fn save_progress(&self, progress: &SessionProgress) -> Result<(), StoreError> {
        self.check(StoreOp::SaveProgress)?;
        if let Some(session) = self.records.write().session.as_mut() {
            session.apply_progress(progress);
        }
        Ok(())
    }

    async fn apply_troop_delta(&self, delta: &TroopCombatDelta) -> Result<(), StoreError> {
        self.check(StoreOp::ApplyDelta)?;
        self.with_troop(&delta.troop_id, |t| delta.apply_to(t))
    }

    async fn apply_troop_update(&self, update: &TroopUpdate) -> Result<(), StoreError> {
        self.check(StoreOp::ApplyUpdate)?;
        self.with_troop(&update.troop_id, |t| update.apply_to(t))
    }

    async fn delete_troop(&self, id: &TroopId) -> Result<(), StoreError> {
        self.check(StoreOp::DeleteTroop)?;
        self.records.write().troops.retain(|t| &t.id != id);
        Ok(())
    }

    async fn credit_rewards(
        &self,
        session_id: &SessionId,
        gold: u64,
        items: &[Item],
    ) -> Result<bool, StoreError> {
        self.check(StoreOp::CreditRewards)?;
        Ok(self.records.write().profile.credit(session_id, gold, items))
    }

    async fn load_gold(&self) -> Result<u64, StoreError> {
        self.check(StoreOp::LoadProfile)?;
        Ok(self.records.read().profile.gold)
    }

    async fn load_inventory(&self) -> Result<Inventory, StoreError> {
        self.check(StoreOp::LoadProfile)?;
        Ok(self.records.read().profile.inventory.clone())
    }
}
