//! File-backed battle store
//!
//! Keeps the roster, the current session and the profile as JSON files
//! under the local data directory (`~/.local/share/sellsword/saves` on
//! Linux).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use sellsword_combat::{
    CombatSession, Inventory, Item, SessionProgress, Troop, TroopCombatDelta, TroopUpdate,
};
use sellsword_core::{SessionId, TroopId};
use sellsword_integration::{BattleStore, Profile, StoreError};

const TROOPS_FILE: &str = "troops.json";
const SESSION_FILE: &str = "session.json";
const PROFILE_FILE: &str = "profile.json";

/// Get the save directory path, creating it if it doesn't exist
pub fn save_dir() -> Result<PathBuf> {
    let dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sellsword")
        .join("saves");
    std::fs::create_dir_all(&dir).context("Failed to create save directory")?;
    Ok(dir)
}

/// [`BattleStore`] over three JSON files. Every read-modify-write holds
/// one async lock so the tick writer and the runner never interleave.
pub struct FileStore {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).context("Failed to create save directory")?;
        debug!("File store at {:?}", dir);
        Ok(Self {
            dir,
            lock: Mutex::new(()),
        })
    }

    /// Store in the default save directory
    pub fn open_default() -> Result<Self> {
        Self::open(save_dir()?)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read<T: DeserializeOwned>(&self, file: &str) -> Result<Option<T>, StoreError> {
        let json = match fs::read_to_string(self.dir.join(file)).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    /// Write through a temporary file so a crash never leaves half a record
    async fn write<T: Serialize>(&self, file: &str, value: &T) -> Result<(), StoreError> {
        let path = self.dir.join(file);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn troops(&self) -> Result<Vec<Troop>, StoreError> {
        Ok(self.read(TROOPS_FILE).await?.unwrap_or_default())
    }

    async fn profile(&self) -> Result<Profile, StoreError> {
        Ok(self.read(PROFILE_FILE).await?.unwrap_or_default())
    }

    async fn with_troop<F>(&self, id: &TroopId, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Troop),
    {
        let _guard = self.lock.lock().await;
        let mut troops = self.troops().await?;
        let troop = troops
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("troop {}", id)))?;
        f(troop);
        self.write(TROOPS_FILE, &troops).await
    }
}

#[async_trait]
impl BattleStore for FileStore {
    async fn load_troops(&self) -> Result<Vec<Troop>, StoreError> {
        let _guard = self.lock.lock().await;
        self.troops().await
    }

    async fn save_troop(&self, troop: &Troop) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut troops = self.troops().await?;
        match troops.iter_mut().find(|t| t.id == troop.id) {
            Some(existing) => *existing = troop.clone(),
            None => troops.push(troop.clone()),
        }
        self.write(TROOPS_FILE, &troops).await
    }

    async fn load_session(&self) -> Result<Option<CombatSession>, StoreError> {
        let _guard = self.lock.lock().await;
        self.read(SESSION_FILE).await
    }

    async fn save_session(&self, session: &CombatSession) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        self.write(SESSION_FILE, session).await
    }

    async fn save_progress(&self, progress: &SessionProgress) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let Some(mut session) = self.read::<CombatSession>(SESSION_FILE).await? else {
            return Ok(());
        };
        if session.apply_progress(progress) {
            self.write(SESSION_FILE, &session).await?;
        }
        Ok(())
    }

    async fn apply_troop_delta(&self, delta: &TroopCombatDelta) -> Result<(), StoreError> {
        self.with_troop(&delta.troop_id, |t| delta.apply_to(t)).await
    }

    async fn apply_troop_update(&self, update: &TroopUpdate) -> Result<(), StoreError> {
        self.with_troop(&update.troop_id, |t| update.apply_to(t)).await
    }

    async fn delete_troop(&self, id: &TroopId) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut troops = self.troops().await?;
        let before = troops.len();
        troops.retain(|t| &t.id != id);
        if troops.len() != before {
            self.write(TROOPS_FILE, &troops).await?;
        }
        Ok(())
    }

    async fn credit_rewards(
        &self,
        session_id: &SessionId,
        gold: u64,
        items: &[Item],
    ) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut profile = self.profile().await?;
        if !profile.credit(session_id, gold, items) {
            return Ok(false);
        }
        self.write(PROFILE_FILE, &profile).await?;
        Ok(true)
    }

    async fn load_gold(&self) -> Result<u64, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.profile().await?.gold)
    }

    async fn load_inventory(&self) -> Result<Inventory, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.profile().await?.inventory)
    }
}
