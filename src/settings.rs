//! Runner settings with persistence
//!
//! Settings are saved to `~/.config/sellsword/settings.toml`

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use sellsword_combat::{RewardRules, DEFAULT_LOG_CAPACITY};
use sellsword_core::time::DEFAULT_TICK_INTERVAL_MS;
use sellsword_core::TickCadence;
use sellsword_integration::runner::DEFAULT_REMOTE_POLL_TICKS;
use sellsword_integration::{DocumentStoreConfig, RetryPolicy, RunnerConfig};

/// All runner settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub battle: BattleSettings,
    pub rewards: RewardRules,
    pub retry: RetryPolicy,
    pub store: StoreSettings,
}

impl Settings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("sellsword"))
    }

    /// Get the settings file path
    fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.toml"))
    }

    /// Load settings from disk. A first run writes the defaults out so
    /// there is a file to edit.
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            warn!("Could not determine config directory");
            return Self::default();
        };
        Self::load_from(&path)
    }

    fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("No settings file found, writing defaults to {:?}", path);
            let settings = Self::default();
            if let Err(e) = settings.save_to(path) {
                warn!("Failed to write default settings: {:#}", e);
            }
            return settings;
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(settings) => {
                    info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse settings: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read settings file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Save settings to `path`, creating its directory
    fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("Failed to create config directory")?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).context("Failed to write settings")?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Runner configuration; an invalid tick interval falls back to the
    /// default cadence
    pub fn runner_config(&self) -> RunnerConfig {
        let cadence = TickCadence::from_millis(self.battle.tick_interval_ms).unwrap_or_else(|e| {
            warn!("{}, using the default cadence", e);
            TickCadence::default()
        });
        RunnerConfig {
            cadence,
            remote_poll_every: self.battle.remote_poll_every,
            log_capacity: self.battle.log_capacity.max(1),
            rewards: self.rewards,
            retry: self.retry,
        }
    }
}

/// Battle loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleSettings {
    /// Milliseconds between ticks
    pub tick_interval_ms: u64,
    /// Number of log lines kept on the session
    pub log_capacity: usize,
    /// Check the stored session every N ticks (0 = never)
    pub remote_poll_every: u64,
    /// Start the next battle as soon as one is won
    pub auto_battle: bool,
    /// Stop auto-battle after this many battles (unset = no limit)
    pub max_battles: Option<u32>,
    /// Fixed RNG seed for reproducible fights
    pub seed: Option<u64>,
    pub mission_id: String,
    /// Troops sent on each mission
    pub party_size: usize,
    /// Recruits generated when the roster is empty
    pub starting_recruits: usize,
}

impl Default for BattleSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            log_capacity: DEFAULT_LOG_CAPACITY,
            remote_poll_every: DEFAULT_REMOTE_POLL_TICKS,
            auto_battle: false,
            max_battles: None,
            seed: None,
            mission_id: "wolf_den".to_string(),
            party_size: 3,
            starting_recruits: 4,
        }
    }
}

/// Where troops, sessions and the profile are kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// JSON files in the local data directory
    #[default]
    File,
    /// Nothing persists past the process
    Memory,
    /// Hosted document API
    Remote,
}

/// Store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    pub base_url: String,
    pub project_id: String,
    pub profile_id: String,
    /// Environment variable holding the bearer token
    pub token_env: String,
    pub timeout_secs: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        let remote = DocumentStoreConfig::default();
        Self {
            backend: StoreBackend::File,
            base_url: remote.base_url,
            project_id: remote.project_id,
            profile_id: remote.profile_id,
            token_env: "SELLSWORD_TOKEN".to_string(),
            timeout_secs: remote.timeout.as_secs(),
        }
    }
}

impl StoreSettings {
    /// Document store configuration, reading the token from the environment
    pub fn document_config(&self) -> DocumentStoreConfig {
        let token = std::env::var(&self.token_env)
            .ok()
            .filter(|t| !t.is_empty());
        if token.is_none() {
            warn!("{} is not set, remote requests are unauthenticated", self.token_env);
        }
        DocumentStoreConfig {
            base_url: self.base_url.clone(),
            project_id: self.project_id.clone(),
            profile_id: self.profile_id.clone(),
            token,
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
        }
    }
}
