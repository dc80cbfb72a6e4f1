// Guild configuration store
// One JSON file per guild plus a default template, fronted by an in-memory cache

use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use poise::serenity_prelude as serenity;
use tokio::fs;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use super::error::ConfigError;
use crate::models::guild::{ConfigUpdate, GuildConfig};

/// File name of the default template inside the config directory
pub const DEFAULT_CONFIG_FILE: &str = "default_config.json";

/// Single source of truth for guild configuration.
///
/// Read paths never fail: missing or unreadable records degrade to a copy of
/// the default template. Write paths log failures and report them through
/// `Result`, but the cache is updated even when the disk write fails.
///
/// Operations on the same guild are serialized through a per-guild lock.
/// `backup`/`restore` take the directory gate exclusively so no write can
/// interleave with a snapshot.
pub struct ConfigStore {
    config_dir: PathBuf,
    default_path: PathBuf,
    defaults: RwLock<GuildConfig>,
    cache: DashMap<serenity::GuildId, GuildConfig>,
    locks: DashMap<serenity::GuildId, Arc<Mutex<()>>>,
    gate: RwLock<()>,
}

impl ConfigStore {
    /// Open (and create if needed) a config directory, then load the default template
    pub async fn open(config_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let config_dir = config_dir.into();
        fs::create_dir_all(&config_dir)
            .await
            .map_err(|e| ConfigError::io(&config_dir, e))?;

        let store = Self {
            default_path: config_dir.join(DEFAULT_CONFIG_FILE),
            config_dir,
            defaults: RwLock::new(GuildConfig::default()),
            cache: DashMap::new(),
            locks: DashMap::new(),
            gate: RwLock::new(()),
        };
        store.load_default_inner().await;

        Ok(store)
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Number of guilds currently held in memory
    pub fn cached_guilds(&self) -> usize {
        self.cache.len()
    }

    /// Re-read the default template from disk
    pub async fn load_default(&self) {
        let _gate = self.gate.read().await;
        self.load_default_inner().await;
    }

    /// Copy of the current default template
    pub async fn defaults(&self) -> GuildConfig {
        self.defaults.read().await.clone()
    }

    /// Replace and persist the default template.
    ///
    /// Existing guild configurations are not touched.
    pub async fn save_defaults(&self, config: GuildConfig) -> Result<(), ConfigError> {
        let _gate = self.gate.read().await;

        config.validate().map_err(|reason| ConfigError::Invalid {
            path: self.default_path.clone(),
            reason,
        })?;

        let result = write_record(&self.default_path, &config).await;
        *self.defaults.write().await = config;

        if let Err(e) = &result {
            error!("Error saving default config: {}", e);
        }
        result
    }

    /// Get a guild's configuration, loading or creating it on first use
    pub async fn get_config(&self, guild_id: serenity::GuildId) -> GuildConfig {
        let _gate = self.gate.read().await;

        if let Some(config) = self.cache.get(&guild_id) {
            return config.clone();
        }

        let lock = self.lock_for(guild_id);
        let _guard = lock.lock().await;
        self.load_locked(guild_id).await
    }

    /// Reset a guild to a fresh copy of the default template
    pub async fn create_default_config(
        &self,
        guild_id: serenity::GuildId,
    ) -> Result<GuildConfig, ConfigError> {
        let _gate = self.gate.read().await;
        let lock = self.lock_for(guild_id);
        let _guard = lock.lock().await;

        let config = self.defaults.read().await.clone();
        self.save_locked(guild_id, config.clone()).await?;
        Ok(config)
    }

    /// Persist a guild's configuration and replace the cached copy
    pub async fn save_config(
        &self,
        guild_id: serenity::GuildId,
        config: GuildConfig,
    ) -> Result<(), ConfigError> {
        let _gate = self.gate.read().await;
        let lock = self.lock_for(guild_id);
        let _guard = lock.lock().await;

        self.save_locked(guild_id, config).await
    }

    /// Read-modify-write a guild's configuration under its lock.
    ///
    /// The closure's return value is handed back once the result is saved.
    pub async fn modify<F, R>(&self, guild_id: serenity::GuildId, f: F) -> Result<R, ConfigError>
    where
        F: FnOnce(&mut GuildConfig) -> R,
    {
        let _gate = self.gate.read().await;
        let lock = self.lock_for(guild_id);
        let _guard = lock.lock().await;

        let mut config = self.load_locked(guild_id).await;
        let output = f(&mut config);
        self.save_locked(guild_id, config).await?;

        Ok(output)
    }

    /// Shallow-merge a partial update into a guild's configuration
    pub async fn update_config(
        &self,
        guild_id: serenity::GuildId,
        update: ConfigUpdate,
    ) -> Result<GuildConfig, ConfigError> {
        self.modify(guild_id, |config| {
            update.apply_to(config);
            config.clone()
        })
        .await
    }

    /// Remove a guild's record and cache entry. Deleting an unknown guild is not an error.
    pub async fn delete_config(&self, guild_id: serenity::GuildId) -> Result<(), ConfigError> {
        let _gate = self.gate.read().await;

        let result = {
            let lock = self.lock_for(guild_id);
            let _guard = lock.lock().await;

            self.cache.remove(&guild_id);

            let path = self.guild_path(guild_id);
            let removed = fs::remove_file(&path).await;
            match removed {
                Ok(()) => {
                    info!("Deleted config for guild {}", guild_id);
                    Ok(())
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(e) => {
                    let err = ConfigError::io(path, e);
                    error!("Error deleting guild config for {}: {}", guild_id, err);
                    Err(err)
                }
            }
        };

        // Keep the entry while another task still holds or waits on this lock
        self.locks
            .remove_if(&guild_id, |_, lock| Arc::strong_count(lock) == 1);

        result
    }

    /// Every persisted guild configuration, keyed by guild
    pub async fn list_all_configs(&self) -> BTreeMap<serenity::GuildId, GuildConfig> {
        let guild_ids = match self.persisted_guild_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                error!("Error listing guild configs: {}", e);
                return BTreeMap::new();
            }
        };

        let configs =
            futures::future::join_all(guild_ids.iter().map(|id| self.get_config(*id))).await;

        guild_ids.into_iter().zip(configs).collect()
    }

    /// Replace `backup_path` with a copy of the whole config directory
    pub async fn backup(&self, backup_path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let backup_path = backup_path.as_ref();
        let _gate = self.gate.write().await;

        let result = async {
            self.check_disjoint(backup_path)?;
            remove_dir_if_exists(backup_path).await?;
            copy_dir(&self.config_dir, backup_path).await
        }
        .await;

        match &result {
            Ok(()) => info!("Configs backed up to {}", backup_path.display()),
            Err(e) => error!("Error backing up configs: {}", e),
        }
        result
    }

    /// Replace the config directory with the contents of `backup_path`.
    ///
    /// The cache is dropped and the default template reloaded afterwards.
    pub async fn restore(&self, backup_path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let backup_path = backup_path.as_ref();
        let _gate = self.gate.write().await;

        if let Err(e) = self.check_disjoint(backup_path) {
            error!("Error restoring configs: {}", e);
            return Err(e);
        }

        let exists = fs::try_exists(backup_path)
            .await
            .map_err(|e| ConfigError::io(backup_path, e))?;
        if !exists {
            let err = ConfigError::BackupMissing(backup_path.to_path_buf());
            error!("{}", err);
            return Err(err);
        }

        let result = async {
            remove_dir_if_exists(&self.config_dir).await?;
            copy_dir(backup_path, &self.config_dir).await
        }
        .await;

        self.cache.clear();
        self.load_default_inner().await;

        match &result {
            Ok(()) => info!("Configs restored from {}", backup_path.display()),
            Err(e) => error!("Error restoring configs: {}", e),
        }
        result
    }

    fn guild_path(&self, guild_id: serenity::GuildId) -> PathBuf {
        self.config_dir.join(format!("{}.json", guild_id.get()))
    }

    /// A snapshot may not live inside the config directory, or the other way round
    fn check_disjoint(&self, backup_path: &Path) -> Result<(), ConfigError> {
        let backup = absolute(backup_path).map_err(|e| ConfigError::io(backup_path, e))?;
        let config_dir =
            absolute(&self.config_dir).map_err(|e| ConfigError::io(&self.config_dir, e))?;

        if backup.starts_with(&config_dir) || config_dir.starts_with(&backup) {
            return Err(ConfigError::Overlapping {
                backup: backup_path.to_path_buf(),
                config_dir: self.config_dir.clone(),
            });
        }
        Ok(())
    }

    fn lock_for(&self, guild_id: serenity::GuildId) -> Arc<Mutex<()>> {
        self.locks.entry(guild_id).or_default().clone()
    }

    async fn load_default_inner(&self) {
        let config = match read_record(&self.default_path).await {
            Ok(Some(config)) => {
                debug!("Loaded default config from {}", self.default_path.display());
                config
            }
            Ok(None) => {
                let config = GuildConfig::default();
                match write_record(&self.default_path, &config).await {
                    Ok(()) => info!("Created default config at {}", self.default_path.display()),
                    Err(e) => error!("Error saving default config: {}", e),
                }
                config
            }
            // Leave the file alone so it can be repaired by hand
            Err(e) => {
                error!("Error loading default config: {}", e);
                GuildConfig::default()
            }
        };

        *self.defaults.write().await = config;
    }

    /// Cached value, stored record, or a copy of the template. Caller holds the guild lock.
    async fn load_locked(&self, guild_id: serenity::GuildId) -> GuildConfig {
        if let Some(config) = self.cache.get(&guild_id) {
            return config.clone();
        }

        let path = self.guild_path(guild_id);
        let config = match read_record(&path).await {
            Ok(Some(config)) => config,
            Ok(None) => {
                let config = self.defaults.read().await.clone();
                if let Err(e) = write_record(&path, &config).await {
                    error!("Error saving guild config for {}: {}", guild_id, e);
                } else {
                    debug!("Created config for guild {}", guild_id);
                }
                config
            }
            Err(e) => {
                match &e {
                    ConfigError::Invalid { .. } => warn!("Error loading guild config for {}: {}", guild_id, e),
                    _ => error!("Error loading guild config for {}: {}", guild_id, e),
                }
                self.defaults.read().await.clone()
            }
        };

        self.cache.insert(guild_id, config.clone());
        config
    }

    /// Validate, write, then update the cache even if the write failed.
    /// Caller holds the guild lock.
    async fn save_locked(
        &self,
        guild_id: serenity::GuildId,
        config: GuildConfig,
    ) -> Result<(), ConfigError> {
        let path = self.guild_path(guild_id);
        config
            .validate()
            .map_err(|reason| ConfigError::Invalid { path: path.clone(), reason })?;

        let result = write_record(&path, &config).await;
        self.cache.insert(guild_id, config);

        if let Err(e) = &result {
            error!("Error saving guild config for {}: {}", guild_id, e);
        }
        result
    }

    async fn persisted_guild_ids(&self) -> Result<Vec<serenity::GuildId>, ConfigError> {
        let mut entries = fs::read_dir(&self.config_dir)
            .await
            .map_err(|e| ConfigError::io(&self.config_dir, e))?;

        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ConfigError::io(&self.config_dir, e))?
        {
            let name = entry.file_name();
            if let Some(id) = name.to_str().and_then(guild_id_from_file_name) {
                ids.push(id);
            }
        }

        ids.sort();
        Ok(ids)
    }
}

/// `123.json` -> guild 123; anything else (including the template) is skipped
fn guild_id_from_file_name(name: &str) -> Option<serenity::GuildId> {
    if name == DEFAULT_CONFIG_FILE {
        return None;
    }

    name.strip_suffix(".json")
        .and_then(|stem| stem.parse::<u64>().ok())
        .filter(|id| *id != 0)
        .map(serenity::GuildId::new)
}

async fn read_record(path: &Path) -> Result<Option<GuildConfig>, ConfigError> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ConfigError::io(path, e)),
    };

    let config: GuildConfig =
        serde_json::from_str(&content).map_err(|source| ConfigError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

    config.validate().map_err(|reason| ConfigError::Invalid {
        path: path.to_path_buf(),
        reason,
    })?;

    Ok(Some(config))
}

/// Write through a temp file and rename so readers never see a half-written record
async fn write_record(path: &Path, config: &GuildConfig) -> Result<(), ConfigError> {
    let json = serde_json::to_string_pretty(config)?;
    let tmp = path.with_extension("json.tmp");

    fs::write(&tmp, json)
        .await
        .map_err(|e| ConfigError::io(&tmp, e))?;

    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(ConfigError::io(path, e));
    }

    Ok(())
}

async fn remove_dir_if_exists(path: &Path) -> Result<(), ConfigError> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ConfigError::io(path, e)),
    }
}

/// Lexically absolute form of `path`: joined onto the working directory, `.` and `..` folded
fn absolute(path: &Path) -> io::Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    Ok(normalized)
}

/// Recursive copy. Each source directory is listed before its target is created,
/// so a target nested under the source is never copied into itself.
async fn copy_dir(from: &Path, to: &Path) -> Result<(), ConfigError> {
    let mut pending = vec![(from.to_path_buf(), to.to_path_buf())];

    while let Some((src, dst)) = pending.pop() {
        let mut entries = fs::read_dir(&src)
            .await
            .map_err(|e| ConfigError::io(&src, e))?;

        let mut listed = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ConfigError::io(&src, e))?
        {
            let source = entry.path();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| ConfigError::io(&source, e))?;
            listed.push((source, dst.join(entry.file_name()), file_type.is_dir()));
        }

        fs::create_dir_all(&dst)
            .await
            .map_err(|e| ConfigError::io(&dst, e))?;

        for (source, target, is_dir) in listed {
            if is_dir {
                pending.push((source, target));
            } else {
                fs::copy(&source, &target)
                    .await
                    .map_err(|e| ConfigError::io(&source, e))?;
            }
        }
    }

    Ok(())
}
