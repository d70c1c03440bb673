//! TOML-backed trader registry.
//!
//! The whole registry is one `traders.toml` file:
//!
//! ```text
//! [[trader]]
//! id = 5398770941
//! name = "Alice"
//! added_at_ms = 1714000000000
//! expires_at_ms = 1716600000000
//! ```
//!
//! Updates rewrite the file atomically (tmp file + fsync + rename) under
//! an exclusive fs2 lock, so concurrent registry commands cannot tear the
//! file. Entries written by older tooling may lack timestamps; those are
//! backfilled on load from the registration time plus the configured
//! subscription length.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};
use tracs_core::error::{Result, TracsError};
use tracs_core::trader::{TraderDirectory, TraderProfile};

pub struct TomlTraderDirectory {
    path: PathBuf,
    owner_id: Option<i64>,
    subscription_days: i64,
}

/// On-disk shape; timestamps are optional for backfill.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryFile {
    #[serde(default, rename = "trader")]
    traders: Vec<TraderEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TraderEntry {
    id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    added_by: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    added_at_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at_ms: Option<i64>,
}

impl TraderEntry {
    fn into_profile(self, subscription_days: i64) -> TraderProfile {
        let added_at_ms = self.added_at_ms.unwrap_or_else(|| Utc::now().timestamp_millis());
        let expires_at_ms = self
            .expires_at_ms
            .unwrap_or(added_at_ms + subscription_days * 24 * 60 * 60 * 1000);
        TraderProfile {
            id: self.id,
            username: self.username,
            name: self.name,
            added_by: self.added_by,
            added_at_ms,
            expires_at_ms,
        }
    }

    fn from_profile(profile: &TraderProfile) -> Self {
        Self {
            id: profile.id,
            username: profile.username.clone(),
            name: profile.name.clone(),
            added_by: profile.added_by,
            added_at_ms: Some(profile.added_at_ms),
            expires_at_ms: Some(profile.expires_at_ms),
        }
    }
}

impl TomlTraderDirectory {
    /// Opens a registry at `path`. The file is created on first write.
    pub fn new(path: impl AsRef<Path>, owner_id: Option<i64>, subscription_days: i64) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            owner_id,
            subscription_days,
        }
    }

    fn load_registry(&self) -> Result<Vec<TraderProfile>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let file: RegistryFile = toml::from_str(&content)?;
        Ok(file
            .traders
            .into_iter()
            .map(|entry| entry.into_profile(self.subscription_days))
            .collect())
    }

    /// Atomic rewrite: serialize, write to a tmp file in the same
    /// directory, fsync, rename over the target.
    fn save_registry(&self, profiles: &[TraderProfile]) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let file = RegistryFile {
            traders: profiles.iter().map(TraderEntry::from_profile).collect(),
        };
        let toml_string = toml::to_string_pretty(&file)?;

        let tmp_path = self.path.with_extension("toml.tmp");
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(toml_string.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Exclusive lock spanning a read-modify-write of the registry.
    fn acquire_lock(&self) -> Result<RegistryLock> {
        RegistryLock::acquire(&self.path)
    }
}

#[async_trait]
impl TraderDirectory for TomlTraderDirectory {
    async fn is_authorized(&self, actor_id: i64) -> bool {
        if self.owner_id == Some(actor_id) {
            return true;
        }
        match self.load_registry() {
            Ok(profiles) => profiles
                .iter()
                .any(|p| p.id == actor_id && p.is_active()),
            Err(e) => {
                // An unreadable registry must not lock the owner's
                // traders in, but it cannot authorize anyone either.
                tracing::warn!("Trader registry unreadable: {}", e);
                false
            }
        }
    }

    async fn profile(&self, actor_id: i64) -> Result<Option<TraderProfile>> {
        Ok(self
            .load_registry()?
            .into_iter()
            .find(|p| p.id == actor_id))
    }

    async fn upsert(&self, profile: TraderProfile) -> Result<()> {
        let _lock = self.acquire_lock()?;
        let mut profiles = self.load_registry()?;
        match profiles.iter_mut().find(|p| p.id == profile.id) {
            Some(existing) => *existing = profile,
            None => profiles.push(profile),
        }
        self.save_registry(&profiles)
    }

    async fn remove(&self, actor_id: i64) -> Result<bool> {
        let _lock = self.acquire_lock()?;
        let mut profiles = self.load_registry()?;
        let before = profiles.len();
        profiles.retain(|p| p.id != actor_id);
        if profiles.len() == before {
            return Ok(false);
        }
        self.save_registry(&profiles)?;
        Ok(true)
    }

    async fn list(&self) -> Result<Vec<TraderProfile>> {
        self.load_registry()
    }
}

/// A file lock guard that releases the lock when dropped.
struct RegistryLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl RegistryLock {
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");
        if let Some(parent) = lock_path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive()
                .map_err(|e| TracsError::storage(format!("lock registry: {}", e)))?;
        }

        Ok(RegistryLock { file, lock_path })
    }
}

impl Drop for RegistryLock {
    fn drop(&mut self) {
        // Unlock is automatic when the file handle is dropped.
        let _ = fs::remove_file(&self.lock_path);
    }
}
