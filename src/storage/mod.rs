//! # Storage Module - User Store Persistence
//!
//! Every user lives in one JSON document keyed by platform user id:
//!
//! ```text
//! data/
//! └── users.json   ← { "<user id>": UserRecord, ... }
//! ```
//!
//! Handlers load the whole map, change one record and write the whole map
//! back. There is no per-user locking: two handlers that interleave a
//! load/mutate/save on the same user lose one update (last save wins). File
//! locks only keep a reader from seeing a half-written document.
//!
//! Loading never fails. A missing or unreadable store logs a warning and
//! yields an empty map. Saving logs failures instead of returning them to the
//! command that triggered the write.

use anyhow::{anyhow, Result};
use fs2::FileExt;
use log::{debug, warn};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::rpg::types::{ensure_quest_data, UserMap};

/// Load/save contract for the user map.
pub trait UserRepository: Send + Sync {
    /// Full user map; empty when no store exists or it cannot be parsed.
    fn load(&self) -> UserMap;

    /// Overwrite the store. Failures are logged, not retried.
    fn save(&self, users: &UserMap);
}

/// Flat-file JSON implementation of [`UserRepository`].
#[derive(Debug, Clone)]
pub struct JsonUserStore {
    path: PathBuf,
}

impl JsonUserStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<data_dir>/<file_name>`.
    pub fn in_dir(data_dir: impl AsRef<Path>, file_name: &str) -> Self {
        Self::new(data_dir.as_ref().join(file_name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Strict load used by `load`; surfaces why a store could not be read.
    pub fn try_load(&self) -> Result<UserMap> {
        let mut file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(UserMap::new()),
            Err(e) => return Err(anyhow!("Failed to open {}: {}", self.path.display(), e)),
        };
        file.lock_shared()
            .map_err(|e| anyhow!("Failed to lock {}: {}", self.path.display(), e))?;
        let mut raw = String::new();
        file.read_to_string(&mut raw)?;
        drop(file);

        let cleaned = raw.trim_start_matches('\0').trim();
        if cleaned.is_empty() {
            return Ok(UserMap::new());
        }
        let mut users: UserMap = serde_json::from_str(cleaned)
            .map_err(|e| anyhow!("Failed to parse {}: {}", self.path.display(), e))?;
        for record in users.values_mut() {
            ensure_quest_data(record);
        }
        Ok(users)
    }

    /// Strict save used by `save`.
    pub fn try_save(&self, users: &UserMap) -> Result<()> {
        let content = serde_json::to_string_pretty(users)
            .map_err(|e| anyhow!("Failed to serialize users: {}", e))?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        write_file_locked(&self.path, &content)
    }
}

impl UserRepository for JsonUserStore {
    fn load(&self) -> UserMap {
        match self.try_load() {
            Ok(users) => {
                debug!("loaded {} user records from {}", users.len(), self.path.display());
                users
            }
            Err(e) => {
                warn!("user store unreadable, starting empty: {}", e);
                UserMap::new()
            }
        }
    }

    fn save(&self, users: &UserMap) {
        if let Err(e) = self.try_save(users) {
            warn!("failed to save user store {}: {}", self.path.display(), e);
        }
    }
}

/// Totals printed by `punktune status`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStatistics {
    pub total_users: usize,
    pub with_class: usize,
    pub total_baddie_bucks: u64,
    pub total_black_notes: u64,
    pub total_messages: u64,
    pub monsters_hunted: u64,
    pub fish_caught: u64,
    pub quests_completed: usize,
}

pub fn get_statistics(users: &UserMap) -> StoreStatistics {
    users.values().fold(
        StoreStatistics {
            total_users: users.len(),
            ..Default::default()
        },
        |mut acc, r| {
            if r.rpg.stats.has_class() {
                acc.with_class += 1;
            }
            acc.total_baddie_bucks += r.economy.baddie_bucks;
            acc.total_black_notes += r.economy.black_musical_notes;
            acc.total_messages += r.meta.message_count;
            acc.monsters_hunted += r.meta.monsters_hunted;
            acc.fish_caught += r.meta.fish_caught;
            acc.quests_completed += r.rpg.completed_quests.len();
            acc
        },
    )
}

/// Write `content` to `path` under an exclusive lock via temp file and rename.
fn write_file_locked(path: &Path, content: &str) -> Result<()> {
    let lock_file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(path)?;
    lock_file.lock_exclusive()?;

    let dir = path.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    let base = path.file_name().and_then(|s| s.to_str()).unwrap_or("users.json");
    let mut counter = 0u32;
    let tmp_path = loop {
        let candidate = dir.join(format!(".{}.tmp-{}-{}", base, std::process::id(), counter));
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(mut tmp) => {
                tmp.write_all(content.as_bytes())?;
                tmp.flush()?;
                let _ = tmp.sync_all();
                break candidate;
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                counter = counter.saturating_add(1);
                continue;
            }
            Err(e) => return Err(anyhow!("Failed to create temp file for atomic write: {}", e)),
        }
    };

    fs::rename(&tmp_path, path)?;
    if let Ok(dir_file) = File::open(dir) {
        let _ = dir_file.sync_all();
    }
    drop(lock_file);
    Ok(())
}
