//! Persistence of connection profiles.

use crate::error::{DbError, DbResult};
use crate::models::StoredProfile;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Profiles keyed by name, sorted.
pub type ProfileMap = BTreeMap<String, StoredProfile>;

/// Keyed storage of `name -> profile`. Calls block.
pub trait ProfileStore: Send + Sync {
    fn get(&self, name: &str) -> DbResult<Option<StoredProfile>>;

    fn list(&self) -> DbResult<ProfileMap>;

    /// Insert or replace, returning the previous entry.
    fn upsert(&self, name: &str, profile: StoredProfile) -> DbResult<Option<StoredProfile>>;

    /// Remove, returning the removed entry.
    fn remove(&self, name: &str) -> DbResult<Option<StoredProfile>>;
}

/// Profile store backed by a pretty-printed JSON object on disk.
///
/// A missing file holds no profiles. Writes go through a sibling temp file and
/// a rename so a crash never leaves half a document behind.
#[derive(Debug)]
pub struct JsonFileProfileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> DbResult<ProfileMap> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ProfileMap::new()),
            Err(e) => {
                return Err(DbError::persistence(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };
        if text.trim().is_empty() {
            return Ok(ProfileMap::new());
        }
        serde_json::from_str(&text).map_err(|e| {
            DbError::persistence(format!("failed to parse {}: {e}", self.path.display()))
        })
    }

    fn save(&self, profiles: &ProfileMap) -> DbResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                DbError::persistence(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        let body = serde_json::to_string_pretty(profiles)
            .map_err(|e| DbError::persistence(format!("failed to serialize profiles: {e}")))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body)
            .and_then(|_| fs::rename(&tmp, &self.path))
            .map_err(|e| {
                DbError::persistence(format!("failed to write {}: {e}", self.path.display()))
            })?;

        debug!(path = %self.path.display(), count = profiles.len(), "Saved profiles");
        Ok(())
    }

    /// Run a read-modify-write cycle under the store lock.
    fn update<T>(&self, f: impl FnOnce(&mut ProfileMap) -> T) -> DbResult<T> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut profiles = self.load()?;
        let result = f(&mut profiles);
        self.save(&profiles)?;
        Ok(result)
    }
}

impl ProfileStore for JsonFileProfileStore {
    fn get(&self, name: &str) -> DbResult<Option<StoredProfile>> {
        Ok(self.list()?.remove(name))
    }

    fn list(&self) -> DbResult<ProfileMap> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.load()
    }

    fn upsert(&self, name: &str, profile: StoredProfile) -> DbResult<Option<StoredProfile>> {
        self.update(|profiles| profiles.insert(name.to_string(), profile))
    }

    fn remove(&self, name: &str) -> DbResult<Option<StoredProfile>> {
        self.update(|profiles| profiles.remove(name))
    }
}
