// ── Response cache ──
//
// A single-slot, file-backed memo of the last successful check. Entries
// are replaced atomically (temp file in the same directory, then rename),
// so concurrent writers from any number of processes leave either the old
// or the new entry on disk, never a torn one. Unreadable entries are
// treated as missing rather than failing the check.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use checkpoint_api::CheckResponse;

use crate::error::CoreError;
use crate::signature::parent_dir;

/// How long a cached response suppresses network checks by default.
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(48 * 60 * 60);

/// Identifies which request a cached response answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheKey {
    pub product: String,
    pub version: String,
    pub arch: String,
    pub os: String,
}

/// What is stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub response: CheckResponse,
    /// Unix epoch seconds of the fetch that produced `response`.
    pub fetched_at: i64,
}

impl CacheEntry {
    fn age(&self, now: i64) -> Duration {
        Duration::from_secs(u64::try_from(now.saturating_sub(self.fetched_at)).unwrap_or(0))
    }
}

/// File-backed single-slot cache.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    path: PathBuf,
    freshness: Duration,
}

impl ResponseCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            freshness: FRESHNESS_WINDOW,
        }
    }

    /// Replace the default freshness window.
    pub fn with_freshness(mut self, freshness: Duration) -> Self {
        self.freshness = freshness;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the cached entry for `key` if one exists and is still fresh.
    ///
    /// A missing file, a corrupt file, a stale entry, and an entry for a
    /// different key are all reported as `Ok(None)`. Only I/O failures
    /// other than "not found" are errors.
    pub fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CoreError::storage(&self.path, e)),
        };

        let entry: CacheEntry = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable cache file");
                return Ok(None);
            }
        };

        if entry.key != *key {
            debug!(path = %self.path.display(), "cache entry belongs to another request");
            return Ok(None);
        }

        let age = entry.age(Utc::now().timestamp());
        if age >= self.freshness {
            debug!(path = %self.path.display(), age_secs = age.as_secs(), "cache entry is stale");
            return Ok(None);
        }

        Ok(Some(entry))
    }

    /// Store `response` for `key`, stamped with the current time.
    ///
    /// Missing parent directories are created.
    pub fn put(&self, key: &CacheKey, response: &CheckResponse) -> Result<CacheEntry, CoreError> {
        let entry = CacheEntry {
            key: key.clone(),
            response: response.clone(),
            fetched_at: Utc::now().timestamp(),
        };
        let bytes = serde_json::to_vec(&entry)
            .map_err(|e| CoreError::Internal(format!("failed to encode cache entry: {e}")))?;

        let dir = parent_dir(&self.path);
        fs::create_dir_all(dir).map_err(|e| CoreError::storage(dir, e))?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| CoreError::storage(dir, e))?;
        tmp.write_all(&bytes)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| CoreError::storage(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| CoreError::storage(&self.path, e.error))?;

        debug!(path = %self.path.display(), "cached check response");
        Ok(entry)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn key() -> CacheKey {
        CacheKey {
            product: "test".into(),
            version: "1.0".into(),
            arch: "x86_64".into(),
            os: "linux".into(),
        }
    }

    fn response() -> CheckResponse {
        CheckResponse {
            product: "test".into(),
            current_version: "1.0.2".into(),
            outdated: true,
            ..CheckResponse::default()
        }
    }

    #[test]
    fn missing_file_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path().join("cache"));
        assert_eq!(cache.get(&key()).unwrap(), None);
    }

    #[test]
    fn put_then_get_under_nested_missing_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path().join("nested").join("deeper").join("cache"));

        let written = cache.put(&key(), &response()).unwrap();
        let read = cache.get(&key()).unwrap().unwrap();

        assert_eq!(read, written);
        assert_eq!(read.response, response());
    }

    #[test]
    fn corrupt_file_is_a_miss_and_gets_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache");
        fs::write(&path, b"{ not json").unwrap();

        let cache = ResponseCache::new(&path);
        assert_eq!(cache.get(&key()).unwrap(), None);

        cache.put(&key(), &response()).unwrap();
        assert!(cache.get(&key()).unwrap().is_some());
    }

    #[test]
    fn stale_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path().join("cache")).with_freshness(Duration::ZERO);

        cache.put(&key(), &response()).unwrap();
        assert_eq!(cache.get(&key()).unwrap(), None);
    }

    #[test]
    fn old_timestamp_is_stale_under_default_window() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache");
        let entry = CacheEntry {
            key: key(),
            response: response(),
            fetched_at: Utc::now().timestamp() - 49 * 60 * 60,
        };
        fs::write(&path, serde_json::to_vec(&entry).unwrap()).unwrap();

        assert_eq!(ResponseCache::new(&path).get(&key()).unwrap(), None);
    }

    #[test]
    fn different_key_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path().join("cache"));
        cache.put(&key(), &response()).unwrap();

        let other = CacheKey {
            version: "2.0".into(),
            ..key()
        };
        assert_eq!(cache.get(&other).unwrap(), None);
    }

    #[test]
    fn last_writer_wins() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::new(dir.path().join("cache"));

        cache.put(&key(), &response()).unwrap();
        let newer = CheckResponse {
            current_version: "1.0.3".into(),
            ..response()
        };
        cache.put(&key(), &newer).unwrap();

        assert_eq!(cache.get(&key()).unwrap().unwrap().response, newer);
        // Only the cache file itself remains; temp files were renamed away.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
