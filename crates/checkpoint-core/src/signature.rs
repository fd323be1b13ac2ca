// ── Anonymous signature ──
//
// A random 128-bit identifier persisted to a file on first use and reused
// forever after. The endpoint uses it to avoid repeating alerts to the
// same installation; it must never be derived from anything identifying.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use rand::TryRngCore;
use rand::rngs::OsRng;
use tempfile::NamedTempFile;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::CoreError;

/// Resolves or creates the signature stored at a path.
pub struct SignatureStore;

impl SignatureStore {
    /// Return the signature stored at `path`, generating and persisting a
    /// new one if the file does not exist yet.
    ///
    /// Creation never overwrites an existing file: if another process wins
    /// the race, its signature is read back and returned instead.
    pub fn resolve(path: &Path) -> Result<String, CoreError> {
        if let Some(signature) = Self::read(path)? {
            return Ok(signature);
        }

        let signature = generate()?;
        let dir = parent_dir(path);
        fs::create_dir_all(dir).map_err(|e| CoreError::storage(dir, e))?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| CoreError::storage(dir, e))?;
        writeln!(tmp, "{signature}").map_err(|e| CoreError::storage(tmp.path(), e))?;

        match tmp.persist_noclobber(path) {
            Ok(_) => {
                info!(path = %path.display(), "generated new checkpoint signature");
                Ok(signature)
            }
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), "signature created concurrently, reusing it");
                Self::read(path)?.ok_or_else(|| CoreError::storage(path, e.error))
            }
            Err(e) => Err(CoreError::storage(path, e.error)),
        }
    }

    fn read(path: &Path) -> Result<Option<String>, CoreError> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(Some(contents.trim().to_owned())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CoreError::storage(path, e)),
        }
    }
}

/// 16 bytes from the OS CSPRNG, formatted as `8-4-4-4-12` lowercase hex.
fn generate() -> Result<String, CoreError> {
    let mut bytes = [0u8; 16];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CoreError::Internal(format!("failed to generate random bytes: {e}")))?;
    Ok(Uuid::from_bytes(bytes).hyphenated().to_string())
}

pub(crate) fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}
