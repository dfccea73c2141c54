//! Directory-backed implementation of DurableStore.
//!
//! One file per key. Writes go to a temp file in the same directory and are
//! renamed into place, so a record is always either the old value or the new
//! one, never a partial write.

use crate::store::{DurableStore, StoreError};
use base64::engine::general_purpose;
use base64::Engine as _;
use std::fs;
use std::io;
use std::path::PathBuf;

/// File-per-key store rooted at a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Map a store key to a filename.
    ///
    /// The runtime only produces keys of the shape `bundle_<uuid>`, which are
    /// filename-safe as-is. Anything else is base64-encoded so arbitrary keys
    /// cannot escape the store directory.
    fn file_name(key: &str) -> String {
        let safe = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !key.starts_with('.');
        if safe {
            key.to_string()
        } else {
            format!("b64-{}", general_purpose::URL_SAFE_NO_PAD.encode(key))
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(Self::file_name(key))
    }
}

impl DurableStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        // Temp file in the same directory so the rename stays on one filesystem.
        let temp_path = self.dir.join(format!(
            ".{}.tmp.{}",
            Self::file_name(key),
            std::process::id()
        ));
        fs::write(&temp_path, value)?;
        fs::rename(&temp_path, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&self) -> Result<(), StoreError> {
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }
}
