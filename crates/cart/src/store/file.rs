//! Directory-backed store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

use super::{PersistentStore, StoreError};

const TMP_SUFFIX: &str = ".tmp";

/// Stores each key as one file under a root directory.
///
/// Keys are percent-encoded into file names, so `@RocketShoes:cart` becomes
/// `%40RocketShoes%3Acart.json`. Writes go to a sibling temp file that is
/// fsynced and renamed over the target, so a failed or interrupted write
/// leaves the previous value readable.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory the key files live in.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing `key`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidKey` for an empty key.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{}.json", urlencoding::encode(key))))
    }
}

impl PersistentStore for FileStore {
    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                debug!(bytes = bytes.len(), "Read stored value");
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    #[instrument(skip(self, value), fields(root = %self.root.display(), bytes = value.len()))]
    async fn write(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let mut tmp = path.clone().into_os_string();
        tmp.push(TMP_SUFFIX);
        let tmp = PathBuf::from(tmp);

        tokio::fs::create_dir_all(&self.root).await?;
        if let Err(e) = replace(&tmp, &path, value).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StoreError::Io(e));
        }

        // fsync the directory so the rename itself survives a crash
        #[cfg(unix)]
        {
            if let Ok(dir) = tokio::fs::File::open(&self.root).await {
                let _ = dir.sync_all().await;
            }
        }

        debug!("Wrote stored value");
        Ok(())
    }
}

/// Write `value` to `tmp`, fsync it, then rename it over `path`.
async fn replace(tmp: &Path, path: &Path, value: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(tmp).await?;
    file.write_all(value).await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(tmp, path).await
}
