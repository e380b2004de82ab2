use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::key::validate_key;
use crate::traits::DocumentStore;

/// Filesystem-backed document store.
///
/// A bucket is a directory under `root`; each key is a file inside it,
/// with `/` in the key mapping to subdirectories. Writes go to a temporary
/// file in the target directory and are renamed into place.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    root: PathBuf,
    bucket: String,
}

impl FsDocumentStore {
    /// Open the bucket `bucket` under `root`. Nothing is created until the
    /// first write.
    pub fn new(root: impl AsRef<Path>, bucket: impl Into<String>) -> StoreResult<Self> {
        let bucket = bucket.into();
        if bucket.contains('/') {
            return Err(StoreError::InvalidKey {
                key: bucket,
                reason: "bucket name contains '/'",
            });
        }
        validate_key(&bucket)?;
        Ok(Self {
            root: root.as_ref().to_path_buf(),
            bucket,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn bucket_dir(&self) -> PathBuf {
        self.root.join(&self.bucket)
    }

    fn object_path(&self, key: &str) -> StoreResult<PathBuf> {
        validate_key(key)?;
        Ok(self.bucket_dir().join(key))
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn fetch(&self, key: &str) -> StoreResult<Option<Bytes>> {
        let path = self.object_path(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => {
                debug!(bucket = %self.bucket, key, bytes = data.len(), "fetched object");
                Ok(Some(Bytes::from(data)))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(bucket = %self.bucket, key, "object not found");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, key: &str, data: Bytes) -> StoreResult<()> {
        let path = self.object_path(key)?;
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.bucket_dir());
        let len = data.len();

        tokio::task::spawn_blocking(move || -> StoreResult<()> {
            std::fs::create_dir_all(&dir)?;
            let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
            tmp.write_all(&data)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("write task failed: {e}")))??;

        debug!(bucket = %self.bucket, key, bytes = len, "stored object");
        Ok(())
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let path = self.object_path(key)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> FsDocumentStore {
        FsDocumentStore::new(dir.path(), "arcade-bucket").unwrap()
    }

    #[tokio::test]
    async fn fetch_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.fetch("database.json").await.unwrap().is_none());
        assert!(!store.exists("database.json").await.unwrap());
    }

    #[tokio::test]
    async fn store_then_fetch_creates_bucket_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .store("database.json", Bytes::from_static(b"{\"users\":[]}"))
            .await
            .unwrap();

        assert!(dir.path().join("arcade-bucket/database.json").is_file());
        let data = store.fetch("database.json").await.unwrap().unwrap();
        assert_eq!(&data[..], b"{\"users\":[]}");
        assert!(store.exists("database.json").await.unwrap());
    }

    #[tokio::test]
    async fn nested_keys_map_to_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.store("images/chess.png", Bytes::from_static(b"png")).await.unwrap();
        assert!(dir.path().join("arcade-bucket/images/chess.png").is_file());
        assert!(store.exists("images/chess.png").await.unwrap());
    }

    #[tokio::test]
    async fn overwrite_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.store("db.json", Bytes::from_static(b"one")).await.unwrap();
        store.store("db.json", Bytes::from_static(b"two")).await.unwrap();

        assert_eq!(&store.fetch("db.json").await.unwrap().unwrap()[..], b"two");
        let entries = std::fs::read_dir(dir.path().join("arcade-bucket")).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn non_not_found_errors_propagate() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        // A directory where the object should be: reading it is an I/O
        // error, not "absent".
        std::fs::create_dir_all(dir.path().join("arcade-bucket/database.json")).unwrap();
        let err = store.fetch("database.json").await.unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
        assert!(!store.exists("database.json").await.unwrap());
    }

    #[test]
    fn bucket_names_are_single_segments() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FsDocumentStore::new(dir.path(), "a/b").is_err());
        assert!(FsDocumentStore::new(dir.path(), "..").is_err());
        assert!(FsDocumentStore::new(dir.path(), "").is_err());
    }
}
