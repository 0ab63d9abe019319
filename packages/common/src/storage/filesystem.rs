use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::BufReader;
use tracing::debug;

use super::error::StorageError;
use super::hash::ContentHash;
use super::location::StorageLocation;
use super::traits::{BoxReader, ContentStore};

/// Filesystem-backed content store.
///
/// Objects live at `{root}/{first 2 hex chars}/{64 hex chars}`. Writes go to
/// `{root}/.tmp` first and are renamed into place, so a reader never sees a
/// partially written object.
pub struct FilesystemContentStore {
    root: PathBuf,
}

impl FilesystemContentStore {
    /// Create the store, creating the root and temp directories if needed.
    pub async fn new(root: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(&root).await?;
        fs::create_dir_all(root.join(".tmp")).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn temp_path(&self) -> PathBuf {
        self.root
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl ContentStore for FilesystemContentStore {
    async fn write(
        &self,
        hash: &ContentHash,
        data: &[u8],
    ) -> Result<StorageLocation, StorageError> {
        let actual = ContentHash::compute(data);
        if actual != *hash {
            return Err(StorageError::HashMismatch {
                expected: hash.to_hex(),
                actual: actual.to_hex(),
            });
        }

        let location = StorageLocation::for_hash(hash);
        let object_path = location.resolve(&self.root);

        if fs::try_exists(&object_path).await? {
            debug!(%location, "Content already stored, skipping write");
            return Ok(location);
        }

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Some(parent) = object_path.parent()
            && let Err(e) = fs::create_dir_all(parent).await
        {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&temp_path, &object_path).await {
            let _ = fs::remove_file(&temp_path).await;
            // A concurrent writer of the same hash may have won the rename.
            if fs::try_exists(&object_path).await.unwrap_or(false) {
                return Ok(location);
            }
            return Err(e.into());
        }

        debug!(%location, size = data.len(), "Stored new content");
        Ok(location)
    }

    async fn read_stream(&self, location: &StorageLocation) -> Result<BoxReader, StorageError> {
        match fs::File::open(location.resolve(&self.root)).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(location.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, location: &StorageLocation) -> Result<bool, StorageError> {
        Ok(fs::try_exists(location.resolve(&self.root)).await?)
    }
}
