use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;
use super::hash::ContentHash;
use super::location::StorageLocation;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Content-addressed byte storage.
///
/// Each distinct hash is written at most once; writing a hash that is already
/// present is a successful no-op returning the existing location.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store `data` under the location derived from `hash`.
    ///
    /// Fails with [`StorageError::HashMismatch`] if `data` does not digest to
    /// `hash`, and with [`StorageError::Io`] on any filesystem failure.
    async fn write(
        &self,
        hash: &ContentHash,
        data: &[u8],
    ) -> Result<StorageLocation, StorageError>;

    /// Read all bytes at a location.
    async fn read(&self, location: &StorageLocation) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.read_stream(location).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Open a location for streaming reads.
    ///
    /// Fails with [`StorageError::NotFound`] if nothing is stored there.
    async fn read_stream(&self, location: &StorageLocation) -> Result<BoxReader, StorageError>;

    async fn exists(&self, location: &StorageLocation) -> Result<bool, StorageError>;
}
