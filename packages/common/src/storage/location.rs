use std::fmt;
use std::path::{Path, PathBuf};

use super::error::StorageError;
use super::hash::ContentHash;

/// Where a piece of content lives, relative to the store root.
///
/// Always `<first 2 hex chars>/<full 64-char hash>`, so the value can be
/// persisted as-is and joined onto any configured root.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StorageLocation {
    hash: ContentHash,
    path: String,
}

impl StorageLocation {
    pub fn for_hash(hash: &ContentHash) -> Self {
        Self {
            hash: *hash,
            path: format!("{}/{}", hash.shard_prefix(), hash.to_hex()),
        }
    }

    /// Parse a persisted location, rejecting anything that is not exactly a
    /// shard directory followed by the hash it shards.
    pub fn parse(s: &str) -> Result<Self, StorageError> {
        let invalid = || StorageError::InvalidLocation(s.to_string());

        let (shard, name) = s.split_once('/').ok_or_else(invalid)?;
        let hash = ContentHash::from_hex(name).map_err(|_| invalid())?;
        if shard != hash.shard_prefix() || name != hash.to_hex() {
            return Err(invalid());
        }

        Ok(Self::for_hash(&hash))
    }

    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Absolute path of this location under `root`.
    pub fn resolve(&self, root: &Path) -> PathBuf {
        root.join(self.hash.shard_prefix()).join(self.hash.to_hex())
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}
