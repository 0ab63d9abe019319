use std::path::PathBuf;

use serde::Deserialize;

/// Content store configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root directory of the content store. Default: "./storage".
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    /// Largest accepted upload body in bytes. Default: 100 MiB.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("./storage")
}
fn default_max_upload_size() -> u64 {
    100 * 1024 * 1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            max_upload_size: default_max_upload_size(),
        }
    }
}
