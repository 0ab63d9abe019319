mod error;
mod hash;
mod location;
mod traits;

pub mod filesystem;

pub use error::StorageError;
pub use filesystem::FilesystemContentStore;
pub use hash::ContentHash;
pub use location::StorageLocation;
pub use traits::{BoxReader, ContentStore};
