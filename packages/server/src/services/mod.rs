//! Domain services backing the HTTP handlers.
//!
//! Each service borrows a connection (`DatabaseConnection` or an open
//! transaction), so the same code runs standalone or inside a larger unit of
//! work.

pub mod accounts;
pub mod content_registry;
pub mod downloads;
pub mod file_catalog;
pub mod quota_ledger;
pub mod shares;
pub mod stats;
pub mod upload;

/// One page of results plus the total number of matching rows.
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}
