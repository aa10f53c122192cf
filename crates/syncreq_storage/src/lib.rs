pub mod repository;

pub use repository::{OutboxEntry, StorageConfig, SyncreqStorage};
