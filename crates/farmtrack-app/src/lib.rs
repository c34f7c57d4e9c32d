//! Application layer for farmtrack.
//!
//! This crate turns loosely shaped stored records into canonical ones,
//! guards the write invariants, loads snapshots and wires configuration
//! into the derived views used by the CLI.

pub mod config;
pub mod raw;
pub mod repository;
pub mod service;
pub mod snapshot;
pub mod store;

// Re-exports for convenience
pub use config::{CalendarConfig, DashboardConfig, ExportConfig, ProjectConfig, StoreConfig};
pub use repository::{
    FarmRepository, NewCrop, NewExpense, NewFarm, NewIncome, NewTask, RepositoryError,
    RepositoryResult,
};
pub use service::{CsvExport, FarmService};
pub use snapshot::{CropOverview, DailyAdvice, Snapshot};
pub use store::{MemoryStore, RecordStore};
