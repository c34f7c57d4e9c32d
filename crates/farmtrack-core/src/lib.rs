//! Derived state for farm records: task buckets, financial summaries and CSV exports.
//!
//! Every function here is pure. Callers hand in fully loaded record
//! collections (and an explicit `now` where time matters) and get a fresh
//! value back; malformed data shows up as extra buckets, placeholder labels
//! or anomaly lists, never as an error.

/// Task bucketing.
pub mod classify;
/// Crop-level insights.
pub mod crop;
/// Landing page statistics.
pub mod dashboard;
/// Farm/crop reference resolution.
pub mod directory;
/// CSV export.
pub mod export;
/// Financial aggregation.
pub mod finance;
/// Identifier types.
pub mod id;
/// Canonical record shapes.
pub mod record;
/// Date normalization.
pub mod temporal;
/// Forecast advice.
pub mod weather;

pub use classify::{TaskBucket, TaskBuckets, classify, compare_due_date};
pub use dashboard::{DashboardStats, Records};
pub use export::{serialize, serialize_tasks};
pub use finance::{FinancialSummary, aggregate};
pub use record::{AreaUnit, Crop, CropStatus, Expense, Farm, Income, Priority, Task};
pub use temporal::{DateValue, Moment, Normalized, normalize};
pub use weather::{WeatherCondition, WeatherDay};
