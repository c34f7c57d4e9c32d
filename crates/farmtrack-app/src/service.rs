use anyhow::{Context, Result};
use farmtrack_core::export::export_file_name;
use farmtrack_core::id::TaskId;
use farmtrack_core::{DashboardStats, Expense, Income, Task, serialize, serialize_tasks};
use farmtrack_store_json::Collection;
use std::sync::Arc;
use time::{OffsetDateTime, UtcOffset};

use crate::config::ProjectConfig;
use crate::repository::{FarmRepository, NewExpense, NewIncome, NewTask};
use crate::snapshot::Snapshot;
use crate::store::RecordStore;

/// A CSV payload together with the file name it should be saved under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    /// Suggested file name.
    pub file_name: String,
    /// CSV text.
    pub contents: String,
}

/// Service façade that encapsulates reads, derived views and writes.
pub struct FarmService<S> {
    store: Arc<S>,
    repository: FarmRepository<Arc<S>>,
    config: ProjectConfig,
    offset: UtcOffset,
}

impl<S> FarmService<S> {
    /// Project configuration in effect.
    pub const fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Current time in the configured calendar offset.
    #[must_use]
    pub fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }
}

impl<S: RecordStore> FarmService<S> {
    /// Build a service over a store.
    ///
    /// # Errors
    /// Returns an error when the configured calendar offset is malformed.
    pub fn new(store: S, config: ProjectConfig) -> Result<Self> {
        let offset = config.utc_offset()?;
        let store = Arc::new(store);
        Ok(Self {
            repository: FarmRepository::new(Arc::clone(&store)),
            store,
            config,
            offset,
        })
    }

    /// Typed record access.
    pub const fn repository(&self) -> &FarmRepository<Arc<S>> {
        &self.repository
    }

    /// Load every collection sequentially.
    ///
    /// # Errors
    /// Returns an error when any collection cannot be read.
    pub fn snapshot(&self) -> Result<Snapshot> {
        Snapshot::load(&self.store).context("failed to load records")
    }

    /// Load every collection concurrently.
    ///
    /// # Errors
    /// Returns an error when any collection cannot be read.
    pub async fn snapshot_concurrently(&self) -> Result<Snapshot>
    where
        S: Send + Sync + 'static,
    {
        Snapshot::load_concurrently(&self.store)
            .await
            .context("failed to load records")
    }

    /// Dashboard statistics with the configured preview length.
    #[must_use]
    pub fn dashboard<'a>(&self, snapshot: &'a Snapshot, now: OffsetDateTime) -> DashboardStats<'a> {
        DashboardStats::compute(snapshot.records(), now, self.config.dashboard.upcoming_limit)
    }

    /// Combined expense and income CSV.
    #[must_use]
    pub fn finance_export(&self, snapshot: &Snapshot, now: OffsetDateTime) -> CsvExport {
        CsvExport {
            file_name: export_file_name(&self.config.export.file_prefix, now),
            contents: serialize(&snapshot.expenses, &snapshot.income, &snapshot.farms, &snapshot.crops),
        }
    }

    /// Task list CSV.
    #[must_use]
    pub fn task_export(&self, snapshot: &Snapshot, now: OffsetDateTime) -> CsvExport {
        let prefix = format!("{}-tasks", self.config.export.file_prefix);
        CsvExport {
            file_name: export_file_name(&prefix, now),
            contents: serialize_tasks(&snapshot.tasks, &snapshot.farms, &snapshot.crops),
        }
    }

    /// Create an open task.
    ///
    /// # Errors
    /// Returns an error when the task cannot be stored.
    pub fn add_task(&self, draft: NewTask) -> Result<Task> {
        self.repository.create_task(draft).context("failed to create task")
    }

    /// Flip a task's completion flag.
    ///
    /// # Errors
    /// Returns an error when the task does not exist or cannot be stored.
    pub fn toggle_task(&self, id: TaskId) -> Result<Task> {
        self.repository
            .toggle_task(id, self.now())
            .with_context(|| format!("failed to toggle task {id}"))
    }

    /// Record an expense.
    ///
    /// # Errors
    /// Returns an error when the expense cannot be stored.
    pub fn add_expense(&self, draft: NewExpense) -> Result<Expense> {
        self.repository.create_expense(draft).context("failed to record expense")
    }

    /// Record a sale.
    ///
    /// # Errors
    /// Returns an error when the income record cannot be stored.
    pub fn add_income(&self, draft: NewIncome) -> Result<Income> {
        self.repository.create_income(draft).context("failed to record income")
    }

    /// Remove a record. Returns whether anything was removed.
    ///
    /// # Errors
    /// Returns an error when the collection cannot be read or written.
    pub fn delete(&self, collection: Collection, id: u64) -> Result<bool> {
        self.repository
            .delete(collection, id)
            .with_context(|| format!("failed to delete {collection} record {id}"))
    }
}
