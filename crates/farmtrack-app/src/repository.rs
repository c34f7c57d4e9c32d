//! Record reads and writes with the invariants every write must keep.

use farmtrack_core::id::{CropId, ExpenseId, FarmId, IncomeId, TaskId};
use farmtrack_core::{
    AreaUnit, Crop, CropStatus, DateValue, Expense, Farm, Income, Priority, Task, WeatherDay,
};
use farmtrack_store_json::Collection;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::raw;
use crate::store::RecordStore;

/// Key holding the recomputed income total in stored records.
pub const TOTAL_AMOUNT_KEY: &str = "totalAmount";

/// Errors raised by [`FarmRepository`].
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Target record could not be found.
    #[error("{collection} record {id} not found")]
    NotFound {
        /// Collection searched.
        collection: Collection,
        /// Requested identifier.
        id: u64,
    },
    /// Record could not be encoded for storage.
    #[error("failed to encode {collection} record: {source}")]
    Encode {
        /// Target collection.
        collection: Collection,
        /// Underlying encoder error.
        #[source]
        source: serde_json::Error,
    },
    /// Backing store returned an error.
    #[error("store error: {0}")]
    Store(#[source] anyhow::Error),
}

/// Result alias for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Input for a new farm.
#[derive(Debug, Clone, Default)]
pub struct NewFarm {
    /// Display name.
    pub name: String,
    /// Free-form location.
    pub location: String,
    /// Total area.
    pub total_area: f64,
    /// Unit of `total_area`.
    pub unit: AreaUnit,
    /// Notes.
    pub notes: Option<String>,
}

/// Input for a new crop planting.
#[derive(Debug, Clone, Default)]
pub struct NewCrop {
    /// Farm the crop is planted on.
    pub farm_id: Option<FarmId>,
    /// Crop name.
    pub crop_name: String,
    /// Variety.
    pub variety: String,
    /// Planting date.
    pub planting_date: DateValue,
    /// Expected harvest date.
    pub expected_harvest_date: DateValue,
    /// Area planted.
    pub area_planted: f64,
    /// Growth status.
    pub status: CropStatus,
    /// Notes.
    pub notes: Option<String>,
}

/// Input for a new task. Tasks always start open.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    /// Title.
    pub title: String,
    /// Description.
    pub description: Option<String>,
    /// Related farm.
    pub farm_id: Option<FarmId>,
    /// Related crop.
    pub crop_id: Option<CropId>,
    /// Due date.
    pub due_date: DateValue,
    /// Priority.
    pub priority: Priority,
}

/// Input for a new expense.
#[derive(Debug, Clone, Default)]
pub struct NewExpense {
    /// Date of the expense.
    pub date: DateValue,
    /// Category.
    pub category: String,
    /// Amount spent.
    pub amount: f64,
    /// Description.
    pub description: String,
    /// Farm charged, `None` for general overhead.
    pub farm_id: Option<FarmId>,
}

/// Input for a new income record.
#[derive(Debug, Clone, Default)]
pub struct NewIncome {
    /// Date of sale.
    pub date: DateValue,
    /// Crop sold.
    pub crop_id: Option<CropId>,
    /// Farm credited.
    pub farm_id: Option<FarmId>,
    /// Units sold.
    pub quantity: f64,
    /// Price per unit.
    pub price_per_unit: f64,
    /// Buyer.
    pub buyer: String,
}

/// Typed access to every collection of a [`RecordStore`].
///
/// Ids are allocated as `max + 1` over the stored ids. Updates merge into
/// the stored object so fields this crate does not model survive.
#[derive(Debug, Clone)]
pub struct FarmRepository<S> {
    store: S,
}

impl<S: RecordStore> FarmRepository<S> {
    /// Wrap a store.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Backing store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Every usable farm.
    ///
    /// # Errors
    /// Returns an error when the collection cannot be read.
    pub fn list_farms(&self) -> RepositoryResult<Vec<Farm>> {
        Ok(raw::farms(&self.load(Collection::Farms)?))
    }

    /// Every usable crop planting.
    ///
    /// # Errors
    /// Returns an error when the collection cannot be read.
    pub fn list_crops(&self) -> RepositoryResult<Vec<Crop>> {
        Ok(raw::crops(&self.load(Collection::Crops)?))
    }

    /// Every usable task.
    ///
    /// # Errors
    /// Returns an error when the collection cannot be read.
    pub fn list_tasks(&self) -> RepositoryResult<Vec<Task>> {
        Ok(raw::tasks(&self.load(Collection::Tasks)?))
    }

    /// # Errors
    /// Returns an error when the collection cannot be read.
    pub fn list_expenses(&self) -> RepositoryResult<Vec<Expense>> {
        Ok(raw::expenses(&self.load(Collection::Expenses)?))
    }

    /// # Errors
    /// Returns an error when the collection cannot be read.
    pub fn list_income(&self) -> RepositoryResult<Vec<Income>> {
        Ok(raw::income_records(&self.load(Collection::Income)?))
    }

    /// # Errors
    /// Returns an error when the collection cannot be read.
    pub fn list_weather(&self) -> RepositoryResult<Vec<WeatherDay>> {
        Ok(raw::weather(&self.load(Collection::Weather)?))
    }

    /// Create a farm stamped with `now`.
    ///
    /// # Errors
    /// Returns an error when the collection cannot be read or written.
    pub fn create_farm(&self, draft: NewFarm, now: OffsetDateTime) -> RepositoryResult<Farm> {
        self.append(Collection::Farms, encode, |id| Farm {
            id: FarmId(id),
            name: draft.name,
            location: draft.location,
            total_area: draft.total_area,
            unit: draft.unit,
            notes: draft.notes,
            created_at: DateValue::from(now),
        })
    }

    /// # Errors
    /// Returns an error when the collection cannot be read or written.
    pub fn create_crop(&self, draft: NewCrop) -> RepositoryResult<Crop> {
        self.append(Collection::Crops, encode, |id| Crop {
            id: CropId(id),
            farm_id: draft.farm_id,
            crop_name: draft.crop_name,
            variety: draft.variety,
            planting_date: draft.planting_date,
            expected_harvest_date: draft.expected_harvest_date,
            area_planted: draft.area_planted,
            status: draft.status,
            notes: draft.notes,
        })
    }

    /// Create an open task.
    ///
    /// # Errors
    /// Returns an error when the collection cannot be read or written.
    pub fn create_task(&self, draft: NewTask) -> RepositoryResult<Task> {
        self.append(Collection::Tasks, encode, |id| Task {
            description: draft.description,
            farm_id: draft.farm_id,
            crop_id: draft.crop_id,
            priority: draft.priority,
            ..Task::open(TaskId(id), draft.title, draft.due_date)
        })
    }

    /// # Errors
    /// Returns an error when the collection cannot be read or written.
    pub fn create_expense(&self, draft: NewExpense) -> RepositoryResult<Expense> {
        self.append(Collection::Expenses, encode, |id| Expense {
            id: ExpenseId(id),
            date: draft.date,
            category: draft.category,
            amount: Some(draft.amount),
            description: draft.description,
            farm_id: draft.farm_id,
        })
    }

    /// Create an income record; its stored total is computed here.
    ///
    /// # Errors
    /// Returns an error when the collection cannot be read or written.
    pub fn create_income(&self, draft: NewIncome) -> RepositoryResult<Income> {
        self.append(Collection::Income, encode_income, |id| Income {
            id: IncomeId(id),
            date: draft.date,
            crop_id: draft.crop_id,
            farm_id: draft.farm_id,
            quantity: Some(draft.quantity),
            price_per_unit: Some(draft.price_per_unit),
            buyer: draft.buyer,
        })
    }

    /// # Errors
    /// Returns [`RepositoryError::NotFound`] when no farm has this id.
    pub fn update_farm(&self, farm: &Farm) -> RepositoryResult<()> {
        self.replace(Collection::Farms, farm.id.0, encode(Collection::Farms, farm)?)
    }

    /// # Errors
    /// Returns [`RepositoryError::NotFound`] when no crop has this id.
    pub fn update_crop(&self, crop: &Crop) -> RepositoryResult<()> {
        self.replace(Collection::Crops, crop.id.0, encode(Collection::Crops, crop)?)
    }

    /// Store a task, stamping or clearing `completed_at` to match `completed`.
    ///
    /// # Errors
    /// Returns [`RepositoryError::NotFound`] when no task has this id.
    pub fn update_task(&self, mut task: Task, now: OffsetDateTime) -> RepositoryResult<Task> {
        if task.completed {
            if task.completed_at.as_ref().is_none_or(DateValue::is_absent) {
                task.completed_at = Some(DateValue::from(now));
            }
        } else {
            task.completed_at = None;
        }
        self.replace(Collection::Tasks, task.id.0, encode(Collection::Tasks, &task)?)?;
        Ok(task)
    }

    /// # Errors
    /// Returns [`RepositoryError::NotFound`] when no expense has this id.
    pub fn update_expense(&self, expense: &Expense) -> RepositoryResult<()> {
        self.replace(Collection::Expenses, expense.id.0, encode(Collection::Expenses, expense)?)
    }

    /// Store an income record with a freshly computed total.
    ///
    /// # Errors
    /// Returns [`RepositoryError::NotFound`] when no income record has this id.
    pub fn update_income(&self, income: &Income) -> RepositoryResult<()> {
        self.replace(Collection::Income, income.id.0, encode_income(Collection::Income, income)?)
    }

    /// Flip a task's completion flag.
    ///
    /// # Errors
    /// Returns [`RepositoryError::NotFound`] when no usable task has this id.
    pub fn toggle_task(&self, id: TaskId, now: OffsetDateTime) -> RepositoryResult<Task> {
        let records = self.load(Collection::Tasks)?;
        let mut task = records
            .iter()
            .filter(|record| raw::record_id(record) == Some(id.0))
            .find_map(raw::task)
            .ok_or(RepositoryError::NotFound {
                collection: Collection::Tasks,
                id: id.0,
            })?;
        task.toggle(DateValue::from(now));
        debug!(task = %id, completed = task.completed, "toggled task");
        self.update_task(task, now)
    }

    /// Remove every record with this id. Returns whether anything was removed.
    ///
    /// # Errors
    /// Returns an error when the collection cannot be read or written.
    pub fn delete(&self, collection: Collection, id: u64) -> RepositoryResult<bool> {
        let mut records = self.load(collection)?;
        let before = records.len();
        records.retain(|record| raw::record_id(record) != Some(id));
        if records.len() == before {
            return Ok(false);
        }
        self.save(collection, &records)?;
        info!(%collection, id, "deleted record");
        Ok(true)
    }

    /// Replace the stored forecast.
    ///
    /// # Errors
    /// Returns an error when the days cannot be encoded or written.
    pub fn replace_weather(&self, days: &[WeatherDay]) -> RepositoryResult<()> {
        let records = days
            .iter()
            .map(|day| encode(Collection::Weather, day))
            .collect::<RepositoryResult<Vec<_>>>()?;
        self.save(Collection::Weather, &records)
    }

    fn load(&self, collection: Collection) -> RepositoryResult<Vec<Value>> {
        self.store
            .load(collection)
            .map_err(|err| RepositoryError::Store(err.into()))
    }

    fn save(&self, collection: Collection, records: &[Value]) -> RepositoryResult<()> {
        self.store
            .save(collection, records)
            .map_err(|err| RepositoryError::Store(err.into()))
    }

    fn append<T>(
        &self,
        collection: Collection,
        encode: fn(Collection, &T) -> RepositoryResult<Value>,
        build: impl FnOnce(u64) -> T,
    ) -> RepositoryResult<T> {
        let mut records = self.load(collection)?;
        let id = next_id(&records);
        let record = build(id);
        records.push(encode(collection, &record)?);
        self.save(collection, &records)?;
        info!(%collection, id, "created record");
        Ok(record)
    }

    fn replace(&self, collection: Collection, id: u64, update: Value) -> RepositoryResult<()> {
        let mut records = self.load(collection)?;
        let slot = records
            .iter_mut()
            .find(|record| raw::record_id(record) == Some(id))
            .ok_or(RepositoryError::NotFound { collection, id })?;
        merge(slot, update, legacy_keys(collection));
        self.save(collection, &records)?;
        info!(%collection, id, "updated record");
        Ok(())
    }
}

fn next_id(records: &[Value]) -> u64 {
    records
        .iter()
        .filter_map(raw::record_id)
        .max()
        .map_or(1, |max| max.saturating_add(1))
}

// Keys accepted on read that the canonical encoding writes under another name.
const fn legacy_keys(collection: Collection) -> &'static [&'static str] {
    match collection {
        Collection::Crops => &["id", "name"],
        _ => &["id"],
    }
}

fn merge(slot: &mut Value, update: Value, legacy: &[&str]) {
    match (slot, update) {
        (Value::Object(existing), Value::Object(fields)) => {
            for key in legacy {
                existing.remove(*key);
            }
            existing.extend(fields);
        }
        (slot, update) => *slot = update,
    }
}

fn encode<T: Serialize>(collection: Collection, record: &T) -> RepositoryResult<Value> {
    serde_json::to_value(record).map_err(|source| RepositoryError::Encode { collection, source })
}

fn encode_income(collection: Collection, income: &Income) -> RepositoryResult<Value> {
    let mut value = encode(collection, income)?;
    if let Value::Object(fields) = &mut value {
        fields.insert(TOTAL_AMOUNT_KEY.to_owned(), Value::from(income.total_amount()));
    }
    Ok(value)
}
