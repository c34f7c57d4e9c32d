//! Fully materialized view of every collection.

use anyhow::{Error, Result, anyhow};
use farmtrack_core::crop::{HarvestCountdown, filter_crops, harvest_countdown};
use farmtrack_core::directory::Directory;
use farmtrack_core::id::FarmId;
use farmtrack_core::weather::{Advice, advice, forecast};
use farmtrack_core::{
    Crop, CropStatus, Expense, Farm, FinancialSummary, Income, Records, Task, TaskBuckets, WeatherDay,
    aggregate, classify,
};
use farmtrack_store_json::Collection;
use serde_json::Value;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::debug;

use crate::raw;
use crate::store::RecordStore;

/// One forecast day with its advice.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyAdvice<'a> {
    /// Forecast day.
    pub day: &'a WeatherDay,
    /// Advice in rule order.
    pub advice: Vec<Advice>,
}

/// One crop row for listings.
#[derive(Debug, Clone, PartialEq)]
pub struct CropOverview<'a> {
    /// Crop planting.
    pub crop: &'a Crop,
    /// Farm display name or placeholder.
    pub farm: String,
    /// Time left until harvest, when it applies.
    pub countdown: Option<HarvestCountdown>,
}

/// Every collection, adapted to canonical records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Farms.
    pub farms: Vec<Farm>,
    /// Crop plantings.
    pub crops: Vec<Crop>,
    /// Tasks.
    pub tasks: Vec<Task>,
    /// Expenses.
    pub expenses: Vec<Expense>,
    /// Income records.
    pub income: Vec<Income>,
    /// Forecast days.
    pub weather: Vec<WeatherDay>,
}

impl Snapshot {
    /// Load every collection one after another.
    ///
    /// # Errors
    /// Returns the first store error.
    pub fn load<S: RecordStore>(store: &S) -> Result<Self> {
        let fetch = |collection| store.load(collection).map_err(Into::<Error>::into);
        Ok(Self::from_raw(
            &fetch(Collection::Farms)?,
            &fetch(Collection::Crops)?,
            &fetch(Collection::Tasks)?,
            &fetch(Collection::Expenses)?,
            &fetch(Collection::Income)?,
            &fetch(Collection::Weather)?,
        ))
    }

    /// Load every collection concurrently on the blocking pool.
    ///
    /// Nothing is returned until all collections have loaded, so callers
    /// never see a partial snapshot.
    ///
    /// # Errors
    /// Returns the first store or join error.
    pub async fn load_concurrently<S>(store: &Arc<S>) -> Result<Self>
    where
        S: RecordStore + Send + Sync + 'static,
    {
        let (farms, crops, tasks, expenses, income, weather) = tokio::try_join!(
            fetch(store, Collection::Farms),
            fetch(store, Collection::Crops),
            fetch(store, Collection::Tasks),
            fetch(store, Collection::Expenses),
            fetch(store, Collection::Income),
            fetch(store, Collection::Weather),
        )?;
        Ok(Self::from_raw(&farms, &crops, &tasks, &expenses, &income, &weather))
    }

    fn from_raw(
        farms: &[Value],
        crops: &[Value],
        tasks: &[Value],
        expenses: &[Value],
        income: &[Value],
        weather: &[Value],
    ) -> Self {
        let snapshot = Self {
            farms: raw::farms(farms),
            crops: raw::crops(crops),
            tasks: raw::tasks(tasks),
            expenses: raw::expenses(expenses),
            income: raw::income_records(income),
            weather: raw::weather(weather),
        };
        debug!(
            farms = snapshot.farms.len(),
            crops = snapshot.crops.len(),
            tasks = snapshot.tasks.len(),
            expenses = snapshot.expenses.len(),
            income = snapshot.income.len(),
            "materialized snapshot"
        );
        snapshot
    }

    /// Borrowed view for dashboard computations.
    #[must_use]
    pub fn records(&self) -> Records<'_> {
        Records {
            farms: &self.farms,
            crops: &self.crops,
            tasks: &self.tasks,
            expenses: &self.expenses,
            income: &self.income,
        }
    }

    /// Tasks bucketed for `now`, each bucket ordered by due date.
    #[must_use]
    pub fn task_buckets(&self, now: OffsetDateTime) -> TaskBuckets<'_> {
        let mut buckets = classify(&self.tasks, now);
        buckets.sort_by_due_date();
        buckets
    }

    /// Financial summary over every expense and income record.
    #[must_use]
    pub fn finances(&self) -> FinancialSummary {
        aggregate(&self.expenses, &self.income, &self.farms, &self.crops)
    }

    /// Advice for the first `days` forecast days.
    #[must_use]
    pub fn weather_report(&self, days: usize) -> Vec<DailyAdvice<'_>> {
        forecast(&self.weather, days)
            .iter()
            .map(|day| DailyAdvice {
                day,
                advice: advice(day),
            })
            .collect()
    }

    /// Crops matching the optional filters, with farm label and harvest countdown.
    #[must_use]
    pub fn crop_overview(
        &self,
        now: OffsetDateTime,
        farm: Option<FarmId>,
        status: Option<CropStatus>,
    ) -> Vec<CropOverview<'_>> {
        let directory = Directory::new(&self.farms, &self.crops);
        filter_crops(&self.crops, farm, status)
            .into_iter()
            .map(|crop| CropOverview {
                crop,
                farm: directory.farm_label(crop.farm_id),
                countdown: harvest_countdown(crop, now),
            })
            .collect()
    }
}

async fn fetch<S>(store: &Arc<S>, collection: Collection) -> Result<Vec<Value>>
where
    S: RecordStore + Send + Sync + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || store.load(collection).map_err(Into::<Error>::into))
        .await
        .map_err(|e| anyhow!("{collection} load task join error: {e}"))?
}
