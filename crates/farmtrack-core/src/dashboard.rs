use crate::classify::classify;
use crate::crop::active_crops;
use crate::finance::aggregate;
use crate::record::{Crop, Expense, Farm, Income, Task};
use serde::Serialize;
use time::OffsetDateTime;

/// Number of upcoming tasks shown on the dashboard by default.
pub const DEFAULT_UPCOMING_LIMIT: usize = 3;

/// Borrowed view over every collection the dashboard reads.
#[derive(Debug, Clone, Copy)]
pub struct Records<'a> {
    /// Farms.
    pub farms: &'a [Farm],
    /// Crops.
    pub crops: &'a [Crop],
    /// Tasks.
    pub tasks: &'a [Task],
    /// Expenses.
    pub expenses: &'a [Expense],
    /// Income.
    pub income: &'a [Income],
}

/// Headline numbers for the landing page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats<'a> {
    /// Number of farms.
    pub farm_count: usize,
    /// Number of crops.
    pub crop_count: usize,
    /// Crops still growing or flowering.
    pub active_crop_count: usize,
    /// Open tasks due today.
    pub tasks_due_today: usize,
    /// Open tasks past due.
    pub overdue_count: usize,
    /// Open tasks whose due date could not be read.
    pub invalid_count: usize,
    /// Sum of recomputed income.
    pub total_income: f64,
    /// Sum of expenses.
    pub total_expenses: f64,
    /// Income minus expenses.
    pub net_profit: f64,
    /// Records whose numbers were summed as zero.
    pub anomaly_count: usize,
    /// Soonest upcoming tasks.
    pub upcoming: Vec<&'a Task>,
}

impl<'a> DashboardStats<'a> {
    /// Compute the dashboard for `now`.
    #[must_use]
    pub fn compute(records: Records<'a>, now: OffsetDateTime, upcoming_limit: usize) -> Self {
        let buckets = classify(records.tasks, now);
        let summary = aggregate(records.expenses, records.income, records.farms, records.crops);
        Self {
            farm_count: records.farms.len(),
            crop_count: records.crops.len(),
            active_crop_count: active_crops(records.crops).len(),
            tasks_due_today: buckets.today.len(),
            overdue_count: buckets.overdue.len(),
            invalid_count: buckets.invalid.len(),
            total_income: summary.total_income,
            total_expenses: summary.total_expenses,
            net_profit: summary.net_profit,
            anomaly_count: summary.anomalies.count(),
            upcoming: buckets.upcoming_preview(upcoming_limit),
        }
    }
}
