//! Income/expense aggregation.

use crate::directory::Directory;
use crate::id::{CropId, ExpenseId, FarmId, IncomeId};
use crate::record::{Crop, Expense, Farm, Income, coerce, is_usable};
use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;

/// Expenses charged to one farm (or to general overhead).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FarmExpenses {
    /// Farm id; `None` for the general bucket.
    pub farm_id: Option<FarmId>,
    /// Farm name, "General" or "Unknown Farm".
    pub label: String,
    /// Sum of amounts.
    pub total: f64,
    /// Number of expense records.
    pub count: usize,
}

/// Revenue attributed to one crop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropIncome {
    /// Crop id, when the income record carried one.
    pub crop_id: Option<CropId>,
    /// `"<cropName> - <variety>"` or "Unknown Crop".
    pub label: String,
    /// Sum of recomputed totals.
    pub total: f64,
    /// Units sold.
    pub quantity: f64,
    /// Number of income records.
    pub count: usize,
}

/// Expenses sharing a category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryExpenses {
    /// Category as recorded.
    pub category: String,
    /// Sum of amounts.
    pub total: f64,
    /// Number of expense records.
    pub count: usize,
}

/// Records whose numeric fields failed coercion and were summed as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Anomalies {
    /// Expenses with a missing or non-numeric amount.
    pub expenses: Vec<ExpenseId>,
    /// Income entries with a missing or non-numeric quantity or price.
    pub income: Vec<IncomeId>,
}

impl Anomalies {
    /// Number of affected records.
    #[must_use]
    pub fn count(&self) -> usize {
        self.expenses.len() + self.income.len()
    }

    /// True when every numeric field was usable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

/// Result of [`aggregate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinancialSummary {
    /// Sum of expense amounts.
    pub total_expenses: f64,
    /// Sum of `quantity * price_per_unit` over income.
    pub total_income: f64,
    /// `total_income - total_expenses`; negative means a loss.
    pub net_profit: f64,
    /// Expenses per farm in first-seen order.
    pub by_farm: Vec<FarmExpenses>,
    /// Income per crop in first-seen order.
    pub by_crop: Vec<CropIncome>,
    /// Expenses per category in first-seen order.
    pub by_category: Vec<CategoryExpenses>,
    /// Side channel for values that were summed as zero.
    pub anomalies: Anomalies,
}

/// Summarize expenses and income in a single pass over each collection.
#[must_use]
pub fn aggregate(
    expenses: &[Expense],
    income: &[Income],
    farms: &[Farm],
    crops: &[Crop],
) -> FinancialSummary {
    let directory = Directory::new(farms, crops);
    let mut summary = FinancialSummary::default();
    let mut by_farm = Groups::default();
    let mut by_category = Groups::default();
    let mut by_crop = Groups::default();

    for expense in expenses {
        if !is_usable(expense.amount) {
            summary.anomalies.expenses.push(expense.id);
        }
        let amount = coerce(expense.amount);
        summary.total_expenses += amount;

        let farm = by_farm.entry(expense.farm_id, || FarmExpenses {
            farm_id: expense.farm_id,
            label: directory.farm_label(expense.farm_id),
            total: 0.0,
            count: 0,
        });
        farm.total += amount;
        farm.count += 1;

        let category = by_category.entry(expense.category.as_str(), || CategoryExpenses {
            category: expense.category.clone(),
            total: 0.0,
            count: 0,
        });
        category.total += amount;
        category.count += 1;
    }

    for sale in income {
        if sale.has_numeric_anomaly() {
            summary.anomalies.income.push(sale.id);
        }
        let total = sale.total_amount();
        summary.total_income += total;

        let crop = by_crop.entry(sale.crop_id, || CropIncome {
            crop_id: sale.crop_id,
            label: directory.crop_label(sale.crop_id),
            total: 0.0,
            quantity: 0.0,
            count: 0,
        });
        crop.total += total;
        crop.quantity += coerce(sale.quantity);
        crop.count += 1;
    }

    summary.net_profit = summary.total_income - summary.total_expenses;
    summary.by_farm = by_farm.into_groups();
    summary.by_crop = by_crop.into_groups();
    summary.by_category = by_category.into_groups();
    summary
}

/// Insertion-ordered grouping with O(1) lookup per record.
struct Groups<K, G> {
    index: HashMap<K, usize>,
    groups: Vec<G>,
}

impl<K, G> Default for Groups<K, G> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            groups: Vec::new(),
        }
    }
}

impl<K: Eq + Hash, G> Groups<K, G> {
    fn entry(&mut self, key: K, make: impl FnOnce() -> G) -> &mut G {
        let groups = &mut self.groups;
        let slot = *self.index.entry(key).or_insert_with(|| {
            groups.push(make());
            groups.len() - 1
        });
        &mut self.groups[slot]
    }

    fn into_groups(self) -> Vec<G> {
        self.groups
    }
}
