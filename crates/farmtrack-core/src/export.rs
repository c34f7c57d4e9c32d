//! CSV export of financial records (and tasks).

use crate::directory::Directory;
use crate::record::{Crop, Expense, Farm, Income, Task, coerce};
use crate::temporal::{DateValue, normalize};
use time::OffsetDateTime;
use time::macros::format_description;

/// Column names of the financial export, in order.
pub const HEADER: [&str; 7] = ["Type", "Date", "Category", "Description", "Amount", "Farm", "Crop"];

/// Column names of the task export, in order.
pub const TASK_HEADER: [&str; 7] = [
    "Title",
    "Due Date",
    "Priority",
    "Completed",
    "Farm",
    "Crop",
    "Description",
];

/// Written in place of a date that failed normalization.
pub const INVALID_DATE: &str = "Invalid Date";

/// Category used for every income row.
pub const INCOME_CATEGORY: &str = "Harvest";

/// Default file name prefix for financial exports.
pub const DEFAULT_FILE_PREFIX: &str = "farmtrack-finances";

/// Kind of financial record behind an export row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowType {
    /// Row built from an [`Expense`].
    Expense,
    /// Row built from an [`Income`].
    Income,
}

impl RowType {
    /// Text written in the `Type` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Expense => "Expense",
            Self::Income => "Income",
        }
    }
}

/// One line of the financial export, before escaping.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    /// Expense or income.
    pub row_type: RowType,
    /// `YYYY-MM-DD` or [`INVALID_DATE`].
    pub date: String,
    /// Expense category or [`INCOME_CATEGORY`].
    pub category: String,
    /// Free text or the synthesized income description.
    pub description: String,
    /// Amount rendered as a number.
    pub amount: String,
    /// Resolved farm name or "".
    pub farm: String,
    /// Resolved crop name or "".
    pub crop: String,
}

impl ExportRow {
    fn fields(&self) -> [&str; 7] {
        [
            self.row_type.as_str(),
            self.date.as_str(),
            self.category.as_str(),
            self.description.as_str(),
            self.amount.as_str(),
            self.farm.as_str(),
            self.crop.as_str(),
        ]
    }

    /// Escaped, comma-separated line.
    #[must_use]
    pub fn to_line(&self) -> String {
        join_escaped(&self.fields())
    }
}

/// Build export rows: expenses in input order, then income in input order.
#[must_use]
pub fn export_rows(
    expenses: &[Expense],
    income: &[Income],
    farms: &[Farm],
    crops: &[Crop],
) -> Vec<ExportRow> {
    let directory = Directory::new(farms, crops);
    let mut rows = Vec::with_capacity(expenses.len() + income.len());

    rows.extend(expenses.iter().map(|expense| ExportRow {
        row_type: RowType::Expense,
        date: export_date(&expense.date),
        category: expense.category.clone(),
        description: expense.description.clone(),
        amount: format_number(coerce(expense.amount)),
        farm: directory.farm_name(expense.farm_id).unwrap_or_default().to_owned(),
        crop: String::new(),
    }));

    rows.extend(income.iter().map(|sale| {
        let crop = sale.crop_id.and_then(|id| directory.crop(id));
        let farm_id = sale.farm_id.or_else(|| crop.and_then(|crop| crop.farm_id));
        ExportRow {
            row_type: RowType::Income,
            date: export_date(&sale.date),
            category: INCOME_CATEGORY.to_owned(),
            description: format!(
                "{} units @ ${}/unit",
                format_number(coerce(sale.quantity)),
                format_number(coerce(sale.price_per_unit))
            ),
            amount: format_number(sale.total_amount()),
            farm: directory.farm_name(farm_id).unwrap_or_default().to_owned(),
            crop: crop.map(|crop| crop.crop_name.clone()).unwrap_or_default(),
        }
    }));

    rows
}

/// Serialize expenses and income into the CSV payload.
///
/// The first line is the plain header; every data field is quoted. Lines
/// are separated by `\n` without a trailing newline.
#[must_use]
pub fn serialize(expenses: &[Expense], income: &[Income], farms: &[Farm], crops: &[Crop]) -> String {
    let rows = export_rows(expenses, income, farms, crops);
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(HEADER.join(","));
    lines.extend(rows.iter().map(ExportRow::to_line));
    lines.join("\n")
}

/// Serialize tasks with the same escaping rules as [`serialize`].
#[must_use]
pub fn serialize_tasks(tasks: &[Task], farms: &[Farm], crops: &[Crop]) -> String {
    let directory = Directory::new(farms, crops);
    let mut lines = Vec::with_capacity(tasks.len() + 1);
    lines.push(TASK_HEADER.join(","));
    for task in tasks {
        let due = export_date(&task.due_date);
        let farm = directory.farm_name(task.farm_id).unwrap_or_default();
        let crop = task
            .crop_id
            .and_then(|id| directory.crop(id))
            .map_or("", |crop| crop.crop_name.as_str());
        let completed = if task.completed { "Yes" } else { "No" };
        lines.push(join_escaped(&[
            task.title.as_str(),
            due.as_str(),
            task.priority.as_str(),
            completed,
            farm,
            crop,
            task.description.as_deref().unwrap_or_default(),
        ]));
    }
    lines.join("\n")
}

/// `<prefix>-YYYY-MM-DD-HHMMSS.csv`.
#[must_use]
pub fn export_file_name(prefix: &str, now: OffsetDateTime) -> String {
    let stamp = now
        .format(format_description!("[year]-[month]-[day]-[hour][minute][second]"))
        .unwrap_or_else(|_| now.unix_timestamp().to_string());
    format!("{prefix}-{stamp}.csv")
}

/// Wrap a field in double quotes, doubling inner quotes.
#[must_use]
pub fn escape_field(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn join_escaped(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|field| escape_field(field))
        .collect::<Vec<_>>()
        .join(",")
}

fn export_date(value: &DateValue) -> String {
    normalize(value)
        .iso_date()
        .unwrap_or_else(|| INVALID_DATE.to_owned())
}

/// Shortest round-trip rendering without a trailing `.0`.
#[must_use]
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_owned();
    }
    value.to_string()
}
