use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use farmtrack_app::{
    CropOverview, DailyAdvice, FarmService, NewExpense, NewIncome, NewTask, RecordStore, Snapshot,
};
use farmtrack_core::crop::farm_crop_counts;
use farmtrack_core::directory::Directory;
use farmtrack_core::export::INVALID_DATE;
use farmtrack_core::id::{CropId, FarmId, TaskId};
use farmtrack_core::weather::AdviceKind;
use farmtrack_core::{DashboardStats, DateValue, FinancialSummary, Task, TaskBucket, TaskBuckets, normalize};
use time::OffsetDateTime;
use tracing::info;

use crate::Command;

/// Execute a parsed command against the service.
pub fn run<S>(command: Command, service: &FarmService<S>) -> Result<()>
where
    S: RecordStore + Send + Sync + 'static,
{
    let now = service.now();
    match command {
        Command::Dashboard => {
            let snapshot = load_snapshot(service)?;
            print!("{}", render_dashboard(&service.dashboard(&snapshot, now)));
        }
        Command::Tasks { bucket } => {
            let snapshot = load_snapshot(service)?;
            print!("{}", render_buckets(&snapshot.task_buckets(now), bucket));
        }
        Command::Finances { json } => {
            let snapshot = load_snapshot(service)?;
            let summary = snapshot.finances();
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print!("{}", render_finances(&summary));
            }
        }
        Command::Export { output, tasks } => {
            let snapshot = load_snapshot(service)?;
            let export = if tasks {
                service.task_export(&snapshot, now)
            } else {
                service.finance_export(&snapshot, now)
            };
            let path = output.unwrap_or_else(|| PathBuf::from(&export.file_name));
            fs::write(&path, &export.contents)
                .with_context(|| format!("failed to write {}", path.display()))?;
            let rows = export.contents.lines().count().saturating_sub(1);
            info!(path = %path.display(), rows, "wrote export");
            println!("exported {rows} rows to {}", path.display());
        }
        Command::Weather { days } => {
            let snapshot = load_snapshot(service)?;
            let report = snapshot.weather_report(days);
            if report.is_empty() {
                println!("No forecast available");
            } else {
                print!("{}", render_weather(&report));
            }
        }
        Command::Crops { farm, status } => {
            let snapshot = load_snapshot(service)?;
            let rows = snapshot.crop_overview(now, farm.map(FarmId), status);
            if rows.is_empty() {
                println!("No crops found");
            } else {
                print!("{}", render_crops(&rows));
            }
            print!("{}", render_farm_counts(&snapshot));
        }
        Command::TaskNew {
            title,
            due,
            priority,
            description,
            farm,
            crop,
        } => {
            let task = service.add_task(NewTask {
                title,
                description,
                farm_id: farm.map(FarmId),
                crop_id: crop.map(CropId),
                due_date: parse_date(&due)?,
                priority,
            })?;
            println!("created task {}", task_line(&task));
        }
        Command::TaskToggle { id } => {
            let task = service.toggle_task(TaskId(id))?;
            let state = if task.completed { "completed" } else { "reopened" };
            println!("{state} task {}", task_line(&task));
        }
        Command::ExpenseAdd {
            category,
            amount,
            description,
            date,
            farm,
        } => {
            let expense = service.add_expense(NewExpense {
                date: date_or_today(date.as_deref(), now)?,
                category,
                amount,
                description,
                farm_id: farm.map(FarmId),
            })?;
            println!("recorded expense #{} ({})", expense.id, money(amount));
        }
        Command::IncomeAdd {
            crop,
            farm,
            quantity,
            price,
            buyer,
            date,
        } => {
            let income = service.add_income(NewIncome {
                date: date_or_today(date.as_deref(), now)?,
                crop_id: crop.map(CropId),
                farm_id: farm.map(FarmId),
                quantity,
                price_per_unit: price,
                buyer,
            })?;
            println!("recorded income #{} ({})", income.id, money(income.total_amount()));
        }
        Command::Delete { collection, id } => {
            if service.delete(collection, id)? {
                println!("deleted {collection} record {id}");
            } else {
                bail!("no {collection} record with id {id}");
            }
        }
    }
    Ok(())
}

fn load_snapshot<S>(service: &FarmService<S>) -> Result<Snapshot>
where
    S: RecordStore + Send + Sync + 'static,
{
    tokio::runtime::Runtime::new()?.block_on(service.snapshot_concurrently())
}

fn parse_date(text: &str) -> Result<DateValue> {
    let value = DateValue::text(text.trim());
    if !normalize(&value).valid() {
        bail!("'{text}' is not a valid date (expected YYYY-MM-DD)");
    }
    Ok(value)
}

fn date_or_today(text: Option<&str>, now: OffsetDateTime) -> Result<DateValue> {
    text.map_or_else(|| Ok(DateValue::from_date(now.date())), parse_date)
}

fn money(amount: f64) -> String {
    if amount < 0.0 {
        format!("-${:.2}", -amount)
    } else {
        format!("${amount:.2}")
    }
}

fn due_label(task: &Task) -> String {
    normalize(&task.due_date)
        .iso_date()
        .unwrap_or_else(|| INVALID_DATE.to_owned())
}

fn task_line(task: &Task) -> String {
    format!(
        "#{} {} (due {}, {})",
        task.id,
        task.title,
        due_label(task),
        task.priority.as_str()
    )
}

fn render_dashboard(stats: &DashboardStats<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Farms: {} | Crops: {} ({} active)",
        stats.farm_count, stats.crop_count, stats.active_crop_count
    );
    let _ = writeln!(
        out,
        "Due today: {} | Overdue: {} | Unreadable due dates: {}",
        stats.tasks_due_today, stats.overdue_count, stats.invalid_count
    );
    let _ = writeln!(
        out,
        "Income: {} | Expenses: {} | Net profit: {}",
        money(stats.total_income),
        money(stats.total_expenses),
        money(stats.net_profit)
    );
    if stats.anomaly_count > 0 {
        let _ = writeln!(out, "Warning: {} records had unreadable amounts", stats.anomaly_count);
    }
    if stats.upcoming.is_empty() {
        let _ = writeln!(out, "No upcoming tasks");
    } else {
        let _ = writeln!(out, "Upcoming:");
        for task in &stats.upcoming {
            let _ = writeln!(out, "  {}", task_line(task));
        }
    }
    out
}

const fn bucket_title(bucket: TaskBucket) -> &'static str {
    match bucket {
        TaskBucket::Today => "Today",
        TaskBucket::Overdue => "Overdue",
        TaskBucket::Upcoming => "Upcoming",
        TaskBucket::Completed => "Completed",
        TaskBucket::Invalid => "Invalid due date",
    }
}

fn render_buckets(buckets: &TaskBuckets<'_>, only: Option<TaskBucket>) -> String {
    let mut out = String::new();
    for bucket in TaskBucket::ALL {
        if only.is_some_and(|wanted| wanted != bucket) {
            continue;
        }
        let tasks = buckets.get(bucket);
        let _ = writeln!(out, "{} ({})", bucket_title(bucket), tasks.len());
        for task in tasks {
            let _ = writeln!(out, "  {}", task_line(task));
        }
    }
    out
}

fn render_finances(summary: &FinancialSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total income:   {}", money(summary.total_income));
    let _ = writeln!(out, "Total expenses: {}", money(summary.total_expenses));
    let _ = writeln!(out, "Net profit:     {}", money(summary.net_profit));
    if !summary.by_farm.is_empty() {
        let _ = writeln!(out, "Expenses by farm:");
        for farm in &summary.by_farm {
            let _ = writeln!(out, "  {}: {} ({} entries)", farm.label, money(farm.total), farm.count);
        }
    }
    if !summary.by_category.is_empty() {
        let _ = writeln!(out, "Expenses by category:");
        for category in &summary.by_category {
            let _ = writeln!(out, "  {}: {}", category.category, money(category.total));
        }
    }
    if !summary.by_crop.is_empty() {
        let _ = writeln!(out, "Income by crop:");
        for crop in &summary.by_crop {
            let _ = writeln!(out, "  {}: {} ({} units)", crop.label, money(crop.total), crop.quantity);
        }
    }
    if !summary.anomalies.is_empty() {
        let _ = writeln!(
            out,
            "Warning: {} records had unreadable amounts and were counted as zero",
            summary.anomalies.count()
        );
    }
    out
}

const fn advice_marker(kind: AdviceKind) -> &'static str {
    match kind {
        AdviceKind::Warning => "!",
        AdviceKind::Info => "i",
        AdviceKind::Success => "+",
    }
}

fn render_weather(report: &[DailyAdvice<'_>]) -> String {
    let mut out = String::new();
    for entry in report {
        let day = entry.day;
        let date = normalize(&day.date)
            .iso_date()
            .unwrap_or_else(|| INVALID_DATE.to_owned());
        let _ = writeln!(
            out,
            "{date} {}: {}°F / {}°F, rain {}%, humidity {}%, wind {} mph",
            day.condition.as_str(),
            day.high,
            day.low,
            day.precipitation,
            day.humidity,
            day.wind_speed
        );
        for advice in &entry.advice {
            let _ = writeln!(out, "  [{}] {}", advice_marker(advice.kind), advice.message);
        }
    }
    out
}

fn render_crops(rows: &[CropOverview<'_>]) -> String {
    let mut out = String::new();
    for row in rows {
        let countdown = row
            .countdown
            .map_or_else(|| "-".to_owned(), |countdown| countdown.to_string());
        let _ = writeln!(
            out,
            "#{} {} - {} [{}] on {}: harvest {}",
            row.crop.id,
            row.crop.crop_name,
            row.crop.variety,
            row.crop.status.label(),
            row.farm,
            countdown
        );
    }
    out
}

fn render_farm_counts(snapshot: &Snapshot) -> String {
    let directory = Directory::new(&snapshot.farms, &snapshot.crops);
    let mut out = String::new();
    for counts in farm_crop_counts(&snapshot.farms, &snapshot.crops) {
        let _ = writeln!(
            out,
            "{}: {} crops ({} active)",
            directory.farm_label(Some(counts.farm_id)),
            counts.total,
            counts.active
        );
    }
    out
}
