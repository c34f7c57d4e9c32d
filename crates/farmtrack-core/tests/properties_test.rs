//! Properties that must hold for arbitrary task and money inputs.

use proptest::prelude::*;

use farmtrack_core::id::{ExpenseId, IncomeId, TaskId};
use farmtrack_core::{DateValue, Expense, Income, Task, TaskBucket, aggregate, classify};
use time::macros::datetime;
use time::{Duration, OffsetDateTime, UtcOffset};

fn due_date_strategy() -> impl Strategy<Value = DateValue> {
    prop_oneof![
        (2000i32..2040, 1u8..=12, 1u8..=31)
            .prop_map(|(y, m, d)| DateValue::text(format!("{y:04}-{m:02}-{d:02}"))),
        (2000i32..2040, 1u8..=12, 1u8..=28, 0u8..24, -12i8..=14).prop_map(|(y, m, d, h, o)| {
            DateValue::text(format!("{y:04}-{m:02}-{d:02}T{h:02}:00:00{o:+03}:00"))
        }),
        "\\PC{0,12}".prop_map(|text: String| DateValue::text(text)),
        any::<i64>().prop_map(DateValue::EpochMillis),
        Just(DateValue::Absent),
    ]
}

fn task_strategy() -> impl Strategy<Value = (DateValue, bool)> {
    (due_date_strategy(), any::<bool>())
}

fn now_strategy() -> impl Strategy<Value = OffsetDateTime> {
    (-12i8..=14, 0i64..(60 * 24 * 365 * 30)).prop_filter_map("offset in range", |(hours, minutes)| {
        let offset = UtcOffset::from_hms(hours, 0, 0).ok()?;
        let instant = datetime!(2005-01-01 00:00 UTC) + Duration::minutes(minutes);
        Some(instant.to_offset(offset))
    })
}

fn amount_strategy() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        6 => (-1.0e6f64..1.0e6).prop_map(Some),
        1 => Just(None),
        1 => Just(Some(f64::NAN)),
        1 => Just(Some(f64::INFINITY)),
    ]
}

fn make_tasks(specs: &[(DateValue, bool)]) -> Vec<Task> {
    (0u64..)
        .zip(specs)
        .map(|(id, (due, completed))| {
            let mut task = Task::open(TaskId(id), format!("task {id}"), due.clone());
            if *completed {
                task.set_completed(true, DateValue::text("2024-01-01T00:00:00Z"));
            }
            task
        })
        .collect()
}

fn make_expense(id: u64, amount: Option<f64>) -> Expense {
    Expense {
        id: ExpenseId(id),
        date: DateValue::text("2024-06-01"),
        category: format!("category {}", id % 3),
        amount,
        description: String::new(),
        farm_id: None,
    }
}

fn make_income(id: u64, quantity: Option<f64>, price: Option<f64>) -> Income {
    Income {
        id: IncomeId(id),
        date: DateValue::text("2024-06-01"),
        crop_id: None,
        farm_id: None,
        quantity,
        price_per_unit: price,
        buyer: String::new(),
    }
}

proptest! {
    #[test]
    fn buckets_partition_every_task(specs in prop::collection::vec(task_strategy(), 0..48), now in now_strategy()) {
        let tasks = make_tasks(&specs);
        let buckets = classify(&tasks, now);
        prop_assert_eq!(buckets.len(), tasks.len());

        let mut seen: Vec<TaskId> = Vec::new();
        for bucket in TaskBucket::ALL {
            for task in buckets.get(bucket) {
                prop_assert_eq!(TaskBucket::of(task, now), bucket);
                seen.push(task.id);
            }
        }
        seen.sort_unstable();
        let expected: Vec<TaskId> = tasks.iter().map(|task| task.id).collect();
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn classify_is_deterministic(specs in prop::collection::vec(task_strategy(), 0..32), now in now_strategy()) {
        let tasks = make_tasks(&specs);
        prop_assert_eq!(classify(&tasks, now), classify(&tasks, now));
    }

    #[test]
    fn completed_tasks_always_land_in_completed(specs in prop::collection::vec(task_strategy(), 0..32), now in now_strategy()) {
        let tasks = make_tasks(&specs);
        let buckets = classify(&tasks, now);
        let completed = tasks.iter().filter(|task| task.completed).count();
        prop_assert_eq!(buckets.get(TaskBucket::Completed).len(), completed);
    }

    #[test]
    fn net_profit_is_income_minus_expenses(
        amounts in prop::collection::vec(amount_strategy(), 0..32),
        sales in prop::collection::vec((amount_strategy(), amount_strategy()), 0..32),
    ) {
        let expenses: Vec<Expense> = (0u64..)
            .zip(&amounts)
            .map(|(id, amount)| make_expense(id, *amount))
            .collect();
        let income: Vec<Income> = (0u64..)
            .zip(&sales)
            .map(|(id, (quantity, price))| make_income(id, *quantity, *price))
            .collect();
        let summary = aggregate(&expenses, &income, &[], &[]);

        prop_assert!(summary.total_expenses.is_finite());
        prop_assert!(summary.total_income.is_finite());
        prop_assert_eq!(summary.net_profit, summary.total_income - summary.total_expenses);

        let expected_expenses = amounts
            .iter()
            .fold(0.0, |sum, amount| sum + amount.filter(|v| v.is_finite()).unwrap_or(0.0));
        prop_assert_eq!(summary.total_expenses, expected_expenses);

        let flagged = amounts.iter().filter(|amount| !amount.is_some_and(f64::is_finite)).count();
        prop_assert_eq!(summary.anomalies.expenses.len(), flagged);
    }
}
