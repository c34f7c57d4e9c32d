//! Temporal bucketing of tasks relative to an explicit "now".

use crate::record::{ParseVariantError, Task};
use crate::temporal::normalize;
use serde::Serialize;
use std::cmp::Ordering;
use std::str::FromStr;
use time::{Date, OffsetDateTime, UtcOffset};

/// Mutually exclusive task categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskBucket {
    /// Open and due on the current calendar day.
    Today,
    /// Open and due on an earlier day.
    Overdue,
    /// Open and due on a later day.
    Upcoming,
    /// Marked done, whatever the due date.
    Completed,
    /// Open with a due date that could not be interpreted.
    Invalid,
}

impl TaskBucket {
    /// Every bucket in display order.
    pub const ALL: [Self; 5] = [
        Self::Today,
        Self::Overdue,
        Self::Upcoming,
        Self::Completed,
        Self::Invalid,
    ];

    /// Classify a single task.
    #[must_use]
    pub fn of(task: &Task, now: OffsetDateTime) -> Self {
        if task.completed {
            return Self::Completed;
        }
        let Some(due) = normalize(&task.due_date).calendar_date(now.offset()) else {
            return Self::Invalid;
        };
        match due.cmp(&now.date()) {
            Ordering::Equal => Self::Today,
            Ordering::Less => Self::Overdue,
            Ordering::Greater => Self::Upcoming,
        }
    }

    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Overdue => "overdue",
            Self::Upcoming => "upcoming",
            Self::Completed => "completed",
            Self::Invalid => "invalid",
        }
    }
}

impl FromStr for TaskBucket {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|bucket| bucket.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseVariantError {
                kind: "task bucket",
                token: s.to_owned(),
            })
    }
}

/// Result of [`classify`]; every input task lands in exactly one bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskBuckets<'a> {
    /// Due today.
    pub today: Vec<&'a Task>,
    /// Past due.
    pub overdue: Vec<&'a Task>,
    /// Due later.
    pub upcoming: Vec<&'a Task>,
    /// Done.
    pub completed: Vec<&'a Task>,
    /// Unreadable due date.
    pub invalid: Vec<&'a Task>,
    #[serde(skip)]
    offset: UtcOffset,
}

/// Partition tasks into temporal buckets, preserving input order.
#[must_use]
pub fn classify(tasks: &[Task], now: OffsetDateTime) -> TaskBuckets<'_> {
    let mut buckets = TaskBuckets::empty(now.offset());
    for task in tasks {
        buckets.bucket_mut(TaskBucket::of(task, now)).push(task);
    }
    buckets
}

impl<'a> TaskBuckets<'a> {
    const fn empty(offset: UtcOffset) -> Self {
        Self {
            today: Vec::new(),
            overdue: Vec::new(),
            upcoming: Vec::new(),
            completed: Vec::new(),
            invalid: Vec::new(),
            offset,
        }
    }

    /// Tasks in the given bucket.
    #[must_use]
    pub fn get(&self, bucket: TaskBucket) -> &[&'a Task] {
        match bucket {
            TaskBucket::Today => &self.today,
            TaskBucket::Overdue => &self.overdue,
            TaskBucket::Upcoming => &self.upcoming,
            TaskBucket::Completed => &self.completed,
            TaskBucket::Invalid => &self.invalid,
        }
    }

    const fn bucket_mut(&mut self, bucket: TaskBucket) -> &mut Vec<&'a Task> {
        match bucket {
            TaskBucket::Today => &mut self.today,
            TaskBucket::Overdue => &mut self.overdue,
            TaskBucket::Upcoming => &mut self.upcoming,
            TaskBucket::Completed => &mut self.completed,
            TaskBucket::Invalid => &mut self.invalid,
        }
    }

    /// Total number of classified tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        TaskBucket::ALL.iter().map(|bucket| self.get(*bucket).len()).sum()
    }

    /// True when no task was classified.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reorder every bucket with a caller-supplied comparator (stable).
    pub fn sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&Task, &Task) -> Ordering,
    {
        for bucket in TaskBucket::ALL {
            self.bucket_mut(bucket).sort_by(|a, b| compare(*a, *b));
        }
    }

    /// Reorder every bucket by ascending due date, comparing calendar
    /// dates in the offset the tasks were classified in.
    pub fn sort_by_due_date(&mut self) {
        let offset = self.offset;
        for bucket in TaskBucket::ALL {
            sort_by_due(self.bucket_mut(bucket), offset);
        }
    }

    /// The first `limit` upcoming tasks, soonest first.
    #[must_use]
    pub fn upcoming_preview(&self, limit: usize) -> Vec<&'a Task> {
        let mut upcoming = self.upcoming.clone();
        sort_by_due(&mut upcoming, self.offset);
        upcoming.truncate(limit);
        upcoming
    }
}

// Calendar date first so the order agrees with bucketing; unreadable last.
fn sort_by_due(tasks: &mut [&Task], offset: UtcOffset) {
    tasks.sort_by_cached_key(|task| {
        let due = normalize(&task.due_date);
        let key: Option<(Date, OffsetDateTime)> = due.calendar_date(offset).zip(due.instant());
        (key.is_none(), key)
    });
}

/// Compare two tasks by due instant; unreadable dates sort last.
#[must_use]
pub fn compare_due_date(a: &Task, b: &Task) -> Ordering {
    let left = normalize(&a.due_date).instant();
    let right = normalize(&b.due_date).instant();
    (left.is_none(), left).cmp(&(right.is_none(), right))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::TaskId;
    use crate::record::Priority;
    use crate::temporal::DateValue;
    use time::macros::datetime;

    fn task(id: u64, due: &str, completed: bool) -> Task {
        let mut task = Task::open(TaskId(id), format!("task {id}"), DateValue::text(due));
        if completed {
            task.set_completed(true, DateValue::text("2024-06-11T09:00:00Z"));
        }
        task
    }

    fn ids(tasks: &[&Task]) -> Vec<u64> {
        tasks.iter().map(|task| task.id.0).collect()
    }

    #[test]
    fn reference_scenario_lands_in_expected_buckets() {
        let now = datetime!(2024-06-15 10:00 UTC);
        let tasks = vec![
            task(1, "2024-06-15", false),
            task(2, "2024-06-10", false),
            task(3, "2024-06-20", false),
            task(4, "2024-06-10", true),
            task(5, "not-a-date", false),
        ];
        let buckets = classify(&tasks, now);
        assert_eq!(ids(&buckets.today), vec![1]);
        assert_eq!(ids(&buckets.overdue), vec![2]);
        assert_eq!(ids(&buckets.upcoming), vec![3]);
        assert_eq!(ids(&buckets.completed), vec![4]);
        assert_eq!(ids(&buckets.invalid), vec![5]);
        assert_eq!(buckets.len(), tasks.len());
    }

    #[test]
    fn completed_wins_over_invalid_due_date() {
        let now = datetime!(2024-06-15 10:00 UTC);
        let tasks = vec![task(1, "", true), task(2, "", false)];
        let buckets = classify(&tasks, now);
        assert_eq!(ids(&buckets.completed), vec![1]);
        assert_eq!(ids(&buckets.invalid), vec![2]);
    }

    #[test]
    fn time_of_day_does_not_matter() {
        let now = datetime!(2024-06-15 23:59 UTC);
        let tasks = vec![
            task(1, "2024-06-15T00:01:00Z", false),
            task(2, "2024-06-14T23:59:59Z", false),
            task(3, "2024-06-16T00:00:00Z", false),
        ];
        let buckets = classify(&tasks, now);
        assert_eq!(ids(&buckets.today), vec![1]);
        assert_eq!(ids(&buckets.overdue), vec![2]);
        assert_eq!(ids(&buckets.upcoming), vec![3]);
    }

    #[test]
    fn calendar_comparison_uses_observer_offset() {
        let now = datetime!(2024-06-15 20:00 -05:00);
        let tasks = vec![task(1, "2024-06-16T00:30:00Z", false)];
        assert_eq!(TaskBucket::of(&tasks[0], now), TaskBucket::Today);
    }

    #[test]
    fn buckets_preserve_input_order() {
        let now = datetime!(2024-06-15 10:00 UTC);
        let tasks = vec![
            task(1, "2024-06-30", false),
            task(2, "2024-06-16", false),
            task(3, "2024-06-20", false),
        ];
        let buckets = classify(&tasks, now);
        assert_eq!(ids(&buckets.upcoming), vec![1, 2, 3]);
        assert_eq!(classify(&tasks, now), buckets);
    }

    #[test]
    fn upcoming_preview_sorts_before_truncating() {
        let now = datetime!(2024-06-15 10:00 UTC);
        let tasks = vec![
            task(1, "2024-07-30", false),
            task(2, "2024-06-16", false),
            task(3, "2024-06-25", false),
            task(4, "2024-06-16", false),
            task(5, "2024-06-17", false),
        ];
        let buckets = classify(&tasks, now);
        assert_eq!(ids(&buckets.upcoming_preview(3)), vec![2, 4, 5]);
        assert_eq!(ids(&buckets.upcoming), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn due_date_order_follows_observer_calendar() {
        let now = datetime!(2024-06-15 10:00 -05:00);
        // Late evening of the 16th locally, but already the 17th in UTC.
        let tasks = vec![task(1, "2024-06-17", false), task(2, "2024-06-17T03:00:00Z", false)];
        let mut buckets = classify(&tasks, now);
        assert_eq!(ids(&buckets.upcoming), vec![1, 2]);
        buckets.sort_by_due_date();
        assert_eq!(ids(&buckets.upcoming), vec![2, 1]);
        assert_eq!(ids(&buckets.upcoming_preview(1)), vec![2]);
    }

    #[test]
    fn sort_by_accepts_custom_comparator() {
        let now = datetime!(2024-06-15 10:00 UTC);
        let mut tasks = vec![task(1, "2024-06-20", false), task(2, "2024-06-21", false)];
        tasks[1].priority = Priority::High;
        let mut buckets = classify(&tasks, now);
        buckets.sort_by(|a, b| b.priority.cmp(&a.priority));
        assert_eq!(ids(&buckets.upcoming), vec![2, 1]);
        buckets.sort_by_due_date();
        assert_eq!(ids(&buckets.upcoming), vec![1, 2]);
    }

    #[test]
    fn compare_due_date_puts_invalid_last() {
        let valid = task(1, "2024-06-20", false);
        let invalid = task(2, "soon", false);
        assert_eq!(compare_due_date(&valid, &invalid), Ordering::Less);
        assert_eq!(compare_due_date(&invalid, &valid), Ordering::Greater);
    }

    #[test]
    fn bucket_names_parse() {
        assert_eq!("Overdue".parse::<TaskBucket>(), Ok(TaskBucket::Overdue));
        assert!("later".parse::<TaskBucket>().is_err());
    }
}
