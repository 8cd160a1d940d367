use std::cmp::Ordering;

use crate::task::Task;

/// The four user-selectable orderings. The string forms are what gets
/// persisted in the sort preference file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// Newest first by creation time.
    #[default]
    Default,
    /// Most urgent first (ascending priority code).
    Urgents,
    /// Case-insensitive title order.
    Az,
    /// Earliest deadline first; tasks without a deadline go last.
    Deadline,
}

impl SortMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::Default => "default",
            SortMode::Urgents => "urgents",
            SortMode::Az => "a-z",
            SortMode::Deadline => "deadline",
        }
    }

    /// Unknown or absent input falls back to the default ordering.
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("urgents") => SortMode::Urgents,
            Some("a-z") => SortMode::Az,
            Some("deadline") => SortMode::Deadline,
            _ => SortMode::Default,
        }
    }
}

impl std::fmt::Display for SortMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SortMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "default" => Ok(SortMode::Default),
            "urgents" => Ok(SortMode::Urgents),
            "a-z" => Ok(SortMode::Az),
            "deadline" => Ok(SortMode::Deadline),
            other => Err(anyhow::anyhow!("invalid sort mode: {other}")),
        }
    }
}

/// Reorders a snapshot of the task list. Pure: the input is left untouched.
pub fn sort_tasks(tasks: &[Task], mode: SortMode) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by(|a, b| compare(a, b, mode));
    sorted
}

fn compare(a: &Task, b: &Task, mode: SortMode) -> Ordering {
    match mode {
        SortMode::Urgents => a.priority.code().cmp(&b.priority.code()),
        SortMode::Az => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortMode::Deadline => match (a.deadline, b.deadline) {
            (Some(a_date), Some(b_date)) => a_date.cmp(&b_date),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        SortMode::Default => b.created_at.cmp(&a.created_at),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use uuid::Uuid;

    use super::{SortMode, sort_tasks};
    use crate::task::{Priority, Task};

    fn task(title: &str, priority: Priority, deadline: Option<NaiveDate>, age_hours: i64) -> Task {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("valid timestamp");
        let created = now - Duration::hours(age_hours);
        Task {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: title.to_string(),
            description: String::new(),
            deadline,
            priority,
            completed: false,
            archived: false,
            created_at: created,
            updated_at: created,
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).expect("valid date")
    }

    #[test]
    fn default_orders_newest_first() {
        let tasks = vec![
            task("old", Priority::Low, None, 48),
            task("new", Priority::Low, None, 1),
            task("middle", Priority::Low, None, 24),
        ];
        let sorted = sort_tasks(&tasks, SortMode::Default);
        let titles: Vec<&str> = sorted.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["new", "middle", "old"]);
    }

    #[test]
    fn urgents_is_nondecreasing_by_priority() {
        let tasks = vec![
            task("low", Priority::Low, None, 0),
            task("high", Priority::High, None, 0),
            task("medium", Priority::Medium, None, 0),
        ];
        let sorted = sort_tasks(&tasks, SortMode::Urgents);
        let codes: Vec<u8> = sorted.iter().map(|t| t.priority.code()).collect();
        assert!(codes.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(sorted[0].title, "high");
    }

    #[test]
    fn az_ignores_case() {
        let tasks = vec![
            task("banana", Priority::Low, None, 0),
            task("Apple", Priority::Low, None, 0),
            task("cherry", Priority::Low, None, 0),
        ];
        let sorted = sort_tasks(&tasks, SortMode::Az);
        let titles: Vec<&str> = sorted.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["Apple", "banana", "cherry"]);
    }

    #[test]
    fn deadline_puts_undated_tasks_last() {
        let tasks = vec![
            task("no date", Priority::Low, None, 0),
            task("late", Priority::Low, Some(date(20)), 0),
            task("soon", Priority::Low, Some(date(2)), 0),
            task("also no date", Priority::Low, None, 0),
        ];
        let sorted = sort_tasks(&tasks, SortMode::Deadline);
        assert_eq!(sorted[0].title, "soon");
        assert_eq!(sorted[1].title, "late");
        assert!(sorted[2].deadline.is_none());
        assert!(sorted[3].deadline.is_none());
    }

    #[test]
    fn sorting_is_idempotent_for_every_mode() {
        let tasks = vec![
            task("b", Priority::Low, Some(date(5)), 3),
            task("a", Priority::High, None, 1),
            task("c", Priority::Medium, Some(date(1)), 7),
        ];
        for mode in [
            SortMode::Default,
            SortMode::Urgents,
            SortMode::Az,
            SortMode::Deadline,
        ] {
            let once = sort_tasks(&tasks, mode);
            let twice = sort_tasks(&once, mode);
            assert_eq!(once, twice, "mode {mode} not idempotent");
        }
    }

    #[test]
    fn sort_does_not_mutate_its_input() {
        let tasks = vec![
            task("b", Priority::Low, None, 0),
            task("a", Priority::High, None, 5),
        ];
        let before = tasks.clone();
        let _ = sort_tasks(&tasks, SortMode::Az);
        assert_eq!(tasks, before);
    }

    #[test]
    fn unknown_mode_falls_back_to_default() {
        assert_eq!(SortMode::parse_or_default(Some("by-color")), SortMode::Default);
        assert_eq!(SortMode::parse_or_default(None), SortMode::Default);
        assert_eq!(SortMode::parse_or_default(Some("deadline")), SortMode::Deadline);
        assert_eq!(SortMode::parse_or_default(Some("a-z")), SortMode::Az);
    }
}
