// Query filtering, search and sorting for tasks

use crate::models::Task;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Which tasks a query keeps. Only one dimension is active at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Filter {
    #[default]
    All,
    Completed,
    Pending,
    /// Tasks whose category equals this label, ignoring case
    Category(String),
}

impl Filter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Filter::All => true,
            Filter::Completed => task.completed,
            Filter::Pending => !task.completed,
            Filter::Category(name) => task.category().to_lowercase() == name.trim().to_lowercase(),
        }
    }
}

impl FromStr for Filter {
    type Err = String;

    /// "all", "completed" and "pending" select status; anything else is a category
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "" => Err("filter cannot be empty".to_string()),
            "all" => Ok(Filter::All),
            "completed" => Ok(Filter::Completed),
            "pending" => Ok(Filter::Pending),
            _ => Ok(Filter::Category(s.to_string())),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => write!(f, "All"),
            Filter::Completed => write!(f, "Completed"),
            Filter::Pending => write!(f, "Pending"),
            Filter::Category(name) => write!(f, "{}", name),
        }
    }
}

/// Columns a query can sort by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Text,     // case-insensitive
    Deadline, // chronological, unknown last
    Priority, // Low < Medium < High
    Completed,
}

impl SortKey {
    /// Compare two tasks in ascending order for this key.
    ///
    /// Deadline is handled separately in [`Sort::compare`] because unknown
    /// dates stay last in both directions.
    fn compare_ascending(self, a: &Task, b: &Task) -> Ordering {
        match self {
            SortKey::Text => a.text.to_lowercase().cmp(&b.text.to_lowercase()),
            SortKey::Deadline => a.deadline_date().cmp(&b.deadline_date()),
            SortKey::Priority => a.priority().cmp(&b.priority()),
            SortKey::Completed => a.completed.cmp(&b.completed),
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "task" => Ok(SortKey::Text),
            "deadline" => Ok(SortKey::Deadline),
            "priority" => Ok(SortKey::Priority),
            "completed" => Ok(SortKey::Completed),
            other => Err(format!(
                "unknown sort key: {} (expected text, deadline, priority or completed)",
                other
            )),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Text => write!(f, "text"),
            SortKey::Deadline => write!(f, "deadline"),
            SortKey::Priority => write!(f, "priority"),
            SortKey::Completed => write!(f, "completed"),
        }
    }
}

/// A sort key with a direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub key: SortKey,
    pub ascending: bool,
}

impl Sort {
    pub fn ascending(key: SortKey) -> Self {
        Self { key, ascending: true }
    }

    pub fn descending(key: SortKey) -> Self {
        Self { key, ascending: false }
    }

    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        let directed = |ord: Ordering| if self.ascending { ord } else { ord.reverse() };

        if self.key == SortKey::Deadline {
            return match (a.deadline_date(), b.deadline_date()) {
                (Some(x), Some(y)) => directed(x.cmp(&y)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
        }

        directed(self.key.compare_ascending(a, b))
    }
}

/// Remembers the last requested sort so repeated requests flip direction.
///
/// This is presentation state: a column header click maps to `request`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SortState {
    current: Option<Sort>,
}

impl SortState {
    /// Same key as last time toggles direction; a new key starts ascending.
    pub fn request(&mut self, key: SortKey) -> Sort {
        let next = match self.current {
            Some(sort) if sort.key == key => Sort {
                key,
                ascending: !sort.ascending,
            },
            _ => Sort::ascending(key),
        };
        self.current = Some(next);
        next
    }

    pub fn current(&self) -> Option<Sort> {
        self.current
    }
}

/// A read-only view over the collection: filter, then search, then sort
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filter: Filter,
    pub search: String,
    pub sort: Option<Sort>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Run the query. Ties keep their insertion order.
    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        let needle = self.search.trim().to_lowercase();

        let mut results: Vec<&Task> = tasks
            .iter()
            .filter(|t| self.filter.matches(t))
            .filter(|t| t.matches_search(&needle))
            .collect();

        if let Some(sort) = self.sort {
            results.sort_by(|a, b| sort.compare(a, b));
        }

        results
    }
}
