// Data models for the to-do store

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Date format used both on disk and for user input
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Category used when a task has none
pub const DEFAULT_CATEGORY: &str = "General";

/// Category suggestions offered when nothing is configured
pub const DEFAULT_CATEGORIES: &[&str] = &["General", "Work", "Personal", "Shopping", "Health"];

/// Parse a DD-MM-YYYY date
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

/// Format a date as DD-MM-YYYY
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Task priority. Anything unrecognised reads as Medium.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl From<String> for Priority {
    fn from(s: String) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("unknown priority: {} (expected low, medium or high)", other)),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task field exactly as found in the task file.
///
/// Only string values are interpreted. Anything else (numbers, objects) is
/// carried through a save untouched and reads as unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Other(Value),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Other(_) => None,
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<Priority> for FieldValue {
    fn from(p: Priority) -> Self {
        FieldValue::Text(p.as_str().to_string())
    }
}

/// One to-do item as stored in the task file.
///
/// `deadline`, `priority` and `category` keep whatever the file held, so odd
/// values survive a load/save cycle; the accessors resolve them. Keys this
/// type doesn't know about are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(rename = "task")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<FieldValue>,
    #[serde(default)]
    pub completed: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    /// Deadline text, or None when missing or not a string
    pub fn deadline_str(&self) -> Option<&str> {
        self.deadline.as_ref().and_then(FieldValue::as_str)
    }

    /// Parsed deadline, or None when missing or unparseable
    pub fn deadline_date(&self) -> Option<NaiveDate> {
        self.deadline_str().and_then(parse_date)
    }

    /// Priority used for sorting and colouring; unrecognised values are Medium
    pub fn priority(&self) -> Priority {
        self.priority
            .as_ref()
            .and_then(FieldValue::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Priority as written, falling back to the resolved name
    pub fn priority_label(&self) -> &str {
        match self.priority.as_ref().and_then(FieldValue::as_str) {
            Some(p) if !p.trim().is_empty() => p,
            _ => self.priority().as_str(),
        }
    }

    /// Category label, falling back to "General"
    pub fn category(&self) -> &str {
        match self.category.as_ref().and_then(FieldValue::as_str) {
            Some(c) if !c.trim().is_empty() => c,
            _ => DEFAULT_CATEGORY,
        }
    }

    /// Incomplete and due on or before `today`. Unknown deadlines never count.
    pub fn is_due(&self, today: NaiveDate) -> bool {
        !self.completed && self.deadline_date().is_some_and(|d| d <= today)
    }

    /// Incomplete and strictly past its deadline
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.completed && self.deadline_date().is_some_and(|d| d < today)
    }

    /// Case-insensitive substring match against text, deadline, priority and
    /// category. `needle` must already be lowercase.
    pub fn matches_search(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }

        self.text.to_lowercase().contains(needle)
            || self
                .deadline_str()
                .is_some_and(|d| d.to_lowercase().contains(needle))
            || self.priority_label().to_lowercase().contains(needle)
            || self.category().to_lowercase().contains(needle)
    }
}

/// Partial update for a task. `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub text: Option<String>,
    pub deadline: Option<String>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn deadline(mut self, deadline: impl Into<String>) -> Self {
        self.deadline = Some(deadline.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }
}

/// Aggregate counts over the whole collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub overdue_or_due_today: usize,
}

impl Stats {
    /// Share of completed tasks, rounded to a whole percent
    pub fn completion_percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed as f64 / self.total as f64) * 100.0).round() as u32
    }
}

/// Generate a fresh task id
pub fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(text: &str, deadline: Option<&str>) -> Task {
        Task {
            id: new_id(),
            text: text.to_string(),
            deadline: deadline.map(FieldValue::from),
            priority: Some(Priority::Medium.into()),
            category: None,
            completed: false,
            extra: Map::new(),
        }
    }

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("31-12-2025"), NaiveDate::from_ymd_opt(2025, 12, 31));
        assert!(parse_date("2025-12-31").is_none());
        assert!(parse_date("31-02-2025").is_none());
        assert!(parse_date("").is_none());
        assert_eq!(format_date(date("01-01-2030")), "01-01-2030");
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::Medium < Priority::High);
    }

    #[test]
    fn test_priority_serialization() {
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"High\"");

        let p: Priority = serde_json::from_str("\"Low\"").unwrap();
        assert_eq!(p, Priority::Low);

        // Unknown values fall back to Medium
        let p: Priority = serde_json::from_str("\"Urgent\"").unwrap();
        assert_eq!(p, Priority::Medium);
    }

    #[test]
    fn test_priority_from_str() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!(" low ".parse::<Priority>().unwrap(), Priority::Low);
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn test_task_serialization_keys() {
        let mut t = task("Buy milk", Some("01-01-2030"));
        t.category = Some("Shopping".into());

        let value = serde_json::to_value(&t).unwrap();
        assert_eq!(value["task"], "Buy milk");
        assert_eq!(value["deadline"], "01-01-2030");
        assert_eq!(value["priority"], "Medium");
        assert_eq!(value["category"], "Shopping");
        assert_eq!(value["completed"], false);
        assert!(value.get("text").is_none());
    }

    #[test]
    fn test_task_defaults_and_unknown_keys() {
        let t: Task = serde_json::from_str(r#"{"id":"a","task":"x","color":"blue"}"#).unwrap();
        assert_eq!(t.deadline, None);
        assert_eq!(t.priority, None);
        assert_eq!(t.priority(), Priority::Medium);
        assert_eq!(t.priority_label(), "Medium");
        assert_eq!(t.category(), "General");
        assert!(!t.completed);
        assert_eq!(t.extra.get("color"), Some(&Value::String("blue".to_string())));

        let out = serde_json::to_value(&t).unwrap();
        assert_eq!(out["color"], "blue");
        assert!(out.get("category").is_none());
    }

    #[test]
    fn test_odd_field_values_are_kept() {
        let t: Task = serde_json::from_str(
            r#"{"id":"a","task":"x","deadline":20250101,"priority":"Urgent","category":["a","b"]}"#,
        )
        .unwrap();

        assert_eq!(t.deadline, Some(FieldValue::Other(serde_json::json!(20250101))));
        assert!(t.deadline_str().is_none());
        assert!(t.deadline_date().is_none());
        assert_eq!(t.priority(), Priority::Medium);
        assert_eq!(t.priority_label(), "Urgent");
        assert_eq!(t.category(), "General");
        assert!(t.matches_search("urgent"));

        let out = serde_json::to_value(&t).unwrap();
        assert_eq!(out["deadline"], 20250101);
        assert_eq!(out["priority"], "Urgent");
        assert_eq!(out["category"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn test_null_priority_reads_as_medium() {
        let t: Task = serde_json::from_str(r#"{"id":"a","task":"x","priority":null,"deadline":null}"#).unwrap();
        assert_eq!(t.priority(), Priority::Medium);
        assert!(t.deadline.is_none());
    }

    #[test]
    fn test_is_due_and_overdue() {
        let today = date("15-06-2025");

        assert!(task("a", Some("14-06-2025")).is_due(today));
        assert!(task("a", Some("15-06-2025")).is_due(today));
        assert!(!task("a", Some("16-06-2025")).is_due(today));
        assert!(!task("a", Some("not a date")).is_due(today));
        assert!(!task("a", None).is_due(today));

        assert!(task("a", Some("14-06-2025")).is_overdue(today));
        assert!(!task("a", Some("15-06-2025")).is_overdue(today));

        let mut done = task("a", Some("01-01-2020"));
        done.completed = true;
        assert!(!done.is_due(today));
    }

    #[test]
    fn test_matches_search() {
        let mut t = task("Buy Milk", Some("01-01-2030"));
        t.priority = Some(Priority::High.into());
        t.category = Some("Shopping".into());

        assert!(t.matches_search(""));
        assert!(t.matches_search("milk"));
        assert!(t.matches_search("2030"));
        assert!(t.matches_search("high"));
        assert!(t.matches_search("shop"));
        assert!(!t.matches_search("work"));
    }

    #[test]
    fn test_task_patch_builder() {
        assert!(TaskPatch::default().is_empty());

        let patch = TaskPatch::default().text("new").completed(true);
        assert_eq!(patch.text.as_deref(), Some("new"));
        assert_eq!(patch.completed, Some(true));
        assert!(patch.deadline.is_none());
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_completion_percent() {
        assert_eq!(Stats::default().completion_percent(), 0);

        let stats = Stats {
            total: 3,
            completed: 2,
            pending: 1,
            overdue_or_due_today: 0,
        };
        assert_eq!(stats.completion_percent(), 67);
    }
}
