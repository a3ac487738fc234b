// Task store: in-memory collection mirrored to a JSON file

use crate::error::{Applied, Result, TaskError};
use crate::filter::Query;
use crate::json_file;
use crate::models::{DEFAULT_CATEGORY, FieldValue, Priority, Stats, Task, TaskPatch, format_date, new_id, parse_date};
use chrono::{Local, NaiveDate};
use serde_json::Map;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What a load found in the backing file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub dropped: usize,
    pub patched: usize,
}

/// Single source of truth for tasks.
///
/// Every successful mutation is written back to the file. A failed write is
/// reported through [`Applied`] but never undoes the in-memory change.
pub struct TaskStore {
    path: PathBuf,
    tasks: Vec<Task>,
}

impl TaskStore {
    /// Create an empty store bound to `path`. Nothing is read until [`load`](Self::load).
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            tasks: Vec::new(),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All tasks in insertion order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Replace the collection with the contents of the backing file.
    ///
    /// On `ReadFailure` or `CorruptFile` the collection is left empty and the
    /// next save recreates the file. If entries had to be patched (missing or
    /// duplicate ids) the corrected collection is saved right away.
    pub fn load(&mut self) -> Result<Applied<LoadReport>> {
        let parsed = match json_file::read_tasks(&self.path) {
            Ok(p) => p,
            Err(e) => {
                warn!(file = ?self.path, error = %e, "Failed to load tasks, starting empty");
                self.tasks.clear();
                return Err(e);
            }
        };

        let report = LoadReport {
            loaded: parsed.tasks.len(),
            dropped: parsed.dropped,
            patched: parsed.patched,
        };
        self.tasks = parsed.tasks;

        let persisted = if report.patched > 0 {
            info!(file = ?self.path, patched = report.patched, "Saving patched tasks");
            self.save()
        } else {
            Ok(())
        };

        Ok(Applied::new(report, persisted))
    }

    /// Overwrite the backing file with the current collection
    pub fn save(&self) -> Result<()> {
        json_file::write_pretty(&self.path, &self.tasks).map_err(|source| {
            warn!(file = ?self.path, error = %source, "Failed to save tasks");
            TaskError::PersistFailure {
                path: self.path.clone(),
                source,
            }
        })?;

        debug!(file = ?self.path, count = self.tasks.len(), "Saved tasks");
        Ok(())
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Append a new task and persist.
    ///
    /// A blank category becomes "General".
    pub fn add(
        &mut self,
        text: &str,
        deadline: Option<&str>,
        priority: Priority,
        category: Option<&str>,
    ) -> Result<Applied<Task>> {
        let text = Self::validate_text(text)?;
        let deadline = deadline.map(Self::validate_deadline).transpose()?;

        let task = Task {
            id: new_id(),
            text,
            deadline: deadline.map(FieldValue::from),
            priority: Some(priority.into()),
            category: Some(Self::normalize_category(category.unwrap_or_default()).into()),
            completed: false,
            extra: Map::new(),
        };

        debug!(id = %task.id, "Adding task");
        self.tasks.push(task.clone());

        let persisted = self.save();
        Ok(Applied::new(task, persisted))
    }

    /// Apply the fields set in `patch` to the task with this id and persist.
    ///
    /// Everything is validated before anything is written, so a rejected
    /// patch leaves the task as it was.
    pub fn update(&mut self, id: &str, patch: TaskPatch) -> Result<Applied<Task>> {
        let index = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;

        let text = patch.text.as_deref().map(Self::validate_text).transpose()?;
        let deadline = patch.deadline.as_deref().map(Self::validate_deadline).transpose()?;

        if patch.is_empty() {
            return Ok(Applied::new(self.tasks[index].clone(), Ok(())));
        }

        let task = &mut self.tasks[index];
        if let Some(text) = text {
            task.text = text;
        }
        if let Some(deadline) = deadline {
            task.deadline = Some(deadline.into());
        }
        if let Some(priority) = patch.priority {
            task.priority = Some(priority.into());
        }
        if let Some(category) = patch.category.as_deref() {
            task.category = Some(Self::normalize_category(category).into());
        }
        if let Some(completed) = patch.completed {
            task.completed = completed;
        }

        let task = task.clone();
        debug!(id = %task.id, "Updated task");

        let persisted = self.save();
        Ok(Applied::new(task, persisted))
    }

    /// Flip the completion flag of a task
    pub fn toggle_completed(&mut self, id: &str) -> Result<Applied<Task>> {
        let completed = self
            .get(id)
            .map(|t| t.completed)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;

        self.update(id, TaskPatch::default().completed(!completed))
    }

    /// Delete every task whose id is in `ids`.
    ///
    /// Unknown ids are ignored. Returns how many tasks were removed; the file
    /// is written once, and only if something changed.
    pub fn remove<I, S>(&mut self, ids: I) -> Applied<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids: HashSet<String> = ids.into_iter().map(|s| s.as_ref().to_string()).collect();

        let before = self.tasks.len();
        self.tasks.retain(|t| !ids.contains(&t.id));
        let removed = before - self.tasks.len();

        if removed == 0 {
            debug!(requested = ids.len(), "Nothing to remove");
            return Applied::new(0, Ok(()));
        }

        info!(removed, "Removed tasks");
        let persisted = self.save();
        Applied::new(removed, persisted)
    }

    /// Delete every completed task
    pub fn clear_completed(&mut self) -> Applied<usize> {
        let completed: Vec<String> = self
            .tasks
            .iter()
            .filter(|t| t.completed)
            .map(|t| t.id.clone())
            .collect();

        self.remove(completed)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Filtered, searched and sorted view of the collection
    pub fn query(&self, query: &Query) -> Vec<&Task> {
        query.apply(&self.tasks)
    }

    /// Counts as of today's local date
    pub fn stats(&self) -> Stats {
        self.stats_on(Local::now().date_naive())
    }

    /// Counts as of `today`. Tasks with an unknown deadline are never due.
    pub fn stats_on(&self, today: NaiveDate) -> Stats {
        let total = self.tasks.len();
        let completed = self.tasks.iter().filter(|t| t.completed).count();

        Stats {
            total,
            completed,
            pending: total - completed,
            overdue_or_due_today: self.tasks.iter().filter(|t| t.is_due(today)).count(),
        }
    }

    /// Category suggestions followed by any other category in use.
    ///
    /// Labels are deduplicated ignoring case; the first spelling wins.
    pub fn categories<S: AsRef<str>>(&self, suggestions: &[S]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();

        let suggested = suggestions.iter().map(|s| s.as_ref());
        let in_use = self.tasks.iter().map(|t| t.category());

        for label in suggested.chain(in_use) {
            let label = label.trim();
            if label.is_empty() {
                continue;
            }
            if seen.insert(label.to_lowercase()) {
                result.push(label.to_string());
            }
        }

        result
    }

    // ========================================================================
    // Helper methods
    // ========================================================================

    fn validate_text(text: &str) -> Result<String> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TaskError::EmptyDescription);
        }
        Ok(text.to_string())
    }

    /// Parse and re-format so stored deadlines are always zero-padded
    fn validate_deadline(deadline: &str) -> Result<String> {
        parse_date(deadline)
            .map(format_date)
            .ok_or_else(|| TaskError::InvalidDate(deadline.to_string()))
    }

    fn normalize_category(category: &str) -> String {
        let category = category.trim();
        if category.is_empty() {
            DEFAULT_CATEGORY.to_string()
        } else {
            category.to_string()
        }
    }
}
