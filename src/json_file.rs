// JSON task file operations

use crate::error::{Result, TaskError};
use crate::models::{Task, new_id};
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Transient UI key some writers put on tasks; never persisted
const SELECTED_KEY: &str = "selected";

/// Tasks read from a file, plus what had to be fixed along the way
#[derive(Debug, Default)]
pub struct ParsedTasks {
    pub tasks: Vec<Task>,
    /// Entries skipped because they could not be turned into a task
    pub dropped: usize,
    /// Entries kept but changed (new id, stripped keys); the file is stale
    pub patched: usize,
}

/// Read the task array at `path`.
///
/// A missing file is an empty collection. Bad entries are skipped with a
/// warning; only an unreadable file or invalid top-level JSON is an error.
pub fn read_tasks(path: &Path) -> Result<ParsedTasks> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(file = ?path, "Task file does not exist yet");
            return Ok(ParsedTasks::default());
        }
        Err(e) => {
            return Err(TaskError::ReadFailure {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    parse_tasks(&content).map_err(|e| TaskError::CorruptFile {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Parse a JSON array of task objects, entry by entry
pub fn parse_tasks(content: &str) -> std::result::Result<ParsedTasks, serde_json::Error> {
    let entries: Vec<Value> = serde_json::from_str(content)?;

    let mut parsed = ParsedTasks::default();
    let mut seen: HashSet<String> = HashSet::new();

    for (index, entry) in entries.into_iter().enumerate() {
        let mut obj = match entry {
            Value::Object(obj) => obj,
            other => {
                warn!(entry = index, value = %other, "Skipping entry that is not an object");
                parsed.dropped += 1;
                continue;
            }
        };

        let mut changed = obj.remove(SELECTED_KEY).is_some();

        let has_usable_id = matches!(
            obj.get("id"),
            Some(Value::String(id)) if !id.trim().is_empty() && !seen.contains(id)
        );
        if !has_usable_id {
            let id = new_id();
            debug!(entry = index, id = %id, "Assigning new id");
            obj.insert("id".to_string(), Value::String(id));
            changed = true;
        }

        let task: Task = match serde_json::from_value(Value::Object(obj)) {
            Ok(t) => t,
            Err(e) => {
                warn!(entry = index, error = %e, "Skipping malformed task entry");
                parsed.dropped += 1;
                continue;
            }
        };

        if task.text.trim().is_empty() {
            warn!(entry = index, id = %task.id, "Skipping task with empty description");
            parsed.dropped += 1;
            continue;
        }

        seen.insert(task.id.clone());
        if changed {
            parsed.patched += 1;
        }
        parsed.tasks.push(task);
    }

    info!(
        count = parsed.tasks.len(),
        dropped = parsed.dropped,
        patched = parsed.patched,
        "Parsed tasks"
    );

    Ok(parsed)
}

/// Write `value` as 4-space indented JSON, replacing `path` atomically.
///
/// Data goes to a sibling temp file first and is renamed over the target, so
/// a failed write never leaves a truncated task file behind.
pub fn write_pretty<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut ser)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    buf.push(b'\n');

    let temp_path = path.with_extension("json.tmp");
    {
        let mut file = File::create(&temp_path)?;
        file.write_all(&buf)?;
        file.sync_all()?; // Ensure data is flushed to disk
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use tempfile::TempDir;

    #[test]
    fn test_read_nonexistent_file() {
        let temp = TempDir::new().unwrap();
        let parsed = read_tasks(&temp.path().join("missing.json")).unwrap();
        assert!(parsed.tasks.is_empty());
        assert_eq!(parsed.dropped, 0);
        assert_eq!(parsed.patched, 0);
    }

    #[test]
    fn test_read_corrupt_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tasks.json");
        fs::write(&path, "{not json").unwrap();

        let err = read_tasks(&path).unwrap_err();
        assert!(matches!(err, TaskError::CorruptFile { .. }));
    }

    #[test]
    fn test_read_object_top_level_is_corrupt() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tasks.json");
        fs::write(&path, r#"{"id":"a","task":"x"}"#).unwrap();

        assert!(matches!(read_tasks(&path), Err(TaskError::CorruptFile { .. })));
    }

    #[test]
    fn test_parse_skips_malformed_entries() {
        let content = r#"[
            {"id":"a","task":"Valid","deadline":"01-01-2025","priority":"High","completed":false},
            42,
            "just a string",
            {"id":"b"},
            {"id":"c","task":"   "},
            {"id":"d","task":"Wrong type","completed":"yes"},
            {"id":"e","task":"Also valid"}
        ]"#;

        let parsed = parse_tasks(content).unwrap();
        let ids: Vec<&str> = parsed.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "e"]);
        assert_eq!(parsed.dropped, 5);
        assert_eq!(parsed.patched, 0);
        assert_eq!(parsed.tasks[0].priority(), Priority::High);
    }

    #[test]
    fn test_parse_keeps_null_and_numeric_fields() {
        let content = r#"[
            {"id":"a","task":"keep me","priority":null},
            {"id":"b","task":"num","deadline":20250101},
            {"id":"c","task":"both","priority":3,"deadline":null}
        ]"#;

        let parsed = parse_tasks(content).unwrap();
        assert_eq!(parsed.tasks.len(), 3);
        assert_eq!(parsed.dropped, 0);
        assert!(parsed.tasks.iter().all(|t| t.priority() == Priority::Medium));
        assert!(parsed.tasks.iter().all(|t| t.deadline_date().is_none()));

        let out = serde_json::to_value(&parsed.tasks).unwrap();
        assert_eq!(out[1]["deadline"], 20250101);
        assert_eq!(out[2]["priority"], 3);
    }

    #[test]
    fn test_parse_assigns_missing_and_duplicate_ids() {
        let content = r#"[
            {"task":"no id"},
            {"id":"","task":"empty id"},
            {"id":7,"task":"numeric id"},
            {"id":"dup","task":"first"},
            {"id":"dup","task":"second"}
        ]"#;

        let parsed = parse_tasks(content).unwrap();
        assert_eq!(parsed.tasks.len(), 5);
        assert_eq!(parsed.patched, 4);
        assert_eq!(parsed.tasks[3].id, "dup");

        let unique: HashSet<&str> = parsed.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(unique.len(), 5);
        assert!(parsed.tasks.iter().all(|t| !t.id.is_empty()));
    }

    #[test]
    fn test_parse_strips_selected_flag() {
        let parsed = parse_tasks(r#"[{"id":"a","task":"x","selected":true,"note":"keep"}]"#).unwrap();
        assert_eq!(parsed.patched, 1);
        assert!(!parsed.tasks[0].extra.contains_key("selected"));
        assert!(parsed.tasks[0].extra.contains_key("note"));
    }

    #[test]
    fn test_write_pretty_creates_parent_and_indents() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("tasks.json");

        let value = serde_json::json!([{"id": "a", "task": "x"}]);
        write_pretty(&path, &value).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("[\n    {\n        \"id\": \"a\""));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_write_pretty_overwrites() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tasks.json");

        write_pretty(&path, &serde_json::json!([1, 2, 3])).unwrap();
        write_pretty(&path, &serde_json::json!([])).unwrap();

        let value: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value, serde_json::json!([]));
    }
}
