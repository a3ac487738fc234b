// todostore - To-do list task store persisted to a local JSON file

pub mod config;
pub mod error;
pub mod filter;
pub mod json_file;
pub mod models;
pub mod store;

// Re-export main types for convenience
pub use config::Config;
pub use error::{Applied, TaskError};
pub use filter::{Filter, Query, Sort, SortKey, SortState};
pub use models::{DATE_FORMAT, FieldValue, Priority, Stats, Task, TaskPatch, format_date, parse_date};
pub use store::{LoadReport, TaskStore};
