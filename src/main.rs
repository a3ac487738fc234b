use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use colored::{ColoredString, Colorize};
use eyre::{Result, eyre};
use std::path::PathBuf;
use thiserror::Error;
use todostore::{Config, Filter, Priority, Query, Sort, SortKey, Task, TaskPatch, TaskStore};
use tracing::Level;

#[derive(Parser)]
#[command(name = "todostore")]
#[command(about = "todostore CLI - manage a to-do list stored in a local JSON file")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to the task file (overrides the config file)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Path to a YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        text: String,

        /// Deadline as DD-MM-YYYY
        #[arg(short, long)]
        deadline: Option<String>,

        /// low, medium or high
        #[arg(short, long)]
        priority: Option<Priority>,

        #[arg(short = 'C', long)]
        category: Option<String>,
    },

    /// Change fields of an existing task
    Edit {
        /// Task id or unique id prefix
        id: String,

        #[arg(long)]
        text: Option<String>,

        /// Deadline as DD-MM-YYYY
        #[arg(short, long)]
        deadline: Option<String>,

        #[arg(short, long)]
        priority: Option<Priority>,

        #[arg(short = 'C', long)]
        category: Option<String>,

        /// Mark as completed (true) or pending (false)
        #[arg(long)]
        done: Option<bool>,
    },

    /// Toggle a task between completed and pending
    Toggle {
        /// Task id or unique id prefix
        id: String,
    },

    /// Remove tasks
    Rm {
        /// Task ids or unique id prefixes
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Remove all completed tasks
    Clear,

    /// List tasks
    List {
        /// all, completed, pending, or a category name
        #[arg(short = 'F', long, default_value = "all")]
        filter: Filter,

        /// Case-insensitive text to look for in any field
        #[arg(short, long, default_value = "")]
        search: String,

        /// text, deadline, priority or completed
        #[arg(short = 'S', long)]
        sort: Option<SortKey>,

        /// Sort descending
        #[arg(long, requires = "sort")]
        desc: bool,
    },

    /// Show task counts
    Stats,

    /// Show category suggestions and categories in use
    Categories,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    let config = Config::load(cli.config.as_deref())?;
    let data_file = cli.file.clone().unwrap_or_else(|| config.data_file.clone());

    // Open store
    let mut store = TaskStore::new(&data_file);
    match store.load() {
        Ok(applied) => {
            if applied.value.dropped > 0 {
                warn_user(&format!("skipped {} malformed entries", applied.value.dropped));
            }
            if let Some(e) = applied.persist_error {
                warn_user(&format!("{:#}", eyre::Report::new(e)));
            }
        }
        Err(e) => warn_user(&format!("{:#}", eyre::Report::new(e))),
    }

    let today = Local::now().date_naive();

    match cli.command {
        Commands::Add {
            text,
            deadline,
            priority,
            category,
        } => {
            let priority = priority.unwrap_or(config.default_priority);
            let category = category.unwrap_or_else(|| config.default_category.clone());
            let task = store
                .add(&text, deadline.as_deref(), priority, Some(category.as_str()))?
                .into_result()?;

            if task.is_overdue(today) {
                warn_user("the deadline is in the past");
            }
            println!("Added {}", task.id);
        }
        Commands::Edit {
            id,
            text,
            deadline,
            priority,
            category,
            done,
        } => {
            let patch = TaskPatch {
                text,
                deadline,
                priority,
                category,
                completed: done,
            };
            if patch.is_empty() {
                return Err(eyre!("Nothing to change (see --help for editable fields)"));
            }

            let id = resolve_id(&store, &id).map_err(|e| eyre!("{}: {}", id, e))?;
            let task = store.update(&id, patch)?.into_result()?;
            println!("{}", format_task(&task, today));
        }
        Commands::Toggle { id } => {
            let id = resolve_id(&store, &id).map_err(|e| eyre!("{}: {}", id, e))?;
            let task = store.toggle_completed(&id)?.into_result()?;
            println!("{}", format_task(&task, today));
        }
        Commands::Rm { ids } => {
            let mut resolved = Vec::with_capacity(ids.len());
            for id in &ids {
                match resolve_id(&store, id) {
                    Ok(id) => resolved.push(id),
                    // Unknown ids are a no-op for remove
                    Err(IdError::NoMatch) => resolved.push(id.clone()),
                    Err(e @ IdError::Ambiguous(_)) => warn_user(&format!("skipping {}: {}", id, e)),
                }
            }
            let removed = store.remove(&resolved).into_result()?;
            println!("Removed {} task(s)", removed);
        }
        Commands::Clear => {
            let removed = store.clear_completed().into_result()?;
            println!("Removed {} completed task(s)", removed);
        }
        Commands::List {
            filter,
            search,
            sort,
            desc,
        } => {
            let mut query = Query::new().filter(filter).search(search);
            if let Some(key) = sort {
                query = query.sort(if desc { Sort::descending(key) } else { Sort::ascending(key) });
            }

            let tasks = store.query(&query);
            if tasks.is_empty() {
                println!("No tasks");
            }
            for task in tasks {
                println!("{}", format_task(task, today));
            }
        }
        Commands::Stats => {
            let stats = store.stats_on(today);
            println!(
                "Total: {} | Completed: {} | Pending: {} ({}%) | Due: {}",
                stats.total,
                stats.completed,
                stats.pending,
                stats.completion_percent(),
                stats.overdue_or_due_today
            );
        }
        Commands::Categories => {
            for category in store.categories(&config.categories) {
                println!("{}", category);
            }
        }
    }

    Ok(())
}

fn warn_user(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message);
}

#[derive(Debug, Error, PartialEq, Eq)]
enum IdError {
    #[error("no task matches this id")]
    NoMatch,
    #[error("id prefix is ambiguous ({0} tasks)")]
    Ambiguous(usize),
}

/// Accept a full id or a prefix that matches exactly one task
fn resolve_id(store: &TaskStore, input: &str) -> std::result::Result<String, IdError> {
    if store.get(input).is_some() {
        return Ok(input.to_string());
    }

    let matches: Vec<&Task> = store.tasks().iter().filter(|t| t.id.starts_with(input)).collect();
    match matches.as_slice() {
        [task] => Ok(task.id.clone()),
        [] => Err(IdError::NoMatch),
        _ => Err(IdError::Ambiguous(matches.len())),
    }
}

/// Raw priority label, coloured by the resolved priority
fn priority_colored(task: &Task) -> ColoredString {
    let label = format!("{:<6}", task.priority_label());
    match task.priority() {
        Priority::High => label.red(),
        Priority::Medium => label.yellow(),
        Priority::Low => label.green(),
    }
}

fn format_task(task: &Task, today: NaiveDate) -> String {
    let check = if task.completed { "[x]".green() } else { "[ ]".normal() };
    let text = if task.completed {
        task.text.dimmed()
    } else {
        task.text.normal()
    };

    let deadline = format!("{:<10}", task.deadline_str().unwrap_or("-"));
    let deadline = if task.is_overdue(today) {
        deadline.red()
    } else {
        deadline.normal()
    };

    format!(
        "{} {}  {}  {}  {}  {}",
        check,
        text,
        deadline,
        priority_colored(task),
        task.category().cyan(),
        task.id.dimmed()
    )
}
