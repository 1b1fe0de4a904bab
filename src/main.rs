//! # Taskflow
//!
//! A terminal task manager with categories, subtasks and recurring tasks.
//!
//! ## Usage
//!
//! **Adding Tasks**
//! ```bash
//! # Basic task
//! taskflow add "Write report" --priority high --category Work --due 2025-12-01
//!
//! # Every other week until the end of March
//! taskflow recur "Team retro" --every weekly --count 2 --start 2025-01-06 --end 2025-03-31
//!
//! # See what a rule would create without creating it
//! taskflow recur "Water plants" --every daily --preview
//! ```
//!
//! **Managing Tasks**
//! ```bash
//! # Default view: everything, incomplete first, by priority then due date
//! taskflow list
//!
//! # Overdue work items
//! taskflow list --status overdue --category work
//!
//! # Toggle completion
//! taskflow done <ID>
//!
//! # Checklist items
//! taskflow subtask add <ID> "Book venue"
//! taskflow subtask toggle <ID> <SUBTASK>
//! ```
//!
//! ## Data Storage
//!
//! Tasks and categories are saved as JSON in your local data directory:
//! *   Linux: `~/.local/share/taskflow/`
//! *   macOS: `~/Library/Application Support/taskflow/`
//! *   Windows: `%APPDATA%\taskflow\`
//!
//! Override it with `--data-dir` or the `TASKFLOW_DB` environment variable.
//! Set `RUST_LOG` (or pass `-v`) for diagnostics.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use log::debug;

use taskflow::commands::*;
use taskflow::config::Config;
use taskflow::dates::today;
use taskflow::models::{CategoryPatch, Interval, NewCategory, NewTask, Priority, RecurrenceConfig, SubtaskPatch, TaskPatch};
use taskflow::query::{FilterSet, SortBy, StatusFilter};
use taskflow::service::TaskService;
use taskflow::storage::Storage;

#[derive(Parser)]
#[command(name = "taskflow")]
#[command(about = "Personal task manager with subtasks and recurring tasks", long_about = None)]
struct Cli {
    /// Directory holding tasks.json and categories.json
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        /// Task title (quoted if it has spaces)
        title: String,
        /// low, medium or high
        #[arg(short, long)]
        priority: Option<String>,
        /// Category name
        #[arg(short, long)]
        category: Option<String>,
        /// Due date in YYYY-MM-DD
        #[arg(short, long)]
        due: Option<String>,
    },
    /// List tasks in display order
    List {
        /// all, active, completed, overdue or today
        #[arg(short, long, default_value = "all")]
        status: StatusFilter,
        /// Only these priorities (repeatable)
        #[arg(short, long)]
        priority: Vec<Priority>,
        /// Only these categories (repeatable)
        #[arg(short, long)]
        category: Vec<String>,
        /// Case-insensitive text to find in title or category
        #[arg(short = 'q', long)]
        search: Option<String>,
        /// priority, due, created or alphabetical
        #[arg(long)]
        sort: Option<SortBy>,
    },
    /// Show a task with its subtasks
    Show { id: u64 },
    /// Edit a task
    Edit {
        id: u64,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
        /// New priority
        #[arg(short, long)]
        priority: Option<String>,
        /// New category
        #[arg(short, long)]
        category: Option<String>,
        /// New due date
        #[arg(short, long, conflicts_with = "no_due")]
        due: Option<String>,
        /// Remove the due date
        #[arg(long)]
        no_due: bool,
    },
    /// Toggle a task between done and pending
    Done { id: u64 },
    /// Remove a task
    Remove { id: u64 },
    /// Create a series of tasks from a repeat rule
    Recur {
        /// Task title
        title: String,
        #[arg(short, long)]
        priority: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        /// daily, weekly or monthly
        #[arg(short, long)]
        every: Interval,
        /// Steps between occurrences (1-30)
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,
        /// First occurrence in YYYY-MM-DD (default today)
        #[arg(short, long)]
        start: Option<String>,
        /// Last possible occurrence in YYYY-MM-DD
        #[arg(short = 'u', long)]
        end: Option<String>,
        /// Describe the series without creating it
        #[arg(long)]
        preview: bool,
    },
    /// Manage a task's subtasks
    Subtask {
        #[command(subcommand)]
        command: SubtaskCommands,
    },
    /// Manage categories
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },
    /// Show summary statistics
    Stats,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum SubtaskCommands {
    /// Add a subtask
    Add { task_id: u64, title: String },
    /// Rename a subtask
    Edit {
        task_id: u64,
        subtask_id: u64,
        #[arg(short, long)]
        title: String,
    },
    /// Remove a subtask
    Remove { task_id: u64, subtask_id: u64 },
    /// Toggle a subtask between done and pending
    Toggle { task_id: u64, subtask_id: u64 },
}

#[derive(Subcommand)]
enum CategoryCommands {
    /// List categories with task counts
    List,
    /// Add a category
    Add {
        name: String,
        #[arg(long)]
        color: Option<String>,
    },
    /// Edit a category
    Edit {
        id: u64,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Remove a category
    Remove { id: u64 },
}

impl Commands {
    fn mutates(&self) -> bool {
        match self {
            Commands::Add { .. } | Commands::Edit { .. } | Commands::Done { .. } | Commands::Remove { .. } => true,
            Commands::Recur { preview, .. } => !preview,
            Commands::Subtask { .. } => true,
            Commands::Category { command } => !matches!(command, CategoryCommands::List),
            Commands::List { .. } | Commands::Show { .. } | Commands::Stats | Commands::Completions { .. } => false,
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let command = cli.command.unwrap_or(Commands::List {
        status: StatusFilter::All,
        priority: Vec::new(),
        category: Vec::new(),
        search: None,
        sort: None,
    });

    if let Commands::Completions { shell } = command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "taskflow", &mut io::stdout());
        return Ok(());
    }

    let mut config = Config::from_env();
    if let Some(dir) = cli.data_dir {
        config = config.with_data_dir(dir);
    }
    debug!("using data directory {}", config.data_dir.display());

    let storage = Storage::from_config(&config);
    let store = storage
        .load()
        .with_context(|| format!("failed to load tasks from {}", storage.dir().display()))?;
    let svc = TaskService::new(store).with_latency(config.latency);
    let mutates = command.mutates();
    let today = today();

    match command {
        Commands::Add {
            title,
            priority,
            category,
            due,
        } => {
            let data = NewTask {
                title,
                priority,
                category,
                due_date: due,
            };
            cmd_add(&svc, data).await?
        }
        Commands::List {
            status,
            priority,
            category,
            search,
            sort,
        } => {
            let filters = FilterSet {
                status,
                priorities: priority.into_iter().collect(),
                categories: category.into_iter().map(|c| c.to_lowercase()).collect(),
                search: search.unwrap_or_default(),
            };
            cmd_list(&svc, filters, sort, today).await?
        }
        Commands::Show { id } => cmd_show(&svc, id, today).await?,
        Commands::Edit {
            id,
            title,
            priority,
            category,
            due,
            no_due,
        } => {
            let due_date = if no_due { Some(None) } else { due.map(Some) };
            let patch = TaskPatch {
                title,
                priority,
                category,
                due_date,
                completed: None,
            };
            cmd_edit(&svc, id, patch).await?
        }
        Commands::Done { id } => cmd_done(&svc, id).await?,
        Commands::Remove { id } => cmd_remove(&svc, id).await?,
        Commands::Recur {
            title,
            priority,
            category,
            every,
            count,
            start,
            end,
            preview,
        } => {
            let data = NewTask {
                title,
                priority,
                category,
                due_date: None,
            };
            let config = RecurrenceConfig {
                interval: every,
                interval_count: count,
                start_date: start.unwrap_or_else(|| taskflow::dates::format_day(today)),
                end_date: end,
            };
            cmd_recur(&svc, data, config, preview).await?
        }
        Commands::Subtask { command } => match command {
            SubtaskCommands::Add { task_id, title } => cmd_subtask_add(&svc, task_id, title).await?,
            SubtaskCommands::Edit {
                task_id,
                subtask_id,
                title,
            } => {
                let patch = SubtaskPatch {
                    title: Some(title),
                    completed: None,
                };
                cmd_subtask_edit(&svc, task_id, subtask_id, patch).await?
            }
            SubtaskCommands::Remove { task_id, subtask_id } => cmd_subtask_remove(&svc, task_id, subtask_id).await?,
            SubtaskCommands::Toggle { task_id, subtask_id } => cmd_subtask_toggle(&svc, task_id, subtask_id).await?,
        },
        Commands::Category { command } => match command {
            CategoryCommands::List => cmd_category_list(&svc).await?,
            CategoryCommands::Add { name, color } => cmd_category_add(&svc, NewCategory { name, color }).await?,
            CategoryCommands::Edit { id, name, color } => {
                cmd_category_edit(&svc, id, CategoryPatch { name, color }).await?
            }
            CategoryCommands::Remove { id } => cmd_category_remove(&svc, id).await?,
        },
        Commands::Stats => cmd_stats(&svc, today).await?,
        Commands::Completions { .. } => {}
    }

    if mutates {
        storage
            .save(&svc.snapshot().await)
            .with_context(|| format!("failed to save tasks to {}", storage.dir().display()))?;
    }
    Ok(())
}
