//! CLI entry point for farmtrack.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use farmtrack_app::{FarmService, ProjectConfig};
use farmtrack_core::{CropStatus, Priority, TaskBucket};
use farmtrack_store_json::{Collection, JsonStore};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod commands;

/// Farm records kept as plain JSON files.
#[derive(Parser, Debug)]
#[command(
    name = "farmtrack",
    version,
    about = "farmtrack: tasks, crops and farm finances from a directory of JSON records"
)]
struct Cli {
    /// Project directory holding `.farmtrack/config.toml` (defaults to current).
    #[arg(long)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Headline numbers and the next few tasks.
    Dashboard,

    /// Tasks grouped into today, overdue, upcoming, completed and invalid.
    Tasks {
        /// Only show one bucket.
        #[arg(long)]
        bucket: Option<TaskBucket>,
    },

    /// Income, expenses and their breakdowns.
    Finances {
        #[arg(long)]
        json: bool,
    },

    /// Write a CSV export.
    Export {
        /// Target file (defaults to a timestamped name in the current directory).
        #[arg(long)]
        output: Option<PathBuf>,
        /// Export tasks instead of finances.
        #[arg(long)]
        tasks: bool,
    },

    /// Forecast with farming advice.
    Weather {
        #[arg(long, default_value_t = 7)]
        days: usize,
    },

    /// Crop plantings with harvest countdowns.
    Crops {
        #[arg(long)]
        farm: Option<u64>,
        #[arg(long)]
        status: Option<CropStatus>,
    },

    /// Create a new open task.
    TaskNew {
        #[arg(long)]
        title: String,
        /// Due date as `YYYY-MM-DD`.
        #[arg(long)]
        due: String,
        #[arg(long, default_value = "medium")]
        priority: Priority,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        farm: Option<u64>,
        #[arg(long)]
        crop: Option<u64>,
    },

    /// Flip a task between open and completed.
    TaskToggle {
        #[arg(long)]
        id: u64,
    },

    /// Record an expense.
    ExpenseAdd {
        #[arg(long)]
        category: String,
        #[arg(long)]
        amount: f64,
        #[arg(long, default_value = "")]
        description: String,
        /// Date as `YYYY-MM-DD` (defaults to today).
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        farm: Option<u64>,
    },

    /// Record a sale.
    IncomeAdd {
        #[arg(long)]
        crop: Option<u64>,
        #[arg(long)]
        farm: Option<u64>,
        #[arg(long)]
        quantity: f64,
        #[arg(long)]
        price: f64,
        #[arg(long, default_value = "")]
        buyer: String,
        /// Date as `YYYY-MM-DD` (defaults to today).
        #[arg(long)]
        date: Option<String>,
    },

    /// Delete a record by id.
    Delete {
        #[arg(long)]
        collection: Collection,
        #[arg(long)]
        id: u64,
    },
}

fn main() -> Result<()> {
    let Cli { dir, cmd } = Cli::parse();
    install_tracing();

    let project_dir = dir.unwrap_or_else(|| PathBuf::from("."));
    let config = ProjectConfig::from_workdir(&project_dir)?;
    let store = JsonStore::open(config.data_dir(&project_dir))?;
    let service = FarmService::new(store, config)?;
    commands::run(cmd, &service)
}

fn install_tracing() {
    // RUST_LOG is honoured; INFO by default. Logs go to stderr so stdout stays parseable.
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
