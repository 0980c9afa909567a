//! Command line front-end for reviewdesk.
//!
//! # Responsibility
//! - Map subcommands onto one `ReviewStore` session per invocation.
//! - Keep output stable: one review per line, or JSON with `--json`.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::debug;
use reviewdesk_core::db::open_db;
use reviewdesk_core::{
    init_logging, EmployeeId, ReviewId, ReviewRef, ReviewStore, SqliteEmployeeDirectory,
    WriteOutcome,
};
use rusqlite::params;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "reviewdesk")]
#[command(version = reviewdesk_core::core_version())]
#[command(about = "Manage employee performance reviews stored in SQLite")]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "REVIEWDESK_DB", default_value = "reviewdesk.sqlite3")]
    db: PathBuf,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, env = "REVIEWDESK_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, env = "REVIEWDESK_LOG_DIR")]
    log_dir: Option<String>,

    /// Print reviews as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the reviews table if it does not exist
    Init,
    /// Drop the reviews table if it exists
    Drop,
    /// Register an employee that reviews can reference
    Hire {
        #[arg(long)]
        name: String,
        #[arg(long)]
        job_title: String,
    },
    /// Create and save a review
    Add {
        #[arg(long)]
        year: i64,
        #[arg(long)]
        summary: String,
        #[arg(long)]
        employee: EmployeeId,
    },
    /// List all reviews in storage order
    List,
    /// Show one review
    Show { id: ReviewId },
    /// Change fields of an existing review
    Edit {
        id: ReviewId,
        #[arg(long)]
        year: Option<i64>,
        #[arg(long)]
        summary: Option<String>,
        #[arg(long)]
        employee: Option<EmployeeId>,
    },
    /// Delete a review
    Delete { id: ReviewId },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli
            .log_level
            .clone()
            .unwrap_or_else(|| reviewdesk_core::default_log_level().to_string());
        init_logging(&level, log_dir).context("failed to initialize logging")?;
    }

    let conn = open_db(&cli.db)
        .with_context(|| format!("failed to open database {}", cli.db.display()))?;
    let mut store = ReviewStore::new(&conn, SqliteEmployeeDirectory::new(&conn));
    debug!("event=cli_command module=cli command={:?}", cli.command);

    match cli.command {
        Commands::Init => {
            store.create_table()?;
            println!("reviews table ready");
        }
        Commands::Drop => {
            store.drop_table()?;
            println!("reviews table dropped");
        }
        Commands::Hire { name, job_title } => {
            conn.execute(
                "INSERT INTO employees (name, job_title) VALUES (?1, ?2);",
                params![name, job_title],
            )
            .context("failed to insert employee")?;
            println!("employee {} hired", conn.last_insert_rowid());
        }
        Commands::Add {
            year,
            summary,
            employee,
        } => {
            let review = store.create(year, summary, employee)?;
            print_reviews(&[review], cli.json)?;
        }
        Commands::List => {
            let reviews = store.get_all()?;
            print_reviews(&reviews, cli.json)?;
        }
        Commands::Show { id } => {
            let review = require_review(&mut store, id)?;
            print_reviews(&[review], cli.json)?;
        }
        Commands::Edit {
            id,
            year,
            summary,
            employee,
        } => {
            if year.is_none() && summary.is_none() && employee.is_none() {
                bail!("nothing to change; pass --year, --summary or --employee");
            }
            let review = require_review(&mut store, id)?;
            {
                let mut current = review.borrow_mut();
                if let Some(year) = year {
                    current.set_year(year)?;
                }
                if let Some(summary) = summary {
                    current.set_summary(summary)?;
                }
            }
            if let Some(employee) = employee {
                store.set_employee(&review, employee)?;
            }
            match store.update(&review)? {
                WriteOutcome::Applied(_) => print_reviews(&[review], cli.json)?,
                WriteOutcome::Skipped(state) => bail!("review {id} not updated ({state:?})"),
            }
        }
        Commands::Delete { id } => {
            let review = require_review(&mut store, id)?;
            match store.delete(&review)? {
                WriteOutcome::Applied(id) => println!("review {id} deleted"),
                WriteOutcome::Skipped(state) => bail!("review {id} not deleted ({state:?})"),
            }
        }
    }

    Ok(())
}

fn require_review(
    store: &mut ReviewStore<'_, SqliteEmployeeDirectory<'_>>,
    id: ReviewId,
) -> Result<ReviewRef> {
    store
        .find_by_id(id)?
        .with_context(|| format!("review {id} not found"))
}

fn print_reviews(reviews: &[ReviewRef], json: bool) -> Result<()> {
    if json {
        let values = reviews
            .iter()
            .map(|review| serde_json::to_value(&*review.borrow()))
            .collect::<Result<Vec<_>, _>>()?;
        println!("{}", serde_json::to_string_pretty(&values)?);
    } else {
        for review in reviews {
            println!("{}", review.borrow());
        }
    }
    Ok(())
}
