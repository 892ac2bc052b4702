//! Pagescope main entry point
//!
//! This is the command-line interface for the Pagescope page auditor.

use anyhow::Context;
use clap::{Parser, Subcommand};
use pagescope::config::{load_config_or_default, Config};
use pagescope::output::{format_job_details, format_job_table, job_details_json, job_page_json};
use pagescope::storage::{JobQuery, SortField, SortOrder};
use pagescope::{Coordinator, JobStatus};
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;

/// Pagescope: single-page crawl and audit
///
/// Each job fetches one URL, profiles its markup, checks every outbound link
/// and tracks internal links across your jobs to flag orphan pages.
#[derive(Parser, Debug)]
#[command(name = "pagescope")]
#[command(version)]
#[command(about = "Single-page crawl and audit engine", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", default_value = "pagescope.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    /// User id that owns the jobs
    #[arg(short, long, default_value_t = 1, global = true)]
    user: i64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Queue a URL without crawling it
    Add {
        url: String,
    },

    /// Queue a URL, crawl it and print the report
    Crawl {
        url: String,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Crawl an existing queued or failed job and wait for it
    Start {
        id: i64,

        #[arg(long)]
        json: bool,
    },

    /// List jobs
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = JobQuery::DEFAULT_LIMIT)]
        limit: u32,

        /// created_at, url, status, page_title, started_at or completed_at
        #[arg(long, value_parser = parse_sort_field, default_value = "created_at")]
        sort_by: SortField,

        /// asc or desc
        #[arg(long, value_parser = parse_sort_order, default_value = "desc")]
        order: SortOrder,

        /// Match against URL or page title
        #[arg(long)]
        search: Option<String>,

        #[arg(long, value_parser = parse_status)]
        status: Option<JobStatus>,

        #[arg(long)]
        json: bool,
    },

    /// Show one job with its broken links
    Show {
        id: i64,

        #[arg(long)]
        json: bool,
    },

    /// Reset jobs to queued, stopping any that are running
    Rerun {
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Delete jobs and their results
    Delete {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
}

fn parse_sort_field(s: &str) -> Result<SortField, String> {
    SortField::parse(s).ok_or_else(|| format!("invalid sort field '{}'", s))
}

fn parse_sort_order(s: &str) -> Result<SortOrder, String> {
    SortOrder::parse(s).ok_or_else(|| format!("invalid order '{}', expected asc or desc", s))
}

fn parse_status(s: &str) -> Result<JobStatus, String> {
    JobStatus::from_db_string(s).ok_or_else(|| format!("invalid status '{}'", s))
}

/// Builds the listing query; page and limit are clamped by `JobQuery`
fn list_query(
    page: u32,
    limit: u32,
    sort_by: SortField,
    order: SortOrder,
    search: Option<String>,
    status: Option<JobStatus>,
) -> JobQuery {
    let mut query = JobQuery::default().with_page(page).with_limit(limit);
    query.sort_by = sort_by;
    query.order = order;
    query.search = search;
    query.status = status;
    query
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match load_config_or_default(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    run(cli.command, cli.user, &config).await?;
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pagescope=info,warn"),
            1 => EnvFilter::new("pagescope=debug,info"),
            2 => EnvFilter::new("pagescope=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(command: Command, user: i64, config: &Config) -> anyhow::Result<()> {
    let coordinator = Coordinator::new(config).with_context(|| {
        format!(
            "failed to open database {}",
            config.output.database_path
        )
    })?;

    match command {
        Command::Add { url } => {
            let job = coordinator.enqueue(user, &url)?;
            println!("Queued job {} for {}", job.id, job.url);
        }

        Command::Crawl { url, json } => {
            let job = coordinator.enqueue(user, &url)?;
            let handle = coordinator.start(job.id, user)?;
            wait_for_job(&coordinator, job.id, user, handle).await?;
            print_job(&coordinator, job.id, user, json)?;
        }

        Command::Start { id, json } => {
            let handle = coordinator
                .start(id, user)
                .with_context(|| format!("cannot start job {}", id))?;
            wait_for_job(&coordinator, id, user, handle).await?;
            print_job(&coordinator, id, user, json)?;
        }

        Command::List {
            page,
            limit,
            sort_by,
            order,
            search,
            status,
            json,
        } => {
            let query = list_query(page, limit, sort_by, order, search, status);

            let (jobs, total) = coordinator.list_jobs(user, &query)?;
            if json {
                println!("{}", job_page_json(&jobs, total, query.page(), query.limit())?);
            } else {
                print!("{}", format_job_table(&jobs, total, query.page(), query.limit()));
            }
        }

        Command::Show { id, json } => {
            print_job(&coordinator, id, user, json)?;
        }

        Command::Rerun { ids } => {
            let count = coordinator.rerun(&ids, user)?;
            println!("{} jobs queued for re-run", count);
        }

        Command::Delete { ids } => {
            let count = coordinator.delete(&ids, user)?;
            println!("{} jobs deleted", count);
        }
    }

    Ok(())
}

/// Waits for a crawl task, turning Ctrl-C into a stop request
async fn wait_for_job(
    coordinator: &Coordinator,
    id: i64,
    user: i64,
    mut handle: JoinHandle<()>,
) -> anyhow::Result<()> {
    tokio::select! {
        joined = &mut handle => {
            joined.context("crawl task failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupt received, stopping job {}", id);
            if let Err(e) = coordinator.stop(id, user) {
                tracing::debug!("Stop request for job {} not delivered: {}", id, e);
            }
            handle.await.context("crawl task failed")?;
        }
    }
    Ok(())
}

fn print_job(coordinator: &Coordinator, id: i64, user: i64, json: bool) -> anyhow::Result<()> {
    let (job, broken) = coordinator
        .job_details(id, user)
        .with_context(|| format!("cannot load job {}", id))?;

    if json {
        println!("{}", job_details_json(&job, &broken)?);
    } else {
        print!("{}", format_job_details(&job, &broken));
    }
    Ok(())
}
