//! Job CLI subcommands for inspecting background runs.

use anyhow::Result;
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use ella_core::repository::job::JobRepository;
use ella_types::job::{JobRun, JobRunStatus};

use crate::state::Storage;

#[derive(Subcommand)]
pub enum JobsCommand {
    /// List recent job runs, newest first.
    #[command(alias = "ls")]
    List {
        /// Only show runs in this state (queued, running, completed, failed).
        #[arg(long)]
        status: Option<JobRunStatus>,

        /// Maximum number of runs to show.
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
}

pub async fn handle_jobs_command(cmd: JobsCommand, storage: &Storage, json: bool) -> Result<()> {
    match cmd {
        JobsCommand::List { status, limit } => list_jobs(storage, status, limit, json).await,
    }
}

async fn list_jobs(
    storage: &Storage,
    status: Option<JobRunStatus>,
    limit: u32,
    json: bool,
) -> Result<()> {
    let runs = storage.job_repo().list_runs(status, limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&runs)?);
        return Ok(());
    }

    if runs.is_empty() {
        println!();
        println!("  {} No job runs found.", style("i").blue().bold());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Run").fg(Color::White),
        Cell::new("User").fg(Color::White),
        Cell::new("Tool").fg(Color::White),
        Cell::new("Status").fg(Color::White),
        Cell::new("Attempt").fg(Color::White),
        Cell::new("Created").fg(Color::White),
        Cell::new("Error").fg(Color::White),
    ]);

    for run in &runs {
        let (user, tool) = match run.event_payload() {
            Ok(event) => (event.clerk_id, event.tool.to_string()),
            Err(_) => ("?".to_string(), "?".to_string()),
        };
        table.add_row(vec![
            Cell::new(run.id),
            Cell::new(user),
            Cell::new(tool),
            Cell::new(run.status).fg(status_color(run)),
            Cell::new(run.attempt),
            Cell::new(run.created_at.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(run.error.as_deref().unwrap_or("")),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    Ok(())
}

fn status_color(run: &JobRun) -> Color {
    match run.status {
        JobRunStatus::Queued => Color::Blue,
        JobRunStatus::Running => Color::Yellow,
        JobRunStatus::Completed => Color::Green,
        JobRunStatus::Failed => Color::Red,
    }
}
