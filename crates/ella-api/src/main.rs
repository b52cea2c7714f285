//! Ella CLI and REST API entry point.
//!
//! Binary name: `ella`
//!
//! Parses CLI arguments, opens the data directory and database, then either
//! runs an operator command or starts the HTTP server and job worker.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use ella_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};
use state::Storage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let otel = matches!(cli.command, Commands::Serve { otel: true, .. });
    let options = TracingOptions {
        enable_otel: otel,
        json: cli.json,
        ..TracingOptions::from_verbosity(cli.verbose, cli.quiet)
    };
    init_tracing(&options).map_err(|e| anyhow::anyhow!("initializing tracing: {e}"))?;

    // Shell completions don't need storage
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "ella", &mut std::io::stdout());
        return Ok(());
    }

    let storage = Storage::open().await?;

    let result = match cli.command {
        Commands::Serve { port, host, .. } => serve(&storage, host, port).await,
        Commands::User { action } => {
            cli::user::handle_user_command(action, &storage, cli.json).await
        }
        Commands::Jobs { action } => {
            cli::jobs::handle_jobs_command(action, &storage, cli.json).await
        }
        Commands::Completions { .. } => unreachable!("handled above"),
    };

    shutdown_tracing();
    result
}

async fn serve(storage: &Storage, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let runtime = state::start_runtime(storage).await?;

    let host = host.unwrap_or_else(|| storage.config.server.host.clone());
    let port = port.unwrap_or(storage.config.server.port);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!(
        "  {} Ella API listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());
    tracing::info!(%addr, "Server started");

    let router = http::router::build_router(runtime.state);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    runtime.cancel.cancel();
    if let Err(e) = runtime.worker.await {
        tracing::warn!(error = %e, "Job worker did not shut down cleanly");
    }

    println!("\n  Server stopped.");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
