use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

mod api;
mod config;
mod error;
mod loader;
mod models;
mod query;

use config::SnapshotFilter;
use models::{FilteredTable, OutputRecord};

#[derive(Parser)]
#[command(name = "discipline-api")]
#[command(about = "Serves a point-in-time slice of school discipline records", long_about = None)]
struct Cli {
    /// Source discipline CSV
    #[arg(long, env = "DISCIPLINE_CSV", default_value = "Student_Discipline.csv")]
    csv: PathBuf,

    #[command(flatten)]
    filter: SnapshotFilter,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the snapshot and serve it over HTTP
    Serve {
        #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8000")]
        bind: SocketAddr,
    },
    /// Print the rows the API would return for a category
    Preview {
        /// Category label, e.g. "Black" or "Low-income students"
        label: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(log_level.parse().unwrap_or(Level::INFO.into())),
        )
        .with_writer(std::io::stderr)
        .init();

    let table = loader::load_table(&cli.csv, &cli.filter)
        .with_context(|| format!("failed to load {}", cli.csv.display()))?;
    if table.is_empty() {
        warn!(filter = ?cli.filter, "snapshot filter matched no rows");
    }

    match cli.command {
        Commands::Serve { bind } => serve(bind, table).await?,
        Commands::Preview { label } => preview(&table, &label),
    }

    Ok(())
}

async fn serve(bind: SocketAddr, table: FilteredTable) -> anyhow::Result<()> {
    let app = api::router(Arc::new(table));
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;

    info!("Listening on http://{}", bind);
    info!("Data endpoint: GET http://{}/api/data?category=<label>", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!("Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

fn preview(table: &FilteredTable, label: &str) {
    for line in preview_lines(table, label) {
        println!("{line}");
    }
}

fn preview_lines(table: &FilteredTable, label: &str) -> Vec<String> {
    let records = query::select(table, label);

    if records.is_empty() {
        let mut lines = vec![format!("No rows for category {label:?}.")];
        if query::subgroup_for(label).is_none() {
            let known: Vec<&str> = query::categories().collect();
            lines.push(format!("Known categories: {}", known.join(", ")));
        }
        return lines;
    }

    let mut lines = vec![format!("Rows for {label}:")];
    lines.extend(records.iter().map(format_record));
    lines
}

fn format_record(record: &OutputRecord) -> String {
    format!(
        "- [{}] {} ({}) {:.2}% of {} enrolled, {} students, {} incidents, avg {:.2} days",
        record.index,
        record.name,
        record.category,
        record.value,
        record.enrollment_count,
        record.student_count,
        record.incident_count,
        record.average_duration
    )
}
