// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clowder Daemon (clowderd)
//!
//! Binds the HTTP surface, bootstraps the database (schema replay + seed
//! templates on first start), and runs the scheduler loop in the
//! background.

use clap::{Parser, ValueEnum};
use clowder_core::UuidIdGen;
use clowder_engine::Scheduler;
use clowder_server::{router, PipelineService};
use clowder_store::Store;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "clowderd", about = "Clowder pipeline orchestrator server")]
struct Args {
    /// Minimum log level to display
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Database path
    #[arg(long, default_value = "clowder.db")]
    db: PathBuf,

    /// Scheduler poll interval in seconds
    #[arg(long, default_value_t = 2)]
    poll_interval: u64,

    /// HTTP port, bound on all interfaces
    #[arg(long, default_value_t = 8000)]
    port: u16,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    #[value(name = "TRACE")]
    Trace,
    #[value(name = "DEBUG")]
    Debug,
    #[value(name = "INFO")]
    Info,
    #[value(name = "WARNING")]
    Warning,
    #[value(name = "ERROR")]
    Error,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(args.log_level);

    let store = Store::open(&args.db)?;
    store.init_schema()?;
    if store.seed_templates_if_empty()? {
        tracing::info!("database was empty, seed templates loaded");
    }

    let scheduler = Scheduler::new(store.clone(), UuidIdGen)
        .poll_interval(Duration::from_secs(args.poll_interval));
    tokio::spawn(scheduler.run());

    let app = router(PipelineService::new(store));
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port)).await?;
    tracing::info!(port = args.port, db = %args.db.display(), "clowderd listening");
    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.directive()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
