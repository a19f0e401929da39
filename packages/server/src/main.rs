mod config;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dirstore_mutation::{MutationEngine, Root};

use crate::config::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("dirstore=info,dirstore_http=info,dirstore_mutation=info")
        }))
        .init();

    let cli = Cli::parse();

    let root = Root::new(&cli.root)
        .with_context(|| format!("cannot serve {}", cli.root.display()))?;
    info!(root = %root.as_path().display(), path_locks = !cli.no_path_locks, "starting");

    let engine = Arc::new(MutationEngine::with_options(root, cli.engine_options()));
    let router = dirstore_http::router(engine, cli.server_config());

    let listener = tokio::net::TcpListener::bind((cli.host.as_str(), cli.port))
        .await
        .with_context(|| format!("cannot bind {}:{}", cli.host, cli.port))?;

    dirstore_http::serve(listener, router, shutdown_signal()).await?;
    info!("stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler; run until killed.
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
