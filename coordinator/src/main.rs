mod config;
mod failover;
mod handlers;
mod registry;
mod scheduler;
mod state;


use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use common::config::COMPLETION_POLL_INTERVAL;
use tokio::{net::TcpListener, time::sleep};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{Cli, CoordinatorConfig};
use crate::scheduler::Scheduler;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("coordinator=debug,tower_http=info")),
        )
        .init();

    let config = CoordinatorConfig::from_cli(Cli::parse())?;
    info!(
        "job con {} tareas map y {} reduce (lease={:?})",
        config.input_files.len(),
        config.reduce_partitions,
        config.task_timeout
    );

    let scheduler = Arc::new(Scheduler::new(
        config.input_files.clone(),
        config.reduce_partitions,
        config.task_timeout,
    ));

    let listener = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("no se pudo escuchar en {}", config.listen))?;
    info!("coordinador escuchando en {}", listener.local_addr()?);

    serve_until_complete(listener, scheduler, config.sweep_interval, COMPLETION_POLL_INTERVAL).await?;

    info!("job terminado, saliendo");
    Ok(())
}

/// Sirve el protocolo y corre el barrido de timeouts hasta que
/// `is_complete()` se observe en `true`; después apaga el servidor.
pub async fn serve_until_complete(
    listener: TcpListener,
    scheduler: Arc<Scheduler>,
    sweep_interval: Duration,
    poll_interval: Duration,
) -> std::io::Result<()> {
    let app = handlers::build_router(AppState::new(scheduler.clone()));

    // barrido de leases en segundo plano
    let sweep = tokio::spawn(failover::run_timeout_sweep(scheduler.clone(), sweep_interval));

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_completion(scheduler, poll_interval))
        .await;

    sweep.abort();
    result
}

async fn wait_for_completion(scheduler: Arc<Scheduler>, poll_interval: Duration) {
    while !scheduler.is_complete() {
        sleep(poll_interval).await;
    }
}
