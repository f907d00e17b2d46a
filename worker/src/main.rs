use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use common::{app::APP_NAMES, app_by_name, config::coordinator_base_url};
use tracing::{info, info_span, Instrument};
use tracing_subscriber::EnvFilter;
use worker::{run, HttpCoordinatorLink, WorkerConfig};

#[derive(Parser)]
#[command(name = "worker")]
#[command(about = "Worker map-reduce: pide tareas al coordinador hasta que el job termina")]
struct Cli {
    /// App map/reduce a ejecutar
    #[arg(long, default_value = "wordcount")]
    app: String,

    /// Directorio de archivos intermedios y de salida
    #[arg(long, default_value = ".")]
    work_dir: PathBuf,

    /// Espera en milisegundos cuando no hay tareas disponibles
    #[arg(long, default_value_t = 1000)]
    wait_backoff_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("worker=debug,reqwest=info")),
        )
        .init();

    let cli = Cli::parse();
    let app = app_by_name(&cli.app)
        .ok_or_else(|| anyhow!("app desconocida {:?}; disponibles: {:?}", cli.app, APP_NAMES))?;

    let base_url = coordinator_base_url()?;
    let link = HttpCoordinatorLink::new(base_url);

    // Nombre de host (solo para info)
    let hostname = hostname::get()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let worker_id = uuid::Uuid::new_v4();

    let config = WorkerConfig {
        work_dir: cli.work_dir,
        wait_backoff: Duration::from_millis(cli.wait_backoff_ms),
    };

    let span = info_span!("worker", id = %worker_id, host = %hostname);
    async {
        info!(
            "worker arrancando con app={} contra {} (work_dir={})",
            app.name(),
            link.base_url(),
            config.work_dir.display()
        );

        let stats = run(&link, Arc::from(app), &config)
            .await
            .context("el coordinador no responde")?;

        info!("worker terminó: {:?}", stats);
        Ok::<(), anyhow::Error>(())
    }
    .instrument(span)
    .await
}
