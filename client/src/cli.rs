use clap::{Parser, Subcommand};
use common::{JobStatusView, PhaseCounts};

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "CLI simple para consultar al coordinador")]
pub struct Cli {
    /// URL base del coordinador (por defecto la derivada del uid)
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Verifica que el coordinador responde
    Health,
    /// Muestra el avance del job
    Status {
        /// Imprime el JSON crudo
        #[arg(long)]
        json: bool,
    },
}

fn phase_line(name: &str, c: &PhaseCounts) -> String {
    format!(
        "  {:<7} total={} idle={} running={} finished={}",
        name, c.total, c.idle, c.running, c.finished
    )
}

pub fn render_status(view: &JobStatusView) -> String {
    let stage = if view.all_complete {
        "terminado"
    } else if view.reduce_phase_complete {
        "reduce completo, esperando cierre"
    } else if view.map_phase_complete {
        "fase reduce"
    } else {
        "fase map"
    };

    [
        "Job:".to_string(),
        format!("  estado: {stage}"),
        format!("  iniciado: {}", view.started_at.to_rfc3339()),
        format!(
            "  particiones reduce: {} (lease {}s)",
            view.reduce_partition_count, view.task_timeout_secs
        ),
        phase_line("map", &view.map),
        phase_line("reduce", &view.reduce),
        format!("  reportes de fallo: {}", view.failure_reports),
    ]
    .join("\n")
}
