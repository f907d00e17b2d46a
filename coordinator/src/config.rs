use std::{net::SocketAddr, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use common::config::{coordinator_addr, DEFAULT_SWEEP_INTERVAL, DEFAULT_TASK_TIMEOUT};
use glob::glob;
use tracing::warn;

#[derive(Parser, Debug)]
#[command(name = "coordinator")]
#[command(about = "Coordinador map-reduce: reparte tareas map y reduce a los workers")]
pub struct Cli {
    /// Cantidad de particiones reduce (R)
    #[arg(short = 'r', long = "reduce", value_name = "R", default_value_t = 10)]
    pub reduce_partitions: u32,

    /// Segundos sin reporte antes de reasignar una tarea
    #[arg(long, default_value_t = DEFAULT_TASK_TIMEOUT.as_secs())]
    pub timeout_secs: u64,

    /// Período del barrido de timeouts, en milisegundos
    #[arg(long, default_value_t = DEFAULT_SWEEP_INTERVAL.as_millis() as u64)]
    pub sweep_interval_ms: u64,

    /// Dirección de escucha (por defecto la derivada del uid)
    #[arg(long, value_name = "ADDR")]
    pub listen: Option<SocketAddr>,

    /// Archivos de entrada o patrones glob (una tarea map por archivo)
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub listen: SocketAddr,
    pub input_files: Vec<String>,
    pub reduce_partitions: u32,
    pub task_timeout: Duration,
    pub sweep_interval: Duration,
}

impl CoordinatorConfig {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        if cli.reduce_partitions == 0 {
            bail!("--reduce debe ser al menos 1");
        }
        // con lease cero toda tarea en curso vence apenas se asigna
        if cli.timeout_secs == 0 {
            bail!("--timeout-secs debe ser al menos 1");
        }

        let listen = match cli.listen {
            Some(addr) => addr,
            None => coordinator_addr()?,
        };

        Ok(Self {
            listen,
            input_files: expand_inputs(&cli.inputs)?,
            reduce_partitions: cli.reduce_partitions,
            task_timeout: Duration::from_secs(cli.timeout_secs),
            sweep_interval: Duration::from_millis(cli.sweep_interval_ms.max(1)),
        })
    }
}

/// Expande patrones glob en orden. Un patrón sin coincidencias se deja
/// literal: su tarea fallará y se reintentará como cualquier otra.
pub fn expand_inputs(patterns: &[String]) -> Result<Vec<String>> {
    let mut files = Vec::new();

    for pattern in patterns {
        let mut matched = Vec::new();
        for entry in glob(pattern).with_context(|| format!("patrón inválido: {pattern}"))? {
            let path = entry.with_context(|| format!("no se pudo leer {pattern}"))?;
            if path.is_file() {
                matched.push(path.to_string_lossy().to_string());
            }
        }

        if matched.is_empty() {
            warn!("{} no coincide con ningún archivo, se usa tal cual", pattern);
            files.push(pattern.clone());
        } else {
            files.extend(matched);
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn cli_parses_flags_and_inputs() {
        let cli = Cli::try_parse_from([
            "coordinator",
            "--reduce",
            "3",
            "--timeout-secs",
            "4",
            "--listen",
            "127.0.0.1:9999",
            "a.txt",
            "b.txt",
        ])
        .unwrap();

        let cfg = CoordinatorConfig::from_cli(cli).unwrap();
        assert_eq!(cfg.reduce_partitions, 3);
        assert_eq!(cfg.task_timeout, Duration::from_secs(4));
        assert_eq!(cfg.sweep_interval, DEFAULT_SWEEP_INTERVAL);
        assert_eq!(cfg.listen.port(), 9999);
        assert_eq!(cfg.input_files, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn zero_reduce_partitions_is_rejected() {
        let cli = Cli::try_parse_from(["coordinator", "-r", "0", "--listen", "127.0.0.1:1", "a.txt"]).unwrap();
        assert!(CoordinatorConfig::from_cli(cli).is_err());
    }

    #[test]
    fn zero_task_timeout_is_rejected() {
        let cli = Cli::try_parse_from([
            "coordinator",
            "--timeout-secs",
            "0",
            "--listen",
            "127.0.0.1:1",
            "a.txt",
        ])
        .unwrap();
        assert!(CoordinatorConfig::from_cli(cli).is_err());
    }

    #[test]
    fn inputs_are_required() {
        assert!(Cli::try_parse_from(["coordinator", "-r", "2"]).is_err());
    }

    #[test]
    fn expand_inputs_resolves_globs_in_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["pg-b.txt", "pg-a.txt", "otro.csv"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        let pattern = dir.path().join("pg-*.txt").to_string_lossy().to_string();
        let literal = dir.path().join("no-existe.txt").to_string_lossy().to_string();

        let files = expand_inputs(&[pattern, literal.clone()]).unwrap();

        assert_eq!(files.len(), 3);
        assert!(files[0].ends_with("pg-a.txt"));
        assert!(files[1].ends_with("pg-b.txt"));
        assert_eq!(files[2], literal);
    }
}
