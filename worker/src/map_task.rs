use std::{fs, path::Path};

use common::{MapReduceApp, TaskId};
use tracing::debug;

use crate::commit::{partition, write_intermediate};
use crate::error::TaskError;

/// Ejecuta la tarea map `task_id` sobre `input_file`.
///
/// Escribe los `num_partitions` buckets (también los vacíos) como
/// `mr-<task_id>-<r>` en `work_dir`. Cada bucket se confirma por separado;
/// si falla uno, los anteriores quedan escritos y la reejecución los pisa.
pub fn run_map_task(
    app: &dyn MapReduceApp,
    work_dir: &Path,
    task_id: TaskId,
    input_file: &str,
    num_partitions: u32,
) -> Result<(), TaskError> {
    if num_partitions == 0 {
        return Err(TaskError::InvalidAssignment(format!(
            "tarea map {task_id} sin particiones reduce"
        )));
    }

    let bytes = fs::read(input_file).map_err(|e| TaskError::io(input_file, e))?;
    // bytes inválidos quedan como U+FFFD
    let contents = String::from_utf8_lossy(&bytes);

    let pairs = app.map(input_file, &contents);
    debug!("map {} emitió {} pares desde {}", task_id, pairs.len(), input_file);

    for (reduce_id, bucket) in partition(pairs, num_partitions).iter().enumerate() {
        write_intermediate(work_dir, task_id, reduce_id as TaskId, bucket)?;
    }

    Ok(())
}
