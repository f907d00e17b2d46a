//! Nombres canónicos de archivos. Deben coincidir exactamente entre
//! workers y coordinadores compilados por separado.

use crate::task::TaskId;

/// Archivo intermedio de la tarea map `m` para la partición `r`: `mr-<m>-<r>`.
pub fn intermediate_file_name(map_id: TaskId, reduce_id: TaskId) -> String {
    format!("mr-{}-{}", map_id, reduce_id)
}

/// Salida final de la tarea reduce `r`: `mr-out-<r>`.
pub fn output_file_name(reduce_id: TaskId) -> String {
    format!("mr-out-{}", reduce_id)
}
