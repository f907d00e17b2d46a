use std::path::{Path, PathBuf};

use common::{KeyValue, MapReduceApp, TaskId};
use tracing::debug;

use crate::commit::{read_intermediate, write_output};
use crate::error::TaskError;

/// Ejecuta la tarea reduce `task_id`: junta `mr-<m>-<task_id>` para toda
/// tarea map, ordena por clave, aplica `reduce` por clave y confirma
/// `mr-out-<task_id>`.
///
/// Devuelve `None` si no había ningún dato: es un éxito y no se crea salida.
pub fn run_reduce_task(
    app: &dyn MapReduceApp,
    work_dir: &Path,
    task_id: TaskId,
    map_task_count: u32,
) -> Result<Option<PathBuf>, TaskError> {
    let mut records: Vec<KeyValue> = Vec::new();
    for map_id in 0..map_task_count {
        // un archivo faltante es una partición que no aportó nada
        if let Some(mut recs) = read_intermediate(work_dir, map_id, task_id)? {
            records.append(&mut recs);
        }
    }

    if records.is_empty() {
        debug!("reduce {} sin datos intermedios, no hay salida", task_id);
        return Ok(None);
    }

    records.sort_by(|a, b| a.key.cmp(&b.key));

    let mut lines: Vec<(String, String)> = Vec::new();
    for group in records.chunk_by(|a, b| a.key == b.key) {
        let key = &group[0].key;
        let values: Vec<String> = group.iter().map(|kv| kv.value.clone()).collect();
        lines.push((key.clone(), app.reduce(key, &values)));
    }

    debug!("reduce {}: {} claves de {} registros", task_id, lines.len(), records.len());
    write_output(work_dir, task_id, &lines).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::write_intermediate;
    use common::{indexer::Indexer, wordcount::WordCount};
    use std::fs;

    #[test]
    fn no_intermediate_files_is_success_without_output() {
        let dir = tempfile::tempdir().unwrap();

        let out = run_reduce_task(&WordCount, dir.path(), 0, 4).unwrap();

        assert_eq!(out, None);
        assert!(!dir.path().join("mr-out-0").exists());
    }

    #[test]
    fn groups_sorted_keys_across_map_outputs() {
        let dir = tempfile::tempdir().unwrap();
        write_intermediate(
            dir.path(),
            0,
            1,
            &[KeyValue::new("mundo", "1"), KeyValue::new("hola", "1")],
        )
        .unwrap();
        // mr-1-1 no existe: se salta
        write_intermediate(
            dir.path(),
            2,
            1,
            &[KeyValue::new("hola", "1"), KeyValue::new("adios", "1")],
        )
        .unwrap();
        // otra partición, no se lee
        write_intermediate(dir.path(), 0, 0, &[KeyValue::new("zzz", "1")]).unwrap();

        let out = run_reduce_task(&WordCount, dir.path(), 1, 3).unwrap().unwrap();

        assert!(out.ends_with("mr-out-1"));
        assert_eq!(fs::read_to_string(out).unwrap(), "adios 1\nhola 2\nmundo 1\n");
    }

    #[test]
    fn empty_intermediate_files_produce_no_output() {
        let dir = tempfile::tempdir().unwrap();
        write_intermediate(dir.path(), 0, 0, &[]).unwrap();
        write_intermediate(dir.path(), 1, 0, &[]).unwrap();

        assert_eq!(run_reduce_task(&WordCount, dir.path(), 0, 2).unwrap(), None);
    }

    #[test]
    fn reduce_receives_every_value_for_a_key() {
        let dir = tempfile::tempdir().unwrap();
        write_intermediate(dir.path(), 0, 0, &[KeyValue::new("uno", "doc-b")]).unwrap();
        write_intermediate(dir.path(), 1, 0, &[KeyValue::new("uno", "doc-a")]).unwrap();

        let out = run_reduce_task(&Indexer, dir.path(), 0, 2).unwrap().unwrap();

        assert_eq!(fs::read_to_string(out).unwrap(), "uno 2 doc-a,doc-b\n");
    }

    #[test]
    fn unreadable_intermediate_fails_the_task() {
        let dir = tempfile::tempdir().unwrap();
        // un directorio con el nombre del archivo: abrirlo funciona, leerlo no
        fs::create_dir(dir.path().join("mr-0-0")).unwrap();

        assert!(run_reduce_task(&WordCount, dir.path(), 0, 1).is_err());
        assert!(!dir.path().join("mr-out-0").exists());
    }
}
