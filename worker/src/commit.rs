//! Particionado determinista y escritura atómica (temporal + rename) de
//! archivos intermedios y de salida.

use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use common::{intermediate_file_name, output_file_name, KeyValue, TaskId};

use crate::error::TaskError;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Hash de clave compartido por todos los workers: FNV-1a de 32 bits sobre
/// los bytes UTF-8, con el bit alto en cero.
///
/// No usar `DefaultHasher`: su salida puede cambiar entre versiones de Rust
/// y la partición de cada clave tiene que ser la misma en toda máquina.
pub fn ihash(key: &str) -> u32 {
    let mut h = FNV_OFFSET_BASIS;
    for b in key.as_bytes() {
        h ^= u32::from(*b);
        h = h.wrapping_mul(FNV_PRIME);
    }
    h & 0x7fff_ffff
}

pub fn partition_for(key: &str, num_partitions: u32) -> u32 {
    ihash(key) % num_partitions
}

/// Reparte los pares en `num_partitions` buckets según `ihash(key) % n`.
/// Siempre devuelve `num_partitions` buckets, aunque queden vacíos.
pub fn partition(pairs: Vec<KeyValue>, num_partitions: u32) -> Vec<Vec<KeyValue>> {
    let mut buckets: Vec<Vec<KeyValue>> = (0..num_partitions).map(|_| Vec::new()).collect();
    for kv in pairs {
        let pid = partition_for(&kv.key, num_partitions) as usize;
        buckets[pid].push(kv);
    }
    buckets
}

/// Escribe `final_name` dentro de `dir` sin que nadie pueda ver el archivo a
/// medio escribir: primero a un temporal único en el mismo directorio,
/// después `rename`. Si algo falla antes del rename el temporal se borra y
/// el archivo final (si existía) queda intacto.
pub fn write_atomically<F>(dir: &Path, final_name: &str, write: F) -> Result<PathBuf, TaskError>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let target = dir.join(final_name);
    let io_err = |source: io::Error| TaskError::io(&target, source);

    let mut tmp = tempfile::Builder::new()
        .prefix(&format!("{final_name}.tmp-"))
        .tempfile_in(dir)
        .map_err(io_err)?;

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write(&mut writer).map_err(io_err)?;
        writer.flush().map_err(io_err)?;
    }
    tmp.as_file().sync_all().map_err(io_err)?;

    // el rename es el punto de commit
    tmp.persist(&target).map_err(|e| io_err(e.error))?;
    Ok(target)
}

/// Commit de un bucket map como `mr-<m>-<r>`, un registro JSON por línea.
pub fn write_intermediate(
    dir: &Path,
    map_id: TaskId,
    reduce_id: TaskId,
    records: &[KeyValue],
) -> Result<PathBuf, TaskError> {
    let name = intermediate_file_name(map_id, reduce_id);
    write_atomically(dir, &name, |w| {
        for kv in records {
            serde_json::to_writer(&mut *w, kv)?;
            w.write_all(b"\n")?;
        }
        Ok(())
    })
}

/// Lee `mr-<m>-<r>`. `None` si el archivo no existe: esa tarea map no
/// aportó nada a la partición.
pub fn read_intermediate(
    dir: &Path,
    map_id: TaskId,
    reduce_id: TaskId,
) -> Result<Option<Vec<KeyValue>>, TaskError> {
    let path = dir.join(intermediate_file_name(map_id, reduce_id));
    let file = match File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(TaskError::io(path, e)),
    };

    let mut out = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| TaskError::io(&path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let kv: KeyValue = serde_json::from_str(&line).map_err(|source| TaskError::Decode {
            path: path.clone(),
            line: idx + 1,
            source,
        })?;
        out.push(kv);
    }

    Ok(Some(out))
}

/// Commit de `mr-out-<r>`: una línea `clave valor` por clave, en el orden dado.
pub fn write_output(dir: &Path, reduce_id: TaskId, lines: &[(String, String)]) -> Result<PathBuf, TaskError> {
    let name = output_file_name(reduce_id);
    write_atomically(dir, &name, |w| {
        for (key, value) in lines {
            writeln!(w, "{} {}", key, value)?;
        }
        Ok(())
    })
}
