use std::{io, path::PathBuf};

use thiserror::Error;

/// Fallo al ejecutar una tarea. Cualquiera de estos se reporta como
/// `*_FAILED` y el worker sigue pidiendo trabajo.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("error de E/S en {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("registro intermedio inválido en {path} (línea {line}): {source}")]
    Decode {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("asignación inválida: {0}")]
    InvalidAssignment(String),

    #[error("la función de usuario falló: {0}")]
    UserFunction(String),
}

impl TaskError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        TaskError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Fallo hablando con el coordinador.
#[derive(Debug, Error)]
pub enum LinkError {
    /// No se pudo ni conectar: el coordinador no está (o ya terminó).
    #[error("coordinador inalcanzable: {0}")]
    Unreachable(String),

    /// La conexión se estableció pero la llamada falló a mitad de camino.
    #[error("llamada al coordinador fallida: {0}")]
    CallFailed(String),
}
