use serde::{Deserialize, Serialize};

/// Id de tarea dentro de una fase: 0..N-1 para map, 0..R-1 para reduce.
pub type TaskId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Map,
    Reduce,
}

/// Estado de una tarea en el registro del coordinador.
///
/// `Failed` existe en el modelo pero el scheduler nunca lo asigna: la
/// recuperación de fallos pasa sólo por el timeout del lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Idle,
    Running,
    Finished,
    Failed,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Map => write!(f, "map"),
            Phase::Reduce => write!(f, "reduce"),
        }
    }
}
