use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{Phase, TaskId};

/* --------- Worker -> coordinador --------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestKind {
    RequestTask,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRequest {
    pub kind: RequestKind,
}

impl TaskRequest {
    pub fn new() -> Self {
        Self {
            kind: RequestKind::RequestTask,
        }
    }
}

impl Default for TaskRequest {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeKind {
    MapDone,
    MapFailed,
    ReduceDone,
    ReduceFailed,
}

impl OutcomeKind {
    pub fn for_result(phase: Phase, success: bool) -> Self {
        match (phase, success) {
            (Phase::Map, true) => OutcomeKind::MapDone,
            (Phase::Map, false) => OutcomeKind::MapFailed,
            (Phase::Reduce, true) => OutcomeKind::ReduceDone,
            (Phase::Reduce, false) => OutcomeKind::ReduceFailed,
        }
    }

    pub fn phase(self) -> Phase {
        match self {
            OutcomeKind::MapDone | OutcomeKind::MapFailed => Phase::Map,
            OutcomeKind::ReduceDone | OutcomeKind::ReduceFailed => Phase::Reduce,
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, OutcomeKind::MapDone | OutcomeKind::ReduceDone)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeReport {
    pub kind: OutcomeKind,
    pub task_id: TaskId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportAck {
    pub ok: bool,
}

/* --------- Coordinador -> worker --------- */

/// Directiva devuelta a un `RequestTask`.
///
/// `Unknown` recoge cualquier valor que este worker no conozca (p.ej. un
/// coordinador más nuevo); el worker lo registra y sigue pidiendo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentKind {
    AssignMap,
    AssignReduce,
    Wait,
    End,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAssignment {
    pub kind: AssignmentKind,
    #[serde(default)]
    pub task_id: TaskId,
    /// Sólo presente en asignaciones map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_file: Option<String>,
    #[serde(default)]
    pub reduce_partition_count: u32,
    /// Número de tareas map; un reduce lo usa para enumerar `mr-<m>-<r>`.
    /// Sin él un `ASSIGN_REDUCE` es inválido, no "cero archivos".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_task_count: Option<u32>,
}

impl TaskAssignment {
    pub fn assign_map(
        task_id: TaskId,
        input_file: String,
        reduce_partition_count: u32,
        map_task_count: u32,
    ) -> Self {
        Self {
            kind: AssignmentKind::AssignMap,
            task_id,
            input_file: Some(input_file),
            reduce_partition_count,
            map_task_count: Some(map_task_count),
        }
    }

    pub fn assign_reduce(task_id: TaskId, reduce_partition_count: u32, map_task_count: u32) -> Self {
        Self {
            kind: AssignmentKind::AssignReduce,
            task_id,
            input_file: None,
            reduce_partition_count,
            map_task_count: Some(map_task_count),
        }
    }

    pub fn wait(reduce_partition_count: u32, map_task_count: u32) -> Self {
        Self::directive(AssignmentKind::Wait, reduce_partition_count, map_task_count)
    }

    pub fn end(reduce_partition_count: u32, map_task_count: u32) -> Self {
        Self::directive(AssignmentKind::End, reduce_partition_count, map_task_count)
    }

    fn directive(kind: AssignmentKind, reduce_partition_count: u32, map_task_count: u32) -> Self {
        Self {
            kind,
            task_id: 0,
            input_file: None,
            reduce_partition_count,
            map_task_count: Some(map_task_count),
        }
    }
}

/* --------- Vista de estado (operador) --------- */

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseCounts {
    pub total: u32,
    pub idle: u32,
    pub running: u32,
    pub finished: u32,
    pub failed: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusView {
    pub started_at: DateTime<Utc>,
    pub map: PhaseCounts,
    pub reduce: PhaseCounts,
    pub map_phase_complete: bool,
    pub reduce_phase_complete: bool,
    pub all_complete: bool,
    pub reduce_partition_count: u32,
    pub task_timeout_secs: u64,
    /// Reportes `*_FAILED` recibidos (sólo informativo, no cambian el registro).
    pub failure_reports: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn assignment_kinds_use_screaming_snake_case() {
        let a = TaskAssignment::assign_map(3, "pg-a.txt".into(), 5, 8);
        let v = serde_json::to_value(&a).unwrap();
        assert_eq!(v["kind"], json!("ASSIGN_MAP"));
        assert_eq!(v["input_file"], json!("pg-a.txt"));
        assert_eq!(v["reduce_partition_count"], json!(5));

        let w = serde_json::to_value(TaskAssignment::wait(5, 8)).unwrap();
        assert_eq!(w["kind"], json!("WAIT"));
        assert!(w.get("input_file").is_none());
    }

    #[test]
    fn unknown_directive_decodes_as_unknown() {
        let raw = r#"{"kind":"PAUSE","task_id":0,"reduce_partition_count":2}"#;
        let a: TaskAssignment = serde_json::from_str(raw).unwrap();
        assert_eq!(a.kind, AssignmentKind::Unknown);
        assert_eq!(a.map_task_count, None);
    }

    #[test]
    fn reduce_assignment_without_map_count_decodes_as_none() {
        let raw = r#"{"kind":"ASSIGN_REDUCE","task_id":1,"reduce_partition_count":3}"#;
        let a: TaskAssignment = serde_json::from_str(raw).unwrap();
        assert_eq!(a.kind, AssignmentKind::AssignReduce);
        assert_eq!(a.map_task_count, None);

        let v = serde_json::to_value(TaskAssignment::assign_reduce(1, 3, 0)).unwrap();
        assert_eq!(v["map_task_count"], json!(0));
    }

    #[test]
    fn outcome_kind_maps_phase_and_success() {
        assert_eq!(OutcomeKind::for_result(Phase::Map, true), OutcomeKind::MapDone);
        assert_eq!(OutcomeKind::for_result(Phase::Reduce, false), OutcomeKind::ReduceFailed);
        assert_eq!(OutcomeKind::ReduceDone.phase(), Phase::Reduce);
        assert!(!OutcomeKind::MapFailed.is_success());

        let r: OutcomeReport = serde_json::from_value(json!({"kind": "MAP_DONE", "task_id": 1})).unwrap();
        assert_eq!(r.kind, OutcomeKind::MapDone);
    }
}
