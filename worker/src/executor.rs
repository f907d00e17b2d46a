use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use common::{
    config::DEFAULT_WAIT_BACKOFF, AssignmentKind, MapReduceApp, OutcomeKind, OutcomeReport, Phase,
    TaskAssignment, TaskId,
};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{LinkError, TaskError};
use crate::map_task::run_map_task;
use crate::reduce_task::run_reduce_task;

/// Las dos llamadas que el worker hace al coordinador.
#[async_trait]
pub trait CoordinatorLink: Send + Sync {
    async fn request_task(&self) -> Result<TaskAssignment, LinkError>;

    async fn report(&self, report: OutcomeReport) -> Result<(), LinkError>;
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Directorio donde se escriben `mr-<m>-<r>` y `mr-out-<r>`.
    pub work_dir: PathBuf,
    /// Espera tras un `WAIT`.
    pub wait_backoff: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            wait_backoff: DEFAULT_WAIT_BACKOFF,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub maps_done: u32,
    pub maps_failed: u32,
    pub reduces_done: u32,
    pub reduces_failed: u32,
    pub waits: u32,
    pub unknown_directives: u32,
}

/// Loop principal del worker: pide, ejecuta, reporta; una tarea a la vez.
///
/// - `END` o una llamada que falla a mitad de camino terminan con `Ok`.
/// - Si no se puede conectar al coordinador termina con `Err`.
pub async fn run<L>(link: &L, app: Arc<dyn MapReduceApp>, config: &WorkerConfig) -> Result<RunStats, LinkError>
where
    L: CoordinatorLink + ?Sized,
{
    let mut stats = RunStats::default();

    loop {
        let assignment = match link.request_task().await {
            Ok(a) => a,
            Err(e @ LinkError::Unreachable(_)) => return Err(e),
            Err(e) => {
                warn!("no llegó tarea ({}), terminando", e);
                return Ok(stats);
            }
        };

        match assignment.kind {
            AssignmentKind::AssignMap => {
                let ok = execute(Phase::Map, &assignment, app.clone(), &config.work_dir).await;
                if ok {
                    stats.maps_done += 1;
                } else {
                    stats.maps_failed += 1;
                }
                report(link, Phase::Map, assignment.task_id, ok).await;
            }
            AssignmentKind::AssignReduce => {
                let ok = execute(Phase::Reduce, &assignment, app.clone(), &config.work_dir).await;
                if ok {
                    stats.reduces_done += 1;
                } else {
                    stats.reduces_failed += 1;
                }
                report(link, Phase::Reduce, assignment.task_id, ok).await;
            }
            AssignmentKind::Wait => {
                stats.waits += 1;
                sleep(config.wait_backoff).await;
            }
            AssignmentKind::End => {
                info!("el coordinador avisó fin del job, saliendo");
                return Ok(stats);
            }
            AssignmentKind::Unknown => {
                stats.unknown_directives += 1;
                warn!("directiva desconocida del coordinador: {:?}", assignment);
            }
        }
    }
}

/// Corre la tarea en un hilo de bloqueo. Devuelve si terminó bien.
async fn execute(phase: Phase, assignment: &TaskAssignment, app: Arc<dyn MapReduceApp>, work_dir: &Path) -> bool {
    let task_id = assignment.task_id;
    let work_dir = work_dir.to_path_buf();
    let input_file = assignment.input_file.clone();
    let num_partitions = assignment.reduce_partition_count;
    let map_task_count = assignment.map_task_count;

    info!("tengo tarea {} {}", phase, task_id);

    let handle = tokio::task::spawn_blocking(move || -> Result<(), TaskError> {
        match phase {
            Phase::Map => {
                let input = input_file.ok_or_else(|| {
                    TaskError::InvalidAssignment(format!("tarea map {task_id} sin archivo de entrada"))
                })?;
                run_map_task(app.as_ref(), &work_dir, task_id, &input, num_partitions)
            }
            Phase::Reduce => {
                let map_task_count = map_task_count.ok_or_else(|| {
                    TaskError::InvalidAssignment(format!("tarea reduce {task_id} sin cantidad de tareas map"))
                })?;
                run_reduce_task(app.as_ref(), &work_dir, task_id, map_task_count).map(|_| ())
            }
        }
    });

    let result = match handle.await {
        Ok(res) => res,
        // panic dentro de map/reduce del usuario
        Err(e) => Err(TaskError::UserFunction(e.to_string())),
    };

    match result {
        Ok(()) => {
            info!("terminé tarea {} {} correctamente", phase, task_id);
            true
        }
        Err(e) => {
            warn!("error procesando tarea {} {}: {}", phase, task_id, e);
            false
        }
    }
}

async fn report<L>(link: &L, phase: Phase, task_id: TaskId, success: bool)
where
    L: CoordinatorLink + ?Sized,
{
    let kind = OutcomeKind::for_result(phase, success);
    if let Err(e) = link.report(OutcomeReport { kind, task_id }).await {
        warn!("no se pudo reportar {:?} de la tarea {}: {}", kind, task_id, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{wordcount::WordCount, KeyValue};
    use std::{collections::VecDeque, fs, sync::Mutex};

    /// Coordinador de mentira: devuelve respuestas encoladas y guarda reportes.
    struct ScriptedLink {
        replies: Mutex<VecDeque<Result<TaskAssignment, LinkError>>>,
        reports: Mutex<Vec<OutcomeReport>>,
    }

    impl ScriptedLink {
        fn new(replies: Vec<Result<TaskAssignment, LinkError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                reports: Mutex::new(Vec::new()),
            }
        }

        fn reports(&self) -> Vec<(OutcomeKind, TaskId)> {
            self.reports.lock().unwrap().iter().map(|r| (r.kind, r.task_id)).collect()
        }
    }

    #[async_trait]
    impl CoordinatorLink for ScriptedLink {
        async fn request_task(&self) -> Result<TaskAssignment, LinkError> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(TaskAssignment::end(1, 1)))
        }

        async fn report(&self, report: OutcomeReport) -> Result<(), LinkError> {
            self.reports.lock().unwrap().push(report);
            Ok(())
        }
    }

    struct Panicky;

    impl MapReduceApp for Panicky {
        fn name(&self) -> &'static str {
            "panicky"
        }

        fn map(&self, _filename: &str, _contents: &str) -> Vec<KeyValue> {
            panic!("map roto");
        }

        fn reduce(&self, _key: &str, _values: &[String]) -> String {
            unreachable!()
        }
    }

    fn config(dir: &Path) -> WorkerConfig {
        WorkerConfig {
            work_dir: dir.to_path_buf(),
            wait_backoff: Duration::from_millis(1),
        }
    }

    fn unknown() -> TaskAssignment {
        serde_json::from_str(r#"{"kind":"PAUSE"}"#).unwrap()
    }

    #[tokio::test]
    async fn runs_map_then_reduce_and_reports_each() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        fs::write(&input, "b a b").unwrap();

        let link = ScriptedLink::new(vec![
            Ok(TaskAssignment::wait(1, 1)),
            Ok(TaskAssignment::assign_map(0, input.to_string_lossy().to_string(), 1, 1)),
            Ok(TaskAssignment::assign_reduce(0, 1, 1)),
            Ok(TaskAssignment::end(1, 1)),
        ]);

        let stats = run(&link, Arc::new(WordCount), &config(dir.path())).await.unwrap();

        assert_eq!(stats.maps_done, 1);
        assert_eq!(stats.reduces_done, 1);
        assert_eq!(stats.waits, 1);
        assert_eq!(
            link.reports(),
            vec![(OutcomeKind::MapDone, 0), (OutcomeKind::ReduceDone, 0)]
        );
        assert_eq!(fs::read_to_string(dir.path().join("mr-out-0")).unwrap(), "a 1\nb 2\n");
    }

    #[tokio::test]
    async fn failures_are_reported_and_the_loop_continues() {
        let dir = tempfile::tempdir().unwrap();
        let link = ScriptedLink::new(vec![
            Ok(TaskAssignment::assign_map(3, "no-existe.txt".to_string(), 2, 4)),
            Ok(TaskAssignment {
                input_file: None,
                ..TaskAssignment::assign_map(4, String::new(), 2, 4)
            }),
            Ok(TaskAssignment::end(2, 4)),
        ]);

        let stats = run(&link, Arc::new(WordCount), &config(dir.path())).await.unwrap();

        assert_eq!(stats.maps_failed, 2);
        assert_eq!(
            link.reports(),
            vec![(OutcomeKind::MapFailed, 3), (OutcomeKind::MapFailed, 4)]
        );
    }

    #[tokio::test]
    async fn reduce_without_map_count_fails_instead_of_writing_nothing() {
        let dir = tempfile::tempdir().unwrap();
        crate::commit::write_intermediate(dir.path(), 0, 1, &[KeyValue::new("hola", "1")]).unwrap();
        let legacy: TaskAssignment =
            serde_json::from_str(r#"{"kind":"ASSIGN_REDUCE","task_id":1,"reduce_partition_count":3}"#).unwrap();
        let link = ScriptedLink::new(vec![Ok(legacy), Ok(TaskAssignment::end(3, 1))]);

        let stats = run(&link, Arc::new(WordCount), &config(dir.path())).await.unwrap();

        assert_eq!(stats.reduces_failed, 1);
        assert_eq!(stats.reduces_done, 0);
        assert_eq!(link.reports(), vec![(OutcomeKind::ReduceFailed, 1)]);
        assert!(!dir.path().join("mr-out-1").exists());
    }

    #[tokio::test]
    async fn panicking_user_function_is_a_task_failure() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        fs::write(&input, "x").unwrap();
        let link = ScriptedLink::new(vec![Ok(TaskAssignment::assign_map(
            0,
            input.to_string_lossy().to_string(),
            1,
            1,
        ))]);

        let stats = run(&link, Arc::new(Panicky), &config(dir.path())).await.unwrap();

        assert_eq!(stats.maps_failed, 1);
        assert_eq!(link.reports(), vec![(OutcomeKind::MapFailed, 0)]);
    }

    #[tokio::test]
    async fn unknown_directives_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let link = ScriptedLink::new(vec![Ok(unknown()), Ok(unknown()), Ok(TaskAssignment::end(1, 1))]);

        let stats = run(&link, Arc::new(WordCount), &config(dir.path())).await.unwrap();

        assert_eq!(stats.unknown_directives, 2);
        assert!(link.reports().is_empty());
    }

    #[tokio::test]
    async fn unreachable_coordinator_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let link = ScriptedLink::new(vec![Err(LinkError::Unreachable("connection refused".into()))]);

        let res = run(&link, Arc::new(WordCount), &config(dir.path())).await;

        assert!(matches!(res, Err(LinkError::Unreachable(_))));
    }

    #[tokio::test]
    async fn mid_call_failure_ends_gracefully() {
        let dir = tempfile::tempdir().unwrap();
        let link = ScriptedLink::new(vec![
            Ok(TaskAssignment::wait(1, 1)),
            Err(LinkError::CallFailed("respuesta cortada".into())),
            Ok(TaskAssignment::assign_reduce(0, 1, 1)),
        ]);

        let stats = run(&link, Arc::new(WordCount), &config(dir.path())).await.unwrap();

        assert_eq!(stats.waits, 1);
        assert_eq!(stats.reduces_done, 0);
        assert!(link.reports().is_empty());
    }
}
