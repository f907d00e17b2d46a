use std::{
    sync::{Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use common::{AssignmentKind, JobStatusView, OutcomeKind, Phase, TaskAssignment, TaskId, TaskStatus};
use tracing::{debug, info, warn};

use crate::registry::{claim_next, count_by_status, reclaim_stale, Lease, Registry};

/// Dueño del registro. Pedidos, reportes, barrido de timeouts y la vista de
/// estado toman el mismo lock exclusivo y lo sueltan antes de volver; nada
/// hace I/O ni `.await` con el lock tomado.
#[derive(Debug)]
pub struct Scheduler {
    inner: Mutex<Inner>,
    started_at: DateTime<Utc>,
}

#[derive(Debug)]
struct Inner {
    registry: Registry,
    failure_reports: u64,
}

impl Scheduler {
    pub fn new(input_files: Vec<String>, reduce_partition_count: u32, task_timeout: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                registry: Registry::new(input_files, reduce_partition_count, task_timeout),
                failure_reports: 0,
            }),
            started_at: Utc::now(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // un panic con el lock tomado no deja el registro a medio escribir
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn request_task(&self) -> TaskAssignment {
        self.request_task_at(Instant::now())
    }

    /// Asigna la primera tarea idle (o con lease vencido) de la fase activa.
    pub fn request_task_at(&self, now: Instant) -> TaskAssignment {
        let (assignment, just_completed) = {
            let mut inner = self.lock();
            let reg = &mut inner.registry;
            claim_assignment(reg, now)
        };

        // se loguea ya sin el lock
        match assignment.kind {
            AssignmentKind::AssignMap => info!(
                "asignando tarea map {} (input={})",
                assignment.task_id,
                assignment.input_file.as_deref().unwrap_or_default()
            ),
            AssignmentKind::AssignReduce => info!("asignando tarea reduce {}", assignment.task_id),
            AssignmentKind::End if just_completed => {
                info!("todas las tareas terminaron, avisando fin a los workers")
            }
            _ => {}
        }
        assignment
    }

    /// Registra el resultado de una tarea.
    ///
    /// Sólo un éxito sobre una tarea `Running` la pasa a `Finished`. Los
    /// reportes de tareas ya reasignadas, terminadas o desconocidas se
    /// ignoran, y los fallos no cambian el registro: el timeout se encarga.
    pub fn report_outcome(&self, task_id: TaskId, outcome: OutcomeKind) {
        let phase = outcome.phase();

        if !outcome.is_success() {
            self.lock().failure_reports += 1;
            warn!(
                "worker reportó fallo en tarea {} {}; se reintentará al vencer el lease",
                phase, task_id
            );
            return;
        }

        let (transitioned, phase_complete) = {
            let mut inner = self.lock();
            let reg = &mut inner.registry;
            finish_task(reg, phase, task_id)
        };

        match transitioned {
            Some(true) => debug!("tarea {} {} terminada", phase, task_id),
            Some(false) => debug!(
                "ignorando reporte tardío de tarea {} {} (no está en curso)",
                phase, task_id
            ),
            None => warn!("reporte de tarea {} {} desconocida", phase, task_id),
        }
        if phase_complete && transitioned == Some(true) {
            info!("fase {} completa", phase);
        }
    }

    /// `true` recién después del primer `request_task` que devuelve `End`.
    pub fn is_complete(&self) -> bool {
        self.lock().registry.all_complete
    }

    pub fn sweep(&self) -> Vec<(Phase, TaskId)> {
        self.sweep_at(Instant::now())
    }

    /// Una pasada del barrido: vuelve a `Idle` las tareas `Running` de la
    /// fase activa cuyo lease venció.
    pub fn sweep_at(&self, now: Instant) -> Vec<(Phase, TaskId)> {
        let mut inner = self.lock();
        let reg = &mut inner.registry;
        let timeout = reg.task_timeout;

        if !reg.map_phase_complete {
            reclaim_stale(reg.map_tasks.values_mut(), now, timeout)
                .into_iter()
                .map(|id| (Phase::Map, id))
                .collect()
        } else if !reg.reduce_phase_complete {
            reclaim_stale(reg.reduce_tasks.values_mut(), now, timeout)
                .into_iter()
                .map(|id| (Phase::Reduce, id))
                .collect()
        } else {
            Vec::new()
        }
    }

    pub fn status(&self) -> JobStatusView {
        let inner = self.lock();
        let reg = &inner.registry;

        JobStatusView {
            started_at: self.started_at,
            map: count_by_status(reg.map_tasks.values()),
            reduce: count_by_status(reg.reduce_tasks.values()),
            map_phase_complete: reg.map_phase_complete,
            reduce_phase_complete: reg.reduce_phase_complete,
            all_complete: reg.all_complete,
            reduce_partition_count: reg.reduce_partition_count,
            task_timeout_secs: reg.task_timeout.as_secs(),
            failure_reports: inner.failure_reports,
        }
    }
}

fn claim_assignment(reg: &mut Registry, now: Instant) -> (TaskAssignment, bool) {
    let timeout = reg.task_timeout;
    let r = reg.reduce_partition_count;
    let m = reg.map_task_count();

    if !reg.map_phase_complete {
        let assignment = match claim_next(reg.map_tasks.values_mut(), now, timeout) {
            Some(task) => TaskAssignment::assign_map(task.id, task.input_file.clone(), r, m),
            None => TaskAssignment::wait(r, m),
        };
        return (assignment, false);
    }

    if !reg.reduce_phase_complete {
        let assignment = match claim_next(reg.reduce_tasks.values_mut(), now, timeout) {
            Some(task) => TaskAssignment::assign_reduce(task.id, r, m),
            None => TaskAssignment::wait(r, m),
        };
        return (assignment, false);
    }

    let just_completed = !reg.all_complete;
    reg.all_complete = true;
    (TaskAssignment::end(r, m), just_completed)
}

/// Pasa a `Finished` la tarea si está en curso y recalcula el flag de su
/// fase. Devuelve `(transición, fase completa)`; `None` si el id no existe.
fn finish_task(reg: &mut Registry, phase: Phase, task_id: TaskId) -> (Option<bool>, bool) {
    match phase {
        Phase::Map => {
            let transitioned = reg.map_tasks.get_mut(&task_id).map(finish_if_running);
            reg.map_phase_complete = reg.all_maps_finished();
            (transitioned, reg.map_phase_complete)
        }
        Phase::Reduce => {
            let transitioned = reg.reduce_tasks.get_mut(&task_id).map(finish_if_running);
            reg.reduce_phase_complete = reg.map_phase_complete && reg.all_reduces_finished();
            (transitioned, reg.reduce_phase_complete)
        }
    }
}

fn finish_if_running<R: Lease>(record: &mut R) -> bool {
    if record.status() == TaskStatus::Running {
        record.set_finished();
        true
    } else {
        false
    }
}
