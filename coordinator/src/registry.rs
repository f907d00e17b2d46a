// coordinator/src/registry.rs

use common::{PhaseCounts, TaskId, TaskStatus};
use std::{
    collections::BTreeMap,
    time::{Duration, Instant},
};

#[derive(Debug, Clone)]
pub struct MapTaskRecord {
    pub id: TaskId,
    pub status: TaskStatus,
    /// Inicio del lease actual; sólo tiene sentido mientras está `Running`.
    pub start_time: Option<Instant>,
    pub input_file: String,
}

#[derive(Debug, Clone)]
pub struct ReduceTaskRecord {
    pub id: TaskId,
    pub status: TaskStatus,
    pub start_time: Option<Instant>,
}

/// Acceso común a los dos tipos de registro, para que el scan de
/// asignación y el de timeouts sean el mismo código en ambas fases.
pub trait Lease {
    fn id(&self) -> TaskId;
    fn status(&self) -> TaskStatus;
    fn start_time(&self) -> Option<Instant>;
    fn set_running(&mut self, now: Instant);
    fn reset_idle(&mut self);
    fn set_finished(&mut self);

    /// `Running` con el lease vencido.
    fn is_stale(&self, now: Instant, timeout: Duration) -> bool {
        self.status() == TaskStatus::Running
            && self
                .start_time()
                .map_or(true, |t| now.saturating_duration_since(t) > timeout)
    }

    fn is_assignable(&self, now: Instant, timeout: Duration) -> bool {
        self.status() == TaskStatus::Idle || self.is_stale(now, timeout)
    }
}

macro_rules! impl_lease {
    ($record:ty) => {
        impl Lease for $record {
            fn id(&self) -> TaskId {
                self.id
            }

            fn status(&self) -> TaskStatus {
                self.status
            }

            fn start_time(&self) -> Option<Instant> {
                self.start_time
            }

            fn set_running(&mut self, now: Instant) {
                self.status = TaskStatus::Running;
                self.start_time = Some(now);
            }

            fn reset_idle(&mut self) {
                self.status = TaskStatus::Idle;
                self.start_time = None;
            }

            fn set_finished(&mut self) {
                self.status = TaskStatus::Finished;
            }
        }
    };
}

impl_lease!(MapTaskRecord);
impl_lease!(ReduceTaskRecord);

/// Todo el estado de planificación. Se muta sólo detrás del lock del
/// `Scheduler`.
#[derive(Debug)]
pub struct Registry {
    pub map_tasks: BTreeMap<TaskId, MapTaskRecord>,
    pub reduce_tasks: BTreeMap<TaskId, ReduceTaskRecord>,
    pub map_phase_complete: bool,
    pub reduce_phase_complete: bool,
    pub all_complete: bool,
    pub reduce_partition_count: u32,
    pub task_timeout: Duration,
}

impl Registry {
    /// Crea una tarea map por archivo (ids 0..N-1) y `reduce_partition_count`
    /// tareas reduce (ids 0..R-1), todas `Idle`.
    pub fn new(input_files: Vec<String>, reduce_partition_count: u32, task_timeout: Duration) -> Self {
        let map_tasks: BTreeMap<TaskId, MapTaskRecord> = input_files
            .into_iter()
            .enumerate()
            .map(|(i, input_file)| {
                let id = i as TaskId;
                (
                    id,
                    MapTaskRecord {
                        id,
                        status: TaskStatus::Idle,
                        start_time: None,
                        input_file,
                    },
                )
            })
            .collect();

        let reduce_tasks: BTreeMap<TaskId, ReduceTaskRecord> = (0..reduce_partition_count)
            .map(|id| {
                (
                    id,
                    ReduceTaskRecord {
                        id,
                        status: TaskStatus::Idle,
                        start_time: None,
                    },
                )
            })
            .collect();

        // sin archivos de entrada la fase map está trivialmente completa
        let map_phase_complete = map_tasks.is_empty();
        let reduce_phase_complete = map_phase_complete && reduce_tasks.is_empty();

        Self {
            map_tasks,
            reduce_tasks,
            map_phase_complete,
            reduce_phase_complete,
            all_complete: false,
            reduce_partition_count,
            task_timeout,
        }
    }

    pub fn map_task_count(&self) -> u32 {
        self.map_tasks.len() as u32
    }

    pub fn all_maps_finished(&self) -> bool {
        all_finished(self.map_tasks.values())
    }

    pub fn all_reduces_finished(&self) -> bool {
        all_finished(self.reduce_tasks.values())
    }
}

/// Primera tarea asignable (idle o con lease vencido); la marca `Running`.
pub fn claim_next<'a, R, I>(records: I, now: Instant, timeout: Duration) -> Option<&'a mut R>
where
    R: Lease + 'a,
    I: IntoIterator<Item = &'a mut R>,
{
    let record = records
        .into_iter()
        .find(|r| r.is_assignable(now, timeout))?;
    record.set_running(now);
    Some(record)
}

/// Devuelve a `Idle` toda tarea `Running` con lease vencido y retorna sus ids.
pub fn reclaim_stale<'a, R, I>(records: I, now: Instant, timeout: Duration) -> Vec<TaskId>
where
    R: Lease + 'a,
    I: IntoIterator<Item = &'a mut R>,
{
    let mut reclaimed = Vec::new();
    for record in records {
        if record.is_stale(now, timeout) {
            record.reset_idle();
            reclaimed.push(record.id());
        }
    }
    reclaimed
}

fn all_finished<'a, R: Lease + 'a>(mut records: impl Iterator<Item = &'a R>) -> bool {
    records.all(|r| r.status() == TaskStatus::Finished)
}

pub fn count_by_status<'a, R: Lease + 'a>(records: impl Iterator<Item = &'a R>) -> PhaseCounts {
    let mut counts = PhaseCounts::default();
    for r in records {
        counts.total += 1;
        match r.status() {
            TaskStatus::Idle => counts.idle += 1,
            TaskStatus::Running => counts.running += 1,
            TaskStatus::Finished => counts.finished += 1,
            TaskStatus::Failed => counts.failed += 1,
        }
    }
    counts
}
