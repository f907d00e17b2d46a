use std::{sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::warn;

use crate::scheduler::Scheduler;

/// Loop de tolerancia a fallos: cada `interval` devuelve a `Idle` las tareas
/// cuyo lease venció, para que otro worker pueda tomarlas.
/// No termina nunca; el proceso lo corta al salir.
pub async fn run_timeout_sweep(scheduler: Arc<Scheduler>, interval: Duration) {
    loop {
        sleep(interval).await;

        for (phase, task_id) in scheduler.sweep() {
            warn!(
                "lease vencido para tarea {} {}, vuelve a estar disponible",
                phase, task_id
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{AssignmentKind, TaskStatus};

    #[tokio::test]
    async fn sweep_loop_reclaims_expired_leases() {
        let scheduler = Arc::new(Scheduler::new(
            vec!["a.txt".to_string()],
            1,
            Duration::from_millis(20),
        ));
        assert_eq!(scheduler.request_task().kind, AssignmentKind::AssignMap);

        let handle = tokio::spawn(run_timeout_sweep(scheduler.clone(), Duration::from_millis(10)));

        let mut reclaimed = false;
        for _ in 0..100 {
            sleep(Duration::from_millis(10)).await;
            if scheduler.status().map.idle == 1 {
                reclaimed = true;
                break;
            }
        }
        handle.abort();

        assert!(reclaimed, "la tarea debía volver a {:?}", TaskStatus::Idle);
    }
}
