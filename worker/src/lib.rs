pub mod client;
pub mod commit;
pub mod error;
pub mod executor;
pub mod map_task;
pub mod reduce_task;

pub use client::HttpCoordinatorLink;
pub use error::{LinkError, TaskError};
pub use executor::{run, CoordinatorLink, RunStats, WorkerConfig};
