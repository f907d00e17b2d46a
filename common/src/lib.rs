pub mod app;
pub mod config;
pub mod indexer;
pub mod naming;
pub mod protocol;
pub mod task;
pub mod wordcount;

pub use app::{app_by_name, KeyValue, MapReduceApp};
pub use naming::{intermediate_file_name, output_file_name};
pub use protocol::{
    AssignmentKind, JobStatusView, OutcomeKind, OutcomeReport, PhaseCounts, ReportAck,
    RequestKind, TaskAssignment, TaskRequest,
};
pub use task::{Phase, TaskId, TaskStatus};
