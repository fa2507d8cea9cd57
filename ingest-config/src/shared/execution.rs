use serde::{Deserialize, Serialize};

/// Queue backend selection for a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueMode {
    /// In-process queues, for synchronous single-process replay and tests.
    Local,
    /// Durable distributed queues with at-least-once delivery.
    Distributed,
}

/// Job dispatch selection for a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobDispatch {
    /// Run source and transformer jobs in the controller process.
    InProcess,
    /// Dispatch jobs to remote invocations, fire-and-forget.
    Remote,
}

/// Execution settings for a pipeline.
///
/// Controls which queue backend and job dispatch strategy the controller
/// uses, plus the wall-clock budget of distributed transformer workers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExecutionConfig {
    /// Queue backend used for inter-stage transport.
    #[serde(default = "default_queue_mode")]
    pub queue_mode: QueueMode,
    /// Whether jobs run in-process or as remote invocations.
    #[serde(default = "default_job_dispatch")]
    pub job_dispatch: JobDispatch,
    /// Wall-clock deadline, in milliseconds, after which a distributed
    /// transformer worker stops receiving new items.
    #[serde(default = "default_worker_deadline_ms")]
    pub worker_deadline_ms: u64,
    /// Number of deliveries after which a message is moved to the
    /// dead-letter queue.
    #[serde(default = "default_max_deliveries")]
    pub max_deliveries: u32,
    /// Minutes between controller scheduling ticks. Consumed by the external
    /// provisioner when installing the schedule, not by the core.
    #[serde(default = "default_schedule_minutes")]
    pub schedule_minutes: u32,
}

fn default_queue_mode() -> QueueMode {
    QueueMode::Local
}

fn default_job_dispatch() -> JobDispatch {
    JobDispatch::InProcess
}

fn default_worker_deadline_ms() -> u64 {
    10_000
}

fn default_max_deliveries() -> u32 {
    5
}

fn default_schedule_minutes() -> u32 {
    5
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            queue_mode: default_queue_mode(),
            job_dispatch: default_job_dispatch(),
            worker_deadline_ms: default_worker_deadline_ms(),
            max_deliveries: default_max_deliveries(),
            schedule_minutes: default_schedule_minutes(),
        }
    }
}
