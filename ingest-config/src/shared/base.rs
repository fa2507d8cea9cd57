use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The project name is empty.
    #[error("`project_name` cannot be empty")]
    EmptyProjectName,
    /// The worker deadline is zero.
    #[error("`worker_deadline_ms` cannot be zero")]
    WorkerDeadlineZero,
    /// The maximum delivery count is zero.
    #[error("`max_deliveries` cannot be zero")]
    MaxDeliveriesZero,
    /// A transformer declares no input item types.
    #[error("transformer `{0}` must declare at least one input item type")]
    NoInputItemTypes(String),
    /// A transformer declares no output item types.
    #[error("transformer `{0}` must declare at least one output item type")]
    NoOutputItemTypes(String),
}
