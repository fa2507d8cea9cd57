//! Macros for pipeline error handling.
//!
//! Provide a concise way to create and return [`crate::error::IngestError`]
//! instances for common error handling patterns.

/// Creates an [`crate::error::IngestError`] from error kind and description.
#[macro_export]
macro_rules! ingest_error {
    ($kind:expr, $desc:expr) => {
        IngestError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        IngestError::from(($kind, $desc, $detail.to_string()))
    };
}

/// Creates and returns an [`crate::error::IngestError`] from the current function.
#[macro_export]
macro_rules! bail {
    ($kind:expr, $desc:expr) => {
        return Err($crate::ingest_error!($kind, $desc))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        return Err($crate::ingest_error!($kind, $desc, $detail))
    };
}
