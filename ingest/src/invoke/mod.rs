pub mod base;
pub mod noop;

pub use base::{ComputeInvoker, InvocationStatus};
pub use noop::NoopInvoker;
