pub mod base;
pub mod distributed;
pub mod local;
pub mod memory;

pub use base::{ItemQueue, QueueClient};
