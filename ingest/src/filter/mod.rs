pub mod base;
pub mod unique;

pub use base::{ItemFilter, apply_filters};
