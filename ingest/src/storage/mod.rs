pub mod base;
pub mod document;
pub mod template;

pub use base::Storage;
