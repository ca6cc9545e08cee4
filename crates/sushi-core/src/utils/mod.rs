//! Shared utilities

pub mod error;
pub mod path_guard;

pub use error::*;
pub use path_guard::*;
