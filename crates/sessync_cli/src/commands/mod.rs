//! CLI command implementations.

pub mod cursor;
pub mod run;
pub mod sessions;
