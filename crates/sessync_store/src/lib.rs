//! # SessSync Store
//!
//! File-backed implementations of the engine's persistence ports.
//!
//! ```text
//! <data_dir>/
//! ├─ sessions/<source_id>.json   # One file per mirrored session
//! ├─ cursors/<job>.json          # One cursor per job key
//! └─ locks/<job>.lock            # Advisory lock held during a run
//! ```
//!
//! Every write goes through write-then-rename, so a crash leaves either the
//! old or the new file, never a torn one.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod dir;
mod file_store;

pub use dir::{DataDir, JobLock};
pub use file_store::FileStore;
