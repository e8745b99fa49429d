//! # SessSync Testkit
//!
//! Test utilities for SessSync.
//!
//! This crate provides:
//! - Remote session builders and harness helpers
//! - A simulated remote collection that honors cursor filters and paging
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sessync_testkit::prelude::*;
//!
//! #[test]
//! fn syncs_everything() {
//!     let remote = SimulatedRemote::new();
//!     remote.put(RemoteSessionBuilder::new(1).modified(ts(10)).build());
//!     let harness = MemoryHarness::new(remote, 250);
//!     harness.orchestrator.run().unwrap();
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod remote;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::remote::*;
}

pub use fixtures::*;
pub use generators::*;
pub use remote::*;
