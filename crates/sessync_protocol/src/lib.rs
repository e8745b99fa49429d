//! # SessSync Protocol
//!
//! Wire types and query builders for the remote event session API.
//!
//! This crate provides:
//! - `RemoteSession` / `RemoteEvent` wire records
//! - `SessionType` and `SessionStatus` enums
//! - Cursor filter and ordering expressions (`PageQuery`)
//! - JSON page decoding (`SessionPage`)
//! - Timestamp parsing and formatting helpers
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod page;
mod query;
mod session;
mod time;

pub use error::{ProtocolError, ProtocolResult};
pub use page::{PageLink, SessionPage};
pub use query::{
    build_filter, resource_url, PageQuery, API_PATH, DEFAULT_PAGE_SIZE, EXPAND_EVENT,
    MAX_PAGE_SIZE, ORDER_BY,
};
pub use session::{RemoteEvent, RemoteSession, SessionStatus, SessionType};
pub use time::{format_timestamp, parse_timestamp, SourceTimestamp, EPOCH};
