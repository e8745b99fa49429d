//! # SessSync Engine
//!
//! Incremental sync of remote event sessions into local storage.
//!
//! This crate provides:
//! - Durable cursor state keyed by job (`CursorState`)
//! - Paged fetching over an abstract HTTP client (`PageSource`, `HttpPageSource`)
//! - Pure record mapping and validation
//! - Idempotent upsert with change notifications (`UpsertEngine`, `SessionFeed`)
//! - The run state machine (`SyncOrchestrator`)
//!
//! ## Architecture
//!
//! One run walks the remote collection in `(LastModifiedDateTime, SessionID)`
//! order:
//! 1. Fetch a page strictly after the cursor
//! 2. Map, validate and upsert each record in key order
//! 3. Commit the cursor after every successful record
//! 4. Stop when the remote reports no further pages
//!
//! ## Key Invariants
//!
//! - The cursor never moves backward
//! - The cursor is committed only after its record is stored
//! - Re-processing a record is a no-op (no write, no notification)
//! - One failing record never blocks the rest of the run

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod clock;
mod config;
mod cursor;
mod entity;
mod error;
mod fetcher;
mod http;
mod mapper;
mod notify;
mod orchestrator;
mod store;
mod upsert;
mod validate;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{SyncConfig, DEFAULT_MAX_STALLED_PAGES};
pub use cursor::{CursorPosition, CursorState, JobKey};
pub use entity::{LocalSession, SessionFields, SessionId};
pub use error::{SyncError, SyncResult};
pub use fetcher::{MockPageSource, PageSource};
pub use http::{HttpClient, HttpError, HttpPageSource, HttpRequest, HttpResponse};
pub use mapper::{map_session, MappedSession};
pub use notify::{NotificationSink, NullSink, SessionEvent, SessionFeed};
pub use orchestrator::{
    CancelHandle, RecordError, RecordErrorKind, RunAborted, RunReport, RunState,
    SyncOrchestrator, SyncStats,
};
pub use store::{CursorStore, MemoryStore, SessionStore, StoreError, StoreResult};
pub use upsert::{UpsertEngine, UpsertResult};
pub use validate::{validate, ValidationError, MAX_NAME_LEN};

pub use sessync_protocol as protocol;
