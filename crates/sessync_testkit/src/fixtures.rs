//! Test fixtures and harness helpers.

use crate::remote::SimulatedRemote;
use chrono::{DateTime, TimeZone, Utc};
use sessync_engine::{
    CursorStore, FixedClock, MemoryStore, SessionFeed, SessionStore, SyncConfig, SyncOrchestrator,
};
use sessync_protocol::{RemoteEvent, RemoteSession, SessionStatus, SessionType};
use sessync_store::FileStore;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Platform used by fixtures.
pub const PLATFORM: &str = "acme.example.com";

/// Endpoint used by fixtures.
pub const ENDPOINT: &str = "events/-/sessions/";

/// GUID carried by fixture events.
pub const EVENT_GUID: &str = "5b2e1c8c-3f5d-4c8e-9a51-0d7a4c1b2e3f";

/// A fixed timestamp offset by `secs` seconds.
pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0)
        .single()
        .expect("timestamp in range")
}

/// Builds remote session records.
#[derive(Debug, Clone)]
pub struct RemoteSessionBuilder {
    record: RemoteSession,
}

impl RemoteSessionBuilder {
    /// Starts a valid record with id `session_id`.
    pub fn new(session_id: u64) -> Self {
        Self {
            record: RemoteSession {
                session_id,
                name: Some(format!("Session {session_id}")),
                description: Some("Hands-on workshop".into()),
                start_datetime: "2024-05-01T09:00:00.000+12:00".into(),
                finish_datetime: "2024-05-01T17:00:00.000+12:00".into(),
                start_timezone_abbr: "NZST".into(),
                finish_timezone_abbr: "NZST".into(),
                session_type: SessionType::Venue,
                status: SessionStatus::Active,
                created: Some("2024-01-01T00:00:00.000Z".into()),
                last_modified: ts(0).into(),
                event: Some(RemoteEvent {
                    event_id: 900,
                    unique_identifier: Some(EVENT_GUID.into()),
                    code: Some("EVT-100".into()),
                    name: Some("Induction".into()),
                }),
            },
        }
    }

    /// Sets the modification time.
    pub fn modified(mut self, at: DateTime<Utc>) -> Self {
        self.record.last_modified = at.into();
        self
    }

    /// Sets the session name.
    pub fn name(mut self, name: Option<&str>) -> Self {
        self.record.name = name.map(String::from);
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: Option<&str>) -> Self {
        self.record.description = description.map(String::from);
        self
    }

    /// Sets the status.
    pub fn status(mut self, status: SessionStatus) -> Self {
        self.record.status = status;
        self
    }

    /// Sets the session type.
    pub fn session_type(mut self, session_type: SessionType) -> Self {
        self.record.session_type = session_type;
        self
    }

    /// Sets the parent event's code and name.
    pub fn event_labels(mut self, code: Option<&str>, name: Option<&str>) -> Self {
        if let Some(event) = self.record.event.as_mut() {
            event.code = code.map(String::from);
            event.name = name.map(String::from);
        }
        self
    }

    /// Sets the parent event's GUID.
    pub fn event_guid(mut self, guid: Option<&str>) -> Self {
        if let Some(event) = self.record.event.as_mut() {
            event.unique_identifier = guid.map(String::from);
        }
        self
    }

    /// Drops the expanded parent event.
    pub fn without_event(mut self) -> Self {
        self.record.event = None;
        self
    }

    /// Returns the record.
    pub fn build(self) -> RemoteSession {
        self.record
    }
}

/// Shorthand for a valid record at `(ts(secs), session_id)`.
pub fn remote_session(session_id: u64, secs: i64) -> RemoteSession {
    RemoteSessionBuilder::new(session_id).modified(ts(secs)).build()
}

/// An orchestrator wired to a simulated remote and a store.
pub struct Harness<S> {
    /// The orchestrator under test.
    pub orchestrator: SyncOrchestrator<Arc<SimulatedRemote>, S, Arc<SessionFeed>>,
    /// The simulated remote.
    pub remote: Arc<SimulatedRemote>,
    /// The local store.
    pub store: Arc<S>,
    /// Emitted events.
    pub feed: Arc<SessionFeed>,
    /// The orchestrator's clock.
    pub clock: Arc<FixedClock>,
}

impl<S: SessionStore + CursorStore> Harness<S> {
    /// Wires `remote` and `store` with the fixture platform and endpoint.
    pub fn new(remote: Arc<SimulatedRemote>, store: Arc<S>, page_size: u32) -> Self {
        let feed = Arc::new(SessionFeed::new());
        let clock = Arc::new(FixedClock::new(ts(1_000_000)));
        let config = SyncConfig::new(PLATFORM, ENDPOINT).with_page_size(page_size);
        let orchestrator = SyncOrchestrator::new(config, remote.clone(), store.clone(), feed.clone())
            .expect("fixture config is valid")
            .with_clock(clock.clone());
        Self {
            orchestrator,
            remote,
            store,
            feed,
            clock,
        }
    }

    /// Source ids of emitted events, in order.
    pub fn event_ids(&self) -> Vec<u64> {
        self.feed
            .history()
            .iter()
            .map(|e| e.session().source_id())
            .collect()
    }
}

impl Harness<MemoryStore> {
    /// Wires `remote` to a fresh in-memory store.
    pub fn memory(remote: Arc<SimulatedRemote>, page_size: u32) -> Self {
        Self::new(remote, Arc::new(MemoryStore::new()), page_size)
    }
}

impl Harness<FileStore> {
    /// Wires `remote` to a file store rooted at `root`.
    pub fn file(remote: Arc<SimulatedRemote>, root: &Path, page_size: u32) -> Self {
        let store = FileStore::open(root).expect("Failed to open file store");
        Self::new(remote, Arc::new(store), page_size)
    }
}

/// A temporary data directory, removed on drop.
pub struct TempDataDir {
    dir: TempDir,
}

impl TempDataDir {
    /// Creates a fresh directory.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Returns the directory path.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl Default for TempDataDir {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs `f` with a file store in a temporary directory.
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&FileStore) -> R,
{
    let dir = TempDataDir::new();
    let store = FileStore::open(dir.path()).expect("Failed to open file store");
    f(&store)
}
