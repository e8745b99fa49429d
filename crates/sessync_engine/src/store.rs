//! Persistence ports and an in-memory implementation.

use crate::cursor::{CursorState, JobKey};
use crate::entity::{LocalSession, SessionFields};
use crate::error::SyncError;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a persistence backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The write violates a store constraint, e.g. a duplicate external id.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// The record to update does not exist.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Another run holds the job lock.
    #[error("job {0} is locked by another run")]
    Locked(String),

    /// A stored cursor belongs to a different job than requested.
    #[error("cursor for job {found} found where job {expected} was expected")]
    JobMismatch {
        /// Requested job.
        expected: String,
        /// Job recorded in the stored cursor.
        found: String,
    },

    /// I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<StoreError> for SyncError {
    fn from(err: StoreError) -> Self {
        SyncError::Store(err.to_string())
    }
}

/// Storage of session records.
pub trait SessionStore: Send + Sync {
    /// Finds a session by external id.
    fn find_by_source_id(&self, source_id: u64) -> StoreResult<Option<LocalSession>>;

    /// Inserts a new session and returns it with its local id.
    fn insert(&self, fields: SessionFields) -> StoreResult<LocalSession>;

    /// Replaces an existing session.
    fn update(&self, session: LocalSession) -> StoreResult<LocalSession>;

    /// Returns all sessions ordered by external id.
    fn list(&self) -> StoreResult<Vec<LocalSession>>;
}

/// Storage of cursors. `save_cursor` must be atomic with respect to crashes.
pub trait CursorStore: Send + Sync {
    /// Loads the cursor for `job`, or a fresh one if none was saved.
    fn load_cursor(&self, job: &JobKey) -> StoreResult<CursorState>;

    /// Durably saves a cursor.
    fn save_cursor(&self, cursor: &CursorState) -> StoreResult<()>;
}

impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    fn find_by_source_id(&self, source_id: u64) -> StoreResult<Option<LocalSession>> {
        (**self).find_by_source_id(source_id)
    }

    fn insert(&self, fields: SessionFields) -> StoreResult<LocalSession> {
        (**self).insert(fields)
    }

    fn update(&self, session: LocalSession) -> StoreResult<LocalSession> {
        (**self).update(session)
    }

    fn list(&self) -> StoreResult<Vec<LocalSession>> {
        (**self).list()
    }
}

impl<T: CursorStore + ?Sized> CursorStore for Arc<T> {
    fn load_cursor(&self, job: &JobKey) -> StoreResult<CursorState> {
        (**self).load_cursor(job)
    }

    fn save_cursor(&self, cursor: &CursorState) -> StoreResult<()> {
        (**self).save_cursor(cursor)
    }
}

/// An in-memory store for testing.
///
/// Supports fault injection: writes for chosen external ids can be rejected
/// with a constraint error, and cursor saves can be made to fail.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: RwLock<BTreeMap<u64, LocalSession>>,
    cursors: RwLock<HashMap<JobKey, CursorState>>,
    rejected: RwLock<HashSet<u64>>,
    fail_cursor_saves: AtomicBool,
    writes: AtomicU64,
    cursor_saves: AtomicU64,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every write of `source_id` fail with a constraint error.
    pub fn reject_source_id(&self, source_id: u64) {
        self.rejected.write().insert(source_id);
    }

    /// Stops rejecting writes of `source_id`.
    pub fn accept_source_id(&self, source_id: u64) {
        self.rejected.write().remove(&source_id);
    }

    /// Makes cursor saves fail with an I/O error.
    pub fn set_fail_cursor_saves(&self, fail: bool) {
        self.fail_cursor_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of session inserts and updates performed.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of successful cursor saves.
    pub fn cursor_save_count(&self) -> u64 {
        self.cursor_saves.load(Ordering::SeqCst)
    }

    /// Number of stored sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Returns true if no sessions are stored.
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    fn check_rejected(&self, source_id: u64) -> StoreResult<()> {
        if self.rejected.read().contains(&source_id) {
            return Err(StoreError::Constraint(format!(
                "write of session {source_id} rejected"
            )));
        }
        Ok(())
    }
}

impl SessionStore for MemoryStore {
    fn find_by_source_id(&self, source_id: u64) -> StoreResult<Option<LocalSession>> {
        Ok(self.sessions.read().get(&source_id).cloned())
    }

    fn insert(&self, fields: SessionFields) -> StoreResult<LocalSession> {
        self.check_rejected(fields.source_id)?;
        let mut sessions = self.sessions.write();
        if sessions.contains_key(&fields.source_id) {
            return Err(StoreError::Constraint(format!(
                "duplicate source id {}",
                fields.source_id
            )));
        }
        let session = LocalSession::new(fields);
        sessions.insert(session.source_id(), session.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(session)
    }

    fn update(&self, session: LocalSession) -> StoreResult<LocalSession> {
        self.check_rejected(session.source_id())?;
        let mut sessions = self.sessions.write();
        match sessions.get_mut(&session.source_id()) {
            Some(existing) if existing.id == session.id => {
                *existing = session.clone();
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(session)
            }
            Some(_) => Err(StoreError::Constraint(format!(
                "source id {} belongs to another record",
                session.source_id()
            ))),
            None => Err(StoreError::NotFound(session.id.to_string())),
        }
    }

    fn list(&self) -> StoreResult<Vec<LocalSession>> {
        Ok(self.sessions.read().values().cloned().collect())
    }
}

impl CursorStore for MemoryStore {
    fn load_cursor(&self, job: &JobKey) -> StoreResult<CursorState> {
        Ok(self
            .cursors
            .read()
            .get(job)
            .cloned()
            .unwrap_or_else(|| CursorState::new(job.clone())))
    }

    fn save_cursor(&self, cursor: &CursorState) -> StoreResult<()> {
        if self.fail_cursor_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "cursor save failed",
            )));
        }
        self.cursors
            .write()
            .insert(cursor.job.clone(), cursor.clone());
        self.cursor_saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
