//! A simulated remote session collection.
//!
//! Serves pages the way the real endpoint does: only records strictly after
//! the request cursor, ordered by `(LastModifiedDateTime, SessionID)`, with a
//! `next` link while more records remain.

use parking_lot::Mutex;
use sessync_engine::{CursorState, PageSource, SyncError, SyncResult};
use sessync_protocol::{RemoteSession, SessionPage};
use std::collections::{BTreeMap, HashMap};

/// In-memory stand-in for the remote collection.
#[derive(Debug, Default)]
pub struct SimulatedRemote {
    records: Mutex<BTreeMap<u64, RemoteSession>>,
    failures: Mutex<HashMap<usize, String>>,
    requests: Mutex<Vec<CursorState>>,
    reverse_pages: Mutex<bool>,
}

impl SimulatedRemote {
    /// Creates an empty remote.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a remote holding `records`.
    pub fn with_records(records: impl IntoIterator<Item = RemoteSession>) -> Self {
        let remote = Self::new();
        for record in records {
            remote.put(record);
        }
        remote
    }

    /// Adds or replaces a record by session id.
    pub fn put(&self, record: RemoteSession) {
        self.records.lock().insert(record.session_id, record);
    }

    /// Edits a record in place; returns false if it does not exist.
    pub fn modify(&self, session_id: u64, edit: impl FnOnce(&mut RemoteSession)) -> bool {
        match self.records.lock().get_mut(&session_id) {
            Some(record) => {
                edit(record);
                true
            }
            None => false,
        }
    }

    /// Makes the `call`-th fetch (one-based) fail with a retryable transport error.
    pub fn fail_on_call(&self, call: usize, message: impl Into<String>) {
        self.failures.lock().insert(call, message.into());
    }

    /// Delivers each page in descending key order.
    pub fn reverse_pages(&self, reverse: bool) {
        *self.reverse_pages.lock() = reverse;
    }

    /// Cursors of all fetches so far, including failed ones.
    pub fn requests(&self) -> Vec<CursorState> {
        self.requests.lock().clone()
    }

    /// Number of fetches so far.
    pub fn fetch_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns true if the remote holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl PageSource for SimulatedRemote {
    fn fetch_page(&self, cursor: &CursorState, page_size: u32) -> SyncResult<SessionPage> {
        let call = {
            let mut requests = self.requests.lock();
            requests.push(cursor.clone());
            requests.len()
        };
        if let Some(message) = self.failures.lock().remove(&call) {
            return Err(SyncError::transport_retryable(message));
        }

        let mut matching: Vec<RemoteSession> = self
            .records
            .lock()
            .values()
            .filter(|r| cursor.is_after(r.last_modified.at(), r.session_id))
            .cloned()
            .collect();
        matching.sort_by_key(RemoteSession::order_key);

        let page_size = page_size.max(1) as usize;
        let has_more = matching.len() > page_size;
        matching.truncate(page_size);
        if *self.reverse_pages.lock() {
            matching.reverse();
        }
        Ok(SessionPage::new(matching, has_more))
    }
}
