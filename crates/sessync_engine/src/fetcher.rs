//! Page source abstraction.

use crate::cursor::CursorState;
use crate::error::{SyncError, SyncResult};
use parking_lot::Mutex;
use sessync_protocol::SessionPage;
use std::collections::VecDeque;

/// Fetches pages of remote sessions strictly after a cursor.
///
/// Implementations own transport details (HTTP, mock, simulated remote).
pub trait PageSource: Send + Sync {
    /// Fetches the page after `cursor`, at most `page_size` records.
    fn fetch_page(&self, cursor: &CursorState, page_size: u32) -> SyncResult<SessionPage>;
}

impl<T: PageSource + ?Sized> PageSource for std::sync::Arc<T> {
    fn fetch_page(&self, cursor: &CursorState, page_size: u32) -> SyncResult<SessionPage> {
        (**self).fetch_page(cursor, page_size)
    }
}

/// A scripted page source for testing.
///
/// Returns queued responses in order and records the cursor of each call.
#[derive(Debug, Default)]
pub struct MockPageSource {
    responses: Mutex<VecDeque<SyncResult<SessionPage>>>,
    requests: Mutex<Vec<CursorState>>,
}

impl MockPageSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a page.
    pub fn push_page(&self, page: SessionPage) {
        self.responses.lock().push_back(Ok(page));
    }

    /// Queues an error.
    pub fn push_error(&self, error: SyncError) {
        self.responses.lock().push_back(Err(error));
    }

    /// Cursors of all calls so far.
    pub fn requests(&self) -> Vec<CursorState> {
        self.requests.lock().clone()
    }

    /// Number of calls so far.
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Number of queued responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.responses.lock().len()
    }
}

impl PageSource for MockPageSource {
    fn fetch_page(&self, cursor: &CursorState, _page_size: u32) -> SyncResult<SessionPage> {
        self.requests.lock().push(cursor.clone());
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(SyncError::Protocol("no mock page queued".into())))
    }
}
