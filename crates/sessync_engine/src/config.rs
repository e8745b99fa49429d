//! Configuration for the sync engine.

use crate::cursor::JobKey;
use crate::error::{SyncError, SyncResult};
use sessync_protocol::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use std::time::Duration;

/// Default number of consecutive pages without progress tolerated while the
/// remote still reports more pages.
pub const DEFAULT_MAX_STALLED_PAGES: u32 = 10;

/// Configuration for one sync job.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Remote platform host, or a full origin for non-TLS test servers.
    pub platform: String,
    /// Job identity; its endpoint is the collection path.
    pub job: JobKey,
    /// Records requested per page.
    pub page_size: u32,
    /// Timeout for a single page fetch.
    pub fetch_timeout: Duration,
    /// Interval between scheduled runs, if the job repeats.
    pub run_interval: Option<Duration>,
    /// Consecutive pages without progress after which a run gives up.
    pub max_stalled_pages: u32,
}

impl SyncConfig {
    /// Creates a configuration for the event sessions job on `endpoint`.
    pub fn new(platform: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            job: JobKey::event_sessions(endpoint),
            page_size: DEFAULT_PAGE_SIZE,
            fetch_timeout: Duration::from_secs(30),
            run_interval: None,
            max_stalled_pages: DEFAULT_MAX_STALLED_PAGES,
        }
    }

    /// Sets the page size.
    pub fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = size;
        self
    }

    /// Sets the per-fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Sets the interval for repeated runs.
    pub fn with_run_interval(mut self, interval: Duration) -> Self {
        self.run_interval = Some(interval);
        self
    }

    /// Sets how many consecutive pages may bring no progress.
    pub fn with_max_stalled_pages(mut self, pages: u32) -> Self {
        self.max_stalled_pages = pages;
        self
    }

    /// Replaces the job key.
    pub fn with_job(mut self, job: JobKey) -> Self {
        self.job = job;
        self
    }

    /// Returns the collection endpoint.
    pub fn endpoint(&self) -> &str {
        &self.job.endpoint
    }

    /// Checks the configuration for values the engine cannot run with.
    pub fn validate(&self) -> SyncResult<()> {
        if self.platform.trim().is_empty() {
            return Err(SyncError::Config("platform must not be empty".into()));
        }
        if self.job.endpoint.trim().is_empty() {
            return Err(SyncError::Config("endpoint must not be empty".into()));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(SyncError::Config(format!(
                "page size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.page_size
            )));
        }
        if self.max_stalled_pages == 0 {
            return Err(SyncError::Config("max stalled pages must be positive".into()));
        }
        if self.fetch_timeout.is_zero() {
            return Err(SyncError::Config("fetch timeout must be positive".into()));
        }
        Ok(())
    }
}
