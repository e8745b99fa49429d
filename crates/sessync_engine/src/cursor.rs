//! Durable sync progress.
//!
//! A cursor marks the last record that has been durably stored, as the pair
//! `(watermark, last_seen_id)`. Records are processed in that pair's order,
//! so everything at or before the cursor is done.
//!
//! `last_seen_id = None` means every record at the watermark is done. This is
//! the state of a fresh cursor (at the epoch) and of a cursor reset to a
//! specific time.

use crate::error::{SyncError, SyncResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sessync_protocol::{format_timestamp, PageQuery, EPOCH};
use std::cmp::Ordering;
use std::fmt;

/// Identifies one cursor: one per job type and endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobKey {
    /// Functional area of the job.
    pub area: String,
    /// Job type.
    pub job_type: String,
    /// Remote collection path.
    pub endpoint: String,
}

impl JobKey {
    /// Area of the event sessions job.
    pub const ENROLMENT_AREA: &'static str = "enrolment";
    /// Type of the event sessions job.
    pub const EVENT_SESSIONS: &'static str = "event_sessions";

    /// Creates a job key.
    pub fn new(
        area: impl Into<String>,
        job_type: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            area: area.into(),
            job_type: job_type.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Creates the key of the event sessions job for `endpoint`.
    pub fn event_sessions(endpoint: impl Into<String>) -> Self {
        Self::new(Self::ENROLMENT_AREA, Self::EVENT_SESSIONS, endpoint)
    }

    /// Returns a file-name-safe rendering of the key.
    ///
    /// The readable prefix is lossy; the trailing digest of the full key
    /// keeps distinct keys apart.
    pub fn slug(&self) -> String {
        let raw = format!("{}-{}-{}", self.area, self.job_type, self.endpoint);
        let mut slug = String::with_capacity(raw.len() + 17);
        for c in raw.chars() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                slug.push(c);
            } else {
                slug.push('_');
            }
        }

        let mut hasher = Sha256::new();
        for part in [&self.area, &self.job_type, &self.endpoint] {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
        slug.push('-');
        for byte in &hasher.finalize()[..8] {
            slug.push_str(&format!("{byte:02x}"));
        }
        slug
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.area, self.job_type, self.endpoint)
    }
}

/// A point in the `(modified, id)` order.
///
/// At equal watermarks, `None` sorts after every id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPosition {
    /// Modification time.
    pub watermark: DateTime<Utc>,
    /// Tie-break id at that time.
    pub last_id: Option<u64>,
}

impl Ord for CursorPosition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.watermark
            .cmp(&other.watermark)
            .then_with(|| match (self.last_id, other.last_id) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(&b),
            })
    }
}

impl PartialOrd for CursorPosition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for CursorPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.last_id {
            Some(id) => write!(f, "({}, {})", format_timestamp(&self.watermark), id),
            None => write!(f, "({}, -)", format_timestamp(&self.watermark)),
        }
    }
}

/// Durable record of sync progress for one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorState {
    /// Job this cursor belongs to.
    pub job: JobKey,
    /// Modification time of the last stored record.
    pub last_modified: DateTime<Utc>,
    /// External id of the last stored record at `last_modified`.
    pub last_seen_id: Option<u64>,
    /// When a record was last committed under this cursor.
    pub last_request_time: Option<DateTime<Utc>>,
}

impl CursorState {
    /// Creates a cursor at the start of time.
    pub fn new(job: JobKey) -> Self {
        Self {
            job,
            last_modified: EPOCH,
            last_seen_id: None,
            last_request_time: None,
        }
    }

    /// Creates a cursor at an explicit position.
    pub fn at(job: JobKey, last_modified: DateTime<Utc>, last_seen_id: Option<u64>) -> Self {
        Self {
            job,
            last_modified,
            last_seen_id,
            last_request_time: None,
        }
    }

    /// Returns the current position.
    pub fn position(&self) -> CursorPosition {
        CursorPosition {
            watermark: self.last_modified,
            last_id: self.last_seen_id,
        }
    }

    /// Returns true if a record at `(modified, id)` has not been processed yet.
    pub fn is_after(&self, modified: DateTime<Utc>, id: u64) -> bool {
        match modified.cmp(&self.last_modified) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => self.last_seen_id.is_some_and(|last| id > last),
        }
    }

    /// Moves the cursor to a stored record.
    pub fn advance(
        &mut self,
        modified: DateTime<Utc>,
        id: u64,
        now: DateTime<Utc>,
    ) -> SyncResult<()> {
        if !self.is_after(modified, id) {
            let to = CursorPosition {
                watermark: modified,
                last_id: Some(id),
            };
            return Err(SyncError::CursorRegression {
                from: self.position().to_string(),
                to: to.to_string(),
            });
        }
        self.last_modified = modified;
        self.last_seen_id = Some(id);
        self.last_request_time = Some(now);
        Ok(())
    }

    /// Builds the request for the page after this cursor.
    pub fn page_query(&self, page_size: u32) -> PageQuery {
        PageQuery::after(&self.last_modified, self.last_seen_id, page_size)
    }

    /// Rewinds the cursor so the next run starts from the beginning.
    pub fn reset(&mut self) {
        self.last_modified = EPOCH;
        self.last_seen_id = None;
        self.last_request_time = None;
    }
}
