//! Local mirror of a remote session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sessync_protocol::{parse_timestamp, SessionStatus, SessionType};
use std::fmt;
use uuid::Uuid;

/// Local identifier of a stored session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generates a new random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The normalized, validated field set of a session.
///
/// Change detection compares this struct as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFields {
    /// Remote platform the record came from.
    pub platform: String,
    /// External session id (unique key).
    pub source_id: u64,
    /// Display name.
    pub name: String,
    /// Description, empty when the remote has none.
    pub description: String,
    /// Start time as delivered.
    pub start_datetime: String,
    /// Finish time as delivered.
    pub finish_datetime: String,
    /// Start timezone abbreviation.
    pub start_timezone_abbr: String,
    /// Finish timezone abbreviation.
    pub finish_timezone_abbr: String,
    /// Venue or online.
    pub session_type: SessionType,
    /// Remote lifecycle status.
    pub source_status: SessionStatus,
    /// Remote creation time as delivered.
    pub source_created: Option<String>,
    /// Remote modification time.
    pub source_modified: DateTime<Utc>,
    /// Remote modification time as delivered.
    pub source_modified_raw: String,
    /// Parent event id.
    pub source_event_id: u64,
    /// Parent event GUID.
    pub source_event_guid: Uuid,
}

/// A stored session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalSession {
    /// Local id.
    pub id: SessionId,
    /// Mirrored fields.
    #[serde(flatten)]
    pub fields: SessionFields,
}

impl LocalSession {
    /// Creates a stored session with a fresh id.
    pub fn new(fields: SessionFields) -> Self {
        Self {
            id: SessionId::new(),
            fields,
        }
    }

    /// Returns the external id.
    pub fn source_id(&self) -> u64 {
        self.fields.source_id
    }

    /// Time after which the remote no longer needs polling for this session.
    ///
    /// An active session with a future finish time stays interesting until
    /// it finishes; anything else is settled now.
    pub fn time_no_requests_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        if !self.fields.source_status.is_active() {
            return now;
        }
        match parse_timestamp(&self.fields.finish_datetime) {
            Some(finish) if finish > now => finish,
            _ => now,
        }
    }
}
