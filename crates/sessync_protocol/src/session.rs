//! Remote event session records.

use crate::time::SourceTimestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of session: where it runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SessionType {
    /// Runs at a physical venue.
    Venue,
    /// Runs online, such as a webinar.
    Online,
    /// A value this client does not know about, kept verbatim.
    Other(String),
}

impl SessionType {
    /// Returns the wire representation.
    pub fn as_str(&self) -> &str {
        match self {
            SessionType::Venue => "Venue",
            SessionType::Online => "Online",
            SessionType::Other(raw) => raw,
        }
    }
}

impl From<String> for SessionType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Venue" => SessionType::Venue,
            "Online" => SessionType::Online,
            _ => SessionType::Other(raw),
        }
    }
}

impl From<SessionType> for String {
    fn from(value: SessionType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a session on the remote side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SessionStatus {
    /// Created with unconfirmed details; not published.
    Draft,
    /// Scheduled or in progress, finishing in the future.
    Active,
    /// Finish time has elapsed.
    Completed,
    /// Cancelled.
    Cancelled,
    /// Status not supported by the API representation.
    Unknown,
    /// A value this client does not know about, kept verbatim.
    Other(String),
}

impl SessionStatus {
    /// Returns the wire representation.
    pub fn as_str(&self) -> &str {
        match self {
            SessionStatus::Draft => "Draft",
            SessionStatus::Active => "Active",
            SessionStatus::Completed => "Completed",
            SessionStatus::Cancelled => "Cancelled",
            SessionStatus::Unknown => "Unknown",
            SessionStatus::Other(raw) => raw,
        }
    }

    /// Returns true if the session can still take place.
    pub fn is_active(&self) -> bool {
        matches!(self, SessionStatus::Active)
    }
}

impl From<String> for SessionStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Draft" => SessionStatus::Draft,
            "Active" => SessionStatus::Active,
            "Completed" => SessionStatus::Completed,
            "Cancelled" => SessionStatus::Cancelled,
            "Unknown" => SessionStatus::Unknown,
            _ => SessionStatus::Other(raw),
        }
    }
}

impl From<SessionStatus> for String {
    fn from(value: SessionStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parent event, included when the request expands `EventSession/Event`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEvent {
    /// Remote event id.
    #[serde(rename = "EventID")]
    pub event_id: u64,
    /// Remote event GUID.
    #[serde(rename = "UniqueIdentifier", default)]
    pub unique_identifier: Option<String>,
    /// Short event code.
    #[serde(rename = "Code", default)]
    pub code: Option<String>,
    /// Event display name.
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
}

/// A session record as delivered by the remote API.
///
/// Timestamps other than `LastModifiedDateTime` are opaque and passed
/// through untouched. `LastModifiedDateTime` is parsed because the sync
/// cursor orders on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSession {
    /// External session id.
    #[serde(rename = "SessionID")]
    pub session_id: u64,
    /// Session name; absent for single-session events.
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    /// Description.
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
    /// Local start time with offset.
    #[serde(rename = "StartDateTime", default)]
    pub start_datetime: String,
    /// Local finish time with offset.
    #[serde(rename = "FinishDateTime", default)]
    pub finish_datetime: String,
    /// Timezone abbreviation at start.
    #[serde(rename = "StartTimeZoneAbbr", default)]
    pub start_timezone_abbr: String,
    /// Timezone abbreviation at finish.
    #[serde(rename = "FinishTimeZoneAbbr", default)]
    pub finish_timezone_abbr: String,
    /// Venue or online.
    #[serde(rename = "SessionType")]
    pub session_type: SessionType,
    /// Lifecycle status.
    #[serde(rename = "Status")]
    pub status: SessionStatus,
    /// Creation time on the remote side.
    #[serde(rename = "CreatedDateTime", default)]
    pub created: Option<String>,
    /// Last modification time on the remote side.
    #[serde(rename = "LastModifiedDateTime")]
    pub last_modified: SourceTimestamp,
    /// Expanded parent event.
    #[serde(rename = "Event", default)]
    pub event: Option<RemoteEvent>,
}

impl RemoteSession {
    /// Returns the composite ordering key `(last_modified, session_id)`.
    pub fn order_key(&self) -> (DateTime<Utc>, u64) {
        (self.last_modified.at(), self.session_id)
    }
}
