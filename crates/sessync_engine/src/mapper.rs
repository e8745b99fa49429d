//! Remote record to local field mapping.

use chrono::{DateTime, Utc};
use sessync_protocol::{RemoteSession, SessionStatus, SessionType};

/// Mapped but not yet validated session fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedSession {
    /// Remote platform.
    pub platform: String,
    /// External session id.
    pub source_id: u64,
    /// Name after fallback; `None` if no fallback was available.
    pub name: Option<String>,
    /// Description, never null.
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
    /// Parent event id, if the event was expanded.
    pub source_event_id: Option<u64>,
    /// Parent event GUID as delivered.
    pub source_event_guid: Option<String>,
}

/// Maps a wire record to local fields.
///
/// Sessions of single-session events carry no name of their own; they take
/// the parent event's code, then its name. A missing description becomes
/// the empty string. Times and status pass through untouched.
pub fn map_session(remote: &RemoteSession, platform: &str) -> MappedSession {
    let event = remote.event.as_ref();
    let name = remote.name.clone().or_else(|| {
        event.and_then(|e| e.code.clone().or_else(|| e.name.clone()))
    });

    MappedSession {
        platform: platform.to_string(),
        source_id: remote.session_id,
        name,
        description: remote.description.clone().unwrap_or_default(),
        start_datetime: remote.start_datetime.clone(),
        finish_datetime: remote.finish_datetime.clone(),
        start_timezone_abbr: remote.start_timezone_abbr.clone(),
        finish_timezone_abbr: remote.finish_timezone_abbr.clone(),
        session_type: remote.session_type.clone(),
        source_status: remote.status.clone(),
        source_created: remote.created.clone(),
        source_modified: remote.last_modified.at(),
        source_modified_raw: remote.last_modified.raw().to_string(),
        source_event_id: event.map(|e| e.event_id),
        source_event_guid: event.and_then(|e| e.unique_identifier.clone()),
    }
}
