//! Field validation applied before any write.

use crate::entity::SessionFields;
use crate::error::SyncError;
use crate::mapper::MappedSession;
use thiserror::Error;
use uuid::Uuid;

/// Longest accepted session name, in characters.
pub const MAX_NAME_LEN: usize = 255;

/// A mapped record that cannot be stored.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("session {source_id}: {field} {reason}")]
pub struct ValidationError {
    /// External id of the record.
    pub source_id: u64,
    /// Offending field.
    pub field: &'static str,
    /// What is wrong with it.
    pub reason: String,
}

impl ValidationError {
    fn new(source_id: u64, field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            source_id,
            field,
            reason: reason.into(),
        }
    }
}

impl From<ValidationError> for SyncError {
    fn from(err: ValidationError) -> Self {
        SyncError::Validation {
            source_id: err.source_id,
            field: err.field,
            reason: err.reason,
        }
    }
}

/// Validates mapped fields into a storable field set.
pub fn validate(mapped: MappedSession) -> Result<SessionFields, ValidationError> {
    let id = mapped.source_id;
    if id == 0 {
        return Err(ValidationError::new(id, "source_id", "must be positive"));
    }

    // A delivered name is kept as is, even when blank.
    let name = mapped
        .name
        .ok_or_else(|| ValidationError::new(id, "name", "is missing and has no event fallback"))?;
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::new(
            id,
            "name",
            format!("exceeds {MAX_NAME_LEN} characters"),
        ));
    }

    if mapped.start_datetime.trim().is_empty() {
        return Err(ValidationError::new(id, "start_datetime", "must not be blank"));
    }
    if mapped.finish_datetime.trim().is_empty() {
        return Err(ValidationError::new(id, "finish_datetime", "must not be blank"));
    }

    let source_event_id = match mapped.source_event_id {
        Some(event_id) if event_id > 0 => event_id,
        Some(_) => return Err(ValidationError::new(id, "source_event_id", "must be positive")),
        None => return Err(ValidationError::new(id, "source_event_id", "is missing")),
    };

    let raw_guid = mapped
        .source_event_guid
        .ok_or_else(|| ValidationError::new(id, "source_event_guid", "is missing"))?;
    let source_event_guid = Uuid::parse_str(raw_guid.trim()).map_err(|e| {
        ValidationError::new(id, "source_event_guid", format!("is not a GUID: {e}"))
    })?;

    Ok(SessionFields {
        platform: mapped.platform,
        source_id: id,
        name,
        description: mapped.description,
        start_datetime: mapped.start_datetime,
        finish_datetime: mapped.finish_datetime,
        start_timezone_abbr: mapped.start_timezone_abbr,
        finish_timezone_abbr: mapped.finish_timezone_abbr,
        session_type: mapped.session_type,
        source_status: mapped.source_status,
        source_created: mapped.source_created,
        source_modified: mapped.source_modified,
        source_modified_raw: mapped.source_modified_raw,
        source_event_id,
        source_event_guid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use sessync_protocol::{SessionStatus, SessionType};

    fn mapped() -> MappedSession {
        MappedSession {
            platform: "acme.example.com".into(),
            source_id: 5,
            name: Some("EVT-100".into()),
            description: String::new(),
            start_datetime: "2024-05-01T09:00:00Z".into(),
            finish_datetime: "2024-05-01T17:00:00Z".into(),
            start_timezone_abbr: "UTC".into(),
            finish_timezone_abbr: "UTC".into(),
            session_type: SessionType::Venue,
            source_status: SessionStatus::Draft,
            source_created: None,
            source_modified: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
            source_modified_raw: "2024-02-01T00:00:00Z".into(),
            source_event_id: Some(900),
            source_event_guid: Some("5B2E1C8C-3F5D-4C8E-9A51-0D7A4C1B2E3F".into()),
        }
    }

    #[test]
    fn valid_record_passes() {
        let fields = validate(mapped()).unwrap();
        assert_eq!(fields.name, "EVT-100");
        assert_eq!(fields.source_event_id, 900);
        assert_eq!(
            fields.source_event_guid.to_string(),
            "5b2e1c8c-3f5d-4c8e-9a51-0d7a4c1b2e3f"
        );
    }

    #[test]
    fn blank_name_is_stored_verbatim() {
        let mut m = mapped();
        m.name = Some("   ".into());
        assert_eq!(validate(m).unwrap().name, "   ");

        let mut m = mapped();
        m.name = Some(String::new());
        assert_eq!(validate(m).unwrap().name, "");
    }

    #[test]
    fn missing_name_fails() {
        let mut m = mapped();
        m.name = None;
        assert_eq!(validate(m).unwrap_err().field, "name");
    }

    #[test]
    fn long_name_fails() {
        let mut m = mapped();
        m.name = Some("x".repeat(MAX_NAME_LEN + 1));
        assert_eq!(validate(m).unwrap_err().field, "name");

        let mut m = mapped();
        m.name = Some("é".repeat(MAX_NAME_LEN));
        assert!(validate(m).is_ok());
    }

    #[test]
    fn event_linkage_required() {
        let mut m = mapped();
        m.source_event_id = None;
        assert_eq!(validate(m).unwrap_err().field, "source_event_id");

        let mut m = mapped();
        m.source_event_id = Some(0);
        assert_eq!(validate(m).unwrap_err().field, "source_event_id");

        let mut m = mapped();
        m.source_event_guid = Some("not-a-guid".into());
        let err = validate(m).unwrap_err();
        assert_eq!(err.field, "source_event_guid");
        assert!(err.reason.starts_with("is not a GUID"));
    }

    #[test]
    fn times_required() {
        let mut m = mapped();
        m.finish_datetime = String::new();
        assert_eq!(validate(m).unwrap_err().field, "finish_datetime");
    }

    #[test]
    fn converts_into_sync_error() {
        let mut m = mapped();
        m.source_id = 0;
        let err: SyncError = validate(m).unwrap_err().into();
        assert!(err.is_record_level());
        assert_eq!(err.source_id(), Some(0));
    }
}
