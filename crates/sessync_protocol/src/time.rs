//! Timestamp helpers.
//!
//! The remote API emits RFC 3339 timestamps. Some deployments omit the
//! offset; those values are read as UTC.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Initial watermark for a job that has never run.
pub const EPOCH: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

/// Parses a remote timestamp.
///
/// Accepts RFC 3339 (`2024-03-01T09:00:00.000Z`, `...+12:00`) and a bare
/// `YYYY-MM-DDTHH:MM:SS[.fff]` form interpreted as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Formats a timestamp the way the remote filter syntax expects it.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// A remote timestamp: the text as delivered plus its parsed instant.
///
/// Ordering and comparisons use the instant; the text is echoed back into
/// storage untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceTimestamp {
    at: DateTime<Utc>,
    raw: String,
}

impl SourceTimestamp {
    /// Parses a remote timestamp, keeping the original text.
    pub fn parse(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let at = parse_timestamp(&raw)?;
        Some(Self { at, raw })
    }

    /// Returns the parsed instant.
    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }

    /// Returns the text as delivered.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl From<DateTime<Utc>> for SourceTimestamp {
    fn from(at: DateTime<Utc>) -> Self {
        Self {
            raw: format_timestamp(&at),
            at,
        }
    }
}

impl Serialize for SourceTimestamp {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for SourceTimestamp {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        match parse_timestamp(&raw) {
            Some(at) => Ok(Self { at, raw }),
            None => Err(de::Error::custom(format!("invalid timestamp {raw:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_utc_and_offsets() {
        let a = parse_timestamp("2024-03-01T09:00:00Z").unwrap();
        let b = parse_timestamp("2024-03-01T21:00:00+12:00").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap());
    }

    #[test]
    fn parses_offsetless_as_utc() {
        let ts = parse_timestamp("2024-03-01T09:00:00.250").unwrap();
        assert_eq!(ts.timestamp_subsec_millis(), 250);
        assert_eq!(ts, parse_timestamp("2024-03-01T09:00:00.250Z").unwrap());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn format_keeps_fraction_only_when_needed() {
        let whole = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        assert_eq!(format_timestamp(&whole), "2024-03-01T09:00:00Z");

        let fractional = parse_timestamp("2024-03-01T09:00:00.123Z").unwrap();
        assert_eq!(format_timestamp(&fractional), "2024-03-01T09:00:00.123Z");
    }

    #[test]
    fn source_timestamp_keeps_delivered_text() {
        let stamp = SourceTimestamp::parse("2024-03-01T21:00:00.000+12:00").unwrap();
        assert_eq!(stamp.raw(), "2024-03-01T21:00:00.000+12:00");
        assert_eq!(stamp.at(), Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap());

        let json = serde_json::to_string(&stamp).unwrap();
        assert_eq!(json, "\"2024-03-01T21:00:00.000+12:00\"");
        let back: SourceTimestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stamp);

        assert!(serde_json::from_str::<SourceTimestamp>("\"soon\"").is_err());
        assert!(SourceTimestamp::parse("").is_none());
    }

    #[test]
    fn epoch_formats() {
        assert_eq!(format_timestamp(&EPOCH), "1970-01-01T00:00:00Z");
    }
}
