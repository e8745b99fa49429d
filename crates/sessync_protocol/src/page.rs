//! Page envelope returned by the collection endpoint.

use crate::error::{ProtocolError, ProtocolResult};
use crate::session::RemoteSession;
use serde::{Deserialize, Serialize};

/// A hypermedia link on a collection page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLink {
    /// Relation, e.g. `next`.
    pub rel: String,
    /// Target URL.
    pub href: String,
}

/// One page of session records.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionPage {
    /// Records in remote delivery order.
    #[serde(rename = "Items", default)]
    pub records: Vec<RemoteSession>,
    /// Navigation links; a `next` link means more pages exist.
    #[serde(rename = "Links", default)]
    pub links: Vec<PageLink>,
}

impl SessionPage {
    /// Creates a page from records and a continuation flag.
    pub fn new(records: Vec<RemoteSession>, has_more: bool) -> Self {
        let links = if has_more {
            vec![PageLink {
                rel: "next".into(),
                href: String::new(),
            }]
        } else {
            Vec::new()
        };
        Self { records, links }
    }

    /// Returns true if the remote signals pages beyond this one.
    pub fn has_more(&self) -> bool {
        self.links.iter().any(|l| l.rel.eq_ignore_ascii_case("next"))
    }

    /// Decodes a page from a JSON body.
    pub fn decode(body: &[u8]) -> ProtocolResult<Self> {
        if body.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(ProtocolError::invalid_structure("empty response body"));
        }
        Ok(serde_json::from_slice(body)?)
    }

    /// Encodes the page as JSON.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the page has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_page_with_next_link() {
        let body = br#"{
            "Items": [{
                "SessionID": 1,
                "Name": "Day 1",
                "StartDateTime": "2024-05-01T09:00:00Z",
                "FinishDateTime": "2024-05-01T17:00:00Z",
                "StartTimeZoneAbbr": "UTC",
                "FinishTimeZoneAbbr": "UTC",
                "SessionType": "Venue",
                "Status": "Draft",
                "LastModifiedDateTime": "2024-02-10T00:00:00Z"
            }],
            "Links": [{"rel": "next", "href": "https://x/next"}]
        }"#;
        let page = SessionPage::decode(body).unwrap();
        assert_eq!(page.len(), 1);
        assert!(page.has_more());
        assert!(page.records[0].event.is_none());
    }

    #[test]
    fn missing_links_means_last_page() {
        let page = SessionPage::decode(br#"{"Items": []}"#).unwrap();
        assert!(page.is_empty());
        assert!(!page.has_more());
    }

    #[test]
    fn empty_body_is_protocol_error() {
        assert!(matches!(
            SessionPage::decode(b"  "),
            Err(ProtocolError::InvalidStructure(_))
        ));
    }

    #[test]
    fn non_json_is_protocol_error() {
        assert!(matches!(
            SessionPage::decode(b"<html>oops</html>"),
            Err(ProtocolError::Json(_))
        ));
    }

    #[test]
    fn constructed_page_signals_more() {
        assert!(SessionPage::new(vec![], true).has_more());
        assert!(!SessionPage::new(vec![], false).has_more());
        let encoded = SessionPage::new(vec![], true).encode().unwrap();
        assert!(SessionPage::decode(&encoded).unwrap().has_more());
    }
}
