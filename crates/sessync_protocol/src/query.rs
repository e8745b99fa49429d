//! Query construction for paged session requests.
//!
//! Every page request filters strictly after the cursor position and orders
//! by `(LastModifiedDateTime, SessionID)` ascending. The filter shape:
//!
//! ```text
//! (LastModifiedDateTime gt datetime('W'))
//!   OR (LastModifiedDateTime eq datetime('W') AND SessionID gt ID)
//! ```
//!
//! The second clause is present only when the cursor carries a last id.

use crate::time::format_timestamp;
use chrono::{DateTime, Utc};

/// Default page size.
pub const DEFAULT_PAGE_SIZE: u32 = 250;

/// Largest page size the remote accepts.
pub const MAX_PAGE_SIZE: u32 = 250;

/// Expand directive that inlines the parent event.
pub const EXPAND_EVENT: &str = "EventSession/Event";

/// Ordering expression; must match the filter's composite key.
pub const ORDER_BY: &str = "LastModifiedDateTime ASC,SessionID ASC";

/// Versioned API prefix for authenticated resources.
pub const API_PATH: &str = "api/2012-02-01/auth/resources";

/// Builds the cursor filter expression.
///
/// `last_id` of `Some(0)` is a real id and still yields the tie-break clause.
pub fn build_filter(watermark: &DateTime<Utc>, last_id: Option<u64>) -> String {
    let ts = format_timestamp(watermark);
    let mut filter = format!("(LastModifiedDateTime gt datetime('{ts}'))");
    if let Some(id) = last_id {
        filter.push_str(&format!(
            " OR (LastModifiedDateTime eq datetime('{ts}') AND SessionID gt {id})"
        ));
    }
    filter
}

/// Builds the collection URL for `endpoint` on `platform`.
///
/// `platform` is a bare host (`acme.example.com`) or a full origin
/// (`http://127.0.0.1:8080`); bare hosts get `https://`.
pub fn resource_url(platform: &str, endpoint: &str) -> String {
    let platform = platform.trim().trim_end_matches('/');
    let origin = if platform.starts_with("http://") || platform.starts_with("https://") {
        platform.to_string()
    } else {
        format!("https://{platform}")
    };
    format!("{origin}/{API_PATH}/{}", endpoint.trim().trim_start_matches('/'))
}

/// Parameters of one page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    /// Page size (`$top`).
    pub top: u32,
    /// Filter expression (`$filter`).
    pub filter: String,
    /// Ordering expression (`$orderby`).
    pub order_by: String,
    /// Expand directive (`$expand`).
    pub expand: String,
}

impl PageQuery {
    /// Creates a query for records strictly after `(watermark, last_id)`.
    ///
    /// `top` is clamped into `1..=MAX_PAGE_SIZE`.
    pub fn after(watermark: &DateTime<Utc>, last_id: Option<u64>, top: u32) -> Self {
        Self {
            top: top.clamp(1, MAX_PAGE_SIZE),
            filter: build_filter(watermark, last_id),
            order_by: ORDER_BY.to_string(),
            expand: EXPAND_EVENT.to_string(),
        }
    }

    /// Returns the query string parameters in request order.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        vec![
            ("$top".to_string(), self.top.to_string()),
            ("$expand".to_string(), self.expand.clone()),
            ("$filter".to_string(), self.filter.clone()),
            ("$orderby".to_string(), self.order_by.clone()),
        ]
    }
}
