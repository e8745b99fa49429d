//! Benchmark utilities.

use sessync_protocol::{RemoteSession, SessionPage};
use sessync_testkit::{remote_session, RemoteSessionBuilder};

/// Generates `count` records, `per_second` of them sharing each watermark.
pub fn generate_records(count: u64, per_second: u64) -> Vec<RemoteSession> {
    let per_second = per_second.max(1);
    (1..=count)
        .map(|id| remote_session(id, (id / per_second) as i64))
        .collect()
}

/// Generates records without names, exercising the event fallback.
pub fn generate_unnamed_records(count: u64) -> Vec<RemoteSession> {
    (1..=count)
        .map(|id| {
            RemoteSessionBuilder::new(id)
                .modified(sessync_testkit::ts(id as i64))
                .name(None)
                .build()
        })
        .collect()
}

/// Encodes a full page of `count` records as a JSON body.
pub fn encoded_page(count: u64) -> Vec<u8> {
    SessionPage::new(generate_records(count, 10), true)
        .encode()
        .unwrap_or_default()
}
