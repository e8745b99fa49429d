//! Property-based test generators using proptest.
//!
//! Timestamps are drawn from a small range so generated collections
//! contain plenty of records that share a watermark.

use crate::fixtures::{ts, RemoteSessionBuilder};
use proptest::prelude::*;
use sessync_protocol::{RemoteSession, SessionStatus, SessionType};
use std::collections::BTreeMap;

/// Strategy for session ids.
pub fn session_id_strategy() -> impl Strategy<Value = u64> {
    1u64..10_000
}

/// Strategy for modification offsets, in seconds.
pub fn modified_offset_strategy() -> impl Strategy<Value = i64> {
    0i64..20
}

/// Strategy for remote statuses, including unknown ones.
pub fn status_strategy() -> impl Strategy<Value = SessionStatus> {
    prop_oneof![
        Just(SessionStatus::Draft),
        Just(SessionStatus::Active),
        Just(SessionStatus::Completed),
        Just(SessionStatus::Cancelled),
        "[A-Z][a-z]{2,8}".prop_map(SessionStatus::from),
    ]
}

/// Strategy for session types.
pub fn session_type_strategy() -> impl Strategy<Value = SessionType> {
    prop_oneof![Just(SessionType::Venue), Just(SessionType::Online)]
}

/// Strategy for one valid record.
pub fn remote_session_strategy() -> impl Strategy<Value = RemoteSession> {
    (
        session_id_strategy(),
        modified_offset_strategy(),
        prop::option::of("[A-Za-z][A-Za-z0-9 ]{0,40}"),
        status_strategy(),
        session_type_strategy(),
    )
        .prop_map(|(id, offset, name, status, session_type)| {
            RemoteSessionBuilder::new(id)
                .modified(ts(offset))
                .name(name.as_deref())
                .status(status)
                .session_type(session_type)
                .build()
        })
}

/// Strategy for a collection of valid records with unique ids.
pub fn remote_collection_strategy(max_len: usize) -> impl Strategy<Value = Vec<RemoteSession>> {
    prop::collection::vec(remote_session_strategy(), 0..=max_len).prop_map(|records| {
        let unique: BTreeMap<u64, RemoteSession> =
            records.into_iter().map(|r| (r.session_id, r)).collect();
        unique.into_values().collect()
    })
}

/// Strategy for page sizes small enough to force paging.
pub fn page_size_strategy() -> impl Strategy<Value = u32> {
    1u32..8
}
