//! Idempotent insert-or-update keyed by external id.

use crate::entity::{LocalSession, SessionFields};
use crate::error::{SyncError, SyncResult};
use crate::notify::{NotificationSink, SessionEvent};
use crate::store::{SessionStore, StoreError};

/// Outcome of one upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertResult {
    /// A new local record was created.
    pub was_created: bool,
    /// The stored record was written (created or updated).
    pub changed: bool,
    /// The record as stored after the call.
    pub session: LocalSession,
}

/// Writes validated sessions and notifies on real changes.
#[derive(Debug)]
pub struct UpsertEngine<S, N> {
    store: S,
    sink: N,
}

impl<S: SessionStore, N: NotificationSink> UpsertEngine<S, N> {
    /// Creates an engine over a store and a sink.
    pub fn new(store: S, sink: N) -> Self {
        Self { store, sink }
    }

    /// Returns the store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the sink.
    pub fn sink(&self) -> &N {
        &self.sink
    }

    /// Inserts or updates the session with `fields.source_id`.
    ///
    /// An existing record whose fields are all equal is left untouched and
    /// no event is emitted.
    pub fn upsert(&self, fields: SessionFields) -> SyncResult<UpsertResult> {
        let source_id = fields.source_id;
        let existing = self
            .store
            .find_by_source_id(source_id)
            .map_err(|e| store_error(source_id, e))?;

        match existing {
            None => {
                let session = self
                    .store
                    .insert(fields)
                    .map_err(|e| store_error(source_id, e))?;
                tracing::debug!(source_id, id = %session.id, "session created");
                self.sink.notify(&SessionEvent::Created(session.clone()));
                Ok(UpsertResult {
                    was_created: true,
                    changed: true,
                    session,
                })
            }
            Some(current) if current.fields == fields => Ok(UpsertResult {
                was_created: false,
                changed: false,
                session: current,
            }),
            Some(current) => {
                let session = self
                    .store
                    .update(LocalSession {
                        id: current.id,
                        fields,
                    })
                    .map_err(|e| store_error(source_id, e))?;
                tracing::debug!(source_id, id = %session.id, "session updated");
                self.sink.notify(&SessionEvent::Updated(session.clone()));
                Ok(UpsertResult {
                    was_created: false,
                    changed: true,
                    session,
                })
            }
        }
    }
}

fn store_error(source_id: u64, err: StoreError) -> SyncError {
    match err {
        StoreError::Constraint(message) => SyncError::Constraint { source_id, message },
        other => other.into(),
    }
}
