//! Session change notifications.
//!
//! An event is emitted once per real create or update, after the write
//! succeeds. Re-processing an unchanged record emits nothing.

use crate::entity::LocalSession;
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

/// A committed change to a local session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A session was created.
    Created(LocalSession),
    /// An existing session changed.
    Updated(LocalSession),
}

impl SessionEvent {
    /// Returns the affected session.
    pub fn session(&self) -> &LocalSession {
        match self {
            SessionEvent::Created(s) | SessionEvent::Updated(s) => s,
        }
    }

    /// Returns true for a creation event.
    pub fn is_created(&self) -> bool {
        matches!(self, SessionEvent::Created(_))
    }
}

/// Receives session change events.
pub trait NotificationSink: Send + Sync {
    /// Delivers one event. Must not fail the write that produced it.
    fn notify(&self, event: &SessionEvent);
}

impl<T: NotificationSink + ?Sized> NotificationSink for Arc<T> {
    fn notify(&self, event: &SessionEvent) {
        (**self).notify(event)
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&self, _event: &SessionEvent) {}
}

/// Fans session events out to subscribers and keeps a bounded history.
pub struct SessionFeed {
    subscribers: RwLock<Vec<Sender<SessionEvent>>>,
    history: RwLock<VecDeque<SessionEvent>>,
    max_history: usize,
}

impl SessionFeed {
    /// Creates a feed keeping the last 1000 events.
    pub fn new() -> Self {
        Self::with_max_history(1000)
    }

    /// Creates a feed with a specific history limit.
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            history: RwLock::new(VecDeque::new()),
            max_history,
        }
    }

    /// Returns a receiver for all future events.
    pub fn subscribe(&self) -> Receiver<SessionEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Publishes an event. Disconnected subscribers are dropped.
    pub fn publish(&self, event: SessionEvent) {
        {
            let mut history = self.history.write();
            history.push_back(event.clone());
            while history.len() > self.max_history {
                history.pop_front();
            }
        }
        self.subscribers
            .write()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Returns the retained events, oldest first.
    pub fn history(&self) -> Vec<SessionEvent> {
        self.history.read().iter().cloned().collect()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Clears the history.
    pub fn clear_history(&self) {
        self.history.write().clear();
    }
}

impl Default for SessionFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionFeed")
            .field("subscribers", &self.subscriber_count())
            .field("history_len", &self.history.read().len())
            .field("max_history", &self.max_history)
            .finish()
    }
}

impl NotificationSink for SessionFeed {
    fn notify(&self, event: &SessionEvent) {
        self.publish(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::tests::sample_fields;

    #[test]
    fn subscribers_receive_events() {
        let feed = SessionFeed::new();
        let rx = feed.subscribe();
        let session = LocalSession::new(sample_fields(1));

        feed.notify(&SessionEvent::Created(session.clone()));
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::Created(session));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn history_is_bounded() {
        let feed = SessionFeed::with_max_history(2);
        for id in 1..=3 {
            feed.publish(SessionEvent::Updated(LocalSession::new(sample_fields(id))));
        }
        let ids: Vec<u64> = feed.history().iter().map(|e| e.session().source_id()).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn dropped_receivers_are_pruned() {
        let feed = SessionFeed::new();
        let rx = feed.subscribe();
        let _kept = feed.subscribe();
        drop(rx);
        assert_eq!(feed.subscriber_count(), 2);

        feed.publish(SessionEvent::Created(LocalSession::new(sample_fields(1))));
        assert_eq!(feed.subscriber_count(), 1);
    }

    #[test]
    fn null_sink_ignores_events() {
        NullSink.notify(&SessionEvent::Created(LocalSession::new(sample_fields(1))));
    }
}
