//! Sync run state machine.
//!
//! A run moves through `Idle → FetchingPage → ProcessingRecord →
//! AdvancingCursor → (FetchingPage | Idle | Aborted)`. The cursor is saved
//! after every stored record, so an aborted run resumes exactly after the
//! last record it committed.

use crate::clock::{Clock, SystemClock};
use crate::config::SyncConfig;
use crate::cursor::{CursorState, JobKey};
use crate::error::{SyncError, SyncResult};
use crate::fetcher::PageSource;
use crate::mapper::map_session;
use crate::notify::NotificationSink;
use crate::store::{CursorStore, SessionStore};
use crate::upsert::{UpsertEngine, UpsertResult};
use crate::validate::validate;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use sessync_protocol::RemoteSession;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use uuid::Uuid;

/// The current state of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No run in progress.
    Idle,
    /// Waiting for a page.
    FetchingPage,
    /// Mapping, validating and storing a record.
    ProcessingRecord,
    /// Saving the cursor after a stored record.
    AdvancingCursor,
    /// The last run ended with a fatal error.
    Aborted,
}

impl RunState {
    /// Returns true while a run is in progress.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            RunState::FetchingPage | RunState::ProcessingRecord | RunState::AdvancingCursor
        )
    }

    /// Returns true if a new run may start.
    pub fn can_start_run(&self) -> bool {
        matches!(self, RunState::Idle | RunState::Aborted)
    }
}

/// Kind of a record-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordErrorKind {
    /// The store rejected the write.
    Constraint,
    /// The mapped record failed validation.
    Validation,
}

/// A record that was skipped during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordError {
    /// External id of the record.
    pub source_id: u64,
    /// Modification time of the record.
    pub last_modified: DateTime<Utc>,
    /// Failure kind.
    pub kind: RecordErrorKind,
    /// Failure message.
    pub message: String,
}

impl RecordError {
    fn from_sync_error(record: &RemoteSession, err: &SyncError) -> Self {
        let kind = match err {
            SyncError::Validation { .. } => RecordErrorKind::Validation,
            _ => RecordErrorKind::Constraint,
        };
        Self {
            source_id: record.session_id,
            last_modified: record.last_modified.at(),
            kind,
            message: err.to_string(),
        }
    }
}

/// Outcome of one run, complete or partial.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Run id, also recorded on the tracing span.
    pub run_id: Uuid,
    /// Job the run belongs to.
    pub job: JobKey,
    /// Pages fetched.
    pub pages_fetched: u64,
    /// Records delivered by the remote.
    pub records_seen: u64,
    /// Sessions created.
    pub created: u64,
    /// Sessions updated.
    pub updated: u64,
    /// Records stored without change.
    pub unchanged: u64,
    /// Records at or before the cursor, skipped.
    pub stale: u64,
    /// Records skipped because of record-level failures.
    pub errors: Vec<RecordError>,
    /// Last durably saved cursor.
    pub cursor: CursorState,
    /// Wall time of the run.
    pub duration: Duration,
}

impl RunReport {
    fn new(run_id: Uuid, job: JobKey) -> Self {
        Self {
            run_id,
            cursor: CursorState::new(job.clone()),
            job,
            pages_fetched: 0,
            records_seen: 0,
            created: 0,
            updated: 0,
            unchanged: 0,
            stale: 0,
            errors: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    /// Returns true if no record failed.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of records that were written.
    pub fn written(&self) -> u64 {
        self.created + self.updated
    }

    fn tally(&mut self, result: &UpsertResult) {
        if result.was_created {
            self.created += 1;
        } else if result.changed {
            self.updated += 1;
        } else {
            self.unchanged += 1;
        }
    }
}

/// A run that ended with a fatal error.
#[derive(Error, Debug)]
#[error("sync run {} aborted: {error}", .report.run_id)]
pub struct RunAborted {
    /// The fatal error.
    #[source]
    pub error: SyncError,
    /// Progress made before the abort.
    pub report: RunReport,
}

/// Cumulative statistics across runs.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Runs that finished normally.
    pub runs_completed: u64,
    /// Runs that aborted.
    pub runs_aborted: u64,
    /// Sessions created.
    pub sessions_created: u64,
    /// Sessions updated.
    pub sessions_updated: u64,
    /// Records skipped because of record-level failures.
    pub record_errors: u64,
    /// Id of the most recent run.
    pub last_run_id: Option<Uuid>,
    /// End time of the most recent run.
    pub last_run_time: Option<DateTime<Utc>>,
    /// Error of the most recent aborted run.
    pub last_error: Option<String>,
}

/// Cancels a run from another thread.
///
/// Cancellation is observed between records and between pages. A request
/// stays pending until a run observes it or ends; one made while no run is
/// active cancels the next run before its first fetch.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Requests cancellation of the run in progress.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Drives incremental sync runs for one job.
pub struct SyncOrchestrator<P, S, N> {
    config: SyncConfig,
    source: P,
    store: Arc<S>,
    upsert: UpsertEngine<Arc<S>, N>,
    clock: Arc<dyn Clock>,
    state: RwLock<RunState>,
    stats: RwLock<SyncStats>,
    cancel: CancelHandle,
}

impl<P, S, N> SyncOrchestrator<P, S, N>
where
    P: PageSource,
    S: SessionStore + CursorStore,
    N: NotificationSink,
{
    /// Creates an orchestrator. Fails on invalid configuration.
    pub fn new(config: SyncConfig, source: P, store: Arc<S>, sink: N) -> SyncResult<Self> {
        config.validate()?;
        Ok(Self {
            upsert: UpsertEngine::new(store.clone(), sink),
            config,
            source,
            store,
            clock: Arc::new(SystemClock),
            state: RwLock::new(RunState::Idle),
            stats: RwLock::new(SyncStats::default()),
            cancel: CancelHandle::default(),
        })
    }

    /// Replaces the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the page source.
    pub fn source(&self) -> &P {
        &self.source
    }

    /// Returns the store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Returns the notification sink.
    pub fn sink(&self) -> &N {
        self.upsert.sink()
    }

    /// Gets the current state.
    pub fn state(&self) -> RunState {
        *self.state.read()
    }

    /// Gets the cumulative stats.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Shares an existing cancel handle.
    pub fn with_cancel_handle(mut self, handle: CancelHandle) -> Self {
        self.cancel = handle;
        self
    }

    /// Returns a handle that cancels the run in progress.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Loads the durable cursor of this job.
    pub fn cursor(&self) -> SyncResult<CursorState> {
        Ok(self.store.load_cursor(&self.config.job)?)
    }

    fn set_state(&self, state: RunState) {
        *self.state.write() = state;
    }

    fn check_cancelled(&self) -> SyncResult<()> {
        if self.cancel.is_cancelled() {
            Err(SyncError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn begin(&self) -> SyncResult<()> {
        let mut state = self.state.write();
        if !state.can_start_run() {
            return Err(SyncError::InvalidStateTransition {
                from: format!("{:?}", *state),
                to: format!("{:?}", RunState::FetchingPage),
            });
        }
        *state = RunState::FetchingPage;
        Ok(())
    }

    /// Performs one run: pages until the remote reports no more.
    ///
    /// Record-level failures are collected in the report and never abort
    /// the run. Any other failure aborts it; the cursor then stays at the
    /// last committed record.
    pub fn run(&self) -> Result<RunReport, RunAborted> {
        let started = Instant::now();
        let run_id = Uuid::new_v4();
        let mut report = RunReport::new(run_id, self.config.job.clone());

        if let Err(error) = self.begin() {
            return Err(RunAborted { error, report });
        }

        let span = tracing::info_span!("sync_run", %run_id, job = %self.config.job);
        let _enter = span.enter();

        let outcome = self.execute(&mut report);
        report.duration = started.elapsed();
        self.cancel.reset();

        let mut stats = self.stats.write();
        stats.sessions_created += report.created;
        stats.sessions_updated += report.updated;
        stats.record_errors += report.errors.len() as u64;
        stats.last_run_id = Some(run_id);
        stats.last_run_time = Some(self.clock.now());

        match outcome {
            Ok(()) => {
                stats.runs_completed += 1;
                drop(stats);
                self.set_state(RunState::Idle);
                tracing::info!(
                    pages = report.pages_fetched,
                    created = report.created,
                    updated = report.updated,
                    unchanged = report.unchanged,
                    stale = report.stale,
                    errors = report.errors.len(),
                    cursor = %report.cursor.position(),
                    "sync run completed"
                );
                Ok(report)
            }
            Err(error) => {
                stats.runs_aborted += 1;
                stats.last_error = Some(error.to_string());
                drop(stats);
                self.set_state(RunState::Aborted);
                tracing::error!(
                    error = %error,
                    pages = report.pages_fetched,
                    cursor = %report.cursor.position(),
                    "sync run aborted"
                );
                Err(RunAborted { error, report })
            }
        }
    }

    fn execute(&self, report: &mut RunReport) -> SyncResult<()> {
        let mut cursor = self.store.load_cursor(&self.config.job)?;
        report.cursor = cursor.clone();
        tracing::debug!(cursor = %cursor.position(), "loaded cursor");

        // Fetch position: the durable cursor, or the last record seen on a
        // page when that record failed. Never persisted.
        let mut position = cursor.clone();
        let mut stalled_pages = 0u32;

        loop {
            self.check_cancelled()?;
            self.set_state(RunState::FetchingPage);
            let page = self.source.fetch_page(&position, self.config.page_size)?;
            report.pages_fetched += 1;

            let has_more = page.has_more();
            let before = position.position();
            tracing::debug!(
                page = report.pages_fetched,
                records = page.len(),
                has_more,
                "fetched page"
            );

            let mut records = page.records;
            records.sort_by_key(RemoteSession::order_key);

            for record in &records {
                self.check_cancelled()?;
                self.set_state(RunState::ProcessingRecord);
                report.records_seen += 1;

                let (modified, id) = record.order_key();
                if !position.is_after(modified, id) {
                    tracing::debug!(source_id = id, "skipping record at or before cursor");
                    report.stale += 1;
                    continue;
                }

                match self.process(record) {
                    Ok(result) => {
                        report.tally(&result);
                        self.set_state(RunState::AdvancingCursor);
                        let mut next = cursor.clone();
                        next.advance(modified, id, self.clock.now())?;
                        self.store.save_cursor(&next)?;
                        cursor = next;
                        report.cursor = cursor.clone();
                    }
                    Err(err) if err.is_record_level() => {
                        tracing::warn!(source_id = id, error = %err, "skipping record");
                        report.errors.push(RecordError::from_sync_error(record, &err));
                    }
                    Err(err) => return Err(err),
                }
                position.last_modified = modified;
                position.last_seen_id = Some(id);
            }

            if !has_more {
                return Ok(());
            }
            if position.position() == before {
                stalled_pages += 1;
                tracing::debug!(stalled_pages, "page brought no progress");
                if stalled_pages >= self.config.max_stalled_pages {
                    return Err(SyncError::Stalled {
                        page: report.pages_fetched,
                        pages: stalled_pages,
                    });
                }
            } else {
                stalled_pages = 0;
            }
        }
    }

    fn process(&self, record: &RemoteSession) -> SyncResult<UpsertResult> {
        let mapped = map_session(record, &self.config.platform);
        let fields = validate(mapped)?;
        self.upsert.upsert(fields)
    }
}

impl<P, S, N> std::fmt::Debug for SyncOrchestrator<P, S, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncOrchestrator")
            .field("job", &self.config.job)
            .field("state", &*self.state.read())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::fetcher::MockPageSource;
    use crate::notify::{NullSink, SessionEvent, SessionFeed};
    use crate::store::MemoryStore;
    use chrono::TimeZone;
    use sessync_protocol::{RemoteEvent, SessionPage, SessionStatus, SessionType};

    type Orchestrator = SyncOrchestrator<Arc<MockPageSource>, MemoryStore, Arc<SessionFeed>>;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn remote(id: u64, secs: i64) -> RemoteSession {
        RemoteSession {
            session_id: id,
            name: Some(format!("Session {id}")),
            description: Some("Workshop".into()),
            start_datetime: "2024-05-01T09:00:00.000+12:00".into(),
            finish_datetime: "2024-05-01T17:00:00.000+12:00".into(),
            start_timezone_abbr: "NZST".into(),
            finish_timezone_abbr: "NZST".into(),
            session_type: SessionType::Venue,
            status: SessionStatus::Active,
            created: None,
            last_modified: t(secs).into(),
            event: Some(RemoteEvent {
                event_id: 900,
                unique_identifier: Some("5b2e1c8c-3f5d-4c8e-9a51-0d7a4c1b2e3f".into()),
                code: Some("EVT-100".into()),
                name: Some("Induction".into()),
            }),
        }
    }

    fn setup() -> (Orchestrator, Arc<MockPageSource>, Arc<MemoryStore>, Arc<SessionFeed>) {
        let source = Arc::new(MockPageSource::new());
        let store = Arc::new(MemoryStore::new());
        let feed = Arc::new(SessionFeed::new());
        let config = SyncConfig::new("acme.example.com", "events/-/sessions/");
        let orchestrator = SyncOrchestrator::new(config, source.clone(), store.clone(), feed.clone())
            .unwrap()
            .with_clock(Arc::new(FixedClock::new(t(1_000))));
        (orchestrator, source, store, feed)
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = SyncConfig::new("", "sessions/");
        let result = SyncOrchestrator::new(
            config,
            MockPageSource::new(),
            Arc::new(MemoryStore::new()),
            crate::notify::NullSink,
        );
        assert!(matches!(result, Err(SyncError::Config(_))));
    }

    #[test]
    fn single_page_run_stores_and_commits() {
        let (orch, source, store, feed) = setup();
        source.push_page(SessionPage::new(vec![remote(1, 10), remote(2, 20)], false));

        let report = orch.run().unwrap();
        assert_eq!(report.pages_fetched, 1);
        assert_eq!(report.created, 2);
        assert_eq!(report.cursor.last_modified, t(20));
        assert_eq!(report.cursor.last_seen_id, Some(2));
        assert_eq!(report.cursor.last_request_time, Some(t(1_000)));
        assert_eq!(orch.cursor().unwrap(), report.cursor);
        assert_eq!(store.len(), 2);
        assert_eq!(feed.history().len(), 2);
        assert_eq!(orch.state(), RunState::Idle);
        assert_eq!(store.cursor_save_count(), 2);
    }

    #[test]
    fn out_of_order_page_is_processed_in_key_order() {
        let (orch, source, _store, feed) = setup();
        source.push_page(SessionPage::new(
            vec![remote(9, 20), remote(7, 10), remote(3, 10)],
            false,
        ));

        orch.run().unwrap();
        let order: Vec<u64> = feed.history().iter().map(|e| e.session().source_id()).collect();
        assert_eq!(order, vec![3, 7, 9]);
    }

    #[test]
    fn second_run_resumes_after_cursor() {
        let (orch, source, _store, _feed) = setup();
        source.push_page(SessionPage::new(vec![remote(5, 10)], false));
        orch.run().unwrap();

        source.push_page(SessionPage::new(vec![remote(7, 10)], false));
        orch.run().unwrap();

        let requests = source.requests();
        assert_eq!(requests[0].last_seen_id, None);
        assert_eq!(requests[1].last_modified, t(10));
        assert_eq!(requests[1].last_seen_id, Some(5));
    }

    #[test]
    fn record_errors_do_not_stop_the_run() {
        let (orch, source, store, _feed) = setup();
        store.reject_source_id(3);
        let mut invalid = remote(4, 40);
        invalid.event = None;
        source.push_page(SessionPage::new(
            (1..=5).map(|i| if i == 4 { invalid.clone() } else { remote(i, i as i64 * 10) }).collect(),
            false,
        ));

        let report = orch.run().unwrap();
        assert_eq!(report.created, 3);
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.errors[0].source_id, 3);
        assert_eq!(report.errors[0].kind, RecordErrorKind::Constraint);
        assert_eq!(report.errors[1].source_id, 4);
        assert_eq!(report.errors[1].kind, RecordErrorKind::Validation);
        assert_eq!(report.cursor.last_seen_id, Some(5));
        assert!(!report.is_clean());
        assert_eq!(orch.stats().record_errors, 2);
    }

    #[test]
    fn transport_error_aborts_without_moving_cursor() {
        let (orch, source, _store, _feed) = setup();
        source.push_page(SessionPage::new(vec![remote(1, 10)], true));
        source.push_error(SyncError::transport_retryable("connection reset"));

        let aborted = orch.run().unwrap_err();
        assert!(matches!(aborted.error, SyncError::Transport { .. }));
        assert_eq!(aborted.report.pages_fetched, 1);
        assert_eq!(aborted.report.cursor.last_seen_id, Some(1));
        assert_eq!(orch.cursor().unwrap().last_seen_id, Some(1));
        assert_eq!(orch.state(), RunState::Aborted);
        assert_eq!(orch.stats().runs_aborted, 1);

        source.push_page(SessionPage::new(vec![remote(2, 20)], false));
        assert!(orch.run().is_ok());
        assert_eq!(orch.state(), RunState::Idle);
    }

    #[test]
    fn protocol_error_aborts_at_last_committed_record() {
        let (orch, source, store, feed) = setup();
        source.push_page(SessionPage::new(vec![remote(1, 10), remote(2, 20)], true));
        source.push_error(SyncError::Protocol("failed to decode page: expected value".into()));

        let aborted = orch.run().unwrap_err();
        assert!(matches!(aborted.error, SyncError::Protocol(_)));
        assert_eq!(aborted.report.pages_fetched, 1);
        assert_eq!(aborted.report.created, 2);
        assert_eq!(aborted.report.cursor.position().watermark, t(20));
        assert_eq!(aborted.report.cursor.last_seen_id, Some(2));
        assert_eq!(orch.cursor().unwrap(), aborted.report.cursor);
        assert_eq!(orch.state(), RunState::Aborted);
        assert_eq!(store.len(), 2);
        assert_eq!(feed.history().len(), 2);

        let stats = orch.stats();
        assert_eq!(stats.runs_aborted, 1);
        assert!(stats.last_error.unwrap().contains("protocol error"));
    }

    #[test]
    fn cursor_save_failure_is_fatal() {
        let (orch, source, store, _feed) = setup();
        store.set_fail_cursor_saves(true);
        source.push_page(SessionPage::new(vec![remote(1, 10), remote(2, 20)], false));

        let aborted = orch.run().unwrap_err();
        assert!(matches!(aborted.error, SyncError::Store(_)));
        assert_eq!(aborted.report.created, 1);
        assert_eq!(aborted.report.cursor, CursorState::new(orch.config().job.clone()));
    }

    #[test]
    fn repeated_pages_without_progress_stall() {
        let source = Arc::new(MockPageSource::new());
        let store = Arc::new(MemoryStore::new());
        let config =
            SyncConfig::new("acme.example.com", "events/-/sessions/").with_max_stalled_pages(2);
        let orch = SyncOrchestrator::new(config, source.clone(), store, NullSink).unwrap();
        source.push_page(SessionPage::new(vec![remote(1, 10)], true));
        source.push_page(SessionPage::new(vec![remote(1, 10)], true));
        source.push_page(SessionPage::new(vec![remote(1, 10)], true));

        let aborted = orch.run().unwrap_err();
        assert!(matches!(
            aborted.error,
            SyncError::Stalled { page: 3, pages: 2 }
        ));
        assert_eq!(aborted.report.stale, 2);
        assert_eq!(source.call_count(), 3);
    }

    #[test]
    fn empty_pages_follow_has_more_until_last() {
        let (orch, source, store, _feed) = setup();
        source.push_page(SessionPage::new(Vec::new(), true));
        source.push_page(SessionPage::new(Vec::new(), true));
        source.push_page(SessionPage::new(Vec::new(), false));

        let report = orch.run().unwrap();
        assert_eq!(source.call_count(), 3);
        assert_eq!(report.pages_fetched, 3);
        assert_eq!(orch.state(), RunState::Idle);
        assert!(store.is_empty());
    }

    #[test]
    fn progress_resets_stall_count() {
        let source = Arc::new(MockPageSource::new());
        let store = Arc::new(MemoryStore::new());
        let config =
            SyncConfig::new("acme.example.com", "events/-/sessions/").with_max_stalled_pages(2);
        let orch = SyncOrchestrator::new(config, source.clone(), store.clone(), NullSink).unwrap();
        source.push_page(SessionPage::new(Vec::new(), true));
        source.push_page(SessionPage::new(vec![remote(1, 10)], true));
        source.push_page(SessionPage::new(Vec::new(), true));
        source.push_page(SessionPage::new(vec![remote(2, 20)], false));

        let report = orch.run().unwrap();
        assert_eq!(report.created, 2);
        assert_eq!(source.call_count(), 4);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn fully_failed_page_moves_fetch_position_only() {
        let (orch, source, store, _feed) = setup();
        store.reject_source_id(1);
        source.push_page(SessionPage::new(vec![remote(1, 10)], true));
        source.push_page(SessionPage::new(Vec::new(), false));

        let report = orch.run().unwrap();
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.cursor, CursorState::new(orch.config().job.clone()));
        assert_eq!(orch.cursor().unwrap().last_seen_id, None);

        let requests = source.requests();
        assert_eq!(requests[1].last_modified, t(10));
        assert_eq!(requests[1].last_seen_id, Some(1));
    }

    #[test]
    fn stale_records_are_skipped() {
        let (orch, source, store, feed) = setup();
        source.push_page(SessionPage::new(vec![remote(5, 10)], false));
        orch.run().unwrap();

        source.push_page(SessionPage::new(vec![remote(4, 10), remote(5, 10), remote(6, 10)], false));
        let report = orch.run().unwrap();
        assert_eq!(report.stale, 2);
        assert_eq!(report.created, 1);
        assert_eq!(store.len(), 2);
        assert_eq!(feed.history().len(), 2);
    }

    #[test]
    fn unchanged_records_still_advance_cursor() {
        let (orch, source, store, feed) = setup();
        source.push_page(SessionPage::new(vec![remote(1, 10)], false));
        orch.run().unwrap();

        let mut cursor = orch.cursor().unwrap();
        cursor.reset();
        store.save_cursor(&cursor).unwrap();

        source.push_page(SessionPage::new(vec![remote(1, 10)], false));
        let report = orch.run().unwrap();
        assert_eq!(report.unchanged, 1);
        assert_eq!(report.cursor.last_seen_id, Some(1));
        assert_eq!(feed.history().len(), 1);
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn updates_emit_updated_events() {
        let (orch, source, _store, feed) = setup();
        source.push_page(SessionPage::new(vec![remote(1, 10)], false));
        orch.run().unwrap();

        let mut changed = remote(1, 20);
        changed.status = SessionStatus::Cancelled;
        source.push_page(SessionPage::new(vec![changed], false));
        let report = orch.run().unwrap();

        assert_eq!(report.updated, 1);
        assert!(matches!(feed.history()[1], SessionEvent::Updated(_)));
        assert_eq!(orch.stats().sessions_updated, 1);
        assert_eq!(orch.stats().runs_completed, 2);
    }

    struct CancellingSink(CancelHandle);

    impl NotificationSink for CancellingSink {
        fn notify(&self, _event: &SessionEvent) {
            self.0.cancel();
        }
    }

    #[test]
    fn cancellation_stops_between_records() {
        let source = Arc::new(MockPageSource::new());
        let store = Arc::new(MemoryStore::new());
        let handle = CancelHandle::default();
        let config = SyncConfig::new("acme.example.com", "events/-/sessions/");
        let orch = SyncOrchestrator::new(
            config,
            source.clone(),
            store.clone(),
            CancellingSink(handle.clone()),
        )
        .unwrap()
        .with_cancel_handle(handle.clone());

        source.push_page(SessionPage::new(vec![remote(1, 10), remote(2, 20)], true));

        let aborted = orch.run().unwrap_err();
        assert!(matches!(aborted.error, SyncError::Cancelled));
        assert_eq!(aborted.report.created, 1);
        assert_eq!(orch.cursor().unwrap().last_seen_id, Some(1));
        assert_eq!(store.len(), 1);
        assert_eq!(source.call_count(), 1);
    }

    #[test]
    fn cancel_before_run_is_honored_once() {
        let (orch, source, store, _feed) = setup();
        orch.cancel_handle().cancel();

        let aborted = orch.run().unwrap_err();
        assert!(matches!(aborted.error, SyncError::Cancelled));
        assert_eq!(source.call_count(), 0);
        assert_eq!(orch.state(), RunState::Aborted);
        assert!(!orch.cancel_handle().is_cancelled());

        source.push_page(SessionPage::new(vec![remote(1, 10)], false));
        let report = orch.run().unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn idle_run_leaves_cursor_untouched() {
        let (orch, source, _store, _feed) = setup();
        source.push_page(SessionPage::new(vec![remote(1, 10)], false));
        let first = orch.run().unwrap();

        source.push_page(SessionPage::default());
        let second = orch.run().unwrap();
        assert_eq!(second.cursor, first.cursor);
        assert_eq!(second.records_seen, 0);
    }
}
