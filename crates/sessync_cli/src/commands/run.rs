//! Run command implementation.

use crate::client::ReqwestClient;
use sessync_engine::{
    HttpPageSource, NotificationSink, RunReport, SessionEvent, SyncConfig, SyncOrchestrator,
};
use sessync_store::FileStore;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Arguments of the run command.
pub struct RunArgs {
    pub platform: String,
    pub username: String,
    pub password: String,
    pub endpoint: String,
    pub page_size: u32,
    pub timeout_secs: u64,
    pub interval_secs: Option<u64>,
    pub max_stalled_pages: u32,
}

/// Logs every session change.
struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, event: &SessionEvent) {
        let session = event.session();
        let action = if event.is_created() { "created" } else { "updated" };
        tracing::info!(
            source_id = session.source_id(),
            id = %session.id,
            name = %session.fields.name,
            status = %session.fields.source_status,
            "session {action}"
        );
    }
}

/// Runs the sync job once, or repeatedly when an interval is given.
pub fn run(data_dir: &Path, args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = SyncConfig::new(args.platform, args.endpoint)
        .with_page_size(args.page_size)
        .with_fetch_timeout(Duration::from_secs(args.timeout_secs))
        .with_max_stalled_pages(args.max_stalled_pages);
    if let Some(secs) = args.interval_secs {
        config = config.with_run_interval(Duration::from_secs(secs));
    }
    config.validate()?;

    let store = Arc::new(FileStore::open(data_dir)?);
    let _lock = store.lock_job(&config.job)?;

    let client = ReqwestClient::new(args.username, args.password)?;
    let source = HttpPageSource::from_config(&config, client);
    tracing::info!(url = source.url(), job = %config.job, "starting sync");

    let interval = config.run_interval;
    let orchestrator = SyncOrchestrator::new(config, source, store, LogSink)?;

    loop {
        match orchestrator.run() {
            Ok(report) => print_report(&report),
            Err(aborted) => {
                print_report(&aborted.report);
                if interval.is_none() {
                    return Err(aborted.into());
                }
                if !aborted.error.is_retryable() {
                    tracing::warn!(error = %aborted.error, "run failed with a non-retryable error");
                }
            }
        }

        match interval {
            Some(every) => std::thread::sleep(every),
            None => return Ok(()),
        }
    }
}

fn print_report(report: &RunReport) {
    println!(
        "run {}: {} page(s), {} created, {} updated, {} unchanged, {} stale, {} failed in {:?}",
        report.run_id,
        report.pages_fetched,
        report.created,
        report.updated,
        report.unchanged,
        report.stale,
        report.errors.len(),
        report.duration
    );
    for error in &report.errors {
        println!("  session {}: {}", error.source_id, error.message);
    }
    println!("cursor: {}", report.cursor.position());
}
