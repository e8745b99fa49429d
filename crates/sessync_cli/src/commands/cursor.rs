//! Cursor command implementation.

use serde::Serialize;
use sessync_engine::protocol::format_timestamp;
use sessync_engine::{CursorStore, JobKey};
use sessync_store::FileStore;
use std::path::Path;

/// Printable cursor.
#[derive(Debug, Serialize)]
pub struct CursorView {
    /// Job key.
    pub job: String,
    /// Watermark.
    pub last_modified: String,
    /// Tie-break id.
    pub last_seen_id: Option<u64>,
    /// Last commit time.
    pub last_request_time: Option<String>,
}

/// Prints the saved cursor of the job on `endpoint`.
pub fn show(data_dir: &Path, endpoint: &str, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileStore::open(data_dir)?;
    let cursor = store.load_cursor(&JobKey::event_sessions(endpoint))?;
    let view = CursorView {
        job: cursor.job.to_string(),
        last_modified: format_timestamp(&cursor.last_modified),
        last_seen_id: cursor.last_seen_id,
        last_request_time: cursor.last_request_time.as_ref().map(format_timestamp),
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&view)?),
        _ => {
            println!("job:           {}", view.job);
            println!("last modified: {}", view.last_modified);
            match view.last_seen_id {
                Some(id) => println!("last seen id:  {id}"),
                None => println!("last seen id:  -"),
            }
            println!(
                "last request:  {}",
                view.last_request_time.as_deref().unwrap_or("never")
            );
        }
    }
    Ok(())
}

/// Rewinds the cursor of the job on `endpoint`.
pub fn reset(data_dir: &Path, endpoint: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileStore::open(data_dir)?;
    let job = JobKey::event_sessions(endpoint);
    let _lock = store.lock_job(&job)?;

    let mut cursor = store.load_cursor(&job)?;
    cursor.reset();
    store.save_cursor(&cursor)?;
    tracing::info!(job = %job, "cursor reset");
    println!("cursor for {job} reset");
    Ok(())
}
