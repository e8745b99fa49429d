//! Sessions command implementation.

use chrono::Utc;
use sessync_engine::SessionStore;
use sessync_store::FileStore;
use std::path::Path;

/// Lists mirrored sessions.
pub fn list(data_dir: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileStore::open(data_dir)?;
    let sessions = store.list()?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    for session in &sessions {
        let f = &session.fields;
        println!(
            "{:>8}  {:<10} {:<7} {}  {}",
            f.source_id,
            f.source_status.as_str(),
            f.session_type.as_str(),
            f.start_datetime,
            f.name
        );
    }
    println!("{} session(s)", sessions.len());
    Ok(())
}

/// Shows one session by external id.
pub fn show(data_dir: &Path, source_id: u64) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileStore::open(data_dir)?;
    let session = store
        .find_by_source_id(source_id)?
        .ok_or_else(|| format!("no session with id {source_id}"))?;

    println!("{}", serde_json::to_string_pretty(&session)?);
    let settled = session.time_no_requests_after(Utc::now());
    println!("no requests after: {}", settled.to_rfc3339());
    Ok(())
}
