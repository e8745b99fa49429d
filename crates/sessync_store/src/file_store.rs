//! JSON-file implementation of the session and cursor stores.

use crate::dir::{write_atomic, DataDir, JobLock};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use sessync_engine::{
    CursorState, CursorStore, JobKey, LocalSession, SessionFields, SessionStore, StoreError,
    StoreResult,
};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Stores sessions and cursors as JSON files under a data directory.
#[derive(Debug)]
pub struct FileStore {
    dir: DataDir,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Opens a store rooted at `root`, creating the layout if missing.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = DataDir::open(root.as_ref())?;
        tracing::debug!(root = %dir.root().display(), "opened file store");
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    /// Returns the data directory.
    pub fn dir(&self) -> &DataDir {
        &self.dir
    }

    /// Takes the exclusive run lock of `job`.
    pub fn lock_job(&self, job: &JobKey) -> StoreResult<JobLock> {
        self.dir.lock_job(job)
    }

    fn write_session(&self, path: &Path, session: &LocalSession) -> StoreResult<()> {
        let data = serde_json::to_vec_pretty(session)?;
        write_atomic(path, &data)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> StoreResult<Option<T>> {
    match fs::read(path) {
        Ok(data) => Ok(Some(serde_json::from_slice(&data)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl SessionStore for FileStore {
    fn find_by_source_id(&self, source_id: u64) -> StoreResult<Option<LocalSession>> {
        read_json(&self.dir.session_path(source_id))
    }

    fn insert(&self, fields: SessionFields) -> StoreResult<LocalSession> {
        let _guard = self.write_lock.lock();
        let path = self.dir.session_path(fields.source_id);
        if path.exists() {
            return Err(StoreError::Constraint(format!(
                "duplicate source id {}",
                fields.source_id
            )));
        }
        let session = LocalSession::new(fields);
        self.write_session(&path, &session)?;
        Ok(session)
    }

    fn update(&self, session: LocalSession) -> StoreResult<LocalSession> {
        let _guard = self.write_lock.lock();
        let path = self.dir.session_path(session.source_id());
        let existing: LocalSession = read_json(&path)?
            .ok_or_else(|| StoreError::NotFound(session.id.to_string()))?;
        if existing.id != session.id {
            return Err(StoreError::Constraint(format!(
                "source id {} belongs to another record",
                session.source_id()
            )));
        }
        self.write_session(&path, &session)?;
        Ok(session)
    }

    fn list(&self) -> StoreResult<Vec<LocalSession>> {
        let paths: Vec<PathBuf> = fs::read_dir(self.dir.sessions_dir())?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();

        let mut sessions = Vec::with_capacity(paths.len());
        for path in paths {
            if let Some(session) = read_json::<LocalSession>(&path)? {
                sessions.push(session);
            }
        }
        sessions.sort_by_key(LocalSession::source_id);
        Ok(sessions)
    }
}

impl CursorStore for FileStore {
    fn load_cursor(&self, job: &JobKey) -> StoreResult<CursorState> {
        match read_json::<CursorState>(&self.dir.cursor_path(job))? {
            Some(cursor) if cursor.job != *job => Err(StoreError::JobMismatch {
                expected: job.to_string(),
                found: cursor.job.to_string(),
            }),
            Some(cursor) => Ok(cursor),
            None => Ok(CursorState::new(job.clone())),
        }
    }

    fn save_cursor(&self, cursor: &CursorState) -> StoreResult<()> {
        let data = serde_json::to_vec_pretty(cursor)?;
        write_atomic(&self.dir.cursor_path(&cursor.job), &data)
    }
}
