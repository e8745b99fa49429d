//! Data directory layout, atomic writes and job locks.

use fs2::FileExt;
use sessync_engine::{JobKey, StoreError, StoreResult};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const SESSIONS_DIR: &str = "sessions";
const CURSORS_DIR: &str = "cursors";
const LOCKS_DIR: &str = "locks";
const TEMP_SUFFIX: &str = "tmp";

/// The directory tree of a file store.
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    /// Opens `root`, creating it and its subdirectories if missing.
    pub fn open(root: &Path) -> StoreResult<Self> {
        if root.exists() && !root.is_dir() {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a directory: {}", root.display()),
            )));
        }
        for sub in [SESSIONS_DIR, CURSORS_DIR, LOCKS_DIR] {
            fs::create_dir_all(root.join(sub))?;
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Returns the root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding session files.
    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join(SESSIONS_DIR)
    }

    /// Path of the file for `source_id`.
    pub fn session_path(&self, source_id: u64) -> PathBuf {
        self.sessions_dir().join(format!("{source_id}.json"))
    }

    /// Path of the cursor file for `job`.
    pub fn cursor_path(&self, job: &JobKey) -> PathBuf {
        self.root.join(CURSORS_DIR).join(format!("{}.json", job.slug()))
    }

    /// Path of the lock file for `job`.
    pub fn lock_path(&self, job: &JobKey) -> PathBuf {
        self.root.join(LOCKS_DIR).join(format!("{}.lock", job.slug()))
    }

    /// Takes the exclusive run lock of `job` without blocking.
    pub fn lock_job(&self, job: &JobKey) -> StoreResult<JobLock> {
        let path = self.lock_path(job);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        if file.try_lock_exclusive().is_err() {
            return Err(StoreError::Locked(job.to_string()));
        }
        Ok(JobLock {
            job: job.clone(),
            _file: file,
        })
    }
}

/// Exclusive run lock for one job; released on drop.
#[derive(Debug)]
pub struct JobLock {
    job: JobKey,
    _file: File,
}

impl JobLock {
    /// Returns the locked job.
    pub fn job(&self) -> &JobKey {
        &self.job
    }
}

/// Writes `data` to `path` atomically.
///
/// 1. Write to a sibling temp file
/// 2. Sync it to disk
/// 3. Rename over `path`
/// 4. Fsync the parent directory
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> StoreResult<()> {
    let temp_path = path.with_extension(TEMP_SUFFIX);
    let mut file = File::create(&temp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&temp_path, path)?;
    if let Some(parent) = path.parent() {
        sync_directory(parent)?;
    }
    Ok(())
}

#[cfg(unix)]
fn sync_directory(dir: &Path) -> StoreResult<()> {
    File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_directory(_dir: &Path) -> StoreResult<()> {
    // NTFS journals metadata; directories cannot be fsynced.
    Ok(())
}
