//! Error types for the sync engine.

use sessync_protocol::ProtocolError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during a sync run.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Network or HTTP failure while fetching a page.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether a later attempt may succeed.
        retryable: bool,
    },

    /// Unparseable or unexpected remote payload.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The store rejected the write for one record.
    #[error("constraint violation for session {source_id}: {message}")]
    Constraint {
        /// External id of the rejected record.
        source_id: u64,
        /// Store message.
        message: String,
    },

    /// The mapped record failed local field constraints.
    #[error("validation failed for session {source_id}: {field} {reason}")]
    Validation {
        /// External id of the invalid record.
        source_id: u64,
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// Persistence failure other than a constraint violation.
    #[error("store error: {0}")]
    Store(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Consecutive pages brought no progress while the remote kept
    /// reporting more pages.
    #[error("no progress for {pages} consecutive page(s) up to page {page} while the remote reports more pages")]
    Stalled {
        /// One-based number of the last page fetched.
        page: u64,
        /// Consecutive pages without progress.
        pages: u32,
    },

    /// The run was cancelled between records.
    #[error("sync cancelled")]
    Cancelled,

    /// An attempt to move the cursor backward.
    #[error("cursor regression from {from} to {to}")]
    CursorRegression {
        /// Current position.
        from: String,
        /// Rejected position.
        to: String,
    },

    /// Invalid state transition.
    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Current state.
        from: String,
        /// Attempted target state.
        to: String,
    },
}

impl SyncError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if the error concerns a single record; the run continues.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            SyncError::Constraint { .. } | SyncError::Validation { .. }
        )
    }

    /// Returns true if a fresh run could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport { retryable, .. } => *retryable,
            SyncError::Stalled { .. } => true,
            SyncError::Store(_) => true,
            _ => false,
        }
    }

    /// Returns the external id of the affected record, for record-level errors.
    pub fn source_id(&self) -> Option<u64> {
        match self {
            SyncError::Constraint { source_id, .. } | SyncError::Validation { source_id, .. } => {
                Some(*source_id)
            }
            _ => None,
        }
    }
}

impl From<ProtocolError> for SyncError {
    fn from(err: ProtocolError) -> Self {
        SyncError::Protocol(err.to_string())
    }
}
