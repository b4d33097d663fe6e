//! Error types for the container editing session.

/// Errors that can occur while driving a session.
///
/// Fatal variants (`DaemonUnavailable`, `ImageNotFound`, `ProvisionFailed`)
/// end the session before a container exists, so they never owe teardown.
/// The remaining variants are scoped to a single operation and leave the
/// session running.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Docker daemon is not available or not running.
    #[error("Docker not available: {reason}")]
    DaemonUnavailable { reason: String },

    /// Image could not be found locally or pulled from the registry.
    #[error("image {reference} could not be pulled: {reason}")]
    ImageNotFound { reference: String, reason: String },

    /// Failed to create or start the working container.
    #[error("container provisioning failed: {reason}")]
    ProvisionFailed { reason: String },

    /// Container vanished before teardown (removed out-of-band).
    #[error("container {id} no longer exists")]
    ContainerNotFound { id: String },

    /// Local destination directory could not be created or used.
    #[error("directory {path} is not usable: {reason}")]
    DirectoryUnavailable { path: String, reason: String },

    /// A single file copy across the container boundary failed.
    #[error("copy of {file} failed: {reason}")]
    CopyFailed { file: String, reason: String },

    /// Committing the container to a new image failed.
    #[error("commit failed: {reason}")]
    CommitFailed { reason: String },

    /// Docker API error.
    #[error("Docker API error: {0}")]
    Docker(#[from] bollard::errors::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SessionError {
    /// True when the failure prevents a container from ever existing,
    /// so the session ends with nothing to clean up.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SessionError::DaemonUnavailable { .. }
                | SessionError::ImageNotFound { .. }
                | SessionError::ProvisionFailed { .. }
        )
    }
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
