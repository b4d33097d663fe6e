//! File transfers between the local filesystem and the container.
//!
//! A transfer round moves a batch of named files in one direction. Files
//! are copied one at a time and every file gets its own outcome: one bad
//! file never aborts the rest of the batch.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::session::error::{Result, SessionError};
use crate::session::runtime::ContainerRuntime;

/// Which way a transfer round moves files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    /// Local files into the container.
    ToContainer,
    /// Container files into a local directory.
    FromContainer,
}

/// One batch of files to move.
///
/// `files` holds plain names relative to the source directory, used as-is
/// with no glob expansion; the direction decides whether `remote_dir` or
/// `local_dir` is the source. When exporting, a directory name carries
/// the whole tree over; imports expect regular files.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub direction: TransferDirection,
    /// Directory inside the container.
    pub remote_dir: String,
    /// Directory on the local filesystem.
    pub local_dir: String,
    pub files: Vec<String>,
}

/// Result of copying one file of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub file: String,
    pub succeeded: bool,
    /// Absolute path the file was copied to.
    pub destination: String,
}

fn join_remote(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

fn absolute_display(path: PathBuf) -> String {
    std::path::absolute(&path)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Executes transfer rounds against the session container.
pub struct TransferEngine {
    runtime: Arc<dyn ContainerRuntime>,
}

impl TransferEngine {
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self { runtime }
    }

    /// Copy the batch, returning one outcome per requested file in
    /// request order.
    ///
    /// The only batch-level failure is a local destination directory that
    /// cannot be created; everything after that is per-file.
    pub async fn execute(
        &self,
        container_id: &str,
        request: &TransferRequest,
    ) -> Result<Vec<TransferOutcome>> {
        if request.direction == TransferDirection::FromContainer {
            tokio::fs::create_dir_all(&request.local_dir)
                .await
                .map_err(|e| SessionError::DirectoryUnavailable {
                    path: request.local_dir.clone(),
                    reason: e.to_string(),
                })?;
        }

        let mut outcomes = Vec::with_capacity(request.files.len());

        for name in &request.files {
            let (result, destination) = match request.direction {
                TransferDirection::ToContainer => {
                    let local_file = Path::new(&request.local_dir).join(name);
                    (
                        self.runtime
                            .copy_into_container(container_id, &local_file, &request.remote_dir)
                            .await,
                        join_remote(&request.remote_dir, name),
                    )
                }
                TransferDirection::FromContainer => {
                    let remote_file = join_remote(&request.remote_dir, name);
                    (
                        self.runtime
                            .copy_from_container(
                                container_id,
                                &remote_file,
                                Path::new(&request.local_dir),
                            )
                            .await,
                        absolute_display(Path::new(&request.local_dir).join(name)),
                    )
                }
            };

            let succeeded = match result {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!(file = %name, "copy failed: {}", err);
                    false
                }
            };

            outcomes.push(TransferOutcome {
                file: name.clone(),
                succeeded,
                destination,
            });
        }

        Ok(outcomes)
    }
}
