//! Committing the mutated container as a new image.

use std::sync::Arc;

use crate::session::error::Result;
use crate::session::image::split_reference_or;
use crate::session::runtime::ContainerRuntime;

/// Name for the image a commit produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    pub repository: String,
    pub tag: String,
}

impl CommitRequest {
    /// Parse operator input of the form `repository[:tag]`, falling back
    /// to `default_tag` when no tag is given.
    pub fn parse(input: &str, default_tag: &str) -> Self {
        let (repository, tag) = split_reference_or(input.trim(), default_tag);
        Self {
            repository: repository.to_string(),
            tag: tag.to_string(),
        }
    }

    pub fn reference(&self) -> String {
        format!("{}:{}", self.repository, self.tag)
    }
}

/// Turns the session container into a named image.
pub struct CommitManager {
    runtime: Arc<dyn ContainerRuntime>,
}

impl CommitManager {
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self { runtime }
    }

    /// Snapshot the container's current filesystem under the requested
    /// name and return the new reference.
    ///
    /// A failed commit does not end the session; the caller reports it
    /// and proceeds to cleanup with the container still intact.
    pub async fn commit(&self, container_id: &str, request: &CommitRequest) -> Result<String> {
        self.runtime
            .commit_container(container_id, &request.repository, &request.tag)
            .await?;

        let reference = request.reference();
        tracing::info!(container = %container_id, image = %reference, "commit complete");
        Ok(reference)
    }
}
