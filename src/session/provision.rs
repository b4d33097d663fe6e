//! Disposable container provisioning and teardown.
//!
//! A session runs against exactly one container, created from the resolved
//! image with its entrypoint replaced by an idle command so the filesystem
//! can be inspected and mutated without the image's own process in the way.

use std::sync::Arc;

use uuid::Uuid;

use crate::session::config::SessionConfig;
use crate::session::error::{Result, SessionError};
use crate::session::runtime::ContainerRuntime;

/// Lifecycle state of the session's container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Running,
    Stopped,
    Removed,
}

/// The one container a session works inside.
#[derive(Debug, Clone)]
pub struct ContainerSession {
    pub container_id: String,
    pub container_name: String,
    pub source_image: String,
    pub state: ContainerState,
}

/// Creates and tears down the session container.
pub struct ContainerProvisioner {
    runtime: Arc<dyn ContainerRuntime>,
    config: SessionConfig,
}

impl ContainerProvisioner {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, config: SessionConfig) -> Self {
        Self { runtime, config }
    }

    /// Create and start an idle container from `reference`.
    ///
    /// The container gets a collision-free generated name so concurrent
    /// sessions never fight over it. If the container starts but cannot
    /// run, it is removed again before the error is returned.
    pub async fn provision(&self, reference: &str) -> Result<ContainerSession> {
        let name = format!("{}-{}", self.config.container_prefix, Uuid::new_v4());

        let id = self
            .runtime
            .create_idle_container(reference, &name, &self.config.idle_command)
            .await?;

        if let Err(err) = self.runtime.start_container(&id).await {
            if let Err(remove_err) = self.runtime.remove_container(&id).await {
                tracing::warn!(container = %id, "could not remove unstarted container: {}", remove_err);
            }
            return Err(err);
        }

        tracing::info!(container = %id, name = %name, image = %reference, "idle container running");

        Ok(ContainerSession {
            container_id: id,
            container_name: name,
            source_image: reference.to_string(),
            state: ContainerState::Running,
        })
    }

    /// Stop the container, then remove it.
    ///
    /// Teardown is best-effort: a container that already vanished
    /// out-of-band is reported as [`SessionError::ContainerNotFound`] and
    /// counted as removed, and no step is retried.
    pub async fn teardown(&self, session: &mut ContainerSession) -> Result<()> {
        match self
            .runtime
            .stop_container(&session.container_id, self.config.stop_grace)
            .await
        {
            Ok(()) => session.state = ContainerState::Stopped,
            Err(SessionError::ContainerNotFound { id }) => {
                session.state = ContainerState::Removed;
                return Err(SessionError::ContainerNotFound { id });
            }
            Err(err) => return Err(err),
        }

        match self.runtime.remove_container(&session.container_id).await {
            Ok(()) => {
                session.state = ContainerState::Removed;
                tracing::info!(container = %session.container_id, "container removed");
                Ok(())
            }
            Err(SessionError::ContainerNotFound { id }) => {
                session.state = ContainerState::Removed;
                Err(SessionError::ContainerNotFound { id })
            }
            Err(err) => Err(err),
        }
    }
}
