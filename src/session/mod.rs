//! Interactive container sessions.
//!
//! A session resolves an image, provisions a disposable idle container
//! from it, moves files across the container boundary in operator-driven
//! rounds, optionally commits the mutated filesystem as a new image, and
//! tears the container down at the end.

pub mod commit;
pub mod config;
pub mod controller;
pub mod error;
pub mod image;
pub mod listing;
#[cfg(test)]
pub mod mock;
pub mod provision;
pub mod runtime;
pub mod transfer;

pub use config::{SessionAction, SessionConfig};
pub use controller::{SessionController, SessionPhase, SessionSummary};
pub use error::{Result, SessionError};
pub use runtime::{ContainerRuntime, DockerRuntime, connect_docker};
