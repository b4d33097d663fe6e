//! Configuration for a container editing session.

use std::time::Duration;

/// What a session does with the container's filesystem.
///
/// The direction is fixed for the whole session at selection time: a
/// session either only copies files out of the image, or only copies
/// files in (with an optional commit at the end). It never mixes both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    /// Copy files from the image to the local filesystem.
    Export,
    /// Copy local files into the image, optionally committing the result.
    Import,
}

impl SessionAction {
    /// Menu label shown in the action prompt.
    pub fn label(&self) -> &'static str {
        match self {
            SessionAction::Export => "Copy files out of an image",
            SessionAction::Import => "Copy files into an image (and optionally commit)",
        }
    }
}

/// Configuration for the session controller.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Preselected image reference; `None` prompts for one.
    pub image: Option<String>,
    /// Preselected action; `None` shows the action menu.
    pub action: Option<SessionAction>,
    /// Name prefix for the working container, suffixed with a UUID.
    pub container_prefix: String,
    /// Entrypoint that keeps the container alive without doing anything.
    /// The image's real entrypoint is never run: it may exit immediately
    /// or demand input, while the session needs a filesystem that stays
    /// mounted and addressable.
    pub idle_command: Vec<String>,
    /// Grace period given to the idle process on stop before it is killed.
    pub stop_grace: Duration,
    /// Tag applied when a commit name has no `:tag` suffix.
    pub default_commit_tag: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            image: None,
            action: None,
            container_prefix: "stevedore".to_string(),
            idle_command: vec!["sleep".to_string(), "infinity".to_string()],
            stop_grace: Duration::from_secs(5),
            default_commit_tag: "latest".to_string(),
        }
    }
}
