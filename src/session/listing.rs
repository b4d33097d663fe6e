//! Directory listings inside the running container.

use std::sync::Arc;

use crate::session::runtime::ContainerRuntime;

/// Result of listing a container directory.
///
/// An empty directory yields `Entries` with no names; `Unavailable` means
/// the path could not be listed at all. The two are never conflated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryListing {
    Entries(Vec<String>),
    Unavailable { reason: String },
}

/// Lists directories by running `ls -1A` inside the container.
///
/// The command runs as an argv vector, never through a shell, so paths
/// with spaces or metacharacters need no quoting.
pub struct DirectoryLister {
    runtime: Arc<dyn ContainerRuntime>,
}

impl DirectoryLister {
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self { runtime }
    }

    /// List the entries of `path` inside the container.
    ///
    /// A failed listing is an answer, not an error: the session keeps
    /// going and the caller falls back to manual path entry.
    pub async fn list(&self, container_id: &str, path: &str) -> DirectoryListing {
        let argv = vec!["ls".to_string(), "-1A".to_string(), path.to_string()];

        match self.runtime.exec_capture(container_id, &argv).await {
            Ok(capture) if capture.exit_code == 0 => DirectoryListing::Entries(
                capture
                    .stdout
                    .lines()
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            Ok(capture) => {
                let reason = if capture.stderr.trim().is_empty() {
                    format!("listing exited with code {}", capture.exit_code)
                } else {
                    capture.stderr.trim().to_string()
                };
                tracing::debug!(path = %path, "directory unavailable: {}", reason);
                DirectoryListing::Unavailable { reason }
            }
            Err(err) => {
                tracing::warn!(path = %path, "listing exec failed: {}", err);
                DirectoryListing::Unavailable {
                    reason: err.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::mock::MockRuntime;

    #[tokio::test]
    async fn entries_come_back_in_listing_order() {
        let runtime = Arc::new(
            MockRuntime::default().with_listing("/etc", &["hostname", "hosts", "passwd"]),
        );
        let lister = DirectoryLister::new(runtime);

        let listing = lister.list("c1", "/etc").await;

        assert_eq!(
            listing,
            DirectoryListing::Entries(vec![
                "hostname".to_string(),
                "hosts".to_string(),
                "passwd".to_string(),
            ])
        );
    }

    #[tokio::test]
    async fn empty_directory_is_not_unavailable() {
        let runtime = Arc::new(MockRuntime::default().with_listing("/empty", &[]));
        let lister = DirectoryLister::new(runtime);

        let listing = lister.list("c1", "/empty").await;

        assert_eq!(listing, DirectoryListing::Entries(Vec::new()));
    }

    #[tokio::test]
    async fn missing_path_is_unavailable_with_a_reason() {
        let runtime = Arc::new(MockRuntime::default());
        let lister = DirectoryLister::new(runtime);

        let listing = lister.list("c1", "/no/such/dir").await;

        match listing {
            DirectoryListing::Unavailable { reason } => {
                assert!(reason.contains("No such file"));
            }
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }
}
