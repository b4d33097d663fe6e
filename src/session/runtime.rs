//! Docker-backed container runtime.
//!
//! `ContainerRuntime` is the seam between the session logic and the Docker
//! daemon: image lookup and pull, idle-container lifecycle, in-container
//! command execution, per-file copies across the container boundary, and
//! commits. `DockerRuntime` implements it over the daemon API; tests swap
//! in a scripted runtime instead (see the `mock` module).
//!
//! Remote paths are plain strings because they name locations inside the
//! container's namespace, not host paths.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use bollard::Docker;
use bollard::container::{
    Config, CreateContainerOptions, DownloadFromContainerOptions, LogOutput,
    RemoveContainerOptions, StartContainerOptions, StopContainerOptions, UploadToContainerOptions,
};
use bollard::exec::{CreateExecOptions, StartExecResults};
use bollard::image::{CommitContainerOptions, CreateImageOptions, ListImagesOptions};
use bytes::Bytes;
use futures::StreamExt;

use crate::session::error::{Result, SessionError};

/// Captured output of a command executed inside a container.
#[derive(Debug, Clone)]
pub struct ExecCapture {
    /// Exit code of the command (`-1` when the runtime reports none).
    pub exit_code: i64,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

/// One locally stored image, as reported by the daemon.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    /// Content-addressed image id.
    pub id: String,
    /// `repository:tag` names pointing at this image.
    pub repo_tags: Vec<String>,
    /// Size in bytes.
    pub size: i64,
    /// Creation time as a Unix timestamp.
    pub created: i64,
}

/// Operations the session needs from a container runtime.
///
/// Implementations map runtime failures onto the session error taxonomy:
/// pull failures become [`SessionError::ImageNotFound`], create/start
/// failures [`SessionError::ProvisionFailed`], per-file copy failures
/// [`SessionError::CopyFailed`], a missing container on stop/remove
/// [`SessionError::ContainerNotFound`], commit failures
/// [`SessionError::CommitFailed`].
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Check that the daemon is reachable.
    async fn ping(&self) -> Result<()>;

    /// True when `reference` exists in local image storage.
    async fn image_exists(&self, reference: &str) -> Result<bool>;

    /// Pull `reference` from its registry. The reference must carry a tag.
    async fn pull_image(&self, reference: &str) -> Result<()>;

    /// List locally stored images.
    async fn list_images(&self) -> Result<Vec<ImageRecord>>;

    /// Create a detached container named `name` from `reference`, with its
    /// entrypoint replaced by `idle_command`. Returns the container id.
    async fn create_idle_container(
        &self,
        reference: &str,
        name: &str,
        idle_command: &[String],
    ) -> Result<String>;

    /// Start a created container.
    async fn start_container(&self, id: &str) -> Result<()>;

    /// Stop a running container, giving the process `grace` to exit.
    async fn stop_container(&self, id: &str, grace: Duration) -> Result<()>;

    /// Remove a stopped container.
    async fn remove_container(&self, id: &str) -> Result<()>;

    /// Run `argv` inside the container and capture its output.
    async fn exec_capture(&self, id: &str, argv: &[String]) -> Result<ExecCapture>;

    /// Copy one local file into `remote_dir` inside the container.
    async fn copy_into_container(
        &self,
        id: &str,
        local_file: &Path,
        remote_dir: &str,
    ) -> Result<()>;

    /// Copy one file at `remote_file` inside the container into the local
    /// directory `local_dir`, which must already exist.
    async fn copy_from_container(
        &self,
        id: &str,
        remote_file: &str,
        local_dir: &Path,
    ) -> Result<()>;

    /// Snapshot the container's filesystem as `repository:tag`.
    async fn commit_container(&self, id: &str, repository: &str, tag: &str) -> Result<()>;
}

/// Production runtime backed by the Docker daemon.
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Wrap an established daemon connection.
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn ping(&self) -> Result<()> {
        self.docker
            .ping()
            .await
            .map(|_| ())
            .map_err(|e| SessionError::DaemonUnavailable {
                reason: e.to_string(),
            })
    }

    async fn image_exists(&self, reference: &str) -> Result<bool> {
        match self.docker.inspect_image(reference).await {
            Ok(_) => Ok(true),
            Err(err) if is_not_found(&err) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn pull_image(&self, reference: &str) -> Result<()> {
        tracing::info!(image = %reference, "pulling image");

        let options = CreateImageOptions {
            from_image: reference.to_string(),
            ..Default::default()
        };

        let mut stream = self.docker.create_image(Some(options), None, None);

        while let Some(result) = stream.next().await {
            match result {
                Ok(info) => {
                    if let Some(status) = info.status {
                        tracing::debug!(image = %reference, "pull: {}", status);
                    }
                }
                Err(e) => {
                    return Err(SessionError::ImageNotFound {
                        reference: reference.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(image = %reference, "pull complete");
        Ok(())
    }

    async fn list_images(&self) -> Result<Vec<ImageRecord>> {
        let summaries = self
            .docker
            .list_images(Some(ListImagesOptions::<String> {
                all: false,
                ..Default::default()
            }))
            .await?;

        Ok(summaries
            .into_iter()
            .map(|s| ImageRecord {
                id: s.id,
                repo_tags: s.repo_tags,
                size: s.size,
                created: s.created,
            })
            .collect())
    }

    async fn create_idle_container(
        &self,
        reference: &str,
        name: &str,
        idle_command: &[String],
    ) -> Result<String> {
        let config = Config {
            image: Some(reference.to_string()),
            // Replace the image's entrypoint outright; cmd alone would be
            // appended to whatever ENTRYPOINT the image declares.
            entrypoint: Some(idle_command.to_vec()),
            cmd: Some(Vec::new()),
            ..Default::default()
        };

        let options = CreateContainerOptions {
            name: name.to_string(),
            ..Default::default()
        };

        let response = self
            .docker
            .create_container(Some(options), config)
            .await
            .map_err(|e| SessionError::ProvisionFailed {
                reason: e.to_string(),
            })?;

        tracing::debug!(container = %response.id, name = %name, "container created");
        Ok(response.id)
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| SessionError::ProvisionFailed {
                reason: e.to_string(),
            })
    }

    async fn stop_container(&self, id: &str, grace: Duration) -> Result<()> {
        let options = StopContainerOptions {
            t: grace.as_secs() as i64,
        };

        match self.docker.stop_container(id, Some(options)).await {
            Ok(()) => Ok(()),
            // 304: already stopped, which is the state we wanted.
            Err(err) if is_not_modified(&err) => Ok(()),
            Err(err) if is_not_found(&err) => Err(SessionError::ContainerNotFound {
                id: id.to_string(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    async fn remove_container(&self, id: &str) -> Result<()> {
        let options = RemoveContainerOptions {
            force: false,
            ..Default::default()
        };

        match self.docker.remove_container(id, Some(options)).await {
            Ok(()) => Ok(()),
            Err(err) if is_not_found(&err) => Err(SessionError::ContainerNotFound {
                id: id.to_string(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    async fn exec_capture(&self, id: &str, argv: &[String]) -> Result<ExecCapture> {
        let exec = self
            .docker
            .create_exec(
                id,
                CreateExecOptions {
                    cmd: Some(argv.to_vec()),
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    ..Default::default()
                },
            )
            .await?;

        let mut stdout = String::new();
        let mut stderr = String::new();

        if let StartExecResults::Attached { mut output, .. } =
            self.docker.start_exec(&exec.id, None).await?
        {
            while let Some(result) = output.next().await {
                match result {
                    Ok(LogOutput::StdOut { message }) => {
                        stdout.push_str(&String::from_utf8_lossy(&message));
                    }
                    Ok(LogOutput::StdErr { message }) => {
                        stderr.push_str(&String::from_utf8_lossy(&message));
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!("error reading exec output: {}", e);
                    }
                }
            }
        }

        let inspect = self.docker.inspect_exec(&exec.id).await?;
        let exit_code = inspect.exit_code.unwrap_or(-1);

        Ok(ExecCapture {
            exit_code,
            stdout,
            stderr,
        })
    }

    async fn copy_into_container(
        &self,
        id: &str,
        local_file: &Path,
        remote_dir: &str,
    ) -> Result<()> {
        let file = local_file.display().to_string();
        let copy_failed = |reason: String| SessionError::CopyFailed {
            file: file.clone(),
            reason,
        };

        let name = local_file
            .file_name()
            .ok_or_else(|| copy_failed("path has no file name".to_string()))?
            .to_string_lossy()
            .to_string();

        let data = tokio::fs::read(local_file)
            .await
            .map_err(|e| copy_failed(e.to_string()))?;
        let metadata = tokio::fs::metadata(local_file)
            .await
            .map_err(|e| copy_failed(e.to_string()))?;

        let archive =
            single_file_archive(&name, &data, &metadata).map_err(|e| copy_failed(e.to_string()))?;

        let options = UploadToContainerOptions {
            path: remote_dir.to_string(),
            ..Default::default()
        };

        self.docker
            .upload_to_container(id, Some(options), Bytes::from(archive))
            .await
            .map_err(|e| copy_failed(e.to_string()))?;

        tracing::debug!(container = %id, file = %name, dest = %remote_dir, "copied in");
        Ok(())
    }

    async fn copy_from_container(
        &self,
        id: &str,
        remote_file: &str,
        local_dir: &Path,
    ) -> Result<()> {
        let copy_failed = |reason: String| SessionError::CopyFailed {
            file: remote_file.to_string(),
            reason,
        };

        let options = DownloadFromContainerOptions {
            path: remote_file.to_string(),
        };

        let mut stream = self.docker.download_from_container(id, Some(options));
        let mut archive = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| copy_failed(e.to_string()))?;
            archive.extend_from_slice(&chunk);
        }

        tar::Archive::new(archive.as_slice())
            .unpack(local_dir)
            .map_err(|e| copy_failed(e.to_string()))?;

        tracing::debug!(container = %id, file = %remote_file, dest = %local_dir.display(), "copied out");
        Ok(())
    }

    async fn commit_container(&self, id: &str, repository: &str, tag: &str) -> Result<()> {
        let options = CommitContainerOptions {
            container: id.to_string(),
            repo: repository.to_string(),
            tag: tag.to_string(),
            pause: true,
            ..Default::default()
        };

        let response = self
            .docker
            .commit_container(options, Config::<String>::default())
            .await
            .map_err(|e| SessionError::CommitFailed {
                reason: e.to_string(),
            })?;

        tracing::info!(container = %id, image = %format!("{repository}:{tag}"), ?response, "container committed");
        Ok(())
    }
}

/// Build an in-memory tar archive holding one file at its base name.
///
/// The daemon extracts the archive into the upload path, so the entry name
/// decides the final file name inside the container.
fn single_file_archive(
    name: &str,
    data: &[u8],
    metadata: &std::fs::Metadata,
) -> std::io::Result<Vec<u8>> {
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(file_mode(metadata));
    header.set_mtime(
        metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0),
    );
    header.set_cksum();

    let mut builder = tar::Builder::new(Vec::new());
    builder.append_data(&mut header, name, data)?;
    builder.into_inner()
}

#[cfg(unix)]
fn file_mode(metadata: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn file_mode(_metadata: &std::fs::Metadata) -> u32 {
    0o644
}

fn is_not_found(err: &bollard::errors::Error) -> bool {
    matches!(
        err,
        bollard::errors::Error::DockerResponseServerError {
            status_code: 404,
            ..
        }
    )
}

fn is_not_modified(err: &bollard::errors::Error) -> bool {
    matches!(
        err,
        bollard::errors::Error::DockerResponseServerError {
            status_code: 304,
            ..
        }
    )
}

/// Connect to the Docker daemon.
///
/// Tries these locations in order:
/// 1. `DOCKER_HOST` env var (bollard default)
/// 2. `/var/run/docker.sock` (Linux default)
/// 3. `~/.docker/run/docker.sock` (Docker Desktop on macOS)
pub async fn connect_docker() -> Result<Docker> {
    // First try bollard defaults (checks DOCKER_HOST, then /var/run/docker.sock)
    if let Ok(docker) = Docker::connect_with_local_defaults()
        && docker.ping().await.is_ok()
    {
        return Ok(docker);
    }

    // Try Docker Desktop socket (macOS)
    if let Some(home) = std::env::var_os("HOME") {
        let desktop_sock = std::path::Path::new(&home).join(".docker/run/docker.sock");
        if desktop_sock.exists() {
            let sock_str = desktop_sock.to_string_lossy();
            if let Ok(docker) =
                Docker::connect_with_socket(&sock_str, 120, bollard::API_DEFAULT_VERSION)
                && docker.ping().await.is_ok()
            {
                return Ok(docker);
            }
        }
    }

    Err(SessionError::DaemonUnavailable {
        reason: "socket not found: /var/run/docker.sock".to_string(),
    })
}
