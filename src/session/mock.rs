//! Scripted in-memory runtime for tests.
//!
//! Behavior is staged up front with the builder methods; every call is
//! appended to an ordered log so tests can assert lifecycle ordering.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::session::error::{Result, SessionError};
use crate::session::runtime::{ContainerRuntime, ExecCapture, ImageRecord};

#[derive(Default)]
struct MockContainer {
    image: String,
    running: bool,
    removed: bool,
}

#[derive(Default)]
struct MockState {
    local_images: HashSet<String>,
    registry_images: HashSet<String>,
    image_records: Vec<ImageRecord>,
    listings: HashMap<String, Vec<String>>,
    failing_copies: HashSet<String>,
    copied_in: Vec<(String, String)>,
    copied_out: Vec<(String, String)>,
    commits: Vec<(String, String)>,
    calls: Vec<String>,
    container: Option<MockContainer>,
    vanish_before_stop: bool,
    fail_start: bool,
    fail_commit: Option<String>,
}

#[derive(Default)]
pub struct MockRuntime {
    state: Mutex<MockState>,
}

impl MockRuntime {
    /// Stage `reference` as already present in local storage.
    pub fn with_local_image(self, reference: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .local_images
            .insert(reference.to_string());
        self
    }

    /// Stage `reference` as pullable from the registry.
    pub fn with_registry_image(self, reference: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .registry_images
            .insert(reference.to_string());
        self
    }

    /// Stage the entries `ls -1A` would print for a container path.
    pub fn with_listing(self, path: &str, entries: &[&str]) -> Self {
        self.state.lock().unwrap().listings.insert(
            path.to_string(),
            entries.iter().map(|e| e.to_string()).collect(),
        );
        self
    }

    pub fn with_image_record(self, record: ImageRecord) -> Self {
        self.state.lock().unwrap().image_records.push(record);
        self
    }

    /// Make every copy touching a file with this base name fail.
    pub fn failing_copy(self, file_name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_copies
            .insert(file_name.to_string());
        self
    }

    /// Simulate the container being removed out-of-band before teardown.
    pub fn vanish_before_teardown(self) -> Self {
        self.state.lock().unwrap().vanish_before_stop = true;
        self
    }

    pub fn fail_start(self) -> Self {
        self.state.lock().unwrap().fail_start = true;
        self
    }

    pub fn fail_commit(self, reason: &str) -> Self {
        self.state.lock().unwrap().fail_commit = Some(reason.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn copied_in(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().copied_in.clone()
    }

    pub fn copied_out(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().copied_out.clone()
    }

    pub fn commits(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().commits.clone()
    }

    pub fn container_running(&self) -> bool {
        self.state
            .lock()
            .unwrap()
            .container
            .as_ref()
            .is_some_and(|c| c.running && !c.removed)
    }

    pub fn container_removed(&self) -> bool {
        self.state
            .lock()
            .unwrap()
            .container
            .as_ref()
            .is_some_and(|c| c.removed)
    }

    pub fn container_image(&self) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .container
            .as_ref()
            .map(|c| c.image.clone())
    }

    fn log(&self, call: impl Into<String>) {
        self.state.lock().unwrap().calls.push(call.into());
    }
}

#[async_trait]
impl ContainerRuntime for MockRuntime {
    async fn ping(&self) -> Result<()> {
        self.log("ping");
        Ok(())
    }

    async fn image_exists(&self, reference: &str) -> Result<bool> {
        self.log(format!("image_exists {reference}"));
        Ok(self.state.lock().unwrap().local_images.contains(reference))
    }

    async fn pull_image(&self, reference: &str) -> Result<()> {
        self.log(format!("pull {reference}"));
        let mut state = self.state.lock().unwrap();
        if state.registry_images.contains(reference) {
            state.local_images.insert(reference.to_string());
            Ok(())
        } else {
            Err(SessionError::ImageNotFound {
                reference: reference.to_string(),
                reason: "manifest unknown".to_string(),
            })
        }
    }

    async fn list_images(&self) -> Result<Vec<ImageRecord>> {
        self.log("list_images");
        Ok(self.state.lock().unwrap().image_records.clone())
    }

    async fn create_idle_container(
        &self,
        reference: &str,
        name: &str,
        _idle_command: &[String],
    ) -> Result<String> {
        self.log(format!("create {name}"));
        let mut state = self.state.lock().unwrap();
        state.container = Some(MockContainer {
            image: reference.to_string(),
            running: false,
            removed: false,
        });
        Ok(format!("id-{name}"))
    }

    async fn start_container(&self, _id: &str) -> Result<()> {
        self.log("start");
        let mut state = self.state.lock().unwrap();
        if state.fail_start {
            return Err(SessionError::ProvisionFailed {
                reason: "scripted start failure".to_string(),
            });
        }
        if let Some(container) = state.container.as_mut() {
            container.running = true;
        }
        Ok(())
    }

    async fn stop_container(&self, id: &str, _grace: Duration) -> Result<()> {
        self.log("stop");
        let mut state = self.state.lock().unwrap();
        if state.vanish_before_stop {
            state.container = None;
            return Err(SessionError::ContainerNotFound { id: id.to_string() });
        }
        match state.container.as_mut() {
            Some(container) if !container.removed => {
                container.running = false;
                Ok(())
            }
            _ => Err(SessionError::ContainerNotFound { id: id.to_string() }),
        }
    }

    async fn remove_container(&self, id: &str) -> Result<()> {
        self.log("remove");
        let mut state = self.state.lock().unwrap();
        match state.container.as_mut() {
            Some(container) if !container.removed => {
                container.running = false;
                container.removed = true;
                Ok(())
            }
            _ => Err(SessionError::ContainerNotFound { id: id.to_string() }),
        }
    }

    async fn exec_capture(&self, _id: &str, argv: &[String]) -> Result<ExecCapture> {
        let path = argv.last().cloned().unwrap_or_default();
        self.log(format!("exec {path}"));
        let state = self.state.lock().unwrap();
        match state.listings.get(&path) {
            Some(entries) => {
                let mut stdout = entries.join("\n");
                if !stdout.is_empty() {
                    stdout.push('\n');
                }
                Ok(ExecCapture {
                    exit_code: 0,
                    stdout,
                    stderr: String::new(),
                })
            }
            None => Ok(ExecCapture {
                exit_code: 2,
                stdout: String::new(),
                stderr: format!("ls: {path}: No such file or directory"),
            }),
        }
    }

    async fn copy_into_container(
        &self,
        _id: &str,
        local_file: &Path,
        remote_dir: &str,
    ) -> Result<()> {
        let name = local_file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.log(format!("copy_in {name}"));
        let mut state = self.state.lock().unwrap();
        if state.failing_copies.contains(&name) {
            return Err(SessionError::CopyFailed {
                file: name,
                reason: "scripted copy failure".to_string(),
            });
        }
        state.copied_in.push((name, remote_dir.to_string()));
        Ok(())
    }

    async fn copy_from_container(
        &self,
        _id: &str,
        remote_file: &str,
        local_dir: &Path,
    ) -> Result<()> {
        let name = remote_file
            .rsplit('/')
            .next()
            .unwrap_or(remote_file)
            .to_string();
        self.log(format!("copy_out {name}"));
        if !local_dir.is_dir() {
            return Err(SessionError::CopyFailed {
                file: name,
                reason: "destination directory missing".to_string(),
            });
        }
        let mut state = self.state.lock().unwrap();
        if state.failing_copies.contains(&name) {
            return Err(SessionError::CopyFailed {
                file: name,
                reason: "scripted copy failure".to_string(),
            });
        }
        std::fs::write(local_dir.join(&name), b"mock contents")?;
        state
            .copied_out
            .push((name, local_dir.display().to_string()));
        Ok(())
    }

    async fn commit_container(&self, _id: &str, repository: &str, tag: &str) -> Result<()> {
        self.log(format!("commit {repository}:{tag}"));
        let mut state = self.state.lock().unwrap();
        if let Some(reason) = state.fail_commit.clone() {
            return Err(SessionError::CommitFailed { reason });
        }
        state.commits.push((repository.to_string(), tag.to_string()));
        Ok(())
    }
}
