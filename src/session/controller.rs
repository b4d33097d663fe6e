//! The interactive session, start to finish.
//!
//! One controller run walks the whole lifecycle: resolve the requested
//! image, provision an idle container from it, run transfer rounds until
//! the operator stops, offer a commit after import rounds, then tear the
//! container down. Once a container exists, every path through the
//! session reaches the cleanup step; the container outlives the session
//! only when the operator explicitly keeps it.

use std::sync::Arc;

use crate::session::commit::{CommitManager, CommitRequest};
use crate::session::config::{SessionAction, SessionConfig};
use crate::session::error::{Result, SessionError};
use crate::session::image::{ImageResolver, ImageStatus};
use crate::session::listing::{DirectoryLister, DirectoryListing};
use crate::session::provision::{ContainerProvisioner, ContainerSession};
use crate::session::runtime::ContainerRuntime;
use crate::session::transfer::{TransferDirection, TransferEngine, TransferRequest};
use crate::ui::prompts::{Prompter, expand_home};
use crate::ui::render;

/// Where a session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    ResolvingImage,
    StartingContainer,
    Active,
    Committing,
    Cleanup,
    Done,
    /// Ended before a container existed; nothing to clean up.
    Aborted,
}

/// What a finished session did, for the closing report.
#[derive(Debug, Clone, Default)]
pub struct SessionSummary {
    pub phase: SessionPhase,
    pub source_image: Option<String>,
    pub container_id: Option<String>,
    pub files_in: usize,
    pub files_out: usize,
    pub committed_image: Option<String>,
    pub container_removed: bool,
}

#[derive(Default)]
struct Tally {
    files_in: usize,
    files_out: usize,
}

/// Drives one interactive session against a container runtime.
pub struct SessionController<P: Prompter> {
    runtime: Arc<dyn ContainerRuntime>,
    prompter: P,
    config: SessionConfig,
    resolver: ImageResolver,
    provisioner: ContainerProvisioner,
    lister: DirectoryLister,
    engine: TransferEngine,
    committer: CommitManager,
    phase: SessionPhase,
}

impl<P: Prompter> SessionController<P> {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, prompter: P, config: SessionConfig) -> Self {
        Self {
            resolver: ImageResolver::new(runtime.clone()),
            provisioner: ContainerProvisioner::new(runtime.clone(), config.clone()),
            lister: DirectoryLister::new(runtime.clone()),
            engine: TransferEngine::new(runtime.clone()),
            committer: CommitManager::new(runtime.clone()),
            runtime,
            prompter,
            config,
            phase: SessionPhase::Idle,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Run the session to completion.
    ///
    /// `Ok` means the session ended in an orderly way, including the case
    /// where the operator declined everything. `Err` is reserved for
    /// failures that end the session early: no daemon, no image, no
    /// container, or an input stream that died mid-session (cleanup still
    /// runs in that last case).
    pub async fn run(&mut self) -> Result<SessionSummary> {
        let mut summary = SessionSummary::default();

        self.phase = SessionPhase::ResolvingImage;
        if let Err(err) = self.runtime.ping().await {
            self.phase = SessionPhase::Aborted;
            return Err(err);
        }

        let Some(reference) = self.requested_image().await? else {
            render::print_warn("no image given; nothing to do");
            self.phase = SessionPhase::Aborted;
            summary.phase = SessionPhase::Aborted;
            return Ok(summary);
        };
        let Some(action) = self.requested_action()? else {
            render::print_warn("no action chosen; nothing to do");
            self.phase = SessionPhase::Aborted;
            summary.phase = SessionPhase::Aborted;
            return Ok(summary);
        };

        let resolved = match self.resolver.resolve(&reference).await {
            Ok(resolved) => resolved,
            Err(err) => {
                self.phase = SessionPhase::Aborted;
                return Err(err);
            }
        };
        match resolved.status {
            ImageStatus::Ready => {
                render::print_info(&format!("image {} already present", resolved.reference));
            }
            ImageStatus::Pulled => {
                render::print_success(&format!("pulled {}", resolved.reference));
            }
        }
        summary.source_image = Some(resolved.reference.clone());

        self.phase = SessionPhase::StartingContainer;
        let mut session = match self.provisioner.provision(&resolved.reference).await {
            Ok(session) => session,
            Err(err) => {
                self.phase = SessionPhase::Aborted;
                return Err(err);
            }
        };
        summary.container_id = Some(session.container_id.clone());
        render::print_success(&format!(
            "container {} is idling; nothing from the image is running",
            session.container_name
        ));

        self.phase = SessionPhase::Active;
        let rounds = self.run_rounds(&session.container_id, action).await;

        if let Ok(tally) = &rounds {
            summary.files_in = tally.files_in;
            summary.files_out = tally.files_out;

            if action == SessionAction::Import {
                match self.offer_commit(&session.container_id).await {
                    Ok(committed) => summary.committed_image = committed,
                    Err(err) => {
                        render::print_warn(&format!("skipping commit: {err}"));
                    }
                }
            }
        } else {
            render::print_error("session input failed; cleaning up");
        }

        self.phase = SessionPhase::Cleanup;
        summary.container_removed = self.cleanup(&mut session).await;

        self.phase = SessionPhase::Done;
        summary.phase = SessionPhase::Done;

        rounds.map(|_| summary)
    }

    /// The preset image, or a prompt for one with the local images shown
    /// first for orientation.
    async fn requested_image(&self) -> Result<Option<String>> {
        if let Some(image) = &self.config.image {
            return Ok(Some(image.clone()));
        }

        match self.runtime.list_images().await {
            Ok(records) if !records.is_empty() => {
                println!("{}", render::image_table(&records));
            }
            Ok(_) => {}
            Err(err) => tracing::debug!("could not list local images: {}", err),
        }

        let answer = self.prompter.input("Image to open (repository[:tag])")?;
        Ok(answer
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()))
    }

    fn requested_action(&self) -> Result<Option<SessionAction>> {
        if let Some(action) = self.config.action {
            return Ok(Some(action));
        }
        let items = [SessionAction::Export, SessionAction::Import];
        let labels: Vec<String> = items.iter().map(|a| a.label().to_string()).collect();
        let answer = self.prompter.select("What do you want to do?", &labels)?;
        Ok(answer.map(|index| items[index]))
    }

    /// Repeat transfer rounds until the operator stops answering yes.
    ///
    /// A round that ends in "no answer" at any prompt stops the rounds
    /// without asking for another one.
    async fn run_rounds(&self, container_id: &str, action: SessionAction) -> Result<Tally> {
        let mut tally = Tally::default();

        loop {
            let completed = match action {
                SessionAction::Export => self.export_round(container_id, &mut tally).await?,
                SessionAction::Import => self.import_round(container_id, &mut tally).await?,
            };
            if !completed {
                break;
            }

            match self.prompter.confirm("Run another round?", false)? {
                Some(true) => continue,
                Some(false) | None => break,
            }
        }

        Ok(tally)
    }

    /// One round copying files out of the container. Returns `false` when
    /// the operator stopped answering.
    async fn export_round(&self, container_id: &str, tally: &mut Tally) -> Result<bool> {
        let Some(source_dir) = self
            .prompter
            .input_with_default("Container directory to copy from", "/")?
        else {
            return Ok(false);
        };
        let source_dir = source_dir.trim().to_string();

        let files: Vec<String> = match self.lister.list(container_id, &source_dir).await {
            DirectoryListing::Entries(entries) if entries.is_empty() => {
                render::print_info(&format!("{source_dir} is empty"));
                return Ok(true);
            }
            DirectoryListing::Entries(entries) => {
                let Some(picked) = self.prompter.multi_select("Files to copy out", &entries)?
                else {
                    return Ok(false);
                };
                picked.into_iter().map(|i| entries[i].clone()).collect()
            }
            DirectoryListing::Unavailable { reason } => {
                render::print_warn(&format!("cannot list {source_dir}: {reason}"));
                let Some(manual) = self
                    .prompter
                    .input("File names to copy out (space-separated)")?
                else {
                    return Ok(false);
                };
                manual.split_whitespace().map(str::to_string).collect()
            }
        };
        if files.is_empty() {
            render::print_info("nothing selected");
            return Ok(true);
        }

        let Some(dest_dir) = self
            .prompter
            .input_with_default("Local directory to copy into", ".")?
        else {
            return Ok(false);
        };
        let dest_dir = expand_home(dest_dir.trim());

        let request = TransferRequest {
            direction: TransferDirection::FromContainer,
            remote_dir: source_dir,
            local_dir: dest_dir,
            files,
        };
        tally.files_out += self.run_transfer(container_id, &request).await;
        Ok(true)
    }

    /// One round copying files into the container. Returns `false` when
    /// the operator stopped answering.
    async fn import_round(&self, container_id: &str, tally: &mut Tally) -> Result<bool> {
        let Some(source_dir) = self
            .prompter
            .input_with_default("Local directory to copy from", ".")?
        else {
            return Ok(false);
        };
        let source_dir = expand_home(source_dir.trim());

        let files: Vec<String> = match local_entries(&source_dir) {
            Ok(entries) if entries.is_empty() => {
                render::print_info(&format!("{source_dir} is empty"));
                return Ok(true);
            }
            Ok(entries) => {
                let Some(picked) = self.prompter.multi_select("Files to copy in", &entries)?
                else {
                    return Ok(false);
                };
                picked.into_iter().map(|i| entries[i].clone()).collect()
            }
            Err(err) => {
                render::print_warn(&format!("cannot list {source_dir}: {err}"));
                let Some(manual) = self
                    .prompter
                    .input("File names to copy in (space-separated)")?
                else {
                    return Ok(false);
                };
                manual.split_whitespace().map(str::to_string).collect()
            }
        };
        if files.is_empty() {
            render::print_info("nothing selected");
            return Ok(true);
        }

        // Container-side destinations must be absolute; there is no
        // working directory to resolve a relative path against.
        let dest_dir = loop {
            let Some(dir) = self
                .prompter
                .input_with_default("Container directory to copy into", "/")?
            else {
                return Ok(false);
            };
            let dir = dir.trim().to_string();
            if dir.starts_with('/') {
                break dir;
            }
            render::print_warn("container destination must be an absolute path");
        };

        let request = TransferRequest {
            direction: TransferDirection::ToContainer,
            remote_dir: dest_dir,
            local_dir: source_dir,
            files,
        };
        tally.files_in += self.run_transfer(container_id, &request).await;
        Ok(true)
    }

    /// Execute one batch and report it; returns how many files succeeded.
    async fn run_transfer(&self, container_id: &str, request: &TransferRequest) -> usize {
        match self.engine.execute(container_id, request).await {
            Ok(outcomes) => {
                println!("{}", render::outcome_table(&outcomes));
                let succeeded = outcomes.iter().filter(|o| o.succeeded).count();
                let failed = outcomes.len() - succeeded;
                if failed > 0 {
                    render::print_warn(&format!(
                        "{failed} of {} files failed to copy",
                        outcomes.len()
                    ));
                }
                succeeded
            }
            Err(err) => {
                render::print_error(&format!("transfer failed: {err}"));
                0
            }
        }
    }

    /// Offer to commit the container. Declining, giving no name, and a
    /// failed commit all leave the session on its way to cleanup; the
    /// committing phase begins only once the operator opts in.
    async fn offer_commit(&mut self, container_id: &str) -> Result<Option<String>> {
        let Some(wants_commit) = self
            .prompter
            .confirm("Commit the container as a new image?", false)?
        else {
            return Ok(None);
        };
        if !wants_commit {
            return Ok(None);
        }
        self.phase = SessionPhase::Committing;

        let Some(name) = self.prompter.input("New image name (repository[:tag])")? else {
            return Ok(None);
        };
        let name = name.trim().to_string();
        if name.is_empty() {
            render::print_info("no name given; skipping commit");
            return Ok(None);
        }

        let request = CommitRequest::parse(&name, &self.config.default_commit_tag);
        match self.committer.commit(container_id, &request).await {
            Ok(reference) => {
                render::print_success(&format!("committed {reference}"));
                Ok(Some(reference))
            }
            Err(err) => {
                render::print_error(&format!("commit failed: {err}"));
                Ok(None)
            }
        }
    }

    /// Tear the container down, or leave it if the operator says so.
    /// Returns whether the container is gone afterwards.
    async fn cleanup(&self, session: &mut ContainerSession) -> bool {
        let prompt = format!("Remove container {}?", session.container_name);
        let answer = match self.prompter.confirm(&prompt, true) {
            Ok(answer) => answer,
            Err(err) => {
                render::print_warn(&format!("could not read answer: {err}"));
                None
            }
        };

        match answer {
            Some(true) => match self.provisioner.teardown(session).await {
                Ok(()) => {
                    render::print_success("container stopped and removed");
                    true
                }
                Err(SessionError::ContainerNotFound { id }) => {
                    render::print_warn(&format!("container {id} was already gone"));
                    true
                }
                Err(err) => {
                    render::print_error(&format!("cleanup failed: {err}"));
                    false
                }
            },
            Some(false) | None => {
                render::print_warn(&format!(
                    "container {} left running; remove it with: docker rm -f {}",
                    session.container_name, session.container_id
                ));
                false
            }
        }
    }
}

fn local_entries(dir: &str) -> std::io::Result<Vec<String>> {
    let mut entries: Vec<String> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect();
    entries.sort();
    Ok(entries)
}
