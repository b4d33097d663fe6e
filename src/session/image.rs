//! Image reference handling and resolution.
//!
//! References are normalized before touching the daemon: a reference with
//! no tag gets `:latest` appended, because asking the registry for a bare
//! repository name would fetch every tag it has.

use std::sync::Arc;

use crate::session::error::Result;
use crate::session::runtime::ContainerRuntime;
use crate::ui::render;

/// How a resolved image became available locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStatus {
    /// Already present in local storage.
    Ready,
    /// Fetched from the registry during resolution.
    Pulled,
}

/// A normalized reference that is now present in local storage.
#[derive(Debug, Clone)]
pub struct ResolvedImage {
    pub reference: String,
    pub status: ImageStatus,
}

/// Split a reference into repository and tag, defaulting the tag to
/// `latest`.
///
/// A colon only separates the tag when it comes after the last `/`;
/// otherwise it belongs to a registry port (`localhost:5000/app`).
pub fn split_reference(reference: &str) -> (&str, &str) {
    split_reference_or(reference, "latest")
}

/// [`split_reference`] with a caller-chosen fallback tag.
pub fn split_reference_or<'a>(reference: &'a str, default_tag: &'a str) -> (&'a str, &'a str) {
    let slash = reference.rfind('/');
    match reference.rfind(':') {
        Some(colon) if slash.is_none_or(|s| colon > s) => {
            let tag = &reference[colon + 1..];
            if tag.is_empty() {
                (&reference[..colon], default_tag)
            } else {
                (&reference[..colon], tag)
            }
        }
        _ => (reference, default_tag),
    }
}

/// Rewrite `reference` in canonical `repository:tag` form.
pub fn normalize_reference(reference: &str) -> String {
    let (repository, tag) = split_reference(reference);
    format!("{repository}:{tag}")
}

/// Makes a requested image available locally, pulling it when needed.
pub struct ImageResolver {
    runtime: Arc<dyn ContainerRuntime>,
}

impl ImageResolver {
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self { runtime }
    }

    /// Resolve `reference` to a locally available image.
    ///
    /// Fails with [`crate::session::error::SessionError::ImageNotFound`]
    /// when the image is neither local nor pullable, which ends the
    /// session before any container exists.
    pub async fn resolve(&self, reference: &str) -> Result<ResolvedImage> {
        let reference = normalize_reference(reference);

        if self.runtime.image_exists(&reference).await? {
            tracing::debug!(image = %reference, "image already present");
            return Ok(ResolvedImage {
                reference,
                status: ImageStatus::Ready,
            });
        }

        // Pulls can run for minutes; say so before going quiet.
        render::print_info(&format!("pulling {reference}, this can take a while"));
        self.runtime.pull_image(&reference).await?;
        Ok(ResolvedImage {
            reference,
            status: ImageStatus::Pulled,
        })
    }
}
