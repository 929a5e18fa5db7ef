//! Best-effort removal of option images from the remote asset store.
//!
//! Image urls are collected before the engine forgets them, the engine state
//! is mutated, and only then is the store asked to delete. A failed deletion
//! is logged and reported; it never rolls back the local edit.

use thiserror::Error;
use tracing::{debug, warn};

use varmatrix_core::DomainResult;

use crate::matrix::VariationMatrix;
use crate::variation::OptionUpdate;

/// Failure reported by an [`ImageStore`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImageStoreError {
    #[error("image not found: {0}")]
    NotFound(String),

    #[error("asset store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("asset store unreachable: {0}")]
    Transport(String),
}

/// Remote asset store holding option images.
pub trait ImageStore {
    fn delete(&mut self, url: &str) -> Result<(), ImageStoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDeletion {
    pub url: String,
    pub error: ImageStoreError,
}

/// Outcome of the remote half of a removal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub deleted: Vec<String>,
    pub failed: Vec<FailedDeletion>,
}

impl CleanupReport {
    /// Some image may still be on the server; worth telling the user.
    pub fn needs_attention(&self) -> bool {
        !self.failed.is_empty()
    }

    fn delete_all<S: ImageStore + ?Sized>(store: &mut S, urls: Vec<String>) -> Self {
        let mut report = Self::default();
        for url in urls {
            match store.delete(&url) {
                Ok(()) => {
                    debug!(%url, "deleted option image");
                    report.deleted.push(url);
                }
                Err(error) => {
                    warn!(%url, %error, "failed to delete option image; leaving it on the server");
                    report.failed.push(FailedDeletion { url, error });
                }
            }
        }
        report
    }
}

impl VariationMatrix {
    /// Remove an option and delete its image.
    ///
    /// If the engine refuses the removal (last option) nothing is deleted and
    /// the validation error is returned.
    pub fn remove_option_with_cleanup<S: ImageStore + ?Sized>(
        &mut self,
        store: &mut S,
        variation_index: usize,
        option_index: usize,
    ) -> DomainResult<CleanupReport> {
        let url = self
            .variations()
            .get(variation_index)
            .and_then(|v| v.options.get(option_index))
            .and_then(|o| o.image_url.clone());

        let removed = self.remove_option_from_variation(variation_index, option_index)?;
        if removed.is_none() {
            return Ok(CleanupReport::default());
        }
        Ok(CleanupReport::delete_all(store, url.into_iter().collect()))
    }

    /// Remove a variation and delete every image its options referenced.
    pub fn remove_variation_with_cleanup<S: ImageStore + ?Sized>(
        &mut self,
        store: &mut S,
        index: usize,
    ) -> CleanupReport {
        let urls = self
            .variations()
            .get(index)
            .map(|v| v.image_urls())
            .unwrap_or_default();

        if self.remove_variation(index).is_none() {
            return CleanupReport::default();
        }
        CleanupReport::delete_all(store, urls)
    }

    /// Point an option at a new image (or none) and delete the one it replaced.
    pub fn replace_option_image<S: ImageStore + ?Sized>(
        &mut self,
        store: &mut S,
        variation_index: usize,
        option_index: usize,
        image_url: Option<String>,
    ) -> CleanupReport {
        let Some(option) = self
            .variations()
            .get(variation_index)
            .and_then(|v| v.options.get(option_index))
        else {
            return CleanupReport::default();
        };

        let previous = option.image_url.clone().filter(|old| Some(old) != image_url.as_ref());
        self.update_option_in_variation(
            variation_index,
            option_index,
            &OptionUpdate::image_url(image_url),
        );
        CleanupReport::delete_all(store, previous.into_iter().collect())
    }
}
