//! The persistence collaborator: lists directories and stores edit layers.

use crate::error::StoreError;
use crate::record::{EditedLayers, ImageRecord};

/// Fixed destinations for "send to" actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryLabel {
    Input,
    Output,
}

impl DirectoryLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

/// Storage backend for image listings and edited layers, keyed by the
/// original image's path.
///
/// Implementations may be remote; every call is a potential suspension
/// point and may fail without side effects on the caller.
pub trait LayerStore: Send + Sync {
    /// Ordered listing of the images in `dir`. A blank path lists nothing.
    fn list_images(&self, dir: &str) -> Result<Vec<ImageRecord>, StoreError>;

    /// Raw encoded bytes of the raster at `path`. `cache_token` only has to
    /// differ between requests that must not be served from a cache.
    fn fetch_raster(&self, path: &str, cache_token: u64) -> Result<Vec<u8>, StoreError>;

    /// Persist encoded draw and mask layers for `original_path`.
    fn save_edited_layers(
        &self,
        original_path: &str,
        draw: &[u8],
        mask: &[u8],
    ) -> Result<EditedLayers, StoreError>;

    /// Delete any persisted edit layers for `original_path`.
    fn clear_edited_layers(&self, original_path: &str) -> Result<(), StoreError>;

    /// Copy the file at `path` into one of the fixed directories.
    fn send_to_dir(&self, path: &str, label: DirectoryLabel) -> Result<(), StoreError>;
}
