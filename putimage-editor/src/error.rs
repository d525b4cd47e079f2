use thiserror::Error;

use putimage_core::{CoreError, LayerKind, StoreError};

/// Errors originating from the canvas editor and the node built around it.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("{0} layer is not loaded")]
    NotLoaded(&'static str),

    #[error("{kind:?} layer is {width}×{height}, expected {expected_width}×{expected_height}")]
    DimensionMismatch {
        kind: LayerKind,
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },

    #[error("failed to decode raster: {0}")]
    Decode(#[from] image::ImageError),

    #[error("failed to encode PNG: {0}")]
    Encode(#[from] png::EncodingError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
