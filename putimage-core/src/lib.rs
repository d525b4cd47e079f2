pub mod error;
pub mod index;
pub mod mode;
pub mod navigator;
pub mod path;
pub mod record;
pub mod store;
pub mod view;

// Re-export primary types for convenience.
pub use error::{CoreError, StoreError};
pub use index::wrap_index;
pub use mode::AdvanceMode;
pub use navigator::{Counters, NavOutcome, Navigation, Navigator, ReloadTicket, NO_IMAGE};
pub use path::{file_stem, same_directory, split_image_path, ImagePath};
pub use record::{EditedLayers, ImageRecord, LayerKind};
pub use store::{DirectoryLabel, LayerStore};
pub use view::{LayerPlacement, Point, Size, ViewTransform};

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
