pub mod codec;
pub mod config;
pub mod dispatch;
pub mod editor;
pub mod error;
pub mod fs_store;
pub mod mask;
pub mod node;
pub mod output;
pub mod stroke;
pub mod surface;

// Re-export primary types for convenience.
pub use config::EditorConfig;
pub use dispatch::StrokeDispatcher;
pub use editor::{
    BrushCursor, CanvasEditor, EditorMode, ExportedLayers, LoadProgress, LoadTicket, StrokeStart,
};
pub use error::EditorError;
pub use fs_store::FsLayerStore;
pub use node::{LayerRequest, NodeStep, PutImageNode, SaveRequest};
pub use output::{resolve_output, NodeOutput};
pub use stroke::{Modifiers, PointerButton, PointerInput, PointerKind, StrokeAction};
pub use surface::{CompositeOp, Surface};

/// Convenience result type for the editor crate.
pub type Result<T> = std::result::Result<T, EditorError>;
