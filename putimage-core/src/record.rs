use serde::{Deserialize, Serialize};

/// One of the three stacked rasters shown for an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    /// The source image; never written by the editor.
    Original,
    /// Free-color sketch layer.
    Draw,
    /// Binary inpainting mask.
    Mask,
}

impl LayerKind {
    pub const ALL: [LayerKind; 3] = [LayerKind::Original, LayerKind::Draw, LayerKind::Mask];

    pub fn label(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Draw => "draw",
            Self::Mask => "mask",
        }
    }
}

/// A cached directory entry: the original image plus any persisted edit layers.
///
/// Field names match the listing wire format, so a record deserializes
/// straight from a `listImages` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub original_path: String,
    /// Base name without extension. Identity of the record and the
    /// filename shown to the user.
    pub original_name: String,
    #[serde(default)]
    pub draw_path: Option<String>,
    #[serde(default)]
    pub draw_name: Option<String>,
    #[serde(default)]
    pub mask_path: Option<String>,
    #[serde(default)]
    pub mask_name: Option<String>,
}

impl ImageRecord {
    /// A record with no persisted edit layers yet.
    pub fn new(original_path: impl Into<String>, original_name: impl Into<String>) -> Self {
        Self {
            original_path: original_path.into(),
            original_name: original_name.into(),
            draw_path: None,
            draw_name: None,
            mask_path: None,
            mask_name: None,
        }
    }

    /// Location of the given layer, if one is persisted.
    pub fn layer_path(&self, kind: LayerKind) -> Option<&str> {
        match kind {
            LayerKind::Original => Some(self.original_path.as_str()),
            LayerKind::Draw => self.draw_path.as_deref(),
            LayerKind::Mask => self.mask_path.as_deref(),
        }
    }

    /// Record the locations returned by a successful save.
    pub fn apply_edit(&mut self, edited: &EditedLayers) {
        self.draw_name = Some(edited.draw_name.clone());
        self.draw_path = Some(edited.draw_path.clone());
        self.mask_name = Some(edited.mask_name.clone());
        self.mask_path = Some(edited.mask_path.clone());
    }

    /// Forget the edit layers after a successful clear.
    pub fn clear_edits(&mut self) {
        self.draw_name = None;
        self.draw_path = None;
        self.mask_name = None;
        self.mask_path = None;
    }

    pub fn has_edits(&self) -> bool {
        self.draw_path.is_some() || self.mask_path.is_some()
    }
}

/// Response of `saveEditedLayers`: where the draw and mask layers now live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditedLayers {
    pub draw_name: String,
    pub draw_path: String,
    pub mask_name: String,
    pub mask_path: String,
}
