use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use putimage_core::AdvanceMode;
use putimage_editor::EditorConfig;

// ---------------------------------------------------------------------------
// Per-node settings
// ---------------------------------------------------------------------------

/// What a node restores on startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePrefs {
    #[serde(default)]
    pub directory: String,
    #[serde(default)]
    pub mode: AdvanceMode,
}

// ---------------------------------------------------------------------------
// Application preferences
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppPreferences {
    #[serde(default = "default_window_width")]
    pub window_width: f32,
    #[serde(default = "default_window_height")]
    pub window_height: f32,
    /// One entry per node, in creation order.
    #[serde(default = "default_nodes")]
    pub nodes: Vec<NodePrefs>,
    /// Opacity of the mask overlay, 0.0..=1.0.
    #[serde(default = "default_mask_opacity")]
    pub mask_opacity: f32,
    /// Host canvas scale restored on startup.
    #[serde(default = "default_host_scale")]
    pub host_scale: f32,
    /// Folder holding the `input` and `output` directories used by
    /// "send to". Empty means the current directory.
    #[serde(default)]
    pub store_root: String,
    #[serde(default)]
    pub editor: EditorConfig,
}

fn default_window_width() -> f32 {
    1280.0
}
fn default_window_height() -> f32 {
    800.0
}
fn default_nodes() -> Vec<NodePrefs> {
    vec![NodePrefs::default()]
}
fn default_mask_opacity() -> f32 {
    0.6
}
fn default_host_scale() -> f32 {
    1.0
}

impl Default for AppPreferences {
    fn default() -> Self {
        Self {
            window_width: default_window_width(),
            window_height: default_window_height(),
            nodes: default_nodes(),
            mask_opacity: default_mask_opacity(),
            host_scale: default_host_scale(),
            store_root: String::new(),
            editor: EditorConfig::default(),
        }
    }
}

impl AppPreferences {
    /// Load preferences from the OS config directory, falling back to defaults.
    pub fn load() -> Self {
        let path = config_path();
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(json) => match serde_json::from_str::<AppPreferences>(&json) {
                    Ok(prefs) => {
                        info!("Loaded preferences from {}", path.display());
                        return prefs;
                    }
                    Err(e) => {
                        error!("Failed to parse preferences: {e}");
                    }
                },
                Err(e) => {
                    error!("Failed to read preferences file: {e}");
                }
            }
        } else {
            debug!("No preferences file at {}", path.display());
        }
        Self::default()
    }

    /// Persist preferences to disk.
    pub fn save(&self) {
        let path = config_path();
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory: {e}");
                return;
            }
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = fs::write(&path, &json) {
                    error!("Failed to write preferences: {e}");
                } else {
                    debug!("Saved preferences");
                }
            }
            Err(e) => error!("Failed to serialize preferences: {e}"),
        }
    }

    pub fn store_root(&self) -> PathBuf {
        if self.store_root.trim().is_empty() {
            PathBuf::from(".")
        } else {
            PathBuf::from(self.store_root.trim())
        }
    }
}

fn config_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "PutImage")
        .map(|d| d.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
        .join("preferences.json")
}
