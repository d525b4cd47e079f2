use serde::{Deserialize, Serialize};

/// Tunable constants of the canvas editor.
///
/// Every field falls back to its default when missing from a stored
/// configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Distance between interpolated stamps, in image pixels.
    #[serde(default = "default_interpolation_step")]
    pub interpolation_step: f64,
    /// Touch moves arriving later than this after the previous stamp are
    /// painted as a single disc instead of being interpolated.
    #[serde(default = "default_continuity_threshold_ms")]
    pub continuity_threshold_ms: f64,
    /// Initial brush radius in image pixels.
    #[serde(default = "default_brush_size")]
    pub default_brush_size: f64,
    /// Largest brush radius in CSS pixels; divided by the zoom to get the
    /// image-pixel limit.
    #[serde(default = "default_max_brush_css")]
    pub max_brush_css: f64,
    /// Smallest brush radius in image pixels.
    #[serde(default = "default_min_brush_size")]
    pub min_brush_size: f64,
    /// CSS pixels of the image that must stay inside the container.
    #[serde(default = "default_bounds_margin")]
    pub bounds_margin: f64,
    /// Brush radius change per wheel tick, in CSS pixels.
    #[serde(default = "default_wheel_step")]
    pub wheel_step: f64,
    /// Wheel step while any modifier key is held.
    #[serde(default = "default_wheel_step_fast")]
    pub wheel_step_fast: f64,
    /// Color painted onto the mask surface.
    #[serde(default)]
    pub mask_rgb: [u8; 3],
}

fn default_interpolation_step() -> f64 {
    5.0
}
fn default_continuity_threshold_ms() -> f64 {
    20.0
}
fn default_brush_size() -> f64 {
    100.0
}
fn default_max_brush_css() -> f64 {
    100.0
}
fn default_min_brush_size() -> f64 {
    1.0
}
fn default_bounds_margin() -> f64 {
    10.0
}
fn default_wheel_step() -> f64 {
    0.5
}
fn default_wheel_step_fast() -> f64 {
    3.0
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            interpolation_step: default_interpolation_step(),
            continuity_threshold_ms: default_continuity_threshold_ms(),
            default_brush_size: default_brush_size(),
            max_brush_css: default_max_brush_css(),
            min_brush_size: default_min_brush_size(),
            bounds_margin: default_bounds_margin(),
            wheel_step: default_wheel_step(),
            wheel_step_fast: default_wheel_step_fast(),
            mask_rgb: [0, 0, 0],
        }
    }
}
