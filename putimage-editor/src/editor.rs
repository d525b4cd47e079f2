//! The three-layer canvas editor attached to one node.

use image::imageops::{self, FilterType};
use image::RgbaImage;
use tracing::{debug, info, warn};

use putimage_core::{ImageRecord, LayerKind, LayerPlacement, Point, Size, ViewTransform};

use crate::codec;
use crate::config::EditorConfig;
use crate::error::EditorError;
use crate::mask;
use crate::stroke::{interpolate, Modifiers, PointerInput, PointerKind, StrokeAction};
use crate::surface::{CompositeOp, Surface};

/// Brush cursor color before any color pick: black at 20% opacity.
const DEFAULT_BRUSH_COLOR: [u8; 4] = [0, 0, 0, 51];
/// Alpha of the brush cursor after a color pick.
const PICKED_BRUSH_ALPHA: u8 = 128;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// What a primary click does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorMode {
    /// Paint on the mask surface.
    #[default]
    Mask,
    /// Paint on the draw surface with the picked color.
    Sketch,
    /// Sample the original layer under the pointer.
    PickColor,
}

impl EditorMode {
    pub const ALL: [EditorMode; 3] = [EditorMode::Mask, EditorMode::Sketch, EditorMode::PickColor];

    pub fn label(self) -> &'static str {
        match self {
            Self::Mask => "Mask",
            Self::Sketch => "Sketch",
            Self::PickColor => "Pick color",
        }
    }
}

/// Identifies one batch of layer loads. Completions carrying an older
/// ticket belong to a previous image and are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// State of the current load after a layer completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadProgress {
    /// The completion was for a superseded image.
    Stale,
    /// Still waiting for other layers.
    Pending,
    /// All three layers are present and the view has been fitted.
    Ready,
    /// The original could not be loaded; the editor is empty.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeStart {
    Ignored,
    PickedColor([u8; 3]),
    Started,
}

/// Encoded layers produced at the end of a stroke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedLayers {
    pub draw: Vec<u8>,
    pub mask: Vec<u8>,
}

/// Floating brush indicator, in container CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushCursor {
    pub center: Point,
    pub radius: f64,
    pub color: [u8; 4],
}

#[derive(Debug, Clone, Copy)]
struct Stamp {
    center: Point,
    radius: f64,
    op: CompositeOp,
    target: LayerKind,
}

#[derive(Debug, Clone, Copy)]
struct ActiveStroke {
    action: StrokeAction,
    target: LayerKind,
    last_point: Point,
    last_time_ms: f64,
}

// ---------------------------------------------------------------------------
// CanvasEditor
// ---------------------------------------------------------------------------

/// Owns the original, draw and mask surfaces of one image, the view
/// transform, and the brush.
///
/// Surfaces are recreated on every image switch. Draw and mask always
/// match the original's dimensions once the load is ready.
pub struct CanvasEditor {
    config: EditorConfig,
    mode: EditorMode,
    view: ViewTransform,

    original: Option<Surface>,
    draw: Option<Surface>,
    mask: Option<Surface>,
    expect_draw: bool,
    expect_mask: bool,
    ready: bool,
    generation: u64,

    brush_size: f64,
    draw_color: [u8; 3],
    brush_color: [u8; 4],
    last_pressure: f64,

    stroke: Option<ActiveStroke>,
    pending: Vec<Stamp>,
    cursor: Option<Point>,
    revision: u64,
}

impl CanvasEditor {
    pub fn new(config: EditorConfig) -> Self {
        let brush_size = config.default_brush_size;
        Self {
            config,
            mode: EditorMode::default(),
            view: ViewTransform::default(),
            original: None,
            draw: None,
            mask: None,
            expect_draw: false,
            expect_mask: false,
            ready: false,
            generation: 0,
            brush_size,
            draw_color: [0, 0, 0],
            brush_color: DEFAULT_BRUSH_COLOR,
            last_pressure: 1.0,
            stroke: None,
            pending: Vec::new(),
            cursor: None,
            revision: 0,
        }
    }

    // -- Accessors ----------------------------------------------------------

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: EditorMode) {
        self.mode = mode;
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn brush_size(&self) -> f64 {
        self.brush_size
    }

    pub fn draw_color(&self) -> [u8; 3] {
        self.draw_color
    }

    pub fn brush_color(&self) -> [u8; 4] {
        self.brush_color
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn is_drawing(&self) -> bool {
        self.stroke.is_some()
    }

    /// Bumped whenever any surface's pixels change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Identifies the image currently loaded. Changes on every
    /// [`begin_load`](Self::begin_load) and [`clear`](Self::clear), so
    /// hosts can tell a new original from edits to the same one.
    pub fn load_generation(&self) -> u64 {
        self.generation
    }

    pub fn surface(&self, kind: LayerKind) -> Option<&Surface> {
        match kind {
            LayerKind::Original => self.original.as_ref(),
            LayerKind::Draw => self.draw.as_ref(),
            LayerKind::Mask => self.mask.as_ref(),
        }
    }

    fn surface_mut(&mut self, kind: LayerKind) -> Option<&mut Surface> {
        match kind {
            LayerKind::Original => self.original.as_mut(),
            LayerKind::Draw => self.draw.as_mut(),
            LayerKind::Mask => self.mask.as_mut(),
        }
    }

    // -- Loading ------------------------------------------------------------

    /// Drop the current surfaces and start loading `record`'s layers.
    ///
    /// Layers without a persisted location are synthesized blank once the
    /// original arrives.
    pub fn begin_load(&mut self, record: &ImageRecord) -> LoadTicket {
        self.reset_surfaces();
        self.expect_draw = record.draw_path.is_some();
        self.expect_mask = record.mask_path.is_some();
        debug!(
            "loading {:?} (generation {}, draw: {}, mask: {})",
            record.original_name, self.generation, self.expect_draw, self.expect_mask
        );
        LoadTicket {
            generation: self.generation,
        }
    }

    /// Show nothing, e.g. for an empty directory.
    pub fn clear(&mut self) {
        self.reset_surfaces();
    }

    fn reset_surfaces(&mut self) {
        self.generation += 1;
        self.original = None;
        self.draw = None;
        self.mask = None;
        self.expect_draw = false;
        self.expect_mask = false;
        self.ready = false;
        self.stroke = None;
        self.pending.clear();
        self.revision += 1;
    }

    /// Accept a decoded layer for `ticket`.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        kind: LayerKind,
        image: RgbaImage,
    ) -> LoadProgress {
        if ticket.generation != self.generation {
            debug!(
                "dropping stale {} layer (generation {})",
                kind.label(),
                ticket.generation
            );
            return LoadProgress::Stale;
        }
        if self.ready {
            debug!("ignoring late {} layer, load already complete", kind.label());
            return LoadProgress::Ready;
        }

        let surface = Surface::from_image(image);
        match kind {
            LayerKind::Original => self.original = Some(surface),
            LayerKind::Draw => self.draw = Some(surface),
            LayerKind::Mask => self.mask = Some(surface),
        }
        self.synthesize_missing();
        self.finish_if_complete()
    }

    /// Record that a layer could not be fetched or decoded.
    ///
    /// A missing draw or mask layer falls back to a blank one. A missing
    /// original empties the editor.
    pub fn fail_load(&mut self, ticket: LoadTicket, kind: LayerKind) -> LoadProgress {
        if ticket.generation != self.generation {
            return LoadProgress::Stale;
        }
        match kind {
            LayerKind::Original => {
                warn!("original layer failed to load, clearing editor");
                self.reset_surfaces();
                LoadProgress::Failed
            }
            LayerKind::Draw | LayerKind::Mask => {
                warn!("{} layer failed to load, using a blank one", kind.label());
                if kind == LayerKind::Draw {
                    self.expect_draw = false;
                } else {
                    self.expect_mask = false;
                }
                self.synthesize_missing();
                self.finish_if_complete()
            }
        }
    }

    /// Create blank draw/mask layers at the original's size when no
    /// persisted one is coming.
    fn synthesize_missing(&mut self) {
        let Some((w, h)) = self.original.as_ref().map(|s| (s.width, s.height)) else {
            return;
        };
        if !self.expect_draw && self.draw.is_none() {
            self.draw = Some(Surface::transparent(w, h));
        }
        if !self.expect_mask && self.mask.is_none() {
            // Stored convention for "nothing masked"; inverted below.
            self.mask = Some(Surface::filled(w, h, [0, 0, 0, 255]));
        }
    }

    fn finish_if_complete(&mut self) -> LoadProgress {
        let (Some(original), Some(draw), Some(mask)) =
            (self.original.as_ref(), self.draw.as_mut(), self.mask.as_mut())
        else {
            return LoadProgress::Pending;
        };

        conform(draw, original, LayerKind::Draw);
        conform(mask, original, LayerKind::Mask);
        mask::to_editor(mask, self.config.mask_rgb);

        let size = Size::new(original.width as f64, original.height as f64);
        info!("layers ready ({}x{})", original.width, original.height);

        self.ready = true;
        self.revision += 1;
        let container = self.view.container;
        self.view = ViewTransform::new(size);
        self.view.fit(container, self.config.bounds_margin);
        LoadProgress::Ready
    }

    // -- View ---------------------------------------------------------------

    /// Fit the image into `container` and center it. Must be re-run when
    /// the container is resized.
    pub fn initialize_pan_zoom(&mut self, container: Size) -> LayerPlacement {
        self.view.fit(container, self.config.bounds_margin)
    }

    /// Set zoom and pan directly, then clamp.
    pub fn set_pan_zoom(&mut self, zoom: f64, pan: Point) -> LayerPlacement {
        if zoom > 0.0 && zoom.is_finite() {
            self.view.zoom = zoom;
        }
        self.view.pan = pan;
        self.apply_pan_zoom_bounds()
    }

    /// Keep at least the bounds margin of the image on screen.
    pub fn apply_pan_zoom_bounds(&mut self) -> LayerPlacement {
        self.view.apply_bounds(self.config.bounds_margin)
    }

    pub fn placement(&self) -> LayerPlacement {
        self.view.placement()
    }

    // -- Brush --------------------------------------------------------------

    /// Largest brush radius in image pixels at the current zoom.
    pub fn max_brush_size(&self) -> f64 {
        (self.config.max_brush_css / self.view.zoom).max(self.config.min_brush_size)
    }

    pub fn set_brush_size(&mut self, size: f64) -> f64 {
        self.brush_size = size.clamp(self.config.min_brush_size, self.max_brush_size());
        self.brush_size
    }

    /// Grow (wheel up) or shrink (wheel down) the brush by one step.
    /// Never zooms.
    pub fn handle_wheel(&mut self, delta_y: f64, modifiers: Modifiers) -> f64 {
        if delta_y == 0.0 {
            return self.brush_size;
        }
        let step = if modifiers.any() {
            self.config.wheel_step_fast
        } else {
            self.config.wheel_step
        } / self.view.zoom;
        let size = if delta_y < 0.0 {
            self.brush_size + step
        } else {
            self.brush_size - step
        };
        self.set_brush_size(size)
    }

    /// Sample the original layer at an image-pixel point and adopt its
    /// color for sketching.
    pub fn pick_color(&mut self, at: Point) -> Option<[u8; 3]> {
        if !self.view.contains_image_point(at) {
            return None;
        }
        let px = self.original.as_ref()?.pixel(at.x as u32, at.y as u32)?;
        let rgb = [px[0], px[1], px[2]];
        self.draw_color = rgb;
        self.brush_color = [rgb[0], rgb[1], rgb[2], PICKED_BRUSH_ALPHA];
        debug!("picked color {:?}", rgb);
        Some(rgb)
    }

    pub fn hover(&mut self, pos: Point) {
        self.cursor = Some(pos);
    }

    pub fn leave(&mut self) {
        self.cursor = None;
    }

    /// The brush indicator at the last hover position, scaled by the host
    /// canvas scale.
    pub fn brush_cursor(&self, host_scale: f64) -> Option<BrushCursor> {
        let center = self.cursor?;
        if !self.ready {
            return None;
        }
        Some(BrushCursor {
            center,
            radius: self.brush_size * self.view.zoom * host_scale,
            color: self.brush_color,
        })
    }

    // -- Strokes ------------------------------------------------------------

    fn target(&self) -> LayerKind {
        match self.mode {
            EditorMode::Sketch => LayerKind::Draw,
            EditorMode::Mask | EditorMode::PickColor => LayerKind::Mask,
        }
    }

    /// Effective radius for this event. Pen pressure scales the brush
    /// down; touch events close together reuse the previous pressure.
    fn pressure_radius(&mut self, input: &PointerInput, elapsed_ms: Option<f64>) -> f64 {
        let pressure = match input.kind {
            PointerKind::Mouse => 1.0,
            PointerKind::Pen => input.pressure,
            PointerKind::Touch => match elapsed_ms {
                Some(dt) if dt <= self.config.continuity_threshold_ms => self.last_pressure,
                _ => input.pressure,
            },
        };
        let pressure = if pressure > 0.0 && pressure.is_finite() {
            pressure.min(1.0)
        } else {
            1.0
        };
        self.last_pressure = pressure;
        self.brush_size * pressure
    }

    /// Pointer down. Paints the first disc immediately.
    pub fn begin_stroke(&mut self, input: &PointerInput) -> StrokeStart {
        self.cursor = Some(input.pos);
        if !self.ready {
            return StrokeStart::Ignored;
        }
        let Some(button) = input.button else {
            return StrokeStart::Ignored;
        };
        let Some(action) = StrokeAction::from_button(button) else {
            return StrokeStart::Ignored;
        };

        let at = self.view.screen_to_image(input.pos);
        if input.modifiers.picks_color() || self.mode == EditorMode::PickColor {
            return match self.pick_color(at) {
                Some(rgb) => StrokeStart::PickedColor(rgb),
                None => StrokeStart::Ignored,
            };
        }

        let target = self.target();
        let radius = self.pressure_radius(input, None);
        self.stroke = Some(ActiveStroke {
            action,
            target,
            last_point: at,
            last_time_ms: input.time_ms,
        });
        self.apply_stamp(Stamp {
            center: at,
            radius,
            op: action.op(),
            target,
        });
        StrokeStart::Started
    }

    /// Pointer move. Queues stamps for the next frame; returns `true` while
    /// a stroke is active.
    pub fn continue_stroke(&mut self, input: &PointerInput) -> bool {
        self.cursor = Some(input.pos);
        let Some(stroke) = self.stroke else {
            return false;
        };

        let at = self.view.screen_to_image(input.pos);
        let elapsed = input.time_ms - stroke.last_time_ms;
        let radius = self.pressure_radius(input, Some(elapsed));
        let op = stroke.action.op();

        let centers = if input.kind == PointerKind::Touch
            && elapsed > self.config.continuity_threshold_ms
        {
            vec![at]
        } else {
            interpolate(stroke.last_point, at, self.config.interpolation_step)
        };
        self.pending.extend(centers.into_iter().map(|center| Stamp {
            center,
            radius,
            op,
            target: stroke.target,
        }));

        self.stroke = Some(ActiveStroke {
            last_point: at,
            last_time_ms: input.time_ms,
            ..stroke
        });
        true
    }

    /// Paint all stamps queued since the last frame. Returns `true` if any
    /// pixels changed.
    pub fn flush_frame(&mut self) -> bool {
        if self.pending.is_empty() {
            return false;
        }
        let stamps = std::mem::take(&mut self.pending);
        let mut changed = false;
        for stamp in stamps {
            changed |= self.stamp(stamp);
        }
        if changed {
            self.revision += 1;
        }
        changed
    }

    fn apply_stamp(&mut self, stamp: Stamp) {
        if self.stamp(stamp) {
            self.revision += 1;
        }
    }

    fn stamp(&mut self, stamp: Stamp) -> bool {
        let rgb = match stamp.target {
            LayerKind::Draw => self.draw_color,
            _ => self.config.mask_rgb,
        };
        match self.surface_mut(stamp.target) {
            Some(surface) => surface.stamp_disc(stamp.center, stamp.radius, stamp.op, rgb),
            None => false,
        }
    }

    /// Pointer released anywhere. If a stroke was active, paints any queued
    /// stamps and returns the encoded layers to persist.
    pub fn end_stroke(&mut self) -> crate::Result<Option<ExportedLayers>> {
        if self.stroke.take().is_none() {
            return Ok(None);
        }
        self.flush_frame();
        Ok(Some(ExportedLayers {
            draw: self.export_draw()?,
            mask: self.export_mask()?,
        }))
    }

    // -- Layers -------------------------------------------------------------

    /// Reset draw and mask to blank layers of the original's size.
    pub fn clear_layers(&mut self) -> crate::Result<()> {
        let (w, h) = self
            .original
            .as_ref()
            .map(|s| (s.width, s.height))
            .ok_or(EditorError::NotLoaded("original"))?;
        self.draw = Some(Surface::transparent(w, h));
        self.mask = Some(Surface::transparent(w, h));
        self.stroke = None;
        self.pending.clear();
        self.revision += 1;
        Ok(())
    }

    /// PNG of the mask in its stored convention.
    pub fn export_mask(&self) -> crate::Result<Vec<u8>> {
        let mask = self.mask.as_ref().ok_or(EditorError::NotLoaded("mask"))?;
        codec::encode_png(&mask::to_storage(mask))
    }

    pub fn export_draw(&self) -> crate::Result<Vec<u8>> {
        let draw = self.draw.as_ref().ok_or(EditorError::NotLoaded("draw"))?;
        codec::encode_png(draw)
    }
}

impl Default for CanvasEditor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

/// Resize a persisted layer whose size disagrees with the original.
fn conform(layer: &mut Surface, original: &Surface, kind: LayerKind) {
    if layer.same_size(original) {
        return;
    }
    warn!(
        "{}",
        EditorError::DimensionMismatch {
            kind,
            width: layer.width,
            height: layer.height,
            expected_width: original.width,
            expected_height: original.height,
        }
    );
    let resized = layer
        .to_image()
        .map(|img| imageops::resize(&img, original.width, original.height, FilterType::Nearest));
    *layer = match resized {
        Some(img) => Surface::from_image(img),
        None => Surface::transparent(original.width, original.height),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::PointerButton;

    fn record(draw: bool, mask: bool) -> ImageRecord {
        let mut rec = ImageRecord::new("dir/a.png", "a");
        if draw {
            rec.draw_path = Some("dir/.a_d.png".into());
        }
        if mask {
            rec.mask_path = Some("dir/.a_m.png".into());
        }
        rec
    }

    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| image::Rgba([x as u8, y as u8, 7, 255]))
    }

    /// Editor with a `w`x`h` original loaded into a same-size container.
    fn ready_editor(w: u32, h: u32) -> CanvasEditor {
        let mut ed = CanvasEditor::default();
        ed.initialize_pan_zoom(Size::new(w as f64, h as f64));
        let ticket = ed.begin_load(&record(false, false));
        assert_eq!(
            ed.complete_load(ticket, LayerKind::Original, gradient(w, h)),
            LoadProgress::Ready
        );
        ed
    }

    fn press(x: f64, y: f64, t: f64) -> PointerInput {
        PointerInput::mouse(Point::new(x, y), t).with_button(PointerButton::Primary)
    }

    #[test]
    fn load_generation_tracks_image_switches_not_strokes() {
        let mut ed = ready_editor(20, 20);
        let first = ed.load_generation();
        ed.begin_stroke(&press(5.0, 5.0, 0.0));
        ed.end_stroke().unwrap();
        assert_eq!(ed.load_generation(), first);

        let ticket = ed.begin_load(&record(false, false));
        ed.complete_load(ticket, LayerKind::Original, gradient(20, 20));
        assert!(ed.is_ready());
        assert_ne!(ed.load_generation(), first);
    }

    #[test]
    fn original_alone_synthesizes_blank_layers() {
        let ed = ready_editor(40, 30);
        let draw = ed.surface(LayerKind::Draw).unwrap();
        let mask = ed.surface(LayerKind::Mask).unwrap();
        assert_eq!((draw.width, draw.height), (40, 30));
        assert_eq!((mask.width, mask.height), (40, 30));
        assert_eq!(draw.coverage(), 0);
        assert_eq!(mask.coverage(), 0, "blank mask shows nothing masked");
    }

    #[test]
    fn waits_for_persisted_layers() {
        let mut ed = CanvasEditor::default();
        let ticket = ed.begin_load(&record(true, true));
        assert_eq!(
            ed.complete_load(ticket, LayerKind::Original, gradient(8, 8)),
            LoadProgress::Pending
        );
        assert_eq!(
            ed.complete_load(ticket, LayerKind::Mask, RgbaImage::new(8, 8)),
            LoadProgress::Pending
        );
        assert!(!ed.is_ready());
        assert_eq!(
            ed.complete_load(ticket, LayerKind::Draw, RgbaImage::new(8, 8)),
            LoadProgress::Ready
        );
        // Stored mask was fully transparent, i.e. fully masked.
        assert_eq!(ed.surface(LayerKind::Mask).unwrap().coverage(), 64);
    }

    #[test]
    fn stale_completion_is_dropped() {
        let mut ed = CanvasEditor::default();
        let old = ed.begin_load(&record(false, false));
        let new = ed.begin_load(&record(false, false));
        assert_eq!(
            ed.complete_load(old, LayerKind::Original, gradient(4, 4)),
            LoadProgress::Stale
        );
        assert!(ed.surface(LayerKind::Original).is_none());
        assert_eq!(
            ed.complete_load(new, LayerKind::Original, gradient(6, 6)),
            LoadProgress::Ready
        );
    }

    #[test]
    fn failed_mask_falls_back_to_blank() {
        let mut ed = CanvasEditor::default();
        let ticket = ed.begin_load(&record(false, true));
        ed.complete_load(ticket, LayerKind::Original, gradient(5, 5));
        assert_eq!(ed.fail_load(ticket, LayerKind::Mask), LoadProgress::Ready);
        assert_eq!(ed.surface(LayerKind::Mask).unwrap().coverage(), 0);
    }

    #[test]
    fn failed_original_empties_editor() {
        let mut ed = CanvasEditor::default();
        let ticket = ed.begin_load(&record(false, false));
        assert_eq!(ed.fail_load(ticket, LayerKind::Original), LoadProgress::Failed);
        assert!(!ed.is_ready());
        assert_eq!(ed.fail_load(ticket, LayerKind::Draw), LoadProgress::Stale);
    }

    #[test]
    fn mismatched_layer_is_resized() {
        let mut ed = CanvasEditor::default();
        let ticket = ed.begin_load(&record(true, false));
        ed.complete_load(ticket, LayerKind::Draw, RgbaImage::new(3, 3));
        ed.complete_load(ticket, LayerKind::Original, gradient(12, 9));
        let draw = ed.surface(LayerKind::Draw).unwrap();
        assert_eq!((draw.width, draw.height), (12, 9));
    }

    #[test]
    fn stroke_paints_mask_and_exports_on_release() {
        let mut ed = ready_editor(64, 64);
        ed.set_brush_size(3.0);
        assert_eq!(ed.begin_stroke(&press(10.0, 10.0, 0.0)), StrokeStart::Started);
        assert!(ed.is_drawing());
        assert!(ed.continue_stroke(&press(22.0, 10.0, 5.0)));
        ed.flush_frame();

        let mask = ed.surface(LayerKind::Mask).unwrap();
        for x in 10..=22 {
            assert_eq!(mask.pixel(x, 10).unwrap()[3], 255, "gap at x={x}");
        }
        assert_eq!(ed.surface(LayerKind::Draw).unwrap().coverage(), 0);

        let exported = ed.end_stroke().unwrap().expect("stroke was active");
        assert!(!ed.is_drawing());
        assert!(!exported.draw.is_empty() && !exported.mask.is_empty());
        assert!(ed.end_stroke().unwrap().is_none());
    }

    #[test]
    fn right_button_erases() {
        let mut ed = ready_editor(32, 32);
        ed.set_brush_size(4.0);
        ed.begin_stroke(&press(16.0, 16.0, 0.0));
        ed.end_stroke().unwrap();
        assert!(ed.surface(LayerKind::Mask).unwrap().coverage() > 0);

        let erase = PointerInput::mouse(Point::new(16.0, 16.0), 10.0)
            .with_button(PointerButton::Secondary);
        ed.set_brush_size(10.0);
        ed.begin_stroke(&erase);
        ed.end_stroke().unwrap();
        assert_eq!(ed.surface(LayerKind::Mask).unwrap().coverage(), 0);
    }

    #[test]
    fn sketch_mode_paints_draw_layer_with_picked_color() {
        let mut ed = ready_editor(32, 32);
        let ctrl = Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        };
        let pick = press(5.0, 9.0, 0.0).with_modifiers(ctrl);
        assert_eq!(ed.begin_stroke(&pick), StrokeStart::PickedColor([5, 9, 7]));
        assert!(!ed.is_drawing());
        assert_eq!(ed.brush_color(), [5, 9, 7, 128]);

        ed.set_mode(EditorMode::Sketch);
        ed.set_brush_size(2.0);
        ed.begin_stroke(&press(20.0, 20.0, 1.0));
        assert_eq!(
            ed.surface(LayerKind::Draw).unwrap().pixel(20, 20),
            Some([5, 9, 7, 255])
        );
        assert_eq!(ed.surface(LayerKind::Mask).unwrap().coverage(), 0);
    }

    #[test]
    fn other_buttons_and_hover_are_ignored() {
        let mut ed = ready_editor(16, 16);
        let hover = PointerInput::mouse(Point::new(4.0, 4.0), 0.0);
        assert_eq!(ed.begin_stroke(&hover), StrokeStart::Ignored);
        let middle = hover.with_button(PointerButton::Other);
        assert_eq!(ed.begin_stroke(&middle), StrokeStart::Ignored);
        assert!(!ed.continue_stroke(&hover));
    }

    #[test]
    fn late_touch_stamps_single_disc() {
        let mut ed = ready_editor(100, 20);
        ed.set_brush_size(1.0);
        let touch = |x: f64, t: f64| {
            PointerInput::mouse(Point::new(x, 10.0), t)
                .with_button(PointerButton::Primary)
                .with_kind(PointerKind::Touch, 1.0)
        };
        ed.begin_stroke(&touch(5.0, 0.0));
        ed.continue_stroke(&touch(80.0, 100.0));
        ed.flush_frame();
        let mask = ed.surface(LayerKind::Mask).unwrap();
        assert_eq!(mask.pixel(40, 10).unwrap()[3], 0, "no interpolation across the jump");
        assert_eq!(mask.pixel(80, 10).unwrap()[3], 255);
    }

    #[test]
    fn pen_pressure_shrinks_radius() {
        let mut ed = ready_editor(64, 64);
        ed.set_brush_size(10.0);
        let pen = press(32.0, 32.0, 0.0).with_kind(PointerKind::Pen, 0.3);
        ed.begin_stroke(&pen);
        let mask = ed.surface(LayerKind::Mask).unwrap();
        assert_eq!(mask.pixel(32, 32).unwrap()[3], 255);
        assert_eq!(mask.pixel(32 + 5, 32).unwrap()[3], 0);
    }

    #[test]
    fn wheel_adjusts_brush_within_limits() {
        let mut ed = ready_editor(200, 200);
        assert_eq!(ed.brush_size(), 100.0);
        assert_eq!(ed.handle_wheel(-1.0, Modifiers::NONE), 100.0, "capped at max");
        assert_eq!(ed.handle_wheel(1.0, Modifiers::NONE), 99.5);
        let shift = Modifiers {
            shift: true,
            ..Modifiers::NONE
        };
        assert_eq!(ed.handle_wheel(1.0, shift), 96.5);
        ed.set_brush_size(1.2);
        assert_eq!(ed.handle_wheel(1.0, Modifiers::NONE), 1.0);
    }

    #[test]
    fn wheel_step_scales_with_zoom() {
        let mut ed = CanvasEditor::default();
        ed.initialize_pan_zoom(Size::new(100.0, 100.0));
        let ticket = ed.begin_load(&record(false, false));
        ed.complete_load(ticket, LayerKind::Original, gradient(200, 200));
        assert!((ed.view().zoom - 0.5).abs() < 1e-9);
        ed.set_brush_size(50.0);
        assert_eq!(ed.handle_wheel(-1.0, Modifiers::NONE), 51.0);
        assert_eq!(ed.max_brush_size(), 200.0);
    }

    #[test]
    fn clear_layers_blanks_both() {
        let mut ed = ready_editor(16, 16);
        ed.set_brush_size(3.0);
        ed.begin_stroke(&press(8.0, 8.0, 0.0));
        ed.end_stroke().unwrap();
        ed.clear_layers().unwrap();
        assert_eq!(ed.surface(LayerKind::Mask).unwrap().coverage(), 0);
        assert_eq!(ed.surface(LayerKind::Draw).unwrap().coverage(), 0);
        assert!(CanvasEditor::default().clear_layers().is_err());
    }

    #[test]
    fn brush_cursor_follows_hover_and_scale() {
        let mut ed = ready_editor(50, 50);
        assert!(ed.brush_cursor(1.0).is_none());
        ed.set_brush_size(4.0);
        ed.hover(Point::new(3.0, 4.0));
        let cursor = ed.brush_cursor(2.0).unwrap();
        assert_eq!(cursor.center, Point::new(3.0, 4.0));
        assert_eq!(cursor.radius, 8.0);
        assert_eq!(cursor.color, DEFAULT_BRUSH_COLOR);
        ed.leave();
        assert!(ed.brush_cursor(1.0).is_none());
    }

    #[test]
    fn pan_zoom_changes_are_bounded() {
        let mut ed = ready_editor(100, 100);
        let p = ed.set_pan_zoom(2.0, Point::new(-1000.0, 0.0));
        assert!((p.width - 200.0).abs() < 1e-9);
        assert!((p.left + p.width - 10.0).abs() < 1e-9);
    }
}
