use std::sync::mpsc;

use eframe::egui;
use tracing::{error, info};

use putimage_core::{AdvanceMode, CoreError, DirectoryLabel, LayerKind, Navigation, Size};
use putimage_editor::{
    EditorError, EditorMode, FsLayerStore, LoadProgress, NodeStep, PutImageNode, StrokeDispatcher,
    Surface,
};

use crate::io_worker::{spawn_io_worker, IoRequest, IoResponse};
use crate::preferences::{AppPreferences, NodePrefs};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Side of each node's editor container, in unscaled canvas units.
pub(crate) const NODE_CANVAS_SIZE: f32 = 512.0;
pub(crate) const NODE_GAP: f32 = 32.0;
pub(crate) const MIN_HOST_SCALE: f32 = 0.5;
pub(crate) const MAX_HOST_SCALE: f32 = 10.0;

// ---------------------------------------------------------------------------
// Node view
// ---------------------------------------------------------------------------

/// GPU copies of a node's three layers.
pub(crate) struct LayerTextures {
    pub(crate) original: egui::TextureHandle,
    pub(crate) draw: egui::TextureHandle,
    pub(crate) mask: egui::TextureHandle,
    /// Editor load the original texture was built from.
    pub(crate) load_generation: u64,
    /// Editor revision the draw and mask textures were built from.
    pub(crate) revision: u64,
}

/// Which textures a frame has to re-upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TextureRefresh {
    Nothing,
    /// Same image, edited layers.
    DrawAndMask,
    /// A different image: every texture is stale.
    All,
}

impl TextureRefresh {
    /// Compare the `(load_generation, revision)` the textures were built
    /// from, if any, with the editor's current pair.
    pub(crate) fn needed(built: Option<(u64, u64)>, load_generation: u64, revision: u64) -> Self {
        match built {
            None => Self::All,
            Some((generation, _)) if generation != load_generation => Self::All,
            Some((_, built_revision)) if built_revision != revision => Self::DrawAndMask,
            Some(_) => Self::Nothing,
        }
    }
}

/// A node plus the UI state that belongs to it.
pub(crate) struct NodeView {
    pub(crate) node: PutImageNode,
    pub(crate) textures: Option<LayerTextures>,
    pub(crate) directory_buf: String,
    /// Summary of the last generation output.
    pub(crate) output: Option<String>,
}

/// Deferred UI actions, applied after the panels release their borrows.
#[derive(Debug, Clone)]
pub(crate) enum NodeAction {
    Navigate(Navigation),
    SetMode(AdvanceMode),
    SetEditorMode(EditorMode),
    EditFilename(String),
    Clear,
    SendTo(DirectoryLabel),
    /// Open this node's current image in another node.
    LoadInto(u32),
    Focus,
    Remove,
}

fn color_image(surface: &Surface) -> egui::ColorImage {
    egui::ColorImage::from_rgba_unmultiplied(
        [surface.width as usize, surface.height as usize],
        &surface.pixels,
    )
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct PutImageApp {
    pub(crate) preferences: AppPreferences,
    pub(crate) nodes: Vec<NodeView>,
    next_node_id: u32,
    pub(crate) focused: Option<u32>,
    pub(crate) dispatcher: StrokeDispatcher,
    io_tx: mpsc::Sender<IoRequest>,
    io_rx: mpsc::Receiver<IoResponse>,
    wake_ctx: egui::Context,
    /// Scale of the host canvas holding all nodes.
    pub(crate) host_scale: f32,
    pub(crate) host_pan: egui::Vec2,
    pub(crate) space_held: bool,
    pub(crate) status: String,
    /// Message shown in a blocking modal until dismissed.
    pub(crate) notice: Option<String>,
}

impl PutImageApp {
    pub fn new(ctx: &egui::Context, preferences: AppPreferences) -> std::io::Result<Self> {
        let (io_tx, io_rx) = Self::spawn_worker(ctx, &preferences)?;
        let host_scale = preferences.host_scale.clamp(MIN_HOST_SCALE, MAX_HOST_SCALE);
        let mut app = Self {
            nodes: Vec::new(),
            next_node_id: 1,
            focused: None,
            dispatcher: StrokeDispatcher::new(),
            io_tx,
            io_rx,
            wake_ctx: ctx.clone(),
            host_scale,
            host_pan: egui::Vec2::ZERO,
            space_held: false,
            status: String::new(),
            notice: None,
            preferences,
        };
        for prefs in app.preferences.nodes.clone() {
            app.add_node(prefs);
        }
        if app.nodes.is_empty() {
            app.add_node(NodePrefs::default());
        }
        Ok(app)
    }

    fn spawn_worker(
        ctx: &egui::Context,
        preferences: &AppPreferences,
    ) -> std::io::Result<(mpsc::Sender<IoRequest>, mpsc::Receiver<IoResponse>)> {
        let store = FsLayerStore::new(preferences.store_root());
        info!("Layer store rooted at {}", store.root().display());
        let ctx = ctx.clone();
        spawn_io_worker(store, move || ctx.request_repaint())
    }

    /// Point "send to" at a new root. Responses still in flight on the old
    /// worker are dropped.
    pub(crate) fn set_store_root(&mut self, root: String) {
        self.preferences.store_root = root;
        match Self::spawn_worker(&self.wake_ctx, &self.preferences) {
            Ok((tx, rx)) => {
                self.io_tx = tx;
                self.io_rx = rx;
                self.preferences.save();
            }
            Err(e) => {
                error!("Failed to restart IO worker: {e}");
                self.status = format!("Could not switch store: {e}");
            }
        }
    }

    // -- Nodes --------------------------------------------------------------

    pub(crate) fn add_node(&mut self, prefs: NodePrefs) {
        let id = self.next_node_id;
        self.next_node_id += 1;

        let mut node = PutImageNode::new(
            id,
            prefs.directory.clone(),
            self.preferences.editor.clone(),
        );
        node.navigator_mut().set_mode(prefs.mode);
        if let Ok(editor) = node.editor_mut() {
            editor.initialize_pan_zoom(Size::new(
                NODE_CANVAS_SIZE as f64,
                NODE_CANVAS_SIZE as f64,
            ));
        }
        self.nodes.push(NodeView {
            node,
            textures: None,
            directory_buf: prefs.directory,
            output: None,
        });
        self.focused.get_or_insert(id);
        info!("Added node #{id}");
        self.navigate(id, Navigation::Refresh);
    }

    pub(crate) fn remove_node(&mut self, id: u32) {
        self.nodes.retain(|v| v.node.id() != id);
        self.dispatcher.remove(id);
        if self.focused == Some(id) {
            self.focused = self.nodes.first().map(|v| v.node.id());
        }
    }

    pub(crate) fn node_ids(&self) -> Vec<u32> {
        self.nodes.iter().map(|v| v.node.id()).collect()
    }

    pub(crate) fn view(&self, id: u32) -> Option<&NodeView> {
        self.nodes.iter().find(|v| v.node.id() == id)
    }

    pub(crate) fn view_mut(&mut self, id: u32) -> Option<&mut NodeView> {
        self.nodes.iter_mut().find(|v| v.node.id() == id)
    }

    // -- Requests -----------------------------------------------------------

    fn send(&mut self, request: IoRequest) {
        if self.io_tx.send(request).is_err() {
            error!("IO worker is not running");
            self.status = "Background worker stopped; restart the app".into();
        }
    }

    fn dispatch(&mut self, node: u32, step: NodeStep) {
        match step {
            NodeStep::Idle => {}
            NodeStep::Listing { ticket, dir } => self.send(IoRequest::List { node, ticket, dir }),
            NodeStep::Layers(requests) => {
                for request in requests {
                    self.send(IoRequest::Fetch { node, request });
                }
            }
        }
    }

    /// Surface a node failure in the status line. Protected-field edits
    /// also raise the blocking notice.
    fn report(&mut self, node: u32, e: &EditorError) {
        if let EditorError::Core(CoreError::ProtectedField { field }) = e {
            self.notice = Some(format!(
                "The {field} field is display-only and cannot be edited."
            ));
        }
        self.status = format!("#{node}: {e}");
    }

    fn handle_step(&mut self, node: u32, result: putimage_editor::Result<NodeStep>) {
        match result {
            Ok(step) => self.dispatch(node, step),
            Err(e) => self.report(node, &e),
        }
    }

    pub(crate) fn navigate(&mut self, id: u32, nav: Navigation) {
        let Some(view) = self.view_mut(id) else {
            return;
        };
        let result = view.node.navigate(nav);
        self.handle_step(id, result);
    }

    /// Run one generation cycle on every node, then resolve each node's
    /// output.
    pub(crate) fn queue_generation(&mut self) {
        for id in self.node_ids() {
            let Some(view) = self.view_mut(id) else {
                continue;
            };
            let result = view.node.on_generation();
            let output = view.node.navigator().selected().cloned();
            self.handle_step(id, result);
            if let Some(record) = output {
                self.send(IoRequest::Output { node: id, record });
            }
        }
        self.status = "Queued generation".into();
    }

    pub(crate) fn end_stroke(&mut self, id: u32) {
        let Some(view) = self.view_mut(id) else {
            return;
        };
        match view.node.end_stroke() {
            Ok(Some(request)) => self.send(IoRequest::Save { node: id, request }),
            Ok(None) => {}
            Err(e) => self.report(id, &e),
        }
    }

    pub(crate) fn apply_action(&mut self, id: u32, action: NodeAction) {
        match action {
            NodeAction::Navigate(nav) => self.navigate(id, nav),
            NodeAction::SetMode(mode) => {
                if let Some(view) = self.view_mut(id) {
                    view.node.navigator_mut().set_mode(mode);
                }
            }
            NodeAction::SetEditorMode(mode) => {
                if let Some(Ok(editor)) = self.view_mut(id).map(|v| v.node.editor_mut()) {
                    editor.set_mode(mode);
                }
            }
            NodeAction::EditFilename(value) => {
                let result = match self.view_mut(id) {
                    Some(view) => view.node.edit_filename(&value),
                    None => return,
                };
                if let Err(e) = result {
                    self.report(id, &e);
                }
            }
            NodeAction::Clear => {
                let result = match self.view(id) {
                    Some(view) => view.node.request_clear(),
                    None => return,
                };
                match result {
                    Ok(original_path) => self.send(IoRequest::Clear {
                        node: id,
                        original_path,
                    }),
                    Err(e) => self.report(id, &e),
                }
            }
            NodeAction::SendTo(label) => {
                let result = match self.view(id) {
                    Some(view) => view.node.send_source(),
                    None => return,
                };
                match result {
                    Ok(path) => self.send(IoRequest::SendTo { path, label }),
                    Err(e) => self.report(id, &e),
                }
            }
            NodeAction::LoadInto(target) => {
                let source = self.view(id).and_then(|v| v.node.send_source().ok());
                if let Some(path) = source {
                    self.focused = Some(target);
                    self.navigate(target, Navigation::LoadByOriginalName(path));
                }
            }
            NodeAction::Focus => self.focused = Some(id),
            NodeAction::Remove => self.remove_node(id),
        }
    }

    // -- Responses ----------------------------------------------------------

    fn poll_io_responses(&mut self) {
        while let Ok(resp) = self.io_rx.try_recv() {
            match resp {
                IoResponse::Listing {
                    node,
                    ticket,
                    result,
                } => {
                    let Some(view) = self.view_mut(node) else {
                        continue;
                    };
                    let step = view.node.complete_listing(ticket, result);
                    view.directory_buf = view.node.navigator().directory().to_string();
                    self.handle_step(node, step);
                }
                IoResponse::Layer {
                    node,
                    ticket,
                    kind,
                    decoded,
                } => {
                    let Some(view) = self.view_mut(node) else {
                        continue;
                    };
                    let progress = view.node.complete_decoded(ticket, kind, decoded);
                    let filename = view.node.navigator().filename().to_string();
                    match progress {
                        Ok(LoadProgress::Ready) => self.status = format!("#{node}: {filename}"),
                        Ok(LoadProgress::Failed) => {
                            self.status = format!("#{node}: could not load image");
                        }
                        Ok(_) => {}
                        Err(e) => self.report(node, &e),
                    }
                }
                IoResponse::Saved {
                    node,
                    original_path,
                    result,
                } => {
                    let Some(view) = self.view_mut(node) else {
                        continue;
                    };
                    if let Err(e) = view.node.complete_save(&original_path, result) {
                        self.report(node, &e);
                    }
                }
                IoResponse::Cleared {
                    node,
                    original_path,
                    result,
                } => {
                    let Some(view) = self.view_mut(node) else {
                        continue;
                    };
                    match view.node.complete_clear(&original_path, result) {
                        Ok(()) => self.status = format!("#{node}: cleared edits"),
                        Err(e) => self.report(node, &e),
                    }
                }
                IoResponse::Sent {
                    path,
                    label,
                    result,
                } => {
                    self.status = match result {
                        Ok(()) => format!("Sent {path} to {}", label.as_str()),
                        Err(e) => format!("Send to {} failed: {e}", label.as_str()),
                    };
                }
                IoResponse::Output { node, summary } => {
                    if let Some(view) = self.view_mut(node) {
                        view.output = Some(match summary {
                            Ok(s) => s,
                            Err(e) => format!("error: {e}"),
                        });
                    }
                }
            }
        }
    }

    /// Re-upload layer textures whose editor revision moved.
    fn sync_textures(&mut self, ctx: &egui::Context) {
        for view in &mut self.nodes {
            let id = view.node.id();
            let Some(editor) = view.node.editor() else {
                continue;
            };
            if !editor.is_ready() {
                view.textures = None;
                continue;
            }
            let load_generation = editor.load_generation();
            let revision = editor.revision();
            let built = view.textures.as_ref().map(|t| (t.load_generation, t.revision));
            let refresh = TextureRefresh::needed(built, load_generation, revision);
            if refresh == TextureRefresh::Nothing {
                continue;
            }
            let (Some(original), Some(draw), Some(mask)) = (
                editor.surface(LayerKind::Original),
                editor.surface(LayerKind::Draw),
                editor.surface(LayerKind::Mask),
            ) else {
                continue;
            };

            match (&mut view.textures, refresh) {
                (Some(textures), TextureRefresh::DrawAndMask) => {
                    textures.draw.set(color_image(draw), egui::TextureOptions::LINEAR);
                    textures.mask.set(color_image(mask), egui::TextureOptions::LINEAR);
                    textures.revision = revision;
                }
                _ => {
                    let load = |name: &str, surface: &Surface| {
                        ctx.load_texture(
                            format!("node{id}_{name}"),
                            color_image(surface),
                            egui::TextureOptions::LINEAR,
                        )
                    };
                    view.textures = Some(LayerTextures {
                        original: load("original", original),
                        draw: load("draw", draw),
                        mask: load("mask", mask),
                        load_generation,
                        revision,
                    });
                }
            }
        }
    }

    /// Paint stamps queued since the last frame, one batch per node.
    fn flush_strokes(&mut self) {
        for view in &mut self.nodes {
            if let Ok(editor) = view.node.editor_mut() {
                editor.flush_frame();
            }
        }
    }

    /// Pointer releases end strokes wherever they happen.
    fn release_strokes(&mut self, ctx: &egui::Context) {
        if !ctx.input(|i| i.pointer.any_released()) {
            return;
        }
        for id in self.dispatcher.release() {
            self.end_stroke(id);
        }
    }

    fn show_notice(&mut self, ctx: &egui::Context) {
        let Some(text) = self.notice.clone() else {
            return;
        };
        let mut dismissed = false;
        let modal = egui::Modal::new(egui::Id::new("notice")).show(ctx, |ui| {
            ui.set_width(320.0);
            ui.label(text);
            ui.add_space(8.0);
            if ui.button("OK").clicked() {
                dismissed = true;
            }
        });
        if dismissed || modal.should_close() {
            self.notice = None;
        }
    }

    pub(crate) fn capture_preferences(&mut self) {
        self.preferences.nodes = self
            .nodes
            .iter()
            .map(|v| NodePrefs {
                directory: v.node.navigator().directory().to_string(),
                mode: v.node.navigator().mode(),
            })
            .collect();
        self.preferences.host_scale = self.host_scale;
    }
}

impl eframe::App for PutImageApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_io_responses();
        self.handle_keyboard(ctx);

        self.draw_menu_bar(ctx);
        self.draw_status_bar(ctx);
        self.draw_node_panel(ctx);
        self.draw_host_canvas(ctx);

        self.release_strokes(ctx);
        self.flush_strokes();
        self.sync_textures(ctx);
        self.show_notice(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.capture_preferences();
        self.preferences.save();
        info!("Saved preferences on exit");
    }
}
