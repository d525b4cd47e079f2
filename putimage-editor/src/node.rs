//! One PutImage node: a navigator and a canvas editor driven together.
//!
//! Every operation is split into a request the host performs against a
//! [`LayerStore`] (possibly on another thread) and a completion fed back
//! here. The `*_with` helpers run both halves inline.

use image::RgbaImage;
use tracing::{debug, info, warn};

use putimage_core::{
    CoreError, DirectoryLabel, EditedLayers, ImageRecord, LayerKind, LayerStore, NavOutcome,
    Navigation, Navigator, ReloadTicket, StoreError,
};

use crate::codec;
use crate::config::EditorConfig;
use crate::dispatch::StrokeDispatcher;
use crate::editor::{CanvasEditor, LoadProgress, LoadTicket, StrokeStart};
use crate::error::EditorError;
use crate::output::{resolve_output, NodeOutput};
use crate::stroke::PointerInput;

/// One raster to fetch for the current load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerRequest {
    pub ticket: LoadTicket,
    pub kind: LayerKind,
    pub path: String,
    pub cache_token: u64,
}

/// Work the host has to perform next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeStep {
    /// List `dir` and call [`PutImageNode::complete_listing`].
    Listing { ticket: ReloadTicket, dir: String },
    /// Fetch each raster and call [`PutImageNode::complete_layer`].
    Layers(Vec<LayerRequest>),
    Idle,
}

/// Encoded layers to persist after a stroke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub original_path: String,
    pub draw: Vec<u8>,
    pub mask: Vec<u8>,
}

pub struct PutImageNode {
    id: u32,
    navigator: Navigator,
    editor: Option<CanvasEditor>,
    /// Original path of the image currently loaded into the editor.
    shown: Option<String>,
    cache_token: u64,
}

impl PutImageNode {
    pub fn new(id: u32, directory: impl Into<String>, config: EditorConfig) -> Self {
        Self::from_parts(Navigator::new(id, directory), Some(CanvasEditor::new(config)))
    }

    /// Assemble a node from an existing navigator. Without an editor every
    /// operation fails with [`CoreError::Uninitialized`].
    pub fn from_parts(navigator: Navigator, editor: Option<CanvasEditor>) -> Self {
        Self {
            id: navigator.node(),
            navigator,
            editor,
            shown: None,
            cache_token: 0,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut Navigator {
        &mut self.navigator
    }

    pub fn editor(&self) -> Option<&CanvasEditor> {
        self.editor.as_ref()
    }

    pub fn editor_mut(&mut self) -> crate::Result<&mut CanvasEditor> {
        let node = self.id;
        self.editor.as_mut().ok_or_else(|| {
            CoreError::Uninitialized {
                node,
                what: "canvas editor",
            }
            .into()
        })
    }

    /// Original path of the loaded image.
    pub fn shown(&self) -> Option<&str> {
        self.shown.as_deref()
    }

    fn require_editor(&self) -> crate::Result<()> {
        match self.editor {
            Some(_) => Ok(()),
            None => Err(CoreError::Uninitialized {
                node: self.id,
                what: "canvas editor",
            }
            .into()),
        }
    }

    /// Log a failure. Blanks the editor if the failure left nothing selected.
    fn report(&mut self, e: EditorError) -> EditorError {
        match &e {
            EditorError::Core(CoreError::AlreadyLoaded { .. }) => info!("node #{}: {e}", self.id),
            _ => warn!("node #{}: {e}", self.id),
        }
        if self.navigator.selected().is_none() {
            self.shown = None;
            if let Some(editor) = self.editor.as_mut() {
                editor.clear();
            }
        }
        e
    }

    // -- Navigation ---------------------------------------------------------

    pub fn navigate(&mut self, nav: Navigation) -> crate::Result<NodeStep> {
        self.require_editor()?;
        match self.navigator.navigate(nav) {
            Ok(NavOutcome::NeedsListing { ticket, dir }) => Ok(NodeStep::Listing { ticket, dir }),
            Ok(NavOutcome::Selected) => self.load_selected(),
            Ok(NavOutcome::Unchanged) => Ok(NodeStep::Idle),
            Err(e) => Err(self.report(e.into())),
        }
    }

    pub fn complete_listing(
        &mut self,
        ticket: ReloadTicket,
        listing: Result<Vec<ImageRecord>, StoreError>,
    ) -> crate::Result<NodeStep> {
        match self.navigator.complete_listing(ticket, listing) {
            Ok(true) => self.load_selected(),
            Ok(false) => Ok(NodeStep::Idle),
            Err(e) => Err(self.report(e.into())),
        }
    }

    /// Once per generation cycle, before the cycle's work begins.
    pub fn on_generation(&mut self) -> crate::Result<NodeStep> {
        self.require_editor()?;
        if self.navigator.on_generation() {
            self.load_selected()
        } else {
            Ok(NodeStep::Idle)
        }
    }

    /// Restart the editor on the navigator's selection.
    pub fn load_selected(&mut self) -> crate::Result<NodeStep> {
        let Some(record) = self.navigator.selected().cloned() else {
            self.shown = None;
            self.editor_mut()?.clear();
            return Ok(NodeStep::Idle);
        };
        let ticket = self.editor_mut()?.begin_load(&record);
        self.cache_token += 1;
        self.shown = Some(record.original_path.clone());

        let cache_token = self.cache_token;
        let requests = LayerKind::ALL
            .iter()
            .filter_map(|&kind| {
                record.layer_path(kind).map(|path| LayerRequest {
                    ticket,
                    kind,
                    path: path.to_string(),
                    cache_token,
                })
            })
            .collect();
        Ok(NodeStep::Layers(requests))
    }

    /// Feed back fetched raster bytes.
    pub fn complete_layer(
        &mut self,
        ticket: LoadTicket,
        kind: LayerKind,
        fetched: Result<Vec<u8>, StoreError>,
    ) -> crate::Result<LoadProgress> {
        let decoded = fetched
            .map_err(EditorError::from)
            .and_then(|bytes| codec::decode_raster(&bytes));
        self.complete_decoded(ticket, kind, decoded)
    }

    /// Feed back an already decoded raster.
    pub fn complete_decoded(
        &mut self,
        ticket: LoadTicket,
        kind: LayerKind,
        decoded: crate::Result<RgbaImage>,
    ) -> crate::Result<LoadProgress> {
        let node = self.id;
        let editor = self.editor_mut()?;
        let progress = match decoded {
            Ok(image) => editor.complete_load(ticket, kind, image),
            Err(e) => {
                warn!("node #{node}: {} layer: {e}", kind.label());
                editor.fail_load(ticket, kind)
            }
        };
        if progress == LoadProgress::Failed {
            self.shown = None;
        }
        Ok(progress)
    }

    /// Reject edits of the display-only filename field.
    pub fn edit_filename(&mut self, value: &str) -> crate::Result<()> {
        self.navigator
            .edit_filename(value)
            .map_err(|e| self.report(e.into()))
    }

    // -- Strokes ------------------------------------------------------------

    /// Pointer down on this node. A started stroke is registered with
    /// `dispatcher` so the release is routed back here.
    pub fn begin_stroke(
        &mut self,
        input: &PointerInput,
        dispatcher: &mut StrokeDispatcher,
    ) -> crate::Result<StrokeStart> {
        let node = self.id;
        let start = self.editor_mut()?.begin_stroke(input);
        if start == StrokeStart::Started {
            dispatcher.begin(node);
        }
        Ok(start)
    }

    pub fn continue_stroke(&mut self, input: &PointerInput) -> crate::Result<bool> {
        Ok(self.editor_mut()?.continue_stroke(input))
    }

    /// Called by the dispatcher on pointer release. Returns the layers to
    /// save if a stroke was in progress.
    pub fn end_stroke(&mut self) -> crate::Result<Option<SaveRequest>> {
        let exported = match self.editor_mut()?.end_stroke() {
            Ok(exported) => exported,
            Err(e) => return Err(self.report(e)),
        };
        let (Some(layers), Some(original_path)) = (exported, self.shown.clone()) else {
            return Ok(None);
        };
        Ok(Some(SaveRequest {
            original_path,
            draw: layers.draw,
            mask: layers.mask,
        }))
    }

    pub fn complete_save(
        &mut self,
        original_path: &str,
        result: Result<EditedLayers, StoreError>,
    ) -> crate::Result<()> {
        match result {
            Ok(edited) => {
                if !self.navigator.apply_edit(original_path, &edited) {
                    debug!(
                        "node #{}: saved layers for {original_path:?}, no longer listed",
                        self.id
                    );
                }
                Ok(())
            }
            Err(e) => {
                self.navigator.record_error();
                Err(self.report(e.into()))
            }
        }
    }

    // -- Clear and send -----------------------------------------------------

    /// Original path whose edit layers should be deleted.
    pub fn request_clear(&self) -> crate::Result<String> {
        self.require_editor()?;
        self.shown.clone().ok_or_else(|| {
            CoreError::EmptySelection {
                dir: self.navigator.directory().to_string(),
            }
            .into()
        })
    }

    pub fn complete_clear(
        &mut self,
        original_path: &str,
        result: Result<(), StoreError>,
    ) -> crate::Result<()> {
        if let Err(e) = result {
            self.navigator.record_error();
            return Err(self.report(e.into()));
        }
        self.navigator.clear_edits(original_path);
        if self.shown.as_deref() == Some(original_path) {
            self.editor_mut()?.clear_layers()?;
        }
        Ok(())
    }

    /// Original path of the selected image, for "send to" actions.
    pub fn send_source(&self) -> crate::Result<String> {
        self.navigator
            .selected()
            .map(|r| r.original_path.clone())
            .ok_or_else(|| {
                CoreError::EmptySelection {
                    dir: self.navigator.directory().to_string(),
                }
                .into()
            })
    }

    /// What the current generation cycle receives from this node.
    pub fn output(&self) -> crate::Result<NodeOutput> {
        let record = self.navigator.selected().ok_or_else(|| CoreError::EmptySelection {
            dir: self.navigator.directory().to_string(),
        })?;
        resolve_output(record)
    }

    // -- Inline helpers -----------------------------------------------------

    /// Perform `step` and every step it leads to against `store`.
    pub fn run(
        &mut self,
        store: &dyn LayerStore,
        mut step: NodeStep,
    ) -> crate::Result<Option<LoadProgress>> {
        loop {
            step = match step {
                NodeStep::Idle => return Ok(None),
                NodeStep::Listing { ticket, dir } => {
                    let listing = store.list_images(&dir);
                    self.complete_listing(ticket, listing)?
                }
                NodeStep::Layers(requests) => {
                    let mut progress = None;
                    for req in requests {
                        let fetched = store.fetch_raster(&req.path, req.cache_token);
                        progress = Some(self.complete_layer(req.ticket, req.kind, fetched)?);
                    }
                    return Ok(progress);
                }
            };
        }
    }

    pub fn navigate_with(
        &mut self,
        store: &dyn LayerStore,
        nav: Navigation,
    ) -> crate::Result<Option<LoadProgress>> {
        let step = self.navigate(nav)?;
        self.run(store, step)
    }

    pub fn generate_with(&mut self, store: &dyn LayerStore) -> crate::Result<Option<LoadProgress>> {
        let step = self.on_generation()?;
        self.run(store, step)
    }

    /// End a stroke and persist it. Returns `true` if anything was saved.
    pub fn end_stroke_with(&mut self, store: &dyn LayerStore) -> crate::Result<bool> {
        let Some(req) = self.end_stroke()? else {
            return Ok(false);
        };
        let result = store.save_edited_layers(&req.original_path, &req.draw, &req.mask);
        self.complete_save(&req.original_path, result)?;
        Ok(true)
    }

    pub fn clear_with(&mut self, store: &dyn LayerStore) -> crate::Result<()> {
        let path = self.request_clear()?;
        let result = store.clear_edited_layers(&path);
        self.complete_clear(&path, result)
    }

    pub fn send_to_with(&mut self, store: &dyn LayerStore, label: DirectoryLabel) -> crate::Result<()> {
        let path = self.send_source()?;
        store
            .send_to_dir(&path, label)
            .map_err(|e| self.report(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use putimage_core::{Point, Size};

    use crate::stroke::PointerButton;
    use crate::surface::Surface;

    /// In-memory store with one directory.
    #[derive(Default)]
    struct MemoryStore {
        dir: String,
        records: Mutex<Vec<ImageRecord>>,
        files: Mutex<HashMap<String, Vec<u8>>>,
        fail_saves: bool,
    }

    impl MemoryStore {
        fn with_images(dir: &str, names: &[&str], size: u32) -> Self {
            let store = Self {
                dir: dir.to_string(),
                ..Self::default()
            };
            for name in names {
                let path = format!("{dir}{name}.png");
                let png = codec::encode_png(&Surface::filled(size, size, [50, 60, 70, 255])).unwrap();
                store.files.lock().unwrap().insert(path.clone(), png);
                store
                    .records
                    .lock()
                    .unwrap()
                    .push(ImageRecord::new(path, *name));
            }
            store
        }
    }

    impl LayerStore for MemoryStore {
        fn list_images(&self, dir: &str) -> Result<Vec<ImageRecord>, StoreError> {
            if dir == self.dir {
                Ok(self.records.lock().unwrap().clone())
            } else {
                Err(StoreError::InvalidPath(dir.to_string()))
            }
        }

        fn fetch_raster(&self, path: &str, _cache_token: u64) -> Result<Vec<u8>, StoreError> {
            self.files
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(path.to_string()))
        }

        fn save_edited_layers(
            &self,
            original_path: &str,
            draw: &[u8],
            mask: &[u8],
        ) -> Result<EditedLayers, StoreError> {
            if self.fail_saves {
                return Err(StoreError::Rejected("read-only".into()));
            }
            let edited = EditedLayers {
                draw_name: "d".into(),
                draw_path: format!("{original_path}.d"),
                mask_name: "m".into(),
                mask_path: format!("{original_path}.m"),
            };
            let mut files = self.files.lock().unwrap();
            files.insert(edited.draw_path.clone(), draw.to_vec());
            files.insert(edited.mask_path.clone(), mask.to_vec());
            drop(files);
            for rec in self.records.lock().unwrap().iter_mut() {
                if rec.original_path == original_path {
                    rec.apply_edit(&edited);
                }
            }
            Ok(edited)
        }

        fn clear_edited_layers(&self, original_path: &str) -> Result<(), StoreError> {
            for rec in self.records.lock().unwrap().iter_mut() {
                if rec.original_path == original_path {
                    rec.clear_edits();
                }
            }
            Ok(())
        }

        fn send_to_dir(&self, _path: &str, _label: DirectoryLabel) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn loaded_node(store: &MemoryStore) -> PutImageNode {
        let mut node = PutImageNode::new(1, "", EditorConfig::default());
        node.editor_mut()
            .unwrap()
            .initialize_pan_zoom(Size::new(32.0, 32.0));
        let progress = node
            .navigate_with(store, Navigation::SetDirectory(store.dir.clone()))
            .unwrap();
        assert_eq!(progress, Some(LoadProgress::Ready));
        node
    }

    fn paint(node: &mut PutImageNode, dispatcher: &mut StrokeDispatcher) {
        node.editor_mut().unwrap().set_brush_size(3.0);
        let down = PointerInput::mouse(Point::new(8.0, 8.0), 0.0).with_button(PointerButton::Primary);
        assert_eq!(node.begin_stroke(&down, dispatcher).unwrap(), StrokeStart::Started);
    }

    #[test]
    fn missing_editor_is_uninitialized() {
        let mut node = PutImageNode::from_parts(Navigator::new(4, "x/"), None);
        let err = node.navigate(Navigation::Reload).unwrap_err();
        assert!(matches!(
            err,
            EditorError::Core(CoreError::Uninitialized { node: 4, .. })
        ));
        assert!(node.request_clear().is_err());
        assert_eq!(node.navigator().directory(), "x/");
    }

    #[test]
    fn directory_change_loads_first_image() {
        let store = MemoryStore::with_images("mem/", &["a", "b"], 32);
        let node = loaded_node(&store);
        assert_eq!(node.navigator().filename(), "a");
        assert_eq!(node.shown(), Some("mem/a.png"));
        let editor = node.editor().unwrap();
        assert!(editor.is_ready());
        assert_eq!(editor.surface(LayerKind::Mask).unwrap().width, 32);
    }

    #[test]
    fn stroke_saves_on_release_and_updates_record() {
        let store = MemoryStore::with_images("mem/", &["a"], 32);
        let mut node = loaded_node(&store);
        let mut dispatcher = StrokeDispatcher::new();
        paint(&mut node, &mut dispatcher);

        let mut saved = 0;
        for id in dispatcher.release() {
            assert_eq!(id, node.id());
            if node.end_stroke_with(&store).unwrap() {
                saved += 1;
            }
        }
        assert_eq!(saved, 1);
        let rec = node.navigator().selected().unwrap();
        assert_eq!(rec.mask_path.as_deref(), Some("mem/a.png.m"));

        // The saved mask comes back through a reload.
        let progress = node.navigate_with(&store, Navigation::Reload).unwrap();
        assert_eq!(progress, Some(LoadProgress::Ready));
        assert!(node.editor().unwrap().surface(LayerKind::Mask).unwrap().coverage() > 0);
    }

    #[test]
    fn failed_save_counts_error_and_keeps_record() {
        let mut store = MemoryStore::with_images("mem/", &["a"], 16);
        store.fail_saves = true;
        let mut node = loaded_node(&store);
        let mut dispatcher = StrokeDispatcher::new();
        paint(&mut node, &mut dispatcher);
        assert!(node.end_stroke_with(&store).is_err());
        assert_eq!(node.navigator().counters().errors, 1);
        assert!(!node.navigator().selected().unwrap().has_edits());
        assert!(node.editor().unwrap().is_ready());
    }

    #[test]
    fn clear_blanks_layers_and_record() {
        let store = MemoryStore::with_images("mem/", &["a"], 16);
        let mut node = loaded_node(&store);
        let mut dispatcher = StrokeDispatcher::new();
        paint(&mut node, &mut dispatcher);
        node.end_stroke_with(&store).unwrap();

        node.clear_with(&store).unwrap();
        assert!(!node.navigator().selected().unwrap().has_edits());
        assert_eq!(node.editor().unwrap().surface(LayerKind::Mask).unwrap().coverage(), 0);
    }

    #[test]
    fn stale_layer_from_previous_image_is_dropped() {
        let store = MemoryStore::with_images("mem/", &["a", "b"], 8);
        let mut node = loaded_node(&store);

        let NodeStep::Layers(first) = node.navigate(Navigation::Step(1)).unwrap() else {
            panic!("expected layer requests");
        };
        let NodeStep::Layers(second) = node.navigate(Navigation::Step(1)).unwrap() else {
            panic!("expected layer requests");
        };
        let old = &first[0];
        let fetched = store.fetch_raster(&old.path, old.cache_token);
        assert_eq!(
            node.complete_layer(old.ticket, old.kind, fetched).unwrap(),
            LoadProgress::Stale
        );
        let new = &second[0];
        let fetched = store.fetch_raster(&new.path, new.cache_token);
        assert_eq!(
            node.complete_layer(new.ticket, new.kind, fetched).unwrap(),
            LoadProgress::Ready
        );
        assert_eq!(node.shown(), Some("mem/a.png"));
        assert!(second[0].cache_token > first[0].cache_token);
    }

    #[test]
    fn listing_failure_blanks_editor() {
        let store = MemoryStore::with_images("mem/", &["a"], 8);
        let mut node = loaded_node(&store);
        let err = node
            .navigate_with(&store, Navigation::SetDirectory("elsewhere/".into()))
            .unwrap_err();
        assert!(matches!(err, EditorError::Core(CoreError::Store(_))));
        assert!(!node.editor().unwrap().is_ready());
        assert_eq!(node.shown(), None);
        assert_eq!(node.navigator().counters().errors, 1);
    }

    #[test]
    fn filename_edits_are_rejected() {
        let store = MemoryStore::with_images("mem/", &["a"], 8);
        let mut node = loaded_node(&store);
        assert!(node.edit_filename("a").is_ok());
        assert!(matches!(
            node.edit_filename("renamed"),
            Err(EditorError::Core(CoreError::ProtectedField { .. }))
        ));
        assert_eq!(node.navigator().filename(), "a");
    }
}
