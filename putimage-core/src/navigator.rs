use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::error::{CoreError, StoreError};
use crate::index::wrap_index;
use crate::mode::AdvanceMode;
use crate::path::{same_directory, split_image_path};
use crate::record::{EditedLayers, ImageRecord};
use crate::store::LayerStore;

/// Placeholder shown in the filename field when a directory has no images.
pub const NO_IMAGE: &str = "NO IMAGE";

// ---------------------------------------------------------------------------
// Counters
// ---------------------------------------------------------------------------

/// Per-session counters driving the advancement policy.
///
/// Reset by every user-initiated navigation, but not by automatic advances
/// during a generation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub queues: u32,
    pub loops: u32,
    pub errors: u32,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// A navigation-triggering action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Move the selection by a signed offset (arrow keys).
    Step(i64),
    /// Explicit edit of the index field.
    SetIndex(i64),
    /// Force a fresh listing of the current directory.
    Reload,
    /// Edit of the directory field. No-op when unchanged.
    SetDirectory(String),
    /// Point the navigator at an arbitrary image path.
    LoadByOriginalName(String),
    /// First load after the node is created or the graph is restored.
    Refresh,
}

/// What the host has to do next after [`Navigator::navigate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavOutcome {
    /// A directory listing is required. Fetch it for `dir` and hand the
    /// result to [`Navigator::complete_listing`] together with `ticket`.
    NeedsListing { ticket: ReloadTicket, dir: String },
    /// The selection was (re)applied; the host should re-render layers.
    Selected,
    /// Nothing changed.
    Unchanged,
}

/// Identifies one in-flight directory listing.
///
/// Only the most recently issued ticket is honored; completions carrying an
/// older one are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadTicket {
    generation: u64,
}

impl ReloadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Index resolution to run once a pending listing lands.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AfterListing {
    /// Re-wrap the current index against the new list.
    Rewrap,
    /// Jump to a concrete index.
    Index(i64),
    /// Jump to the image with this original name, or the first one.
    Find(String),
}

// ---------------------------------------------------------------------------
// Navigator
// ---------------------------------------------------------------------------

/// Tracks the images of one directory and which of them is selected.
pub struct Navigator {
    node: u32,
    directory: String,
    /// Value of the index field. Stored wrapped whenever the list is non-empty.
    index: i64,
    mode: AdvanceMode,
    images: Vec<ImageRecord>,
    selected: Option<usize>,
    filename: String,
    counters: Counters,
    generation: u64,
    pending: Option<(ReloadTicket, AfterListing)>,
    rng: StdRng,
}

impl Navigator {
    pub fn new(node: u32, directory: impl Into<String>) -> Self {
        Self::with_rng(node, directory, StdRng::from_os_rng())
    }

    /// Construct with an explicit random source (deterministic in tests).
    pub fn with_rng(node: u32, directory: impl Into<String>, rng: StdRng) -> Self {
        Self {
            node,
            directory: directory.into(),
            index: 0,
            mode: AdvanceMode::default(),
            images: Vec::new(),
            selected: None,
            filename: String::new(),
            counters: Counters::default(),
            generation: 0,
            pending: None,
            rng,
        }
    }

    pub fn seeded(node: u32, directory: impl Into<String>, seed: u64) -> Self {
        Self::with_rng(node, directory, StdRng::seed_from_u64(seed))
    }

    // -- Accessors ----------------------------------------------------------

    pub fn node(&self) -> u32 {
        self.node
    }

    pub fn directory(&self) -> &str {
        &self.directory
    }

    /// Raw value of the index field.
    pub fn index(&self) -> i64 {
        self.index
    }

    /// The index field wrapped into the current list, if any.
    pub fn current_index(&self) -> Option<usize> {
        wrap_index(self.index, self.images.len())
    }

    pub fn mode(&self) -> AdvanceMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: AdvanceMode) {
        self.mode = mode;
    }

    pub fn images(&self) -> &[ImageRecord] {
        &self.images
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    /// Display-only filename field.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected(&self) -> Option<&ImageRecord> {
        self.selected.and_then(|i| self.images.get(i))
    }

    pub fn is_reloading(&self) -> bool {
        self.pending.is_some()
    }

    // -- Index arithmetic ---------------------------------------------------

    /// Compute and store the next index.
    ///
    /// A concrete `requested` value is wrapped as-is. Without one, the
    /// advancement mode is applied to the current index. Returns the stored
    /// index, or `None` while the list is empty.
    pub fn resolve_index(&mut self, requested: Option<i64>) -> Option<usize> {
        let len = self.images.len();
        let next = match requested {
            Some(i) => i,
            None => {
                let current = self.current_index().map_or(self.index, |i| i as i64);
                match self.mode {
                    AdvanceMode::Increment => current.saturating_add(1),
                    AdvanceMode::Decrement => current.saturating_sub(1),
                    AdvanceMode::Randomize if len > 0 => self.rng.random_range(0..len) as i64,
                    _ => current,
                }
            }
        };
        match wrap_index(next, len) {
            Some(wrapped) => {
                self.index = wrapped as i64;
                Some(wrapped)
            }
            None => {
                self.index = 0;
                None
            }
        }
    }

    /// Count one generation trigger.
    ///
    /// Bumps the loop counter when the pre-advance index already sits on
    /// the last (increment) or first (decrement) element. Does not move the
    /// index itself.
    pub fn advance(&mut self) {
        self.counters.queues += 1;
        let Some(current) = self.current_index() else {
            return;
        };
        let last = self.images.len() - 1;
        let wrapped = match self.mode {
            AdvanceMode::Increment => current >= last,
            AdvanceMode::Decrement => current == 0,
            _ => false,
        };
        if wrapped {
            self.counters.loops += 1;
            debug!("node #{}: completed pass {}", self.node, self.counters.loops);
        }
    }

    pub fn reset_counters(&mut self) {
        self.counters = Counters::default();
    }

    pub fn record_error(&mut self) {
        self.counters.errors += 1;
    }

    /// Point the selection at the index field's image and refresh the
    /// filename field. An empty list shows [`NO_IMAGE`].
    pub fn select(&mut self) -> crate::Result<&ImageRecord> {
        match self.current_index() {
            Some(i) => {
                self.selected = Some(i);
                self.filename = self.images[i].original_name.clone();
                Ok(&self.images[i])
            }
            None => {
                self.selected = None;
                self.filename = NO_IMAGE.to_string();
                Err(CoreError::EmptySelection {
                    dir: self.directory.clone(),
                })
            }
        }
    }

    /// Called once per external generation cycle before its work begins.
    ///
    /// The first cycle after a reset only counts. Later cycles count, then
    /// move according to the mode. Returns `true` when the selection moved
    /// and the layers need reloading.
    pub fn on_generation(&mut self) -> bool {
        if self.counters.queues == 0 {
            self.advance();
            return false;
        }
        let before = self.current_index();
        self.advance();
        self.resolve_index(None);
        if self.current_index() == before {
            return false;
        }
        let node = self.node;
        if let Err(e) = self.select() {
            warn!("node #{node}: {e}");
        }
        true
    }

    // -- Navigation ---------------------------------------------------------

    /// Start a navigation. Listing-free requests complete immediately;
    /// others return [`NavOutcome::NeedsListing`].
    ///
    /// Requests are not queued: issuing a new listing while one is in flight
    /// supersedes it and the older completion is dropped on arrival.
    pub fn navigate(&mut self, nav: Navigation) -> crate::Result<NavOutcome> {
        let after = match nav {
            Navigation::Step(delta) => {
                self.reset_counters();
                self.resolve_index(Some(self.index.saturating_add(delta)));
                self.select()?;
                return Ok(NavOutcome::Selected);
            }
            Navigation::SetIndex(i) => {
                self.reset_counters();
                self.resolve_index(Some(i));
                self.select()?;
                return Ok(NavOutcome::Selected);
            }
            Navigation::Reload => AfterListing::Rewrap,
            Navigation::Refresh => AfterListing::Rewrap,
            Navigation::SetDirectory(dir) => {
                if dir == self.directory {
                    return Ok(NavOutcome::Unchanged);
                }
                self.directory = dir;
                AfterListing::Index(0)
            }
            Navigation::LoadByOriginalName(raw) => {
                let Some(target) = split_image_path(&raw) else {
                    return Ok(NavOutcome::Unchanged);
                };
                if same_directory(&target.dir, &self.directory)
                    && target.filename == self.filename
                {
                    return Err(CoreError::AlreadyLoaded {
                        dir: target.dir,
                        filename: target.filename,
                    });
                }
                self.directory = target.dir;
                AfterListing::Find(target.filename)
            }
        };

        self.reset_counters();
        self.images.clear();
        self.selected = None;
        self.generation += 1;
        let ticket = ReloadTicket {
            generation: self.generation,
        };

        if self.directory.trim().is_empty() {
            self.pending = None;
            self.apply_after_listing(after);
            self.select()?;
            return Ok(NavOutcome::Selected);
        }

        self.pending = Some((ticket, after));
        debug!(
            "node #{}: listing {:?} (generation {})",
            self.node, self.directory, ticket.generation
        );
        Ok(NavOutcome::NeedsListing {
            ticket,
            dir: self.directory.clone(),
        })
    }

    /// Apply a listing fetched for `ticket`.
    ///
    /// Returns `Ok(false)` for a superseded ticket. On a store failure the
    /// list stays empty and the error is returned.
    pub fn complete_listing(
        &mut self,
        ticket: ReloadTicket,
        listing: Result<Vec<ImageRecord>, StoreError>,
    ) -> crate::Result<bool> {
        let after = match self.pending.take() {
            Some((pending, after)) if pending == ticket => after,
            other => {
                self.pending = other;
                debug!(
                    "node #{}: dropping stale listing (generation {})",
                    self.node, ticket.generation
                );
                return Ok(false);
            }
        };

        match listing {
            Ok(images) => {
                info!(
                    "node #{}: {} images in {:?}",
                    self.node,
                    images.len(),
                    self.directory
                );
                self.images = images;
            }
            Err(e) => {
                self.record_error();
                self.filename = NO_IMAGE.to_string();
                return Err(e.into());
            }
        }

        self.apply_after_listing(after);
        self.select()?;
        Ok(true)
    }

    fn apply_after_listing(&mut self, after: AfterListing) {
        match after {
            AfterListing::Rewrap => {
                self.resolve_index(Some(self.index));
            }
            AfterListing::Index(i) => {
                self.resolve_index(Some(i));
            }
            AfterListing::Find(name) => {
                let found = self
                    .images
                    .iter()
                    .position(|r| r.original_name == name)
                    .unwrap_or(0);
                self.resolve_index(Some(found as i64));
            }
        }
    }

    /// Run a navigation to completion against `store`, fetching any
    /// listing inline.
    pub fn navigate_with(
        &mut self,
        store: &dyn LayerStore,
        nav: Navigation,
    ) -> crate::Result<NavOutcome> {
        match self.navigate(nav)? {
            NavOutcome::NeedsListing { ticket, dir } => {
                let listing = store.list_images(&dir);
                self.complete_listing(ticket, listing)?;
                Ok(NavOutcome::Selected)
            }
            other => Ok(other),
        }
    }

    /// Change directory and reload. Returns `false` when the path is
    /// unchanged (no reload happens).
    pub fn set_directory(&mut self, store: &dyn LayerStore, dir: &str) -> crate::Result<bool> {
        let outcome = self.navigate_with(store, Navigation::SetDirectory(dir.to_string()))?;
        Ok(outcome != NavOutcome::Unchanged)
    }

    /// Re-list the current directory.
    pub fn reload(&mut self, store: &dyn LayerStore) -> crate::Result<()> {
        self.navigate_with(store, Navigation::Reload).map(|_| ())
    }

    /// Navigate to the image at `raw_path`, falling back to the first image
    /// of its directory when no name matches.
    pub fn load_by_original_name(
        &mut self,
        store: &dyn LayerStore,
        raw_path: &str,
    ) -> crate::Result<NavOutcome> {
        self.navigate_with(store, Navigation::LoadByOriginalName(raw_path.to_string()))
    }

    // -- Record updates -----------------------------------------------------

    /// Store new layer locations on the record for `original_path`.
    pub fn apply_edit(&mut self, original_path: &str, edited: &EditedLayers) -> bool {
        match self.record_mut(original_path) {
            Some(rec) => {
                rec.apply_edit(edited);
                true
            }
            None => false,
        }
    }

    /// Forget the edit layers on the record for `original_path`.
    pub fn clear_edits(&mut self, original_path: &str) -> bool {
        match self.record_mut(original_path) {
            Some(rec) => {
                rec.clear_edits();
                true
            }
            None => false,
        }
    }

    fn record_mut(&mut self, original_path: &str) -> Option<&mut ImageRecord> {
        self.images
            .iter_mut()
            .find(|r| r.original_path == original_path)
    }

    /// Reject edits of the display-only filename field.
    pub fn edit_filename(&self, value: &str) -> crate::Result<()> {
        if value == self.filename {
            Ok(())
        } else {
            Err(CoreError::ProtectedField { field: "filename" })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DirectoryLabel;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory store: every directory lists `count` images named `img{i}`.
    struct FakeStore {
        count: usize,
        listings: AtomicUsize,
    }

    impl FakeStore {
        fn new(count: usize) -> Self {
            Self {
                count,
                listings: AtomicUsize::new(0),
            }
        }

        fn listings(&self) -> usize {
            self.listings.load(Ordering::SeqCst)
        }
    }

    impl LayerStore for FakeStore {
        fn list_images(&self, dir: &str) -> Result<Vec<ImageRecord>, StoreError> {
            self.listings.fetch_add(1, Ordering::SeqCst);
            Ok((0..self.count)
                .map(|i| ImageRecord::new(format!("{dir}img{i}.png"), format!("img{i}")))
                .collect())
        }

        fn fetch_raster(&self, path: &str, _: u64) -> Result<Vec<u8>, StoreError> {
            Err(StoreError::NotFound(path.to_string()))
        }

        fn save_edited_layers(&self, p: &str, _: &[u8], _: &[u8]) -> Result<EditedLayers, StoreError> {
            Err(StoreError::Rejected(p.to_string()))
        }

        fn clear_edited_layers(&self, _: &str) -> Result<(), StoreError> {
            Ok(())
        }

        fn send_to_dir(&self, _: &str, _: DirectoryLabel) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn loaded(count: usize) -> (Navigator, FakeStore) {
        let store = FakeStore::new(count);
        let mut nav = Navigator::seeded(1, "", 42);
        nav.set_directory(&store, "dir/").unwrap();
        (nav, store)
    }

    #[test]
    fn resolve_wraps_requested_index() {
        let (mut nav, _) = loaded(5);
        assert_eq!(nav.resolve_index(Some(-1)), Some(4));
        assert_eq!(nav.index(), 4);
        assert_eq!(nav.resolve_index(Some(7)), Some(2));
        assert_eq!(nav.resolve_index(Some(3)), Some(3));
    }

    #[test]
    fn resolve_applies_mode() {
        let (mut nav, _) = loaded(3);
        nav.set_mode(AdvanceMode::Increment);
        assert_eq!(nav.resolve_index(None), Some(1));
        assert_eq!(nav.resolve_index(None), Some(2));
        assert_eq!(nav.resolve_index(None), Some(0));

        nav.set_mode(AdvanceMode::Decrement);
        assert_eq!(nav.resolve_index(None), Some(2));

        nav.set_mode(AdvanceMode::Fixed);
        assert_eq!(nav.resolve_index(None), Some(2));
    }

    #[test]
    fn randomize_stays_in_range() {
        let (mut nav, _) = loaded(4);
        nav.set_mode(AdvanceMode::Randomize);
        for _ in 0..100 {
            let i = nav.resolve_index(None).unwrap();
            assert!(i < 4);
        }
    }

    #[test]
    fn resolve_on_empty_list_has_no_selection() {
        let mut nav = Navigator::seeded(1, "", 0);
        assert_eq!(nav.resolve_index(Some(3)), None);
        assert!(matches!(nav.select(), Err(CoreError::EmptySelection { .. })));
        assert_eq!(nav.filename(), NO_IMAGE);
    }

    #[test]
    fn advance_counts_loop_only_at_last_element() {
        let (mut nav, _) = loaded(5);
        nav.set_mode(AdvanceMode::Increment);
        for start in 0..4 {
            nav.reset_counters();
            nav.resolve_index(Some(start));
            nav.advance();
            assert_eq!(nav.counters().loops, 0, "start {start}");
            assert_eq!(nav.counters().queues, 1);
            assert_eq!(nav.index(), start, "advance must not move the index");
        }
        nav.reset_counters();
        nav.resolve_index(Some(4));
        nav.advance();
        assert_eq!(nav.counters().loops, 1);
    }

    #[test]
    fn advance_decrement_loops_at_first_element() {
        let (mut nav, _) = loaded(3);
        nav.set_mode(AdvanceMode::Decrement);
        nav.resolve_index(Some(0));
        nav.advance();
        assert_eq!(nav.counters().loops, 1);
        nav.resolve_index(Some(1));
        nav.advance();
        assert_eq!(nav.counters().loops, 1);
    }

    #[test]
    fn set_directory_twice_lists_once() {
        let store = FakeStore::new(2);
        let mut nav = Navigator::seeded(1, "", 1);
        assert!(nav.set_directory(&store, "a/").unwrap());
        assert!(!nav.set_directory(&store, "a/").unwrap());
        assert_eq!(store.listings(), 1);

        nav.resolve_index(Some(1));
        assert!(nav.set_directory(&store, "b/").unwrap());
        assert_eq!(store.listings(), 2);
        assert_eq!(nav.index(), 0);
        assert_eq!(nav.filename(), "img0");
    }

    #[test]
    fn load_by_original_name_finds_match() {
        let (mut nav, store) = loaded(4);
        nav.load_by_original_name(&store, "other\\img2.png").unwrap();
        assert_eq!(nav.directory(), "other/");
        assert_eq!(nav.index(), 2);
        assert_eq!(nav.filename(), "img2");
        assert_eq!(nav.selected().unwrap().original_path, "other/img2.png");
    }

    #[test]
    fn load_by_original_name_falls_back_to_first() {
        let (mut nav, store) = loaded(4);
        nav.resolve_index(Some(3));
        nav.load_by_original_name(&store, "x/missing.png").unwrap();
        assert_eq!(nav.index(), 0);
    }

    #[test]
    fn load_by_original_name_rejects_current_image() {
        let (mut nav, store) = loaded(3);
        let before = store.listings();
        let err = nav.load_by_original_name(&store, "dir/img0.png").unwrap_err();
        assert!(matches!(err, CoreError::AlreadyLoaded { .. }));
        assert_eq!(store.listings(), before);
    }

    #[test]
    fn stale_listing_is_dropped() {
        let mut nav = Navigator::seeded(1, "a/", 0);
        let NavOutcome::NeedsListing { ticket: first, .. } = nav.navigate(Navigation::Reload).unwrap()
        else {
            panic!("expected listing");
        };
        let NavOutcome::NeedsListing { ticket: second, .. } =
            nav.navigate(Navigation::SetDirectory("b/".into())).unwrap()
        else {
            panic!("expected listing");
        };

        let newer = vec![ImageRecord::new("b/new.png", "new")];
        assert!(nav.complete_listing(second, Ok(newer)).unwrap());
        let older = vec![ImageRecord::new("a/old.png", "old")];
        assert!(!nav.complete_listing(first, Ok(older)).unwrap());

        assert_eq!(nav.filename(), "new");
        assert_eq!(nav.images().len(), 1);
    }

    #[test]
    fn failed_listing_leaves_empty_list() {
        let mut nav = Navigator::seeded(1, "a/", 0);
        let NavOutcome::NeedsListing { ticket, .. } = nav.navigate(Navigation::Reload).unwrap() else {
            panic!("expected listing");
        };
        let err = nav
            .complete_listing(ticket, Err(StoreError::InvalidPath("a/".into())))
            .unwrap_err();
        assert!(matches!(err, CoreError::Store(_)));
        assert!(nav.images().is_empty());
        assert_eq!(nav.counters().errors, 1);
        assert!(!nav.is_reloading());
    }

    #[test]
    fn extreme_index_on_empty_list_does_not_overflow() {
        let mut nav = Navigator::seeded(1, "", 0);
        assert!(nav.navigate(Navigation::SetIndex(i64::MAX)).is_err());
        assert!(nav.navigate(Navigation::Step(1)).is_err());
        assert_eq!(nav.index(), 0);

        nav.set_mode(AdvanceMode::Increment);
        nav.advance();
        assert!(!nav.on_generation());
        nav.set_mode(AdvanceMode::Decrement);
        assert_eq!(nav.resolve_index(Some(i64::MIN)), None);
        assert_eq!(nav.resolve_index(None), None);
    }

    #[test]
    fn extreme_step_saturates_then_wraps() {
        let (mut nav, _) = loaded(3);
        nav.navigate(Navigation::SetIndex(2)).unwrap();
        nav.navigate(Navigation::Step(i64::MAX)).unwrap();
        assert_eq!(nav.index(), i64::MAX % 3);
    }

    #[test]
    fn refresh_of_fresh_node_shows_placeholder() {
        let mut nav = Navigator::seeded(1, "", 0);
        assert_eq!(nav.filename(), "");
        let err = nav.navigate(Navigation::Refresh).unwrap_err();
        assert!(matches!(err, CoreError::EmptySelection { .. }));
        assert_eq!(nav.filename(), NO_IMAGE);
    }

    #[test]
    fn refresh_lists_the_restored_directory() {
        let store = FakeStore::new(2);
        let mut nav = Navigator::seeded(1, "dir/", 0);
        nav.navigate_with(&store, Navigation::Refresh).unwrap();
        assert_eq!(nav.images().len(), 2);
        assert_eq!(nav.filename(), "img0");
    }

    #[test]
    fn blank_directory_needs_no_listing() {
        let mut nav = Navigator::seeded(1, "a/", 0);
        let err = nav.navigate(Navigation::SetDirectory("  ".into())).unwrap_err();
        assert!(matches!(err, CoreError::EmptySelection { .. }));
        assert!(!nav.is_reloading());
    }

    #[test]
    fn step_resets_counters_and_wraps() {
        let (mut nav, _) = loaded(3);
        nav.advance();
        nav.navigate(Navigation::Step(-1)).unwrap();
        assert_eq!(nav.index(), 2);
        assert_eq!(nav.counters(), Counters::default());
        assert_eq!(nav.filename(), "img2");
    }

    #[test]
    fn generation_cycle_counts_then_moves() {
        let (mut nav, _) = loaded(3);
        nav.set_mode(AdvanceMode::Increment);

        assert!(!nav.on_generation());
        assert_eq!(nav.index(), 0);

        assert!(nav.on_generation());
        assert_eq!(nav.index(), 1);
        assert!(nav.on_generation());
        assert_eq!(nav.index(), 2);
        assert_eq!(nav.counters().loops, 0);

        assert!(nav.on_generation());
        assert_eq!(nav.index(), 0);
        assert_eq!(nav.counters().loops, 1);
        assert_eq!(nav.counters().queues, 4);
        assert_eq!(nav.filename(), "img0");
    }

    #[test]
    fn fixed_mode_generation_never_moves() {
        let (mut nav, _) = loaded(3);
        nav.resolve_index(Some(1));
        for _ in 0..5 {
            assert!(!nav.on_generation());
        }
        assert_eq!(nav.index(), 1);
    }

    #[test]
    fn edits_update_matching_record() {
        let (mut nav, _) = loaded(2);
        let edited = EditedLayers {
            draw_name: ".img1_d".into(),
            draw_path: "dir/.img1_d.png".into(),
            mask_name: ".img1_m".into(),
            mask_path: "dir/.img1_m.png".into(),
        };
        assert!(nav.apply_edit("dir/img1.png", &edited));
        assert!(!nav.apply_edit("dir/nope.png", &edited));
        assert!(nav.images()[1].has_edits());
        assert!(nav.clear_edits("dir/img1.png"));
        assert!(!nav.images()[1].has_edits());
    }

    #[test]
    fn filename_is_protected() {
        let (nav, _) = loaded(2);
        assert!(nav.edit_filename("img0").is_ok());
        assert!(matches!(
            nav.edit_filename("renamed"),
            Err(CoreError::ProtectedField { .. })
        ));
        assert_eq!(nav.filename(), "img0");
    }
}
