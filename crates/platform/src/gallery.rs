//! Gallery interaction: the scrolling strip of items, the details text, and
//! routing item clicks to the asset store and the viewer region.

use std::sync::Arc;

use asset::{AssetStore, Ensure, LoadError, Model};
use renderer::{Placeholder, SessionId, ViewerRegion};
use serde::Deserialize;

/// Pixels moved by one press of a strip button.
pub const SCROLL_STEP: f32 = 250.0;

/// Exponential approach rate of the strip animation, per second.
const SCROLL_RATE: f32 = 12.0;

/// Descriptor attached to one gallery entry. Either field may be missing.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct GalleryItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl GalleryItem {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            description: Some(description.into()),
        }
    }

    /// Label for the strip; items without a title still get a button.
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }
}

/// Text shown next to the viewer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Details {
    pub title: String,
    pub description: String,
}

/// Horizontal offset of the strip, animated towards a target.
#[derive(Clone, Debug)]
pub struct ScrollStrip {
    offset: f32,
    target: f32,
    max_offset: f32,
    step: f32,
}

impl ScrollStrip {
    pub fn new(step: f32) -> Self {
        Self {
            offset: 0.0,
            target: 0.0,
            max_offset: 0.0,
            step,
        }
    }

    #[inline]
    pub fn offset(&self) -> f32 {
        self.offset
    }

    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_animating(&self) -> bool {
        self.offset != self.target
    }

    pub fn scroll_by(&mut self, delta: f32) {
        self.target = (self.target + delta).clamp(0.0, self.max_offset);
    }

    pub fn scroll_left(&mut self) {
        self.scroll_by(-self.step);
    }

    pub fn scroll_right(&mut self) {
        self.scroll_by(self.step);
    }

    /// Content and viewport widths from the last layout.
    pub fn set_extent(&mut self, content_width: f32, viewport_width: f32) {
        self.max_offset = (content_width - viewport_width).max(0.0);
        self.target = self.target.clamp(0.0, self.max_offset);
        self.offset = self.offset.clamp(0.0, self.max_offset);
    }

    /// Adopt an offset the user produced directly (dragging the strip),
    /// unless a button animation is in flight.
    pub fn sync_from_user(&mut self, offset: f32) {
        if !self.is_animating() {
            let offset = offset.clamp(0.0, self.max_offset);
            self.offset = offset;
            self.target = offset;
        }
    }

    /// Step the animation by `dt` seconds and return the new offset.
    pub fn advance(&mut self, dt: f32) -> f32 {
        if self.is_animating() {
            let t = 1.0 - (-SCROLL_RATE * dt.max(0.0)).exp();
            self.offset += (self.target - self.offset) * t;
            if (self.target - self.offset).abs() < 0.5 {
                self.offset = self.target;
            }
        }
        self.offset
    }
}

/// What an interaction led to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activation {
    /// The cached model is now showing in a new session.
    Presented(SessionId),
    /// A fetch started; the loading message is showing.
    Loading,
    /// A fetch is already running; nothing changed in the viewer.
    Ignored,
    /// The fetch failed; the error message is showing.
    Failed,
}

pub struct GalleryController {
    items: Vec<GalleryItem>,
    selected: Option<usize>,
    details: Details,
    strip: ScrollStrip,
    store: AssetStore,
    region: ViewerRegion,
}

impl GalleryController {
    pub fn new(items: Vec<GalleryItem>, store: AssetStore, region: ViewerRegion) -> Self {
        Self {
            items,
            selected: None,
            details: Details::default(),
            strip: ScrollStrip::new(SCROLL_STEP),
            store,
            region,
        }
    }

    pub fn items(&self) -> &[GalleryItem] {
        &self.items
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub fn strip(&self) -> &ScrollStrip {
        &self.strip
    }

    pub fn strip_mut(&mut self) -> &mut ScrollStrip {
        &mut self.strip
    }

    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    pub fn region(&self) -> &ViewerRegion {
        &self.region
    }

    pub fn region_mut(&mut self) -> &mut ViewerRegion {
        &mut self.region
    }

    pub fn scroll_left(&mut self) {
        self.strip.scroll_left();
    }

    pub fn scroll_right(&mut self) {
        self.strip.scroll_right();
    }

    /// Something on screen is still moving.
    pub fn needs_redraw(&self) -> bool {
        self.region.is_animating() || self.strip.is_animating()
    }

    pub fn activate(&mut self, index: usize) -> Activation {
        let Some(item) = self.items.get(index) else {
            log::warn!("Activation of unknown gallery item {index}");
            return Activation::Ignored;
        };
        self.selected = Some(index);

        if let (Some(title), Some(description)) = (&item.title, &item.description) {
            self.details = Details {
                title: title.clone(),
                description: description.clone(),
            };
        }

        match self.store.ensure_loaded() {
            Ok(Ensure::Ready(model)) => self.present(&model),
            Ok(Ensure::Started) => {
                self.region.show_placeholder(Placeholder::Loading);
                Activation::Loading
            }
            Ok(Ensure::Busy) => Activation::Ignored,
            Err(err) => self.fail(err),
        }
    }

    /// Apply a finished fetch, if one is waiting. Call from the UI thread.
    pub fn poll_asset(&mut self) -> Option<Activation> {
        let result = self.store.poll()?;
        Some(self.finish_load(result))
    }

    /// Blocking variant of [`Self::poll_asset`].
    pub fn wait_for_asset(&mut self) -> Option<Activation> {
        let result = self.store.wait()?;
        Some(self.finish_load(result))
    }

    fn finish_load(&mut self, result: Result<Arc<Model>, LoadError>) -> Activation {
        match result {
            Ok(model) => self.present(&model),
            Err(err) => self.fail(err),
        }
    }

    fn present(&mut self, model: &Arc<Model>) -> Activation {
        Activation::Presented(self.region.present(model))
    }

    fn fail(&mut self, err: LoadError) -> Activation {
        log::error!("Could not load the 3D model: {err}");
        self.region.show_placeholder(Placeholder::Error);
        Activation::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asset::{ModelSource, obj::load_obj_from_str};
    use crossbeam_channel::{Receiver, Sender, bounded};
    use renderer::ViewerSettings;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fetches block until the test answers `true` (succeed) or `false` (fail).
    struct ScriptedSource {
        fetches: Arc<AtomicUsize>,
        answers: Receiver<bool>,
    }

    impl ModelSource for ScriptedSource {
        fn describe(&self) -> String {
            "scripted".into()
        }

        fn fetch(&self) -> Result<Model, LoadError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.answers.recv().unwrap_or(false) {
                let obj = load_obj_from_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n")
                    .expect("parse obj");
                Ok(Model::assemble("cat", obj, Vec::new()))
            } else {
                Err(LoadError::WorkerLost)
            }
        }
    }

    struct Harness {
        gallery: GalleryController,
        answers: Sender<bool>,
        fetches: Arc<AtomicUsize>,
    }

    fn harness(items: Vec<GalleryItem>) -> Harness {
        let (tx, rx) = bounded(8);
        let fetches = Arc::new(AtomicUsize::new(0));
        let store = AssetStore::new(ScriptedSource {
            fetches: Arc::clone(&fetches),
            answers: rx,
        });
        Harness {
            gallery: GalleryController::new(items, store, ViewerRegion::new(ViewerSettings::default())),
            answers: tx,
            fetches,
        }
    }

    fn museum() -> Vec<GalleryItem> {
        vec![
            GalleryItem::new("Cat Statue", "Bronze cat, Late Period."),
            GalleryItem::new("Sitting Cat", "Limestone, Ptolemaic."),
            GalleryItem {
                title: Some("Fragment".into()),
                description: None,
            },
        ]
    }

    #[test]
    fn first_click_loads_then_presents() {
        let mut h = harness(museum());
        assert_eq!(h.gallery.activate(0), Activation::Loading);
        assert_eq!(h.gallery.details().title, "Cat Statue");
        assert_eq!(h.gallery.region().placeholder(), Some(Placeholder::Loading));

        h.answers.send(true).unwrap();
        let outcome = h.gallery.wait_for_asset().expect("pending load");
        assert!(matches!(outcome, Activation::Presented(_)));
        assert!(h.gallery.region().session().is_some());
        assert!(h.gallery.needs_redraw());
    }

    #[test]
    fn clicks_while_loading_are_ignored() {
        let mut h = harness(museum());
        h.gallery.activate(0);
        assert_eq!(h.gallery.activate(0), Activation::Ignored);
        assert_eq!(h.gallery.activate(1), Activation::Ignored);
        // Text still follows the latest click.
        assert_eq!(h.gallery.details().title, "Sitting Cat");
        assert_eq!(h.gallery.region().placeholder(), Some(Placeholder::Loading));

        h.answers.send(true).unwrap();
        h.gallery.wait_for_asset();
        assert_eq!(h.fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn polling_presents_once_the_fetch_lands() {
        let mut h = harness(museum());
        assert_eq!(h.gallery.activate(0), Activation::Loading);
        for _ in 0..10 {
            assert_eq!(h.gallery.poll_asset(), None);
        }

        h.answers.send(true).unwrap();
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(10);
        let outcome = loop {
            if let Some(outcome) = h.gallery.poll_asset() {
                break outcome;
            }
            assert!(std::time::Instant::now() < deadline, "fetch never landed");
            std::thread::sleep(std::time::Duration::from_millis(1));
        };
        assert!(matches!(outcome, Activation::Presented(_)));
        assert!(h.gallery.region().session().is_some());
        assert_eq!(h.gallery.poll_asset(), None);
        assert_eq!(h.fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cached_model_presents_immediately() {
        let mut h = harness(museum());
        h.gallery.activate(0);
        h.answers.send(true).unwrap();
        let Some(Activation::Presented(first)) = h.gallery.wait_for_asset() else {
            panic!("expected a session");
        };

        let Activation::Presented(second) = h.gallery.activate(1) else {
            panic!("expected immediate presentation");
        };
        assert_ne!(first, second);
        assert_eq!(h.gallery.details().title, "Sitting Cat");
        assert_eq!(h.gallery.details().description, "Limestone, Ptolemaic.");
        assert!(h.gallery.region().placeholder().is_none());
        assert_eq!(h.gallery.region().session().unwrap().id(), second);
        assert_eq!(h.fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failure_shows_error_and_next_click_retries() {
        let mut h = harness(museum());
        h.gallery.activate(0);
        h.answers.send(false).unwrap();
        assert_eq!(h.gallery.wait_for_asset(), Some(Activation::Failed));
        assert_eq!(h.gallery.region().placeholder(), Some(Placeholder::Error));

        assert_eq!(h.gallery.activate(0), Activation::Loading);
        h.answers.send(true).unwrap();
        assert!(matches!(h.gallery.wait_for_asset(), Some(Activation::Presented(_))));
        assert_eq!(h.fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn incomplete_descriptor_keeps_previous_text() {
        let mut h = harness(museum());
        h.gallery.activate(0);
        h.gallery.activate(2);
        assert_eq!(h.gallery.details().title, "Cat Statue");
        assert_eq!(h.gallery.selected(), Some(2));
    }

    #[test]
    fn unknown_item_is_ignored() {
        let mut h = harness(museum());
        assert_eq!(h.gallery.activate(99), Activation::Ignored);
        assert_eq!(h.fetches.load(Ordering::SeqCst), 0);
        assert!(h.gallery.region().placeholder().is_none());
    }

    #[test]
    fn strip_moves_by_fixed_steps_within_bounds() {
        let mut strip = ScrollStrip::new(SCROLL_STEP);
        strip.set_extent(1000.0, 400.0);

        strip.scroll_left();
        assert_eq!(strip.target(), 0.0);
        strip.scroll_right();
        assert_eq!(strip.target(), 250.0);
        strip.scroll_right();
        strip.scroll_right();
        assert_eq!(strip.target(), 600.0);
    }

    #[test]
    fn strip_animation_settles_on_target() {
        let mut strip = ScrollStrip::new(SCROLL_STEP);
        strip.set_extent(1000.0, 400.0);
        strip.scroll_right();
        assert!(strip.is_animating());

        let first = strip.advance(1.0 / 60.0);
        assert!(first > 0.0 && first < 250.0);
        for _ in 0..120 {
            strip.advance(1.0 / 60.0);
        }
        assert_eq!(strip.offset(), 250.0);
        assert!(!strip.is_animating());
    }

    #[test]
    fn user_drag_is_adopted_only_when_idle() {
        let mut strip = ScrollStrip::new(SCROLL_STEP);
        strip.set_extent(1000.0, 400.0);
        strip.sync_from_user(120.0);
        assert_eq!(strip.offset(), 120.0);

        strip.scroll_right();
        strip.sync_from_user(10.0);
        assert_eq!(strip.target(), 370.0);
    }
}
