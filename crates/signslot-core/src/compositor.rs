//! Signature image compositing.
//!
//! Signature images are loaded asynchronously and cached per slot. A cache
//! entry is only trusted while its source still equals the slot's current
//! signature reference; anything else triggers a fresh load. Loads are never
//! cancelled: late results are stamped with a ticket and dropped if the entry
//! they were meant for has since been replaced or pruned.

use crate::store::{SignatureSlot, SlotId};
use crate::surface::{DrawContext, ImageOf, Surface, SurfaceElement};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use thiserror::Error;

/// Image loading errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("Image source is empty")]
    EmptySource,
    #[error("Unsupported image source: {0}")]
    Unsupported(String),
    #[error("Image decode failed: {0}")]
    Decode(String),
    #[error("Image load failed: {0}")]
    Failed(String),
}

/// Completion callback handed to an [`ImageLoader`].
pub type LoadCallback<I> = Box<dyn FnOnce(Result<I, LoadError>)>;

/// Called whenever a load succeeds so the host can schedule a repaint.
pub type RepaintWaker = Rc<dyn Fn()>;

/// Turns an image source reference into a drawable image.
pub trait ImageLoader {
    type Image;

    /// Begin loading `source`.
    ///
    /// `done` must be called at most once. It may be called before `load`
    /// returns.
    fn load(&self, source: &str, done: LoadCallback<Self::Image>);
}

/// Result of compositing one slot during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeOutcome {
    /// The cached image was drawn into the slot.
    Drawn,
    /// A load is in flight; nothing drawn this pass.
    Loading,
    /// The current reference failed to load; it will not be retried.
    Failed,
    /// No signature, no area, or no surface to draw on.
    Skipped,
}

#[derive(Debug)]
enum CachedImage<I> {
    Pending,
    Ready(I),
    Failed,
}

#[derive(Debug)]
struct CacheEntry<I> {
    source: String,
    ticket: u64,
    image: CachedImage<I>,
}

struct LoadCompletion<I> {
    slot: SlotId,
    ticket: u64,
    result: Result<I, LoadError>,
}

type CompletionQueue<I> = Rc<RefCell<Vec<LoadCompletion<I>>>>;

/// Draws signature images into their slots on a dedicated surface.
pub struct Compositor<E: SurfaceElement, L> {
    surface: Surface<E>,
    loader: L,
    cache: HashMap<SlotId, CacheEntry<ImageOf<E>>>,
    completions: CompletionQueue<ImageOf<E>>,
    waker: Option<RepaintWaker>,
    /// Slots that carried a signature during the current pass.
    live: HashSet<SlotId>,
    next_ticket: u64,
    loads_issued: u64,
}

impl<E, L> Compositor<E, L>
where
    E: SurfaceElement,
    L: ImageLoader<Image = ImageOf<E>>,
    ImageOf<E>: 'static,
{
    /// Create a compositor drawing on `surface` and loading with `loader`.
    pub fn new(surface: Surface<E>, loader: L) -> Self {
        Self {
            surface,
            loader,
            cache: HashMap::new(),
            completions: Rc::new(RefCell::new(Vec::new())),
            waker: None,
            live: HashSet::new(),
            next_ticket: 0,
            loads_issued: 0,
        }
    }

    /// Install the callback run after each successful load.
    pub fn set_waker(&mut self, waker: Option<RepaintWaker>) {
        self.waker = waker;
    }

    /// The image layer.
    pub fn surface(&self) -> &Surface<E> {
        &self.surface
    }

    /// The image layer, mutably.
    pub fn surface_mut(&mut self) -> &mut Surface<E> {
        &mut self.surface
    }

    /// The image loader.
    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Total number of loads started.
    pub fn loads_issued(&self) -> u64 {
        self.loads_issued
    }

    /// Loads started but not yet accepted or rejected.
    pub fn pending_loads(&self) -> usize {
        self.cache
            .values()
            .filter(|entry| matches!(entry.image, CachedImage::Pending))
            .count()
    }

    /// Source the cache holds for `slot`, if any.
    pub fn cached_source(&self, slot: SlotId) -> Option<&str> {
        self.cache.get(&slot).map(|entry| entry.source.as_str())
    }

    /// Whether a drawable image is cached for `slot`.
    pub fn has_image(&self, slot: SlotId) -> bool {
        self.cache
            .get(&slot)
            .is_some_and(|entry| matches!(entry.image, CachedImage::Ready(_)))
    }

    /// Start a repaint pass: wipe the image layer.
    pub fn begin_pass(&mut self) {
        self.live.clear();
        self.surface.clear();
    }

    /// Draw `slot`'s signature, or start loading it if the cache is stale.
    pub fn composite(&mut self, slot: &SignatureSlot) -> CompositeOutcome {
        let Some(source) = slot.signature.as_deref() else {
            return CompositeOutcome::Skipped;
        };
        if !slot.has_area() {
            return CompositeOutcome::Skipped;
        }
        self.live.insert(slot.id);

        let stale = self
            .cache
            .get(&slot.id)
            .is_none_or(|entry| entry.source != source);
        if stale {
            self.issue_load(slot.id, source);
            return CompositeOutcome::Loading;
        }

        let Some(entry) = self.cache.get(&slot.id) else {
            return CompositeOutcome::Loading;
        };
        match &entry.image {
            CachedImage::Pending => CompositeOutcome::Loading,
            CachedImage::Failed => CompositeOutcome::Failed,
            CachedImage::Ready(image) => match self.surface.context_mut() {
                Some(ctx) => {
                    ctx.draw_image(image, slot.rect());
                    CompositeOutcome::Drawn
                }
                None => CompositeOutcome::Skipped,
            },
        }
    }

    /// End a repaint pass: forget slots that no longer carry a signature.
    pub fn finish_pass(&mut self) {
        let live = &self.live;
        self.cache.retain(|slot, _| live.contains(slot));
    }

    /// Apply finished loads to the cache.
    ///
    /// Returns `true` if at least one image became drawable, meaning another
    /// pass is needed to show it.
    pub fn drain_completions(&mut self) -> bool {
        let completions = std::mem::take(&mut *self.completions.borrow_mut());
        let mut accepted = false;
        for completion in completions {
            match self.cache.get_mut(&completion.slot) {
                Some(entry) if entry.ticket == completion.ticket => match completion.result {
                    Ok(image) => {
                        log::debug!("signature for slot {} loaded", completion.slot);
                        entry.image = CachedImage::Ready(image);
                        accepted = true;
                    }
                    Err(err) => {
                        log::warn!("signature for slot {} failed to load: {}", completion.slot, err);
                        entry.image = CachedImage::Failed;
                    }
                },
                _ => log::debug!(
                    "dropping superseded signature load for slot {} (ticket {})",
                    completion.slot,
                    completion.ticket
                ),
            }
        }
        accepted
    }

    /// Forget every cached image.
    pub fn reset(&mut self) {
        self.cache.clear();
        self.live.clear();
    }

    fn issue_load(&mut self, slot: SlotId, source: &str) {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.cache.insert(
            slot,
            CacheEntry {
                source: source.to_string(),
                ticket,
                image: CachedImage::Pending,
            },
        );
        self.loads_issued += 1;
        log::debug!("loading signature for slot {} (ticket {})", slot, ticket);

        let queue = Rc::clone(&self.completions);
        let waker = self.waker.clone();
        self.loader.load(
            source,
            Box::new(move |result| {
                let loaded = result.is_ok();
                queue.borrow_mut().push(LoadCompletion {
                    slot,
                    ticket,
                    result,
                });
                if loaded {
                    if let Some(wake) = waker {
                        wake();
                    }
                }
            }),
        );
    }
}
