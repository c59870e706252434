//! Rectangle selection of signature slots.
//!
//! Mouse drags and long-press touch drags become axis-aligned slots in the
//! store. The engine also owns the overlay surface (slot borders, badges and
//! the live preview) and drives the [`Compositor`] that fills signed slots.

use crate::compositor::{Compositor, ImageLoader};
use crate::config::{BadgeStyle, GestureConfig, OverlayStyle};
use crate::input::{EventResponse, Gesture, Instant, PointerEvent, TouchEvent, TouchPhase, mouse_step};
use crate::store::{SignatureSlot, SlotRect, SlotStore, Subscription};
use crate::surface::{DrawContext, ImageOf, Surface, SurfaceElement};
use kurbo::{Point, Rect};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

/// Gesture state of the overlay, with points in backing pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionState {
    Idle,
    Selecting { anchor: Point, current: Point },
}

#[derive(Debug, Clone, Copy)]
struct PendingLongPress {
    deadline: Instant,
    /// Client position of the held finger.
    position: Point,
}

/// Turns gestures on the overlay surface into slots and paints them.
pub struct SelectionEngine<E: SurfaceElement, L> {
    store: SlotStore,
    surface: Surface<E>,
    compositor: Compositor<E, L>,
    style: OverlayStyle,
    long_press_delay: Duration,
    state: SelectionState,
    long_press: Option<PendingLongPress>,
    dirty: Rc<Cell<bool>>,
    subscription: Option<Subscription>,
}

impl<E, L> SelectionEngine<E, L>
where
    E: SurfaceElement,
    L: ImageLoader<Image = ImageOf<E>>,
    ImageOf<E>: 'static,
{
    /// Create an engine painting `store` onto `surface`, with signature
    /// images going through `compositor`.
    pub fn new(store: SlotStore, surface: Surface<E>, compositor: Compositor<E, L>) -> Self {
        let dirty = Rc::new(Cell::new(true));
        let flag = Rc::clone(&dirty);
        let subscription = store.subscribe(move |_| flag.set(true));
        Self {
            store,
            surface,
            compositor,
            style: OverlayStyle::default(),
            long_press_delay: GestureConfig::default().long_press(),
            state: SelectionState::Idle,
            long_press: None,
            dirty,
            subscription: Some(subscription),
        }
    }

    /// Set the overlay appearance.
    pub fn with_style(mut self, style: OverlayStyle) -> Self {
        self.style = style;
        self
    }

    /// Set gesture timing.
    pub fn with_gesture(mut self, gesture: &GestureConfig) -> Self {
        self.long_press_delay = gesture.long_press();
        self
    }

    pub fn store(&self) -> &SlotStore {
        &self.store
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    /// Whether a rectangle is being dragged out.
    pub fn is_selecting(&self) -> bool {
        matches!(self.state, SelectionState::Selecting { .. })
    }

    /// The overlay surface.
    pub fn surface(&self) -> &Surface<E> {
        &self.surface
    }

    pub fn compositor(&self) -> &Compositor<E, L> {
        &self.compositor
    }

    pub fn compositor_mut(&mut self) -> &mut Compositor<E, L> {
        &mut self.compositor
    }

    /// Prepare both surfaces and paint the current slots.
    ///
    /// Returns whether both surfaces are ready.
    pub fn initialize(&mut self) -> bool {
        let overlay = self.surface.initialize();
        let images = self.compositor.surface_mut().initialize();
        self.repaint();
        overlay && images
    }

    /// Follow the elements' displayed sizes, repainting if either buffer was
    /// resized.
    pub fn resize(&mut self) -> bool {
        let overlay = self.surface.resize();
        let images = self.compositor.surface_mut().resize();
        if overlay || images {
            self.repaint();
        }
        overlay || images
    }

    /// Whether the store changed since the last repaint.
    pub fn needs_repaint(&self) -> bool {
        self.dirty.get()
    }

    /// Repaint only if something changed since the last repaint.
    pub fn repaint_if_needed(&mut self) -> bool {
        if !self.dirty.get() {
            return false;
        }
        self.repaint();
        true
    }

    /// Redraw every slot, its badge and its signature, plus the live preview.
    pub fn repaint(&mut self) {
        self.compositor.drain_completions();
        self.paint_pass();
        // Images that finished loading while painting.
        while self.compositor.drain_completions() {
            self.paint_pass();
        }
        self.dirty.set(false);
    }

    /// Feed a mouse event.
    pub fn handle_pointer(&mut self, event: &PointerEvent) -> EventResponse {
        self.apply(mouse_step(event));
        EventResponse::PASS
    }

    /// Feed a touch event observed at `now`.
    ///
    /// A single finger arms the long-press timer; the host must call
    /// [`SelectionEngine::poll_long_press`] once
    /// [`SelectionEngine::long_press_deadline`] has passed.
    pub fn handle_touch(&mut self, event: &TouchEvent, now: Instant) -> EventResponse {
        match event.phase {
            TouchPhase::Start => {
                match (event.touch_count(), event.primary()) {
                    (1, Some(position)) => {
                        self.long_press = Some(PendingLongPress {
                            deadline: now + self.long_press_delay,
                            position,
                        });
                    }
                    _ => {
                        self.cancel_long_press();
                        self.abort();
                    }
                }
                EventResponse::PASS
            }
            TouchPhase::Move => {
                if !self.is_selecting() || event.touch_count() != 1 || !event.cancelable {
                    return EventResponse::PASS;
                }
                if let Some(point) = event.primary() {
                    self.continue_to(point);
                }
                EventResponse::CONSUME
            }
            TouchPhase::End => {
                self.cancel_long_press();
                self.end(event.changed.first().copied());
                EventResponse::PASS
            }
            TouchPhase::Cancel => {
                self.cancel_long_press();
                self.abort();
                EventResponse::PASS
            }
        }
    }

    /// When the pending long press fires, if one is armed.
    pub fn long_press_deadline(&self) -> Option<Instant> {
        self.long_press.map(|pending| pending.deadline)
    }

    /// Enter selection mode if the long press is due at `now`.
    pub fn poll_long_press(&mut self, now: Instant) -> bool {
        match self.long_press {
            Some(pending) if now >= pending.deadline => {
                self.long_press = None;
                log::debug!("long press fired");
                self.begin(pending.position);
                self.is_selecting()
            }
            _ => false,
        }
    }

    /// Disarm the long-press timer.
    pub fn cancel_long_press(&mut self) {
        if self.long_press.take().is_some() {
            log::debug!("long press cancelled");
        }
    }

    /// Stop reacting: cancel timers, drop the gesture, unsubscribe and wipe
    /// both surfaces.
    pub fn teardown(&mut self) {
        self.cancel_long_press();
        self.state = SelectionState::Idle;
        self.subscription = None;
        self.compositor.set_waker(None);
        self.compositor.reset();
        self.surface.clear();
        self.compositor.surface_mut().clear();
    }

    /// Drop an active selection without committing it.
    fn abort(&mut self) {
        if self.is_selecting() {
            self.state = SelectionState::Idle;
            log::debug!("selection aborted");
            self.repaint();
        }
    }

    fn paint_pass(&mut self) {
        if !self.surface.is_ready() || !self.compositor.surface().is_ready() {
            return;
        }
        let slots = self.store.snapshot();
        self.surface.clear();
        self.compositor.begin_pass();
        for (index, slot) in slots.iter().enumerate() {
            if let Some(ctx) = self.surface.context_mut() {
                draw_slot(ctx, &self.style, slot, index);
            }
            self.compositor.composite(slot);
        }
        self.compositor.finish_pass();

        if let SelectionState::Selecting { anchor, current } = self.state {
            if let Some(ctx) = self.surface.context_mut() {
                draw_preview(ctx, &self.style, Rect::from_points(anchor, current));
            }
        }
    }
}

impl<E, L> Gesture for SelectionEngine<E, L>
where
    E: SurfaceElement,
    L: ImageLoader<Image = ImageOf<E>>,
    ImageOf<E>: 'static,
{
    fn begin(&mut self, point: Point) {
        if !self.surface.is_ready() {
            return;
        }
        let Some(anchor) = self.surface.client_to_backing(point) else {
            return;
        };
        self.state = SelectionState::Selecting {
            anchor,
            current: anchor,
        };
        log::debug!("selection started at ({:.1}, {:.1})", anchor.x, anchor.y);
    }

    fn continue_to(&mut self, point: Point) {
        let SelectionState::Selecting { anchor, .. } = self.state else {
            return;
        };
        let Some(current) = self.surface.client_to_backing(point) else {
            return;
        };
        self.state = SelectionState::Selecting { anchor, current };
        self.repaint();
    }

    fn end(&mut self, point: Option<Point>) {
        let SelectionState::Selecting { anchor, current } = self.state else {
            return;
        };
        let end = point
            .and_then(|point| self.surface.client_to_backing(point))
            .unwrap_or(current);
        self.state = SelectionState::Idle;
        self.cancel_long_press();
        self.store.add(SlotRect::from_corners(anchor, end));
        self.repaint();
    }
}

/// Keep `engine` painted: repaint on every store change and every finished
/// image load.
///
/// Notifications that arrive while the engine is already borrowed (its own
/// mutations, synchronous loads) mark it dirty instead; the engine repaints
/// those itself. Dropping the returned subscription stops store-driven
/// repaints.
pub fn connect_redraw<E, L>(engine: &Rc<RefCell<SelectionEngine<E, L>>>) -> Subscription
where
    E: SurfaceElement + 'static,
    L: ImageLoader<Image = ImageOf<E>> + 'static,
    ImageOf<E>: 'static,
{
    let (store, dirty) = {
        let engine = engine.borrow();
        (engine.store.clone(), Rc::clone(&engine.dirty))
    };

    let target = Rc::downgrade(engine);
    let flag = Rc::clone(&dirty);
    engine
        .borrow_mut()
        .compositor
        .set_waker(Some(Rc::new(move || redraw(&target, &flag))));

    let target = Rc::downgrade(engine);
    store.subscribe(move |_| redraw(&target, &dirty))
}

fn redraw<E, L>(engine: &Weak<RefCell<SelectionEngine<E, L>>>, dirty: &Cell<bool>)
where
    E: SurfaceElement,
    L: ImageLoader<Image = ImageOf<E>>,
    ImageOf<E>: 'static,
{
    let Some(engine) = engine.upgrade() else {
        return;
    };
    match engine.try_borrow_mut() {
        Ok(mut engine) => engine.repaint(),
        Err(_) => dirty.set(true),
    };
}

fn draw_slot<C: DrawContext>(ctx: &mut C, style: &OverlayStyle, slot: &SignatureSlot, index: usize) {
    ctx.set_stroke_style(slot.stroke_style.as_deref().unwrap_or(&style.slot_stroke));
    ctx.set_line_width(style.slot_line_width);
    ctx.stroke_rect(slot.rect());
    draw_badge(ctx, &style.badge, Point::new(slot.x, slot.y), index);
}

/// Numbered label sitting just above the slot's top-left corner.
fn draw_badge<C: DrawContext>(ctx: &mut C, badge: &BadgeStyle, corner: Point, index: usize) {
    let text = badge.text(index);
    ctx.set_font(&badge.font);
    let text_width = ctx.measure_text(&text);
    let top = corner.y - badge.text_height - badge.padding * 2.0;

    ctx.set_fill_style(&badge.background);
    ctx.fill_rect(Rect::new(
        corner.x,
        top,
        corner.x + text_width + badge.padding * 2.0,
        top + badge.text_height + badge.padding * 2.0,
    ));

    ctx.set_fill_style(&badge.text_color);
    ctx.fill_text(
        &text,
        Point::new(corner.x + badge.padding, top + badge.text_height + badge.padding / 2.0),
    );
}

fn draw_preview<C: DrawContext>(ctx: &mut C, style: &OverlayStyle, rect: Rect) {
    ctx.set_line_dash(&style.preview_dash);
    ctx.set_stroke_style(&style.preview_stroke);
    ctx.set_line_width(style.preview_line_width);
    ctx.stroke_rect(rect);
    ctx.set_line_dash(&[]);
}
