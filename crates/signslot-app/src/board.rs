//! The `SignBoard` script API.
//!
//! A board owns the slot store for the lifetime of the page and mounts the
//! ink and selection engines onto canvases on demand. Unmounting drops every
//! DOM listener, the pending long-press timeout and the resize observer, then
//! wipes the canvases.

use crate::canvas::{CanvasElement, HtmlImageLoader};
use crate::config::{MountError, MountOptions};
use crate::events::{MOUSE_EVENTS, TOUCH_EVENTS, pointer_event, touch_event};
use gloo::events::{EventListener, EventListenerOptions};
use gloo::timers::callback::Timeout;
use signslot_core::{
    CompatMouseFilter, Compositor, EventResponse, InkEngine, Instant, SelectionEngine, SlotEvent, SlotId, SlotRect,
    SlotStore, Subscription, Surface, connect_redraw,
};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Event, HtmlCanvasElement, MouseEvent, ResizeObserver};

type CanvasSelection = SelectionEngine<CanvasElement, HtmlImageLoader>;
type CanvasInk = InkEngine<CanvasElement>;
type Observers = Rc<RefCell<Vec<js_sys::Function>>>;

/// Armed long-press timeout and the deadline it was set for.
type LongPressTimer = Rc<RefCell<Option<(Instant, Timeout)>>>;

impl From<MountError> for JsValue {
    fn from(err: MountError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

/// Signature-slot board exposed to JavaScript.
#[wasm_bindgen]
pub struct SignBoard {
    store: SlotStore,
    observers: Observers,
    _notify: Subscription,
    mounted: Option<Mounted>,
}

impl Default for SignBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl SignBoard {
    #[wasm_bindgen(constructor)]
    pub fn new() -> SignBoard {
        let store = SlotStore::new();
        let observers: Observers = Rc::default();
        let notify = {
            let observers = Rc::clone(&observers);
            store.subscribe(move |event| notify_observers(&observers, event))
        };
        SignBoard {
            store,
            observers,
            _notify: notify,
            mounted: None,
        }
    }

    /// Attach to the page's canvases, replacing any current mount.
    ///
    /// On error the board keeps its current mount, if any.
    pub fn mount(&mut self, options: JsValue) -> Result<(), JsValue> {
        let options: MountOptions = if options.is_undefined() || options.is_null() {
            MountOptions::default()
        } else {
            serde_wasm_bindgen::from_value(options).map_err(|err| MountError::InvalidOptions(err.to_string()))?
        };
        options.validate()?;
        let targets = MountTargets::locate(&options)?;

        self.unmount();
        self.mounted = Some(Mounted::attach(self.store.clone(), targets, &options));
        Ok(())
    }

    /// Detach from the page and wipe the canvases. Slots are kept.
    pub fn unmount(&mut self) {
        if self.mounted.take().is_some() {
            log::info!("board unmounted");
        }
    }

    #[wasm_bindgen(js_name = isMounted)]
    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// Add a slot programmatically, in backing pixels. Returns its id.
    #[wasm_bindgen(js_name = addSlot)]
    pub fn add_slot(&self, x: f64, y: f64, width: f64, height: f64, stroke_style: Option<String>) -> f64 {
        let mut rect = SlotRect::new(x, y, width, height);
        rect.stroke_style = stroke_style;
        self.store.add(rect) as f64
    }

    /// Attach a signature image (usually a data URL) to a slot.
    #[wasm_bindgen(js_name = setSignature)]
    pub fn set_signature(&self, id: f64, data_url: String) -> bool {
        slot_id(id).is_some_and(|id| self.store.set_signature(id, data_url))
    }

    #[wasm_bindgen(js_name = removeSlot)]
    pub fn remove_slot(&self, id: f64) -> bool {
        slot_id(id).is_some_and(|id| self.store.remove(id))
    }

    #[wasm_bindgen(js_name = clearSlots)]
    pub fn clear_slots(&self) {
        self.store.clear();
    }

    /// Erase the freehand ink layer.
    #[wasm_bindgen(js_name = clearInk)]
    pub fn clear_ink(&self) {
        let Some(ink) = self.mounted.as_ref().and_then(|mounted| mounted.ink.as_ref()) else {
            return;
        };
        if let Ok(mut ink) = ink.try_borrow_mut() {
            ink.clear();
        }
    }

    /// PNG data URL of the ink layer, for handing to `setSignature`.
    #[wasm_bindgen(js_name = inkDataUrl)]
    pub fn ink_data_url(&self) -> Result<Option<String>, JsValue> {
        match self.mounted.as_ref().and_then(|mounted| mounted.ink_canvas.as_ref()) {
            Some(canvas) => canvas.to_data_url().map(Some),
            None => Ok(None),
        }
    }

    /// Current slots, in badge order.
    pub fn slots(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.store.snapshot()).map_err(Into::into)
    }

    /// Force a full redraw of slots and signatures.
    pub fn repaint(&self) {
        let Some(mounted) = self.mounted.as_ref() else {
            return;
        };
        if let Ok(mut selection) = mounted.selection.try_borrow_mut() {
            selection.repaint();
        }
    }

    /// Call `callback(kind, id)` after every slot change. `id` is `null` for
    /// `"cleared"`.
    #[wasm_bindgen(js_name = onChange)]
    pub fn on_change(&self, callback: js_sys::Function) {
        self.observers.borrow_mut().push(callback);
    }

    /// Stop calling a function registered with `onChange`. Returns whether
    /// it was registered.
    #[wasm_bindgen(js_name = offChange)]
    pub fn off_change(&self, callback: &js_sys::Function) -> bool {
        let mut observers = self.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|observer| !js_sys::Object::is(observer, callback));
        observers.len() != before
    }
}

fn slot_id(id: f64) -> Option<SlotId> {
    (id.is_finite() && id >= 0.0 && id.fract() == 0.0).then_some(id as SlotId)
}

fn notify_observers(observers: &Observers, event: &SlotEvent) {
    let callbacks = observers.borrow().clone();
    if callbacks.is_empty() {
        return;
    }
    let kind = JsValue::from_str(event.kind());
    let slot = event.slot().map_or(JsValue::NULL, |id| JsValue::from_f64(id as f64));
    for callback in callbacks {
        if let Err(err) = callback.call2(&JsValue::NULL, &kind, &slot) {
            log::warn!("slot observer threw: {:?}", err);
        }
    }
}

/// Everything alive while the board is attached to the page.
struct Mounted {
    selection: Rc<RefCell<CanvasSelection>>,
    ink: Option<Rc<RefCell<CanvasInk>>>,
    ink_canvas: Option<HtmlCanvasElement>,
    long_press: LongPressTimer,
    listeners: Vec<EventListener>,
    resize: Option<ResizeWatch>,
    _redraw: Subscription,
}

/// Page elements a mount attaches to, looked up before anything changes.
struct MountTargets {
    window: web_sys::Window,
    overlay: HtmlCanvasElement,
    signature: HtmlCanvasElement,
    ink_canvas: Option<HtmlCanvasElement>,
}

impl MountTargets {
    fn locate(options: &MountOptions) -> Result<Self, MountError> {
        let window = web_sys::window().ok_or(MountError::NoDocument)?;
        let document = window.document().ok_or(MountError::NoDocument)?;
        let overlay = find_canvas(&document, &options.overlay_canvas)?;
        let signature = find_canvas(&document, &options.signature_canvas)?;
        let ink_canvas = options
            .ink_canvas
            .as_deref()
            .map(|id| find_canvas(&document, id))
            .transpose()?;
        Ok(Self {
            window,
            overlay,
            signature,
            ink_canvas,
        })
    }
}

impl Mounted {
    fn attach(store: SlotStore, targets: MountTargets, options: &MountOptions) -> Self {
        let MountTargets {
            window,
            overlay,
            signature,
            ink_canvas,
        } = targets;

        let config = &options.board;
        let compositor = Compositor::new(Surface::new(CanvasElement::new(signature.clone())), HtmlImageLoader);
        let mut engine = SelectionEngine::new(store, Surface::new(CanvasElement::new(overlay.clone())), compositor)
            .with_style(config.overlay.clone())
            .with_gesture(&config.gesture);
        if !engine.initialize() {
            log::warn!("slot canvases have no 2d context; slots will not be drawn");
        }
        let selection = Rc::new(RefCell::new(engine));
        let redraw = connect_redraw(&selection);

        let ink = ink_canvas.as_ref().map(|canvas| {
            let mut ink = InkEngine::new(Surface::new(CanvasElement::new(canvas.clone()))).with_style(config.ink.clone());
            if !ink.initialize() {
                log::warn!("ink canvas has no 2d context; ink is disabled");
            }
            Rc::new(RefCell::new(ink))
        });

        let filter = Rc::new(RefCell::new(CompatMouseFilter::new(config.gesture.compat_mouse_cooldown())));
        let long_press: LongPressTimer = Rc::default();
        let mut listeners = Vec::new();
        listen_selection(&overlay, &selection, &filter, &long_press, &mut listeners);
        if let (Some(canvas), Some(ink)) = (ink_canvas.as_ref(), ink.as_ref()) {
            listen_ink(canvas, ink, &filter, &mut listeners);
        }

        let mut canvases = vec![overlay, signature];
        canvases.extend(ink_canvas.clone());
        let resize = ResizeWatch::observe(&canvases, &selection, ink.as_ref());
        if resize.is_none() {
            log::debug!("ResizeObserver unavailable; following window resizes");
            let on_resize = resize_handler(&selection, ink.as_ref());
            listeners.push(EventListener::new(&window, "resize", move |_| on_resize()));
        }

        log::info!("board mounted on #{}", options.overlay_canvas);
        Self {
            selection,
            ink,
            ink_canvas,
            long_press,
            listeners,
            resize,
            _redraw: redraw,
        }
    }
}

impl Drop for Mounted {
    fn drop(&mut self) {
        self.listeners.clear();
        self.long_press.borrow_mut().take();
        self.resize = None;
        if let Ok(mut selection) = self.selection.try_borrow_mut() {
            selection.teardown();
        }
        if let Some(ink) = &self.ink {
            if let Ok(mut ink) = ink.try_borrow_mut() {
                ink.teardown();
            }
        }
    }
}

fn find_canvas(document: &Document, id: &str) -> Result<HtmlCanvasElement, MountError> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| MountError::MissingElement(id.to_string()))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| MountError::NotACanvas(id.to_string()))
}

fn respond(event: &Event, response: EventResponse) {
    if response.prevent_default {
        event.prevent_default();
    }
}

fn listen_selection(
    canvas: &HtmlCanvasElement,
    selection: &Rc<RefCell<CanvasSelection>>,
    filter: &Rc<RefCell<CompatMouseFilter>>,
    timer: &LongPressTimer,
    listeners: &mut Vec<EventListener>,
) {
    for kind in MOUSE_EVENTS {
        let selection = Rc::clone(selection);
        let filter = Rc::clone(filter);
        listeners.push(EventListener::new(canvas, kind, move |event| {
            let Some(pointer) = event.dyn_ref::<MouseEvent>().and_then(|mouse| pointer_event(kind, mouse)) else {
                return;
            };
            if !filter.borrow().accept_mouse(Instant::now()) {
                return;
            }
            let Ok(mut selection) = selection.try_borrow_mut() else {
                return;
            };
            respond(event, selection.handle_pointer(&pointer));
        }));
    }

    for kind in TOUCH_EVENTS {
        let selection = Rc::clone(selection);
        let filter = Rc::clone(filter);
        let timer = Rc::clone(timer);
        listeners.push(EventListener::new_with_options(
            canvas,
            kind,
            EventListenerOptions::enable_prevent_default(),
            move |event| {
                let Some(touch) = event
                    .dyn_ref::<web_sys::TouchEvent>()
                    .and_then(|touch| touch_event(kind, touch))
                else {
                    return;
                };
                let now = Instant::now();
                filter.borrow_mut().touch_seen(now);
                let (response, deadline) = {
                    let Ok(mut engine) = selection.try_borrow_mut() else {
                        return;
                    };
                    let response = engine.handle_touch(&touch, now);
                    (response, engine.long_press_deadline())
                };
                respond(event, response);
                schedule_long_press(&selection, &timer, deadline, now);
            },
        ));
    }
}

/// Keep one timeout armed for the engine's current long-press deadline.
fn schedule_long_press(
    selection: &Rc<RefCell<CanvasSelection>>,
    timer: &LongPressTimer,
    deadline: Option<Instant>,
    now: Instant,
) {
    let Some(deadline) = deadline else {
        timer.borrow_mut().take();
        return;
    };
    if matches!(&*timer.borrow(), Some((armed, _)) if *armed == deadline) {
        return;
    }

    // One extra millisecond so the poll never lands just short of the deadline.
    let delay = deadline.saturating_duration_since(now).as_millis().min(u32::MAX as u128 - 1) as u32 + 1;
    let target = Rc::downgrade(selection);
    let timeout = Timeout::new(delay, move || {
        let Some(selection) = target.upgrade() else {
            return;
        };
        if let Ok(mut engine) = selection.try_borrow_mut() {
            engine.poll_long_press(Instant::now());
        }
    });
    *timer.borrow_mut() = Some((deadline, timeout));
}

fn listen_ink(
    canvas: &HtmlCanvasElement,
    ink: &Rc<RefCell<CanvasInk>>,
    filter: &Rc<RefCell<CompatMouseFilter>>,
    listeners: &mut Vec<EventListener>,
) {
    for kind in MOUSE_EVENTS {
        let ink = Rc::clone(ink);
        let filter = Rc::clone(filter);
        listeners.push(EventListener::new(canvas, kind, move |event| {
            let Some(pointer) = event.dyn_ref::<MouseEvent>().and_then(|mouse| pointer_event(kind, mouse)) else {
                return;
            };
            if !filter.borrow().accept_mouse(Instant::now()) {
                return;
            }
            let Ok(mut ink) = ink.try_borrow_mut() else {
                return;
            };
            respond(event, ink.handle_pointer(&pointer));
        }));
    }

    for kind in TOUCH_EVENTS {
        let ink = Rc::clone(ink);
        let filter = Rc::clone(filter);
        listeners.push(EventListener::new_with_options(
            canvas,
            kind,
            EventListenerOptions::enable_prevent_default(),
            move |event| {
                let Some(touch) = event
                    .dyn_ref::<web_sys::TouchEvent>()
                    .and_then(|touch| touch_event(kind, touch))
                else {
                    return;
                };
                filter.borrow_mut().touch_seen(Instant::now());
                let Ok(mut ink) = ink.try_borrow_mut() else {
                    return;
                };
                respond(event, ink.handle_touch(&touch));
            },
        ));
    }
}

fn resize_handler(
    selection: &Rc<RefCell<CanvasSelection>>,
    ink: Option<&Rc<RefCell<CanvasInk>>>,
) -> impl Fn() + 'static {
    let selection = Rc::downgrade(selection);
    let ink = ink.map(Rc::downgrade);
    move || {
        if let Some(selection) = selection.upgrade() {
            if let Ok(mut selection) = selection.try_borrow_mut() {
                selection.resize();
            }
        }
        if let Some(ink) = ink.as_ref().and_then(Weak::upgrade) {
            if let Ok(mut ink) = ink.try_borrow_mut() {
                if ink.resize() {
                    log::debug!("ink canvas resized; existing ink was cleared");
                }
            }
        }
    }
}

/// Resize observation of the mounted canvases. Disconnects on drop.
struct ResizeWatch {
    observer: ResizeObserver,
    _callback: Closure<dyn FnMut(js_sys::Array, ResizeObserver)>,
}

impl ResizeWatch {
    fn observe(
        canvases: &[HtmlCanvasElement],
        selection: &Rc<RefCell<CanvasSelection>>,
        ink: Option<&Rc<RefCell<CanvasInk>>>,
    ) -> Option<Self> {
        let on_resize = resize_handler(selection, ink);
        let callback =
            Closure::<dyn FnMut(js_sys::Array, ResizeObserver)>::new(move |_entries: js_sys::Array, _observer: ResizeObserver| {
                on_resize()
            });
        let observer = ResizeObserver::new(callback.as_ref().unchecked_ref()).ok()?;
        for canvas in canvases {
            observer.observe(canvas);
        }
        Some(Self {
            observer,
            _callback: callback,
        })
    }
}

impl Drop for ResizeWatch {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}
