//! Shared list of signature slots with synchronous change notification.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

/// Slot identifier. Assigned in increasing order and never reused.
pub type SlotId = u64;

/// A rectangular region, in backing pixels, where a signature belongs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureSlot {
    pub id: SlotId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Border color; the renderer's default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_style: Option<String>,
    /// Opaque image source (usually a data URL) once the slot is signed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl SignatureSlot {
    /// The slot's rectangle.
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// Whether the slot covers any pixels at all.
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Geometry and style of a slot that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_style: Option<String>,
}

impl SlotRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            stroke_style: None,
        }
    }

    /// Rectangle spanning two corners, whichever direction they were dragged in.
    pub fn from_corners(a: Point, b: Point) -> Self {
        let rect = Rect::from_points(a, b);
        Self::new(rect.x0, rect.y0, rect.width(), rect.height())
    }

    /// Set an explicit border color.
    pub fn with_stroke_style(mut self, style: impl Into<String>) -> Self {
        self.stroke_style = Some(style.into());
        self
    }

    /// Flip negative extents so width and height are never below zero.
    fn normalized(mut self) -> Self {
        if self.width < 0.0 {
            self.x += self.width;
            self.width = -self.width;
        }
        if self.height < 0.0 {
            self.y += self.height;
            self.height = -self.height;
        }
        self
    }
}

impl From<Rect> for SlotRect {
    fn from(rect: Rect) -> Self {
        let rect = rect.abs();
        Self::new(rect.x0, rect.y0, rect.width(), rect.height())
    }
}

/// A change published to store subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotEvent {
    Added(SlotId),
    Removed(SlotId),
    SignatureSet(SlotId),
    Cleared,
}

impl SlotEvent {
    /// Short name of the change, as reported to script observers.
    pub fn kind(&self) -> &'static str {
        match self {
            SlotEvent::Added(_) => "added",
            SlotEvent::Removed(_) => "removed",
            SlotEvent::SignatureSet(_) => "signatureSet",
            SlotEvent::Cleared => "cleared",
        }
    }

    /// The slot the change applies to, if it concerns a single slot.
    pub fn slot(&self) -> Option<SlotId> {
        match *self {
            SlotEvent::Added(id) | SlotEvent::Removed(id) | SlotEvent::SignatureSet(id) => Some(id),
            SlotEvent::Cleared => None,
        }
    }
}

type Callback = Rc<RefCell<dyn FnMut(&SlotEvent)>>;

struct Slots {
    items: Vec<SignatureSlot>,
    next_id: SlotId,
}

#[derive(Default)]
struct Subscribers {
    next_key: u64,
    entries: Vec<(u64, Callback)>,
    /// Events waiting for delivery, in mutation order.
    pending: VecDeque<SlotEvent>,
    /// Set while a publish loop is draining `pending`.
    delivering: bool,
}

/// Shared, single-threaded slot list.
///
/// Cloning the store yields another handle to the same list. Every mutation
/// that changes the list publishes a [`SlotEvent`] to all subscribers before
/// returning; the list itself is not borrowed while subscribers run, so they
/// may read it freely. A subscriber may also mutate the store: the resulting
/// event is queued and delivered to everyone once the running callback
/// returns.
#[derive(Clone)]
pub struct SlotStore {
    slots: Rc<RefCell<Slots>>,
    subscribers: Rc<RefCell<Subscribers>>,
}

impl Default for SlotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotStore {
    /// Create an empty store. The first slot gets id 1.
    pub fn new() -> Self {
        Self {
            slots: Rc::new(RefCell::new(Slots {
                items: Vec::new(),
                next_id: 1,
            })),
            subscribers: Rc::new(RefCell::new(Subscribers::default())),
        }
    }

    /// Append a slot and return its new id.
    pub fn add(&self, rect: SlotRect) -> SlotId {
        let rect = rect.normalized();
        let id = {
            let mut slots = self.slots.borrow_mut();
            let id = slots.next_id;
            slots.next_id += 1;
            slots.items.push(SignatureSlot {
                id,
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
                stroke_style: rect.stroke_style,
                signature: None,
            });
            id
        };
        log::debug!("slot {} added", id);
        self.publish(SlotEvent::Added(id));
        id
    }

    /// Remove a slot, keeping the others in order. Returns whether it existed.
    pub fn remove(&self, id: SlotId) -> bool {
        let removed = {
            let mut slots = self.slots.borrow_mut();
            let before = slots.items.len();
            slots.items.retain(|slot| slot.id != id);
            slots.items.len() != before
        };
        if removed {
            log::debug!("slot {} removed", id);
            self.publish(SlotEvent::Removed(id));
        }
        removed
    }

    /// Attach a signature image source to a slot.
    ///
    /// Unknown ids are ignored, as is setting the reference a slot already has.
    pub fn set_signature(&self, id: SlotId, source: impl Into<String>) -> bool {
        let source = source.into();
        let changed = {
            let mut slots = self.slots.borrow_mut();
            match slots.items.iter_mut().find(|slot| slot.id == id) {
                Some(slot) if slot.signature.as_deref() != Some(source.as_str()) => {
                    slot.signature = Some(source);
                    true
                }
                _ => false,
            }
        };
        if changed {
            log::debug!("slot {} signed", id);
            self.publish(SlotEvent::SignatureSet(id));
        }
        changed
    }

    /// Remove every slot. Ids keep counting up afterwards.
    pub fn clear(&self) {
        let had_slots = {
            let mut slots = self.slots.borrow_mut();
            let had_slots = !slots.items.is_empty();
            slots.items.clear();
            had_slots
        };
        if had_slots {
            log::debug!("slots cleared");
            self.publish(SlotEvent::Cleared);
        }
    }

    /// Run `f` against the current list, in insertion order.
    ///
    /// The store must not be mutated from inside `f`.
    pub fn with_slots<R>(&self, f: impl FnOnce(&[SignatureSlot]) -> R) -> R {
        f(&self.slots.borrow().items)
    }

    /// Copy of the current list.
    pub fn snapshot(&self) -> Vec<SignatureSlot> {
        self.slots.borrow().items.clone()
    }

    /// Look up a slot by id.
    pub fn get(&self, id: SlotId) -> Option<SignatureSlot> {
        self.slots
            .borrow()
            .items
            .iter()
            .find(|slot| slot.id == id)
            .cloned()
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.borrow().items.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.borrow().items.is_empty()
    }

    /// Register a callback invoked after every mutation.
    ///
    /// The callback stays registered until the returned [`Subscription`] is dropped.
    pub fn subscribe(&self, callback: impl FnMut(&SlotEvent) + 'static) -> Subscription {
        let mut subscribers = self.subscribers.borrow_mut();
        let key = subscribers.next_key;
        subscribers.next_key += 1;
        let callback: Callback = Rc::new(RefCell::new(callback));
        subscribers.entries.push((key, callback));
        Subscription {
            key,
            subscribers: Rc::downgrade(&self.subscribers),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().entries.len()
    }

    fn publish(&self, event: SlotEvent) {
        {
            let mut subscribers = self.subscribers.borrow_mut();
            subscribers.pending.push_back(event);
            if subscribers.delivering {
                // Nested mutation; the outer loop picks it up.
                return;
            }
            subscribers.delivering = true;
        }

        loop {
            let (event, callbacks) = {
                let mut subscribers = self.subscribers.borrow_mut();
                let Some(event) = subscribers.pending.pop_front() else {
                    subscribers.delivering = false;
                    break;
                };
                let callbacks: Vec<Callback> = subscribers
                    .entries
                    .iter()
                    .map(|(_, callback)| Rc::clone(callback))
                    .collect();
                (event, callbacks)
            };

            for callback in callbacks {
                match callback.try_borrow_mut() {
                    Ok(mut callback) => (&mut *callback)(&event),
                    Err(_) => log::warn!("slot subscriber busy, dropping {:?}", event),
                }
            }
        }
    }
}

/// Keeps a store callback registered. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    key: u64,
    subscribers: Weak<RefCell<Subscribers>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            if let Ok(mut subscribers) = subscribers.try_borrow_mut() {
                subscribers.entries.retain(|(key, _)| *key != self.key);
            }
        }
    }
}
