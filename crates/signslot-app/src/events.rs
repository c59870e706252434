//! DOM event translation.

use kurbo::Point;
use signslot_core::{PointerEvent, TouchEvent, TouchPhase};
use web_sys::{MouseEvent, TouchList};

fn client_point(event: &MouseEvent) -> Point {
    Point::new(event.client_x() as f64, event.client_y() as f64)
}

/// Translate a mouse event of DOM type `kind`.
pub fn pointer_event(kind: &str, event: &MouseEvent) -> Option<PointerEvent> {
    let position = client_point(event);
    match kind {
        "mousedown" => Some(PointerEvent::Down { position }),
        "mousemove" => Some(PointerEvent::Move { position }),
        "mouseup" => Some(PointerEvent::Up { position }),
        "mouseleave" => Some(PointerEvent::Leave { position }),
        _ => None,
    }
}

fn touch_points(list: &TouchList) -> Vec<Point> {
    (0..list.length())
        .filter_map(|index| list.item(index))
        .map(|touch| Point::new(touch.client_x() as f64, touch.client_y() as f64))
        .collect()
}

/// Translate a touch event of DOM type `kind`.
pub fn touch_event(kind: &str, event: &web_sys::TouchEvent) -> Option<TouchEvent> {
    let phase = match kind {
        "touchstart" => TouchPhase::Start,
        "touchmove" => TouchPhase::Move,
        "touchend" => TouchPhase::End,
        "touchcancel" => TouchPhase::Cancel,
        _ => return None,
    };
    Some(TouchEvent {
        phase,
        touches: touch_points(&event.touches()),
        changed: touch_points(&event.changed_touches()),
        cancelable: event.cancelable(),
    })
}

pub const MOUSE_EVENTS: [&str; 4] = ["mousedown", "mousemove", "mouseup", "mouseleave"];
pub const TOUCH_EVENTS: [&str; 4] = ["touchstart", "touchmove", "touchend", "touchcancel"];
