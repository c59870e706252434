//! Pointer and touch input, normalized into one gesture protocol.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// Use web_time for WASM compatibility
#[cfg(target_arch = "wasm32")]
pub use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
pub use std::time::Instant;

/// Mouse event in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down { position: Point },
    Move { position: Point },
    Up { position: Point },
    Leave { position: Point },
}

impl PointerEvent {
    /// Client position carried by the event.
    pub fn position(&self) -> Point {
        match *self {
            PointerEvent::Down { position }
            | PointerEvent::Move { position }
            | PointerEvent::Up { position }
            | PointerEvent::Leave { position } => position,
        }
    }
}

/// Touch event phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TouchPhase {
    Start,
    Move,
    End,
    Cancel,
}

/// Touch event in client coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchEvent {
    pub phase: TouchPhase,
    /// Touches still on the surface after this event.
    pub touches: Vec<Point>,
    /// Touches that changed in this event (lifted ones, for end/cancel).
    pub changed: Vec<Point>,
    /// Whether the host allows suppressing the default action.
    pub cancelable: bool,
}

impl TouchEvent {
    pub fn new(phase: TouchPhase, touches: Vec<Point>, changed: Vec<Point>) -> Self {
        Self {
            phase,
            touches,
            changed,
            cancelable: true,
        }
    }

    /// Fingers down, listing every touch now on the surface.
    pub fn start(touches: Vec<Point>) -> Self {
        let changed = touches.last().copied().into_iter().collect();
        Self::new(TouchPhase::Start, touches, changed)
    }

    /// Fingers moved.
    pub fn moved(touches: Vec<Point>) -> Self {
        Self::new(TouchPhase::Move, touches.clone(), touches)
    }

    /// Fingers lifted at `changed`, with `remaining` still down.
    pub fn end(changed: Vec<Point>, remaining: Vec<Point>) -> Self {
        Self::new(TouchPhase::End, remaining, changed)
    }

    /// The host aborted the touch sequence.
    pub fn cancel(changed: Vec<Point>) -> Self {
        Self::new(TouchPhase::Cancel, Vec::new(), changed)
    }

    /// Number of fingers on the surface.
    pub fn touch_count(&self) -> usize {
        self.touches.len()
    }

    /// First active touch, falling back to the first changed one.
    pub fn primary(&self) -> Option<Point> {
        self.touches
            .first()
            .or_else(|| self.changed.first())
            .copied()
    }
}

/// What the host should do with the native event after an engine saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventResponse {
    /// Suppress the event's default action (scrolling, synthesized clicks).
    pub prevent_default: bool,
}

impl EventResponse {
    /// Let the host handle the event normally.
    pub const PASS: Self = Self {
        prevent_default: false,
    };
    /// The engine consumed the event.
    pub const CONSUME: Self = Self {
        prevent_default: true,
    };
}

/// One step of a single-pointer gesture, in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureStep {
    Begin(Point),
    Continue(Point),
    /// The pointer was released, at a known position when the event had one.
    End(Option<Point>),
}

/// The protocol both input adapters feed.
pub trait Gesture {
    fn begin(&mut self, point: Point);
    fn continue_to(&mut self, point: Point);
    fn end(&mut self, point: Option<Point>);

    /// Dispatch a translated step.
    fn apply(&mut self, step: GestureStep) {
        match step {
            GestureStep::Begin(point) => self.begin(point),
            GestureStep::Continue(point) => self.continue_to(point),
            GestureStep::End(point) => self.end(point),
        }
    }
}

/// Mouse adapter: press begins, motion continues, release or leave ends.
pub fn mouse_step(event: &PointerEvent) -> GestureStep {
    match *event {
        PointerEvent::Down { position } => GestureStep::Begin(position),
        PointerEvent::Move { position } => GestureStep::Continue(position),
        PointerEvent::Up { position } | PointerEvent::Leave { position } => {
            GestureStep::End(Some(position))
        }
    }
}

/// Touch adapter: follows the primary finger.
///
/// Returns `None` for start/move events that carry no touch point.
pub fn touch_step(event: &TouchEvent) -> Option<GestureStep> {
    match event.phase {
        TouchPhase::Start => event.primary().map(GestureStep::Begin),
        TouchPhase::Move => event.primary().map(GestureStep::Continue),
        TouchPhase::End | TouchPhase::Cancel => {
            Some(GestureStep::End(event.changed.first().copied()))
        }
    }
}

/// Filters the mouse events browsers synthesize right after touch input.
#[derive(Debug, Clone)]
pub struct CompatMouseFilter {
    cooldown: Duration,
    last_touch: Option<Instant>,
}

impl CompatMouseFilter {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_touch: None,
        }
    }

    /// Record touch activity.
    pub fn touch_seen(&mut self, now: Instant) {
        self.last_touch = Some(now);
    }

    /// Whether a mouse event at `now` came from a real mouse.
    pub fn accept_mouse(&self, now: Instant) -> bool {
        match self.last_touch {
            Some(last) => now.saturating_duration_since(last) >= self.cooldown,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Trace(Vec<GestureStep>);

    impl Gesture for Trace {
        fn begin(&mut self, point: Point) {
            self.0.push(GestureStep::Begin(point));
        }

        fn continue_to(&mut self, point: Point) {
            self.0.push(GestureStep::Continue(point));
        }

        fn end(&mut self, point: Option<Point>) {
            self.0.push(GestureStep::End(point));
        }
    }

    #[test]
    fn test_mouse_steps() {
        let mut trace = Trace::default();
        for event in [
            PointerEvent::Down { position: Point::new(1.0, 1.0) },
            PointerEvent::Move { position: Point::new(2.0, 2.0) },
            PointerEvent::Leave { position: Point::new(3.0, 3.0) },
        ] {
            trace.apply(mouse_step(&event));
        }
        assert_eq!(
            trace.0,
            vec![
                GestureStep::Begin(Point::new(1.0, 1.0)),
                GestureStep::Continue(Point::new(2.0, 2.0)),
                GestureStep::End(Some(Point::new(3.0, 3.0))),
            ]
        );
    }

    #[test]
    fn test_touch_steps_follow_primary_finger() {
        let start = TouchEvent::start(vec![Point::new(5.0, 5.0)]);
        assert_eq!(touch_step(&start), Some(GestureStep::Begin(Point::new(5.0, 5.0))));

        let moved = TouchEvent::moved(vec![Point::new(6.0, 7.0), Point::new(50.0, 50.0)]);
        assert_eq!(touch_step(&moved), Some(GestureStep::Continue(Point::new(6.0, 7.0))));

        let end = TouchEvent::end(vec![Point::new(8.0, 9.0)], Vec::new());
        assert_eq!(touch_step(&end), Some(GestureStep::End(Some(Point::new(8.0, 9.0)))));
    }

    #[test]
    fn test_touch_without_points() {
        let start = TouchEvent::new(TouchPhase::Start, Vec::new(), Vec::new());
        assert_eq!(touch_step(&start), None);

        let cancel = TouchEvent::cancel(Vec::new());
        assert_eq!(touch_step(&cancel), Some(GestureStep::End(None)));
    }

    #[test]
    fn test_primary_falls_back_to_changed() {
        let end = TouchEvent::end(vec![Point::new(4.0, 4.0)], Vec::new());
        assert_eq!(end.primary(), Some(Point::new(4.0, 4.0)));
        assert_eq!(end.touch_count(), 0);
    }

    #[test]
    fn test_compat_mouse_filter() {
        let mut filter = CompatMouseFilter::new(Duration::from_millis(1000));
        let t0 = Instant::now();
        assert!(filter.accept_mouse(t0));

        filter.touch_seen(t0);
        assert!(!filter.accept_mouse(t0 + Duration::from_millis(300)));
        assert!(filter.accept_mouse(t0 + Duration::from_millis(1000)));
    }
}
