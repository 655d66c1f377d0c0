//! Pointer, wheel, touch and keyboard input types.

use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};

// Use web_time for WASM compatibility
#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};
#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on Windows/Linux, Cmd on macOS. Either counts.
    pub fn platform(&self) -> bool {
        self.ctrl || self.meta
    }

    /// The modifier that turns wheel scrolling into zooming.
    pub fn precision(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Where a pointer event landed on a page canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageHit {
    /// 1-based page number.
    pub page: u32,
    /// Position in logical pixels relative to the page canvas origin.
    pub position: Point,
    /// Logical (layout) size of the page canvas.
    pub canvas_size: Size,
}

impl PageHit {
    pub fn new(page: u32, position: Point, canvas_size: Size) -> Self {
        Self {
            page,
            position,
            canvas_size,
        }
    }
}

/// Pointer event. `client` is the position in the scroll container's
/// logical pixels; `hit` is set when the pointer is over a page canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        client: Point,
        hit: Option<PageHit>,
        button: MouseButton,
    },
    Move {
        client: Point,
        hit: Option<PageHit>,
    },
    Up {
        client: Point,
        hit: Option<PageHit>,
        button: MouseButton,
    },
    DoubleClick {
        client: Point,
        hit: Option<PageHit>,
    },
    Wheel {
        client: Point,
        delta: Vec2,
        modifiers: Modifiers,
    },
}

/// One active touch point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Touch {
    pub id: u64,
    pub client: Point,
}

impl Touch {
    pub fn new(id: u64, x: f64, y: f64) -> Self {
        Self {
            id,
            client: Point::new(x, y),
        }
    }
}

/// Touch event carrying the touches still active after the change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TouchEvent {
    Start(Vec<Touch>),
    Move(Vec<Touch>),
    End(Vec<Touch>),
}

impl TouchEvent {
    pub fn touches(&self) -> &[Touch] {
        match self {
            TouchEvent::Start(t) | TouchEvent::Move(t) | TouchEvent::End(t) => t,
        }
    }
}

/// Key press with the modifiers held at the time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: String,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            key: key.into(),
            modifiers,
        }
    }
}

/// Double-click detection for hosts that only report raw presses.
#[derive(Debug, Clone)]
pub struct ClickTracker {
    window: Duration,
    distance: f64,
    last_click_time: Option<Instant>,
    last_click_position: Option<Point>,
}

impl ClickTracker {
    pub fn new(window_ms: u64, distance: f64) -> Self {
        Self {
            window: Duration::from_millis(window_ms),
            distance,
            last_click_time: None,
            last_click_position: None,
        }
    }

    /// Register a press; returns true when it completes a double-click.
    pub fn register(&mut self, position: Point) -> bool {
        let now = Instant::now();
        if let (Some(last_time), Some(last_pos)) = (self.last_click_time, self.last_click_position) {
            let elapsed = now.duration_since(last_time);
            if elapsed < self.window && (position - last_pos).hypot() < self.distance {
                // Reset to prevent triple-click being detected as another double-click
                self.reset();
                return true;
            }
        }
        self.last_click_time = Some(now);
        self.last_click_position = Some(position);
        false
    }

    pub fn reset(&mut self) {
        self.last_click_time = None;
        self.last_click_position = None;
    }
}

impl Default for ClickTracker {
    fn default() -> Self {
        Self::new(500, 5.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_modifier() {
        assert!(Modifiers { ctrl: true, ..Default::default() }.platform());
        assert!(Modifiers { meta: true, ..Default::default() }.platform());
        assert!(!Modifiers { shift: true, ..Default::default() }.platform());
    }

    #[test]
    fn test_double_click_detection() {
        let mut tracker = ClickTracker::default();
        let pos = Point::new(100.0, 100.0);
        assert!(!tracker.register(pos));
        assert!(tracker.register(pos));
        // Third click starts a new sequence
        assert!(!tracker.register(pos));
    }

    #[test]
    fn test_double_click_too_far() {
        let mut tracker = ClickTracker::default();
        assert!(!tracker.register(Point::new(100.0, 100.0)));
        assert!(!tracker.register(Point::new(200.0, 200.0)));
    }

    #[test]
    fn test_double_click_window_expired() {
        let mut tracker = ClickTracker::new(0, 5.0);
        let pos = Point::new(1.0, 1.0);
        assert!(!tracker.register(pos));
        assert!(!tracker.register(pos));
    }

    #[test]
    fn test_touch_event_touches() {
        let event = TouchEvent::Move(vec![Touch::new(1, 0.0, 0.0), Touch::new(2, 10.0, 0.0)]);
        assert_eq!(event.touches().len(), 2);
    }
}
