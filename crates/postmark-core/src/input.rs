//! Pointer and touch gesture handling for the infinite grid.
//!
//! A [`GestureTracker`] turns raw pointer/touch events into camera updates:
//! mouse drags and single-touch drags pan by the delta from the drag anchor,
//! the wheel always pans, and two touches pan and pinch-zoom around their
//! midpoint. Gestures that never leave the tap threshold are reported as taps
//! and are not captured, so item-level handlers still see them.

use crate::camera::Camera;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Default total movement (in pixels) below which a gesture is a tap.
pub const TAP_THRESHOLD: f64 = 10.0;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Pointer event type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    /// `over_item` is set when the press landed on an item that handles it.
    Down {
        position: Point,
        button: MouseButton,
        over_item: bool,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    Move {
        position: Point,
    },
    Scroll {
        position: Point,
        delta: Vec2,
    },
}

/// A single active touch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub id: u64,
    pub position: Point,
}

impl TouchPoint {
    pub fn new(id: u64, position: Point) -> Self {
        Self { id, position }
    }
}

/// Touch event type. Each variant carries the touches still down after the event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TouchEvent {
    Start(Vec<TouchPoint>),
    Move(Vec<TouchPoint>),
    End(Vec<TouchPoint>),
    Cancel,
}

/// Current gesture.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    /// Mouse drag; the offset is `origin + (pointer - anchor)`.
    Dragging { anchor: Point, origin: Vec2, travel: f64 },
    /// Single-touch pan tracking the touch centroid.
    TouchPan {
        anchor: Point,
        origin: Vec2,
        travel: f64,
        tap_eligible: bool,
    },
    /// Two-touch pan and pinch-zoom.
    TouchPinch { last_mid: Point, last_distance: f64 },
}

impl GestureState {
    /// Whether any drag or touch gesture is in progress.
    pub fn is_active(&self) -> bool {
        !matches!(self, GestureState::Idle)
    }
}

/// Outcome of one input event.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputResponse {
    /// The camera changed and the visible set must be recomputed.
    pub view_changed: bool,
    /// A tap ended at this screen position and should reach item handlers.
    pub tap: Option<Point>,
    /// The event was consumed by panning and should not propagate.
    pub capture: bool,
}

impl InputResponse {
    fn moved(capture: bool) -> Self {
        Self {
            view_changed: true,
            tap: None,
            capture,
        }
    }

    fn tap(position: Point) -> Self {
        Self {
            view_changed: false,
            tap: Some(position),
            capture: false,
        }
    }
}

/// Gesture state machine bound to a camera.
#[derive(Debug, Clone)]
pub struct GestureTracker {
    state: GestureState,
    /// Multiplier for wheel deltas.
    pub scroll_speed: f64,
    /// Movement below this many pixels counts as a tap.
    pub tap_threshold: f64,
}

impl Default for GestureTracker {
    fn default() -> Self {
        Self::new(1.0, TAP_THRESHOLD)
    }
}

impl GestureTracker {
    pub fn new(scroll_speed: f64, tap_threshold: f64) -> Self {
        Self {
            state: GestureState::Idle,
            scroll_speed,
            tap_threshold,
        }
    }

    /// Current gesture.
    pub fn state(&self) -> &GestureState {
        &self.state
    }

    /// Abort any gesture in progress without touching the camera.
    pub fn cancel(&mut self) {
        if self.state.is_active() {
            log::debug!("Gesture cancelled: {:?}", self.state);
        }
        self.state = GestureState::Idle;
    }

    /// Process a pointer event.
    pub fn handle_pointer(&mut self, camera: &mut Camera, event: PointerEvent) -> InputResponse {
        match event {
            PointerEvent::Down {
                position,
                button,
                over_item,
            } => {
                if button != MouseButton::Left || over_item {
                    return InputResponse::default();
                }
                self.state = GestureState::Dragging {
                    anchor: position,
                    origin: camera.offset,
                    travel: 0.0,
                };
                InputResponse::default()
            }
            PointerEvent::Move { position } => {
                let GestureState::Dragging {
                    anchor,
                    origin,
                    travel,
                } = &mut self.state
                else {
                    return InputResponse::default();
                };
                let delta = position - *anchor;
                *travel = travel.max(delta.hypot());
                camera.offset = *origin + delta;
                InputResponse::moved(*travel >= self.tap_threshold)
            }
            PointerEvent::Up { position, button } => {
                if button != MouseButton::Left {
                    return InputResponse::default();
                }
                let state = std::mem::take(&mut self.state);
                match state {
                    GestureState::Dragging { travel, .. } if travel < self.tap_threshold => {
                        InputResponse::tap(position)
                    }
                    GestureState::Dragging { .. } => InputResponse {
                        capture: true,
                        ..InputResponse::default()
                    },
                    other => {
                        // Touch gestures are not ended by mouse buttons.
                        self.state = other;
                        InputResponse::default()
                    }
                }
            }
            PointerEvent::Scroll { delta, .. } => {
                camera.pan(-delta * self.scroll_speed);
                if let GestureState::Dragging { origin, .. } = &mut self.state {
                    // Keep an ongoing drag relative to the scrolled offset.
                    *origin -= delta * self.scroll_speed;
                }
                InputResponse::moved(true)
            }
        }
    }

    /// Process a touch event.
    pub fn handle_touch(&mut self, camera: &mut Camera, event: TouchEvent) -> InputResponse {
        match event {
            TouchEvent::Start(touches) => {
                match touches.len() {
                    0 => self.state = GestureState::Idle,
                    1 => {
                        self.state = GestureState::TouchPan {
                            anchor: touches[0].position,
                            origin: camera.offset,
                            travel: 0.0,
                            tap_eligible: !matches!(self.state, GestureState::TouchPinch { .. }),
                        };
                    }
                    _ => self.begin_pinch(&touches),
                }
                InputResponse::default()
            }
            TouchEvent::Move(touches) => self.touch_move(camera, &touches),
            TouchEvent::End(remaining) => {
                let state = std::mem::take(&mut self.state);
                match remaining.len() {
                    0 => match state {
                        GestureState::TouchPan {
                            anchor,
                            travel,
                            tap_eligible: true,
                            ..
                        } if travel < self.tap_threshold => InputResponse::tap(anchor),
                        _ => InputResponse::default(),
                    },
                    1 => {
                        // Dropping from a pinch to one finger re-anchors the pan.
                        self.state = GestureState::TouchPan {
                            anchor: remaining[0].position,
                            origin: camera.offset,
                            travel: 0.0,
                            tap_eligible: false,
                        };
                        InputResponse::default()
                    }
                    _ => {
                        self.begin_pinch(&remaining);
                        InputResponse::default()
                    }
                }
            }
            TouchEvent::Cancel => {
                self.state = GestureState::Idle;
                InputResponse::default()
            }
        }
    }

    fn begin_pinch(&mut self, touches: &[TouchPoint]) {
        let (a, b) = (touches[0].position, touches[1].position);
        self.state = GestureState::TouchPinch {
            last_mid: a.midpoint(b),
            last_distance: a.distance(b),
        };
    }

    fn touch_move(&mut self, camera: &mut Camera, touches: &[TouchPoint]) -> InputResponse {
        if touches.is_empty() {
            return InputResponse::default();
        }

        if touches.len() >= 2 {
            let (a, b) = (touches[0].position, touches[1].position);
            let mid = a.midpoint(b);
            let distance = a.distance(b);
            match &mut self.state {
                GestureState::TouchPinch {
                    last_mid,
                    last_distance,
                } => {
                    camera.pan(mid - *last_mid);
                    if *last_distance > 0.0 && distance > 0.0 {
                        camera.zoom_at(mid, distance / *last_distance);
                    }
                    *last_mid = mid;
                    *last_distance = distance;
                    return InputResponse::moved(true);
                }
                _ => {
                    self.begin_pinch(touches);
                    return InputResponse::default();
                }
            }
        }

        let position = centroid(touches);
        match &mut self.state {
            GestureState::TouchPan {
                anchor,
                origin,
                travel,
                tap_eligible,
            } => {
                let delta = position - *anchor;
                *travel = travel.max(delta.hypot());
                camera.offset = *origin + delta;
                let capture = !*tap_eligible || *travel >= self.tap_threshold;
                InputResponse::moved(capture)
            }
            _ => {
                self.state = GestureState::TouchPan {
                    anchor: position,
                    origin: camera.offset,
                    travel: 0.0,
                    tap_eligible: false,
                };
                InputResponse::default()
            }
        }
    }
}

/// Average position of a set of touches.
pub fn centroid(touches: &[TouchPoint]) -> Point {
    if touches.is_empty() {
        return Point::ZERO;
    }
    let sum = touches
        .iter()
        .fold(Vec2::ZERO, |acc, t| acc + t.position.to_vec2());
    (sum / touches.len() as f64).to_point()
}
