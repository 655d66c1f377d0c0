//! Tool system: turns pointer, wheel, touch and key input into pan, zoom
//! and annotation drafts.

use crate::annotation::{
    Annotation, AnnotationError, InkStroke, Note, Polygon, RectAnnotation, RectKind, generate_id,
};
use crate::camera::Camera;
use crate::config::EngineConfig;
use crate::geometry::{Fidelity, PageSpace};
use crate::input::{ClickTracker, KeyEvent, MouseButton, PageHit, PointerEvent, Touch, TouchEvent};
use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Vertices closer than this (logical pixels) collapse when a polygon is finalized.
const DUPLICATE_VERTEX_TOLERANCE: f64 = 0.5;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolKind {
    #[default]
    Pan,
    Rectangle,
    Highlight,
    Polygon,
    Ink,
    Note,
}

/// Read-only view of the controller's display state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayState {
    pub scale: f64,
    pub current_page: u32,
    pub tool: ToolKind,
    pub color: String,
    pub stroke_width: f64,
}

/// In-progress shape in logical page-canvas coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum DraftShape {
    Box {
        page: u32,
        canvas_size: Size,
        start: Point,
        current: Point,
        kind: RectKind,
    },
    Polygon {
        page: u32,
        canvas_size: Size,
        vertices: Vec<Point>,
        /// Last pointer position, for the rubber-band segment.
        cursor: Option<Point>,
    },
    Ink {
        page: u32,
        canvas_size: Size,
        points: Vec<Point>,
    },
}

impl DraftShape {
    pub fn page(&self) -> u32 {
        match self {
            DraftShape::Box { page, .. }
            | DraftShape::Polygon { page, .. }
            | DraftShape::Ink { page, .. } => *page,
        }
    }

    pub fn canvas_size(&self) -> Size {
        match self {
            DraftShape::Box { canvas_size, .. }
            | DraftShape::Polygon { canvas_size, .. }
            | DraftShape::Ink { canvas_size, .. } => *canvas_size,
        }
    }
}

/// Geometry of a finished gesture, still in logical page-canvas coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletedGeometry {
    Box { a: Point, b: Point, kind: RectKind },
    Polygon(Vec<Point>),
    Ink(Vec<Point>),
    Note { at: Point },
}

/// A gesture that is ready to become an annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedShape {
    pub page: u32,
    pub canvas_size: Size,
    pub geometry: CompletedGeometry,
    pub color: String,
    pub stroke_width: f64,
}

impl CompletedShape {
    /// Convert to a PDF-space annotation through `space`.
    ///
    /// Commits need an exact mapping; the y-flip fallback is only good
    /// enough for drawing previews.
    pub fn into_annotation(
        self,
        space: &PageSpace<'_>,
        text: Option<String>,
    ) -> Result<Annotation, GestureNoop> {
        if space.fidelity() != Fidelity::Exact {
            return Err(GestureNoop::NoViewport(self.page));
        }
        let to_pdf = |p: Point| space.to_pdf(p).point;

        let annotation = match self.geometry {
            CompletedGeometry::Box { a, b, kind } => {
                let prefix = match kind {
                    RectKind::Rectangle => "rect",
                    RectKind::Highlight => "highlight",
                };
                Annotation::Rect(RectAnnotation::from_corners(
                    generate_id(prefix),
                    self.page,
                    to_pdf(a),
                    to_pdf(b),
                    self.color,
                    self.stroke_width,
                    kind,
                ))
            }
            CompletedGeometry::Polygon(vertices) => Annotation::Polygon(Polygon {
                id: generate_id("poly"),
                page: self.page,
                vertices: vertices.into_iter().map(to_pdf).collect(),
                color: self.color,
                stroke_width: self.stroke_width,
            }),
            CompletedGeometry::Ink(points) => Annotation::Ink(InkStroke {
                id: generate_id("ink"),
                page: self.page,
                points: points.into_iter().map(to_pdf).collect(),
                color: self.color,
                stroke_width: self.stroke_width,
            }),
            CompletedGeometry::Note { at } => {
                let at = to_pdf(at);
                Annotation::Note(Note {
                    id: generate_id("note"),
                    page: self.page,
                    x: at.x,
                    y: at.y,
                    color: self.color,
                    text: text.unwrap_or_default(),
                })
            }
        };
        Ok(annotation)
    }
}

/// Gestures that finished without producing anything.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GestureNoop {
    #[error("Polygon needs at least 3 vertices, has {0}")]
    TooFewVertices(usize),
    #[error("Ink stroke needs at least 2 points, has {0}")]
    TooFewPoints(usize),
    #[error("No viewport available for page {0}")]
    NoViewport(u32),
    #[error("Note input cancelled")]
    NoteCancelled,
    #[error(transparent)]
    Rejected(#[from] AnnotationError),
}

/// Result of feeding one input event to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    /// Nothing changed.
    Idle,
    /// Scroll offset changed.
    Scrolled,
    /// The draft changed and the overlay should be redrawn.
    DraftUpdated,
    /// A gesture finished and should be appended.
    Commit(CompletedShape),
    /// A gesture finished without effect.
    Noop(GestureNoop),
    /// A zoom change is pending until the next animation frame.
    ZoomRequested(f64),
    Undo,
    Redo,
    /// The active draft was dropped.
    Cancelled,
}

#[derive(Debug, Clone, Copy)]
struct PanState {
    origin: Point,
    scroll_origin: Vec2,
}

#[derive(Debug, Clone, Copy)]
struct PinchState {
    initial_distance: f64,
    initial_scale: f64,
}

#[derive(Debug, Clone, Copy)]
struct PendingZoom {
    scale: f64,
    focal: Point,
}

/// Transient interaction state: at most one draft and one pan or pinch.
#[derive(Debug, Clone, Default)]
pub struct ToolSession {
    draft: Option<DraftShape>,
    pan: Option<PanState>,
    pinch: Option<PinchState>,
    drawing: bool,
    clicks: ClickTracker,
}

impl ToolSession {
    fn cancel(&mut self) -> bool {
        self.drawing = false;
        self.clicks.reset();
        self.draft.take().is_some()
    }
}

/// Owns the display state and interprets input for the active tool.
#[derive(Debug, Clone)]
pub struct GestureController {
    /// Scroll offset and zoom scale.
    pub camera: Camera,
    tool: ToolKind,
    color: String,
    stroke_width: f64,
    current_page: u32,
    container: Size,
    pending_zoom: Option<PendingZoom>,
    session: ToolSession,
    zoom_step: f64,
    wheel_sensitivity: f64,
    pinch_exponent: f64,
    ink_sample_distance: f64,
}

impl Default for GestureController {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl GestureController {
    pub fn new(config: &EngineConfig) -> Self {
        let session = ToolSession {
            clicks: ClickTracker::new(config.double_click_ms, config.double_click_distance),
            ..Default::default()
        };
        Self {
            camera: Camera::with_bounds(config.initial_scale, config.min_scale, config.max_scale),
            tool: ToolKind::default(),
            color: config.default_color.clone(),
            stroke_width: config.default_stroke_width,
            current_page: 1,
            container: Size::ZERO,
            pending_zoom: None,
            session,
            zoom_step: config.zoom_step,
            wheel_sensitivity: config.wheel_zoom_sensitivity,
            pinch_exponent: config.pinch_exponent,
            ink_sample_distance: config.ink_sample_distance,
        }
    }

    pub fn display_state(&self) -> DisplayState {
        DisplayState {
            scale: self.camera.scale,
            current_page: self.current_page,
            tool: self.tool,
            color: self.color.clone(),
            stroke_width: self.stroke_width,
        }
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn scale(&self) -> f64 {
        self.camera.scale
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Active stroke color as upper-case `#RRGGBB`.
    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn stroke_width(&self) -> f64 {
        self.stroke_width
    }

    pub fn draft(&self) -> Option<&DraftShape> {
        self.session.draft.as_ref()
    }

    /// Whether a two-finger gesture is in progress.
    pub fn is_pinching(&self) -> bool {
        self.session.pinch.is_some()
    }

    /// Whether a pan drag is in progress.
    pub fn is_panning(&self) -> bool {
        self.session.pan.is_some()
    }

    /// Switch tools. Any draft of the previous tool is dropped.
    pub fn set_tool(&mut self, tool: ToolKind) {
        if self.session.cancel() {
            log::debug!("Dropped draft when switching to {tool:?}");
        }
        self.session.pan = None;
        self.tool = tool;
    }

    /// Set the stroke color from a hex string. Returns false if it is malformed.
    pub fn set_color(&mut self, hex: &str) -> bool {
        match crate::color::normalize_hex(hex) {
            Some(color) => {
                self.color = color;
                true
            }
            None => {
                log::warn!("Ignoring malformed color {hex:?}");
                false
            }
        }
    }

    /// Set the stroke width. Returns false for non-positive or non-finite widths.
    pub fn set_stroke_width(&mut self, width: f64) -> bool {
        if width.is_finite() && width > 0.0 {
            self.stroke_width = width;
            true
        } else {
            log::warn!("Ignoring invalid stroke width {width}");
            false
        }
    }

    pub fn set_current_page(&mut self, page: u32) {
        self.current_page = page.max(1);
    }

    /// Size of the scroll container, used as the focal point for button zoom.
    pub fn set_container_size(&mut self, size: Size) {
        self.container = size;
    }

    /// Scale the next animation frame will apply, or the current one.
    pub fn target_scale(&self) -> f64 {
        self.pending_zoom
            .map(|zoom| zoom.scale)
            .unwrap_or(self.camera.scale)
    }

    /// Request a zoom to `scale` around `focal` (container coordinates).
    ///
    /// The request is clamped and coalesced with earlier ones; it takes
    /// effect on the next [`on_animation_frame`](Self::on_animation_frame).
    pub fn commit_scale(&mut self, scale: f64, focal: Point) -> GestureOutcome {
        let Some(scale) = self.camera.clamp_scale(scale) else {
            log::warn!("Ignoring NaN zoom request");
            return GestureOutcome::Idle;
        };
        self.pending_zoom = Some(PendingZoom { scale, focal });
        GestureOutcome::ZoomRequested(scale)
    }

    /// Apply the pending zoom, if any. Returns the new scale when it changed.
    pub fn on_animation_frame(&mut self) -> Option<f64> {
        let zoom = self.pending_zoom.take()?;
        if self.camera.zoom_to(zoom.scale, zoom.focal) {
            log::trace!("Zoom applied: {:.3}", self.camera.scale);
            Some(self.camera.scale)
        } else {
            None
        }
    }

    pub fn zoom_in(&mut self) -> GestureOutcome {
        self.commit_scale(self.target_scale() * self.zoom_step, self.container_center())
    }

    pub fn zoom_out(&mut self) -> GestureOutcome {
        self.commit_scale(self.target_scale() / self.zoom_step, self.container_center())
    }

    fn container_center(&self) -> Point {
        Point::new(self.container.width / 2.0, self.container.height / 2.0)
    }

    /// Drop the active draft.
    pub fn cancel(&mut self) -> GestureOutcome {
        if self.session.cancel() {
            GestureOutcome::Cancelled
        } else {
            GestureOutcome::Idle
        }
    }

    /// Handle a pointer event.
    pub fn pointer(&mut self, event: &PointerEvent) -> GestureOutcome {
        match event {
            PointerEvent::Down { client, hit, button } => self.pointer_down(*client, *hit, *button),
            PointerEvent::Move { client, hit } => self.pointer_move(*client, *hit),
            PointerEvent::Up { hit, .. } => self.pointer_up(*hit),
            PointerEvent::DoubleClick { .. } => self.finalize_polygon(),
            PointerEvent::Wheel {
                client,
                delta,
                modifiers,
            } => {
                if modifiers.precision() {
                    let factor = (-delta.y * self.wheel_sensitivity).exp();
                    self.commit_scale(self.target_scale() * factor, *client)
                } else {
                    self.camera.scroll_by(*delta);
                    GestureOutcome::Scrolled
                }
            }
        }
    }

    fn begin_pan(&mut self, client: Point) {
        self.session.pan = Some(PanState {
            origin: client,
            scroll_origin: self.camera.scroll,
        });
    }

    fn pointer_down(
        &mut self,
        client: Point,
        hit: Option<PageHit>,
        button: MouseButton,
    ) -> GestureOutcome {
        match button {
            MouseButton::Middle => {
                if !self.is_pinching() {
                    self.begin_pan(client);
                }
                return GestureOutcome::Idle;
            }
            MouseButton::Right => return GestureOutcome::Idle,
            MouseButton::Left => {}
        }

        if self.tool == ToolKind::Pan {
            if !self.is_pinching() {
                self.begin_pan(client);
            }
            return GestureOutcome::Idle;
        }

        let Some(hit) = hit else {
            return GestureOutcome::Idle;
        };
        let position = hit.position;

        match self.tool {
            ToolKind::Rectangle | ToolKind::Highlight => {
                let kind = if self.tool == ToolKind::Highlight {
                    RectKind::Highlight
                } else {
                    RectKind::Rectangle
                };
                self.session.draft = Some(DraftShape::Box {
                    page: hit.page,
                    canvas_size: hit.canvas_size,
                    start: position,
                    current: position,
                    kind,
                });
                GestureOutcome::DraftUpdated
            }
            ToolKind::Polygon => {
                match &mut self.session.draft {
                    Some(DraftShape::Polygon { page, vertices, cursor, .. }) if *page == hit.page => {
                        vertices.push(position);
                        *cursor = Some(position);
                    }
                    _ => {
                        self.session.draft = Some(DraftShape::Polygon {
                            page: hit.page,
                            canvas_size: hit.canvas_size,
                            vertices: vec![position],
                            cursor: Some(position),
                        });
                    }
                }
                if self.session.clicks.register(client) {
                    self.finalize_polygon()
                } else {
                    GestureOutcome::DraftUpdated
                }
            }
            ToolKind::Ink => {
                self.session.draft = Some(DraftShape::Ink {
                    page: hit.page,
                    canvas_size: hit.canvas_size,
                    points: vec![position],
                });
                self.session.drawing = true;
                GestureOutcome::DraftUpdated
            }
            ToolKind::Note => GestureOutcome::Commit(CompletedShape {
                page: hit.page,
                canvas_size: hit.canvas_size,
                geometry: CompletedGeometry::Note { at: position },
                color: self.color.clone(),
                stroke_width: self.stroke_width,
            }),
            ToolKind::Pan => GestureOutcome::Idle,
        }
    }

    fn pointer_move(&mut self, client: Point, hit: Option<PageHit>) -> GestureOutcome {
        if let Some(pan) = self.session.pan {
            if self.is_pinching() {
                return GestureOutcome::Idle;
            }
            self.camera.scroll_to(pan.scroll_origin - (client - pan.origin));
            return GestureOutcome::Scrolled;
        }

        let Some(hit) = hit else {
            return GestureOutcome::Idle;
        };
        let drawing = self.session.drawing;
        let sample_distance = self.ink_sample_distance;

        match &mut self.session.draft {
            Some(DraftShape::Box { page, current, .. }) if *page == hit.page => {
                *current = hit.position;
                GestureOutcome::DraftUpdated
            }
            Some(DraftShape::Polygon { page, cursor, .. }) if *page == hit.page => {
                *cursor = Some(hit.position);
                GestureOutcome::DraftUpdated
            }
            Some(DraftShape::Ink { page, points, .. }) if drawing && *page == hit.page => {
                if push_sample(points, hit.position, sample_distance) {
                    GestureOutcome::DraftUpdated
                } else {
                    GestureOutcome::Idle
                }
            }
            _ => GestureOutcome::Idle,
        }
    }

    fn pointer_up(&mut self, hit: Option<PageHit>) -> GestureOutcome {
        if self.session.pan.take().is_some() {
            return GestureOutcome::Idle;
        }

        let color = self.color.clone();
        let stroke_width = self.stroke_width;

        match self.session.draft.take() {
            Some(DraftShape::Box {
                page,
                canvas_size,
                start,
                mut current,
                kind,
            }) => {
                if let Some(hit) = hit.filter(|hit| hit.page == page) {
                    current = hit.position;
                }
                GestureOutcome::Commit(CompletedShape {
                    page,
                    canvas_size,
                    geometry: CompletedGeometry::Box { a: start, b: current, kind },
                    color,
                    stroke_width,
                })
            }
            Some(DraftShape::Ink {
                page,
                canvas_size,
                mut points,
            }) => {
                self.session.drawing = false;
                if let Some(hit) = hit.filter(|hit| hit.page == page) {
                    push_sample(&mut points, hit.position, self.ink_sample_distance);
                }
                if points.len() < 2 {
                    return GestureOutcome::Noop(GestureNoop::TooFewPoints(points.len()));
                }
                GestureOutcome::Commit(CompletedShape {
                    page,
                    canvas_size,
                    geometry: CompletedGeometry::Ink(points),
                    color,
                    stroke_width,
                })
            }
            // Polygons finish on double-click, not on release.
            other => {
                self.session.draft = other;
                GestureOutcome::Idle
            }
        }
    }

    /// Finish the polygon draft. With fewer than 3 distinct vertices the
    /// draft is kept so the user can keep clicking.
    pub fn finalize_polygon(&mut self) -> GestureOutcome {
        let Some(DraftShape::Polygon { vertices, cursor, .. }) = &mut self.session.draft else {
            return GestureOutcome::Idle;
        };
        collapse_duplicates(vertices);
        if vertices.len() < 3 {
            return GestureOutcome::Noop(GestureNoop::TooFewVertices(vertices.len()));
        }
        *cursor = None;

        let Some(DraftShape::Polygon {
            page,
            canvas_size,
            vertices,
            ..
        }) = self.session.draft.take()
        else {
            return GestureOutcome::Idle;
        };
        self.session.clicks.reset();
        GestureOutcome::Commit(CompletedShape {
            page,
            canvas_size,
            geometry: CompletedGeometry::Polygon(vertices),
            color: self.color.clone(),
            stroke_width: self.stroke_width,
        })
    }

    /// Handle a touch event. One finger pans, two fingers pinch-zoom.
    pub fn touch(&mut self, event: &TouchEvent) -> GestureOutcome {
        let touches = event.touches();
        match event {
            TouchEvent::Start(_) => {
                if touches.len() >= 2 {
                    self.session.pan = None;
                    let distance = touch_distance(&touches[0], &touches[1]);
                    if distance > 0.0 {
                        self.session.pinch = Some(PinchState {
                            initial_distance: distance,
                            initial_scale: self.target_scale(),
                        });
                    }
                } else if let [touch] = touches {
                    if self.tool == ToolKind::Pan && !self.is_pinching() {
                        self.begin_pan(touch.client);
                    }
                }
                GestureOutcome::Idle
            }
            TouchEvent::Move(_) => {
                if let (Some(pinch), [a, b, ..]) = (self.session.pinch, touches) {
                    let ratio = touch_distance(a, b) / pinch.initial_distance;
                    let scale = pinch.initial_scale * ratio.powf(self.pinch_exponent);
                    let focal = a.client.midpoint(b.client);
                    return self.commit_scale(scale, focal);
                }
                if let (Some(pan), [touch]) = (self.session.pan, touches) {
                    self.camera
                        .scroll_to(pan.scroll_origin - (touch.client - pan.origin));
                    return GestureOutcome::Scrolled;
                }
                GestureOutcome::Idle
            }
            TouchEvent::End(_) => {
                if touches.len() < 2 {
                    self.session.pinch = None;
                }
                if touches.is_empty() {
                    self.session.pan = None;
                }
                GestureOutcome::Idle
            }
        }
    }

    /// Handle a key press.
    pub fn key(&mut self, event: &KeyEvent) -> GestureOutcome {
        let modifiers = event.modifiers;
        match event.key.to_ascii_lowercase().as_str() {
            "z" if modifiers.platform() && modifiers.shift => GestureOutcome::Redo,
            "z" if modifiers.platform() => GestureOutcome::Undo,
            "y" if modifiers.platform() => GestureOutcome::Redo,
            "escape" => self.cancel(),
            _ => GestureOutcome::Idle,
        }
    }
}

/// Append `point` when it is at least `min_distance` away from the last sample.
fn push_sample(points: &mut Vec<Point>, point: Point, min_distance: f64) -> bool {
    let far_enough = points
        .last()
        .is_none_or(|last| (point - *last).hypot() >= min_distance);
    if far_enough {
        points.push(point);
    }
    far_enough
}

fn collapse_duplicates(vertices: &mut Vec<Point>) {
    vertices.dedup_by(|b, a| (*b - *a).hypot() < DUPLICATE_VERTEX_TOLERANCE);
}

fn touch_distance(a: &Touch, b: &Touch) -> f64 {
    (a.client - b.client).hypot()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::StandardViewport;
    use crate::input::Modifiers;
    use kurbo::Rect;

    const CANVAS: Size = Size::new(612.0, 792.0);

    fn hit(x: f64, y: f64) -> Option<PageHit> {
        Some(PageHit::new(1, Point::new(x, y), CANVAS))
    }

    fn down(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Down {
            client: Point::new(x, y),
            hit: hit(x, y),
            button: MouseButton::Left,
        }
    }

    fn moved(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Move {
            client: Point::new(x, y),
            hit: hit(x, y),
        }
    }

    fn up(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Up {
            client: Point::new(x, y),
            hit: hit(x, y),
            button: MouseButton::Left,
        }
    }

    fn controller(tool: ToolKind) -> GestureController {
        let mut controller = GestureController::default();
        controller.set_tool(tool);
        controller
    }

    #[test]
    fn test_rectangle_gesture_commits() {
        let mut tools = controller(ToolKind::Rectangle);
        assert_eq!(tools.pointer(&down(50.0, 50.0)), GestureOutcome::DraftUpdated);
        assert_eq!(tools.pointer(&moved(30.0, 30.0)), GestureOutcome::DraftUpdated);
        assert!(tools.draft().is_some());

        let GestureOutcome::Commit(shape) = tools.pointer(&up(10.0, 10.0)) else {
            panic!("expected commit");
        };
        assert_eq!(
            shape.geometry,
            CompletedGeometry::Box {
                a: Point::new(50.0, 50.0),
                b: Point::new(10.0, 10.0),
                kind: RectKind::Rectangle
            }
        );
        assert!(tools.draft().is_none());
    }

    #[test]
    fn test_box_converts_to_normalized_pdf_rect() {
        let viewport = StandardViewport::new(Rect::new(0.0, 0.0, 612.0, 792.0), 1.0, 0);
        let space = PageSpace::new(Some(&viewport), CANVAS, 1.0);
        let shape = CompletedShape {
            page: 1,
            canvas_size: CANVAS,
            geometry: CompletedGeometry::Box {
                a: Point::new(50.0, 50.0),
                b: Point::new(10.0, 10.0),
                kind: RectKind::Highlight,
            },
            color: "#E44234".to_string(),
            stroke_width: 2.0,
        };
        let Ok(Annotation::Rect(rect)) = shape.into_annotation(&space, None) else {
            panic!("expected rectangle");
        };
        assert_eq!((rect.x1, rect.y1, rect.x2, rect.y2), (10.0, 742.0, 50.0, 782.0));
        assert_eq!(rect.kind, RectKind::Highlight);
    }

    #[test]
    fn test_commit_requires_viewport() {
        let space = PageSpace::new(None, CANVAS, 1.0);
        let shape = CompletedShape {
            page: 3,
            canvas_size: CANVAS,
            geometry: CompletedGeometry::Note { at: Point::new(1.0, 1.0) },
            color: "#000000".to_string(),
            stroke_width: 1.0,
        };
        assert_eq!(shape.into_annotation(&space, None), Err(GestureNoop::NoViewport(3)));
    }

    #[test]
    fn test_polygon_needs_three_vertices() {
        let mut tools = controller(ToolKind::Polygon);
        tools.pointer(&down(0.0, 0.0));
        tools.pointer(&down(100.0, 0.0));
        let outcome = tools.pointer(&PointerEvent::DoubleClick {
            client: Point::new(100.0, 0.0),
            hit: hit(100.0, 0.0),
        });
        assert_eq!(outcome, GestureOutcome::Noop(GestureNoop::TooFewVertices(2)));
        // Draft persists for continuation.
        assert!(matches!(tools.draft(), Some(DraftShape::Polygon { vertices, .. }) if vertices.len() == 2));
    }

    #[test]
    fn test_polygon_double_click_collapses_duplicates() {
        let mut tools = controller(ToolKind::Polygon);
        tools.pointer(&down(0.0, 0.0));
        tools.pointer(&down(100.0, 0.0));
        tools.pointer(&down(100.0, 100.0));
        // Second press of the double-click lands on the same spot.
        let outcome = tools.pointer(&down(100.0, 100.0));
        let GestureOutcome::Commit(shape) = outcome else {
            panic!("expected commit, got {outcome:?}");
        };
        let CompletedGeometry::Polygon(vertices) = shape.geometry else {
            panic!("expected polygon");
        };
        assert_eq!(vertices.len(), 3);
        assert!(tools.draft().is_none());

        // The host's own double-click event that follows is harmless.
        let outcome = tools.pointer(&PointerEvent::DoubleClick {
            client: Point::new(100.0, 100.0),
            hit: hit(100.0, 100.0),
        });
        assert_eq!(outcome, GestureOutcome::Idle);
    }

    #[test]
    fn test_polygon_rubber_band_follows_pointer() {
        let mut tools = controller(ToolKind::Polygon);
        tools.pointer(&down(0.0, 0.0));
        tools.pointer(&moved(40.0, 60.0));
        assert!(matches!(
            tools.draft(),
            Some(DraftShape::Polygon { cursor: Some(p), .. }) if *p == Point::new(40.0, 60.0)
        ));
        // Releasing the button does not finish a polygon.
        assert_eq!(tools.pointer(&up(40.0, 60.0)), GestureOutcome::Idle);
        assert!(tools.draft().is_some());
    }

    #[test]
    fn test_ink_samples_and_commits() {
        let mut tools = controller(ToolKind::Ink);
        tools.pointer(&down(0.0, 0.0));
        assert_eq!(tools.pointer(&moved(0.2, 0.0)), GestureOutcome::Idle);
        assert_eq!(tools.pointer(&moved(5.0, 0.0)), GestureOutcome::DraftUpdated);
        let GestureOutcome::Commit(shape) = tools.pointer(&up(10.0, 0.0)) else {
            panic!("expected commit");
        };
        assert_eq!(
            shape.geometry,
            CompletedGeometry::Ink(vec![
                Point::new(0.0, 0.0),
                Point::new(5.0, 0.0),
                Point::new(10.0, 0.0)
            ])
        );
    }

    #[test]
    fn test_ink_single_point_discarded() {
        let mut tools = controller(ToolKind::Ink);
        tools.pointer(&down(5.0, 5.0));
        assert_eq!(
            tools.pointer(&up(5.0, 5.0)),
            GestureOutcome::Noop(GestureNoop::TooFewPoints(1))
        );
        assert!(tools.draft().is_none());
    }

    #[test]
    fn test_note_commits_on_press() {
        let mut tools = controller(ToolKind::Note);
        let outcome = tools.pointer(&down(20.0, 30.0));
        assert!(matches!(
            outcome,
            GestureOutcome::Commit(CompletedShape {
                geometry: CompletedGeometry::Note { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_drawing_outside_page_is_ignored() {
        let mut tools = controller(ToolKind::Rectangle);
        let outcome = tools.pointer(&PointerEvent::Down {
            client: Point::new(5.0, 5.0),
            hit: None,
            button: MouseButton::Left,
        });
        assert_eq!(outcome, GestureOutcome::Idle);
        assert!(tools.draft().is_none());
    }

    #[test]
    fn test_pan_moves_scroll() {
        let mut tools = controller(ToolKind::Pan);
        tools.camera.scroll_to(Vec2::new(100.0, 100.0));
        tools.pointer(&down(50.0, 50.0));
        assert!(tools.is_panning());
        assert_eq!(tools.pointer(&moved(40.0, 20.0)), GestureOutcome::Scrolled);
        assert_eq!(tools.camera.scroll, Vec2::new(110.0, 130.0));
        tools.pointer(&up(40.0, 20.0));
        assert!(!tools.is_panning());
    }

    #[test]
    fn test_commit_scale_always_clamped() {
        let mut tools = GestureController::default();
        for requested in [-5.0, 0.0, 0.1, 1.7, 1e9, f64::INFINITY, f64::NEG_INFINITY] {
            tools.commit_scale(requested, Point::ZERO);
            tools.on_animation_frame();
            let scale = tools.scale();
            assert!((0.3..=3.0).contains(&scale), "{requested} -> {scale}");
        }
    }

    #[test]
    fn test_zoom_coalesced_until_frame() {
        let mut tools = GestureController::default();
        tools.commit_scale(1.5, Point::ZERO);
        tools.commit_scale(2.0, Point::ZERO);
        assert!((tools.scale() - 1.0).abs() < f64::EPSILON);
        assert_eq!(tools.on_animation_frame(), Some(2.0));
        assert_eq!(tools.on_animation_frame(), None);
    }

    #[test]
    fn test_zoom_keeps_focal_point_stationary() {
        let mut tools = GestureController::default();
        tools.camera.scroll_to(Vec2::new(200.0, 300.0));
        let focal = Point::new(120.0, 80.0);
        let before = tools.camera.container_to_content(focal);
        tools.commit_scale(2.5, focal);
        tools.on_animation_frame();
        let after = tools.camera.container_to_content(focal);
        assert!((before - after).hypot() < 1e-9);
    }

    #[test]
    fn test_wheel_zoom_needs_modifier() {
        let mut tools = GestureController::default();
        let plain = PointerEvent::Wheel {
            client: Point::ZERO,
            delta: Vec2::new(0.0, 40.0),
            modifiers: Modifiers::default(),
        };
        assert_eq!(tools.pointer(&plain), GestureOutcome::Scrolled);
        assert_eq!(tools.camera.scroll, Vec2::new(0.0, 40.0));

        let zoom = PointerEvent::Wheel {
            client: Point::ZERO,
            delta: Vec2::new(0.0, -100.0),
            modifiers: Modifiers {
                ctrl: true,
                ..Default::default()
            },
        };
        let GestureOutcome::ZoomRequested(scale) = tools.pointer(&zoom) else {
            panic!("expected zoom request");
        };
        assert!(scale > 1.0);
    }

    #[test]
    fn test_pinch_zoom_disables_pan() {
        let mut tools = controller(ToolKind::Pan);
        tools.touch(&TouchEvent::Start(vec![Touch::new(1, 100.0, 100.0)]));
        assert!(tools.is_panning());
        tools.touch(&TouchEvent::Start(vec![
            Touch::new(1, 100.0, 100.0),
            Touch::new(2, 200.0, 100.0),
        ]));
        assert!(tools.is_pinching());
        assert!(!tools.is_panning());

        let outcome = tools.touch(&TouchEvent::Move(vec![
            Touch::new(1, 50.0, 100.0),
            Touch::new(2, 250.0, 100.0),
        ]));
        let expected = 2f64.powf(1.3);
        assert_eq!(outcome, GestureOutcome::ZoomRequested(expected));

        tools.touch(&TouchEvent::End(vec![Touch::new(1, 50.0, 100.0)]));
        assert!(!tools.is_pinching());
    }

    #[test]
    fn test_zoom_buttons_use_step() {
        let mut tools = GestureController::default();
        tools.set_container_size(Size::new(800.0, 600.0));
        tools.zoom_in();
        tools.zoom_in();
        tools.on_animation_frame();
        assert!((tools.scale() - 1.44).abs() < 1e-9);
        tools.zoom_out();
        tools.on_animation_frame();
        assert!((tools.scale() - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_shortcuts() {
        let mut tools = GestureController::default();
        let ctrl = Modifiers {
            ctrl: true,
            ..Default::default()
        };
        let cmd_shift = Modifiers {
            meta: true,
            shift: true,
            ..Default::default()
        };
        assert_eq!(tools.key(&KeyEvent::new("z", ctrl)), GestureOutcome::Undo);
        assert_eq!(tools.key(&KeyEvent::new("Z", cmd_shift)), GestureOutcome::Redo);
        assert_eq!(tools.key(&KeyEvent::new("y", ctrl)), GestureOutcome::Redo);
        assert_eq!(tools.key(&KeyEvent::new("z", Modifiers::default())), GestureOutcome::Idle);
    }

    #[test]
    fn test_escape_and_tool_switch_drop_draft() {
        let mut tools = controller(ToolKind::Polygon);
        tools.pointer(&down(0.0, 0.0));
        assert_eq!(
            tools.key(&KeyEvent::new("Escape", Modifiers::default())),
            GestureOutcome::Cancelled
        );
        assert!(tools.draft().is_none());

        tools.pointer(&down(0.0, 0.0));
        tools.set_tool(ToolKind::Ink);
        assert!(tools.draft().is_none());
    }

    #[test]
    fn test_color_and_width_validation() {
        let mut tools = GestureController::default();
        assert!(tools.set_color("#abc"));
        assert_eq!(tools.display_state().color, "#AABBCC");
        assert!(!tools.set_color("blue"));
        assert_eq!(tools.display_state().color, "#AABBCC");
        assert!(!tools.set_stroke_width(-1.0));
        assert!(tools.set_stroke_width(4.0));
        assert!((tools.display_state().stroke_width - 4.0).abs() < f64::EPSILON);
    }
}
