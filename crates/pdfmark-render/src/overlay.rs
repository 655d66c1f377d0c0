//! Per-page display list of annotation overlays.
//!
//! Annotations are stored in PDF space and mapped to the logical pixels of
//! the page canvas here, so the same set draws correctly at any zoom and
//! page rotation. Drafts are already in logical coordinates.

use crate::renderer::OverlayContext;
use kurbo::{BezPath, Point, Rect, Shape, Size, Stroke};
use pdfmark_core::annotation::{AnnotationSet, RectKind};
use pdfmark_core::color::{DEFAULT_COLOR, Rgb8};
use pdfmark_core::geometry::{Fidelity, PageSpace};
use pdfmark_core::tools::DraftShape;
use peniko::Color;

/// Alpha of highlight fills.
const HIGHLIGHT_ALPHA: u8 = 77;
/// Dash length of draft outlines, in logical pixels.
const DRAFT_DASH: f64 = 4.0;

/// What an overlay item depicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    Rectangle,
    Highlight,
    Polygon,
    Ink,
    Note,
    Draft,
}

/// One path to draw.
#[derive(Debug, Clone)]
pub struct OverlayItem {
    pub kind: OverlayKind,
    /// Geometry in logical page-canvas pixels.
    pub path: BezPath,
    pub stroke: Option<Stroke>,
    pub stroke_color: Color,
    pub fill: Option<Color>,
}

/// Display list of one page.
#[derive(Debug, Clone)]
pub struct PageOverlay {
    pub page: u32,
    pub canvas_size: Size,
    /// `Approximate` while the page viewport is not known yet.
    pub fidelity: Fidelity,
    pub items: Vec<OverlayItem>,
}

impl PageOverlay {
    /// Build the display list for `ctx.page`.
    ///
    /// Drawing order: rectangles and highlights, polygons, ink, notes, then
    /// the draft on top.
    pub fn build(ctx: &OverlayContext<'_>) -> Self {
        let space = &ctx.space;
        let mut items = annotation_items(ctx.annotations, ctx.page, space, ctx.note_marker_size);

        if let Some(draft) = ctx.draft.filter(|draft| draft.page() == ctx.page) {
            let color = parse_color(ctx.draft_color);
            let width = space.pdf_length_to_logical(ctx.draft_stroke_width);
            items.extend(draft_item(draft, color, width));
        }

        Self {
            page: ctx.page,
            canvas_size: space.canvas_size(),
            fidelity: space.fidelity(),
            items,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Bounding box of all items, stroke widths ignored.
    pub fn bounds(&self) -> Option<Rect> {
        self.items
            .iter()
            .map(|item| item.path.bounding_box())
            .reduce(|a, b| a.union(b))
    }
}

/// Convert a stored hex color, falling back to the default color.
pub fn parse_color(hex: &str) -> Color {
    match Rgb8::from_hex(hex).or_else(|| Rgb8::from_hex(DEFAULT_COLOR)) {
        Some(rgb) => Color::from_rgba8(rgb.r, rgb.g, rgb.b, 255),
        None => Color::BLACK,
    }
}

fn with_alpha(color: Color, alpha: u8) -> Color {
    let rgba = color.to_rgba8();
    Color::from_rgba8(rgba.r, rgba.g, rgba.b, alpha)
}

fn annotation_items(
    annotations: &AnnotationSet,
    page: u32,
    space: &PageSpace<'_>,
    note_size: f64,
) -> Vec<OverlayItem> {
    let on_page = annotations.on_page(page);
    let to_logical = |p: Point| space.to_logical(p).point;
    let mut items = Vec::new();

    for rect in on_page.rectangles {
        // Map all four corners; a rotated page turns the box on its side.
        let corners = [
            Point::new(rect.x1, rect.y1),
            Point::new(rect.x2, rect.y1),
            Point::new(rect.x2, rect.y2),
            Point::new(rect.x1, rect.y2),
        ];
        let path = polyline(corners.into_iter().map(to_logical), true);
        let color = parse_color(&rect.color);
        let item = match rect.kind {
            RectKind::Rectangle => OverlayItem {
                kind: OverlayKind::Rectangle,
                path,
                stroke: Some(Stroke::new(space.pdf_length_to_logical(rect.stroke_width))),
                stroke_color: color,
                fill: None,
            },
            RectKind::Highlight => OverlayItem {
                kind: OverlayKind::Highlight,
                path,
                stroke: None,
                stroke_color: color,
                fill: Some(with_alpha(color, HIGHLIGHT_ALPHA)),
            },
        };
        items.push(item);
    }

    for polygon in on_page.polygons {
        items.push(OverlayItem {
            kind: OverlayKind::Polygon,
            path: polyline(polygon.vertices.iter().copied().map(to_logical), true),
            stroke: Some(Stroke::new(space.pdf_length_to_logical(polygon.stroke_width))),
            stroke_color: parse_color(&polygon.color),
            fill: None,
        });
    }

    for stroke in on_page.ink {
        items.push(OverlayItem {
            kind: OverlayKind::Ink,
            path: polyline(stroke.points.iter().copied().map(to_logical), false),
            stroke: Some(Stroke::new(space.pdf_length_to_logical(stroke.stroke_width))),
            stroke_color: parse_color(&stroke.color),
            fill: None,
        });
    }

    for note in on_page.notes {
        let center = to_logical(note.position());
        let marker = Rect::from_center_size(center, Size::new(note_size, note_size));
        items.push(OverlayItem {
            kind: OverlayKind::Note,
            path: marker.to_path(0.1),
            stroke: Some(Stroke::new(1.0)),
            stroke_color: Color::from_rgba8(60, 60, 60, 255),
            fill: Some(parse_color(&note.color)),
        });
    }

    items
}

fn draft_item(draft: &DraftShape, color: Color, width: f64) -> Option<OverlayItem> {
    let dashed = Stroke::new(width).with_dashes(0.0, [DRAFT_DASH, DRAFT_DASH]);
    let item = match draft {
        DraftShape::Box {
            start,
            current,
            kind,
            ..
        } => OverlayItem {
            kind: OverlayKind::Draft,
            path: Rect::from_points(*start, *current).to_path(0.1),
            stroke: Some(dashed),
            stroke_color: color,
            fill: (*kind == RectKind::Highlight).then(|| with_alpha(color, HIGHLIGHT_ALPHA)),
        },
        DraftShape::Polygon {
            vertices, cursor, ..
        } => OverlayItem {
            kind: OverlayKind::Draft,
            // Rubber band from the last vertex to the pointer.
            path: polyline(vertices.iter().copied().chain(*cursor), false),
            stroke: Some(dashed),
            stroke_color: color,
            fill: None,
        },
        DraftShape::Ink { points, .. } => OverlayItem {
            kind: OverlayKind::Draft,
            path: polyline(points.iter().copied(), false),
            stroke: Some(Stroke::new(width)),
            stroke_color: color,
            fill: None,
        },
    };
    (!item.path.elements().is_empty()).then_some(item)
}

fn polyline(points: impl IntoIterator<Item = Point>, closed: bool) -> BezPath {
    let mut path = BezPath::new();
    for (i, point) in points.into_iter().enumerate() {
        if i == 0 {
            path.move_to(point);
        } else {
            path.line_to(point);
        }
    }
    if closed && !path.elements().is_empty() {
        path.close_path();
    }
    path
}
