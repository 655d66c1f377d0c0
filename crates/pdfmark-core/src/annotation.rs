//! Annotation data model.
//!
//! All geometry is stored in PDF user space, never in screen pixels, so
//! annotations stay put under any zoom level or device pixel density.
//! Page numbers are 1-based.

use crate::color::{DEFAULT_COLOR, color_or};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Identifier of an annotation within one set.
pub type AnnotationId = String;

/// Generate a fresh identifier with the given prefix (`rect`, `poly`, ...).
pub fn generate_id(prefix: &str) -> AnnotationId {
    format!("{}-{}", prefix, Uuid::new_v4())
}

/// Reasons an annotation is refused by [`AnnotationSet::append`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnnotationError {
    #[error("Rectangle has zero width or height")]
    ZeroArea,
    #[error("Polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),
    #[error("Ink stroke needs at least 2 points, got {0}")]
    TooFewPoints(usize),
    #[error("Page numbers start at 1")]
    InvalidPage,
    #[error("Geometry contains a non-finite coordinate")]
    NonFinite,
    #[error("Stroke width must be positive, got {0}")]
    InvalidStrokeWidth(f64),
}

/// Whether a box annotation is an outlined rectangle or a translucent highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RectKind {
    #[default]
    Rectangle,
    Highlight,
}

/// Axis-aligned box annotation. Corners satisfy `x1 <= x2` and `y1 <= y2` once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RectAnnotation {
    pub id: AnnotationId,
    pub page: u32,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub color: String,
    pub stroke_width: f64,
    pub kind: RectKind,
}

impl RectAnnotation {
    /// Build from two arbitrary corners; the result is normalized.
    pub fn from_corners(
        id: AnnotationId,
        page: u32,
        a: Point,
        b: Point,
        color: String,
        stroke_width: f64,
        kind: RectKind,
    ) -> Self {
        let mut rect = Self {
            id,
            page,
            x1: a.x,
            y1: a.y,
            x2: b.x,
            y2: b.y,
            color,
            stroke_width,
            kind,
        };
        rect.normalize();
        rect
    }

    /// Swap corners so that `x1 <= x2` and `y1 <= y2`.
    pub fn normalize(&mut self) {
        if self.x1 > self.x2 {
            std::mem::swap(&mut self.x1, &mut self.x2);
        }
        if self.y1 > self.y2 {
            std::mem::swap(&mut self.y1, &mut self.y2);
        }
    }

    pub fn as_rect(&self) -> Rect {
        Rect::new(self.x1, self.y1, self.x2, self.y2)
    }
}

/// Closed polygon annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub id: AnnotationId,
    pub page: u32,
    pub vertices: Vec<Point>,
    pub color: String,
    pub stroke_width: f64,
}

/// Freehand ink stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InkStroke {
    pub id: AnnotationId,
    pub page: u32,
    pub points: Vec<Point>,
    pub color: String,
    pub stroke_width: f64,
}

/// Sticky note anchored at a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: AnnotationId,
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub color: String,
    pub text: String,
}

impl Note {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Any annotation variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Annotation {
    Rect(RectAnnotation),
    Polygon(Polygon),
    Ink(InkStroke),
    Note(Note),
}

impl Annotation {
    pub fn id(&self) -> &str {
        match self {
            Annotation::Rect(r) => &r.id,
            Annotation::Polygon(p) => &p.id,
            Annotation::Ink(i) => &i.id,
            Annotation::Note(n) => &n.id,
        }
    }

    pub fn page(&self) -> u32 {
        match self {
            Annotation::Rect(r) => r.page,
            Annotation::Polygon(p) => p.page,
            Annotation::Ink(i) => i.page,
            Annotation::Note(n) => n.page,
        }
    }

    /// Short human-readable kind name.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Annotation::Rect(r) if r.kind == RectKind::Highlight => "highlight",
            Annotation::Rect(_) => "rectangle",
            Annotation::Polygon(_) => "polygon",
            Annotation::Ink(_) => "ink",
            Annotation::Note(_) => "note",
        }
    }
}

/// Borrowed view of the annotations on one page.
#[derive(Debug, Default)]
pub struct PageAnnotations<'a> {
    pub rectangles: Vec<&'a RectAnnotation>,
    pub polygons: Vec<&'a Polygon>,
    pub ink: Vec<&'a InkStroke>,
    pub notes: Vec<&'a Note>,
}

impl PageAnnotations<'_> {
    pub fn is_empty(&self) -> bool {
        self.rectangles.is_empty() && self.polygons.is_empty() && self.ink.is_empty() && self.notes.is_empty()
    }
}

/// Number of annotations per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotationCounts {
    pub rectangles: usize,
    pub highlights: usize,
    pub polygons: usize,
    pub ink: usize,
    pub notes: usize,
}

/// All annotations of one document.
///
/// Append-only: shapes are validated on the way in and never edited in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationSet {
    /// Rectangles and highlights.
    pub rectangles: Vec<RectAnnotation>,
    pub polygons: Vec<Polygon>,
    pub ink: Vec<InkStroke>,
    pub notes: Vec<Note>,
}

impl AnnotationSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and insert an annotation.
    ///
    /// Rectangles are normalized first, colors are brought to upper-case
    /// `#RRGGBB` and note text loses characters XML cannot carry.
    /// Degenerate shapes are refused and leave the set unchanged.
    pub fn append(&mut self, annotation: Annotation) -> Result<(), AnnotationError> {
        let annotation = validate(annotation)?;
        self.insert(annotation);
        Ok(())
    }

    /// Validate and insert several annotations. If any is refused, none are inserted.
    pub fn append_all(&mut self, annotations: Vec<Annotation>) -> Result<(), AnnotationError> {
        let validated = annotations
            .into_iter()
            .map(validate)
            .collect::<Result<Vec<_>, _>>()?;
        for annotation in validated {
            self.insert(annotation);
        }
        Ok(())
    }

    fn insert(&mut self, annotation: Annotation) {
        match annotation {
            Annotation::Rect(rect) => self.rectangles.push(rect),
            Annotation::Polygon(polygon) => self.polygons.push(polygon),
            Annotation::Ink(stroke) => self.ink.push(stroke),
            Annotation::Note(note) => self.notes.push(note),
        }
    }

    /// Total number of annotations.
    pub fn len(&self) -> usize {
        self.rectangles.len() + self.polygons.len() + self.ink.len() + self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every annotation.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn counts(&self) -> AnnotationCounts {
        let highlights = self
            .rectangles
            .iter()
            .filter(|r| r.kind == RectKind::Highlight)
            .count();
        AnnotationCounts {
            rectangles: self.rectangles.len() - highlights,
            highlights,
            polygons: self.polygons.len(),
            ink: self.ink.len(),
            notes: self.notes.len(),
        }
    }

    /// Annotations on `page`, in drawing order.
    pub fn on_page(&self, page: u32) -> PageAnnotations<'_> {
        PageAnnotations {
            rectangles: self.rectangles.iter().filter(|r| r.page == page).collect(),
            polygons: self.polygons.iter().filter(|p| p.page == page).collect(),
            ink: self.ink.iter().filter(|i| i.page == page).collect(),
            notes: self.notes.iter().filter(|n| n.page == page).collect(),
        }
    }

    /// Serialize the set to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a set from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn validate(annotation: Annotation) -> Result<Annotation, AnnotationError> {
    if annotation.page() == 0 {
        return Err(AnnotationError::InvalidPage);
    }
    Ok(match annotation {
        Annotation::Rect(mut rect) => {
            if ![rect.x1, rect.y1, rect.x2, rect.y2].iter().all(|v| v.is_finite()) {
                return Err(AnnotationError::NonFinite);
            }
            rect.normalize();
            if rect.x2 - rect.x1 <= 0.0 || rect.y2 - rect.y1 <= 0.0 {
                return Err(AnnotationError::ZeroArea);
            }
            check_stroke_width(rect.stroke_width)?;
            rect.color = color_or(Some(&rect.color), DEFAULT_COLOR);
            Annotation::Rect(rect)
        }
        Annotation::Polygon(mut polygon) => {
            if polygon.vertices.len() < 3 {
                return Err(AnnotationError::TooFewVertices(polygon.vertices.len()));
            }
            if !all_finite(&polygon.vertices) {
                return Err(AnnotationError::NonFinite);
            }
            check_stroke_width(polygon.stroke_width)?;
            polygon.color = color_or(Some(&polygon.color), DEFAULT_COLOR);
            Annotation::Polygon(polygon)
        }
        Annotation::Ink(mut stroke) => {
            if stroke.points.len() < 2 {
                return Err(AnnotationError::TooFewPoints(stroke.points.len()));
            }
            if !all_finite(&stroke.points) {
                return Err(AnnotationError::NonFinite);
            }
            check_stroke_width(stroke.stroke_width)?;
            stroke.color = color_or(Some(&stroke.color), DEFAULT_COLOR);
            Annotation::Ink(stroke)
        }
        Annotation::Note(mut note) => {
            if !note.position().is_finite() {
                return Err(AnnotationError::NonFinite);
            }
            note.color = color_or(Some(&note.color), DEFAULT_COLOR);
            note.text = strip_non_xml_chars(&note.text);
            Annotation::Note(note)
        }
    })
}

fn check_stroke_width(width: f64) -> Result<(), AnnotationError> {
    if width.is_finite() && width > 0.0 {
        Ok(())
    } else {
        Err(AnnotationError::InvalidStrokeWidth(width))
    }
}

/// Whether `c` may appear in an XML 1.0 document.
pub fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

/// Drop characters XML 1.0 cannot hold, such as pasted control codes.
pub fn strip_non_xml_chars(text: &str) -> String {
    text.chars().filter(|&c| is_xml_char(c)).collect()
}

fn all_finite(points: &[Point]) -> bool {
    points.iter().all(|p| p.is_finite())
}
