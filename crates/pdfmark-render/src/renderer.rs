//! Renderer trait abstraction.

use kurbo::Size;
use pdfmark_core::annotation::AnnotationSet;
use pdfmark_core::color::DEFAULT_COLOR;
use pdfmark_core::engine::AnnotationEngine;
use pdfmark_core::geometry::PageSpace;
use pdfmark_core::tools::DraftShape;
use peniko::Color;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Page canvas has no area: {0:?}")]
    EmptyCanvas(Size),
    #[error("Render failed: {0}")]
    RenderFailed(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Everything needed to draw the overlay of one page.
#[derive(Debug, Clone, Copy)]
pub struct OverlayContext<'a> {
    /// 1-based page number.
    pub page: u32,
    /// Coordinate spaces of the page canvas.
    pub space: PageSpace<'a>,
    /// Annotations of the whole document; only `page` is drawn.
    pub annotations: &'a AnnotationSet,
    /// In-progress shape, drawn when it belongs to `page`.
    pub draft: Option<&'a DraftShape>,
    /// Stroke color for the draft, as a hex string.
    pub draft_color: &'a str,
    /// Stroke width for the draft, in PDF units.
    pub draft_stroke_width: f64,
    /// Note marker edge length in logical pixels.
    pub note_marker_size: f64,
}

impl<'a> OverlayContext<'a> {
    /// Create a context for `page` with no draft.
    pub fn new(page: u32, space: PageSpace<'a>, annotations: &'a AnnotationSet) -> Self {
        Self {
            page,
            space,
            annotations,
            draft: None,
            draft_color: DEFAULT_COLOR,
            draft_stroke_width: 2.0,
            note_marker_size: 16.0,
        }
    }

    /// Context for `page` of an engine, including its draft and display style.
    ///
    /// `canvas` is the logical layout size of the page canvas.
    pub fn from_engine(engine: &'a AnnotationEngine, page: u32, canvas: Size) -> Self {
        let controller = engine.controller();
        Self::new(page, engine.page_space(page, canvas), engine.annotations())
            .with_draft(engine.draft())
            .with_draft_style(controller.color(), controller.stroke_width())
    }

    /// Set the draft shape.
    pub fn with_draft(mut self, draft: Option<&'a DraftShape>) -> Self {
        self.draft = draft;
        self
    }

    /// Set the draft stroke color and width.
    pub fn with_draft_style(mut self, color: &'a str, stroke_width: f64) -> Self {
        self.draft_color = color;
        self.draft_stroke_width = stroke_width;
        self
    }
}

/// Trait for overlay rendering backends.
pub trait Renderer {
    /// Draw the overlay of one page.
    fn build_scene(&mut self, ctx: &OverlayContext) -> RenderResult<()>;

    /// Color used to clear the overlay before drawing.
    fn background_color(&self) -> Color {
        Color::TRANSPARENT
    }
}
