//! PDFMark Render Library
//!
//! Annotation overlay rendering for PDFMark. Overlays are built as a
//! backend-neutral display list in page-canvas pixels; the bundled backend
//! writes SVG.

pub mod overlay;
mod renderer;
mod svg;

pub use overlay::{OverlayItem, OverlayKind, PageOverlay, parse_color};
pub use renderer::{OverlayContext, RenderResult, Renderer, RendererError};
pub use svg::SvgRenderer;
