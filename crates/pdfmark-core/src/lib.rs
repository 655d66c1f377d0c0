//! PDFMark Core Library
//!
//! Platform-agnostic core of the PDF annotation canvas: coordinate mapping
//! between screen, raster and PDF space, the annotation model, the XFDF-like
//! markup codec, undo history, gesture handling and page render scheduling.

pub mod annotation;
pub mod camera;
pub mod color;
pub mod config;
pub mod document;
pub mod engine;
pub mod geometry;
pub mod history;
pub mod input;
pub mod markup;
pub mod scheduler;
pub mod tools;

#[cfg(test)]
pub(crate) mod test_support;

pub use annotation::{Annotation, AnnotationError, AnnotationSet, RectKind};
pub use camera::Camera;
pub use config::{ConfigError, EngineConfig};
pub use document::{DocumentError, DocumentLoader, PdfDocument, PdfPage, RasterSurface};
pub use engine::{AnnotationEngine, EngineEvent, NotePrompt};
pub use geometry::{Fidelity, Mapped, PageSpace, PageViewport, StandardViewport};
pub use history::History;
pub use input::{KeyEvent, Modifiers, MouseButton, PageHit, PointerEvent, Touch, TouchEvent};
pub use markup::{MarkupError, ParseReport, SkipReason};
pub use scheduler::{RenderRequest, RenderScheduler, RenderedPage};
pub use tools::{DisplayState, DraftShape, GestureController, GestureNoop, ToolKind};
