//! PDFMark Application
//!
//! Command-line shell around the annotation engine: reads XFDF markup and
//! writes it back normalized, as JSON, or as a page overlay in SVG.

mod app;
mod shortcuts;

pub use app::{App, AppError, Cli, OutputMode};
pub use shortcuts::{Shortcut, ShortcutRegistry};
