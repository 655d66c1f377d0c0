//! Interface to the external page-render library.
//!
//! The engine never decodes PDF itself. A host plugs in a [`DocumentLoader`]
//! that yields documents, pages, viewports and rasterization. Everything runs
//! on one logical thread, so none of these traits require `Send`.

use crate::geometry::PageViewport;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// Errors reported by the page-render library.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DocumentError {
    #[error("Failed to load document {url}: {reason}")]
    Load { url: String, reason: String },
    #[error("Page {page} out of range (document has {count} pages)")]
    PageOutOfRange { page: u32, count: u32 },
    #[error("Failed to render page {page}: {reason}")]
    Render { page: u32, reason: String },
    #[error("No document loaded")]
    NoDocument,
}

/// Result type for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Opens documents by URL.
pub trait DocumentLoader {
    /// Fetch and parse the document at `url`.
    fn load_document(&self, url: &str) -> BoxFuture<'_, DocumentResult<Box<dyn PdfDocument>>>;
}

/// An opened document.
pub trait PdfDocument {
    /// Number of pages.
    fn page_count(&self) -> u32;

    /// Fetch a page by 1-based number.
    fn get_page(&self, number: u32) -> BoxFuture<'_, DocumentResult<Box<dyn PdfPage>>>;
}

/// One page of an opened document.
pub trait PdfPage {
    /// 1-based page number.
    fn number(&self) -> u32;

    /// Viewport of this page at `scale`.
    fn viewport(&self, scale: f64) -> Arc<dyn PageViewport>;

    /// Rasterize the page into `surface`, drawing with a scale transform of `display_scale`.
    fn render_into<'a>(
        &'a self,
        surface: &'a mut dyn RasterSurface,
        viewport: &'a dyn PageViewport,
        display_scale: f64,
    ) -> BoxFuture<'a, DocumentResult<()>>;
}

/// Pixel surface a page is rasterized into, such as a canvas element.
pub trait RasterSurface {
    /// Size of the pixel backing store.
    fn set_backing_size(&mut self, width: u32, height: u32);

    /// Size the surface occupies in layout (logical pixels).
    fn set_logical_size(&mut self, width: u32, height: u32);
}
