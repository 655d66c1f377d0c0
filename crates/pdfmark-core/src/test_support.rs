//! In-memory stand-ins for the page-render library, used by unit tests.

use crate::document::{
    BoxFuture, DocumentError, DocumentLoader, DocumentResult, PdfDocument, PdfPage, RasterSurface,
};
use crate::geometry::{PageViewport, StandardViewport};
use kurbo::{Point, Rect};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

pub const LETTER: Rect = Rect::new(0.0, 0.0, 612.0, 792.0);

/// Loader serving one fake document for any URL, or failing for URLs containing "missing".
#[derive(Debug, Default)]
pub struct FakeLoader {
    pub page_count: u32,
    pub rotation: i32,
    /// Shared log of every page render, as `(page, scale)`.
    pub renders: Rc<RefCell<Vec<(u32, f64)>>>,
}

impl FakeLoader {
    pub fn new(page_count: u32) -> Self {
        Self {
            page_count,
            ..Default::default()
        }
    }
}

impl DocumentLoader for FakeLoader {
    fn load_document(&self, url: &str) -> BoxFuture<'_, DocumentResult<Box<dyn PdfDocument>>> {
        let url = url.to_string();
        Box::pin(async move {
            if url.contains("missing") {
                return Err(DocumentError::Load {
                    url,
                    reason: "not found".to_string(),
                });
            }
            Ok(Box::new(FakeDocument {
                page_count: self.page_count,
                rotation: self.rotation,
                renders: Rc::clone(&self.renders),
            }) as Box<dyn PdfDocument>)
        })
    }
}

#[derive(Debug, Default)]
pub struct FakeDocument {
    pub page_count: u32,
    pub rotation: i32,
    pub renders: Rc<RefCell<Vec<(u32, f64)>>>,
}

impl PdfDocument for FakeDocument {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn get_page(&self, number: u32) -> BoxFuture<'_, DocumentResult<Box<dyn PdfPage>>> {
        Box::pin(async move {
            if number == 0 || number > self.page_count {
                return Err(DocumentError::PageOutOfRange {
                    page: number,
                    count: self.page_count,
                });
            }
            Ok(Box::new(FakePage {
                number,
                rotation: self.rotation,
                renders: Rc::clone(&self.renders),
            }) as Box<dyn PdfPage>)
        })
    }
}

#[derive(Debug)]
pub struct FakePage {
    number: u32,
    rotation: i32,
    renders: Rc<RefCell<Vec<(u32, f64)>>>,
}

impl PdfPage for FakePage {
    fn number(&self) -> u32 {
        self.number
    }

    fn viewport(&self, scale: f64) -> Arc<dyn PageViewport> {
        Arc::new(StandardViewport::new(LETTER, scale, self.rotation))
    }

    fn render_into<'a>(
        &'a self,
        _surface: &'a mut dyn RasterSurface,
        viewport: &'a dyn PageViewport,
        _display_scale: f64,
    ) -> BoxFuture<'a, DocumentResult<()>> {
        Box::pin(async move {
            self.renders.borrow_mut().push((self.number, viewport.scale()));
            Ok(())
        })
    }
}

/// Surface that records the sizes it was given.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FakeSurface {
    pub backing: (u32, u32),
    pub logical: (u32, u32),
}

impl RasterSurface for FakeSurface {
    fn set_backing_size(&mut self, width: u32, height: u32) {
        self.backing = (width, height);
    }

    fn set_logical_size(&mut self, width: u32, height: u32) {
        self.logical = (width, height);
    }
}

/// Viewport whose render space equals PDF space.
#[derive(Debug, Clone, Copy)]
pub struct IdentityViewport {
    pub width: f64,
    pub height: f64,
}

impl PageViewport for IdentityViewport {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn scale(&self) -> f64 {
        1.0
    }

    fn rotation(&self) -> u16 {
        0
    }

    fn to_pdf_point(&self, point: Point) -> Point {
        point
    }

    fn to_viewport_point(&self, point: Point) -> Point {
        point
    }
}
