//! Coordinate mapping between on-screen logical pixels, device raster pixels
//! and PDF user space.
//!
//! Annotations are always stored in PDF user space. Pointer input arrives in
//! logical pixels relative to a page canvas, whose layout size may differ from
//! the viewport size it was rendered at; [`PageSpace`] normalizes that mismatch
//! and then delegates to the page viewport, which knows about page rotation.

use kurbo::{Affine, Point, Rect, Size};

/// Per-page, per-scale conversion between PDF space and render space.
///
/// Owned by the page-render library; the engine only reads it.
pub trait PageViewport: std::fmt::Debug {
    /// Render-space width in logical pixels.
    fn width(&self) -> f64;
    /// Render-space height in logical pixels.
    fn height(&self) -> f64;
    /// Zoom scale this viewport was computed for.
    fn scale(&self) -> f64;
    /// Page rotation in degrees (0, 90, 180 or 270).
    fn rotation(&self) -> u16;
    /// Map a render-space point to PDF user space.
    fn to_pdf_point(&self, point: Point) -> Point;
    /// Map a PDF user-space point to render space.
    fn to_viewport_point(&self, point: Point) -> Point;
}

/// Viewport computed from a page view box, a scale and a page rotation.
///
/// Render space has its origin at the top-left corner with y growing
/// downwards; PDF space has y growing upwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardViewport {
    scale: f64,
    rotation: u16,
    width: f64,
    height: f64,
    transform: Affine,
}

impl StandardViewport {
    /// Build a viewport for `view_box` (PDF units) at `scale`, rotated clockwise by `rotation` degrees.
    ///
    /// Rotations that are not a multiple of 90 are treated as 0.
    pub fn new(view_box: Rect, scale: f64, rotation: i32) -> Self {
        let rotation = normalize_rotation(rotation);
        let (a, b, c, d) = match rotation {
            90 => (0.0, 1.0, 1.0, 0.0),
            180 => (-1.0, 0.0, 0.0, 1.0),
            270 => (0.0, -1.0, -1.0, 0.0),
            _ => (1.0, 0.0, 0.0, -1.0),
        };

        let view_box = view_box.abs();
        let center = view_box.center();
        let (offset_x, offset_y, width, height) = if a == 0.0 {
            (
                (center.y - view_box.y0).abs() * scale,
                (center.x - view_box.x0).abs() * scale,
                view_box.height() * scale,
                view_box.width() * scale,
            )
        } else {
            (
                (center.x - view_box.x0).abs() * scale,
                (center.y - view_box.y0).abs() * scale,
                view_box.width() * scale,
                view_box.height() * scale,
            )
        };

        let transform = Affine::new([
            a * scale,
            b * scale,
            c * scale,
            d * scale,
            offset_x - a * scale * center.x - c * scale * center.y,
            offset_y - b * scale * center.x - d * scale * center.y,
        ]);

        Self {
            scale,
            rotation,
            width,
            height,
            transform,
        }
    }
}

impl PageViewport for StandardViewport {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn scale(&self) -> f64 {
        self.scale
    }

    fn rotation(&self) -> u16 {
        self.rotation
    }

    fn to_pdf_point(&self, point: Point) -> Point {
        self.transform.inverse() * point
    }

    fn to_viewport_point(&self, point: Point) -> Point {
        self.transform * point
    }
}

fn normalize_rotation(rotation: i32) -> u16 {
    let normalized = rotation.rem_euclid(360);
    if normalized % 90 != 0 {
        log::warn!("Unsupported page rotation {rotation}, treating as 0");
        return 0;
    }
    // rem_euclid keeps the value in 0..360
    normalized as u16
}

/// How faithful a mapped point is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fidelity {
    /// Computed through the page viewport (rotation aware).
    Exact,
    /// Computed with the linear y-flip fallback because no viewport was available.
    /// Wrong for rotated pages.
    Approximate,
}

/// A point produced by a [`PageSpace`] mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mapped {
    pub point: Point,
    pub fidelity: Fidelity,
}

impl Mapped {
    pub fn is_exact(&self) -> bool {
        self.fidelity == Fidelity::Exact
    }
}

/// The coordinate spaces of one page canvas.
#[derive(Debug, Clone, Copy)]
pub struct PageSpace<'a> {
    viewport: Option<&'a dyn PageViewport>,
    canvas: Size,
    scale: f64,
}

impl<'a> PageSpace<'a> {
    /// `canvas` is the logical (layout) size of the page canvas, `scale` the
    /// current zoom used by the fallback when `viewport` is missing.
    pub fn new(viewport: Option<&'a dyn PageViewport>, canvas: Size, scale: f64) -> Self {
        Self {
            viewport,
            canvas,
            scale,
        }
    }

    /// Whether mappings go through a real viewport.
    pub fn fidelity(&self) -> Fidelity {
        if self.viewport.is_some() {
            Fidelity::Exact
        } else {
            Fidelity::Approximate
        }
    }

    pub fn canvas_size(&self) -> Size {
        self.canvas
    }

    /// Ratio between viewport size and canvas layout size on each axis.
    fn canvas_factors(&self, viewport: &dyn PageViewport) -> (f64, f64) {
        let factor = |extent: f64, canvas: f64| {
            if canvas > 0.0 && extent > 0.0 {
                extent / canvas
            } else {
                1.0
            }
        };
        (
            factor(viewport.width(), self.canvas.width),
            factor(viewport.height(), self.canvas.height),
        )
    }

    fn fallback_scale(&self) -> f64 {
        if self.scale.is_finite() && self.scale > 0.0 {
            self.scale
        } else {
            1.0
        }
    }

    /// Map a logical canvas point to PDF user space.
    pub fn to_pdf(&self, logical: Point) -> Mapped {
        match self.viewport {
            Some(viewport) => {
                let (kx, ky) = self.canvas_factors(viewport);
                Mapped {
                    point: viewport.to_pdf_point(Point::new(logical.x * kx, logical.y * ky)),
                    fidelity: Fidelity::Exact,
                }
            }
            None => {
                let scale = self.fallback_scale();
                Mapped {
                    point: Point::new(logical.x / scale, (self.canvas.height - logical.y) / scale),
                    fidelity: Fidelity::Approximate,
                }
            }
        }
    }

    /// Map a PDF user-space point to logical canvas space.
    pub fn to_logical(&self, pdf: Point) -> Mapped {
        match self.viewport {
            Some(viewport) => {
                let (kx, ky) = self.canvas_factors(viewport);
                let p = viewport.to_viewport_point(pdf);
                Mapped {
                    point: Point::new(p.x / kx, p.y / ky),
                    fidelity: Fidelity::Exact,
                }
            }
            None => {
                let scale = self.fallback_scale();
                Mapped {
                    point: Point::new(pdf.x * scale, self.canvas.height - pdf.y * scale),
                    fidelity: Fidelity::Approximate,
                }
            }
        }
    }

    /// Logical length of a PDF-space length (e.g. a stroke width).
    pub fn pdf_length_to_logical(&self, length: f64) -> f64 {
        let origin = self.to_logical(Point::ZERO).point;
        let end = self.to_logical(Point::new(length, 0.0)).point;
        (end - origin).hypot()
    }
}

/// Map a logical point to device raster pixels.
pub fn logical_to_raster(point: Point, display_scale: f64) -> Point {
    Point::new(point.x * display_scale, point.y * display_scale)
}

/// Map a device raster point back to logical pixels.
pub fn raster_to_logical(point: Point, display_scale: f64) -> Point {
    if display_scale <= 0.0 {
        return point;
    }
    Point::new(point.x / display_scale, point.y / display_scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-3;

    fn letter(scale: f64, rotation: i32) -> StandardViewport {
        StandardViewport::new(Rect::new(0.0, 0.0, 612.0, 792.0), scale, rotation)
    }

    fn assert_close(a: Point, b: Point) {
        assert!((a.x - b.x).abs() < TOLERANCE, "{a:?} != {b:?}");
        assert!((a.y - b.y).abs() < TOLERANCE, "{a:?} != {b:?}");
    }

    #[test]
    fn test_unrotated_viewport_flips_y() {
        let viewport = letter(1.0, 0);
        assert_close(viewport.to_viewport_point(Point::new(0.0, 0.0)), Point::new(0.0, 792.0));
        assert_close(viewport.to_viewport_point(Point::new(612.0, 792.0)), Point::new(612.0, 0.0));
        assert!((viewport.width() - 612.0).abs() < f64::EPSILON);
        assert!((viewport.height() - 792.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rotated_viewport_swaps_axes() {
        let viewport = letter(1.0, 90);
        assert_close(viewport.to_viewport_point(Point::new(100.0, 50.0)), Point::new(50.0, 100.0));
        assert!((viewport.width() - 792.0).abs() < f64::EPSILON);
        assert!((viewport.height() - 612.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rotation_normalized() {
        assert_eq!(letter(1.0, -90).rotation(), 270);
        assert_eq!(letter(1.0, 450).rotation(), 90);
        assert_eq!(letter(1.0, 45).rotation(), 0);
    }

    #[test]
    fn test_viewport_roundtrip_all_rotations() {
        for rotation in [0, 90, 180, 270] {
            for scale in [0.3, 1.0, 3.0] {
                let viewport = letter(scale, rotation);
                let pdf = Point::new(123.5, 456.25);
                let back = viewport.to_pdf_point(viewport.to_viewport_point(pdf));
                assert_close(back, pdf);
            }
        }
    }

    #[test]
    fn test_fallback_roundtrip() {
        for scale in [0.3, 1.0, 3.0] {
            let space = PageSpace::new(None, Size::new(612.0 * scale, 792.0 * scale), scale);
            for p in [Point::new(0.0, 0.0), Point::new(10.5, 20.25), Point::new(300.0, 700.0)] {
                let pdf = space.to_pdf(p);
                assert_eq!(pdf.fidelity, Fidelity::Approximate);
                assert_close(space.to_logical(pdf.point).point, p);
            }
        }
    }

    #[test]
    fn test_viewport_space_roundtrip_with_css_mismatch() {
        for rotation in [0, 90, 180, 270] {
            for scale in [0.3, 1.0, 3.0] {
                let viewport = letter(scale, rotation);
                // Canvas laid out at a different size than the viewport.
                let canvas = Size::new(viewport.width() * 0.8, viewport.height() * 1.25);
                let space = PageSpace::new(Some(&viewport), canvas, scale);
                let p = Point::new(42.0, 17.5);
                let pdf = space.to_pdf(p);
                assert!(pdf.is_exact());
                assert_close(space.to_logical(pdf.point).point, p);
            }
        }
    }

    #[test]
    fn test_canvas_factor_applied() {
        let viewport = letter(1.0, 0);
        // Canvas drawn at half size: logical (306, 396) is the page center.
        let space = PageSpace::new(Some(&viewport), Size::new(306.0, 396.0), 1.0);
        assert_close(space.to_pdf(Point::new(153.0, 198.0)).point, Point::new(306.0, 396.0));
    }

    #[test]
    fn test_degenerate_canvas_does_not_divide_by_zero() {
        let viewport = letter(1.0, 0);
        let space = PageSpace::new(Some(&viewport), Size::ZERO, 1.0);
        let pdf = space.to_pdf(Point::new(10.0, 10.0)).point;
        assert!(pdf.x.is_finite() && pdf.y.is_finite());
    }

    #[test]
    fn test_pdf_length_to_logical() {
        let viewport = letter(2.0, 90);
        let space = PageSpace::new(Some(&viewport), Size::new(viewport.width(), viewport.height()), 2.0);
        assert!((space.pdf_length_to_logical(3.0) - 6.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_raster_roundtrip() {
        let p = Point::new(12.0, 7.0);
        let raster = logical_to_raster(p, 2.0);
        assert_close(raster, Point::new(24.0, 14.0));
        assert_close(raster_to_logical(raster, 2.0), p);
    }
}
