//! SVG overlay renderer.

use crate::overlay::{OverlayItem, PageOverlay};
use crate::renderer::{OverlayContext, RenderResult, Renderer, RendererError};
use peniko::Color;
use std::fmt::Write;

/// Renders page overlays as standalone `<svg>` documents.
#[derive(Debug, Default)]
pub struct SvgRenderer {
    output: String,
}

impl SvgRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// SVG produced by the last [`build_scene`](Renderer::build_scene).
    pub fn svg(&self) -> &str {
        &self.output
    }

    pub fn into_svg(self) -> String {
        self.output
    }

    /// Write `overlay` as an SVG document sized to its canvas.
    pub fn render_overlay(&mut self, overlay: &PageOverlay) -> RenderResult<()> {
        let size = overlay.canvas_size;
        if !(size.width > 0.0 && size.height > 0.0) {
            return Err(RendererError::EmptyCanvas(size));
        }

        let mut out = String::new();
        write_svg(&mut out, overlay).map_err(|e| RendererError::RenderFailed(e.to_string()))?;
        log::trace!(
            "Rendered {} overlay item(s) for page {}",
            overlay.items.len(),
            overlay.page
        );
        self.output = out;
        Ok(())
    }
}

impl Renderer for SvgRenderer {
    fn build_scene(&mut self, ctx: &OverlayContext) -> RenderResult<()> {
        self.render_overlay(&PageOverlay::build(ctx))
    }
}

fn write_svg(out: &mut String, overlay: &PageOverlay) -> std::fmt::Result {
    let size = overlay.canvas_size;
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" data-page="{page}">"#,
        w = size.width,
        h = size.height,
        page = overlay.page
    )?;
    for item in &overlay.items {
        write_item(out, item)?;
    }
    writeln!(out, "</svg>")
}

fn write_item(out: &mut String, item: &OverlayItem) -> std::fmt::Result {
    write!(out, r#"  <path d="{}""#, item.path.to_svg())?;

    match item.fill {
        Some(fill) => write_paint(out, "fill", fill)?,
        None => write!(out, r#" fill="none""#)?,
    }

    match &item.stroke {
        Some(stroke) => {
            write_paint(out, "stroke", item.stroke_color)?;
            write!(out, r#" stroke-width="{}""#, stroke.width)?;
            if !stroke.dash_pattern.is_empty() {
                let dashes: Vec<String> = stroke.dash_pattern.iter().map(f64::to_string).collect();
                write!(out, r#" stroke-dasharray="{}""#, dashes.join(" "))?;
            }
            write!(out, r#" stroke-linecap="round" stroke-linejoin="round""#)?;
        }
        None => write!(out, r#" stroke="none""#)?,
    }

    writeln!(out, " />")
}

/// Write `{attr}="#RRGGBB"` plus an opacity attribute when translucent.
fn write_paint(out: &mut String, attr: &str, color: Color) -> std::fmt::Result {
    let rgba = color.to_rgba8();
    write!(out, r##" {attr}="#{:02X}{:02X}{:02X}""##, rgba.r, rgba.g, rgba.b)?;
    if rgba.a < 255 {
        write!(out, r#" {attr}-opacity="{:.3}""#, f64::from(rgba.a) / 255.0)?;
    }
    Ok(())
}
