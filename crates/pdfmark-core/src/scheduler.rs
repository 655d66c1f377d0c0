//! Page render scheduling.
//!
//! Decides which pages need rasterizing, sizes their surfaces for the device
//! display scale, and tags every request with a per-page generation so a
//! slow render can never overwrite a newer one.

use crate::config::EngineConfig;
use crate::document::{DocumentResult, PdfDocument, RasterSurface};
use crate::geometry::PageViewport;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Pages to keep rendered: the current page, its neighbours, the last page,
/// and every page the host reports as visible, all within `1..=page_count`.
///
/// The last page is always included so it never shows up blank when
/// scrolled to without being current.
pub fn render_set(current: u32, page_count: u32, visible: &BTreeSet<u32>) -> BTreeSet<u32> {
    let in_range = |page: &u32| (1..=page_count).contains(page);
    [current.saturating_sub(1), current, current.saturating_add(1), page_count]
        .into_iter()
        .chain(visible.iter().copied())
        .filter(in_range)
        .collect()
}

/// One page to rasterize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    pub page: u32,
    pub scale: f64,
    pub generation: u64,
}

/// Backing-store and layout sizes of a page surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub backing_width: u32,
    pub backing_height: u32,
    pub logical_width: u32,
    pub logical_height: u32,
}

impl SurfaceSize {
    pub fn for_viewport(viewport: &dyn PageViewport, display_scale: f64) -> Self {
        let px = |v: f64| v.ceil().max(0.0) as u32;
        Self {
            backing_width: px(viewport.width() * display_scale),
            backing_height: px(viewport.height() * display_scale),
            logical_width: px(viewport.width()),
            logical_height: px(viewport.height()),
        }
    }
}

/// A finished render.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub request: RenderRequest,
    /// Viewport the page was drawn with; overlays map through it.
    pub viewport: Arc<dyn PageViewport>,
    pub size: SurfaceSize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PlanKey {
    scale: f64,
    current: u32,
    page_count: u32,
}

/// Tracks render generations and visible pages.
#[derive(Debug, Clone)]
pub struct RenderScheduler {
    display_scale: f64,
    min_display_scale: f64,
    max_display_scale: f64,
    visible: BTreeSet<u32>,
    generations: HashMap<u32, u64>,
    last_plan: Option<PlanKey>,
    planned: BTreeSet<u32>,
}

impl Default for RenderScheduler {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl RenderScheduler {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            display_scale: config.min_display_scale,
            min_display_scale: config.min_display_scale,
            max_display_scale: config.max_display_scale,
            visible: BTreeSet::new(),
            generations: HashMap::new(),
            last_plan: None,
            planned: BTreeSet::new(),
        }
    }

    /// Effective display scale factor, already clamped.
    pub fn display_scale(&self) -> f64 {
        self.display_scale
    }

    /// Set the device display scale factor. Clamped to bound surface memory
    /// on very dense displays. A change forces a full re-render.
    pub fn set_display_scale(&mut self, factor: f64) {
        let clamped = if factor.is_finite() {
            factor.clamp(self.min_display_scale, self.max_display_scale)
        } else {
            self.min_display_scale
        };
        if (clamped - self.display_scale).abs() > f64::EPSILON {
            self.display_scale = clamped;
            self.invalidate();
        }
    }

    /// Record whether `page` is currently on screen.
    pub fn set_visible(&mut self, page: u32, visible: bool) {
        if visible {
            self.visible.insert(page);
        } else {
            self.visible.remove(&page);
        }
    }

    /// Forget what was planned so the next [`plan`](Self::plan) re-renders everything.
    pub fn invalidate(&mut self) {
        self.last_plan = None;
        self.planned.clear();
    }

    /// Forget all state, e.g. when a different document is loaded.
    pub fn reset(&mut self) {
        self.invalidate();
        self.visible.clear();
        self.generations.clear();
    }

    /// Latest generation issued for `page`.
    pub fn generation(&self, page: u32) -> u64 {
        self.generations.get(&page).copied().unwrap_or(0)
    }

    /// Requests needed for the given state.
    ///
    /// When scale, current page or page count changed since the last plan,
    /// every page in the render set is requested again. Otherwise only
    /// pages that joined the set (e.g. newly visible) are.
    pub fn plan(&mut self, scale: f64, current: u32, page_count: u32) -> Vec<RenderRequest> {
        let key = PlanKey {
            scale,
            current,
            page_count,
        };
        if self.last_plan != Some(key) {
            self.last_plan = Some(key);
            self.planned.clear();
        }

        let pages = render_set(current, page_count, &self.visible);
        let mut requests = Vec::new();
        for page in pages {
            if !self.planned.insert(page) {
                continue;
            }
            let generation = self.generations.entry(page).or_insert(0);
            *generation += 1;
            requests.push(RenderRequest {
                page,
                scale,
                generation: *generation,
            });
        }
        if !requests.is_empty() {
            log::debug!(
                "Planned {} page render(s) at scale {scale:.2}",
                requests.len()
            );
        }
        requests
    }

    /// Rasterize one requested page into `surface`.
    ///
    /// Sizes the backing store at the display scale while keeping the
    /// layout size at the viewport size.
    pub async fn render(
        &self,
        document: &dyn PdfDocument,
        request: RenderRequest,
        surface: &mut dyn RasterSurface,
    ) -> DocumentResult<RenderedPage> {
        let page = document.get_page(request.page).await?;
        let viewport = page.viewport(request.scale);
        let size = SurfaceSize::for_viewport(viewport.as_ref(), self.display_scale);

        surface.set_backing_size(size.backing_width, size.backing_height);
        surface.set_logical_size(size.logical_width, size.logical_height);
        page.render_into(surface, viewport.as_ref(), self.display_scale)
            .await?;

        Ok(RenderedPage {
            request,
            viewport,
            size,
        })
    }

    /// Whether a finished render is still the newest for its page.
    pub fn accept(&self, rendered: &RenderedPage) -> bool {
        let latest = self.generation(rendered.request.page);
        let fresh = rendered.request.generation == latest;
        if !fresh {
            log::debug!(
                "Discarding stale render of page {} (generation {} < {})",
                rendered.request.page,
                rendered.request.generation,
                latest
            );
        }
        fresh
    }
}
