//! The annotation engine: the single object a UI shell talks to.
//!
//! It owns the annotation set, its history, the gesture controller and the
//! render scheduler, and wires them together. Failures never escape as
//! panics; they degrade to "nothing rendered" or "nothing added".

use crate::annotation::{AnnotationId, AnnotationSet};
use crate::config::{ConfigError, EngineConfig};
use crate::document::{DocumentError, DocumentLoader, DocumentResult, PdfDocument, RasterSurface};
use crate::geometry::{Fidelity, PageSpace, PageViewport};
use crate::history::History;
use crate::input::{KeyEvent, PointerEvent, TouchEvent};
use crate::markup::{self, DecodeDefaults, MarkupError, SkippedElement};
use crate::scheduler::{RenderRequest, RenderScheduler};
use crate::tools::{
    CompletedGeometry, CompletedShape, DisplayState, DraftShape, GestureController, GestureNoop,
    GestureOutcome, ToolKind,
};
use kurbo::{Point, Size};
use std::collections::HashMap;
use std::sync::Arc;

/// Asks the user for the text of a new note.
pub trait NotePrompt {
    /// Return the note text, or `None` if the user cancelled.
    /// An empty string still creates a note.
    fn prompt_note_text(&mut self, page: u32, at: Point) -> Option<String>;
}

/// Prompt that always answers with empty text.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyNotePrompt;

impl NotePrompt for EmptyNotePrompt {
    fn prompt_note_text(&mut self, _page: u32, _at: Point) -> Option<String> {
        Some(String::new())
    }
}

/// What an input event did.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Unchanged,
    Scrolled,
    DraftChanged,
    /// An annotation was appended and recorded in history.
    Added(AnnotationId),
    /// A gesture finished without adding anything.
    Ignored(GestureNoop),
    /// A zoom is waiting for the next animation frame.
    ZoomPending(f64),
    /// Undo or redo replaced the annotation set.
    HistoryChanged,
    Cancelled,
}

/// PDF annotation canvas engine.
pub struct AnnotationEngine {
    config: EngineConfig,
    loader: Box<dyn DocumentLoader>,
    document: Option<Box<dyn PdfDocument>>,
    annotations: AnnotationSet,
    history: History<AnnotationSet>,
    controller: GestureController,
    scheduler: RenderScheduler,
    /// Latest accepted viewport per page. Kept until a newer render replaces it.
    viewports: HashMap<u32, Arc<dyn PageViewport>>,
    note_prompt: Box<dyn NotePrompt>,
}

impl std::fmt::Debug for AnnotationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationEngine")
            .field("page_count", &self.page_count())
            .field("annotations", &self.annotations.len())
            .field("history", &self.history.len())
            .field("display", &self.controller.display_state())
            .finish_non_exhaustive()
    }
}

impl AnnotationEngine {
    /// Create an engine. The configuration is validated first.
    pub fn new(config: EngineConfig, loader: Box<dyn DocumentLoader>) -> Result<Self, ConfigError> {
        config.validate()?;
        let annotations = AnnotationSet::new();
        Ok(Self {
            history: History::with_base(&annotations, config.history_capacity),
            controller: GestureController::new(&config),
            scheduler: RenderScheduler::new(&config),
            annotations,
            loader,
            document: None,
            viewports: HashMap::new(),
            note_prompt: Box::new(EmptyNotePrompt),
            config,
        })
    }

    /// Replace the note text prompt.
    pub fn set_note_prompt(&mut self, prompt: Box<dyn NotePrompt>) {
        self.note_prompt = prompt;
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn annotations(&self) -> &AnnotationSet {
        &self.annotations
    }

    pub fn display_state(&self) -> DisplayState {
        self.controller.display_state()
    }

    pub fn controller(&self) -> &GestureController {
        &self.controller
    }

    pub fn draft(&self) -> Option<&DraftShape> {
        self.controller.draft()
    }

    /// Number of pages of the loaded document, 0 when none is loaded.
    pub fn page_count(&self) -> u32 {
        self.document.as_ref().map_or(0, |doc| doc.page_count())
    }

    // --- UI shell interface ---

    pub fn set_tool(&mut self, tool: ToolKind) {
        self.controller.set_tool(tool);
    }

    pub fn set_color(&mut self, hex: &str) -> bool {
        self.controller.set_color(hex)
    }

    pub fn set_stroke_width(&mut self, width: f64) -> bool {
        self.controller.set_stroke_width(width)
    }

    pub fn zoom_in(&mut self) -> EngineEvent {
        let outcome = self.controller.zoom_in();
        self.apply(outcome)
    }

    pub fn zoom_out(&mut self) -> EngineEvent {
        let outcome = self.controller.zoom_out();
        self.apply(outcome)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Step back one history entry. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                self.annotations = snapshot.clone();
                true
            }
            None => false,
        }
    }

    /// Step forward one history entry. Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.annotations = snapshot.clone();
                true
            }
            None => false,
        }
    }

    /// Serialize the current annotations.
    pub fn get_markup(&self) -> String {
        markup::serialize(&self.annotations)
    }

    /// Replace the annotations with those parsed from `source`.
    ///
    /// History restarts from the loaded set. Unreadable markup leaves an
    /// empty set behind and returns the error; skipped elements are returned
    /// for diagnostics.
    pub fn load_markup(&mut self, source: &str) -> Result<Vec<SkippedElement>, MarkupError> {
        self.controller.cancel();
        let defaults = DecodeDefaults {
            color: self.config.default_color.clone(),
            stroke_width: self.config.default_stroke_width,
        };
        match markup::parse_with(source, &defaults) {
            Ok(report) => {
                for skipped in &report.skipped {
                    log::debug!(
                        "Skipped <{}> #{}: {}",
                        skipped.tag,
                        skipped.ordinal,
                        skipped.reason
                    );
                }
                log::info!(
                    "Loaded {} annotation(s), skipped {}",
                    report.set.len(),
                    report.skipped.len()
                );
                self.annotations = report.set;
                self.history.reset(&self.annotations);
                Ok(report.skipped)
            }
            Err(e) => {
                log::warn!("Failed to parse markup: {}", e);
                self.annotations = AnnotationSet::new();
                self.history.reset(&self.annotations);
                Err(e)
            }
        }
    }

    /// Jump to a page, clamped to the document. Returns the page now current.
    pub fn go_to_page(&mut self, page: u32) -> u32 {
        let page = page.clamp(1, self.page_count().max(1));
        self.controller.set_current_page(page);
        page
    }

    // --- Document and rendering ---

    /// Load a document, replacing the current one and its annotations.
    ///
    /// On failure the engine is left in the empty-document state.
    pub async fn load_document(&mut self, url: &str) -> DocumentResult<u32> {
        let result = self.loader.load_document(url).await;

        self.controller.cancel();
        self.viewports.clear();
        self.scheduler.reset();
        self.annotations = AnnotationSet::new();
        self.history.reset(&self.annotations);
        self.controller.set_current_page(1);

        match result {
            Ok(document) => {
                let count = document.page_count();
                log::info!("Loaded {url} ({count} pages)");
                self.document = Some(document);
                Ok(count)
            }
            Err(e) => {
                log::error!("Failed to load document: {}", e);
                self.document = None;
                Err(e)
            }
        }
    }

    /// Pages that need (re)rendering for the current scale and page.
    pub fn render_requests(&mut self) -> Vec<RenderRequest> {
        let count = self.page_count();
        let state = self.controller.display_state();
        self.scheduler.plan(state.scale, state.current_page, count)
    }

    /// Render one requested page into `surface`.
    ///
    /// Returns `Ok(false)` when a newer request for the same page was issued
    /// meanwhile; the result is then ignored.
    pub async fn render_page(
        &mut self,
        request: RenderRequest,
        surface: &mut dyn RasterSurface,
    ) -> DocumentResult<bool> {
        let document = self.document.as_deref().ok_or(DocumentError::NoDocument)?;
        let rendered = self.scheduler.render(document, request, surface).await?;
        if !self.scheduler.accept(&rendered) {
            return Ok(false);
        }
        self.viewports.insert(request.page, rendered.viewport);
        Ok(true)
    }

    pub fn set_page_visible(&mut self, page: u32, visible: bool) {
        self.scheduler.set_visible(page, visible);
    }

    pub fn set_display_scale_factor(&mut self, factor: f64) {
        self.scheduler.set_display_scale(factor);
    }

    pub fn display_scale_factor(&self) -> f64 {
        self.scheduler.display_scale()
    }

    pub fn set_container_size(&mut self, size: Size) {
        self.controller.set_container_size(size);
    }

    /// Latest viewport accepted for `page`.
    pub fn viewport(&self, page: u32) -> Option<&dyn PageViewport> {
        self.viewports.get(&page).map(|viewport| viewport.as_ref())
    }

    /// Coordinate spaces of a page canvas laid out at `canvas` logical pixels.
    pub fn page_space(&self, page: u32, canvas: Size) -> PageSpace<'_> {
        PageSpace::new(self.viewport(page), canvas, self.controller.scale())
    }

    // --- Input ---

    pub fn pointer(&mut self, event: &PointerEvent) -> EngineEvent {
        let outcome = self.controller.pointer(event);
        self.apply(outcome)
    }

    pub fn touch(&mut self, event: &TouchEvent) -> EngineEvent {
        let outcome = self.controller.touch(event);
        self.apply(outcome)
    }

    pub fn key(&mut self, event: &KeyEvent) -> EngineEvent {
        let outcome = self.controller.key(event);
        self.apply(outcome)
    }

    /// Apply coalesced zoom requests. Returns the new scale when it changed.
    pub fn on_animation_frame(&mut self) -> Option<f64> {
        self.controller.on_animation_frame()
    }

    fn apply(&mut self, outcome: GestureOutcome) -> EngineEvent {
        match outcome {
            GestureOutcome::Idle => EngineEvent::Unchanged,
            GestureOutcome::Scrolled => EngineEvent::Scrolled,
            GestureOutcome::DraftUpdated => EngineEvent::DraftChanged,
            GestureOutcome::Commit(shape) => self.commit(shape),
            GestureOutcome::Noop(noop) => {
                log::debug!("Gesture ignored: {}", noop);
                EngineEvent::Ignored(noop)
            }
            GestureOutcome::ZoomRequested(scale) => EngineEvent::ZoomPending(scale),
            GestureOutcome::Undo => self.history_event(Self::undo),
            GestureOutcome::Redo => self.history_event(Self::redo),
            GestureOutcome::Cancelled => EngineEvent::Cancelled,
        }
    }

    fn history_event(&mut self, step: fn(&mut Self) -> bool) -> EngineEvent {
        if step(self) {
            EngineEvent::HistoryChanged
        } else {
            EngineEvent::Unchanged
        }
    }

    fn commit(&mut self, shape: CompletedShape) -> EngineEvent {
        let page = shape.page;
        let viewport = self.viewports.get(&page).cloned();
        let space = PageSpace::new(viewport.as_deref(), shape.canvas_size, self.controller.scale());
        if space.fidelity() != Fidelity::Exact {
            log::warn!("No viewport for page {page} yet, discarding gesture");
            return EngineEvent::Ignored(GestureNoop::NoViewport(page));
        }

        let text = match shape.geometry {
            CompletedGeometry::Note { at } => match self.note_prompt.prompt_note_text(page, at) {
                Some(text) => Some(text),
                None => return EngineEvent::Ignored(GestureNoop::NoteCancelled),
            },
            _ => None,
        };

        let annotation = match shape.into_annotation(&space, text) {
            Ok(annotation) => annotation,
            Err(noop) => return EngineEvent::Ignored(noop),
        };
        let id = annotation.id().to_string();
        let kind = annotation.kind_name();

        match self.annotations.append(annotation) {
            Ok(()) => {
                self.history.push(&self.annotations);
                log::debug!("Added {kind} {id} on page {page}");
                EngineEvent::Added(id)
            }
            Err(e) => {
                log::debug!("Rejected {kind} on page {page}: {}", e);
                EngineEvent::Ignored(GestureNoop::Rejected(e))
            }
        }
    }
}
