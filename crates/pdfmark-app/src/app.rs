//! Command-line application: read XFDF markup and print it normalized, as
//! a JSON snapshot, or as an SVG overlay of one page.

use crate::shortcuts::ShortcutRegistry;
use clap::Parser;
use kurbo::{Rect, Size};
use pdfmark_core::config::{ConfigError, EngineConfig};
use pdfmark_core::geometry::{PageSpace, StandardViewport};
use pdfmark_core::markup::{self, DecodeDefaults, MarkupError, ParseReport};
use pdfmark_render::{OverlayContext, Renderer, RendererError, SvgRenderer};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad arguments, or the `--help` text.
    #[error(transparent)]
    Cli(#[from] clap::Error),
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid markup: {0}")]
    Markup(#[from] MarkupError),
    #[error("Rendering failed: {0}")]
    Render(#[from] RendererError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// What to print.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputMode {
    /// Re-serialized markup.
    Markup,
    /// Annotation set as JSON.
    Json,
    /// Overlay of one page of `width` x `height` PDF units as SVG.
    Svg { page: u32, width: f64, height: f64 },
}

/// Parsed command line.
#[derive(Debug, Parser)]
#[command(name = "pdfmark")]
#[command(about = "Normalize XFDF annotation markup or draw it as an SVG page overlay")]
#[command(after_help = ShortcutRegistry::help_text())]
pub struct Cli {
    /// XFDF markup to read.
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Print the annotation set as JSON.
    #[arg(long, conflicts_with = "svg")]
    pub json: bool,

    /// Print the overlay of this page (1-based) as SVG.
    #[arg(long, value_name = "PAGE", value_parser = clap::value_parser!(u32).range(1..))]
    pub svg: Option<u32>,

    /// Page width in PDF units, for `--svg`.
    #[arg(long, default_value_t = 612.0, value_parser = page_length)]
    pub width: f64,

    /// Page height in PDF units, for `--svg`.
    #[arg(long, default_value_t = 792.0, value_parser = page_length)]
    pub height: f64,

    /// Engine configuration as JSON.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        match self.svg {
            Some(page) => OutputMode::Svg {
                page,
                width: self.width,
                height: self.height,
            },
            None if self.json => OutputMode::Json,
            None => OutputMode::Markup,
        }
    }
}

fn page_length(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("`{raw}` is not a number"))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("page size must be positive, got {value}"))
    }
}

fn read_file(path: &Path) -> Result<String, AppError> {
    std::fs::read_to_string(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// The command-line application.
#[derive(Debug, Clone, Default)]
pub struct App {
    config: EngineConfig,
}

impl App {
    pub fn new(config: EngineConfig) -> Result<Self, AppError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Parse arguments (including the program name), read the input and
    /// produce the output text.
    pub fn run<I, T>(args: I) -> Result<String, AppError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args)?;

        let config = match &cli.config {
            Some(path) => EngineConfig::from_json(&read_file(path)?)?,
            None => EngineConfig::default(),
        };
        let app = Self::new(config)?;

        let source = read_file(&cli.input)?;
        log::info!("Read {}", cli.input.display());
        app.process(&source, &cli.output_mode())
    }

    /// Parse `source`, reporting skipped elements, and format it per `mode`.
    pub fn process(&self, source: &str, mode: &OutputMode) -> Result<String, AppError> {
        let defaults = DecodeDefaults {
            color: self.config.default_color.clone(),
            stroke_width: self.config.default_stroke_width,
        };
        let ParseReport { set, skipped } = markup::parse_with(source, &defaults)?;
        for element in &skipped {
            log::warn!(
                "Skipped <{}> #{}: {}",
                element.tag,
                element.ordinal,
                element.reason
            );
        }
        let counts = set.counts();
        log::info!(
            "{} annotation(s): {} rectangle(s), {} highlight(s), {} polygon(s), {} ink, {} note(s)",
            set.len(),
            counts.rectangles,
            counts.highlights,
            counts.polygons,
            counts.ink,
            counts.notes
        );

        match mode {
            OutputMode::Markup => Ok(markup::serialize(&set)),
            OutputMode::Json => Ok(set.to_json()?),
            OutputMode::Svg {
                page,
                width,
                height,
            } => {
                let viewport = StandardViewport::new(Rect::new(0.0, 0.0, *width, *height), 1.0, 0);
                let space = PageSpace::new(Some(&viewport), Size::new(*width, *height), 1.0);
                let mut renderer = SvgRenderer::new();
                renderer.build_scene(&OverlayContext::new(*page, space, &set))?;
                Ok(renderer.into_svg())
            }
        }
    }
}
