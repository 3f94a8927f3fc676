//! Page rendering for print jobs
//!
//! [`PageRenderer`] is the seam to whatever turns page descriptions into paper
//! or files. [`RasterPageRenderer`] rasterises pages with the `image` crate and
//! optionally writes one PNG per page.

use std::path::PathBuf;

use async_trait::async_trait;
use image::imageops::{self, FilterType};
use image::{ImageError, Rgba, RgbaImage};
use rayon::prelude::*;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::layout::Page;
use crate::render::{rasterize, side_modules};

/// How a render request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Every page was rendered
    Completed,
    /// Cancelled before completion; partial output is abandoned
    Cancelled,
}

/// Render failure
#[derive(Debug, Error)]
pub enum RenderError {
    /// Image encoding or saving failed
    #[error("Image error: {0}")]
    Image(#[from] ImageError),
    /// Output directory could not be prepared
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The blocking render task panicked or was aborted
    #[error("Render task failed: {0}")]
    Task(String),
}

/// Turns laid-out pages into output
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Render `pages` as one job named `job_name`.
    ///
    /// Returns [`RenderOutcome::Cancelled`] if `cancel` fires first.
    async fn render(
        &self,
        pages: &[Page],
        job_name: &str,
        cancel: &CancellationToken,
    ) -> Result<RenderOutcome, RenderError>;
}

/// Blanket implementation for boxed renderers
#[async_trait]
impl PageRenderer for Box<dyn PageRenderer> {
    async fn render(
        &self,
        pages: &[Page],
        job_name: &str,
        cancel: &CancellationToken,
    ) -> Result<RenderOutcome, RenderError> {
        self.as_ref().render(pages, job_name, cancel).await
    }
}

/// Rasterises pages at a fixed resolution
#[derive(Debug, Clone)]
pub struct RasterPageRenderer {
    dpi: u32,
    output_dir: Option<PathBuf>,
}

impl Default for RasterPageRenderer {
    fn default() -> Self {
        Self {
            dpi: 150,
            output_dir: None,
        }
    }
}

impl RasterPageRenderer {
    /// Renderer producing `dpi` pixels per inch, keeping pages in memory only
    pub fn new(dpi: u32) -> Self {
        Self {
            dpi: dpi.max(1),
            output_dir: None,
        }
    }

    /// Write each page as `<job>-<n>.png` into `dir`
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    fn pixels_per_point(&self) -> f32 {
        self.dpi as f32 / 72.0
    }

    /// Rasterise one page on a white background
    pub fn render_page(&self, page: &Page) -> RgbaImage {
        let k = self.pixels_per_point();
        let width = (page.size.width * k).round().max(1.0) as u32;
        let height = (page.size.height * k).round().max(1.0) as u32;
        let mut canvas = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

        let tiles: Vec<(RgbaImage, i64, i64)> = page
            .cells
            .par_iter()
            .filter_map(|cell| {
                let side = (cell.frame.width * k).round() as u32;
                if side == 0 {
                    return None;
                }
                let raster = rasterize(&cell.symbol, (side / side_modules(&cell.symbol)).max(1));
                let tile = if raster.width() == side {
                    raster
                } else {
                    imageops::resize(&raster, side, side, FilterType::Nearest)
                };
                let x = (cell.frame.x * k).round() as i64;
                let y = (cell.frame.y * k).round() as i64;
                Some((tile, x, y))
            })
            .collect();

        for (tile, x, y) in &tiles {
            imageops::overlay(&mut canvas, tile, *x, *y);
        }
        canvas
    }

    fn page_path(&self, job_name: &str, index: usize) -> Option<PathBuf> {
        let stem: String = job_name
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        let stem = if stem.is_empty() { "job".to_string() } else { stem };
        self.output_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}-{}.png", stem, index + 1)))
    }
}

#[async_trait]
impl PageRenderer for RasterPageRenderer {
    async fn render(
        &self,
        pages: &[Page],
        job_name: &str,
        cancel: &CancellationToken,
    ) -> Result<RenderOutcome, RenderError> {
        if let Some(dir) = &self.output_dir {
            tokio::fs::create_dir_all(dir).await?;
        }

        for (index, page) in pages.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(job = job_name, page = index, "print job cancelled");
                return Ok(RenderOutcome::Cancelled);
            }

            let renderer = self.clone();
            let page = page.clone();
            let task = tokio::task::spawn_blocking(move || renderer.render_page(&page));
            let image = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(job = job_name, page = index, "print job cancelled");
                    return Ok(RenderOutcome::Cancelled);
                }
                joined = task => joined.map_err(|e| RenderError::Task(e.to_string()))?,
            };

            // Saved outside the raced task so an abandoned page never reaches disk
            if let Some(path) = self.page_path(job_name, index) {
                let target = path.clone();
                tokio::task::spawn_blocking(move || image.save(&target))
                    .await
                    .map_err(|e| RenderError::Task(e.to_string()))??;
                debug!(path = %path.display(), "wrote page");
            }
        }

        info!(job = job_name, pages = pages.len(), "print job completed");
        Ok(RenderOutcome::Completed)
    }
}
