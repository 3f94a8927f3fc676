//! Multi-up page layout
//!
//! Arranges copies of one symbol in a grid on a fixed-size page. The engine
//! produces page descriptions only; rasterising them is the renderer's job.

use std::sync::Arc;

use image::ImageError;
use thiserror::Error;
use tracing::debug;

use crate::config::SettingsProvider;
use crate::models::QrSymbol;
use crate::render::{raster_side, rendered_size};

/// Rendered size above which a symbol counts as large (2000 KB)
pub const LARGE_SYMBOL_BYTES: usize = 2000 * 1024;
/// Copy limit for ordinary symbols
pub const MAX_COPIES: usize = 16;
/// Copy limit for large symbols
pub const MAX_COPIES_LARGE: usize = 4;

/// Layout failure
#[derive(Debug, Error)]
pub enum LayoutError {
    /// More copies than a page can hold for this symbol
    #[error("{requested} copies requested, at most {max} fit on a page")]
    TooManyCopies {
        /// Requested copy count
        requested: usize,
        /// Limit for this symbol
        max: usize,
    },
    /// Zero copies requested
    #[error("At least one copy is required")]
    NoCopies,
    /// The export raster could not be encoded to measure its size
    #[error("Failed to measure rendered size: {0}")]
    Measure(#[from] ImageError),
}

/// Page dimensions in points (1/72 inch)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    /// Width in points
    pub width: f32,
    /// Height in points
    pub height: f32,
}

impl PageSize {
    /// US Letter, 8.5 x 11 inches
    pub const LETTER: PageSize = PageSize {
        width: 612.0,
        height: 792.0,
    };
    /// ISO A4
    pub const A4: PageSize = PageSize {
        width: 595.0,
        height: 842.0,
    };
}

impl Default for PageSize {
    fn default() -> Self {
        Self::LETTER
    }
}

/// Axis-aligned rectangle in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl Rect {
    /// Right edge
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// One placed copy
#[derive(Debug, Clone)]
pub struct Cell {
    /// Where the symbol (including its quiet zone) is drawn
    pub frame: Rect,
    /// Shared, immutable symbol
    pub symbol: Arc<QrSymbol>,
}

/// One laid-out page
#[derive(Debug, Clone)]
pub struct Page {
    /// Page dimensions
    pub size: PageSize,
    /// Cells in row-major order
    pub cells: Vec<Cell>,
}

/// Derived print parameters for one request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintJob {
    /// Copies placed on each page
    pub copies_per_page: usize,
    /// Grid columns
    pub columns: usize,
    /// Symbols grow to fill their cells
    pub scale_to_fill: bool,
    /// Grid is centered on the page
    pub center_on_page: bool,
    /// Page dimensions
    pub page_size: PageSize,
}

impl PrintJob {
    /// Validate a copy count and derive the grid for it
    pub fn plan(
        copies: usize,
        rendered_bytes: usize,
        scale_to_fill: bool,
        center_on_page: bool,
        page_size: PageSize,
    ) -> Result<Self, LayoutError> {
        let large = rendered_bytes > LARGE_SYMBOL_BYTES;
        if copies == 0 {
            return Err(LayoutError::NoCopies);
        }
        let max = max_copies(large);
        if copies > max {
            return Err(LayoutError::TooManyCopies {
                requested: copies,
                max,
            });
        }
        Ok(Self {
            copies_per_page: copies,
            columns: columns_for(copies, large && scale_to_fill),
            scale_to_fill,
            center_on_page,
            page_size,
        })
    }

    /// Grid rows
    pub fn rows(&self) -> usize {
        self.copies_per_page.div_ceil(self.columns.max(1))
    }
}

/// Grid columns for `copies`; capped at 2 for large scaled symbols
pub fn columns_for(copies: usize, cap_at_two: bool) -> usize {
    let columns = match copies {
        0 | 1 => 1,
        2..=4 => 2,
        5..=9 => 3,
        _ => 4,
    };
    if cap_at_two { columns.min(2) } else { columns }
}

/// Copy limit for a symbol
pub fn max_copies(large: bool) -> usize {
    if large { MAX_COPIES_LARGE } else { MAX_COPIES }
}

/// Places symbol copies on pages
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutEngine {
    /// Symbols grow to fill their cells
    pub scale_to_fill: bool,
    /// Grid is centered on the page, otherwise top-left aligned
    pub center_on_page: bool,
    /// Page margin in points
    pub margin: f32,
    /// Gap between cells in points
    pub spacing: f32,
    /// Pixels per module used to measure the export raster
    pub export_scale: u32,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self {
            scale_to_fill: false,
            center_on_page: true,
            margin: 36.0,
            spacing: 18.0,
            export_scale: 12,
        }
    }
}

impl LayoutEngine {
    /// Engine configured from read-only settings
    pub fn from_settings(settings: &dyn SettingsProvider) -> Self {
        Self {
            scale_to_fill: settings.print_scale_to_fill(),
            center_on_page: settings.print_center_on_page(),
            export_scale: settings.export_scale(),
            ..Self::default()
        }
    }

    /// Lay out `copies` of `symbol`, measuring its export size first
    pub fn layout(
        &self,
        symbol: &Arc<QrSymbol>,
        copies: usize,
        page_size: PageSize,
    ) -> Result<Vec<Page>, LayoutError> {
        if copies == 0 {
            return Err(LayoutError::NoCopies);
        }
        let bytes = rendered_size(symbol, self.export_scale)?;
        self.layout_measured(symbol, copies, page_size, bytes)
    }

    /// Lay out with an already known rendered size in bytes
    pub fn layout_measured(
        &self,
        symbol: &Arc<QrSymbol>,
        copies: usize,
        page_size: PageSize,
        rendered_bytes: usize,
    ) -> Result<Vec<Page>, LayoutError> {
        let job = PrintJob::plan(
            copies,
            rendered_bytes,
            self.scale_to_fill,
            self.center_on_page,
            page_size,
        )?;
        let cells = self.place(symbol, &job);
        debug!(
            copies,
            columns = job.columns,
            rows = job.rows(),
            rendered_bytes,
            "laid out print page"
        );
        Ok(vec![Page {
            size: page_size,
            cells,
        }])
    }

    fn place(&self, symbol: &Arc<QrSymbol>, job: &PrintJob) -> Vec<Cell> {
        let (columns, rows) = (job.columns, job.rows());
        let page = job.page_size;
        let usable_w = (page.width - 2.0 * self.margin).max(0.0);
        let usable_h = (page.height - 2.0 * self.margin).max(0.0);
        let slot_w = (usable_w - self.spacing * (columns - 1) as f32) / columns as f32;
        let slot_h = (usable_h - self.spacing * (rows - 1) as f32) / rows as f32;
        let slot = slot_w.min(slot_h).max(0.0);

        // Natural size: one point per pixel at the style's own scale
        let natural = raster_side(symbol, symbol.style.scale) as f32;
        let side = if job.scale_to_fill {
            slot
        } else {
            natural.min(slot)
        };

        let grid_w = side * columns as f32 + self.spacing * (columns - 1) as f32;
        let grid_h = side * rows as f32 + self.spacing * (rows - 1) as f32;
        let (origin_x, origin_y) = if job.center_on_page {
            ((page.width - grid_w) / 2.0, (page.height - grid_h) / 2.0)
        } else {
            (self.margin, self.margin)
        };

        (0..job.copies_per_page)
            .map(|i| {
                let (row, col) = (i / columns, i % columns);
                Cell {
                    frame: Rect {
                        x: origin_x + col as f32 * (side + self.spacing),
                        y: origin_y + row as f32 * (side + self.spacing),
                        width: side,
                        height: side,
                    },
                    symbol: Arc::clone(symbol),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::generate;
    use crate::models::{ECLevel, QrContent, QrStyle};

    fn symbol() -> Arc<QrSymbol> {
        Arc::new(generate(&QrContent::new("layout", ECLevel::M), &QrStyle::default()).unwrap())
    }

    #[test]
    fn test_columns_table() {
        let got: Vec<usize> = [1, 2, 4, 5, 9, 10]
            .iter()
            .map(|&n| columns_for(n, false))
            .collect();
        assert_eq!(got, vec![1, 2, 2, 3, 3, 4]);
        assert_eq!(columns_for(16, false), 4);
    }

    #[test]
    fn test_columns_capped_for_large_scaled_symbols() {
        let job = PrintJob::plan(4, LARGE_SYMBOL_BYTES + 1, true, true, PageSize::LETTER).unwrap();
        assert_eq!(job.columns, 2);
        assert_eq!(columns_for(9, true), 2);

        // Cap only applies with scale-to-fill
        let job = PrintJob::plan(1, LARGE_SYMBOL_BYTES + 1, false, true, PageSize::LETTER).unwrap();
        assert_eq!(job.columns, 1);
    }

    #[test]
    fn test_copy_limits() {
        assert!(matches!(
            PrintJob::plan(17, 10_000, false, true, PageSize::LETTER),
            Err(LayoutError::TooManyCopies {
                requested: 17,
                max: 16
            })
        ));
        assert!(matches!(
            PrintJob::plan(5, LARGE_SYMBOL_BYTES + 1, false, true, PageSize::LETTER),
            Err(LayoutError::TooManyCopies { max: 4, .. })
        ));
        assert!(matches!(
            PrintJob::plan(0, 10, false, true, PageSize::LETTER),
            Err(LayoutError::NoCopies)
        ));
        assert!(PrintJob::plan(16, 10_000, false, true, PageSize::LETTER).is_ok());
    }

    #[test]
    fn test_cells_share_symbol_and_stay_on_page() {
        let s = symbol();
        let engine = LayoutEngine {
            scale_to_fill: true,
            ..LayoutEngine::default()
        };
        let pages = engine.layout(&s, 10, PageSize::LETTER).unwrap();
        assert_eq!(pages.len(), 1);
        let page = &pages[0];
        assert_eq!(page.cells.len(), 10);
        for cell in &page.cells {
            assert!(Arc::ptr_eq(&cell.symbol, &s));
            assert!(cell.frame.x >= 0.0 && cell.frame.right() <= page.size.width);
            assert!(cell.frame.y >= 0.0 && cell.frame.bottom() <= page.size.height);
        }
        // 4 columns, 3 rows, row-major
        assert_eq!(page.cells[1].frame.y, page.cells[0].frame.y);
        assert!(page.cells[4].frame.y > page.cells[0].frame.y);
        assert_eq!(page.cells[4].frame.x, page.cells[0].frame.x);
    }

    #[test]
    fn test_centering() {
        let s = symbol();
        let centered = LayoutEngine::default()
            .layout_measured(&s, 1, PageSize::LETTER, 1000)
            .unwrap();
        let frame = centered[0].cells[0].frame;
        assert!((frame.x + frame.width / 2.0 - 306.0).abs() < 0.01);
        assert!((frame.y + frame.height / 2.0 - 396.0).abs() < 0.01);

        let top_left = LayoutEngine {
            center_on_page: false,
            ..LayoutEngine::default()
        }
        .layout_measured(&s, 1, PageSize::LETTER, 1000)
        .unwrap();
        assert_eq!(top_left[0].cells[0].frame.x, 36.0);
        assert_eq!(top_left[0].cells[0].frame.y, 36.0);
    }

    #[test]
    fn test_natural_size_without_scale_to_fill() {
        let s = symbol();
        let pages = LayoutEngine::default()
            .layout_measured(&s, 1, PageSize::LETTER, 1000)
            .unwrap();
        // Version 1 at scale 8 with a 4-module quiet zone
        assert_eq!(pages[0].cells[0].frame.width, (21.0 + 8.0) * 8.0);
    }
}
