//! Frame layout: where the metadata, content and calibration regions live

use crate::error::FilmboxError;
use crate::geometry::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Symbol grid laid over a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolGrid {
    /// Symbols per row
    pub columns: usize,
    /// Symbol rows
    pub rows: usize,
    /// Bits carried by one symbol (1..=8)
    pub bits_per_symbol: u8,
}

impl SymbolGrid {
    /// Create a new grid
    pub const fn new(columns: usize, rows: usize, bits_per_symbol: u8) -> Self {
        Self {
            columns,
            rows,
            bits_per_symbol,
        }
    }

    /// Number of symbols in the grid
    pub const fn symbol_count(&self) -> usize {
        self.columns * self.rows
    }

    /// Number of distinct symbol values
    pub const fn levels(&self) -> u16 {
        1u16 << self.bits_per_symbol
    }

    /// Whole bytes the grid can carry
    pub const fn byte_capacity(&self) -> usize {
        self.symbol_count() * self.bits_per_symbol as usize / 8
    }
}

/// One rectangular region of the frame and its symbol grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Bounds in nominal frame coordinates
    pub rect: Rect,
    /// Symbol layout inside `rect`
    pub grid: SymbolGrid,
}

impl Region {
    /// Create a new region
    pub const fn new(rect: Rect, grid: SymbolGrid) -> Self {
        Self { rect, grid }
    }

    /// Nominal center of the symbol at `(column, row)`
    pub fn cell_center(&self, column: usize, row: usize) -> Point {
        let cw = self.rect.width as f32 / self.grid.columns as f32;
        let ch = self.rect.height as f32 / self.grid.rows as f32;
        Point::new(
            self.rect.x as f32 + (column as f32 + 0.5) * cw,
            self.rect.y as f32 + (row as f32 + 0.5) * ch,
        )
    }

    /// Pixel bounds of the symbol at `(column, row)`
    pub fn cell_rect(&self, column: usize, row: usize) -> Rect {
        let x0 = self.rect.x + (column * self.rect.width / self.grid.columns) as i64;
        let x1 = self.rect.x + ((column + 1) * self.rect.width / self.grid.columns) as i64;
        let y0 = self.rect.y + (row * self.rect.height / self.grid.rows) as i64;
        let y1 = self.rect.y + ((row + 1) * self.rect.height / self.grid.rows) as i64;
        Rect::new(x0, y0, (x1 - x0) as usize, (y1 - y0) as usize)
    }
}

/// Identifies one of the three regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    /// Frame metadata (payload length and similar)
    Metadata,
    /// Codec-protected payload symbols
    Content,
    /// Known reference levels
    CalibrationBar,
}

impl RegionKind {
    /// All regions in sampling order
    pub const ALL: [RegionKind; 3] = [
        RegionKind::Metadata,
        RegionKind::Content,
        RegionKind::CalibrationBar,
    ];

    /// Lowercase name used in logs
    pub const fn as_str(&self) -> &'static str {
        match self {
            RegionKind::Metadata => "metadata",
            RegionKind::Content => "content",
            RegionKind::CalibrationBar => "calibration_bar",
        }
    }
}

/// Placement of the four alignment squares
///
/// Marks are solid dark squares of side `size`, inset from each frame corner.
/// A mark is searched for inside its rect grown by `quiet_zone`; no region
/// may come within twice that distance so a capture offset of up to
/// `quiet_zone` pixels never drags data into a search window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CornerMarkLayout {
    /// Side length of a mark in pixels
    pub size: usize,
    /// Distance from the frame edge to the mark
    pub inset: usize,
    /// Blank margin around a mark
    pub quiet_zone: usize,
}

impl CornerMarkLayout {
    /// Search window around a mark
    pub fn search_window(&self, mark: &Rect) -> Rect {
        mark.inflate(self.quiet_zone)
    }

    /// Area that must stay free of region pixels
    pub fn exclusion_zone(&self, mark: &Rect) -> Rect {
        mark.inflate(2 * self.quiet_zone)
    }
}

/// Immutable geometric layout of a frame
///
/// Built once per session and shared read-only by trackers and samplers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameDescriptor {
    /// Nominal frame width in pixels
    pub width: usize,
    /// Nominal frame height in pixels
    pub height: usize,
    /// Metadata region
    pub metadata: Region,
    /// Content region
    pub content: Region,
    /// Calibration bar region
    pub calibration_bar: Region,
    /// Corner mark placement
    pub corner_marks: CornerMarkLayout,
}

impl FrameDescriptor {
    /// Layout with `columns x rows` content symbols of `cell` pixels each
    ///
    /// The metadata band (2 rows, 1 bit per symbol) sits above the content
    /// and the calibration bar (1 row) below it, both kept clear of the
    /// corner marks. `columns` must be at least 9 for the bands to exist.
    pub fn default_layout(cell: usize, columns: usize, rows: usize, bits_per_symbol: u8) -> Self {
        let width = (columns + 2) * cell;
        let height = (rows + 10) * cell;
        let band_columns = columns.saturating_sub(8);
        let band_x = 5 * cell as i64;

        Self {
            width,
            height,
            metadata: Region::new(
                Rect::new(band_x, 2 * cell as i64, band_columns * cell, 2 * cell),
                SymbolGrid::new(band_columns, 2, 1),
            ),
            content: Region::new(
                Rect::new(cell as i64, 5 * cell as i64, columns * cell, rows * cell),
                SymbolGrid::new(columns, rows, bits_per_symbol),
            ),
            calibration_bar: Region::new(
                Rect::new(band_x, (height - 3 * cell) as i64, band_columns * cell, cell),
                SymbolGrid::new(band_columns, 1, bits_per_symbol),
            ),
            corner_marks: CornerMarkLayout {
                size: 2 * cell,
                inset: cell,
                quiet_zone: cell,
            },
        }
    }

    /// Frame bounds in nominal coordinates
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    /// Region by kind
    pub fn region(&self, kind: RegionKind) -> &Region {
        match kind {
            RegionKind::Metadata => &self.metadata,
            RegionKind::Content => &self.content,
            RegionKind::CalibrationBar => &self.calibration_bar,
        }
    }

    /// Mark rects in order: top-left, top-right, bottom-left, bottom-right
    pub fn corner_mark_rects(&self) -> [Rect; 4] {
        let cm = &self.corner_marks;
        let near = cm.inset as i64;
        let far_x = self.width as i64 - (cm.inset + cm.size) as i64;
        let far_y = self.height as i64 - (cm.inset + cm.size) as i64;
        [
            Rect::new(near, near, cm.size, cm.size),
            Rect::new(far_x, near, cm.size, cm.size),
            Rect::new(near, far_y, cm.size, cm.size),
            Rect::new(far_x, far_y, cm.size, cm.size),
        ]
    }

    /// Check the layout invariants
    ///
    /// Regions must be non-empty, hold at least one pixel per symbol, sit
    /// inside the frame and not overlap each other or the corner-mark
    /// exclusion zones.
    pub fn validate(&self) -> Result<(), FilmboxError> {
        if self.width == 0 || self.height == 0 {
            return Err(FilmboxError::MalformedFrame(format!(
                "frame size {}x{} is empty",
                self.width, self.height
            )));
        }
        let bounds = self.bounds();

        for kind in RegionKind::ALL {
            let region = self.region(kind);
            let grid = &region.grid;
            if region.rect.is_empty() || grid.columns == 0 || grid.rows == 0 {
                return Err(FilmboxError::MalformedFrame(format!(
                    "{} region is empty",
                    kind.as_str()
                )));
            }
            if !(1..=8).contains(&grid.bits_per_symbol) {
                return Err(FilmboxError::MalformedFrame(format!(
                    "{} region uses {} bits per symbol",
                    kind.as_str(),
                    grid.bits_per_symbol
                )));
            }
            if region.rect.width < grid.columns || region.rect.height < grid.rows {
                return Err(FilmboxError::MalformedFrame(format!(
                    "{} region is smaller than one pixel per symbol",
                    kind.as_str()
                )));
            }
            if !bounds.contains_rect(&region.rect) {
                return Err(FilmboxError::MalformedFrame(format!(
                    "{} region {:?} leaves the {}x{} frame",
                    kind.as_str(),
                    region.rect,
                    self.width,
                    self.height
                )));
            }
        }

        for (i, a) in RegionKind::ALL.iter().enumerate() {
            for b in &RegionKind::ALL[i + 1..] {
                if self.region(*a).rect.intersects(&self.region(*b).rect) {
                    return Err(FilmboxError::MalformedFrame(format!(
                        "{} and {} regions overlap",
                        a.as_str(),
                        b.as_str()
                    )));
                }
            }
        }

        if self.corner_marks.size == 0 {
            return Err(FilmboxError::MalformedFrame(
                "corner marks have zero size".into(),
            ));
        }
        for mark in self.corner_mark_rects() {
            if !bounds.contains_rect(&mark) {
                return Err(FilmboxError::MalformedFrame(format!(
                    "corner mark {:?} leaves the frame",
                    mark
                )));
            }
            let window = self.corner_marks.search_window(&mark);
            if !bounds.contains_rect(&window) {
                return Err(FilmboxError::MalformedFrame(format!(
                    "search window {:?} of the corner mark at ({}, {}) leaves the frame",
                    window, mark.x, mark.y
                )));
            }
            let zone = self.corner_marks.exclusion_zone(&mark);
            for kind in RegionKind::ALL {
                if zone.intersects(&self.region(kind).rect) {
                    return Err(FilmboxError::MalformedFrame(format!(
                        "{} region intrudes on the corner mark at ({}, {})",
                        kind.as_str(),
                        mark.x,
                        mark.y
                    )));
                }
            }
        }

        Ok(())
    }
}
