//! Synthetic frame rendering
//!
//! Produces frame images in nominal coordinates, the same images the tracker
//! consumes in simulated mode. Real media are printed by external tooling;
//! this renderer only has to agree with the sampler on symbol placement and
//! intensity levels.

use crate::constants::{BLACK, WHITE};
use crate::error::FilmboxError;
use crate::frame::{FrameDescriptor, RegionKind, SymbolGrid};
use crate::geometry::{Point, Transform};
use crate::image::GrayImage;
use crate::sampler::symbol_intensity;

/// Symbol values for all three regions of a frame, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSymbols {
    /// Metadata symbols
    pub metadata: Vec<u8>,
    /// Content symbols
    pub content: Vec<u8>,
    /// Calibration bar symbols
    pub calibration: Vec<u8>,
}

impl FrameSymbols {
    /// Deterministic filler symbols with the canonical calibration ramp
    pub fn patterned(frame: &FrameDescriptor, seed: u64) -> Self {
        let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
        let mut fill = |grid: &SymbolGrid| -> Vec<u8> {
            let mask = (grid.levels() - 1) as u64;
            (0..grid.symbol_count())
                .map(|_| {
                    state ^= state << 13;
                    state ^= state >> 7;
                    state ^= state << 17;
                    ((state >> 32) & mask) as u8
                })
                .collect()
        };
        let metadata = fill(&frame.metadata.grid);
        let content = fill(&frame.content.grid);
        Self {
            metadata,
            content,
            calibration: calibration_ramp(&frame.calibration_bar.grid),
        }
    }

    fn for_region(&self, kind: RegionKind) -> &[u8] {
        match kind {
            RegionKind::Metadata => &self.metadata,
            RegionKind::Content => &self.content,
            RegionKind::CalibrationBar => &self.calibration,
        }
    }
}

/// Canonical calibration symbols: every level in turn, repeated
pub fn calibration_ramp(grid: &SymbolGrid) -> Vec<u8> {
    let levels = grid.levels() as usize;
    (0..grid.symbol_count()).map(|i| (i % levels) as u8).collect()
}

/// Render a frame at its nominal size
pub fn render_frame(
    frame: &FrameDescriptor,
    symbols: &FrameSymbols,
) -> Result<GrayImage, FilmboxError> {
    frame.validate()?;
    let mut img = GrayImage::filled(frame.width, frame.height, WHITE);

    for kind in RegionKind::ALL {
        let region = frame.region(kind);
        let values = symbols.for_region(kind);
        if values.len() != region.grid.symbol_count() {
            return Err(FilmboxError::PayloadSizeMismatch {
                expected: region.grid.symbol_count(),
                actual: values.len(),
            });
        }
        let levels = region.grid.levels();
        for (i, &symbol) in values.iter().enumerate() {
            if symbol as u16 >= levels {
                return Err(FilmboxError::InvalidProperty {
                    property: kind.as_str().into(),
                    reason: format!("symbol {} exceeds {} levels", symbol, levels),
                });
            }
            let cell = region.cell_rect(i % region.grid.columns, i / region.grid.columns);
            img.fill_rect(
                cell.x,
                cell.y,
                cell.width,
                cell.height,
                symbol_intensity(symbol, region.grid.bits_per_symbol),
            );
        }
    }

    for mark in frame.corner_mark_rects() {
        img.fill_rect(mark.x, mark.y, mark.width, mark.height, BLACK);
    }

    Ok(img)
}

/// Render a frame into a `canvas_width x canvas_height` white canvas at `(dx, dy)`
pub fn render_shifted(
    frame: &FrameDescriptor,
    symbols: &FrameSymbols,
    canvas_width: usize,
    canvas_height: usize,
    dx: i64,
    dy: i64,
) -> Result<GrayImage, FilmboxError> {
    render_transformed(
        frame,
        symbols,
        canvas_width,
        canvas_height,
        &Transform::translation(dx as f32, dy as f32),
    )
}

/// Render a frame into a white canvas, placed by `transform`
///
/// Each canvas pixel center is mapped back into nominal coordinates and takes
/// the value of the nominal pixel it lands on. Integer translations therefore
/// reproduce the nominal image exactly.
pub fn render_transformed(
    frame: &FrameDescriptor,
    symbols: &FrameSymbols,
    canvas_width: usize,
    canvas_height: usize,
    transform: &Transform,
) -> Result<GrayImage, FilmboxError> {
    let inverse = transform
        .inverse()
        .ok_or_else(|| FilmboxError::InvalidProperty {
            property: "transform".into(),
            reason: "transform is not invertible".into(),
        })?;
    let nominal = render_frame(frame, symbols)?;
    let source = nominal.view();
    let mut img = GrayImage::filled(canvas_width, canvas_height, WHITE);

    for y in 0..canvas_height {
        for x in 0..canvas_width {
            let p = inverse.apply(Point::new(x as f32 + 0.5, y as f32 + 0.5));
            if let Some(value) = source.get(p.x.floor() as i64, p.y.floor() as i64) {
                img.put(x as i64, y as i64, value);
            }
        }
    }

    Ok(img)
}
