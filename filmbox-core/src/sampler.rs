//! Symbol sampling over one frame region

use crate::error::FilmboxError;
use crate::frame::{Region, RegionKind, SymbolGrid};
use crate::geometry::Transform;
use crate::image::ImageView;
use crate::painter::Painter;

/// Reads the symbols of a single region
///
/// A sampler borrows its region from the frame descriptor; it owns nothing
/// but its grid resolution.
#[derive(Debug, Clone, Copy)]
pub struct Sampler<'a> {
    kind: RegionKind,
    region: &'a Region,
}

impl<'a> Sampler<'a> {
    /// Bind a sampler to `region`
    pub fn new(kind: RegionKind, region: &'a Region) -> Self {
        Self { kind, region }
    }

    /// Which region this sampler reads
    pub fn kind(&self) -> RegionKind {
        self.kind
    }

    /// Grid resolution
    pub fn grid(&self) -> &SymbolGrid {
        &self.region.grid
    }

    /// Sample every symbol in row-major order
    ///
    /// Each cell center is mapped through `transform`, read with bilinear
    /// interpolation and quantized to the grid's level count. A cell center
    /// that falls off the image is an error; nothing is returned for the
    /// region in that case.
    pub fn sample(
        &self,
        image: &ImageView<'_>,
        transform: &Transform,
        painter: &mut dyn Painter,
    ) -> Result<Vec<u8>, FilmboxError> {
        let grid = &self.region.grid;
        let mut symbols = Vec::with_capacity(grid.symbol_count());

        for row in 0..grid.rows {
            for column in 0..grid.columns {
                let p = transform.apply(self.region.cell_center(column, row));
                if !image.contains(p.x, p.y) {
                    return Err(FilmboxError::SamplingOutOfBounds {
                        x: p.x,
                        y: p.y,
                        width: image.width,
                        height: image.height,
                    });
                }
                let symbol = quantize(image.sample_bilinear(p.x, p.y), grid.bits_per_symbol);
                painter.draw_point(self.kind, p, symbol);
                symbols.push(symbol);
            }
        }

        Ok(symbols)
    }
}

/// Intensity printed for `symbol` at the given depth (0 is black)
pub fn symbol_intensity(symbol: u8, bits_per_symbol: u8) -> u8 {
    let max = ((1u16 << bits_per_symbol) - 1) as f32;
    ((symbol as f32).min(max) * 255.0 / max).round() as u8
}

/// Nearest symbol for a sampled intensity
pub fn quantize(intensity: f32, bits_per_symbol: u8) -> u8 {
    let max = ((1u16 << bits_per_symbol) - 1) as f32;
    (intensity.clamp(0.0, 255.0) * max / 255.0).round() as u8
}
