//! Corner-mark search for physically captured frames

use crate::constants::{DEFAULT_MARK_THRESHOLD, DEFAULT_MAX_RESIDUAL, DEFAULT_MIN_FILL};
use crate::error::FilmboxError;
use crate::frame::FrameDescriptor;
use crate::geometry::{Point, Rect, Transform};
use crate::image::ImageView;
use crate::painter::Painter;
use serde::{Deserialize, Serialize};

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// Tuning for the corner-mark search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalogParams {
    /// Pixels darker than this belong to a mark
    pub threshold: u8,
    /// Lowest accepted ratio of found to nominal mark area
    pub min_fill: f32,
    /// Largest accepted distance between fitted and observed mark centers
    pub max_residual: f32,
}

impl Default for AnalogParams {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MARK_THRESHOLD,
            min_fill: DEFAULT_MIN_FILL,
            max_residual: DEFAULT_MAX_RESIDUAL,
        }
    }
}

/// A corner mark as found in the image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoundMark {
    /// Centroid of the dark pixels
    pub center: Point,
    /// Dark pixel count
    pub area: usize,
    /// Bounding box of the dark pixels
    pub bounds: Rect,
}

/// Locates the four corner marks and derives the nominal-to-image transform
#[derive(Debug, Clone, Copy, Default)]
pub struct CornerMarkLocator {
    params: AnalogParams,
}

impl CornerMarkLocator {
    /// Create a locator with the given tuning
    pub fn new(params: AnalogParams) -> Self {
        Self { params }
    }

    /// Tuning in use
    pub fn params(&self) -> &AnalogParams {
        &self.params
    }

    /// Find all four marks and fit a similarity transform to them
    ///
    /// Fails if any mark is missing or malformed, or if the fit leaves a
    /// residual above `max_residual`.
    pub fn locate(
        &self,
        image: &ImageView<'_>,
        frame: &FrameDescriptor,
        painter: &mut dyn Painter,
    ) -> Result<Transform, FilmboxError> {
        let marks = frame.corner_mark_rects();
        let mut nominal = [Point::origin(); 4];
        let mut observed = [Point::origin(); 4];

        for (i, mark) in marks.iter().enumerate() {
            let window = frame.corner_marks.search_window(mark);
            painter.draw_rect(window, 128);

            let found = self.find_mark(image, &window, frame.corner_marks.size)?;
            painter.draw_rect(found.bounds, 0);

            #[cfg(feature = "logging")]
            debug!(
                "Corner mark {} found at ({:.2}, {:.2}), area {}",
                i, found.center.x, found.center.y, found.area
            );

            nominal[i] = mark.center();
            observed[i] = found.center;
        }

        let transform = Transform::fit_similarity(&nominal, &observed).ok_or_else(|| {
            FilmboxError::AlignmentFailed("corner marks are degenerate".into())
        })?;

        let residual = transform.max_residual(&nominal, &observed);
        if residual > self.params.max_residual {
            #[cfg(feature = "logging")]
            warn!(
                "Corner mark fit rejected: residual {:.2} exceeds {:.2}",
                residual, self.params.max_residual
            );
            return Err(FilmboxError::AlignmentFailed(format!(
                "corner mark fit residual {:.2}px exceeds {:.2}px",
                residual, self.params.max_residual
            )));
        }

        Ok(transform)
    }

    /// Dark blob inside `window`, checked against the nominal mark size
    pub fn find_mark(
        &self,
        image: &ImageView<'_>,
        window: &Rect,
        size: usize,
    ) -> Result<FoundMark, FilmboxError> {
        let x0 = window.x.max(0);
        let y0 = window.y.max(0);
        let x1 = window.right().min(image.width as i64);
        let y1 = window.bottom().min(image.height as i64);

        let mut area = 0usize;
        let (mut sx, mut sy) = (0.0f64, 0.0f64);
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (i64::MAX, i64::MAX, i64::MIN, i64::MIN);

        for y in y0..y1 {
            for x in x0..x1 {
                let dark = image
                    .get(x, y)
                    .is_some_and(|v| v < self.params.threshold);
                if !dark {
                    continue;
                }
                area += 1;
                sx += x as f64 + 0.5;
                sy += y as f64 + 0.5;
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }
        }

        if area == 0 {
            #[cfg(feature = "logging")]
            warn!("No corner mark inside search window {:?}", window);
            return Err(FilmboxError::AlignmentFailed(format!(
                "no corner mark near ({}, {})",
                window.x, window.y
            )));
        }

        let bounds = Rect::new(
            min_x,
            min_y,
            (max_x - min_x + 1) as usize,
            (max_y - min_y + 1) as usize,
        );
        let nominal_area = (size * size) as f32;
        let fill = area as f32 / nominal_area;
        let compactness = area as f32 / (bounds.width * bounds.height) as f32;
        let min_fill = self.params.min_fill;

        if fill < min_fill || fill > 1.0 / min_fill || compactness < min_fill {
            #[cfg(feature = "logging")]
            warn!(
                "Rejected corner mark candidate in {:?}: fill {:.2}, compactness {:.2}",
                window, fill, compactness
            );
            return Err(FilmboxError::AlignmentFailed(format!(
                "corner mark near ({}, {}) has fill {:.2} and compactness {:.2}",
                window.x, window.y, fill, compactness
            )));
        }

        Ok(FoundMark {
            center: Point::new((sx / area as f64) as f32, (sy / area as f64) as f32),
            area,
            bounds,
        })
    }
}
