//! Debug overlay sink
//!
//! The tracker reports what it looked at (search windows, sampling points) to a
//! [`Painter`]. Painting is best effort and never affects tracking results.

use crate::frame::RegionKind;
use crate::geometry::{Point, Rect};

/// Receives overlay primitives in image coordinates
pub trait Painter {
    /// Outline a rectangle
    fn draw_rect(&mut self, _rect: Rect, _color: u8) {}

    /// Mark a single sampling point and the symbol read there
    fn draw_point(&mut self, _region: RegionKind, _point: Point, _symbol: u8) {}
}

/// Painter that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPainter;

impl Painter for NullPainter {}

/// Painter that keeps every call, useful in tests and offline debugging
#[derive(Debug, Clone, Default)]
pub struct RecordingPainter {
    /// Rectangles in call order
    pub rects: Vec<(Rect, u8)>,
    /// Sampling points in call order
    pub points: Vec<(RegionKind, Point, u8)>,
}

impl RecordingPainter {
    /// Number of sampling points reported for `region`
    pub fn points_in(&self, region: RegionKind) -> usize {
        self.points.iter().filter(|(r, _, _)| *r == region).count()
    }
}

impl Painter for RecordingPainter {
    fn draw_rect(&mut self, rect: Rect, color: u8) {
        self.rects.push((rect, color));
    }

    fn draw_point(&mut self, region: RegionKind, point: Point, symbol: u8) {
        self.points.push((region, point, symbol));
    }
}
