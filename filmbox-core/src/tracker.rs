//! Frame tracking: align a captured frame and sample its three regions

use crate::cornermark::{AnalogParams, CornerMarkLocator};
use crate::error::FilmboxError;
use crate::frame::{FrameDescriptor, RegionKind};
use crate::geometry::Transform;
use crate::image::ImageView;
use crate::painter::{NullPainter, Painter};
use crate::sampler::Sampler;
use serde::{Deserialize, Serialize};

#[cfg(feature = "logging")]
use tracing::{debug, error, warn};

/// How the captured image relates to nominal frame coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TrackingMode {
    /// Synthetic image already in frame coordinates; no alignment
    #[default]
    Simulated,
    /// Physically captured image; corner marks are located first
    Analog(AnalogParams),
}

/// Raw symbol streams of one tracked frame
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedFrame {
    /// Metadata region symbols, row-major
    pub metadata: Vec<u8>,
    /// Content region symbols, row-major
    pub content: Vec<u8>,
    /// Calibration bar symbols, row-major
    pub calibration: Vec<u8>,
    /// Nominal-to-image transform used for sampling
    pub transform: Transform,
}

/// A tracking session bound to one frame layout
///
/// Owns one sampler per region. The descriptor is borrowed and may be shared
/// with other trackers running on other threads.
#[derive(Debug)]
pub struct FrameTracker<'a> {
    frame: &'a FrameDescriptor,
    metadata_sampler: Sampler<'a>,
    content_sampler: Sampler<'a>,
    calibration_sampler: Sampler<'a>,
    transform: Transform,
    faulted: bool,
}

impl<'a> FrameTracker<'a> {
    /// Validate `frame` and build the three samplers
    pub fn new(frame: &'a FrameDescriptor) -> Result<Self, FilmboxError> {
        frame.validate()?;

        Ok(Self {
            frame,
            metadata_sampler: Sampler::new(RegionKind::Metadata, &frame.metadata),
            content_sampler: Sampler::new(RegionKind::Content, &frame.content),
            calibration_sampler: Sampler::new(RegionKind::CalibrationBar, &frame.calibration_bar),
            transform: Transform::identity(),
            faulted: false,
        })
    }

    /// Layout this tracker samples
    pub fn frame(&self) -> &'a FrameDescriptor {
        self.frame
    }

    /// Transform applied on the most recent successful track
    pub fn last_transform(&self) -> &Transform {
        &self.transform
    }

    /// Whether an earlier geometry mismatch has ended the session
    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    /// Track one captured frame
    pub fn track_frame(
        &mut self,
        image: &ImageView<'_>,
        mode: &TrackingMode,
    ) -> Result<TrackedFrame, FilmboxError> {
        self.track_frame_with_painter(image, mode, &mut NullPainter)
    }

    /// Track one captured frame, reporting overlay primitives to `painter`
    ///
    /// In analog mode an alignment failure returns before any region is
    /// sampled. A sample falling off the image faults the tracker: later
    /// calls return [`FilmboxError::TrackerFaulted`].
    pub fn track_frame_with_painter(
        &mut self,
        image: &ImageView<'_>,
        mode: &TrackingMode,
        painter: &mut dyn Painter,
    ) -> Result<TrackedFrame, FilmboxError> {
        if self.faulted {
            return Err(FilmboxError::TrackerFaulted);
        }

        let transform = match mode {
            TrackingMode::Simulated => Transform::identity(),
            TrackingMode::Analog(params) => self.align(image, params, painter)?,
        };

        match self.sample_all(image, &transform, painter) {
            Ok(tracked) => {
                self.transform = transform;
                Ok(tracked)
            }
            Err(e) => {
                if matches!(e, FilmboxError::SamplingOutOfBounds { .. }) {
                    #[cfg(feature = "logging")]
                    error!("Sampling left the image, faulting tracker session: {}", e);
                    self.faulted = true;
                }
                Err(e)
            }
        }
    }

    fn align(
        &self,
        image: &ImageView<'_>,
        params: &AnalogParams,
        painter: &mut dyn Painter,
    ) -> Result<Transform, FilmboxError> {
        let locator = CornerMarkLocator::new(*params);
        match locator.locate(image, self.frame, painter) {
            Ok(t) => {
                #[cfg(feature = "logging")]
                debug!(
                    "Aligned frame: offset ({:.2}, {:.2}), scale {:.4}, rotation {:.4}",
                    t.offset().x,
                    t.offset().y,
                    t.scale(),
                    t.rotation()
                );
                Ok(t)
            }
            Err(e) => {
                #[cfg(feature = "logging")]
                warn!("Frame alignment failed: {}", e);
                Err(e)
            }
        }
    }

    fn sample_all(
        &self,
        image: &ImageView<'_>,
        transform: &Transform,
        painter: &mut dyn Painter,
    ) -> Result<TrackedFrame, FilmboxError> {
        #[cfg(feature = "logging")]
        debug!(
            "Sampling {} + {} + {} symbols from {}x{} image",
            self.metadata_sampler.grid().symbol_count(),
            self.content_sampler.grid().symbol_count(),
            self.calibration_sampler.grid().symbol_count(),
            image.width,
            image.height
        );

        Ok(TrackedFrame {
            metadata: self.metadata_sampler.sample(image, transform, painter)?,
            content: self.content_sampler.sample(image, transform, painter)?,
            calibration: self.calibration_sampler.sample(image, transform, painter)?,
            transform: *transform,
        })
    }
}
