//! # Filmbox Core
//!
//! Frame tracking and codec pipeline for optical data-storage frames.
//!
//! A payload is encoded through a chain of codecs, packed into symbols and
//! rendered onto a frame with corner marks. Recovery locates the frame in a
//! captured image, samples its regions and decodes the content back through
//! the same chain.
//!
//! ## Modules
//!
//! - `image`, `geometry`: pixel buffers, points, rects and similarity transforms
//! - `frame`: frame layout (metadata, content, calibration bar, corner marks)
//! - `sampler`, `cornermark`, `tracker`: alignment and symbol sampling
//! - `symbols`, `render`, `painter`: symbol packing, synthetic frames, debug overlay
//! - `codec`, `pipeline`, `stats`: codec stages, capacity negotiation, decode metrics
//! - `unboxer`: frame image to payload and back

#![warn(missing_docs)]

pub mod codec;
pub mod constants;
pub mod cornermark;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod image;
pub mod painter;
pub mod pipeline;
pub mod render;
pub mod sampler;
pub mod stats;
pub mod symbols;
pub mod tracker;
pub mod unboxer;

// Re-export commonly used types
pub use codec::{Codec, CodecCapacity, Decoded, ErasureSet, PropertyMap, PropertyValue};
pub use cornermark::AnalogParams;
pub use error::FilmboxError;
pub use frame::{FrameDescriptor, Region, RegionKind, SymbolGrid};
pub use image::{GrayImage, ImageView};
pub use pipeline::{CodecPipeline, PipelineConfig, PipelineDecode, StageConfig};
pub use stats::DecodeStats;
pub use tracker::{FrameTracker, TrackedFrame, TrackingMode};
pub use unboxer::{box_payload, UnboxedFrame, Unboxer};

/// Result type alias for filmbox operations
pub type Result<T> = core::result::Result<T, FilmboxError>;
