//! Fuzzing entry points for filmbox-core
//!
//! To use with cargo-fuzz:
//! 1. Install cargo-fuzz: cargo install cargo-fuzz
//! 2. Run fuzzer: cargo fuzz run fuzz_pipeline_decode

use bytes::BytesMut;
use filmbox_core::codec::{properties, ErasureSet};
use filmbox_core::constants::property_names::{LENGTH, POLYNOMIAL, SEED};
use filmbox_core::constants::CRC64_ECMA_POLYNOMIAL;
use filmbox_core::pipeline::{CodecPipeline, PipelineConfig, StageConfig};
use filmbox_core::{AnalogParams, FrameDescriptor, FrameTracker, ImageView, TrackingMode};

fn pipeline() -> Option<CodecPipeline> {
    CodecPipeline::from_config(&PipelineConfig {
        stages: vec![
            StageConfig {
                codec: "crc64".into(),
                properties: properties([(POLYNOMIAL, CRC64_ECMA_POLYNOMIAL), (SEED, 0)]),
            },
            StageConfig {
                codec: "hash".into(),
                properties: properties([(LENGTH, 8u64)]),
            },
        ],
    })
    .ok()
}

/// Decode arbitrary bytes through a two-stage pipeline
pub fn fuzz_pipeline_decode(data: &[u8]) {
    if let Some(pipeline) = pipeline() {
        // Should never panic, whatever the buffer length
        let erasures = ErasureSet::from_positions(data.iter().take(4).map(|&b| b as usize));
        let _ = pipeline.decode(BytesMut::from(data), &erasures);
    }
}

/// Track arbitrary pixels as a frame image in both modes
pub fn fuzz_track(data: &[u8]) {
    let frame = FrameDescriptor::default_layout(2, 12, 4, 2);
    let Some((&w, rest)) = data.split_first() else {
        return;
    };
    // Let the input pick a width around the nominal one
    let width = frame.width.saturating_sub(8) + (w as usize % 16);
    if width == 0 {
        return;
    }
    let height = rest.len() / width;
    let Ok(view) = ImageView::new(rest, width, height, width) else {
        return;
    };

    for mode in [
        TrackingMode::Simulated,
        TrackingMode::Analog(AnalogParams::default()),
    ] {
        if let Ok(mut tracker) = FrameTracker::new(&frame) {
            let _ = tracker.track_frame(&view, &mode);
        }
    }
}

/// Unpack arbitrary bytes as symbols of every depth
pub fn fuzz_symbols(data: &[u8]) {
    use filmbox_core::symbols::{pack, unpack};

    for bits in 0..=9u8 {
        if let Ok(symbols) = unpack(data, bits, data.len()) {
            let _ = pack(&symbols, bits);
        }
    }
}
