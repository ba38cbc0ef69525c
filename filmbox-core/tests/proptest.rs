//! Property-based tests using proptest

use bytes::BytesMut;
use filmbox_core::codec::crc64::{Crc64Codec, Crc64Config};
use filmbox_core::codec::{properties, Codec, ErasureSet};
use filmbox_core::constants::property_names::{LENGTH, POLYNOMIAL, SEED};
use filmbox_core::constants::{CRC64_ECMA_POLYNOMIAL, CRC64_SIZE};
use filmbox_core::geometry::{Point, Transform};
use filmbox_core::pipeline::{CodecPipeline, PipelineConfig, StageConfig};
use filmbox_core::render::{render_frame, FrameSymbols};
use filmbox_core::{FrameDescriptor, FrameTracker, TrackingMode};
use proptest::prelude::*;

fn crc64(seed: u64) -> Crc64Codec {
    Crc64Codec::new(Crc64Config {
        polynomial: CRC64_ECMA_POLYNOMIAL,
        seed,
    })
}

/// crc64 + crc32c + 16-byte hash: 28 bytes of fixed overhead
fn three_stage() -> CodecPipeline {
    CodecPipeline::from_config(&PipelineConfig {
        stages: vec![
            StageConfig {
                codec: "crc64".into(),
                properties: properties([(POLYNOMIAL, CRC64_ECMA_POLYNOMIAL), (SEED, 0)]),
            },
            StageConfig {
                codec: "crc32c".into(),
                properties: Default::default(),
            },
            StageConfig {
                codec: "hash".into(),
                properties: properties([(LENGTH, 16u64)]),
            },
        ],
    })
    .unwrap()
}

proptest! {
    #[test]
    fn prop_crc64_round_trip(
        seed in any::<u64>(),
        payload in prop::collection::vec(any::<u8>(), 0..1024)
    ) {
        let codec = crc64(seed);
        let encoded = codec.encode(BytesMut::from(&payload[..])).unwrap();
        prop_assert_eq!(encoded.len(), payload.len() + CRC64_SIZE);

        let decoded = codec.decode(encoded, &ErasureSet::new());
        prop_assert!(decoded.valid);
        prop_assert_eq!(&decoded.data[..], &payload[..]);
        prop_assert_eq!(decoded.stats.resolved_errors, 0);
        prop_assert_eq!(decoded.stats.unresolved_errors, 0);
    }

    #[test]
    fn prop_crc64_detects_bit_flip(
        seed in any::<u64>(),
        payload in prop::collection::vec(any::<u8>(), 0..512),
        flip in any::<prop::sample::Index>()
    ) {
        let codec = crc64(seed);
        let mut encoded = codec.encode(BytesMut::from(&payload[..])).unwrap();
        let bit = flip.index(encoded.len() * 8);
        encoded[bit / 8] ^= 1 << (bit % 8);

        let decoded = codec.decode(encoded, &ErasureSet::new());
        prop_assert!(!decoded.valid);
        prop_assert_eq!(decoded.data.len(), payload.len());
    }

    #[test]
    fn prop_crc64_decode_never_panics(
        data in prop::collection::vec(any::<u8>(), 0..256)
    ) {
        let decoded = crc64(0).decode(BytesMut::from(&data[..]), &ErasureSet::new());
        prop_assert_eq!(decoded.data.len(), data.len().saturating_sub(CRC64_SIZE));
    }

    #[test]
    fn prop_pipeline_rejects_small_capacity(c in 0usize..28) {
        prop_assert!(three_stage().init_capacity(c).is_err());
    }

    #[test]
    fn prop_pipeline_capacity_is_exact(c in 28usize..100_000) {
        let mut pipeline = three_stage();
        let cap = pipeline.init_capacity(c).unwrap();
        prop_assert_eq!(cap.decoded_data_size, c - 28);
        prop_assert_eq!(cap.total_overhead(), 28);
    }

    #[test]
    fn prop_pipeline_round_trip(
        payload in prop::collection::vec(any::<u8>(), 0..200)
    ) {
        let mut pipeline = three_stage();
        pipeline.init_capacity(228).unwrap();
        let encoded = pipeline.encode(BytesMut::from(&payload[..])).unwrap();
        prop_assert_eq!(encoded.len(), payload.len() + 28);

        let decoded = pipeline.decode(encoded, &ErasureSet::new());
        prop_assert!(decoded.valid);
        prop_assert_eq!(&decoded.data[..], &payload[..]);
        prop_assert!(decoded.stats.is_clean());
    }

    #[test]
    fn prop_simulated_tracking_is_exact(
        seed in any::<u64>(),
        bits in 1u8..=8,
        cell in 2usize..5
    ) {
        let frame = FrameDescriptor::default_layout(cell, 12, 4, bits);
        let symbols = FrameSymbols::patterned(&frame, seed);
        let img = render_frame(&frame, &symbols).unwrap();

        let mut tracker = FrameTracker::new(&frame).unwrap();
        let tracked = tracker.track_frame(&img.view(), &TrackingMode::Simulated).unwrap();
        prop_assert_eq!(tracked.metadata, symbols.metadata);
        prop_assert_eq!(tracked.content, symbols.content);
        prop_assert_eq!(tracked.calibration, symbols.calibration);
    }

    #[test]
    fn prop_similarity_fit_recovers_transform(
        scale in 0.5f32..2.0,
        rotation in -0.5f32..0.5,
        tx in -50.0f32..50.0,
        ty in -50.0f32..50.0
    ) {
        let truth = Transform::from_parts(scale, rotation, tx, ty);
        let nominal = [
            Point::new(10.0, 10.0),
            Point::new(200.0, 12.0),
            Point::new(8.0, 150.0),
            Point::new(205.0, 148.0),
        ];
        let observed: Vec<Point> = nominal.iter().map(|p| truth.apply(*p)).collect();

        let fit = Transform::fit_similarity(&nominal, &observed).unwrap();
        prop_assert!(fit.max_residual(&nominal, &observed) < 1e-2);
        prop_assert!((fit.scale() - scale).abs() < 1e-3);
        prop_assert!((fit.rotation() - rotation).abs() < 1e-3);
    }
}
