//! Unboxing: from a captured frame image to a validated payload
//!
//! The content region carries the pipeline's encoded container, packed
//! MSB-first into symbols. Inside the container the payload is preceded by
//! its length as a 4-byte big-endian prefix, so the length is covered by
//! every codec stage. The metadata region repeats the length as a 4-byte
//! big-endian header; a header that disagrees with the prefix marks the
//! frame invalid. [`box_payload`] is the encode mirror.

use crate::codec::ErasureSet;
use crate::constants::{LENGTH_PREFIX_SIZE, METADATA_HEADER_SIZE};
use crate::error::FilmboxError;
use crate::frame::{FrameDescriptor, SymbolGrid};
use crate::image::{GrayImage, ImageView};
use crate::pipeline::{CodecPipeline, PipelineCapacity};
use crate::render::{calibration_ramp, render_frame, FrameSymbols};
use crate::stats::DecodeStats;
use crate::symbols::{pack, unpack};
use crate::tracker::{FrameTracker, TrackingMode};
use bytes::{BufMut, BytesMut};

#[cfg(feature = "logging")]
use tracing::{debug, info, warn};

/// Payload and diagnostics recovered from one frame
#[derive(Debug, Clone, PartialEq)]
pub struct UnboxedFrame {
    /// Decoded payload, cut to the length announced in the content prefix
    pub payload: BytesMut,
    /// Whether every codec stage validated and both length fields agree
    pub valid: bool,
    /// Metrics summed over the pipeline stages
    pub stats: DecodeStats,
    /// Raw metadata bytes
    pub metadata: BytesMut,
    /// Calibration bar symbols as sampled
    pub calibration: Vec<u8>,
}

/// Tracker and pipeline bound to one frame layout
#[derive(Debug)]
pub struct Unboxer<'a> {
    tracker: FrameTracker<'a>,
    pipeline: CodecPipeline,
}

impl<'a> Unboxer<'a> {
    /// Build a tracker for `frame` and size `pipeline` to its content region
    pub fn new(frame: &'a FrameDescriptor, mut pipeline: CodecPipeline) -> Result<Self, FilmboxError> {
        let tracker = FrameTracker::new(frame)?;
        check_metadata(frame)?;
        let capacity = pipeline.init_capacity(frame.content.grid.byte_capacity())?;
        check_prefix(capacity)?;
        Ok(Self { tracker, pipeline })
    }

    /// Negotiated pipeline sizes
    pub fn capacity(&self) -> Result<&PipelineCapacity, FilmboxError> {
        self.pipeline
            .capacity()
            .ok_or(FilmboxError::CapacityNotInitialized)
    }

    /// Largest payload a frame can carry
    pub fn payload_capacity(&self) -> Result<usize, FilmboxError> {
        self.capacity().map(payload_capacity)
    }

    /// Tracker session state
    pub fn tracker(&self) -> &FrameTracker<'a> {
        &self.tracker
    }

    /// Track `image` and decode its content
    ///
    /// Tracking errors are returned as is. A failed codec validation is not
    /// an error: the frame comes back with `valid == false`.
    pub fn unbox(
        &mut self,
        image: &ImageView<'_>,
        mode: &TrackingMode,
    ) -> Result<UnboxedFrame, FilmboxError> {
        self.unbox_with_erasures(image, mode, &ErasureSet::new())
    }

    /// Like [`unbox`](Self::unbox), with known-bad byte positions
    ///
    /// `erasures` index the encoded container, i.e. the content bytes in
    /// symbol order, and go to the outermost codec stage.
    pub fn unbox_with_erasures(
        &mut self,
        image: &ImageView<'_>,
        mode: &TrackingMode,
        erasures: &ErasureSet,
    ) -> Result<UnboxedFrame, FilmboxError> {
        let frame = self.tracker.frame();
        let tracked = self.tracker.track_frame(image, mode)?;
        let encoded_len = self.capacity()?.encoded_data_size;

        let metadata = pack(&tracked.metadata, frame.metadata.grid.bits_per_symbol)?;
        let mut content = pack(&tracked.content, frame.content.grid.bits_per_symbol)?;
        content.truncate(encoded_len);

        let decoded = self.pipeline.decode(content, erasures);
        let mut valid = decoded.valid;
        let mut data = decoded.data;
        if data.len() < LENGTH_PREFIX_SIZE {
            data.resize(LENGTH_PREFIX_SIZE, 0);
            valid = false;
        }
        let mut payload = data.split_off(LENGTH_PREFIX_SIZE);

        let announced = read_u32(&data);
        let header = read_u32(&metadata);
        if header != announced {
            #[cfg(feature = "logging")]
            warn!(
                "Metadata header announces {} bytes, content prefix {}",
                header, announced
            );
            valid = false;
        }

        if announced <= payload.len() {
            payload.truncate(announced);
        } else {
            #[cfg(feature = "logging")]
            warn!(
                "Content prefix announces {} bytes but only {} were decoded",
                announced,
                payload.len()
            );
            valid = false;
        }

        #[cfg(feature = "logging")]
        debug!(
            "Unboxed {} bytes, valid={}, erasures={}, resolved={}, unresolved={}",
            payload.len(),
            valid,
            erasures.len(),
            decoded.stats.resolved_errors,
            decoded.stats.unresolved_errors
        );

        Ok(UnboxedFrame {
            payload,
            valid,
            stats: decoded.stats,
            metadata,
            calibration: tracked.calibration,
        })
    }
}

/// Largest payload that fits a negotiated pipeline once the length prefix is taken
pub fn payload_capacity(capacity: &PipelineCapacity) -> usize {
    capacity.decoded_data_size.saturating_sub(LENGTH_PREFIX_SIZE)
}

/// Symbols of a frame carrying `payload`
///
/// Negotiates `pipeline` against the content region, prefixes the payload
/// with its length, zero-pads to the usable size and encodes it.
pub fn payload_symbols(
    frame: &FrameDescriptor,
    pipeline: &mut CodecPipeline,
    payload: &[u8],
) -> Result<FrameSymbols, FilmboxError> {
    frame.validate()?;
    check_metadata(frame)?;
    let capacity = pipeline.init_capacity(frame.content.grid.byte_capacity())?;
    check_prefix(capacity)?;
    let usable = capacity.decoded_data_size;
    let room = payload_capacity(capacity);
    if payload.len() > room {
        return Err(FilmboxError::PayloadSizeMismatch {
            expected: room,
            actual: payload.len(),
        });
    }
    let length = u32::try_from(payload.len()).map_err(|_| FilmboxError::PayloadSizeMismatch {
        expected: u32::MAX as usize,
        actual: payload.len(),
    })?;

    let mut padded = BytesMut::with_capacity(usable);
    padded.put_u32(length);
    padded.put_slice(payload);
    padded.resize(usable, 0);
    let encoded = pipeline.encode(padded)?;

    let content = to_symbols(&encoded, &frame.content.grid)?;
    let mut header = BytesMut::with_capacity(METADATA_HEADER_SIZE);
    header.put_u32(length);
    let metadata = to_symbols(&header, &frame.metadata.grid)?;

    #[cfg(feature = "logging")]
    info!(
        "Boxed {} of {} usable bytes into {} content symbols",
        payload.len(),
        room,
        content.len()
    );

    Ok(FrameSymbols {
        metadata,
        content,
        calibration: calibration_ramp(&frame.calibration_bar.grid),
    })
}

/// Encode `payload` and render it as a frame image in nominal coordinates
pub fn box_payload(
    frame: &FrameDescriptor,
    pipeline: &mut CodecPipeline,
    payload: &[u8],
) -> Result<GrayImage, FilmboxError> {
    render_frame(frame, &payload_symbols(frame, pipeline, payload)?)
}

fn read_u32(bytes: &[u8]) -> usize {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize
}

fn to_symbols(bytes: &[u8], grid: &SymbolGrid) -> Result<Vec<u8>, FilmboxError> {
    let count = grid.symbol_count();
    let needed = (count * grid.bits_per_symbol as usize).div_ceil(8);
    let mut padded = Vec::with_capacity(needed);
    padded.extend_from_slice(bytes);
    padded.resize(needed.max(bytes.len()), 0);
    unpack(&padded, grid.bits_per_symbol, count)
}

fn check_metadata(frame: &FrameDescriptor) -> Result<(), FilmboxError> {
    let capacity = frame.metadata.grid.byte_capacity();
    if capacity < METADATA_HEADER_SIZE {
        return Err(FilmboxError::MalformedFrame(format!(
            "metadata region holds {} bytes, the length header needs {}",
            capacity, METADATA_HEADER_SIZE
        )));
    }
    Ok(())
}

fn check_prefix(capacity: &PipelineCapacity) -> Result<(), FilmboxError> {
    if capacity.decoded_data_size < LENGTH_PREFIX_SIZE {
        return Err(FilmboxError::MalformedFrame(format!(
            "pipeline leaves {} bytes, the length prefix needs {}",
            capacity.decoded_data_size, LENGTH_PREFIX_SIZE
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::properties;
    use crate::constants::property_names::{POLYNOMIAL, SEED};
    use crate::constants::CRC64_ECMA_POLYNOMIAL;
    use crate::cornermark::AnalogParams;
    use crate::pipeline::{PipelineConfig, StageConfig};
    use crate::render::render_shifted;

    fn frame() -> FrameDescriptor {
        FrameDescriptor::default_layout(4, 24, 8, 2)
    }

    fn pipeline() -> CodecPipeline {
        CodecPipeline::from_config(&PipelineConfig {
            stages: vec![StageConfig {
                codec: "crc64".into(),
                properties: properties([(POLYNOMIAL, CRC64_ECMA_POLYNOMIAL), (SEED, 0)]),
            }],
        })
        .unwrap()
    }

    #[test]
    fn test_round_trip_simulated() {
        let frame = frame();
        let img = box_payload(&frame, &mut pipeline(), b"filmbox").unwrap();

        let mut unboxer = Unboxer::new(&frame, pipeline()).unwrap();
        // 24 * 8 symbols of 2 bits = 48 bytes, 40 after the trailer, 36 after the prefix
        assert_eq!(unboxer.capacity().unwrap().decoded_data_size, 40);
        assert_eq!(unboxer.payload_capacity().unwrap(), 36);

        let out = unboxer.unbox(&img.view(), &TrackingMode::Simulated).unwrap();
        assert!(out.valid);
        assert_eq!(&out.payload[..], b"filmbox");
        assert_eq!(&out.metadata[..4], &7u32.to_be_bytes());
        assert_eq!(out.calibration, calibration_ramp(&frame.calibration_bar.grid));
    }

    #[test]
    fn test_round_trip_analog_shifted() {
        let frame = frame();
        let symbols = payload_symbols(&frame, &mut pipeline(), b"shifted").unwrap();
        let img = render_shifted(&frame, &symbols, frame.width + 8, frame.height + 8, 3, 2).unwrap();

        let mut unboxer = Unboxer::new(&frame, pipeline()).unwrap();
        let out = unboxer
            .unbox(&img.view(), &TrackingMode::Analog(AnalogParams::default()))
            .unwrap();
        assert!(out.valid);
        assert_eq!(&out.payload[..], b"shifted");
    }

    #[test]
    fn test_corrupted_content_is_invalid() {
        let frame = frame();
        let mut symbols = payload_symbols(&frame, &mut pipeline(), b"data").unwrap();
        // Symbol 20 sits in byte 5, inside the payload
        symbols.content[20] ^= 0b11;
        let img = render_frame(&frame, &symbols).unwrap();

        let mut unboxer = Unboxer::new(&frame, pipeline()).unwrap();
        let out = unboxer.unbox(&img.view(), &TrackingMode::Simulated).unwrap();
        assert!(!out.valid);
        assert_eq!(out.payload.len(), 4);
    }

    #[test]
    fn test_corrupted_metadata_header_is_invalid() {
        let frame = frame();
        let mut symbols = payload_symbols(&frame, &mut pipeline(), b"filmbox").unwrap();
        // Header bit 29 drops, so the metadata reads 3 instead of 7
        symbols.metadata[29] = 0;
        let img = render_frame(&frame, &symbols).unwrap();

        let mut unboxer = Unboxer::new(&frame, pipeline()).unwrap();
        let out = unboxer.unbox(&img.view(), &TrackingMode::Simulated).unwrap();
        assert!(!out.valid);
        assert_eq!(&out.metadata[..4], &3u32.to_be_bytes());
        assert_eq!(&out.payload[..], b"filmbox");
    }

    #[test]
    fn test_corrupted_length_prefix_is_invalid() {
        let frame = frame();
        let mut symbols = payload_symbols(&frame, &mut pipeline(), b"filmbox").unwrap();
        // Last symbol of the prefix: 7 becomes 4
        symbols.content[15] = 0;
        let img = render_frame(&frame, &symbols).unwrap();

        let mut unboxer = Unboxer::new(&frame, pipeline()).unwrap();
        let out = unboxer.unbox(&img.view(), &TrackingMode::Simulated).unwrap();
        assert!(!out.valid);
    }

    #[test]
    fn test_payload_too_large() {
        let frame = frame();
        assert!(matches!(
            box_payload(&frame, &mut pipeline(), &[0u8; 37]),
            Err(FilmboxError::PayloadSizeMismatch {
                expected: 36,
                actual: 37
            })
        ));
        assert!(box_payload(&frame, &mut pipeline(), &[0u8; 36]).is_ok());
    }

    #[test]
    fn test_metadata_too_small() {
        let mut frame = frame();
        frame.metadata.grid.columns = 8;
        assert!(matches!(
            Unboxer::new(&frame, pipeline()),
            Err(FilmboxError::MalformedFrame(_))
        ));
    }

    #[test]
    fn test_no_room_for_length_prefix() {
        // 24 one-bit symbols = 3 bytes, less than the prefix
        let frame = FrameDescriptor::default_layout(4, 24, 1, 1);
        let err = Unboxer::new(&frame, CodecPipeline::new(Vec::new())).unwrap_err();
        assert!(matches!(err, FilmboxError::MalformedFrame(ref m) if m.contains("prefix")));
    }
}
