//! Basic boxing example: payload -> frame image -> payload

use filmbox_core::codec::properties;
use filmbox_core::constants::property_names::{POLYNOMIAL, SEED};
use filmbox_core::constants::CRC64_ECMA_POLYNOMIAL;
use filmbox_core::pipeline::{CodecPipeline, PipelineConfig, StageConfig};
use filmbox_core::{box_payload, FrameDescriptor, TrackingMode, Unboxer};

fn pipeline() -> Result<CodecPipeline, filmbox_core::FilmboxError> {
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
        ],
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Filmbox Basic Encoding Example\n");

    let frame = FrameDescriptor::default_layout(4, 48, 16, 2);
    println!(
        "Frame {}x{} px, {} content symbols of {} bits",
        frame.width,
        frame.height,
        frame.content.grid.symbol_count(),
        frame.content.grid.bits_per_symbol
    );

    let payload = b"This frame carries some archival data";
    let img = box_payload(&frame, &mut pipeline()?, payload)?;
    println!("Rendered {} payload bytes into {} pixels", payload.len(), img.data.len());

    let mut unboxer = Unboxer::new(&frame, pipeline()?)?;
    let capacity = unboxer.capacity()?;
    println!(
        "Container {} bytes, overhead {} bytes, usable {} bytes",
        capacity.encoded_size,
        capacity.total_overhead(),
        unboxer.payload_capacity()?
    );

    let out = unboxer.unbox(&img.view(), &TrackingMode::Simulated)?;
    println!("\nValid: {}", out.valid);
    println!("Payload: {}", String::from_utf8_lossy(&out.payload));

    Ok(())
}
