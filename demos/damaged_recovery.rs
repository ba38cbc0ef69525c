//! Damaged frame recovery example
//!
//! Renders a frame slightly out of position, scratches one content row and
//! recovers it. Run with `--features fec-rs` to repair the scratch with the
//! Reed-Solomon stage; without it the damage is only detected.

use filmbox_core::codec::{properties, ErasureSet};
use filmbox_core::constants::property_names::{POLYNOMIAL, SEED};
use filmbox_core::constants::CRC64_ECMA_POLYNOMIAL;
use filmbox_core::pipeline::{CodecPipeline, PipelineConfig, StageConfig};
use filmbox_core::render::render_shifted;
use filmbox_core::unboxer::payload_symbols;
use filmbox_core::{AnalogParams, FrameDescriptor, TrackingMode, Unboxer};

fn stages() -> Vec<StageConfig> {
    let mut stages = Vec::new();
    #[cfg(feature = "fec-rs")]
    {
        use filmbox_core::constants::property_names::{DATA_SHARDS, PARITY_SHARDS};
        stages.push(StageConfig {
            codec: "reed-solomon".into(),
            properties: properties([(DATA_SHARDS, 8u64), (PARITY_SHARDS, 4u64)]),
        });
    }
    stages.push(StageConfig {
        codec: "crc64".into(),
        properties: properties([(POLYNOMIAL, CRC64_ECMA_POLYNOMIAL), (SEED, 0)]),
    });
    stages
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Filmbox Damaged Recovery Example\n");

    let frame = FrameDescriptor::default_layout(4, 32, 12, 2);
    let mut pipeline = CodecPipeline::from_config(&PipelineConfig { stages: stages() })?;
    println!("Pipeline: {:?}", pipeline.stage_names());

    let payload = b"Recovered despite the scratch";
    let symbols = payload_symbols(&frame, &mut pipeline, payload)?;

    // Capture offset by (3, 2) pixels
    let (dx, dy) = (3, 2);
    let mut img = render_shifted(&frame, &symbols, frame.width + 8, frame.height + 8, dx, dy)?;

    // Scratch the first content row
    let content = frame.content.rect;
    let cell_height = content.height / frame.content.grid.rows;
    img.fill_rect(content.x + dx, content.y + dy, content.width, cell_height, 0);
    println!("Scratched content row 0 ({} symbols)", frame.content.grid.columns);

    // The scratch is visible, so its bytes can be declared as erasures
    let bits = frame.content.grid.bits_per_symbol as usize;
    let scratched_bytes = frame.content.grid.columns * bits / 8;
    let erasures = ErasureSet::from_positions(0..scratched_bytes);

    let mut unboxer = Unboxer::new(&frame, pipeline)?;
    let out = unboxer.unbox_with_erasures(
        &img.view(),
        &TrackingMode::Analog(AnalogParams::default()),
        &erasures,
    )?;
    let offset = unboxer.tracker().last_transform().offset();
    println!("Aligned with offset ({:.2}, {:.2})", offset.x, offset.y);

    println!("\n=== Recovery ===");
    println!("Valid:              {}", out.valid);
    println!("Resolved errors:    {}", out.stats.resolved_errors);
    println!("Unresolved errors:  {}", out.stats.unresolved_errors);
    if out.valid {
        println!("Payload:            {}", String::from_utf8_lossy(&out.payload));
    } else {
        println!("Damage detected; enable fec-rs to repair it");
    }

    Ok(())
}
