use crate::config::FormatConfig;
use anyhow::{Context, Result};
use colored::*;
use filmbox_core::constants::LENGTH_PREFIX_SIZE;
use filmbox_core::unboxer::payload_capacity;

/// Print negotiated sizes of every pipeline stage for the configured frame
pub fn execute(config: &str) -> Result<()> {
    let config = FormatConfig::load(config)?;
    let frame = config.frame()?;
    let mut pipeline = config.pipeline()?;
    let names = pipeline.stage_names();

    let container = frame.content.grid.byte_capacity();
    let capacity = pipeline
        .init_capacity(container)
        .with_context(|| format!("Pipeline does not fit in {} content bytes", container))?;

    println!("\n=== Pipeline Capacity ===");
    println!("Content container:  {} bytes", container);
    for (name, stage) in names.iter().zip(&capacity.stages) {
        println!(
            "  {:<14} {:>8} -> {:<8} (overhead {})",
            name,
            stage.encoded_data_size,
            stage.decoded_data_size,
            stage.overhead()
        );
    }
    println!("Total overhead:     {} bytes", capacity.total_overhead());
    println!("Length prefix:      {} bytes", LENGTH_PREFIX_SIZE);
    println!(
        "Usable payload:     {} bytes",
        payload_capacity(capacity).to_string().green()
    );

    Ok(())
}
