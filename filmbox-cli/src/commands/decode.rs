use crate::config::FormatConfig;
use crate::imageio::load_gray;
use anyhow::{bail, Context, Result};
use colored::*;
use filmbox_core::{AnalogParams, TrackingMode, Unboxer};
use std::fs;
use std::io::{self, Write};
use tracing::{info, warn};

/// Recover the payload of the frame image `input`
///
/// `analog` forces corner-mark alignment even when the config asks for
/// simulated tracking. The payload goes to `output`, or stdout when absent.
pub fn execute(config: &str, input: &str, analog: bool, output: Option<&str>) -> Result<()> {
    info!("Decoding frame image: {}", input);

    let config = FormatConfig::load(config)?;
    let frame = config.frame()?;
    let pipeline = config.pipeline()?;
    let mode = match (analog, config.tracking) {
        (true, TrackingMode::Simulated) => TrackingMode::Analog(AnalogParams::default()),
        (_, mode) => mode,
    };

    let img = load_gray(input)?;
    let mut unboxer = Unboxer::new(&frame, pipeline).context("Failed to set up unboxer")?;
    let unboxed = unboxer
        .unbox(&img.view(), &mode)
        .with_context(|| format!("Failed to track frame in {}", input))?;

    let transform = unboxer.tracker().last_transform();
    eprintln!("\n=== Decode Results ===");
    eprintln!(
        "Alignment:          offset ({:.2}, {:.2}), scale {:.4}",
        transform.offset().x,
        transform.offset().y,
        transform.scale()
    );
    eprintln!("Payload bytes:      {}", unboxed.payload.len());
    eprintln!("Resolved errors:    {}", unboxed.stats.resolved_errors);
    eprintln!("Unresolved errors:  {}", unboxed.stats.unresolved_errors);
    eprintln!("FEC load:           {:.2}", unboxed.stats.fec_load());

    if !unboxed.valid {
        warn!("Frame content failed validation");
        eprintln!("{} Frame failed validation", "✗".red());
        bail!("Frame content in {} failed validation", input);
    }
    eprintln!("{} Frame is valid", "✓".green());

    match output {
        Some(path) => fs::write(path, &unboxed.payload)
            .with_context(|| format!("Failed to write output file: {}", path))?,
        None => io::stdout().write_all(&unboxed.payload)?,
    }

    Ok(())
}
