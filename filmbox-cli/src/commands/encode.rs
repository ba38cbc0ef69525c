use crate::config::FormatConfig;
use crate::imageio::save_gray;
use anyhow::{Context, Result};
use colored::*;
use filmbox_core::render::render_shifted;
use filmbox_core::unboxer::{payload_capacity, payload_symbols};
use std::fs;
use std::io::{self, Read};
use tracing::info;

/// Box the payload read from `input` into a frame image written to `output`
///
/// A non-zero offset places the frame inside a larger canvas, the way a
/// capture would see it slightly out of position.
pub fn execute(
    config: &str,
    input: &str,
    output: &str,
    offset_x: i64,
    offset_y: i64,
) -> Result<()> {
    info!("Encoding {} into {}", input, output);

    let config = FormatConfig::load(config)?;
    let frame = config.frame()?;
    let mut pipeline = config.pipeline()?;

    // Read input file or stdin
    let payload = if input == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        buf
    } else {
        fs::read(input).with_context(|| format!("Failed to read input file: {}", input))?
    };

    let symbols = payload_symbols(&frame, &mut pipeline, &payload)
        .with_context(|| format!("Failed to box {} bytes", payload.len()))?;
    let usable = pipeline
        .capacity()
        .map(payload_capacity)
        .unwrap_or_default();

    let img = render_shifted(
        &frame,
        &symbols,
        frame.width + offset_x.unsigned_abs() as usize,
        frame.height + offset_y.unsigned_abs() as usize,
        offset_x,
        offset_y,
    )?;
    save_gray(&img, output)?;

    println!(
        "{} Boxed {} of {} usable bytes into a {}x{} frame",
        "✓".green(),
        payload.len(),
        usable,
        img.width,
        img.height
    );

    Ok(())
}
