use crate::config::FormatConfig;
use anyhow::Result;
use colored::*;
use filmbox_core::RegionKind;

/// Validate the configured frame layout and print it
pub fn execute(config: &str) -> Result<()> {
    let config = FormatConfig::load(config)?;
    let frame = config.frame.descriptor();

    println!("\n=== Frame Layout ===");
    println!("Frame size:         {}x{}", frame.width, frame.height);
    for kind in RegionKind::ALL {
        let region = frame.region(kind);
        println!(
            "{:<19} {}x{} at ({}, {}), {}x{} symbols of {} bit(s)",
            format!("{}:", kind.as_str()),
            region.rect.width,
            region.rect.height,
            region.rect.x,
            region.rect.y,
            region.grid.columns,
            region.grid.rows,
            region.grid.bits_per_symbol
        );
    }
    let marks = &frame.corner_marks;
    println!(
        "Corner marks:       {}px, inset {}, quiet zone {}",
        marks.size, marks.inset, marks.quiet_zone
    );

    match frame.validate() {
        Ok(()) => {
            println!("{} Layout is valid", "✓".green());
            Ok(())
        }
        Err(e) => {
            println!("{} {}", "✗".red(), e);
            Err(e.into())
        }
    }
}
