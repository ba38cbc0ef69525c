//! Grayscale PNG reading and writing

use anyhow::{anyhow, Context, Result};
use filmbox_core::GrayImage;

/// Load any supported image file as 8-bit grayscale
pub fn load_gray(path: &str) -> Result<GrayImage> {
    let img = image::open(path)
        .with_context(|| format!("Failed to read image: {}", path))?
        .to_luma8();
    let (width, height) = img.dimensions();
    Ok(GrayImage {
        width: width as usize,
        height: height as usize,
        data: img.into_raw(),
    })
}

/// Write an 8-bit grayscale PNG
pub fn save_gray(img: &GrayImage, path: &str) -> Result<()> {
    let buffer = image::GrayImage::from_raw(img.width as u32, img.height as u32, img.data.clone())
        .ok_or_else(|| anyhow!("Pixel buffer does not match {}x{}", img.width, img.height))?;
    buffer
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("Failed to write image: {}", path))
}
