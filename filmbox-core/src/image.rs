//! 8-bit grayscale pixel buffers

use crate::error::FilmboxError;

/// Borrowed 8-bit image supplied by the capture side
///
/// Rows are `stride` bytes apart; only the first `width` bytes of a row are
/// pixels. The tracker reads the buffer and never keeps it past a call.
#[derive(Clone, Copy, Debug)]
pub struct ImageView<'a> {
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
    /// Distance between row starts, in bytes
    pub stride: usize,
    data: &'a [u8],
}

impl<'a> ImageView<'a> {
    /// Wrap a row-major buffer, checking that it covers every row
    pub fn new(
        data: &'a [u8],
        width: usize,
        height: usize,
        stride: usize,
    ) -> Result<Self, FilmboxError> {
        if stride < width {
            return Err(FilmboxError::InvalidImage(format!(
                "stride {} is smaller than width {}",
                stride, width
            )));
        }
        let needed = if height == 0 {
            0
        } else {
            stride * (height - 1) + width
        };
        if data.len() < needed {
            return Err(FilmboxError::InvalidImage(format!(
                "buffer holds {} bytes, {}x{} with stride {} needs {}",
                data.len(),
                width,
                height,
                stride,
                needed
            )));
        }
        Ok(Self {
            width,
            height,
            stride,
            data,
        })
    }

    /// Pixel at integer coordinates, `None` outside the image
    #[inline]
    pub fn get(&self, x: i64, y: i64) -> Option<u8> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(self.data[y as usize * self.stride + x as usize])
    }

    /// Whether a continuous coordinate lies on the image
    #[inline]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        self.width > 0
            && self.height > 0
            && x >= 0.0
            && y >= 0.0
            && x <= self.width as f32
            && y <= self.height as f32
    }

    /// Bilinear interpolation at a continuous coordinate
    ///
    /// Pixel `(i, j)` covers `[i, i+1) x [j, j+1)`, so its center sits at
    /// `(i + 0.5, j + 0.5)`. Neighbours past the border are clamped to the edge.
    pub fn sample_bilinear(&self, x: f32, y: f32) -> f32 {
        let px = x - 0.5;
        let py = y - 0.5;
        let x0 = px.floor() as i64;
        let y0 = py.floor() as i64;
        let fx = px - x0 as f32;
        let fy = py - y0 as f32;

        let p00 = self.clamped(x0, y0) as f32;
        let p10 = self.clamped(x0 + 1, y0) as f32;
        let p01 = self.clamped(x0, y0 + 1) as f32;
        let p11 = self.clamped(x0 + 1, y0 + 1) as f32;

        let a = p00 + fx * (p10 - p00);
        let b = p01 + fx * (p11 - p01);
        a + fy * (b - a)
    }

    #[inline]
    fn clamped(&self, x: i64, y: i64) -> u8 {
        let cx = x.clamp(0, self.width as i64 - 1);
        let cy = y.clamp(0, self.height as i64 - 1);
        self.data[cy as usize * self.stride + cx as usize]
    }
}

/// Owned, tightly packed 8-bit image
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
    /// Row-major pixels, `len == width * height`
    pub data: Vec<u8>,
}

impl GrayImage {
    /// Image of the given size filled with `value`
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Borrow as an [`ImageView`]
    pub fn view(&self) -> ImageView<'_> {
        ImageView {
            width: self.width,
            height: self.height,
            stride: self.width,
            data: &self.data,
        }
    }

    /// Set one pixel; writes outside the image are dropped
    #[inline]
    pub fn put(&mut self, x: i64, y: i64, value: u8) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        self.data[y as usize * self.width + x as usize] = value;
    }

    /// Fill an axis-aligned block, clipped to the image
    pub fn fill_rect(&mut self, x: i64, y: i64, width: usize, height: usize, value: u8) {
        for yy in y..y + height as i64 {
            for xx in x..x + width as i64 {
                self.put(xx, yy, value);
            }
        }
    }
}
