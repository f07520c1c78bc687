//! RAW image data types

use crate::image_pipeline::correction::{PixelSink, PixelSource};

/// Represents decoded RAW image data
#[derive(Debug, Clone)]
pub struct RawImageData {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
    /// Raw pixel data (single channel Bayer pattern)
    pub data: Vec<u16>,
    /// Actual bits per sample from the sensor (e.g., 12, 14, or 16)
    pub bits_per_sample: u32,
    /// Camera maker as stored in the file
    pub make: String,
    /// Camera model as stored in the file, e.g. "Canon EOS 650D"
    pub model: String,
}

impl RawImageData {
    /// Creates an all-zero frame without camera metadata
    pub fn blank(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0u16; width * height],
            bits_per_sample: 16,
            make: String::new(),
            model: String::new(),
        }
    }

    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }
}

impl PixelSource for RawImageData {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn get_pixel(&self, x: usize, y: usize) -> u16 {
        self.data[self.index(x, y)]
    }
}

impl PixelSink for RawImageData {
    fn set_pixel(&mut self, x: usize, y: usize, value: u16) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }
}
