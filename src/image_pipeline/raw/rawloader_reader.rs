//! RAW image reader implementation using the rawloader library.
//!
//! Handles decoding of the RAW sensor data (DNG from raw video recorders, but
//! also CR2 and other formats rawloader knows) and extracts the metadata
//! needed to pick the right dot pattern.

use std::io::Cursor;

use tracing::debug;
use rawloader::RawImageData as RawloaderImageData;
use crate::image_pipeline::common::error::{Result, ConversionError};
use crate::image_pipeline::raw::types::RawImageData;
use crate::image_pipeline::raw::reader::RawImageReader;

/// RAW image reader that uses the rawloader library for decoding.
pub struct RawLoaderReader;

/// Default bit depth when no white level information is available from the RAW file.
const DEFAULT_BITS_PER_SAMPLE: u32 = 16;

/// The bit width of the u16 data type, used for calculating actual bits per sample.
const U16_BITS: u32 = 16;

impl RawImageReader for RawLoaderReader {
    /// Reads and decodes a single-channel CFA frame from a byte array.
    ///
    /// Frames with more than one component per pixel (already demosaiced or
    /// linear DNGs) are rejected since the dot pattern only applies to CFA data.
    fn read_raw(&self, data: &[u8]) -> Result<RawImageData> {
        debug!("Decoding RAW image, {} bytes", data.len());

        let decoded = rawloader::decode(&mut Cursor::new(data))
            .map_err(|e| ConversionError::DecodeError(e.to_string()))?;

        if decoded.cpp != 1 {
            return Err(ConversionError::UnsupportedFormat(format!(
                "{} components per pixel, expected CFA data",
                decoded.cpp
            )));
        }

        let width = decoded.width;
        let height = decoded.height;

        debug!("Decoded {} {} image: {}x{}", decoded.make, decoded.model, width, height);

        // Float data (normalized 0.0-1.0) is scaled to the u16 range
        let data: Vec<u16> = match decoded.data {
            RawloaderImageData::Integer(values) => values,
            RawloaderImageData::Float(values) => {
                values.iter().map(|&v| (v * u16::MAX as f32) as u16).collect()
            }
        };

        if data.len() != width * height {
            return Err(ConversionError::InvalidDimensions(width, height));
        }

        // The white level is the largest value the sensor can produce,
        // e.g. 0x3FFF -> 14 bits
        let max_white_level = decoded.whitelevels.iter().max().copied().unwrap_or(u16::MAX);
        let bits_per_sample = if max_white_level == 0 {
            DEFAULT_BITS_PER_SAMPLE
        } else {
            U16_BITS - max_white_level.leading_zeros()
        };

        debug!("Calculated bits_per_sample: {} (max white level: {})", bits_per_sample, max_white_level);

        Ok(RawImageData {
            width,
            height,
            data,
            bits_per_sample,
            make: decoded.make,
            model: decoded.model,
        })
    }
}
