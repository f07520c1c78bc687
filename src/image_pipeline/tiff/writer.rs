use std::io::Write;
use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::config::RemovalConfig;
use crate::image_pipeline::raw::types::RawImageData;

/// Encodes a corrected CFA frame
pub trait TiffWriter {
    fn write_tiff(&self, image: &RawImageData, output: &mut dyn Write, config: &RemovalConfig) -> Result<()>;
}
