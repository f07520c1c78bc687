use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::raw::types::RawImageData;

/// Source of decoded CFA frames
pub trait RawImageReader {
    /// Decodes a complete RAW file held in memory
    fn read_raw(&self, data: &[u8]) -> Result<RawImageData>;
}
