//! TIFF writing module
//!
//! Persists the corrected CFA plane as a 16-bit grayscale TIFF.

mod writer;
mod standard_tiff_writer;
pub mod types;

pub use writer::TiffWriter;
pub use standard_tiff_writer::StandardTiffWriter;
pub use types::TiffCompression;
