//! RAW frame decoding
//!
//! Frames are decoded to a single CFA plane of 16-bit samples, the layout the
//! dot correction works on.

mod reader;
mod rawloader_reader;
pub mod types;

pub use reader::RawImageReader;
pub use rawloader_reader::RawLoaderReader;
pub use types::RawImageData;
