//! Pixel correction module
//!
//! Replaces the intensities of the pixels returned by the dot location
//! database, either by interpolating from their neighbors or by marking them
//! as bad pixels for the RAW processor.

mod buffer;
mod engine;


pub use buffer::{PixelSink, PixelSource};
pub use engine::{correct, interpolate_dots, mark_bad_pixels, CorrectionMode, CorrectionStats};
