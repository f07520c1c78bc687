//! Image processing pipeline module
//!
//! This module reads RAW frames, removes the pink dots at the locations
//! supplied by the dot location database and writes the corrected frames.

pub mod raw;
pub mod tiff;
pub mod correction;
pub mod conversions;
pub mod common;
pub mod config;

pub use common::{
    ConversionError,
    Result,
};

pub use raw::{
    RawImageData,
    RawImageReader,
    RawLoaderReader,
};

pub use tiff::{
    TiffCompression,
    TiffWriter,
    StandardTiffWriter,
};

pub use config::{
    RemovalConfig,
    RemovalConfigBuilder,
};

pub use correction::{
    CorrectionMode,
    CorrectionStats,
    PixelSink,
    PixelSource,
};

pub use conversions::{
    BatchReport,
    BatchRunner,
    CancellationFlag,
    FileOutcome,
    FrameReport,
    PinkDotPipeline,
    PipelineTimings,
    collect_input_files,
};
