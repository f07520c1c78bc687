//! Pipeline conversions module
//!
//! This module contains the orchestration of reading, correcting and writing
//! frames, for single files and for batches.

mod pink_dot_removal;
mod batch;
mod input_files;
mod timing;

#[cfg(test)]
mod tests;

pub use pink_dot_removal::{CorrectedFrame, FrameReport, PinkDotPipeline, OUTPUT_EXT};
pub use batch::{BatchReport, BatchRunner, CancellationFlag, FileOutcome, FileResult};
pub use input_files::{collect_input_files, RAW_EXTENSIONS};
pub use timing::{PipelineTimings, StepTiming, Timer};
