//! Parallel conversion of many files

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, error, info};

use crate::image_pipeline::{
    common::error::{ConversionError, Result},
    conversions::pink_dot_removal::{FrameReport, PinkDotPipeline},
    raw::RawImageReader,
    tiff::TiffWriter,
};

/// Shared flag to stop a running batch.
///
/// Checked before each file is started; a file that is already being
/// converted runs to completion.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub enum FileOutcome {
    Converted(FrameReport),
    Failed(ConversionError),
    /// Not started because the batch was cancelled
    Skipped,
}

#[derive(Debug)]
pub struct FileResult {
    pub input: PathBuf,
    pub outcome: FileOutcome,
}

/// Per-file results of a batch, in input order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub results: Vec<FileResult>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Converted(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Skipped))
    }

    /// Input files that could not be converted
    pub fn failed_files(&self) -> Vec<&Path> {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, FileOutcome::Failed(_)))
            .map(|r| r.input.as_path())
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.skipped() == 0
    }

    fn count(&self, pred: impl Fn(&FileOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Runs a pipeline over many files on a rayon thread pool
pub struct BatchRunner<'a, R: RawImageReader, W: TiffWriter> {
    pipeline: &'a PinkDotPipeline<R, W>,
    jobs: usize,
}

impl<'a, R, W> BatchRunner<'a, R, W>
where
    R: RawImageReader + Sync,
    W: TiffWriter + Sync,
{
    pub fn new(pipeline: &'a PinkDotPipeline<R, W>) -> Self {
        Self { pipeline, jobs: 0 }
    }

    /// Number of worker threads, 0 lets rayon decide
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Converts all `files`. A failing file does not stop the others.
    pub fn run(&self, files: &[PathBuf], cancel: &CancellationFlag) -> Result<BatchReport> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| ConversionError::WorkerPoolError(e.to_string()))?;

        info!(files = files.len(), threads = pool.current_num_threads(), "Starting batch");

        let processed = AtomicUsize::new(0);
        let results = pool.install(|| {
            files
                .par_iter()
                .map(|input| self.run_one(input, cancel, &processed, files.len()))
                .collect()
        });

        let report = BatchReport { results };
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            skipped = report.skipped(),
            "Batch finished"
        );
        Ok(report)
    }

    fn run_one(&self, input: &Path, cancel: &CancellationFlag, processed: &AtomicUsize, total: usize) -> FileResult {
        if cancel.is_cancelled() {
            debug!("Batch cancelled, skipping {}", input.display());
            return FileResult {
                input: input.to_path_buf(),
                outcome: FileOutcome::Skipped,
            };
        }

        let outcome = match self.pipeline.convert_file(input) {
            Ok(report) => FileOutcome::Converted(report),
            Err(e) => {
                error!("Pink dot removal failed for {}: {}", input.display(), e);
                FileOutcome::Failed(e)
            }
        };

        let done = processed.fetch_add(1, Ordering::SeqCst) + 1;
        info!("Processed file {} / {}: {}", done, total, input.display());

        FileResult {
            input: input.to_path_buf(),
            outcome,
        }
    }
}
