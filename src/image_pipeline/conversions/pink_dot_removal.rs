use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::dot_locations::DefectDatabase;
use crate::image_pipeline::{
    common::error::{ConversionError, Result},
    config::RemovalConfig,
    conversions::timing::{PipelineTimings, Timer},
    correction::{self, CorrectionStats},
    raw::{RawImageData, RawImageReader, RawLoaderReader},
    tiff::{StandardTiffWriter, TiffWriter},
};

/// Extension of the files written by the pipeline
pub const OUTPUT_EXT: &str = "tiff";

/// A frame after dot removal, still in memory
#[derive(Debug, Clone)]
pub struct CorrectedFrame {
    pub image: RawImageData,
    pub camera: String,
    pub stats: CorrectionStats,
}

/// Outcome of one successfully processed frame
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub camera: String,
    pub width: usize,
    pub height: usize,
    pub stats: CorrectionStats,
    pub output: Option<PathBuf>,
    pub timings: PipelineTimings,
}

/// Reads a RAW frame, removes the pink dots and writes the result.
///
/// The dot database is shared read-only, so one pipeline can serve several
/// worker threads.
pub struct PinkDotPipeline<R: RawImageReader, W: TiffWriter> {
    reader: R,
    writer: W,
    database: Arc<DefectDatabase>,
    config: RemovalConfig,
}

impl PinkDotPipeline<RawLoaderReader, StandardTiffWriter> {
    pub fn new(database: Arc<DefectDatabase>, config: RemovalConfig) -> Self {
        Self {
            reader: RawLoaderReader,
            writer: StandardTiffWriter,
            database,
            config,
        }
    }
}

impl<R: RawImageReader, W: TiffWriter> PinkDotPipeline<R, W> {
    pub fn with_custom(reader: R, writer: W, database: Arc<DefectDatabase>, config: RemovalConfig) -> Self {
        Self {
            reader,
            writer,
            database,
            config,
        }
    }

    fn validate_dimensions(&self, width: usize, height: usize) -> Result<()> {
        if !self.config.validate_dimensions {
            return Ok(());
        }

        if width == 0 || height == 0 || width > u32::MAX as usize || height > u32::MAX as usize {
            return Err(ConversionError::InvalidDimensions(width, height));
        }

        Ok(())
    }

    /// Determines the database camera model for a frame.
    ///
    /// A configured override takes precedence over the model stored in the
    /// file.
    pub fn resolve_camera(&self, image: &RawImageData) -> Result<String> {
        if let Some(forced) = &self.config.camera_override {
            let camera = self.database.match_camera_model(forced).unwrap_or(forced.as_str());
            return Ok(camera.to_string());
        }

        let full_name = format!("{} {}", image.make, image.model);
        self.database
            .match_camera_model(&image.model)
            .or_else(|| self.database.match_camera_model(&full_name))
            .map(str::to_string)
            .ok_or_else(|| ConversionError::UnknownCamera(full_name.trim().to_string()))
    }

    /// Removes the dots from a decoded frame.
    ///
    /// `image` stays untouched; the correction is done on a copy. Nothing is
    /// corrected if no dot pattern exists for the frame.
    pub fn remove_dots(&self, image: &RawImageData) -> Result<CorrectedFrame> {
        self.validate_dimensions(image.width, image.height)?;

        let camera = self.resolve_camera(image)?;
        let dots = self
            .database
            .lookup(&camera, image.width as u32, image.height as u32)?;
        debug!("{} dots to fix for {} at {}x{}", dots.len(), camera, image.width, image.height);

        let mut corrected = image.clone();
        let stats = correction::correct(image, &mut corrected, &dots, self.config.mode);

        Ok(CorrectedFrame {
            image: corrected,
            camera,
            stats,
        })
    }

    /// Decodes, corrects and encodes a frame completely in memory
    fn process(&self, input_data: &[u8]) -> Result<(Vec<u8>, FrameReport)> {
        let mut timings = PipelineTimings::new();

        let raw_image = {
            let _span = tracing::info_span!("decode_raw").entered();
            let timer = Timer::start("decode_raw");
            let raw_image = self.reader.read_raw(input_data)?;
            let (name, duration) = timer.stop();
            timings.add_step(name, duration);
            raw_image
        };

        let frame = {
            let _span = tracing::info_span!("remove_dots",
                width = raw_image.width,
                height = raw_image.height
            ).entered();
            let timer = Timer::start("remove_dots");
            let frame = self.remove_dots(&raw_image)?;
            let (name, duration) = timer.stop();
            timings.add_step(name, duration);
            frame
        };

        let encoded = {
            let _span = tracing::info_span!("encode_tiff").entered();
            let timer = Timer::start("encode_tiff");
            let mut encoded = Vec::new();
            self.writer.write_tiff(&frame.image, &mut encoded, &self.config)?;
            let (name, duration) = timer.stop();
            timings.add_step(name, duration);
            encoded
        };

        let report = FrameReport {
            camera: frame.camera,
            width: frame.image.width,
            height: frame.image.height,
            stats: frame.stats,
            output: None,
            timings,
        };
        Ok((encoded, report))
    }

    /// Converts a RAW file held in memory. `output` is only written after the
    /// frame has been corrected and encoded successfully.
    #[instrument(skip(self, input_data, output), fields(input_size = input_data.len()))]
    pub fn convert(&self, input_data: &[u8], output: &mut dyn Write) -> Result<FrameReport> {
        info!("Starting pink dot removal");

        let (encoded, report) = self.process(input_data)?;
        output.write_all(&encoded)?;

        info!(
            camera = %report.camera,
            width = report.width,
            height = report.height,
            corrected = report.stats.corrected,
            "Dot removal complete"
        );
        Ok(report)
    }

    /// Output location for `input_path`: the prefixed file name with a TIFF
    /// extension, in the configured output directory or next to the input.
    pub fn output_path_for(&self, input_path: &Path) -> PathBuf {
        let stem = input_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "frame".to_string());
        let file_name = format!("{}{}.{}", self.config.output_prefix, stem, OUTPUT_EXT);

        match &self.config.output_dir {
            Some(dir) => dir.join(file_name),
            None => input_path
                .parent()
                .map(|p| p.join(&file_name))
                .unwrap_or_else(|| PathBuf::from(&file_name)),
        }
    }

    /// Converts `input_path` and writes the result to [`Self::output_path_for`]
    pub fn convert_file<P: AsRef<Path>>(&self, input_path: P) -> Result<FrameReport> {
        let input_path = input_path.as_ref();
        let output_path = self.output_path_for(input_path);
        self.convert_file_to(input_path, output_path)
    }

    /// Converts `input_path` to `output_path`.
    ///
    /// The output file is created only after the correction succeeded, so a
    /// failing frame never leaves a partial or truncated file behind.
    #[instrument(skip(self, input_path, output_path))]
    pub fn convert_file_to<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: Q,
    ) -> Result<FrameReport> {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();

        info!(
            input = %input_path.display(),
            output = %output_path.display(),
            "Converting file"
        );

        let input_data = {
            let _span = tracing::info_span!("read_input_file").entered();
            std::fs::read(input_path).map_err(|e| {
                ConversionError::InputReadError(format!("{}: {}", input_path.display(), e))
            })?
        };

        let (encoded, mut report) = self.process(&input_data)?;

        {
            let _span = tracing::info_span!("write_output_file").entered();
            let timer = Timer::start("write_output_file");
            if let Some(dir) = output_path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir).map_err(|e| {
                    ConversionError::OutputWriteError(format!("{}: {}", dir.display(), e))
                })?;
            }
            std::fs::write(output_path, &encoded).map_err(|e| {
                ConversionError::OutputWriteError(format!("{}: {}", output_path.display(), e))
            })?;
            let (name, duration) = timer.stop();
            report.timings.add_step(name, duration);
        }

        debug!("Timings for {}:\n{}", input_path.display(), report.timings.summary());
        report.output = Some(output_path.to_path_buf());
        Ok(report)
    }

    pub fn config(&self) -> &RemovalConfig {
        &self.config
    }
}
