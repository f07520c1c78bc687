//! Configuration for the pink dot removal pipeline

use std::path::PathBuf;

use crate::image_pipeline::correction::CorrectionMode;
use crate::image_pipeline::tiff::TiffCompression;

/// Prefix put in front of the input file name to build the output name
pub const DEFAULT_OUTPUT_PREFIX: &str = "_";

/// Configuration for removing dots from RAW frames
#[derive(Debug, Clone)]
pub struct RemovalConfig {
    /// Interpolate the dots or mark them as bad pixels
    pub mode: CorrectionMode,
    /// Camera model to use instead of the one stored in the RAW file
    pub camera_override: Option<String>,
    /// Compression method for the output TIFF
    pub compression: TiffCompression,
    /// Predictor value for compression (typically 2 for horizontal differencing)
    pub predictor: Option<u16>,
    /// Whether to reject frames with a zero width or height
    pub validate_dimensions: bool,
    /// Directory for output files; next to the input file if unset
    pub output_dir: Option<PathBuf>,
    /// Prefix for output file names
    pub output_prefix: String,
}

impl Default for RemovalConfig {
    fn default() -> Self {
        Self {
            mode: CorrectionMode::Interpolate,
            camera_override: None,
            compression: TiffCompression::None,
            predictor: None,
            validate_dimensions: true,
            output_dir: None,
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
        }
    }
}

impl RemovalConfig {
    pub fn builder() -> RemovalConfigBuilder {
        RemovalConfigBuilder::default()
    }
}

/// Builder for RemovalConfig
#[derive(Default)]
pub struct RemovalConfigBuilder {
    mode: Option<CorrectionMode>,
    camera_override: Option<Option<String>>,
    compression: Option<TiffCompression>,
    predictor: Option<Option<u16>>,
    validate_dimensions: Option<bool>,
    output_dir: Option<Option<PathBuf>>,
    output_prefix: Option<String>,
}

impl RemovalConfigBuilder {
    pub fn mode(mut self, mode: CorrectionMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn camera_override(mut self, camera: Option<String>) -> Self {
        self.camera_override = Some(camera);
        self
    }

    pub fn compression(mut self, compression: TiffCompression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn predictor(mut self, predictor: Option<u16>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn output_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.output_dir = Some(dir);
        self
    }

    pub fn output_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.output_prefix = Some(prefix.into());
        self
    }

    pub fn build(self) -> RemovalConfig {
        let default = RemovalConfig::default();
        RemovalConfig {
            mode: self.mode.unwrap_or(default.mode),
            camera_override: self.camera_override.unwrap_or(default.camera_override),
            compression: self.compression.unwrap_or(default.compression),
            predictor: self.predictor.unwrap_or(default.predictor),
            validate_dimensions: self.validate_dimensions.unwrap_or(default.validate_dimensions),
            output_dir: self.output_dir.unwrap_or(default.output_dir),
            output_prefix: self.output_prefix.unwrap_or(default.output_prefix),
        }
    }
}
