use thiserror::Error;

use crate::dot_locations::LocationError;

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Failed to read input file: {0}")]
    InputReadError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Failed to decode RAW image: {0}")]
    DecodeError(String),

    #[error("Failed to encode TIFF image: {0}")]
    EncodeError(String),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("No known camera model matches '{0}'")]
    UnknownCamera(String),

    #[error("No dot pattern for image size {width}x{height} and cam type {camera}")]
    LookupNotFound {
        camera: String,
        width: usize,
        height: usize,
    },

    #[error("Dot location error: {0}")]
    LocationError(LocationError),

    #[error("Worker pool error: {0}")]
    WorkerPoolError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<LocationError> for ConversionError {
    fn from(e: LocationError) -> Self {
        match e {
            LocationError::NotFound { camera, width, height } => ConversionError::LookupNotFound {
                camera,
                width: width as usize,
                height: height as usize,
            },
            other => ConversionError::LocationError(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConversionError>;
