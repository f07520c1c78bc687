use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocationError {
    #[error("Malformed control line: '{0}'")]
    MalformedControlLine(String),

    #[error("Unknown control token in line: '{0}'")]
    UnknownControlToken(String),

    #[error("Control line does not contain the camera's name: '{0}'")]
    EmptyCameraName(String),

    #[error("Invalid resolution '{0}', expected two non-negative integers")]
    InvalidResolution(String),

    #[error("Invalid coordinate value '{field}' in line '{line}'")]
    InvalidCoordinate { line: String, field: String },

    #[error("Coordinate beyond +/-{limit} in line '{line}'")]
    CoordinateOutOfRange { line: String, limit: i32 },

    #[error("Grid step must be positive in line '{0}'")]
    NonPositiveStep(String),

    #[error("Dot set references are not supported: '{0}'")]
    UnsupportedReference(String),

    #[error("Could not read dot data file {path}: {source}")]
    UnreadableFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a valid directory with dot data: {0}")]
    InvalidDataDirectory(PathBuf),

    #[error("No dot pattern for camera '{camera}' at {width}x{height}")]
    NotFound {
        camera: String,
        width: u32,
        height: u32,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LocationError>;
