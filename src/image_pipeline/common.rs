//! Shared error type for reading, correcting and writing frames

pub mod error;

pub use error::{ConversionError, Result};
