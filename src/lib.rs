//! Pink dot removal for RAW frames recorded on cameras with on-sensor
//! focus pixels.

pub mod dot_locations;
pub mod image_pipeline;
pub mod logger;
