//! Pink dot location database
//!
//! This module reads the dot definition files, keeps the resulting defect sets
//! per camera and resolution, and resolves the concrete pixel coordinates that
//! have to be fixed in a frame of a given size.

mod error;
mod dot_set;
mod grid_spec;
mod database;


pub use error::{LocationError, Result};
pub use dot_set::{CenterAlignment, DefectGridRule, DefectSet, FormatVersion, PixelCoord};
pub use grid_spec::{GridSpecParser, ParseIssue, ParsedFile, ParserOptions};
pub use database::{DefectDatabase, LoadIssue, LoadReport, DOT_FILE_EXT};
