use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// File extensions accepted as input, compared case-insensitively
pub const RAW_EXTENSIONS: [&str; 2] = ["dng", "raw"];

/// Expands command line arguments into the list of frames to convert.
///
/// Files are taken as given, directories contribute the files directly inside
/// them (no recursion). Only files with a RAW extension are kept; arguments
/// that do not exist are ignored.
pub fn collect_input_files<P: AsRef<Path>>(args: &[P]) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    for arg in args {
        let path = arg.as_ref();

        if path.is_dir() {
            debug!("{} is a directory, diving into it", path.display());
            match fs::read_dir(path) {
                Ok(entries) => {
                    let mut files: Vec<PathBuf> = entries
                        .filter_map(|entry| entry.ok())
                        .map(|entry| entry.path())
                        .filter(|p| p.is_file())
                        .collect();
                    files.sort();
                    candidates.extend(files);
                }
                Err(e) => warn!("Could not list {}: {}", path.display(), e),
            }
        } else if path.is_file() {
            candidates.push(path.to_path_buf());
        } else {
            debug!("{} does not exist", path.display());
        }
    }

    let result: Vec<PathBuf> = candidates.into_iter().filter(|p| has_raw_extension(p)).collect();
    debug!("{} input files found", result.len());
    result
}

fn has_raw_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| RAW_EXTENSIONS.iter().any(|raw| ext.eq_ignore_ascii_case(raw)))
}
