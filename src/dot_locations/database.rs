//! In-memory database of all known dot sets

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::dot_locations::dot_set::{DefectSet, PixelCoord};
use crate::dot_locations::error::{LocationError, Result};
use crate::dot_locations::grid_spec::{GridSpecParser, ParserOptions};

/// Extension of the dot definition files
pub const DOT_FILE_EXT: &str = "txt";

/// A non-fatal problem found while loading definition files
#[derive(Debug)]
pub struct LoadIssue {
    pub file: PathBuf,
    pub line_no: Option<usize>,
    pub error: LocationError,
}

impl fmt::Display for LoadIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line_no {
            Some(line_no) => write!(f, "{}:{}: {}", self.file.display(), line_no, self.error),
            None => write!(f, "{}: {}", self.file.display(), self.error),
        }
    }
}

/// What happened during a load
#[derive(Debug, Default)]
pub struct LoadReport {
    pub files_parsed: usize,
    pub sets_loaded: usize,
    pub issues: Vec<LoadIssue>,
}

impl LoadReport {
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    fn merge(&mut self, other: LoadReport) {
        self.files_parsed += other.files_parsed;
        self.sets_loaded += other.sets_loaded;
        self.issues.extend(other.issues);
    }
}

/// Stores dot sets for various cameras and resolutions.
///
/// Sets are kept in insertion order; the database is read-only once loading
/// is done and can be shared between worker threads.
#[derive(Debug, Default)]
pub struct DefectDatabase {
    sets: Vec<DefectSet>,
    options: ParserOptions,
}

impl DefectDatabase {
    pub fn new(options: ParserOptions) -> Self {
        Self {
            sets: Vec::new(),
            options,
        }
    }

    /// Builds a database from all definition files in `path`.
    ///
    /// Fails only if `path` itself is not a readable directory. Problems in
    /// single files are returned in the report.
    pub fn open<P: AsRef<Path>>(path: P, options: ParserOptions) -> Result<(Self, LoadReport)> {
        let mut db = Self::new(options);
        let report = db.load_directory(path)?;
        info!(
            files = report.files_parsed,
            sets = report.sets_loaded,
            issues = report.issues.len(),
            "Dot location database ready"
        );
        Ok((db, report))
    }

    /// Parses all `*.txt` files directly inside `path`.
    ///
    /// Files are processed in file name order. Unreadable files and broken
    /// definitions are recorded in the report and skipped.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn load_directory<P: AsRef<Path>>(&mut self, path: P) -> Result<LoadReport> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(LocationError::InvalidDataDirectory(path.to_path_buf()));
        }

        let mut report = LoadReport::default();
        let mut files = Vec::new();
        for entry in fs::read_dir(path)? {
            match entry {
                Ok(entry) => files.push(entry.path()),
                Err(e) => {
                    warn!("Skipping unreadable directory entry: {}", e);
                    report.issues.push(LoadIssue {
                        file: path.to_path_buf(),
                        line_no: None,
                        error: LocationError::IoError(e),
                    });
                }
            }
        }
        files.sort();

        for file in files {
            if !file.is_file() || file.extension().and_then(|e| e.to_str()) != Some(DOT_FILE_EXT) {
                continue;
            }

            debug!("Found dot data file {}", file.display());
            match fs::read(&file) {
                Ok(bytes) => {
                    let text = String::from_utf8_lossy(&bytes);
                    let file_report = self.load_str(&file, &text);
                    report.merge(file_report);
                }
                Err(source) => {
                    warn!("Could not read file {}: {}", file.display(), source);
                    report.issues.push(LoadIssue {
                        file: file.clone(),
                        line_no: None,
                        error: LocationError::UnreadableFile { path: file, source },
                    });
                }
            }
        }

        Ok(report)
    }

    /// Parses the content of a single definition file. `source` is only used
    /// for reporting.
    pub fn load_str<P: AsRef<Path>>(&mut self, source: P, text: &str) -> LoadReport {
        let source = source.as_ref();
        let parsed = GridSpecParser::parse_str(self.options, text);

        let sets_loaded = parsed.sets.len();
        for set in parsed.sets {
            self.insert(set);
        }

        LoadReport {
            files_parsed: 1,
            sets_loaded,
            issues: parsed
                .issues
                .into_iter()
                .map(|issue| LoadIssue {
                    file: source.to_path_buf(),
                    line_no: Some(issue.line_no),
                    error: issue.error,
                })
                .collect(),
        }
    }

    /// Appends a set. A duplicate of an existing specific set is kept and
    /// shadows the earlier one on lookup.
    pub fn insert(&mut self, set: DefectSet) {
        if set.is_specific()
            && self
                .sets
                .iter()
                .any(|s| s.matches(set.camera_model(), set.width(), set.height()))
        {
            warn!(
                "Duplicate dot set {}, the later definition wins",
                set.combined_name()
            );
        }
        self.sets.push(set);
    }

    pub fn sets(&self) -> &[DefectSet] {
        &self.sets
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Picks the set to use for a camera and frame size.
    ///
    /// Every specific set is checked and the last exact match is kept. Only if
    /// there is none, the first generic set of the camera is used.
    pub fn find_set(&self, camera_model: &str, width: u32, height: u32) -> Option<&DefectSet> {
        let mut explicit = None;
        for set in &self.sets {
            if set.matches(camera_model, width, height) {
                explicit = Some(set);
            }
        }

        if explicit.is_some() {
            debug!("Found explicit dot set for {} at {}x{}", camera_model, width, height);
            return explicit;
        }

        let generic = self
            .sets
            .iter()
            .find(|set| set.is_generic() && set.camera_model() == camera_model);
        if generic.is_some() {
            debug!("Using generic dot set for {} at {}x{}", camera_model, width, height);
        }
        generic
    }

    /// Resolves the dot coordinates for a camera and frame size
    pub fn lookup(&self, camera_model: &str, width: u32, height: u32) -> Result<Vec<PixelCoord>> {
        self.find_set(camera_model, width, height)
            .map(|set| set.resolve(width, height))
            .ok_or_else(|| LocationError::NotFound {
                camera: camera_model.to_string(),
                width,
                height,
            })
    }

    /// All camera names, in the order they first appear
    pub fn camera_models(&self) -> Vec<&str> {
        let mut models: Vec<&str> = Vec::new();
        for set in &self.sets {
            if !models.contains(&set.camera_model()) {
                models.push(set.camera_model());
            }
        }
        models
    }

    /// Maps a free-form camera name (e.g. `Canon EOS 650D` from the raw
    /// metadata, or `eosm` from the command line) to a known camera model.
    ///
    /// Case and whitespace are ignored. An exact match is preferred over a
    /// suffix match; among suffix matches the longest model wins.
    pub fn match_camera_model(&self, name: &str) -> Option<&str> {
        let wanted = normalize_model(name);
        if wanted.is_empty() {
            return None;
        }

        let models = self.camera_models();
        if let Some(model) = models.iter().find(|m| normalize_model(m) == wanted) {
            return Some(*model);
        }

        models
            .into_iter()
            .filter(|m| {
                let known = normalize_model(m);
                !known.is_empty() && wanted.ends_with(&known)
            })
            .max_by_key(|m| normalize_model(m).len())
    }

    /// Human readable listing of all sets and camera models
    pub fn summary(&self) -> String {
        let mut out = String::from("------------ Dot Lib Info ------------\n\n");
        for set in &self.sets {
            out.push_str(&format!("  {} ({} rules)\n", set.combined_name(), set.rules().len()));
        }
        out.push_str("\nList of all cam types: ");
        out.push_str(&self.camera_models().join(", "));
        out.push('\n');
        out
    }
}

fn normalize_model(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}
