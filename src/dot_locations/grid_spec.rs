//! Parser for the dot definition text format
//!
//! ```text
//! # comment
//! N::650D::1280,720
//! 10,-5,5,4,4
//! N::EOSM::0,0::round_down
//! ...
//! ```
//!
//! A control line (anything containing `::`) closes the currently open set
//! and may start a new one. All other lines are coordinate rows for the open
//! set.

use tracing::{debug, warn};

use crate::dot_locations::dot_set::{CenterAlignment, DefectGridRule, DefectSet, FormatVersion};
use crate::dot_locations::error::{LocationError, Result};

pub const COMMENT_TOKEN: &str = "#";
pub const DELIM: &str = "::";
pub const NEW_SET_TOKEN: &str = "N";
pub const ABSOLUTE_SET_TOKEN: &str = "A";
pub const REF_SET_TOKEN: &str = "R";
pub const ROUND_DOWN_FLAG: &str = "round_down";

/// Largest magnitude accepted for positions and offsets in a coordinate row
pub const MAX_COORDINATE: i32 = 1 << 20;

/// Options that apply to every file parsed with them
#[derive(Debug, Clone, Copy, Default)]
pub struct ParserOptions {
    /// Alignment for center relative (`N::`) sets
    pub center_alignment: CenterAlignment,
}

/// A problem found while parsing, tied to its 1-based line number
#[derive(Debug)]
pub struct ParseIssue {
    pub line_no: usize,
    pub error: LocationError,
}

/// Result of parsing one definition file
#[derive(Debug, Default)]
pub struct ParsedFile {
    pub sets: Vec<DefectSet>,
    pub issues: Vec<ParseIssue>,
}

/// Line by line parser state
pub struct GridSpecParser {
    options: ParserOptions,
    current: Option<DefectSet>,
    parsed: ParsedFile,
}

impl GridSpecParser {
    pub fn new(options: ParserOptions) -> Self {
        Self {
            options,
            current: None,
            parsed: ParsedFile::default(),
        }
    }

    /// Parses the complete content of one definition file
    pub fn parse_str(options: ParserOptions, text: &str) -> ParsedFile {
        let mut parser = Self::new(options);
        for (idx, line) in text.lines().enumerate() {
            parser.feed_line(idx + 1, line);
        }
        parser.finish()
    }

    /// Processes a single line of input
    pub fn feed_line(&mut self, line_no: usize, raw: &str) {
        let line = raw.trim();

        if line.is_empty() || line.starts_with(COMMENT_TOKEN) {
            return;
        }

        if line.contains(DELIM) {
            self.close_current();
            match parse_control_line(line, &self.options) {
                Ok(set) => {
                    if let Some(set) = &set {
                        debug!("Starting dot set {}", set.combined_name());
                    }
                    self.current = set;
                }
                Err(e) => self.record(line_no, e),
            }
            return;
        }

        // coordinate rows without an open set are dropped
        let Some(format) = self.current.as_ref().map(DefectSet::format) else {
            return;
        };

        match parse_coordinate_line(line, format) {
            Ok(Some(rule)) => {
                if let Some(set) = self.current.as_mut() {
                    set.push_rule(rule);
                }
            }
            Ok(None) => {
                debug!("Skipping row '{}' on line {}: wrong number of values", line, line_no);
            }
            Err(e) => {
                if let Some(set) = self.current.take() {
                    warn!("Discarding dot set {}", set.combined_name());
                }
                self.record(line_no, e);
            }
        }
    }

    /// Closes a still open set and returns everything parsed so far
    pub fn finish(mut self) -> ParsedFile {
        self.close_current();
        self.parsed
    }

    fn close_current(&mut self) {
        if let Some(set) = self.current.take() {
            debug!(
                "Storing dot set {} with {} rules",
                set.combined_name(),
                set.rules().len()
            );
            self.parsed.sets.push(set);
        }
    }

    fn record(&mut self, line_no: usize, error: LocationError) {
        warn!("Line {}: {}", line_no, error);
        self.parsed.issues.push(ParseIssue { line_no, error });
    }
}

/// Parses a control line.
///
/// Returns `Ok(None)` for control lines that close the open set without
/// opening a new one.
fn parse_control_line(line: &str, options: &ParserOptions) -> Result<Option<DefectSet>> {
    let fields: Vec<&str> = line.split(DELIM).map(str::trim).collect();

    let format = match fields[0] {
        NEW_SET_TOKEN => FormatVersion::CenterRelative,
        ABSOLUTE_SET_TOKEN => FormatVersion::AbsoluteGrid,
        REF_SET_TOKEN => return Err(LocationError::UnsupportedReference(line.to_string())),
        _ => return Err(LocationError::UnknownControlToken(line.to_string())),
    };

    if fields.len() < 3 {
        return Err(LocationError::MalformedControlLine(line.to_string()));
    }

    let camera = fields[1];
    if camera.is_empty() {
        return Err(LocationError::EmptyCameraName(line.to_string()));
    }

    let (width, height) = parse_resolution(fields[2])?;
    if (width == 0) != (height == 0) {
        warn!(
            "Dot set for {} has resolution {}x{} and will never be matched",
            camera, width, height
        );
    }

    let round_down = fields.get(3).is_some_and(|flag| *flag == ROUND_DOWN_FLAG);

    let alignment = match format {
        FormatVersion::CenterRelative => options.center_alignment,
        FormatVersion::AbsoluteGrid => format.default_alignment(),
    };

    Ok(Some(
        DefectSet::new(camera, width, height, format)
            .with_round_down(round_down)
            .with_alignment(alignment),
    ))
}

fn parse_resolution(field: &str) -> Result<(u32, u32)> {
    let values: Vec<&str> = field.split(',').map(str::trim).collect();
    match values.as_slice() {
        [w, h] => {
            let w = w.parse::<u32>().map_err(|_| LocationError::InvalidResolution(field.to_string()))?;
            let h = h.parse::<u32>().map_err(|_| LocationError::InvalidResolution(field.to_string()))?;
            Ok((w, h))
        }
        _ => Err(LocationError::InvalidResolution(field.to_string())),
    }
}

/// Parses one coordinate row.
///
/// Rows with the wrong number of values yield `Ok(None)` and are skipped by
/// the caller; bad numbers, out of range offsets and non-positive steps are
/// errors.
fn parse_coordinate_line(line: &str, format: FormatVersion) -> Result<Option<DefectGridRule>> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != format.field_count() {
        return Ok(None);
    }

    let values = fields
        .iter()
        .map(|field| {
            field.parse::<i32>().map_err(|_| LocationError::InvalidCoordinate {
                line: line.to_string(),
                field: field.to_string(),
            })
        })
        .collect::<Result<Vec<i32>>>()?;

    let Some(rule) = DefectGridRule::from_values(format, &values) else {
        return Ok(None);
    };

    if rule.max_offset() > MAX_COORDINATE {
        return Err(LocationError::CoordinateOutOfRange {
            line: line.to_string(),
            limit: MAX_COORDINATE,
        });
    }

    let (step_x, step_y) = rule.steps();
    if step_x <= 0 || step_y <= 0 {
        return Err(LocationError::NonPositiveStep(line.to_string()));
    }

    Ok(Some(rule))
}
