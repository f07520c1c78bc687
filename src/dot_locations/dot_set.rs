//! Defect sets and their expansion into pixel coordinates

use std::fmt;

/// A single pixel location in frame coordinates.
///
/// Coordinates are signed because center relative grids can reach outside
/// of small frames; consumers are expected to bounds check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelCoord {
    pub x: i32,
    pub y: i32,
}

impl PixelCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for PixelCoord {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for PixelCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The grammar a defect set was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatVersion {
    /// Legacy `A::` sets with absolute `x0,y0,x1,y1,stepX,stepY` rows
    AbsoluteGrid,
    /// `N::` sets with `x0,dy0,dy1,stepX,stepY` rows relative to the frame center
    CenterRelative,
}

impl FormatVersion {
    /// Number of comma separated values in one coordinate row
    pub fn field_count(self) -> usize {
        match self {
            FormatVersion::AbsoluteGrid => 6,
            FormatVersion::CenterRelative => 5,
        }
    }

    /// Default center alignment for sets of this format
    pub fn default_alignment(self) -> CenterAlignment {
        match self {
            FormatVersion::AbsoluteGrid => CenterAlignment::Pair,
            FormatVersion::CenterRelative => CenterAlignment::Quad,
        }
    }
}

/// How the frame center is snapped when a dimension is not evenly divisible.
///
/// Due to the Bayer pattern the center has to land on a position that keeps
/// the CFA phase intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CenterAlignment {
    /// Dimension is adjusted to the next multiple of 2 before halving
    Pair,
    /// Dimension is adjusted to the next multiple of 4 before halving
    #[default]
    Quad,
}

impl CenterAlignment {
    pub fn modulus(self) -> i64 {
        match self {
            CenterAlignment::Pair => 2,
            CenterAlignment::Quad => 4,
        }
    }
}

/// Computes the center along one axis of length `dim`.
///
/// If `dim` is a multiple of the alignment the center is `dim / 2`. Otherwise
/// `dim` is shifted by the missing remainder before halving, upwards when
/// `round_down` is set and downwards when it is not.
pub fn center_of(dim: i64, alignment: CenterAlignment, round_down: bool) -> i64 {
    let modulus = alignment.modulus();
    let rem = dim % modulus;
    if rem == 0 {
        return dim / 2;
    }

    let sign = if round_down { 1 } else { -1 };
    (dim + sign * (modulus - rem)) / 2
}

/// One lattice of defective pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefectGridRule {
    /// Rows `cy+dy0 ..= cy+dy1`, columns phase-aligned with `cx+x0` across the whole row
    CenterRelative {
        x0: i32,
        dy0: i32,
        dy1: i32,
        step_x: i32,
        step_y: i32,
    },
    /// The rectangle `(x0, y0) ..= (x1, y1)` in frame coordinates
    Absolute {
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        step_x: i32,
        step_y: i32,
    },
}

impl DefectGridRule {
    /// Builds a rule from the already parsed values of one coordinate row.
    ///
    /// Returns `None` if the number of values does not fit the format.
    pub fn from_values(format: FormatVersion, values: &[i32]) -> Option<Self> {
        match (format, values) {
            (FormatVersion::CenterRelative, &[x0, dy0, dy1, step_x, step_y]) => {
                Some(DefectGridRule::CenterRelative { x0, dy0, dy1, step_x, step_y })
            }
            (FormatVersion::AbsoluteGrid, &[x0, y0, x1, y1, step_x, step_y]) => {
                Some(DefectGridRule::Absolute { x0, y0, x1, y1, step_x, step_y })
            }
            _ => None,
        }
    }

    pub fn format(&self) -> FormatVersion {
        match self {
            DefectGridRule::CenterRelative { .. } => FormatVersion::CenterRelative,
            DefectGridRule::Absolute { .. } => FormatVersion::AbsoluteGrid,
        }
    }

    /// Largest absolute position or offset value of the rule, steps excluded
    pub fn max_offset(&self) -> i32 {
        let largest = |values: &[i32]| values.iter().map(|v| v.saturating_abs()).max().unwrap_or(0);
        match *self {
            DefectGridRule::CenterRelative { x0, dy0, dy1, .. } => largest(&[x0, dy0, dy1]),
            DefectGridRule::Absolute { x0, y0, x1, y1, .. } => largest(&[x0, y0, x1, y1]),
        }
    }

    pub fn steps(&self) -> (i32, i32) {
        match *self {
            DefectGridRule::CenterRelative { step_x, step_y, .. }
            | DefectGridRule::Absolute { step_x, step_y, .. } => (step_x, step_y),
        }
    }

    /// Appends all coordinates of this rule for a frame of width `width`
    /// centered at `(cx, cy)`.
    ///
    /// Coordinates that do not fit a `PixelCoord` are left out.
    fn expand_into(&self, cx: i64, cy: i64, width: i64, out: &mut Vec<PixelCoord>) {
        let mut emit = |x: i64, y: i64| {
            if let (Ok(x), Ok(y)) = (i32::try_from(x), i32::try_from(y)) {
                out.push(PixelCoord::new(x, y));
            }
        };

        match *self {
            DefectGridRule::CenterRelative { x0, dy0, dy1, step_x, step_y } => {
                // the remainder keeps the lattice phase of cx + x0 for the whole row
                let first_x = (cx + i64::from(x0)) % i64::from(step_x.max(1));
                for y in stepped(cy + i64::from(dy0), cy + i64::from(dy1), step_y) {
                    for x in stepped(first_x, width, step_x) {
                        emit(x, y);
                    }
                }
            }
            DefectGridRule::Absolute { x0, y0, x1, y1, step_x, step_y } => {
                for y in stepped(y0.into(), y1.into(), step_y) {
                    for x in stepped(x0.into(), x1.into(), step_x) {
                        emit(x, y);
                    }
                }
            }
        }
    }
}

/// Inclusive range from `start` to `end` with a positive `step`
fn stepped(start: i64, end: i64, step: i32) -> impl Iterator<Item = i64> {
    debug_assert!(step > 0);
    (start..=end).step_by(step.max(1) as usize)
}

/// All dot rules for one camera model at one resolution, or for any
/// resolution if the set is generic.
#[derive(Debug, Clone)]
pub struct DefectSet {
    camera_model: String,
    width: u32,
    height: u32,
    round_down: bool,
    alignment: CenterAlignment,
    format: FormatVersion,
    rules: Vec<DefectGridRule>,
}

impl DefectSet {
    /// Creates an empty set. A width and height of 0 make the set generic.
    pub fn new(camera_model: impl Into<String>, width: u32, height: u32, format: FormatVersion) -> Self {
        Self {
            camera_model: camera_model.into(),
            width,
            height,
            round_down: false,
            alignment: format.default_alignment(),
            format,
            rules: Vec::new(),
        }
    }

    pub fn with_round_down(mut self, round_down: bool) -> Self {
        self.round_down = round_down;
        self
    }

    pub fn with_alignment(mut self, alignment: CenterAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_rules(mut self, rules: impl IntoIterator<Item = DefectGridRule>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub(crate) fn push_rule(&mut self, rule: DefectGridRule) {
        self.rules.push(rule);
    }

    pub fn camera_model(&self) -> &str {
        &self.camera_model
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn round_down(&self) -> bool {
        self.round_down
    }

    pub fn alignment(&self) -> CenterAlignment {
        self.alignment
    }

    pub fn format(&self) -> FormatVersion {
        self.format
    }

    pub fn rules(&self) -> &[DefectGridRule] {
        &self.rules
    }

    /// A generic set has no fixed resolution
    pub fn is_generic(&self) -> bool {
        self.width == 0 && self.height == 0
    }

    /// A specific set carries its own resolution which overrides any query
    pub fn is_specific(&self) -> bool {
        self.width != 0 && self.height != 0
    }

    /// True if this is a specific set for exactly this camera and resolution
    pub fn matches(&self, camera_model: &str, width: u32, height: u32) -> bool {
        self.is_specific()
            && self.camera_model == camera_model
            && self.width == width
            && self.height == height
    }

    /// Width and height the set is evaluated against for a given query
    pub fn effective_size(&self, query_width: u32, query_height: u32) -> (u32, u32) {
        if self.is_specific() {
            (self.width, self.height)
        } else {
            (query_width, query_height)
        }
    }

    /// Frame center used for the center relative rules
    pub fn center(&self, query_width: u32, query_height: u32) -> (i64, i64) {
        let (w, h) = self.effective_size(query_width, query_height);
        (
            center_of(w.into(), self.alignment, self.round_down),
            center_of(h.into(), self.alignment, self.round_down),
        )
    }

    /// Expands all rules into pixel coordinates.
    ///
    /// Specific sets ignore the query size. Coordinates are emitted in rule
    /// order, row by row, without removing duplicates.
    pub fn resolve(&self, query_width: u32, query_height: u32) -> Vec<PixelCoord> {
        let (w, _) = self.effective_size(query_width, query_height);
        let (cx, cy) = self.center(query_width, query_height);

        let mut coords = Vec::new();
        for rule in &self.rules {
            rule.expand_into(cx, cy, w.into(), &mut coords);
        }
        coords
    }

    /// Name like `650D_1280x720` or `650D_generic`
    pub fn combined_name(&self) -> String {
        if self.is_generic() {
            format!("{}_generic", self.camera_model)
        } else {
            format!("{}_{}x{}", self.camera_model, self.width, self.height)
        }
    }
}
