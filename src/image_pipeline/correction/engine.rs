use tracing::debug;

use crate::dot_locations::PixelCoord;
use crate::image_pipeline::correction::buffer::{PixelSink, PixelSource};

/// Distance to the neighbors used for interpolation. Two pixels away is the
/// nearest pixel with the same CFA color.
const NEIGHBOR_DISTANCE: i64 = 2;

/// How the dot pixels are fixed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorrectionMode {
    /// Replace each dot with the average along the flattest direction
    #[default]
    Interpolate,
    /// Set each dot to 0 and leave the repair to the RAW processor
    MarkBad,
}

/// Counters for one correction pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorrectionStats {
    /// Number of coordinates handed to the engine
    pub requested: usize,
    /// Number of pixels written
    pub corrected: usize,
    /// Coordinates left alone (near the border or outside the frame)
    pub skipped: usize,
}

/// Fixes all `dots`, reading from `source` and writing to `destination`.
///
/// `destination` is expected to start out as a copy of `source`; only the
/// dot positions are written.
pub fn correct<S, D>(source: &S, destination: &mut D, dots: &[PixelCoord], mode: CorrectionMode) -> CorrectionStats
where
    S: PixelSource + ?Sized,
    D: PixelSink + ?Sized,
{
    let stats = match mode {
        CorrectionMode::Interpolate => interpolate_dots(source, destination, dots),
        CorrectionMode::MarkBad => mark_bad_pixels(source, destination, dots),
    };

    debug!(
        "{:?}: {} of {} dots corrected, {} skipped",
        mode, stats.corrected, stats.requested, stats.skipped
    );
    stats
}

/// The four directions along which the intensity gradient is evaluated, in
/// evaluation order. On equal gradients the earlier direction wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Vertical,
    Horizontal,
    Diagonal,
    AntiDiagonal,
}

impl Direction {
    const ALL: [Direction; 4] = [
        Direction::Vertical,
        Direction::Horizontal,
        Direction::Diagonal,
        Direction::AntiDiagonal,
    ];

    /// Offsets of the two opposing neighbors
    fn offsets(self) -> ((i64, i64), (i64, i64)) {
        let d = NEIGHBOR_DISTANCE;
        match self {
            Direction::Vertical => ((0, -d), (0, d)),
            Direction::Horizontal => ((-d, 0), (d, 0)),
            Direction::Diagonal => ((-d, -d), (d, d)),
            Direction::AntiDiagonal => ((d, -d), (-d, d)),
        }
    }
}

/// Replaces each dot with the average of the two opposing neighbors that
/// have the smallest intensity difference.
///
/// Only dots with `2 <= x <= w-3` and `2 <= y <= h-4` are touched; all others
/// stay unmodified.
pub fn interpolate_dots<S, D>(source: &S, destination: &mut D, dots: &[PixelCoord]) -> CorrectionStats
where
    S: PixelSource + ?Sized,
    D: PixelSink + ?Sized,
{
    let w = source.width() as i64;
    let h = source.height() as i64;
    let mut stats = CorrectionStats {
        requested: dots.len(),
        ..Default::default()
    };

    for dot in dots {
        let x = i64::from(dot.x);
        let y = i64::from(dot.y);

        // bottom margin is one row wider than the right margin
        if x < 2 || x > w - 3 || y < 2 || y > h - 4 {
            stats.skipped += 1;
            continue;
        }

        let value = interpolate_pixel(source, x, y);
        destination.set_pixel(x as usize, y as usize, value);
        stats.corrected += 1;
    }

    stats
}

/// Averages the neighbor pair with the minimum absolute gradient. `(x, y)`
/// must be at least two pixels away from every border.
fn interpolate_pixel<S: PixelSource + ?Sized>(source: &S, x: i64, y: i64) -> u16 {
    let pixel = |dx: i64, dy: i64| i32::from(source.get_pixel((x + dx) as usize, (y + dy) as usize));

    let mut best: Option<(i32, i32)> = None;
    for direction in Direction::ALL {
        let ((ax, ay), (bx, by)) = direction.offsets();
        let a = pixel(ax, ay);
        let b = pixel(bx, by);
        let gradient = (a - b).abs();

        if best.is_none_or(|(min_gradient, _)| gradient < min_gradient) {
            best = Some((gradient, a + b));
        }
    }

    best.map_or(0, |(_, sum)| (sum / 2) as u16)
}

/// Writes 0 at every dot inside the frame. Dots outside are dropped.
pub fn mark_bad_pixels<S, D>(source: &S, destination: &mut D, dots: &[PixelCoord]) -> CorrectionStats
where
    S: PixelSource + ?Sized,
    D: PixelSink + ?Sized,
{
    let w = source.width() as i64;
    let h = source.height() as i64;
    let mut stats = CorrectionStats {
        requested: dots.len(),
        ..Default::default()
    };

    for dot in dots {
        let x = i64::from(dot.x);
        let y = i64::from(dot.y);

        if x < 0 || x >= w || y < 0 || y >= h {
            stats.skipped += 1;
            continue;
        }

        destination.set_pixel(x as usize, y as usize, 0);
        stats.corrected += 1;
    }

    stats
}
