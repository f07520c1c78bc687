/// Read access to a single-channel CFA frame
pub trait PixelSource {
    fn width(&self) -> usize;
    fn height(&self) -> usize;

    /// Intensity at `(x, y)`. Callers guarantee the position is inside the frame.
    fn get_pixel(&self, x: usize, y: usize) -> u16;
}

/// Write access to a single-channel CFA frame
pub trait PixelSink {
    /// Stores `value` at `(x, y)`. Callers guarantee the position is inside the frame.
    fn set_pixel(&mut self, x: usize, y: usize, value: u16);
}
