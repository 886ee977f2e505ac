use ndarray::Array2;
use tracing::trace;

use super::palette::Palette;

/// Index written into every pixel of a new canvas (first palette entry).
pub const BACKGROUND_INDEX: u8 = 0;

/// Square raster of palette indices with side length `2 * half_size + 1`.
///
/// Pixels are stored as `(row, column)`, i.e. `(y, x)`, so that the
/// standard layout of the array is already the row-major order a GIF
/// frame expects.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Canvas {
    half_size: usize,
    pixels: Array2<u8>,
    palette: Palette,
}

impl Canvas {
    /// Creates a blank canvas bound to the given palette.
    #[must_use]
    #[tracing::instrument(level = "trace")]
    pub fn empty(half_size: usize, palette: Palette) -> Self {
        trace!("Creating empty canvas");
        let side = 2 * half_size + 1;
        Self {
            half_size,
            pixels: Array2::from_elem((side, side), BACKGROUND_INDEX),
            palette,
        }
    }

    #[must_use]
    pub const fn half_size(&self) -> usize {
        self.half_size
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.pixels.ncols()
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.pixels.nrows()
    }

    #[must_use]
    pub const fn palette(&self) -> &Palette {
        &self.palette
    }

    #[must_use]
    pub const fn pixels(&self) -> &Array2<u8> {
        &self.pixels
    }

    /// Palette index at `(x, y)`, or `None` outside the raster.
    #[must_use]
    pub fn color_index(&self, x: i64, y: i64) -> Option<u8> {
        let (x, y) = (usize::try_from(x).ok()?, usize::try_from(y).ok()?);
        self.pixels.get((y, x)).copied()
    }

    /// Writes `color_index` at `(x, y)`. Coordinates outside the raster are ignored.
    pub fn set_color_index(&mut self, x: i64, y: i64, color_index: u8) {
        let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) else {
            return;
        };
        if let Some(pixel) = self.pixels.get_mut((y, x)) {
            *pixel = color_index;
        }
    }

    /// Flattened indices in row-major order.
    #[must_use]
    pub fn indices(&self) -> Vec<u8> {
        self.pixels.iter().copied().collect()
    }
}

/// Maps normalized curve coordinates in `[-1, 1]` onto the canvas and
/// writes `color_index` into a 2x2 block anchored one pixel up and left
/// of the mapped point.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss
)]
pub fn plot(canvas: &mut Canvas, x: f64, y: f64, color_index: u8) {
    let half_size = canvas.half_size as f64;
    // `as` truncates toward zero
    let pixel_x = canvas.half_size as i64 + (x * half_size) as i64;
    let pixel_y = canvas.half_size as i64 + (y * half_size) as i64;

    for dx in -1..1 {
        for dy in -1..1 {
            canvas.set_color_index(pixel_x + dx, pixel_y + dy, color_index);
        }
    }
}
