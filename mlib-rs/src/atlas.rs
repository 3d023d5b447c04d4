use crate::{
    error::{LibError, LibResult},
    image_record::{ImageRecord, BYTES_PER_PIXEL},
};

/// An RGBA raster that decoded images are copied onto.
///
/// Pixels are stored row-major from the top row down, four bytes per pixel in
/// R, G, B, A order, ready to hand to an image encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    /// Creates a fully transparent canvas.
    ///
    /// # Panics
    ///
    /// Panics if `width * height * 4` overflows `usize`; see [`GridLayout::canvas_for`]
    /// for a checked constructor sized for a grid.
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * BYTES_PER_PIXEL;
        Canvas {
            width,
            height,
            pixels: vec![0; len],
        }
    }

    /// Creates a canvas of exactly the record's size holding its pixels.
    ///
    /// Returns `None` when the record has not been decoded or has no pixels.
    pub fn from_record(record: &ImageRecord) -> Option<Self> {
        if !record.is_decoded() || record.geometry().is_empty() {
            return None;
        }
        let mut canvas = Canvas::new(record.width() as u32, record.height() as u32);
        canvas.place(0, 0, record).then_some(canvas)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// The RGBA value at `(x, y)`, or `None` outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let at = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let mut rgba = [0u8; 4];
        rgba.copy_from_slice(&self.pixels[at..at + BYTES_PER_PIXEL]);
        Some(rgba)
    }

    /// Copies a decoded record onto the canvas with its top-left corner at `(at_x, at_y)`,
    /// converting every pixel from BGRA to RGBA.
    ///
    /// Pixels falling outside the canvas are dropped. Returns `false`, leaving the
    /// canvas untouched, when the record has no decoded pixels.
    pub fn place(&mut self, at_x: i32, at_y: i32, record: &ImageRecord) -> bool {
        if record.geometry().is_empty() || !record.is_decoded() {
            return false;
        }
        let Some(source) = record.pixels() else {
            return false;
        };

        let width = record.width() as usize;
        let height = record.height() as usize;
        if source.len() < width * height * BYTES_PER_PIXEL {
            return false;
        }

        for h in 0..height {
            let y = at_y as i64 + h as i64;
            if y < 0 || y >= self.height as i64 {
                continue;
            }
            for w in 0..width {
                let x = at_x as i64 + w as i64;
                if x < 0 || x >= self.width as i64 {
                    continue;
                }
                let from = h * BYTES_PER_PIXEL * width + w * BYTES_PER_PIXEL;
                let to = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
                let bgra = &source[from..from + BYTES_PER_PIXEL];
                self.pixels[to..to + BYTES_PER_PIXEL]
                    .copy_from_slice(&[bgra[2], bgra[1], bgra[0], bgra[3]]);
            }
        }
        true
    }
}

/// Places records on a fixed grid, left to right then top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    /// Cells per row.
    pub columns: u32,
    pub cell_width: u32,
    pub cell_height: u32,
}

impl Default for GridLayout {
    /// 20 columns of 96x64 cells, the size of a map tile.
    fn default() -> Self {
        GridLayout {
            columns: 20,
            cell_width: 96,
            cell_height: 64,
        }
    }
}

impl GridLayout {
    pub fn new(columns: u32, cell_width: u32, cell_height: u32) -> Self {
        GridLayout {
            columns: columns.max(1),
            cell_width,
            cell_height,
        }
    }

    /// Top-left corner of the cell holding record `index`, or `None` when it
    /// does not fit in canvas coordinates.
    pub fn position(&self, index: usize) -> Option<(i32, i32)> {
        let columns = self.columns.max(1) as u64;
        let index = index as u64;
        let x = (index % columns).checked_mul(self.cell_width as u64)?;
        let y = (index / columns).checked_mul(self.cell_height as u64)?;
        Some((i32::try_from(x).ok()?, i32::try_from(y).ok()?))
    }

    /// Number of rows needed for `count` records.
    pub fn rows_for(&self, count: usize) -> u64 {
        (count as u64).div_ceil(self.columns.max(1) as u64)
    }

    /// A blank canvas large enough to hold `count` records.
    ///
    /// Both sides must fit in an `i32` so every cell can be addressed, and the
    /// pixel buffer must fit in memory addressing.
    pub fn canvas_for(&self, count: usize) -> LibResult<Canvas> {
        let too_large = || {
            LibError::InvalidData(format!(
                "Atlas of {count} images in {} columns of {}x{} cells is too large",
                self.columns, self.cell_width, self.cell_height
            ))
        };

        let width = (self.columns.max(1) as u64)
            .checked_mul(self.cell_width as u64)
            .filter(|width| *width <= i32::MAX as u64)
            .ok_or_else(too_large)?;
        let height = self
            .rows_for(count)
            .checked_mul(self.cell_height as u64)
            .filter(|height| *height <= i32::MAX as u64)
            .ok_or_else(too_large)?;
        width
            .checked_mul(height)
            .and_then(|pixels| pixels.checked_mul(BYTES_PER_PIXEL as u64))
            .filter(|len| usize::try_from(*len).is_ok())
            .ok_or_else(too_large)?;

        Ok(Canvas::new(width as u32, height as u32))
    }
}
