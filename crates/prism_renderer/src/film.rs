//! Tiled film accumulation buffer.
//!
//! The image is split into square tiles that workers render independently
//! into their own [`FilmTile`] buffers. Finished tiles are merged into the
//! shared [`Film`] under a single lock, and the film is finally written out
//! as PPM.

use crate::{ppm, Color, RenderSettings};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

/// Errors that can occur while tiling, merging or writing a film.
#[derive(Error, Debug)]
pub enum FilmError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid film dimensions: {width}x{height} with tile size {tile_size}")]
    InvalidDimensions {
        width: u32,
        height: u32,
        tile_size: u32,
    },

    #[error("Tile ({i}, {j}) is outside the tile grid")]
    TileOutOfRange { i: u32, j: u32 },

    #[error("Cannot average over zero samples per pixel")]
    ZeroSamples,

    #[error(
        "Tile at ({origin_x}, {origin_y}) with extent {extent_x}x{extent_y} does not fit the film"
    )]
    TileMismatch {
        origin_x: u32,
        origin_y: u32,
        extent_x: u32,
        extent_y: u32,
    },
}

pub type FilmResult<T> = Result<T, FilmError>;

/// A rectangular region of the film with its own pixel buffer.
///
/// Coordinates grow right and up from the film's bottom-left corner, so
/// tile row 0 is the bottom image row.
/// Pixels are stored row-major within the tile.
#[derive(Debug, Clone)]
pub struct FilmTile {
    pub origin_x: u32,
    pub origin_y: u32,
    pub extent_x: u32,
    pub extent_y: u32,
    pixels: Vec<Color>,
}

impl FilmTile {
    fn new(origin_x: u32, origin_y: u32, extent_x: u32, extent_y: u32) -> Self {
        Self {
            origin_x,
            origin_y,
            extent_x,
            extent_y,
            pixels: vec![Color::ZERO; extent_x as usize * extent_y as usize],
        }
    }

    #[inline]
    fn index(&self, local_x: u32, local_y: u32) -> usize {
        debug_assert!(local_x < self.extent_x && local_y < self.extent_y);
        local_y as usize * self.extent_x as usize + local_x as usize
    }

    /// Accumulate one sample at a tile-local pixel.
    ///
    /// Panics if the pixel lies outside the tile.
    pub fn add_sample(&mut self, local_x: u32, local_y: u32, color: Color) {
        let index = self.index(local_x, local_y);
        self.pixels[index] += color;
    }

    /// Accumulated value at a tile-local pixel.
    pub fn pixel(&self, local_x: u32, local_y: u32) -> Color {
        self.pixels[self.index(local_x, local_y)]
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }
}

/// Shared image buffer that finished tiles are merged into.
///
/// Tile row `y` is stored at buffer row `height - y - 1`, so the buffer is
/// already in PPM order (first row is the top of the image).
pub struct Film {
    width: u32,
    height: u32,
    tile_size: u32,
    pixels: Mutex<Vec<Color>>,
}

impl Film {
    pub fn new(width: u32, height: u32, tile_size: u32) -> FilmResult<Self> {
        if width == 0 || height == 0 || tile_size == 0 {
            return Err(FilmError::InvalidDimensions {
                width,
                height,
                tile_size,
            });
        }

        log::info!("Created {}x{} film with {}px tiles", width, height, tile_size);

        Ok(Self {
            width,
            height,
            tile_size,
            pixels: Mutex::new(vec![Color::ZERO; width as usize * height as usize]),
        })
    }

    pub fn from_settings(settings: &RenderSettings) -> FilmResult<Self> {
        Self::new(
            settings.image_width,
            settings.image_height,
            settings.tile_size,
        )
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Number of tile columns and rows, counting partial edge tiles.
    pub fn tile_grid(&self) -> (u32, u32) {
        (
            self.width.div_ceil(self.tile_size),
            self.height.div_ceil(self.tile_size),
        )
    }

    /// Fresh zeroed tile `i` columns across and `j` rows up.
    ///
    /// Edge tiles are clipped to the film.
    pub fn get_film_tile(&self, i: u32, j: u32) -> FilmResult<FilmTile> {
        let (columns, rows) = self.tile_grid();
        if i >= columns || j >= rows {
            return Err(FilmError::TileOutOfRange { i, j });
        }

        let origin_x = i * self.tile_size;
        let origin_y = j * self.tile_size;
        let extent_x = self.tile_size.min(self.width - origin_x);
        let extent_y = self.tile_size.min(self.height - origin_y);

        Ok(FilmTile::new(origin_x, origin_y, extent_x, extent_y))
    }

    /// Viewport position `(s, t)` of pixel `(x, y)` offset by `jitter`.
    ///
    /// Both run over `[0, 1]` across the film; `t` grows with `y`, so tile
    /// row 0 samples the bottom of the viewport.
    pub fn viewport_position(&self, x: u32, y: u32, jitter: (f64, f64)) -> (f64, f64) {
        let s = (x as f64 + jitter.0) / (self.width.max(2) - 1) as f64;
        let t = (y as f64 + jitter.1) / (self.height.max(2) - 1) as f64;
        (s, t)
    }

    /// Every tile index, nearest the image center first.
    ///
    /// Rendering in this order fills in the middle of the image early.
    pub fn tiles(&self) -> Vec<(u32, u32)> {
        let (columns, rows) = self.tile_grid();
        let mut tiles: Vec<(u32, u32)> = (0..rows)
            .flat_map(|j| (0..columns).map(move |i| (i, j)))
            .collect();

        let center_x = self.width as f64 / 2.0;
        let center_y = self.height as f64 / 2.0;
        let distance = |&(i, j): &(u32, u32)| {
            let origin_x = (i * self.tile_size) as f64;
            let origin_y = (j * self.tile_size) as f64;
            let extent_x = self.tile_size.min(self.width - i * self.tile_size) as f64;
            let extent_y = self.tile_size.min(self.height - j * self.tile_size) as f64;

            let dx = origin_x + extent_x / 2.0 - center_x;
            let dy = origin_y + extent_y / 2.0 - center_y;
            dx * dx + dy * dy
        };

        tiles.sort_by(|a, b| distance(a).total_cmp(&distance(b)));
        tiles
    }

    /// Add a finished tile's pixels into the film.
    ///
    /// Holds the film lock for the whole copy. Merging the same region twice
    /// sums both passes.
    pub fn merge_film_tile(&self, tile: FilmTile) -> FilmResult<()> {
        let fits_x = tile.origin_x.checked_add(tile.extent_x).is_some_and(|end| end <= self.width);
        let fits_y = tile.origin_y.checked_add(tile.extent_y).is_some_and(|end| end <= self.height);
        let sized = tile.pixels.len() == tile.extent_x as usize * tile.extent_y as usize;
        if !(fits_x && fits_y && sized) {
            return Err(FilmError::TileMismatch {
                origin_x: tile.origin_x,
                origin_y: tile.origin_y,
                extent_x: tile.extent_x,
                extent_y: tile.extent_y,
            });
        }

        let width = self.width as usize;
        let mut pixels = self.lock_pixels();

        for local_y in 0..tile.extent_y {
            let row = (self.height - (tile.origin_y + local_y) - 1) as usize;
            for local_x in 0..tile.extent_x {
                let column = (tile.origin_x + local_x) as usize;
                pixels[row * width + column] += tile.pixel(local_x, local_y);
            }
        }
        drop(pixels);

        log::debug!(
            "Merged tile at ({}, {}) extent {}x{}",
            tile.origin_x,
            tile.origin_y,
            tile.extent_x,
            tile.extent_y
        );

        Ok(())
    }

    /// Merged value at `(x, y)` in tile coordinates (y grows upward).
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = (self.height - y - 1) as usize * self.width as usize + x as usize;
        Some(self.lock_pixels()[index])
    }

    /// Write the film to `path` as PPM, averaging over `samples` per pixel.
    ///
    /// The file is flushed and synced before returning, so a returned `Ok`
    /// means the whole image reached the disk.
    pub fn write_image(&self, path: impl AsRef<Path>, samples: u32) -> FilmResult<()> {
        if samples == 0 {
            return Err(FilmError::ZeroSamples);
        }

        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_ppm(&mut writer, samples)?;

        let file = writer.into_inner().map_err(|err| err.into_error())?;
        file.sync_all()?;

        log::info!(
            "Wrote {}x{} image to {}",
            self.width,
            self.height,
            path.display()
        );
        Ok(())
    }

    /// Write the film as PPM to any writer.
    pub fn write_ppm<W: Write>(&self, out: &mut W, samples: u32) -> FilmResult<()> {
        if samples == 0 {
            return Err(FilmError::ZeroSamples);
        }

        let pixels = self.lock_pixels();
        ppm::write_header(out, self.width, self.height)?;
        for &color in pixels.iter() {
            ppm::write_color_weighted(out, color, samples)?;
        }
        out.flush()?;

        Ok(())
    }

    fn lock_pixels(&self) -> MutexGuard<'_, Vec<Color>> {
        self.pixels.lock().unwrap_or_else(|poisoned| {
            log::warn!("Film lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}
