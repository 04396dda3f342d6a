//! Render settings shared by the film and the driver that fills it.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading render settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

/// Image, tiling and sampling parameters for one render.
///
/// Missing JSON fields fall back to [`RenderSettings::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub image_width: u32,
    pub image_height: u32,
    /// Edge length of a square film tile in pixels
    pub tile_size: u32,
    pub samples_per_pixel: u32,
    /// Shutter open time
    pub time0: f64,
    /// Shutter close time
    pub time1: f64,
    /// Base seed for per-tile random generators
    pub seed: u64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            image_width: 400,
            image_height: 225,
            tile_size: 32,
            samples_per_pixel: 16,
            time0: 0.0,
            time1: 1.0,
            seed: 0,
        }
    }
}

impl RenderSettings {
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.image_width = width;
        self.image_height = height;
        self
    }

    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_samples(mut self, samples_per_pixel: u32) -> Self {
        self.samples_per_pixel = samples_per_pixel;
        self
    }

    pub fn with_shutter(mut self, time0: f64, time1: f64) -> Self {
        self.time0 = time0;
        self.time1 = time1;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Width over height.
    pub fn aspect_ratio(&self) -> f64 {
        self.image_width as f64 / self.image_height as f64
    }

    /// Parse and validate settings from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        let settings: RenderSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json_str(&json)?;
        log::info!("Loaded render settings from {}", path.display());
        Ok(settings)
    }

    /// Reject settings no film or sampler can work with.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.image_width == 0 || self.image_height == 0 {
            return Err(SettingsError::Invalid(format!(
                "image size must be non-zero, got {}x{}",
                self.image_width, self.image_height
            )));
        }
        if self.tile_size == 0 {
            return Err(SettingsError::Invalid("tile size must be non-zero".into()));
        }
        if self.samples_per_pixel == 0 {
            return Err(SettingsError::Invalid(
                "samples per pixel must be non-zero".into(),
            ));
        }
        if !(self.time0 <= self.time1) {
            return Err(SettingsError::Invalid(format!(
                "shutter interval [{}, {}] is empty",
                self.time0, self.time1
            )));
        }
        Ok(())
    }
}
