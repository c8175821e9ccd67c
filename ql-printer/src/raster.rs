//! Raster job parameters and the encoder seam
//!
//! Turning an image into the model-specific line protocol is delegated to a
//! [`RasterEncoder`] implementation outside this crate. What lives here is
//! everything an encoder needs to agree on with its callers: the job
//! parameters and the label media geometry they are validated against.

use crate::error::{PrintError, PrintResult};
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Label media geometry for one tape class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Media {
    /// Tape class identifier as it appears in settings (e.g. "62")
    pub class: &'static str,
    /// Printable width in pixels at 300 dpi
    pub printable_px: u32,
    /// Whether the tape carries a second (red) color layer
    pub red: bool,
}

/// Supported tape classes
///
/// Widths follow the QL printable-area table; "62" is the full-width
/// 62 mm roll every layout in this workspace is sized for (696 px).
pub const MEDIA_TABLE: [Media; 8] = [
    Media { class: "12", printable_px: 106, red: false },
    Media { class: "29", printable_px: 306, red: false },
    Media { class: "38", printable_px: 413, red: false },
    Media { class: "50", printable_px: 554, red: false },
    Media { class: "54", printable_px: 590, red: false },
    Media { class: "62", printable_px: 696, red: false },
    Media { class: "62red", printable_px: 696, red: true },
    Media { class: "102", printable_px: 1164, red: false },
];

impl Media {
    /// Look up a tape class by its settings identifier
    pub fn lookup(class: &str) -> Option<&'static Media> {
        MEDIA_TABLE.iter().find(|m| m.class == class)
    }
}

/// Parameters for one raster encoding job
///
/// Mirrors the knobs the settings document exposes; built by the service
/// from stored settings plus per-request overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterParams {
    /// Printer model identifier (e.g. "QL-800")
    pub model: String,
    /// Tape class, see [`MEDIA_TABLE`]
    pub label_size: String,
    /// Rotation already applied to the image, kept for device setup
    pub rotate: u16,
    /// Binarization threshold in percent (0-100)
    pub threshold: f64,
    /// Error-diffusion dithering instead of hard threshold
    pub dither: bool,
    /// Run-length compress raster lines
    pub compress: bool,
    /// Use the red layer of two-color media
    pub red: bool,
}

impl RasterParams {
    /// Resolve the media entry for this job
    pub fn media(&self) -> PrintResult<&'static Media> {
        Media::lookup(&self.label_size)
            .ok_or_else(|| PrintError::UnsupportedMedia(self.label_size.clone()))
    }

    /// Check parameter consistency before encoding
    pub fn validate(&self) -> PrintResult<()> {
        if self.model.trim().is_empty() {
            return Err(PrintError::InvalidConfig("missing printer model".into()));
        }
        let media = self.media()?;
        if self.red && !media.red {
            return Err(PrintError::UnsupportedMedia(format!(
                "{} has no red layer",
                self.label_size
            )));
        }
        if !(0.0..=100.0).contains(&self.threshold) {
            return Err(PrintError::InvalidConfig(format!(
                "threshold out of range: {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// Trait for raster instruction encoders
///
/// Implementations own the device protocol; the core only hands over the
/// rendered image and the job parameters.
pub trait RasterEncoder: Send + Sync {
    /// Convert an image into device-specific print instructions
    fn encode(&self, image: &RgbImage, params: &RasterParams) -> PrintResult<Vec<u8>>;
}
