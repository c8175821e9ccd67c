//! Font metrics capability
//!
//! The layout engine measures and draws text through [`FontProvider`]; the
//! TrueType implementation below is the production provider, tests plug in
//! fixed-metric fakes. Glyph runs are laid out on a common baseline computed
//! from per-glyph ascent/descent, so uneven glyphs stay visually aligned.

use crate::error::{ServiceError, ServiceResult};
use fontdue::{Font, FontSettings};
use image::RgbImage;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Font weight selected by markup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
}

/// Measured dimensions of one glyph run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontMetrics {
    /// Advance width in pixels
    pub width: u32,
    /// Total height in pixels (ascent + descent)
    pub height: u32,
    /// Pixels above the baseline
    pub ascent: i32,
    /// Pixels below the baseline
    pub descent: i32,
}

impl FontMetrics {
    /// Zero-size metrics for an empty run
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            ascent: 0,
            descent: 0,
        }
    }
}

/// Trait for font measurement and drawing
pub trait FontProvider: Send + Sync {
    /// Measure a single-weight glyph run
    fn measure(&self, text: &str, size: f32, weight: FontWeight) -> ServiceResult<FontMetrics>;

    /// Draw a run in black with its box's top-left corner at (x, y)
    ///
    /// Pixels outside the canvas are clipped, so negative offsets (an
    /// over-wide centered line) degrade instead of failing.
    fn draw(
        &self,
        canvas: &mut RgbImage,
        x: i32,
        y: i32,
        text: &str,
        size: f32,
        weight: FontWeight,
    ) -> ServiceResult<()>;
}

/// Candidate (regular, bold) face pairs in the usual system locations
const FONT_CANDIDATES: [(&str, &str); 4] = [
    (
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    ),
    (
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    ),
    (
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    ),
    (
        "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/liberation/LiberationSans-Bold.ttf",
    ),
];

/// TrueType font provider backed by fontdue
pub struct TrueTypeFont {
    regular: Font,
    bold: Font,
}

impl TrueTypeFont {
    /// Build a provider from raw font data
    ///
    /// Without separate bold data the regular face doubles as bold.
    pub fn from_bytes(regular: Vec<u8>, bold: Option<Vec<u8>>) -> ServiceResult<Self> {
        let parse = |data: Vec<u8>| {
            Font::from_bytes(data, FontSettings::default())
                .map_err(|e| ServiceError::ImageProcessing(format!("failed to parse font: {e}")))
        };

        let regular = parse(regular)?;
        let bold = match bold {
            Some(data) => parse(data)?,
            None => regular.clone(),
        };

        Ok(Self { regular, bold })
    }

    /// Find a usable face pair among the common system font locations
    pub fn discover() -> ServiceResult<Self> {
        for (regular_path, bold_path) in FONT_CANDIDATES {
            let regular = fs::read(Path::new(regular_path)).ok();
            let bold = fs::read(Path::new(bold_path)).ok();

            // Either face alone is enough; the present one covers both weights.
            let (regular, bold) = match (regular, bold) {
                (Some(r), b) => (r, b),
                (None, Some(b)) => (b, None),
                (None, None) => continue,
            };

            info!(font = regular_path, "Using system font");
            return Self::from_bytes(regular, bold);
        }

        Err(ServiceError::ImageProcessing(
            "no usable system font found".to_string(),
        ))
    }

    fn face(&self, weight: FontWeight) -> &Font {
        match weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Bold => &self.bold,
        }
    }
}

impl FontProvider for TrueTypeFont {
    fn measure(&self, text: &str, size: f32, weight: FontWeight) -> ServiceResult<FontMetrics> {
        if text.is_empty() {
            return Ok(FontMetrics::empty());
        }
        if !(size > 0.0) {
            return Err(ServiceError::ImageProcessing(format!(
                "invalid font size: {size}"
            )));
        }

        let font = self.face(weight);
        let mut x = 0.0f32;
        let mut max_ascent = 0i32;
        let mut max_descent = 0i32;

        for ch in text.chars() {
            let metrics = font.metrics(ch, size);
            let ascent = metrics.height as i32 + metrics.ymin;
            let descent = -metrics.ymin;
            max_ascent = max_ascent.max(ascent);
            max_descent = max_descent.max(descent);
            x += metrics.advance_width;
        }

        Ok(FontMetrics {
            width: x.ceil() as u32,
            height: (max_ascent + max_descent).max(0) as u32,
            ascent: max_ascent,
            descent: max_descent,
        })
    }

    fn draw(
        &self,
        canvas: &mut RgbImage,
        x: i32,
        y: i32,
        text: &str,
        size: f32,
        weight: FontWeight,
    ) -> ServiceResult<()> {
        if text.is_empty() {
            return Ok(());
        }

        let font = self.face(weight);

        // First pass: rasterize and find the run's common baseline.
        let mut glyphs = Vec::new();
        let mut pen = 0.0f32;
        let mut max_ascent = 0i32;
        for ch in text.chars() {
            let (metrics, bitmap) = font.rasterize(ch, size);
            max_ascent = max_ascent.max(metrics.height as i32 + metrics.ymin);
            glyphs.push((pen as i32, metrics, bitmap));
            pen += metrics.advance_width;
        }

        let (canvas_w, canvas_h) = (canvas.width() as i32, canvas.height() as i32);

        for (pen_x, metrics, bitmap) in glyphs {
            // Glyph top relative to the run box: common baseline minus
            // this glyph's own ascent.
            let glyph_top = max_ascent - (metrics.height as i32 + metrics.ymin);

            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let px = x + pen_x + metrics.xmin + gx as i32;
                    let py = y + glyph_top + gy as i32;
                    if px < 0 || py < 0 || px >= canvas_w || py >= canvas_h {
                        continue;
                    }

                    let coverage = bitmap[gy * metrics.width + gx];
                    if coverage == 0 {
                        continue;
                    }

                    // Black-on-white coverage blend: keep the darker value.
                    let shade = 255 - coverage;
                    let pixel = canvas.get_pixel_mut(px as u32, py as u32);
                    for c in &mut pixel.0 {
                        *c = (*c).min(shade);
                    }
                }
            }
        }

        debug!(len = text.len(), "Drew text run");
        Ok(())
    }
}
