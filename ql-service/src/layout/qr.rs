//! QR code label rendering
//!
//! Generates the QR symbol and composes it with optional companion text,
//! either stacked vertically or side by side. Caller-supplied enum strings
//! (error correction, positions) parse leniently with documented defaults;
//! only the persisted settings document is strict about its values.

use crate::error::{ServiceError, ServiceResult};
use crate::layout::font::FontProvider;
use crate::layout::text::{LABEL_WIDTH, TextOptions, measure_lines, render_text_block};
use crate::settings::Alignment;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use qrcodegen::{QrCode, QrCodeEcc, QrSegment, Version};
use tracing::debug;

/// Gap between the QR symbol and its companion text block
const QR_PADDING: u32 = 20;

/// Line spacing inside a side-by-side text column
const SIDE_LINE_SPACING: u32 = 10;

/// Error-correction level (L/M/Q/H → 7/15/25/30% redundancy)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EcLevel {
    Low,
    #[default]
    Medium,
    Quartile,
    High,
}

impl EcLevel {
    /// Lenient parse; anything unrecognized falls back to medium
    pub fn parse_or_default(s: &str) -> EcLevel {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" => EcLevel::Low,
            "Q" => EcLevel::Quartile,
            "H" => EcLevel::High,
            _ => EcLevel::Medium,
        }
    }

    fn to_ecc(self) -> QrCodeEcc {
        match self {
            EcLevel::Low => QrCodeEcc::Low,
            EcLevel::Medium => QrCodeEcc::Medium,
            EcLevel::Quartile => QrCodeEcc::Quartile,
            EcLevel::High => QrCodeEcc::High,
        }
    }
}

/// Where companion text sits in stacked composition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextPosition {
    Top,
    #[default]
    Bottom,
}

impl TextPosition {
    /// Lenient parse; anything unrecognized falls back to bottom
    pub fn parse_or_default(s: &str) -> TextPosition {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => TextPosition::Top,
            _ => TextPosition::Bottom,
        }
    }
}

/// Which side the QR column takes in side-by-side composition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QrPosition {
    Left,
    #[default]
    Right,
}

impl QrPosition {
    /// Lenient parse; anything unrecognized falls back to right
    pub fn parse_or_default(s: &str) -> QrPosition {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => QrPosition::Left,
            _ => QrPosition::Right,
        }
    }
}

/// QR symbol generation parameters
#[derive(Debug, Clone, Copy)]
pub struct QrOptions {
    /// Minimum symbol version (1-40); higher versions are used when the
    /// payload does not fit
    pub version: Option<u8>,
    /// Module size in pixels before rescaling
    pub box_size: u32,
    /// Quiet-zone width in modules
    pub border: u32,
    pub error_correction: EcLevel,
    /// Target symbol width in pixels
    pub size: u32,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            version: None,
            box_size: 10,
            border: 4,
            error_correction: EcLevel::Medium,
            size: 400,
        }
    }
}

/// Companion text parameters
#[derive(Debug, Clone)]
pub struct QrText {
    pub content: String,
    pub font_size: f32,
    pub alignment: Alignment,
    pub position: TextPosition,
}

impl Default for QrText {
    fn default() -> Self {
        Self {
            content: String::new(),
            font_size: 30.0,
            alignment: Alignment::Center,
            position: TextPosition::Bottom,
        }
    }
}

/// How the QR symbol and companion text are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Composition {
    #[default]
    QrOnly,
    Stacked,
    SideBySide {
        qr_position: QrPosition,
    },
}

/// Render a QR label, optionally composed with companion text
pub fn render_qr(
    font: &dyn FontProvider,
    data: &str,
    opts: &QrOptions,
    text: Option<&QrText>,
    composition: Composition,
) -> ServiceResult<RgbImage> {
    let symbol = generate_symbol(data, opts)?;

    let text = text.filter(|t| !t.content.is_empty());
    match (composition, text) {
        (Composition::Stacked, Some(text)) => stacked(font, &symbol, text),
        (Composition::SideBySide { qr_position }, Some(text)) => {
            side_by_side(font, &symbol, text, qr_position)
        }
        _ => Ok(symbol),
    }
}

/// Generate the QR symbol and rescale it to the requested width
fn generate_symbol(data: &str, opts: &QrOptions) -> ServiceResult<RgbImage> {
    let segments = QrSegment::make_segments(data);
    let min_version = match opts.version {
        Some(v @ 1..=40) => Version::new(v),
        _ => Version::MIN,
    };
    let qr = QrCode::encode_segments_advanced(
        &segments,
        opts.error_correction.to_ecc(),
        min_version,
        Version::MAX,
        None,
        true,
    )
    .map_err(|e| ServiceError::ImageProcessing(format!("QR encoding failed: {e}")))?;

    let modules = qr.size() as u32;
    let box_size = opts.box_size.max(1);
    let dim = (modules + 2 * opts.border) * box_size;

    let mut img = RgbImage::from_pixel(dim, dim, Rgb([255, 255, 255]));
    for my in 0..modules {
        for mx in 0..modules {
            if !qr.get_module(mx as i32, my as i32) {
                continue;
            }
            let x0 = (opts.border + mx) * box_size;
            let y0 = (opts.border + my) * box_size;
            for y in y0..y0 + box_size {
                for x in x0..x0 + box_size {
                    img.put_pixel(x, y, Rgb([0, 0, 0]));
                }
            }
        }
    }

    debug!(modules, dim, target = opts.size, "Generated QR symbol");

    if opts.size > 0 && opts.size != dim {
        // Symbols are square, so a uniform rescale keeps the aspect ratio.
        img = imageops::resize(&img, opts.size, opts.size, FilterType::Lanczos3);
    }

    Ok(img)
}

/// QR with a text block above or below
fn stacked(font: &dyn FontProvider, symbol: &RgbImage, text: &QrText) -> ServiceResult<RgbImage> {
    let opts = TextOptions {
        font_size: text.font_size,
        alignment: text.alignment,
    };

    let (qr_w, qr_h) = symbol.dimensions();
    let text_img = render_text_block(font, &text.content, &opts, qr_w, false)?;
    let text_h = text_img.height();

    let total_h = qr_h + text_h + QR_PADDING;
    let mut canvas = RgbImage::from_pixel(qr_w, total_h, Rgb([255, 255, 255]));

    match text.position {
        TextPosition::Top => {
            imageops::replace(&mut canvas, &text_img, 0, (QR_PADDING / 2) as i64);
            imageops::replace(&mut canvas, symbol, 0, (text_h + QR_PADDING) as i64);
        }
        TextPosition::Bottom => {
            imageops::replace(&mut canvas, symbol, 0, 0);
            imageops::replace(&mut canvas, &text_img, 0, (qr_h + QR_PADDING / 2) as i64);
        }
    }

    Ok(canvas)
}

/// QR in a 1/3 column, text in the remaining 2/3
fn side_by_side(
    font: &dyn FontProvider,
    symbol: &RgbImage,
    text: &QrText,
    qr_position: QrPosition,
) -> ServiceResult<RgbImage> {
    let opts = TextOptions {
        font_size: text.font_size,
        alignment: text.alignment,
    };

    let (metrics, text_h) = measure_lines(font, &text.content, &opts, SIDE_LINE_SPACING)?;
    let max_text_w = metrics.iter().map(|m| m.width).max().unwrap_or(0);

    let qr_w = symbol.width();
    let total_w = (qr_w + max_text_w + 3 * QR_PADDING).max(LABEL_WIDTH);
    let text_area_w = (total_w * 2 / 3).saturating_sub(2 * QR_PADDING);
    let qr_area_w = total_w - text_area_w - 3 * QR_PADDING;

    // The QR column is square; rescale the symbol to fill it exactly.
    let symbol = imageops::resize(symbol, qr_area_w, qr_area_w, FilterType::Lanczos3);

    let total_h = qr_area_w.max(text_h) + 2 * QR_PADDING;
    let mut canvas = RgbImage::from_pixel(total_w, total_h, Rgb([255, 255, 255]));

    let (qr_x, text_x0) = match qr_position {
        QrPosition::Left => (QR_PADDING, qr_area_w + 2 * QR_PADDING),
        QrPosition::Right => (text_area_w + 2 * QR_PADDING, QR_PADDING),
    };

    // Both columns are centered against the taller of the two.
    let qr_y = (total_h - qr_area_w) / 2;
    imageops::replace(&mut canvas, &symbol, qr_x as i64, qr_y as i64);

    let mut y = ((total_h - text_h) / 2) as i32;
    for m in &metrics {
        let x = text_x0 as i32
            + match opts.alignment {
                Alignment::Left => 0,
                Alignment::Center => (text_area_w as i32 - m.width as i32) / 2,
                Alignment::Right => text_area_w as i32 - m.width as i32,
            };
        font.draw(&mut canvas, x, y, &m.line.text, opts.font_size, m.line.weight)?;
        y += m.height as i32 + SIDE_LINE_SPACING as i32;
    }

    Ok(canvas)
}
