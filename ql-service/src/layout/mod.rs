//! Label layout engine
//!
//! Pure functions from (content, options) to pixel images. Nothing here
//! talks to a printer or touches storage; the only capabilities consumed
//! are font metrics and QR symbol generation.

mod font;
mod image_ops;
mod qr;
mod text;

pub use font::{FontMetrics, FontProvider, FontWeight, TrueTypeFont};
pub use image_ops::{apply_rotation, fit_width};
pub use qr::{Composition, EcLevel, QrOptions, QrPosition, QrText, TextPosition, render_qr};
pub use text::{LABEL_WIDTH, TextOptions, render_text};
