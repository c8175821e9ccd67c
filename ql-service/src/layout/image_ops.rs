//! Image post-processing shared by every render path

use crate::error::{ServiceError, ServiceResult};
use image::imageops::{self, FilterType};
use image::RgbImage;

/// Resize an image to the given width, preserving aspect ratio
pub fn fit_width(img: &RgbImage, width: u32) -> RgbImage {
    let (w, h) = img.dimensions();
    if w == width || w == 0 {
        return img.clone();
    }
    let new_h = ((h as f64) * (width as f64) / (w as f64)).round().max(1.0) as u32;
    imageops::resize(img, width, new_h, FilterType::Lanczos3)
}

/// Rotate an image clockwise by a validated angle
///
/// The settings document restricts rotation to quarter turns, so the exact
/// lossless rotations are sufficient.
pub fn apply_rotation(img: RgbImage, rotate: u16) -> ServiceResult<RgbImage> {
    match rotate {
        0 => Ok(img),
        90 => Ok(imageops::rotate90(&img)),
        180 => Ok(imageops::rotate180(&img)),
        270 => Ok(imageops::rotate270(&img)),
        other => Err(ServiceError::ImageProcessing(format!(
            "unsupported rotation: {other}"
        ))),
    }
}
