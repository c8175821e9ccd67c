#![allow(dead_code)]

//! Shared test doubles: a fixed-metric font, an in-memory raster encoder,
//! and a recording transport.

use async_trait::async_trait;
use image::RgbImage;
use ql_printer::{DeviceTransport, PrintError, PrintResult, RasterEncoder, RasterParams};
use ql_service::error::ServiceResult;
use ql_service::layout::{FontMetrics, FontProvider, FontWeight};
use std::sync::{Arc, Mutex};

/// Deterministic font: every glyph advances 0.6 × size, ascent is 0.8 × size
pub struct FixedFont;

impl FixedFont {
    fn advance(size: f32) -> u32 {
        (size * 0.6).round() as u32
    }
}

impl FontProvider for FixedFont {
    fn measure(&self, text: &str, size: f32, _weight: FontWeight) -> ServiceResult<FontMetrics> {
        if text.is_empty() {
            return Ok(FontMetrics {
                width: 0,
                height: 0,
                ascent: 0,
                descent: 0,
            });
        }
        let ascent = (size * 0.8).round() as i32;
        let descent = size.round() as i32 - ascent;
        Ok(FontMetrics {
            width: Self::advance(size) * text.chars().count() as u32,
            height: (ascent + descent) as u32,
            ascent,
            descent,
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
        let m = self.measure(text, size, weight)?;
        let (w, h) = (canvas.width() as i32, canvas.height() as i32);
        for py in y..y + m.height as i32 {
            for px in x..x + m.width as i32 {
                if px >= 0 && py >= 0 && px < w && py < h {
                    canvas.put_pixel(px as u32, py as u32, image::Rgb([0, 0, 0]));
                }
            }
        }
        Ok(())
    }
}

/// Encoder that stamps dimensions instead of a device protocol
pub struct MemoryEncoder;

impl RasterEncoder for MemoryEncoder {
    fn encode(&self, image: &RgbImage, params: &RasterParams) -> PrintResult<Vec<u8>> {
        params.validate()?;
        Ok(format!("{}x{}:{}", image.width(), image.height(), params.label_size).into_bytes())
    }
}

/// Transport that records sends and answers probes from a fixed flag
pub struct MemoryTransport {
    pub sent: Arc<Mutex<Vec<Vec<u8>>>>,
    pub reachable: bool,
}

impl MemoryTransport {
    pub fn new(reachable: bool) -> (Arc<Self>, Arc<Mutex<Vec<Vec<u8>>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        (
            Arc::new(Self {
                sent: sent.clone(),
                reachable,
            }),
            sent,
        )
    }
}

#[async_trait]
impl DeviceTransport for MemoryTransport {
    async fn send(&self, data: &[u8]) -> PrintResult<()> {
        if !self.reachable {
            return Err(PrintError::Offline("memory transport".to_string()));
        }
        self.sent.lock().unwrap().push(data.to_vec());
        Ok(())
    }

    async fn probe(&self) -> bool {
        self.reachable
    }
}

/// Inclusive span of black pixels in one row, if any
pub fn row_black_span(img: &RgbImage, y: u32) -> Option<(u32, u32)> {
    let mut first = None;
    let mut last = None;
    for x in 0..img.width() {
        if img.get_pixel(x, y).0 == [0, 0, 0] {
            if first.is_none() {
                first = Some(x);
            }
            last = Some(x);
        }
    }
    Some((first?, last?))
}

/// Number of black pixels inside an x-range over the full image height
pub fn black_count_in_columns(img: &RgbImage, x0: u32, x1: u32) -> usize {
    let mut count = 0;
    for y in 0..img.height() {
        for x in x0..x1.min(img.width()) {
            if img.get_pixel(x, y).0 == [0, 0, 0] {
                count += 1;
            }
        }
    }
    count
}
