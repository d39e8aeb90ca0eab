use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{Rgb, RgbImage};

use crate::detector::Detection;
use crate::error::ServiceError;

/// Uploads whose longer side exceeds this are downsampled before detection.
pub const MAX_DIMENSION: u32 = 800;
pub const JPEG_QUALITY: u8 = 85;

const BOX_THICKNESS: u32 = 2;
const PALETTE: [Rgb<u8>; 6] = [
    Rgb([255, 56, 56]),
    Rgb([255, 157, 151]),
    Rgb([255, 112, 31]),
    Rgb([61, 219, 134]),
    Rgb([26, 147, 52]),
    Rgb([0, 212, 187]),
];

pub fn decode(bytes: &[u8]) -> Result<RgbImage, ServiceError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| ServiceError::InvalidImage(e.to_string()))?;
    Ok(img.to_rgb8())
}

/// Scales the image down so its longer side fits `bound`, preserving aspect
/// ratio. Images already within the bound pass through untouched.
pub fn shrink_to_bound(img: RgbImage, bound: u32) -> RgbImage {
    let (width, height) = img.dimensions();
    let longest = width.max(height);
    if longest <= bound {
        return img;
    }
    let scale = bound as f32 / longest as f32;
    let new_width = ((width as f32 * scale) as u32).max(1);
    let new_height = ((height as f32 * scale) as u32).max(1);
    image::imageops::resize(&img, new_width, new_height, FilterType::Triangle)
}

/// Overlays each detection as a hollow rectangle, colored by class.
pub fn draw_detections(img: &mut RgbImage, detections: &[Detection]) {
    for det in detections {
        let color = PALETTE[det.class_id % PALETTE.len()];
        draw_rect(
            img,
            det.x1 as u32,
            det.y1 as u32,
            det.x2 as u32,
            det.y2 as u32,
            color,
        );
    }
}

fn draw_rect(img: &mut RgbImage, x1: u32, y1: u32, x2: u32, y2: u32, color: Rgb<u8>) {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return;
    }
    let x1 = x1.min(width - 1);
    let y1 = y1.min(height - 1);
    let x2 = x2.min(width - 1).max(x1);
    let y2 = y2.min(height - 1).max(y1);

    for t in 0..BOX_THICKNESS {
        let top = (y1 + t).min(height - 1);
        let bottom = y2.saturating_sub(t);
        for x in x1..=x2 {
            img.put_pixel(x, top, color);
            img.put_pixel(x, bottom, color);
        }
        let left = (x1 + t).min(width - 1);
        let right = x2.saturating_sub(t);
        for y in y1..=y2 {
            img.put_pixel(left, y, color);
            img.put_pixel(right, y, color);
        }
    }
}

pub fn encode_jpeg(img: &RgbImage, quality: u8) -> Result<Vec<u8>, ServiceError> {
    let mut buf = Vec::new();
    img.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))?;
    Ok(buf)
}
