//! Image to tensor conversion for YOLO-family exports.

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};

/// Geometry of a letterboxed input, used to map boxes back to the source image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    /// Resize factor applied to the source image.
    pub scale: f32,
    /// Horizontal padding on the left edge.
    pub pad_x: f32,
    /// Vertical padding on the top edge.
    pub pad_y: f32,
}

impl Letterbox {
    /// Map a letterboxed x coordinate back to source pixels.
    pub fn unmap_x(&self, x: f32) -> f32 {
        (x - self.pad_x) / self.scale
    }

    /// Map a letterboxed y coordinate back to source pixels.
    pub fn unmap_y(&self, y: f32) -> f32 {
        (y - self.pad_y) / self.scale
    }
}

/// Resize keeping aspect ratio, pad to a `size` square, return CHW data in `[0, 1]`.
pub fn letterbox(image: &DynamicImage, size: u32, pad: u8) -> (Vec<f32>, Letterbox) {
    let rgb = image.to_rgb8();
    let (w, h) = rgb.dimensions();

    #[allow(clippy::cast_precision_loss)]
    let scale = (size as f32 / w.max(1) as f32).min(size as f32 / h.max(1) as f32);
    let new_w = scaled_dim(w, scale).min(size);
    let new_h = scaled_dim(h, scale).min(size);

    let resized = imageops::resize(&rgb, new_w, new_h, FilterType::Triangle);
    let mut canvas = RgbImage::from_pixel(size, size, Rgb([pad, pad, pad]));
    let left = (size - new_w) / 2;
    let top = (size - new_h) / 2;
    imageops::overlay(&mut canvas, &resized, i64::from(left), i64::from(top));

    #[allow(clippy::cast_precision_loss)]
    let geometry = Letterbox {
        scale,
        pad_x: left as f32,
        pad_y: top as f32,
    };
    (to_chw(&canvas), geometry)
}

/// Resize the shortest side to `size`, centre crop to a square, return CHW data in `[0, 1]`.
pub fn center_crop(image: &DynamicImage, size: u32) -> Vec<f32> {
    let rgb = image.to_rgb8();
    let (w, h) = rgb.dimensions();

    #[allow(clippy::cast_precision_loss)]
    let scale = size as f32 / w.min(h).max(1) as f32;
    let new_w = scaled_dim(w, scale).max(size);
    let new_h = scaled_dim(h, scale).max(size);

    let resized = imageops::resize(&rgb, new_w, new_h, FilterType::Triangle);
    let left = (new_w - size) / 2;
    let top = (new_h - size) / 2;
    let cropped = imageops::crop_imm(&resized, left, top, size, size).to_image();
    to_chw(&cropped)
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn scaled_dim(dim: u32, scale: f32) -> u32 {
    ((dim as f32 * scale).round() as u32).max(1)
}

/// Planar RGB, scaled to `[0, 1]`.
fn to_chw(image: &RgbImage) -> Vec<f32> {
    let (w, h) = image.dimensions();
    let plane = (w * h) as usize;
    let mut data = vec![0.0_f32; plane * 3];

    for (i, pixel) in image.pixels().enumerate() {
        for (c, value) in pixel.0.iter().enumerate() {
            data[c * plane + i] = f32::from(*value) / 255.0;
        }
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letterbox_wide_image_pads_vertically() {
        let image = DynamicImage::new_rgb8(200, 100);
        let (data, geometry) = letterbox(&image, 64, 114);

        assert_eq!(data.len(), 3 * 64 * 64);
        assert!((geometry.scale - 0.32).abs() < 1e-6);
        assert!(geometry.pad_x.abs() < f32::EPSILON);
        assert!((geometry.pad_y - 16.0).abs() < f32::EPSILON);

        // Top-left pixel is padding
        assert!((data[0] - 114.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_letterbox_unmap_round_trip() {
        let geometry = Letterbox {
            scale: 0.5,
            pad_x: 0.0,
            pad_y: 10.0,
        };
        assert!((geometry.unmap_x(50.0) - 100.0).abs() < 1e-6);
        assert!((geometry.unmap_y(60.0) - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_center_crop_output_is_square() {
        let image = DynamicImage::new_rgb8(300, 150);
        let data = center_crop(&image, 32);
        assert_eq!(data.len(), 3 * 32 * 32);
    }

    #[test]
    fn test_to_chw_channel_planes() {
        let mut image = RgbImage::new(2, 1);
        image.put_pixel(0, 0, Rgb([255, 0, 0]));
        image.put_pixel(1, 0, Rgb([0, 255, 0]));
        let data = to_chw(&image);
        assert_eq!(data, vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    }
}
