use image::imageops::{self, FilterType};
use image::RgbaImage;

/// Resizes `image` to exactly `width`×`height`, ignoring aspect ratio, the
/// way a canvas `drawImage(img, 0, 0, w, h)` stretches its source.
///
/// Returns a plain copy when the size already matches.
pub fn scale_to(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    imageops::resize(image, width, height, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_same_size_is_identity() {
        let img = RgbaImage::from_pixel(4, 3, Rgba([1, 2, 3, 255]));
        assert_eq!(scale_to(&img, 4, 3), img);
    }

    #[test]
    fn test_upscale_fills_target_dimensions() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([9, 9, 9, 255]));
        let scaled = scale_to(&img, 10, 6);
        assert_eq!(scaled.dimensions(), (10, 6));
        assert!(scaled.pixels().all(|p| p.0 == [9, 9, 9, 255]));
    }
}
