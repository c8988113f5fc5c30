//! Image backends used by the thumbnail selector.
//!
//! The selector never touches pixels directly. It converts decoded ROM
//! images into the backend's own type, asks for sizes, and asks for
//! rescaled copies. [`RgbaBackend`] is the backend built on the `image`
//! crate; other hosts can supply their own.

use image::imageops::{self, FilterType};

use retro_thumb_core::{ImageSize, RomImage, ScalingMethod};

/// Pixel operations the thumbnail selector needs.
pub trait ImageBackend: Send + Sync {
    type Image: Send;

    fn from_rom_image(&self, image: RomImage) -> Self::Image;

    /// Convert back for PNG encoding.
    fn into_rom_image(&self, image: Self::Image) -> RomImage;

    fn is_valid(&self, image: &Self::Image) -> bool;

    fn size(&self, image: &Self::Image) -> ImageSize;

    /// A copy scaled to exactly `size`. `None` if the backend cannot do it.
    fn rescale(
        &self,
        image: &Self::Image,
        size: ImageSize,
        method: ScalingMethod,
    ) -> Option<Self::Image>;
}

/// Backend over 8-bit RGBA buffers.
#[derive(Debug, Default, Clone, Copy)]
pub struct RgbaBackend;

impl ImageBackend for RgbaBackend {
    type Image = RomImage;

    fn from_rom_image(&self, image: RomImage) -> RomImage {
        image
    }

    fn into_rom_image(&self, image: RomImage) -> RomImage {
        image
    }

    fn is_valid(&self, image: &RomImage) -> bool {
        image.is_valid()
    }

    fn size(&self, image: &RomImage) -> ImageSize {
        image.size()
    }

    fn rescale(&self, image: &RomImage, size: ImageSize, method: ScalingMethod) -> Option<RomImage> {
        if !size.is_valid() || !image.is_valid() {
            return None;
        }
        let filter = match method {
            ScalingMethod::Nearest => FilterType::Nearest,
            ScalingMethod::Bilinear => FilterType::Triangle,
        };
        let pixels = imageops::resize(&image.pixels, size.width, size.height, filter);
        Some(RomImage::new(pixels).with_sbit(image.sbit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use retro_thumb_core::Sbit;

    fn checkerboard() -> RomImage {
        let pixels = RgbaImage::from_fn(2, 2, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        });
        RomImage::new(pixels).with_sbit(Sbit::new(5, 5, 5, 1))
    }

    #[test]
    fn nearest_keeps_hard_edges() {
        let scaled = RgbaBackend
            .rescale(&checkerboard(), ImageSize::new(8, 8), ScalingMethod::Nearest)
            .unwrap();
        assert_eq!(scaled.size(), ImageSize::new(8, 8));
        assert_eq!(scaled.pixels.get_pixel(3, 3), &Rgba([255, 255, 255, 255]));
        assert_eq!(scaled.pixels.get_pixel(4, 3), &Rgba([0, 0, 0, 255]));
        assert_eq!(scaled.sbit, Sbit::new(5, 5, 5, 1));
    }

    #[test]
    fn bilinear_changes_size() {
        let scaled = RgbaBackend
            .rescale(&checkerboard(), ImageSize::new(3, 5), ScalingMethod::Bilinear)
            .unwrap();
        assert_eq!(scaled.size(), ImageSize::new(3, 5));
    }

    #[test]
    fn zero_size_is_refused() {
        assert!(
            RgbaBackend
                .rescale(&checkerboard(), ImageSize::new(0, 4), ScalingMethod::Nearest)
                .is_none()
        );
    }
}
