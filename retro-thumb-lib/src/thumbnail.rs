//! Thumbnail selection and rescaling.
//!
//! [`ThumbnailCreator::get_thumbnail`] walks a class's image type priority,
//! picks the first source that yields a valid image, then applies the
//! per-type corrections and fits the result to the requested size.

use std::cell::OnceCell;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use retro_thumb_core::{
    ImageProcessingFlags, ImageSize, ImageType, RomData, RomField, RomImage, Sbit, ScalingMethod,
    SizeRequest,
};

use crate::backend::ImageBackend;
use crate::cache::CacheManager;
use crate::error::CreateError;
use crate::network::{self, NetworkStatus};
use crate::settings::{BandwidthMode, Config, ImageTypePriority, ResizeUpPolicy};

/// Requests at or below this size prefer the internal icon.
const SMALL_SIZE_MAX: u32 = 48;

/// A selected and rescaled thumbnail.
#[derive(Debug, Clone)]
pub struct ThumbnailOutput<I> {
    pub image: I,
    /// Source image size, after aspect corrections but before fitting.
    pub full_size: ImageSize,
    /// Size of `image`.
    pub thumb_size: ImageSize,
    pub sbit: Sbit,
}

/// Fit `size` inside `target`, preserving its aspect ratio.
///
/// One dimension of the result always equals the target's. Returns a zero
/// size if `size` has a zero dimension.
pub fn rescale_aspect(size: ImageSize, target: ImageSize) -> ImageSize {
    if !size.is_valid() {
        return ImageSize::default();
    }
    let (w, h) = (i64::from(size.width), i64::from(size.height));
    let (tw, th) = (i64::from(target.width), i64::from(target.height));

    let rw = th * w / h;
    if rw <= tw {
        ImageSize::new(rw as u32, th as u32)
    } else {
        ImageSize::new(tw as u32, (tw * h / w) as u32)
    }
}

/// Selects and rescales a thumbnail for one opened file.
pub struct ThumbnailCreator<'a, B: ImageBackend> {
    backend: &'a B,
    config: &'a Config,
    cache: CacheManager,
    network: &'a dyn NetworkStatus,
    metered: OnceCell<bool>,
}

impl<'a, B: ImageBackend> ThumbnailCreator<'a, B> {
    pub fn new(
        backend: &'a B,
        config: &'a Config,
        cache: CacheManager,
        network: &'a dyn NetworkStatus,
    ) -> Self {
        Self {
            backend,
            config,
            cache,
            network,
            metered: OnceCell::new(),
        }
    }

    /// Produce a thumbnail no larger than `req`×`req`. Zero keeps the
    /// native size.
    pub fn get_thumbnail(
        &self,
        rom: &dyn RomData,
        req: u32,
    ) -> Result<ThumbnailOutput<B::Image>, CreateError> {
        let priority = match self.config.image_type_priority(rom.class_name()) {
            ImageTypePriority::Custom(list) | ImageTypePriority::Default(list) => list,
            ImageTypePriority::Disabled => {
                return Err(CreateError::ClassDisabled(rom.class_name().to_string()));
            }
        };

        let mut available = rom.supported_image_types();
        let mut selected = None;

        if self.config.downloads.use_int_icon_for_small_sizes
            && req > 0
            && req <= SMALL_SIZE_MAX
            && available.contains(ImageType::IntIcon)
        {
            available.remove(ImageType::IntIcon);
            selected = self
                .internal_image(rom, ImageType::IntIcon)
                .map(|found| (ImageType::IntIcon, found));
        }

        if selected.is_none() {
            for image_type in priority {
                if !available.contains(image_type) {
                    continue;
                }
                available.remove(image_type);
                let found = if image_type.is_internal() {
                    self.internal_image(rom, image_type)
                } else {
                    self.external_image(rom, image_type, req)
                };
                if let Some(found) = found {
                    selected = Some((image_type, found));
                    break;
                }
            }
        }

        let Some((image_type, (mut image, sbit))) = selected else {
            return Err(CreateError::NoImage);
        };
        log::debug!("thumbnail: {} using {image_type}", rom.class_name());

        let mut full_size = self.backend.size(&image);
        if !full_size.is_valid() {
            return Err(CreateError::source_file(format!(
                "{image_type} image has size {full_size}"
            )));
        }

        let flags = rom.image_processing_flags(image_type);
        let mut nearest = flags.contains(ImageProcessingFlags::RESCALE_NEAREST);

        if flags.contains(ImageProcessingFlags::RESCALE_RFT_DIMENSIONS_2) {
            let logical = rom
                .fields()
                .iter()
                .filter_map(RomField::as_dimensions)
                .nth(1)
                .filter(ImageSize::is_valid);
            if let Some(size) = logical {
                if let Some(scaled) = self.backend.rescale(&image, size, ScalingMethod::Bilinear) {
                    image = scaled;
                    full_size = size;
                    nearest = false;
                }
            }
        }

        if flags.contains(ImageProcessingFlags::RESCALE_ASPECT_8TO7) {
            let width = match full_size.width {
                256 => Some(292),
                512 => Some(584),
                _ => None,
            };
            if let Some(width) = width {
                let size = ImageSize::new(width, full_size.height);
                if let Some(scaled) = self.backend.rescale(&image, size, ScalingMethod::Bilinear) {
                    image = scaled;
                    full_size = size;
                    nearest = false;
                }
            }
        }

        if req > 0 && nearest {
            if let Some(scaled) = self.upscale_nearest(&image, req) {
                image = scaled;
            }
        }

        if req > 0 {
            let size = self.backend.size(&image);
            if size.width > req || size.height > req {
                // Extreme aspect ratios round one side down to zero.
                let fitted = rescale_aspect(size, ImageSize::new(req, req));
                let target = ImageSize::new(fitted.width.max(1), fitted.height.max(1));
                match self.backend.rescale(&image, target, ScalingMethod::Bilinear) {
                    Some(scaled) => image = scaled,
                    None => {
                        log::debug!("thumbnail: cannot rescale {size} to {target}");
                        return Err(CreateError::NoImage);
                    }
                }
            }
        }

        let thumb_size = self.backend.size(&image);
        Ok(ThumbnailOutput {
            image,
            full_size,
            thumb_size,
            sbit,
        })
    }

    /// Integer-multiple nearest-neighbor upscale for small pixel art.
    fn upscale_nearest(&self, image: &B::Image, req: u32) -> Option<B::Image> {
        let size = self.backend.size(image);
        let upscale = match self.config.thumbnails.resize_up {
            ResizeUpPolicy::None => false,
            ResizeUpPolicy::Half => size.width <= req / 2 || size.height <= req / 2,
            ResizeUpPolicy::All => size.width < req || size.height < req,
        };
        if !upscale {
            return None;
        }

        let int_size = ImageSize::new(req - req % size.width, req - req % size.height);
        if !int_size.is_valid() {
            return None;
        }
        let target = rescale_aspect(size, int_size);
        if !target.is_valid() {
            return None;
        }
        self.backend.rescale(image, target, ScalingMethod::Nearest)
    }

    fn internal_image(&self, rom: &dyn RomData, image_type: ImageType) -> Option<(B::Image, Sbit)> {
        let found = rom.image(image_type)?;
        if !found.is_valid() {
            return None;
        }
        let sbit = found.sbit;
        let image = self.backend.from_rom_image(found);
        self.backend.is_valid(&image).then_some((image, sbit))
    }

    fn bandwidth_mode(&self) -> BandwidthMode {
        let metered = *self.metered.get_or_init(|| self.network.is_metered());
        self.config.downloads.bandwidth_mode(metered)
    }

    fn external_image(
        &self,
        rom: &dyn RomData,
        image_type: ImageType,
        req: u32,
    ) -> Option<(B::Image, Sbit)> {
        let urls = rom.ext_urls(image_type, SizeRequest::from(req));
        if urls.is_empty() {
            return None;
        }

        let downloads_enabled = self.config.downloads.ext_image_download;
        for ext in &urls {
            let download = downloads_enabled && {
                let mode = self.bandwidth_mode();
                match mode {
                    BandwidthMode::None => false,
                    BandwidthMode::NormalRes => !ext.high_res,
                    BandwidthMode::HighRes => true,
                }
            };

            let mut cache = self.cache.clone();
            cache.set_proxy(network::proxy_for_url(&ext.url));
            let path = if download {
                cache.download(&ext.url, &ext.cache_key).unwrap_or_else(|e| {
                    log::debug!("thumbnail: {}: {e}", ext.cache_key);
                    None
                })
            } else {
                cache.find_in_cache(&ext.cache_key)
            };
            let Some(path) = path else {
                continue;
            };

            let decoded = match image::open(&path) {
                Ok(decoded) => RomImage::new(decoded.to_rgba8()).with_sbit(png_sbit(&path)),
                Err(e) => {
                    log::debug!("thumbnail: cannot decode {}: {e}", path.display());
                    continue;
                }
            };
            if !decoded.is_valid() {
                continue;
            }
            let sbit = decoded.sbit;
            let image = self.backend.from_rom_image(decoded);
            if self.backend.is_valid(&image) {
                return Some((image, sbit));
            }
        }
        None
    }
}

/// Significant bits recorded in a downloaded PNG, widened to the RGBA8
/// channels the image is decoded into. Empty for other formats.
fn png_sbit(path: &Path) -> Sbit {
    let Ok(file) = File::open(path) else {
        return Sbit::default();
    };
    let Ok(reader) = png::Decoder::new(BufReader::new(file)).read_info() else {
        return Sbit::default();
    };
    let bits = |b: u8| b.min(8);
    match reader.info().sbit.as_deref() {
        Some(&[gray]) => Sbit::new(bits(gray), bits(gray), bits(gray), 8),
        Some(&[gray, alpha]) => Sbit::new(bits(gray), bits(gray), bits(gray), bits(alpha)),
        Some(&[r, g, b]) => Sbit::new(bits(r), bits(g), bits(b), 8),
        Some(&[r, g, b, a]) => Sbit::new(bits(r), bits(g), bits(b), bits(a)),
        _ => Sbit::default(),
    }
}

#[cfg(test)]
#[path = "tests/thumbnail_tests.rs"]
mod tests;
