// Loading of logos, footer artwork and avatars.
//
// Failures here never abort an export: they are logged and the image is
// simply left out.

use ::image::{DynamicImage, Rgb, RgbImage, Rgba};
use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::thread;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::BrandAssets;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Failed to fetch URL: {0}")]
    Fetch(String),
    #[error("Failed to read {0}")]
    Read(String),
    #[error("Failed to decode image: {0}")]
    Decode(String),
}

// ============================================================================
// Image Loading
// ============================================================================

/// Load an image from an `http(s)://` URL, a `file://` URI or a local path.
pub fn load_image(source: &str) -> Result<DynamicImage, AssetError> {
    let image_bytes = if source.starts_with("http://") || source.starts_with("https://") {
        let response = ureq::get(source)
            .call()
            .map_err(|e| AssetError::Fetch(format!("{}: {}", source, e)))?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| AssetError::Fetch(format!("{}: {}", source, e)))?;
        bytes
    } else {
        let path = source.strip_prefix("file://").unwrap_or(source);
        std::fs::read(path).map_err(|e| AssetError::Read(format!("{}: {}", path, e)))?
    };

    ::image::load_from_memory(&image_bytes).map_err(|e| AssetError::Decode(e.to_string()))
}

/// Like [`load_image`], but a failure only produces a warning.
pub fn load_optional(source: Option<&str>, what: &str) -> Option<DynamicImage> {
    let source = source?;
    match load_image(source) {
        Ok(img) => {
            debug!(asset = what, source, "image loaded");
            Some(img)
        }
        Err(e) => {
            warn!(asset = what, source, error = %e, "image unavailable, continuing without it");
            None
        }
    }
}

// ============================================================================
// Image Preparation
// ============================================================================

fn blend_on_white(pixel: Rgba<u8>) -> Rgb<u8> {
    let Rgba([r, g, b, a]) = pixel;
    let alpha = a as f32 / 255.0;
    let bg = 255.0;
    let mix = |c: u8| (c as f32 * alpha + bg * (1.0 - alpha)) as u8;
    Rgb([mix(r), mix(g), mix(b)])
}

/// Flatten transparency against a white page.
pub fn flatten_on_white(img: &DynamicImage) -> RgbImage {
    let rgba_image = img.to_rgba8();
    let (width, height) = rgba_image.dimensions();
    let mut rgb_image = RgbImage::new(width, height);
    for (x, y, pixel) in rgba_image.enumerate_pixels() {
        rgb_image.put_pixel(x, y, blend_on_white(*pixel));
    }
    rgb_image
}

/// Center-crop to a square and whiten everything outside the inscribed
/// circle.
pub fn circular_crop(img: &DynamicImage) -> RgbImage {
    let side = img.width().min(img.height());
    let left = (img.width() - side) / 2;
    let top = (img.height() - side) / 2;
    let square = img.crop_imm(left, top, side, side).to_rgba8();

    let radius = side as f32 / 2.0;
    let mut out = RgbImage::new(side, side);
    for (x, y, pixel) in square.enumerate_pixels() {
        let dx = x as f32 + 0.5 - radius;
        let dy = y as f32 + 0.5 - radius;
        let inside = dx * dx + dy * dy <= radius * radius;
        let color = if inside {
            blend_on_white(*pixel)
        } else {
            Rgb([255, 255, 255])
        };
        out.put_pixel(x, y, color);
    }
    out
}

// ============================================================================
// Brand Image Cache
// ============================================================================

/// Header logos (left to right) and footer artwork, ready to embed.
#[derive(Debug, Default)]
pub struct BrandImages {
    pub logos: Vec<Option<RgbImage>>,
    pub footer: Option<RgbImage>,
}

/// Brand images loaded at most once and shared by every export made through
/// this cache.
#[derive(Debug, Default)]
pub struct AssetCache {
    sources: BrandAssets,
    brand: OnceLock<BrandImages>,
    loads: AtomicUsize,
}

impl AssetCache {
    pub fn new(sources: BrandAssets) -> Self {
        AssetCache {
            sources,
            brand: OnceLock::new(),
            loads: AtomicUsize::new(0),
        }
    }

    /// How many times the brand images were actually loaded.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    pub fn is_loaded(&self) -> bool {
        self.brand.get().is_some()
    }

    /// The brand images, loading them concurrently on first use.
    pub fn brand(&self) -> &BrandImages {
        self.brand.get_or_init(|| {
            self.loads.fetch_add(1, Ordering::Relaxed);
            load_brand_images(&self.sources)
        })
    }

    /// Brand images plus a circular avatar, fetched side by side.
    pub fn load_with_avatar(&self, avatar: Option<&str>) -> (&BrandImages, Option<RgbImage>) {
        thread::scope(|scope| {
            let avatar_task = scope.spawn(move || {
                load_optional(avatar, "avatar").map(|img| circular_crop(&img))
            });
            let brand = self.brand();
            let avatar = avatar_task.join().unwrap_or_else(|_| {
                warn!("avatar loader panicked, continuing without it");
                None
            });
            (brand, avatar)
        })
    }
}

fn load_brand_images(sources: &BrandAssets) -> BrandImages {
    thread::scope(|scope| {
        let logo_tasks: Vec<_> = sources
            .logos
            .iter()
            .map(|src| scope.spawn(move || load_optional(Some(src.as_str()), "logo")))
            .collect();
        let footer_task =
            scope.spawn(|| load_optional(sources.footer.as_deref(), "footer"));

        let logos = logo_tasks
            .into_iter()
            .map(|task| task.join().ok().flatten().map(|img| flatten_on_white(&img)))
            .collect();
        let footer = footer_task
            .join()
            .ok()
            .flatten()
            .map(|img| flatten_on_white(&img));

        BrandImages { logos, footer }
    })
}
