//! Pure image transforms: decode, crop/resize per [`DeriveMode`], JPEG encode.

use image::{
    DynamicImage, ExtendedColorType, GenericImageView, ImageError,
    ImageReader,
    codecs::jpeg::JpegEncoder,
    error::{LimitError, LimitErrorKind},
    imageops::FilterType,
};
use moviedb_model::{
    DeriveMode, ImageDirectives, RegionAnchor, image::MAX_DIMENSION,
};
use std::io::Cursor;
use tracing::warn;

use crate::error::{CatalogError, Result};

/// Front/back cover canvas.
pub const REGION_WIDTH: u32 = 400;
pub const REGION_HEIGHT: u32 = 568;
/// Spine strip canvas; shares the cover height.
pub const SPINE_WIDTH: u32 = 41;

/// Largest image the deriver allocates, including the scaled intermediate of
/// a cover crop.
pub const MAX_OUTPUT_PIXELS: u64 =
    MAX_DIMENSION as u64 * MAX_DIMENSION as u64;

/// Quality for covers, thumbnails and portraits.
pub const DEFAULT_QUALITY: u8 = 100;

/// Encoded image ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedImage {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

impl DerivedImage {
    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            content_type: "image/jpeg",
        }
    }

    /// Wrap bytes read from disk, typing them by their magic bytes.
    pub fn sniffed(bytes: Vec<u8>) -> Self {
        let content_type =
            sniff_content_type(&bytes).unwrap_or("application/octet-stream");
        Self {
            bytes,
            content_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gravity {
    TopLeft,
    TopRight,
    Centre,
}

impl From<RegionAnchor> for Gravity {
    fn from(anchor: RegionAnchor) -> Self {
        match anchor {
            RegionAnchor::TopLeft => Gravity::TopLeft,
            RegionAnchor::TopRight => Gravity::TopRight,
        }
    }
}

/// Decode bytes of any supported format; the file extension is not trusted.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    let image = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()?;
    if image.width() == 0 || image.height() == 0 {
        return Err(CatalogError::Internal("image has no pixels".into()));
    }
    Ok(image)
}

/// Decode, transform and re-encode as JPEG.
pub fn derive(
    bytes: &[u8],
    directives: ImageDirectives,
    quality: u8,
) -> Result<DerivedImage> {
    let image = decode(bytes)?;
    let image = apply(&image, directives.mode())?;
    Ok(DerivedImage::jpeg(encode_jpeg(&image, quality)?))
}

pub fn apply(image: &DynamicImage, mode: DeriveMode) -> Result<DynamicImage> {
    match mode {
        DeriveMode::Region(anchor) => {
            cover(image, REGION_WIDTH, REGION_HEIGHT, anchor.into())
        }
        DeriveMode::Spine => {
            cover(image, SPINE_WIDTH, REGION_HEIGHT, Gravity::Centre)
        }
        DeriveMode::Resize {
            width: Some(width),
            height: Some(height),
        } => cover(image, width, height, Gravity::Centre),
        DeriveMode::Resize {
            width: Some(width),
            height: None,
        } => {
            let height = scale_edge(image.height(), width, image.width());
            resize(image, u64::from(width), height)
        }
        DeriveMode::Resize {
            width: None,
            height: Some(height),
        } => {
            let width = scale_edge(image.width(), height, image.height());
            resize(image, width, u64::from(height))
        }
        DeriveMode::Resize {
            width: None,
            height: None,
        } => Ok(image.clone()),
    }
}

/// Scale to fill `width`×`height` keeping the aspect ratio, then cut the
/// overflow according to `gravity`.
fn cover(
    image: &DynamicImage,
    width: u32,
    height: u32,
    gravity: Gravity,
) -> Result<DynamicImage> {
    let (src_w, src_h) = image.dimensions();
    let scale =
        f64::max(width as f64 / src_w as f64, height as f64 / src_h as f64);
    let scaled_w = ((src_w as f64 * scale).round() as u64).max(width.into());
    let scaled_h = ((src_h as f64 * scale).round() as u64).max(height.into());

    let scaled = resize(image, scaled_w, scaled_h)?;
    let (scaled_w, scaled_h) = scaled.dimensions();

    let (x, y) = match gravity {
        Gravity::TopLeft => (0, 0),
        Gravity::TopRight => (scaled_w - width, 0),
        Gravity::Centre => ((scaled_w - width) / 2, (scaled_h - height) / 2),
    };

    Ok(scaled.crop_imm(x, y, width, height))
}

/// Resize after checking the target against [`MAX_OUTPUT_PIXELS`]. Very
/// narrow sources can otherwise ask for buffers far beyond available memory.
fn resize(
    image: &DynamicImage,
    width: u64,
    height: u64,
) -> Result<DynamicImage> {
    let fits = width.saturating_mul(height) <= MAX_OUTPUT_PIXELS;
    match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) if fits => {
            Ok(image.resize_exact(w, h, FilterType::Lanczos3))
        }
        _ => {
            warn!(
                "Refusing to scale {:?} to {}x{}",
                image.dimensions(),
                width,
                height
            );
            Err(ImageError::Limits(LimitError::from_kind(
                LimitErrorKind::DimensionError,
            ))
            .into())
        }
    }
}

/// Edge length that keeps the aspect ratio when `other` is scaled to
/// `target`. Never zero; saturates instead of wrapping.
fn scale_edge(edge: u32, target: u32, other: u32) -> u64 {
    ((edge as f64 * target as f64 / other as f64).round() as u64).max(1)
}

pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let rgb = image.to_rgb8();
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
    encoder.encode(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(out)
}

/// Content type from magic bytes.
pub fn sniff_content_type(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }
    if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    if data.starts_with(b"GIF8") {
        return Some("image/gif");
    }

    warn!(
        "Unrecognized image format, first bytes: {:02X?}",
        &data[..8.min(data.len())]
    );
    None
}
