//! Image derivative encoder.
//!
//! Turns one uploaded image into the fixed size x format matrix stored for
//! every template: `orig`, `sm` (80px), `md` (320px) and `lg` (640px), each
//! as JPEG and WebP. The transform is pure and deterministic: the same
//! source bytes always yield the same dimensions and bytes.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;

use crate::error::CoreError;
use crate::images::{ImageSize, OutputFormat};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// JPEG quality for the re-encoded original.
pub const ORIG_JPEG_QUALITY: u8 = 90;

/// WebP quality for the re-encoded original.
pub const ORIG_WEBP_QUALITY: u8 = 85;

/// JPEG quality for resized variants.
pub const RESIZED_JPEG_QUALITY: u8 = 82;

/// WebP quality for resized variants.
pub const RESIZED_WEBP_QUALITY: u8 = 78;

/// Largest width or height of any derivative. WebP cannot encode beyond it.
pub const MAX_DERIVATIVE_DIMENSION: u32 = 16_383;

/// Largest pixel count of any derivative.
pub const MAX_DERIVATIVE_PIXELS: u64 = 50_000_000;

/// Resampling filter for resized variants.
const RESIZE_FILTER: FilterType = FilterType::Lanczos3;

/// Quality setting for a given derivative.
pub fn quality_for(size: ImageSize, format: OutputFormat) -> u8 {
    match (size, format) {
        (ImageSize::Orig, OutputFormat::Jpg) => ORIG_JPEG_QUALITY,
        (ImageSize::Orig, OutputFormat::Webp) => ORIG_WEBP_QUALITY,
        (_, OutputFormat::Jpg) => RESIZED_JPEG_QUALITY,
        (_, OutputFormat::Webp) => RESIZED_WEBP_QUALITY,
    }
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One encoded derivative.
#[derive(Debug, Clone)]
pub struct Derivative {
    pub size: ImageSize,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    pub quality: u8,
    pub bytes: Vec<u8>,
}

/// The complete derivative matrix for one source image.
#[derive(Debug, Clone)]
pub struct DerivativeSet {
    derivatives: Vec<Derivative>,
}

impl DerivativeSet {
    pub fn get(&self, size: ImageSize, format: OutputFormat) -> Option<&Derivative> {
        self.derivatives
            .iter()
            .find(|d| d.size == size && d.format == format)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Derivative> {
        self.derivatives.iter()
    }

    pub fn into_vec(self) -> Vec<Derivative> {
        self.derivatives
    }
}

// ---------------------------------------------------------------------------
// Format sniffing
// ---------------------------------------------------------------------------

/// Identify an image payload from its leading bytes.
///
/// Used at the upload boundary to reject non-image files before any side
/// effect. A payload that sniffs as an image can still fail in
/// [`encode_derivatives`] if it is truncated or corrupt.
pub fn sniff_image_format(bytes: &[u8]) -> Result<image::ImageFormat, CoreError> {
    image::guess_format(bytes)
        .map_err(|_| CoreError::Validation("only image files are allowed".into()))
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Decode `source` and produce all eight derivatives.
///
/// Returns [`CoreError::Encoding`] if the bytes cannot be decoded or any
/// variant fails to encode. CPU-bound; async callers should run it on a
/// blocking thread.
pub fn encode_derivatives(source: &[u8]) -> Result<DerivativeSet, CoreError> {
    let decoded = image::load_from_memory(source)
        .map_err(|e| CoreError::Encoding(format!("source is not a decodable image: {e}")))?;

    let mut derivatives = Vec::with_capacity(ImageSize::ALL.len() * OutputFormat::ALL.len());
    for size in ImageSize::ALL {
        let variant = match size.target_width() {
            None => {
                check_dimensions(size, decoded.width(), decoded.height())?;
                decoded.clone()
            }
            Some(width) => {
                let height = scaled_height(decoded.width(), decoded.height(), width);
                check_dimensions(size, width, height)?;
                decoded.resize_exact(width, height, RESIZE_FILTER)
            }
        };

        for format in OutputFormat::ALL {
            let quality = quality_for(size, format);
            let bytes = match format {
                OutputFormat::Jpg => encode_jpeg(&variant, quality)?,
                OutputFormat::Webp => encode_webp(&variant, quality)?,
            };
            derivatives.push(Derivative {
                size,
                format,
                width: variant.width(),
                height: variant.height(),
                quality,
                bytes,
            });
        }
    }

    Ok(DerivativeSet { derivatives })
}

/// Reject a derivative whose buffer would exceed the encoder bounds, before
/// anything is allocated for it.
fn check_dimensions(size: ImageSize, width: u32, height: u32) -> Result<(), CoreError> {
    let pixels = u64::from(width) * u64::from(height);
    if width > MAX_DERIVATIVE_DIMENSION
        || height > MAX_DERIVATIVE_DIMENSION
        || pixels > MAX_DERIVATIVE_PIXELS
    {
        return Err(CoreError::Encoding(format!(
            "{} derivative would be {width}x{height}, above the {MAX_DERIVATIVE_DIMENSION}px / \
             {MAX_DERIVATIVE_PIXELS} pixel limit",
            size.key()
        )));
    }
    Ok(())
}

/// Height that preserves the source aspect ratio at `target_width`.
pub fn scaled_height(source_width: u32, source_height: u32, target_width: u32) -> u32 {
    if source_width == 0 {
        return 1;
    }
    let scaled =
        (u64::from(source_height) * u64::from(target_width) + u64::from(source_width) / 2)
            / u64::from(source_width);
    scaled.clamp(1, u64::from(u32::MAX)) as u32
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, CoreError> {
    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Cursor::new(Vec::new());
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))
        .map_err(|e| CoreError::Encoding(format!("JPEG encoding failed: {e}")))?;
    Ok(buf.into_inner())
}

fn encode_webp(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, CoreError> {
    let (width, height) = (img.width(), img.height());
    let encoded = if img.color().has_alpha() {
        webp::Encoder::from_rgba(img.to_rgba8().as_raw(), width, height)
            .encode_simple(false, f32::from(quality))
            .map(|memory| memory.to_vec())
    } else {
        webp::Encoder::from_rgb(img.to_rgb8().as_raw(), width, height)
            .encode_simple(false, f32::from(quality))
            .map(|memory| memory.to_vec())
    };
    encoded.map_err(|e| CoreError::Encoding(format!("WebP encoding failed: {e:?}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
