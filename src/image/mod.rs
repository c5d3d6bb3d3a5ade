//! Raster image re-encoding.
//!
//! PNG is re-encoded with the best compression and adaptive filtering, JPEG
//! at a configurable quality. The smaller of original and re-encoded wins.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, ImageFormat, ImageResult};
use std::path::Path;

/// Encoder choice for a file, by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Png,
    Jpeg { quality: u8 },
}

impl Encoding {
    /// Encoding for `path`, or `None` for formats copied verbatim.
    pub fn for_path(path: &Path, jpeg_quality: u8) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg {
                quality: jpeg_quality,
            }),
            _ => None,
        }
    }

    /// Cache key tag for these settings.
    pub fn tag(self) -> String {
        match self {
            Self::Png => "png-best-adaptive".into(),
            Self::Jpeg { quality } => format!("jpeg-q{quality}"),
        }
    }
}

/// Re-encode `bytes`, returning whichever of original and result is smaller.
pub fn optimize(bytes: &[u8], encoding: Encoding) -> ImageResult<Vec<u8>> {
    let encoded = match encoding {
        Encoding::Png => encode_png(bytes)?,
        Encoding::Jpeg { quality } => encode_jpeg(bytes, quality)?,
    };
    Ok(if encoded.len() < bytes.len() {
        encoded
    } else {
        bytes.to_vec()
    })
}

fn encode_png(bytes: &[u8]) -> ImageResult<Vec<u8>> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Png)?;
    let mut out = Vec::with_capacity(bytes.len());
    PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive)
        .write_image(img.as_bytes(), img.width(), img.height(), img.color().into())?;
    Ok(out)
}

fn encode_jpeg(bytes: &[u8], quality: u8) -> ImageResult<Vec<u8>> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)?.to_rgb8();
    let mut out = Vec::with_capacity(bytes.len());
    JpegEncoder::new_with_quality(&mut out, quality).write_image(
        img.as_raw(),
        img.width(),
        img.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(out)
}
