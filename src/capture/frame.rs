use std::{io::Cursor, sync::Arc};

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use image::codecs::jpeg::JpegEncoder;

pub const DEFAULT_JPEG_QUALITY: u8 = 70;
pub const JPEG_MIME: &str = "image/jpeg";

/// One still image, normalized to JPEG.
///
/// The encoded bytes sit behind an `Arc` so a frame can be handed to the
/// classifier and kept for logging without copying the buffer.
#[derive(Debug, Clone)]
pub struct Frame {
    jpeg: Arc<Vec<u8>>,
    width: u32,
    height: u32,
    captured_at: DateTime<Utc>,
}

impl Frame {
    /// Decodes any format `image` understands and re-encodes it as JPEG.
    /// CPU bound; call from a blocking worker.
    pub fn from_image_bytes(bytes: &[u8], quality: u8) -> Result<Self> {
        let decoded = image::load_from_memory(bytes).context("frame is not a decodable image")?;
        let rgb = decoded.to_rgb8();
        let (width, height) = rgb.dimensions();

        let mut jpeg = Vec::with_capacity(bytes.len());
        rgb.write_with_encoder(JpegEncoder::new_with_quality(
            &mut Cursor::new(&mut jpeg),
            quality.clamp(1, 100),
        ))
        .context("jpeg encoding failed")?;

        Ok(Self {
            jpeg: Arc::new(jpeg),
            width,
            height,
            captured_at: Utc::now(),
        })
    }

    /// Accepts `data:image/...;base64,<payload>` strings as produced by
    /// browser and mobile camera APIs.
    pub fn from_data_url(url: &str, quality: u8) -> Result<Self> {
        let payload = url
            .split_once(',')
            .map(|(_, payload)| payload.trim())
            .filter(|payload| !payload.is_empty())
            .ok_or_else(|| anyhow!("data url carries no base64 payload"))?;
        let bytes = STANDARD
            .decode(payload)
            .context("data url payload is not valid base64")?;
        Self::from_image_bytes(&bytes, quality)
    }

    pub fn jpeg_bytes(&self) -> &[u8] {
        &self.jpeg
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.jpeg.as_slice())
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{JPEG_MIME};base64,{}", self.to_base64())
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}

#[cfg(test)]
pub(crate) fn test_png(width: u32, height: u32) -> Vec<u8> {
    use image::{DynamicImage, ImageFormat, RgbImage};

    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 16) as u8, (y * 16) as u8, 128])
    });
    let mut out = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .unwrap();
    out
}
