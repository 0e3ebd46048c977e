use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

/// Longest side, in pixels, of a frame sent for sign verification.
pub const CAPTURE_MAX_DIM: u32 = 1024;
const CAPTURE_JPEG_QUALITY: u8 = 85;

/// Still frame from the capture surface, sent to the model as inline data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl CapturedImage {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Reads a frame from disk. Decodable images larger than `max_dim` are
    /// downscaled and re-encoded as JPEG; anything else is sent as-is.
    pub fn from_path(path: &Path, max_dim: u32) -> Result<Self> {
        let raw = fs::read(path).with_context(|| format!("failed reading {}", path.display()))?;
        if raw.is_empty() {
            bail!("captured image {} is empty", path.display());
        }
        let mime = mime_for_path(path).unwrap_or("image/jpeg");
        Ok(Self::prepare(raw, mime, max_dim))
    }

    /// Accepts the `data:<mime>;base64,<payload>` form a browser canvas yields.
    /// A bare base64 string is treated as JPEG.
    pub fn from_data_url(data_url: &str) -> Result<Self> {
        let trimmed = data_url.trim();
        let (mime, payload) = match trimmed.strip_prefix("data:") {
            Some(rest) => {
                let Some((header, payload)) = rest.split_once(',') else {
                    bail!("data URL has no payload separator");
                };
                let Some(mime) = header.strip_suffix(";base64") else {
                    bail!("data URL is not base64 encoded");
                };
                let mime = if mime.trim().is_empty() {
                    "image/jpeg"
                } else {
                    mime.trim()
                };
                (mime.to_string(), payload)
            }
            None => ("image/jpeg".to_string(), trimmed),
        };
        let bytes = BASE64
            .decode(payload.trim().as_bytes())
            .context("captured image base64 decode failed")?;
        if bytes.is_empty() {
            bail!("captured image payload is empty");
        }
        Ok(Self::new(bytes, mime))
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    fn prepare(raw: Vec<u8>, mime: &str, max_dim: u32) -> Self {
        let dim = max_dim.max(128);
        if let Ok(decoded) = image::load_from_memory(&raw) {
            let (width, height) = decoded.dimensions();
            if width.max(height) > dim {
                let resized = decoded.resize(dim, dim, FilterType::Triangle).to_rgb8();
                let mut bytes = Vec::new();
                let mut encoder = JpegEncoder::new_with_quality(&mut bytes, CAPTURE_JPEG_QUALITY);
                if encoder
                    .encode_image(&DynamicImage::ImageRgb8(resized))
                    .is_ok()
                {
                    return Self::new(bytes, "image/jpeg");
                }
            }
        }
        Self::new(raw, mime)
    }
}

fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())?;
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "heic" | "heif" => Some("image/heic"),
        _ => None,
    }
}
