use std::io::Cursor;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageResult};

use crate::errors::ImageError;

/// JPEG quality used for every image sent for analysis.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Encodes an image as header-less base64 JPEG.
pub fn encode_jpeg_base64(image: &DynamicImage, quality: u8) -> ImageResult<String> {
    let rgb = image.to_rgb8();
    let mut buf = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)).encode_image(&rgb)?;
    Ok(STANDARD.encode(buf.into_inner()))
}

/// Decodes raw bytes in any supported format and re-encodes them as JPEG.
pub fn transcode_to_jpeg_base64(bytes: &[u8], quality: u8) -> ImageResult<String> {
    let image = image::load_from_memory(bytes)?;
    encode_jpeg_base64(&image, quality)
}

/// Reads an image file from disk for upload.
pub fn load_file(path: &Path, quality: u8) -> Result<String, ImageError> {
    let bytes = std::fs::read(path).map_err(|e| ImageError::Unreadable(path.to_path_buf(), e))?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "Read image file");
    Ok(transcode_to_jpeg_base64(&bytes, quality)?)
}

/// Trims the payload and drops an optional `data:image/...;base64,` prefix.
pub fn strip_data_url(image: &str) -> &str {
    let image = image.trim();
    match image.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, data)| data.trim()).unwrap_or_default(),
        None => image,
    }
}

/// Decodes header-less base64 into raw bytes.
pub fn decode_base64(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(data.trim())
}

#[cfg(test)]
pub(crate) fn sample_png() -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(8, 8, image::Rgb([34, 139, 34])));
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, image::ImageFormat::Png)
        .expect("png encoding");
    buf.into_inner()
}
