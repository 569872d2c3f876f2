//! JPEG data-URL codec.
//!
//! # Wire format
//!
//! ```text
//! data:image/jpeg;base64,/9j/4AAQSkZJRgABAQAAAQABAAD...
//! └─────┬──────┘└──┬──┘ └──────────────┬─────────────┘
//!   media type   encoding      standard base64 (RFC 4648)
//! ```
//!
//! Outbound frames are always `image/jpeg` at [`JPEG_QUALITY`].  Inbound
//! payloads may carry any `image/*` media type the `image` crate can decode;
//! the media type is informational only, the bytes are sniffed.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::{RgbImage, RgbaImage};
use thiserror::Error;
use tracing::trace;

/// Lossy quality used for outbound frames (percent).
pub const JPEG_QUALITY: u8 = 80;

const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// Errors produced while encoding or decoding a frame.
#[derive(Debug, Error)]
pub enum FrameCodecError {
    /// The payload is not a `data:image/...;base64,` URL.
    #[error("payload is not a base64 image data URL")]
    NotDataUrl,

    /// The frame has a zero dimension.
    #[error("frame is empty ({width}x{height})")]
    EmptyFrame { width: u32, height: u32 },

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),
}

/// Encodes `frame` as baseline JPEG bytes at `quality` percent.
///
/// # Errors
///
/// Returns [`FrameCodecError::EmptyFrame`] for zero-sized frames and
/// [`FrameCodecError::Image`] if the encoder fails.
pub fn encode_jpeg(frame: &RgbImage, quality: u8) -> Result<Vec<u8>, FrameCodecError> {
    if frame.width() == 0 || frame.height() == 0 {
        return Err(FrameCodecError::EmptyFrame {
            width: frame.width(),
            height: frame.height(),
        });
    }
    let mut bytes = Vec::with_capacity(frame.as_raw().len() / 8);
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
    encoder.encode_image(frame)?;
    Ok(bytes)
}

/// Encodes `frame` as a `data:image/jpeg;base64,...` string at
/// [`JPEG_QUALITY`].
///
/// # Errors
///
/// See [`encode_jpeg`].
pub fn encode_jpeg_data_url(frame: &RgbImage) -> Result<String, FrameCodecError> {
    let jpeg = encode_jpeg(frame, JPEG_QUALITY)?;
    let mut url = String::with_capacity(JPEG_DATA_URL_PREFIX.len() + jpeg.len() * 4 / 3 + 4);
    url.push_str(JPEG_DATA_URL_PREFIX);
    BASE64.encode_string(&jpeg, &mut url);
    Ok(url)
}

/// Decodes an image data URL into RGBA pixels.
///
/// # Errors
///
/// - [`FrameCodecError::NotDataUrl`] if the header is missing or not
///   `image/*;base64`.
/// - [`FrameCodecError::Base64`] for a malformed payload.
/// - [`FrameCodecError::Image`] if the bytes are not a decodable image.
pub fn decode_data_url(payload: &str) -> Result<RgbaImage, FrameCodecError> {
    let rest = payload
        .strip_prefix("data:")
        .ok_or(FrameCodecError::NotDataUrl)?;
    let (header, body) = rest.split_once(',').ok_or(FrameCodecError::NotDataUrl)?;
    let media_type = header
        .strip_suffix(";base64")
        .ok_or(FrameCodecError::NotDataUrl)?;
    if !media_type.starts_with("image/") {
        return Err(FrameCodecError::NotDataUrl);
    }

    let bytes = BASE64.decode(body.trim())?;
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?;
    let format = reader.format();
    let image = reader.decode()?;
    trace!(?format, width = image.width(), height = image.height(), "decoded frame");
    Ok(image.to_rgba8())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
