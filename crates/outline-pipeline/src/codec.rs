//! Image codec adapter: bytes in, pixel grids out, and back again.
//!
//! Decoding accepts whatever the `image` crate can auto-detect (PNG,
//! JPEG, BMP, WebP, GIF) and always yields a 3-channel RGB grid.
//! Encoding always produces PNG, which is lossless, so a grid survives
//! `encode_png` -> `decode` with identical sample values.
//!
//! [`to_data_uri`] wraps PNG bytes in a `data:` URI that a browser can
//! use directly as an `<img src>`.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{ImageBuffer, ImageEncoder, PixelWithColorType, RgbImage};
use serde::{Deserialize, Serialize};

use crate::types::ProcessingResult;

/// Prefix of every transport string produced by [`to_data_uri`].
pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Errors from decoding uploaded bytes or encoding output grids.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The input buffer was empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The bytes are not a recognizable or intact image.
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// PNG serialization of an output grid failed.
    #[error("PNG encoding failed: {0}")]
    Encode(#[source] image::ImageError),
}

impl CodecError {
    /// Returns `true` for failures caused by the input bytes.
    #[must_use]
    pub const fn is_decode(&self) -> bool {
        matches!(self, Self::EmptyInput | Self::Decode(_))
    }
}

/// Decode raw image bytes into an RGB grid.
///
/// The format is detected from the content, not from a file name.
/// Alpha is discarded and grayscale or palette images are expanded to
/// three channels.
///
/// # Errors
///
/// Returns [`CodecError::EmptyInput`] if `bytes` is empty.
/// Returns [`CodecError::Decode`] if the format is unrecognized or the
/// data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<RgbImage, CodecError> {
    if bytes.is_empty() {
        return Err(CodecError::EmptyInput);
    }

    let img = image::load_from_memory(bytes).map_err(CodecError::Decode)?;
    Ok(img.to_rgb8())
}

/// Encode an 8-bit grid as PNG.
///
/// Works for any pixel type with a PNG color type: `GrayImage` becomes a
/// grayscale PNG, `RgbImage` an RGB PNG.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if the PNG encoder rejects the buffer.
pub fn encode_png<P>(image: &ImageBuffer<P, Vec<u8>>) -> Result<Vec<u8>, CodecError>
where
    P: PixelWithColorType<Subpixel = u8>,
{
    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder
        .write_image(image.as_raw(), image.width(), image.height(), P::COLOR_TYPE)
        .map_err(CodecError::Encode)?;
    Ok(png_bytes)
}

/// Base64-encode PNG bytes behind a `data:image/png;base64,` header.
#[must_use]
pub fn to_data_uri(png_bytes: &[u8]) -> String {
    let mut uri =
        String::with_capacity(PNG_DATA_URI_PREFIX.len() + png_bytes.len().div_ceil(3) * 4);
    uri.push_str(PNG_DATA_URI_PREFIX);
    STANDARD.encode_string(png_bytes, &mut uri);
    uri
}

/// Encode a grid as PNG and wrap it as a data URI in one step.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if PNG encoding fails.
pub fn encode_data_uri<P>(image: &ImageBuffer<P, Vec<u8>>) -> Result<String, CodecError>
where
    P: PixelWithColorType<Subpixel = u8>,
{
    encode_png(image).map(|png| to_data_uri(&png))
}

/// The three output grids as PNG data URIs, ready to serialize as a
/// response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportImages {
    /// The decoded input, re-encoded.
    pub original: String,
    /// The binary edge map.
    pub edges: String,
    /// The contour overlay.
    pub contours: String,
}

impl TransportImages {
    /// Encode all three grids of a result. Any failure fails the whole set.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] if any grid fails to encode.
    pub fn encode(result: &ProcessingResult) -> Result<Self, CodecError> {
        Ok(Self {
            original: encode_data_uri(&result.original)?,
            edges: encode_data_uri(result.edges.as_image())?,
            contours: encode_data_uri(&result.overlay)?,
        })
    }
}
