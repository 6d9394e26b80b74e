//! Fallback image.

use axum::http::{HeaderValue, StatusCode, header};
use bytes::Bytes;

use super::cache::{ImageBody, ImageResponse};

/// A 1x1 transparent GIF.
pub const PLACEHOLDER_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00,
    0xff, 0xff, 0xff, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00, 0x00, 0x00,
    0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x01, 0x44, 0x00, 0x3b,
];

/// Status 500, uncacheable, GIF body.
pub(crate) fn placeholder_response() -> ImageResponse {
    ImageResponse {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        headers: vec![
            (header::CACHE_CONTROL, HeaderValue::from_static("max-age=0")),
            (header::CONTENT_TYPE, HeaderValue::from_static("image/gif")),
            (header::CONTENT_LENGTH, HeaderValue::from(PLACEHOLDER_GIF.len())),
        ],
        body: ImageBody::Bytes(Bytes::from_static(PLACEHOLDER_GIF)),
    }
}
