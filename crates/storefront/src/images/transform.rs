//! Resize and re-encode.
//!
//! CPU bound; call through `tokio::task::spawn_blocking`.

use image::codecs::webp::WebPEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ExtendedColorType, RgbaImage};

use super::{Fit, ImageCacheError};

const FILTER: FilterType = FilterType::Lanczos3;

/// Decode `source`, resize it when a dimension is given and encode it as
/// lossless WebP.
///
/// With only one dimension the other follows the source aspect ratio,
/// whatever the fit mode.
///
/// # Errors
///
/// Returns [`ImageCacheError::Image`] when the source cannot be decoded or
/// the result cannot be encoded.
pub fn transform(
    source: &[u8],
    width: Option<u32>,
    height: Option<u32>,
    fit: Fit,
) -> Result<Vec<u8>, ImageCacheError> {
    let img = image::load_from_memory(source)?;

    let resized = match (width, height) {
        (None, None) => img,
        (Some(w), None) => {
            let h = scale_dimension(img.height(), w, img.width());
            img.resize_exact(w, h, FILTER)
        }
        (None, Some(h)) => {
            let w = scale_dimension(img.width(), h, img.height());
            img.resize_exact(w, h, FILTER)
        }
        (Some(w), Some(h)) => fit_box(&img, w, h, fit),
    };

    let rgba = resized.to_rgba8();
    let mut out = Vec::new();
    WebPEncoder::new_lossless(&mut out).encode(
        rgba.as_raw(),
        rgba.width(),
        rgba.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(out)
}

fn fit_box(img: &DynamicImage, w: u32, h: u32, fit: Fit) -> DynamicImage {
    match fit {
        Fit::Cover => img.resize_to_fill(w, h, FILTER),
        Fit::Fill => img.resize_exact(w, h, FILTER),
        Fit::Inside => img.resize(w, h, FILTER),
        Fit::Outside => {
            let (ow, oh) = outside_size(img.width(), img.height(), w, h);
            img.resize_exact(ow, oh, FILTER)
        }
        Fit::Contain => {
            let inner = img.resize(w, h, FILTER);
            let mut canvas = RgbaImage::new(w, h);
            let x = i64::from((w - inner.width()) / 2);
            let y = i64::from((h - inner.height()) / 2);
            imageops::overlay(&mut canvas, &inner.to_rgba8(), x, y);
            DynamicImage::ImageRgba8(canvas)
        }
    }
}

/// `value * target / basis`, rounded, never zero.
fn scale_dimension(value: u32, target: u32, basis: u32) -> u32 {
    if basis == 0 {
        return target.max(1);
    }
    let scaled = (u64::from(value) * u64::from(target) + u64::from(basis) / 2) / u64::from(basis);
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}

/// Smallest aspect-preserving size covering `w` x `h`.
fn outside_size(src_w: u32, src_h: u32, w: u32, h: u32) -> (u32, u32) {
    // Compare w/src_w against h/src_h without floats.
    if u64::from(w) * u64::from(src_h) >= u64::from(h) * u64::from(src_w) {
        (w, scale_dimension(src_h, w, src_w))
    } else {
        (scale_dimension(src_w, h, src_h), h)
    }
}
