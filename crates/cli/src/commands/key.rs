//! Cache key inspection.
//!
//! Reproduces the keys the storefront derives so an operator can find the
//! store entries or cached file behind a given request.

use std::path::PathBuf;

use storefront_cache::images::{Fit, image_url};
use storefront_cache::swr::SwrCache;
use storefront_cache_core::{CacheKey, image_key, request_key};
use thiserror::Error;

/// Errors from key commands.
#[derive(Debug, Error)]
pub enum KeyError {
    /// Header argument is not `Name: value`.
    #[error("Invalid header (expected `Name: value`): {0}")]
    InvalidHeader(String),
}

/// Split `Name: value` header arguments, keeping their order.
fn parse_headers(headers: &[String]) -> Result<Vec<(String, String)>, KeyError> {
    headers
        .iter()
        .map(|raw| {
            let (name, value) = raw
                .split_once(':')
                .ok_or_else(|| KeyError::InvalidHeader(raw.clone()))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(KeyError::InvalidHeader(raw.clone()));
            }
            Ok((name.to_owned(), value.trim().to_owned()))
        })
        .collect()
}

/// Key for a provider request.
fn request_cache_key(
    method: &str,
    url: &str,
    headers: &[String],
    body: Option<&str>,
) -> Result<CacheKey, KeyError> {
    let headers = parse_headers(headers)?;
    Ok(request_key(
        method,
        url,
        headers.iter().map(|(n, v)| (n.as_str(), v.as_str())),
        body.map(str::as_bytes),
    ))
}

/// Print the SWR key and store entry names for a request.
///
/// # Errors
///
/// Returns an error if a header argument is malformed.
#[allow(clippy::print_stdout)]
pub fn request(
    method: &str,
    url: &str,
    headers: &[String],
    body: Option<&str>,
) -> Result<(), KeyError> {
    let key = request_cache_key(method, url, headers, body)?;

    println!("key:         {key}");
    println!("response:    {}", SwrCache::response_key(&key));
    println!("still-good:  {}", SwrCache::still_good_key(&key));
    Ok(())
}

/// Cached file for an image request built from its parameters.
fn image_path(
    src: &str,
    width: Option<u32>,
    height: Option<u32>,
    fit: Fit,
    dir: &std::path::Path,
) -> (String, PathBuf) {
    let url = image_url(src, width, height, fit);
    let key = image_key("GET", &url, width, height, fit.as_str());
    (url, dir.join(format!("{key}.webp")))
}

/// Print the request URL and cached file path for an image.
///
/// Only matches what the server caches when clients request the exact URL
/// printed here; a different parameter order is a different key.
#[allow(clippy::print_stdout)]
pub fn image(src: &str, width: Option<u32>, height: Option<u32>, fit: &str, dir: Option<PathBuf>) {
    let dir = super::image_cache_dir(dir);
    let (url, path) = image_path(src, width, height, Fit::parse(fit), &dir);

    println!("url:   {url}");
    println!("path:  {}", path.display());
    println!("exists: {}", path.exists());
}
