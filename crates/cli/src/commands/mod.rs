//! CLI command implementations.

pub mod images;
pub mod key;

use std::path::PathBuf;

/// Resolve the image cache directory from the flag, then the environment.
pub fn image_cache_dir(dir: Option<PathBuf>) -> PathBuf {
    dir.unwrap_or_else(|| {
        dotenvy::dotenv().ok();
        std::env::var("IMAGE_CACHE_DIR")
            .map_or_else(|_| PathBuf::from(".cache/images"), PathBuf::from)
    })
}
