//! Image cache directory maintenance.
//!
//! Transformed images never expire on their own, so the directory only grows
//! until it is pruned here. Temp files (`tmp_*`) left behind by an interrupted
//! write are always eligible for pruning once past the cutoff.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use thiserror::Error;
use tracing::{info, warn};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Errors from image cache commands.
#[derive(Debug, Error)]
pub enum ImagesError {
    /// Directory could not be read.
    #[error("Failed to read {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// What a scan of the cache directory found.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub images: u64,
    pub image_bytes: u64,
    pub temp_files: u64,
}

/// Result of a prune run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PruneReport {
    pub removed: u64,
    pub removed_bytes: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Image,
    Temp,
}

/// A file in the cache directory the cache itself wrote.
struct CacheEntry {
    path: PathBuf,
    kind: EntryKind,
    len: u64,
    modified: Option<SystemTime>,
}

fn classify(path: &Path) -> Option<EntryKind> {
    let name = path.file_name()?.to_str()?;
    if name.starts_with("tmp_") {
        Some(EntryKind::Temp)
    } else if path.extension().is_some_and(|ext| ext == "webp") {
        Some(EntryKind::Image)
    } else {
        None
    }
}

/// List cache files. A missing directory is an empty cache.
async fn scan(dir: &Path) -> Result<Vec<CacheEntry>, ImagesError> {
    let read_err = |source| ImagesError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut read_dir = match tokio::fs::read_dir(dir).await {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(read_err(e)),
    };

    let mut entries = Vec::new();
    while let Some(entry) = read_dir.next_entry().await.map_err(read_err)? {
        let path = entry.path();
        let Some(kind) = classify(&path) else {
            continue;
        };
        let Ok(metadata) = entry.metadata().await else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        entries.push(CacheEntry {
            path,
            kind,
            len: metadata.len(),
            modified: metadata.modified().ok(),
        });
    }
    Ok(entries)
}

/// Count cached images and stray temp files.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be read.
pub async fn collect_stats(dir: &Path) -> Result<CacheStats, ImagesError> {
    let mut stats = CacheStats::default();
    for entry in scan(dir).await? {
        match entry.kind {
            EntryKind::Image => {
                stats.images += 1;
                stats.image_bytes += entry.len;
            }
            EntryKind::Temp => stats.temp_files += 1,
        }
    }
    Ok(stats)
}

/// Delete cache files last modified before `cutoff`.
///
/// Files without a readable modification time are kept.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be read.
pub async fn prune_before(
    dir: &Path,
    cutoff: SystemTime,
    dry_run: bool,
) -> Result<PruneReport, ImagesError> {
    let mut report = PruneReport::default();

    for entry in scan(dir).await? {
        if !entry.modified.is_some_and(|modified| modified < cutoff) {
            continue;
        }

        if dry_run {
            info!(path = %entry.path.display(), "Would remove");
        } else if let Err(e) = tokio::fs::remove_file(&entry.path).await {
            warn!(path = %entry.path.display(), error = %e, "Failed to remove cached image");
            report.failed += 1;
            continue;
        }

        report.removed += 1;
        report.removed_bytes += entry.len;
    }

    Ok(report)
}

/// Print cache directory statistics.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be read.
#[allow(clippy::print_stdout)]
pub async fn stats(dir: Option<PathBuf>) -> Result<(), ImagesError> {
    let dir = super::image_cache_dir(dir);
    let stats = collect_stats(&dir).await?;

    println!("directory:   {}", dir.display());
    println!("images:      {}", stats.images);
    println!("bytes:       {}", stats.image_bytes);
    println!("temp files:  {}", stats.temp_files);
    Ok(())
}

/// Delete cache files older than `older_than_days`.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be read.
pub async fn prune(
    dir: Option<PathBuf>,
    older_than_days: u64,
    dry_run: bool,
) -> Result<(), ImagesError> {
    let dir = super::image_cache_dir(dir);
    let age = Duration::from_secs(older_than_days.saturating_mul(SECONDS_PER_DAY));
    let cutoff = SystemTime::now()
        .checked_sub(age)
        .unwrap_or(SystemTime::UNIX_EPOCH);

    info!(dir = %dir.display(), older_than_days, dry_run, "Pruning image cache");
    let report = prune_before(&dir, cutoff, dry_run).await?;
    info!(
        removed = report.removed,
        removed_bytes = report.removed_bytes,
        failed = report.failed,
        "Prune complete"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn populate(dir: &Path) {
        std::fs::write(dir.join("aaaa.webp"), b"webp-bytes").unwrap();
        std::fs::write(dir.join("bbbb.webp"), b"more").unwrap();
        std::fs::write(dir.join("tmp_1234"), b"partial").unwrap();
        std::fs::write(dir.join("notes.txt"), b"ignored").unwrap();
    }

    #[tokio::test]
    async fn test_stats_counts_cache_files_only() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path());

        let stats = collect_stats(dir.path()).await.unwrap();
        assert_eq!(
            stats,
            CacheStats {
                images: 2,
                image_bytes: 14,
                temp_files: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let stats = collect_stats(&dir.path().join("absent")).await.unwrap();
        assert_eq!(stats, CacheStats::default());
    }

    #[tokio::test]
    async fn test_prune_respects_cutoff() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path());

        let past = SystemTime::UNIX_EPOCH;
        let report = prune_before(dir.path(), past, false).await.unwrap();
        assert_eq!(report.removed, 0);

        let future = SystemTime::now() + Duration::from_secs(60);
        let report = prune_before(dir.path(), future, true).await.unwrap();
        assert_eq!(report.removed, 3);
        assert!(dir.path().join("aaaa.webp").exists());

        let report = prune_before(dir.path(), future, false).await.unwrap();
        assert_eq!(report.removed, 3);
        assert!(!dir.path().join("aaaa.webp").exists());
        assert!(!dir.path().join("tmp_1234").exists());
        assert!(dir.path().join("notes.txt").exists());
    }
}
