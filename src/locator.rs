//! Locating an album's directory from its fetched detail.
//!
//! Download collaborators do not always report where an album landed, so
//! the source root is searched with a fixed chain of strategies and the
//! first hit wins.

use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};

use crate::collector::Collector;
use crate::error::{Error, Result};
use crate::metadata::load_sidecar;
use crate::path_utils::sanitize_filename;
use crate::types::AlbumDetail;

/// The strategy that located an album directory, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStrategy {
    /// A subdirectory whose sidecar records the album id.
    MetadataId,
    /// A subdirectory named after the album id.
    IdDirectory,
    /// A subdirectory named after the sanitized album title.
    TitleDirectory,
    /// The source root's only subdirectory.
    OnlySubdirectory,
    /// The first subdirectory with an image anywhere beneath it.
    FirstWithImages,
}

/// A located album directory and how it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAlbumDir {
    pub path: PathBuf,
    pub strategy: ResolutionStrategy,
}

impl ResolvedAlbumDir {
    fn new(path: PathBuf, strategy: ResolutionStrategy) -> Self {
        info!("Resolved album directory {:?} via {:?}", path, strategy);
        Self { path, strategy }
    }
}

/// Searches the immediate subdirectories for a sidecar whose id matches.
pub async fn find_album_dir_by_metadata(
    subdirs: &[PathBuf],
    album_id: &str,
    metadata_file_name: &str,
) -> Option<PathBuf> {
    for dir in subdirs {
        match load_sidecar(dir, metadata_file_name).await {
            Ok(metadata) if metadata.id == album_id => return Some(dir.clone()),
            Ok(_) => {}
            Err(e) => debug!("Skipping {:?} during id lookup: {}", dir, e),
        }
    }
    None
}

/// Resolves the on-disk directory of `detail` under `source_dir`.
///
/// # Returns
///
/// * `Ok(ResolvedAlbumDir)` - The first directory any strategy produced
/// * `Err(Error::AlbumDirNotFound)` - Every strategy came up empty
pub async fn resolve_album_dir(
    source_dir: &Path,
    detail: &AlbumDetail,
    metadata_file_name: &str,
) -> Result<ResolvedAlbumDir> {
    let album_id = detail.id.trim();
    let subdirs = Collector::collect_entries(source_dir, true)
        .await
        .unwrap_or_else(|e| {
            warn!("Cannot list {:?}: {}", source_dir, e);
            Vec::new()
        });

    if !album_id.is_empty() {
        if let Some(dir) = find_album_dir_by_metadata(&subdirs, album_id, metadata_file_name).await {
            return Ok(ResolvedAlbumDir::new(dir, ResolutionStrategy::MetadataId));
        }

        let id_dir = source_dir.join(album_id);
        if id_dir.is_dir() {
            return Ok(ResolvedAlbumDir::new(id_dir, ResolutionStrategy::IdDirectory));
        }
    }

    let title = sanitize_filename(detail.name.trim());
    let title = title.trim();
    if !title.is_empty() {
        let title_dir = source_dir.join(title);
        if title_dir.is_dir() {
            return Ok(ResolvedAlbumDir::new(title_dir, ResolutionStrategy::TitleDirectory));
        }
    }

    if let [only] = subdirs.as_slice() {
        return Ok(ResolvedAlbumDir::new(only.clone(), ResolutionStrategy::OnlySubdirectory));
    }

    for dir in &subdirs {
        if Collector::contains_images(dir).await {
            return Ok(ResolvedAlbumDir::new(dir.clone(), ResolutionStrategy::FirstWithImages));
        }
    }

    error!("Could not locate album {:?} under {:?}", album_id, source_dir);
    Err(Error::AlbumDirNotFound {
        id: album_id.to_string(),
        source_dir: source_dir.to_path_buf(),
    })
}
