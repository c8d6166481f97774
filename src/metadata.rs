//! Album metadata loading and merging.
//!
//! The merged record for a chapter is built in three layers: the sidecar
//! (or its defaults), then an optional externally fetched [`AlbumDetail`],
//! then the chapter position assigned at pack time.

use log::{debug, warn};
use std::path::Path;
use tokio::fs;

use crate::error::{Error, Result};
use crate::path_utils::get_file_name_lossy;
use crate::types::{AlbumDetail, AlbumMetadata};

/// Reads and parses the sidecar `file_name` inside `album_dir`.
///
/// # Returns
///
/// * `Ok(AlbumMetadata)` - The parsed record; missing keys take their defaults
/// * `Err(Error::MissingMetadata)` - The file is absent, unreadable, or not a JSON object
pub async fn load_sidecar(album_dir: &Path, file_name: &str) -> Result<AlbumMetadata> {
    let metadata_path = album_dir.join(file_name);

    let content = fs::read_to_string(&metadata_path)
        .await
        .map_err(|e| Error::MissingMetadata {
            path: metadata_path.clone(),
            reason: e.to_string(),
        })?;

    let invalid = |reason: String| Error::MissingMetadata {
        path: metadata_path.clone(),
        reason,
    };

    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;
    if !value.is_object() {
        return Err(invalid("expected a JSON object".to_string()));
    }
    let mut metadata: AlbumMetadata =
        serde_json::from_value(value).map_err(|e| invalid(e.to_string()))?;

    if metadata.name.is_empty() {
        metadata.name = get_file_name_lossy(album_dir);
    }
    Ok(metadata)
}

/// Loads the metadata for an album, never failing.
///
/// An absent or unparsable sidecar is logged and replaced by the default
/// record, titled after the album directory.
pub async fn load_metadata(album_dir: &Path, file_name: &str) -> AlbumMetadata {
    match load_sidecar(album_dir, file_name).await {
        Ok(metadata) => {
            debug!("Loaded metadata for {:?}", album_dir);
            metadata
        }
        Err(e) => {
            warn!("{}; using defaults", e);
            AlbumMetadata::default_with_name(get_file_name_lossy(album_dir))
        }
    }
}

/// Overrides every field the sidecar shares with an externally fetched detail.
///
/// The detail wins unconditionally, even where its value is empty. The
/// sidecar's `episodes` list is kept since the detail does not carry one in
/// the same shape; `episode_count` is derived from the detail's episode list.
pub fn merge_detail(mut metadata: AlbumMetadata, detail: &AlbumDetail) -> AlbumMetadata {
    metadata.id = detail.id.trim().to_string();
    metadata.name = detail.name.trim().to_string();
    metadata.description = detail.description.trim().to_string();
    metadata.authors = normalize_list(&detail.authors);
    metadata.actors = normalize_list(&detail.actors);
    metadata.tags = normalize_list(&detail.tags);
    metadata.works = normalize_list(&detail.works);
    metadata.page_count = detail.page_count.trim().to_string();
    metadata.pub_date = detail.pub_date.trim().to_string();
    metadata.update_date = detail.update_date.trim().to_string();
    metadata.likes = detail.likes.trim().to_string();
    metadata.views = detail.views.trim().to_string();
    metadata.comment_count = detail.comment_count.trim().to_string();
    metadata.episode_count = Some(detail.episode_list.len());
    metadata
}

/// Stamps the chapter position onto a copy of the album record.
pub fn with_chapter(metadata: &AlbumMetadata, chapter_number: usize, total_chapters: usize) -> AlbumMetadata {
    AlbumMetadata {
        chapter_number,
        total_chapters,
        ..metadata.clone()
    }
}

/// Trims every element and drops the blank ones.
pub fn normalize_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}
