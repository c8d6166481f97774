//! Core data types and reports for the comicpack library.
//!
//! This module defines the fundamental data structures used throughout comicpack:
//! - Album metadata as read from the sidecar (`AlbumMetadata`, `Episode`)
//! - The externally fetched album record (`AlbumDetail`)
//! - Intermediate structures (`ChapterCandidate`, `ImageEntry`)
//! - Reporting types (`PackResult`, `BatchStats`)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Image extensions recognized as pages, compared case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 6] = ["webp", "jpg", "jpeg", "png", "gif", "bmp"];

/// File name of the metadata sidecar inside an album directory.
pub const METADATA_FILE_NAME: &str = "metadata.json";

/// One entry of an album's episode list, as recorded by the downloader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Episode {
    #[serde(deserialize_with = "de::lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "de::lenient_f64")]
    pub index: f64,
    #[serde(deserialize_with = "de::lenient_opt_f64")]
    pub sort: Option<f64>,
    #[serde(deserialize_with = "de::lenient_string")]
    pub indextitle: String,
}

impl Episode {
    /// The ordering value of this episode: its `sort` field, falling back to `index`.
    pub fn sort_value(&self) -> f64 {
        self.sort.unwrap_or(self.index)
    }
}

/// Merged metadata for one album.
///
/// Deserialized from the sidecar with every field optional. Scalar fields are
/// held as strings because the downloader writes them inconsistently (numbers
/// or strings), and list fields are always trimmed, non-empty strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlbumMetadata {
    #[serde(rename = "album_id", alias = "id", deserialize_with = "de::lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "de::lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "de::lenient_string")]
    pub description: String,
    #[serde(deserialize_with = "de::string_list")]
    pub authors: Vec<String>,
    #[serde(deserialize_with = "de::string_list")]
    pub actors: Vec<String>,
    #[serde(deserialize_with = "de::string_list")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "de::string_list")]
    pub works: Vec<String>,
    #[serde(deserialize_with = "de::lenient_string")]
    pub page_count: String,
    #[serde(deserialize_with = "de::lenient_string")]
    pub pub_date: String,
    #[serde(deserialize_with = "de::lenient_string")]
    pub update_date: String,
    #[serde(deserialize_with = "de::lenient_string")]
    pub likes: String,
    #[serde(deserialize_with = "de::lenient_string")]
    pub views: String,
    #[serde(deserialize_with = "de::lenient_string")]
    pub comment_count: String,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de::episode_list"
    )]
    pub episodes: Option<Vec<Episode>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de::lenient_opt_usize"
    )]
    pub episode_count: Option<usize>,
    /// Dense 1-based position of the chapter being packed. Assigned at pack time.
    #[serde(skip)]
    pub chapter_number: usize,
    /// Number of chapters produced for the album. Assigned at pack time.
    #[serde(skip)]
    pub total_chapters: usize,
}

impl Default for AlbumMetadata {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            description: String::new(),
            authors: Vec::new(),
            actors: Vec::new(),
            tags: Vec::new(),
            works: Vec::new(),
            page_count: "0".to_string(),
            pub_date: String::new(),
            update_date: String::new(),
            likes: String::new(),
            views: String::new(),
            comment_count: "0".to_string(),
            episodes: None,
            episode_count: None,
            chapter_number: 1,
            total_chapters: 1,
        }
    }
}

impl AlbumMetadata {
    /// Creates the default record for an album, titled after its directory.
    pub fn default_with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// An already-fetched album record handed over by the download side.
///
/// When supplied, its fields take precedence over the sidecar for every key
/// they share (see [`crate::metadata::merge_detail`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlbumDetail {
    #[serde(alias = "album_id", deserialize_with = "de::lenient_string")]
    pub id: String,
    #[serde(deserialize_with = "de::lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "de::lenient_string")]
    pub description: String,
    #[serde(deserialize_with = "de::string_list")]
    pub authors: Vec<String>,
    #[serde(deserialize_with = "de::string_list")]
    pub actors: Vec<String>,
    #[serde(deserialize_with = "de::string_list")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "de::string_list")]
    pub works: Vec<String>,
    #[serde(deserialize_with = "de::lenient_string")]
    pub page_count: String,
    #[serde(deserialize_with = "de::lenient_string")]
    pub pub_date: String,
    #[serde(deserialize_with = "de::lenient_string")]
    pub update_date: String,
    #[serde(deserialize_with = "de::lenient_string")]
    pub likes: String,
    #[serde(deserialize_with = "de::lenient_string")]
    pub views: String,
    #[serde(deserialize_with = "de::lenient_string")]
    pub comment_count: String,
    pub episode_list: Vec<Episode>,
}

/// A subdirectory holding at least one page, with the ordinal inferred for it.
///
/// Ordinals only establish relative order; they may repeat or skip.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterCandidate {
    pub ordinal: f64,
    pub dir: PathBuf,
    pub name: String,
}

/// A page scheduled for an archive, with its dense 1-based position.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageEntry {
    pub path: PathBuf,
    pub extension: &'static str,
    pub index: usize,
}

impl ImageEntry {
    /// Numbers an already ordered list of pages starting at 1.
    pub fn sequence(pages: &[PathBuf]) -> Result<Vec<ImageEntry>> {
        pages
            .iter()
            .enumerate()
            .map(|(i, path)| {
                Ok(ImageEntry {
                    extension: get_file_info(path)?,
                    path: path.clone(),
                    index: i + 1,
                })
            })
            .collect()
    }

    /// Entry name inside the archive, e.g. `007.webp`.
    pub fn archive_name(&self) -> String {
        format!("{:03}.{}", self.index, self.extension)
    }
}

/// Outcome of packing one album.
#[derive(Debug, Default)]
pub struct PackResult {
    /// Archives produced (or kept, when overwriting is disabled), in chapter order.
    pub archives: Vec<PathBuf>,
    /// Failures encountered along the way. Non-empty `archives` means partial success.
    pub errors: Vec<Error>,
}

impl PackResult {
    /// An album counts as packed when at least one archive exists for it.
    pub fn is_success(&self) -> bool {
        !self.archives.is_empty()
    }

    pub(crate) fn failed(error: Error) -> Self {
        Self {
            archives: Vec::new(),
            errors: vec![error],
        }
    }
}

/// Per-album counters for a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub success: usize,
    pub failed: usize,
    pub total: usize,
}

/// Utility function: Determines the archive extension of an image file.
///
/// # Arguments
///
/// * `image_path` - Path to the file to analyze
///
/// # Returns
///
/// * `Ok(&str)` - The lower-cased extension to keep inside the archive
/// * `Err(Error)` - An error if the file is not a recognized image
pub fn get_file_info(image_path: &Path) -> Result<&'static str> {
    let extension = image_path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("webp") => Ok("webp"),
        Some("jpg") => Ok("jpg"),
        Some("jpeg") => Ok("jpeg"),
        Some("png") => Ok("png"),
        Some("gif") => Ok("gif"),
        Some("bmp") => Ok("bmp"),
        _ => Err(Error::Unsupported(format!("Image format {:#?}", extension))),
    }
}

/// Returns true if the path carries one of [`IMAGE_EXTENSIONS`].
pub fn is_supported_image(path: &Path) -> bool {
    get_file_info(path).is_ok()
}

/// Lenient field deserializers for the loosely-typed sidecar.
mod de {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::Episode;

    fn scalar_to_string(value: Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::String(s) => s.trim().to_string(),
            other => other.to_string().trim().to_string(),
        }
    }

    pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(scalar_to_string(Value::deserialize(deserializer)?))
    }

    pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let items = match Value::deserialize(deserializer)? {
            Value::Array(values) => values.into_iter().map(scalar_to_string).collect(),
            scalar => vec![scalar_to_string(scalar)],
        };
        Ok(items.into_iter().filter(|s: &String| !s.is_empty()).collect())
    }

    fn value_to_f64(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(value_to_f64(&Value::deserialize(deserializer)?).unwrap_or(0.0))
    }

    pub fn lenient_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(value_to_f64(&Value::deserialize(deserializer)?))
    }

    pub fn lenient_opt_usize<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
            Value::String(s) => s.trim().parse::<usize>().ok(),
            _ => None,
        })
    }

    /// A list of episode objects. Anything but an array reads as absent;
    /// entries that are not objects are dropped.
    pub fn episode_list<'de, D>(deserializer: D) -> Result<Option<Vec<Episode>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(values) => Some(
                values
                    .into_iter()
                    .filter(Value::is_object)
                    .filter_map(|v| serde_json::from_value::<Episode>(v).ok())
                    .collect(),
            ),
            _ => None,
        })
    }
}
