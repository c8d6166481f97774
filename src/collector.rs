//! Chapter and page discovery plus chapter ordering.
//!
//! Discovery walks the album directory and returns plain path lists; the
//! ordering decisions ([`resolve_chapters`], [`order_flat_pages`]) are pure
//! functions over those lists so they can be tested without a file system.
//!
//! Chapter order is inferred per directory name. When the album metadata
//! carries an episode list of the same length as the candidate list, an
//! episode whose name or index title occurs in the directory name supplies
//! the ordinal. Otherwise the name runs through [`ORDINAL_MATCHERS`] in order
//! and the first hit wins.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use log::debug;
use rayon::prelude::*;
use regex::Regex;
use tokio::fs::{ReadDir, read_dir};

use crate::error::{Error, Result};
use crate::path_utils::{
    NaturalChunk, compare_paths_natural, get_file_name_lossy, is_hidden_file, natural_sort_key,
};
use crate::types::{AlbumMetadata, ChapterCandidate, Episode, is_supported_image};

/// Ordinal used when nothing in a name can be trusted as a chapter number.
pub const DEFAULT_ORDINAL: f64 = 1.0;

/// Bare numbers above this are assumed to be noise such as a year.
const NOISE_NUMBER_THRESHOLD: f64 = 100.0;

lazy_static! {
    /// "第12话", "第3.5章", "7集"
    static ref NUMBERED_CHAPTER_REGEX: Regex =
        Regex::new(r"第?([0-9]+(?:\.[0-9]+)?)[话章集]").unwrap();
    /// "P 3", "p 12-1" (hyphen read as a decimal point)
    static ref PART_MARKER_REGEX: Regex =
        Regex::new(r"\b[pP]\s+([0-9]+(?:[.\-][0-9]+)?)").unwrap();
    /// "Some Title 4", "Some Title 4-2 "
    static ref TRAILING_NUMBER_REGEX: Regex =
        Regex::new(r"\s+([0-9]+(?:[.\-][0-9]+)?)\s*$").unwrap();
    /// "~2019年"
    static ref ERA_MARKER_REGEX: Regex = Regex::new(r"~([0-9]+)年").unwrap();
    static ref DIGIT_RUN_REGEX: Regex = Regex::new(r"[0-9]+").unwrap();
}

/// A single step of the chapter ordinal cascade.
pub type OrdinalMatcher = fn(&str) -> Option<f64>;

/// The heuristic cascade, in priority order.
pub const ORDINAL_MATCHERS: [OrdinalMatcher; 5] = [
    match_numbered_chapter,
    match_part_marker,
    match_trailing_number,
    match_era_marker,
    match_last_digit_run,
];

fn parse_ordinal(raw: &str) -> Option<f64> {
    raw.replace('-', ".").parse::<f64>().ok()
}

/// Matches "第<N>话", "第<N>章" or "第<N>集", with an optional decimal part.
pub fn match_numbered_chapter(name: &str) -> Option<f64> {
    NUMBERED_CHAPTER_REGEX
        .captures(name)
        .and_then(|cap| parse_ordinal(cap.get(1)?.as_str()))
}

/// Matches a standalone "p"/"P" followed by whitespace and a number.
pub fn match_part_marker(name: &str) -> Option<f64> {
    PART_MARKER_REGEX
        .captures(name)
        .and_then(|cap| parse_ordinal(cap.get(1)?.as_str()))
}

/// Matches a whitespace-separated number at the very end of the name.
pub fn match_trailing_number(name: &str) -> Option<f64> {
    TRAILING_NUMBER_REGEX
        .captures(name)
        .and_then(|cap| parse_ordinal(cap.get(1)?.as_str()))
}

/// An "~<N>年" era marker always pins the chapter to the front.
pub fn match_era_marker(name: &str) -> Option<f64> {
    ERA_MARKER_REGEX.is_match(name).then_some(DEFAULT_ORDINAL)
}

/// Uses the last digit run anywhere in the name, collapsing numbers above 100.
pub fn match_last_digit_run(name: &str) -> Option<f64> {
    let last = DIGIT_RUN_REGEX.find_iter(name).last()?;
    let number = last.as_str().parse::<f64>().ok()?;
    Some(if number > NOISE_NUMBER_THRESHOLD {
        DEFAULT_ORDINAL
    } else {
        number
    })
}

/// Runs the heuristic cascade on a directory name.
pub fn infer_ordinal(name: &str) -> f64 {
    ORDINAL_MATCHERS
        .iter()
        .find_map(|matcher| matcher(name))
        .unwrap_or(DEFAULT_ORDINAL)
}

/// Finds the first episode whose name, or else index title, occurs in `name`.
pub fn match_episode(name: &str, episodes: &[Episode]) -> Option<f64> {
    episodes
        .iter()
        .find(|ep| {
            (!ep.name.is_empty() && name.contains(ep.name.as_str()))
                || (!ep.indextitle.is_empty() && name.contains(ep.indextitle.as_str()))
        })
        .map(Episode::sort_value)
}

/// Assigns an ordinal to every chapter directory and sorts them.
///
/// The sort is stable, so directories with equal ordinals keep the order in
/// which they were listed. Episode sort values and heuristic ordinals may
/// end up mixed when only some directories match an episode; they are
/// compared as plain numbers.
pub fn resolve_chapters(dirs: &[PathBuf], metadata: Option<&AlbumMetadata>) -> Vec<ChapterCandidate> {
    let episodes = metadata
        .and_then(|m| m.episodes.as_deref())
        .filter(|episodes| episodes.len() == dirs.len());

    if episodes.is_some() {
        debug!("Ordering {} chapters using the episode list", dirs.len());
    }

    let mut candidates: Vec<ChapterCandidate> = dirs
        .iter()
        .map(|dir| {
            let name = get_file_name_lossy(dir);
            let ordinal = episodes
                .and_then(|episodes| match_episode(&name, episodes))
                .unwrap_or_else(|| infer_ordinal(&name));
            debug!("Chapter {:?} -> ordinal {}", name, ordinal);
            ChapterCandidate {
                ordinal,
                dir: dir.clone(),
                name,
            }
        })
        .collect();

    candidates.par_sort_by(|a, b| a.ordinal.partial_cmp(&b.ordinal).unwrap_or(Ordering::Equal));
    candidates
}

/// Orders the pages of a flat album: by the ordinal of their parent
/// directory first, then by that directory's lower-cased name (and full
/// path) so each folder stays contiguous, then naturally by file name.
pub fn order_flat_pages(images: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut keyed: Vec<(f64, String, PathBuf, Vec<NaturalChunk>, PathBuf)> = images
        .into_iter()
        .map(|path| {
            let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
            let parent_name = get_file_name_lossy(&parent);
            let parent_ordinal = if parent.as_os_str().is_empty() {
                DEFAULT_ORDINAL
            } else {
                infer_ordinal(&parent_name)
            };
            let key = natural_sort_key(&get_file_name_lossy(&path));
            (parent_ordinal, parent_name.to_lowercase(), parent, key, path)
        })
        .collect();

    keyed.par_sort_by(|a, b| {
        a.0.partial_cmp(&b.0)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.1.cmp(&b.1))
            .then_with(|| a.2.cmp(&b.2))
            .then_with(|| a.3.cmp(&b.3))
    });
    keyed.into_iter().map(|(_, _, _, _, path)| path).collect()
}

/// Scans an album directory for chapters and pages.
#[derive(Debug)]
pub struct Collector<'a> {
    base_directory: &'a Path,
}

impl<'a> Collector<'a> {
    /// Creates a new Collector for the given album directory.
    pub fn new(base_directory: &'a Path) -> Self {
        Self { base_directory }
    }

    /// Lists the immediate subdirectories that directly contain at least one image.
    pub async fn collect_chapter_dirs(&self) -> Result<Vec<PathBuf>> {
        let mut chapter_dirs = Vec::new();
        for dir in Self::collect_entries(self.base_directory, true).await? {
            let has_images = Self::collect_entries(&dir, false)
                .await?
                .iter()
                .any(|p| is_supported_image(p));
            if has_images {
                chapter_dirs.push(dir);
            }
        }
        Ok(chapter_dirs)
    }

    /// Discovers chapter directories and returns them in resolved order.
    pub async fn collect_chapters(
        &self,
        metadata: Option<&AlbumMetadata>,
    ) -> Result<Vec<ChapterCandidate>> {
        let dirs = self.collect_chapter_dirs().await?;
        Ok(resolve_chapters(&dirs, metadata))
    }

    /// Collects the images directly inside one chapter directory, naturally sorted.
    pub async fn collect_pages(chapter_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut pages: Vec<PathBuf> = Self::collect_entries(chapter_dir, false)
            .await?
            .into_iter()
            .filter(|p| is_supported_image(p))
            .collect();
        pages.par_sort_by(|a, b| compare_paths_natural(a, b));
        Ok(pages)
    }

    /// Collects every image beneath the album directory, in flat-album order.
    pub async fn collect_all_pages(&self) -> Result<Vec<PathBuf>> {
        let images = Self::collect_images_recursive(self.base_directory).await?;
        Ok(order_flat_pages(images))
    }

    /// Walks `directory` depth-first and returns every image file found, unordered.
    pub async fn collect_images_recursive(directory: &Path) -> Result<Vec<PathBuf>> {
        let mut images = Vec::new();
        let mut stack = vec![directory.to_path_buf()];

        while let Some(current) = stack.pop() {
            let mut entries: ReadDir = read_dir(&current).await.map_err(Error::Io)?;
            while let Some(entry) = entries.next_entry().await.map_err(Error::Io)? {
                let path = entry.path();
                if is_hidden_file(&path) {
                    continue;
                }
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    stack.push(path);
                } else if is_supported_image(&path) {
                    images.push(path);
                }
            }
        }
        Ok(images)
    }

    /// Returns true if at least one image exists anywhere beneath `directory`.
    pub async fn contains_images(directory: &Path) -> bool {
        Self::collect_images_recursive(directory)
            .await
            .map(|images| !images.is_empty())
            .unwrap_or(false)
    }

    /// Collects directory contents with filtering options.
    ///
    /// Hidden entries are skipped. Entries come back in listing order.
    ///
    /// # Arguments
    ///
    /// * `directory` - Directory to scan
    /// * `only_dirs` - When true, only directories are collected; when false, only files
    pub async fn collect_entries(directory: &Path, only_dirs: bool) -> Result<Vec<PathBuf>> {
        let mut entries: Vec<PathBuf> = Vec::new();

        let mut paths: ReadDir = read_dir(directory).await.map_err(Error::Io)?;

        while let Some(entry) = paths.next_entry().await.map_err(Error::Io)? {
            let path = entry.path();

            if is_hidden_file(&path) {
                continue;
            }

            let is_dir = path.is_dir();
            if only_dirs != is_dir {
                continue;
            }

            entries.push(path);
        }

        Ok(entries)
    }
}
