use log::{error, info, warn};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

use crate::collector::Collector;
use crate::error::{Error, Result};
use crate::generator::cbz::{ArchiveOptions, write_archive};
use crate::generator::comic_info::generate_comic_info;
use crate::locator::resolve_album_dir;
use crate::metadata::{load_metadata, merge_detail, with_chapter};
use crate::path_utils::{sanitize_archive_name, sanitize_series_name};
use crate::types::{
    AlbumDetail, AlbumMetadata, BatchStats, ChapterCandidate, METADATA_FILE_NAME, PackResult,
};

/// The album packer, configured declaratively using the builder pattern.
///
/// A packer turns downloaded album directories into CBZ archives laid out as
/// `<output_dir>/<series>/<series>_c{NNN}.cbz`. It holds no state between
/// albums, so one packer can serve any number of runs. Entry points:
///
/// - [`pack_album`](Packer::pack_album): one album directory
/// - [`pack_from_detail`](Packer::pack_from_detail): locate an album from its fetched detail, then pack it
/// - [`pack_many`](Packer::pack_many): every album under a source root
///
/// None of them return an error: failures are logged and collected into the
/// returned [`PackResult`] or counted in [`BatchStats`].
///
/// ```rust,no_run
/// # use comicpack::prelude::*;
/// # #[tokio::main]
/// # async fn main() -> comicpack::error::Result<()> {
/// let packer = Packer::builder()
///     .overwrite(false)
///     .compress_level(6u8)
///     .build()?;
///
/// let stats = packer.pack_many(Path::new("./downloads"), Path::new("./library")).await;
/// println!("{}/{} albums packed", stats.success, stats.total);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, derive_builder::Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct Packer {
    /// Whether to replace archives that already exist.
    ///
    /// With `false`, an existing archive is left byte-for-byte untouched and
    /// still reported as produced.
    #[builder(default = "true")]
    pub overwrite: bool,

    /// Compression level for archive entries, 0-9.
    ///
    /// 0 stores entries without compression; 1 is fastest, 9 smallest.
    #[builder(default = "1")]
    pub compress_level: u8,

    /// File name of the metadata sidecar inside each album directory.
    #[builder(default = "METADATA_FILE_NAME.to_string()")]
    pub metadata_file_name: String,
}

impl Default for Packer {
    fn default() -> Self {
        Self {
            overwrite: true,
            compress_level: 1,
            metadata_file_name: METADATA_FILE_NAME.to_string(),
        }
    }
}

/// Archive file name for one chapter of a series, e.g. `Series_c003.cbz`.
pub fn archive_file_name(series_name: &str, chapter_number: usize) -> String {
    sanitize_archive_name(&format!("{}_c{:03}.cbz", series_name, chapter_number))
}

impl Packer {
    /// Creates a new builder for configuring a `Packer`.
    pub fn builder() -> PackerBuilder {
        PackerBuilder::default()
    }

    fn archive_options(&self) -> ArchiveOptions {
        ArchiveOptions {
            overwrite: self.overwrite,
            compress_level: self.compress_level,
        }
    }

    /// Packs one album directory.
    ///
    /// An album with at most one chapter directory becomes a single archive
    /// of every image beneath it. An album with several chapter directories
    /// becomes one archive per chapter, numbered densely in resolved order.
    ///
    /// # Arguments
    ///
    /// * `album_dir` - The album's source directory
    /// * `output_dir` - Root under which the series directory is created
    /// * `detail` - An already fetched album record; its fields override the sidecar
    pub async fn pack_album(
        &self,
        album_dir: &Path,
        output_dir: &Path,
        detail: Option<&AlbumDetail>,
    ) -> PackResult {
        match self.try_pack_album(album_dir, output_dir, detail).await {
            Ok(result) => result,
            Err(e) => {
                error!("Packing {:?} failed: {}", album_dir, e);
                PackResult::failed(e)
            }
        }
    }

    async fn try_pack_album(
        &self,
        album_dir: &Path,
        output_dir: &Path,
        detail: Option<&AlbumDetail>,
    ) -> Result<PackResult> {
        if !album_dir.is_dir() {
            return Err(Error::NotFound(format!(
                "Album directory does not exist: {:?}",
                album_dir
            )));
        }

        let mut metadata = load_metadata(album_dir, &self.metadata_file_name).await;
        if let Some(detail) = detail {
            metadata = merge_detail(metadata, detail);
        }

        let series_name = sanitize_series_name(&metadata.name);
        let series_dir = output_dir.join(&series_name);

        let collector = Collector::new(album_dir);
        let chapters = collector.collect_chapters(Some(&metadata)).await?;

        if chapters.len() > 1 {
            info!(
                "Multi-chapter album {:?}: {} chapters",
                series_name,
                chapters.len()
            );
            Ok(self
                .pack_chapters(&chapters, &metadata, &series_dir, &series_name)
                .await)
        } else {
            info!("Single-chapter album {:?}", series_name);
            self.pack_flat(&collector, album_dir, &metadata, &series_dir, &series_name)
                .await
        }
    }

    async fn pack_flat(
        &self,
        collector: &Collector<'_>,
        album_dir: &Path,
        metadata: &AlbumMetadata,
        series_dir: &Path,
        series_name: &str,
    ) -> Result<PackResult> {
        let pages = collector.collect_all_pages().await?;
        if pages.is_empty() {
            return Err(Error::NoImagesFound(album_dir.to_path_buf()));
        }

        let document = generate_comic_info(&with_chapter(metadata, 1, 1));
        let target = series_dir.join(archive_file_name(series_name, 1));
        let outcome = write_archive(&pages, &document, &target, self.archive_options()).await?;

        info!("Packed {:?} ({} pages)", outcome.path(), pages.len());
        Ok(PackResult {
            archives: vec![outcome.into_path()],
            errors: Vec::new(),
        })
    }

    async fn pack_chapters(
        &self,
        chapters: &[ChapterCandidate],
        metadata: &AlbumMetadata,
        series_dir: &Path,
        series_name: &str,
    ) -> PackResult {
        let total_chapters = chapters.len();
        let mut result = PackResult::default();

        for (position, chapter) in chapters.iter().enumerate() {
            let chapter_number = position + 1;

            let pages = match Collector::collect_pages(&chapter.dir).await {
                Ok(pages) if pages.is_empty() => {
                    warn!("Chapter has no images, skipping: {:?}", chapter.dir);
                    result.errors.push(Error::EmptyChapter(chapter.dir.clone()));
                    continue;
                }
                Ok(pages) => pages,
                Err(e) => {
                    warn!("Cannot read chapter {:?}: {}", chapter.dir, e);
                    result.errors.push(e);
                    continue;
                }
            };

            let document =
                generate_comic_info(&with_chapter(metadata, chapter_number, total_chapters));
            let target = series_dir.join(archive_file_name(series_name, chapter_number));

            match write_archive(&pages, &document, &target, self.archive_options()).await {
                Ok(outcome) => {
                    info!(
                        "Chapter {}/{}: {:?} ({} pages)",
                        chapter_number,
                        total_chapters,
                        outcome.path(),
                        pages.len()
                    );
                    result.archives.push(outcome.into_path());
                }
                Err(e) => result.errors.push(e),
            }
        }
        result
    }

    /// Locates an album under `source_dir` from its fetched detail and packs it.
    ///
    /// See [`resolve_album_dir`] for the search order. When no directory is
    /// found the result carries [`Error::AlbumDirNotFound`] and no archives.
    pub async fn pack_from_detail(
        &self,
        detail: &AlbumDetail,
        source_dir: &Path,
        output_dir: &Path,
    ) -> PackResult {
        match resolve_album_dir(source_dir, detail, &self.metadata_file_name).await {
            Ok(resolved) => self.pack_album(&resolved.path, output_dir, Some(detail)).await,
            Err(e) => PackResult::failed(e),
        }
    }

    /// Packs every album directory under `source_dir`, one after another in
    /// name order.
    ///
    /// An album counts as a success when at least one archive was produced
    /// for it. A failing album never stops the batch.
    pub async fn pack_many(&self, source_dir: &Path, output_dir: &Path) -> BatchStats {
        let mut album_dirs: Vec<PathBuf> = match Collector::collect_entries(source_dir, true).await
        {
            Ok(dirs) => dirs,
            Err(e) => {
                error!("Cannot list source directory {:?}: {}", source_dir, e);
                return BatchStats::default();
            }
        };
        album_dirs.par_sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        let mut stats = BatchStats {
            total: album_dirs.len(),
            ..Default::default()
        };

        for album_dir in &album_dirs {
            let result = self.pack_album(album_dir, output_dir, None).await;
            if result.is_success() {
                stats.success += 1;
            } else {
                stats.failed += 1;
            }
        }

        info!(
            "Batch finished: {} succeeded, {} failed, {} total",
            stats.success, stats.failed, stats.total
        );
        stats
    }
}

impl PackerBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(level) = self.compress_level {
            if level > 9 {
                return Err("Compression level must be between 0 and 9.".to_string());
            }
        }
        if let Some(name) = &self.metadata_file_name {
            if name.trim().is_empty() {
                return Err("Metadata file name must not be empty.".to_string());
            }
        }
        Ok(())
    }
}

/// Packs one album with the given settings.
pub async fn pack_album(
    album_dir: &Path,
    output_dir: &Path,
    overwrite: bool,
    compress_level: u8,
) -> Result<PackResult> {
    let packer = Packer::builder()
        .overwrite(overwrite)
        .compress_level(compress_level)
        .build()?;
    Ok(packer.pack_album(album_dir, output_dir, None).await)
}

/// Packs every album under `source_dir` with the given settings.
pub async fn pack_albums(
    source_dir: &Path,
    output_dir: &Path,
    overwrite: bool,
    compress_level: u8,
) -> Result<BatchStats> {
    let packer = Packer::builder()
        .overwrite(overwrite)
        .compress_level(compress_level)
        .build()?;
    Ok(packer.pack_many(source_dir, output_dir).await)
}
