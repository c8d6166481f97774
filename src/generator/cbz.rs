use crate::error::{Error, Result};
use crate::generator::Generator;
use crate::generator::comic_info::COMIC_INFO_FILE_NAME;
use crate::path_utils::path_to_string_lossy;
use crate::types::ImageEntry;
use async_trait::async_trait;
use log::{error, info};
use memmap2::MmapOptions;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::task::spawn_blocking;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Settings that apply to every archive written in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveOptions {
    /// Replace an existing archive at the target path.
    pub overwrite: bool,
    /// 0 stores entries uncompressed, 1-9 deflate them at that level.
    pub compress_level: u8,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            overwrite: true,
            compress_level: 1,
        }
    }
}

/// What happened at the target path of one archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveOutcome {
    /// A fresh archive was written.
    Written(PathBuf),
    /// An archive already existed and overwriting is disabled; it was left untouched.
    Skipped(PathBuf),
}

impl ArchiveOutcome {
    pub fn path(&self) -> &Path {
        match self {
            ArchiveOutcome::Written(path) | ArchiveOutcome::Skipped(path) => path,
        }
    }

    pub fn into_path(self) -> PathBuf {
        match self {
            ArchiveOutcome::Written(path) | ArchiveOutcome::Skipped(path) => path,
        }
    }
}

/// A generator for creating CBZ (Comic Book ZIP) files.
///
/// This struct implements the `Generator` trait to package images into
/// a CBZ archive led by a ComicInfo.xml entry.
pub struct Cbz {
    zip: Option<ZipWriter<File>>,
    options: SimpleFileOptions,
    page_count: usize,
}

impl Cbz {
    /// Number of pages added so far.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    fn zip_mut(&mut self) -> Result<&mut ZipWriter<File>> {
        self.zip
            .as_mut()
            .ok_or_else(|| Error::Unsupported("Zip writer not available".to_string()))
    }
}

/// Builds the per-entry options for a compression level.
pub fn entry_options(compress_level: u8) -> SimpleFileOptions {
    let options = SimpleFileOptions::default().unix_permissions(0o644);
    if compress_level == 0 {
        options.compression_method(CompressionMethod::Stored)
    } else {
        options
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(i64::from(compress_level.min(9))))
    }
}

#[async_trait]
impl Generator for Cbz {
    fn new(target_path: &Path, compress_level: u8) -> Result<Self> {
        if let Some(parent) = target_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(target_path)?;
        let zip = ZipWriter::new(file);

        Ok(Cbz {
            zip: Some(zip),
            options: entry_options(compress_level),
            page_count: 0,
        })
    }

    async fn set_metadata(&mut self, document: &str) -> Result<&mut Self> {
        let options = self.options;
        let zip = self.zip_mut()?;

        zip.start_file(COMIC_INFO_FILE_NAME, options)?;
        zip.write_all(document.as_bytes())?;

        Ok(self)
    }

    async fn add_page(&mut self, page: &ImageEntry) -> Result<&mut Self> {
        let file = fs::File::open(&page.path).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to open image file '{}': {}",
                    path_to_string_lossy(&page.path),
                    e
                ),
            ))
        })?;
        let file_std = file.into_std().await;

        // Mapping a zero-length file fails, so empty pages are read as empty.
        let mmap = spawn_blocking(move || -> std::io::Result<_> {
            if file_std.metadata()?.len() == 0 {
                return Ok(None);
            }
            unsafe { MmapOptions::new().map(&file_std) }.map(Some)
        })
        .await??;

        let options = self.options;
        let zip = self.zip_mut()?;
        zip.start_file(page.archive_name(), options)?;
        if let Some(mmap) = mmap {
            zip.write_all(&mmap[..])?;
        }

        self.page_count += 1;

        Ok(self)
    }

    async fn save(mut self) -> Result<()> {
        let zip = self
            .zip
            .take()
            .ok_or_else(|| Error::Unsupported("Zip writer not available".to_string()))?;

        // Finish writing the zip file in a blocking task
        spawn_blocking(move || zip.finish().map(|_| ()).map_err(Error::Zip)).await??;

        Ok(())
    }
}

async fn build_archive(
    pages: &[ImageEntry],
    document: &str,
    target: &Path,
    compress_level: u8,
) -> Result<()> {
    let mut cbz = Cbz::new(target, compress_level)?;
    cbz.set_metadata(document).await?;
    for page in pages {
        cbz.add_page(page).await?;
    }
    cbz.save().await
}

/// Writes one CBZ archive: the ComicInfo document first, then every page
/// renamed to its dense 3-digit sequence number.
///
/// An existing archive is left untouched when overwriting is disabled. If
/// anything fails mid-write the partial file is removed and the failure is
/// reported as [`Error::WriteFailure`].
pub async fn write_archive(
    pages: &[PathBuf],
    document: &str,
    target: &Path,
    options: ArchiveOptions,
) -> Result<ArchiveOutcome> {
    if target.is_file() && !options.overwrite {
        info!("Archive already exists, skipping: {:?}", target);
        return Ok(ArchiveOutcome::Skipped(target.to_path_buf()));
    }

    let entries = ImageEntry::sequence(pages).map_err(|e| Error::WriteFailure {
        path: target.to_path_buf(),
        source: Box::new(e),
    })?;

    match build_archive(&entries, document, target, options.compress_level).await {
        Ok(()) => Ok(ArchiveOutcome::Written(target.to_path_buf())),
        Err(e) => {
            error!("Failed to write {:?}: {}", target, e);
            if target.is_file() {
                if let Err(remove_err) = fs::remove_file(target).await {
                    error!(
                        "Failed to remove partial archive {:?}: {}",
                        target, remove_err
                    );
                }
            }
            Err(Error::WriteFailure {
                path: target.to_path_buf(),
                source: Box::new(e),
            })
        }
    }
}
