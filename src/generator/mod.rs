//! Generator module provides the archive generator interface and its implementations.
//!
//! This module contains the common interface for archive generators, the CBZ
//! implementation, and the ComicInfo document they embed.

use crate::error::Result;
use crate::types::ImageEntry;
use async_trait::async_trait;
use std::path::Path;

pub mod cbz;
pub mod comic_info;

/// Common interface for all archive generators.
///
/// A generator owns its output file from `new` until `save`. Callers add the
/// metadata document first and then the pages in reading order.
#[async_trait]
pub trait Generator {
    /// Creates a new generator writing to `target_path`.
    ///
    /// # Parameters
    /// * `target_path` - Full path of the archive to create; missing parent directories are created
    /// * `compress_level` - 0 stores entries, 1-9 deflate them at that level
    ///
    /// # Returns
    /// * `Result<Self>` - A new generator instance or an error if creation fails
    fn new(target_path: &Path, compress_level: u8) -> Result<Self>
    where
        Self: Sized;

    /// Writes the metadata document entry.
    ///
    /// # Parameters
    /// * `document` - The rendered ComicInfo document
    ///
    /// # Returns
    /// * `Result<&mut Self>` - Self reference for method chaining, or an error if failed
    async fn set_metadata(&mut self, document: &str) -> Result<&mut Self>
    where
        Self: Sized;

    /// Adds a page under its sequential archive name.
    ///
    /// # Parameters
    /// * `page` - The numbered page to add
    ///
    /// # Returns
    /// * `Result<&mut Self>` - Self reference for method chaining, or an error if failed
    async fn add_page(&mut self, page: &ImageEntry) -> Result<&mut Self>
    where
        Self: Sized;

    /// Finalizes the archive and flushes it to disk.
    async fn save(self) -> Result<()>;
}
