//! comicpack - Comic Archive Assembly Library
//!
//! This crate turns directory trees of downloaded comic pages into
//! CBZ archives that comic servers such as Kavita can index: ordered,
//! sequentially renamed images plus a `ComicInfo.xml` document built from the
//! album's `metadata.json` sidecar.
//!
//! # Getting Started
//!
//! Build a [`Packer`] with its builder and point it at an album directory or
//! at a root holding many albums.
//!
//! ```rust,no_run
//! use comicpack::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> comicpack::error::Result<()> {
//!     let packer = Packer::builder()
//!         .overwrite(true)
//!         .compress_level(1u8)
//!         .build()?;
//!
//!     // One album: a flat folder of pages, or one subfolder per chapter
//!     let result = packer
//!         .pack_album(Path::new("./downloads/350234"), Path::new("./kavita"), None)
//!         .await;
//!     for archive in &result.archives {
//!         println!("Wrote {}", archive.display());
//!     }
//!
//!     // Every album below a download root
//!     let stats = packer
//!         .pack_many(Path::new("./downloads"), Path::new("./kavita"))
//!         .await;
//!     println!("{}/{} albums packed", stats.success, stats.total);
//!
//!     Ok(())
//! }
//! ```
//!
//! Chapter ordering, metadata merging and the ComicInfo mapping live in
//! [`collector`], [`metadata`] and [`generator::comic_info`]; each exposes its
//! pure building blocks for direct use.

pub mod collector;
pub mod error;
pub mod generator;
pub mod locator;
pub mod metadata;
pub mod packer;
pub mod path_utils;
pub mod types;

// Publicly expose the main `Packer` struct and its builder
pub use packer::{Packer, PackerBuilder, pack_album, pack_albums};

// Re-export core types for direct access
pub use types::{
    AlbumDetail, AlbumMetadata, BatchStats, ChapterCandidate, Episode, ImageEntry, PackResult,
};

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types, allowing you to
/// import everything you need with a single `use comicpack::prelude::*;` statement.
pub mod prelude {
    pub use super::{
        AlbumDetail, AlbumMetadata, BatchStats, ChapterCandidate, Episode, ImageEntry, PackResult,
        Packer, PackerBuilder, error, generator, pack_album, pack_albums, types,
    };
    pub use crate::collector::Collector;
    pub use crate::locator::{ResolutionStrategy, resolve_album_dir};
    pub use std::path::{Path, PathBuf};
}
