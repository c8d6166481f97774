//! Common test utilities and constants for the comicpack crate.
//!
//! Provides functions for setting up test directories, creating dummy page
//! files and metadata sidecars, and inspecting generated archives.

use rand::{Rng, distributions::Alphanumeric};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

#[allow(dead_code)]
pub const TEST_TMP_DIR: &str = "tests/tmp";
#[allow(dead_code)]
pub const LONG_TEST_TIMEOUT: Duration = Duration::from_secs(60); // For whole-library batch runs

/// A unique scratch area holding an input `source` and an output `target` directory.
#[allow(dead_code)]
pub struct TestDirs {
    pub test_dir: PathBuf,
    pub source_dir: PathBuf,
    pub target_dir: PathBuf,
}

/// Helper function to create a clean test directory with source and target subdirectories.
#[allow(dead_code)]
pub async fn setup_test_dirs(sub_path: &str) -> TestDirs {
    let rand_string: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    let unique_sub_path = format!("{}-{}", sub_path, rand_string);
    let test_dir = PathBuf::from(TEST_TMP_DIR).join(unique_sub_path);
    if test_dir.exists() {
        fs::remove_dir_all(&test_dir).await.unwrap();
    }
    let source_dir = test_dir.join("source");
    let target_dir = test_dir.join("target");

    fs::create_dir_all(&source_dir).await.unwrap();
    fs::create_dir_all(&target_dir).await.unwrap();

    TestDirs {
        test_dir,
        source_dir,
        target_dir,
    }
}

/// Writes a small stand-in page. The content is the page's own path, so
/// tests can tell pages apart after they have been renamed in an archive.
#[allow(dead_code)]
pub async fn create_dummy_image(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.unwrap();
    }
    fs::write(path, path.to_string_lossy().as_bytes())
        .await
        .unwrap();
}

/// Creates `dir` and fills it with the named pages.
#[allow(dead_code)]
pub async fn create_pages(dir: &Path, names: &[&str]) {
    for name in names {
        create_dummy_image(&dir.join(name)).await;
    }
}

/// Writes a `metadata.json` sidecar into an album directory.
#[allow(dead_code)]
pub async fn write_metadata(album_dir: &Path, json: &str) {
    fs::create_dir_all(album_dir).await.unwrap();
    fs::write(album_dir.join("metadata.json"), json).await.unwrap();
}

/// Names of all entries of a ZIP file, in archive order.
#[allow(dead_code)]
pub fn archive_entry_names(path: &Path) -> Vec<String> {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

/// Reads one entry of a ZIP file as raw bytes.
#[allow(dead_code)]
pub fn read_archive_entry(path: &Path, name: &str) -> Vec<u8> {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut content = Vec::new();
    entry.read_to_end(&mut content).unwrap();
    content
}

/// Reads the ComicInfo.xml from a CBZ file and returns its content.
#[allow(dead_code)]
pub fn get_comic_info_xml(cbz_path: &Path) -> String {
    String::from_utf8(read_archive_entry(cbz_path, "ComicInfo.xml")).unwrap()
}

/// Checks if a ZIP file exists and contains at least one entry.
#[allow(dead_code)]
pub fn assert_valid_zip_file(path: &Path) {
    assert!(path.exists(), "Output ZIP file does not exist: {:?}", path);
    assert!(path.is_file(), "Output ZIP path is not a file: {:?}", path);
    assert!(
        !archive_entry_names(path).is_empty(),
        "Output ZIP file is empty: {:?}",
        path
    );
}
