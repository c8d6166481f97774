//! Path and file name utilities.
//!
//! Natural ordering of page file names, lossy name extraction, and the
//! sanitizers that turn album titles into directory and archive names.

use lazy_static::lazy_static;
use regex::Regex;
use std::cmp::Ordering;
use std::path::Path;

/// Maximum length, in characters, of a sanitized series name.
pub const SERIES_NAME_MAX_CHARS: usize = 50;

lazy_static! {
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// One run of a natural sort key: either a digit run or the text between digit runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NaturalChunk {
    /// Lower-cased non-digit text.
    Text(String),
    /// A digit run with its leading zeros removed.
    Number(String),
}

impl Ord for NaturalChunk {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (NaturalChunk::Number(a), NaturalChunk::Number(b)) => {
                a.len().cmp(&b.len()).then_with(|| a.cmp(b))
            }
            (NaturalChunk::Text(a), NaturalChunk::Text(b)) => a.cmp(b),
            (NaturalChunk::Number(_), NaturalChunk::Text(_)) => Ordering::Less,
            (NaturalChunk::Text(_), NaturalChunk::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for NaturalChunk {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Splits a file name into alternating text and digit runs.
///
/// The key always starts with a (possibly empty) text run, so runs at the
/// same position are of the same kind when two keys are compared.
/// Digit runs compare by numeric value of arbitrary length, text runs
/// case-insensitively.
pub fn natural_sort_key(name: &str) -> Vec<NaturalChunk> {
    let mut key = Vec::new();
    let mut text = String::new();
    let mut digits = String::new();

    for c in name.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        if !digits.is_empty() {
            key.push(NaturalChunk::Text(std::mem::take(&mut text).to_lowercase()));
            key.push(number_chunk(&std::mem::take(&mut digits)));
        }
        text.push(c);
    }
    key.push(NaturalChunk::Text(text.to_lowercase()));
    if !digits.is_empty() {
        key.push(number_chunk(&digits));
        key.push(NaturalChunk::Text(String::new()));
    }
    key
}

fn number_chunk(digits: &str) -> NaturalChunk {
    let trimmed = digits.trim_start_matches('0');
    NaturalChunk::Number(if trimmed.is_empty() { "0" } else { trimmed }.to_string())
}

/// Compares two names in natural order, so that `p9.jpg` sorts before `p10.jpg`.
pub fn compare_natural(a: &str, b: &str) -> Ordering {
    natural_sort_key(a).cmp(&natural_sort_key(b))
}

/// Compares two paths in natural order of their file names.
pub fn compare_paths_natural(a: &Path, b: &Path) -> Ordering {
    compare_natural(&get_file_name_lossy(a), &get_file_name_lossy(b))
}

/// Gets the file name from a path with fallback to lossy conversion.
///
/// # Arguments
///
/// * `path` - The path to extract the file name from
///
/// # Returns
///
/// * `String` - The file name, using lossy conversion if necessary
pub fn get_file_name_lossy(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Converts a path to a string with fallback to lossy conversion.
pub fn path_to_string_lossy(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Checks if a filename starts with a dot (hidden file).
pub fn is_hidden_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

/// Sanitizes a filename by replacing invalid characters with safe alternatives.
///
/// # Arguments
///
/// * `filename` - The filename to sanitize
///
/// # Returns
///
/// * `String` - The sanitized filename
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | '"' | '|' | '?' | '*' => '-',
            ':' => '-',
            '/' | '\\' => '-',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Turns an album title into the name of its output series directory.
///
/// Illegal file system characters become `_`, whitespace runs collapse to a
/// single space, and the result is trimmed and cut to
/// [`SERIES_NAME_MAX_CHARS`] characters. A title with nothing left gets a
/// random `Unknown_xxxxxxxx` name instead.
pub fn sanitize_series_name(raw_name: &str) -> String {
    let collapsed = WHITESPACE_RUN.replace_all(raw_name, " ");
    let replaced: String = collapsed
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let clean: String = replaced
        .trim()
        .chars()
        .take(SERIES_NAME_MAX_CHARS)
        .collect::<String>()
        .trim_end()
        .to_string();

    if clean.is_empty() {
        format!("Unknown_{:08x}", rand::random::<u32>())
    } else {
        clean
    }
}

/// Replaces characters that are illegal in archive file names with `_`.
pub fn sanitize_archive_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' => '_',
            c => c,
        })
        .collect()
}
