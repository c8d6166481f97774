//! ComicInfo.xml rendering.
//!
//! The document is a pure function of the merged album metadata and the
//! chapter position stamped onto it. Elements whose source value is empty
//! are left out rather than written blank.

use crate::types::AlbumMetadata;

/// Name of the metadata entry inside every archive.
pub const COMIC_INFO_FILE_NAME: &str = "ComicInfo.xml";

const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

const MANGA_ORIENTATION: &str = "YesAndRightToLeft";
const LANGUAGE_ISO: &str = "zh";
const FORMAT: &str = "CBZ";
const FILE_TYPE: &str = "WebP";
const PUBLISHER: &str = "JMComic";
const IMPRINT: &str = "禁漫天堂";
const UNKNOWN_TITLE: &str = "Unknown";

// Helper function to escape XML characters
fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

fn joined(values: &[String]) -> Option<String> {
    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}

/// Year taken from the first four characters of a date string, if all digits.
pub fn publication_year(pub_date: &str) -> Option<String> {
    let chars: Vec<char> = pub_date.trim().chars().collect();
    let year: String = chars.get(..4)?.iter().collect();
    is_digits(&year).then_some(year)
}

/// Month taken from characters 5 and 6 of a date string, if digits within 1-12.
pub fn publication_month(pub_date: &str) -> Option<String> {
    let chars: Vec<char> = pub_date.trim().chars().collect();
    let month: String = chars.get(5..7)?.iter().collect();
    if !is_digits(&month) {
        return None;
    }
    let value: u32 = month.parse().ok()?;
    (1..=12).contains(&value).then_some(month)
}

/// Space-joined statistics for the `Comments` element, if any apply.
fn comments(metadata: &AlbumMetadata) -> Option<String> {
    let mut parts = Vec::new();
    if !metadata.id.is_empty() {
        parts.push(format!("JMComic Album ID: {}", metadata.id));
    }
    if !metadata.likes.is_empty() {
        parts.push(format!("Likes: {}", metadata.likes));
    }
    if !metadata.views.is_empty() {
        parts.push(format!("Views: {}", metadata.views));
    }
    if is_digits(&metadata.comment_count) {
        parts.push(format!("Comments: {}", metadata.comment_count));
    }
    (!parts.is_empty()).then(|| parts.join(" "))
}

/// Collects the ComicInfo elements, in document order, for one chapter.
pub fn comic_info_elements(metadata: &AlbumMetadata) -> Vec<(&'static str, String)> {
    let title = match metadata.name.trim() {
        "" => UNKNOWN_TITLE,
        name => name,
    };
    let chapter_number = metadata.chapter_number;

    let mut elements: Vec<(&'static str, String)> = vec![
        ("Series", title.to_string()),
        ("Title", format!("{} - Ch.{}", title, chapter_number)),
        ("Manga", MANGA_ORIENTATION.to_string()),
        ("Number", chapter_number.to_string()),
        ("Volume", "1".to_string()),
    ];
    if metadata.total_chapters > 1 {
        elements.push(("Count", metadata.total_chapters.to_string()));
    }

    let page_count = metadata.page_count.trim();
    if is_digits(page_count) {
        elements.push(("PageCount", page_count.to_string()));
    }

    if let Some(authors) = joined(&metadata.authors) {
        elements.push(("Writer", authors.clone()));
        elements.push(("Artist", authors));
    }
    if let Some(actors) = joined(&metadata.actors) {
        elements.push(("Characters", actors));
    }
    if let Some(tags) = joined(&metadata.tags) {
        elements.push(("Genre", tags));
    }
    if let Some(works) = joined(&metadata.works) {
        elements.push(("SeriesGroup", works));
    }

    let description = metadata.description.trim();
    if !description.is_empty() {
        elements.push(("Summary", description.to_string()));
    }

    if let Some(year) = publication_year(&metadata.pub_date) {
        elements.push(("Year", year));
    }
    if let Some(month) = publication_month(&metadata.pub_date) {
        elements.push(("Month", month));
    }

    elements.push(("LanguageISO", LANGUAGE_ISO.to_string()));
    elements.push(("Format", FORMAT.to_string()));
    elements.push(("FileType", FILE_TYPE.to_string()));
    elements.push(("Publisher", PUBLISHER.to_string()));
    elements.push(("Imprint", IMPRINT.to_string()));

    if let Some(comments) = comments(metadata) {
        elements.push(("Comments", comments));
    }
    elements
}

/// Renders the ComicInfo document for one chapter.
///
/// Output is UTF-8 without an XML declaration, one element per line,
/// indented by two spaces.
pub fn generate_comic_info(metadata: &AlbumMetadata) -> String {
    let mut xml = format!(
        "<ComicInfo xmlns:xsi=\"{}\" xmlns:xsd=\"{}\">\n",
        XSI_NAMESPACE, XSD_NAMESPACE
    );
    for (name, value) in comic_info_elements(metadata) {
        xml.push_str(&format!("  <{name}>{}</{name}>\n", escape_xml(&value)));
    }
    xml.push_str("</ComicInfo>");
    xml
}
