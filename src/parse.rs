use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::document::{Document, Item};

/// Chapter markers look like `{-Chapter Title-}` and may sit anywhere inside a
/// block; the title is the trimmed capture.
static CHAPTER_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{-(.+?)-\}").expect("chapter marker regex"));

/// Image markers look like `[IMAGE: https://example.com/a.png]`; the keyword is
/// case-insensitive and the URL runs until whitespace or `]`.
static IMAGE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[IMAGE:\s*(https?://[^\s\]]+)\s*\]").expect("image marker regex"));

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("read book file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("book file is not valid UTF-8: {path}")]
    InvalidEncoding { path: PathBuf },
}

pub fn parse_file(path: &Path) -> Result<Document, ParseError> {
    let bytes = std::fs::read(path).map_err(|source| ParseError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8(bytes).map_err(|_| ParseError::InvalidEncoding {
        path: path.to_path_buf(),
    })?;
    Ok(parse(&text))
}

/// Parses raw text into a [`Document`]. Blank input yields an empty document;
/// anything else starts in the default "Introduction" chapter.
pub fn parse(text: &str) -> Document {
    let normalized = text.replace("\r\n", "\n");
    let normalized = normalized.trim();

    let mut document = Document::default();
    if normalized.is_empty() {
        return document;
    }

    document.chapter_mut("Introduction");
    let mut current_chapter = "Introduction".to_owned();

    // Paragraph granularity: blocks separated by a blank line.
    for block in normalized.split("\n\n") {
        let block = block.trim();
        if block.is_empty() {
            continue;
        }

        // Chapter wins when a block matches both marker patterns. Both are
        // searches, so surrounding whitespace never hides a marker.
        if let Some(captures) = CHAPTER_MARKER.captures(block) {
            current_chapter = captures[1].trim().to_owned();
            document.chapter_mut(&current_chapter);
            continue;
        }

        if let Some(captures) = IMAGE_MARKER.captures(block) {
            document.chapter_mut(&current_chapter).items.push(Item::Image {
                url: captures[1].to_owned(),
            });
            continue;
        }

        document.chapter_mut(&current_chapter).items.push(Item::Text {
            content: block.to_owned(),
        });
    }

    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Chapter;

    fn text(content: &str) -> Item {
        Item::Text {
            content: content.to_owned(),
        }
    }

    fn image(url: &str) -> Item {
        Item::Image {
            url: url.to_owned(),
        }
    }

    #[test]
    fn blank_input_parses_to_empty_document() {
        assert!(parse("").is_empty());
        assert!(parse("  \r\n \n ").is_empty());
    }

    #[test]
    fn paragraphs_before_first_marker_attach_to_introduction() {
        let document = parse("First paragraph.\n\nSecond paragraph.");
        assert_eq!(
            document.chapters,
            vec![Chapter {
                title: "Introduction".to_owned(),
                items: vec![text("First paragraph."), text("Second paragraph.")],
            }]
        );
    }

    #[test]
    fn chapter_marker_switches_chapter_and_emits_no_item() {
        let document = parse("{-Ch1-}\n\nHello world\n\n[IMAGE: https://x.com/a.png]");
        assert_eq!(
            document.chapters,
            vec![
                Chapter {
                    title: "Introduction".to_owned(),
                    items: vec![],
                },
                Chapter {
                    title: "Ch1".to_owned(),
                    items: vec![text("Hello world"), image("https://x.com/a.png")],
                },
            ]
        );
    }

    #[test]
    fn chapter_marker_is_found_by_search_and_title_is_trimmed() {
        let document = parse("   {-  Spaced Title  -}   \n\nBody.");
        assert_eq!(document.chapters[1].title, "Spaced Title");
        assert_eq!(document.chapters[1].items, vec![text("Body.")]);
    }

    #[test]
    fn chapter_reentry_appends_to_existing_sequence() {
        let document = parse(
            "{-One-}\n\nfirst\n\n{-Two-}\n\nmiddle\n\n{-One-}\n\nsecond",
        );
        let titles = document
            .chapters
            .iter()
            .map(|c| c.title.as_str())
            .collect::<Vec<_>>();
        assert_eq!(titles, ["Introduction", "One", "Two"]);
        assert_eq!(
            document.chapters[1].items,
            vec![text("first"), text("second")]
        );
    }

    #[test]
    fn chapter_beats_image_when_both_match() {
        let document = parse("{-Gallery-} [IMAGE: https://x.com/a.png]");
        assert_eq!(document.chapters[1].title, "Gallery");
        assert!(document.chapters[1].items.is_empty());
    }

    #[test]
    fn image_marker_keyword_is_case_insensitive() {
        let document = parse("[image: HTTPS://x.com/A.png]");
        assert_eq!(
            document.chapters[0].items,
            vec![image("HTTPS://x.com/A.png")]
        );
    }

    #[test]
    fn malformed_image_url_falls_through_to_text() {
        let document = parse("[IMAGE: ftp://x.com/a.png]");
        assert_eq!(
            document.chapters[0].items,
            vec![text("[IMAGE: ftp://x.com/a.png]")]
        );
    }

    #[test]
    fn internal_single_line_breaks_are_preserved() {
        let document = parse("line one\nline two\n\nnext block");
        assert_eq!(
            document.chapters[0].items,
            vec![text("line one\nline two"), text("next block")]
        );
    }

    #[test]
    fn crlf_input_is_normalized() {
        let document = parse("{-Ch1-}\r\n\r\nHello\r\nthere");
        assert_eq!(document.chapters[1].items, vec![text("Hello\nthere")]);
    }

    #[test]
    fn parse_file_reports_missing_file() {
        let err = parse_file(Path::new("/nonexistent/book.txt")).unwrap_err();
        assert!(matches!(err, ParseError::Read { .. }));
    }
}
