//! Output formats: JSON, HTML, Markdown, and plain text.
//! Renders single chapter bodies and writes a downloaded [Book] to one file.

use crate::model::{Book, NovelStatus};
use scraper::{Html, Node};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Elements that start a new line in plain-text output.
const BLOCK_TAGS: [&str; 12] = [
    "p", "div", "br", "li", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "hr",
];

/// Output format selector for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Html,
    Markdown,
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Html => "html",
            OutputFormat::Markdown => "md",
            OutputFormat::Text => "txt",
        }
    }
}

/// Errors from the format writers.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Cannot write: book title is empty.")]
    EmptyTitle,

    #[error("Failed to write output: {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write output: {0}")]
    Write(#[from] std::io::Error),

    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn validate_book(book: &Book) -> Result<(), FormatError> {
    if book.title.trim().is_empty() {
        return Err(FormatError::EmptyTitle);
    }
    Ok(())
}

pub(crate) fn html_escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Strip HTML from chapter body to plain text, one line per block.
pub(crate) fn body_to_plain_text(body: &str) -> String {
    let fragment = Html::parse_fragment(body);
    let mut raw = String::with_capacity(body.len());
    for node in fragment.root_element().descendants() {
        match node.value() {
            Node::Text(t) => raw.push_str(t),
            Node::Element(e) if BLOCK_TAGS.contains(&e.name()) => raw.push('\n'),
            _ => {}
        }
    }
    let text = raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    if text.is_empty() {
        body.trim().to_string()
    } else {
        text
    }
}

fn status_label(status: NovelStatus) -> &'static str {
    match status {
        NovelStatus::Ongoing => "Ongoing",
        NovelStatus::Completed => "Completed",
    }
}

/// Render one chapter body (inner HTML) in the given format.
pub fn render_chapter(body: &str, format: OutputFormat) -> Result<String, FormatError> {
    Ok(match format {
        OutputFormat::Html => body.trim().to_string(),
        OutputFormat::Markdown => html2md::parse_html(body).trim().to_string(),
        OutputFormat::Text => body_to_plain_text(body),
        OutputFormat::Json => serde_json::to_string(body)?,
    })
}

/// Write the book to `path` in the given format.
pub fn write_book(book: &Book, path: &Path, format: OutputFormat) -> Result<(), FormatError> {
    validate_book(book)?;

    let file = File::create(path).map_err(|e| FormatError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut f = BufWriter::new(file);
    match format {
        OutputFormat::Json => serde_json::to_writer_pretty(&mut f, book)?,
        OutputFormat::Html => write_html(book, &mut f)?,
        OutputFormat::Markdown => write_markdown(book, &mut f)?,
        OutputFormat::Text => write_text(book, &mut f)?,
    }
    f.flush()?;
    Ok(())
}

fn write_html(book: &Book, f: &mut impl Write) -> Result<(), FormatError> {
    let title_esc = html_escape_attr(&book.title);

    writeln!(f, r#"<!DOCTYPE html>"#)?;
    writeln!(f, r#"<html lang="en">"#)?;
    writeln!(f, r#"<head>"#)?;
    writeln!(f, r#"  <meta charset="UTF-8"/>"#)?;
    writeln!(f, r#"  <title>{}</title>"#, title_esc)?;
    writeln!(f, r#"</head>"#)?;
    writeln!(f, r#"<body>"#)?;
    writeln!(f, r#"  <header>"#)?;
    writeln!(f, r#"    <h1>{}</h1>"#, title_esc)?;
    if !book.author.is_empty() {
        writeln!(f, r#"    <p class="author">By {}</p>"#, html_escape_attr(&book.author))?;
    }
    if !book.genres.is_empty() {
        writeln!(f, r#"    <p class="genres">{}</p>"#, html_escape_attr(&book.genres))?;
    }
    writeln!(f, r#"    <p class="status">{}</p>"#, status_label(book.status))?;
    if !book.summary.is_empty() {
        writeln!(f, r#"    <p class="summary">{}</p>"#, html_escape_attr(&book.summary))?;
    }
    writeln!(f, r#"  </header>"#)?;

    for ch in &book.chapters {
        writeln!(f, r#"  <section class="chapter" id="chapter-{}">"#, ch.number)?;
        writeln!(f, r#"    <h2>{}</h2>"#, html_escape_attr(&ch.title))?;
        writeln!(f, r#"    <div class="chapter-body">"#)?;
        f.write_all(ch.body.trim().as_bytes())?;
        writeln!(f)?;
        writeln!(f, r#"    </div>"#)?;
        writeln!(f, r#"  </section>"#)?;
    }

    writeln!(f, r#"</body>"#)?;
    writeln!(f, r#"</html>"#)?;
    Ok(())
}

fn write_markdown(book: &Book, f: &mut impl Write) -> Result<(), FormatError> {
    writeln!(f, "# {}", book.title)?;
    writeln!(f)?;
    if !book.author.is_empty() {
        writeln!(f, "By {}", book.author)?;
        writeln!(f)?;
    }
    if !book.genres.is_empty() {
        writeln!(f, "*{}* ({})", book.genres, status_label(book.status))?;
        writeln!(f)?;
    }
    if !book.summary.is_empty() {
        writeln!(f, "{}", book.summary)?;
        writeln!(f)?;
    }
    writeln!(f, "---")?;
    writeln!(f)?;

    for ch in &book.chapters {
        writeln!(f, "## {}", ch.title)?;
        writeln!(f)?;
        writeln!(f, "{}", html2md::parse_html(&ch.body).trim())?;
        writeln!(f)?;
    }
    Ok(())
}

fn write_text(book: &Book, f: &mut impl Write) -> Result<(), FormatError> {
    writeln!(f, "{}", book.title)?;
    if !book.author.is_empty() {
        writeln!(f, "By {}", book.author)?;
    }
    writeln!(f, "Status: {}", status_label(book.status))?;
    writeln!(f)?;
    if !book.summary.is_empty() {
        writeln!(f, "{}", book.summary)?;
        writeln!(f)?;
    }

    for ch in &book.chapters {
        writeln!(f)?;
        writeln!(f, "--- Chapter {}: {} ---", ch.number, ch.title)?;
        writeln!(f)?;
        writeln!(f, "{}", body_to_plain_text(&ch.body))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Chapter;

    fn minimal_book() -> Book {
        Book {
            title: "Test Book".to_string(),
            author: "Test Author".to_string(),
            genres: "Action, Drama".to_string(),
            status: NovelStatus::Completed,
            summary: "A test.".to_string(),
            cover: String::new(),
            source_url: "https://f-w-o.com/novel/test-book/".to_string(),
            chapters: vec![Chapter {
                title: "Chapter One".to_string(),
                number: 1,
                release_time: String::new(),
                body: "<p>First paragraph.</p><p>Second paragraph.</p>".to_string(),
            }],
        }
    }

    fn write_and_read(book: &Book, name: &str, format: OutputFormat) -> String {
        let path = std::env::temp_dir().join(name);
        write_book(book, &path, format).unwrap();
        let buf = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        buf
    }

    #[test]
    fn write_html_contains_title_and_chapter_heading() {
        let buf = write_and_read(&minimal_book(), "fwoscrape_test_html.html", OutputFormat::Html);
        assert!(buf.contains("<h1>Test Book</h1>"));
        assert!(buf.contains("<h2>Chapter One</h2>"));
        assert!(buf.contains("<p>First paragraph.</p>"));
        assert!(buf.contains("Completed"));
    }

    #[test]
    fn write_markdown_contains_headers_and_no_raw_p_tags() {
        let buf = write_and_read(&minimal_book(), "fwoscrape_test_md.md", OutputFormat::Markdown);
        assert!(buf.starts_with("# Test Book"));
        assert!(buf.contains("## Chapter One"));
        assert!(buf.contains("First paragraph"));
        assert!(!buf.contains("<p>"));
    }

    #[test]
    fn write_text_contains_chapter_title_and_no_html_tags() {
        let buf = write_and_read(&minimal_book(), "fwoscrape_test_txt.txt", OutputFormat::Text);
        assert!(buf.contains("Test Book"));
        assert!(buf.contains("Chapter 1: Chapter One"));
        assert!(buf.contains("First paragraph.\nSecond paragraph."));
        assert!(!buf.contains("<p>"));
    }

    #[test]
    fn write_json_round_trips_camel_case() {
        let buf = write_and_read(&minimal_book(), "fwoscrape_test_json.json", OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&buf).unwrap();
        assert_eq!(value["title"], "Test Book");
        assert_eq!(value["sourceUrl"], "https://f-w-o.com/novel/test-book/");
        assert_eq!(value["chapters"][0]["number"], 1);
    }

    #[test]
    fn validate_rejects_empty_title() {
        let mut book = minimal_book();
        book.title = "  ".to_string();
        let path = std::env::temp_dir().join("fwoscrape_test_empty_title.txt");
        assert!(matches!(
            write_book(&book, &path, OutputFormat::Text),
            Err(FormatError::EmptyTitle)
        ));
    }

    #[test]
    fn empty_author_is_allowed() {
        let mut book = minimal_book();
        book.author = String::new();
        let buf = write_and_read(&book, "fwoscrape_test_no_author.html", OutputFormat::Html);
        assert!(!buf.contains("class=\"author\""));
    }

    #[test]
    fn body_to_plain_text_multiple_p() {
        assert_eq!(
            body_to_plain_text("<p>One.</p>\n<p>Two.</p>"),
            "One.\nTwo."
        );
    }

    #[test]
    fn body_to_plain_text_whitespace_only_fallback() {
        assert_eq!(body_to_plain_text("   "), "");
    }

    #[test]
    fn render_chapter_formats() {
        let body = "\n<p>Hello <strong>there</strong>.</p>\n";
        assert_eq!(
            render_chapter(body, OutputFormat::Html).unwrap(),
            "<p>Hello <strong>there</strong>.</p>"
        );
        assert_eq!(
            render_chapter(body, OutputFormat::Text).unwrap(),
            "Hello there."
        );
        assert!(render_chapter(body, OutputFormat::Markdown)
            .unwrap()
            .contains("**there**"));
        assert_eq!(
            render_chapter("<p>a</p>", OutputFormat::Json).unwrap(),
            "\"<p>a</p>\""
        );
    }

    #[test]
    fn html_escape_attr_escapes_special_chars() {
        assert_eq!(
            html_escape_attr(r#"a & b < c > "d""#),
            "a &amp; b &lt; c &gt; &quot;d&quot;"
        );
    }

    #[test]
    fn extension_for_each_format() {
        assert_eq!(OutputFormat::Json.extension(), "json");
        assert_eq!(OutputFormat::Html.extension(), "html");
        assert_eq!(OutputFormat::Markdown.extension(), "md");
        assert_eq!(OutputFormat::Text.extension(), "txt");
    }
}
