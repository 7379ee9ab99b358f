//! Source adapters and the contract the host uses to drive them.
//!
//! A [Source] turns host requests (listing, search, novel, chapter, image) into one fetch through
//! a [Fetch] collaborator followed by HTML extraction. Adapters keep no state between calls.

mod client;
mod error;

pub mod fwo;

pub use client::{PoliteClient, PoliteClientBuilder};
pub use error::SourceError;

use crate::filters::Filters;
use crate::model::{NovelDetail, NovelSummary};
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

/// Network side of a source: page text and file downloads.
pub trait Fetch {
    /// GET `url` and return the response body.
    fn fetch_text(&mut self, url: &str) -> Result<String, SourceError>;

    /// Download `url` and return a local reference to it, or `None` if the fetcher declines.
    fn fetch_file(&mut self, url: &str) -> Result<Option<String>, SourceError>;
}

/// Static identity of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    pub site: &'static str,
    pub version: &'static str,
}

/// Capability set every source adapter implements.
pub trait Source {
    fn info(&self) -> SourceInfo;

    /// Base URL requests are built against (usually `info().site`).
    fn site(&self) -> &str;

    /// Declared filter schema with default values.
    fn filters(&self) -> Filters;

    fn popular_novels(
        &mut self,
        page: u32,
        filters: &Filters,
    ) -> Result<Vec<NovelSummary>, SourceError>;

    fn search_novels(&mut self, term: &str, page: u32)
        -> Result<Vec<NovelSummary>, SourceError>;

    fn parse_novel(&mut self, path: &str) -> Result<NovelDetail, SourceError>;

    /// Chapter body as inner HTML.
    fn parse_chapter(&mut self, path: &str) -> Result<String, SourceError>;

    fn fetch_image(&mut self, url: &str) -> Result<Option<String>, SourceError>;
}

/// Parse a CSS selector or return an error (avoids panics from Selector::parse).
pub(crate) fn parse_selector(sel: &str) -> Result<Selector, SourceError> {
    Selector::parse(sel).map_err(|e| SourceError::Selector {
        selector: sel.to_string(),
        message: e.to_string(),
    })
}

/// Remove the first occurrence of the site prefix from a link.
pub fn strip_site(link: &str, site: &str) -> String {
    if site.is_empty() {
        return link.to_string();
    }
    link.replacen(site, "", 1)
}

/// Concatenated text of every match under `scope`, trimmed.
pub(crate) fn select_text(scope: ElementRef<'_>, selector: &Selector) -> String {
    scope
        .select(selector)
        .flat_map(|e| e.text())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Concatenated text of every match in the document, trimmed.
pub(crate) fn document_text(doc: &Html, selector: &Selector) -> String {
    select_text(doc.root_element(), selector)
}

/// Attribute of the first match under `scope`, if present and non-empty.
pub(crate) fn select_attr(scope: ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    scope
        .select(selector)
        .next()
        .and_then(|e| e.value().attr(attr))
        .filter(|s| !s.is_empty())
        .map(String::from)
}
