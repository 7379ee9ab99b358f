//! Records a source hands to the host, plus the assembled [Book] written by the output formats.
//!
//! Every record is built fresh from one fetched page. Field names serialize in camelCase so
//! hosts consuming JSON see `releaseTime` and `chapterNumber`.

use serde::{Deserialize, Serialize};

/// Publication status shown on a novel page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NovelStatus {
    Ongoing,
    Completed,
}

/// One card in a listing or search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NovelSummary {
    pub name: String,
    /// Cover image URL, or the default cover when the card has none.
    pub cover: String,
    /// Site-relative path of the novel page (base URL stripped).
    pub path: String,
}

/// Chapter entry from a novel page's chapter list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterRef {
    pub name: String,
    /// Site-relative path of the chapter page.
    pub path: String,
    /// Release date text as published by the site; empty when absent.
    pub release_time: String,
    /// 1-based position in document order.
    pub chapter_number: u32,
}

/// Full novel page: identity, metadata and chapter list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NovelDetail {
    pub path: String,
    pub name: String,
    pub cover: String,
    pub author: String,
    /// Genre labels joined with ", ".
    pub genres: String,
    pub status: NovelStatus,
    pub summary: String,
    pub chapters: Vec<ChapterRef>,
}

/// A downloaded novel: metadata plus chapter bodies, in chapter order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub title: String,
    pub author: String,
    pub genres: String,
    pub status: NovelStatus,
    pub summary: String,
    pub cover: String,
    /// Absolute URL of the novel page.
    pub source_url: String,
    pub chapters: Vec<Chapter>,
}

impl Book {
    /// Start a book from a novel page; chapters are appended as they are fetched.
    pub fn from_detail(detail: &NovelDetail, source_url: String) -> Self {
        Self {
            title: detail.name.clone(),
            author: detail.author.clone(),
            genres: detail.genres.clone(),
            status: detail.status,
            summary: detail.summary.clone(),
            cover: detail.cover.clone(),
            source_url,
            chapters: Vec::with_capacity(detail.chapters.len()),
        }
    }
}

/// One downloaded chapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub title: String,
    /// 1-based chapter number from the novel page.
    pub number: u32,
    pub release_time: String,
    /// Inner HTML of the chapter container.
    pub body: String,
}
