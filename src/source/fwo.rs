//! F-W-O adapter (WordPress "wp-manga" theme). Listings, search, novel page with chapter list,
//! chapter body, and image delegation. One GET per operation.

use crate::filters::{FilterOption, FilterType, Filters, PickerFilter};
use crate::model::{ChapterRef, NovelDetail, NovelStatus, NovelSummary};
use crate::source::{
    document_text, parse_selector, select_attr, select_text, strip_site, Fetch, Source,
    SourceError, SourceInfo,
};
use scraper::Html;

pub const FWO_INFO: SourceInfo = SourceInfo {
    id: "fwo",
    name: "F-W-O",
    icon: "src/en/fwo/icon.png",
    site: "https://f-w-o.com",
    version: "1.0.0",
};

/// Cover used when a page has no image.
pub const DEFAULT_COVER: &str =
    "https://github.com/LNReader/lnreader-plugins/blob/main/icons/src/coverNotAvailable.webp?raw=true";

/// Status label the site uses for novels still in progress. Compared exactly.
const ONGOING_LABEL: &str = "OnGoing";

const GENRE_OPTIONS: [(&str, &str); 30] = [
    ("All", ""),
    ("Action", "action"),
    ("Adventure", "adventure"),
    ("Comedy", "comedy"),
    ("Drama", "drama"),
    ("Fantasy", "fantasy"),
    ("Harem", "harem"),
    ("Historical", "historical"),
    ("Horror", "horror"),
    ("Josei", "josei"),
    ("Martial Arts", "martial-arts"),
    ("Mature", "mature"),
    ("Mecha", "mecha"),
    ("Mystery", "mystery"),
    ("Psychological", "psychological"),
    ("Romance", "romance"),
    ("School Life", "school-life"),
    ("Sci-fi", "sci-fi"),
    ("Seinen", "seinen"),
    ("Shoujo", "shoujo"),
    ("Shounen", "shounen"),
    ("Slice of Life", "slice-of-life"),
    ("Sports", "sports"),
    ("Supernatural", "supernatural"),
    ("Tragedy", "tragedy"),
    ("Wuxia", "wuxia"),
    ("Xianxia", "xianxia"),
    ("Xuanhuan", "xuanhuan"),
    ("Yaoi", "yaoi"),
    ("Yuri", "yuri"),
];

/// F-W-O source. Holds the fetch collaborator and the base URL requests are built against.
pub struct FwoSource<'a> {
    client: &'a mut dyn Fetch,
    site: String,
}

impl<'a> FwoSource<'a> {
    pub fn new(client: &'a mut dyn Fetch) -> Self {
        Self::with_site(client, FWO_INFO.site)
    }

    /// Use a different base URL (mirror or test server). A trailing slash is dropped.
    pub fn with_site(client: &'a mut dyn Fetch, site: &str) -> Self {
        Self {
            client,
            site: site.trim_end_matches('/').to_string(),
        }
    }

    fn fetch_document(&mut self, url: &str) -> Result<Html, SourceError> {
        let body = self.client.fetch_text(url)?;
        Ok(Html::parse_document(&body))
    }
}

/// Genre picker declared to the host.
pub fn genre_filter() -> PickerFilter {
    PickerFilter {
        label: "Genre".to_string(),
        value: String::new(),
        options: GENRE_OPTIONS
            .iter()
            .map(|(label, value)| FilterOption::new(label, value))
            .collect(),
        kind: FilterType::Picker,
    }
}

fn popular_url(site: &str, page: u32, genre: &str) -> String {
    let mut url = format!("{}/page/{}/", site, page);
    if !genre.is_empty() {
        url.push_str("?genre=");
        url.push_str(genre);
    }
    url
}

fn search_url(site: &str, term: &str, page: u32) -> String {
    format!(
        "{}/page/{}/?s={}&post_type=wp-manga",
        site,
        page,
        urlencoding::encode(term)
    )
}

/// Novel cards in document order. Cards without a detail link are skipped.
fn parse_novels(doc: &Html, site: &str) -> Result<Vec<NovelSummary>, SourceError> {
    let card_sel = parse_selector(".page-item-detail")?;
    let title_sel = parse_selector(".post-title h3 a")?;
    let cover_sel = parse_selector(".item-thumb img")?;

    let novels = doc
        .select(&card_sel)
        .filter_map(|card| {
            let link = select_attr(card, &title_sel, "href")?;
            Some(NovelSummary {
                name: select_text(card, &title_sel),
                cover: select_attr(card, &cover_sel, "src")
                    .unwrap_or_else(|| DEFAULT_COVER.to_string()),
                path: strip_site(&link, site),
            })
        })
        .collect::<Vec<_>>();
    tracing::debug!(count = novels.len(), "parsed novel cards");
    Ok(novels)
}

fn parse_status(text: &str) -> NovelStatus {
    if text == ONGOING_LABEL {
        NovelStatus::Ongoing
    } else {
        NovelStatus::Completed
    }
}

/// Novel page metadata and chapter list. Chapter numbers follow document order.
fn parse_novel_page(doc: &Html, path: &str, site: &str) -> Result<NovelDetail, SourceError> {
    let title_sel = parse_selector(".post-title h1")?;
    let cover_sel = parse_selector(".summary_image img")?;
    let author_sel = parse_selector(".author-content a")?;
    let genre_sel = parse_selector(".genres-content a")?;
    let status_sel = parse_selector(".post-status .post-content_item")?;
    let summary_sel = parse_selector(".summary__content")?;
    let row_sel = parse_selector(".wp-manga-chapter")?;
    let link_sel = parse_selector("a")?;
    let release_sel = parse_selector(".chapter-release-date i")?;

    let root = doc.root_element();
    let genres = doc
        .select(&genre_sel)
        .map(|e| e.text().collect::<String>().trim().to_string())
        .collect::<Vec<_>>()
        .join(", ");

    let chapters = doc
        .select(&row_sel)
        .zip(1u32..)
        .map(|(row, chapter_number)| ChapterRef {
            name: select_text(row, &link_sel),
            path: select_attr(row, &link_sel, "href")
                .map(|href| strip_site(&href, site))
                .unwrap_or_default(),
            release_time: select_text(row, &release_sel),
            chapter_number,
        })
        .collect::<Vec<_>>();
    tracing::debug!(%path, chapters = chapters.len(), "parsed novel page");

    Ok(NovelDetail {
        path: path.to_string(),
        name: document_text(doc, &title_sel),
        cover: select_attr(root, &cover_sel, "src").unwrap_or_else(|| DEFAULT_COVER.to_string()),
        author: document_text(doc, &author_sel),
        genres,
        status: parse_status(&document_text(doc, &status_sel)),
        summary: document_text(doc, &summary_sel),
        chapters,
    })
}

/// Inner HTML of the chapter container with scripts and ad blocks removed; "" when absent.
fn parse_chapter_page(mut doc: Html) -> Result<String, SourceError> {
    let container_sel = parse_selector(".chapter-content")?;
    let strip_sel = parse_selector(".chapter-content script, .chapter-content .ads")?;

    let doomed = doc.select(&strip_sel).map(|e| e.id()).collect::<Vec<_>>();
    for id in doomed {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }

    Ok(doc
        .select(&container_sel)
        .next()
        .map(|e| e.inner_html())
        .unwrap_or_default())
}

impl Source for FwoSource<'_> {
    fn info(&self) -> SourceInfo {
        FWO_INFO
    }

    fn site(&self) -> &str {
        &self.site
    }

    fn filters(&self) -> Filters {
        let mut filters = Filters::new();
        filters.insert("genre", genre_filter());
        filters
    }

    fn popular_novels(
        &mut self,
        page: u32,
        filters: &Filters,
    ) -> Result<Vec<NovelSummary>, SourceError> {
        let url = popular_url(&self.site, page, filters.value("genre"));
        let doc = self.fetch_document(&url)?;
        parse_novels(&doc, &self.site)
    }

    fn search_novels(
        &mut self,
        term: &str,
        page: u32,
    ) -> Result<Vec<NovelSummary>, SourceError> {
        let url = search_url(&self.site, term, page);
        let doc = self.fetch_document(&url)?;
        parse_novels(&doc, &self.site)
    }

    fn parse_novel(&mut self, path: &str) -> Result<NovelDetail, SourceError> {
        let url = format!("{}{}", self.site, path);
        let doc = self.fetch_document(&url)?;
        parse_novel_page(&doc, path, &self.site)
    }

    fn parse_chapter(&mut self, path: &str) -> Result<String, SourceError> {
        let url = format!("{}{}", self.site, path);
        let doc = self.fetch_document(&url)?;
        parse_chapter_page(doc)
    }

    fn fetch_image(&mut self, url: &str) -> Result<Option<String>, SourceError> {
        self.client.fetch_file(url)
    }
}
