//! fwoscrape: source adapter for the F-W-O novel site, with a CLI host.

pub mod cli;
pub mod config;
pub mod filters;
pub mod formats;
pub mod model;
pub mod source;

// Re-exports for CLI and consumers.
pub use filters::{FilterOption, FilterType, Filters, PickerFilter};
pub use formats::{render_chapter, write_book, FormatError, OutputFormat};
pub use model::{Book, Chapter, ChapterRef, NovelDetail, NovelStatus, NovelSummary};
pub use source::fwo::{FwoSource, DEFAULT_COVER, FWO_INFO};
pub use source::{Fetch, PoliteClient, PoliteClientBuilder, Source, SourceError, SourceInfo};
