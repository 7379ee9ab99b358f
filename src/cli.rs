//! CLI parsing and orchestration. Drives the F-W-O source for one subcommand, prints JSON or
//! chapter text, or downloads a whole novel to a file. Maps errors to exit codes.

use crate::config::{self, Config};
use crate::formats::{render_chapter, write_book, FormatError, OutputFormat};
use crate::model::{Book, Chapter};
use crate::source::fwo::{FwoSource, FWO_INFO};
use crate::source::{strip_site, PoliteClient, Source, SourceError};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// CLI error carrying exit code and message.
#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Source(#[from] SourceError),

    #[error("{0}")]
    Format(#[from] FormatError),
}

impl CliRunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliRunError::InvalidInput(_) => 1,
            CliRunError::Source(_) => 2,
            CliRunError::Format(_) => 3,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "fwoscrape")]
#[command(about = "Browse, search and download novels from F-W-O")]
#[command(
    after_help = "Config file keys (site, output_dir, image_dir, user_agent, request_delay_secs, timeout_secs, retry_count, retry_backoff_secs) are read from ./fwoscrape.toml or the user config directory. CLI flags override config."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Base URL of the site (overrides config; default https://f-w-o.com).
    #[arg(long, global = true)]
    pub site: Option<String>,

    /// HTTP User-Agent (overrides config).
    #[arg(long, global = true)]
    pub user_agent: Option<String>,

    /// Delay between requests in seconds (overrides config; default 1).
    #[arg(long, global = true)]
    pub delay: Option<u64>,

    /// Request timeout in seconds (overrides config; default 30).
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Suppress progress output (errors only).
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Debug logging and full error chain.
    #[arg(long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print source identity (id, name, icon, site, version) as JSON.
    Info,

    /// Print the filter schema as JSON.
    Filters,

    /// List popular novels.
    Popular {
        /// 1-based page number.
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,

        /// Genre slug (see `filters`); omit for all genres.
        #[arg(long)]
        genre: Option<String>,
    },

    /// Search novels by title.
    Search {
        term: String,

        /// 1-based page number.
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,
    },

    /// Print novel details and chapter list as JSON.
    Novel {
        /// Novel path (e.g. /novel/some-title/) or full URL.
        path: String,
    },

    /// Print one chapter body.
    Chapter {
        /// Chapter path or full URL.
        path: String,

        /// Output format: html, markdown, text, or json.
        #[arg(long, default_value = "html", value_parser = parse_format)]
        format: OutputFormat,
    },

    /// Download an image and print its local path.
    Image { url: String },

    /// Download a novel with its chapters into one file.
    Download {
        /// Novel path or full URL.
        path: String,

        /// Output path. Default: {output_dir}/{sanitized-title}.{ext}.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: json, html, markdown, or text.
        #[arg(long, default_value = "json", value_parser = parse_format)]
        format: OutputFormat,

        /// Download only chapters in this range (1-based inclusive), e.g. 1-10.
        #[arg(long, value_parser = parse_chapter_range)]
        chapters: Option<(u32, u32)>,

        /// Log and skip chapters that fail instead of aborting.
        #[arg(long)]
        skip_failed: bool,
    },
}

fn parse_chapter_range(s: &str) -> Result<(u32, u32), String> {
    let s = s.trim();
    let (from_str, to_str) = s.split_once('-').ok_or_else(|| {
        format!(
            "Invalid --chapters: expected 'from-to' (e.g. 1-10), got '{}'",
            s
        )
    })?;
    let from_str = from_str.trim();
    let to_str = to_str.trim();
    let from: u32 = from_str.parse().map_err(|_| {
        format!(
            "Invalid --chapters: '{}' is not a valid start chapter number",
            from_str
        )
    })?;
    let to: u32 = to_str.parse().map_err(|_| {
        format!(
            "Invalid --chapters: '{}' is not a valid end chapter number",
            to_str
        )
    })?;
    if from > to {
        return Err(format!(
            "Invalid --chapters: start ({}) must be <= end ({})",
            from, to
        ));
    }
    Ok((from, to))
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    match s.to_lowercase().as_str() {
        "json" => Ok(OutputFormat::Json),
        "html" => Ok(OutputFormat::Html),
        "markdown" | "md" => Ok(OutputFormat::Markdown),
        "text" | "txt" => Ok(OutputFormat::Text),
        _ => Err(format!(
            "Invalid --format value: '{}'. Use json, html, markdown, or text.",
            s
        )),
    }
}

/// Sanitize book title to a safe filename: lowercase, replace spaces/special with `-`.
fn sanitize_title(title: &str) -> String {
    let mut s = title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect::<String>();
    while s.contains("--") {
        s = s.replace("--", "-");
    }
    s = s.trim_matches('-').to_string();
    if s.is_empty() {
        s = "novel".to_string();
    }
    s
}

/// Turn a path or full site URL into the site-relative path the source expects.
fn site_path(input: &str, site: &str) -> String {
    let path = strip_site(input.trim(), site);
    if path.starts_with('/') {
        path
    } else {
        format!("/{}", path)
    }
}

fn validate_output_path(path: &Path) -> Result<(), CliRunError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(CliRunError::InvalidInput(format!(
                "Cannot write output: {}: parent directory does not exist.",
                path.display()
            )));
        }
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliRunError> {
    let json = serde_json::to_string_pretty(value).map_err(FormatError::from)?;
    println!("{}", json);
    Ok(())
}

fn build_client(args: &Args, config: Option<&Config>) -> Result<PoliteClient, CliRunError> {
    let mut builder = PoliteClient::builder();
    if let Some(delay) = args.delay.or_else(|| config.and_then(|c| c.request_delay_secs)) {
        builder = builder.delay_secs(delay);
    }
    if let Some(timeout) = args.timeout.or_else(|| config.and_then(|c| c.timeout_secs)) {
        builder = builder.timeout_secs(timeout);
    }
    if let Some(n) = config.and_then(|c| c.retry_count) {
        builder = builder.retry_count(n);
    }
    if let Some(secs) = config.and_then(|c| c.retry_backoff_secs.clone()) {
        builder = builder.retry_backoff_secs(secs);
    }
    if let Some(dir) = config.and_then(|c| c.image_dir.clone()) {
        builder = builder.image_dir(dir);
    }
    if let Some(ua) = args
        .user_agent
        .clone()
        .or_else(|| config.and_then(|c| c.user_agent.clone()))
    {
        builder = builder.user_agent(ua);
    }
    builder
        .build()
        .map_err(|e| CliRunError::InvalidInput(format!("Failed to create HTTP client: {}", e)))
}

/// Fetch a novel page and then each chapter in range. `progress` is called with (done, total).
fn download_book(
    source: &mut dyn Source,
    path: &str,
    range: Option<(u32, u32)>,
    skip_failed: bool,
    progress: Option<&dyn Fn(u32, u32)>,
) -> Result<Book, CliRunError> {
    let detail = source.parse_novel(path)?;
    let source_url = format!("{}{}", source.site(), path);
    let mut book = Book::from_detail(&detail, source_url);

    let wanted = detail
        .chapters
        .iter()
        .filter(|c| range.map_or(true, |(from, to)| (from..=to).contains(&c.chapter_number)))
        .collect::<Vec<_>>();
    let total = wanted.len() as u32;

    for (done, chapter) in (1u32..).zip(wanted) {
        if let Some(p) = progress {
            p(done, total);
        }
        if chapter.path.is_empty() {
            tracing::warn!(number = chapter.chapter_number, "chapter has no link, skipped");
            continue;
        }
        let body = match source.parse_chapter(&chapter.path) {
            Ok(body) => body,
            Err(e) if skip_failed => {
                tracing::warn!(number = chapter.chapter_number, path = %chapter.path, error = %e, "chapter failed, skipped");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        book.chapters.push(Chapter {
            title: chapter.name.clone(),
            number: chapter.chapter_number,
            release_time: chapter.release_time.clone(),
            body,
        });
    }
    Ok(book)
}

/// Entry point for the CLI. Returns Ok(()) on success; Err with exit code and message on failure.
pub fn run(args: &Args) -> Result<(), CliRunError> {
    let config = config::load_config().map_err(CliRunError::InvalidInput)?;

    let site = match &args.site {
        Some(s) => {
            config::validate_site(s).map_err(CliRunError::InvalidInput)?;
            s.clone()
        }
        None => config
            .as_ref()
            .and_then(|c| c.site.clone())
            .unwrap_or_else(|| FWO_INFO.site.to_string()),
    };

    let mut client = build_client(args, config.as_ref())?;
    let mut source = FwoSource::with_site(&mut client, &site);
    let site = source.site().to_string();

    match &args.command {
        Command::Info => print_json(&source.info()),
        Command::Filters => print_json(&source.filters()),
        Command::Popular { page, genre } => {
            let mut filters = source.filters();
            if let Some(g) = genre {
                filters = filters
                    .with_value("genre", g)
                    .map_err(|e| CliRunError::InvalidInput(e.to_string()))?;
            }
            let novels = source.popular_novels(*page, &filters)?;
            print_json(&novels)
        }
        Command::Search { term, page } => {
            let novels = source.search_novels(term, *page)?;
            print_json(&novels)
        }
        Command::Novel { path } => {
            let novel = source.parse_novel(&site_path(path, &site))?;
            print_json(&novel)
        }
        Command::Chapter { path, format } => {
            let body = source.parse_chapter(&site_path(path, &site))?;
            println!("{}", render_chapter(&body, *format)?);
            Ok(())
        }
        Command::Image { url } => {
            match source.fetch_image(url)? {
                Some(local) => println!("{}", local),
                None => eprintln!("Image not available: {}", url),
            }
            Ok(())
        }
        Command::Download {
            path,
            output,
            format,
            chapters,
            skip_failed,
        } => {
            if let Some(p) = output {
                validate_output_path(p)?;
            }

            let bar = if args.quiet {
                None
            } else {
                let bar = indicatif::ProgressBar::new(0);
                bar.set_style(
                    indicatif::ProgressStyle::default_bar()
                        .template("{spinner} {msg} [{bar:40}] {pos}/{len} ({elapsed})")
                        .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
                        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                        .progress_chars("█▉▊▋▌▍▎▏ "),
                );
                bar.enable_steady_tick(Duration::from_millis(80));
                Some(bar)
            };
            let progress_cb = |n: u32, total: u32| {
                if let Some(ref pb) = bar {
                    pb.set_length(total as u64);
                    pb.set_position(n as u64);
                    pb.set_message(format!("Fetching chapter {}/{}", n, total));
                }
            };

            let result = download_book(
                &mut source,
                &site_path(path, &site),
                *chapters,
                *skip_failed,
                Some(&progress_cb),
            );
            if let Some(pb) = &bar {
                pb.finish_and_clear();
            }
            let book = result?;

            let output_path = match output {
                Some(p) => p.clone(),
                None => {
                    let dir = config
                        .as_ref()
                        .and_then(|c| c.output_dir.clone())
                        .unwrap_or_else(|| PathBuf::from("."));
                    dir.join(format!(
                        "{}.{}",
                        sanitize_title(&book.title),
                        format.extension()
                    ))
                }
            };
            validate_output_path(&output_path)?;
            write_book(&book, &output_path, *format)?;

            if !args.quiet {
                eprintln!(
                    "Wrote {} ({} chapters)",
                    output_path.display(),
                    book.chapters.len()
                );
            }
            Ok(())
        }
    }
}
