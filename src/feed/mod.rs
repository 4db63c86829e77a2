//! Feed synthesis.
//!
//! Stored articles are turned into RSS 2.0 or JSON Feed documents, either for
//! one channel or for every channel at once. Rendering is split in two: the
//! synthesizer builds a format-neutral [`FeedDocument`], and the `rss`/`json`
//! modules serialize it.

pub mod json;
pub mod opml;
pub mod rss;
pub mod sanitize;
pub mod synth;
mod xml;

pub use json::render_json;
pub use opml::{render_opml, OpmlEntry};
pub use rss::render_rss;
pub use sanitize::clean_description;
pub use synth::{
    FeedSynthesizer, RenderedFeed, ALL_FEED_DESCRIPTION, ALL_FEED_TITLE, DEFAULT_ALL_MAX_ITEMS,
    DEFAULT_MAX_ITEMS,
};

use chrono::{DateTime, Utc};

/// Public identifier of the aggregate feed.
pub const ALL_FEED_ID: &str = "all";

/// Which articles a feed covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedScope {
    /// One channel, by public identifier.
    Channel(String),
    /// Every channel.
    All,
}

impl FeedScope {
    /// Scope for a public identifier; `all` selects the aggregate feed.
    pub fn from_public_id(public_id: &str) -> Self {
        if public_id == ALL_FEED_ID {
            FeedScope::All
        } else {
            FeedScope::Channel(public_id.to_string())
        }
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Rss,
    Json,
}

impl FeedFormat {
    /// File extension used in feed URLs.
    pub fn extension(&self) -> &'static str {
        match self {
            FeedFormat::Rss => "xml",
            FeedFormat::Json => "json",
        }
    }

    /// HTTP content type of the rendered document.
    pub fn content_type(&self) -> &'static str {
        match self {
            FeedFormat::Rss => "application/xml; charset=utf-8",
            FeedFormat::Json => "application/json; charset=utf-8",
        }
    }

    /// Split `name.ext` into the identifier and format.
    ///
    /// `.json` selects JSON Feed; anything else, including no extension, is RSS.
    pub fn split_path(path: &str) -> (&str, FeedFormat) {
        match path.rsplit_once('.') {
            Some((id, "json")) => (id, FeedFormat::Json),
            Some((id, _)) => (id, FeedFormat::Rss),
            None => (path, FeedFormat::Rss),
        }
    }
}

/// Format-neutral feed ready for serialization.
#[derive(Debug, Clone)]
pub struct FeedDocument {
    pub title: String,
    pub description: String,
    /// Site or channel page.
    pub home_url: String,
    /// URL of this feed.
    pub feed_url: String,
    /// Newest first.
    pub entries: Vec<FeedEntry>,
}

/// One feed item.
#[derive(Debug, Clone)]
pub struct FeedEntry {
    /// Storage id of the article.
    pub id: i64,
    pub title: String,
    pub link: String,
    /// Plain-text summary.
    pub summary: String,
    /// Full body markup.
    pub content: String,
    pub published_at: DateTime<Utc>,
}
